use crate::agent::RepoAgent;
use crate::capability::GitCapability;
use crate::error::GitWireError;
use crate::oid::Oid;
use crate::pkt_line::{write_ack, write_err_pkt, write_nak, AckStatus, PktDecoder, PktToken};
use crate::service::{ServiceKind, ServiceState};
use crate::telemetry::TransitionClock;
use bytes::BytesMut;

/// Upload-pack negotiation state: wants and shallow tips accumulate until
/// the client flushes, then haves are matched against the object store and
/// the pack covering `wants - common` is streamed.
#[derive(Default)]
pub struct UploadPack {
    wants: Vec<Oid>,
    shallow: Vec<Oid>,
    caps: Vec<GitCapability>,
    common: Vec<Oid>,
    acked: bool,
}

impl UploadPack {
    pub fn capabilities(&self) -> &[GitCapability] {
        &self.caps
    }

    /// Shallow tips the client declared. Recorded, not acted on: the agent
    /// returns the full closure regardless.
    pub fn shallow(&self) -> &[Oid] {
        &self.shallow
    }

    pub(crate) async fn drive(
        &mut self,
        agent: &dyn RepoAgent,
        decoder: &mut PktDecoder,
        out: &mut BytesMut,
        clock: &mut TransitionClock,
    ) -> Result<(), GitWireError> {
        self.collect_wants(decoder)?;
        if self.wants.is_empty() {
            // Legal client disconnect: nothing requested, nothing emitted.
            clock.advance(ServiceState::Done);
            return Ok(());
        }
        for want in &self.wants {
            if !agent.object_exists(want).await? {
                write_err_pkt(out, &format!("upload-pack: not our ref {}", want));
                clock.advance(ServiceState::Done);
                return Ok(());
            }
        }
        clock.advance(ServiceState::Haves);
        self.negotiate(agent, decoder, out).await?;

        let walk = agent.revwalk(&self.wants, &self.common).await?;
        let pack = agent.build_pack(&walk).await?;
        out.extend_from_slice(&pack);
        clock.advance(ServiceState::Done);
        Ok(())
    }

    fn collect_wants(&mut self, decoder: &mut PktDecoder) -> Result<(), GitWireError> {
        loop {
            match decoder.next_token()? {
                Some(PktToken::Want { oid, caps }) => {
                    if self.wants.is_empty() {
                        self.caps = GitCapability::negotiated(
                            caps,
                            &ServiceKind::UploadPack.advertised(),
                        );
                    }
                    if !self.wants.contains(&oid) {
                        self.wants.push(oid);
                    }
                }
                Some(PktToken::Shallow(oid)) => self.shallow.push(oid),
                Some(PktToken::Flush) | None => return Ok(()),
                Some(_) => {}
            }
        }
    }

    async fn negotiate(
        &mut self,
        agent: &dyn RepoAgent,
        decoder: &mut PktDecoder,
        out: &mut BytesMut,
    ) -> Result<(), GitWireError> {
        let multi_ack = self.caps.contains(&GitCapability::MultiAck);
        let detailed = self.caps.contains(&GitCapability::MultiAckDetailed);
        loop {
            match decoder.next_token()? {
                Some(PktToken::Have(oid)) => {
                    if !agent.object_exists(&oid).await? {
                        continue;
                    }
                    if detailed {
                        write_ack(out, &oid, Some(AckStatus::Common));
                    } else if multi_ack {
                        write_ack(out, &oid, Some(AckStatus::Continue));
                    } else if !self.acked {
                        write_ack(out, &oid, None);
                        self.acked = true;
                    }
                    if !self.common.contains(&oid) {
                        self.common.push(oid);
                    }
                }
                Some(PktToken::Flush) => {
                    // End of a negotiation round.
                    if self.common.is_empty() {
                        write_nak(out);
                    } else if detailed {
                        if let Some(last) = self.common.last() {
                            write_ack(out, last, Some(AckStatus::Ready));
                        }
                    }
                }
                // The body is complete; EOF without `done` ends negotiation
                // the same way.
                Some(PktToken::Done) | None => break,
                Some(_) => {}
            }
        }
        if self.common.is_empty() {
            if !self.acked {
                write_nak(out);
            }
        } else if multi_ack || detailed {
            if let Some(last) = self.common.last() {
                write_ack(out, last, None);
            }
        }
        Ok(())
    }
}
