use crate::agent::{CommandStatus, RepoAgent, UnpackStatus};
use crate::capability::GitCapability;
use crate::error::GitWireError;
use crate::pkt_line::{flush_pkt, write_pkt_line, PktDecoder, PktToken};
use crate::service::command::RefUpdate;
use crate::service::{ServiceKind, ServiceState};
use crate::telemetry::TransitionClock;
use bytes::BytesMut;

/// Receive-pack state: ref-update commands accumulate until the flush,
/// pack bytes buffer until the body ends, then the agent applies
/// everything atomically and the report goes out.
#[derive(Default)]
pub struct ReceivePack {
    commands: Vec<RefUpdate>,
    caps: Vec<GitCapability>,
    pack: BytesMut,
}

impl ReceivePack {
    pub fn capabilities(&self) -> &[GitCapability] {
        &self.caps
    }

    pub(crate) async fn drive(
        &mut self,
        agent: &dyn RepoAgent,
        decoder: &mut PktDecoder,
        out: &mut BytesMut,
        clock: &mut TransitionClock,
    ) -> Result<(), GitWireError> {
        self.collect_commands(decoder)?;
        if self.commands.is_empty() {
            clock.advance(ServiceState::Done);
            return Ok(());
        }
        clock.advance(ServiceState::Buffer);
        loop {
            match decoder.next_token()? {
                Some(PktToken::Pack(bytes)) => {
                    self.pack.extend_from_slice(&bytes);
                    clock.advance(ServiceState::Buffer);
                }
                Some(_) => {}
                None => break,
            }
        }

        // Body complete. A deletion-only push may carry no pack at all.
        let report = agent
            .apply_updates(&self.commands, self.pack.split().freeze())
            .await?;
        clock.advance(ServiceState::Report);
        if self.caps.contains(&GitCapability::ReportStatus) {
            match &report.unpack {
                UnpackStatus::Ok => write_pkt_line(out, b"unpack ok"),
                UnpackStatus::Error(msg) => {
                    write_pkt_line(out, format!("unpack {}", msg).as_bytes())
                }
            }
            for (ref_name, status) in &report.commands {
                match status {
                    CommandStatus::Ok => {
                        write_pkt_line(out, format!("ok {}", ref_name).as_bytes())
                    }
                    CommandStatus::Rejected(reason) => {
                        write_pkt_line(out, format!("ng {} {}", ref_name, reason).as_bytes())
                    }
                }
            }
            flush_pkt(out);
        }
        clock.advance(ServiceState::Done);
        Ok(())
    }

    fn collect_commands(&mut self, decoder: &mut PktDecoder) -> Result<(), GitWireError> {
        loop {
            match decoder.next_token()? {
                Some(PktToken::Line(payload)) => {
                    let (command, caps) = RefUpdate::from_payload(&payload)?;
                    if self.commands.is_empty() {
                        if let Some(caps) = caps {
                            self.caps = GitCapability::negotiated(
                                caps,
                                &ServiceKind::ReceivePack.advertised(),
                            );
                        }
                    }
                    self.commands.push(command);
                }
                Some(PktToken::Flush) | None => return Ok(()),
                Some(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::agent::memory::{MemoryAgent, MemoryRepoStore};
    use crate::oid::Oid;
    use crate::service::{Service, ServiceKind, ServiceState};
    use bytes::{Bytes, BytesMut};

    fn oid(fill: u8) -> Oid {
        Oid::from_bytes(&[fill; 20]).unwrap()
    }

    fn frame(line: &str) -> Vec<u8> {
        let mut framed = format!("{:04x}", line.len() + 4).into_bytes();
        framed.extend_from_slice(line.as_bytes());
        framed
    }

    fn fake_pack() -> Vec<u8> {
        let mut pack = b"PACK\x00\x00\x00\x02\x00\x00\x00\x00".to_vec();
        pack.extend_from_slice(&[0u8; 20]);
        pack
    }

    async fn seeded_agent() -> MemoryAgent {
        let store = MemoryRepoStore::new();
        let agent = store.create("u", "r").await;
        agent.put_object(oid(0x11), &[]).await;
        agent.set_ref("refs/heads/main", oid(0x11)).await;
        agent.set_head("refs/heads/main").await;
        agent
    }

    #[tokio::test]
    async fn test_empty_command_list_is_silent() {
        let agent = seeded_agent().await;
        let mut service = Service::new(ServiceKind::ReceivePack, Box::new(agent));
        let reply = service.run(Bytes::from_static(b"0000")).await.unwrap();
        assert!(reply.is_empty());
        assert_eq!(service.state(), ServiceState::Done);
    }

    #[tokio::test]
    async fn test_create_ref_reports_ok() {
        let agent = seeded_agent().await;
        let probe = agent.clone();
        let mut service = Service::new(ServiceKind::ReceivePack, Box::new(agent));
        let mut body = BytesMut::new();
        body.extend_from_slice(&frame(&format!(
            "{} {} refs/heads/topic\0report-status",
            Oid::ZERO,
            oid(0x33)
        )));
        body.extend_from_slice(b"0000");
        body.extend_from_slice(&fake_pack());
        let reply = service.run(body.freeze()).await.unwrap();
        let text = String::from_utf8_lossy(&reply).to_string();
        assert!(text.starts_with("000eunpack ok\n"));
        assert!(text.contains("ok refs/heads/topic"));
        assert!(text.ends_with("0000"));
        assert_eq!(probe.ref_value("refs/heads/topic").await, Some(oid(0x33)));
    }

    #[tokio::test]
    async fn test_delete_ref_without_pack() {
        let agent = seeded_agent().await;
        agent.put_object(oid(0x44), &[]).await;
        agent.set_ref("refs/heads/old", oid(0x44)).await;
        let probe = agent.clone();
        let mut service = Service::new(ServiceKind::ReceivePack, Box::new(agent));
        let mut body = BytesMut::new();
        body.extend_from_slice(&frame(&format!(
            "{} {} refs/heads/old\0report-status delete-refs",
            oid(0x44),
            Oid::ZERO
        )));
        body.extend_from_slice(b"0000");
        let reply = service.run(body.freeze()).await.unwrap();
        let text = String::from_utf8_lossy(&reply).to_string();
        assert!(text.contains("unpack ok"));
        assert!(text.contains("ok refs/heads/old"));
        assert_eq!(probe.ref_value("refs/heads/old").await, None);
    }

    #[tokio::test]
    async fn test_report_skipped_without_report_status() {
        let agent = seeded_agent().await;
        let probe = agent.clone();
        let mut service = Service::new(ServiceKind::ReceivePack, Box::new(agent));
        let mut body = BytesMut::new();
        body.extend_from_slice(&frame(&format!(
            "{} {} refs/heads/topic",
            Oid::ZERO,
            oid(0x33)
        )));
        body.extend_from_slice(b"0000");
        body.extend_from_slice(&fake_pack());
        let reply = service.run(body.freeze()).await.unwrap();
        assert!(reply.is_empty());
        // The update still applies; only the report is skipped.
        assert_eq!(probe.ref_value("refs/heads/topic").await, Some(oid(0x33)));
    }

    #[tokio::test]
    async fn test_stale_old_oid_is_rejected() {
        let agent = seeded_agent().await;
        let probe = agent.clone();
        let mut service = Service::new(ServiceKind::ReceivePack, Box::new(agent));
        let mut body = BytesMut::new();
        body.extend_from_slice(&frame(&format!(
            "{} {} refs/heads/main\0report-status",
            oid(0x55),
            oid(0x33)
        )));
        body.extend_from_slice(b"0000");
        body.extend_from_slice(&fake_pack());
        let reply = service.run(body.freeze()).await.unwrap();
        let text = String::from_utf8_lossy(&reply).to_string();
        assert!(text.contains("ng refs/heads/main"));
        assert_eq!(probe.ref_value("refs/heads/main").await, Some(oid(0x11)));
    }

    #[tokio::test]
    async fn test_malformed_command_is_an_error() {
        let agent = seeded_agent().await;
        let mut service = Service::new(ServiceKind::ReceivePack, Box::new(agent));
        let mut body = BytesMut::new();
        body.extend_from_slice(&frame("this is not a command"));
        body.extend_from_slice(b"0000");
        assert!(service.run(body.freeze()).await.is_err());
    }
}
