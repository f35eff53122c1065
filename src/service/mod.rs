use crate::agent::RepoAgent;
use crate::auth::AccessLevel;
use crate::capability::GitCapability;
use crate::error::GitWireError;
use crate::pkt_line::PktDecoder;
use crate::telemetry::{TransitionClock, TransitionObserver};
use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod advertise;
pub mod command;
pub mod receive;
pub mod upload;

pub use receive::ReceivePack;
pub use upload::UploadPack;

/// Which transport service is being driven. The set is closed: dispatch is
/// a match, not a trait object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceKind {
    #[serde(rename = "git-upload-pack")]
    UploadPack,
    #[serde(rename = "git-receive-pack")]
    ReceivePack,
}

impl ServiceKind {
    pub fn from_wire(name: &str) -> Option<ServiceKind> {
        match name {
            "git-upload-pack" => Some(ServiceKind::UploadPack),
            "git-receive-pack" => Some(ServiceKind::ReceivePack),
            _ => None,
        }
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            ServiceKind::UploadPack => "git-upload-pack",
            ServiceKind::ReceivePack => "git-receive-pack",
        }
    }

    pub fn advertised(&self) -> Vec<GitCapability> {
        match self {
            ServiceKind::UploadPack => GitCapability::upload(),
            ServiceKind::ReceivePack => GitCapability::receive(),
        }
    }

    pub fn advertisement_content_type(&self) -> &'static str {
        match self {
            ServiceKind::UploadPack => "application/x-git-upload-pack-advertisement",
            ServiceKind::ReceivePack => "application/x-git-receive-pack-advertisement",
        }
    }

    pub fn result_content_type(&self) -> &'static str {
        match self {
            ServiceKind::UploadPack => "application/x-git-upload-pack-result",
            ServiceKind::ReceivePack => "application/x-git-receive-pack-result",
        }
    }

    pub fn required_access(&self) -> AccessLevel {
        match self {
            ServiceKind::UploadPack => AccessLevel::Read,
            ServiceKind::ReceivePack => AccessLevel::Write,
        }
    }
}

/// Union of both machines' states. Per machine the ordinal never
/// decreases; only `Buffer` re-enters itself while pack bytes accumulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ServiceState {
    Disco,
    Wants,
    Haves,
    Commands,
    Buffer,
    Report,
    Done,
}

impl ServiceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceState::Disco => "disco",
            ServiceState::Wants => "wants",
            ServiceState::Haves => "haves",
            ServiceState::Commands => "commands",
            ServiceState::Buffer => "buffer",
            ServiceState::Report => "report",
            ServiceState::Done => "done",
        }
    }
}

enum Machine {
    Upload(UploadPack),
    Receive(ReceivePack),
}

/// One service instance: agent handle, state machine, transition clock.
/// Lives for a single HTTP request and is never shared.
pub struct Service {
    kind: ServiceKind,
    agent: Box<dyn RepoAgent>,
    machine: Machine,
    clock: TransitionClock,
}

impl Service {
    pub fn new(kind: ServiceKind, agent: Box<dyn RepoAgent>) -> Service {
        let machine = match kind {
            ServiceKind::UploadPack => Machine::Upload(UploadPack::default()),
            ServiceKind::ReceivePack => Machine::Receive(ReceivePack::default()),
        };
        Service {
            kind,
            agent,
            machine,
            clock: TransitionClock::new(kind),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn TransitionObserver>) -> Service {
        self.clock.set_observer(observer);
        self
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn state(&self) -> ServiceState {
        self.clock.state()
    }

    /// Serve the discovery step: ref advertisement plus terminating flush.
    pub async fn advertise(&mut self) -> Result<Bytes, GitWireError> {
        let out = advertise::advertise_refs(self.agent.as_ref(), self.kind).await?;
        self.leave_disco();
        Ok(out)
    }

    /// The advertisement as served over smart HTTP: `# service=<name>`
    /// prelude, flush, then the ref lines.
    pub async fn advertise_http(&mut self) -> Result<Bytes, GitWireError> {
        let refs = advertise::advertise_refs(self.agent.as_ref(), self.kind).await?;
        self.leave_disco();
        Ok(advertise::with_http_prelude(self.kind, refs))
    }

    /// Drive the machine over a fully buffered request body and return the
    /// encoded response. On smart HTTP the discovery step was a separate
    /// request, so a fresh instance skips straight past it.
    pub async fn run(&mut self, body: Bytes) -> Result<Bytes, GitWireError> {
        if self.clock.state() == ServiceState::Disco {
            self.leave_disco();
        }
        let mut decoder = PktDecoder::new(body);
        let mut out = BytesMut::new();
        match &mut self.machine {
            Machine::Upload(machine) => {
                machine
                    .drive(self.agent.as_ref(), &mut decoder, &mut out, &mut self.clock)
                    .await?
            }
            Machine::Receive(machine) => {
                machine
                    .drive(self.agent.as_ref(), &mut decoder, &mut out, &mut self.clock)
                    .await?
            }
        }
        Ok(out.freeze())
    }

    fn leave_disco(&mut self) {
        let next = match self.kind {
            ServiceKind::UploadPack => ServiceState::Wants,
            ServiceKind::ReceivePack => ServiceState::Commands,
        };
        self.clock.advance(next);
    }
}
