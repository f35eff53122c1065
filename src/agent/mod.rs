use crate::error::GitWireError;
use crate::oid::Oid;
use crate::refs::RefItem;
use crate::service::command::RefUpdate;
use async_trait::async_trait;
use bytes::Bytes;

pub mod memory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnpackStatus {
    Ok,
    Error(String),
}

impl UnpackStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, UnpackStatus::Ok)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    Ok,
    Rejected(String),
}

/// Outcome of one `apply_updates` call. `commands` preserves the client's
/// submission order.
#[derive(Debug, Clone)]
pub struct ApplyReport {
    pub unpack: UnpackStatus,
    pub commands: Vec<(String, CommandStatus)>,
}

/// Facade over the object database, ref store, and pack builder. Handles
/// are per-request: one is opened for each HTTP request and never shared
/// across concurrent workers.
#[async_trait]
pub trait RepoAgent: Send + Sync {
    /// Resolved HEAD, or `None` when the repository has no resolvable HEAD.
    async fn head(&self) -> Result<Option<RefItem>, GitWireError>;
    async fn branches(&self) -> Result<Vec<RefItem>, GitWireError>;
    async fn tags(&self) -> Result<Vec<RefItem>, GitWireError>;
    async fn object_exists(&self, oid: &Oid) -> Result<bool, GitWireError>;
    /// Objects reachable from `wants` minus the closure of `haves`.
    async fn revwalk(&self, wants: &[Oid], haves: &[Oid]) -> Result<Vec<Oid>, GitWireError>;
    /// Serialize a walk into an opaque `PACK` stream.
    async fn build_pack(&self, walk: &[Oid]) -> Result<Bytes, GitWireError>;
    /// Ingest the client's pack and apply every ref update atomically.
    async fn apply_updates(
        &self,
        commands: &[RefUpdate],
        pack: Bytes,
    ) -> Result<ApplyReport, GitWireError>;
}
