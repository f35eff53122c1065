use crate::agent::RepoAgent;
use crate::auth::AccessPolicy;
use crate::error::GitWireError;
use crate::telemetry::{TraceObserver, TransitionObserver};
use async_trait::async_trait;
use std::sync::Arc;

/// Shared application state handed to every HTTP handler.
#[derive(Clone)]
pub struct AppCore {
    pub repo_store: Arc<dyn RepoStore>,
    pub access: Arc<dyn AccessPolicy>,
    pub observer: Arc<dyn TransitionObserver>,
}

impl AppCore {
    pub fn new(repo_store: Arc<dyn RepoStore>, access: Arc<dyn AccessPolicy>) -> Self {
        Self {
            repo_store,
            access,
            observer: Arc::new(TraceObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn TransitionObserver>) -> Self {
        self.observer = observer;
        self
    }
}

/// Resolves a repository and opens a fresh agent handle. One handle per
/// request; handles are never shared across concurrent workers.
#[async_trait]
pub trait RepoStore: Send + Sync + 'static {
    async fn attach(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Box<dyn RepoAgent>, GitWireError>;
}
