use crate::error::GitWireError;
use base64::Engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    Read,
    Write,
}

/// Decoded `Authorization: Basic` header. The decoded text splits at the
/// first colon; passwords may contain further colons.
#[derive(Debug, Clone)]
pub struct BasicCredentials {
    pub login: String,
    pub password: String,
}

impl BasicCredentials {
    pub fn from_header(value: &str) -> Result<BasicCredentials, GitWireError> {
        let encoded = value
            .strip_prefix("Basic ")
            .ok_or(GitWireError::BadAuthHeader)?;
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|_| GitWireError::BadAuthHeader)?;
        let decoded = String::from_utf8(decoded).map_err(|_| GitWireError::BadAuthHeader)?;
        let (login, password) = decoded
            .split_once(':')
            .ok_or(GitWireError::BadAuthHeader)?;
        Ok(BasicCredentials {
            login: login.to_string(),
            password: password.to_string(),
        })
    }
}

/// Authorization collaborator. The core only enforces the boolean outcome:
/// `Unauthenticated` triggers the Basic challenge, `Unauthorized` denies.
#[async_trait::async_trait]
pub trait AccessPolicy: Send + Sync + 'static {
    async fn authorize(
        &self,
        credentials: Option<&BasicCredentials>,
        namespace: &str,
        repo: &str,
        level: AccessLevel,
    ) -> Result<(), GitWireError>;
}

/// Policy for the demo server: everything is public.
pub struct OpenAccess;

#[async_trait::async_trait]
impl AccessPolicy for OpenAccess {
    async fn authorize(
        &self,
        _credentials: Option<&BasicCredentials>,
        _namespace: &str,
        _repo: &str,
        _level: AccessLevel,
    ) -> Result<(), GitWireError> {
        Ok(())
    }
}
