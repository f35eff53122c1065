use crate::oid::Oid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GitWireError {
    RepoNotFound,
    Unauthenticated,
    Unauthorized,
    MalformedPktLine,
    UnexpectedEof,
    BadCommandLine(String),
    BadOidHex(String),
    NotOurRef(Oid),
    UnpackFailed(String),
    AgentError(String),
    InvalidUtf8,
    InvalidGzipBody(String),
    Payload(String),
    BadAuthHeader,
    ConfigError(String),
}

impl std::fmt::Display for GitWireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GitWireError::RepoNotFound => write!(f, "repository not found"),
            GitWireError::Unauthenticated => write!(f, "authentication required"),
            GitWireError::Unauthorized => write!(f, "access denied"),
            GitWireError::MalformedPktLine => write!(f, "malformed pkt-line"),
            GitWireError::UnexpectedEof => write!(f, "unexpected end of input"),
            GitWireError::BadCommandLine(line) => write!(f, "bad ref-update command: {}", line),
            GitWireError::BadOidHex(hex) => write!(f, "bad object id: {}", hex),
            GitWireError::NotOurRef(oid) => write!(f, "not our ref {}", oid),
            GitWireError::UnpackFailed(msg) => write!(f, "unpack failed: {}", msg),
            GitWireError::AgentError(msg) => write!(f, "repository agent error: {}", msg),
            GitWireError::InvalidUtf8 => write!(f, "invalid utf-8 on the wire"),
            GitWireError::InvalidGzipBody(msg) => write!(f, "invalid gzip body: {}", msg),
            GitWireError::Payload(msg) => write!(f, "payload error: {}", msg),
            GitWireError::BadAuthHeader => write!(f, "bad authorization header"),
            GitWireError::ConfigError(msg) => write!(f, "config error: {}", msg),
        }
    }
}

impl std::error::Error for GitWireError {}

impl From<std::io::Error> for GitWireError {
    fn from(e: std::io::Error) -> Self {
        GitWireError::Payload(e.to_string())
    }
}
