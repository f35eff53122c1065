/// Protocol capability tokens. The advertised sets are fixed per service;
/// unknown client tokens are kept as `Other` and dropped at negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GitCapability {
    MultiAck,
    MultiAckDetailed,
    ThinPack,
    ReportStatus,
    DeleteRefs,
    Other(String),
}

impl GitCapability {
    pub fn from_str(s: &str) -> Self {
        match s {
            "multi_ack" => Self::MultiAck,
            "multi_ack_detailed" => Self::MultiAckDetailed,
            "thin-pack" => Self::ThinPack,
            "report-status" => Self::ReportStatus,
            "delete-refs" => Self::DeleteRefs,
            _ => Self::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::MultiAck => "multi_ack",
            Self::MultiAckDetailed => "multi_ack_detailed",
            Self::ThinPack => "thin-pack",
            Self::ReportStatus => "report-status",
            Self::DeleteRefs => "delete-refs",
            Self::Other(s) => s,
        }
    }

    /// Advertised set for upload-pack.
    pub fn upload() -> Vec<GitCapability> {
        vec![Self::ThinPack, Self::MultiAck, Self::MultiAckDetailed]
    }

    /// Advertised set for receive-pack.
    pub fn receive() -> Vec<GitCapability> {
        vec![Self::ReportStatus, Self::DeleteRefs]
    }

    pub fn parse_list(s: &str) -> Vec<GitCapability> {
        s.split(' ')
            .filter(|token| !token.is_empty())
            .map(GitCapability::from_str)
            .collect()
    }

    /// The client set actually in effect: whatever was requested that the
    /// server advertised. Unknown tokens are ignored, not rejected.
    pub fn negotiated(client: Vec<GitCapability>, advertised: &[GitCapability]) -> Vec<GitCapability> {
        client
            .into_iter()
            .filter(|cap| advertised.contains(cap))
            .collect()
    }

    pub fn join(caps: &[GitCapability]) -> String {
        caps.iter()
            .map(|cap| cap.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
