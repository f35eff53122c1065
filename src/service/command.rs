use crate::capability::GitCapability;
use crate::error::GitWireError;
use crate::oid::Oid;
use bstr::ByteSlice;

/// One ref update submitted by a pushing client:
/// `<old-oid> SP <new-oid> SP <ref-name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefUpdate {
    pub old: Oid,
    pub new: Oid,
    pub ref_name: String,
}

impl RefUpdate {
    pub fn is_create(&self) -> bool {
        self.old.is_zero()
    }

    pub fn is_delete(&self) -> bool {
        self.new.is_zero()
    }

    pub fn is_update(&self) -> bool {
        !self.is_create() && !self.is_delete()
    }

    /// Parse a decoded command payload. The first command line of a push
    /// may carry the client capability list after a NUL; it is returned
    /// alongside the command when present.
    pub fn from_payload(
        payload: &[u8],
    ) -> Result<(RefUpdate, Option<Vec<GitCapability>>), GitWireError> {
        let (command, caps) = match payload.find_byte(b'\0') {
            Some(idx) => {
                let caps = std::str::from_utf8(&payload[idx + 1..])
                    .map_err(|_| GitWireError::InvalidUtf8)?;
                (&payload[..idx], Some(GitCapability::parse_list(caps)))
            }
            None => (payload, None),
        };
        let command = std::str::from_utf8(command).map_err(|_| GitWireError::InvalidUtf8)?;
        let parts: Vec<&str> = command.trim_end().split(' ').collect();
        if parts.len() != 3 || parts[2].is_empty() {
            return Err(GitWireError::BadCommandLine(command.to_string()));
        }
        let update = RefUpdate {
            old: Oid::from_hex(parts[0])?,
            new: Oid::from_hex(parts[1])?,
            ref_name: parts[2].to_string(),
        };
        Ok((update, caps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_command() {
        let line = b"0000000000000000000000000000000000000000 cdfdb42577e2506715f8cfeacdbabc092bf63e8d refs/heads/experiment";
        let (command, caps) = RefUpdate::from_payload(line).unwrap();
        assert!(command.is_create());
        assert!(!command.is_delete());
        assert!(!command.is_update());
        assert_eq!(command.ref_name, "refs/heads/experiment");
        assert_eq!(
            command.new.to_hex(),
            "cdfdb42577e2506715f8cfeacdbabc092bf63e8d"
        );
        assert!(caps.is_none());
    }

    #[test]
    fn test_update_command() {
        let line = b"ca82a6dff817ec66f44342007202690a93763949 15027957951b64cf874c3557a0f3547bd83b3ff6 refs/heads/master";
        let (command, _) = RefUpdate::from_payload(line).unwrap();
        assert!(command.is_update());
        assert_eq!(
            command.old.to_hex(),
            "ca82a6dff817ec66f44342007202690a93763949"
        );
        assert_eq!(
            command.new.to_hex(),
            "15027957951b64cf874c3557a0f3547bd83b3ff6"
        );
    }

    #[test]
    fn test_delete_command() {
        let line = b"15027957951b64cf874c3557a0f3547bd83b3ff6 0000000000000000000000000000000000000000 refs/heads/experiment";
        let (command, _) = RefUpdate::from_payload(line).unwrap();
        assert!(command.is_delete());
        assert!(!command.is_create());
    }

    #[test]
    fn test_first_line_capabilities() {
        let line = b"0000000000000000000000000000000000000000 cdfdb42577e2506715f8cfeacdbabc092bf63e8d refs/heads/topic\0report-status delete-refs";
        let (command, caps) = RefUpdate::from_payload(line).unwrap();
        assert_eq!(command.ref_name, "refs/heads/topic");
        assert_eq!(
            caps.unwrap(),
            vec![GitCapability::ReportStatus, GitCapability::DeleteRefs]
        );
    }

    #[test]
    fn test_rejects_missing_fields() {
        assert!(matches!(
            RefUpdate::from_payload(b"only_one_part"),
            Err(GitWireError::BadCommandLine(_))
        ));
    }

    #[test]
    fn test_rejects_bad_oid() {
        let line = b"zz82a6dff817ec66f44342007202690a93763949 15027957951b64cf874c3557a0f3547bd83b3ff6 refs/heads/master";
        assert!(matches!(
            RefUpdate::from_payload(line),
            Err(GitWireError::BadOidHex(_))
        ));
    }
}
