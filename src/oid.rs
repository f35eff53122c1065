use crate::error::GitWireError;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};

/// A 20-byte SHA-1 object id. The canonical wire form is 40 lowercase hex
/// characters; the all-zero value marks ref creation/deletion in
/// receive-pack commands.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Oid([u8; 20]);

impl Oid {
    pub const ZERO: Oid = Oid([0u8; 20]);

    pub fn from_bytes(raw: &[u8]) -> Option<Oid> {
        if raw.len() != 20 {
            return None;
        }
        let mut out = [0u8; 20];
        out.copy_from_slice(raw);
        Some(Oid(out))
    }

    pub fn from_hex(hex: &str) -> Result<Oid, GitWireError> {
        let hex = hex.trim_end();
        if hex.len() != 40 {
            return Err(GitWireError::BadOidHex(hex.to_string()));
        }
        let mut out = [0u8; 20];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let s = std::str::from_utf8(chunk).map_err(|_| GitWireError::InvalidUtf8)?;
            out[i] =
                u8::from_str_radix(s, 16).map_err(|_| GitWireError::BadOidHex(hex.to_string()))?;
        }
        Ok(Oid(out))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(40);
        for b in self.0.iter() {
            s.push_str(&format!("{:02x}", b));
        }
        s
    }

    /// First 8 hex characters, for log lines.
    pub fn abbrev(&self) -> String {
        let mut s = self.to_hex();
        s.truncate(8);
        s
    }
}

impl Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Debug for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Serialize for Oid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Oid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Oid::from_hex(&s).map_err(|_| serde::de::Error::custom("invalid object id"))
    }
}
