use crate::oid::Oid;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefPrefix {
    Head,
    Heads,
    Tags,
}

impl RefPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefPrefix::Head => "",
            RefPrefix::Heads => "refs/heads/",
            RefPrefix::Tags => "refs/tags/",
        }
    }
}

/// One advertised reference. `prefix` is empty only for `HEAD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefItem {
    pub prefix: RefPrefix,
    pub name: String,
    pub oid: Oid,
}

impl RefItem {
    pub fn new(prefix: RefPrefix, name: impl Into<String>, oid: Oid) -> Self {
        Self {
            prefix,
            name: name.into(),
            oid,
        }
    }

    /// Split a full ref name (`refs/heads/main`, `refs/tags/v1`, `HEAD`)
    /// back into its advertised form.
    pub fn from_full(full: &str, oid: Oid) -> Option<RefItem> {
        if full == "HEAD" {
            return Some(RefItem::new(RefPrefix::Head, "HEAD", oid));
        }
        if let Some(name) = full.strip_prefix("refs/heads/") {
            return Some(RefItem::new(RefPrefix::Heads, name, oid));
        }
        if let Some(name) = full.strip_prefix("refs/tags/") {
            return Some(RefItem::new(RefPrefix::Tags, name, oid));
        }
        None
    }

    pub fn full_name(&self) -> String {
        format!("{}{}", self.prefix.as_str(), self.name)
    }

    /// The `oid SP name` payload used in ref advertisements.
    pub fn advertised_line(&self) -> String {
        format!("{} {}", self.oid, self.full_name())
    }
}
