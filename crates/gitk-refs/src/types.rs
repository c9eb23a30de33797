//! Reference values and their stored text form.

use std::fmt;

use gitk_types::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::{RefError, Result};
use crate::names::validate_ref_name;

/// Marker that starts the stored form of a symbolic reference.
pub const SYMBOLIC_PREFIX: &str = "ref: ";

/// The raw value of a reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefValue {
    /// Points straight at an object.
    Direct(ObjectId),
    /// Names another reference (e.g. `HEAD -> refs/heads/main`).
    Symbolic(String),
}

impl RefValue {
    /// Stored text form: the hex identifier or `ref: <target>`.
    pub fn encode(&self) -> String {
        match self {
            Self::Direct(id) => id.to_hex(),
            Self::Symbolic(target) => format!("{SYMBOLIC_PREFIX}{target}"),
        }
    }

    /// Parse stored content; trailing whitespace is ignored.
    pub fn parse(name: &str, content: &[u8]) -> Result<Self> {
        let malformed = || RefError::Malformed {
            name: name.to_string(),
            content: String::from_utf8_lossy(content).into_owned(),
        };
        let text = std::str::from_utf8(content).map_err(|_| malformed())?.trim_end();
        if let Some(target) = text.strip_prefix(SYMBOLIC_PREFIX) {
            let target = target.trim();
            validate_ref_name(target).map_err(|_| malformed())?;
            return Ok(Self::Symbolic(target.to_string()));
        }
        ObjectId::from_hex(text).map(Self::Direct).map_err(|_| malformed())
    }

    pub fn as_direct(&self) -> Option<ObjectId> {
        match self {
            Self::Direct(id) => Some(*id),
            Self::Symbolic(_) => None,
        }
    }

    pub fn as_symbolic(&self) -> Option<&str> {
        match self {
            Self::Symbolic(target) => Some(target),
            Self::Direct(_) => None,
        }
    }
}

impl fmt::Display for RefValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Summary information about a branch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    /// Short branch name (e.g. `main`).
    pub name: String,
    /// Commit at the branch tip.
    pub target: ObjectId,
    /// Whether HEAD points at this branch.
    pub is_current: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_roundtrip() {
        let id = ObjectId::from_hash([3; 32]);
        let value = RefValue::Direct(id);
        assert_eq!(value.encode(), id.to_hex());
        assert_eq!(RefValue::parse("HEAD", value.encode().as_bytes()).unwrap(), value);
    }

    #[test]
    fn symbolic_roundtrip() {
        let value = RefValue::Symbolic("refs/heads/main".into());
        assert_eq!(value.encode(), "ref: refs/heads/main");
        assert_eq!(RefValue::parse("HEAD", b"ref: refs/heads/main").unwrap(), value);
    }

    #[test]
    fn trailing_whitespace_ignored() {
        let id = ObjectId::from_hash([4; 32]);
        let stored = format!("{}\n", id.to_hex());
        assert_eq!(
            RefValue::parse("refs/heads/main", stored.as_bytes()).unwrap(),
            RefValue::Direct(id)
        );
        assert_eq!(
            RefValue::parse("HEAD", b"ref: refs/heads/main\r\n").unwrap(),
            RefValue::Symbolic("refs/heads/main".into())
        );
    }

    #[test]
    fn garbage_is_malformed() {
        for content in [&b"not a hash"[..], b"ref: main", b"", b"\xff\xfe"] {
            assert!(matches!(
                RefValue::parse("HEAD", content),
                Err(RefError::Malformed { .. })
            ));
        }
    }

    #[test]
    fn accessors() {
        let id = ObjectId::from_hash([5; 32]);
        assert_eq!(RefValue::Direct(id).as_direct(), Some(id));
        assert_eq!(RefValue::Direct(id).as_symbolic(), None);
        assert_eq!(
            RefValue::Symbolic("refs/heads/x".into()).as_symbolic(),
            Some("refs/heads/x")
        );
    }
}
