//! Downstream repositories that receive dispatch events.

use std::fmt;

/// A repository identified by `owner/name`.
///
/// Parsing is lenient: a malformed entry keeps whatever halves it has and is
/// skipped at dispatch time rather than failing startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTarget {
    pub owner: String,
    pub name: String,
}

impl DispatchTarget {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse an `owner/name` entry.
    ///
    /// A name containing a further `/` is not a repository and is left empty.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().split_once('/') {
            Some((owner, name)) if !name.contains('/') => Self::new(owner.trim(), name.trim()),
            Some((owner, _)) => Self::new(owner.trim(), ""),
            None => Self::new(raw.trim(), ""),
        }
    }

    /// The first missing part, if any.
    pub fn missing(&self) -> Option<&'static str> {
        if self.owner.is_empty() {
            Some("repository owner")
        } else if self.name.is_empty() {
            Some("repository name")
        } else {
            None
        }
    }

    /// Whether both owner and name are present.
    pub fn is_complete(&self) -> bool {
        self.missing().is_none()
    }
}

impl fmt::Display for DispatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
