//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for domain identifiers. Each newtype ensures
//! data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

/// Prefix marking a client-assigned identifier that has not been
/// confirmed by the remote store yet.
const TEMP_ID_PREFIX: &str = "local-";

/// Identifier for a work-permit submission
///
/// Server-assigned once the submission is persisted remotely. Before that,
/// a temporary client-assigned id of the form `local-<uuid>` is used so the
/// optimistic local record can be addressed and later replaced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubmissionId(String);

impl SubmissionId {
    /// Create a new SubmissionId from a remote-assigned string
    ///
    /// # Errors
    /// Returns `DomainError::InvalidId` if the id is empty or contains
    /// whitespace.
    pub fn new(id: String) -> Result<Self, DomainError> {
        if id.is_empty() {
            return Err(DomainError::InvalidId(
                "Submission id cannot be empty".to_string(),
            ));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidId(format!(
                "Submission id contains whitespace: {id}"
            )));
        }
        Ok(Self(id))
    }

    /// Create a temporary client-assigned id for an optimistic record
    #[must_use]
    pub fn temporary() -> Self {
        Self(format!("{TEMP_ID_PREFIX}{}", Uuid::new_v4()))
    }

    /// Returns true if this id was assigned locally and not yet confirmed
    /// by the remote store
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMP_ID_PREFIX)
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SubmissionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubmissionId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for SubmissionId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<SubmissionId> for String {
    fn from(id: SubmissionId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid() {
        let id = SubmissionId::new("sub-42".to_string()).unwrap();
        assert_eq!(id.as_str(), "sub-42");
        assert!(!id.is_temporary());
    }

    #[test]
    fn test_empty_fails() {
        assert!(SubmissionId::new(String::new()).is_err());
    }

    #[test]
    fn test_whitespace_fails() {
        assert!(SubmissionId::new("bad id".to_string()).is_err());
    }

    #[test]
    fn test_temporary_is_unique_and_flagged() {
        let a = SubmissionId::temporary();
        let b = SubmissionId::temporary();
        assert_ne!(a, b);
        assert!(a.is_temporary());
        assert!(b.is_temporary());
    }

    #[test]
    fn test_serde_roundtrip() {
        let id = SubmissionId::new("abc123".to_string()).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: SubmissionId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_deserialize_empty_fails() {
        let result: Result<SubmissionId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }
}
