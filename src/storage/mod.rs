use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod database;
pub mod migrations;

pub use database::TranscriptDb;

/// Store-assigned transcript identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TranscriptId(pub String);

impl TranscriptId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parse a user-supplied id; anything that is not a UUID is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s.trim())
            .ok()
            .map(|u| Self(u.to_string()))
    }
}

impl Default for TranscriptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TranscriptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted transcript document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptRecord {
    pub id: TranscriptId,
    pub file_name: String,
    pub transcript: String,
    pub course_name: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(TranscriptId::new(), TranscriptId::new());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(TranscriptId::parse("not-an-id").is_none());
        assert!(TranscriptId::parse("").is_none());

        let id = TranscriptId::new();
        assert_eq!(TranscriptId::parse(&id.0), Some(id));
    }
}
