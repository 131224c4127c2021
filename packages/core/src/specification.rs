// ABOUTME: Project specification artifact produced at the end of a conversation
// ABOUTME: Immutable after creation apart from explicit version increments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The terminal artifact of a specification conversation. Created exactly
/// once per conversation and referenced from it by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectSpecification {
    pub id: String,
    pub user_id: String,
    pub project_name: String,
    pub content: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub version: i32,
}

impl ProjectSpecification {
    /// Build a fresh version-1 specification.
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        project_name: impl Into<String>,
        content: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            project_name: project_name.into(),
            content,
            created_at: Utc::now(),
            version: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_specification_starts_at_version_one() {
        let spec = ProjectSpecification::new(
            "s1",
            "user-1",
            "PhotoShare",
            serde_json::json!({"summary": "a photo sharing site"}),
        );
        assert_eq!(spec.version, 1);
        assert_eq!(spec.project_name, "PhotoShare");
    }
}
