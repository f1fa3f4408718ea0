//! Domain types shared between the engine and the service layer.
//!
//! Field names follow the external wire format: snake_case identifiers
//! except the two timestamps, which the original API exposed as
//! `createdAt` / `mergedAt`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A team member. Belongs to at most one team at a time; never deleted,
/// only deactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "user_id")]
    pub id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(rename = "team_name")]
    pub name: String,
    pub members: Vec<TeamMember>,
}

/// A user as it appears inside a team payload (no redundant team name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    #[serde(rename = "user_id")]
    pub id: String,
    pub username: String,
    pub is_active: bool,
}

/// Pull request lifecycle. MERGED is terminal: once merged, the engine
/// accepts no further reviewer changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PullRequestStatus {
    #[serde(rename = "OPEN")]
    Open,
    #[serde(rename = "MERGED")]
    Merged,
}

impl PullRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullRequestStatus::Open => "OPEN",
            PullRequestStatus::Merged => "MERGED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(PullRequestStatus::Open),
            "MERGED" => Some(PullRequestStatus::Merged),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    #[serde(rename = "pull_request_id")]
    pub id: String,
    #[serde(rename = "pull_request_name")]
    pub name: String,
    pub author_id: String,
    pub status: PullRequestStatus,
    /// Order-irrelevant set of reviewer ids; persisted and returned
    /// sorted by id so responses are stable.
    pub assigned_reviewers: Vec<String>,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "mergedAt", skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    pub fn is_merged(&self) -> bool {
        self.status == PullRequestStatus::Merged
    }

    pub fn has_reviewer(&self, user_id: &str) -> bool {
        self.assigned_reviewers.iter().any(|id| id == user_id)
    }
}

/// Caller-supplied fields for pull-request creation; the engine fills in
/// status, timestamps and the reviewer set.
#[derive(Debug, Clone)]
pub struct NewPullRequest {
    pub id: String,
    pub name: String,
    pub author_id: String,
}

/// Abbreviated pull request for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestShort {
    #[serde(rename = "pull_request_id")]
    pub id: String,
    #[serde(rename = "pull_request_name")]
    pub name: String,
    pub author_id: String,
    pub status: PullRequestStatus,
}

/// One open (pull request, reviewer) pair, as discovered for the
/// deactivation cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestAssignment {
    pub pull_request_id: String,
    pub reviewer_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentStats {
    pub user_id: String,
    pub assignment_count: i64,
}

/// Outcome of a deactivation cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivationResult {
    pub deactivated_user_ids: Vec<String>,
    pub reassigned_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        assert_eq!(
            PullRequestStatus::parse(PullRequestStatus::Open.as_str()),
            Some(PullRequestStatus::Open)
        );
        assert_eq!(
            PullRequestStatus::parse(PullRequestStatus::Merged.as_str()),
            Some(PullRequestStatus::Merged)
        );
        assert_eq!(PullRequestStatus::parse("CLOSED"), None);
    }

    #[test]
    fn pull_request_serializes_wire_field_names() {
        let pr = PullRequest {
            id: "pr-1".to_string(),
            name: "Add feature".to_string(),
            author_id: "u1".to_string(),
            status: PullRequestStatus::Open,
            assigned_reviewers: vec!["u2".to_string(), "u3".to_string()],
            created_at: None,
            merged_at: None,
        };

        let value = serde_json::to_value(&pr).unwrap();
        assert_eq!(value["pull_request_id"], "pr-1");
        assert_eq!(value["pull_request_name"], "Add feature");
        assert_eq!(value["status"], "OPEN");
        assert!(value.get("createdAt").is_none());
        assert!(value.get("mergedAt").is_none());
    }
}
