//! The closed error taxonomy for the assignment engine.
//!
//! Every failure the engine can produce is one of these variants; each
//! carries a stable machine-readable code (for HTTP error bodies) next
//! to its human-readable message. Collaborator failures that do not map
//! to a domain condition are wrapped as `Storage` with the operation
//! that failed.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("{0}")]
    NotFound(String),
    #[error("team already exists")]
    TeamExists,
    #[error("pull request already exists")]
    PrExists,
    #[error("pull request already merged")]
    PrMerged,
    #[error("reviewer is not assigned to this pull request")]
    NotAssigned,
    #[error("no replacement candidate available")]
    NoCandidate,
    #[error("all requested members are already inactive")]
    AlreadyInactive,
    #[error("{0}")]
    Validation(String),
    #[error("storage error during {operation}: {message}")]
    Storage {
        operation: &'static str,
        message: String,
    },
}

impl DomainError {
    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::NotFound(_) => "NOT_FOUND",
            DomainError::TeamExists => "TEAM_EXISTS",
            DomainError::PrExists => "PR_EXISTS",
            DomainError::PrMerged => "PR_MERGED",
            DomainError::NotAssigned => "NOT_ASSIGNED",
            DomainError::NoCandidate => "NO_CANDIDATE",
            DomainError::AlreadyInactive => "ALREADY_INACTIVE",
            DomainError::Validation(_) => "VALIDATION",
            DomainError::Storage { .. } => "INTERNAL",
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        DomainError::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }

    /// A blank or missing required field.
    pub fn required(field: &str) -> Self {
        DomainError::Validation(format!("{field} is required"))
    }

    pub fn storage(operation: &'static str, message: impl Into<String>) -> Self {
        DomainError::Storage {
            operation,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(DomainError::not_found("x").code(), "NOT_FOUND");
        assert_eq!(DomainError::TeamExists.code(), "TEAM_EXISTS");
        assert_eq!(DomainError::PrExists.code(), "PR_EXISTS");
        assert_eq!(DomainError::PrMerged.code(), "PR_MERGED");
        assert_eq!(DomainError::NotAssigned.code(), "NOT_ASSIGNED");
        assert_eq!(DomainError::NoCandidate.code(), "NO_CANDIDATE");
        assert_eq!(DomainError::AlreadyInactive.code(), "ALREADY_INACTIVE");
        assert_eq!(DomainError::required("user_id").code(), "VALIDATION");
        assert_eq!(DomainError::storage("get", "boom").code(), "INTERNAL");
    }

    #[test]
    fn required_names_the_field() {
        assert_eq!(
            DomainError::required("pull_request_id").to_string(),
            "pull_request_id is required"
        );
    }
}
