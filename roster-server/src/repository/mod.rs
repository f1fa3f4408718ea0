//! Repository abstraction for the persistence collaborator.
//!
//! These traits are the only way the engine touches shared state. Each
//! operation is request-scoped and either succeeds, fails with a typed
//! domain condition (uniqueness violation, zero rows affected, missing
//! row), or fails opaquely as `DomainError::Storage`. Two backends are
//! provided: SQLite for the running service, in-memory for tests.

mod memory;
pub mod sqlite;

pub use memory::MemoryRepository;
pub use sqlite::SqliteRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use roster_core::model::{
    AssignmentStats, PullRequest, PullRequestAssignment, PullRequestShort, PullRequestStatus,
    Team, User,
};
use roster_core::DomainError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Resolve a user by id, or `NotFound`.
    async fn get_by_id(&self, user_id: &str) -> Result<User, DomainError>;

    /// All users affiliated with a team, ordered by id. An unknown team
    /// yields an empty roster, not an error.
    async fn list_by_team(&self, team_name: &str) -> Result<Vec<User>, DomainError>;

    /// Insert or update users by id.
    async fn upsert(&self, users: &[User]) -> Result<(), DomainError>;

    /// Flip a single user's active flag, returning the updated record.
    async fn set_is_active(&self, user_id: &str, is_active: bool) -> Result<User, DomainError>;

    /// The subset of `user_ids` that exist inside the given team.
    async fn list_by_ids(
        &self,
        team_name: &str,
        user_ids: &[String],
    ) -> Result<Vec<User>, DomainError>;

    /// Batch-deactivate team members in one statement; returns the ids
    /// actually updated. Idempotent.
    async fn deactivate_users(
        &self,
        team_name: &str,
        user_ids: &[String],
    ) -> Result<Vec<String>, DomainError>;
}

#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Create a team; a duplicate name fails with `TeamExists`.
    async fn create(&self, team_name: &str) -> Result<(), DomainError>;

    async fn exists(&self, team_name: &str) -> Result<bool, DomainError>;

    /// Team with its member list, or `NotFound`.
    async fn get_by_name(&self, team_name: &str) -> Result<Team, DomainError>;
}

#[async_trait]
pub trait PullRequestRepository: Send + Sync {
    /// Persist a pull request together with its reviewer rows, atomically.
    /// A duplicate pull-request id fails with `PrExists`.
    async fn create(
        &self,
        pr: &PullRequest,
        reviewer_ids: &[String],
    ) -> Result<PullRequest, DomainError>;

    /// Pull request including its current reviewer set, or `NotFound`.
    async fn get_by_id(&self, pr_id: &str) -> Result<PullRequest, DomainError>;

    async fn update_status(
        &self,
        pr_id: &str,
        status: PullRequestStatus,
        merged_at: Option<DateTime<Utc>>,
    ) -> Result<PullRequest, DomainError>;

    /// Swap one reviewer for another in a single transaction. If the old
    /// reviewer is no longer assigned (zero rows deleted) the swap fails
    /// with `NotAssigned` and nothing changes.
    async fn replace_reviewer(
        &self,
        pr_id: &str,
        old_reviewer_id: &str,
        new_reviewer_id: &str,
    ) -> Result<PullRequest, DomainError>;

    /// Every pull request the user is or was assigned to, newest first.
    async fn list_by_reviewer(
        &self,
        reviewer_id: &str,
    ) -> Result<Vec<PullRequestShort>, DomainError>;

    /// Open (pull request, reviewer) pairs held by any of the given
    /// reviewers. Merged pull requests are excluded.
    async fn list_open_assignments_by_reviewers(
        &self,
        reviewer_ids: &[String],
    ) -> Result<Vec<PullRequestAssignment>, DomainError>;

    /// Total assignment count per reviewer, busiest first.
    async fn assignment_stats(&self) -> Result<Vec<AssignmentStats>, DomainError>;
}
