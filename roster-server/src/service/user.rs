//! Per-user operations: activity flag and review listings.

use std::sync::Arc;

use roster_core::model::{PullRequestShort, User};
use roster_core::DomainError;

use crate::repository::{PullRequestRepository, UserRepository};

use super::required_field;

pub struct UserService {
    users: Arc<dyn UserRepository>,
    pulls: Arc<dyn PullRequestRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, pulls: Arc<dyn PullRequestRepository>) -> Self {
        Self { users, pulls }
    }

    /// Flip a user's activity flag. Existing assignments are untouched;
    /// the flag only gates future reviewer selection.
    pub async fn set_is_active(&self, user_id: &str, is_active: bool) -> Result<User, DomainError> {
        let user_id = required_field(user_id, "user_id")?;
        self.users.set_is_active(user_id, is_active).await
    }

    /// Pull requests the user is assigned to review, newest first.
    /// Merged pull requests stay in the listing.
    pub async fn get_review(
        &self,
        user_id: &str,
    ) -> Result<(User, Vec<PullRequestShort>), DomainError> {
        let user_id = required_field(user_id, "user_id")?;
        let user = self.users.get_by_id(user_id).await?;
        let reviews = self.pulls.list_by_reviewer(user_id).await?;
        Ok((user, reviews))
    }
}
