//! Pull-request lifecycle: creation with reviewer selection, idempotent
//! merge, and single-reviewer reassignment.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use roster_core::model::{AssignmentStats, NewPullRequest, PullRequest, PullRequestStatus};
use roster_core::selection::{eligible_ids, pick_replacement, select_reviewers, REVIEWER_QUOTA};
use roster_core::{DomainError, RandomSource};

use crate::repository::{PullRequestRepository, UserRepository};

use super::required_field;

pub struct PullRequestService {
    users: Arc<dyn UserRepository>,
    pulls: Arc<dyn PullRequestRepository>,
    random: Arc<dyn RandomSource>,
}

impl PullRequestService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        pulls: Arc<dyn PullRequestRepository>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            users,
            pulls,
            random,
        }
    }

    /// Create a pull request and assign up to [`REVIEWER_QUOTA`] reviewers
    /// drawn uniformly from the author's active teammates. Fewer eligible
    /// teammates than the quota is not an error; the pull request is
    /// created with whatever the pool yields, possibly nobody.
    pub async fn create(&self, new: NewPullRequest) -> Result<PullRequest, DomainError> {
        let pr_id = required_field(&new.id, "pull_request_id")?;
        let name = required_field(&new.name, "pull_request_name")?;
        let author_id = required_field(&new.author_id, "author_id")?;

        let author = self.users.get_by_id(author_id).await?;
        let roster = self.users.list_by_team(&author.team_name).await?;

        let mut exclude = HashSet::new();
        exclude.insert(author_id);
        let candidates = eligible_ids(&roster, &exclude);
        let reviewers = select_reviewers(self.random.as_ref(), candidates, REVIEWER_QUOTA);

        tracing::info!(
            pull_request_id = pr_id,
            author_id,
            reviewer_count = reviewers.len(),
            "assigning reviewers"
        );

        let pr = PullRequest {
            id: pr_id.to_string(),
            name: name.to_string(),
            author_id: author_id.to_string(),
            status: PullRequestStatus::Open,
            assigned_reviewers: Vec::new(),
            created_at: Some(Utc::now()),
            merged_at: None,
        };

        self.pulls.create(&pr, &reviewers).await
    }

    /// Mark a pull request merged. Merging an already-merged pull request
    /// returns the stored record unchanged.
    pub async fn merge(&self, pr_id: &str) -> Result<PullRequest, DomainError> {
        let pr_id = required_field(pr_id, "pull_request_id")?;

        let pr = self.pulls.get_by_id(pr_id).await?;
        if pr.is_merged() {
            return Ok(pr);
        }

        self.pulls
            .update_status(pr_id, PullRequestStatus::Merged, Some(Utc::now()))
            .await
    }

    /// Replace `old_reviewer_id` on an open pull request with a random
    /// active teammate who is not the author, not the outgoing reviewer,
    /// and not already assigned. Returns the updated pull request and
    /// the incoming reviewer's id.
    pub async fn reassign(
        &self,
        pr_id: &str,
        old_reviewer_id: &str,
    ) -> Result<(PullRequest, String), DomainError> {
        let pr_id = required_field(pr_id, "pull_request_id")?;
        let old_reviewer_id = required_field(old_reviewer_id, "old_reviewer_id")?;

        let pr = self.pulls.get_by_id(pr_id).await?;
        if pr.is_merged() {
            return Err(DomainError::PrMerged);
        }
        if !pr.has_reviewer(old_reviewer_id) {
            return Err(DomainError::NotAssigned);
        }

        let old_reviewer = self.users.get_by_id(old_reviewer_id).await?;
        let roster = self.users.list_by_team(&old_reviewer.team_name).await?;

        let mut exclude: HashSet<&str> = HashSet::new();
        exclude.insert(pr.author_id.as_str());
        exclude.insert(old_reviewer_id);
        for reviewer in &pr.assigned_reviewers {
            exclude.insert(reviewer.as_str());
        }

        let candidates = eligible_ids(&roster, &exclude);
        let replacement = pick_replacement(self.random.as_ref(), &candidates)
            .ok_or(DomainError::NoCandidate)?;

        tracing::info!(
            pull_request_id = pr_id,
            old_reviewer_id,
            new_reviewer_id = %replacement,
            "replacing reviewer"
        );

        let updated = self
            .pulls
            .replace_reviewer(pr_id, old_reviewer_id, &replacement)
            .await?;
        Ok((updated, replacement))
    }

    /// Reviewer load across all pull requests, busiest first.
    pub async fn assignment_stats(&self) -> Result<Vec<AssignmentStats>, DomainError> {
        self.pulls.assignment_stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use roster_core::model::User;
    use roster_core::SequenceRandom;

    use crate::repository::MemoryRepository;

    fn user(id: &str, team: &str, active: bool) -> User {
        User {
            id: id.to_string(),
            username: format!("user {id}"),
            team_name: team.to_string(),
            is_active: active,
        }
    }

    fn new_pr(id: &str, author: &str) -> NewPullRequest {
        NewPullRequest {
            id: id.to_string(),
            name: format!("pr {id}"),
            author_id: author.to_string(),
        }
    }

    async fn service_with(
        users: Vec<User>,
        random: SequenceRandom,
    ) -> (Arc<MemoryRepository>, PullRequestService) {
        let repo = Arc::new(MemoryRepository::new());
        UserRepository::upsert(repo.as_ref(), &users)
            .await
            .unwrap();
        let service = PullRequestService::new(repo.clone(), repo.clone(), Arc::new(random));
        (repo, service)
    }

    #[tokio::test]
    async fn create_assigns_two_reviewers_from_active_teammates() {
        let roster = vec![
            user("a", "backend", true),
            user("b", "backend", true),
            user("c", "backend", true),
            user("d", "backend", true),
        ];
        let (_, service) = service_with(roster, SequenceRandom::zeroes()).await;

        let pr = service.create(new_pr("pr1", "a")).await.unwrap();
        assert_eq!(pr.status, PullRequestStatus::Open);
        assert!(pr.created_at.is_some());
        assert_eq!(pr.merged_at, None);
        assert_eq!(pr.assigned_reviewers.len(), 2);
        assert!(!pr.assigned_reviewers.contains(&"a".to_string()));
    }

    #[tokio::test]
    async fn create_with_small_pool_assigns_everyone_available() {
        let roster = vec![
            user("a", "backend", true),
            user("b", "backend", true),
            user("c", "backend", false),
        ];
        let (_, service) = service_with(roster, SequenceRandom::zeroes()).await;

        let pr = service.create(new_pr("pr1", "a")).await.unwrap();
        assert_eq!(pr.assigned_reviewers, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn create_with_no_teammates_assigns_nobody() {
        let roster = vec![user("a", "backend", true)];
        let (_, service) = service_with(roster, SequenceRandom::zeroes()).await;

        let pr = service.create(new_pr("pr1", "a")).await.unwrap();
        assert!(pr.assigned_reviewers.is_empty());
    }

    #[tokio::test]
    async fn create_rejects_unknown_author() {
        let (_, service) = service_with(vec![], SequenceRandom::zeroes()).await;

        let err = service.create(new_pr("pr1", "ghost")).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_rejects_blank_fields() {
        let (_, service) =
            service_with(vec![user("a", "backend", true)], SequenceRandom::zeroes()).await;

        let err = service.create(new_pr("  ", "a")).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        let err = service.create(new_pr("pr1", "")).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn create_rejects_duplicate_id() {
        let (_, service) =
            service_with(vec![user("a", "backend", true)], SequenceRandom::zeroes()).await;

        service.create(new_pr("pr1", "a")).await.unwrap();
        let err = service.create(new_pr("pr1", "a")).await.unwrap_err();
        assert_eq!(err, DomainError::PrExists);
    }

    #[tokio::test]
    async fn merge_is_idempotent() {
        let (_, service) = service_with(
            vec![user("a", "backend", true), user("b", "backend", true)],
            SequenceRandom::zeroes(),
        )
        .await;

        service.create(new_pr("pr1", "a")).await.unwrap();
        let merged = service.merge("pr1").await.unwrap();
        assert_eq!(merged.status, PullRequestStatus::Merged);
        let first_merged_at = merged.merged_at;
        assert!(first_merged_at.is_some());

        let again = service.merge("pr1").await.unwrap();
        assert_eq!(again.merged_at, first_merged_at);
        assert_eq!(again.assigned_reviewers, merged.assigned_reviewers);
    }

    #[tokio::test]
    async fn merge_unknown_pull_request_is_not_found() {
        let (_, service) = service_with(vec![], SequenceRandom::zeroes()).await;
        let err = service.merge("pr1").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn reassign_swaps_in_an_unassigned_active_teammate() {
        let roster = vec![
            user("a", "backend", true),
            user("b", "backend", true),
            user("c", "backend", true),
            user("d", "backend", true),
        ];
        let (_, service) = service_with(roster, SequenceRandom::zeroes()).await;

        let pr = service.create(new_pr("pr1", "a")).await.unwrap();
        let old = pr.assigned_reviewers[0].clone();
        let kept = pr.assigned_reviewers[1].clone();

        let (updated, replacement) = service.reassign("pr1", &old).await.unwrap();
        assert_eq!(updated.assigned_reviewers.len(), 2);
        assert!(!updated.assigned_reviewers.contains(&old));
        assert!(updated.assigned_reviewers.contains(&kept));
        assert!(updated.assigned_reviewers.contains(&replacement));
        assert!(!updated.assigned_reviewers.contains(&"a".to_string()));
    }

    #[tokio::test]
    async fn reassign_merged_pull_request_is_rejected() {
        let roster = vec![
            user("a", "backend", true),
            user("b", "backend", true),
            user("c", "backend", true),
        ];
        let (_, service) = service_with(roster, SequenceRandom::zeroes()).await;

        let pr = service.create(new_pr("pr1", "a")).await.unwrap();
        let old = pr.assigned_reviewers[0].clone();
        service.merge("pr1").await.unwrap();

        let err = service.reassign("pr1", &old).await.unwrap_err();
        assert_eq!(err, DomainError::PrMerged);
    }

    #[tokio::test]
    async fn reassign_unassigned_reviewer_is_rejected() {
        let roster = vec![
            user("a", "backend", true),
            user("b", "backend", true),
            user("c", "backend", true),
            user("d", "backend", true),
        ];
        let (_, service) = service_with(roster, SequenceRandom::zeroes()).await;

        let pr = service.create(new_pr("pr1", "a")).await.unwrap();
        let outsider = ["b", "c", "d"]
            .iter()
            .find(|id| !pr.has_reviewer(id))
            .unwrap()
            .to_string();

        let err = service.reassign("pr1", &outsider).await.unwrap_err();
        assert_eq!(err, DomainError::NotAssigned);
    }

    #[tokio::test]
    async fn reassign_with_exhausted_pool_leaves_assignment_intact() {
        // Three-person team: author plus both reviewers, nobody left over.
        let roster = vec![
            user("a", "backend", true),
            user("b", "backend", true),
            user("c", "backend", true),
        ];
        let (repo, service) = service_with(roster, SequenceRandom::zeroes()).await;

        let pr = service.create(new_pr("pr1", "a")).await.unwrap();
        let old = pr.assigned_reviewers[0].clone();

        let err = service.reassign("pr1", &old).await.unwrap_err();
        assert_eq!(err, DomainError::NoCandidate);

        let unchanged = PullRequestRepository::get_by_id(repo.as_ref(), "pr1")
            .await
            .unwrap();
        assert_eq!(unchanged.assigned_reviewers, pr.assigned_reviewers);
    }

    #[tokio::test]
    async fn reassign_skips_inactive_teammates() {
        let roster = vec![
            user("a", "backend", true),
            user("b", "backend", true),
            user("c", "backend", true),
            user("d", "backend", false),
            user("e", "backend", true),
        ];
        let (_, service) = service_with(roster, SequenceRandom::zeroes()).await;

        let pr = service.create(new_pr("pr1", "a")).await.unwrap();
        let old = pr.assigned_reviewers[0].clone();

        let (updated, _) = service.reassign("pr1", &old).await.unwrap();
        assert!(!updated.assigned_reviewers.contains(&"d".to_string()));
    }

    #[tokio::test]
    async fn stats_count_assignments_across_pull_requests() {
        let roster = vec![
            user("a", "backend", true),
            user("b", "backend", true),
            user("c", "backend", true),
        ];
        let (_, service) = service_with(roster, SequenceRandom::zeroes()).await;

        service.create(new_pr("pr1", "a")).await.unwrap();
        service.create(new_pr("pr2", "b")).await.unwrap();

        let stats = service.assignment_stats().await.unwrap();
        let total: i64 = stats.iter().map(|s| s.assignment_count).sum();
        assert_eq!(total, 4);
        assert!(stats
            .windows(2)
            .all(|w| w[0].assignment_count >= w[1].assignment_count));
    }
}
