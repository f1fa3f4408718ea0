//! In-memory implementation of the repository traits.
//!
//! Holds everything in maps behind a `RwLock`; all state is lost on
//! restart. Used by the service-level tests, which need the same typed
//! domain conditions as the SQLite backend without a database file.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use roster_core::model::{
    AssignmentStats, PullRequest, PullRequestAssignment, PullRequestShort, PullRequestStatus,
    Team, TeamMember, User,
};
use roster_core::DomainError;

use super::{PullRequestRepository, TeamRepository, UserRepository};

#[derive(Debug, Clone)]
struct StoredPullRequest {
    name: String,
    author_id: String,
    status: PullRequestStatus,
    reviewers: BTreeSet<String>,
    created_at: Option<DateTime<Utc>>,
    merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    teams: BTreeSet<String>,
    users: BTreeMap<String, User>,
    pull_requests: BTreeMap<String, StoredPullRequest>,
}

impl MemoryState {
    fn assemble(&self, pr_id: &str) -> Option<PullRequest> {
        let stored = self.pull_requests.get(pr_id)?;
        Some(PullRequest {
            id: pr_id.to_string(),
            name: stored.name.clone(),
            author_id: stored.author_id.clone(),
            status: stored.status,
            assigned_reviewers: stored.reviewers.iter().cloned().collect(),
            created_at: stored.created_at,
            merged_at: stored.merged_at,
        })
    }
}

/// In-memory repository for tests.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: RwLock<MemoryState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn get_by_id(&self, user_id: &str) -> Result<User, DomainError> {
        let state = self.state.read().await;
        state
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("resource not found"))
    }

    async fn list_by_team(&self, team_name: &str) -> Result<Vec<User>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .filter(|u| u.team_name == team_name)
            .cloned()
            .collect())
    }

    async fn upsert(&self, users: &[User]) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        for user in users {
            state.users.insert(user.id.clone(), user.clone());
        }
        Ok(())
    }

    async fn set_is_active(&self, user_id: &str, is_active: bool) -> Result<User, DomainError> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| DomainError::not_found("resource not found"))?;
        user.is_active = is_active;
        Ok(user.clone())
    }

    async fn list_by_ids(
        &self,
        team_name: &str,
        user_ids: &[String],
    ) -> Result<Vec<User>, DomainError> {
        let wanted: HashSet<&str> = user_ids.iter().map(String::as_str).collect();
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .filter(|u| u.team_name == team_name && wanted.contains(u.id.as_str()))
            .cloned()
            .collect())
    }

    async fn deactivate_users(
        &self,
        team_name: &str,
        user_ids: &[String],
    ) -> Result<Vec<String>, DomainError> {
        let wanted: HashSet<&str> = user_ids.iter().map(String::as_str).collect();
        let mut state = self.state.write().await;
        let mut updated = Vec::new();
        for user in state.users.values_mut() {
            if user.team_name == team_name && wanted.contains(user.id.as_str()) {
                user.is_active = false;
                updated.push(user.id.clone());
            }
        }
        Ok(updated)
    }
}

#[async_trait]
impl TeamRepository for MemoryRepository {
    async fn create(&self, team_name: &str) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        if !state.teams.insert(team_name.to_string()) {
            return Err(DomainError::TeamExists);
        }
        Ok(())
    }

    async fn exists(&self, team_name: &str) -> Result<bool, DomainError> {
        let state = self.state.read().await;
        Ok(state.teams.contains(team_name))
    }

    async fn get_by_name(&self, team_name: &str) -> Result<Team, DomainError> {
        let state = self.state.read().await;
        if !state.teams.contains(team_name) {
            return Err(DomainError::not_found("resource not found"));
        }

        let members = state
            .users
            .values()
            .filter(|u| u.team_name == team_name)
            .map(|u| TeamMember {
                id: u.id.clone(),
                username: u.username.clone(),
                is_active: u.is_active,
            })
            .collect();

        Ok(Team {
            name: team_name.to_string(),
            members,
        })
    }
}

#[async_trait]
impl PullRequestRepository for MemoryRepository {
    async fn create(
        &self,
        pr: &PullRequest,
        reviewer_ids: &[String],
    ) -> Result<PullRequest, DomainError> {
        let mut state = self.state.write().await;
        if state.pull_requests.contains_key(&pr.id) {
            return Err(DomainError::PrExists);
        }

        state.pull_requests.insert(
            pr.id.clone(),
            StoredPullRequest {
                name: pr.name.clone(),
                author_id: pr.author_id.clone(),
                status: pr.status,
                reviewers: reviewer_ids.iter().cloned().collect(),
                created_at: pr.created_at,
                merged_at: pr.merged_at,
            },
        );

        Ok(state
            .assemble(&pr.id)
            .expect("pull request was just inserted"))
    }

    async fn get_by_id(&self, pr_id: &str) -> Result<PullRequest, DomainError> {
        let state = self.state.read().await;
        state
            .assemble(pr_id)
            .ok_or_else(|| DomainError::not_found("resource not found"))
    }

    async fn update_status(
        &self,
        pr_id: &str,
        status: PullRequestStatus,
        merged_at: Option<DateTime<Utc>>,
    ) -> Result<PullRequest, DomainError> {
        let mut state = self.state.write().await;
        let stored = state
            .pull_requests
            .get_mut(pr_id)
            .ok_or_else(|| DomainError::not_found("resource not found"))?;
        stored.status = status;
        stored.merged_at = merged_at;

        Ok(state.assemble(pr_id).expect("pull request exists"))
    }

    async fn replace_reviewer(
        &self,
        pr_id: &str,
        old_reviewer_id: &str,
        new_reviewer_id: &str,
    ) -> Result<PullRequest, DomainError> {
        let mut state = self.state.write().await;
        let stored = state
            .pull_requests
            .get_mut(pr_id)
            .ok_or(DomainError::NotAssigned)?;

        // Same signal as the SQL backend's zero-rows-deleted.
        if !stored.reviewers.remove(old_reviewer_id) {
            return Err(DomainError::NotAssigned);
        }
        stored.reviewers.insert(new_reviewer_id.to_string());

        Ok(state.assemble(pr_id).expect("pull request exists"))
    }

    async fn list_by_reviewer(
        &self,
        reviewer_id: &str,
    ) -> Result<Vec<PullRequestShort>, DomainError> {
        let state = self.state.read().await;
        let mut matches: Vec<(&String, &StoredPullRequest)> = state
            .pull_requests
            .iter()
            .filter(|(_, pr)| pr.reviewers.contains(reviewer_id))
            .collect();
        matches.sort_by(|a, b| b.1.created_at.cmp(&a.1.created_at));

        Ok(matches
            .into_iter()
            .map(|(id, pr)| PullRequestShort {
                id: id.clone(),
                name: pr.name.clone(),
                author_id: pr.author_id.clone(),
                status: pr.status,
            })
            .collect())
    }

    async fn list_open_assignments_by_reviewers(
        &self,
        reviewer_ids: &[String],
    ) -> Result<Vec<PullRequestAssignment>, DomainError> {
        let wanted: HashSet<&str> = reviewer_ids.iter().map(String::as_str).collect();
        let state = self.state.read().await;

        let mut pairs = Vec::new();
        for (id, pr) in &state.pull_requests {
            if pr.status != PullRequestStatus::Open {
                continue;
            }
            for reviewer in &pr.reviewers {
                if wanted.contains(reviewer.as_str()) {
                    pairs.push(PullRequestAssignment {
                        pull_request_id: id.clone(),
                        reviewer_id: reviewer.clone(),
                    });
                }
            }
        }
        Ok(pairs)
    }

    async fn assignment_stats(&self) -> Result<Vec<AssignmentStats>, DomainError> {
        let state = self.state.read().await;
        let mut counts: HashMap<&str, i64> = HashMap::new();
        for pr in state.pull_requests.values() {
            for reviewer in &pr.reviewers {
                *counts.entry(reviewer.as_str()).or_insert(0) += 1;
            }
        }

        let mut stats: Vec<AssignmentStats> = counts
            .into_iter()
            .map(|(user_id, assignment_count)| AssignmentStats {
                user_id: user_id.to_string(),
                assignment_count,
            })
            .collect();
        stats.sort_by(|a, b| {
            b.assignment_count
                .cmp(&a.assignment_count)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok(stats)
    }
}
