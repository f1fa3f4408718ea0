//! Team management, including the all-or-nothing deactivation cascade.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use roster_core::cascade::plan_reassignments;
use roster_core::model::{DeactivationResult, PullRequest, Team, TeamMember, User};
use roster_core::{DomainError, RandomSource};

use crate::repository::{PullRequestRepository, TeamRepository, UserRepository};

use super::required_field;

pub struct TeamService {
    teams: Arc<dyn TeamRepository>,
    users: Arc<dyn UserRepository>,
    pulls: Arc<dyn PullRequestRepository>,
    random: Arc<dyn RandomSource>,
}

impl TeamService {
    pub fn new(
        teams: Arc<dyn TeamRepository>,
        users: Arc<dyn UserRepository>,
        pulls: Arc<dyn PullRequestRepository>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            teams,
            users,
            pulls,
            random,
        }
    }

    /// Register a team together with its initial members.
    pub async fn create(
        &self,
        team_name: &str,
        members: Vec<TeamMember>,
    ) -> Result<Team, DomainError> {
        let team_name = required_field(team_name, "team_name")?;
        for member in &members {
            required_field(&member.id, "user_id")?;
            required_field(&member.username, "username")?;
        }

        TeamRepository::create(self.teams.as_ref(), team_name).await?;

        let users: Vec<User> = members
            .into_iter()
            .map(|m| User {
                id: m.id,
                username: m.username,
                team_name: team_name.to_string(),
                is_active: m.is_active,
            })
            .collect();
        self.users.upsert(&users).await?;

        self.teams.get_by_name(team_name).await
    }

    pub async fn get(&self, team_name: &str) -> Result<Team, DomainError> {
        let team_name = required_field(team_name, "team_name")?;
        self.teams.get_by_name(team_name).await
    }

    /// Deactivate a batch of team members, first reassigning every open
    /// review they hold. The whole plan is resolved before anything is
    /// written; if any slot has no eligible replacement the call fails
    /// with `NoCandidate` and neither assignments nor activity flags
    /// change.
    pub async fn deactivate_members(
        &self,
        team_name: &str,
        user_ids: &[String],
    ) -> Result<DeactivationResult, DomainError> {
        let team_name = required_field(team_name, "team_name")?;

        let mut seen = HashSet::new();
        let requested: Vec<String> = user_ids
            .iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty() && seen.insert(id.clone()))
            .collect();
        if requested.is_empty() {
            return Err(DomainError::required("user_ids"));
        }

        if !self.teams.exists(team_name).await? {
            return Err(DomainError::not_found("resource not found"));
        }

        let found = self.users.list_by_ids(team_name, &requested).await?;
        let found_ids: HashSet<&str> = found.iter().map(|u| u.id.as_str()).collect();
        let missing: Vec<&str> = requested
            .iter()
            .map(String::as_str)
            .filter(|id| !found_ids.contains(id))
            .collect();
        if !missing.is_empty() {
            return Err(DomainError::not_found(format!(
                "users not found: {}",
                missing.join(", ")
            )));
        }

        let active_ids: Vec<String> = found
            .iter()
            .filter(|u| u.is_active)
            .map(|u| u.id.clone())
            .collect();
        if active_ids.is_empty() {
            return Err(DomainError::AlreadyInactive);
        }

        let assignments = self
            .pulls
            .list_open_assignments_by_reviewers(&active_ids)
            .await?;

        let mut pull_requests: HashMap<String, PullRequest> = HashMap::new();
        for assignment in &assignments {
            if !pull_requests.contains_key(&assignment.pull_request_id) {
                let pr = self.pulls.get_by_id(&assignment.pull_request_id).await?;
                pull_requests.insert(pr.id.clone(), pr);
            }
        }

        let roster = self.users.list_by_team(team_name).await?;
        // Every requested member is barred from replacement pools, not
        // just the ones still active.
        let deactivating: HashSet<String> = requested.iter().cloned().collect();

        let plan = plan_reassignments(
            &assignments,
            &pull_requests,
            &roster,
            &deactivating,
            self.random.as_ref(),
        )?;

        tracing::info!(
            team_name,
            deactivating = active_ids.len(),
            reassignments = plan.len(),
            "applying deactivation plan"
        );

        for swap in &plan {
            self.pulls
                .replace_reviewer(
                    &swap.pull_request_id,
                    &swap.old_reviewer_id,
                    &swap.new_reviewer_id,
                )
                .await?;
        }

        let deactivated_user_ids = self.users.deactivate_users(team_name, &active_ids).await?;

        Ok(DeactivationResult {
            deactivated_user_ids,
            reassigned_count: plan.len(),
        })
    }
}
