//! Deactivation-cascade planning.
//!
//! The cascade must not leave partial state behind: either every open
//! assignment held by a deactivating member gets a replacement and the
//! batch commits, or nothing is written. To that end the plan is built
//! up-front, against a snapshot of the affected pull requests, before
//! any mutation. The simulation tracks the effect of earlier swaps in
//! the same batch, so a replacement consumed on one pair is excluded
//! for a later pair on the same pull request.
//!
//! Users being deactivated in the batch are excluded from every
//! candidate pool, even where they are not assigned to the pull request
//! in question: deactivation removes a user from all future selections.

use std::collections::{HashMap, HashSet};

use crate::error::DomainError;
use crate::model::{PullRequest, PullRequestAssignment, User};
use crate::random::RandomSource;
use crate::selection::{eligible_ids, pick_replacement};

/// One reviewer swap the cascade intends to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSwap {
    pub pull_request_id: String,
    pub old_reviewer_id: String,
    pub new_reviewer_id: String,
}

/// Resolve every (pull request, reviewer) pair to a concrete
/// replacement, or fail with `NoCandidate` before anything is written.
///
/// `roster` is the member list of the team whose members are being
/// deactivated; every reviewer in `assignments` belongs to it. Each pair
/// is resolved exactly once, in the order given.
pub fn plan_reassignments(
    assignments: &[PullRequestAssignment],
    pull_requests: &HashMap<String, PullRequest>,
    roster: &[User],
    deactivating: &HashSet<String>,
    random: &dyn RandomSource,
) -> Result<Vec<PlannedSwap>, DomainError> {
    // Simulated reviewer sets, updated as swaps are planned.
    let mut simulated: HashMap<&str, HashSet<String>> = pull_requests
        .iter()
        .map(|(id, pr)| {
            (
                id.as_str(),
                pr.assigned_reviewers.iter().cloned().collect(),
            )
        })
        .collect();

    let mut plan = Vec::with_capacity(assignments.len());

    for assignment in assignments {
        let pr = pull_requests
            .get(&assignment.pull_request_id)
            .ok_or_else(|| {
                DomainError::not_found(format!(
                    "pull request {} not found",
                    assignment.pull_request_id
                ))
            })?;

        let candidates = {
            let assigned = simulated
                .get(pr.id.as_str())
                .expect("every assignment's pull request is in the snapshot");

            let mut exclude: HashSet<&str> = HashSet::with_capacity(
                assigned.len() + deactivating.len() + 2,
            );
            exclude.insert(pr.author_id.as_str());
            exclude.insert(assignment.reviewer_id.as_str());
            exclude.extend(assigned.iter().map(String::as_str));
            exclude.extend(deactivating.iter().map(String::as_str));

            eligible_ids(roster, &exclude)
        };

        let Some(replacement) = pick_replacement(random, &candidates) else {
            return Err(DomainError::NoCandidate);
        };

        let assigned = simulated
            .get_mut(pr.id.as_str())
            .expect("every assignment's pull request is in the snapshot");
        assigned.remove(&assignment.reviewer_id);
        assigned.insert(replacement.clone());

        plan.push(PlannedSwap {
            pull_request_id: assignment.pull_request_id.clone(),
            old_reviewer_id: assignment.reviewer_id.clone(),
            new_reviewer_id: replacement,
        });
    }

    Ok(plan)
}
