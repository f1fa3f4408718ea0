//! Reviewer eligibility and selection.
//!
//! Pure functions over a loaded roster; the service layer is responsible
//! for reading the roster and persisting whatever is chosen here.

use std::collections::HashSet;

use crate::model::User;
use crate::random::RandomSource;

/// Maximum reviewers assigned at pull-request creation.
pub const REVIEWER_QUOTA: usize = 2;

/// Every active roster member whose id is not excluded.
///
/// The roster's iteration order carries through to the returned vector,
/// but callers treat the result as a set; selection draws by random
/// index, so the order does not bias the outcome.
pub fn eligible_ids(roster: &[User], exclude: &HashSet<&str>) -> Vec<String> {
    roster
        .iter()
        .filter(|member| member.is_active && !exclude.contains(member.id.as_str()))
        .map(|member| member.id.clone())
        .collect()
}

/// Draw up to `quota` distinct ids from `candidates`, uniformly and
/// without replacement.
///
/// When the pool is no larger than the quota the whole pool is returned;
/// returning fewer than `quota` ids (including zero) is a valid outcome,
/// not an error. Otherwise this is a partial Fisher-Yates: pick a random
/// index from the shrinking remainder and swap-remove it, so every
/// candidate has equal probability and none is chosen twice.
pub fn select_reviewers(
    random: &dyn RandomSource,
    candidates: Vec<String>,
    quota: usize,
) -> Vec<String> {
    if candidates.len() <= quota {
        return candidates;
    }

    let mut remaining = candidates;
    let mut selected = Vec::with_capacity(quota);

    while selected.len() < quota && !remaining.is_empty() {
        let idx = random.index(remaining.len());
        selected.push(remaining.swap_remove(idx));
    }

    selected
}

/// Draw exactly one id from `candidates`, or `None` if the pool is empty.
pub fn pick_replacement(random: &dyn RandomSource, candidates: &[String]) -> Option<String> {
    if candidates.is_empty() {
        return None;
    }

    Some(candidates[random.index(candidates.len())].clone())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::random::{SequenceRandom, ThreadRandom};

    fn member(id: &str, active: bool) -> User {
        User {
            id: id.to_string(),
            username: format!("user-{id}"),
            team_name: "backend".to_string(),
            is_active: active,
        }
    }

    #[test]
    fn eligible_skips_inactive_and_excluded() {
        let roster = vec![
            member("a", true),
            member("b", false),
            member("c", true),
            member("d", true),
        ];
        let exclude: HashSet<&str> = ["d"].into_iter().collect();

        let ids = eligible_ids(&roster, &exclude);
        assert_eq!(ids, vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn eligible_output_set_independent_of_roster_order() {
        let mut roster = vec![member("a", true), member("b", true), member("c", false)];
        let exclude = HashSet::new();

        let forward: HashSet<String> = eligible_ids(&roster, &exclude).into_iter().collect();
        roster.reverse();
        let backward: HashSet<String> = eligible_ids(&roster, &exclude).into_iter().collect();

        assert_eq!(forward, backward);
    }

    #[test]
    fn small_pool_is_returned_whole() {
        let candidates = vec!["a".to_string(), "b".to_string()];
        let picked = select_reviewers(&SequenceRandom::zeroes(), candidates.clone(), 2);
        assert_eq!(picked, candidates);

        let picked = select_reviewers(&SequenceRandom::zeroes(), vec![], 2);
        assert!(picked.is_empty());
    }

    #[test]
    fn oversized_pool_follows_the_random_sequence() {
        let candidates: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();

        // First draw takes index 1 ("b"); "d" is swapped into its slot,
        // so the second draw over ["a", "d", "c"] at index 1 takes "d".
        let random = SequenceRandom::new(vec![1, 1]);
        let picked = select_reviewers(&random, candidates, 2);
        assert_eq!(picked, vec!["b".to_string(), "d".to_string()]);
    }

    #[test]
    fn pick_replacement_empty_pool_is_none() {
        assert_eq!(pick_replacement(&SequenceRandom::zeroes(), &[]), None);
    }

    #[test]
    fn pick_replacement_draws_by_index() {
        let candidates = vec!["x".to_string(), "y".to_string(), "z".to_string()];
        let random = SequenceRandom::new(vec![2]);
        assert_eq!(pick_replacement(&random, &candidates), Some("z".to_string()));
    }

    proptest! {
        #[test]
        fn selection_size_and_uniqueness(
            pool_size in 0usize..12,
            quota in 0usize..5,
        ) {
            let candidates: Vec<String> = (0..pool_size).map(|i| format!("u{i}")).collect();
            let picked = select_reviewers(&ThreadRandom, candidates.clone(), quota);

            prop_assert_eq!(picked.len(), quota.min(pool_size));

            let unique: HashSet<&String> = picked.iter().collect();
            prop_assert_eq!(unique.len(), picked.len());

            for id in &picked {
                prop_assert!(candidates.contains(id));
            }
        }

        #[test]
        fn eligible_never_contains_author_or_inactive(
            active_flags in proptest::collection::vec(any::<bool>(), 1..10),
        ) {
            let roster: Vec<User> = active_flags
                .iter()
                .enumerate()
                .map(|(i, &active)| member(&format!("u{i}"), active))
                .collect();
            let exclude: HashSet<&str> = ["u0"].into_iter().collect();

            let ids = eligible_ids(&roster, &exclude);
            prop_assert!(!ids.contains(&"u0".to_string()));
            for id in &ids {
                let user = roster.iter().find(|m| &m.id == id).unwrap();
                prop_assert!(user.is_active);
            }
        }
    }
}
