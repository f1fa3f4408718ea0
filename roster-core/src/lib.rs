pub mod cascade;
pub mod error;
pub mod model;
pub mod random;
pub mod selection;

pub use error::DomainError;
pub use model::{
    AssignmentStats, DeactivationResult, NewPullRequest, PullRequest, PullRequestAssignment,
    PullRequestShort, PullRequestStatus, Team, TeamMember, User,
};
pub use random::{RandomSource, SequenceRandom, ThreadRandom};
