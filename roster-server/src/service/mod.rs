//! Business logic over the repository traits.
//!
//! Each service owns the validation and sequencing for one slice of the
//! API; randomness comes in through [`roster_core::RandomSource`] so the
//! tests can drive selection deterministically.

pub mod pull_request;
pub mod team;
pub mod user;

pub use pull_request::PullRequestService;
pub use team::TeamService;
pub use user::UserService;

use roster_core::DomainError;

/// Reject empty or whitespace-only request fields before they reach
/// storage, returning the trimmed value.
pub(crate) fn required_field<'a>(
    value: &'a str,
    field: &'static str,
) -> Result<&'a str, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::required(field));
    }
    Ok(trimmed)
}
