//! Domain entities.

mod comment;
mod post;

pub use comment::*;
pub use post::*;

use chrono::{DateTime, SubsecRound, Utc};

/// Current time truncated to microseconds, the precision the store keeps.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
