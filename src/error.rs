use std::time::Duration;

/// Configuration-time failures. Invariant violations discovered while a
/// session is live (dereferencing a dead probe, a rejected clause, an
/// `extract` call with mismatched lengths) are programming bugs and
/// panic instead of returning `Err` — see `spec.md` §7.
#[derive(Debug, thiserror::Error)]
pub enum SweeperError {
    #[error("conflict budget must be non-negative, got {0}")]
    InvalidConflictBudget(i64),

    #[error("runtime limit must be a positive duration, got {0:?}")]
    InvalidRuntimeLimit(Duration),

    #[error("initial variable capacity must be at least 1")]
    InvalidVarCapacity,
}

pub type Result<T> = std::result::Result<T, SweeperError>;
