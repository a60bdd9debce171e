//! Error types for skill estimation.

use thiserror::Error;

/// Errors that can occur while configuring the rating system or running a
/// contest schedule.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in the future without breaking changes.
///
/// Configuration errors are fatal: they are raised once, when the system is
/// built, and mean no contest may be processed. Contest and numerical errors
/// are raised per contest and leave every player record untouched.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RatingError {
    /// Invalid constants or an untrustworthy numerical primitive.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Contest shape the schedule cannot rate (e.g. a single participant).
    #[error("invalid contest: {0}")]
    InvalidContest(String),

    /// A posterior came out non-finite or with non-positive variance.
    #[error("numerical error: {0}")]
    Numerical(String),

    /// Graph bookkeeping violated (programmer error, not user error).
    #[error("internal error: {0}")]
    Internal(String),
}

impl RatingError {
    /// Returns true for errors that must abort processing before any contest.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RatingError::Configuration(_))
    }
}
