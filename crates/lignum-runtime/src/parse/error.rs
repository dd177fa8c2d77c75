//! Errors surfaced to callers of the parser.
//!
//! Malformed input text is never an error: it yields a tree with ERROR
//! nodes. Only cancellation and inconsistent edits reach the caller.

/// Why a parse was cancelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CancelReason {
    /// The operation budget was exhausted.
    #[error("operation budget of {0} exhausted")]
    Budget(u64),
    #[error("deadline passed")]
    Deadline,
    /// The caller's cancellation flag was set.
    #[error("cancellation requested")]
    Flag,
}

/// Inconsistent edit batch. The caller should fall back to a full parse.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("edit #{index} overlaps the previous edit")]
    Overlapping { index: usize },
    #[error("edit #{index} starts before the previous edit")]
    OutOfOrder { index: usize },
    #[error("edit #{index} ends at byte {end}, past the old text length {len}")]
    OutOfBounds { index: usize, end: usize, len: usize },
    #[error("edit #{index} has an end before its start")]
    Malformed { index: usize },
    #[error("new text is {actual} bytes, edits imply {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("edit was made against a tree of a different language")]
    LanguageMismatch,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("parse cancelled: {0}")]
    Cancelled(CancelReason),
    #[error(transparent)]
    Edit(#[from] EditError),
}

impl From<CancelReason> for ParseError {
    fn from(reason: CancelReason) -> Self {
        Self::Cancelled(reason)
    }
}
