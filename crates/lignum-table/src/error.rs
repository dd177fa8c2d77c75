//! Grammar table errors.

use std::io;

use super::VERSION;

/// Error while loading a grammar table. No partial table is ever produced.
#[derive(Debug, thiserror::Error)]
pub enum GrammarLoadError {
    #[error("file too small: {0} bytes (minimum 64)")]
    FileTooSmall(usize),
    #[error("invalid magic: expected LGNM")]
    InvalidMagic,
    #[error("grammar table version mismatch: found {found}, engine expects {VERSION}")]
    VersionMismatch { found: u32 },
    #[error("size mismatch: header says {header} bytes, got {actual}")]
    SizeMismatch { header: u32, actual: usize },
    #[error("checksum mismatch: header says {expected:#010x}, computed {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
    #[error("section `{0}` exceeds the file")]
    SectionOutOfBounds(&'static str),
    #[error("table decode error: {0}")]
    Decode(#[from] postcard::Error),
    #[error("invalid DFA #{index}: {reason}")]
    InvalidDfa { index: usize, reason: String },
    #[error("inconsistent table: {0}")]
    Inconsistent(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Error while writing a grammar table.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("table encode error: {0}")]
    Encode(#[from] postcard::Error),
    #[error("too many {what}: {count} (max {max})")]
    TooMany {
        what: &'static str,
        count: usize,
        max: usize,
    },
}
