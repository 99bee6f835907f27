use thiserror::Error;

use crate::types::Axis;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed motion block: {message}")]
    MalformedMotionBlock { message: String },

    #[error("unbalanced hierarchy at line {line}: closing brace without an open joint")]
    UnbalancedHierarchy { line: usize },

    #[error("joints claim {claimed} channels but the motion block has {available} columns")]
    ChannelCountMismatch { claimed: usize, available: usize },

    #[error("joint '{joint}' has no {axis}rotation channel")]
    MissingRotationChannel { joint: String, axis: Axis },

    #[error("malformed hierarchy at line {line}: {message}")]
    MalformedHierarchy { line: usize, message: String },

    #[error("invalid number '{value}' at line {line}")]
    InvalidNumber { line: usize, value: String },

    #[error("no MOTION section found")]
    MissingMotionSection,

    #[error("failed to read bvh file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid line pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl Error {
    pub(crate) fn motion(message: impl Into<String>) -> Self {
        Error::MalformedMotionBlock {
            message: message.into(),
        }
    }

    pub(crate) fn hierarchy(line: usize, message: impl Into<String>) -> Self {
        Error::MalformedHierarchy {
            line,
            message: message.into(),
        }
    }
}
