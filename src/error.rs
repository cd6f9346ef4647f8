use thiserror::Error;

use crate::domain::SeriesIdentity;

/// Binary-facing error: an exit code plus a human-readable message.
///
/// Exit codes:
/// - `2` configuration / usage
/// - `3` local I/O (exports, debug bundles, terminal)
/// - `4` data / pipeline failures
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let exit_code = match err {
            PipelineError::DuplicateColumn { .. } | PipelineError::UnknownColumn { .. } => 2,
            _ => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

/// Failures of the fetch -> normalize -> join -> project pipeline.
///
/// None of these are recovered locally; they surface at the panel boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// Transport failure or a non-success HTTP status.
    #[error("network error fetching {identity}: {message}")]
    Network {
        identity: SeriesIdentity,
        message: String,
    },

    /// Body is not JSON, or lacks the top-level shape of a series response.
    #[error("malformed response for {identity}: {reason}")]
    MalformedResponse {
        identity: SeriesIdentity,
        reason: String,
    },

    /// A required field is absent from an otherwise well-formed response.
    #[error("schema error in {identity}: {reason}")]
    Schema {
        identity: SeriesIdentity,
        reason: String,
    },

    /// One observation carries a value or date that cannot be coerced.
    #[error("bad {field} '{raw}' in observation {index} of {identity}")]
    DataQuality {
        identity: SeriesIdentity,
        index: usize,
        field: &'static str,
        raw: String,
    },

    #[error("duplicate column label '{label}'")]
    DuplicateColumn { label: String },

    #[error("unknown column label '{label}'")]
    UnknownColumn { label: String },
}

impl PipelineError {
    /// The series this error concerns, when it concerns exactly one.
    pub fn identity(&self) -> Option<&SeriesIdentity> {
        match self {
            PipelineError::Network { identity, .. }
            | PipelineError::MalformedResponse { identity, .. }
            | PipelineError::Schema { identity, .. }
            | PipelineError::DataQuality { identity, .. } => Some(identity),
            PipelineError::DuplicateColumn { .. } | PipelineError::UnknownColumn { .. } => None,
        }
    }
}
