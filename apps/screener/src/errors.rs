use std::fmt;

use thiserror::Error;

/// Which remote call of a submission failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Upload,
    Match,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Upload => write!(f, "upload"),
            Phase::Match => write!(f, "match"),
        }
    }
}

/// Caller input violated a precondition. Raised before any state change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no files selected")]
    NoFilesSelected,
}

/// A remote call failed. `message` is already the best human-readable text
/// available (server detail, then transport message, then a generic fallback).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct WorkflowError {
    pub phase: Phase,
    pub message: String,
}

/// Everything `UploadMatchWorkflow::submit` can return instead of a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("A submission is already in progress")]
    Busy,

    #[error("Error during upload or matching: {0}")]
    Workflow(#[from] WorkflowError),
}
