//! Resume screening client.
//!
//! Uploads a batch of resumes to a remote scoring service, asks it to score
//! them against a job description, and turns the raw scores into a
//! de-duplicated, ranked report.
//!
//! - `workflow`: the upload-then-match state machine.
//! - `aggregator`: pure de-duplication and ranking of scored candidates.
//! - `scoring_client`: the `ScoringService` seam and its HTTP implementation.
//! - `report`: display-ready views over a ranked report.
//! - `snapshot`: on-disk hand-off of raw match results between runs.

pub mod aggregator;
pub mod config;
pub mod errors;
pub mod models;
pub mod report;
pub mod scoring_client;
pub mod snapshot;
pub mod workflow;

pub use aggregator::{reduce, RankedReport};
pub use config::Config;
pub use errors::{Phase, SubmitError, ValidationError, WorkflowError};
pub use models::{MatchResult, ResumeFile, ScoredCandidate};
pub use scoring_client::{HttpScoringClient, ScoringService, ServiceError};
pub use workflow::{UploadMatchWorkflow, WorkflowState};
