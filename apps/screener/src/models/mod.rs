pub mod candidate;
pub mod resume;

pub use candidate::{MatchResult, ScoredCandidate};
pub use resume::ResumeFile;
