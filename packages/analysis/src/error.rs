// ABOUTME: Error types for the analysis package
// ABOUTME: Distinguishes rejected input from an exhausted retry budget

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Empty or whitespace-only input, rejected before any backend call.
    #[error("Empty prompt provided")]
    EmptyPrompt,

    /// The retry budget is spent. Carries every intermediate cause, one per
    /// consumed attempt.
    #[error("Analysis failed after {attempts} attempts: {causes:?}")]
    Exhausted { attempts: u32, causes: Vec<String> },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
