// ABOUTME: Specwright analysis library - turns free-form project text into structured data
// ABOUTME: Provides the retrying extraction engine, prompts, and pure prioritization helpers

pub mod engine;
pub mod error;
pub mod prioritizer;
pub mod prompts;

pub use engine::{strip_code_fences, AnalysisEngine};
pub use error::{AnalysisError, Result};
pub use prioritizer::{
    prioritize, requirements_by_category, technical_translations, DEFAULT_MIN_CONFIDENCE,
};
