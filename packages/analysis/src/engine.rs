// ABOUTME: Retrying extraction engine that enforces the ExtractionResult schema
// ABOUTME: Strict parse first, one bounded repair pass per attempt, typed failure when exhausted

use std::sync::Arc;

use specwright_ai::ReasoningBackend;
use specwright_core::{ExtractionResult, SkillLevel};
use tracing::{info, warn};

use crate::error::{AnalysisError, Result};
use crate::prompts;

const DEFAULT_MAX_RETRIES: u32 = 2;

/// Strip markdown code fences if present (```json ... ```).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let start = trimmed.find('\n').map(|i| i + 1).unwrap_or(0);
    let end = trimmed[start..]
        .rfind("```")
        .map(|i| i + start)
        .unwrap_or(trimmed.len());
    trimmed[start..end].trim()
}

/// Engine for analyzing project descriptions into structured extraction
/// results. Guarantees a schema-valid result or a typed failure after a
/// bounded number of attempts.
pub struct AnalysisEngine {
    backend: Arc<dyn ReasoningBackend>,
    max_retries: u32,
}

impl AnalysisEngine {
    pub fn new(backend: Arc<dyn ReasoningBackend>) -> Self {
        Self {
            backend,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(backend: Arc<dyn ReasoningBackend>, max_retries: u32) -> Self {
        Self {
            backend,
            max_retries,
        }
    }

    /// Analyze a project description.
    ///
    /// Each attempt issues one extraction call, strict-parses the output, and
    /// on parse failure asks the backend once to repair its own output. Both
    /// failing consumes one attempt. A success on any attempt short-circuits.
    pub async fn analyze(
        &self,
        description: &str,
        skill_level: Option<SkillLevel>,
    ) -> Result<ExtractionResult> {
        if description.trim().is_empty() {
            return Err(AnalysisError::EmptyPrompt);
        }

        let attempts = self.max_retries + 1;
        let prompt = prompts::extraction_prompt(description, skill_level);
        let mut causes = Vec::new();

        info!(
            "Analyzing prompt ({} chars, {} attempts budgeted)",
            description.len(),
            attempts
        );

        for attempt in 1..=attempts {
            let raw = match self.backend.invoke(&prompt).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Analysis attempt {} backend call failed: {}", attempt, e);
                    causes.push(format!("attempt {}: backend error: {}", attempt, e));
                    continue;
                }
            };

            let parse_error = match strict_parse(&raw) {
                Ok(result) => {
                    log_summary(&result);
                    return Ok(result);
                }
                Err(e) => e,
            };

            warn!(
                "Analysis attempt {} parse failed, trying repair pass: {}",
                attempt, parse_error
            );

            match self.repair(&raw, &parse_error).await {
                Ok(result) => {
                    log_summary(&result);
                    return Ok(result);
                }
                Err(repair_error) => {
                    causes.push(format!(
                        "attempt {}: {}; repair: {}",
                        attempt, parse_error, repair_error
                    ));
                }
            }
        }

        Err(AnalysisError::Exhausted { attempts, causes })
    }

    /// One bounded repair pass: ask the backend to reformat its prior output,
    /// then strict-parse the reformatted text.
    async fn repair(&self, raw: &str, parse_error: &str) -> std::result::Result<ExtractionResult, String> {
        let fixed = self
            .backend
            .invoke(&prompts::repair_prompt(raw, parse_error))
            .await
            .map_err(|e| format!("backend error: {}", e))?;
        strict_parse(&fixed)
    }
}

/// Strict parse: strip fences, deserialize, then enforce numeric bounds.
fn strict_parse(raw: &str) -> std::result::Result<ExtractionResult, String> {
    let json_text = strip_code_fences(raw);
    let result: ExtractionResult =
        serde_json::from_str(json_text).map_err(|e| format!("invalid JSON: {}", e))?;
    result.validate().map_err(|e| e.to_string())?;
    Ok(result)
}

fn log_summary(result: &ExtractionResult) {
    info!(
        "Analysis complete: {} entities, {} missing info items, {} technical terms",
        result.entities.len(),
        result.missing_info.len(),
        result.technical_terms.len()
    );
}
