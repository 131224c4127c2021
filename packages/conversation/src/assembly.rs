// ABOUTME: Collaborator seams for domain enrichment and specification synthesis
// ABOUTME: Includes the reasoning-backend-backed default implementations and their prompts

use std::sync::Arc;

use async_trait::async_trait;
use specwright_ai::ReasoningBackend;
use specwright_analysis::strip_code_fences;
use specwright_core::ConversationState;
use tracing::info;

use crate::error::{ConversationError, Result};

/// Domain knowledge gathered for a conversation before synthesis.
#[derive(Debug, Clone)]
pub struct EnrichedData {
    pub knowledge: serde_json::Value,
}

/// Enriches accumulated conversation data with external domain knowledge.
#[async_trait]
pub trait DomainEnricher: Send + Sync {
    async fn enrich(&self, conversation: &ConversationState) -> Result<EnrichedData>;
}

/// Synthesizes the final specification content from a conversation and its
/// enrichment. The payload is opaque to the state machine.
#[async_trait]
pub trait SpecSynthesizer: Send + Sync {
    async fn generate(
        &self,
        conversation: &ConversationState,
        enriched: &EnrichedData,
    ) -> Result<serde_json::Value>;
}

/// Plain-text digest of everything the conversation has accumulated, used as
/// prompt context by both collaborators.
fn conversation_digest(conversation: &ConversationState) -> String {
    let mut digest = format!(
        "PROJECT: {}\n\nINITIAL DESCRIPTION:\n{}\n",
        conversation.display_name(),
        conversation.initial_prompt
    );

    if let Some(analysis) = &conversation.analysis_result {
        digest.push_str(&format!("\nINTENT: {}\n", analysis.intent));
        if !analysis.entities.is_empty() {
            digest.push_str("\nENTITIES:\n");
            for entity in &analysis.entities {
                digest.push_str(&format!(
                    "- {} ({}): {}\n",
                    entity.name, entity.entity_type, entity.description
                ));
            }
        }
        if !analysis.requirements.is_empty() {
            digest.push_str("\nREQUIREMENTS:\n");
            for (category, requirements) in &analysis.requirements {
                for requirement in requirements {
                    digest.push_str(&format!("- [{}] {}\n", category, requirement));
                }
            }
        }
    }

    if !conversation.answered_questions.is_empty() {
        digest.push_str("\nCLARIFICATIONS:\n");
        for answered in &conversation.answered_questions {
            digest.push_str(&format!(
                "Q: {}\nA: {}\n",
                answered.question, answered.answer
            ));
        }
    }

    digest
}

fn enrichment_prompt(conversation: &ConversationState) -> String {
    format!(
        r#"You are a domain expert reviewing a project before its specification is written.

{}

Provide domain knowledge useful for writing the specification, as JSON:

{{
  "domain": "the product domain",
  "standards": ["relevant standards, regulations, or conventions"],
  "common_pitfalls": ["mistakes projects in this domain often make"],
  "recommended_practices": ["practices worth baking into the spec"]
}}

Respond with the JSON object only."#,
        conversation_digest(conversation)
    )
}

fn synthesis_prompt(conversation: &ConversationState, enriched: &EnrichedData) -> String {
    format!(
        r#"Write a complete project specification from the conversation below.

{}

DOMAIN KNOWLEDGE:
{}

Respond with JSON in this format:

{{
  "executive_summary": "...",
  "functional_requirements": ["..."],
  "non_functional_requirements": ["..."],
  "constraints": ["..."],
  "tech_stack": {{"frontend": "...", "backend": "...", "storage": "..."}},
  "milestones": [{{"name": "...", "description": "..."}}]
}}

Respond with the JSON object only."#,
        conversation_digest(conversation),
        enriched.knowledge
    )
}

/// Default enricher backed by the reasoning backend.
pub struct LlmEnricher {
    backend: Arc<dyn ReasoningBackend>,
}

impl LlmEnricher {
    pub fn new(backend: Arc<dyn ReasoningBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl DomainEnricher for LlmEnricher {
    async fn enrich(&self, conversation: &ConversationState) -> Result<EnrichedData> {
        info!("Enriching conversation data: {}", conversation.id);

        let raw = self
            .backend
            .invoke(&enrichment_prompt(conversation))
            .await
            .map_err(|e| ConversationError::Enrichment(e.to_string()))?;

        let knowledge: serde_json::Value = serde_json::from_str(strip_code_fences(&raw))
            .map_err(|e| ConversationError::Enrichment(format!("invalid JSON: {}", e)))?;

        Ok(EnrichedData { knowledge })
    }
}

/// Default synthesizer backed by the reasoning backend.
pub struct LlmSynthesizer {
    backend: Arc<dyn ReasoningBackend>,
}

impl LlmSynthesizer {
    pub fn new(backend: Arc<dyn ReasoningBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl SpecSynthesizer for LlmSynthesizer {
    async fn generate(
        &self,
        conversation: &ConversationState,
        enriched: &EnrichedData,
    ) -> Result<serde_json::Value> {
        info!("Synthesizing specification content: {}", conversation.id);

        let raw = self
            .backend
            .invoke(&synthesis_prompt(conversation, enriched))
            .await
            .map_err(|e| ConversationError::SpecGeneration(e.to_string()))?;

        serde_json::from_str(strip_code_fences(&raw))
            .map_err(|e| ConversationError::SpecGeneration(format!("invalid JSON: {}", e)))
    }
}
