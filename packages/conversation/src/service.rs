// ABOUTME: Conversation state machine driving collect -> clarify -> generate -> complete
// ABOUTME: Owns stage transitions, the question queue, background analysis, and assembly

use std::sync::Arc;

use nanoid::nanoid;
use specwright_analysis::{prioritize, AnalysisEngine};
use specwright_core::{
    ConversationStage, ConversationState, ExtractionResult, MessageRole, ProjectSpecification,
};
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::assembly::{DomainEnricher, SpecSynthesizer};
use crate::error::{ConversationError, Result};
use crate::store::{ConversationStore, SpecificationStore};
use crate::types::{BeginConversationInput, ConversationReply};

const ACK_MESSAGE: &str = "Thanks for your project description! I'm analyzing it now and will follow up with some clarifying questions momentarily.";
const ANALYZING_MESSAGE: &str =
    "I'm still analyzing your project description. Send another message in a moment.";
const ANALYSIS_FAILED_MESSAGE: &str =
    "I wasn't able to analyze your project description. Please rephrase it and start a new conversation.";
const COMPLETED_MESSAGE: &str = "I've completed your project specification! You can view the full details or ask me questions about it.";

/// Bound on reload-and-reapply cycles when an optimistic write loses a race.
const CAS_ATTEMPTS: u32 = 3;

/// Orchestrates one conversation per id: routes user messages by stage,
/// installs clarification questions produced by the analysis engine, and
/// assembles the final specification exactly once.
///
/// All collaborators are injected at construction; the service holds no
/// ambient global state and is cheap to clone.
#[derive(Clone)]
pub struct ConversationService {
    store: ConversationStore,
    specs: SpecificationStore,
    engine: Arc<AnalysisEngine>,
    enricher: Arc<dyn DomainEnricher>,
    synthesizer: Arc<dyn SpecSynthesizer>,
}

impl ConversationService {
    pub fn new(
        pool: SqlitePool,
        engine: Arc<AnalysisEngine>,
        enricher: Arc<dyn DomainEnricher>,
        synthesizer: Arc<dyn SpecSynthesizer>,
    ) -> Self {
        Self {
            store: ConversationStore::new(pool.clone()),
            specs: SpecificationStore::new(pool),
            engine,
            enricher,
            synthesizer,
        }
    }

    /// Start a new conversation from an initial project description.
    ///
    /// The description is analyzed in the background so this returns
    /// immediately; the caller learns the outcome from the conversation's
    /// subsequent state.
    pub async fn begin_conversation(
        &self,
        user_id: &str,
        input: BeginConversationInput,
    ) -> Result<ConversationReply> {
        if input.initial_prompt.trim().is_empty() {
            return Err(ConversationError::EmptyMessage);
        }

        let conversation_id = nanoid!(12);
        info!(
            "Starting new conversation {} for user {}",
            conversation_id, user_id
        );

        let conversation = ConversationState::new(
            &conversation_id,
            user_id,
            &input.initial_prompt,
            input.project_name,
            input.skill_level,
        );
        self.store.insert(&conversation).await?;

        let service = self.clone();
        let job_id = conversation_id.clone();
        tokio::spawn(async move {
            service.run_initial_analysis(&job_id).await;
        });

        Ok(ConversationReply {
            conversation_id,
            message: ACK_MESSAGE.to_string(),
            stage: ConversationStage::Collecting,
            awaiting_user: false,
            spec_ready: false,
            spec_id: None,
        })
    }

    /// Process a user message in an existing conversation, dispatching on the
    /// current stage.
    pub async fn continue_conversation(
        &self,
        user_id: &str,
        conversation_id: &str,
        message: &str,
    ) -> Result<ConversationReply> {
        if message.trim().is_empty() {
            return Err(ConversationError::EmptyMessage);
        }

        let conversation = self
            .store
            .get(conversation_id)
            .await?
            .ok_or_else(|| ConversationError::ConversationNotFound(conversation_id.to_string()))?;

        if conversation.user_id != user_id {
            return Err(ConversationError::Forbidden);
        }

        info!(
            "Processing message in conversation {} (stage: {:?})",
            conversation_id, conversation.stage
        );

        let message = message.to_string();
        match conversation.stage {
            ConversationStage::Collecting => {
                let updated = self
                    .apply_update(conversation_id, |c| {
                        c.log_message(MessageRole::User, message.clone());
                    })
                    .await?;

                // Analysis that found nothing missing parks the conversation
                // at the Collecting->Generating edge; a reverted assembly
                // failure lands back here too. Either way the next message
                // drives assembly.
                if updated.analyzed && updated.open_questions.is_empty() {
                    return self.run_assembly(updated).await;
                }

                let reply_message = if updated.analysis_error.is_some() {
                    ANALYSIS_FAILED_MESSAGE
                } else {
                    ANALYZING_MESSAGE
                };
                Ok(ConversationReply {
                    conversation_id: conversation_id.to_string(),
                    message: reply_message.to_string(),
                    stage: updated.stage,
                    awaiting_user: false,
                    spec_ready: false,
                    spec_id: None,
                })
            }

            ConversationStage::Clarifying => {
                let updated = self
                    .apply_update(conversation_id, |c| apply_clarification(c, &message))
                    .await?;

                // A concurrent writer may have completed the conversation
                // between dispatch and the write above; the guarded mutation
                // left the record untouched, so answer from the spec.
                if updated.stage == ConversationStage::Completed {
                    return self.reply_from_completed(&updated).await;
                }

                match updated.current_question() {
                    Some(question) => Ok(ConversationReply {
                        conversation_id: conversation_id.to_string(),
                        message: question.to_string(),
                        stage: updated.stage,
                        awaiting_user: true,
                        spec_ready: false,
                        spec_id: None,
                    }),
                    None => self.run_assembly(updated).await,
                }
            }

            ConversationStage::Generating => {
                let updated = self
                    .apply_update(conversation_id, |c| {
                        c.log_message(MessageRole::User, message.clone());
                    })
                    .await?;
                self.run_assembly(updated).await
            }

            ConversationStage::Completed => self.reply_from_completed(&conversation).await,
        }
    }

    /// Fetch a completed specification, enforcing ownership.
    pub async fn get_specification(
        &self,
        user_id: &str,
        spec_id: &str,
    ) -> Result<ProjectSpecification> {
        let spec = self
            .specs
            .get(spec_id)
            .await?
            .ok_or_else(|| ConversationError::SpecificationNotFound(spec_id.to_string()))?;

        if spec.user_id != user_id {
            return Err(ConversationError::Forbidden);
        }

        Ok(spec)
    }

    /// Background job: analyze the initial prompt and install the question
    /// queue. Failures are recorded on the conversation, never surfaced to
    /// the caller that triggered the job.
    async fn run_initial_analysis(&self, conversation_id: &str) {
        let conversation = match self.store.get(conversation_id).await {
            Ok(Some(conversation)) => conversation,
            Ok(None) => {
                error!("Conversation {} not found for analysis", conversation_id);
                return;
            }
            Err(e) => {
                error!(
                    "Failed to load conversation {} for analysis: {}",
                    conversation_id, e
                );
                return;
            }
        };

        match self
            .engine
            .analyze(&conversation.initial_prompt, conversation.skill_level)
            .await
        {
            Ok(result) => {
                if let Err(e) = self.install_analysis(conversation_id, result).await {
                    error!(
                        "Failed to install analysis results for {}: {}",
                        conversation_id, e
                    );
                }
            }
            Err(e) => {
                warn!("Analysis failed for conversation {}: {}", conversation_id, e);
                let cause = e.to_string();
                if let Err(store_err) = self
                    .apply_update(conversation_id, |c| {
                        c.analysis_error = Some(cause.clone());
                    })
                    .await
                {
                    error!(
                        "Failed to record analysis failure for {}: {}",
                        conversation_id, store_err
                    );
                }
            }
        }
    }

    /// Install an extraction result: question queue in priority order, then
    /// Clarifying, or straight to Generating when nothing is missing.
    async fn install_analysis(
        &self,
        conversation_id: &str,
        result: ExtractionResult,
    ) -> Result<()> {
        let questions: Vec<String> = prioritize(&result)
            .into_iter()
            .map(|item| item.question)
            .collect();

        info!(
            "Installing analysis for conversation {}: {} open questions",
            conversation_id,
            questions.len()
        );

        self.apply_update(conversation_id, |c| {
            c.analyzed = true;
            c.analysis_result = Some(result.clone());
            c.analysis_error = None;
            c.open_questions = questions.clone();
            c.stage = if questions.is_empty() {
                ConversationStage::Generating
            } else {
                ConversationStage::Clarifying
            };
            if let Some(first) = c.current_question().map(str::to_string) {
                c.log_message(MessageRole::Assistant, first);
            }
        })
        .await?;

        Ok(())
    }

    /// Reply for a conversation whose specification already exists; performs
    /// no writes.
    async fn reply_from_completed(
        &self,
        conversation: &ConversationState,
    ) -> Result<ConversationReply> {
        let spec_id = conversation
            .spec_id
            .clone()
            .ok_or_else(|| ConversationError::SpecificationNotFound(conversation.id.clone()))?;
        let spec = self
            .specs
            .get(&spec_id)
            .await?
            .ok_or_else(|| ConversationError::SpecificationNotFound(spec_id.clone()))?;

        Ok(ConversationReply {
            conversation_id: conversation.id.clone(),
            message: format!(
                "Your project '{}' specification is complete. You can view the full details using the spec id.",
                spec.project_name
            ),
            stage: ConversationStage::Completed,
            awaiting_user: false,
            spec_ready: true,
            spec_id: Some(spec.id),
        })
    }

    /// Assemble the final specification: enrich, synthesize, reserve, persist.
    ///
    /// Write-once: the artifact id is reserved on the conversation through the
    /// revision check before anything is saved, so of two concurrent
    /// assemblies only the one whose id lands ever writes a specification
    /// row; the other returns the winning id. On any failure the stage
    /// reverts to its pre-Generating value so a later message can retry.
    async fn run_assembly(&self, conversation: ConversationState) -> Result<ConversationReply> {
        if let Some(spec_id) = conversation.spec_id.clone() {
            return Ok(completed_reply(&conversation.id, spec_id));
        }

        let revert_stage = match conversation.stage {
            ConversationStage::Generating => {
                if conversation.answered_questions.is_empty() {
                    ConversationStage::Collecting
                } else {
                    ConversationStage::Clarifying
                }
            }
            other => other,
        };

        let conversation = self
            .apply_update(&conversation.id, |c| {
                if c.spec_id.is_none() {
                    c.stage = ConversationStage::Generating;
                }
            })
            .await?;
        if let Some(spec_id) = conversation.spec_id.clone() {
            return Ok(completed_reply(&conversation.id, spec_id));
        }

        let spec = match self.build_specification(&conversation).await {
            Ok(spec) => spec,
            Err(e) => {
                warn!(
                    "Specification assembly failed for conversation {}, reverting to {:?}: {}",
                    conversation.id, revert_stage, e
                );
                if let Err(revert_err) = self
                    .apply_update(&conversation.id, |c| {
                        if c.spec_id.is_none() {
                            c.stage = revert_stage;
                        }
                    })
                    .await
                {
                    error!(
                        "Failed to revert stage for conversation {}: {}",
                        conversation.id, revert_err
                    );
                }
                return Err(e);
            }
        };

        // Reserve the artifact id before persisting it. The closure attaches
        // only when no id is present, so a racer that reloads a reserved
        // conversation leaves it untouched and skips its own save below.
        let spec_id = spec.id.clone();
        let updated = self
            .apply_update(&conversation.id, |c| {
                if c.spec_id.is_none() {
                    c.spec_id = Some(spec_id.clone());
                    c.stage = ConversationStage::Completed;
                    c.log_message(MessageRole::Assistant, COMPLETED_MESSAGE);
                }
            })
            .await?;

        let attached = updated.spec_id.clone().unwrap_or_else(|| spec_id.clone());
        if attached == spec_id {
            if let Err(e) = self.specs.save(&spec).await {
                warn!(
                    "Failed to persist specification for conversation {}, releasing reservation: {}",
                    conversation.id, e
                );
                if let Err(revert_err) = self
                    .apply_update(&conversation.id, |c| {
                        if c.spec_id.as_deref() == Some(spec_id.as_str()) {
                            c.spec_id = None;
                            c.stage = revert_stage;
                        }
                    })
                    .await
                {
                    error!(
                        "Failed to release spec reservation for conversation {}: {}",
                        conversation.id, revert_err
                    );
                }
                return Err(e);
            }
        }

        info!(
            "Generated specification {} for conversation {}",
            attached, conversation.id
        );
        Ok(completed_reply(&conversation.id, attached))
    }

    async fn build_specification(
        &self,
        conversation: &ConversationState,
    ) -> Result<ProjectSpecification> {
        let enriched = self.enricher.enrich(conversation).await?;
        let content = self.synthesizer.generate(conversation, &enriched).await?;

        Ok(ProjectSpecification::new(
            nanoid!(12),
            &conversation.user_id,
            conversation.display_name(),
            content,
        ))
    }

    /// Load-mutate-write with the store's revision check, reloading and
    /// reapplying the mutation a bounded number of times when a concurrent
    /// writer wins the race.
    async fn apply_update<F>(&self, conversation_id: &str, mut mutate: F) -> Result<ConversationState>
    where
        F: FnMut(&mut ConversationState),
    {
        for attempt in 1..=CAS_ATTEMPTS {
            let mut conversation = self.store.get(conversation_id).await?.ok_or_else(|| {
                ConversationError::ConversationNotFound(conversation_id.to_string())
            })?;

            mutate(&mut conversation);

            match self.store.update(&mut conversation).await {
                Ok(()) => return Ok(conversation),
                Err(ConversationError::RevisionConflict(_)) if attempt < CAS_ATTEMPTS => {
                    warn!(
                        "Revision conflict on conversation {} (attempt {}), retrying",
                        conversation_id, attempt
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(ConversationError::RevisionConflict(
            conversation_id.to_string(),
        ))
    }
}

/// Mutation applied when a Clarifying-stage message answers the head
/// question. Guarded on the stage: `apply_update` re-runs this closure on
/// freshly reloaded state after a revision conflict, and a reload that a
/// concurrent writer has already moved past Clarifying must not be mutated.
fn apply_clarification(conversation: &mut ConversationState, message: &str) {
    if conversation.stage != ConversationStage::Clarifying {
        return;
    }
    conversation.log_message(MessageRole::User, message);
    conversation.answer_current_question(message);
    if let Some(next) = conversation.current_question().map(str::to_string) {
        conversation.log_message(MessageRole::Assistant, next);
    } else {
        conversation.stage = ConversationStage::Generating;
    }
}

fn completed_reply(conversation_id: &str, spec_id: String) -> ConversationReply {
    ConversationReply {
        conversation_id: conversation_id.to_string(),
        message: COMPLETED_MESSAGE.to_string(),
        stage: ConversationStage::Completed,
        awaiting_user: false,
        spec_ready: true,
        spec_id: Some(spec_id),
    }
}
