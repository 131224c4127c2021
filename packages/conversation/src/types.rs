// ABOUTME: Request and reply types for the conversation protocol surface
// ABOUTME: Transport-neutral shapes used by begin/continue/fetch operations

use serde::{Deserialize, Serialize};
use specwright_core::{ConversationStage, SkillLevel};

/// Input for starting a new specification conversation.
#[derive(Debug, Clone, Deserialize)]
pub struct BeginConversationInput {
    pub initial_prompt: String,
    pub project_name: Option<String>,
    pub skill_level: Option<SkillLevel>,
}

/// Reply to a conversation interaction.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationReply {
    pub conversation_id: String,
    pub message: String,
    pub stage: ConversationStage,
    /// Whether the assistant is waiting for user input.
    pub awaiting_user: bool,
    pub spec_ready: bool,
    pub spec_id: Option<String>,
}
