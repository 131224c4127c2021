// ABOUTME: Conversation state model for multi-turn specification dialogues
// ABOUTME: Defines lifecycle stages, message log entries, and the persisted conversation record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::extraction::ExtractionResult;

/// Lifecycle stage of a specification conversation.
///
/// Transitions: Collecting -> Clarifying -> Generating -> Completed, with
/// Collecting -> Generating allowed when analysis yields no open questions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStage {
    Collecting,
    Clarifying,
    Generating,
    Completed,
}

impl ConversationStage {
    /// Stable text encoding used for persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStage::Collecting => "collecting",
            ConversationStage::Clarifying => "clarifying",
            ConversationStage::Generating => "generating",
            ConversationStage::Completed => "completed",
        }
    }

    /// Parse a persisted stage value. Anything outside the four canonical
    /// stages is reported back as-is so callers can reject corrupt records.
    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "collecting" => Ok(ConversationStage::Collecting),
            "clarifying" => Ok(ConversationStage::Clarifying),
            "generating" => Ok(ConversationStage::Generating),
            "completed" => Ok(ConversationStage::Completed),
            other => Err(other.to_string()),
        }
    }
}

/// Self-reported experience level, used only to frame analysis prompts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Expert,
}

/// Role of the message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// A single entry in the append-only conversation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEntry {
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl MessageEntry {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// A clarification question the user has already answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    pub question: String,
    pub answer: String,
    pub answered_at: DateTime<Utc>,
}

/// Persisted state of one specification conversation.
///
/// `open_questions` is FIFO and owned exclusively by this conversation;
/// answers always target the head of the queue. `spec_id` is written at most
/// once, and is non-null exactly when the stage is Completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub id: String,
    pub user_id: String,
    pub stage: ConversationStage,
    pub initial_prompt: String,
    pub project_name: Option<String>,
    pub skill_level: Option<SkillLevel>,
    pub analyzed: bool,
    pub analysis_result: Option<ExtractionResult>,
    /// Terminal failure of the background analysis job, observable by callers
    /// polling the conversation while it is still Collecting.
    pub analysis_error: Option<String>,
    pub open_questions: Vec<String>,
    pub answered_questions: Vec<AnsweredQuestion>,
    pub message_log: Vec<MessageEntry>,
    pub spec_id: Option<String>,
    /// Optimistic-concurrency counter; bumped on every successful store write.
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    /// Create a fresh conversation in the Collecting stage.
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        initial_prompt: impl Into<String>,
        project_name: Option<String>,
        skill_level: Option<SkillLevel>,
    ) -> Self {
        let now = Utc::now();
        let initial_prompt = initial_prompt.into();
        Self {
            id: id.into(),
            user_id: user_id.into(),
            stage: ConversationStage::Collecting,
            message_log: vec![MessageEntry::new(MessageRole::User, initial_prompt.clone())],
            initial_prompt,
            project_name,
            skill_level,
            analyzed: false,
            analysis_result: None,
            analysis_error: None,
            open_questions: Vec::new(),
            answered_questions: Vec::new(),
            spec_id: None,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message to the log, preserving caller-observed order.
    pub fn log_message(&mut self, role: MessageRole, content: impl Into<String>) {
        self.message_log.push(MessageEntry::new(role, content));
    }

    /// The next question to ask, if any.
    pub fn current_question(&self) -> Option<&str> {
        self.open_questions.first().map(String::as_str)
    }

    /// Record an answer against the head of the question queue.
    ///
    /// Returns the question that was answered, or None when the queue is
    /// empty. Ordering is the only thing validated here: first in, first
    /// addressed.
    pub fn answer_current_question(&mut self, answer: impl Into<String>) -> Option<String> {
        if self.open_questions.is_empty() {
            return None;
        }
        let question = self.open_questions.remove(0);
        self.answered_questions.push(AnsweredQuestion {
            question: question.clone(),
            answer: answer.into(),
            answered_at: Utc::now(),
        });
        Some(question)
    }

    /// Display name for the project, defaulting when the user supplied none.
    pub fn display_name(&self) -> &str {
        self.project_name.as_deref().unwrap_or("Untitled Project")
    }
}
