// ABOUTME: Specwright core library - shared domain types for the specification service
// ABOUTME: Provides conversation state, extraction results, and specification models

pub mod conversation;
pub mod extraction;
pub mod specification;

// Re-export main types
pub use conversation::{
    AnsweredQuestion, ConversationStage, ConversationState, MessageEntry, MessageRole, SkillLevel,
};
pub use extraction::{
    Entity, ExtractionResult, MissingInfo, RequirementCategory, RequirementsByCategory,
    SchemaViolation, TechnicalTerm,
};
pub use specification::ProjectSpecification;
