// ABOUTME: Specwright conversation library - resumable multi-turn specification dialogues
// ABOUTME: Provides the state machine service, durable stores, and assembly orchestration

pub mod assembly;
pub mod error;
pub mod schema;
pub mod service;
pub mod store;
pub mod types;

pub use assembly::{DomainEnricher, EnrichedData, LlmEnricher, LlmSynthesizer, SpecSynthesizer};
pub use error::{ConversationError, Result};
pub use service::ConversationService;
pub use store::{ConversationStore, SpecificationStore};
pub use types::{BeginConversationInput, ConversationReply};
