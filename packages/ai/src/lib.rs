// ABOUTME: Specwright AI library - reasoning backend abstraction and HTTP client
// ABOUTME: Provides the ReasoningBackend trait and the Anthropic-backed implementation

pub mod service;

pub use service::{AnthropicBackend, BackendConfig, BackendError, BackendResult, ReasoningBackend};
