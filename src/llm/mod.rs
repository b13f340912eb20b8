//! LLM integration for qa-forge.
//!
//! Provides an OpenAI-compatible chat-completion client used by the
//! generator chains. The client is consumed through the [`LlmProvider`]
//! trait so tests and alternative backends can swap in their own
//! implementation.

pub mod openai;

pub use openai::{
    Choice, CompletionRequest, CompletionResponse, LlmProvider, Message, OpenAiClient, Usage,
};

/// Request timeout applied to every model call, in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
