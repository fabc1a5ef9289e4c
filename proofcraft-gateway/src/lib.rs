//! # proofcraft gateway
//!
//! Everything the solving loop needs to talk to a model, and nothing more.
//!
//! ## Core Concepts
//! - **Conversation**: append-only list of `user` / `model` turns
//! - **Provider**: Trait-based LLM communication (Gemini, OpenAI-compatible / vLLM)
//! - **Gateway**: "generate text given a system instruction and a conversation";
//!   a failed or empty call is an absent answer, never an error
//! - **Console**: the progress stream, mirrored into an optional log file

pub mod console;
pub mod conversation;
pub mod error;
pub mod gateway;
pub mod provider;

pub use console::Console;
pub use conversation::{Conversation, Part, Role, Turn};
pub use error::{Error, ErrorKind, ErrorStatus, Result};
pub use gateway::{Gateway, ProviderGateway};
pub use provider::{
    Backend, CompletionRequest, FinishReason, GeminiProvider, LlmProvider,
    OpenAIProvider, ProviderConfig, ProviderError, ProviderType, SamplingParams, StreamChunk,
    StreamReceiver, ThinkingConfig, Usage, UsageTracker,
};
