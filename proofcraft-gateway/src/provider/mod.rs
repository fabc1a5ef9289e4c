//! # LLM Provider Interface
//!
//! A trait-based abstraction for communicating with LLM backends.
//!
//! ## Design
//! - `LlmProvider` trait defines the core interface
//! - Implementations for Gemini and OpenAI-compatible servers (OpenAI, vLLM, Ollama)
//! - `Backend` picks one of them at runtime from a `ProviderConfig`
//! - Streaming via async streams; thoughts and answer text arrive as separate chunks
//! - Usage tracking

pub mod backend;
pub mod gemini;
pub mod openai;
mod sse;

pub use backend::Backend;
pub use gemini::GeminiProvider;
pub use openai::OpenAIProvider;

use crate::conversation::Conversation;
use futures_util::StreamExt;
use std::collections::HashMap;
use std::pin::Pin;

// ============================================================================
// Core Types
// ============================================================================

/// Thinking configuration for models that expose their reasoning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThinkingConfig {
    pub budget_tokens: u32,
    pub include_thoughts: bool,
}

/// Sampling parameters sent with every request
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingParams {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    /// Only honoured by local engines (vLLM)
    pub min_p: Option<f32>,
    pub max_tokens: Option<usize>,
    pub thinking: Option<ThinkingConfig>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: Some(0.1),
            top_p: Some(1.0),
            min_p: None,
            max_tokens: Some(32768),
            thinking: Some(ThinkingConfig {
                budget_tokens: 32768,
                include_thoughts: true,
            }),
        }
    }
}

impl SamplingParams {
    /// Defaults for a locally hosted inference engine
    pub fn local() -> Self {
        Self {
            temperature: Some(0.1),
            top_p: Some(0.9),
            min_p: Some(0.05),
            max_tokens: Some(32768),
            thinking: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_thinking_budget(mut self, budget_tokens: u32) -> Self {
        self.thinking = Some(ThinkingConfig {
            budget_tokens,
            include_thoughts: true,
        });
        self
    }
}

/// One streamed completion: model and sampling come from the provider's config
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub system_instruction: Option<String>,
    pub conversation: Conversation,
}

impl CompletionRequest {
    pub fn new(conversation: Conversation) -> Self {
        Self {
            conversation,
            ..Default::default()
        }
    }

    pub fn with_system_instruction(mut self, instruction: Option<&str>) -> Self {
        self.system_instruction = instruction.map(str::to_string);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Unknown,
}

impl FinishReason {
    /// Parse both OpenAI (`stop`) and Gemini (`STOP`) spellings
    pub fn parse(reason: &str) -> Self {
        match reason.to_ascii_lowercase().as_str() {
            "stop" => FinishReason::Stop,
            "length" | "max_tokens" => FinishReason::Length,
            "content_filter" | "safety" | "recitation" => FinishReason::ContentFilter,
            _ => FinishReason::Unknown,
        }
    }
}

/// Token usage information
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub thinking_tokens: usize,
    pub total_tokens: usize,
}

/// A streaming chunk from the model
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    /// Reasoning text delta
    Thought(String),
    /// Answer text delta
    Text(String),
    /// Token accounting, usually near the end of the stream
    Usage(Usage),
    /// Stream finished
    Done { finish_reason: FinishReason },
    /// Error occurred
    Error(String),
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Error type for provider operations
#[derive(Debug)]
pub enum ProviderError {
    /// Network/connection error
    Network(String),
    /// API returned an error
    Api { status: u16, message: String },
    /// Failed to parse response
    Parse(String),
    /// Rate limited
    RateLimited { retry_after: Option<u64> },
    /// Invalid request
    InvalidRequest(String),
    /// Backend not reachable or overloaded
    Unavailable(String),
    /// Authentication failed
    AuthenticationFailed,
    /// Other error
    Other(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(e) => write!(f, "Network error: {}", e),
            Self::Api { status, message } => write!(f, "API error ({}): {}", status, message),
            Self::Parse(e) => write!(f, "Parse error: {}", e),
            Self::RateLimited { retry_after } => {
                write!(f, "Rate limited")?;
                if let Some(secs) = retry_after {
                    write!(f, " (retry after {}s)", secs)?;
                }
                Ok(())
            }
            Self::InvalidRequest(e) => write!(f, "Invalid request: {}", e),
            Self::Unavailable(e) => write!(f, "Provider unavailable: {}", e),
            Self::AuthenticationFailed => write!(f, "Authentication failed"),
            Self::Other(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, message: String, retry_after: Option<u64>) -> Self {
        match status {
            429 => ProviderError::RateLimited { retry_after },
            401 | 403 => ProviderError::AuthenticationFailed,
            400 => ProviderError::InvalidRequest(message),
            502..=504 => ProviderError::Unavailable(message),
            _ => ProviderError::Api { status, message },
        }
    }
}

/// The main LLM provider trait
#[allow(async_fn_in_trait)]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "gemini", "openai")
    fn name(&self) -> &str;

    /// Get the default model
    fn default_model(&self) -> &str;

    /// Send a completion request and stream the response
    async fn stream(&self, request: CompletionRequest) -> Result<StreamReceiver, ProviderError>;
}

/// Receiver for streaming responses
pub struct StreamReceiver {
    inner: Pin<Box<dyn futures_core::Stream<Item = StreamChunk> + Send>>,
}

impl StreamReceiver {
    pub fn new<S>(stream: S) -> Self
    where
        S: futures_core::Stream<Item = StreamChunk> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    /// Next chunk, or `None` once the stream is exhausted
    pub async fn next(&mut self) -> Option<StreamChunk> {
        self.inner.next().await
    }

}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for creating providers. Built once at process start.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider_type: ProviderType,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub default_model: Option<String>,
    pub headers: HashMap<String, String>,
    /// `None` leaves individual calls unbounded
    pub timeout_secs: Option<u64>,
    pub sampling: SamplingParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Gemini,
    OpenAI,
    Local,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Gemini => "gemini",
            ProviderType::OpenAI => "openai",
            ProviderType::Local => "local",
        }
    }
}

impl ProviderConfig {
    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::Gemini,
            api_key: Some(api_key.into()),
            base_url: Some(gemini::GEMINI_BASE_URL.into()),
            default_model: Some("gemini-2.5-pro".into()),
            headers: HashMap::new(),
            timeout_secs: None,
            sampling: SamplingParams::default(),
        }
    }

    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::OpenAI,
            api_key: Some(api_key.into()),
            base_url: Some("https://api.openai.com/v1".into()),
            default_model: Some("gpt-4o".into()),
            headers: HashMap::new(),
            timeout_secs: None,
            sampling: SamplingParams {
                thinking: None,
                ..SamplingParams::default()
            },
        }
    }

    /// A locally hosted OpenAI-compatible engine such as vLLM
    pub fn local(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::Local,
            api_key: None,
            base_url: Some(base_url.into()),
            default_model: Some(model.into()),
            headers: HashMap::new(),
            timeout_secs: None,
            sampling: SamplingParams::local(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    pub(crate) fn http_client(&self) -> crate::error::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        builder.build().map_err(|e| {
            crate::error::Error::config_invalid("failed to create HTTP client")
                .with_operation("provider::http_client")
                .set_source(e)
        })
    }
}

// ============================================================================
// Usage Tracking
// ============================================================================

/// Tracks token usage across multiple calls
#[derive(Debug, Clone, Default)]
pub struct UsageTracker {
    pub total_calls: usize,
    pub total_prompt_tokens: usize,
    pub total_completion_tokens: usize,
    pub total_thinking_tokens: usize,
    pub by_model: HashMap<String, Usage>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, model: &str, usage: &Usage) {
        self.total_calls += 1;
        self.total_prompt_tokens += usage.prompt_tokens;
        self.total_completion_tokens += usage.completion_tokens;
        self.total_thinking_tokens += usage.thinking_tokens;

        let entry = self.by_model.entry(model.to_string()).or_default();
        entry.prompt_tokens += usage.prompt_tokens;
        entry.completion_tokens += usage.completion_tokens;
        entry.thinking_tokens += usage.thinking_tokens;
        entry.total_tokens += usage.total_tokens;
    }

    pub fn total_tokens(&self) -> usize {
        self.total_prompt_tokens + self.total_completion_tokens + self.total_thinking_tokens
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_request_builder() {
        let request = CompletionRequest::new(Conversation::from_user("Hello"))
            .with_system_instruction(Some("Be rigorous"));

        assert_eq!(request.system_instruction.as_deref(), Some("Be rigorous"));
        assert_eq!(request.conversation.len(), 1);

        let request = request.with_system_instruction(None);
        assert!(request.system_instruction.is_none());
    }

    #[test]
    fn test_provider_config() {
        let config = ProviderConfig::gemini("key");
        assert_eq!(config.provider_type, ProviderType::Gemini);
        assert_eq!(config.default_model, Some("gemini-2.5-pro".into()));
        assert!(config.sampling.thinking.is_some());
        assert_eq!(config.timeout_secs, None);

        let config = ProviderConfig::local("http://localhost:8000/v1", "Qwen/Qwen3-1.7B");
        assert_eq!(config.provider_type, ProviderType::Local);
        assert_eq!(config.sampling.min_p, Some(0.05));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_finish_reason_parse() {
        assert_eq!(FinishReason::parse("STOP"), FinishReason::Stop);
        assert_eq!(FinishReason::parse("stop"), FinishReason::Stop);
        assert_eq!(FinishReason::parse("MAX_TOKENS"), FinishReason::Length);
        assert_eq!(FinishReason::parse("SAFETY"), FinishReason::ContentFilter);
        assert_eq!(FinishReason::parse("weird"), FinishReason::Unknown);
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ProviderError::from_status(429, String::new(), Some(3)),
            ProviderError::RateLimited { retry_after: Some(3) }
        ));
        assert!(matches!(
            ProviderError::from_status(503, "busy".into(), None),
            ProviderError::Unavailable(_)
        ));
        assert!(matches!(
            ProviderError::from_status(500, "boom".into(), None),
            ProviderError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn test_usage_tracker() {
        let mut tracker = UsageTracker::new();

        tracker.track("gemini-2.5-pro", &Usage {
            prompt_tokens: 100,
            completion_tokens: 50,
            thinking_tokens: 25,
            total_tokens: 175,
        });

        tracker.track("gemini-2.5-pro", &Usage {
            prompt_tokens: 200,
            completion_tokens: 100,
            thinking_tokens: 0,
            total_tokens: 300,
        });

        assert_eq!(tracker.total_calls, 2);
        assert_eq!(tracker.total_prompt_tokens, 300);
        assert_eq!(tracker.total_completion_tokens, 150);
        assert_eq!(tracker.total_tokens(), 475);
        assert_eq!(tracker.by_model["gemini-2.5-pro"].thinking_tokens, 25);
    }
}
