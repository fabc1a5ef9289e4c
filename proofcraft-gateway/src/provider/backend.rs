//! Runtime backend selection
//!
//! `LlmProvider` uses `async fn` and so cannot be boxed; the concrete provider
//! is picked once from the configuration and dispatched through this enum.

use super::*;
use crate::error::{missing_setting, Result};

/// One of the supported providers, chosen at startup
pub enum Backend {
    Gemini(GeminiProvider),
    OpenAI(OpenAIProvider),
}

impl Backend {
    pub fn from_config(config: ProviderConfig) -> Result<Self> {
        match config.provider_type {
            ProviderType::Gemini => {
                if config.api_key.as_deref().map_or(true, str::is_empty) {
                    return Err(missing_setting("api_key", "gemini"));
                }
                Ok(Backend::Gemini(GeminiProvider::new(config)?))
            }
            ProviderType::OpenAI => {
                if config.api_key.as_deref().map_or(true, str::is_empty) {
                    return Err(missing_setting("api_key", "openai"));
                }
                Ok(Backend::OpenAI(OpenAIProvider::new(config)?))
            }
            ProviderType::Local => {
                if config.base_url.is_none() {
                    return Err(missing_setting("base_url", "local"));
                }
                Ok(Backend::OpenAI(OpenAIProvider::new(config)?))
            }
        }
    }
}

impl LlmProvider for Backend {
    fn name(&self) -> &str {
        match self {
            Backend::Gemini(p) => p.name(),
            Backend::OpenAI(p) => p.name(),
        }
    }

    fn default_model(&self) -> &str {
        match self {
            Backend::Gemini(p) => p.default_model(),
            Backend::OpenAI(p) => p.default_model(),
        }
    }

    async fn stream(&self, request: CompletionRequest) -> std::result::Result<StreamReceiver, ProviderError> {
        match self {
            Backend::Gemini(p) => p.stream(request).await,
            Backend::OpenAI(p) => p.stream(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_gemini_requires_key() {
        let err = Backend::from_config(ProviderConfig::gemini("")).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(err.message().contains("api_key"));
    }

    #[test]
    fn test_local_needs_no_key() {
        let backend = Backend::from_config(ProviderConfig::local(
            "http://localhost:8000/v1",
            "Qwen/Qwen3-1.7B",
        ))
        .unwrap();
        assert_eq!(backend.name(), "local");
        assert_eq!(backend.default_model(), "Qwen/Qwen3-1.7B");
    }

    #[test]
    fn test_dispatch_by_type() {
        let backend = Backend::from_config(ProviderConfig::gemini("key")).unwrap();
        assert!(matches!(backend, Backend::Gemini(_)));
        assert_eq!(backend.default_model(), "gemini-2.5-pro");

        let backend = Backend::from_config(ProviderConfig::openai("sk").with_model("gpt-4.1")).unwrap();
        assert_eq!(backend.name(), "openai");
        assert_eq!(backend.default_model(), "gpt-4.1");
    }
}
