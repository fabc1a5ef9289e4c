//! The single call the solving loop makes
//!
//! `generate` sends a system instruction and a conversation, streams the reply
//! to the console, and hands back the answer text. Any failure along the way,
//! or an empty answer, comes back as `None`.

use crate::console::Console;
use crate::conversation::Conversation;
use crate::error::{provider_error, Error, Result};
use crate::provider::{
    CompletionRequest, FinishReason, LlmProvider, ProviderError, StreamChunk, Usage, UsageTracker,
};
use std::sync::{Arc, Mutex};

/// Generate text given a system instruction and a conversation transcript
#[allow(async_fn_in_trait)]
pub trait Gateway {
    /// `None` means the call failed or produced no answer text
    async fn generate(
        &self,
        system_instruction: Option<&str>,
        conversation: &Conversation,
        verbose: bool,
    ) -> Option<String>;
}

/// Gateway over any streaming `LlmProvider`
pub struct ProviderGateway<P> {
    provider: P,
    console: Arc<Console>,
    usage: Mutex<UsageTracker>,
}

impl<P: LlmProvider> ProviderGateway<P> {
    pub fn new(provider: P, console: Arc<Console>) -> Self {
        Self {
            provider,
            console,
            usage: Mutex::new(UsageTracker::new()),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Token usage accumulated over every successful call so far
    pub fn usage(&self) -> UsageTracker {
        self.usage.lock().map(|u| u.clone()).unwrap_or_default()
    }

    async fn try_generate(
        &self,
        system_instruction: Option<&str>,
        conversation: &Conversation,
        verbose: bool,
    ) -> Result<String> {
        let name = self.provider.name();
        let console = &self.console;

        if verbose {
            console.line(format!("--- [Calling {}] ---", name))?;
            console.line("Thinking process:")?;
        }

        let request =
            CompletionRequest::new(conversation.clone()).with_system_instruction(system_instruction);
        tracing::debug!(provider = name, turns = conversation.len(), "streaming completion");

        let mut receiver = self
            .provider
            .stream(request)
            .await
            .map_err(|e| provider_error(name, e))?;

        let mut answer = String::new();
        let mut thinking_shown = false;
        let mut usage: Option<Usage> = None;
        let mut finish_reason = FinishReason::Unknown;

        while let Some(chunk) = receiver.next().await {
            match chunk {
                StreamChunk::Thought(text) => {
                    if !thinking_shown {
                        console.newline()?;
                        thinking_shown = true;
                    }
                    console.write(&text)?;
                }
                StreamChunk::Text(text) => {
                    if thinking_shown {
                        console.write("\n\nAnswer:\n")?;
                        thinking_shown = false;
                    }
                    console.write(&text)?;
                    answer.push_str(&text);
                }
                StreamChunk::Usage(u) => usage = Some(u),
                StreamChunk::Done { finish_reason: reason } => finish_reason = reason,
                StreamChunk::Error(e) => {
                    console.newline()?;
                    return Err(provider_error(name, ProviderError::Network(e)));
                }
            }
        }
        console.newline()?;

        if finish_reason == FinishReason::Length {
            tracing::warn!(provider = name, "answer truncated at the token limit");
        }

        if let Some(usage) = usage {
            self.usage
                .lock()
                .map_err(|_| Error::unexpected("usage tracker poisoned").with_operation("gateway::usage"))?
                .track(self.provider.default_model(), &usage);

            if verbose {
                console.newline()?;
                console.line(format!("Thinking Tokens: {}", usage.thinking_tokens))?;
                console.line(format!("Answer Tokens: {}", usage.completion_tokens))?;
                console.line(format!("Prompt Tokens: {}", usage.prompt_tokens))?;
                console.line(format!("Total Tokens: {}", usage.total_tokens))?;
            }
        }

        if verbose {
            console.line("--- [API Call Completed] ---\n")?;
        }

        Ok(answer)
    }
}

impl<P: LlmProvider> Gateway for ProviderGateway<P> {
    async fn generate(
        &self,
        system_instruction: Option<&str>,
        conversation: &Conversation,
        verbose: bool,
    ) -> Option<String> {
        match self.try_generate(system_instruction, conversation, verbose).await {
            Ok(answer) if answer.is_empty() => {
                tracing::warn!(provider = self.provider.name(), "model returned no answer text");
                None
            }
            Ok(answer) => Some(answer),
            Err(e) => {
                tracing::warn!(error = %e, retryable = e.is_retryable(), "gateway call failed");
                // Best effort: the console may be what failed.
                let _ = self.console.line(format!("\nAPI call failed: \n{}", e.message()));
                None
            }
        }
    }
}
