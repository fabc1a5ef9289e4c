//! OpenAI-compatible provider implementation
//!
//! Works with OpenAI, vLLM, Ollama, and other OpenAI-compatible APIs. The
//! system instruction becomes a leading `system` message, `model` turns are
//! sent as `assistant`, and reasoning engines that stream
//! `reasoning_content` deltas have them surfaced as thoughts.

use super::sse::SseBuffer;
use super::*;
use crate::conversation::{Role, Turn};
use crate::error::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// OpenAI-compatible provider
pub struct OpenAIProvider {
    client: Client,
    config: ProviderConfig,
}

impl OpenAIProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = config.http_client()?;
        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or("https://api.openai.com/v1")
    }

    fn to_openai_request(&self, request: &CompletionRequest) -> OpenAIRequest {
        let sampling = &self.config.sampling;

        let mut messages = Vec::with_capacity(request.conversation.len() + 1);
        if let Some(system) = &request.system_instruction {
            messages.push(OpenAIMessage {
                role: "system".into(),
                content: Some(system.clone()),
            });
        }
        messages.extend(request.conversation.turns().iter().map(OpenAIMessage::from));

        OpenAIRequest {
            model: self.default_model().to_string(),
            messages,
            temperature: sampling.temperature,
            top_p: sampling.top_p,
            min_p: sampling.min_p,
            max_tokens: sampling.max_tokens,
            stream: true,
            stream_options: OpenAIStreamOptions { include_usage: true },
        }
    }

    async fn post(&self, body: &OpenAIRequest) -> std::result::Result<reqwest::Response, ProviderError> {
        let mut req = self
            .client
            .post(format!("{}/chat/completions", self.base_url()))
            .json(body);

        if let Some(api_key) = &self.config.api_key {
            if !api_key.is_empty() {
                req = req.header("Authorization", format!("Bearer {}", api_key));
            }
        }

        for (key, value) in &self.config.headers {
            req = req.header(key, value);
        }

        tracing::debug!(model = %body.model, messages = body.messages.len(), "sending chat completion");

        let response = req
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, text, None));
        }

        Ok(response)
    }
}

impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &str {
        match self.config.provider_type {
            ProviderType::Local => "local",
            _ => "openai",
        }
    }

    fn default_model(&self) -> &str {
        self.config.default_model.as_deref().unwrap_or("gpt-4o")
    }

    async fn stream(&self, request: CompletionRequest) -> std::result::Result<StreamReceiver, ProviderError> {
        let body = self.to_openai_request(&request);
        let response = self.post(&body).await?;

        let stream = async_stream::stream! {
            let mut byte_stream = response.bytes_stream();
            let mut sse = SseBuffer::new();
            let mut finish_reason = FinishReason::Unknown;

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield StreamChunk::Error(e.to_string());
                        return;
                    }
                };

                let payloads = match sse.push(&bytes) {
                    Ok(payloads) => payloads,
                    Err(e) => {
                        yield StreamChunk::Error(e.to_string());
                        return;
                    }
                };

                for data in payloads {
                    if data == "[DONE]" {
                        yield StreamChunk::Done { finish_reason };
                        return;
                    }

                    let chunk = match serde_json::from_str::<OpenAIStreamChunk>(&data) {
                        Ok(chunk) => chunk,
                        Err(e) => {
                            tracing::debug!(error = %e, "skipping unparseable stream chunk");
                            continue;
                        }
                    };

                    if let Some(choice) = chunk.choices.into_iter().next() {
                        if let Some(reasoning) = choice.delta.reasoning_content {
                            if !reasoning.is_empty() {
                                yield StreamChunk::Thought(reasoning);
                            }
                        }
                        if let Some(content) = choice.delta.content {
                            if !content.is_empty() {
                                yield StreamChunk::Text(content);
                            }
                        }
                        if let Some(reason) = choice.finish_reason.as_deref() {
                            finish_reason = FinishReason::parse(reason);
                        }
                    }

                    if let Some(usage) = chunk.usage {
                        yield StreamChunk::Usage(usage.into());
                    }
                }
            }

            yield StreamChunk::Done { finish_reason };
        };

        Ok(StreamReceiver::new(stream))
    }
}

// ============================================================================
// OpenAI API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    stream: bool,
    stream_options: OpenAIStreamOptions,
}

#[derive(Debug, Serialize)]
struct OpenAIStreamOptions {
    include_usage: bool,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

impl From<&Turn> for OpenAIMessage {
    fn from(turn: &Turn) -> Self {
        Self {
            role: match turn.role() {
                Role::User => "user".into(),
                Role::Model => "assistant".into(),
            },
            content: Some(turn.joined_text()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

impl From<OpenAIUsage> for Usage {
    fn from(u: OpenAIUsage) -> Self {
        Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            thinking_tokens: 0,
            total_tokens: u.total_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAIStreamChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIStreamChoice {
    delta: OpenAIStreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIStreamDelta {
    content: Option<String>,
    reasoning_content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Conversation;

    #[test]
    fn test_request_wire_format() {
        let provider = OpenAIProvider::new(ProviderConfig::local(
            "http://localhost:8000/v1",
            "Qwen/Qwen3-1.7B",
        ))
        .unwrap();
        let mut conversation = Conversation::from_user("Prove 1+1=2");
        conversation
            .push_model("draft")
            .push_user_parts(["correct it", "bug report"]);
        let request = CompletionRequest::new(conversation).with_system_instruction(Some("solve"));

        let json = serde_json::to_value(provider.to_openai_request(&request)).unwrap();

        assert_eq!(json["model"], "Qwen/Qwen3-1.7B");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][2]["role"], "assistant");
        assert_eq!(json["messages"][3]["content"], "correct it\n\nbug report");
        assert!((json["min_p"].as_f64().unwrap() - 0.05).abs() < 1e-6);
        assert_eq!(json["stream"], true);
        assert_eq!(json["stream_options"]["include_usage"], true);
        assert_eq!(provider.name(), "local");
    }

    #[tokio::test]
    async fn test_stream_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"reasoning_content\":\"let me see\"},\"finish_reason\":null}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Yes\"},\"finish_reason\":\"stop\"}]}\n\n",
            "data: {\"choices\":[],\"usage\":{\"prompt_tokens\":12,\"completion_tokens\":1,\"total_tokens\":13}}\n\n",
            "data: [DONE]\n\n",
        );
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await;

        let provider =
            OpenAIProvider::new(ProviderConfig::openai("sk-test").with_base_url(server.url())).unwrap();
        let mut receiver = provider
            .stream(CompletionRequest::new(Conversation::from_user("Is it complete?")))
            .await
            .unwrap();

        let mut chunks = Vec::new();
        while let Some(chunk) = receiver.next().await {
            chunks.push(chunk);
        }

        assert_eq!(chunks[0], StreamChunk::Thought("let me see".into()));
        assert_eq!(chunks[1], StreamChunk::Text("Yes".into()));
        assert!(matches!(chunks[2], StreamChunk::Usage(Usage { total_tokens: 13, .. })));
        assert_eq!(
            chunks[3],
            StreamChunk::Done {
                finish_reason: FinishReason::Stop
            }
        );
        assert_eq!(chunks.len(), 4);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(503)
            .with_body("engine warming up")
            .create_async()
            .await;

        let provider = OpenAIProvider::new(ProviderConfig::local(server.url(), "qwen")).unwrap();
        let err = provider
            .stream(CompletionRequest::new(Conversation::from_user("hi")))
            .await
            .err()
            .unwrap();

        assert!(matches!(err, ProviderError::Unavailable(ref m) if m == "engine warming up"));
    }
}
