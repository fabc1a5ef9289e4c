//! Google Gemini provider implementation
//!
//! Gemini takes the system instruction as a separate field, calls the
//! assistant role `model`, and can stream its reasoning as parts flagged
//! with `thought: true`.

use super::sse::SseBuffer;
use super::*;
use crate::conversation::Turn;
use crate::error::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini provider
pub struct GeminiProvider {
    client: Client,
    config: ProviderConfig,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = config.http_client()?;
        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(GEMINI_BASE_URL)
    }

    fn to_gemini_request(&self, request: &CompletionRequest) -> GeminiRequest {
        let sampling = &self.config.sampling;

        GeminiRequest {
            contents: request.conversation.turns().iter().map(GeminiContent::from).collect(),
            system_instruction: request.system_instruction.as_ref().map(|text| {
                GeminiSystemInstruction {
                    parts: vec![GeminiPart::text(text.clone())],
                }
            }),
            generation_config: GeminiGenerationConfig {
                temperature: sampling.temperature,
                top_p: sampling.top_p,
                max_output_tokens: sampling.max_tokens,
                thinking_config: sampling.thinking.map(|t| GeminiThinkingConfig {
                    include_thoughts: t.include_thoughts,
                    thinking_budget: t.budget_tokens,
                }),
            },
        }
    }

    async fn post(&self, url: String, body: &GeminiRequest) -> std::result::Result<reqwest::Response, ProviderError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ProviderError::AuthenticationFailed)?;

        let mut req = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(body);

        for (key, value) in &self.config.headers {
            req = req.header(key, value);
        }

        tracing::debug!(turns = body.contents.len(), "sending request to Gemini");

        let response = req
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, text, retry_after));
        }

        Ok(response)
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        self.config.default_model.as_deref().unwrap_or("gemini-2.5-pro")
    }

    async fn stream(&self, request: CompletionRequest) -> std::result::Result<StreamReceiver, ProviderError> {
        let body = self.to_gemini_request(&request);
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url(),
            self.default_model()
        );

        let response = self.post(url, &body).await?;

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
                    let parsed = match serde_json::from_str::<GeminiResponse>(&data) {
                        Ok(parsed) => parsed,
                        Err(e) => {
                            tracing::debug!(error = %e, "skipping unparseable Gemini chunk");
                            continue;
                        }
                    };
                    for chunk in parsed.into_chunks(&mut finish_reason) {
                        yield chunk;
                    }
                }
            }

            if let Ok(Some(data)) = sse.finish() {
                if let Ok(parsed) = serde_json::from_str::<GeminiResponse>(&data) {
                    for chunk in parsed.into_chunks(&mut finish_reason) {
                        yield chunk;
                    }
                }
            }

            yield StreamChunk::Done { finish_reason };
        };

        Ok(StreamReceiver::new(stream))
    }
}

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

impl From<&Turn> for GeminiContent {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role().as_str().to_string(),
            parts: turn
                .parts()
                .iter()
                .map(|p| GeminiPart::text(p.text.clone()))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

impl GeminiPart {
    fn text(text: String) -> Self {
        Self { text }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<GeminiThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiThinkingConfig {
    include_thoughts: bool,
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
}

impl GeminiResponse {
    /// Split one streamed response into thought/text/usage chunks
    fn into_chunks(self, finish_reason: &mut FinishReason) -> Vec<StreamChunk> {
        let mut chunks = Vec::new();

        if let Some(candidate) = self.candidates.into_iter().next() {
            if let Some(reason) = candidate.finish_reason.as_deref() {
                *finish_reason = FinishReason::parse(reason);
            }
            for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
                match part {
                    GeminiResponsePart { text: Some(text), thought: Some(true) } => {
                        chunks.push(StreamChunk::Thought(text))
                    }
                    GeminiResponsePart { text: Some(text), .. } if !text.is_empty() => {
                        chunks.push(StreamChunk::Text(text))
                    }
                    _ => {}
                }
            }
        }

        if let Some(usage) = self.usage_metadata {
            chunks.push(StreamChunk::Usage(usage.into()));
        }

        chunks
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
    thought: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
    #[serde(default)]
    thoughts_token_count: usize,
    #[serde(default)]
    total_token_count: usize,
}

impl From<GeminiUsage> for Usage {
    fn from(u: GeminiUsage) -> Self {
        Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            thinking_tokens: u.thoughts_token_count,
            total_tokens: u.total_token_count,
        }
    }
}
