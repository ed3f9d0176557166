//! OpenAI-compatible chat completion adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::TranslatorConfig;
use super::error::CollaboratorError;
use super::traits::{BoundaryOracle, Translator};
use super::types::TranslationRequest;

/// Translator and boundary oracle speaking the `/chat/completions` protocol.
///
/// Works against OpenAI and any server exposing the same API (vLLM, Ollama,
/// llama.cpp server).
pub struct OpenAiTranslator {
    client: reqwest::Client,
    config: TranslatorConfig,
}

impl OpenAiTranslator {
    pub fn new(config: TranslatorConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, system: String, prompt: String) -> Result<String, CollaboratorError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system,
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let mut builder = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.config.api_base.trim_end_matches('/')
            ))
            .json(&request);
        if let Some(ref key) = self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() || e.is_request() {
                CollaboratorError::transient(e.to_string())
            } else {
                CollaboratorError::permanent(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            return Err(CollaboratorError::from_status(status, message));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::transient(format!("unreadable response: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| CollaboratorError::transient("response had no choices"))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct BoundaryReply {
    boundaries: Vec<usize>,
}

fn translation_system_prompt(request: &TranslationRequest) -> String {
    let mut prompt = format!(
        "You are a professional subtitle translator. Translate the user's sentence into {}. \
         Reply with the translation only, on a single line, without quotes or commentary.",
        request.target_language
    );
    if !request.context_hint.trim().is_empty() {
        prompt.push_str("\n\nBackground for this video:\n");
        prompt.push_str(request.context_hint.trim());
    }
    if !request.neighbors.is_empty() {
        prompt.push_str("\n\nPreceding subtitles and their translations:");
        for n in &request.neighbors {
            prompt.push_str(&format!("\n- {} => {}", n.source, n.translated));
        }
    }
    prompt
}

const BOUNDARY_SYSTEM_PROMPT: &str = "You split speech transcripts into sentences. \
The user sends numbered tokens, one per line. Reply with JSON of the form \
{\"boundaries\": [i, j, ...]} listing the numbers of tokens that end a sentence.";

fn boundary_prompt(window: &[String]) -> String {
    window
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{}: {}", i, t.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pulls the first JSON object out of a model reply, tolerating code fences
/// and surrounding prose.
fn parse_boundaries(reply: &str) -> Result<Vec<usize>, CollaboratorError> {
    let re = regex_lite::Regex::new(r"(?s)\{.*\}")
        .map_err(|e| CollaboratorError::permanent(e.to_string()))?;
    let json = re
        .find(reply)
        .map(|m| m.as_str())
        .ok_or_else(|| CollaboratorError::transient(format!("no JSON in reply: {}", reply)))?;
    let parsed: BoundaryReply = serde_json::from_str(json)
        .map_err(|e| CollaboratorError::transient(format!("{}: {}", e, json)))?;
    Ok(parsed.boundaries)
}

#[async_trait]
impl Translator for OpenAiTranslator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn translate(&self, request: &TranslationRequest) -> Result<String, CollaboratorError> {
        debug!(chars = request.text.len(), neighbors = request.neighbors.len(), "Translating");
        let text = self
            .complete(translation_system_prompt(request), request.text.clone())
            .await?;
        if text.is_empty() {
            return Err(CollaboratorError::transient("empty translation"));
        }
        Ok(text)
    }
}

#[async_trait]
impl BoundaryOracle for OpenAiTranslator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn boundaries(&self, window: &[String]) -> Result<Vec<usize>, CollaboratorError> {
        if window.is_empty() {
            return Ok(Vec::new());
        }
        let reply = self
            .complete(BOUNDARY_SYSTEM_PROMPT.to_string(), boundary_prompt(window))
            .await?;
        parse_boundaries(&reply)
    }
}
