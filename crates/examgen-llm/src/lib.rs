//! Groq chat-completions client.
//!
//! Implements [`TextCompletion`] for the pipeline's text steps and
//! [`OcrEngine`] for the vision-model page transcription fallback.
//! Only the OpenAI-compatible `/chat/completions` endpoint is used.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::json;

use examgen_core::llm::{CompletionError, CompletionRequest, ResponseFormat, TextCompletion};
use examgen_pdf::{OcrEngine, OcrError};

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const OCR_PROMPT: &str = "Transcribe all text visible in this exam or syllabus page. \
Output only the transcribed text, preserving line breaks. Do not add commentary.";

pub struct GroqClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
    /// Model used for vision transcription requests.
    vision_model: String,
}

impl GroqClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
            timeout: DEFAULT_TIMEOUT,
            vision_model: "llama-3.2-90b-vision-preview".to_string(),
        }
    }

    /// Point at a different OpenAI-compatible endpoint (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_vision_model(mut self, model: impl Into<String>) -> Self {
        self.vision_model = model.into();
        self
    }

    async fn post_chat(
        &self,
        body: serde_json::Value,
    ) -> Result<String, CompletionError> {
        if self.api_key.trim().is_empty() {
            return Err(CompletionError::MissingCredential);
        }

        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = resp.status();
        if status.as_u16() == 429 {
            tracing::warn!("Groq API rate limit hit");
            return Err(CompletionError::RateLimited);
        }
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Groq API request failed");
            return Err(CompletionError::Http(status.as_u16()));
        }

        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        data["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                CompletionError::Malformed("response has no message content".to_string())
            })
    }
}

impl TextCompletion for GroqClient {
    fn complete<'a>(
        &'a self,
        request: CompletionRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<String, CompletionError>> + Send + 'a>> {
        Box::pin(async move {
            let mut messages = Vec::new();
            if let Some(system) = request.system {
                messages.push(json!({"role": "system", "content": system}));
            }
            messages.push(json!({"role": "user", "content": request.prompt}));

            let mut body = json!({
                "model": request.model,
                "messages": messages,
                "temperature": request.temperature,
                "max_tokens": request.max_tokens,
            });
            if request.format == ResponseFormat::Json {
                body["response_format"] = json!({"type": "json_object"});
            }

            self.post_chat(body).await
        })
    }
}

impl OcrEngine for GroqClient {
    fn transcribe<'a>(
        &'a self,
        png: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<String, OcrError>> + Send + 'a>> {
        Box::pin(async move {
            let data_uri = format!("data:image/png;base64,{}", BASE64.encode(png));
            let body = json!({
                "model": self.vision_model,
                "messages": [{
                    "role": "user",
                    "content": [
                        {"type": "text", "text": OCR_PROMPT},
                        {"type": "image_url", "image_url": {"url": data_uri}},
                    ],
                }],
                "temperature": 0.0,
                "max_tokens": 4096,
            });

            self.post_chat(body).await.map_err(|e| match e {
                CompletionError::MissingCredential => {
                    OcrError::InitFailed("missing API credential".to_string())
                }
                other => OcrError::Transcription(other.to_string()),
            })
        })
    }
}
