//! Capability trait for the generative text backend.
//!
//! The pipeline models each LLM-driven step (classification, pattern
//! extraction, generation, chat) as a call through [`TextCompletion`]
//! so tests can substitute deterministic fakes. Nothing here assumes a
//! specific provider beyond prompt-in/text-out plus one JSON-constrained
//! variant.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("missing API credential")]
    MissingCredential,
    #[error("rate limited (429)")]
    RateLimited,
    #[error("HTTP {0}")]
    Http(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Output mode requested from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    /// Constrain the completion to a single JSON object.
    Json,
}

/// One completion request. Borrowed fields keep per-fragment calls cheap.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub system: Option<&'a str>,
    pub prompt: &'a str,
    pub model: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
    pub format: ResponseFormat,
}

impl<'a> CompletionRequest<'a> {
    pub fn new(model: &'a str, prompt: &'a str) -> Self {
        Self {
            system: None,
            prompt,
            model,
            temperature: 0.7,
            max_tokens: 1024,
            format: ResponseFormat::Text,
        }
    }

    pub fn with_system(mut self, system: &'a str) -> Self {
        self.system = Some(system);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn json(mut self) -> Self {
        self.format = ResponseFormat::Json;
        self
    }
}

/// A backend that can turn a prompt into a completion string.
pub trait TextCompletion: Send + Sync {
    fn complete<'a>(
        &'a self,
        request: CompletionRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<String, CompletionError>> + Send + 'a>>;
}

pub mod mock {
    //! Scripted completion backend for tests.

    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::{CompletionError, CompletionRequest, TextCompletion};

    /// A configurable mock response for [`MockCompletion`].
    #[derive(Clone, Debug)]
    pub enum MockResponse {
        Text(String),
        Error(String),
        RateLimited,
    }

    /// A hand-rolled mock implementing [`TextCompletion`] for tests.
    ///
    /// Supports a fixed response, or a sequence of responses (one per
    /// call, repeating the last if exhausted), plus call counting.
    pub struct MockCompletion {
        responses: Mutex<Vec<MockResponse>>,
        fallback: MockResponse,
        call_count: AtomicUsize,
        /// Prompts seen, for asserting on request construction.
        prompts: Mutex<Vec<String>>,
    }

    impl MockCompletion {
        /// A mock that always returns `text`.
        pub fn always(text: impl Into<String>) -> Self {
            Self {
                responses: Mutex::new(Vec::new()),
                fallback: MockResponse::Text(text.into()),
                call_count: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        /// A mock that returns responses in order, repeating the last.
        pub fn with_sequence(mut responses: Vec<MockResponse>) -> Self {
            assert!(
                !responses.is_empty(),
                "sequence must have at least one response"
            );
            let fallback = responses.last().cloned().unwrap();
            // Reverse so we can pop() cheaply.
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                fallback,
                call_count: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }

        fn next_response(&self) -> MockResponse {
            let mut seq = self.responses.lock().unwrap();
            seq.pop().unwrap_or_else(|| self.fallback.clone())
        }
    }

    impl TextCompletion for MockCompletion {
        fn complete<'a>(
            &'a self,
            request: CompletionRequest<'a>,
        ) -> Pin<Box<dyn Future<Output = Result<String, CompletionError>> + Send + 'a>> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(request.prompt.to_string());
            let response = self.next_response();

            Box::pin(async move {
                match response {
                    MockResponse::Text(text) => Ok(text),
                    MockResponse::Error(msg) => Err(CompletionError::Transport(msg)),
                    MockResponse::RateLimited => Err(CompletionError::RateLimited),
                }
            })
        }
    }
}
