//! OCR engine trait and lazy-initializing service wrapper.
//!
//! Engines can be expensive to set up, so [`OcrService`] defers
//! initialization to the first transcription request and remembers the
//! outcome: a failed initialization is sticky, later callers get
//! [`OcrError::Unavailable`] immediately instead of retrying.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("OCR engine failed to initialize: {0}")]
    InitFailed(String),
    #[error("OCR engine unavailable")]
    Unavailable,
    #[error("transcription failed: {0}")]
    Transcription(String),
}

/// A backend that can transcribe a PNG-encoded page image to text.
pub trait OcrEngine: Send + Sync {
    fn transcribe<'a>(
        &'a self,
        png: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<String, OcrError>> + Send + 'a>>;
}

type EngineFactory = Box<
    dyn Fn() -> Pin<Box<dyn Future<Output = Result<Box<dyn OcrEngine>, OcrError>> + Send>>
        + Send
        + Sync,
>;

/// Lifecycle of the wrapped engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrState {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

struct Inner {
    state: OcrState,
    engine: Option<Box<dyn OcrEngine>>,
}

/// Lazily-initialized OCR engine holder.
pub struct OcrService {
    factory: Option<EngineFactory>,
    inner: Mutex<Inner>,
}

impl OcrService {
    /// Defer engine construction until the first transcription.
    pub fn new(factory: EngineFactory) -> Self {
        Self {
            factory: Some(factory),
            inner: Mutex::new(Inner {
                state: OcrState::Unloaded,
                engine: None,
            }),
        }
    }

    /// Wrap an already-constructed engine (starts in `Ready`).
    pub fn with_engine(engine: Box<dyn OcrEngine>) -> Self {
        Self {
            factory: None,
            inner: Mutex::new(Inner {
                state: OcrState::Ready,
                engine: Some(engine),
            }),
        }
    }

    pub async fn state(&self) -> OcrState {
        self.inner.lock().await.state
    }

    /// Transcribe one page image, initializing the engine on first use.
    pub async fn transcribe(&self, png: &[u8]) -> Result<String, OcrError> {
        let mut inner = self.inner.lock().await;

        if inner.state == OcrState::Unloaded {
            let Some(factory) = &self.factory else {
                inner.state = OcrState::Failed;
                return Err(OcrError::Unavailable);
            };
            inner.state = OcrState::Loading;
            tracing::info!("initializing OCR engine");
            match factory().await {
                Ok(engine) => {
                    inner.engine = Some(engine);
                    inner.state = OcrState::Ready;
                }
                Err(e) => {
                    tracing::error!(error = %e, "OCR engine initialization failed");
                    inner.state = OcrState::Failed;
                    return Err(e);
                }
            }
        }

        match inner.state {
            OcrState::Ready => {
                let engine = inner.engine.as_ref().ok_or(OcrError::Unavailable)?;
                engine.transcribe(png).await
            }
            _ => Err(OcrError::Unavailable),
        }
    }
}

pub mod mock {
    //! Scripted OCR engine for tests.

    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::{OcrEngine, OcrError};

    pub struct MockOcr {
        response: Option<String>,
        fail_first_n: usize,
        calls: AtomicUsize,
    }

    impl MockOcr {
        /// Always transcribe to `text`.
        pub fn always(text: impl Into<String>) -> Self {
            Self {
                response: Some(text.into()),
                fail_first_n: 0,
                calls: AtomicUsize::new(0),
            }
        }

        /// Fail the first call, then transcribe to `text`.
        pub fn fail_first(text: impl Into<String>) -> Self {
            Self {
                response: Some(text.into()),
                fail_first_n: 1,
                calls: AtomicUsize::new(0),
            }
        }

        /// Fail every call.
        pub fn always_fail() -> Self {
            Self {
                response: None,
                fail_first_n: usize::MAX,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl OcrEngine for MockOcr {
        fn transcribe<'a>(
            &'a self,
            _png: &'a [u8],
        ) -> Pin<Box<dyn Future<Output = Result<String, OcrError>> + Send + 'a>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if call < self.fail_first_n {
                    return Err(OcrError::Transcription("scripted failure".to_string()));
                }
                match &self.response {
                    Some(text) => Ok(text.clone()),
                    None => Err(OcrError::Transcription("scripted failure".to_string())),
                }
            })
        }
    }
}
