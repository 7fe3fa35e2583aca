//! PDF text extraction with layered fallbacks.
//!
//! The text layer is always tried first. If the result looks garbled
//! (too short, or dominated by slash noise that some scanners emit),
//! pages are rasterized and sent through an OCR engine. Per-page OCR
//! failures are skipped; the run fails only when nothing at all could
//! be read.

use std::path::Path;

use thiserror::Error;

pub mod ocr;

pub use ocr::{OcrEngine, OcrError, OcrService, OcrState};

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("failed to rasterize page: {0}")]
    RasterError(String),
    #[error("could not extract any text: {0}")]
    ExtractionFailed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for PDF text-layer extraction backends.
pub trait PdfBackend: Send + Sync {
    /// Extract the full text content of a PDF file.
    fn extract_text(&self, path: &Path) -> Result<String, PdfError>;
}

/// Trait for rendering PDF pages to PNG-encoded images.
pub trait PageRasterizer: Send + Sync {
    /// Render every page of a PDF to a PNG byte buffer.
    fn rasterize_pages(&self, path: &Path) -> Result<Vec<Vec<u8>>, PdfError>;
}

/// Heuristics deciding when a text layer is unusable.
#[derive(Debug, Clone)]
pub struct GarbleRules {
    /// Text shorter than this is treated as an empty layer.
    pub min_text_len: usize,
    /// Slash characters above this ratio indicate CMap-less fonts
    /// decoded to noise.
    pub max_noise_ratio: f64,
}

impl Default for GarbleRules {
    fn default() -> Self {
        Self {
            min_text_len: 75,
            max_noise_ratio: 0.1,
        }
    }
}

/// Whether extracted text is too degraded to use.
pub fn looks_garbled(text: &str, rules: &GarbleRules) -> bool {
    let trimmed = text.trim();
    if trimmed.len() < rules.min_text_len {
        return true;
    }
    let slashes = trimmed.chars().filter(|&c| c == '/').count();
    slashes as f64 / trimmed.chars().count() as f64 > rules.max_noise_ratio
}

/// OCR fallback wiring: a rasterizer plus a transcription service.
pub struct OcrFallback<'a> {
    pub rasterizer: &'a dyn PageRasterizer,
    pub service: &'a OcrService,
}

/// Extract a document's text, falling back to OCR when the text layer
/// is missing or garbled.
///
/// OCR output tags each page with a `--- Page N ---` marker so that
/// downstream splitting still sees document order. Pages whose OCR
/// call fails are skipped with a warning.
pub async fn extract_document_text(
    path: &Path,
    backend: &dyn PdfBackend,
    ocr: Option<OcrFallback<'_>>,
    rules: &GarbleRules,
) -> Result<String, PdfError> {
    let layer_failure = match backend.extract_text(path) {
        Ok(text) if !looks_garbled(&text, rules) => return Ok(text),
        Ok(text) => {
            tracing::warn!(
                path = %path.display(),
                len = text.trim().len(),
                "text layer looks garbled, trying OCR"
            );
            format!("text layer looks garbled ({} chars)", text.trim().len())
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "text layer extraction failed");
            format!("text layer extraction failed: {e}")
        }
    };

    let Some(ocr) = ocr else {
        return Err(PdfError::ExtractionFailed(format!(
            "{layer_failure}, OCR is disabled"
        )));
    };

    let pages = ocr.rasterizer.rasterize_pages(path)?;
    let total = pages.len();
    let mut transcribed = Vec::new();

    for (index, png) in pages.into_iter().enumerate() {
        match ocr.service.transcribe(&png).await {
            Ok(text) if !text.trim().is_empty() => {
                transcribed.push(format!("--- Page {} ---\n{}", index + 1, text.trim()));
            }
            Ok(_) => {
                tracing::debug!(page = index + 1, "OCR returned empty page");
            }
            Err(e) => {
                tracing::warn!(page = index + 1, total, error = %e, "OCR failed for page, skipping");
            }
        }
    }

    if transcribed.is_empty() {
        return Err(PdfError::ExtractionFailed(
            "OCR produced no text for any page".to_string(),
        ));
    }
    Ok(transcribed.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::mock::MockOcr;

    struct FixedBackend(Result<String, String>);

    impl PdfBackend for FixedBackend {
        fn extract_text(&self, _path: &Path) -> Result<String, PdfError> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(msg) => Err(PdfError::ExtractionError(msg.clone())),
            }
        }
    }

    struct FixedRasterizer(usize);

    impl PageRasterizer for FixedRasterizer {
        fn rasterize_pages(&self, _path: &Path) -> Result<Vec<Vec<u8>>, PdfError> {
            Ok(vec![vec![0u8; 8]; self.0])
        }
    }

    fn long_clean_text() -> String {
        "Module 1 covers introductory algebra over the course of eight lecture hours."
            .repeat(3)
    }

    #[test]
    fn short_text_is_garbled() {
        assert!(looks_garbled("abc", &GarbleRules::default()));
        assert!(!looks_garbled(&long_clean_text(), &GarbleRules::default()));
    }

    #[test]
    fn slash_noise_is_garbled() {
        let noisy = "/g123/g45 ".repeat(20);
        assert!(looks_garbled(&noisy, &GarbleRules::default()));
    }

    #[tokio::test]
    async fn clean_text_layer_skips_ocr() {
        let backend = FixedBackend(Ok(long_clean_text()));
        let text = extract_document_text(
            Path::new("doc.pdf"),
            &backend,
            None,
            &GarbleRules::default(),
        )
        .await
        .unwrap();
        assert_eq!(text, long_clean_text());
    }

    #[tokio::test]
    async fn garbled_layer_triggers_ocr_with_page_markers() {
        let backend = FixedBackend(Ok("/g1/g2".to_string()));
        let rasterizer = FixedRasterizer(2);
        let service = OcrService::with_engine(Box::new(MockOcr::always("recovered page text")));
        let text = extract_document_text(
            Path::new("doc.pdf"),
            &backend,
            Some(OcrFallback {
                rasterizer: &rasterizer,
                service: &service,
            }),
            &GarbleRules::default(),
        )
        .await
        .unwrap();
        assert!(text.contains("--- Page 1 ---"));
        assert!(text.contains("--- Page 2 ---"));
        assert!(text.contains("recovered page text"));
    }

    #[tokio::test]
    async fn failed_pages_are_skipped_not_fatal() {
        let backend = FixedBackend(Err("no text layer".to_string()));
        let rasterizer = FixedRasterizer(2);
        let service = OcrService::with_engine(Box::new(MockOcr::fail_first("second page")));
        let text = extract_document_text(
            Path::new("doc.pdf"),
            &backend,
            Some(OcrFallback {
                rasterizer: &rasterizer,
                service: &service,
            }),
            &GarbleRules::default(),
        )
        .await
        .unwrap();
        assert!(!text.contains("--- Page 1 ---"));
        assert!(text.contains("--- Page 2 ---"));
    }

    #[tokio::test]
    async fn all_pages_failing_is_an_error() {
        let backend = FixedBackend(Err("no text layer".to_string()));
        let rasterizer = FixedRasterizer(1);
        let service = OcrService::with_engine(Box::new(MockOcr::always_fail()));
        let result = extract_document_text(
            Path::new("doc.pdf"),
            &backend,
            Some(OcrFallback {
                rasterizer: &rasterizer,
                service: &service,
            }),
            &GarbleRules::default(),
        )
        .await;
        assert!(matches!(result, Err(PdfError::ExtractionFailed(_))));
    }

    #[tokio::test]
    async fn garbled_layer_without_ocr_is_an_error() {
        let backend = FixedBackend(Ok("/g12/g8/g44/g3/g19".to_string()));
        let result = extract_document_text(
            Path::new("doc.pdf"),
            &backend,
            None,
            &GarbleRules::default(),
        )
        .await;
        match result {
            Err(PdfError::ExtractionFailed(reason)) => {
                assert!(reason.contains("garbled"), "reason was: {reason}");
            }
            other => panic!("expected ExtractionFailed, got {other:?}"),
        }
    }
}
