//! Reading a weight off a photographed scale display.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::AppError;

pub mod parse;
mod tesseract;

pub use tesseract::TesseractEngine;

/// Text recognition over raw image bytes.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: Bytes) -> Result<String, OcrError>;
}

#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    /// The engine ran but rejected the image.
    #[error("image could not be read: {0}")]
    Unreadable(String),

    #[error("no plausible weight found in recognized text")]
    NoWeight,

    #[error("text recognition timed out")]
    Timeout,

    /// The engine itself is unavailable.
    #[error("ocr engine failure: {0}")]
    Engine(#[from] anyhow::Error),
}

impl From<OcrError> for AppError {
    fn from(e: OcrError) -> Self {
        match e {
            OcrError::Engine(err) => AppError::Internal(err),
            OcrError::Unreadable(_) | OcrError::NoWeight | OcrError::Timeout => {
                AppError::Extraction("could not detect a weight in this photo".into())
            }
        }
    }
}

/// Recognize `image` with `engine` and pick the first plausible weight.
pub async fn extract_weight(
    engine: &dyn OcrEngine,
    image: Bytes,
    timeout: Duration,
) -> Result<f64, OcrError> {
    let text = tokio::time::timeout(timeout, engine.recognize(image))
        .await
        .map_err(|_| OcrError::Timeout)??;
    debug!(text = %text.trim(), "ocr text recognized");

    match parse::find_weight(&text) {
        Some(weight) => Ok(weight),
        None => {
            warn!("no plausible weight in ocr output");
            Err(OcrError::NoWeight)
        }
    }
}
