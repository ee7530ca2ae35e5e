//! veriface-signals: auxiliary verification signals.
//!
//! Contracts for the external collaborators the verification pipeline
//! consumes as black boxes: ID-text extraction (OCR), demographic/emotion
//! analysis, the celebrity-lookalike novelty feature, and the Wikipedia
//! lookup. Failures at these boundaries are expressed as degraded values
//! (`""` / `None`), never as errors; a failing signal must not abort a
//! verification.

pub mod lookalike;
pub mod wikipedia;

pub use lookalike::RandomLookalike;
pub use wikipedia::WikipediaLookup;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Demographic/emotion estimate for a face image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceAnalysis {
    pub age: u32,
    pub gender: String,
    pub emotion: String,
}

/// Extracts text from an ID-card image. Returns `""` on any failure.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, image_path: &Path) -> String;
}

/// Estimates age, dominant gender and dominant emotion from a selfie.
/// Returns `None` on any failure.
#[async_trait]
pub trait FaceAnalyzer: Send + Sync {
    async fn analyze(&self, image_path: &Path) -> Option<FaceAnalysis>;
}

/// Names a celebrity lookalike for a selfie. Always returns some name.
#[async_trait]
pub trait LookalikeFinder: Send + Sync {
    async fn find_lookalike(&self, image_path: &Path) -> String;
}

/// Resolves a person name to an external reference URL. Returns `None` on
/// any failure (not found, network error, disambiguation).
#[async_trait]
pub trait NameLookup: Send + Sync {
    async fn url_for(&self, name: &str) -> Option<String>;
}

/// OCR placeholder until a real engine is wired in: extracts nothing, so
/// the pipeline runs in degraded mode (`ocr_match` stays false).
pub struct NoopTextExtractor;

#[async_trait]
impl TextExtractor for NoopTextExtractor {
    async fn extract_text(&self, image_path: &Path) -> String {
        tracing::debug!(path = %image_path.display(), "no OCR engine configured");
        String::new()
    }
}

/// Analyzer placeholder until a real classifier is wired in: always `None`.
pub struct NoopFaceAnalyzer;

#[async_trait]
impl FaceAnalyzer for NoopFaceAnalyzer {
    async fn analyze(&self, image_path: &Path) -> Option<FaceAnalysis> {
        tracing::debug!(path = %image_path.display(), "no face analyzer configured");
        None
    }
}
