//! Verification orchestrator.
//!
//! Sequences the pipeline checks over the two stored images, emits progress
//! milestones, and merges the auxiliary signals into the final report.
//! Only the two "no face" conditions are pipeline-fatal; every signal-local
//! failure (unreadable image, OCR, analysis, lookup) degrades instead.

use crate::progress::ProgressSink;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use veriface_core::{
    check_liveness, compare_faces, face_encoding, load_image, FaceDetector, LivenessResult,
    Severity, Verdict,
};
use veriface_signals::{FaceAnalysis, FaceAnalyzer, LookalikeFinder, NameLookup, TextExtractor};

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("No face found in reference photo.")]
    NoFaceInReference,
    #[error("No face found in selfie.")]
    NoFaceInSelfie,
    #[error("pipeline task failed: {0}")]
    PipelineTask(String),
}

impl VerifyError {
    /// Whether this error is a normal pipeline outcome (reported as a JSON
    /// verdict with HTTP success) rather than a server fault.
    pub fn is_no_face(&self) -> bool {
        matches!(self, VerifyError::NoFaceInReference | VerifyError::NoFaceInSelfie)
    }
}

/// Completed verification response, serialized verbatim to the client.
#[derive(Debug, Serialize)]
pub struct VerificationReport {
    pub result: String,
    pub message: String,
    pub status: Severity,
    pub analysis: Option<FaceAnalysis>,
    pub ocr_match: bool,
    pub celebrity: String,
    pub wiki_url: Option<String>,
    pub name: Option<String>,
    pub whatsapp: Option<String>,
}

/// Verification engine: owns the detector and the collaborator seams.
pub struct Engine {
    detector: Arc<dyn FaceDetector>,
    text_extractor: Arc<dyn TextExtractor>,
    analyzer: Arc<dyn FaceAnalyzer>,
    lookalike: Arc<dyn LookalikeFinder>,
    lookup: Arc<dyn NameLookup>,
    progress: Arc<dyn ProgressSink>,
}

impl Engine {
    pub fn new(
        detector: Arc<dyn FaceDetector>,
        text_extractor: Arc<dyn TextExtractor>,
        analyzer: Arc<dyn FaceAnalyzer>,
        lookalike: Arc<dyn LookalikeFinder>,
        lookup: Arc<dyn NameLookup>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            detector,
            text_extractor,
            analyzer,
            lookalike,
            lookup,
            progress,
        }
    }

    /// Run the full verification pipeline over two stored images.
    ///
    /// Progress for `session_id` advances 0 → 20 → 40 → 60 → 80 → 100; a
    /// missing face short-circuits to 100 and stops. All collaborator
    /// outputs are merged into the report even on a non-matching result.
    pub async fn verify(
        &self,
        session_id: &str,
        reference_path: &Path,
        selfie_path: &Path,
        name: Option<&str>,
        whatsapp: Option<&str>,
    ) -> Result<VerificationReport, VerifyError> {
        let name = name.filter(|n| !n.is_empty());

        self.progress
            .update(session_id, 0, "Starting verification...")
            .await;

        // 1. Liveness (selfie only). An unreadable selfie degrades the
        // liveness result; the missing-face check below still terminates
        // the pipeline for it.
        self.progress
            .update(session_id, 20, "Checking liveness...")
            .await;
        let liveness = {
            let path = selfie_path.to_owned();
            run_blocking(move || match load_image(&path) {
                Some(image) => check_liveness(&image),
                None => LivenessResult::unreadable(),
            })
            .await?
        };

        // 2. Face descriptors for both images.
        self.progress
            .update(session_id, 40, "Detecting faces...")
            .await;
        let (reference_encoding, selfie_encoding) = {
            let detector = Arc::clone(&self.detector);
            let reference = reference_path.to_owned();
            let selfie = selfie_path.to_owned();
            run_blocking(move || {
                let r = load_image(&reference).and_then(|i| face_encoding(&i, detector.as_ref()));
                let s = load_image(&selfie).and_then(|i| face_encoding(&i, detector.as_ref()));
                (r, s)
            })
            .await?
        };

        if reference_encoding.is_none() {
            self.finish_errored(session_id).await;
            return Err(VerifyError::NoFaceInReference);
        }
        if selfie_encoding.is_none() {
            self.finish_errored(session_id).await;
            return Err(VerifyError::NoFaceInSelfie);
        }

        let matched = compare_faces(reference_encoding.as_ref(), selfie_encoding.as_ref());

        // 3. ID text extraction and claimed-name check.
        self.progress
            .update(session_id, 60, "Reading ID card text...")
            .await;
        let ocr_text = self.text_extractor.extract_text(reference_path).await;
        let name_match = name
            .map(|n| ocr_text.to_lowercase().contains(&n.to_lowercase()))
            .unwrap_or(false);

        // 4. Auxiliary signals. Independent of each other, so they run
        // concurrently; progress stays monotonic because all three sit
        // inside the single 80% milestone.
        self.progress
            .update(session_id, 80, "Analyzing face attributes...")
            .await;
        let (analysis, celebrity, wiki_url) = tokio::join!(
            self.analyzer.analyze(selfie_path),
            self.lookalike.find_lookalike(selfie_path),
            async {
                match name {
                    Some(n) => self.lookup.url_for(n).await,
                    None => None,
                }
            }
        );

        // 5. Verdict fusion.
        self.progress.update(session_id, 100, "Complete!").await;
        let verdict = Verdict::from_signals(matched, liveness.is_live);

        tracing::info!(
            session_id,
            matched,
            is_live = liveness.is_live,
            liveness_score = liveness.score,
            result = verdict.label(),
            "verification finished"
        );

        Ok(VerificationReport {
            result: verdict.label().to_string(),
            message: format!("{} (Score: {:.2})", liveness.message, liveness.score),
            status: verdict.status(),
            analysis,
            ocr_match: name_match,
            celebrity,
            wiki_url,
            name: name.map(str::to_string),
            whatsapp: whatsapp.map(str::to_string),
        })
    }

    async fn finish_errored(&self, session_id: &str) {
        self.progress.update(session_id, 100, "Error").await;
    }
}

/// Run CPU-bound image work off the async executor.
async fn run_blocking<T, F>(work: F) -> Result<T, VerifyError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| VerifyError::PipelineTask(e.to_string()))
}

/// Per-session upload locations under the configured upload directory.
pub fn session_upload_paths(upload_dir: &Path, session_id: &str) -> (PathBuf, PathBuf) {
    let dir = upload_dir.join(session_id);
    (dir.join("reference.jpg"), dir.join("selfie.jpg"))
}
