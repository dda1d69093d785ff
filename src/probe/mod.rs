use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::capture::{AttemptResult, CaptureError, FrameCapture, ScratchFile};
use crate::matrix::Candidate;
use crate::output::display_ip;
use crate::sys::id::get_probe_id;
use crate::thumbnail::Thumbnailer;

pub mod pool;

/// Fatal errors raised while probing. Any of these aborts the whole run.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("frame capture unavailable: {0}")]
    Capture(#[from] CaptureError),
}

/// Final verdict for a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Valid,
    Flaky,
    Invalid,
}

/// Thumbnail status of a valid camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageStatus {
    #[serde(rename = "ok")]
    ImageOk,
    #[serde(rename = "missing")]
    ImageMissing,
}

impl ImageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageStatus::ImageOk => "VALID IMAGE",
            ImageStatus::ImageMissing => "NO IMAGE",
        }
    }
}

/// Outcome of probing one candidate
#[derive(Debug, Clone)]
pub enum ProbeOutcome {
    Valid {
        candidate: Candidate,
        attempts: u32,
        image: ImageStatus,
        thumbnail: Option<PathBuf>,
    },
    Flaky {
        candidate: Candidate,
        attempts: u32,
    },
    Invalid {
        candidate: Candidate,
        attempts: u32,
    },
}

impl ProbeOutcome {
    pub fn candidate(&self) -> &Candidate {
        match self {
            ProbeOutcome::Valid { candidate, .. }
            | ProbeOutcome::Flaky { candidate, .. }
            | ProbeOutcome::Invalid { candidate, .. } => candidate,
        }
    }
    pub fn attempts(&self) -> u32 {
        match self {
            ProbeOutcome::Valid { attempts, .. }
            | ProbeOutcome::Flaky { attempts, .. }
            | ProbeOutcome::Invalid { attempts, .. } => *attempts,
        }
    }
    pub fn verdict(&self) -> Verdict {
        match self {
            ProbeOutcome::Valid { .. } => Verdict::Valid,
            ProbeOutcome::Flaky { .. } => Verdict::Flaky,
            ProbeOutcome::Invalid { .. } => Verdict::Invalid,
        }
    }
}

/// Classify a candidate from the results of its attempts.
///
/// A success anywhere wins. Without one, a candidate that timed out on any
/// attempt is flaky, even if a later attempt exited with an error. Only
/// failures with no timeout at all are invalid.
pub fn classify(attempts: &[AttemptResult]) -> Verdict {
    if attempts.iter().any(|a| a.is_success()) {
        Verdict::Valid
    } else if attempts.iter().any(|a| a.timed_out) {
        Verdict::Flaky
    } else {
        Verdict::Invalid
    }
}

/// Settings for probing candidates
#[derive(Debug, Clone)]
pub struct ProbeSetting {
    /// Per-attempt capture timeout
    pub timeout: Duration,
    /// Total capture attempts per candidate
    pub retries: u32,
    /// Directory for per-attempt frame files
    pub scratch_dir: PathBuf,
    /// Keep thumbnails of valid cameras here
    pub thumbnail_dir: Option<PathBuf>,
    /// Substitute for '.' in kept thumbnail file names
    pub whitespace: char,
}

/// Resolves one candidate to a ProbeOutcome using the capture and thumbnail collaborators
pub struct ProbeExecutor {
    pub setting: ProbeSetting,
    capture: Arc<dyn FrameCapture>,
    thumbnailer: Arc<dyn Thumbnailer>,
}

fn attempt_label(attempt: u32) -> String {
    if attempt > 1 {
        format!("Retry # {}", attempt - 1)
    } else {
        String::from("1st Attempt")
    }
}

impl ProbeExecutor {
    pub fn new(
        setting: ProbeSetting,
        capture: Arc<dyn FrameCapture>,
        thumbnailer: Arc<dyn Thumbnailer>,
    ) -> Self {
        Self {
            setting,
            capture,
            thumbnailer,
        }
    }

    /// Probe one candidate.
    ///
    /// Timeouts are retried up to `retries` total attempts without backoff.
    /// A completed attempt ends the loop, whatever its exit code.
    pub async fn probe(&self, candidate: Candidate) -> Result<ProbeOutcome, ProbeError> {
        let url = candidate.url();
        tracing::debug!("Checking {}...", url);

        let mut results: Vec<AttemptResult> = Vec::new();
        let mut frame: Option<ScratchFile> = None;
        for attempt in 1..=self.setting.retries {
            let file = ScratchFile::new(
                self.setting
                    .scratch_dir
                    .join(format!("{}.png", get_probe_id())),
            );
            let result = self
                .capture
                .capture(&url, file.path(), self.setting.timeout)
                .await?;
            results.push(result);
            if result.timed_out {
                tracing::debug!(
                    "{}: {} timed out after {:?}",
                    attempt_label(attempt),
                    url,
                    self.setting.timeout
                );
                continue;
            }
            tracing::debug!("Return Code: {:?} ({})", result.exit_code, url);
            frame = Some(file);
            break;
        }

        let attempts = results.len() as u32;
        let outcome = match classify(&results) {
            Verdict::Valid => {
                let (image, thumbnail) = match &frame {
                    Some(frame) => self.thumbnail(&candidate, frame).await,
                    None => (ImageStatus::ImageMissing, None),
                };
                tracing::debug!("status RTSP {} ({})", image.as_str(), url);
                ProbeOutcome::Valid {
                    candidate,
                    attempts,
                    image,
                    thumbnail,
                }
            }
            Verdict::Flaky => ProbeOutcome::Flaky {
                candidate,
                attempts,
            },
            Verdict::Invalid => ProbeOutcome::Invalid {
                candidate,
                attempts,
            },
        };
        Ok(outcome)
    }

    /// Make the preview of a captured frame. Failure only marks the image missing.
    async fn thumbnail(
        &self,
        candidate: &Candidate,
        frame: &ScratchFile,
    ) -> (ImageStatus, Option<PathBuf>) {
        let thumb = ScratchFile::new(frame.path().with_extension("webp"));
        let thumbnailer = self.thumbnailer.clone();
        let source = frame.path().to_path_buf();
        let target = thumb.path().to_path_buf();
        let made = tokio::task::spawn_blocking(move || thumbnailer.make_thumbnail(&source, &target)).await;
        match made {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!("Thumbnail failed for {}: {:#}", candidate.url(), e);
                return (ImageStatus::ImageMissing, None);
            }
            Err(e) => {
                tracing::warn!("Thumbnail task failed for {}: {}", candidate.url(), e);
                return (ImageStatus::ImageMissing, None);
            }
        }

        let Some(dir) = &self.setting.thumbnail_dir else {
            return (ImageStatus::ImageOk, None);
        };
        let file_name = format!(
            "{}_{}_{}.webp",
            display_ip(&candidate.host.ip.to_string(), self.setting.whitespace),
            candidate.host.port,
            get_probe_id()
        );
        let kept = dir.join(file_name);
        match tokio::fs::copy(thumb.path(), &kept).await {
            Ok(_) => (ImageStatus::ImageOk, Some(kept)),
            Err(e) => {
                tracing::warn!("Failed to keep thumbnail {}: {}", kept.display(), e);
                (ImageStatus::ImageOk, None)
            }
        }
    }
}
