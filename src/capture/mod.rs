use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub mod ffmpeg;

pub use ffmpeg::FfmpegCapture;

/// Result of a single frame capture attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptResult {
    /// The capture process was started
    pub attempted: bool,
    /// Exit code, if the process exited on its own
    pub exit_code: Option<i32>,
    /// The attempt hit the timeout and the process was killed
    pub timed_out: bool,
}

impl AttemptResult {
    /// The process ran to completion with the given exit code.
    /// `None` means it was terminated by a signal.
    pub fn completed(exit_code: Option<i32>) -> Self {
        Self {
            attempted: true,
            exit_code,
            timed_out: false,
        }
    }
    /// The process was killed at the timeout boundary.
    pub fn timeout() -> Self {
        Self {
            attempted: true,
            exit_code: None,
            timed_out: true,
        }
    }
    /// A frame was written.
    pub fn is_success(&self) -> bool {
        self.attempted && !self.timed_out && self.exit_code == Some(0)
    }
}

/// Errors starting or supervising the capture process.
/// These mean the environment is unusable, not that a camera failed.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Captures a single frame of an RTSP stream into a file
#[async_trait]
pub trait FrameCapture: Send + Sync {
    /// Try to write one decoded frame of `url` to `output` within `timeout`.
    async fn capture(
        &self,
        url: &str,
        output: &Path,
        timeout: Duration,
    ) -> Result<AttemptResult, CaptureError>;
}

/// A scratch file removed when the guard is dropped
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove {}: {}", self.path.display(), e),
        }
    }
}

/// A per-run scratch directory removed (with its contents) when dropped
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Create a fresh scratch directory under the system temp directory.
    pub fn create() -> std::io::Result<Self> {
        let path = std::env::temp_dir().join(format!("rtspscan-{}", crate::sys::id::get_probe_id()));
        Self::create_at(path)
    }
    /// Create the scratch directory at the given path.
    pub fn create_at(path: PathBuf) -> std::io::Result<Self> {
        std::fs::create_dir_all(&path)?;
        Ok(Self { path })
    }
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove {}: {}", self.path.display(), e);
            }
        }
    }
}
