use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use std::{error::Error, fmt};

use tokio::process::Command;

const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

// Custom error type for dependency check
#[derive(Debug)]
pub struct DependencyError {
    pub dependency: String,
    pub message: String,
}

impl DependencyError {
    pub fn new(dependency: &str, message: &str) -> Self {
        Self {
            dependency: String::from(dependency),
            message: String::from(message),
        }
    }
}

impl fmt::Display for DependencyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.dependency, self.message)
    }
}

impl Error for DependencyError {}

/// Check that the frame grabber can be executed.
/// Returns the first line of `<program> -version`.
pub async fn check_ffmpeg(program: &Path) -> Result<String, DependencyError> {
    let name = program.display().to_string();
    let child = Command::new(program)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(VERSION_CHECK_TIMEOUT, child).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(DependencyError::new(
                &name,
                &format!("cannot execute ({}). Install ffmpeg or set --ffmpeg", e),
            ))
        }
        Err(_) => {
            return Err(DependencyError::new(&name, "-version did not return in time"));
        }
    };
    if !output.status.success() {
        return Err(DependencyError::new(
            &name,
            &format!("-version exited with {}", output.status),
        ));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
}
