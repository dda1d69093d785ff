use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::{AttemptResult, CaptureError, FrameCapture};

/// Frame capture through an `ffmpeg` child process.
///
/// The child is spawned with `kill_on_drop`, so a cancelled probe never
/// leaves a running process behind. On timeout it is killed and reaped.
#[derive(Debug, Clone)]
pub struct FfmpegCapture {
    pub program: PathBuf,
}

impl FfmpegCapture {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }

    /// Arguments for capturing one frame of `url` into `output` over RTSP/TCP.
    pub fn capture_args(url: &str, output: &Path) -> Vec<String> {
        vec![
            "-nostdin".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
            "-rtsp_transport".to_string(),
            "tcp".to_string(),
            "-i".to_string(),
            url.to_string(),
            "-frames:v".to_string(),
            "1".to_string(),
            output.display().to_string(),
        ]
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

#[async_trait]
impl FrameCapture for FfmpegCapture {
    async fn capture(
        &self,
        url: &str,
        output: &Path,
        timeout: Duration,
    ) -> Result<AttemptResult, CaptureError> {
        let mut child = Command::new(&self.program)
            .args(Self::capture_args(url, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CaptureError::Spawn {
                program: self.program_name(),
                source: e,
            })?;

        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => Ok(AttemptResult::completed(status.code())),
            Ok(Err(e)) => Err(CaptureError::Wait {
                program: self.program_name(),
                source: e,
            }),
            Err(_elapsed) => {
                // kill() also waits, so no zombie is left behind
                if let Err(e) = child.kill().await {
                    tracing::warn!("Failed to kill {} after timeout: {}", self.program_name(), e);
                }
                Ok(AttemptResult::timeout())
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn args_capture_one_frame_over_tcp() {
        let args = FfmpegCapture::capture_args("rtsp://10.0.0.1:554/live", Path::new("/tmp/x.png"));
        let joined = args.join(" ");
        assert!(joined.contains("-y"));
        assert!(joined.contains("-rtsp_transport tcp"));
        assert!(joined.contains("-i rtsp://10.0.0.1:554/live"));
        assert!(joined.contains("-frames:v 1"));
        assert_eq!(args.last().unwrap(), "/tmp/x.png");
    }

    // `true` and `false` ignore the ffmpeg arguments and stand in for a
    // capture that succeeds or fails.
    #[tokio::test]
    async fn exit_codes_are_reported() {
        let out = Path::new("/tmp/rtspscan-test-unused.png");
        let ok = FfmpegCapture::new(PathBuf::from("true"));
        let r = ok.capture("rtsp://x", out, Duration::from_secs(5)).await.unwrap();
        assert_eq!(r, AttemptResult::completed(Some(0)));

        let fail = FfmpegCapture::new(PathBuf::from("false"));
        let r = fail.capture("rtsp://x", out, Duration::from_secs(5)).await.unwrap();
        assert_eq!(r, AttemptResult::completed(Some(1)));
    }

    /// Write an executable script that records its pid, ignores its
    /// arguments and blocks.
    fn hanging_script(dir: &Path) -> (PathBuf, PathBuf) {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("hang.sh");
        let pid_file = dir.join("hang.pid");
        let mut f = std::fs::File::create(&script).unwrap();
        writeln!(f, "#!/bin/sh\necho $$ > '{}'\nexec sleep 30", pid_file.display()).unwrap();
        f.sync_all().unwrap();
        drop(f);
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        (script, pid_file)
    }

    #[tokio::test]
    async fn hung_process_is_killed_at_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let (script, pid_file) = hanging_script(dir.path());
        let hang = FfmpegCapture::new(script);
        let out = dir.path().join("frame.png");

        let start = std::time::Instant::now();
        let mut result = None;
        // A freshly written script can be briefly busy while another test forks
        for _ in 0..20 {
            match hang.capture("rtsp://x", &out, Duration::from_millis(500)).await {
                Err(CaptureError::Spawn { source, .. }) if source.raw_os_error() == Some(26) => {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
                other => {
                    result = Some(other.unwrap());
                    break;
                }
            }
        }
        let r = result.expect("script never started");
        assert!(r.timed_out);
        assert_eq!(r.exit_code, None);
        assert!(start.elapsed() < Duration::from_secs(10));

        let pid = std::fs::read_to_string(&pid_file).unwrap().trim().to_string();
        assert!(!pid.is_empty());
        let alive = std::process::Command::new("kill")
            .args(["-0", pid.as_str()])
            .stderr(Stdio::null())
            .status()
            .unwrap()
            .success();
        assert!(!alive, "capture process {pid} still running");
    }

    #[tokio::test]
    async fn missing_executable_is_an_error() {
        let capture = FfmpegCapture::new(PathBuf::from("/nonexistent/ffmpeg-binary"));
        let err = capture
            .capture("rtsp://x", Path::new("/tmp/never.png"), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::Spawn { .. }));
    }
}
