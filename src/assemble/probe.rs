//! Media duration probing via ffprobe.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{AssemblyError, Result};

/// Maps a media file to its total duration in seconds.
///
/// Probe failure is fatal to a build: substituting a default duration
/// would silently corrupt every window boundary downstream.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    async fn duration_seconds(&self, path: &Path) -> Result<f64>;

    /// Whether the probe binary is callable.
    async fn check_available(&self) -> bool;
}

/// ffprobe subprocess probe.
pub struct FfprobeDurationProbe {
    ffprobe_path: String,
}

impl FfprobeDurationProbe {
    /// Create a probe, searching for ffprobe in PATH.
    #[must_use]
    pub fn new() -> Self {
        let ffprobe_path = which::which("ffprobe").map_or_else(
            |_| "ffprobe".to_string(),
            |p| p.to_string_lossy().to_string(),
        );
        Self { ffprobe_path }
    }

    /// Specify a custom ffprobe binary path.
    #[must_use]
    pub fn with_ffprobe_path(mut self, path: &str) -> Self {
        self.ffprobe_path = path.to_string();
        self
    }

    fn failure(path: &Path, message: impl Into<String>) -> AssemblyError {
        AssemblyError::DurationUnknown {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

impl Default for FfprobeDurationProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DurationProbe for FfprobeDurationProbe {
    async fn duration_seconds(&self, path: &Path) -> Result<f64> {
        let args = [
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ];
        debug!("ffprobe {} {}", args.join(" "), path.display());

        let output = Command::new(&self.ffprobe_path)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Self::failure(path, format!("failed to spawn ffprobe: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Self::failure(
                path,
                format!("ffprobe exited with status: {}: {}", output.status, stderr.trim()),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let duration: f64 = stdout
            .trim()
            .parse()
            .map_err(|_| Self::failure(path, format!("unparsable duration {:?}", stdout.trim())))?;

        if !duration.is_finite() || duration <= 0.0 {
            return Err(Self::failure(path, format!("non-positive duration {duration}")));
        }

        Ok(duration)
    }

    async fn check_available(&self) -> bool {
        Command::new(&self.ffprobe_path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MockProbe;
    use super::*;

    #[test]
    fn test_ffprobe_path_override() {
        let probe = FfprobeDurationProbe::new().with_ffprobe_path("/opt/ffmpeg/bin/ffprobe");
        assert_eq!(probe.ffprobe_path, "/opt/ffmpeg/bin/ffprobe");
    }

    #[tokio::test]
    async fn test_mock_probe_returns_duration() {
        let probe = MockProbe::returning(15.0);
        let duration = probe
            .duration_seconds(Path::new("voiceover-1.mp3"))
            .await
            .unwrap();
        assert_eq!(duration, 15.0);
    }

    #[tokio::test]
    async fn test_mock_probe_failure_is_duration_unknown() {
        let probe = MockProbe::failing();
        let err = probe
            .duration_seconds(Path::new("voiceover-1.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, AssemblyError::DurationUnknown { .. }));
    }
}
