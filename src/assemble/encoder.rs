//! Encoder invocation: the ffmpeg process boundary.
//!
//! Everything that runs ffmpeg goes through [`MediaEncoder`], so the
//! pipeline can be exercised with an in-process fake and so one shared
//! semaphore bounds how many encoder processes exist at once, no matter
//! how many builds run concurrently.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncBufReadExt;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Default bound on concurrent encoder processes.
const DEFAULT_MAX_PROCESSES: usize = 4;

/// Failure of a single encoder invocation. Callers map this onto the
/// stage-specific error variant (render / concat / mux).
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct EncoderError {
    pub message: String,
}

impl EncoderError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One encoder invocation: args in, output file out.
#[async_trait]
pub trait MediaEncoder: Send + Sync {
    /// Run the encoder to completion. The final argument names the
    /// output path; intermediate args are caller-built.
    async fn run(&self, args: &[String]) -> Result<(), EncoderError>;

    /// Whether the encoder binary is callable.
    async fn check_available(&self) -> bool;
}

/// ffmpeg subprocess encoder.
pub struct FfmpegEncoder {
    /// Path to the ffmpeg binary.
    ffmpeg_path: String,
    /// Bounds concurrent ffmpeg processes across all builds.
    jobs: Arc<Semaphore>,
}

impl FfmpegEncoder {
    /// Create an encoder, searching for ffmpeg in PATH.
    #[must_use]
    pub fn new() -> Self {
        let ffmpeg_path = which::which("ffmpeg").map_or_else(
            |_| "ffmpeg".to_string(),
            |p| p.to_string_lossy().to_string(),
        );
        Self {
            ffmpeg_path,
            jobs: Arc::new(Semaphore::new(DEFAULT_MAX_PROCESSES)),
        }
    }

    /// Specify a custom ffmpeg binary path.
    #[must_use]
    pub fn with_ffmpeg_path(mut self, path: &str) -> Self {
        self.ffmpeg_path = path.to_string();
        self
    }

    /// Bound the encoder process pool.
    #[must_use]
    pub fn with_max_processes(mut self, max: usize) -> Self {
        self.jobs = Arc::new(Semaphore::new(max.max(1)));
        self
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaEncoder for FfmpegEncoder {
    async fn run(&self, args: &[String]) -> Result<(), EncoderError> {
        let _permit = self
            .jobs
            .acquire()
            .await
            .map_err(|_| EncoderError::new("encoder pool closed"))?;

        debug!("ffmpeg args: {:?}", args);

        // kill_on_drop: a cancelled build terminates its ffmpeg children
        // instead of leaking them.
        let mut child = Command::new(&self.ffmpeg_path)
            .args(["-hide_banner", "-loglevel", "error", "-nostdin"])
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EncoderError::new(format!("failed to spawn ffmpeg: {e}")))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EncoderError::new("failed to capture ffmpeg stderr"))?;

        // Keep the tail of stderr for the failure message.
        let mut lines = tokio::io::BufReader::new(stderr).lines();
        let mut tail: Vec<String> = Vec::new();
        while let Ok(Some(line)) = lines.next_line().await {
            warn!("ffmpeg: {}", line);
            if tail.len() == 8 {
                tail.remove(0);
            }
            tail.push(line);
        }

        let status = child
            .wait()
            .await
            .map_err(|e| EncoderError::new(format!("failed to wait for ffmpeg: {e}")))?;

        if !status.success() {
            let detail = if tail.is_empty() {
                String::new()
            } else {
                format!(": {}", tail.join("; "))
            };
            return Err(EncoderError::new(format!(
                "ffmpeg exited with status: {status}{detail}"
            )));
        }

        Ok(())
    }

    async fn check_available(&self) -> bool {
        Command::new(&self.ffmpeg_path)
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
pub(crate) mod testing {
    //! In-process encoder fake for pipeline tests.

    use std::path::Path;
    use std::sync::Mutex;

    use super::{async_trait, EncoderError, MediaEncoder};

    /// Records every invocation and writes a marker file at the output
    /// path (the last argument), like a well-behaved encoder would.
    #[derive(Default)]
    pub struct MockEncoder {
        pub calls: Mutex<Vec<Vec<String>>>,
        /// Fail any invocation whose args contain this substring.
        pub fail_matching: Option<String>,
    }

    impl MockEncoder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_on(substring: &str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_matching: Some(substring.to_string()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl MediaEncoder for MockEncoder {
        async fn run(&self, args: &[String]) -> Result<(), EncoderError> {
            self.calls.lock().unwrap().push(args.to_vec());

            if let Some(ref needle) = self.fail_matching {
                if args.iter().any(|a| a.contains(needle.as_str())) {
                    return Err(EncoderError {
                        message: "ffmpeg exited with status: 1".to_string(),
                    });
                }
            }

            let output = Path::new(args.last().expect("encoder args include an output"));
            std::fs::write(output, format!("encoded via {}\n", args.join(" ")))
                .map_err(|e| EncoderError {
                    message: format!("mock write failed: {e}"),
                })?;
            Ok(())
        }

        async fn check_available(&self) -> bool {
            true
        }
    }
}
