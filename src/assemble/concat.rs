//! Stream-copy concatenation of rendered clips.

use std::fmt::Write as FmtWrite;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use super::encoder::MediaEncoder;
use super::{AssemblyError, Result};

/// Joins rendered clips, in window order, into one stream.
pub struct Concatenator {
    encoder: Arc<dyn MediaEncoder>,
}

impl Concatenator {
    pub fn new(encoder: Arc<dyn MediaEncoder>) -> Self {
        Self { encoder }
    }

    /// Concat demuxer list: one absolute path per line, so the encoder
    /// invocation needs no working-directory assumptions.
    fn list_content(clips: &[PathBuf]) -> String {
        let mut content = String::new();
        for clip in clips {
            let _ = writeln!(content, "file '{}'", clip.display());
        }
        content
    }

    fn build_args(list: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            list.to_string_lossy().to_string(),
            "-c".to_string(),
            "copy".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    /// Concatenate `clips` (already in ascending window order) into
    /// `output`, via stream-copy. `list` is the scratch path for the
    /// concat demuxer's input list.
    ///
    /// The clips are codec-compatible by construction (the renderer uses
    /// identical settings for every window), so no re-encode happens here.
    /// Clip paths are canonicalized into the list: the concat demuxer
    /// resolves relative entries against the list file, not the caller.
    pub async fn concat(&self, clips: &[PathBuf], list: &Path, output: &Path) -> Result<()> {
        let mut absolute = Vec::with_capacity(clips.len());
        for clip in clips {
            let path = tokio::fs::canonicalize(clip).await.map_err(|e| {
                AssemblyError::ConcatFailure(format!(
                    "clip missing or unreadable: {}: {e}",
                    clip.display()
                ))
            })?;
            absolute.push(path);
        }

        tokio::fs::write(list, Self::list_content(&absolute)).await?;

        let args = Self::build_args(list, output);
        self.encoder
            .run(&args)
            .await
            .map_err(|e| AssemblyError::ConcatFailure(e.to_string()))?;

        info!("concatenated {} clips into {}", clips.len(), output.display());
        Ok(())
    }
}
