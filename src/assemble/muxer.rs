//! Subtitle muxing and atomic publication of the final video.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use super::encoder::MediaEncoder;
use super::subtitle::SubtitleTrack;
use super::{AssemblyError, Result};

/// Embeds the caption track into the concatenated stream, or falls back
/// to an unsubtitled copy. Either way the result is published atomically:
/// written into scratch first, then renamed over the final path, so a
/// partial video is never observable.
pub struct SubtitleMuxer {
    encoder: Arc<dyn MediaEncoder>,
    /// Language tag for the subtitle stream metadata.
    language: String,
}

impl SubtitleMuxer {
    pub fn new(encoder: Arc<dyn MediaEncoder>) -> Self {
        Self {
            encoder,
            language: "eng".to_string(),
        }
    }

    /// Set the subtitle stream's language tag.
    #[must_use]
    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    fn build_args(&self, video: &Path, subtitles: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(),
            video.to_string_lossy().to_string(),
            "-i".to_string(),
            subtitles.to_string_lossy().to_string(),
            "-c".to_string(),
            "copy".to_string(),
            "-c:s".to_string(),
            "mov_text".to_string(),
            "-metadata:s:s:0".to_string(),
            format!("language={}", self.language),
            output.to_string_lossy().to_string(),
        ]
    }

    async fn try_mux(
        &self,
        concatenated: &Path,
        track: &SubtitleTrack,
        scratch: &Path,
        pending: &Path,
    ) -> Result<()> {
        let srt = scratch.join("captions.srt");
        tokio::fs::write(&srt, track.to_srt())
            .await
            .map_err(|e| AssemblyError::SubtitleEmbedFailure(format!(
                "could not write {}: {e}",
                srt.display()
            )))?;

        let args = self.build_args(concatenated, &srt, pending);
        self.encoder
            .run(&args)
            .await
            .map_err(|e| AssemblyError::SubtitleEmbedFailure(e.to_string()))
    }

    /// Publish the final video, embedding `track` when present and
    /// non-empty. Returns whether subtitles were applied.
    ///
    /// Subtitle failure never blocks delivery: on any mux problem the
    /// concatenated artifact is published verbatim instead.
    pub async fn publish(
        &self,
        concatenated: &Path,
        track: Option<&SubtitleTrack>,
        scratch: &Path,
        final_path: &Path,
    ) -> Result<bool> {
        let pending = scratch.join("final-pending.mp4");

        if let Some(track) = track.filter(|t| !t.is_empty()) {
            match self.try_mux(concatenated, track, scratch, &pending).await {
                Ok(()) => {
                    tokio::fs::rename(&pending, final_path).await?;
                    info!(
                        "published {} with {} caption cues",
                        final_path.display(),
                        track.cues.len()
                    );
                    return Ok(true);
                }
                Err(e) => warn!("{e}; publishing without subtitles"),
            }
        }

        tokio::fs::copy(concatenated, &pending).await?;
        tokio::fs::rename(&pending, final_path).await?;
        info!("published {} without subtitles", final_path.display());
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::super::encoder::testing::MockEncoder;
    use super::super::subtitle::Cue;
    use super::*;

    fn track() -> SubtitleTrack {
        SubtitleTrack {
            cues: vec![Cue {
                index: 1,
                start_seconds: 0.0,
                end_seconds: 1.2,
                text: "hello world".to_string(),
            }],
        }
    }

    fn scratch_with_concat() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let concat = dir.path().join("story.mp4");
        std::fs::write(&concat, "concatenated stream").unwrap();
        (dir, concat)
    }

    #[test]
    fn test_build_args_soft_subtitles() {
        let muxer = SubtitleMuxer::new(Arc::new(MockEncoder::new()));
        let args = muxer.build_args(
            Path::new("/s/x/scratch/story.mp4"),
            Path::new("/s/x/scratch/captions.srt"),
            Path::new("/s/x/scratch/final-pending.mp4"),
        );

        let c_idx = args.iter().position(|a| a == "-c").unwrap();
        assert_eq!(args[c_idx + 1], "copy");

        let cs_idx = args.iter().position(|a| a == "-c:s").unwrap();
        assert_eq!(args[cs_idx + 1], "mov_text");

        let meta_idx = args.iter().position(|a| a == "-metadata:s:s:0").unwrap();
        assert_eq!(args[meta_idx + 1], "language=eng");
    }

    #[test]
    fn test_language_override() {
        let muxer = SubtitleMuxer::new(Arc::new(MockEncoder::new())).with_language("fin");
        let args = muxer.build_args(Path::new("v.mp4"), Path::new("c.srt"), Path::new("o.mp4"));
        assert!(args.contains(&"language=fin".to_string()));
    }

    #[tokio::test]
    async fn test_publish_with_track_embeds() {
        let (dir, concat) = scratch_with_concat();
        let final_path = dir.path().join("final.mp4");
        let muxer = SubtitleMuxer::new(Arc::new(MockEncoder::new()));

        let applied = muxer
            .publish(&concat, Some(&track()), dir.path(), &final_path)
            .await
            .unwrap();

        assert!(applied);
        assert!(final_path.exists());
        assert!(dir.path().join("captions.srt").exists());
        assert!(!dir.path().join("final-pending.mp4").exists());
    }

    #[tokio::test]
    async fn test_publish_without_track_copies_verbatim() {
        let (dir, concat) = scratch_with_concat();
        let final_path = dir.path().join("final.mp4");
        let encoder = Arc::new(MockEncoder::new());
        let muxer = SubtitleMuxer::new(encoder.clone());

        let applied = muxer
            .publish(&concat, None, dir.path(), &final_path)
            .await
            .unwrap();

        assert!(!applied);
        assert_eq!(encoder.call_count(), 0);
        assert_eq!(
            std::fs::read(&final_path).unwrap(),
            std::fs::read(&concat).unwrap()
        );
    }

    #[tokio::test]
    async fn test_publish_empty_track_copies_verbatim() {
        let (dir, concat) = scratch_with_concat();
        let final_path = dir.path().join("final.mp4");
        let muxer = SubtitleMuxer::new(Arc::new(MockEncoder::new()));

        let empty = SubtitleTrack { cues: vec![] };
        let applied = muxer
            .publish(&concat, Some(&empty), dir.path(), &final_path)
            .await
            .unwrap();

        assert!(!applied);
    }

    #[tokio::test]
    async fn test_embed_failure_falls_back_to_copy() {
        let (dir, concat) = scratch_with_concat();
        let final_path = dir.path().join("final.mp4");
        let muxer = SubtitleMuxer::new(Arc::new(MockEncoder::failing_on("final-pending")));

        let applied = muxer
            .publish(&concat, Some(&track()), dir.path(), &final_path)
            .await
            .unwrap();

        assert!(!applied);
        // Byte-identical to the concatenated artifact.
        assert_eq!(
            std::fs::read(&final_path).unwrap(),
            std::fs::read(&concat).unwrap()
        );
    }

    #[tokio::test]
    async fn test_publish_overwrites_previous_final() {
        let (dir, concat) = scratch_with_concat();
        let final_path = dir.path().join("final.mp4");
        std::fs::write(&final_path, "stale build").unwrap();

        let muxer = SubtitleMuxer::new(Arc::new(MockEncoder::new()));
        muxer
            .publish(&concat, None, dir.path(), &final_path)
            .await
            .unwrap();

        assert_eq!(
            std::fs::read(&final_path).unwrap(),
            std::fs::read(&concat).unwrap()
        );
    }
}
