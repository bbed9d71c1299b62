//! Per-window clip rendering: one still image + one narration slice.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use super::encoder::MediaEncoder;
use super::planner::Window;
use super::{AssemblyError, Result};

/// Encoding settings shared by every window of a build.
///
/// All clips use identical settings, which is what makes the later
/// stream-copy concatenation valid.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Video codec for the looped still.
    pub video_codec: String,
    /// Pixel format; players choke on anything more exotic.
    pub pixel_format: String,
    /// Audio codec for the narration slice.
    pub audio_codec: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            pixel_format: "yuv420p".to_string(),
            audio_codec: "aac".to_string(),
        }
    }
}

impl RenderSettings {
    /// Set the video codec.
    #[must_use]
    pub fn with_video_codec(mut self, codec: &str) -> Self {
        self.video_codec = codec.to_string();
        self
    }

    /// Set the audio codec.
    #[must_use]
    pub fn with_audio_codec(mut self, codec: &str) -> Self {
        self.audio_codec = codec.to_string();
        self
    }
}

/// Renders one clip per time window.
pub struct SegmentRenderer {
    encoder: Arc<dyn MediaEncoder>,
    settings: RenderSettings,
}

impl SegmentRenderer {
    pub fn new(encoder: Arc<dyn MediaEncoder>, settings: RenderSettings) -> Self {
        Self { encoder, settings }
    }

    /// Build the encoder arguments for one window.
    ///
    /// The image loops as the video stream; `-ss` before the audio input
    /// selects the window's narration slice; `-t` plus `-shortest` pin the
    /// clip length to exactly the window duration.
    fn build_args(&self, image: &Path, audio: &Path, window: &Window, clip: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-loop".to_string(),
            "1".to_string(),
            "-i".to_string(),
            image.to_string_lossy().to_string(),
            "-ss".to_string(),
            format!("{:.3}", window.start_seconds),
            "-i".to_string(),
            audio.to_string_lossy().to_string(),
            "-t".to_string(),
            format!("{:.3}", window.duration_seconds),
            "-c:v".to_string(),
            self.settings.video_codec.clone(),
            "-pix_fmt".to_string(),
            self.settings.pixel_format.clone(),
            "-c:a".to_string(),
            self.settings.audio_codec.clone(),
            "-shortest".to_string(),
            clip.to_string_lossy().to_string(),
        ]
    }

    /// Render the clip for one window into `clip`.
    ///
    /// Encoder failure is fatal for the whole build: a missing segment
    /// cannot be meaningfully concatenated, so there is no placeholder
    /// substitution here.
    pub async fn render(
        &self,
        image: &Path,
        audio: &Path,
        window: &Window,
        clip: &Path,
    ) -> Result<()> {
        debug!(
            "rendering segment {}: {:.3}s + {:.3}s from {}",
            window.index,
            window.start_seconds,
            window.duration_seconds,
            image.display()
        );

        let args = self.build_args(image, audio, window, clip);
        self.encoder
            .run(&args)
            .await
            .map_err(|e| AssemblyError::RenderFailure {
                index: window.index,
                message: e.to_string(),
            })?;

        info!("rendered segment {} to {}", window.index, clip.display());
        Ok(())
    }
}
