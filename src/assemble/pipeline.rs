//! Full assembly pipeline: validate → plan → render → concat → subtitle.
//!
//! Orchestrates the complete workflow from a validated asset bundle to a
//! published final video. Stages run strictly in order; only the
//! per-window renders inside the Rendering stage fan out, and they join
//! before concatenation starts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use super::concat::Concatenator;
use super::encoder::{FfmpegEncoder, MediaEncoder};
use super::muxer::SubtitleMuxer;
use super::planner::{plan, SEGMENT_COUNT};
use super::probe::{DurationProbe, FfprobeDurationProbe};
use super::renderer::{RenderSettings, SegmentRenderer};
use super::subtitle::{CueConfig, SubtitleTrack};
use super::transcript::Transcript;
use super::{AssemblyError, BuildStage, Result};
use crate::store::{AssetBundle, StoryStore};

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Caption cue thresholds.
    pub cue: CueConfig,
    /// Per-segment encoding settings.
    pub render: RenderSettings,
    /// Language tag for the embedded subtitle stream.
    pub subtitle_language: String,
    /// Keep the build's scratch directory instead of removing it.
    pub keep_scratch: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cue: CueConfig::default(),
            render: RenderSettings::default(),
            subtitle_language: "eng".to_string(),
            keep_scratch: false,
        }
    }
}

impl PipelineConfig {
    /// Set caption cue thresholds.
    #[must_use]
    pub fn with_cue_config(mut self, cue: CueConfig) -> Self {
        self.cue = cue;
        self
    }

    /// Set per-segment encoding settings.
    #[must_use]
    pub fn with_render_settings(mut self, render: RenderSettings) -> Self {
        self.render = render;
        self
    }

    /// Set the subtitle stream language tag.
    #[must_use]
    pub fn with_subtitle_language(mut self, language: &str) -> Self {
        self.subtitle_language = language.to_string();
        self
    }

    /// Keep scratch files after the build, for debugging.
    #[must_use]
    pub fn with_keep_scratch(mut self, keep: bool) -> Self {
        self.keep_scratch = keep;
        self
    }
}

/// Result of a completed build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub story_id: String,
    /// Published final video path.
    pub final_video: PathBuf,
    /// Whether a caption track was embedded. False when the transcript
    /// was absent, empty, unusable, or the mux step fell back.
    pub subtitles_applied: bool,
}

/// Media-assembly pipeline for one story store.
pub struct AssemblyPipeline {
    config: PipelineConfig,
    encoder: Arc<dyn MediaEncoder>,
    probe: Arc<dyn DurationProbe>,
    renderer: Arc<SegmentRenderer>,
    concatenator: Concatenator,
    muxer: SubtitleMuxer,
}

impl AssemblyPipeline {
    /// Create a pipeline driving the system ffmpeg/ffprobe binaries.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Ok(Self::with_collaborators(
            config,
            Arc::new(FfmpegEncoder::new()),
            Arc::new(FfprobeDurationProbe::new()),
        ))
    }

    /// Create a pipeline with injected encoder and probe collaborators.
    #[must_use]
    pub fn with_collaborators(
        config: PipelineConfig,
        encoder: Arc<dyn MediaEncoder>,
        probe: Arc<dyn DurationProbe>,
    ) -> Self {
        let renderer = Arc::new(SegmentRenderer::new(encoder.clone(), config.render.clone()));
        let concatenator = Concatenator::new(encoder.clone());
        let muxer = SubtitleMuxer::new(encoder.clone()).with_language(&config.subtitle_language);
        Self {
            config,
            encoder,
            probe,
            renderer,
            concatenator,
            muxer,
        }
    }

    /// Check that the external tools are callable.
    pub async fn check_dependencies(&self) -> Vec<(String, bool)> {
        vec![
            ("ffmpeg".to_string(), self.encoder.check_available().await),
            ("ffprobe".to_string(), self.probe.check_available().await),
        ]
    }

    /// Build the final video for one story.
    ///
    /// Mandatory stages abort on their first failure; the subtitle stage
    /// only ever degrades. No partial final video is observable: the
    /// artifact is assembled in scratch and renamed into place at the end.
    pub async fn build(&self, store: &StoryStore, story_id: &str) -> Result<BuildReport> {
        info!(stage = %BuildStage::Validating, "validating asset bundle for story {story_id}");
        let bundle = store.validate(story_id).await?;

        info!(stage = %BuildStage::Planning, "probing narration duration");
        let total = self.probe.duration_seconds(&bundle.narration).await?;
        let windows = plan(total, SEGMENT_COUNT)?;
        info!(
            "narration is {total:.3}s; each of {SEGMENT_COUNT} segments gets {:.3}s",
            windows[0].duration_seconds
        );

        let scratch = bundle
            .story_dir
            .join(format!("scratch-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&scratch).await?;

        let final_path = store.final_video_path(story_id);
        let result = self
            .run_stages(&bundle, &windows, &scratch, &final_path)
            .await;

        if !self.config.keep_scratch {
            let _ = tokio::fs::remove_dir_all(&scratch).await;
        }

        let subtitles_applied = result?;
        info!(stage = %BuildStage::Done, "story {story_id} built at {}", final_path.display());
        Ok(BuildReport {
            story_id: story_id.to_string(),
            final_video: final_path,
            subtitles_applied,
        })
    }

    async fn run_stages(
        &self,
        bundle: &AssetBundle,
        windows: &[super::planner::Window],
        scratch: &Path,
        final_path: &Path,
    ) -> Result<bool> {
        info!(stage = %BuildStage::Rendering, "rendering {} segments", windows.len());
        let clips = self.render_all(bundle, windows, scratch).await?;

        info!(stage = %BuildStage::Concatenating, "joining segments");
        let concatenated = scratch.join("story.mp4");
        self.concatenator
            .concat(&clips, &scratch.join("concat.txt"), &concatenated)
            .await?;

        info!(stage = %BuildStage::Subtitling, "building caption track");
        let track = self.build_track(&bundle.transcript).await;
        self.muxer
            .publish(&concatenated, track.as_ref(), scratch, final_path)
            .await
    }

    /// Render every window concurrently and wait for all of them.
    ///
    /// The fan-out is bounded by the window count; the encoder's own
    /// semaphore bounds total processes across builds. On the first
    /// failure the sibling renders are aborted (their ffmpeg children die
    /// with them) and the failure propagates.
    async fn render_all(
        &self,
        bundle: &AssetBundle,
        windows: &[super::planner::Window],
        scratch: &Path,
    ) -> Result<Vec<PathBuf>> {
        let mut tasks = JoinSet::new();
        let mut task_windows = HashMap::new();

        for window in windows {
            let renderer = self.renderer.clone();
            let image = bundle.images[window.index].clone();
            let audio = bundle.narration.clone();
            let clip = scratch.join(format!("clip-{}.mp4", window.index));
            let window = *window;

            let handle =
                tasks.spawn(async move { renderer.render(&image, &audio, &window, &clip).await });
            task_windows.insert(handle.id(), window.index);
        }

        let mut first_error: Option<AssemblyError> = None;
        while let Some(joined) = tasks.join_next_with_id().await {
            let error = match joined {
                Ok((_, Ok(()))) => continue,
                Ok((_, Err(e))) => e,
                Err(join_error) if join_error.is_cancelled() => AssemblyError::Cancelled,
                Err(join_error) => AssemblyError::RenderFailure {
                    index: task_windows.get(&join_error.id()).copied().unwrap_or(0),
                    message: format!("render task panicked: {join_error}"),
                },
            };
            if first_error.is_none() {
                first_error = Some(error);
                tasks.abort_all();
            }
        }

        if let Some(error) = first_error {
            return Err(error);
        }

        Ok(windows
            .iter()
            .map(|w| scratch.join(format!("clip-{}.mp4", w.index)))
            .collect())
    }

    /// Load the transcript and build the cue track. Never fails: a
    /// missing or unusable transcript degrades to "no subtitles".
    async fn build_track(&self, transcript_path: &Path) -> Option<SubtitleTrack> {
        match Transcript::load(transcript_path).await {
            Ok(Some(transcript)) => SubtitleTrack::build(&transcript, &self.config.cue),
            Ok(None) => {
                info!("no transcript present; skipping captions");
                None
            }
            Err(e) => {
                warn!("{e}; continuing without captions");
                None
            }
        }
    }
}
