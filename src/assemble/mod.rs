//! Media-assembly pipeline: narration + stills + transcript → one MP4
//!
//! Stages, in order:
//! - Segment planning (equal time windows over the narration)
//! - Caption cue building (word timestamps → SRT track)
//! - Per-window clip rendering (still image + audio slice via ffmpeg)
//! - Stream-copy concatenation
//! - Soft-subtitle muxing with an unsubtitled fallback
//!
//! # Example
//!
//! ```rust,no_run
//! use storyreel::assemble::{AssemblyPipeline, PipelineConfig};
//! use storyreel::store::StoryStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = StoryStore::new("stories");
//!     let pipeline = AssemblyPipeline::new(PipelineConfig::default())?;
//!     let report = pipeline.build(&store, "a1b2c3").await?;
//!     println!("built {}", report.final_video.display());
//!     Ok(())
//! }
//! ```

pub mod concat;
pub mod encoder;
pub mod muxer;
pub mod pipeline;
pub mod planner;
pub mod probe;
pub mod renderer;
pub mod subtitle;
pub mod transcript;

use std::path::PathBuf;

use thiserror::Error;

pub use concat::Concatenator;
pub use encoder::{FfmpegEncoder, MediaEncoder};
pub use muxer::SubtitleMuxer;
pub use pipeline::{AssemblyPipeline, BuildReport, PipelineConfig};
pub use planner::{plan, Window, SEGMENT_COUNT};
pub use probe::{DurationProbe, FfprobeDurationProbe};
pub use renderer::{RenderSettings, SegmentRenderer};
pub use subtitle::{Cue, CueConfig, SubtitleTrack};
pub use transcript::{Transcript, Word};

/// Assembly pipeline errors
#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("missing asset: {0}")]
    MissingAsset(String),

    #[error("could not determine narration duration for {}: {message}", path.display())]
    DurationUnknown { path: PathBuf, message: String },

    #[error("malformed transcript: {0}")]
    MalformedTranscript(String),

    #[error("segment {index} render failed: {message}")]
    RenderFailure { index: usize, message: String },

    #[error("concatenation failed: {0}")]
    ConcatFailure(String),

    #[error("subtitle embedding failed: {0}")]
    SubtitleEmbedFailure(String),

    #[error("build cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AssemblyError>;

/// Pipeline stage a build was in when it succeeded or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Validating,
    Planning,
    Rendering,
    Concatenating,
    Subtitling,
    Done,
}

impl std::fmt::Display for BuildStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Validating => "validating",
            Self::Planning => "planning",
            Self::Rendering => "rendering",
            Self::Concatenating => "concatenating",
            Self::Subtitling => "subtitling",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

impl AssemblyError {
    /// Stage this error belongs to, for stage-and-cause failure reports.
    #[must_use]
    pub fn stage(&self) -> BuildStage {
        match self {
            Self::InvalidInput(_) | Self::MissingAsset(_) => BuildStage::Validating,
            Self::DurationUnknown { .. } => BuildStage::Planning,
            Self::RenderFailure { .. } | Self::Cancelled => BuildStage::Rendering,
            Self::ConcatFailure(_) | Self::Io(_) => BuildStage::Concatenating,
            Self::MalformedTranscript(_) | Self::SubtitleEmbedFailure(_) => BuildStage::Subtitling,
        }
    }

    /// True for failures callers should treat as unmet preconditions
    /// rather than pipeline faults.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::MissingAsset(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AssemblyError::MissingAsset("image 2 of 3".to_string());
        assert_eq!(err.to_string(), "missing asset: image 2 of 3");

        let err = AssemblyError::RenderFailure {
            index: 1,
            message: "ffmpeg exited with status: 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "segment 1 render failed: ffmpeg exited with status: 1"
        );
    }

    #[test]
    fn test_error_stage_mapping() {
        assert_eq!(
            AssemblyError::MissingAsset(String::new()).stage(),
            BuildStage::Validating
        );
        assert_eq!(
            AssemblyError::DurationUnknown {
                path: PathBuf::from("a.mp3"),
                message: String::new(),
            }
            .stage(),
            BuildStage::Planning
        );
        assert_eq!(
            AssemblyError::RenderFailure {
                index: 0,
                message: String::new(),
            }
            .stage(),
            BuildStage::Rendering
        );
        assert_eq!(
            AssemblyError::ConcatFailure(String::new()).stage(),
            BuildStage::Concatenating
        );
        assert_eq!(
            AssemblyError::SubtitleEmbedFailure(String::new()).stage(),
            BuildStage::Subtitling
        );
    }

    #[test]
    fn test_precondition_split() {
        assert!(AssemblyError::MissingAsset(String::new()).is_precondition());
        assert!(AssemblyError::InvalidInput(String::new()).is_precondition());
        assert!(!AssemblyError::ConcatFailure(String::new()).is_precondition());
        assert!(!AssemblyError::Cancelled.is_precondition());
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(BuildStage::Validating.to_string(), "validating");
        assert_eq!(BuildStage::Done.to_string(), "done");
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<AssemblyError>();
        assert_sync::<AssemblyError>();
    }
}
