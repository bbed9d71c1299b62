//! `storyreel` - Narrated story to vertical video assembly
//!
//! # Features
//!
//! - **Segment planning**: equal time windows over the narration track
//! - **Caption cues**: word-level timestamps grouped into an SRT track
//! - **Clip rendering**: one ffmpeg-rendered clip per still image
//! - **Stream-copy concatenation** and soft-subtitle muxing with an
//!   unsubtitled fallback, published atomically
//!
//! # Example
//!
//! ```rust,no_run
//! use storyreel::{AssemblyPipeline, PipelineConfig, StoryStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = StoryStore::new("stories");
//!     let pipeline = AssemblyPipeline::new(PipelineConfig::default())?;
//!     let report = pipeline.build(&store, "a1b2c3").await?;
//!     println!("built {} (captions: {})", report.final_video.display(), report.subtitles_applied);
//!     Ok(())
//! }
//! ```

pub mod assemble;
pub mod store;

pub use assemble::{
    AssemblyError, AssemblyPipeline, BuildReport, BuildStage, Cue, CueConfig, PipelineConfig,
    SubtitleTrack, Transcript, Window,
};
pub use store::{AssetBundle, StoryStore};

/// Version of storyreel
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
