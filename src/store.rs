//! Story directory store.
//!
//! Each story lives in its own directory under the store root, named by an
//! opaque ID the upstream generation service assigned. The generator owns
//! the bundle's lifecycle; this side only reads it and writes derived
//! artifacts back into the same directory:
//!
//! ```text
//! <root>/<story-id>/
//!   b-roll-1.png … b-roll-3.png   stills, one per segment
//!   voiceover-1.mp3               narration track
//!   transcription-1.json          optional word-level transcript
//!   final.mp4                     published build output
//! ```
//!
//! A zero-byte asset, or one with a `.degraded` sibling marker, is what
//! the generator leaves behind when it failed to produce that asset; both
//! are treated as missing so broken media never reaches an encoder.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::assemble::{AssemblyError, Result, SEGMENT_COUNT};

/// Still image file name for a 1-based segment number.
fn image_file(number: usize) -> String {
    format!("b-roll-{number}.png")
}

/// Narration track file name.
pub const NARRATION_FILE: &str = "voiceover-1.mp3";

/// Optional word-level transcript file name.
pub const TRANSCRIPT_FILE: &str = "transcription-1.json";

/// Published final video file name.
pub const FINAL_VIDEO_FILE: &str = "final.mp4";

/// Validated input assets for one story.
#[derive(Debug, Clone)]
pub struct AssetBundle {
    pub story_dir: PathBuf,
    /// Exactly one still per segment, in segment order.
    pub images: Vec<PathBuf>,
    pub narration: PathBuf,
    /// Path the transcript would live at; the file may not exist.
    pub transcript: PathBuf,
}

/// Directory-addressable store of story bundles and their final videos.
#[derive(Debug, Clone)]
pub struct StoryStore {
    root: PathBuf,
}

impl StoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for one story.
    #[must_use]
    pub fn story_dir(&self, story_id: &str) -> PathBuf {
        self.root.join(story_id)
    }

    /// Deterministic final video path for one story.
    #[must_use]
    pub fn final_video_path(&self, story_id: &str) -> PathBuf {
        self.story_dir(story_id).join(FINAL_VIDEO_FILE)
    }

    /// Check that `path` is a usable (present, non-empty, not degraded)
    /// asset file.
    async fn usable_asset(path: &Path) -> bool {
        let mut marker = path.as_os_str().to_os_string();
        marker.push(".degraded");
        if tokio::fs::metadata(&marker).await.is_ok() {
            return false;
        }

        match tokio::fs::metadata(path).await {
            Ok(meta) => meta.is_file() && meta.len() > 0,
            Err(_) => false,
        }
    }

    /// Validate the bundle for `story_id`.
    ///
    /// Requires the story directory, exactly [`SEGMENT_COUNT`] usable
    /// stills, and a non-empty narration track. Fails with `MissingAsset`
    /// before any encoder work happens; placeholder synthesis belongs to
    /// the upstream generator, not here.
    pub async fn validate(&self, story_id: &str) -> Result<AssetBundle> {
        if story_id.is_empty()
            || story_id.contains(['/', '\\'])
            || story_id.contains("..")
        {
            return Err(AssemblyError::InvalidInput(format!(
                "story id {story_id:?} is not a valid identifier"
            )));
        }

        let story_dir = self.story_dir(story_id);
        match tokio::fs::metadata(&story_dir).await {
            Ok(meta) if meta.is_dir() => {}
            _ => {
                return Err(AssemblyError::MissingAsset(format!(
                    "story {story_id} not found in {}",
                    self.root.display()
                )));
            }
        }

        let mut images = Vec::with_capacity(SEGMENT_COUNT);
        for number in 1..=SEGMENT_COUNT {
            let path = story_dir.join(image_file(number));
            if !Self::usable_asset(&path).await {
                return Err(AssemblyError::MissingAsset(format!(
                    "image {number} of {SEGMENT_COUNT} for story {story_id} ({})",
                    path.display()
                )));
            }
            images.push(path);
        }

        let narration = story_dir.join(NARRATION_FILE);
        if !Self::usable_asset(&narration).await {
            return Err(AssemblyError::MissingAsset(format!(
                "narration track for story {story_id} ({})",
                narration.display()
            )));
        }

        debug!("validated bundle for story {story_id}");
        Ok(AssetBundle {
            transcript: story_dir.join(TRANSCRIPT_FILE),
            story_dir,
            images,
            narration,
        })
    }

    /// Story IDs with a completed final video, sorted. A missing store
    /// root lists as empty rather than failing.
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if tokio::fs::metadata(entry.path().join(FINAL_VIDEO_FILE))
                .await
                .is_ok()
            {
                ids.push(name);
            }
        }

        ids.sort();
        Ok(ids)
    }
}
