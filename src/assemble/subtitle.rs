//! Caption cue building and SRT serialization.
//!
//! Word timestamps are grouped into caption cues: words accumulate into an
//! open cue until the cue is full, the transcript ends, or a long enough
//! pause follows the current word. The resulting track serializes to
//! `SubRip` for soft-muxing into the final video.

use std::fmt::Write as FmtWrite;

use serde::Serialize;

use super::transcript::Transcript;

/// Cue-closing thresholds.
///
/// Defaults match the narration pacing the upstream voice generator
/// produces; both are overridable per pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CueConfig {
    /// Maximum words per cue.
    pub max_words: usize,
    /// A pause longer than this (between one word's end and the next
    /// word's start) closes the open cue.
    pub max_gap_seconds: f64,
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            max_words: 10,
            max_gap_seconds: 0.7,
        }
    }
}

impl CueConfig {
    /// Set the per-cue word cap.
    #[must_use]
    pub fn with_max_words(mut self, max_words: usize) -> Self {
        self.max_words = max_words.max(1);
        self
    }

    /// Set the pause threshold in seconds.
    #[must_use]
    pub fn with_max_gap_seconds(mut self, max_gap_seconds: f64) -> Self {
        self.max_gap_seconds = max_gap_seconds;
        self
    }
}

/// One subtitle caption with timing and text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cue {
    /// Sequence number, ascending from 1.
    pub index: usize,
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub text: String,
}

/// Ordered, non-overlapping caption cues for one narration track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtitleTrack {
    pub cues: Vec<Cue>,
}

/// Format seconds as an SRT timestamp (HH:MM:SS,mmm).
fn format_srt_time(seconds: f64) -> String {
    let ms = (seconds * 1000.0).round() as u64;
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let secs = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    format!("{hours:02}:{minutes:02}:{secs:02},{millis:03}")
}

impl SubtitleTrack {
    /// Group transcript words into cues.
    ///
    /// Returns `None` for an empty transcript: the explicit "no
    /// subtitles" outcome, distinct from a failure.
    #[must_use]
    pub fn build(transcript: &Transcript, config: &CueConfig) -> Option<Self> {
        if transcript.is_empty() {
            return None;
        }

        let words = &transcript.words;
        let mut cues = Vec::new();
        let mut open_start = 0;

        for (i, word) in words.iter().enumerate() {
            let accumulated = i - open_start + 1;
            let is_last = i + 1 == words.len();
            let pause_follows = !is_last
                && words[i + 1].start_seconds - word.end_seconds > config.max_gap_seconds;

            if accumulated >= config.max_words || is_last || pause_follows {
                let slice = &words[open_start..=i];
                let text = slice
                    .iter()
                    .map(|w| w.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                cues.push(Cue {
                    index: cues.len() + 1,
                    start_seconds: slice[0].start_seconds,
                    end_seconds: slice[slice.len() - 1].end_seconds,
                    text,
                });
                open_start = i + 1;
            }
        }

        Some(Self { cues })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Serialize to `SubRip` format.
    #[must_use]
    pub fn to_srt(&self) -> String {
        let mut output = String::new();

        for cue in &self.cues {
            // Writing to a String cannot fail.
            let _ = writeln!(output, "{}", cue.index);
            let _ = writeln!(
                output,
                "{} --> {}",
                format_srt_time(cue.start_seconds),
                format_srt_time(cue.end_seconds)
            );
            let _ = writeln!(output, "{}", cue.text);
            let _ = writeln!(output);
        }

        output
    }
}
