//! Word-level transcript parsing.
//!
//! The speech-to-text collaborator leaves a JSON file shaped as
//! `{ "words": [ { "word", "startTime", "endTime" } ] }` next to the
//! narration track, with offsets as decimal-second strings carrying an
//! `s` suffix (`"1.500s"`). The transcript is optional input: a missing
//! file means "no captions", and an unusable file is reported as
//! [`AssemblyError::MalformedTranscript`] for the caller to degrade on.

use std::path::Path;

use serde::Deserialize;

use super::{AssemblyError, Result};

/// One spoken word with its timing.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
}

/// Ordered word-level transcript of the narration track.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    pub words: Vec<Word>,
}

#[derive(Debug, Deserialize)]
struct RawTranscript {
    #[serde(default)]
    words: Vec<RawWord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWord {
    word: String,
    start_time: String,
    end_time: String,
}

/// Parse a `"1.500s"`-style offset into seconds.
fn parse_offset(raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_suffix('s').unwrap_or(trimmed);
    let seconds: f64 = digits.parse().map_err(|_| {
        AssemblyError::MalformedTranscript(format!("unparsable time offset {raw:?}"))
    })?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(AssemblyError::MalformedTranscript(format!(
            "time offset out of range: {raw:?}"
        )));
    }
    Ok(seconds)
}

impl Transcript {
    /// True when there are no words to caption.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Parse transcript JSON.
    ///
    /// Fails with `MalformedTranscript` on invalid JSON, unparsable
    /// offsets, or any word whose end precedes its start.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawTranscript = serde_json::from_str(json).map_err(|e| {
            AssemblyError::MalformedTranscript(format!("invalid transcript JSON: {e}"))
        })?;

        let mut words = Vec::with_capacity(raw.words.len());
        for entry in raw.words {
            let start_seconds = parse_offset(&entry.start_time)?;
            let end_seconds = parse_offset(&entry.end_time)?;
            if end_seconds < start_seconds {
                return Err(AssemblyError::MalformedTranscript(format!(
                    "word {:?} ends at {end_seconds}s before it starts at {start_seconds}s",
                    entry.word
                )));
            }
            words.push(Word {
                text: entry.word,
                start_seconds,
                end_seconds,
            });
        }

        Ok(Self { words })
    }

    /// Load and parse a transcript file. `Ok(None)` when the file does
    /// not exist; `MalformedTranscript` when it exists but is unusable.
    pub async fn load(path: &Path) -> Result<Option<Self>> {
        match tokio::fs::read_to_string(path).await {
            Ok(json) => Ok(Some(Self::from_json(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AssemblyError::MalformedTranscript(format!(
                "unreadable transcript {}: {e}",
                path.display()
            ))),
        }
    }
}
