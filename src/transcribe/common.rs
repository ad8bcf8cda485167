use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Video containers whose audio must be split out before recognition
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "flv"];

/// One timestamped text segment emitted by the recognizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    pub text: String,
    /// (start, end) in seconds; the last chunk may have no end
    #[serde(default)]
    pub timestamp: Option<(Option<f64>, Option<f64>)>,
}

/// Transcript file as written by the recognizer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub chunks: Vec<TranscriptChunk>,
}

impl Transcript {
    /// The top-level text when present, otherwise the chunk texts joined by single spaces
    pub fn full_text(&self) -> String {
        match &self.text {
            Some(text) => text.clone(),
            None => self
                .chunks
                .iter()
                .map(|chunk| chunk.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// Parse a transcript JSON document; malformed input is a decode error
pub fn parse_transcript(json: &str) -> Result<Transcript> {
    Ok(serde_json::from_str(json)?)
}

/// Whether the file is a raw video rather than an audio track
pub fn is_video_input(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
