// Speech recognition
//
// The recognizer is an external CLI that writes a JSON transcript file.
// - common: transcript format and text derivation
// - insanely_fast_whisper: subprocess-backed implementation

pub mod common;
pub mod insanely_fast_whisper;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use common::*;
use crate::config::TranscriberConfig;
use crate::error::Result;
use crate::media::MediaProcessorTrait;

/// Main trait for transcription operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriberTrait: Send + Sync {
    /// Transcribe an audio file, or a video file whose audio is extracted first
    async fn transcribe(&self, input_path: &Path) -> Result<Transcript>;
}

/// Factory for creating transcriber instances
pub struct TranscriberFactory;

impl TranscriberFactory {
    pub fn create_default(
        config: TranscriberConfig,
        work_dir: PathBuf,
        hf_token: Option<String>,
        media: Arc<dyn MediaProcessorTrait>,
    ) -> Box<dyn TranscriberTrait> {
        Box::new(insanely_fast_whisper::InsanelyFastWhisperTranscriber::new(
            config, work_dir, hf_token, media,
        ))
    }
}
