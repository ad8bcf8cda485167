// Media processing architecture
//
// This module provides a clean abstraction over the media-processing CLI:
// - Processor: ffmpeg/ffprobe-backed implementation
// - Commands: Command builders for each pipeline step

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;

pub use commands::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::{DubError, Result};

/// Main trait for media processing operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Re-encode video with its height capped, keeping the aspect ratio and even dimensions
    async fn resize_video(&self, input_path: &Path, output_path: &Path, max_height: u32) -> Result<()>;

    /// Duration of the media file in seconds
    async fn probe_duration(&self, media_path: &Path) -> Result<f64>;

    /// Demux the audio track to high-quality PCM
    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()>;

    /// Band-limit the audio before transcription
    async fn filter_audio(&self, input_path: &Path, output_path: &Path) -> Result<()>;

    /// Keep the video stream and replace the audio with a new AAC track
    async fn replace_audio(&self, video_path: &Path, audio_path: &Path, output_path: &Path) -> Result<()>;

    /// Extract a speech-recognition friendly track (16 kHz mono) from a raw video
    async fn extract_speech_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()>;

    /// Check if media processor is available
    async fn check_availability(&self) -> Result<()>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Box<dyn MediaProcessorTrait> {
        Box::new(processor::MediaProcessorImpl::new(config))
    }
}

/// Fail when a probed duration is strictly greater than the allowed maximum
pub fn check_duration(duration: f64, max_duration: f64) -> Result<()> {
    if duration > max_duration {
        return Err(DubError::DurationExceeded {
            duration,
            max: max_duration,
        });
    }
    Ok(())
}
