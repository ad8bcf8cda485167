use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

use crate::config::MediaConfig;
use crate::error::{DubError, Result};
use super::{MediaCommandBuilder, MediaProcessorTrait};

/// ffprobe JSON output, reduced to what the duration check reads
#[derive(Debug, Deserialize)]
pub struct ProbeOutput {
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
    pub format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
pub struct ProbeStream {
    pub codec_type: Option<String>,
    pub duration: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProbeFormat {
    pub duration: Option<String>,
}

impl ProbeOutput {
    /// Duration of the first stream, or of the container when the stream carries none
    pub fn duration(&self) -> Result<f64> {
        let raw = self
            .streams
            .first()
            .and_then(|stream| stream.duration.as_deref())
            .or_else(|| self.format.as_ref().and_then(|format| format.duration.as_deref()))
            .ok_or_else(|| DubError::Media("Probe output carries no duration".to_string()))?;

        let duration = raw
            .trim()
            .parse::<f64>()
            .map_err(|e| DubError::Media(format!("Invalid duration '{}': {}", raw, e)))?;

        if !duration.is_finite() || duration < 0.0 {
            return Err(DubError::Media(format!("Invalid duration '{}'", raw)));
        }
        Ok(duration)
    }
}

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.ffmpeg_path, &config.ffprobe_path);

        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn resize_video(&self, input_path: &Path, output_path: &Path, max_height: u32) -> Result<()> {
        info!("Resizing {} -> {} ({}p)", input_path.display(), output_path.display(), max_height);

        self.command_builder
            .resize_video(input_path, output_path, max_height)
            .execute()
            .await?;

        Ok(())
    }

    async fn probe_duration(&self, media_path: &Path) -> Result<f64> {
        let stdout = self.command_builder.probe(media_path).execute().await?;
        let probe: ProbeOutput = serde_json::from_str(&stdout)?;
        let duration = probe.duration()?;

        debug!("Probed duration of {}: {:.2}s", media_path.display(), duration);
        Ok(duration)
    }

    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()> {
        info!("Extracting audio from {} to {}", video_path.display(), audio_path.display());

        self.command_builder
            .extract_audio(
                video_path,
                audio_path,
                &self.config.extract_codec,
                self.config.extract_sample_rate,
            )
            .execute()
            .await?;

        info!("Audio extraction completed");
        Ok(())
    }

    async fn filter_audio(&self, input_path: &Path, output_path: &Path) -> Result<()> {
        info!("Filtering audio ({}) -> {}", self.config.audio_filter, output_path.display());

        self.command_builder
            .filter_audio(input_path, output_path, &self.config.audio_filter)
            .execute()
            .await?;

        Ok(())
    }

    async fn replace_audio(&self, video_path: &Path, audio_path: &Path, output_path: &Path) -> Result<()> {
        info!(
            "Replacing audio of {} with {} -> {}",
            video_path.display(),
            audio_path.display(),
            output_path.display()
        );

        self.command_builder
            .replace_audio(video_path, audio_path, output_path)
            .execute()
            .await?;

        info!("Audio replacement completed successfully");
        Ok(())
    }

    async fn extract_speech_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()> {
        info!("Extracting speech audio from video: {}", video_path.display());

        self.command_builder
            .extract_speech_audio(video_path, audio_path)
            .execute()
            .await?;

        Ok(())
    }

    async fn check_availability(&self) -> Result<()> {
        self.command_builder
            .version_check()
            .execute()
            .await
            .map_err(|e| DubError::Media(format!("Media processor not found: {}", e)))?;

        self.command_builder
            .probe_version_check()
            .execute()
            .await
            .map_err(|e| DubError::Media(format!("Media probe not found: {}", e)))?;

        info!("Media processor is available");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_reads_first_stream_duration() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "duration": "10.010000"},
                {"codec_type": "audio", "duration": "9.984000"}
            ],
            "format": {"duration": "10.027000"}
        }"#;

        let probe: ProbeOutput = serde_json::from_str(json).unwrap();
        assert!((probe.duration().unwrap() - 10.01).abs() < 1e-9);
    }

    #[test]
    fn test_probe_falls_back_to_format_duration() {
        // Matroska streams carry no per-stream duration
        let json = r#"{
            "streams": [{"codec_type": "video"}],
            "format": {"duration": "90.5"}
        }"#;

        let probe: ProbeOutput = serde_json::from_str(json).unwrap();
        assert_eq!(probe.duration().unwrap(), 90.5);
    }

    #[test]
    fn test_probe_without_duration_is_media_error() {
        let probe: ProbeOutput = serde_json::from_str(r#"{"streams": []}"#).unwrap();
        assert!(matches!(probe.duration(), Err(DubError::Media(_))));

        let probe: ProbeOutput =
            serde_json::from_str(r#"{"streams": [{"duration": "N/A"}]}"#).unwrap();
        assert!(matches!(probe.duration(), Err(DubError::Media(_))));
    }

    #[test]
    fn test_non_finite_duration_is_rejected() {
        for raw in ["nan", "NaN", "inf", "-1.0"] {
            let json = format!(r#"{{"streams": [{{"duration": "{}"}}]}}"#, raw);
            let probe: ProbeOutput = serde_json::from_str(&json).unwrap();
            assert!(matches!(probe.duration(), Err(DubError::Media(_))), "accepted {}", raw);
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_resize_surfaces_process_error() {
        let mut config = crate::config::Config::default().media;
        config.ffmpeg_path = "false".to_string();
        let processor = MediaProcessorImpl::new(config);

        let result = processor
            .resize_video(Path::new("in.mp4"), Path::new("out.mp4"), 720)
            .await;
        assert!(matches!(result, Err(DubError::Process { .. })));
    }
}
