use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::command::ToolCommand;
use crate::config::{TranscriberConfig, HF_TOKEN_ENV};
use crate::error::{DubError, Result};
use crate::media::MediaProcessorTrait;
use crate::run::cleanup_files;
use super::{is_video_input, parse_transcript, Transcript, TranscriberTrait};

/// insanely-fast-whisper CLI transcriber
pub struct InsanelyFastWhisperTranscriber {
    config: TranscriberConfig,
    work_dir: PathBuf,
    hf_token: Option<String>,
    media: Arc<dyn MediaProcessorTrait>,
}

impl InsanelyFastWhisperTranscriber {
    pub fn new(
        config: TranscriberConfig,
        work_dir: PathBuf,
        hf_token: Option<String>,
        media: Arc<dyn MediaProcessorTrait>,
    ) -> Self {
        Self {
            config,
            work_dir,
            hf_token,
            media,
        }
    }

    fn temp_path(&self, extension: &str) -> PathBuf {
        self.work_dir.join(format!("{}.{}", Uuid::new_v4(), extension))
    }

    /// Build the recognizer invocation
    pub fn build_command(&self, audio_path: &Path, transcript_path: &Path) -> ToolCommand {
        let mut cmd = ToolCommand::new(&self.config.binary_path, "Speech recognition")
            .arg("--file-name")
            .path_arg(audio_path)
            .flag("--device-id", self.config.device_id.as_str())
            .flag("--model-name", self.config.model_name.as_str())
            .flag("--task", "transcribe")
            .flag("--timestamp", self.config.timestamp.as_str())
            .arg("--transcript-path")
            .path_arg(transcript_path);

        if let Some(token) = &self.hf_token {
            cmd = cmd.env(HF_TOKEN_ENV, token.as_str());
        }

        cmd
    }

    async fn run(&self, input_path: &Path, temp_audio: Option<&Path>, transcript_path: &Path) -> Result<Transcript> {
        let audio_path = match temp_audio {
            Some(temp_audio) => {
                info!("Video file detected. Extracting audio...");
                self.media.extract_speech_audio(input_path, temp_audio).await?;
                temp_audio
            }
            None => input_path,
        };

        let stdout = self.build_command(audio_path, transcript_path).execute().await?;
        debug!("Transcription output: {}", stdout.trim());

        let content = tokio::fs::read_to_string(transcript_path).await.map_err(|e| {
            DubError::Transcription(format!(
                "Failed to read transcript {}: {}",
                transcript_path.display(),
                e
            ))
        })?;

        parse_transcript(&content)
    }
}

#[async_trait]
impl TranscriberTrait for InsanelyFastWhisperTranscriber {
    async fn transcribe(&self, input_path: &Path) -> Result<Transcript> {
        info!("Starting transcription of file: {}", input_path.display());

        let temp_audio = is_video_input(input_path).then(|| self.temp_path("wav"));
        let transcript_path = self.temp_path("json");

        let result = self.run(input_path, temp_audio.as_deref(), &transcript_path).await;

        // Temp files go on every exit path
        let mut temp_files = vec![transcript_path];
        temp_files.extend(temp_audio);
        cleanup_files(&temp_files).await;

        result
    }
}
