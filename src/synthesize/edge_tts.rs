use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use crate::command::ToolCommand;
use crate::config::SynthesizerConfig;
use crate::error::{DubError, Result};
use super::Synthesizer;

pub struct EdgeTtsSynthesizer {
    config: SynthesizerConfig,
}

impl EdgeTtsSynthesizer {
    pub fn new(config: SynthesizerConfig) -> Self {
        Self { config }
    }

    pub fn build_command(&self, text: &str, voice: &str, output_path: &Path) -> ToolCommand {
        ToolCommand::new(&self.config.binary_path, "Speech synthesis")
            .flag("--voice", voice)
            // joined so a text starting with '-' is not read as an option
            .arg(format!("--text={}", text))
            .arg("--write-media")
            .path_arg(output_path)
    }
}

#[async_trait]
impl Synthesizer for EdgeTtsSynthesizer {
    async fn synthesize(&self, text: &str, voice: &str, output_path: &Path) -> Result<()> {
        info!("Synthesizing {} characters with {}", text.chars().count(), voice);

        self.build_command(text, voice, output_path).execute().await?;

        if !output_path.exists() {
            return Err(DubError::Synthesis(format!(
                "{} was not generated",
                output_path.display()
            )));
        }

        Ok(())
    }
}
