use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use crate::command::ToolCommand;
use crate::config::LipSyncConfig;
use crate::error::Result;
use super::LipSyncer;

pub struct Wav2LipSyncer {
    config: LipSyncConfig,
}

impl Wav2LipSyncer {
    pub fn new(config: LipSyncConfig) -> Self {
        Self { config }
    }

    pub fn build_command(&self, face_video: &Path, audio_path: &Path, output_path: &Path) -> ToolCommand {
        let mut cmd = ToolCommand::new(&self.config.python_path, "Wav2Lip inference")
            .arg(self.config.script_path.as_str())
            .flag("--checkpoint_path", self.config.checkpoint_path.as_str())
            .arg("--face")
            .path_arg(face_video)
            .arg("--audio")
            .path_arg(audio_path)
            .arg("--pads")
            .args(self.config.pads.iter().map(|pad| pad.to_string()))
            .flag("--resize_factor", self.config.resize_factor.to_string());

        if self.config.nosmooth {
            cmd = cmd.arg("--nosmooth");
        }

        cmd.arg("--outfile").path_arg(output_path)
    }
}

#[async_trait]
impl LipSyncer for Wav2LipSyncer {
    async fn resynthesize(&self, face_video: &Path, audio_path: &Path, output_path: &Path) -> Result<()> {
        info!("Running Wav2Lip on {} -> {}", face_video.display(), output_path.display());

        self.build_command(face_video, audio_path, output_path).execute().await?;

        info!("Lip-sync completed");
        Ok(())
    }
}
