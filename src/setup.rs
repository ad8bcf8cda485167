use std::path::Path;
use tracing::{info, warn};

use crate::command::ToolCommand;
use crate::config::Config;
use crate::error::Result;

/// Availability of one external collaborator
#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub name: String,
    /// Pipeline stage that depends on the tool
    pub stage: &'static str,
    pub available: bool,
    /// Version line when available, failure reason otherwise
    pub detail: String,
}

/// Prepares the working directory and reports on the external toolchain
pub struct SetupManager;

impl SetupManager {
    /// Make sure the work directory exists
    pub async fn initialize(&self, config: &Config) -> Result<()> {
        tokio::fs::create_dir_all(&config.media.work_dir).await?;
        info!("Work directory: {}", config.media.work_dir.display());
        Ok(())
    }

    /// Probe every external tool the pipeline drives
    pub async fn check_tools(&self, config: &Config) -> Vec<ToolStatus> {
        let lipsync = &config.lipsync;

        let mut statuses = vec![
            probe_binary(&config.media.ffmpeg_path, "-version", "normalize / extract / remux").await,
            probe_binary(&config.media.ffprobe_path, "-version", "duration check").await,
            probe_binary(&config.transcriber.binary_path, "--help", "transcription").await,
            probe_binary(&config.synthesizer.binary_path, "--version", "speech synthesis").await,
            probe_binary(&lipsync.python_path, "--version", "lip-sync").await,
        ];
        statuses.push(probe_file(&lipsync.script_path, "lip-sync"));
        statuses.push(probe_file(&lipsync.checkpoint_path, "lip-sync"));

        for status in statuses.iter().filter(|status| !status.available) {
            warn!("{} unavailable ({}): {}", status.name, status.stage, status.detail);
        }

        statuses
    }
}

async fn probe_binary(binary: &str, version_flag: &str, stage: &'static str) -> ToolStatus {
    let result = ToolCommand::new(binary, format!("{} availability check", binary))
        .arg(version_flag)
        .execute()
        .await;

    let (available, detail) = match result {
        Ok(stdout) => (
            true,
            stdout.lines().next().unwrap_or("available").trim().to_string(),
        ),
        Err(e) => (false, e.to_string()),
    };

    ToolStatus {
        name: binary.to_string(),
        stage,
        available,
        detail,
    }
}

fn probe_file(path: &str, stage: &'static str) -> ToolStatus {
    let available = Path::new(path).is_file();

    ToolStatus {
        name: path.to_string(),
        stage,
        available,
        detail: if available { "present".to_string() } else { "file not found".to_string() },
    }
}
