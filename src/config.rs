use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{DubError, Result};
use crate::language::LanguageTable;

/// Environment variable holding the model-hosting API token
pub const HF_TOKEN_ENV: &str = "HF_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub transcriber: TranscriberConfig,
    pub translate: TranslateConfig,
    pub synthesizer: SynthesizerConfig,
    pub lipsync: LipSyncConfig,
    pub media: MediaConfig,
    pub server: ServerConfig,
    /// Supported dubbing targets, in dropdown order
    #[serde(default)]
    pub languages: LanguageTable,
    /// Credential for the model-hosting API, read from the environment only
    #[serde(skip)]
    pub hf_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriberConfig {
    /// Path to the speech recognition binary (insanely-fast-whisper)
    pub binary_path: String,
    /// Model passed via --model-name
    pub model_name: String,
    /// GPU index passed via --device-id
    pub device_id: String,
    /// Timestamp granularity (chunk or word)
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Translation endpoint URL
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesizerConfig {
    /// Path to the edge-tts binary
    pub binary_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LipSyncConfig {
    /// Python interpreter used to run Wav2Lip
    pub python_path: String,
    /// Wav2Lip inference script
    pub script_path: String,
    /// Wav2Lip GAN checkpoint
    pub checkpoint_path: String,
    /// Face box padding (top, bottom, left, right)
    pub pads: [u32; 4],
    pub resize_factor: u32,
    /// Disable temporal smoothing of face detections
    pub nosmooth: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub ffmpeg_path: String,
    /// Path to ffprobe binary
    pub ffprobe_path: String,
    /// Height cap applied when normalizing the input video
    pub max_height: u32,
    /// Longest accepted video, in seconds (inclusive)
    pub max_duration_secs: f64,
    /// Directory holding run-scoped artifacts and final outputs
    pub work_dir: PathBuf,
    /// PCM codec for the extracted speech track
    pub extract_codec: String,
    pub extract_sample_rate: u32,
    /// ffmpeg audio filter applied before transcription
    pub audio_filter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub addr: String,
    pub port: u16,
    /// Requests processed at once; the rest wait in line
    pub max_concurrent_jobs: usize,
    /// Upload size limit in megabytes
    pub max_upload_mb: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transcriber: TranscriberConfig {
                binary_path: "insanely-fast-whisper".to_string(),
                model_name: "openai/whisper-large-v3".to_string(),
                device_id: "0".to_string(),
                timestamp: "chunk".to_string(),
            },
            translate: TranslateConfig {
                endpoint: "https://translate.googleapis.com/translate_a/single".to_string(),
                timeout_secs: 60,
            },
            synthesizer: SynthesizerConfig {
                binary_path: "edge-tts".to_string(),
            },
            lipsync: LipSyncConfig {
                python_path: "python".to_string(),
                script_path: "Wav2Lip/inference.py".to_string(),
                checkpoint_path: "Wav2Lip/checkpoints/wav2lip_gan.pth".to_string(),
                pads: [0, 15, 0, 0],
                resize_factor: 1,
                nosmooth: true,
            },
            media: MediaConfig {
                ffmpeg_path: "ffmpeg".to_string(),
                ffprobe_path: "ffprobe".to_string(),
                max_height: 720,
                max_duration_secs: 60.0,
                work_dir: PathBuf::from("."),
                extract_codec: "pcm_s24le".to_string(),
                extract_sample_rate: 48000,
                audio_filter: "lowpass=3000,highpass=100".to_string(),
            },
            server: ServerConfig {
                addr: "127.0.0.1".to_string(),
                port: 7860,
                max_concurrent_jobs: 1,
                max_upload_mb: 512,
            },
            languages: LanguageTable::default(),
            hf_token: None,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DubError::Config(format!("Failed to read config file: {}", e)))?;

        Ok(toml::from_str(&content)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| DubError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| DubError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Build the process-wide configuration: explicit file, else ./config.toml, else defaults.
    /// The API token is always taken from the environment (or a .env file).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Config::from_file(path)?,
            None => {
                if Path::new("config.toml").exists() {
                    info!("Found config.toml in current directory, loading...");
                    Config::from_file("config.toml")?
                } else {
                    Config::default()
                }
            }
        };

        dotenv::dotenv().ok();
        config.hf_token = std::env::var(HF_TOKEN_ENV).ok().filter(|token| !token.is_empty());
        config.validate()?;

        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.languages.is_empty() {
            return Err(DubError::Config("Language table is empty".to_string()));
        }
        if self.media.max_height == 0 || self.media.max_height % 2 != 0 {
            return Err(DubError::Config(format!(
                "media.max_height must be a positive even number, got {}",
                self.media.max_height
            )));
        }
        if self.media.max_duration_secs <= 0.0 {
            return Err(DubError::Config("media.max_duration_secs must be positive".to_string()));
        }
        if self.server.max_concurrent_jobs == 0 {
            return Err(DubError::Config("server.max_concurrent_jobs must be at least 1".to_string()));
        }
        Ok(())
    }
}
