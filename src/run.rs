use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Short per-request token used to namespace temporary files
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId(String);

impl RunId {
    const LEN: usize = 6;

    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self(hex[..Self::LEN].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The on-disk files owned by one run, named `{run_id}_{purpose}.{ext}`
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub resized_video: PathBuf,
    pub extracted_audio: PathBuf,
    pub filtered_audio: PathBuf,
    pub synth_audio: PathBuf,
    pub output_video: PathBuf,
}

impl RunArtifacts {
    pub fn new<P: AsRef<Path>>(work_dir: P, run_id: &RunId) -> Self {
        let dir = work_dir.as_ref();
        let name = |purpose: &str| dir.join(format!("{}_{}", run_id, purpose));

        Self {
            resized_video: name("resized_video.mp4"),
            extracted_audio: name("output_audio.wav"),
            filtered_audio: name("output_audio_final.wav"),
            synth_audio: name("output_synth.wav"),
            output_video: name("output_video.mp4"),
        }
    }

    /// Every artifact except the final output
    pub fn intermediates(&self) -> [&Path; 4] {
        [
            &self.resized_video,
            &self.extracted_audio,
            &self.filtered_audio,
            &self.synth_audio,
        ]
    }
}

/// Remove the given files, skipping empty or missing paths.
/// Safe to call repeatedly on the same paths.
pub async fn cleanup_files<P: AsRef<Path>>(paths: &[P]) {
    for path in paths {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            continue;
        }

        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!("Removed file: {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
        }
    }
}
