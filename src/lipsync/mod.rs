// Lip-sync resynthesis
//
// - wav2lip: Wav2Lip inference script driven as a subprocess

pub mod wav2lip;

use async_trait::async_trait;
use std::path::Path;

use crate::config::LipSyncConfig;
use crate::error::Result;

/// Regenerates mouth-region frames so the face matches new audio
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LipSyncer: Send + Sync {
    async fn resynthesize(&self, face_video: &Path, audio_path: &Path, output_path: &Path) -> Result<()>;
}

/// Factory for creating lip-sync instances
pub struct LipSyncerFactory;

impl LipSyncerFactory {
    pub fn create_lipsyncer(config: LipSyncConfig) -> Box<dyn LipSyncer> {
        Box::new(wav2lip::Wav2LipSyncer::new(config))
    }
}
