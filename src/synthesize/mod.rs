// Speech synthesis
//
// - edge_tts: Microsoft Edge neural voices through the edge-tts CLI

pub mod edge_tts;

use async_trait::async_trait;
use std::path::Path;

use crate::config::SynthesizerConfig;
use crate::error::Result;

/// Main trait for text-to-speech operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Speak `text` with `voice` into `output_path`; returns once the file is complete
    async fn synthesize(&self, text: &str, voice: &str, output_path: &Path) -> Result<()>;
}

/// Factory for creating synthesizer instances
pub struct SynthesizerFactory;

impl SynthesizerFactory {
    pub fn create_synthesizer(config: SynthesizerConfig) -> Box<dyn Synthesizer> {
        Box::new(edge_tts::EdgeTtsSynthesizer::new(config))
    }
}
