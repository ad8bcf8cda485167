// Machine translation
//
// - google: hosted Google Translate engine

pub mod google;

use async_trait::async_trait;

use crate::config::TranslateConfig;
use crate::error::Result;

/// Main trait for translation operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate text into the language identified by `target_code`
    async fn translate(&self, text: &str, target_code: &str) -> Result<String>;
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    pub fn create_translator(config: TranslateConfig) -> Result<Box<dyn Translator>> {
        Ok(Box::new(google::GoogleTranslator::new(config)?))
    }
}
