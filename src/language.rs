use serde::{Deserialize, Serialize};

use crate::error::{DubError, Result};

/// Language preselected in the web form
pub const DEFAULT_LANGUAGE: &str = "Spanish";

/// One dubbing target: display name, translation code and synthesis voice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub name: String,
    pub code: String,
    pub voice: String,
}

/// Ordered, read-only table of supported dubbing targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageTable {
    entries: Vec<LanguageEntry>,
}

const BUILTIN: &[(&str, &str, &str)] = &[
    ("English", "en", "en-US-EricNeural"),
    ("Spanish", "es", "es-ES-AlvaroNeural"),
    ("French", "fr", "fr-FR-HenriNeural"),
    ("German", "de", "de-DE-ConradNeural"),
    ("Italian", "it", "it-IT-DiegoNeural"),
    ("Portuguese", "pt", "pt-PT-DuarteNeural"),
    ("Polish", "pl", "pl-PL-MarekNeural"),
    ("Turkish", "tr", "tr-TR-AhmetNeural"),
    ("Russian", "ru", "ru-RU-DmitryNeural"),
    ("Dutch", "nl", "nl-NL-MaartenNeural"),
    ("Czech", "cs", "cs-CZ-AntoninNeural"),
    ("Arabic", "ar", "ar-SA-HamedNeural"),
    ("Chinese (Simplified)", "zh-CN", "zh-CN-YunxiNeural"),
    ("Japanese", "ja", "ja-JP-KeitaNeural"),
    ("Korean", "ko", "ko-KR-InJoonNeural"),
    ("Hindi", "hi", "hi-IN-MadhurNeural"),
    ("Swedish", "sv", "sv-SE-MattiasNeural"),
    ("Danish", "da", "da-DK-JeppeNeural"),
    ("Finnish", "fi", "fi-FI-HarriNeural"),
    ("Greek", "el", "el-GR-NestorasNeural"),
];

impl Default for LanguageTable {
    fn default() -> Self {
        Self::new(
            BUILTIN
                .iter()
                .map(|(name, code, voice)| LanguageEntry {
                    name: name.to_string(),
                    code: code.to_string(),
                    voice: voice.to_string(),
                })
                .collect(),
        )
    }
}

impl LanguageTable {
    pub fn new(entries: Vec<LanguageEntry>) -> Self {
        Self { entries }
    }

    /// Find the entry for a display name. Unknown names are an error, never a default.
    pub fn lookup(&self, name: &str) -> Result<&LanguageEntry> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| DubError::UnsupportedLanguage(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn entries(&self) -> &[LanguageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
