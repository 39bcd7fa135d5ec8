//! Language identifiers across the stage boundary.
//!
//! The recognition engine reports short codes ("en", "tr"); the translation
//! engine expects FLORES-200 style codes ("eng_Latn", "tur_Latn").

use std::collections::HashMap;
use tracing::{debug, warn};

/// Source code used when nothing usable was detected
pub const FALLBACK_SOURCE_LANG: &str = "eng_Latn";

/// Recognition-engine code -> translation-engine code table
#[derive(Debug, Clone, Default)]
pub struct LanguageCodeMap {
    table: HashMap<String, String>,
}

impl LanguageCodeMap {
    pub fn new(table: HashMap<String, String>) -> Self {
        Self { table }
    }

    /// Map a detected code; unmapped codes pass through unchanged
    pub fn map(&self, code: &str) -> String {
        match self.table.get(code) {
            Some(mapped) => {
                debug!("Mapped language code {} -> {}", code, mapped);
                mapped.clone()
            }
            None => code.to_string(),
        }
    }

    /// Resolve the translation source code, falling back to English when empty
    pub fn resolve_source(&self, code: &str) -> String {
        let mapped = self.map(code.trim());
        if mapped.trim().is_empty() {
            warn!("No usable source language, falling back to {}", FALLBACK_SOURCE_LANG);
            FALLBACK_SOURCE_LANG.to_string()
        } else {
            mapped
        }
    }
}

/// Human-readable name for a short or FLORES-style code, used in prompts.
///
/// The part before `_`/`-` is looked up as ISO 639-1 (two letters) or
/// ISO 639-3 (three letters); unknown codes come back unchanged.
pub fn language_name(code: &str) -> String {
    let base = code
        .split(['_', '-'])
        .next()
        .unwrap_or(code)
        .to_lowercase();

    let language = match base.len() {
        2 => isolang::Language::from_639_1(&base),
        3 => isolang::Language::from_639_3(&base),
        _ => None,
    };

    match language {
        // "Modern Greek (1453-)" -> "Modern Greek"
        Some(lang) => lang.to_name().split(" (").next().unwrap_or(lang.to_name()).to_string(),
        None => {
            debug!("No language name for code {}", code);
            code.to_string()
        }
    }
}
