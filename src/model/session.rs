use serde::Serialize;

use crate::model::language::{DEFAULT_SOURCE, DEFAULT_TARGET};

/// Upper bound of the input field, matching the view-side limit.
pub const MAX_INPUT_CHARS: usize = 500;

/// All mutable screen state. Lives as long as the process; nothing here is
/// persisted.
#[derive(Debug, Serialize, Clone)]
pub struct SessionState {
    pub text: String,
    pub source_language: String,
    pub target_language: String,
    pub translated_text: String,
    pub loading: bool,
    pub speaking: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState {
            text: String::new(),
            source_language: DEFAULT_SOURCE.to_string(),
            target_language: DEFAULT_TARGET.to_string(),
            translated_text: String::new(),
            loading: false,
            speaking: false,
        }
    }
}

impl SessionState {
    /// Replaces the input text, truncating to `MAX_INPUT_CHARS` on a
    /// character boundary.
    pub fn set_text(&mut self, text: &str) {
        if text.chars().count() > MAX_INPUT_CHARS {
            self.text = text.chars().take(MAX_INPUT_CHARS).collect();
        } else {
            self.text = text.to_string();
        }
    }
}
