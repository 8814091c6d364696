use std::sync::mpsc::{Receiver, TryRecvError};

use thiserror::Error;
use tracing::{debug, warn};

use crate::model::language::{self, LanguageRole};
use crate::model::session::SessionState;
use crate::services::speech::{
    SpeechOutcome, SpeechRequest, SpeechSynthesizer, NEUTRAL_PITCH, SLOWED_RATE,
};
use crate::services::translate::TranslationService;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("input text is empty")]
    EmptyInput,
    #[error("a translation is already in flight")]
    Busy,
    #[error("translation failed, check your connection")]
    TranslationFailed,
    #[error("unknown language code: {0}")]
    UnknownLanguage(String),
}

/// The translation-and-speech controller. Owns the session state and the
/// two external collaborators; every handler the view binds to goes
/// through here.
pub struct Controller {
    state: SessionState,
    translator: Box<dyn TranslationService>,
    synthesizer: Box<dyn SpeechSynthesizer>,
    pending_speech: Option<Receiver<SpeechOutcome>>,
}

impl Controller {
    pub fn new(
        translator: Box<dyn TranslationService>,
        synthesizer: Box<dyn SpeechSynthesizer>,
    ) -> Self {
        Controller {
            state: SessionState::default(),
            translator,
            synthesizer,
            pending_speech: None,
        }
    }

    /// Current state, with any pending speech outcome applied first.
    pub fn state(&mut self) -> &SessionState {
        self.pump_speech();
        &self.state
    }

    pub fn set_text(&mut self, text: &str) {
        self.state.set_text(text);
    }

    /// Overwrites one side of the language pair. Leaves input text,
    /// translated text and in-flight work alone.
    pub fn select_language(&mut self, role: LanguageRole, code: &str) -> Result<(), CoreError> {
        let entry =
            language::find(code).ok_or_else(|| CoreError::UnknownLanguage(code.to_string()))?;
        match role {
            LanguageRole::Source => self.state.source_language = entry.code.to_string(),
            LanguageRole::Target => self.state.target_language = entry.code.to_string(),
        }
        Ok(())
    }

    /// Validates the input, runs one translation request and, on success,
    /// speaks the result as a continuation. The previously stored
    /// translation survives a failed attempt.
    pub fn submit_translation(&mut self) -> Result<String, CoreError> {
        let text = self.state.text.trim().to_string();
        if text.is_empty() {
            return Err(CoreError::EmptyInput);
        }
        if self.state.loading {
            return Err(CoreError::Busy);
        }

        self.state.loading = true;
        let result = self.translator.translate(
            &text,
            &self.state.source_language,
            &self.state.target_language,
        );
        // Cleared on both paths, before any continuation runs.
        self.state.loading = false;

        match result {
            Ok(translated) => {
                self.state.translated_text = translated.clone();
                self.speak(Some(&translated));
                Ok(translated)
            }
            Err(error) => {
                warn!(%error, "translation request failed");
                Err(CoreError::TranslationFailed)
            }
        }
    }

    /// Speaks the given text, or the stored translation when none is
    /// supplied. Empty text is a silent no-op; a synthesis failure is
    /// logged and clears the speaking flag, nothing more.
    pub fn speak(&mut self, text: Option<&str>) {
        let text = match text {
            Some(t) => t.to_string(),
            None => self.state.translated_text.clone(),
        };
        if text.trim().is_empty() {
            return;
        }

        let request = SpeechRequest {
            text,
            language: self.state.target_language.clone(),
            pitch: NEUTRAL_PITCH,
            rate: SLOWED_RATE,
        };

        self.state.speaking = true;
        match self.synthesizer.speak(&request) {
            Ok(rx) => self.pending_speech = Some(rx),
            Err(error) => {
                warn!(%error, "speech synthesis did not start");
                self.pending_speech = None;
                self.state.speaking = false;
            }
        }
    }

    /// Cancels playback and clears the speaking flag unconditionally,
    /// whether or not anything was playing.
    pub fn stop_speaking(&mut self) {
        if let Err(error) = self.synthesizer.stop() {
            debug!(%error, "stop request failed");
        }
        self.pending_speech = None;
        self.state.speaking = false;
    }

    /// Forces the in-flight marker, standing in for an embedding that
    /// drives the controller from more than one place.
    #[cfg(test)]
    pub(crate) fn mark_loading(&mut self) {
        self.state.loading = true;
    }

    /// Drains the speech completion channel. Done, failed and a dropped
    /// sender all clear the speaking flag.
    pub fn pump_speech(&mut self) {
        let Some(rx) = &self.pending_speech else {
            return;
        };
        match rx.try_recv() {
            Ok(SpeechOutcome::Done) => {
                self.pending_speech = None;
                self.state.speaking = false;
            }
            Ok(SpeechOutcome::Failed(reason)) => {
                warn!(%reason, "speech synthesis failed");
                self.pending_speech = None;
                self.state.speaking = false;
            }
            Err(TryRecvError::Disconnected) => {
                self.pending_speech = None;
                self.state.speaking = false;
            }
            Err(TryRecvError::Empty) => {}
        }
    }
}
