use std::sync::mpsc::{self, Receiver};

use thiserror::Error;
use tracing::debug;

/// Pitch factor relative to the engine's neutral pitch.
pub const NEUTRAL_PITCH: f32 = 1.0;
/// Rate factor relative to the engine's normal rate. Slightly slowed so the
/// spoken translation stays intelligible.
pub const SLOWED_RATE: f32 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    /// Locale code used to pick a voice, e.g. `en-US`.
    pub language: String,
    pub pitch: f32,
    pub rate: f32,
}

/// Terminal state of one utterance, delivered over the completion channel.
/// A sender dropped without sending is also treated as completion, so the
/// speaking flag can never stick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutcome {
    Done,
    Failed(String),
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech backend error: {0}")]
    Backend(String),
}

/// On-device synthesis seam. `speak` starts the utterance and hands back the
/// channel on which its outcome will arrive; `stop` cancels whatever is
/// playing.
pub trait SpeechSynthesizer {
    fn speak(&mut self, request: &SpeechRequest) -> Result<Receiver<SpeechOutcome>, SpeechError>;
    fn stop(&mut self) -> Result<(), SpeechError>;
}

/// Fallback for headless builds or hosts without a speech engine: every
/// utterance completes immediately, keeping the state sequencing identical.
#[derive(Debug, Default)]
pub struct NullSynthesizer;

impl SpeechSynthesizer for NullSynthesizer {
    fn speak(&mut self, request: &SpeechRequest) -> Result<Receiver<SpeechOutcome>, SpeechError> {
        debug!(language = %request.language, "no speech backend, completing immediately");
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(SpeechOutcome::Done);
        Ok(rx)
    }

    fn stop(&mut self) -> Result<(), SpeechError> {
        Ok(())
    }
}

#[cfg(any(test, feature = "system-tts"))]
pub(crate) use slot::UtteranceSlot;

#[cfg(any(test, feature = "system-tts"))]
mod slot {
    use std::sync::mpsc::Sender;
    use std::sync::Mutex;

    use super::SpeechOutcome;

    /// Pairs the live utterance's id with its completion sender. Engine
    /// callbacks for an interrupted or already-finished utterance arrive
    /// with a stale id and must not touch the current channel.
    pub(crate) struct UtteranceSlot<K> {
        inner: Mutex<Option<(K, Sender<SpeechOutcome>)>>,
    }

    impl<K: PartialEq> UtteranceSlot<K> {
        pub fn new() -> Self {
            UtteranceSlot {
                inner: Mutex::new(None),
            }
        }

        /// Installs the sender for a freshly started utterance, dropping
        /// whatever was armed before.
        pub fn arm(&self, id: K, tx: Sender<SpeechOutcome>) {
            if let Ok(mut slot) = self.inner.lock() {
                *slot = Some((id, tx));
            }
        }

        /// Drops the armed sender without sending.
        pub fn disarm(&self) {
            if let Ok(mut slot) = self.inner.lock() {
                slot.take();
            }
        }

        /// Sends `outcome`, but only when `id` is the armed utterance.
        pub fn resolve(&self, id: &K, outcome: SpeechOutcome) {
            if let Ok(mut slot) = self.inner.lock() {
                if matches!(&*slot, Some((armed, _)) if armed == id) {
                    if let Some((_, tx)) = slot.take() {
                        let _ = tx.send(outcome);
                    }
                }
            }
        }

        /// Drops the sender without sending, but only when `id` is the
        /// armed utterance (explicit stop).
        pub fn cancel(&self, id: &K) {
            if let Ok(mut slot) = self.inner.lock() {
                if matches!(&*slot, Some((armed, _)) if armed == id) {
                    slot.take();
                }
            }
        }
    }
}

#[cfg(feature = "system-tts")]
pub use system::SystemSynthesizer;

#[cfg(feature = "system-tts")]
mod system {
    use std::sync::mpsc::{self, Receiver};
    use std::sync::Arc;

    use tracing::debug;
    use tts::{Tts, UtteranceId};

    use super::{SpeechError, SpeechOutcome, SpeechRequest, SpeechSynthesizer, UtteranceSlot};

    /// Platform speech engines via the `tts` crate (AVFoundation, SAPI,
    /// Speech Dispatcher). One utterance at a time; a new `speak`
    /// interrupts the previous one.
    pub struct SystemSynthesizer {
        tts: Tts,
        outcome: Arc<UtteranceSlot<UtteranceId>>,
    }

    impl SystemSynthesizer {
        pub fn new() -> Result<Self, SpeechError> {
            let mut tts = Tts::default().map_err(backend)?;
            let outcome = Arc::new(UtteranceSlot::new());

            if tts.supported_features().utterance_callbacks {
                let on_end = Arc::clone(&outcome);
                tts.on_utterance_end(Some(Box::new(move |id| {
                    on_end.resolve(&id, SpeechOutcome::Done);
                })))
                .map_err(backend)?;

                // The interrupted utterance's stop callback carries its own
                // id, so it can never drop the sender of the utterance that
                // replaced it.
                let on_stop = Arc::clone(&outcome);
                tts.on_utterance_stop(Some(Box::new(move |id| {
                    on_stop.cancel(&id);
                })))
                .map_err(backend)?;
            }

            Ok(SystemSynthesizer { tts, outcome })
        }

        fn apply_voice(&mut self, language: &str) {
            if !self.tts.supported_features().voice {
                return;
            }
            let voices = match self.tts.voices() {
                Ok(v) => v,
                Err(error) => {
                    debug!(%error, "could not enumerate voices");
                    return;
                }
            };

            let primary = language.split('-').next().unwrap_or(language).to_ascii_lowercase();
            let pick = voices
                .iter()
                .find(|v| v.language().to_string().eq_ignore_ascii_case(language))
                .or_else(|| {
                    voices
                        .iter()
                        .find(|v| v.language().to_string().to_ascii_lowercase().starts_with(&primary))
                });

            match pick {
                Some(voice) => {
                    if let Err(error) = self.tts.set_voice(voice) {
                        debug!(%error, "could not set voice");
                    }
                }
                None => debug!(language, "no installed voice for locale"),
            }
        }

        fn apply_prosody(&mut self, request: &SpeechRequest) {
            let features = self.tts.supported_features();
            if features.rate {
                let rate = scaled(
                    request.rate,
                    self.tts.min_rate(),
                    self.tts.normal_rate(),
                    self.tts.max_rate(),
                );
                if let Err(error) = self.tts.set_rate(rate) {
                    debug!(%error, "could not set rate");
                }
            }
            if features.pitch {
                let pitch = scaled(
                    request.pitch,
                    self.tts.min_pitch(),
                    self.tts.normal_pitch(),
                    self.tts.max_pitch(),
                );
                if let Err(error) = self.tts.set_pitch(pitch) {
                    debug!(%error, "could not set pitch");
                }
            }
        }
    }

    impl SpeechSynthesizer for SystemSynthesizer {
        fn speak(&mut self, request: &SpeechRequest) -> Result<Receiver<SpeechOutcome>, SpeechError> {
            self.apply_voice(&request.language);
            self.apply_prosody(request);

            let callbacks = self.tts.supported_features().utterance_callbacks;
            let (tx, rx) = mpsc::channel();

            // Interrupting the previous utterance must not let its late
            // callbacks find the new sender; empty the slot first.
            self.outcome.disarm();

            match self.tts.speak(request.text.clone(), true) {
                Ok(Some(id)) if callbacks => self.outcome.arm(id, tx),
                Ok(_) => {
                    // No utterance id or no callbacks: the sender drops
                    // right here and the controller reads the disconnect
                    // as completion.
                }
                Err(error) => return Err(backend(error)),
            }

            Ok(rx)
        }

        fn stop(&mut self) -> Result<(), SpeechError> {
            self.outcome.disarm();
            if !self.tts.supported_features().stop {
                return Ok(());
            }
            self.tts.stop().map(|_| ()).map_err(backend)
        }
    }

    fn backend(error: tts::Error) -> SpeechError {
        SpeechError::Backend(error.to_string())
    }

    /// Maps a relative factor (1.0 = normal) into the backend's own
    /// min/normal/max range.
    fn scaled(factor: f32, min: f32, normal: f32, max: f32) -> f32 {
        let value = if factor < 1.0 {
            normal - (normal - min) * (1.0 - factor)
        } else {
            normal + (max - normal) * (factor - 1.0)
        };
        value.clamp(min.min(max), max.max(min))
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::TryRecvError;

    #[test]
    fn null_synthesizer_completes_immediately() {
        let mut synth = NullSynthesizer;
        let rx = synth
            .speak(&SpeechRequest {
                text: "Hello".to_string(),
                language: "en-US".to_string(),
                pitch: NEUTRAL_PITCH,
                rate: SLOWED_RATE,
            })
            .expect("speak");
        assert_eq!(rx.try_recv(), Ok(SpeechOutcome::Done));
    }

    #[test]
    fn slot_resolves_only_the_armed_utterance() {
        let slot = UtteranceSlot::new();
        let (tx, rx) = mpsc::channel();
        slot.arm(7u32, tx);

        slot.resolve(&3, SpeechOutcome::Done);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

        slot.resolve(&7, SpeechOutcome::Done);
        assert_eq!(rx.try_recv(), Ok(SpeechOutcome::Done));
    }

    #[test]
    fn stale_stop_does_not_clobber_a_newly_armed_sender() {
        // Interrupt sequence: utterance 1 is replaced by utterance 2, then
        // utterance 1's stop callback arrives late.
        let slot = UtteranceSlot::new();
        let (tx_a, rx_a) = mpsc::channel();
        slot.arm(1u32, tx_a);

        let (tx_b, rx_b) = mpsc::channel();
        slot.arm(2u32, tx_b);
        assert_eq!(rx_a.try_recv(), Err(TryRecvError::Disconnected));

        slot.cancel(&1);
        assert_eq!(rx_b.try_recv(), Err(TryRecvError::Empty));

        slot.resolve(&2, SpeechOutcome::Done);
        assert_eq!(rx_b.try_recv(), Ok(SpeechOutcome::Done));
    }

    #[test]
    fn stale_end_does_not_resolve_the_next_utterance() {
        let slot = UtteranceSlot::new();
        let (tx_a, _rx_a) = mpsc::channel();
        slot.arm(1u32, tx_a);

        let (tx_b, rx_b) = mpsc::channel();
        slot.arm(2u32, tx_b);

        slot.resolve(&1, SpeechOutcome::Done);
        assert_eq!(rx_b.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn disarm_drops_the_sender_without_sending() {
        let slot = UtteranceSlot::new();
        let (tx, rx) = mpsc::channel();
        slot.arm(1u32, tx);

        slot.disarm();
        assert_eq!(rx.try_recv(), Err(TryRecvError::Disconnected));
    }
}
