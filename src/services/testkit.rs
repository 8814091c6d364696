//! Scripted collaborators for controller and protocol tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::mpsc::{self, Sender};

use crate::services::speech::{
    SpeechError, SpeechOutcome, SpeechRequest, SpeechSynthesizer,
};
use crate::services::translate::{TranslateError, TranslationService};

/// (text, source, target) triples the translator was called with.
pub type CallLog = Rc<RefCell<Vec<(String, String, String)>>>;

/// Returns pre-scripted results in order and records every call.
pub struct ScriptedTranslator {
    script: RefCell<VecDeque<Result<String, TranslateError>>>,
    calls: CallLog,
}

impl ScriptedTranslator {
    pub fn script(results: Vec<Result<String, TranslateError>>) -> Self {
        ScriptedTranslator {
            script: RefCell::new(results.into()),
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// One successful translation.
    pub fn ok(text: &str) -> Self {
        Self::script(vec![Ok(text.to_string())])
    }

    /// Expects never to be called.
    pub fn empty() -> Self {
        Self::script(Vec::new())
    }

    pub fn calls(&self) -> CallLog {
        Rc::clone(&self.calls)
    }
}

impl TranslationService for ScriptedTranslator {
    fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, TranslateError> {
        self.calls
            .borrow_mut()
            .push((text.to_string(), source.to_string(), target.to_string()));
        self.script
            .borrow_mut()
            .pop_front()
            .expect("translate called with an exhausted script")
    }
}

/// Shared views into a [`RecordingSynthesizer`] owned by a controller.
pub struct SynthHandles {
    pub requests: Rc<RefCell<Vec<SpeechRequest>>>,
    pub stops: Rc<RefCell<usize>>,
    sender: Rc<RefCell<Option<Sender<SpeechOutcome>>>>,
}

impl SynthHandles {
    /// Resolves the pending utterance with the given outcome.
    pub fn finish(&self, outcome: SpeechOutcome) {
        let tx = self
            .sender
            .borrow_mut()
            .take()
            .expect("no utterance in progress");
        tx.send(outcome).expect("controller dropped the receiver");
    }

    /// Drops the sender without resolving, the "neither callback fires"
    /// case.
    pub fn drop_sender(&self) {
        self.sender.borrow_mut().take();
    }
}

/// Records speech requests and lets the test drive the completion channel.
pub struct RecordingSynthesizer {
    requests: Rc<RefCell<Vec<SpeechRequest>>>,
    stops: Rc<RefCell<usize>>,
    sender: Rc<RefCell<Option<Sender<SpeechOutcome>>>>,
    fail_speak: bool,
}

impl RecordingSynthesizer {
    pub fn new() -> (Self, SynthHandles) {
        Self::build(false)
    }

    /// Every `speak` fails synchronously, as when no engine is installed.
    pub fn failing() -> (Self, SynthHandles) {
        Self::build(true)
    }

    fn build(fail_speak: bool) -> (Self, SynthHandles) {
        let requests = Rc::new(RefCell::new(Vec::new()));
        let stops = Rc::new(RefCell::new(0));
        let sender = Rc::new(RefCell::new(None));
        let handles = SynthHandles {
            requests: Rc::clone(&requests),
            stops: Rc::clone(&stops),
            sender: Rc::clone(&sender),
        };
        (
            RecordingSynthesizer {
                requests,
                stops,
                sender,
                fail_speak,
            },
            handles,
        )
    }
}

impl SpeechSynthesizer for RecordingSynthesizer {
    fn speak(
        &mut self,
        request: &SpeechRequest,
    ) -> Result<std::sync::mpsc::Receiver<SpeechOutcome>, SpeechError> {
        self.requests.borrow_mut().push(request.clone());
        if self.fail_speak {
            return Err(SpeechError::Backend("engine offline".to_string()));
        }
        let (tx, rx) = mpsc::channel();
        *self.sender.borrow_mut() = Some(tx);
        Ok(rx)
    }

    fn stop(&mut self) -> Result<(), SpeechError> {
        *self.stops.borrow_mut() += 1;
        self.sender.borrow_mut().take();
        Ok(())
    }
}
