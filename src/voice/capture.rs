use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::devices::{ModalityStatus, SpeechRecognizer};
use crate::mailbox::LatestSlot;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// One recognizer result, interim or final.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptFragment {
    pub text: String,
    pub is_final: bool,
}

impl TranscriptFragment {
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

/// Owns the speech recognizer for the voice modality.
pub struct VoiceInput {
    recognizer: Box<dyn SpeechRecognizer>,
    status: watch::Sender<ModalityStatus>,
    language: String,
    transcript: LatestSlot<TranscriptFragment>,
}

impl VoiceInput {
    pub fn new(recognizer: Box<dyn SpeechRecognizer>, language: impl Into<String>) -> Self {
        let initial = if recognizer.is_supported() {
            ModalityStatus::Off
        } else {
            ModalityStatus::Unsupported
        };
        let (status, _) = watch::channel(initial);
        Self {
            recognizer,
            status,
            language: language.into(),
            transcript: LatestSlot::new(),
        }
    }

    pub fn status(&self) -> ModalityStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ModalityStatus> {
        self.status.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.status.borrow().is_active()
    }

    /// Start listening. A no-op when already listening.
    pub fn enable(&mut self) -> Result<()> {
        match self.status() {
            ModalityStatus::Unsupported => bail!("speech recognition is not supported"),
            ModalityStatus::Active => return Ok(()),
            _ => {}
        }

        self.transcript.clear();
        if let Err(err) = self
            .recognizer
            .start(&self.language)
            .context("failed to start speech recognizer")
        {
            self.status
                .send_replace(ModalityStatus::Error("No se pudo acceder al micrófono".into()));
            return Err(err);
        }

        self.status.send_replace(ModalityStatus::Active);
        log_info!("voice input enabled ({})", self.language);
        Ok(())
    }

    /// Abort the recognizer and drop any buffered transcript. Idempotent.
    pub fn disable(&mut self) {
        if self.is_active() {
            self.recognizer.abort();
            log_info!("voice input disabled");
        }
        self.transcript.clear();
        if self.status() != ModalityStatus::Unsupported {
            self.status.send_replace(ModalityStatus::Off);
        }
    }

    /// Recognizer result callback. Overwrites whatever was not read yet.
    pub fn on_fragment(&self, fragment: TranscriptFragment) {
        if !self.is_active() {
            return;
        }
        log_debug!("heard {:?} (final: {})", fragment.text, fragment.is_final);
        self.transcript.put(fragment);
    }

    /// Recognizer error callback. Leaves the modality off until re-enabled.
    pub fn on_error(&mut self, message: &str) {
        if !self.is_active() {
            return;
        }
        log_warn!("speech recognizer error: {message}");
        self.recognizer.abort();
        self.transcript.clear();
        self.status.send_replace(ModalityStatus::Error(format!(
            "Error de reconocimiento de voz: {message}"
        )));
    }

    /// The recognizer stopped on its own (silence timeout). Keep listening.
    pub fn on_ended(&mut self) {
        if !self.is_active() {
            return;
        }
        if let Err(err) = self.recognizer.start(&self.language) {
            log_warn!("speech recognizer restart failed: {err:?}");
            self.transcript.clear();
            self.status
                .send_replace(ModalityStatus::Error("No se pudo reanudar la escucha".into()));
        }
    }

    pub fn take_fragment(&self) -> Option<TranscriptFragment> {
        self.transcript.take()
    }

    pub fn discard_buffered(&self) {
        self.transcript.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Calls {
        starts: Vec<String>,
        aborts: usize,
        fail_start: bool,
    }

    struct FakeRecognizer {
        calls: Arc<Mutex<Calls>>,
        supported: bool,
    }

    impl SpeechRecognizer for FakeRecognizer {
        fn is_supported(&self) -> bool {
            self.supported
        }
        fn start(&mut self, language: &str) -> Result<()> {
            let mut calls = self.calls.lock().unwrap();
            if calls.fail_start {
                bail!("not-allowed");
            }
            calls.starts.push(language.to_string());
            Ok(())
        }
        fn stop(&mut self) {}
        fn abort(&mut self) {
            self.calls.lock().unwrap().aborts += 1;
        }
    }

    fn voice(calls: &Arc<Mutex<Calls>>) -> VoiceInput {
        let recognizer = FakeRecognizer {
            calls: calls.clone(),
            supported: true,
        };
        VoiceInput::new(Box::new(recognizer), "es-ES")
    }

    #[test]
    fn only_latest_fragment_is_kept() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let mut input = voice(&calls);
        input.enable().unwrap();

        input.on_fragment(TranscriptFragment::interim("opci"));
        input.on_fragment(TranscriptFragment::final_text("opción b"));
        assert_eq!(
            input.take_fragment(),
            Some(TranscriptFragment::final_text("opción b"))
        );
        assert_eq!(input.take_fragment(), None);
        assert_eq!(calls.lock().unwrap().starts, vec!["es-ES".to_string()]);
    }

    #[test]
    fn fragments_are_dropped_while_off() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let input = voice(&calls);
        input.on_fragment(TranscriptFragment::final_text("a"));
        assert_eq!(input.take_fragment(), None);
    }

    #[test]
    fn disable_aborts_once_and_clears() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let mut input = voice(&calls);
        input.enable().unwrap();
        input.enable().unwrap();
        input.on_fragment(TranscriptFragment::final_text("a"));

        input.disable();
        input.disable();
        assert_eq!(calls.lock().unwrap().aborts, 1);
        assert_eq!(calls.lock().unwrap().starts.len(), 1);
        assert_eq!(input.take_fragment(), None);
        assert_eq!(input.status(), ModalityStatus::Off);
    }

    #[test]
    fn start_failure_surfaces_error() {
        let calls = Arc::new(Mutex::new(Calls {
            fail_start: true,
            ..Calls::default()
        }));
        let mut input = voice(&calls);
        assert!(input.enable().is_err());
        assert!(matches!(input.status(), ModalityStatus::Error(_)));

        calls.lock().unwrap().fail_start = false;
        input.enable().unwrap();
        assert!(input.is_active());
    }

    #[test]
    fn recognizer_error_stops_listening() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let mut input = voice(&calls);
        input.enable().unwrap();
        input.on_fragment(TranscriptFragment::interim("seg"));

        input.on_error("network");
        assert!(matches!(input.status(), ModalityStatus::Error(_)));
        assert_eq!(input.take_fragment(), None);
        assert_eq!(calls.lock().unwrap().aborts, 1);
    }

    #[test]
    fn end_of_stream_restarts_while_enabled() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let mut input = voice(&calls);
        input.enable().unwrap();
        input.on_ended();
        assert_eq!(calls.lock().unwrap().starts.len(), 2);

        input.disable();
        input.on_ended();
        assert_eq!(calls.lock().unwrap().starts.len(), 2);
    }

    #[test]
    fn unsupported_recognizer_stays_unsupported() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let recognizer = FakeRecognizer {
            calls: calls.clone(),
            supported: false,
        };
        let mut input = VoiceInput::new(Box::new(recognizer), "es-ES");
        assert!(input.enable().is_err());
        input.disable();
        assert_eq!(input.status(), ModalityStatus::Unsupported);
    }
}
