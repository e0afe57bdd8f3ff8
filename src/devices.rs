//! Contracts with the collaborators that live outside the core: camera,
//! hand-landmark detector, speech recognizer, and the three feedback outputs.

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::gesture::Landmark;

/// One camera frame handed to the detector. Opaque to the core.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
}

impl Frame {
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            data: Arc::from(Vec::new()),
        }
    }
}

pub trait CameraSource: Send {
    /// Whether a camera API exists at all on this host.
    fn is_supported(&self) -> bool {
        true
    }
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self);
    /// Latest frame, or `None` when nothing new is available yet.
    fn grab_frame(&mut self) -> Result<Option<Frame>>;
}

pub trait HandDetector: Send {
    /// Landmarks of at most one hand, or `None` when no hand is visible.
    fn detect(&mut self, frame: &Frame) -> Result<Option<Vec<Landmark>>>;
}

/// Speech-to-text engine. Results come back through
/// `QuizController::on_transcript` / `on_voice_error` / `on_voice_ended`.
pub trait SpeechRecognizer: Send {
    fn is_supported(&self) -> bool {
        true
    }
    fn start(&mut self, language: &str) -> Result<()>;
    fn stop(&mut self);
    fn abort(&mut self);
}

/// Text-to-speech. A new utterance cancels the previous one.
pub trait SpeechOutput: Send + Sync {
    fn speak(&self, text: &str);
}

pub trait TonePlayer: Send + Sync {
    fn play_success(&self);
    fn play_error(&self);
}

pub trait Haptics: Send + Sync {
    /// Alternating on/off durations in milliseconds.
    fn vibrate(&self, pattern: &[u64]);
}

/// User-visible state of the voice or gesture modality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status", content = "message")]
pub enum ModalityStatus {
    /// The host lacks the API; the toggle is hidden.
    Unsupported,
    Off,
    Active,
    /// Access denied, device failure or runtime error. Retry by re-enabling.
    Error(String),
}

impl ModalityStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, ModalityStatus::Active)
    }
}

impl Default for ModalityStatus {
    fn default() -> Self {
        ModalityStatus::Off
    }
}
