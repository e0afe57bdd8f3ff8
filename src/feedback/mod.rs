pub mod tones;

use std::sync::{Arc, RwLock};

use crate::devices::{Haptics, SpeechOutput, TonePlayer};
use crate::quiz::lifecycle::Tone;
use crate::settings::Preferences;

pub use tones::ToneEngineHandle;

/// Fans committed answers, prompts and announcements out to the speech, tone
/// and haptic collaborators, skipping the channels the user switched off.
#[derive(Clone)]
pub struct FeedbackHub {
    speech: Arc<dyn SpeechOutput>,
    tones: Arc<dyn TonePlayer>,
    haptics: Arc<dyn Haptics>,
    preferences: Arc<RwLock<Preferences>>,
}

impl FeedbackHub {
    pub fn new(
        speech: Arc<dyn SpeechOutput>,
        tones: Arc<dyn TonePlayer>,
        haptics: Arc<dyn Haptics>,
        preferences: Preferences,
    ) -> Self {
        Self {
            speech,
            tones,
            haptics,
            preferences: Arc::new(RwLock::new(preferences)),
        }
    }

    pub fn preferences(&self) -> Preferences {
        match self.preferences.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_preferences(&self, preferences: Preferences) {
        match self.preferences.write() {
            Ok(mut guard) => *guard = preferences,
            Err(poisoned) => *poisoned.into_inner() = preferences,
        }
    }

    pub fn speak(&self, text: &str) {
        if self.preferences().speech_enabled {
            self.speech.speak(text);
        }
    }

    pub fn tone(&self, tone: Tone) {
        if !self.preferences().sound_enabled {
            return;
        }
        match tone {
            Tone::Success => self.tones.play_success(),
            Tone::Error => self.tones.play_error(),
        }
    }

    pub fn vibrate(&self, pattern: &[u64]) {
        if self.preferences().haptics_enabled {
            self.haptics.vibrate(pattern);
        }
    }
}

/// Haptics for hosts without an actuator: the pattern only reaches the log.
pub struct LoggedHaptics;

impl Haptics for LoggedHaptics {
    fn vibrate(&self, pattern: &[u64]) {
        log::debug!("vibrate {:?}", pattern);
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;
    use std::sync::Mutex;

    /// Records every call made to the three feedback collaborators.
    #[derive(Default)]
    pub struct Recorder {
        pub spoken: Mutex<Vec<String>>,
        pub tones: Mutex<Vec<Tone>>,
        pub vibrations: Mutex<Vec<Vec<u64>>>,
    }

    impl SpeechOutput for Recorder {
        fn speak(&self, text: &str) {
            self.spoken.lock().unwrap().push(text.to_string());
        }
    }

    impl TonePlayer for Recorder {
        fn play_success(&self) {
            self.tones.lock().unwrap().push(Tone::Success);
        }
        fn play_error(&self) {
            self.tones.lock().unwrap().push(Tone::Error);
        }
    }

    impl Haptics for Recorder {
        fn vibrate(&self, pattern: &[u64]) {
            self.vibrations.lock().unwrap().push(pattern.to_vec());
        }
    }

    pub fn hub(recorder: &Arc<Recorder>, preferences: Preferences) -> FeedbackHub {
        FeedbackHub::new(
            recorder.clone(),
            recorder.clone(),
            recorder.clone(),
            preferences,
        )
    }
}
