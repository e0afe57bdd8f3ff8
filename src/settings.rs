use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::quiz::intents::GESTURE_CONFIDENCE_THRESHOLD;
use crate::quiz::lifecycle::LifecycleTiming;

/// Per-user feedback preferences, persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub sound_enabled: bool,
    pub speech_enabled: bool,
    pub haptics_enabled: bool,
    /// Forwarded to the UI in every snapshot; the core does not animate.
    pub reduced_motion: bool,
    /// Language hint for the speech recognizer.
    pub language: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            speech_enabled: true,
            haptics_enabled: true,
            reduced_motion: false,
            language: "es-ES".into(),
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<Preferences>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("ignoring unreadable settings {}: {err}", path.display());
                Preferences::default()
            })
        } else {
            Preferences::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    /// Path from `MULTITRIVIA_SETTINGS`, else `multitrivia-settings.json`.
    pub fn default_path() -> PathBuf {
        std::env::var_os("MULTITRIVIA_SETTINGS")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("multitrivia-settings.json"))
    }

    fn read(&self) -> RwLockReadGuard<'_, Preferences> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Preferences> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn preferences(&self) -> Preferences {
        self.read().clone()
    }

    pub fn update(&self, preferences: Preferences) -> Result<()> {
        let mut guard = self.write();
        *guard = preferences;
        self.persist(&guard)
    }

    fn persist(&self, data: &Preferences) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

/// Tunables that are not user preferences.
#[derive(Debug, Clone)]
pub struct QuizConfig {
    pub timing: LifecycleTiming,
    /// Gesture observations must be strictly above this to count.
    pub gesture_confidence_threshold: f32,
    /// How often the camera is polled and the input slots are read.
    pub frame_interval: Duration,
    /// Consecutive identical observations required before acting. 1 = none.
    pub stable_frames: u32,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            timing: LifecycleTiming::default(),
            gesture_confidence_threshold: GESTURE_CONFIDENCE_THRESHOLD,
            frame_interval: Duration::from_millis(33),
            stable_frames: 1,
        }
    }
}

impl QuizConfig {
    /// Defaults with `MULTITRIVIA_STABLE_FRAMES` and `MULTITRIVIA_DEBUG` applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(frames) = std::env::var("MULTITRIVIA_STABLE_FRAMES")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
        {
            config.stable_frames = frames.max(1);
        }

        // Slow the loop down so per-frame logs stay readable.
        let debug_mode = std::env::var("MULTITRIVIA_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if debug_mode {
            config.frame_interval = Duration::from_millis(250);
        }

        config
    }
}
