pub mod controller;
pub mod intents;
pub mod lifecycle;
pub mod questions;

pub use controller::{QuizController, QuizEvent, QuizSnapshot};
pub use intents::{gesture_intent, voice_intent, GESTURE_CONFIDENCE_THRESHOLD};
pub use lifecycle::{Effect, Intent, LifecycleTiming, QuizState, Tone};
pub use questions::{option_letter, question_bank, Question};
