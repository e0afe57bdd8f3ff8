use crate::arbiter::{AnswerArbiter, Modality};
use crate::gesture::GestureObservation;
use crate::voice::{VoiceCommand, VoiceParseResult};

use super::lifecycle::Intent;

/// Observations at or below this confidence are never acted on.
pub const GESTURE_CONFIDENCE_THRESHOLD: f32 = 0.8;

/// Map one gesture observation onto the arbiter.
///
/// While a confirmation is showing, a closed fist confirms and an open hand
/// cancels. While idle, one to four fingers propose options A to D. Anything
/// else is noise.
pub fn gesture_intent(
    observation: &GestureObservation,
    arbiter: &AnswerArbiter,
    option_count: usize,
    threshold: f32,
) -> Option<Intent> {
    if observation.confidence <= threshold {
        return None;
    }
    let count = observation.finger_count?;

    if arbiter.pending().is_some() {
        return match count {
            0 => Some(Intent::Confirm {
                via: Modality::Gesture,
            }),
            5 => Some(Intent::Cancel {
                via: Modality::Gesture,
            }),
            _ => None,
        };
    }

    if !arbiter.is_idle() {
        return None;
    }
    match count {
        1..=4 => {
            let option_index = usize::from(count - 1);
            (option_index < option_count).then_some(Intent::Propose {
                modality: Modality::Gesture,
                option_index,
            })
        }
        _ => None,
    }
}

/// Map a parsed transcript onto the arbiter.
///
/// `repeat` is always honoured. `next` only once the question is answered;
/// every other command only before. Medium-confidence option matches are
/// accepted like exact ones.
pub fn voice_intent(result: &VoiceParseResult, arbiter: &AnswerArbiter) -> Option<Intent> {
    if !result.is_actionable() {
        return None;
    }
    let answered = arbiter.is_committed();

    match result.command? {
        VoiceCommand::Repeat => Some(Intent::Repeat),
        VoiceCommand::Next => answered.then_some(Intent::Next),
        _ if answered => None,
        VoiceCommand::SelectOption(option_index) => Some(Intent::Propose {
            modality: Modality::Voice,
            option_index,
        }),
        VoiceCommand::Confirm => Some(Intent::Confirm {
            via: Modality::Voice,
        }),
        VoiceCommand::Cancel => Some(Intent::Cancel {
            via: Modality::Voice,
        }),
    }
}
