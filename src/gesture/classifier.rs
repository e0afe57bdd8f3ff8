use serde::{Deserialize, Serialize};

use super::landmarks::FingerVector;

/// Reported whenever a hand is present. Reflects detection presence only; the
/// detector gives no graded score to pass through.
pub const DETECTION_CONFIDENCE: f32 = 0.9;

/// Per-frame result of the gesture classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureObservation {
    pub finger_count: Option<u8>,
    pub confidence: f32,
}

impl GestureObservation {
    pub const NO_HAND: GestureObservation = GestureObservation {
        finger_count: None,
        confidence: 0.0,
    };

    pub fn label(&self) -> Option<GestureLabel> {
        self.finger_count.map(GestureLabel::from_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GestureLabel {
    ClosedFist,
    Fingers(u8),
    OpenHand,
}

impl GestureLabel {
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => GestureLabel::ClosedFist,
            n if n >= 5 => GestureLabel::OpenHand,
            n => GestureLabel::Fingers(n),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GestureLabel::ClosedFist => "closed-fist",
            GestureLabel::Fingers(1) => "one-finger",
            GestureLabel::Fingers(2) => "two-fingers",
            GestureLabel::Fingers(3) => "three-fingers",
            GestureLabel::Fingers(_) => "four-fingers",
            GestureLabel::OpenHand => "open-hand",
        }
    }
}

/// Turn this frame's finger vector (or its absence) into an observation.
/// Each call fully replaces the previous frame's result.
pub fn classify_gesture(fingers: Option<&FingerVector>) -> GestureObservation {
    match fingers {
        Some(fingers) => GestureObservation {
            finger_count: Some(fingers.extended_count()),
            confidence: DETECTION_CONFIDENCE,
        },
        None => GestureObservation::NO_HAND,
    }
}

/// Optional layer that only lets an observation through once the same finger
/// count was seen on `required` consecutive frames.
///
/// With `required == 1` every observation passes unchanged.
#[derive(Debug, Clone)]
pub struct GestureStabilizer {
    required: u32,
    last: Option<u8>,
    streak: u32,
}

impl GestureStabilizer {
    pub fn new(required: u32) -> Self {
        Self {
            required: required.max(1),
            last: None,
            streak: 0,
        }
    }

    pub fn observe(&mut self, observation: GestureObservation) -> Option<GestureObservation> {
        if observation.finger_count == self.last {
            self.streak = self.streak.saturating_add(1);
        } else {
            self.last = observation.finger_count;
            self.streak = 1;
        }

        if self.streak >= self.required {
            Some(observation)
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
        self.streak = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_extended_fingers_at_fixed_confidence() {
        let obs = classify_gesture(Some(&FingerVector([false, true, true, false, false])));
        assert_eq!(obs.finger_count, Some(2));
        assert_eq!(obs.confidence, 0.9);
        assert_eq!(obs.label(), Some(GestureLabel::Fingers(2)));
    }

    #[test]
    fn no_hand_has_zero_confidence() {
        let obs = classify_gesture(None);
        assert_eq!(obs, GestureObservation::NO_HAND);
        assert_eq!(obs.label(), None);
    }

    #[test]
    fn labels_cover_fist_and_open_hand() {
        assert_eq!(
            classify_gesture(Some(&FingerVector::CLOSED)).label(),
            Some(GestureLabel::ClosedFist)
        );
        assert_eq!(GestureLabel::from_count(5).as_str(), "open-hand");
    }

    #[test]
    fn stabilizer_of_one_passes_everything() {
        let mut stabilizer = GestureStabilizer::new(1);
        let two = classify_gesture(Some(&FingerVector::with_count(2)));
        let fist = classify_gesture(Some(&FingerVector::CLOSED));
        assert_eq!(stabilizer.observe(two), Some(two));
        assert_eq!(stabilizer.observe(fist), Some(fist));
    }

    #[test]
    fn stabilizer_waits_for_a_streak() {
        let mut stabilizer = GestureStabilizer::new(3);
        let two = classify_gesture(Some(&FingerVector::with_count(2)));
        let three = classify_gesture(Some(&FingerVector::with_count(3)));

        assert_eq!(stabilizer.observe(two), None);
        assert_eq!(stabilizer.observe(two), None);
        assert_eq!(stabilizer.observe(three), None);
        assert_eq!(stabilizer.observe(three), None);
        assert_eq!(stabilizer.observe(three), Some(three));

        stabilizer.reset();
        assert_eq!(stabilizer.observe(three), None);
    }
}
