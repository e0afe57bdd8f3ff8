pub mod capture;
pub mod classifier;
pub mod landmarks;

pub use capture::GestureInput;
pub use classifier::{classify_gesture, GestureLabel, GestureObservation, GestureStabilizer};
pub use landmarks::{classify_fingers, posed_hand, FingerVector, Landmark, LANDMARK_COUNT};
