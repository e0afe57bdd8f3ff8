use serde::{Deserialize, Serialize};

/// Landmarks per detected hand.
pub const LANDMARK_COUNT: usize = 21;

const WRIST: usize = 0;
const THUMB_IP: usize = 3;
const THUMB_TIP: usize = 4;
const MIDDLE_MCP: usize = 9;

/// (tip, joint two landmarks proximal) for index, middle, ring, pinky.
const FINGER_TIPS: [(usize, usize); 4] = [(8, 6), (12, 10), (16, 14), (20, 18)];

/// A normalized image-space point. `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Extended (`true`) or flexed state per finger, thumb first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FingerVector(pub [bool; 5]);

impl FingerVector {
    pub const CLOSED: FingerVector = FingerVector([false; 5]);
    pub const OPEN: FingerVector = FingerVector([true; 5]);

    pub fn extended_count(&self) -> u8 {
        self.0.iter().filter(|up| **up).count() as u8
    }

    /// Thumb-first vector with the first `count` fingers extended.
    pub fn with_count(count: u8) -> Self {
        let mut fingers = [false; 5];
        for finger in fingers.iter_mut().take(count.min(5) as usize) {
            *finger = true;
        }
        FingerVector(fingers)
    }
}

/// Classify each finger of one hand. Every frame stands alone; no smoothing.
///
/// The thumb extends sideways, so it is up when its tip lies further from the
/// palm centerline (midpoint of wrist and middle knuckle) than its IP joint.
/// The other fingers are up when the tip sits above the PIP joint.
pub fn classify_fingers(points: &[Landmark]) -> FingerVector {
    if points.len() < LANDMARK_COUNT {
        return FingerVector::CLOSED;
    }

    let center_x = (points[WRIST].x + points[MIDDLE_MCP].x) / 2.0;
    let thumb_up =
        (points[THUMB_TIP].x - center_x).abs() > (points[THUMB_IP].x - center_x).abs();

    let mut fingers = [thumb_up, false, false, false, false];
    for (slot, (tip, joint)) in fingers[1..].iter_mut().zip(FINGER_TIPS) {
        *slot = points[tip].y < points[joint].y;
    }
    FingerVector(fingers)
}

/// A plausible upright hand with the given fingers extended.
///
/// Stands in for the detector in the console host and in tests.
pub fn posed_hand(fingers: FingerVector) -> Vec<Landmark> {
    let mut points = vec![Landmark::default(); LANDMARK_COUNT];
    points[WRIST] = Landmark::new(0.5, 0.9, 0.0);

    points[1] = Landmark::new(0.42, 0.8, 0.0);
    points[2] = Landmark::new(0.38, 0.72, 0.0);
    points[THUMB_IP] = Landmark::new(0.35, 0.65, 0.0);
    points[THUMB_TIP] = if fingers.0[0] {
        Landmark::new(0.28, 0.6, 0.0)
    } else {
        Landmark::new(0.45, 0.62, 0.0)
    };

    let knuckle_x = [0.44, 0.5, 0.56, 0.62];
    for (finger, x) in knuckle_x.into_iter().enumerate() {
        let mcp = 5 + finger * 4;
        points[mcp] = Landmark::new(x, 0.6, 0.0);
        points[mcp + 1] = Landmark::new(x, 0.5, 0.0);
        if fingers.0[finger + 1] {
            points[mcp + 2] = Landmark::new(x, 0.4, 0.0);
            points[mcp + 3] = Landmark::new(x, 0.3, 0.0);
        } else {
            points[mcp + 2] = Landmark::new(x, 0.55, 0.0);
            points[mcp + 3] = Landmark::new(x, 0.6, 0.0);
        }
    }
    points
}
