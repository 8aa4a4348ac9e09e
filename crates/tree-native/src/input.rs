//! Desktop stand-in for a camera hand tracker.
//!
//! While the left mouse button is held a hand is "seen" at the cursor's
//! horizontal position, with the number of extended fingers chosen on the
//! number keys (4 by default). Releasing the button means no hand.

use tree_core::{
    HandLandmarks, Landmark, LANDMARK_COUNT, MIDDLE_MCP, TRACKED_FINGERS, WRIST,
};

const PALM_Y: f32 = 0.6;
const JOINT_Y: f32 = 0.5;
const TIP_UP_Y: f32 = 0.3;
const TIP_DOWN_Y: f32 = 0.7;

#[derive(Clone, Debug)]
pub struct SyntheticHand {
    /// Cursor position across the window, 0 = left edge.
    palm_x: f32,
    extended: u8,
    visible: bool,
}

impl Default for SyntheticHand {
    fn default() -> Self {
        Self {
            palm_x: 0.5,
            extended: TRACKED_FINGERS.len() as u8,
            visible: false,
        }
    }
}

impl SyntheticHand {
    pub fn set_cursor(&mut self, x_px: f64, width_px: u32) {
        if width_px > 0 {
            self.palm_x = (x_px / width_px as f64).clamp(0.0, 1.0) as f32;
        }
    }

    pub fn set_extended(&mut self, fingers: u8) {
        self.extended = fingers.min(TRACKED_FINGERS.len() as u8);
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// The frame a tracker would report right now.
    pub fn sample(&self) -> Option<HandLandmarks> {
        self.visible
            .then(|| synthetic_landmarks(self.palm_x, self.extended))
    }
}

/// A flat hand at `palm_x` with the first `extended` tracked fingers raised.
pub fn synthetic_landmarks(palm_x: f32, extended: u8) -> HandLandmarks {
    let mut points = [Landmark::new(palm_x, PALM_Y, 0.0); LANDMARK_COUNT];
    points[WRIST].y = PALM_Y + 0.2;
    points[MIDDLE_MCP].x = palm_x;
    for (k, &(tip, pip)) in TRACKED_FINGERS.iter().enumerate() {
        points[pip].y = JOINT_Y;
        points[tip].y = if (k as u8) < extended {
            TIP_UP_Y
        } else {
            TIP_DOWN_Y
        };
    }
    HandLandmarks::new(points)
}
