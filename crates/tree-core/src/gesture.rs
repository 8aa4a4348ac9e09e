//! Hand-landmark classification.
//!
//! Input is one frame from an external 21-point hand tracker in normalised
//! image coordinates (x right, y down), or nothing. Output is a yaw angle and
//! the number of extended non-thumb fingers.

use crate::constants::{HAND_YAW_SPAN, OPEN_HAND_MIN_FINGERS};
use crate::error::{Result, TreeError};
use std::f32::consts::PI;

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_PIP: usize = 6;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_TIP: usize = 12;
pub const RING_PIP: usize = 14;
pub const RING_TIP: usize = 16;
pub const PINKY_PIP: usize = 18;
pub const PINKY_TIP: usize = 20;

/// (tip, second joint) for index, middle, ring and pinky.
pub const TRACKED_FINGERS: [(usize, usize); 4] = [
    (INDEX_TIP, INDEX_PIP),
    (MIDDLE_TIP, MIDDLE_PIP),
    (RING_TIP, RING_PIP),
    (PINKY_TIP, PINKY_PIP),
];

#[derive(Clone, Copy, Debug, Default, PartialEq)]
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

/// One detected hand.
#[derive(Clone, Debug, PartialEq)]
pub struct HandLandmarks {
    points: [Landmark; LANDMARK_COUNT],
}

impl HandLandmarks {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Parse a flat `x,y` (42 values) or `x,y,z` (63 values) array, as handed
    /// over by a JS tracker callback.
    pub fn from_flat(values: &[f32]) -> Result<Self> {
        let stride = match values.len() {
            n if n == LANDMARK_COUNT * 3 => 3,
            n if n == LANDMARK_COUNT * 2 => 2,
            actual => {
                return Err(TreeError::InvalidLandmarks {
                    expected: LANDMARK_COUNT * 3,
                    actual,
                })
            }
        };
        let mut points = [Landmark::default(); LANDMARK_COUNT];
        for (i, (p, chunk)) in points.iter_mut().zip(values.chunks_exact(stride)).enumerate() {
            if chunk.iter().any(|v| !v.is_finite()) {
                return Err(TreeError::NonFiniteLandmark(i));
            }
            p.x = chunk[0];
            p.y = chunk[1];
            p.z = if stride == 3 { chunk[2] } else { 0.0 };
        }
        Ok(Self { points })
    }

    #[inline]
    pub fn point(&self, index: usize) -> Landmark {
        self.points[index]
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    /// Fingers whose tip sits above (smaller y than) its second joint.
    pub fn open_count(&self) -> u8 {
        TRACKED_FINGERS
            .iter()
            .filter(|(tip, pip)| self.points[*tip].y < self.points[*pip].y)
            .count() as u8
    }

    /// Horizontal palm position mapped to yaw in [-1.5π, 1.5π].
    pub fn rotation_angle(&self) -> f32 {
        (self.points[MIDDLE_MCP].x - 0.5) * PI * HAND_YAW_SPAN
    }
}

/// Discrete request derived from one reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureCommand {
    Explode,
    Contract,
    RotateOnly,
}

/// Classification of one tracker frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureReading {
    NoHand,
    Hand { rotation_angle: f32, open_count: u8 },
}

impl GestureReading {
    pub fn has_hand(&self) -> bool {
        matches!(self, GestureReading::Hand { .. })
    }

    /// `None` without a hand; otherwise open ≥ 3 explodes, a fist contracts,
    /// anything in between only rotates.
    pub fn command(&self) -> Option<GestureCommand> {
        match *self {
            GestureReading::NoHand => None,
            GestureReading::Hand { open_count, .. } if open_count >= OPEN_HAND_MIN_FINGERS => {
                Some(GestureCommand::Explode)
            }
            GestureReading::Hand { open_count: 0, .. } => Some(GestureCommand::Contract),
            GestureReading::Hand { .. } => Some(GestureCommand::RotateOnly),
        }
    }
}

/// Classify a single sample. Stateless: the previous frame never matters.
pub fn classify(sample: Option<&HandLandmarks>) -> GestureReading {
    match sample {
        None => GestureReading::NoHand,
        Some(hand) => GestureReading::Hand {
            rotation_angle: hand.rotation_angle(),
            open_count: hand.open_count(),
        },
    }
}

/// Latest-sample mailbox between an asynchronous tracker and the frame loop.
/// Offering overwrites any sample not yet taken; there is no queue.
#[derive(Clone, Debug, Default)]
pub struct SampleSlot {
    pending: Option<Option<HandLandmarks>>,
}

impl SampleSlot {
    /// Store a frame (`None` = tracker saw no hand), replacing any unread one.
    pub fn offer(&mut self, sample: Option<HandLandmarks>) {
        self.pending = Some(sample);
    }

    /// Take the unread frame, if one arrived since the last take.
    pub fn take(&mut self) -> Option<Option<HandLandmarks>> {
        self.pending.take()
    }
}
