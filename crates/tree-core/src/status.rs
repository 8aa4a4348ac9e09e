use crate::error::TreeError;
use crate::gesture::{GestureCommand, GestureReading};
use std::fmt;
use std::str::FromStr;

/// Discrete status emitted for an external text display. Output only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusSignal {
    IdleRotating,
    RotatingByHand,
    ExplodeRequested,
    ContractRequested,
    AwaitingCameraPermission,
    CameraReady,
    CameraUnavailable,
}

impl StatusSignal {
    /// Status for a classified sample: the request a hand makes is reported
    /// even when the state machine ignores it.
    pub fn from_reading(reading: &GestureReading) -> Self {
        match reading.command() {
            None => StatusSignal::IdleRotating,
            Some(GestureCommand::Explode) => StatusSignal::ExplodeRequested,
            Some(GestureCommand::Contract) => StatusSignal::ContractRequested,
            Some(GestureCommand::RotateOnly) => StatusSignal::RotatingByHand,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusSignal::IdleRotating => "idle-rotating",
            StatusSignal::RotatingByHand => "rotating-by-hand",
            StatusSignal::ExplodeRequested => "explode-requested",
            StatusSignal::ContractRequested => "contract-requested",
            StatusSignal::AwaitingCameraPermission => "awaiting-camera-permission",
            StatusSignal::CameraReady => "camera-ready",
            StatusSignal::CameraUnavailable => "camera-unavailable",
        }
    }

    /// Signals describing the tracker lifecycle rather than a hand reading.
    pub fn is_camera_status(self) -> bool {
        matches!(
            self,
            StatusSignal::AwaitingCameraPermission
                | StatusSignal::CameraReady
                | StatusSignal::CameraUnavailable
        )
    }

    /// Human-readable line for the status overlay.
    pub fn message(self) -> &'static str {
        match self {
            StatusSignal::IdleRotating => "Auto-rotating",
            StatusSignal::RotatingByHand => "Rotating with your hand",
            StatusSignal::ExplodeRequested => "Open hand: scatter",
            StatusSignal::ContractRequested => "Fist: rebuild",
            StatusSignal::AwaitingCameraPermission => "Connecting camera... please allow access",
            StatusSignal::CameraReady => "Camera ready - show your hand",
            StatusSignal::CameraUnavailable => "No camera - running in demo mode",
        }
    }
}

impl fmt::Display for StatusSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusSignal {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ALL: [StatusSignal; 7] = [
            StatusSignal::IdleRotating,
            StatusSignal::RotatingByHand,
            StatusSignal::ExplodeRequested,
            StatusSignal::ContractRequested,
            StatusSignal::AwaitingCameraPermission,
            StatusSignal::CameraReady,
            StatusSignal::CameraUnavailable,
        ];
        let s = s.trim();
        ALL.into_iter()
            .find(|signal| signal.as_str() == s)
            .ok_or_else(|| TreeError::UnknownStatus(s.to_string()))
    }
}
