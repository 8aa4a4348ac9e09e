//! Scene-object and camera state shared with the frontends.
//!
//! These types avoid platform-specific APIs and are suitable for both native
//! and web targets. The renderer reads them every frame; only the explosion
//! tweens and the frame loop write them.

use crate::constants::*;
use glam::{Mat4, Vec3};

/// What an [`AnimatedObject`] represents in the scene graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Ornament { color_index: usize },
    Trunk,
    Star,
}

/// A solid object that scatters on explosion and returns on contraction.
///
/// The resting pose is captured in the constructor and can never be
/// reassigned; it is the contraction target.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimatedObject {
    pub kind: ObjectKind,
    pub position: Vec3,
    /// Euler angles (x, y, z) in radians.
    pub rotation: Vec3,
    /// Emissive intensity written by the frame loop.
    pub glow: f32,
    original_position: Vec3,
    original_rotation: Vec3,
}

impl AnimatedObject {
    pub fn new(kind: ObjectKind, position: Vec3) -> Self {
        let glow = match kind {
            ObjectKind::Ornament { .. } => ORNAMENT_GLOW_BASE,
            ObjectKind::Star => STAR_GLOW,
            ObjectKind::Trunk => 0.0,
        };
        Self {
            kind,
            position,
            rotation: Vec3::ZERO,
            glow,
            original_position: position,
            original_rotation: Vec3::ZERO,
        }
    }

    pub fn original_position(&self) -> Vec3 {
        self.original_position
    }

    pub fn original_rotation(&self) -> Vec3 {
        self.original_rotation
    }

    /// True once the object is back at its resting pose.
    pub fn is_at_rest(&self, epsilon: f32) -> bool {
        self.position.abs_diff_eq(self.original_position, epsilon)
            && self.rotation.abs_diff_eq(self.original_rotation, epsilon)
    }

    /// Base colour, before emissive scaling.
    pub fn base_rgb(&self) -> [f32; 3] {
        match self.kind {
            ObjectKind::Ornament { color_index } => ORNAMENT_RGB[color_index % ORNAMENT_RGB.len()],
            ObjectKind::Trunk => TRUNK_RGB,
            ObjectKind::Star => STAR_RGB,
        }
    }
}

/// Damped orbit camera around a fixed target.
///
/// Input sets `target_yaw`/`target_pitch`/`target_distance`; [`Camera::update`]
/// eases the live values toward them once per frame.
#[derive(Clone, Debug)]
pub struct Camera {
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fovy_radians: f32,
    pub znear: f32,
    pub zfar: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub target_yaw: f32,
    pub target_pitch: f32,
    pub target_distance: f32,
}

impl Default for Camera {
    fn default() -> Self {
        let eye = camera_eye_vec3();
        let distance = eye.length();
        let pitch = (eye.y / distance).asin();
        let yaw = eye.x.atan2(eye.z);
        Self {
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect: 16.0 / 9.0,
            fovy_radians: CAMERA_FOVY_DEGREES.to_radians(),
            znear: 0.1,
            zfar: 1000.0,
            yaw,
            pitch,
            distance,
            target_yaw: yaw,
            target_pitch: pitch,
            target_distance: distance,
        }
    }
}

impl Camera {
    const PITCH_LIMIT: f32 = 1.45;
    const MIN_DISTANCE: f32 = 5.0;
    const MAX_DISTANCE: f32 = 80.0;

    pub fn eye(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.target + Vec3::new(sy * cp, sp, cy * cp) * self.distance
    }

    /// Compute the clip-space projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy_radians, self.aspect, self.znear, self.zfar)
    }

    /// Compute the view matrix that transforms world to view space.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, self.up)
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn orbit(&mut self, d_yaw: f32, d_pitch: f32) {
        self.target_yaw += d_yaw;
        self.target_pitch = (self.target_pitch + d_pitch).clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
    }

    pub fn zoom(&mut self, factor: f32) {
        self.target_distance =
            (self.target_distance * factor).clamp(Self::MIN_DISTANCE, Self::MAX_DISTANCE);
    }

    /// Advance the damping one frame.
    pub fn update(&mut self) {
        self.yaw += (self.target_yaw - self.yaw) * CAMERA_DAMPING;
        self.pitch += (self.target_pitch - self.pitch) * CAMERA_DAMPING;
        self.distance += (self.target_distance - self.distance) * CAMERA_DAMPING;
    }
}
