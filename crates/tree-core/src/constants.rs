use glam::Vec3;

// Shared visual/audio tuning constants used by both web and native frontends.

// Idle motion (radians per frame tick)
pub const AUTO_ROTATION_PER_TICK: f32 = 0.008;
pub const STAR_SPIN_PER_TICK: f32 = 0.05;
pub const SNOW_SPIN_PER_TICK: f32 = 0.002;

// Hand yaw: (palm_x - 0.5) * PI * HAND_YAW_SPAN
pub const HAND_YAW_SPAN: f32 = 3.0;
pub const OPEN_HAND_MIN_FINGERS: u8 = 3;

// Manual yaw nudges from keyboard input
pub const YAW_NUDGE_RADIANS: f32 = 0.6;
pub const YAW_NUDGE_DURATION_SEC: f32 = 0.4;

// Particle sprites
pub const PARTICLE_SIZE: f32 = 0.12;
pub const SWAY_AMPLITUDE: f32 = 0.05;
pub const SNOW_POINT_SIZE: f32 = 0.1;
pub const SNOW_OPACITY: f32 = 0.6;

// Foliage draw thresholds: draw > SNOW -> snow, draw > FOLIAGE -> foliage, else shadow
pub const SNOW_THRESHOLD: f32 = 0.95;
pub const FOLIAGE_THRESHOLD: f32 = 0.4;

// Silhouette noise: sin(angle * LOBES) * LOBE_DEPTH + U(-JITTER, JITTER)
pub const SILHOUETTE_LOBES: f32 = 8.0;
pub const SILHOUETTE_LOBE_DEPTH: f32 = 0.4;
pub const SILHOUETTE_JITTER: f32 = 0.15;

// Palette (sRGB, 0..1)
pub const FOLIAGE_RGB: [f32; 3] = [0x22 as f32 / 255.0, 0x8b as f32 / 255.0, 0x22 as f32 / 255.0];
pub const SHADOW_RGB: [f32; 3] = [0x0a as f32 / 255.0, 0x3d as f32 / 255.0, 0x0a as f32 / 255.0];
pub const SNOW_RGB: [f32; 3] = [1.0, 1.0, 1.0];
pub const ORNAMENT_RGB: [[f32; 3]; 3] = [
    [1.0, 0x66 as f32 / 255.0, 0xbb as f32 / 255.0], // pink
    [0x66 as f32 / 255.0, 1.0, 0x88 as f32 / 255.0], // green
    [1.0, 0xaa as f32 / 255.0, 0x44 as f32 / 255.0], // orange
];
pub const STAR_RGB: [f32; 3] = [1.0, 0xcc as f32 / 255.0, 0.0];
pub const TRUNK_RGB: [f32; 3] = [0x22 as f32 / 255.0, 0x11 as f32 / 255.0, 0.0];
pub const BACKGROUND_RGB: [f32; 3] = [0x05 as f32 / 255.0, 0x05 as f32 / 255.0, 0x10 as f32 / 255.0];

// Ornaments
pub const ORNAMENT_RADIUS: f32 = 0.25;
pub const ORNAMENT_RING_FACTOR: f32 = 0.8;
pub const ORNAMENT_HEIGHT_OFFSET: f32 = 0.5;
pub const ORNAMENT_GLOW_BASE: f32 = 2.0;
pub const ORNAMENT_GLOW_AMPLITUDE: f32 = 2.0;
pub const ORNAMENT_GLOW_RATE: f32 = 5.0;

// Topper and trunk
pub const STAR_OUTER_RADIUS: f32 = 0.5;
pub const STAR_INNER_RADIUS: f32 = 0.2;
pub const STAR_POINTS: usize = 5;
pub const STAR_HEIGHT: f32 = 7.6;
pub const STAR_GLOW: f32 = 1.5;
pub const TRUNK_RADIUS_TOP: f32 = 0.7;
pub const TRUNK_RADIUS_BOTTOM: f32 = 1.2;
pub const TRUNK_HEIGHT: f32 = 4.0;
pub const TRUNK_CENTER_Y: f32 = -5.5;

// Camera
pub const CAMERA_EYE: [f32; 3] = [0.0, 5.0, 25.0];
pub const CAMERA_FOVY_DEGREES: f32 = 50.0;
pub const CAMERA_DAMPING: f32 = 0.1;

#[inline]
pub fn camera_eye_vec3() -> Vec3 {
    Vec3::from(CAMERA_EYE)
}
