//! The single owned scene context.
//!
//! Everything the sculpture needs (buffers, objects, tweens, the explosion
//! state machine and rotation) lives in one [`Scene`] that frontends pass
//! explicitly to the frame loop and input handlers. All time-dependent calls
//! take `now_sec` on the frame loop's clock.

use crate::config::{DisplacementMode, TreeConfig};
use crate::constants::*;
use crate::error::Result;
use crate::explosion::{ExplosionController, ExplosionState};
use crate::frame::FrameUniforms;
use crate::gesture::{classify, GestureCommand, GestureReading, HandLandmarks};
use crate::shapes::{build_snow_field, build_star, build_trunk, SnowField, Star, Trunk};
use crate::state::{AnimatedObject, ObjectKind};
use crate::status::StatusSignal;
use crate::tier::{generate_tree, ParticleBuffer, Tier};
use crate::tween::{Ease, TweenSet, TweenTarget};
use glam::Vec3;
use rand::prelude::*;
use std::f64::consts::TAU as TAU_F64;
use std::f32::consts::TAU;

pub struct Scene {
    config: TreeConfig,
    rng: StdRng,
    buffers: Vec<ParticleBuffer>,
    /// Ornaments first, then trunk, then star.
    objects: Vec<AnimatedObject>,
    trunk: Trunk,
    star: Star,
    snow: SnowField,
    tweens: TweenSet,
    explosion: ExplosionController,
    yaw: f32,
    hand_active: bool,
    status: StatusSignal,
}

impl Scene {
    pub fn new(config: TreeConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let tree = generate_tree(&config.tiers, config.ornaments_per_tier, &mut rng)?;
        let (trunk, trunk_object) = build_trunk();
        let (star, star_object) = build_star();
        let snow = build_snow_field(config.snow_count, config.snow_extent, &mut rng);

        let mut objects = tree.ornaments;
        objects.push(trunk_object);
        objects.push(star_object);

        Ok(Self {
            explosion: ExplosionController::new(config.explosion),
            config,
            rng,
            buffers: tree.buffers,
            objects,
            trunk,
            star,
            snow,
            tweens: TweenSet::new(),
            yaw: 0.0,
            hand_active: false,
            status: StatusSignal::IdleRotating,
        })
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }
    pub fn tiers(&self) -> &[Tier] {
        &self.config.tiers
    }
    pub fn buffers(&self) -> &[ParticleBuffer] {
        &self.buffers
    }
    pub fn objects(&self) -> &[AnimatedObject] {
        &self.objects
    }
    pub fn ornaments(&self) -> impl Iterator<Item = &AnimatedObject> {
        self.objects
            .iter()
            .filter(|o| matches!(o.kind, ObjectKind::Ornament { .. }))
    }
    pub fn trunk(&self) -> &Trunk {
        &self.trunk
    }
    pub fn star(&self) -> &Star {
        &self.star
    }
    pub fn snow(&self) -> &SnowField {
        &self.snow
    }
    pub fn explosion_state(&self) -> ExplosionState {
        self.explosion.state()
    }
    pub fn explosion(&self) -> &ExplosionController {
        &self.explosion
    }
    pub fn tweens(&self) -> &TweenSet {
        &self.tweens
    }
    /// Yaw of the whole sculpture group, radians.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }
    pub fn hand_active(&self) -> bool {
        self.hand_active
    }
    pub fn status(&self) -> StatusSignal {
        self.status
    }
    pub fn displacement_mode(&self) -> DisplacementMode {
        self.config.displacement
    }

    pub fn explode(&mut self, now_sec: f64) -> bool {
        self.explosion
            .explode(now_sec, &mut self.tweens, &self.objects, &mut self.rng)
    }

    pub fn contract(&mut self, now_sec: f64) -> bool {
        self.explosion
            .contract(now_sec, &mut self.tweens, &self.objects)
    }

    /// Feed one tracker frame (`None` = no hand). A hand cancels any yaw tween,
    /// takes over the yaw, and may request a transition; the state machine
    /// decides whether the request is honoured.
    pub fn apply_gesture(&mut self, sample: Option<&HandLandmarks>, now_sec: f64) -> GestureReading {
        let reading = classify(sample);
        match reading {
            GestureReading::NoHand => {
                self.hand_active = false;
            }
            GestureReading::Hand { rotation_angle, .. } => {
                self.hand_active = true;
                self.tweens.cancel(TweenTarget::SculptureYaw);
                self.yaw = rotation_angle.rem_euclid(TAU);
                match reading.command() {
                    Some(GestureCommand::Explode) => {
                        self.explode(now_sec);
                    }
                    Some(GestureCommand::Contract) => {
                        self.contract(now_sec);
                    }
                    _ => {}
                }
            }
        }
        self.status = StatusSignal::from_reading(&reading);
        reading
    }

    /// Record the tracker's lifecycle status. Unavailability forces idle rotation.
    pub fn set_camera_status(&mut self, status: StatusSignal) {
        if status == StatusSignal::CameraUnavailable {
            self.hand_active = false;
        }
        if !self.hand_active {
            self.status = status;
        }
    }

    /// Ease the yaw by `delta` radians. Ignored while a hand is steering.
    pub fn nudge_yaw(&mut self, delta: f32, now_sec: f64) -> bool {
        if self.hand_active {
            return false;
        }
        self.tweens.start(
            TweenTarget::SculptureYaw,
            Vec3::splat(self.yaw),
            Vec3::splat(self.yaw + delta),
            now_sec,
            YAW_NUDGE_DURATION_SEC,
            Ease::Power2Out,
        );
        true
    }

    /// Advance all continuous state by one frame and return the per-frame
    /// values the renderer consumes.
    pub fn tick(&mut self, now_sec: f64) -> FrameUniforms {
        let Self {
            tweens,
            objects,
            explosion,
            yaw,
            ..
        } = self;
        tweens.step(now_sec, |target, value| match target {
            TweenTarget::ExplosionProgress => explosion.set_progress(value.x),
            TweenTarget::ObjectPosition(i) => {
                if let Some(o) = objects.get_mut(i) {
                    o.position = value;
                }
            }
            TweenTarget::ObjectRotation(i) => {
                if let Some(o) = objects.get_mut(i) {
                    o.rotation = value;
                }
            }
            TweenTarget::SculptureYaw => *yaw = value.x,
        });
        self.explosion.update(now_sec);

        let progress = self.explosion.progress();
        let scale = self.config.explosion.explosion_scale;
        if self.config.displacement == DisplacementMode::Cpu {
            for buffer in &mut self.buffers {
                buffer.apply_displacement(progress, scale);
            }
        }

        // Angles stay in [0, TAU) so the per-tick increments never drop
        // below f32 resolution on a long-running session.
        if !self.hand_active && !self.tweens.is_active(TweenTarget::SculptureYaw) {
            self.yaw += AUTO_ROTATION_PER_TICK;
        }
        self.yaw = self.yaw.rem_euclid(TAU);
        self.snow.rotation_y = (self.snow.rotation_y + SNOW_SPIN_PER_TICK).rem_euclid(TAU);

        let mut ornament_index = 0usize;
        for obj in &mut self.objects {
            match obj.kind {
                ObjectKind::Star => {
                    obj.rotation.y = (obj.rotation.y + STAR_SPIN_PER_TICK).rem_euclid(TAU);
                }
                ObjectKind::Ornament { .. } => {
                    obj.glow = ornament_glow(now_sec, ornament_index);
                    ornament_index += 1;
                }
                ObjectKind::Trunk => {}
            }
        }

        FrameUniforms {
            sway_phase: now_sec.rem_euclid(TAU_F64) as f32,
            explosion: progress,
            shader_displacement: match self.config.displacement {
                DisplacementMode::Shader => progress,
                DisplacementMode::Cpu => 0.0,
            },
            explosion_scale: scale,
            sculpture_yaw: self.yaw,
            snow_yaw: self.snow.rotation_y,
        }
    }
}

/// Breathing intensity for ornament `index`; the index is its phase offset.
/// The clock phase is reduced in f64 before narrowing.
#[inline]
pub fn ornament_glow(time_sec: f64, index: usize) -> f32 {
    let phase = (time_sec * ORNAMENT_GLOW_RATE as f64).rem_euclid(TAU_F64) as f32;
    ORNAMENT_GLOW_BASE + ORNAMENT_GLOW_AMPLITUDE * (phase + index as f32).sin()
}
