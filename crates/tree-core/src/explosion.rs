//! Explosion / contraction state machine.
//!
//! All legal transitions live here:
//!
//! ```text
//! Normal --explode()--> Exploding --(settle)--> Exploded --contract()--> Contracting --(settle)--> Normal
//! ```
//!
//! `explode()` outside `Normal` and `contract()` outside `Exploded` are no-ops,
//! which is what keeps two interpolations from ever writing the same position
//! buffers. The transient states leave on a deadline polled by [`update`].
//!
//! [`update`]: ExplosionController::update

use crate::config::ExplosionParams;
use crate::state::AnimatedObject;
use crate::tween::{Ease, TweenSet, TweenTarget};
use glam::Vec3;
use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ExplosionState {
    #[default]
    Normal,
    Exploding,
    Exploded,
    Contracting,
}

#[derive(Clone, Debug)]
pub struct ExplosionController {
    state: ExplosionState,
    settle_at: Option<f64>,
    progress: f32,
    params: ExplosionParams,
}

impl ExplosionController {
    pub fn new(params: ExplosionParams) -> Self {
        Self {
            state: ExplosionState::Normal,
            settle_at: None,
            progress: 0.0,
            params,
        }
    }

    pub fn state(&self) -> ExplosionState {
        self.state
    }

    /// Explosion progress in [0, 1].
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Deadline of the pending transient-state exit, if any.
    pub fn settle_at(&self) -> Option<f64> {
        self.settle_at
    }

    pub fn params(&self) -> &ExplosionParams {
        &self.params
    }

    /// Written by the tween driver only.
    pub(crate) fn set_progress(&mut self, progress: f32) {
        self.progress = progress.clamp(0.0, 1.0);
    }

    /// Scatter the tree. Returns false (and changes nothing) unless `Normal`.
    pub fn explode(
        &mut self,
        now_sec: f64,
        tweens: &mut TweenSet,
        objects: &[AnimatedObject],
        rng: &mut impl Rng,
    ) -> bool {
        if self.state != ExplosionState::Normal {
            log::debug!("[explosion] explode ignored in {:?}", self.state);
            return false;
        }
        let p = &self.params;
        self.state = ExplosionState::Exploding;
        self.settle_at = Some(now_sec + p.explode_settle_sec as f64);

        tweens.start(
            TweenTarget::ExplosionProgress,
            Vec3::splat(self.progress),
            Vec3::ONE,
            now_sec,
            p.explode_duration_sec,
            Ease::Power2Out,
        );
        let h = p.scatter_half_extent;
        for (i, obj) in objects.iter().enumerate() {
            let scatter = if h > 0.0 {
                Vec3::new(
                    rng.gen_range(-h..h),
                    rng.gen_range(-h..h),
                    rng.gen_range(-h..h),
                )
            } else {
                Vec3::ZERO
            };
            tweens.start(
                TweenTarget::ObjectPosition(i),
                obj.position,
                scatter,
                now_sec,
                p.explode_duration_sec,
                Ease::Power2Out,
            );
            tweens.start(
                TweenTarget::ObjectRotation(i),
                obj.rotation,
                Vec3::new(p.spin_radians, p.spin_radians, obj.rotation.z),
                now_sec,
                p.spin_duration_sec,
                Ease::Power1Out,
            );
        }
        log::info!("[explosion] Normal -> Exploding ({} objects)", objects.len());
        true
    }

    /// Pull everything home. Returns false (and changes nothing) unless `Exploded`.
    pub fn contract(
        &mut self,
        now_sec: f64,
        tweens: &mut TweenSet,
        objects: &[AnimatedObject],
    ) -> bool {
        if self.state != ExplosionState::Exploded {
            log::debug!("[explosion] contract ignored in {:?}", self.state);
            return false;
        }
        let p = &self.params;
        self.state = ExplosionState::Contracting;
        self.settle_at = Some(now_sec + p.contract_settle_sec as f64);

        tweens.start(
            TweenTarget::ExplosionProgress,
            Vec3::splat(self.progress),
            Vec3::ZERO,
            now_sec,
            p.contract_duration_sec,
            Ease::ExpoInOut,
        );
        for (i, obj) in objects.iter().enumerate() {
            tweens.start(
                TweenTarget::ObjectPosition(i),
                obj.position,
                obj.original_position(),
                now_sec,
                p.contract_duration_sec,
                Ease::ExpoInOut,
            );
            tweens.start(
                TweenTarget::ObjectRotation(i),
                obj.rotation,
                obj.original_rotation(),
                now_sec,
                p.contract_duration_sec,
                Ease::Power1Out,
            );
        }
        log::info!("[explosion] Exploded -> Contracting");
        true
    }

    /// Leave a transient state once its deadline has passed. Returns the new
    /// state when a transition happened.
    pub fn update(&mut self, now_sec: f64) -> Option<ExplosionState> {
        let deadline = self.settle_at?;
        if now_sec < deadline {
            return None;
        }
        self.settle_at = None;
        let next = match self.state {
            ExplosionState::Exploding => ExplosionState::Exploded,
            ExplosionState::Contracting => ExplosionState::Normal,
            steady => steady,
        };
        if next != self.state {
            log::info!("[explosion] {:?} -> {:?}", self.state, next);
            self.state = next;
            return Some(next);
        }
        None
    }
}
