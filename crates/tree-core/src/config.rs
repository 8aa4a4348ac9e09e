//! Startup configuration.
//!
//! `TreeConfig::default()` is the reference scene. Frontends may apply string
//! overrides (`TREE_START`, `TREE_DISPLACEMENT`, `TREE_SEED`) from any lookup,
//! typically the process environment, then must call [`TreeConfig::validate`]
//! (done by `Scene::new`).

use crate::error::{Result, TreeError};
use crate::music::Envelope;
use crate::tier::{Tier, REFERENCE_TIERS};

/// When tracking and audio may begin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StartPolicy {
    /// Wait for an explicit user action (click / key). Required by most audio
    /// outputs before they will produce sound.
    #[default]
    OnUserGesture,
    /// Start at construction.
    Eager,
}

/// Where explosion displacement is computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DisplacementMode {
    /// One progress scalar per frame; the vertex stage displaces each particle.
    #[default]
    Shader,
    /// Rewrite every particle's rendered position on the CPU each tick the
    /// progress changes. For renderers without a programmable vertex stage.
    Cpu,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExplosionParams {
    pub explode_duration_sec: f32,
    /// Delay after `explode()` before the state becomes `Exploded`.
    pub explode_settle_sec: f32,
    pub contract_duration_sec: f32,
    /// Delay after `contract()` before the state becomes `Normal`.
    pub contract_settle_sec: f32,
    /// Particle displacement at full progress, in world units per offset unit.
    pub explosion_scale: f32,
    /// Objects scatter uniformly inside a cube of this half-extent.
    pub scatter_half_extent: f32,
    /// Euler x/y reached by the explosion spin.
    pub spin_radians: f32,
    pub spin_duration_sec: f32,
}

impl Default for ExplosionParams {
    fn default() -> Self {
        Self {
            explode_duration_sec: 1.5,
            explode_settle_sec: 1.6,
            contract_duration_sec: 2.0,
            contract_settle_sec: 2.1,
            explosion_scale: 30.0,
            scatter_half_extent: 15.0,
            spin_radians: 5.0,
            spin_duration_sec: 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchedulerParams {
    /// How far ahead of the audio clock notes are committed.
    pub lookahead_sec: f64,
    /// Silence appended after every note.
    pub gap_sec: f64,
    /// Re-arm delay of the scheduler timer.
    pub interval_ms: u32,
}

impl Default for SchedulerParams {
    fn default() -> Self {
        Self {
            lookahead_sec: 0.25,
            gap_sec: 0.02,
            interval_ms: 40,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TreeConfig {
    pub tiers: Vec<Tier>,
    pub ornaments_per_tier: usize,
    pub snow_count: usize,
    /// Edge length of the snow cube.
    pub snow_extent: f32,
    pub explosion: ExplosionParams,
    pub scheduler: SchedulerParams,
    pub envelope: Envelope,
    pub displacement: DisplacementMode,
    pub start_policy: StartPolicy,
    /// Fixed RNG seed; `None` draws one from entropy.
    pub seed: Option<u64>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            tiers: REFERENCE_TIERS.to_vec(),
            ornaments_per_tier: 4,
            snow_count: 3000,
            snow_extent: 50.0,
            explosion: ExplosionParams::default(),
            scheduler: SchedulerParams::default(),
            envelope: Envelope::default(),
            displacement: DisplacementMode::default(),
            start_policy: StartPolicy::default(),
            seed: None,
        }
    }
}

impl TreeConfig {
    pub fn validate(&self) -> Result<()> {
        for (i, tier) in self.tiers.iter().enumerate() {
            tier.validate(i)?;
        }
        let e = &self.explosion;
        positive("explode_duration_sec", e.explode_duration_sec)?;
        positive("explode_settle_sec", e.explode_settle_sec)?;
        positive("contract_duration_sec", e.contract_duration_sec)?;
        positive("contract_settle_sec", e.contract_settle_sec)?;
        positive("spin_duration_sec", e.spin_duration_sec)?;
        if e.explode_settle_sec < e.explode_duration_sec {
            return Err(TreeError::InvalidConfig(format!(
                "explode_settle_sec {} must not be shorter than explode_duration_sec {}",
                e.explode_settle_sec, e.explode_duration_sec
            )));
        }
        if e.contract_settle_sec < e.contract_duration_sec {
            return Err(TreeError::InvalidConfig(format!(
                "contract_settle_sec {} must not be shorter than contract_duration_sec {}",
                e.contract_settle_sec, e.contract_duration_sec
            )));
        }
        non_negative("explosion_scale", e.explosion_scale)?;
        non_negative("scatter_half_extent", e.scatter_half_extent)?;
        non_negative("snow_extent", self.snow_extent)?;
        let s = &self.scheduler;
        positive("lookahead_sec", s.lookahead_sec as f32)?;
        non_negative("gap_sec", s.gap_sec as f32)?;
        if s.interval_ms == 0 {
            return Err(TreeError::InvalidConfig(
                "interval_ms must be positive".to_string(),
            ));
        }
        if s.interval_ms as f64 / 1000.0 >= s.lookahead_sec {
            return Err(TreeError::InvalidConfig(format!(
                "scheduler interval {} ms must be shorter than the lookahead {} s",
                s.interval_ms, s.lookahead_sec
            )));
        }
        self.envelope.validate()
    }

    /// Apply string overrides from `lookup`. Unknown or unparseable values are
    /// logged and ignored so a typo never blocks startup.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("TREE_START") {
            match v.trim().to_ascii_lowercase().as_str() {
                "eager" => self.start_policy = StartPolicy::Eager,
                "gesture" | "click" => self.start_policy = StartPolicy::OnUserGesture,
                other => log::warn!("[config] ignoring TREE_START={other}"),
            }
        }
        if let Some(v) = lookup("TREE_DISPLACEMENT") {
            match v.trim().to_ascii_lowercase().as_str() {
                "shader" | "gpu" => self.displacement = DisplacementMode::Shader,
                "cpu" => self.displacement = DisplacementMode::Cpu,
                other => log::warn!("[config] ignoring TREE_DISPLACEMENT={other}"),
            }
        }
        if let Some(v) = lookup("TREE_SEED") {
            match v.trim().parse::<u64>() {
                Ok(seed) => self.seed = Some(seed),
                Err(e) => log::warn!("[config] ignoring TREE_SEED={v}: {e}"),
            }
        }
        self
    }
}

fn positive(name: &str, v: f32) -> Result<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(TreeError::InvalidConfig(format!("{name} must be positive, got {v}")))
    }
}

fn non_negative(name: &str, v: f32) -> Result<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(TreeError::InvalidConfig(format!("{name} must be non-negative, got {v}")))
    }
}
