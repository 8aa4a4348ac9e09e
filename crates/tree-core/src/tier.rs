//! Procedural tier generation.
//!
//! A tree is a stack of [`Tier`]s, bottom to top. Each tier is a truncated cone
//! of particles whose radius is perturbed by a periodic lobe term and a small
//! uniform jitter so the silhouette reads as hand-painted rather than lathed.
//! Generation is random-parameterised but shape-deterministic: for a given
//! seed the output is always identical.

use crate::constants::*;
use crate::error::{Result, TreeError};
use crate::state::{AnimatedObject, ObjectKind};
use glam::Vec3;
use rand::prelude::*;
use std::f32::consts::TAU;

/// One horizontal band of the tree. Immutable once constructed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tier {
    particle_count: usize,
    radius_base: f32,
    radius_top: f32,
    height: f32,
    base_y: f32,
}

impl Tier {
    pub fn new(
        particle_count: usize,
        radius_base: f32,
        radius_top: f32,
        height: f32,
        base_y: f32,
    ) -> Result<Self> {
        let tier = Self::from_parts(particle_count, radius_base, radius_top, height, base_y);
        tier.validate(0)?;
        Ok(tier)
    }

    pub(crate) const fn from_parts(
        particle_count: usize,
        radius_base: f32,
        radius_top: f32,
        height: f32,
        base_y: f32,
    ) -> Self {
        Self {
            particle_count,
            radius_base,
            radius_top,
            height,
            base_y,
        }
    }

    /// Check the geometric preconditions; `index` only labels the error.
    pub fn validate(&self, index: usize) -> Result<()> {
        let fail = |reason| Err(TreeError::InvalidTier { index, reason });
        if !self.height.is_finite() || self.height <= 0.0 {
            return fail("height must be positive and finite");
        }
        if !self.radius_base.is_finite() || self.radius_base < 0.0 {
            return fail("base radius must be non-negative and finite");
        }
        if !self.radius_top.is_finite() || self.radius_top < 0.0 {
            return fail("top radius must be non-negative and finite");
        }
        if !self.base_y.is_finite() {
            return fail("base y must be finite");
        }
        Ok(())
    }

    pub fn particle_count(&self) -> usize {
        self.particle_count
    }
    pub fn radius_base(&self) -> f32 {
        self.radius_base
    }
    pub fn radius_top(&self) -> f32 {
        self.radius_top
    }
    pub fn height(&self) -> f32 {
        self.height
    }
    pub fn base_y(&self) -> f32 {
        self.base_y
    }

    /// Radius of the unperturbed cone at `ratio` (0 = bottom, 1 = top).
    #[inline]
    pub fn radius_at(&self, ratio: f32) -> f32 {
        (1.0 - ratio) * self.radius_base + ratio * self.radius_top
    }
}

/// The six-tier reference tree, bottom to top.
pub const REFERENCE_TIERS: [Tier; 6] = [
    Tier::from_parts(18_000, 6.0, 2.0, 2.5, -4.0),
    Tier::from_parts(15_000, 5.0, 1.5, 2.5, -2.2),
    Tier::from_parts(12_000, 4.0, 1.0, 2.5, -0.2),
    Tier::from_parts(10_000, 3.0, 0.5, 2.0, 1.8),
    Tier::from_parts(8_000, 2.0, 0.2, 1.8, 3.6),
    Tier::from_parts(5_000, 1.0, 0.0, 1.5, 5.2),
];

/// Colour class drawn for each particle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FoliageTone {
    Snow,
    Foliage,
    Shadow,
}

impl FoliageTone {
    /// Map a uniform draw in [0, 1) to a tone: 5% snow, 55% foliage, 40% shadow.
    #[inline]
    pub fn from_draw(draw: f32) -> Self {
        if draw > SNOW_THRESHOLD {
            FoliageTone::Snow
        } else if draw > FOLIAGE_THRESHOLD {
            FoliageTone::Foliage
        } else {
            FoliageTone::Shadow
        }
    }

    pub fn rgb(self) -> [f32; 3] {
        match self {
            FoliageTone::Snow => SNOW_RGB,
            FoliageTone::Foliage => FOLIAGE_RGB,
            FoliageTone::Shadow => SHADOW_RGB,
        }
    }
}

/// Per-tier particle data as three parallel `x,y,z` / `r,g,b` arrays.
///
/// `positions`, `colors` and `offsets` are written once at generation time.
/// `rendered` holds the displaced positions and is only rewritten when the
/// CPU displacement path is active; otherwise it mirrors `positions`.
#[derive(Clone, Debug, Default)]
pub struct ParticleBuffer {
    positions: Vec<f32>,
    colors: Vec<f32>,
    offsets: Vec<f32>,
    rendered: Vec<f32>,
    rendered_progress: f32,
}

impl ParticleBuffer {
    fn with_capacity(count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(count * 3),
            colors: Vec::with_capacity(count * 3),
            offsets: Vec::with_capacity(count * 3),
            rendered: Vec::new(),
            rendered_progress: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }
    pub fn offsets(&self) -> &[f32] {
        &self.offsets
    }
    pub fn rendered_positions(&self) -> &[f32] {
        &self.rendered
    }

    #[inline]
    pub fn position(&self, i: usize) -> Vec3 {
        Vec3::from_slice(&self.positions[i * 3..i * 3 + 3])
    }
    #[inline]
    pub fn offset(&self, i: usize) -> Vec3 {
        Vec3::from_slice(&self.offsets[i * 3..i * 3 + 3])
    }
    #[inline]
    pub fn color(&self, i: usize) -> [f32; 3] {
        [self.colors[i * 3], self.colors[i * 3 + 1], self.colors[i * 3 + 2]]
    }
    #[inline]
    pub fn rendered_position(&self, i: usize) -> Vec3 {
        Vec3::from_slice(&self.rendered[i * 3..i * 3 + 3])
    }

    /// Resting position pushed outward along its offset: `p + offset * progress * scale`.
    #[inline]
    pub fn displaced(&self, i: usize, progress: f32, scale: f32) -> Vec3 {
        self.position(i) + self.offset(i) * (progress * scale)
    }

    /// CPU displacement path: rewrite every rendered position for `progress`.
    /// Returns false without touching memory if the progress is unchanged.
    pub fn apply_displacement(&mut self, progress: f32, scale: f32) -> bool {
        if progress == self.rendered_progress {
            return false;
        }
        let k = progress * scale;
        for ((r, p), o) in self
            .rendered
            .iter_mut()
            .zip(self.positions.iter())
            .zip(self.offsets.iter())
        {
            *r = p + o * k;
        }
        self.rendered_progress = progress;
        true
    }

    fn push(&mut self, position: Vec3, tone: FoliageTone, offset: Vec3) {
        self.positions.extend_from_slice(&position.to_array());
        self.colors.extend_from_slice(&tone.rgb());
        self.offsets.extend_from_slice(&offset.to_array());
    }

    fn finish(mut self) -> Self {
        self.rendered = self.positions.clone();
        self
    }
}

/// Generate one tier's particles.
pub fn generate_tier(tier: &Tier, rng: &mut impl Rng) -> ParticleBuffer {
    let mut buffer = ParticleBuffer::with_capacity(tier.particle_count);
    for _ in 0..tier.particle_count {
        let ratio: f32 = rng.gen();
        let angle: f32 = rng.gen::<f32>() * TAU;
        let lobe = (angle * SILHOUETTE_LOBES).sin() * SILHOUETTE_LOBE_DEPTH;
        let jitter = rng.gen_range(-SILHOUETTE_JITTER..SILHOUETTE_JITTER);
        let r = tier.radius_at(ratio) + lobe + jitter;
        let position = Vec3::new(
            angle.cos() * r,
            ratio * tier.height + tier.base_y,
            angle.sin() * r,
        );

        let offset = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let tone = FoliageTone::from_draw(rng.gen());
        buffer.push(position, tone, offset);
    }
    buffer.finish()
}

/// Place `count` ornaments on a ring at 80% of the tier's base radius.
/// The palette restarts on every tier.
pub fn place_ornaments(tier: &Tier, count: usize, rng: &mut impl Rng) -> Vec<AnimatedObject> {
    let ring = tier.radius_base * ORNAMENT_RING_FACTOR;
    let y = tier.base_y + ORNAMENT_HEIGHT_OFFSET;
    (0..count)
        .map(|i| {
            let angle: f32 = rng.gen::<f32>() * TAU;
            let color_index = i % ORNAMENT_RGB.len();
            AnimatedObject::new(
                ObjectKind::Ornament { color_index },
                Vec3::new(angle.cos() * ring, y, angle.sin() * ring),
            )
        })
        .collect()
}

/// Buffers and ornaments for a whole tree.
#[derive(Clone, Debug, Default)]
pub struct GeneratedTree {
    pub buffers: Vec<ParticleBuffer>,
    pub ornaments: Vec<AnimatedObject>,
}

impl GeneratedTree {
    pub fn particle_count(&self) -> usize {
        self.buffers.iter().map(ParticleBuffer::len).sum()
    }
}

/// Generate every tier in order, bottom to top.
pub fn generate_tree(
    tiers: &[Tier],
    ornaments_per_tier: usize,
    rng: &mut impl Rng,
) -> Result<GeneratedTree> {
    let mut tree = GeneratedTree {
        buffers: Vec::with_capacity(tiers.len()),
        ornaments: Vec::with_capacity(tiers.len() * ornaments_per_tier),
    };
    for (index, tier) in tiers.iter().enumerate() {
        tier.validate(index)?;
        tree.buffers.push(generate_tier(tier, rng));
        tree.ornaments
            .extend(place_ornaments(tier, ornaments_per_tier, rng));
    }
    log::info!(
        "[tree] generated {} tiers, {} particles, {} ornaments",
        tree.buffers.len(),
        tree.particle_count(),
        tree.ornaments.len()
    );
    Ok(tree)
}
