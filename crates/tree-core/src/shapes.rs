use crate::constants::*;
use crate::state::{AnimatedObject, ObjectKind};
use glam::Vec3;
use rand::prelude::*;

/// Tapered cylinder under the lowest tier.
#[derive(Clone, Debug)]
pub struct Trunk {
    pub radius_top: f32,
    pub radius_bottom: f32,
    pub height: f32,
}

/// Five-pointed star on top of the tree.
#[derive(Clone, Debug)]
pub struct Star {
    pub outer_radius: f32,
    pub inner_radius: f32,
    pub points: usize,
}

/// Static background points. Rotates slowly, never explodes.
#[derive(Clone, Debug, Default)]
pub struct SnowField {
    positions: Vec<f32>,
    pub rotation_y: f32,
}

impl SnowField {
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Trunk proportions plus its animatable object, resting pose captured.
pub fn build_trunk() -> (Trunk, AnimatedObject) {
    let trunk = Trunk {
        radius_top: TRUNK_RADIUS_TOP,
        radius_bottom: TRUNK_RADIUS_BOTTOM,
        height: TRUNK_HEIGHT,
    };
    let object = AnimatedObject::new(ObjectKind::Trunk, Vec3::new(0.0, TRUNK_CENTER_Y, 0.0));
    (trunk, object)
}

/// Star proportions plus its animatable object, resting pose captured.
pub fn build_star() -> (Star, AnimatedObject) {
    let star = Star {
        outer_radius: STAR_OUTER_RADIUS,
        inner_radius: STAR_INNER_RADIUS,
        points: STAR_POINTS,
    };
    let object = AnimatedObject::new(ObjectKind::Star, Vec3::new(0.0, STAR_HEIGHT, 0.0));
    (star, object)
}

/// `count` points uniformly inside an axis-aligned cube of edge `extent`
/// centred on the origin.
pub fn build_snow_field(count: usize, extent: f32, rng: &mut impl Rng) -> SnowField {
    let half = extent * 0.5;
    let mut positions = Vec::with_capacity(count * 3);
    for _ in 0..count {
        for _ in 0..3 {
            positions.push(rng.gen_range(-half..=half));
        }
    }
    SnowField {
        positions,
        rotation_y: 0.0,
    }
}
