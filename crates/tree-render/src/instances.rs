//! CPU-side packing of scene state into sprite instances.

use glam::Vec3;
use tree_core::{
    AnimatedObject, ObjectKind, ParticleBuffer, SnowField, Star, Trunk, PARTICLE_SIZE,
    SNOW_OPACITY, SNOW_POINT_SIZE, SNOW_RGB, SWAY_AMPLITUDE,
};

/// Fragment-stage shape selector, stored as a float in the instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum SpriteShape {
    Particle = 0,
    Snow = 1,
    Orb = 2,
    Star = 3,
    Trunk = 4,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointInstance {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 3],
    pub sway: f32,
    pub offset: [f32; 3],
    pub shape: f32,
    /// Euler x/y of a solid object; the fragment stage foreshortens its
    /// silhouette by the cosine of each.
    pub tilt: [f32; 2],
}

impl PointInstance {
    fn new(position: Vec3, size: f32, color: [f32; 3], shape: SpriteShape) -> Self {
        Self {
            position: position.to_array(),
            size,
            color,
            sway: 0.0,
            offset: [0.0; 3],
            shape: shape as u32 as f32,
            tilt: [0.0; 2],
        }
    }
}

/// Tree particles. With `use_rendered` the already displaced positions are
/// packed and the vertex stage is expected to leave them alone.
pub fn particle_instances(buffers: &[ParticleBuffer], use_rendered: bool, out: &mut Vec<PointInstance>) {
    out.clear();
    out.reserve(buffers.iter().map(ParticleBuffer::len).sum());
    for buffer in buffers {
        for i in 0..buffer.len() {
            let position = if use_rendered {
                buffer.rendered_position(i)
            } else {
                buffer.position(i)
            };
            let mut inst = PointInstance::new(position, PARTICLE_SIZE, buffer.color(i), SpriteShape::Particle);
            inst.sway = SWAY_AMPLITUDE;
            inst.offset = buffer.offset(i).to_array();
            out.push(inst);
        }
    }
}

/// Ornaments, trunk and star at their current animated positions.
pub fn object_instances(
    objects: &[AnimatedObject],
    star: &Star,
    trunk: &Trunk,
    out: &mut Vec<PointInstance>,
) {
    out.clear();
    for obj in objects {
        let base = obj.base_rgb();
        let mut inst = match obj.kind {
            ObjectKind::Ornament { .. } => PointInstance::new(
                obj.position,
                tree_core::ORNAMENT_RADIUS,
                scale_rgb(base, emissive_gain(obj.glow)),
                SpriteShape::Orb,
            ),
            ObjectKind::Star => PointInstance::new(
                obj.position,
                star.outer_radius,
                scale_rgb(base, emissive_gain(obj.glow)),
                SpriteShape::Star,
            ),
            ObjectKind::Trunk => PointInstance::new(
                obj.position,
                trunk.height * 0.5,
                base,
                SpriteShape::Trunk,
            ),
        };
        inst.tilt = [obj.rotation.x, obj.rotation.y];
        out.push(inst);
    }
}

pub fn snow_instances(snow: &SnowField, out: &mut Vec<PointInstance>) {
    out.clear();
    out.extend(snow.positions().chunks_exact(3).map(|p| {
        PointInstance::new(Vec3::new(p[0], p[1], p[2]), SNOW_POINT_SIZE, SNOW_RGB, SpriteShape::Snow)
    }));
}

/// Fragment-stage shape constants, laid out as two `vec4`s.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeParams {
    /// x: inner/outer radius ratio, y: point count.
    pub star: [f32; 4],
    /// x: trunk bottom half-width, y: trunk top half-width (sprite-local
    /// units), z: snow opacity.
    pub solids: [f32; 4],
}

pub fn shape_params(star: &Star, trunk: &Trunk) -> ShapeParams {
    let half_height = (trunk.height * 0.5).max(f32::EPSILON);
    let star_ratio = if star.outer_radius > 0.0 {
        star.inner_radius / star.outer_radius
    } else {
        0.0
    };
    ShapeParams {
        star: [star_ratio, star.points as f32, 0.0, 0.0],
        solids: [
            trunk.radius_bottom / half_height,
            trunk.radius_top / half_height,
            SNOW_OPACITY,
            0.0,
        ],
    }
}

#[inline]
fn emissive_gain(glow: f32) -> f32 {
    0.4 + 0.3 * glow.max(0.0)
}

#[inline]
fn scale_rgb(rgb: [f32; 3], k: f32) -> [f32; 3] {
    [rgb[0] * k, rgb[1] * k, rgb[2] * k]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use tree_core::{build_snow_field, build_star, build_trunk, generate_tree, REFERENCE_TIERS};

    #[test]
    fn instance_layout_matches_vertex_attributes() {
        assert_eq!(std::mem::size_of::<PointInstance>(), 56);
    }

    #[test]
    fn one_instance_per_particle() {
        let mut rng = StdRng::seed_from_u64(3);
        let tree = generate_tree(&REFERENCE_TIERS, 4, &mut rng).expect("tree");
        let mut out = Vec::new();
        particle_instances(&tree.buffers, false, &mut out);
        assert_eq!(out.len(), tree.particle_count());
        assert!(out.iter().all(|p| p.sway == SWAY_AMPLITUDE));
        assert_eq!(out[0].offset, tree.buffers[0].offset(0).to_array());
    }

    #[test]
    fn brighter_glow_gives_brighter_ornament() {
        let (star, star_obj) = build_star();
        let (trunk, _) = build_trunk();
        let mut dim = AnimatedObject::new(ObjectKind::Ornament { color_index: 0 }, Vec3::ZERO);
        dim.glow = 0.0;
        let mut bright = dim.clone();
        bright.glow = 4.0;
        let mut out = Vec::new();
        object_instances(&[dim, bright, star_obj], &star, &trunk, &mut out);
        assert_eq!(out.len(), 3);
        assert!(out[1].color[0] > out[0].color[0]);
        assert_eq!(out[2].shape, SpriteShape::Star as u32 as f32);
    }

    #[test]
    fn snow_is_packed_without_sway() {
        let mut rng = StdRng::seed_from_u64(9);
        let snow = build_snow_field(100, 50.0, &mut rng);
        let mut out = Vec::new();
        snow_instances(&snow, &mut out);
        assert_eq!(out.len(), 100);
        assert!(out.iter().all(|p| p.sway == 0.0 && p.offset == [0.0; 3] && p.tilt == [0.0; 2]));
    }

    #[test]
    fn shape_params_carry_star_trunk_and_snow() {
        let (star, _) = build_star();
        let (trunk, _) = build_trunk();
        let params = shape_params(&star, &trunk);
        assert!((params.star[0] - 0.4).abs() < 1e-6);
        assert_eq!(params.star[1], 5.0);
        assert!(params.solids[0] > params.solids[1], "trunk tapers upwards");
        assert_eq!(params.solids[2], SNOW_OPACITY);
    }

    #[test]
    fn object_rotation_reaches_the_instance() {
        let (star, mut star_obj) = build_star();
        let (trunk, mut trunk_obj) = build_trunk();
        star_obj.rotation.y = 1.2;
        trunk_obj.rotation.x = 0.5;
        let mut out = Vec::new();
        object_instances(&[trunk_obj, star_obj], &star, &trunk, &mut out);
        assert_eq!(out[0].tilt, [0.5, 0.0]);
        assert_eq!(out[1].tilt, [0.0, 1.2]);
    }
}
