// Host-side integration tests for procedural tier generation.

use rand::prelude::*;
use tree_core::*;

const SILHOUETTE_SLACK: f32 = SILHOUETTE_LOBE_DEPTH + SILHOUETTE_JITTER + 1e-3;

fn horizontal_distance(p: glam::Vec3) -> f32 {
    (p.x * p.x + p.z * p.z).sqrt()
}

#[test]
fn particles_stay_inside_the_perturbed_cone() {
    let mut rng = StdRng::seed_from_u64(11);
    for tier in REFERENCE_TIERS.iter() {
        let buffer = generate_tier(tier, &mut rng);
        assert_eq!(buffer.len(), tier.particle_count());
        for i in 0..buffer.len() {
            let p = buffer.position(i);
            assert!(
                p.y >= tier.base_y() - 1e-4 && p.y <= tier.base_y() + tier.height() + 1e-4,
                "y {} outside tier band",
                p.y
            );
            let ratio = (p.y - tier.base_y()) / tier.height();
            let nominal = tier.radius_at(ratio);
            let d = horizontal_distance(p);
            assert!(d <= nominal + SILHOUETTE_SLACK, "radius {d} exceeds {nominal}");
            if nominal >= SILHOUETTE_SLACK {
                assert!(d >= nominal - SILHOUETTE_SLACK, "radius {d} below {nominal}");
            }
        }
    }
}

#[test]
fn tone_mix_is_roughly_five_fifty_five_forty() {
    let mut rng = StdRng::seed_from_u64(2024);
    let tier = Tier::new(40_000, 3.0, 1.0, 2.0, 0.0).expect("valid tier");
    let buffer = generate_tier(&tier, &mut rng);
    let (mut snow, mut foliage, mut shadow) = (0usize, 0usize, 0usize);
    for i in 0..buffer.len() {
        let c = buffer.color(i);
        if c == SNOW_RGB {
            snow += 1;
        } else if c == FOLIAGE_RGB {
            foliage += 1;
        } else if c == SHADOW_RGB {
            shadow += 1;
        } else {
            panic!("unexpected colour {c:?}");
        }
    }
    let n = buffer.len() as f32;
    assert!((snow as f32 / n - 0.05).abs() < 0.01, "snow fraction {}", snow as f32 / n);
    assert!((foliage as f32 / n - 0.55).abs() < 0.02, "foliage fraction {}", foliage as f32 / n);
    assert!((shadow as f32 / n - 0.40).abs() < 0.02, "shadow fraction {}", shadow as f32 / n);
}

#[test]
fn tone_thresholds() {
    assert_eq!(FoliageTone::from_draw(0.99), FoliageTone::Snow);
    assert_eq!(FoliageTone::from_draw(0.95), FoliageTone::Foliage);
    assert_eq!(FoliageTone::from_draw(0.5), FoliageTone::Foliage);
    assert_eq!(FoliageTone::from_draw(0.4), FoliageTone::Shadow);
    assert_eq!(FoliageTone::from_draw(0.0), FoliageTone::Shadow);
}

#[test]
fn offsets_are_inside_the_unit_cube() {
    let mut rng = StdRng::seed_from_u64(5);
    let tier = Tier::new(5_000, 2.0, 1.0, 1.0, 0.0).expect("valid tier");
    let buffer = generate_tier(&tier, &mut rng);
    assert!(buffer.offsets().iter().all(|o| (-1.0..=1.0).contains(o)));
}

#[test]
fn parallel_arrays_have_three_floats_per_particle() {
    let mut rng = StdRng::seed_from_u64(1);
    let tier = Tier::new(123, 2.0, 1.0, 1.0, 0.0).expect("valid tier");
    let buffer = generate_tier(&tier, &mut rng);
    assert_eq!(buffer.positions().len(), 369);
    assert_eq!(buffer.colors().len(), 369);
    assert_eq!(buffer.offsets().len(), 369);
    assert_eq!(buffer.rendered_positions(), buffer.positions());
}

#[test]
fn empty_tier_yields_empty_buffer() {
    let mut rng = StdRng::seed_from_u64(1);
    let tier = Tier::new(0, 2.0, 1.0, 1.0, 0.0).expect("zero particles is allowed");
    let buffer = generate_tier(&tier, &mut rng);
    assert!(buffer.is_empty());
    assert_eq!(buffer.len(), 0);
}

#[test]
fn invalid_tiers_are_rejected() {
    assert!(matches!(
        Tier::new(10, 2.0, 1.0, 0.0, 0.0),
        Err(TreeError::InvalidTier { .. })
    ));
    assert!(matches!(
        Tier::new(10, -1.0, 1.0, 1.0, 0.0),
        Err(TreeError::InvalidTier { .. })
    ));
    assert!(matches!(
        Tier::new(10, 1.0, f32::NAN, 1.0, 0.0),
        Err(TreeError::InvalidTier { .. })
    ));
}

#[test]
fn ornaments_sit_on_the_inner_ring() {
    let mut rng = StdRng::seed_from_u64(8);
    let tier = REFERENCE_TIERS[2];
    let ornaments = place_ornaments(&tier, 4, &mut rng);
    assert_eq!(ornaments.len(), 4);
    for (i, o) in ornaments.iter().enumerate() {
        let ring = horizontal_distance(o.position);
        assert!((ring - tier.radius_base() * ORNAMENT_RING_FACTOR).abs() < 1e-4);
        assert!((o.position.y - (tier.base_y() + ORNAMENT_HEIGHT_OFFSET)).abs() < 1e-6);
        assert_eq!(o.original_position(), o.position);
        assert_eq!(o.kind, ObjectKind::Ornament { color_index: i % 3 });
    }
}

#[test]
fn same_seed_same_tree() {
    let a = generate_tree(&REFERENCE_TIERS[3..], 4, &mut StdRng::seed_from_u64(99)).expect("tree");
    let b = generate_tree(&REFERENCE_TIERS[3..], 4, &mut StdRng::seed_from_u64(99)).expect("tree");
    assert_eq!(a.particle_count(), b.particle_count());
    for (x, y) in a.buffers.iter().zip(b.buffers.iter()) {
        assert_eq!(x.positions(), y.positions());
        assert_eq!(x.colors(), y.colors());
        assert_eq!(x.offsets(), y.offsets());
    }
    assert_eq!(a.ornaments, b.ornaments);
}

#[test]
fn reference_tree_has_expected_size() {
    let tree = generate_tree(&REFERENCE_TIERS, 4, &mut StdRng::seed_from_u64(0)).expect("tree");
    assert_eq!(tree.particle_count(), 68_000);
    assert_eq!(tree.ornaments.len(), 24);
}

#[test]
fn cpu_displacement_moves_rendered_positions_only() {
    let mut rng = StdRng::seed_from_u64(4);
    let tier = Tier::new(50, 2.0, 1.0, 1.0, 0.0).expect("valid tier");
    let mut buffer = generate_tier(&tier, &mut rng);
    let base = buffer.positions().to_vec();

    assert!(buffer.apply_displacement(0.5, 30.0));
    assert_eq!(buffer.positions(), &base[..]);
    for i in 0..buffer.len() {
        let expected = buffer.displaced(i, 0.5, 30.0);
        assert!(buffer.rendered_position(i).abs_diff_eq(expected, 1e-4));
    }
    assert!(!buffer.apply_displacement(0.5, 30.0), "unchanged progress is skipped");

    assert!(buffer.apply_displacement(0.0, 30.0));
    assert_eq!(buffer.rendered_positions(), &base[..]);
}
