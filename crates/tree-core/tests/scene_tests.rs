// Host-side integration tests for the scene context and frame loop.

use std::f32::consts::TAU;
use tree_core::*;

const DT: f64 = 1.0 / 60.0;

fn small_config() -> TreeConfig {
    TreeConfig {
        tiers: vec![Tier::new(200, 2.0, 1.0, 1.0, 0.0).expect("valid tier")],
        snow_count: 50,
        seed: Some(7),
        ..TreeConfig::default()
    }
}

fn scene() -> Scene {
    Scene::new(small_config()).expect("valid config")
}

fn hand(palm_x: f32, extended: usize) -> HandLandmarks {
    let mut points = [Landmark::new(palm_x, 0.6, 0.0); LANDMARK_COUNT];
    for (k, &(tip, pip)) in TRACKED_FINGERS.iter().enumerate() {
        points[pip].y = 0.5;
        points[tip].y = if k < extended { 0.3 } else { 0.7 };
    }
    HandLandmarks::new(points)
}

/// Tick at 60 fps from `from` until `until`; returns the last time used.
fn run(scene: &mut Scene, from: f64, until: f64) -> f64 {
    let mut t = from;
    while t < until {
        scene.tick(t);
        t += DT;
    }
    scene.tick(t);
    t
}

#[derive(Default)]
struct CountingRenderer {
    camera_steps: usize,
    renders: usize,
    last: Option<FrameUniforms>,
}

impl RenderCollaborator for CountingRenderer {
    fn advance_camera(&mut self) {
        self.camera_steps += 1;
    }

    fn render(&mut self, scene: &Scene, frame: &FrameUniforms) {
        assert_eq!(frame.sculpture_yaw, scene.yaw());
        self.renders += 1;
        self.last = Some(*frame);
    }
}

#[test]
fn scene_builds_from_small_config() {
    let s = scene();
    assert_eq!(s.buffers().len(), 1);
    assert_eq!(s.buffers()[0].len(), 200);
    assert_eq!(s.ornaments().count(), 4);
    assert_eq!(s.objects().len(), 6, "ornaments plus trunk and star");
    assert_eq!(s.snow().len(), 50);
    assert_eq!(s.explosion_state(), ExplosionState::Normal);
    assert_eq!(s.status(), StatusSignal::IdleRotating);
}

#[test]
fn invalid_config_fails_construction() {
    let mut cfg = small_config();
    cfg.scheduler.interval_ms = 300;
    assert!(matches!(Scene::new(cfg), Err(TreeError::InvalidConfig(_))));

    // The state must not settle before its tween has written its last value.
    let mut cfg = small_config();
    cfg.explosion.explode_settle_sec = 0.5;
    assert!(matches!(Scene::new(cfg), Err(TreeError::InvalidConfig(_))));
}

#[test]
fn idle_rotation_advances_every_tick() {
    let mut s = scene();
    let f = s.tick(0.0);
    assert!((f.sculpture_yaw - AUTO_ROTATION_PER_TICK).abs() < 1e-7);
    s.tick(DT);
    assert!((s.yaw() - 2.0 * AUTO_ROTATION_PER_TICK).abs() < 1e-7);
}

#[test]
fn hand_sets_yaw_and_stops_idle_rotation() {
    let mut s = scene();
    s.apply_gesture(Some(&hand(0.75, 2)), 0.0);
    let expected = 0.25 * std::f32::consts::PI * HAND_YAW_SPAN;
    assert!((s.yaw() - expected).abs() < 1e-5);
    assert_eq!(s.status(), StatusSignal::RotatingByHand);
    s.tick(0.0);
    s.tick(DT);
    assert!((s.yaw() - expected).abs() < 1e-5, "idle rotation is suppressed");

    s.apply_gesture(None, 2.0 * DT);
    assert!(!s.hand_active());
    assert_eq!(s.status(), StatusSignal::IdleRotating);
    s.tick(2.0 * DT);
    assert!((s.yaw() - (expected + AUTO_ROTATION_PER_TICK)).abs() < 1e-5);
}

#[test]
fn nudge_eases_then_hands_back_to_idle() {
    let mut s = scene();
    assert!(s.nudge_yaw(YAW_NUDGE_RADIANS, 0.0));
    s.tick(0.2);
    assert!((s.yaw() - 0.525).abs() < 1e-4, "yaw {}", s.yaw());
    s.tick(1.0);
    assert!((s.yaw() - (0.6 + AUTO_ROTATION_PER_TICK)).abs() < 1e-5);
}

#[test]
fn hand_overrides_nudges() {
    let mut s = scene();
    s.nudge_yaw(1.0, 0.0);
    assert!(s.tweens().is_active(TweenTarget::SculptureYaw));
    s.apply_gesture(Some(&hand(0.5, 1)), 0.1);
    assert!(!s.tweens().is_active(TweenTarget::SculptureYaw));
    assert!(!s.nudge_yaw(1.0, 0.1), "nudges are ignored while a hand steers");
    s.tick(0.2);
    assert!(s.yaw().abs() < 1e-6);
}

#[test]
fn gestures_drive_a_full_explode_contract_cycle() {
    let mut s = scene();
    s.apply_gesture(Some(&hand(0.5, 4)), 0.0);
    assert_eq!(s.explosion_state(), ExplosionState::Exploding);
    assert_eq!(s.status(), StatusSignal::ExplodeRequested);

    // A fist mid-explosion is reported but not honoured.
    let t = run(&mut s, 0.0, 0.5);
    s.apply_gesture(Some(&hand(0.5, 0)), t);
    assert_eq!(s.explosion_state(), ExplosionState::Exploding);
    assert_eq!(s.status(), StatusSignal::ContractRequested);

    let t = run(&mut s, t, 1.7);
    assert_eq!(s.explosion_state(), ExplosionState::Exploded);
    assert!((s.explosion().progress() - 1.0).abs() < 1e-6);

    s.apply_gesture(Some(&hand(0.5, 0)), t);
    assert_eq!(s.explosion_state(), ExplosionState::Contracting);
    let end = run(&mut s, t, t + 2.2);
    assert_eq!(s.explosion_state(), ExplosionState::Normal);
    assert_eq!(s.explosion().progress(), 0.0);
    for obj in s.objects() {
        if obj.kind != ObjectKind::Star {
            assert!(obj.is_at_rest(1e-5), "{:?} not home at {end}", obj.kind);
        }
    }
    assert_eq!(s.star().points, STAR_POINTS);
    let star = s.objects().iter().find(|o| o.kind == ObjectKind::Star).expect("star");
    assert!(star.position.abs_diff_eq(star.original_position(), 1e-5));
}

#[test]
fn camera_unavailable_forces_idle() {
    let mut s = scene();
    s.apply_gesture(Some(&hand(0.9, 2)), 0.0);
    s.set_camera_status(StatusSignal::CameraReady);
    assert_eq!(s.status(), StatusSignal::RotatingByHand, "a live hand keeps its status");

    let yaw = s.yaw();
    s.set_camera_status(StatusSignal::CameraUnavailable);
    assert!(!s.hand_active());
    assert_eq!(s.status(), StatusSignal::CameraUnavailable);
    s.tick(0.0);
    assert!((s.yaw() - (yaw + AUTO_ROTATION_PER_TICK)).abs() < 1e-5);
}

#[test]
fn star_spins_and_ornaments_breathe() {
    let mut s = scene();
    for i in 0..3 {
        s.tick(0.25 + i as f64 * DT);
    }
    let star = s.objects().iter().find(|o| o.kind == ObjectKind::Star).expect("star");
    assert!((star.rotation.y - 3.0 * STAR_SPIN_PER_TICK).abs() < 1e-6);

    let t = 0.25 + 2.0 * DT;
    for (i, orn) in s.ornaments().enumerate() {
        assert!((orn.glow - ornament_glow(t, i)).abs() < 1e-5);
        assert!((0.0..=4.0).contains(&orn.glow));
    }
}

#[test]
fn snow_spins_but_never_explodes() {
    let mut s = scene();
    let before = s.snow().positions().to_vec();
    s.explode(0.0);
    run(&mut s, 0.0, 1.0);
    assert_eq!(s.snow().positions(), before.as_slice());
    assert!(s.snow().rotation_y > 0.0);
}

#[test]
fn shader_mode_leaves_rendered_positions_alone() {
    let mut s = scene();
    s.explode(0.0);
    let f = s.tick(0.75);
    assert!(f.explosion > 0.0);
    assert_eq!(f.shader_displacement, f.explosion);
    let buf = &s.buffers()[0];
    assert_eq!(buf.rendered_positions(), buf.positions());
}

#[test]
fn cpu_mode_displaces_on_the_host() {
    let mut cfg = small_config();
    cfg.displacement = DisplacementMode::Cpu;
    let mut s = Scene::new(cfg).expect("valid config");
    s.explode(0.0);
    let f = s.tick(0.75);
    assert_eq!(f.shader_displacement, 0.0);
    assert!(f.explosion > 0.0);
    let buf = &s.buffers()[0];
    for i in 0..buf.len() {
        let want = buf.displaced(i, f.explosion, f.explosion_scale);
        assert!(buf.rendered_position(i).abs_diff_eq(want, 1e-4));
    }
}

#[test]
fn frame_loop_calls_camera_then_render_each_tick() {
    let mut s = scene();
    let mut frames = FrameLoop::new();
    let mut renderer = CountingRenderer::default();
    frames.tick_at(0.0, &mut s, &mut renderer);
    let out = frames.tick_at(DT, &mut s, &mut renderer);
    assert_eq!(frames.frames(), 2);
    assert_eq!(renderer.camera_steps, 2);
    assert_eq!(renderer.renders, 2);
    assert_eq!(renderer.last, Some(out));
}

#[test]
fn large_yaw_wraps_and_keeps_advancing() {
    let mut s = scene();
    s.nudge_yaw(1.0e6, 0.0);
    s.tick(1.0);
    let mut prev = s.yaw();
    assert!((0.0..TAU).contains(&prev), "yaw {prev} not wrapped");
    for k in 1..=100 {
        s.tick(1.0 + k as f64 * DT);
        let step = (s.yaw() - prev).rem_euclid(TAU);
        assert!(
            (step - AUTO_ROTATION_PER_TICK).abs() < 1e-5,
            "idle rotation stalled at tick {k}: step {step}"
        );
        prev = s.yaw();
    }
}

#[test]
fn spin_angles_stay_in_one_turn() {
    let mut s = scene();
    let ticks = 4000;
    for k in 0..ticks {
        s.tick(k as f64 * DT);
    }
    let snow = s.snow().rotation_y;
    assert!((0.0..TAU).contains(&snow));
    let want = (ticks as f32 * SNOW_SPIN_PER_TICK).rem_euclid(TAU);
    assert!((snow - want).abs() < 2e-3, "snow {snow} vs {want}");

    let star = s.objects().iter().find(|o| o.kind == ObjectKind::Star).expect("star");
    assert!((0.0..TAU).contains(&star.rotation.y));
    let want = (ticks as f64 * STAR_SPIN_PER_TICK as f64).rem_euclid(std::f64::consts::TAU) as f32;
    assert!((star.rotation.y - want).abs() < 2e-3, "star {} vs {want}", star.rotation.y);

    assert!((0.0..TAU).contains(&s.yaw()));
}

#[test]
fn twinkle_and_sway_stay_precise_on_a_long_clock() {
    let mut s = scene();
    // Roughly 116 days of uptime.
    let t = 1.0e7 + 0.123;
    let f = s.tick(t);
    assert!((0.0..TAU).contains(&f.sway_phase));
    for (i, orn) in s.ornaments().enumerate() {
        let want = ORNAMENT_GLOW_BASE as f64
            + ORNAMENT_GLOW_AMPLITUDE as f64 * (t * ORNAMENT_GLOW_RATE as f64 + i as f64).sin();
        assert!((orn.glow as f64 - want).abs() < 1e-3, "glow {} vs {want}", orn.glow);
    }
}
