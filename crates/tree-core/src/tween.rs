//! Scheduled property interpolation.
//!
//! Each active tween is a small record (start, duration, easing, target,
//! endpoints). A single per-tick driver advances all of them and drops the
//! finished ones. Starting a tween on a property replaces whatever tween was
//! already writing it, so two writers never race on one frame.

use glam::Vec3;
use smallvec::SmallVec;

/// Timing curves. Names follow the usual `powerN`/`expo` families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Ease {
    Linear,
    /// Quadratic ease-out (slow end).
    #[default]
    Power1Out,
    /// Cubic ease-out.
    Power2Out,
    /// Exponential ease-in-out (slow start and end).
    ExpoInOut,
}

impl Ease {
    /// Map linear progress `t` in [0, 1] onto the curve. Endpoints are exact.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::Power1Out => 1.0 - (1.0 - t) * (1.0 - t),
            Ease::Power2Out => 1.0 - (1.0 - t).powi(3),
            Ease::ExpoInOut => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else if t < 0.5 {
                    2.0_f32.powf(20.0 * t - 10.0) * 0.5
                } else {
                    (2.0 - 2.0_f32.powf(-20.0 * t + 10.0)) * 0.5
                }
            }
        }
    }
}

/// Property a tween writes. Scalars travel in the `x` lane of a `Vec3`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TweenTarget {
    ExplosionProgress,
    ObjectPosition(usize),
    ObjectRotation(usize),
    SculptureYaw,
}

#[derive(Clone, Debug)]
pub struct Tween {
    pub target: TweenTarget,
    pub from: Vec3,
    pub to: Vec3,
    pub start_sec: f64,
    pub duration_sec: f32,
    pub ease: Ease,
    cancelled: bool,
}

impl Tween {
    /// Eased value at `now_sec`; `to` exactly once the duration has elapsed.
    pub fn value_at(&self, now_sec: f64) -> Vec3 {
        let t = self.progress_at(now_sec);
        if t >= 1.0 {
            return self.to;
        }
        self.from.lerp(self.to, self.ease.apply(t))
    }

    fn progress_at(&self, now_sec: f64) -> f32 {
        if self.duration_sec <= 0.0 {
            return 1.0;
        }
        (((now_sec - self.start_sec) / self.duration_sec as f64).clamp(0.0, 1.0)) as f32
    }

    pub fn is_finished(&self, now_sec: f64) -> bool {
        self.cancelled || self.progress_at(now_sec) >= 1.0
    }
}

/// Cooperative set of running tweens, polled once per frame.
#[derive(Debug, Default)]
pub struct TweenSet {
    active: Vec<Tween>,
}

impl TweenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a tween, cancelling any tween already targeting the same property.
    pub fn start(
        &mut self,
        target: TweenTarget,
        from: Vec3,
        to: Vec3,
        now_sec: f64,
        duration_sec: f32,
        ease: Ease,
    ) {
        self.cancel(target);
        self.active.push(Tween {
            target,
            from,
            to,
            start_sec: now_sec,
            duration_sec,
            ease,
            cancelled: false,
        });
    }

    /// Flag every tween on `target` as cancelled; returns how many were live.
    /// Cancelled tweens never write again and are dropped on the next step.
    pub fn cancel(&mut self, target: TweenTarget) -> usize {
        let mut n = 0;
        for tw in self.active.iter_mut().filter(|t| t.target == target && !t.cancelled) {
            tw.cancelled = true;
            n += 1;
        }
        n
    }

    pub fn is_active(&self, target: TweenTarget) -> bool {
        self.active.iter().any(|t| t.target == target && !t.cancelled)
    }

    pub fn len(&self) -> usize {
        self.active.iter().filter(|t| !t.cancelled).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write every live tween's current value through `apply`, then drop the
    /// finished and cancelled ones. A tween's final value is always written
    /// on the step that completes it.
    pub fn step(&mut self, now_sec: f64, mut apply: impl FnMut(TweenTarget, Vec3)) {
        let mut done: SmallVec<[usize; 16]> = SmallVec::new();
        for (i, tw) in self.active.iter().enumerate() {
            if tw.cancelled {
                done.push(i);
                continue;
            }
            apply(tw.target, tw.value_at(now_sec));
            if tw.is_finished(now_sec) {
                done.push(i);
            }
        }
        for i in done.into_iter().rev() {
            self.active.swap_remove(i);
        }
    }
}
