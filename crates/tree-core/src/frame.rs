use crate::scene::Scene;
use instant::Instant;

/// Per-frame continuous values handed to the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameUniforms {
    /// Seconds since the loop started, wrapped to one wind-sway period.
    pub sway_phase: f32,
    /// Explosion progress in [0, 1].
    pub explosion: f32,
    /// Progress the vertex stage should displace by; zero on the CPU path,
    /// where the rendered positions are already displaced.
    pub shader_displacement: f32,
    pub explosion_scale: f32,
    pub sculpture_yaw: f32,
    pub snow_yaw: f32,
}

/// Render collaborator driven once per display refresh.
pub trait RenderCollaborator {
    /// Advance the orbit camera (damping etc.).
    fn advance_camera(&mut self);
    /// Draw one frame. Failures are the renderer's to log; the loop keeps going.
    fn render(&mut self, scene: &Scene, frame: &FrameUniforms);
}

/// Per-refresh orchestrator. Owns the monotonic clock every scene call uses.
#[derive(Clone, Debug)]
pub struct FrameLoop {
    started: Instant,
    frames: u64,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            frames: 0,
        }
    }

    /// Seconds since the loop was created.
    pub fn now_sec(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn tick(&mut self, scene: &mut Scene, renderer: &mut impl RenderCollaborator) -> FrameUniforms {
        let now = self.now_sec();
        self.tick_at(now, scene, renderer)
    }

    /// One frame at an explicit time: camera, scene state, then render.
    pub fn tick_at(
        &mut self,
        now_sec: f64,
        scene: &mut Scene,
        renderer: &mut impl RenderCollaborator,
    ) -> FrameUniforms {
        renderer.advance_camera();
        let uniforms = scene.tick(now_sec);
        renderer.render(scene, &uniforms);
        self.frames += 1;
        uniforms
    }
}
