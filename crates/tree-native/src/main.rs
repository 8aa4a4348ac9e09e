mod audio;
mod input;

use std::sync::Arc;
use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::*,
    event_loop::{ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowBuilder},
};

use audio::NativeAudio;
use input::SyntheticHand;
use tree_core::{
    AudioScheduler, FrameLoop, MelodyTable, SampleSlot, Scene, StartPolicy, StatusSignal,
    TreeConfig, YAW_NUDGE_RADIANS,
};
use tree_render::TreeRenderer;

const ORBIT_RADIANS_PER_PX: f32 = 0.005;
const ZOOM_PER_LINE: f32 = 0.9;

struct App {
    window: Arc<Window>,
    scene: Scene,
    frame_loop: FrameLoop,
    renderer: TreeRenderer<'static>,
    audio: Option<NativeAudio>,
    hand: SyntheticHand,
    slot: SampleSlot,
    started: bool,
    shown_status: Option<StatusSignal>,
    cursor: PhysicalPosition<f64>,
    orbit_from: Option<PhysicalPosition<f64>>,
}

impl App {
    /// Begin tracking and music. Only the first call has an effect.
    fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        if let Some(audio) = &self.audio {
            audio.start();
        }
        self.scene.set_camera_status(StatusSignal::CameraReady);
        log::info!("[app] started; hold the left button to show a hand");
    }

    fn frame(&mut self) {
        if self.started {
            self.slot.offer(self.hand.sample());
        }
        if let Some(sample) = self.slot.take() {
            let now = self.frame_loop.now_sec();
            self.scene.apply_gesture(sample.as_ref(), now);
        }
        self.frame_loop.tick(&mut self.scene, &mut self.renderer);

        let status = self.scene.status();
        if self.shown_status != Some(status) {
            self.window
                .set_title(&format!("Particle Tree - {}", status.message()));
            self.shown_status = Some(status);
        }
    }

    fn on_key(&mut self, key: &Key) {
        match key {
            Key::Named(NamedKey::Space) | Key::Named(NamedKey::Enter) => self.start(),
            Key::Named(NamedKey::ArrowLeft) => {
                let now = self.frame_loop.now_sec();
                self.scene.nudge_yaw(-YAW_NUDGE_RADIANS, now);
            }
            Key::Named(NamedKey::ArrowRight) => {
                let now = self.frame_loop.now_sec();
                self.scene.nudge_yaw(YAW_NUDGE_RADIANS, now);
            }
            Key::Character(c) => {
                if let Some(n) = c.chars().next().and_then(|ch| ch.to_digit(10)) {
                    self.hand.set_extended(n as u8);
                }
            }
            _ => {}
        }
    }

    fn on_cursor(&mut self, position: PhysicalPosition<f64>) {
        self.cursor = position;
        self.hand.set_cursor(position.x, self.renderer.size().0);
        if let Some(from) = self.orbit_from {
            let dx = (position.x - from.x) as f32;
            let dy = (position.y - from.y) as f32;
            self.renderer
                .camera_mut()
                .orbit(-dx * ORBIT_RADIANS_PER_PX, dy * ORBIT_RADIANS_PER_PX);
            self.orbit_from = Some(position);
        }
    }

    fn on_button(&mut self, button: MouseButton, state: ElementState) {
        let pressed = state == ElementState::Pressed;
        match button {
            MouseButton::Left => {
                if pressed {
                    self.start();
                }
                self.hand.set_visible(pressed);
            }
            MouseButton::Right => {
                self.orbit_from = pressed.then_some(self.cursor);
            }
            _ => {}
        }
    }

    fn on_wheel(&mut self, delta: MouseScrollDelta) {
        let lines = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(p) => (p.y / 40.0) as f32,
        };
        self.renderer.camera_mut().zoom(ZOOM_PER_LINE.powf(lines));
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = TreeConfig::default().with_overrides(|key| std::env::var(key).ok());
    let policy = config.start_policy;
    let scheduler = AudioScheduler::new(MelodyTable::merry_christmas(), config.scheduler, config.envelope);
    let scene = Scene::new(config)?;

    // Silence is acceptable; the sculpture runs without an output device.
    let audio = match NativeAudio::new(scheduler) {
        Ok(a) => Some(a),
        Err(e) => {
            log::warn!("[audio] disabled: {e}");
            None
        }
    };

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Particle Tree")
            .with_inner_size(LogicalSize::new(1280.0, 800.0))
            .build(&event_loop)?,
    );
    let size = window.inner_size();
    let instance = wgpu::Instance::default();
    let surface = instance.create_surface(Arc::clone(&window))?;
    let renderer = pollster::block_on(TreeRenderer::new(&instance, surface, size.width, size.height, &scene))?;

    let mut app = App {
        window,
        scene,
        frame_loop: FrameLoop::new(),
        renderer,
        audio,
        hand: SyntheticHand::default(),
        slot: SampleSlot::default(),
        started: false,
        shown_status: None,
        cursor: PhysicalPosition::new(0.0, 0.0),
        orbit_from: None,
    };
    if policy == StartPolicy::Eager {
        app.start();
    } else {
        log::info!("[app] press Space or click to start music and hand input");
    }

    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::Resized(size) => app.renderer.resize(size.width, size.height),
            WindowEvent::CloseRequested => elwt.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if logical_key == Key::Named(NamedKey::Escape) {
                    elwt.exit();
                } else {
                    app.on_key(&logical_key);
                }
            }
            WindowEvent::CursorMoved { position, .. } => app.on_cursor(position),
            WindowEvent::MouseInput { state, button, .. } => app.on_button(button, state),
            WindowEvent::MouseWheel { delta, .. } => app.on_wheel(delta),
            _ => {}
        },
        Event::AboutToWait => {
            app.frame();
            if app.renderer.is_fatal() {
                elwt.exit();
            } else {
                app.window.request_redraw();
            }
        }
        _ => {}
    })?;
    Ok(())
}
