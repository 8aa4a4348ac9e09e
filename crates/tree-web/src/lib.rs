#![cfg(target_arch = "wasm32")]
//! Browser front-end.
//!
//! The sculpture renders and idles from page load. Music and hand tracking
//! wait for the start button unless `TREE_START=eager` is in the query string.
//! An external hand detector feeds frames through [`push_hand_landmarks`] /
//! [`push_no_hand`] and reports its lifecycle through [`report_camera`].

mod audio;
mod dom;

use audio::WebAudio;
use std::cell::RefCell;
use std::rc::Rc;
use tree_core::{
    FrameLoop, HandLandmarks, SampleSlot, Scene, StartPolicy, StatusSignal, TreeConfig,
    YAW_NUDGE_RADIANS,
};
use tree_render::TreeRenderer;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

/// Frames and status pushed from JS, drained once per animation frame.
#[derive(Default)]
struct Mailbox {
    slot: SampleSlot,
    camera: Option<StatusSignal>,
}

thread_local! {
    static MAILBOX: RefCell<Mailbox> = RefCell::new(Mailbox::default());
}

/// Latest hand from the detector, as a flat `x,y,z` (63) or `x,y` (42) array
/// in normalised image coordinates.
#[wasm_bindgen]
pub fn push_hand_landmarks(values: &[f32]) -> Result<(), JsValue> {
    let hand = HandLandmarks::from_flat(values).map_err(|e| JsValue::from_str(&e.to_string()))?;
    MAILBOX.with(|m| m.borrow_mut().slot.offer(Some(hand)));
    Ok(())
}

/// The detector ran but saw no hand.
#[wasm_bindgen]
pub fn push_no_hand() {
    MAILBOX.with(|m| m.borrow_mut().slot.offer(None));
}

/// Detector lifecycle: `awaiting-camera-permission`, `camera-ready` or
/// `camera-unavailable`.
#[wasm_bindgen]
pub fn report_camera(status: &str) -> Result<(), JsValue> {
    let signal: StatusSignal = status.parse().map_err(|e: tree_core::TreeError| JsValue::from_str(&e.to_string()))?;
    if !signal.is_camera_status() {
        return Err(JsValue::from_str(&format!("{signal} is not a camera status")));
    }
    match signal {
        StatusSignal::CameraUnavailable => log::warn!("[camera] unavailable; idle rotation only"),
        other => log::info!("[camera] {other}"),
    }
    MAILBOX.with(|m| m.borrow_mut().camera = Some(signal));
    Ok(())
}

struct WebApp {
    window: web::Window,
    document: web::Document,
    canvas: web::HtmlCanvasElement,
    scene: Scene,
    frame_loop: FrameLoop,
    renderer: TreeRenderer<'static>,
    audio: Option<Rc<RefCell<WebAudio>>>,
    audio_failed: bool,
    tracking_requested: bool,
    shown_status: Option<StatusSignal>,
}

impl WebApp {
    /// Start (or resume) audio and ask the detector for the camera. Safe to
    /// call any number of times.
    fn activate(&mut self) {
        match &self.audio {
            Some(audio) => {
                audio.borrow().resume_if_suspended();
            }
            None => match WebAudio::new(self.scene.config()) {
                Ok(mut audio) => {
                    audio.start();
                    let audio = Rc::new(RefCell::new(audio));
                    arm_scheduler(&self.window, Rc::clone(&audio));
                    self.audio = Some(audio);
                }
                Err(e) => {
                    log::warn!("[audio] disabled: {e}");
                    self.audio_failed = true;
                }
            },
        }
        if !self.tracking_requested {
            self.tracking_requested = true;
            dom::hide_overlay(&self.document);
            self.scene
                .set_camera_status(StatusSignal::AwaitingCameraPermission);
            dom::dispatch_window_event(&self.window, dom::START_TRACKING_EVENT);
        }
    }

    fn frame(&mut self) {
        let (sample, camera) = MAILBOX.with(|m| {
            let mut m = m.borrow_mut();
            (m.slot.take(), m.camera.take())
        });
        if let Some(status) = camera {
            self.scene.set_camera_status(status);
        }
        if let Some(sample) = sample {
            // The first hand also starts the music.
            if sample.is_some() && self.audio.is_none() && !self.audio_failed {
                self.activate();
            }
            let now = self.frame_loop.now_sec();
            self.scene.apply_gesture(sample.as_ref(), now);
        }

        self.renderer
            .resize(self.canvas.width(), self.canvas.height());
        self.frame_loop.tick(&mut self.scene, &mut self.renderer);

        let status = self.scene.status();
        if self.shown_status != Some(status) {
            dom::set_status(&self.document, status.as_str(), status.message());
            self.shown_status = Some(status);
        }
    }

    fn on_key(&mut self, ev: &web::KeyboardEvent) {
        let now = self.frame_loop.now_sec();
        match ev.key().as_str() {
            "ArrowLeft" => {
                self.scene.nudge_yaw(-YAW_NUDGE_RADIANS, now);
            }
            "ArrowRight" => {
                self.scene.nudge_yaw(YAW_NUDGE_RADIANS, now);
            }
            " " | "Enter" => self.activate(),
            _ => {}
        }
    }
}

/// Pump the scheduler now and every `interval_ms` after, via `setTimeout`.
fn arm_scheduler(window: &web::Window, audio: Rc<RefCell<WebAudio>>) {
    let pump: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let pump_clone = pump.clone();
    let window_clone = window.clone();
    *pump.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        let delay = {
            let mut a = audio.borrow_mut();
            a.pump();
            a.interval_ms()
        };
        if let Some(cb) = pump_clone.borrow().as_ref() {
            let _ = window_clone
                .set_timeout_with_callback_and_timeout_and_arguments_0(cb.as_ref().unchecked_ref(), delay);
        }
    }) as Box<dyn FnMut()>));
    if let Some(cb) = pump.borrow().as_ref() {
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(cb.as_ref().unchecked_ref(), 0);
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("tree-web starting");

    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("init error: {:?}", e);
        }
    });
    Ok(())
}

async fn init() -> anyhow::Result<()> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| anyhow::anyhow!("no document"))?;
    let canvas: web::HtmlCanvasElement = document
        .get_element_by_id(dom::CANVAS_ID)
        .ok_or_else(|| anyhow::anyhow!("missing #{}", dom::CANVAS_ID))?
        .dyn_into::<web::HtmlCanvasElement>()
        .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;
    dom::track_canvas_size(&window, &canvas);

    let config = TreeConfig::default().with_overrides(dom::query_lookup(&window));
    let policy = config.start_policy;
    let scene = Scene::new(config)?;

    let instance = wgpu::Instance::default();
    let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))?;
    let renderer = TreeRenderer::new(&instance, surface, canvas.width(), canvas.height(), &scene).await?;

    let app = Rc::new(RefCell::new(WebApp {
        window: window.clone(),
        document: document.clone(),
        canvas,
        scene,
        frame_loop: FrameLoop::new(),
        renderer,
        audio: None,
        audio_failed: false,
        tracking_requested: false,
        shown_status: None,
    }));

    {
        let app = app.clone();
        dom::add_click_listener(&document, dom::START_BUTTON_ID, move || {
            app.borrow_mut().activate();
        });
    }
    {
        let app = app.clone();
        dom::add_keydown_listener(&window, move |ev| app.borrow_mut().on_key(&ev));
    }
    if policy == StartPolicy::Eager {
        app.borrow_mut().activate();
    }

    // Frame loop driven by requestAnimationFrame
    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let tick_clone = tick.clone();
    let window_tick = window.clone();
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        app.borrow_mut().frame();
        if let Some(cb) = tick_clone.borrow().as_ref() {
            let _ = window_tick.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut()>));
    if let Some(cb) = tick.borrow().as_ref() {
        window
            .request_animation_frame(cb.as_ref().unchecked_ref())
            .map_err(|e| anyhow::anyhow!("requestAnimationFrame error: {e:?}"))?;
    }
    Ok(())
}
