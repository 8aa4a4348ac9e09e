use tree_core::{AudioScheduler, AudioSink, MelodyTable, ToneRequest, TreeConfig, Waveform};
use web_sys as web;

fn oscillator_type(waveform: Waveform) -> web::OscillatorType {
    match waveform {
        Waveform::Sine => web::OscillatorType::Sine,
        Waveform::Triangle => web::OscillatorType::Triangle,
    }
}

/// [`AudioSink`] on a WebAudio context: one oscillator and gain envelope per
/// partial, started and stopped on the context clock.
pub struct WebAudioSink {
    ctx: web::AudioContext,
}

impl WebAudioSink {
    pub fn new(ctx: web::AudioContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &web::AudioContext {
        &self.ctx
    }

    fn play_partial(
        &self,
        tone: &ToneRequest,
        ratio: f32,
        waveform: Waveform,
    ) -> Result<(), wasm_bindgen::JsValue> {
        let env = tone.envelope;
        let start = tone.start_time_sec;
        let stop = tone.stop_time_sec();
        let osc = web::OscillatorNode::new(&self.ctx)?;
        osc.set_type(oscillator_type(waveform));
        osc.frequency().set_value(tone.frequency_hz * ratio);
        let gain = web::GainNode::new(&self.ctx)?;
        let g = gain.gain();
        g.set_value_at_time(0.0, start)?;
        g.linear_ramp_to_value_at_time(env.peak_gain, start + env.attack_sec as f64)?;
        g.exponential_ramp_to_value_at_time(env.floor_gain, stop)?;
        osc.connect_with_audio_node(&gain)?;
        gain.connect_with_audio_node(&self.ctx.destination())?;
        osc.start_with_when(start)?;
        osc.stop_with_when(stop)?;
        Ok(())
    }
}

impl AudioSink for WebAudioSink {
    fn current_time(&self) -> f64 {
        self.ctx.current_time()
    }

    fn schedule_tone(&mut self, tone: &ToneRequest) {
        for partial in &tone.partials {
            if let Err(e) = self.play_partial(tone, partial.ratio, partial.waveform) {
                log::warn!("[audio] could not schedule tone: {e:?}");
            }
        }
    }
}

/// The audio context plus the melody scheduler driving it.
pub struct WebAudio {
    sink: WebAudioSink,
    scheduler: AudioScheduler,
}

impl WebAudio {
    pub fn new(config: &TreeConfig) -> anyhow::Result<Self> {
        let ctx = web::AudioContext::new().map_err(|e| anyhow::anyhow!("AudioContext error: {e:?}"))?;
        Ok(Self {
            sink: WebAudioSink::new(ctx),
            scheduler: AudioScheduler::new(MelodyTable::merry_christmas(), config.scheduler, config.envelope),
        })
    }

    /// Start the melody at the context's current time. Idempotent.
    pub fn start(&mut self) -> bool {
        let now = self.sink.current_time();
        self.scheduler.start(now)
    }

    /// One scheduler tick.
    pub fn pump(&mut self) -> usize {
        self.scheduler.pump(&mut self.sink)
    }

    pub fn interval_ms(&self) -> i32 {
        self.scheduler.params().interval_ms as i32
    }

    /// Resume a context the browser created or left suspended. Returns true
    /// if a resume was requested.
    pub fn resume_if_suspended(&self) -> bool {
        let ctx = self.sink.context();
        if ctx.state() != web::AudioContextState::Suspended {
            return false;
        }
        match ctx.resume() {
            Ok(promise) => {
                let promise: js_sys::Promise = promise;
                wasm_bindgen_futures::spawn_local(async move {
                    if let Err(e) = wasm_bindgen_futures::JsFuture::from(promise).await {
                        log::warn!("[audio] resume rejected: {e:?}");
                    }
                });
                log::info!("[audio] resuming suspended context");
                true
            }
            Err(e) => {
                log::warn!("[audio] resume failed: {e:?}");
                false
            }
        }
    }
}
