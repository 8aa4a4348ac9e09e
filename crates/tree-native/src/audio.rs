// ---------------- Native audio (cpal) ----------------
//
// The output stream owns a sample counter that doubles as the audio clock.
// A scheduler thread pumps the look-ahead scheduler against that clock every
// `interval_ms`, independent of rendering.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use smallvec::SmallVec;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;
use tree_core::{AudioScheduler, AudioSink, Envelope, Partial, ToneRequest};

use std::f32::consts::TAU;

/// One scheduled tone being rendered sample by sample.
#[derive(Clone, Debug)]
pub struct SynthVoice {
    partials: SmallVec<[Partial; 2]>,
    phases: SmallVec<[f32; 2]>,
    frequency_hz: f32,
    start_sample: u64,
    end_sample: u64,
    duration_sec: f32,
    envelope: Envelope,
}

impl SynthVoice {
    fn from_tone(tone: &ToneRequest, sample_rate: f32) -> Self {
        let sr = sample_rate as f64;
        let start_sample = (tone.start_time_sec * sr).round().max(0.0) as u64;
        let end_sample = (tone.stop_time_sec() * sr).round().max(0.0) as u64;
        Self {
            partials: tone.partials.clone(),
            phases: tone.partials.iter().map(|_| 0.0).collect(),
            frequency_hz: tone.frequency_hz,
            start_sample,
            end_sample: end_sample.max(start_sample + 1),
            duration_sec: tone.duration_sec,
            envelope: tone.envelope,
        }
    }
}

/// Synth state shared by the output callback and the scheduler thread.
#[derive(Debug)]
pub struct SynthState {
    sample_rate: f32,
    clock_samples: u64,
    voices: Vec<SynthVoice>,
}

impl SynthState {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            clock_samples: 0,
            voices: Vec::new(),
        }
    }

    pub fn now_sec(&self) -> f64 {
        self.clock_samples as f64 / self.sample_rate as f64
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn schedule(&mut self, tone: &ToneRequest) {
        self.voices.push(SynthVoice::from_tone(tone, self.sample_rate));
    }

    /// Render one mono sample and advance the clock. Voices not yet due stay
    /// silent; finished voices are dropped.
    pub fn next_sample(&mut self) -> f32 {
        let now = self.clock_samples;
        let sr = self.sample_rate;
        let mut out = 0.0f32;
        let mut i = 0usize;
        while i < self.voices.len() {
            let voice = &mut self.voices[i];
            if now >= voice.end_sample {
                self.voices.swap_remove(i);
                continue;
            }
            if now >= voice.start_sample {
                let t = (now - voice.start_sample) as f32 / sr;
                let gain = voice.envelope.gain_at(t, voice.duration_sec);
                for (partial, phase) in voice.partials.iter().zip(voice.phases.iter_mut()) {
                    out += partial.waveform.sample(*phase) * gain;
                    *phase += TAU * voice.frequency_hz * partial.ratio / sr;
                    if *phase > TAU {
                        *phase -= TAU;
                    }
                }
            }
            i += 1;
        }
        self.clock_samples += 1;
        out.tanh()
    }
}

fn lock(state: &Mutex<SynthState>) -> MutexGuard<'_, SynthState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// [`AudioSink`] backed by the shared synth state.
#[derive(Clone)]
pub struct CpalSink {
    state: Arc<Mutex<SynthState>>,
}

impl CpalSink {
    pub fn new(state: Arc<Mutex<SynthState>>) -> Self {
        Self { state }
    }
}

impl AudioSink for CpalSink {
    fn current_time(&self) -> f64 {
        lock(&self.state).now_sec()
    }

    fn schedule_tone(&mut self, tone: &ToneRequest) {
        lock(&self.state).schedule(tone);
    }
}

/// Output stream plus the scheduler thread feeding it.
pub struct NativeAudio {
    _stream: cpal::Stream,
    sink: CpalSink,
    scheduler: Arc<Mutex<AudioScheduler>>,
    shutdown: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl NativeAudio {
    /// Open the default output device. The scheduler thread runs from here
    /// on but commits nothing until [`NativeAudio::start`].
    pub fn new(scheduler: AudioScheduler) -> anyhow::Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow::anyhow!("No audio output device"))?;
        let config = device.default_output_config()?;
        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;
        let state = Arc::new(Mutex::new(SynthState::new(sample_rate)));

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config.into(), channels, Arc::clone(&state))?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config.into(), channels, Arc::clone(&state))?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config.into(), channels, Arc::clone(&state))?,
            other => anyhow::bail!("Unsupported sample format {other:?}"),
        };
        stream.play()?;
        log::info!("[audio] output at {sample_rate} Hz, {channels} channels");

        let interval = Duration::from_millis(scheduler.params().interval_ms as u64);
        let scheduler = Arc::new(Mutex::new(scheduler));
        let shutdown = Arc::new(AtomicBool::new(false));
        let sink = CpalSink::new(state);
        let worker = {
            let scheduler = Arc::clone(&scheduler);
            let shutdown = Arc::clone(&shutdown);
            let mut sink = sink.clone();
            thread::Builder::new()
                .name("melody-scheduler".into())
                .spawn(move || {
                    while !shutdown.load(Ordering::Relaxed) {
                        scheduler
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .pump(&mut sink);
                        thread::sleep(interval);
                    }
                })?
        };

        Ok(Self {
            _stream: stream,
            sink,
            scheduler,
            shutdown,
            worker: Some(worker),
        })
    }

    /// Begin the melody on the audio clock. Repeated calls are no-ops.
    pub fn start(&self) -> bool {
        let now = self.sink.current_time();
        self.scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .start(now)
    }
}

impl Drop for NativeAudio {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    state: Arc<Mutex<SynthState>>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    device.build_output_stream(
        config,
        move |data: &mut [T], _| {
            let mut guard = lock(&state);
            for frame in data.chunks_mut(channels.max(1)) {
                let value = T::from_sample(guard.next_sample());
                for out in frame.iter_mut() {
                    *out = value;
                }
            }
        },
        |err| log::error!("[audio] stream error: {err}"),
        None,
    )
}
