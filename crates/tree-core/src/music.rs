use crate::config::SchedulerParams;
use crate::error::{Result, TreeError};
use smallvec::{smallvec, SmallVec};
use std::f32::consts::PI;

/// Oscillator shapes layered into the bell timbre.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
}

impl Waveform {
    /// One sample at `phase` radians, in [-1, 1].
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => phase.sin(),
            Waveform::Triangle => {
                let t = phase / (2.0 * PI);
                let frac = t - t.floor();
                1.0 - 4.0 * (frac - 0.5).abs()
            }
        }
    }
}

/// One melody entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Note {
    pub frequency_hz: f32,
    pub duration_sec: f32,
}

/// Fixed, read-only melody, indexed circularly.
#[derive(Clone, Debug, PartialEq)]
pub struct MelodyTable {
    notes: Vec<Note>,
}

impl MelodyTable {
    pub fn new(notes: Vec<Note>) -> Result<Self> {
        if notes.is_empty() {
            return Err(TreeError::EmptyMelody);
        }
        for (index, n) in notes.iter().enumerate() {
            let ok = n.frequency_hz.is_finite()
                && n.frequency_hz > 0.0
                && n.duration_sec.is_finite()
                && n.duration_sec > 0.0;
            if !ok {
                return Err(TreeError::InvalidNote {
                    index,
                    frequency_hz: n.frequency_hz,
                    duration_sec: n.duration_sec,
                });
            }
        }
        Ok(Self { notes })
    }

    /// Build from `(frequency_hz, duration_sec)` pairs.
    pub fn from_pairs(pairs: &[(f32, f32)]) -> Result<Self> {
        Self::new(
            pairs
                .iter()
                .map(|&(frequency_hz, duration_sec)| Note {
                    frequency_hz,
                    duration_sec,
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    #[inline]
    pub fn note(&self, index: usize) -> Note {
        self.notes[index % self.notes.len()]
    }

    /// Sum of note durations plus one gap per note.
    pub fn loop_length_sec(&self, gap_sec: f64) -> f64 {
        self.notes
            .iter()
            .map(|n| n.duration_sec as f64 + gap_sec)
            .sum()
    }

    /// "We Wish You a Merry Christmas".
    pub fn merry_christmas() -> Self {
        const G4: i32 = 67;
        const A4: i32 = 69;
        const B4: i32 = 71;
        const C5: i32 = 72;
        const D5: i32 = 74;
        const E5: i32 = 76;
        const F5: i32 = 77;
        const Q: f32 = 0.4;
        const E: f32 = 0.2;
        const H: f32 = 0.8;
        let score: [(i32, f32); 40] = [
            (G4, Q), (C5, Q), (C5, E), (D5, E), (C5, E), (B4, E), (A4, Q), (A4, Q),
            (A4, Q), (D5, Q), (D5, E), (E5, E), (D5, E), (C5, E), (B4, Q), (G4, Q),
            (G4, Q), (E5, Q), (E5, E), (F5, E), (E5, E), (D5, E), (C5, Q), (A4, Q),
            (G4, E), (G4, E), (A4, Q), (D5, Q), (B4, Q), (C5, H),
            (G4, Q), (C5, Q), (C5, Q), (C5, Q), (B4, H),
            (B4, Q), (C5, Q), (B4, Q), (A4, Q), (G4, H),
        ];
        Self {
            notes: score
                .iter()
                .map(|&(midi, duration_sec)| Note {
                    frequency_hz: midi_to_hz(midi as f32),
                    duration_sec,
                })
                .collect(),
        }
    }
}

/// A note committed to the audio clock.
///
/// Fields:
/// - `note_index`: position in the melody this event came from
/// - `frequency_hz`: fundamental pitch in Hertz
/// - `start_time_sec`: absolute start time on the audio clock
/// - `duration_sec`: nominal duration (the envelope rings past it)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NoteEvent {
    pub note_index: usize,
    pub frequency_hz: f32,
    pub start_time_sec: f64,
    pub duration_sec: f32,
}

/// Amplitude envelope: linear attack to `peak_gain`, then an exponential decay
/// reaching `floor_gain` at `decay_factor * duration` after the note start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    pub attack_sec: f32,
    pub peak_gain: f32,
    pub decay_factor: f32,
    pub floor_gain: f32,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            attack_sec: 0.02,
            peak_gain: 0.12,
            decay_factor: 1.5,
            floor_gain: 0.0001,
        }
    }
}

impl Envelope {
    pub fn validate(&self) -> Result<()> {
        let ok = self.attack_sec > 0.0
            && self.peak_gain > 0.0
            && self.decay_factor >= 1.0
            && self.floor_gain > 0.0
            && self.floor_gain < self.peak_gain;
        if ok {
            Ok(())
        } else {
            Err(TreeError::InvalidConfig(format!(
                "envelope out of range: {self:?}"
            )))
        }
    }

    /// Time from note start until the tone is released.
    #[inline]
    pub fn release_after(&self, duration_sec: f32) -> f32 {
        (duration_sec * self.decay_factor).max(self.attack_sec * 2.0)
    }

    /// Gain `t` seconds after the note starts. Zero outside the note's life.
    pub fn gain_at(&self, t: f32, duration_sec: f32) -> f32 {
        let end = self.release_after(duration_sec);
        if t < 0.0 || t >= end {
            return 0.0;
        }
        if t < self.attack_sec {
            return self.peak_gain * (t / self.attack_sec);
        }
        let k = (t - self.attack_sec) / (end - self.attack_sec);
        self.peak_gain * (self.floor_gain / self.peak_gain).powf(k)
    }
}

/// One oscillator layered into a tone, at `ratio` times the fundamental.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Partial {
    pub ratio: f32,
    pub waveform: Waveform,
}

/// A fully described tone for an audio output to play.
#[derive(Clone, Debug, PartialEq)]
pub struct ToneRequest {
    pub frequency_hz: f32,
    pub start_time_sec: f64,
    pub duration_sec: f32,
    pub partials: SmallVec<[Partial; 2]>,
    pub envelope: Envelope,
}

impl ToneRequest {
    /// Bell/music-box timbre: sine fundamental plus a triangle an octave up.
    pub fn bell(event: &NoteEvent, envelope: Envelope) -> Self {
        Self {
            frequency_hz: event.frequency_hz,
            start_time_sec: event.start_time_sec,
            duration_sec: event.duration_sec,
            partials: smallvec![
                Partial {
                    ratio: 1.0,
                    waveform: Waveform::Sine,
                },
                Partial {
                    ratio: 2.0,
                    waveform: Waveform::Triangle,
                },
            ],
            envelope,
        }
    }

    pub fn stop_time_sec(&self) -> f64 {
        self.start_time_sec + self.envelope.release_after(self.duration_sec) as f64
    }
}

/// Audio-output collaborator: a monotonic clock plus scheduled tones.
pub trait AudioSink {
    /// Current time on the output's own clock, in seconds.
    fn current_time(&self) -> f64;
    /// Schedule a tone; `tone.start_time_sec` is on the same clock.
    fn schedule_tone(&mut self, tone: &ToneRequest);
}

/// Scheduler clock state. Only [`AudioScheduler`] mutates it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SchedulerClock {
    pub next_note_time: f64,
    pub note_index: usize,
    pub playing: bool,
}

/// Look-ahead melody scheduler.
///
/// Every time it is pumped, all notes whose start falls inside
/// `[clock, now + lookahead)` are committed to the audio clock. Once committed,
/// a note's start time is fixed, so stalls on the caller's thread cannot cause
/// drift as long as the pump runs at least once per lookahead window. The
/// caller re-arms the pump every `params.interval_ms`, independently of the
/// render cadence.
#[derive(Clone, Debug)]
pub struct AudioScheduler {
    melody: MelodyTable,
    clock: SchedulerClock,
    params: SchedulerParams,
    envelope: Envelope,
    scratch: Vec<NoteEvent>,
}

impl AudioScheduler {
    pub fn new(melody: MelodyTable, params: SchedulerParams, envelope: Envelope) -> Self {
        Self {
            melody,
            clock: SchedulerClock::default(),
            params,
            envelope,
            scratch: Vec::new(),
        }
    }

    pub fn clock(&self) -> SchedulerClock {
        self.clock
    }

    pub fn params(&self) -> SchedulerParams {
        self.params
    }

    pub fn melody(&self) -> &MelodyTable {
        &self.melody
    }

    pub fn is_playing(&self) -> bool {
        self.clock.playing
    }

    /// Begin (or resume) playback at `now_sec`. Idempotent while playing.
    /// The note index is kept across stop/start, and `next_note_time` never
    /// moves backwards.
    pub fn start(&mut self, now_sec: f64) -> bool {
        if self.clock.playing {
            return false;
        }
        self.clock.next_note_time = self.clock.next_note_time.max(now_sec);
        self.clock.playing = true;
        log::info!(
            "[music] scheduler started at {:.3}s (note {})",
            self.clock.next_note_time,
            self.clock.note_index
        );
        true
    }

    pub fn stop(&mut self) {
        if self.clock.playing {
            self.clock.playing = false;
            log::info!("[music] scheduler stopped");
        }
    }

    /// Commit every note starting before `now_sec + lookahead` to `out`.
    /// Returns the number of notes added. Does nothing when stopped.
    pub fn fill(&mut self, now_sec: f64, out: &mut Vec<NoteEvent>) -> usize {
        if !self.clock.playing {
            return 0;
        }
        let horizon = now_sec + self.params.lookahead_sec;
        let mut added = 0;
        while self.clock.next_note_time < horizon {
            let note = self.melody.note(self.clock.note_index);
            out.push(NoteEvent {
                note_index: self.clock.note_index,
                frequency_hz: note.frequency_hz,
                start_time_sec: self.clock.next_note_time,
                duration_sec: note.duration_sec,
            });
            self.clock.next_note_time += note.duration_sec as f64 + self.params.gap_sec;
            self.clock.note_index = (self.clock.note_index + 1) % self.melody.len();
            added += 1;
        }
        added
    }

    /// One scheduler tick against a live sink: read its clock, fill the
    /// lookahead window and hand each note to the sink as a bell tone.
    pub fn pump(&mut self, sink: &mut dyn AudioSink) -> usize {
        let now = sink.current_time();
        let mut events = std::mem::take(&mut self.scratch);
        events.clear();
        let n = self.fill(now, &mut events);
        for ev in &events {
            sink.schedule_tone(&ToneRequest::bell(ev, self.envelope));
        }
        if n > 0 {
            log::debug!("[music] committed {n} notes up to {:.3}s", self.clock.next_note_time);
        }
        self.scratch = events;
        n
    }
}

/// Convert a MIDI note number to Hertz (A4=440 Hz).
///
/// Monotonic and exhibits octave symmetry: +12 semitones doubles the frequency.
pub fn midi_to_hz(midi: f32) -> f32 {
    440.0 * (2.0_f32).powf((midi - 69.0) / 12.0)
}
