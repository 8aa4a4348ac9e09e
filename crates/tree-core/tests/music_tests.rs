// Host-side integration tests for the melody table and look-ahead scheduler.

use tree_core::*;

#[derive(Default)]
struct RecordingSink {
    now: f64,
    tones: Vec<ToneRequest>,
}

impl AudioSink for RecordingSink {
    fn current_time(&self) -> f64 {
        self.now
    }

    fn schedule_tone(&mut self, tone: &ToneRequest) {
        self.tones.push(tone.clone());
    }
}

fn three_note_melody() -> MelodyTable {
    MelodyTable::from_pairs(&[(392.0, 0.4), (523.25, 0.4), (523.25, 0.2)]).expect("valid melody")
}

fn scheduler(melody: MelodyTable) -> AudioScheduler {
    AudioScheduler::new(melody, SchedulerParams::default(), Envelope::default())
}

fn starts(events: &[NoteEvent]) -> Vec<f64> {
    events.iter().map(|e| e.start_time_sec).collect()
}

#[test]
fn midi_to_hz_matches_a4_and_octave() {
    let a4 = midi_to_hz(69.0);
    assert!((a4 - 440.0).abs() < 1e-4);
    let a5 = midi_to_hz(81.0);
    assert!((a5 - 880.0).abs() < 1e-3);
    assert!((a5 / a4 - 2.0).abs() < 1e-4);
}

#[test]
fn midi_to_hz_is_monotonic_over_range() {
    let mut prev = midi_to_hz(20.0);
    for m in 21..=100 {
        let f = midi_to_hz(m as f32);
        assert!(f > prev, "frequency not increasing at midi {m}");
        prev = f;
    }
}

#[test]
fn notes_follow_duration_plus_gap_and_wrap() {
    let mut s = scheduler(three_note_melody());
    let mut events = Vec::new();
    assert!(s.start(0.0));

    s.fill(0.0, &mut events);
    assert_eq!(starts(&events), vec![0.0]);

    s.fill(0.2, &mut events);
    s.fill(0.6, &mut events);
    s.fill(0.9, &mut events);
    let expected = [0.0, 0.42, 0.84, 1.06];
    assert_eq!(events.len(), expected.len());
    for (ev, want) in events.iter().zip(expected) {
        assert!((ev.start_time_sec - want).abs() < 1e-6, "{} vs {want}", ev.start_time_sec);
    }
    let indices: Vec<usize> = events.iter().map(|e| e.note_index).collect();
    assert_eq!(indices, vec![0, 1, 2, 0]);
}

#[test]
fn nothing_is_committed_past_the_lookahead() {
    let mut s = scheduler(MelodyTable::merry_christmas());
    let mut events = Vec::new();
    s.start(3.0);
    for step in 0..200 {
        let now = 3.0 + step as f64 * 0.04;
        events.clear();
        s.fill(now, &mut events);
        let horizon = now + s.params().lookahead_sec;
        assert!(events.iter().all(|e| e.start_time_sec < horizon));
        assert!(s.clock().next_note_time >= horizon);
    }
}

#[test]
fn start_times_never_decrease_and_the_loop_repeats() {
    let melody = MelodyTable::merry_christmas();
    let loop_len = melody.loop_length_sec(SchedulerParams::default().gap_sec);
    let mut s = scheduler(melody);
    let mut events = Vec::new();
    s.start(0.0);
    let mut now = 0.0;
    while now < loop_len * 2.5 {
        s.fill(now, &mut events);
        now += 0.04;
    }
    assert!(events.windows(2).all(|w| w[0].start_time_sec <= w[1].start_time_sec));
    let second_pass = &events[40];
    assert_eq!(second_pass.note_index, 0);
    assert!((second_pass.start_time_sec - loop_len).abs() < 1e-4);
    assert!(events.len() > 80, "scheduling continues past the end of the melody");
}

#[test]
fn late_pump_catches_up_without_shifting_committed_notes() {
    let mut s = scheduler(three_note_melody());
    let mut events = Vec::new();
    s.start(0.0);
    s.fill(0.0, &mut events);
    // A stalled caller comes back two seconds later.
    s.fill(2.0, &mut events);
    assert_eq!(events[0].start_time_sec, 0.0);
    assert!(events.windows(2).all(|w| w[1].start_time_sec > w[0].start_time_sec));
    assert!(events.last().map(|e| e.start_time_sec).unwrap_or(0.0) < 2.25);
}

#[test]
fn start_is_idempotent_and_restart_keeps_position() {
    let mut s = scheduler(three_note_melody());
    let mut events = Vec::new();
    assert!(s.start(0.0));
    assert!(!s.start(5.0), "second start while playing is ignored");
    assert_eq!(s.clock().next_note_time, 0.0);

    s.fill(0.5, &mut events);
    let clock = s.clock();
    s.stop();
    assert!(!s.is_playing());
    assert_eq!(s.fill(10.0, &mut events), 0, "stopped scheduler commits nothing");

    assert!(s.start(10.0));
    assert_eq!(s.clock().note_index, clock.note_index);
    assert_eq!(s.clock().next_note_time, 10.0);

    // Restarting earlier than the committed clock never rewinds it.
    s.stop();
    let before = s.clock().next_note_time;
    s.start(1.0);
    assert_eq!(s.clock().next_note_time, before);
}

#[test]
fn stopped_scheduler_is_inert() {
    let mut s = scheduler(three_note_melody());
    let mut events = Vec::new();
    assert_eq!(s.fill(0.0, &mut events), 0);
    assert!(events.is_empty());
}

#[test]
fn pump_sends_bell_tones_on_the_sink_clock() {
    let mut s = scheduler(three_note_melody());
    let mut sink = RecordingSink {
        now: 7.0,
        ..Default::default()
    };
    s.start(sink.current_time());
    assert_eq!(s.pump(&mut sink), 1);
    sink.now = 7.3;
    assert_eq!(s.pump(&mut sink), 1);
    assert_eq!(sink.tones.len(), 2);
    let tone = &sink.tones[1];
    assert!((tone.start_time_sec - 7.42).abs() < 1e-6);
    assert_eq!(tone.partials.len(), 2);
    assert_eq!(tone.partials[0].waveform, Waveform::Sine);
    assert_eq!(tone.partials[1].waveform, Waveform::Triangle);
    assert_eq!(tone.partials[1].ratio, 2.0);
    assert!((tone.stop_time_sec() - (7.42 + 0.6)).abs() < 1e-6);
}

#[test]
fn melody_validation() {
    assert_eq!(MelodyTable::from_pairs(&[]).err(), Some(TreeError::EmptyMelody));
    assert!(matches!(
        MelodyTable::from_pairs(&[(440.0, 0.2), (0.0, 0.4)]),
        Err(TreeError::InvalidNote { index: 1, .. })
    ));
    assert!(matches!(
        MelodyTable::from_pairs(&[(440.0, -0.2)]),
        Err(TreeError::InvalidNote { index: 0, .. })
    ));
}

#[test]
fn merry_christmas_stays_between_g4_and_f5() {
    let melody = MelodyTable::merry_christmas();
    assert_eq!(melody.len(), 40);
    let lo = midi_to_hz(67.0) - 1e-3;
    let hi = midi_to_hz(77.0) + 1e-3;
    for i in 0..melody.len() {
        let note = melody.note(i);
        assert!(note.frequency_hz >= lo && note.frequency_hz <= hi);
        assert!(note.duration_sec > 0.0);
    }
    assert_eq!(melody.note(40), melody.note(0), "indexing wraps");
}
