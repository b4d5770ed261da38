// Real-time playback through the sequencer thread, recorded by a memory transport
// Tolerances are wide: these run on shared CI machines

use modelseq::midi::SentMessage;
use modelseq::{
    MemoryTransport, MessageKind, MidiMessage, NotificationCategory, ParamMap, Parameter,
    PlaybackStatus, Sequencer, Transport, TransportError, Voice, keys,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const TOLERANCE_MS: i64 = 40;

fn sequencer() -> (Sequencer, Arc<MemoryTransport>) {
    let transport = Arc::new(MemoryTransport::new());
    (Sequencer::new(transport.clone()), transport)
}

fn note_ons(sent: &[SentMessage]) -> Vec<&SentMessage> {
    sent.iter().filter(|s| s.message.is_note_on()).collect()
}

fn gap_ms(a: &SentMessage, b: &SentMessage) -> i64 {
    (b.at - a.at).as_millis() as i64
}

#[test]
fn test_realtime_note_spacing_and_release() {
    let (mut seq, transport) = sequencer();
    for step in [0, 4, 8, 12] {
        seq.pattern(0)
            .track(Voice::T1)
            .trig(step)
            .unwrap()
            .note(keys::A4, 200.0, 120)
            .unwrap();
    }

    seq.play(0).unwrap();
    thread::sleep(Duration::from_millis(2300));
    seq.stop();
    seq.join();

    let sent = transport.sent();
    let ons = note_ons(&sent);
    assert!(ons.len() >= 2, "expected at least two notes, got {}", ons.len());
    for pair in ons.windows(2) {
        let gap = gap_ms(pair[0], pair[1]);
        assert!((gap - 1000).abs() <= TOLERANCE_MS, "note spacing {}ms", gap);
    }

    let on = ons[0];
    let off = sent
        .iter()
        .find(|s| s.message == MidiMessage::note_off(Voice::T1, keys::A4))
        .unwrap();
    let length = gap_ms(on, off);
    assert!((length - 200).abs() <= TOLERANCE_MS, "note length {}ms", length);
}

#[test]
fn test_realtime_pause_holds_position() {
    let (mut seq, transport) = sequencer();
    seq.pattern(0).tempo(240.0).unwrap();
    for step in 0..16 {
        seq.pattern(0)
            .track(Voice::T2)
            .trig(step)
            .unwrap()
            .note(step as u8, 20.0, 100)
            .unwrap();
    }

    seq.play(0).unwrap();
    thread::sleep(Duration::from_millis(400));
    seq.pause().unwrap();
    thread::sleep(Duration::from_millis(50));
    let paused_count = note_ons(&transport.sent()).len();
    let step = seq.state().track(Voice::T2).map(|t| t.step);

    thread::sleep(Duration::from_millis(400));
    assert_eq!(note_ons(&transport.sent()).len(), paused_count);
    assert_eq!(seq.state().track(Voice::T2).map(|t| t.step), step);
    assert_eq!(seq.status(), PlaybackStatus::Paused);

    seq.resume().unwrap();
    thread::sleep(Duration::from_millis(400));
    seq.stop();
    seq.join();

    // Keys equal step numbers: no step skipped or repeated across the pause
    let keys: Vec<u8> = transport
        .messages()
        .iter()
        .filter_map(|m| match m.kind {
            modelseq::MessageKind::NoteOn { key, .. } => Some(key),
            _ => None,
        })
        .collect();
    assert!(keys.len() > paused_count);
    for (i, key) in keys.iter().enumerate() {
        assert_eq!(*key as usize, i % 16);
    }
}

#[test]
fn test_realtime_restart_replaces_session() {
    let (mut seq, transport) = sequencer();
    seq.pattern(0).track(Voice::T1).trig(0).unwrap().note(60, 50.0, 100).unwrap();
    seq.pattern(1).track(Voice::T2).trig(0).unwrap().note(62, 50.0, 100).unwrap();

    seq.play(0).unwrap();
    thread::sleep(Duration::from_millis(100));
    seq.play(1).unwrap();
    let switched = transport.len();
    thread::sleep(Duration::from_millis(300));
    seq.stop();
    seq.join();

    let after: Vec<MidiMessage> = transport.messages().into_iter().skip(switched).collect();
    assert!(
        after
            .iter()
            .filter(|m| m.voice == Voice::T1)
            .all(|m| m.is_note_off())
    );
    assert!(after.iter().any(|m| m.voice == Voice::T2 && m.is_note_on()));
}

#[test]
fn test_realtime_transport_failures_are_reported() {
    let (mut seq, transport) = sequencer();
    seq.pattern(0).track(Voice::T1).trig(0).unwrap();
    transport.set_failing(true);

    seq.play(0).unwrap();
    thread::sleep(Duration::from_millis(100));
    assert!(seq.is_playing());
    seq.stop();
    seq.join();

    let notes = seq.drain_notifications();
    assert!(notes.iter().any(|n| n.category == NotificationCategory::Transport));
}

/// Wire that takes its time over every control change
struct SlowWire {
    inner: MemoryTransport,
    per_control_change: Duration,
}

impl Transport for SlowWire {
    fn send(&self, message: &MidiMessage) -> Result<(), TransportError> {
        if message.is_control_change() {
            thread::sleep(self.per_control_change);
        }
        self.inner.send(message)
    }
}

#[test]
fn test_realtime_free_interleaves_with_lock_burst() {
    let wire = Arc::new(SlowWire {
        inner: MemoryTransport::new(),
        per_control_change: Duration::from_millis(2),
    });
    let mut seq = Sequencer::new(wire.clone());

    // A 100-parameter lock on step 0 takes about 200ms to go out
    let lock: ParamMap = (0..100u8)
        .filter_map(|cc| Parameter::new(cc).map(|p| (p, 1)))
        .collect();
    seq.pattern(0).track(Voice::T1).trig(0).unwrap().lock(lock);
    let free = seq.free();

    seq.play(0).unwrap();
    thread::sleep(Duration::from_millis(50));
    free.control_change(Voice::T6, Parameter::PAN, 5).unwrap();
    thread::sleep(Duration::from_millis(300));
    seq.stop();
    seq.join();

    let messages = wire.inner.messages();
    let bypass = messages
        .iter()
        .position(|m| m.voice == Voice::T6)
        .unwrap();
    let burst: Vec<usize> = messages
        .iter()
        .enumerate()
        .filter(|(_, m)| m.voice == Voice::T1 && m.is_control_change())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(messages[bypass].kind, MessageKind::ControlChange { controller: 10, value: 5 });
    assert!(burst.len() >= 100);
    // Sent while the burst was still going, not queued behind it
    assert!(burst[0] < bypass);
    assert!(bypass < burst[99]);
}
