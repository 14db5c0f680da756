use std::{
    fs,
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    engine::{sleep_while_running, ClickButton},
    input::ClickSink,
};

/// Slice length for playback waits, small enough that stop feels instant.
const PLAYBACK_POLL: Duration = Duration::from_millis(5);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EventKind {
    MouseMove { x: i32, y: i32 },
    MouseDown { button: String },
    MouseUp { button: String },
    Wheel { delta_x: i64, delta_y: i64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// Milliseconds since the recording started.
    pub offset_ms: u64,
    pub kind: EventKind,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub events: Vec<RecordedEvent>,
}

impl Recording {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn duration_ms(&self) -> u64 {
        self.events.last().map_or(0, |event| event.offset_ms)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading recording from {}", path.display()))?;
        let recording = serde_json::from_str(&raw)
            .with_context(|| format!("parsing recording from {}", path.display()))?;
        Ok(recording)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw)
            .with_context(|| format!("writing recording to {}", path.display()))?;
        log::info!("recording saved to {}", path.display());
        Ok(())
    }
}

/// Replays a recording on a worker thread. Delays between events are the
/// recorded offsets scaled by the speed factor; no drift correction.
pub struct Playback {
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Playback {
    pub fn spawn(recording: Recording, speed: f32, loops: u32, mut sink: Box<dyn ClickSink>) -> Self {
        let speed = speed.max(0.1);
        let loops = loops.max(1);
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);

        log::info!(
            "playback starting: {} event(s), speed x{speed}, {loops} loop(s)",
            recording.events.len()
        );

        let handle = thread::spawn(move || {
            'outer: for _ in 0..loops {
                let mut last_offset = 0u64;
                for event in &recording.events {
                    let delay_ms = event.offset_ms.saturating_sub(last_offset);
                    let scaled = Duration::from_millis((delay_ms as f32 / speed).round() as u64);
                    if !sleep_while_running(scaled, PLAYBACK_POLL, &running_clone) {
                        break 'outer;
                    }
                    apply_event(sink.as_mut(), &event.kind);
                    last_offset = event.offset_ms;
                }
            }
            running_clone.store(false, Ordering::Relaxed);
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Playback {
    fn drop(&mut self) {
        self.stop();
    }
}

fn apply_event(sink: &mut dyn ClickSink, kind: &EventKind) {
    match kind {
        EventKind::MouseMove { x, y } => sink.move_to(*x, *y),
        EventKind::MouseDown { button } => sink.press(ClickButton::parse(button)),
        EventKind::MouseUp { button } => sink.release(ClickButton::parse(button)),
        EventKind::Wheel { delta_x, delta_y } => sink.scroll(*delta_x as i32, *delta_y as i32),
    }
}

#[cfg(feature = "hooks")]
pub use capture::Recorder;

#[cfg(feature = "hooks")]
mod capture {
    use super::{EventKind, RecordedEvent, Recording};
    use parking_lot::Mutex;
    use rdev::{Button as RdevButton, Event as RdevEvent, EventType};
    use std::{
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        thread,
        time::Instant,
    };

    /// Captures mouse events through the global rdev hook. Like the hotkey
    /// hook, the listener thread is installed once and flips a capture flag
    /// between recordings.
    #[derive(Default)]
    pub struct Recorder {
        events: Arc<Mutex<Vec<RecordedEvent>>>,
        capture: Arc<AtomicBool>,
        started: Arc<Mutex<Option<Instant>>>,
        listener_running: bool,
        active: bool,
    }

    impl Recorder {
        pub fn is_recording(&self) -> bool {
            self.active
        }

        pub fn event_count(&self) -> usize {
            self.events.lock().len()
        }

        pub fn start(&mut self) {
            if self.active {
                return;
            }

            self.events.lock().clear();
            *self.started.lock() = Some(Instant::now());
            self.capture.store(true, Ordering::Relaxed);

            if !self.listener_running {
                let events = Arc::clone(&self.events);
                let capture = Arc::clone(&self.capture);
                let started = Arc::clone(&self.started);

                thread::spawn(move || {
                    let result = rdev::listen(move |event: RdevEvent| {
                        if !capture.load(Ordering::Relaxed) {
                            return;
                        }
                        let start = match *started.lock() {
                            Some(start) => start,
                            None => return,
                        };
                        if let Some(kind) = translate(&event) {
                            events.lock().push(RecordedEvent {
                                offset_ms: start.elapsed().as_millis() as u64,
                                kind,
                            });
                        }
                    });
                    if let Err(error) = result {
                        log::error!("recording hook failed: {error:?}");
                    }
                });
                self.listener_running = true;
            }

            self.active = true;
            log::info!("recording started");
        }

        pub fn stop(&mut self) -> Recording {
            if !self.active {
                return Recording::default();
            }

            self.capture.store(false, Ordering::Relaxed);
            *self.started.lock() = None;
            self.active = false;

            let events = self.events.lock().clone();
            log::info!("recording stopped with {} event(s)", events.len());
            Recording { events }
        }
    }

    /// Keyboard events are deliberately not captured.
    fn translate(event: &RdevEvent) -> Option<EventKind> {
        match event.event_type {
            EventType::ButtonPress(button) => Some(EventKind::MouseDown {
                button: button_name(button).to_string(),
            }),
            EventType::ButtonRelease(button) => Some(EventKind::MouseUp {
                button: button_name(button).to_string(),
            }),
            EventType::MouseMove { x, y } => Some(EventKind::MouseMove {
                x: x as i32,
                y: y as i32,
            }),
            EventType::Wheel { delta_x, delta_y } => Some(EventKind::Wheel { delta_x, delta_y }),
            EventType::KeyPress(_) | EventType::KeyRelease(_) => None,
        }
    }

    fn button_name(button: RdevButton) -> &'static str {
        match button {
            RdevButton::Left => "left",
            RdevButton::Right => "right",
            RdevButton::Middle => "middle",
            RdevButton::Unknown(_) => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::test_sink::{SinkEvent, TestSink};
    use std::time::Instant;

    fn sample_recording() -> Recording {
        Recording {
            events: vec![
                RecordedEvent {
                    offset_ms: 0,
                    kind: EventKind::MouseMove { x: 5, y: 6 },
                },
                RecordedEvent {
                    offset_ms: 20,
                    kind: EventKind::MouseDown {
                        button: "left".into(),
                    },
                },
                RecordedEvent {
                    offset_ms: 40,
                    kind: EventKind::MouseUp {
                        button: "left".into(),
                    },
                },
                RecordedEvent {
                    offset_ms: 60,
                    kind: EventKind::Wheel {
                        delta_x: 0,
                        delta_y: -2,
                    },
                },
            ],
        }
    }

    fn wait_until_finished(playback: &Playback) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while playback.is_running() {
            assert!(Instant::now() < deadline, "playback did not finish in time");
            thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn playback_replays_events_in_order() {
        let sink = TestSink::default();
        let events = Arc::clone(&sink.events);

        let mut playback = Playback::spawn(sample_recording(), 1.0, 1, Box::new(sink));
        wait_until_finished(&playback);
        playback.stop();

        let events = events.lock();
        assert_eq!(
            *events,
            vec![
                SinkEvent::MoveTo(5, 6),
                SinkEvent::Press(ClickButton::Left),
                SinkEvent::Release(ClickButton::Left),
                SinkEvent::Scroll(0, -2),
            ]
        );
    }

    #[test]
    fn playback_loops_the_recording() {
        let sink = TestSink::default();
        let events = Arc::clone(&sink.events);

        let mut playback = Playback::spawn(sample_recording(), 4.0, 3, Box::new(sink));
        wait_until_finished(&playback);
        playback.stop();

        assert_eq!(events.lock().len(), 12);
    }

    #[test]
    fn faster_speed_shortens_playback() {
        let recording = Recording {
            events: vec![
                RecordedEvent {
                    offset_ms: 0,
                    kind: EventKind::MouseMove { x: 0, y: 0 },
                },
                RecordedEvent {
                    offset_ms: 400,
                    kind: EventKind::MouseMove { x: 1, y: 1 },
                },
            ],
        };

        let started = Instant::now();
        let mut playback = Playback::spawn(recording, 4.0, 1, Box::new(TestSink::default()));
        wait_until_finished(&playback);
        playback.stop();

        // 400 ms of recorded delay at 4x should land near 100 ms.
        assert!(started.elapsed() < Duration::from_millis(300));
    }

    #[test]
    fn stop_interrupts_playback() {
        let recording = Recording {
            events: vec![
                RecordedEvent {
                    offset_ms: 0,
                    kind: EventKind::MouseMove { x: 0, y: 0 },
                },
                RecordedEvent {
                    offset_ms: 30_000,
                    kind: EventKind::MouseMove { x: 1, y: 1 },
                },
            ],
        };

        let sink = TestSink::default();
        let events = Arc::clone(&sink.events);
        let mut playback = Playback::spawn(recording, 1.0, 1, Box::new(sink));
        thread::sleep(Duration::from_millis(50));

        let started = Instant::now();
        playback.stop();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(events.lock().len(), 1);
    }

    #[test]
    fn recording_json_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recording.json");

        let recording = sample_recording();
        recording.save(&path).unwrap();
        assert_eq!(Recording::load(&path).unwrap(), recording);
        assert_eq!(recording.duration_ms(), 60);
    }
}
