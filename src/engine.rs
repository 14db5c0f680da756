use std::{
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use rand::Rng;

use crate::input::ClickSink;

/// Gap between the two presses of a double-click cycle.
const DOUBLE_CLICK_GAP: Duration = Duration::from_millis(100);
/// How often a sleeping worker re-checks the stop flag.
const STOP_POLL: Duration = Duration::from_millis(50);
/// Floor for configured delays; also stands in for values `Duration`
/// cannot represent, so a bad delay slows the worker instead of
/// panicking it.
const MIN_SLEEP: Duration = Duration::from_millis(1);

fn duration_from_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs)
        .unwrap_or(MIN_SLEEP)
        .max(MIN_SLEEP)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickButton {
    Left,
    Right,
    Middle,
}

impl ClickButton {
    pub fn parse(name: &str) -> Self {
        match name {
            "right" => ClickButton::Right,
            "middle" => ClickButton::Middle,
            _ => ClickButton::Left,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClickButton::Left => "left",
            ClickButton::Right => "right",
            ClickButton::Middle => "middle",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickType {
    Single,
    Double,
    Pattern,
    Hold,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RepeatMode {
    UntilStopped,
    Fixed(u32),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClickTarget {
    /// Click wherever the pointer currently is.
    Cursor,
    /// Move the pointer to a screen coordinate before each cycle.
    Fixed { x: i32, y: i32 },
}

#[derive(Clone, Debug)]
pub struct ClickConfig {
    pub button: ClickButton,
    pub click_type: ClickType,
    /// Base delay between click cycles, in seconds.
    pub interval_secs: f64,
    /// Per-click delays for `ClickType::Pattern`, in seconds.
    pub pattern: Vec<f64>,
    /// Press duration for `ClickType::Hold`, in seconds.
    pub hold_secs: f64,
    pub repeat: RepeatMode,
    pub target: ClickTarget,
    /// Random extra delay added on top of the interval, in milliseconds.
    pub jitter_ms: u64,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            button: ClickButton::Left,
            click_type: ClickType::Single,
            interval_secs: 0.1,
            pattern: Vec::new(),
            hold_secs: 0.5,
            repeat: RepeatMode::UntilStopped,
            target: ClickTarget::Cursor,
            jitter_ms: 0,
        }
    }
}

/// A running click worker. Stopping clears the shared flag and joins the
/// thread; a finished fixed-count run clears the flag on its own.
pub struct ClickJob {
    running: Arc<AtomicBool>,
    cycles: Arc<AtomicU32>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ClickJob {
    pub fn spawn(config: ClickConfig, mut sink: Box<dyn ClickSink>) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let cycles = Arc::new(AtomicU32::new(0));
        let running_clone = Arc::clone(&running);
        let cycles_clone = Arc::clone(&cycles);

        log::info!(
            "click worker starting: {} {:?} every {:.3}s ({:?})",
            config.button.as_str(),
            config.click_type,
            config.interval_secs,
            config.repeat
        );

        let handle = thread::spawn(move || {
            run_loop(&config, sink.as_mut(), &running_clone, &cycles_clone);
            running_clone.store(false, Ordering::Relaxed);
            log::info!(
                "click worker finished after {} cycle(s)",
                cycles_clone.load(Ordering::Relaxed)
            );
        });

        Self {
            running,
            cycles,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn cycles_done(&self) -> u32 {
        self.cycles.load(Ordering::Relaxed)
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ClickJob {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(
    config: &ClickConfig,
    sink: &mut dyn ClickSink,
    running: &AtomicBool,
    cycles: &AtomicU32,
) {
    let mut rng = rand::thread_rng();
    let base = duration_from_secs(config.interval_secs);
    let pattern = effective_pattern(config, base);

    while running.load(Ordering::Relaxed) {
        click_cycle(config, &pattern, sink, running);
        let done = cycles.fetch_add(1, Ordering::Relaxed) + 1;

        if let RepeatMode::Fixed(count) = config.repeat {
            if done >= count {
                break;
            }
        }

        let jitter = if config.jitter_ms == 0 {
            0
        } else {
            rng.gen_range(0..=config.jitter_ms)
        };
        if !sleep_while_running(base + Duration::from_millis(jitter), STOP_POLL, running) {
            break;
        }
    }
}

/// One click cycle according to the configured click type.
fn click_cycle(
    config: &ClickConfig,
    pattern: &[Duration],
    sink: &mut dyn ClickSink,
    running: &AtomicBool,
) {
    if let ClickTarget::Fixed { x, y } = config.target {
        sink.move_to(x, y);
    }

    match config.click_type {
        ClickType::Single => sink.click(config.button),
        ClickType::Double => {
            sink.click(config.button);
            thread::sleep(DOUBLE_CLICK_GAP);
            sink.click(config.button);
        }
        ClickType::Hold => {
            sink.press(config.button);
            sleep_while_running(duration_from_secs(config.hold_secs), STOP_POLL, running);
            // Release even when stopped mid-hold, never leave a button down.
            sink.release(config.button);
        }
        ClickType::Pattern => {
            for gap in pattern {
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                sink.click(config.button);
                if !sleep_while_running(*gap, STOP_POLL, running) {
                    break;
                }
            }
        }
    }
}

/// An empty pattern degrades to a single entry equal to the base interval.
fn effective_pattern(config: &ClickConfig, base: Duration) -> Vec<Duration> {
    if config.pattern.is_empty() {
        vec![base]
    } else {
        config
            .pattern
            .iter()
            .map(|secs| duration_from_secs(*secs))
            .collect()
    }
}

/// Sleep in short slices so a stop request is honoured promptly.
/// Returns false if the worker was asked to stop while sleeping.
pub(crate) fn sleep_while_running(total: Duration, poll: Duration, running: &AtomicBool) -> bool {
    let mut left = total;
    while left > Duration::ZERO {
        if !running.load(Ordering::Relaxed) {
            return false;
        }
        let slice = left.min(poll);
        thread::sleep(slice);
        left -= slice;
    }
    running.load(Ordering::Relaxed)
}
