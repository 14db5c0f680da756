use std::sync::{
    mpsc::{channel, Receiver, TryRecvError},
    Arc,
};

use anyhow::{anyhow, bail, Result};
use parking_lot::Mutex;
use rdev::{listen, Event, EventType, Key};

/// Global hotkey listener. rdev's listen blocks its thread for the process
/// lifetime and cannot be torn down portably, so the hook is installed once
/// and rebinding swaps the matched key in place.
pub struct HotkeyListener {
    bound: Arc<Mutex<Key>>,
    rx: Receiver<()>,
}

impl HotkeyListener {
    pub fn spawn(name: &str) -> Result<Self> {
        let key = parse_key(name).ok_or_else(|| anyhow!("unknown hotkey '{name}'"))?;
        let bound = Arc::new(Mutex::new(key));
        let (tx, rx) = channel();

        let bound_clone = Arc::clone(&bound);
        std::thread::spawn(move || {
            let result = listen(move |event: Event| {
                if let EventType::KeyPress(key) = event.event_type {
                    if key == *bound_clone.lock() {
                        let _ = tx.send(());
                    }
                }
            });
            if let Err(error) = result {
                log::error!("global hotkey listener failed: {error:?}");
            }
        });

        log::info!("registered global hotkey '{name}'");
        Ok(Self { bound, rx })
    }

    pub fn rebind(&self, name: &str) -> Result<()> {
        let key = parse_key(name).ok_or_else(|| anyhow!("unknown hotkey '{name}'"))?;
        *self.bound.lock() = key;
        log::info!("hotkey rebound to '{name}'");
        Ok(())
    }

    /// Drain pending presses; true if the hotkey fired since the last poll.
    /// Errors once the listener thread has died, so the UI can say the
    /// hotkey no longer works instead of ignoring it silently.
    pub fn take_toggle(&self) -> Result<bool> {
        drain_toggles(&self.rx)
    }
}

fn drain_toggles(rx: &Receiver<()>) -> Result<bool> {
    let mut fired = false;
    loop {
        match rx.try_recv() {
            Ok(()) => fired = true,
            Err(TryRecvError::Empty) => return Ok(fired),
            Err(TryRecvError::Disconnected) => {
                // Deliver presses that made it into the channel first.
                if fired {
                    return Ok(true);
                }
                bail!("global hotkey listener is no longer running");
            }
        }
    }
}

/// Case-insensitive hotkey names: function keys, a few named keys, single
/// letters and digits.
pub fn parse_key(name: &str) -> Option<Key> {
    let name = name.trim().to_lowercase();
    let key = match name.as_str() {
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        "insert" => Key::Insert,
        "delete" => Key::Delete,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" => Key::PageUp,
        "pagedown" => Key::PageDown,
        "space" => Key::Space,
        "tab" => Key::Tab,
        "escape" | "esc" => Key::Escape,
        "a" => Key::KeyA,
        "b" => Key::KeyB,
        "c" => Key::KeyC,
        "d" => Key::KeyD,
        "e" => Key::KeyE,
        "f" => Key::KeyF,
        "g" => Key::KeyG,
        "h" => Key::KeyH,
        "i" => Key::KeyI,
        "j" => Key::KeyJ,
        "k" => Key::KeyK,
        "l" => Key::KeyL,
        "m" => Key::KeyM,
        "n" => Key::KeyN,
        "o" => Key::KeyO,
        "p" => Key::KeyP,
        "q" => Key::KeyQ,
        "r" => Key::KeyR,
        "s" => Key::KeyS,
        "t" => Key::KeyT,
        "u" => Key::KeyU,
        "v" => Key::KeyV,
        "w" => Key::KeyW,
        "x" => Key::KeyX,
        "y" => Key::KeyY,
        "z" => Key::KeyZ,
        "0" => Key::Num0,
        "1" => Key::Num1,
        "2" => Key::Num2,
        "3" => Key::Num3,
        "4" => Key::Num4,
        "5" => Key::Num5,
        "6" => Key::Num6,
        "7" => Key::Num7,
        "8" => Key::Num8,
        "9" => Key::Num9,
        _ => return None,
    };
    Some(key)
}
