use device_query::{DeviceQuery, DeviceState};
use enigo::{Enigo, MouseButton as EnigoButton, MouseControllable};
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::engine::ClickButton;

static ENIGO: Lazy<Mutex<Enigo>> = Lazy::new(|| Mutex::new(Enigo::new()));

/// Seam between the timing workers and the OS injection backend.
pub trait ClickSink: Send {
    fn press(&mut self, button: ClickButton);
    fn release(&mut self, button: ClickButton);
    fn move_to(&mut self, x: i32, y: i32);
    fn scroll(&mut self, dx: i32, dy: i32);

    fn click(&mut self, button: ClickButton) {
        self.press(button);
        self.release(button);
    }
}

/// Production sink dispatching through the shared enigo controller.
pub struct EnigoSink;

impl ClickSink for EnigoSink {
    fn press(&mut self, button: ClickButton) {
        ENIGO.lock().mouse_down(to_enigo(button));
    }

    fn release(&mut self, button: ClickButton) {
        ENIGO.lock().mouse_up(to_enigo(button));
    }

    fn move_to(&mut self, x: i32, y: i32) {
        ENIGO.lock().mouse_move_to(x, y);
    }

    fn scroll(&mut self, dx: i32, dy: i32) {
        let mut enigo = ENIGO.lock();
        if dy != 0 {
            enigo.mouse_scroll_y(dy);
        }
        if dx != 0 {
            enigo.mouse_scroll_x(dx);
        }
    }

    fn click(&mut self, button: ClickButton) {
        ENIGO.lock().mouse_click(to_enigo(button));
    }
}

fn to_enigo(button: ClickButton) -> EnigoButton {
    match button {
        ClickButton::Left => EnigoButton::Left,
        ClickButton::Right => EnigoButton::Right,
        ClickButton::Middle => EnigoButton::Middle,
    }
}

/// Current pointer position in screen coordinates.
pub fn cursor_position() -> (i32, i32) {
    DeviceState::new().get_mouse().coords
}

/// Main display size as reported by the injection backend.
pub fn main_display_size() -> (i32, i32) {
    let (w, h) = ENIGO.lock().main_display_size();
    (w as i32, h as i32)
}

/// Keep a fixed click target on the main display.
pub fn clamp_to_display(x: i32, y: i32) -> (i32, i32) {
    let (w, h) = main_display_size();
    (x.clamp(0, w.max(1) - 1), y.clamp(0, h.max(1) - 1))
}

#[cfg(test)]
pub mod test_sink {
    use super::ClickSink;
    use crate::engine::ClickButton;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum SinkEvent {
        Press(ClickButton),
        Release(ClickButton),
        MoveTo(i32, i32),
        Scroll(i32, i32),
    }

    /// Records everything a worker dispatches, for assertions.
    #[derive(Clone, Default)]
    pub struct TestSink {
        pub events: Arc<Mutex<Vec<SinkEvent>>>,
    }

    impl ClickSink for TestSink {
        fn press(&mut self, button: ClickButton) {
            self.events.lock().push(SinkEvent::Press(button));
        }

        fn release(&mut self, button: ClickButton) {
            self.events.lock().push(SinkEvent::Release(button));
        }

        fn move_to(&mut self, x: i32, y: i32) {
            self.events.lock().push(SinkEvent::MoveTo(x, y));
        }

        fn scroll(&mut self, dx: i32, dy: i32) {
            self.events.lock().push(SinkEvent::Scroll(dx, dy));
        }
    }
}
