//! Conversion from winit platform events into easel-input types.
//!
//! The matcher consumes its own event vocabulary; this module is the thin
//! boundary that translates what winit delivers. Key and button mappings
//! are stateless functions. Touch conversion is stateful:
//! [`TouchPointTracker`] remembers where each contact touched down, since
//! winit reports only current positions and the matcher's drag detection
//! needs per-contact start positions.

use std::collections::HashMap;

use winit::event::{Modifiers, MouseButton as WinitMouseButton, Touch, TouchPhase as WinitTouchPhase};
use winit::keyboard::{Key as WinitKey, NamedKey};

use crate::events::{Key, KeyboardModifiers, Point, PointerButton, TouchPoint, TouchPointState};

/// Converts a winit logical key to an easel-input [`Key`].
///
/// Named keys and single-character keys are handled; anything else maps to
/// [`Key::Unknown`].
pub fn from_winit_key(key: &WinitKey) -> Key {
    match key {
        WinitKey::Named(named) => from_winit_named_key(named),
        WinitKey::Character(c) => from_character(c),
        WinitKey::Unidentified(_) => Key::Unknown(0),
        WinitKey::Dead(_) => Key::Unknown(0),
    }
}

/// Converts a winit named key to an easel-input [`Key`].
fn from_winit_named_key(key: &NamedKey) -> Key {
    match key {
        // Navigation
        NamedKey::ArrowUp => Key::ArrowUp,
        NamedKey::ArrowDown => Key::ArrowDown,
        NamedKey::ArrowLeft => Key::ArrowLeft,
        NamedKey::ArrowRight => Key::ArrowRight,
        NamedKey::Home => Key::Home,
        NamedKey::End => Key::End,
        NamedKey::PageUp => Key::PageUp,
        NamedKey::PageDown => Key::PageDown,

        // Editing
        NamedKey::Backspace => Key::Backspace,
        NamedKey::Delete => Key::Delete,
        NamedKey::Insert => Key::Insert,
        NamedKey::Enter => Key::Enter,
        NamedKey::Tab => Key::Tab,
        NamedKey::Space => Key::Space,
        NamedKey::Escape => Key::Escape,

        // Modifiers; left and right variants collapse to one key each.
        NamedKey::Shift => Key::Shift,
        NamedKey::Control => Key::Control,
        NamedKey::Alt => Key::Alt,
        NamedKey::Super | NamedKey::Meta => Key::Meta,

        // Function keys
        NamedKey::F1 => Key::F1,
        NamedKey::F2 => Key::F2,
        NamedKey::F3 => Key::F3,
        NamedKey::F4 => Key::F4,
        NamedKey::F5 => Key::F5,
        NamedKey::F6 => Key::F6,
        NamedKey::F7 => Key::F7,
        NamedKey::F8 => Key::F8,
        NamedKey::F9 => Key::F9,
        NamedKey::F10 => Key::F10,
        NamedKey::F11 => Key::F11,
        NamedKey::F12 => Key::F12,

        _ => Key::Unknown(0),
    }
}

/// Converts a character string to an easel-input [`Key`].
fn from_character(c: &str) -> Key {
    let mut chars = c.chars();
    let (Some(ch), None) = (chars.next(), chars.next()) else {
        return Key::Unknown(0);
    };

    match ch.to_ascii_lowercase() {
        'a' => Key::A,
        'b' => Key::B,
        'c' => Key::C,
        'd' => Key::D,
        'e' => Key::E,
        'f' => Key::F,
        'g' => Key::G,
        'h' => Key::H,
        'i' => Key::I,
        'j' => Key::J,
        'k' => Key::K,
        'l' => Key::L,
        'm' => Key::M,
        'n' => Key::N,
        'o' => Key::O,
        'p' => Key::P,
        'q' => Key::Q,
        'r' => Key::R,
        's' => Key::S,
        't' => Key::T,
        'u' => Key::U,
        'v' => Key::V,
        'w' => Key::W,
        'x' => Key::X,
        'y' => Key::Y,
        'z' => Key::Z,
        '0' => Key::Digit0,
        '1' => Key::Digit1,
        '2' => Key::Digit2,
        '3' => Key::Digit3,
        '4' => Key::Digit4,
        '5' => Key::Digit5,
        '6' => Key::Digit6,
        '7' => Key::Digit7,
        '8' => Key::Digit8,
        '9' => Key::Digit9,
        '-' => Key::Minus,
        '=' => Key::Equal,
        '[' => Key::BracketLeft,
        ']' => Key::BracketRight,
        '\\' => Key::Backslash,
        ';' => Key::Semicolon,
        '\'' => Key::Quote,
        ',' => Key::Comma,
        '.' => Key::Period,
        '/' => Key::Slash,
        '`' => Key::Grave,
        ' ' => Key::Space,
        _ => Key::Unknown(0),
    }
}

/// Converts a winit mouse button to a [`PointerButton`].
///
/// Returns `None` for buttons the matcher has no representation for.
pub fn from_winit_mouse_button(button: WinitMouseButton) -> Option<PointerButton> {
    match button {
        WinitMouseButton::Left => Some(PointerButton::Left),
        WinitMouseButton::Right => Some(PointerButton::Right),
        WinitMouseButton::Middle => Some(PointerButton::Middle),
        WinitMouseButton::Back => Some(PointerButton::Button4),
        WinitMouseButton::Forward => Some(PointerButton::Button5),
        WinitMouseButton::Other(_) => None,
    }
}

/// Converts a winit touch phase to a per-contact [`TouchPointState`].
///
/// winit never reports stationary contacts; the matcher infers them from
/// zero deltas.
pub fn from_winit_touch_phase(phase: WinitTouchPhase) -> TouchPointState {
    match phase {
        WinitTouchPhase::Started => TouchPointState::Pressed,
        WinitTouchPhase::Moved => TouchPointState::Moved,
        WinitTouchPhase::Ended => TouchPointState::Released,
        WinitTouchPhase::Cancelled => TouchPointState::Released,
    }
}

/// Converts the winit modifiers snapshot to [`KeyboardModifiers`].
pub fn from_winit_modifiers(modifiers: &Modifiers) -> KeyboardModifiers {
    let state = modifiers.state();
    KeyboardModifiers {
        shift: state.shift_key(),
        control: state.control_key(),
        alt: state.alt_key(),
        meta: state.super_key(),
    }
}

/// Stateful converter from winit touch events to [`TouchPoint`]s.
///
/// Tracks the touch-down position of every active contact so converted
/// points carry the `start_pos` the matcher's slop detection works from.
#[derive(Debug, Default)]
pub struct TouchPointTracker {
    /// Start position of each active contact, keyed by touch id.
    start_positions: HashMap<u64, Point>,
}

impl TouchPointTracker {
    /// Creates a new tracker with no active contacts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of contacts currently tracked.
    pub fn active_touch_count(&self) -> usize {
        self.start_positions.len()
    }

    /// Converts a winit touch, updating the tracked start positions.
    pub fn track(&mut self, touch: &Touch) -> TouchPoint {
        let pos = Point::new(touch.location.x as f32, touch.location.y as f32);
        let state = from_winit_touch_phase(touch.phase);

        let start_pos = match touch.phase {
            WinitTouchPhase::Started => {
                self.start_positions.insert(touch.id, pos);
                pos
            }
            WinitTouchPhase::Moved => *self.start_positions.entry(touch.id).or_insert(pos),
            WinitTouchPhase::Ended | WinitTouchPhase::Cancelled => {
                self.start_positions.remove(&touch.id).unwrap_or(pos)
            }
        };

        TouchPoint::new(touch.id, pos, start_pos, state)
    }

    /// Forgets all active contacts.
    pub fn reset(&mut self) {
        self.start_positions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;
    use winit::event::DeviceId;
    use winit::keyboard::SmolStr;

    fn make_touch(id: u64, phase: WinitTouchPhase, x: f64, y: f64) -> Touch {
        Touch {
            device_id: DeviceId::dummy(),
            phase,
            location: PhysicalPosition::new(x, y),
            force: None,
            id,
        }
    }

    #[test]
    fn test_key_conversion() {
        assert_eq!(from_winit_key(&WinitKey::Named(NamedKey::Space)), Key::Space);
        assert_eq!(from_winit_key(&WinitKey::Named(NamedKey::Shift)), Key::Shift);
        assert_eq!(
            from_winit_key(&WinitKey::Character(SmolStr::new("a"))),
            Key::A
        );
        assert_eq!(
            from_winit_key(&WinitKey::Character(SmolStr::new("A"))),
            Key::A
        );
        assert_eq!(
            from_winit_key(&WinitKey::Character(SmolStr::new("7"))),
            Key::Digit7
        );
        assert_eq!(
            from_winit_key(&WinitKey::Character(SmolStr::new("ab"))),
            Key::Unknown(0)
        );
    }

    #[test]
    fn test_mouse_button_conversion() {
        assert_eq!(
            from_winit_mouse_button(WinitMouseButton::Left),
            Some(PointerButton::Left)
        );
        assert_eq!(
            from_winit_mouse_button(WinitMouseButton::Back),
            Some(PointerButton::Button4)
        );
        assert_eq!(from_winit_mouse_button(WinitMouseButton::Other(9)), None);
    }

    #[test]
    fn test_touch_phase_conversion() {
        assert_eq!(
            from_winit_touch_phase(WinitTouchPhase::Started),
            TouchPointState::Pressed
        );
        assert_eq!(
            from_winit_touch_phase(WinitTouchPhase::Moved),
            TouchPointState::Moved
        );
        assert_eq!(
            from_winit_touch_phase(WinitTouchPhase::Ended),
            TouchPointState::Released
        );
        assert_eq!(
            from_winit_touch_phase(WinitTouchPhase::Cancelled),
            TouchPointState::Released
        );
    }

    #[test]
    fn test_tracker_preserves_start_positions() {
        let mut tracker = TouchPointTracker::new();

        let point = tracker.track(&make_touch(1, WinitTouchPhase::Started, 100.0, 200.0));
        assert_eq!(point.start_pos, Point::new(100.0, 200.0));
        assert_eq!(point.state, TouchPointState::Pressed);
        assert_eq!(tracker.active_touch_count(), 1);

        let point = tracker.track(&make_touch(1, WinitTouchPhase::Moved, 150.0, 250.0));
        assert_eq!(point.pos, Point::new(150.0, 250.0));
        assert_eq!(point.start_pos, Point::new(100.0, 200.0));

        let point = tracker.track(&make_touch(1, WinitTouchPhase::Ended, 150.0, 250.0));
        assert_eq!(point.start_pos, Point::new(100.0, 200.0));
        assert_eq!(point.state, TouchPointState::Released);
        assert_eq!(tracker.active_touch_count(), 0);
    }

    #[test]
    fn test_tracker_multi_touch_and_reset() {
        let mut tracker = TouchPointTracker::new();

        tracker.track(&make_touch(1, WinitTouchPhase::Started, 0.0, 0.0));
        tracker.track(&make_touch(2, WinitTouchPhase::Started, 50.0, 0.0));
        assert_eq!(tracker.active_touch_count(), 2);

        let point = tracker.track(&make_touch(2, WinitTouchPhase::Moved, 60.0, 0.0));
        assert_eq!(point.start_pos, Point::new(50.0, 0.0));

        tracker.reset();
        assert_eq!(tracker.active_touch_count(), 0);
    }
}
