//! Low-level input event types consumed by the shortcut matcher.
//!
//! This module defines the vocabulary of the input subsystem: keyboard keys,
//! pointer buttons, wheel actions, touch points, and native OS gestures,
//! plus the [`InputEvent`] sum type that is handed to actions.
//!
//! Events are plain data. They carry positions in canvas-local coordinates
//! and the keyboard modifier snapshot taken when the platform delivered
//! them; they hold no references back into the matcher.

/// A 2D position in canvas-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal coordinate in pixels.
    pub x: f32,
    /// Vertical coordinate in pixels.
    pub y: f32,
}

impl Point {
    /// The origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new point.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point.
    pub fn distance_squared_to(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }
}

/// Keyboard modifiers that may be held during input events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct KeyboardModifiers {
    /// The Shift key is held.
    pub shift: bool,
    /// The Control key is held.
    pub control: bool,
    /// The Alt key is held.
    pub alt: bool,
    /// The Meta/Super key is held (Windows key, Cmd on macOS).
    pub meta: bool,
}

impl KeyboardModifiers {
    /// No modifiers pressed.
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };

    /// Shift modifier only.
    pub const SHIFT: Self = Self {
        shift: true,
        control: false,
        alt: false,
        meta: false,
    };

    /// Control modifier only.
    pub const CTRL: Self = Self {
        shift: false,
        control: true,
        alt: false,
        meta: false,
    };

    /// Check if any modifier is pressed.
    pub fn any(&self) -> bool {
        self.shift || self.control || self.alt || self.meta
    }

    /// Check if no modifiers are pressed.
    pub fn none(&self) -> bool {
        !self.any()
    }
}

/// Keyboard key codes.
///
/// Modifier keys appear as single variants ([`Key::Shift`], [`Key::Control`],
/// [`Key::Alt`], [`Key::Meta`]); the matcher does not distinguish left from
/// right. Keys without a variant of their own map to [`Key::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    // Numbers (main keyboard)
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    // Function keys
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,

    // Navigation
    ArrowUp, ArrowDown, ArrowLeft, ArrowRight,
    Home, End, PageUp, PageDown,

    // Editing
    Backspace, Delete, Insert,
    Enter, Tab,

    // Whitespace
    Space,

    // Modifiers
    Shift, Control, Alt, Meta,

    // Punctuation and symbols
    Minus, Equal,
    BracketLeft, BracketRight, Backslash,
    Semicolon, Quote,
    Comma, Period, Slash,
    Grave,

    // Control
    Escape,

    // Unknown/unmapped key
    Unknown(u16),
}

impl Key {
    /// Check if this is a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(self, Key::Shift | Key::Control | Key::Alt | Key::Meta)
    }
}

/// Pointer buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PointerButton {
    /// Primary button (usually left).
    Left = 0,
    /// Secondary button (usually right).
    Right = 1,
    /// Middle button (scroll wheel click).
    Middle = 2,
    /// Additional button 1 (e.g., browser back).
    Button4 = 3,
    /// Additional button 2 (e.g., browser forward).
    Button5 = 4,
}

/// Direction-classified wheel input.
///
/// The windowing layer classifies raw scroll deltas into one of these
/// before handing the event to the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WheelAction {
    /// Scroll up.
    Up,
    /// Scroll down.
    Down,
    /// Scroll left.
    Left,
    /// Scroll right.
    Right,
    /// Pinch-style zoom in reported through the wheel channel.
    ZoomIn,
    /// Pinch-style zoom out reported through the wheel channel.
    ZoomOut,
    /// Two-finger trackpad panning.
    TrackpadPan,
}

/// Pointer button press event.
#[derive(Debug, Clone, Copy)]
pub struct PointerPressEvent {
    /// The button that was pressed.
    pub button: PointerButton,
    /// Position in canvas-local coordinates.
    pub local_pos: Point,
    /// Position in global screen coordinates.
    pub global_pos: Point,
    /// Keyboard modifiers held during the event.
    pub modifiers: KeyboardModifiers,
}

impl PointerPressEvent {
    /// Create a new pointer press event.
    pub fn new(
        button: PointerButton,
        local_pos: Point,
        global_pos: Point,
        modifiers: KeyboardModifiers,
    ) -> Self {
        Self {
            button,
            local_pos,
            global_pos,
            modifiers,
        }
    }
}

/// Pointer button release event.
#[derive(Debug, Clone, Copy)]
pub struct PointerReleaseEvent {
    /// The button that was released.
    pub button: PointerButton,
    /// Position in canvas-local coordinates.
    pub local_pos: Point,
    /// Position in global screen coordinates.
    pub global_pos: Point,
    /// Keyboard modifiers held during the event.
    pub modifiers: KeyboardModifiers,
}

impl PointerReleaseEvent {
    /// Create a new pointer release event.
    pub fn new(
        button: PointerButton,
        local_pos: Point,
        global_pos: Point,
        modifiers: KeyboardModifiers,
    ) -> Self {
        Self {
            button,
            local_pos,
            global_pos,
            modifiers,
        }
    }
}

/// Pointer move event.
#[derive(Debug, Clone, Copy)]
pub struct PointerMoveEvent {
    /// Position in canvas-local coordinates.
    pub local_pos: Point,
    /// Position in global screen coordinates.
    pub global_pos: Point,
    /// Keyboard modifiers held during the event.
    pub modifiers: KeyboardModifiers,
}

impl PointerMoveEvent {
    /// Create a new pointer move event.
    pub fn new(local_pos: Point, global_pos: Point, modifiers: KeyboardModifiers) -> Self {
        Self {
            local_pos,
            global_pos,
            modifiers,
        }
    }
}

/// Wheel (scroll) event.
///
/// The classified direction travels separately (see
/// [`WheelAction`] and [`ShortcutMatcher::wheel_event`]); this struct
/// carries the raw deltas for actions that want sub-pixel precision.
///
/// [`ShortcutMatcher::wheel_event`]: crate::matcher::ShortcutMatcher::wheel_event
#[derive(Debug, Clone, Copy)]
pub struct WheelEvent {
    /// Position in canvas-local coordinates.
    pub local_pos: Point,
    /// Horizontal scroll delta (positive = right).
    pub delta_x: f32,
    /// Vertical scroll delta (positive = up/away from user).
    pub delta_y: f32,
    /// Keyboard modifiers held during the event.
    pub modifiers: KeyboardModifiers,
}

impl WheelEvent {
    /// Create a new wheel event.
    pub fn new(local_pos: Point, delta_x: f32, delta_y: f32, modifiers: KeyboardModifiers) -> Self {
        Self {
            local_pos,
            delta_x,
            delta_y,
            modifiers,
        }
    }
}

/// Per-touch-point state within a touch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchPointState {
    /// The contact was just made.
    Pressed,
    /// The contact has not moved since the last event.
    Stationary,
    /// The contact moved.
    Moved,
    /// The contact was lifted.
    Released,
}

/// A single touch contact within a [`TouchEvent`].
#[derive(Debug, Clone, Copy)]
pub struct TouchPoint {
    /// Platform-assigned contact id, stable for the lifetime of the touch.
    pub id: u64,
    /// Current position in canvas-local coordinates.
    pub pos: Point,
    /// Position where this contact first touched down.
    pub start_pos: Point,
    /// State of this contact in the current event.
    pub state: TouchPointState,
}

impl TouchPoint {
    /// Create a new touch point.
    pub fn new(id: u64, pos: Point, start_pos: Point, state: TouchPointState) -> Self {
        Self {
            id,
            pos,
            start_pos,
            state,
        }
    }
}

/// A multi-touch event carrying the full set of current contacts.
#[derive(Debug, Clone)]
pub struct TouchEvent {
    /// All contacts currently known to the platform.
    pub points: Vec<TouchPoint>,
    /// Keyboard modifiers held during the event.
    pub modifiers: KeyboardModifiers,
}

impl TouchEvent {
    /// Create a new touch event from a set of contacts.
    pub fn new(points: Vec<TouchPoint>, modifiers: KeyboardModifiers) -> Self {
        Self { points, modifiers }
    }

    /// Number of contacts in this event.
    pub fn touch_point_count(&self) -> usize {
        self.points.len()
    }

    /// Check whether any contact is in the given state.
    pub fn has_state(&self, state: TouchPointState) -> bool {
        self.points.iter().any(|p| p.state == state)
    }
}

/// Native gesture kinds reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeGestureKind {
    /// Trackpad pinch zoom.
    Zoom,
    /// Trackpad rotation.
    Rotate,
    /// Trackpad two-finger pan.
    Pan,
    /// Smart zoom (two-finger double tap on macOS).
    SmartZoom,
    /// Trackpad swipe.
    Swipe,
}

/// A native gesture event delivered by the OS gesture recognizer.
#[derive(Debug, Clone, Copy)]
pub struct NativeGestureEvent {
    /// The gesture kind.
    pub kind: NativeGestureKind,
    /// Gesture magnitude delta (zoom factor, rotation radians, ...).
    pub value: f64,
    /// Position in canvas-local coordinates.
    pub local_pos: Point,
    /// Keyboard modifiers held during the event.
    pub modifiers: KeyboardModifiers,
}

impl NativeGestureEvent {
    /// Create a new native gesture event.
    pub fn new(
        kind: NativeGestureKind,
        value: f64,
        local_pos: Point,
        modifiers: KeyboardModifiers,
    ) -> Self {
        Self {
            kind,
            value,
            local_pos,
            modifiers,
        }
    }
}

/// Enumeration of input events delivered to actions.
///
/// This is what an action's `begin`, `input_event`, and `end` receive.
/// Key presses do not appear here: key-triggered shortcuts fire without an
/// event payload.
#[derive(Debug, Clone)]
pub enum InputEvent {
    /// Pointer button press.
    PointerPress(PointerPressEvent),
    /// Pointer button release.
    PointerRelease(PointerReleaseEvent),
    /// Pointer move.
    PointerMove(PointerMoveEvent),
    /// Wheel scroll.
    Wheel(WheelEvent),
    /// Multi-touch update.
    Touch(TouchEvent),
    /// Native OS gesture.
    NativeGesture(NativeGestureEvent),
}

impl InputEvent {
    /// Canvas-local position of the event, when it has one.
    ///
    /// Touch events report the position of their first contact.
    pub fn local_pos(&self) -> Option<Point> {
        match self {
            Self::PointerPress(e) => Some(e.local_pos),
            Self::PointerRelease(e) => Some(e.local_pos),
            Self::PointerMove(e) => Some(e.local_pos),
            Self::Wheel(e) => Some(e.local_pos),
            Self::Touch(e) => e.points.first().map(|p| p.pos),
            Self::NativeGesture(e) => Some(e.local_pos),
        }
    }
}
