//! Shortcut descriptors: declarative match rules bound to actions.
//!
//! Four descriptor kinds exist, one per input modality:
//!
//! - [`SingleActionShortcut`]: fires once per discrete event (key press,
//!   wheel tick).
//! - [`StrokeShortcut`]: two-phase key+button combination driving a
//!   continuous stroke.
//! - [`TouchShortcut`]: multi-finger tap or drag.
//! - [`NativeGestureShortcut`]: OS-recognized trackpad gesture.
//!
//! Descriptors are registered with and owned by the
//! [`ShortcutMatcher`](crate::matcher::ShortcutMatcher); the matcher
//! consults their matching predicates and drives the referenced action.
//! Several descriptors may share one action through its `Arc`.
//!
//! [`KeySequence`] is the parsed form of a menu accelerator, used only to
//! suppress canvas shortcuts that would shadow application menus.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::action::{ActionGroup, ActionGroupMask, InputAction};
use crate::events::{
    InputEvent, Key, KeyboardModifiers, NativeGestureEvent, NativeGestureKind, Point,
    PointerButton, PointerReleaseEvent, TouchEvent, WheelAction,
};

/// The discrete trigger of a [`SingleActionShortcut`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SingleActionTrigger {
    /// A key press completes the shortcut.
    Key(Key),
    /// A classified wheel event completes the shortcut.
    Wheel(WheelAction),
}

/// A shortcut that fires its action once per discrete event.
///
/// Matches when the held-key set equals `keys` and the incoming trigger
/// (key press or wheel action) equals `trigger`.
pub struct SingleActionShortcut {
    action: Arc<dyn InputAction>,
    shortcut_index: usize,
    keys: HashSet<Key>,
    trigger: SingleActionTrigger,
    group: ActionGroup,
    priority: i32,
}

impl SingleActionShortcut {
    /// Create a new single-action shortcut.
    pub fn new(
        action: Arc<dyn InputAction>,
        shortcut_index: usize,
        keys: impl IntoIterator<Item = Key>,
        trigger: SingleActionTrigger,
        group: ActionGroup,
        priority: i32,
    ) -> Self {
        Self {
            action,
            shortcut_index,
            keys: keys.into_iter().collect(),
            trigger,
            group,
            priority,
        }
    }

    /// The action this shortcut drives.
    pub fn action(&self) -> &Arc<dyn InputAction> {
        &self.action
    }

    /// The index passed to the action's lifecycle methods.
    pub fn shortcut_index(&self) -> usize {
        self.shortcut_index
    }

    /// Dispatch priority; higher wins, ties go to earlier registration.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Whether this shortcut's group is eligible under the given mask.
    pub fn is_available(&self, mask: ActionGroupMask) -> bool {
        mask.contains(self.group)
    }

    /// Check whether the current key state plus the incoming trigger
    /// complete this shortcut.
    pub fn matches(&self, keys_state: &HashSet<Key>, trigger: SingleActionTrigger) -> bool {
        self.trigger == trigger && self.keys == *keys_state
    }

    /// Check whether this shortcut is shadowed by a menu accelerator.
    ///
    /// A key-triggered shortcut conflicts when its chord equals the first
    /// chord of the accelerator sequence (prefix-or-equal on chord lists).
    /// Wheel-triggered shortcuts never conflict.
    pub fn conflicts_with(&self, sequence: &KeySequence) -> bool {
        let SingleActionTrigger::Key(trigger) = self.trigger else {
            return false;
        };
        sequence
            .first()
            .is_some_and(|chord| chord.trigger == trigger && chord.keys == self.keys)
    }
}

impl fmt::Debug for SingleActionShortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleActionShortcut")
            .field("shortcut_index", &self.shortcut_index)
            .field("keys", &self.keys)
            .field("trigger", &self.trigger)
            .field("group", &self.group)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// A two-phase key+button shortcut driving a continuous stroke.
///
/// The shortcut becomes *ready* while its keys are held and a strict subset
/// of its buttons is pressed, and *begins* when the final required button
/// arrives.
pub struct StrokeShortcut {
    action: Arc<dyn InputAction>,
    shortcut_index: usize,
    keys: HashSet<Key>,
    buttons: HashSet<PointerButton>,
    group: ActionGroup,
    priority: i32,
}

impl StrokeShortcut {
    /// Create a new stroke shortcut.
    pub fn new(
        action: Arc<dyn InputAction>,
        shortcut_index: usize,
        keys: impl IntoIterator<Item = Key>,
        buttons: impl IntoIterator<Item = PointerButton>,
        group: ActionGroup,
        priority: i32,
    ) -> Self {
        Self {
            action,
            shortcut_index,
            keys: keys.into_iter().collect(),
            buttons: buttons.into_iter().collect(),
            group,
            priority,
        }
    }

    /// The action this shortcut drives.
    pub fn action(&self) -> &Arc<dyn InputAction> {
        &self.action
    }

    /// The index passed to the action's lifecycle methods.
    pub fn shortcut_index(&self) -> usize {
        self.shortcut_index
    }

    /// Dispatch priority; higher wins, ties go to earlier registration.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Whether this shortcut's group is eligible under the given mask.
    pub fn is_available(&self, mask: ActionGroupMask) -> bool {
        mask.contains(self.group)
    }

    /// Check whether this shortcut is armed by the current input state:
    /// keys match exactly and the held buttons are a strict subset of the
    /// required ones (the triggering button has not arrived yet).
    pub fn match_ready(&self, keys: &HashSet<Key>, buttons: &HashSet<PointerButton>) -> bool {
        self.keys == *keys
            && buttons.len() < self.buttons.len()
            && buttons.is_subset(&self.buttons)
    }

    /// Check whether pressing (or releasing) `button` completes this
    /// shortcut's button set: required buttons = held buttons ∪ {button},
    /// with keys matching exactly.
    pub fn match_begin(
        &self,
        keys: &HashSet<Key>,
        buttons: &HashSet<PointerButton>,
        button: PointerButton,
    ) -> bool {
        if self.keys != *keys || !self.buttons.contains(&button) {
            return false;
        }
        let expected = if buttons.contains(&button) {
            buttons.len()
        } else {
            buttons.len() + 1
        };
        self.buttons.len() == expected && buttons.is_subset(&self.buttons)
    }

    /// Synthesize the release event used to force-terminate a running
    /// stroke (focus loss, touch cancel).
    pub fn fake_end_event(&self, local_pos: Point) -> InputEvent {
        let button = self
            .buttons
            .iter()
            .min()
            .copied()
            .unwrap_or(PointerButton::Left);
        InputEvent::PointerRelease(PointerReleaseEvent::new(
            button,
            local_pos,
            local_pos,
            KeyboardModifiers::NONE,
        ))
    }
}

impl fmt::Debug for StrokeShortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrokeShortcut")
            .field("shortcut_index", &self.shortcut_index)
            .field("keys", &self.keys)
            .field("buttons", &self.buttons)
            .field("group", &self.group)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Touch gesture classification of a [`TouchShortcut`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchGestureKind {
    /// Fingers stay within the touch slop and lift.
    Tap,
    /// At least one finger travels beyond the touch slop.
    Drag,
}

/// A multi-finger tap or drag shortcut.
pub struct TouchShortcut {
    action: Arc<dyn InputAction>,
    shortcut_index: usize,
    gesture_kind: TouchGestureKind,
    min_touch_points: usize,
    max_touch_points: usize,
    group: ActionGroup,
    priority: i32,
}

impl TouchShortcut {
    /// Create a new touch shortcut matching `min_touch_points` to
    /// `max_touch_points` simultaneous contacts.
    pub fn new(
        action: Arc<dyn InputAction>,
        shortcut_index: usize,
        gesture_kind: TouchGestureKind,
        min_touch_points: usize,
        max_touch_points: usize,
        group: ActionGroup,
        priority: i32,
    ) -> Self {
        Self {
            action,
            shortcut_index,
            gesture_kind,
            min_touch_points,
            max_touch_points,
            group,
            priority,
        }
    }

    /// The action this shortcut drives.
    pub fn action(&self) -> &Arc<dyn InputAction> {
        &self.action
    }

    /// The index passed to the action's lifecycle methods.
    pub fn shortcut_index(&self) -> usize {
        self.shortcut_index
    }

    /// Dispatch priority; higher wins, ties go to earlier registration.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Whether this shortcut's group is eligible under the given mask.
    pub fn is_available(&self, mask: ActionGroupMask) -> bool {
        mask.contains(self.group)
    }

    fn matches_point_count(&self, event: &TouchEvent) -> bool {
        let n = event.touch_point_count();
        self.min_touch_points <= n && n <= self.max_touch_points
    }

    /// Check whether the event's contact count matches this shortcut as a
    /// tap gesture.
    pub fn match_tap(&self, event: &TouchEvent) -> bool {
        self.gesture_kind == TouchGestureKind::Tap && self.matches_point_count(event)
    }

    /// Check whether the event's contact count matches this shortcut as a
    /// drag gesture.
    pub fn match_drag(&self, event: &TouchEvent) -> bool {
        self.gesture_kind == TouchGestureKind::Drag && self.matches_point_count(event)
    }
}

impl fmt::Debug for TouchShortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TouchShortcut")
            .field("shortcut_index", &self.shortcut_index)
            .field("gesture_kind", &self.gesture_kind)
            .field("min_touch_points", &self.min_touch_points)
            .field("max_touch_points", &self.max_touch_points)
            .field("group", &self.group)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// A single-shot shortcut bound to an OS-recognized gesture kind.
pub struct NativeGestureShortcut {
    action: Arc<dyn InputAction>,
    shortcut_index: usize,
    kind: NativeGestureKind,
    group: ActionGroup,
    priority: i32,
}

impl NativeGestureShortcut {
    /// Create a new native gesture shortcut.
    pub fn new(
        action: Arc<dyn InputAction>,
        shortcut_index: usize,
        kind: NativeGestureKind,
        group: ActionGroup,
        priority: i32,
    ) -> Self {
        Self {
            action,
            shortcut_index,
            kind,
            group,
            priority,
        }
    }

    /// The action this shortcut drives.
    pub fn action(&self) -> &Arc<dyn InputAction> {
        &self.action
    }

    /// The index passed to the action's lifecycle methods.
    pub fn shortcut_index(&self) -> usize {
        self.shortcut_index
    }

    /// Dispatch priority; higher wins, ties go to earlier registration.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Whether this shortcut's group is eligible under the given mask.
    pub fn is_available(&self, mask: ActionGroupMask) -> bool {
        mask.contains(self.group)
    }

    /// Check whether the event's gesture kind matches.
    pub fn matches(&self, event: &NativeGestureEvent) -> bool {
        self.kind == event.kind
    }
}

impl fmt::Debug for NativeGestureShortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeGestureShortcut")
            .field("shortcut_index", &self.shortcut_index)
            .field("kind", &self.kind)
            .field("group", &self.group)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Menu accelerator sequences
// =============================================================================

/// A single chord of a menu accelerator: held keys plus the completing key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChord {
    /// Keys held while the chord completes (typically modifiers).
    pub keys: HashSet<Key>,
    /// The key that completes the chord.
    pub trigger: Key,
}

impl KeyChord {
    /// Create a new chord.
    pub fn new(keys: impl IntoIterator<Item = Key>, trigger: Key) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            trigger,
        }
    }
}

/// A parsed menu accelerator: one or more chords pressed in order.
///
/// Used by
/// [`ShortcutMatcher::suppress_conflicting_key_actions`](crate::matcher::ShortcutMatcher::suppress_conflicting_key_actions)
/// so that application menu accelerators take precedence over canvas
/// shortcuts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySequence {
    chords: Vec<KeyChord>,
}

impl KeySequence {
    /// Create a single-chord sequence.
    pub fn single(keys: impl IntoIterator<Item = Key>, trigger: Key) -> Self {
        Self {
            chords: vec![KeyChord::new(keys, trigger)],
        }
    }

    /// Create a sequence from explicit chords.
    pub fn from_chords(chords: Vec<KeyChord>) -> Self {
        Self { chords }
    }

    /// The first chord, if the sequence is non-empty.
    pub fn first(&self) -> Option<&KeyChord> {
        self.chords.first()
    }

    /// Number of chords in the sequence.
    pub fn count(&self) -> usize {
        self.chords.len()
    }
}

/// Error type for parsing key sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySequenceParseError {
    /// The string is empty.
    Empty,
    /// A chord named only modifiers, no completing key.
    NoTrigger,
    /// Unknown key name.
    UnknownKey(String),
}

impl fmt::Display for KeySequenceParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty key sequence"),
            Self::NoTrigger => write!(f, "no key specified (only modifiers)"),
            Self::UnknownKey(s) => write!(f, "unknown key: {}", s),
        }
    }
}

impl std::error::Error for KeySequenceParseError {}

impl FromStr for KeySequence {
    type Err = KeySequenceParseError;

    /// Parse an accelerator like `"Ctrl+C"` or the chord sequence
    /// `"Ctrl+K, Ctrl+C"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(KeySequenceParseError::Empty);
        }

        let mut chords = Vec::new();
        for part in s.split(',') {
            chords.push(parse_chord(part)?);
        }
        Ok(Self { chords })
    }
}

/// Parse a single chord from a string like "Ctrl+Shift+S".
fn parse_chord(s: &str) -> Result<KeyChord, KeySequenceParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(KeySequenceParseError::Empty);
    }

    let mut keys = HashSet::new();
    let mut trigger = None;

    for part in s.split('+') {
        let part = part.trim();
        match part.to_lowercase().as_str() {
            "ctrl" | "control" => {
                keys.insert(Key::Control);
            }
            "alt" | "option" => {
                keys.insert(Key::Alt);
            }
            "shift" => {
                keys.insert(Key::Shift);
            }
            "meta" | "cmd" | "command" | "super" => {
                keys.insert(Key::Meta);
            }
            _ => {
                trigger = Some(parse_key(part)?);
            }
        }
    }

    match trigger {
        Some(trigger) => Ok(KeyChord { keys, trigger }),
        None => Err(KeySequenceParseError::NoTrigger),
    }
}

/// Parse a key name to a [`Key`].
fn parse_key(s: &str) -> Result<Key, KeySequenceParseError> {
    if s.len() == 1 {
        let ch = s.chars().next().expect("non-empty").to_ascii_uppercase();
        return match ch {
            'A' => Ok(Key::A),
            'B' => Ok(Key::B),
            'C' => Ok(Key::C),
            'D' => Ok(Key::D),
            'E' => Ok(Key::E),
            'F' => Ok(Key::F),
            'G' => Ok(Key::G),
            'H' => Ok(Key::H),
            'I' => Ok(Key::I),
            'J' => Ok(Key::J),
            'K' => Ok(Key::K),
            'L' => Ok(Key::L),
            'M' => Ok(Key::M),
            'N' => Ok(Key::N),
            'O' => Ok(Key::O),
            'P' => Ok(Key::P),
            'Q' => Ok(Key::Q),
            'R' => Ok(Key::R),
            'S' => Ok(Key::S),
            'T' => Ok(Key::T),
            'U' => Ok(Key::U),
            'V' => Ok(Key::V),
            'W' => Ok(Key::W),
            'X' => Ok(Key::X),
            'Y' => Ok(Key::Y),
            'Z' => Ok(Key::Z),
            '0' => Ok(Key::Digit0),
            '1' => Ok(Key::Digit1),
            '2' => Ok(Key::Digit2),
            '3' => Ok(Key::Digit3),
            '4' => Ok(Key::Digit4),
            '5' => Ok(Key::Digit5),
            '6' => Ok(Key::Digit6),
            '7' => Ok(Key::Digit7),
            '8' => Ok(Key::Digit8),
            '9' => Ok(Key::Digit9),
            '-' => Ok(Key::Minus),
            '=' => Ok(Key::Equal),
            '[' => Ok(Key::BracketLeft),
            ']' => Ok(Key::BracketRight),
            '\\' => Ok(Key::Backslash),
            ';' => Ok(Key::Semicolon),
            '\'' => Ok(Key::Quote),
            ',' => Ok(Key::Comma),
            '.' => Ok(Key::Period),
            '/' => Ok(Key::Slash),
            '`' => Ok(Key::Grave),
            _ => Err(KeySequenceParseError::UnknownKey(s.to_string())),
        };
    }

    match s.to_lowercase().as_str() {
        "f1" => Ok(Key::F1),
        "f2" => Ok(Key::F2),
        "f3" => Ok(Key::F3),
        "f4" => Ok(Key::F4),
        "f5" => Ok(Key::F5),
        "f6" => Ok(Key::F6),
        "f7" => Ok(Key::F7),
        "f8" => Ok(Key::F8),
        "f9" => Ok(Key::F9),
        "f10" => Ok(Key::F10),
        "f11" => Ok(Key::F11),
        "f12" => Ok(Key::F12),
        "up" => Ok(Key::ArrowUp),
        "down" => Ok(Key::ArrowDown),
        "left" => Ok(Key::ArrowLeft),
        "right" => Ok(Key::ArrowRight),
        "home" => Ok(Key::Home),
        "end" => Ok(Key::End),
        "pageup" | "pgup" => Ok(Key::PageUp),
        "pagedown" | "pgdn" => Ok(Key::PageDown),
        "backspace" => Ok(Key::Backspace),
        "delete" | "del" => Ok(Key::Delete),
        "insert" | "ins" => Ok(Key::Insert),
        "enter" | "return" => Ok(Key::Enter),
        "tab" => Ok(Key::Tab),
        "space" | "spacebar" => Ok(Key::Space),
        "escape" | "esc" => Ok(Key::Escape),
        _ => Err(KeySequenceParseError::UnknownKey(s.to_string())),
    }
}
