//! Easel Input - shortcut matching for a canvas application.
//!
//! This crate is the input subsystem of the Easel canvas: it interprets
//! streams of low-level input events (keyboard, pointer buttons, wheel,
//! multi-touch, native OS gestures) and dispatches them to registered
//! actions according to priority and matching rules.
//!
//! # Architecture
//!
//! - [`events`] defines the event vocabulary ([`Key`], [`PointerButton`],
//!   [`TouchEvent`], ...) and the [`InputEvent`] payload handed to actions.
//! - [`action`] defines the [`InputAction`] lifecycle interface and the
//!   [`ActionGroupMask`] runtime eligibility filter.
//! - [`shortcut`] defines the four declarative descriptor kinds that bind
//!   match rules to actions.
//! - [`matcher`] houses the [`ShortcutMatcher`] state machine that ties it
//!   all together, one instance per canvas.
//! - [`platform`] converts winit events at the windowing boundary.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use easel_input::{
//!     ActionGroup, ShortcutMatcher, SingleActionShortcut, SingleActionTrigger, StrokeShortcut,
//! };
//! use easel_input::events::{Key, PointerButton};
//!
//! let matcher = ShortcutMatcher::new();
//!
//! // Space + left button drags the canvas around.
//! matcher.add_stroke_shortcut(StrokeShortcut::new(
//!     pan_action.clone(),
//!     0,
//!     [Key::Space],
//!     [PointerButton::Left],
//!     ActionGroup::ViewTransform,
//!     10,
//! ));
//!
//! // Ctrl+Z fires undo once per press.
//! matcher.add_single_action_shortcut(SingleActionShortcut::new(
//!     undo_action,
//!     0,
//!     [Key::Control],
//!     SingleActionTrigger::Key(Key::Z),
//!     ActionGroup::Modifying,
//!     0,
//! ));
//!
//! // Feed it platform events as they arrive.
//! matcher.enter_event();
//! matcher.key_pressed(Key::Space);
//! matcher.button_pressed(PointerButton::Left, &press_event);
//! ```
//!
//! # Logging
//!
//! Diagnostics are emitted through the `tracing` crate under the
//! `easel_input::matcher` target; install a subscriber to see them.

#![warn(missing_docs)]

pub mod action;
pub mod events;
pub mod matcher;
pub mod platform;
pub mod shortcut;

pub use action::{ActionGroup, ActionGroupMask, InputAction};
pub use events::{InputEvent, Key, KeyboardModifiers, Point, PointerButton, TouchEvent, WheelAction};
pub use matcher::{MatcherConfig, ShortcutMatcher};
pub use shortcut::{
    KeyChord, KeySequence, KeySequenceParseError, NativeGestureShortcut, SingleActionShortcut,
    SingleActionTrigger, StrokeShortcut, TouchGestureKind, TouchShortcut,
};
