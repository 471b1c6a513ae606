//! The action interface driven by the shortcut matcher.
//!
//! An [`InputAction`] is an opaque object performing the actual user-visible
//! work (painting, panning, zooming). The matcher drives it through a strict
//! lifecycle:
//!
//! ```text
//! activate -> begin -> input_event* -> end -> deactivate
//! ```
//!
//! `activate` and `deactivate` are always paired, as are `begin` and `end`.
//! An action may observe `activate` followed directly by `deactivate` when a
//! ready shortcut is abandoned before its triggering button arrives.
//!
//! The `shortcut_index` passed to the lifecycle methods tells the action
//! which of its registered behaviors was triggered (e.g. a pan action may
//! expose "pan", "pan left", "pan right" as indices 0..3).

use crate::events::InputEvent;

/// Coarse grouping of canvas actions, used to mask eligibility at runtime.
///
/// A modal canvas state (e.g. a transform tool overlay) can restrict input
/// to view-transform actions only by narrowing the [`ActionGroupMask`]
/// returned from the matcher's mask callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ActionGroup {
    /// Actions that only change the viewport (pan, zoom, rotate the view).
    ViewTransform = 0x1,
    /// Actions that modify the document (paint, erase, pick).
    Modifying = 0x2,
}

/// Bit-set of action groups currently eligible to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionGroupMask(u32);

impl ActionGroupMask {
    /// No groups eligible.
    pub const NONE: Self = Self(0);
    /// All groups eligible.
    pub const ALL: Self = Self(u32::MAX);

    /// A mask containing exactly one group.
    pub fn from_group(group: ActionGroup) -> Self {
        Self(group as u32)
    }

    /// This mask with the given group added.
    pub fn with(self, group: ActionGroup) -> Self {
        Self(self.0 | group as u32)
    }

    /// Check whether the given group is eligible under this mask.
    pub fn contains(self, group: ActionGroup) -> bool {
        self.0 & group as u32 != 0
    }
}

impl Default for ActionGroupMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// An object that performs work in response to matched shortcuts.
///
/// Methods take `&self`; implementors keep their mutable state behind
/// interior mutability. The matcher may call back into an action while one
/// of the matcher's own entry points is still on the stack (synchronous
/// re-entry through an event pump), so implementations must not assume
/// exclusive access to the matcher.
pub trait InputAction: Send + Sync {
    /// Prepare the action; may show cursor feedback. Always paired with
    /// [`deactivate`](Self::deactivate).
    fn activate(&self, shortcut_index: usize);

    /// Commence the interaction. `event` is `None` for key-triggered
    /// single-action shortcuts.
    fn begin(&self, shortcut_index: usize, event: Option<&InputEvent>);

    /// Receive continuous input (pointer move, touch update) while running.
    fn input_event(&self, event: &InputEvent);

    /// Finalise the interaction. `event` is `None` when no meaningful
    /// terminating event exists.
    fn end(&self, event: Option<&InputEvent>);

    /// Tear down whatever [`activate`](Self::activate) prepared.
    fn deactivate(&self, shortcut_index: usize);

    /// Whether this action wants sub-pixel resolution input events for the
    /// given shortcut index.
    fn supports_hi_res_input_events(&self, _shortcut_index: usize) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_contains() {
        let mask = ActionGroupMask::from_group(ActionGroup::ViewTransform);
        assert!(mask.contains(ActionGroup::ViewTransform));
        assert!(!mask.contains(ActionGroup::Modifying));

        let both = mask.with(ActionGroup::Modifying);
        assert!(both.contains(ActionGroup::ViewTransform));
        assert!(both.contains(ActionGroup::Modifying));
    }

    #[test]
    fn test_mask_defaults() {
        assert!(ActionGroupMask::default().contains(ActionGroup::Modifying));
        assert!(!ActionGroupMask::NONE.contains(ActionGroup::Modifying));
        assert!(!ActionGroupMask::NONE.contains(ActionGroup::ViewTransform));
    }
}
