//! The input shortcut matcher: a state machine turning raw input streams
//! into action lifecycles.
//!
//! [`ShortcutMatcher`] tracks the currently held keys and pointer buttons,
//! disambiguates competing shortcuts by priority and availability, and
//! drives each winning action through its
//! `activate -> begin -> input_event* -> end -> deactivate` lifecycle.
//! One matcher instance serves one canvas.
//!
//! # Stroke state machine
//!
//! Stroke shortcuts move through three states:
//!
//! ```text
//! Idle --(keys+partial buttons held)--> ReadyActivated --(final button)--> Running
//!   ^                                                                        |
//!   +-----------------------(completing button released)--------------------+
//! ```
//!
//! While a stroke is *ready* its action has received `activate` (so it can
//! show cursor feedback); `begin` only arrives with the completing button.
//!
//! # Re-entrancy
//!
//! The only concurrency hazard is synchronous re-entry: an action's `begin`
//! may pump its own event loop (e.g. to show a modal dialog) and feed
//! events back into the matcher while `begin` is still on the stack. Every
//! entry point registers itself with a scoped notifier; a nested entry
//! refuses to start new work, and the call site of the interrupted `begin`
//! detects the break and terminates the action immediately. State is kept
//! behind a lock that is never held across an action call, which is what
//! makes the nested entry possible at all.
//!
//! # Usage
//!
//! ```ignore
//! use easel_input::{ShortcutMatcher, StrokeShortcut, ActionGroup};
//! use easel_input::events::{Key, PointerButton};
//!
//! let matcher = ShortcutMatcher::new();
//! matcher.add_stroke_shortcut(StrokeShortcut::new(
//!     pan_action.clone(),
//!     0,
//!     [Key::Space],
//!     [PointerButton::Left],
//!     ActionGroup::ViewTransform,
//!     10,
//! ));
//!
//! // Feed platform events:
//! matcher.key_pressed(Key::Space);
//! matcher.button_pressed(PointerButton::Left, &press_event);
//! matcher.pointer_moved(&move_event);
//! matcher.button_released(PointerButton::Left, &release_event);
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::action::{ActionGroupMask, InputAction};
use crate::events::{
    InputEvent, Key, KeyboardModifiers, NativeGestureEvent, Point, PointerButton,
    PointerMoveEvent, PointerPressEvent, PointerReleaseEvent, TouchEvent, TouchPoint,
    TouchPointState, WheelAction, WheelEvent,
};
use crate::shortcut::{
    KeySequence, NativeGestureShortcut, SingleActionShortcut, SingleActionTrigger, StrokeShortcut,
    TouchShortcut,
};

/// Runtime configuration of the matcher.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Squared pixel displacement beyond which a touch becomes a drag.
    ///
    /// A delta of exactly this value still counts as a tap.
    pub touch_slop_squared: f32,
    /// Number of early touch updates buffered before a gesture commits.
    ///
    /// The buffer absorbs the latency between fingers of one gesture
    /// landing, so a three-finger tap is not misread as two-finger.
    pub touch_latency_iterations: u32,
    /// Match shortcuts even while the cursor is outside the canvas.
    ///
    /// Pen-capable platforms report hover exits while the stylus is still
    /// interacting; they set this to skip the cursor-entered check.
    pub ignore_cursor_entered: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            touch_slop_squared: 256.0,
            touch_latency_iterations: 10,
            ignore_cursor_entered: cfg!(target_os = "android"),
        }
    }
}

type MaskCallback = Box<dyn Fn() -> ActionGroupMask + Send + Sync>;

/// Mutable state of the matcher, kept behind a lock that is released
/// around every action call.
struct MatcherState {
    single_action_shortcuts: Vec<SingleActionShortcut>,
    suppressed_single_actions: HashSet<usize>,
    stroke_shortcuts: Vec<StrokeShortcut>,
    touch_shortcuts: Vec<TouchShortcut>,
    native_gesture_shortcuts: Vec<NativeGestureShortcut>,

    /// Model of currently pressed keys.
    keys: HashSet<Key>,
    /// Model of currently pressed pointer buttons.
    buttons: HashSet<PointerButton>,

    running_stroke: Option<usize>,
    ready_stroke: Option<usize>,
    candidate_strokes: Vec<usize>,

    running_touch: Option<usize>,
    running_native_gesture: Option<usize>,
    last_touch_points: Vec<TouchPoint>,

    max_touch_points: usize,
    matching_iteration: u32,
    touch_drag_detected: bool,
    best_candidate_touch_event: Option<TouchEvent>,

    suppress_all_actions: bool,
    cursor_entered: bool,
    using_touch: bool,
    using_native_gesture: bool,
}

impl MatcherState {
    fn new() -> Self {
        Self {
            single_action_shortcuts: Vec::new(),
            suppressed_single_actions: HashSet::new(),
            stroke_shortcuts: Vec::new(),
            touch_shortcuts: Vec::new(),
            native_gesture_shortcuts: Vec::new(),
            keys: HashSet::new(),
            buttons: HashSet::new(),
            running_stroke: None,
            ready_stroke: None,
            candidate_strokes: Vec::new(),
            running_touch: None,
            running_native_gesture: None,
            last_touch_points: Vec::new(),
            max_touch_points: 0,
            matching_iteration: 0,
            touch_drag_detected: false,
            best_candidate_touch_event: None,
            suppress_all_actions: false,
            cursor_entered: false,
            using_touch: false,
            using_native_gesture: false,
        }
    }

    fn is_using_touch(&self) -> bool {
        self.using_touch || self.using_native_gesture
    }

    fn actions_suppressed(&self, config: &MatcherConfig) -> bool {
        self.suppress_all_actions || (!config.ignore_cursor_entered && !self.cursor_entered)
    }

    fn actions_suppressed_ignore_focus(&self) -> bool {
        self.suppress_all_actions
    }

    fn reset_input_state(&mut self, reason: &str) {
        debug!(target: "easel_input::matcher", reason, "resetting held keys and buttons");
        self.keys.clear();
        self.buttons.clear();
    }
}

/// The shortcut matcher. See the [module documentation](self) for an
/// overview.
///
/// All entry points take `&self`; the matcher is internally synchronized
/// and re-entrant. Entry points return `bool` where the caller needs to
/// know whether the event was consumed.
pub struct ShortcutMatcher {
    state: RwLock<MatcherState>,
    mask_callback: RwLock<MaskCallback>,
    config: MatcherConfig,
    /// Depth of nested matcher entry points currently on the stack.
    recursion_depth: AtomicU32,
    /// Bumped by every entry; zeroed by a guard just before `begin` so the
    /// guard can tell whether anything re-entered underneath it.
    broken_by_recursion: AtomicU32,
}

/// Scoped marker registered by every public entry point.
///
/// Nested construction (depth > 1) means an action's `begin` has pumped the
/// event loop back into the matcher.
struct RecursionNotifier<'a> {
    matcher: &'a ShortcutMatcher,
}

impl<'a> RecursionNotifier<'a> {
    fn new(matcher: &'a ShortcutMatcher) -> Self {
        matcher.recursion_depth.fetch_add(1, Ordering::Relaxed);
        matcher.broken_by_recursion.fetch_add(1, Ordering::Relaxed);
        Self { matcher }
    }

    fn in_recursion(&self) -> bool {
        self.matcher.recursion_depth.load(Ordering::Relaxed) > 1
    }
}

impl Drop for RecursionNotifier<'_> {
    fn drop(&mut self) {
        self.matcher.recursion_depth.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Scoped probe wrapped around every `begin` call site.
///
/// Construction zeroes the break counter; after `begin` returns,
/// [`broken_by_recursion`](Self::broken_by_recursion) reports whether any
/// other matcher entry point ran nested inside it.
struct RecursionGuard<'a> {
    matcher: &'a ShortcutMatcher,
}

impl<'a> RecursionGuard<'a> {
    fn new(matcher: &'a ShortcutMatcher) -> Self {
        matcher.broken_by_recursion.store(0, Ordering::Relaxed);
        Self { matcher }
    }

    fn broken_by_recursion(&self) -> bool {
        self.matcher.broken_by_recursion.load(Ordering::Relaxed) > 0
    }
}

impl Default for ShortcutMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ShortcutMatcher {
    /// Create a matcher with the default configuration.
    pub fn new() -> Self {
        Self::with_config(MatcherConfig::default())
    }

    /// Create a matcher with an explicit configuration.
    pub fn with_config(config: MatcherConfig) -> Self {
        Self {
            state: RwLock::new(MatcherState::new()),
            mask_callback: RwLock::new(Box::new(|| ActionGroupMask::ALL)),
            config,
            recursion_depth: AtomicU32::new(0),
            broken_by_recursion: AtomicU32::new(0),
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a single-action shortcut.
    pub fn add_single_action_shortcut(&self, shortcut: SingleActionShortcut) {
        self.state.write().single_action_shortcuts.push(shortcut);
    }

    /// Register a stroke shortcut.
    pub fn add_stroke_shortcut(&self, shortcut: StrokeShortcut) {
        self.state.write().stroke_shortcuts.push(shortcut);
    }

    /// Register a touch shortcut.
    pub fn add_touch_shortcut(&self, shortcut: TouchShortcut) {
        self.state.write().touch_shortcuts.push(shortcut);
    }

    /// Register a native gesture shortcut.
    pub fn add_native_gesture_shortcut(&self, shortcut: NativeGestureShortcut) {
        self.state.write().native_gesture_shortcuts.push(shortcut);
    }

    /// Drop every registered shortcut and reset all matching state.
    ///
    /// Releases the shortcuts' action references. Any running or ready slot
    /// is cleared without further lifecycle calls.
    pub fn clear_shortcuts(&self) {
        let mut st = self.state.write();
        st.reset_input_state("clearing the shortcut catalogues");
        st.single_action_shortcuts.clear();
        st.suppressed_single_actions.clear();
        st.stroke_shortcuts.clear();
        st.touch_shortcuts.clear();
        st.native_gesture_shortcuts.clear();
        st.candidate_strokes.clear();
        st.running_stroke = None;
        st.ready_stroke = None;
        st.running_touch = None;
        st.running_native_gesture = None;
        st.best_candidate_touch_event = None;
    }

    /// Install the callback supplying the current action-group mask.
    pub fn set_action_group_mask_callback<F>(&self, callback: F)
    where
        F: Fn() -> ActionGroupMask + Send + Sync + 'static,
    {
        *self.mask_callback.write() = Box::new(callback);
    }

    /// Globally disable matching without disturbing key/button tracking.
    pub fn suppress_all_actions(&self, suppress: bool) {
        self.state.write().suppress_all_actions = suppress;
    }

    /// Hide every single-action shortcut whose chord is shadowed by one of
    /// the given menu accelerators, until the next call replaces the set.
    pub fn suppress_conflicting_key_actions(&self, sequences: &[KeySequence]) {
        let mut guard = self.state.write();
        let st = &mut *guard;
        st.suppressed_single_actions.clear();
        for (i, shortcut) in st.single_action_shortcuts.iter().enumerate() {
            if sequences.iter().any(|seq| shortcut.conflicts_with(seq)) {
                st.suppressed_single_actions.insert(i);
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether a stroke shortcut is currently running.
    pub fn has_running_shortcut(&self) -> bool {
        self.state.read().running_stroke.is_some()
    }

    /// Whether the currently running stroke or touch action wants
    /// sub-pixel resolution input events.
    pub fn supports_hi_res_input_events(&self) -> bool {
        let (stroke, touch) = {
            let st = self.state.read();
            let stroke = st
                .running_stroke
                .and_then(|i| st.stroke_shortcuts.get(i))
                .map(|s| (Arc::clone(s.action()), s.shortcut_index()));
            let touch = st
                .running_touch
                .and_then(|i| st.touch_shortcuts.get(i))
                .map(|s| (Arc::clone(s.action()), s.shortcut_index()));
            (stroke, touch)
        };
        stroke.is_some_and(|(action, index)| action.supports_hi_res_input_events(index))
            || touch.is_some_and(|(action, index)| action.supports_hi_res_input_events(index))
    }

    /// Audit the held-key model against an OS-reported modifier snapshot.
    ///
    /// Returns `false` when the model has drifted (e.g. a release was lost
    /// across a focus transition);
    /// [`recovery_modifiers_without_focus`](Self::recovery_modifiers_without_focus)
    /// reconciles it.
    pub fn sanity_check_modifiers_correctness(&self, modifiers: KeyboardModifiers) -> bool {
        let st = self.state.read();
        let check = |key: Key, held: bool| st.keys.contains(&key) == held;
        check(Key::Shift, modifiers.shift)
            && check(Key::Control, modifiers.control)
            && check(Key::Alt, modifiers.alt)
            && check(Key::Meta, modifiers.meta)
    }

    /// Snapshot of the currently held keys, for diagnostics.
    pub fn debug_pressed_keys(&self) -> Vec<Key> {
        self.state.read().keys.iter().copied().collect()
    }

    // =========================================================================
    // Keyboard entry points
    // =========================================================================

    /// Handle a key press. Returns `true` when a single-action shortcut
    /// fired.
    pub fn key_pressed(&self, key: Key) -> bool {
        let notifier = RecursionNotifier::new(self);
        let mut retval = false;

        let (running, already_held) = {
            let st = self.state.read();
            (st.running_stroke.is_some(), st.keys.contains(&key))
        };
        if already_held {
            debug!(target: "easel_input::matcher", ?key, "press recorded for a key that is already held");
        }

        if !running && !notifier.in_recursion() {
            let keys_state = self.state.read().keys.clone();
            retval =
                self.try_run_single_action_shortcut(SingleActionTrigger::Key(key), None, &keys_state);
        }

        self.state.write().keys.insert(key);

        self.update_ready_state(&notifier);
        retval
    }

    /// Handle an auto-repeated key press.
    ///
    /// The repeating key is excluded from the matched key state so that a
    /// held modifier combination keeps firing its shortcut.
    pub fn auto_repeated_key_pressed(&self, key: Key) -> bool {
        let notifier = RecursionNotifier::new(self);
        let mut retval = false;

        if !self.state.read().keys.contains(&key) {
            debug!(target: "easel_input::matcher", ?key, "autorepeat for a key that was never recorded as pressed");
        }

        if notifier.in_recursion() {
            self.force_deactivate_all_actions();
        } else if !self.has_running_shortcut() {
            let mut filtered = self.state.read().keys.clone();
            filtered.remove(&key);
            retval =
                self.try_run_single_action_shortcut(SingleActionTrigger::Key(key), None, &filtered);
        }

        retval
    }

    /// Handle a key release.
    pub fn key_released(&self, key: Key) -> bool {
        let notifier = RecursionNotifier::new(self);

        if !self.state.write().keys.remove(&key) {
            debug!(target: "easel_input::matcher", ?key, "release for a key that was never recorded as pressed");
        }

        self.update_ready_state(&notifier);
        false
    }

    // =========================================================================
    // Pointer entry points
    // =========================================================================

    /// Handle a pointer button press. Returns `true` when a stroke began.
    pub fn button_pressed(&self, button: PointerButton, event: &PointerPressEvent) -> bool {
        let notifier = RecursionNotifier::new(self);

        {
            let st = self.state.read();
            if st.is_using_touch() {
                return false;
            }
            if st.buttons.contains(&button) {
                debug!(target: "easel_input::matcher", ?button, "press recorded for a button that is already held");
            }
        }

        let mut retval = false;
        if !self.has_running_shortcut() && !notifier.in_recursion() {
            self.prepare_ready_shortcuts();
            let input = InputEvent::PointerPress(*event);
            retval = self.try_run_ready_shortcut(button, &input);
        }

        self.state.write().buttons.insert(button);

        self.update_ready_state(&notifier);
        retval
    }

    /// Handle a pointer button release. Returns `true` when a running
    /// stroke ended.
    pub fn button_released(&self, button: PointerButton, event: &PointerReleaseEvent) -> bool {
        let notifier = RecursionNotifier::new(self);

        if self.state.read().is_using_touch() {
            return false;
        }

        let mut retval = false;
        if self.has_running_shortcut() {
            if notifier.in_recursion() {
                warn!(target: "easel_input::matcher", ?button, "button release delivered re-entrantly while a stroke is running");
            } else {
                let input = InputEvent::PointerRelease(*event);
                retval = self.try_end_running_shortcut(button, &input);
            }
        }

        {
            let mut st = self.state.write();
            if !st.buttons.remove(&button) {
                st.reset_input_state("release for a button that was never recorded as pressed");
            }
        }

        self.update_ready_state(&notifier);
        retval
    }

    /// Forward a pointer move to the running stroke's action.
    pub fn pointer_moved(&self, event: &PointerMoveEvent) -> bool {
        let notifier = RecursionNotifier::new(self);

        let running = {
            let st = self.state.read();
            if st.is_using_touch() {
                return false;
            }
            st.running_stroke
        };
        if notifier.in_recursion() {
            return false;
        }
        let Some(idx) = running else {
            return false;
        };
        let Some((action, _)) = self.stroke_action(idx) else {
            return false;
        };
        action.input_event(&InputEvent::PointerMove(*event));
        true
    }

    /// Handle a direction-classified wheel event. Returns `true` when a
    /// wheel shortcut fired.
    pub fn wheel_event(&self, wheel_action: WheelAction, event: &WheelEvent) -> bool {
        let notifier = RecursionNotifier::new(self);

        {
            let st = self.state.read();
            if st.running_stroke.is_some() || st.is_using_touch() {
                debug!(target: "easel_input::matcher", "wheel event dropped");
                return false;
            }
        }
        if notifier.in_recursion() {
            debug!(target: "easel_input::matcher", "wheel event dropped in recursion");
            return false;
        }

        let keys_state = self.state.read().keys.clone();
        let input = InputEvent::Wheel(*event);
        self.try_run_single_action_shortcut(
            SingleActionTrigger::Wheel(wheel_action),
            Some(&input),
            &keys_state,
        )
    }

    // =========================================================================
    // Focus entry points
    // =========================================================================

    /// The pointer entered the canvas focus region.
    pub fn enter_event(&self) {
        let notifier = RecursionNotifier::new(self);
        self.state.write().cursor_entered = true;
        self.update_ready_state(&notifier);
    }

    /// The pointer left the canvas focus region.
    pub fn leave_event(&self) {
        let notifier = RecursionNotifier::new(self);
        self.state.write().cursor_entered = false;
        self.update_ready_state(&notifier);
    }

    /// The canvas lost keyboard focus. Any running stroke is force-ended
    /// with a synthetic release at `local_pos`, and the ready slot is
    /// deactivated.
    pub fn lost_focus_event(&self, local_pos: Point) {
        let _notifier = RecursionNotifier::new(self);

        if self.has_running_shortcut() {
            self.force_end_running_shortcut(local_pos);
        }
        self.force_deactivate_all_actions();
    }

    /// A tool was (re)activated; recompute the ready shortcut so its cursor
    /// feedback appears immediately.
    pub fn tool_has_been_activated(&self) {
        let notifier = RecursionNotifier::new(self);
        self.update_ready_state(&notifier);
    }

    // =========================================================================
    // State recovery entry points
    // =========================================================================

    /// Terminate anything in flight and forget all held keys and buttons.
    ///
    /// Idempotent; used when the OS event stream is known to have gapped.
    pub fn reinitialize(&self) {
        let notifier = RecursionNotifier::new(self);

        self.terminate_in_flight_actions(Point::ZERO);
        self.state.write().reset_input_state("reinitializing the input state");

        self.update_ready_state(&notifier);
    }

    /// Forget all held buttons, force-ending a running stroke first.
    pub fn reinitialize_buttons(&self) {
        let notifier = RecursionNotifier::new(self);

        if self.has_running_shortcut() {
            self.force_end_running_shortcut(Point::ZERO);
        }
        {
            let mut st = self.state.write();
            debug!(target: "easel_input::matcher", "reinitializing the pointer button state");
            st.buttons.clear();
        }

        self.update_ready_state(&notifier);
    }

    /// Reconcile the held-key model with the set of keys the OS reports as
    /// held after a focus transition, synthesizing the missing press and
    /// release events.
    pub fn recovery_modifiers_without_focus(&self, keys: &[Key]) {
        let held: Vec<Key> = self.state.read().keys.iter().copied().collect();
        for key in held {
            if !keys.contains(&key) {
                self.key_released(key);
            }
        }
        for &key in keys {
            if !self.state.read().keys.contains(&key) {
                self.key_pressed(key);
            }
        }

        let notifier = RecursionNotifier::new(self);
        self.update_ready_state(&notifier);
    }

    // =========================================================================
    // Touch entry points
    // =========================================================================

    /// Begin a touch sequence: reset disambiguation state and snapshot the
    /// event as the initial best candidate.
    pub fn touch_begin_event(&self, event: &TouchEvent) -> bool {
        let notifier = RecursionNotifier::new(self);

        {
            let mut st = self.state.write();
            st.last_touch_points = event.points.clone();
            st.max_touch_points = event.touch_point_count();
            st.matching_iteration = 1;
            st.touch_drag_detected = false;
            st.best_candidate_touch_event = Some(event.clone());
        }

        !notifier.in_recursion()
    }

    /// Process a touch update: detect drags, buffer the early latency
    /// window, and run or forward to the matching touch shortcut.
    pub fn touch_update_event(&self, event: &TouchEvent) -> bool {
        let _notifier = RecursionNotifier::new(self);

        let touch_point_count = event.touch_point_count();

        let (drag_detected, in_early_window) = {
            let mut st = self.state.write();
            if !st.touch_drag_detected {
                for point in &event.points {
                    if point.start_pos.distance_squared_to(point.pos) > self.config.touch_slop_squared
                    {
                        st.touch_drag_detected = true;
                        break;
                    }
                }
            }

            // The first few updates are buffered so that a two-finger match
            // does not fire before a third finger of the same gesture lands.
            let in_early_window = st.matching_iteration <= self.config.touch_latency_iterations
                && !st.touch_drag_detected;
            if in_early_window {
                st.matching_iteration += 1;
                if touch_point_count >= st.max_touch_points {
                    st.max_touch_points = touch_point_count;
                    st.best_candidate_touch_event = Some(event.clone());
                }
            }
            (st.touch_drag_detected, in_early_window)
        };

        if in_early_window {
            let best = self.state.read().best_candidate_touch_event.clone();
            return best.is_some_and(|e| self.match_touch_shortcut(&e).is_some());
        }

        let mut retval = false;

        if drag_detected {
            let mismatched = {
                let st = self.state.read();
                st.running_touch
                    .and_then(|i| st.touch_shortcuts.get(i))
                    .is_some_and(|s| !s.match_drag(event))
            };
            if mismatched {
                // The contact count changed out from under the running
                // shortcut; end it so a better match can take over.
                retval = self.try_end_touch_shortcut(event);
            }

            let (running, max_touch_points) = {
                let st = self.state.read();
                (st.running_touch, st.max_touch_points)
            };
            if running.is_none() && touch_point_count >= max_touch_points {
                self.state.write().max_touch_points = touch_point_count;
                retval = self.try_run_touch_shortcut(event);
            } else if let Some(idx) = running {
                if let Some((action, shortcut_index)) = self.touch_action(idx) {
                    let input = InputEvent::Touch(event.clone());
                    if event.has_state(TouchPointState::Pressed) {
                        // A pressed contact after the shortcut matched means
                        // a finger was lifted and came back down; tell the
                        // action the interaction restarted.
                        action.begin(shortcut_index, Some(&input));
                    } else if event.has_state(TouchPointState::Released) {
                        action.end(Some(&input));
                    } else {
                        action.input_event(&input);
                    }
                    retval = true;
                }
            }
        } else if event.has_state(TouchPointState::Released) {
            let max_touch_points = self.state.read().max_touch_points;
            if max_touch_points <= touch_point_count {
                self.state.write().max_touch_points = touch_point_count;
                self.fire_ready_touch_shortcut(event);
                self.state.write().best_candidate_touch_event = None;
            }
        }

        retval
    }

    /// End a touch sequence: fire a pending tap candidate and end any
    /// running touch shortcut.
    pub fn touch_end_event(&self, event: &TouchEvent) -> bool {
        let _notifier = RecursionNotifier::new(self);

        let best = {
            let mut st = self.state.write();
            // The platform sends no further touch events for this sequence.
            st.using_touch = false;
            st.max_touch_points = 0;
            if st.touch_drag_detected {
                None
            } else {
                st.best_candidate_touch_event.clone()
            }
        };
        if let Some(best) = best {
            self.fire_ready_touch_shortcut(&best);
        }

        self.try_end_touch_shortcut(event)
    }

    /// The OS cancelled the touch sequence. Force-end a running stroke at
    /// `local_pos` and terminate a running touch shortcut with a synthetic
    /// event carrying the last known contacts (the OS cancel event may have
    /// been stripped of its points).
    pub fn touch_cancel_event(&self, event: &TouchEvent, local_pos: Point) {
        let _notifier = RecursionNotifier::new(self);

        {
            let mut st = self.state.write();
            st.using_touch = false;
            st.max_touch_points = 0;
        }

        if self.has_running_shortcut() {
            self.force_end_running_shortcut(local_pos);
        }

        let taken = {
            let mut st = self.state.write();
            st.running_touch
                .take()
                .map(|idx| (idx, st.last_touch_points.clone()))
        };
        if let Some((idx, points)) = taken {
            if let Some((action, shortcut_index)) = self.touch_action(idx) {
                let synthetic = TouchEvent::new(points, event.modifiers);
                action.end(Some(&InputEvent::Touch(synthetic)));
                action.deactivate(shortcut_index);
            }
        }
    }

    /// Restore the default pointer-driven ready state after a touch
    /// sequence hands control back to the pointer.
    pub fn touch_reset_state_for_pointer_events(&self) {
        let _notifier = RecursionNotifier::new(self);

        // The touch engine already deactivated whatever was ready.
        self.state.write().ready_stroke = None;
        self.prepare_ready_shortcuts();
        self.try_activate_ready_shortcut();
    }

    // =========================================================================
    // Native gesture entry points
    // =========================================================================

    /// The OS began recognizing a native gesture.
    pub fn native_gesture_begin_event(&self, _event: &NativeGestureEvent) -> bool {
        let notifier = RecursionNotifier::new(self);
        !notifier.in_recursion()
    }

    /// Process a native gesture update: run the matching shortcut or
    /// forward to the one already running.
    pub fn native_gesture_event(&self, event: &NativeGestureEvent) -> bool {
        let _notifier = RecursionNotifier::new(self);

        let running = self.state.read().running_native_gesture;
        match running {
            None => self.try_run_native_gesture_shortcut(event),
            Some(idx) => {
                if let Some((action, _)) = self.native_gesture_action(idx) {
                    action.input_event(&InputEvent::NativeGesture(*event));
                }
                true
            }
        }
    }

    /// The OS finished the native gesture; end the running shortcut.
    pub fn native_gesture_end_event(&self, event: &NativeGestureEvent) -> bool {
        let _notifier = RecursionNotifier::new(self);

        self.try_end_native_gesture_shortcut(event);
        self.state.write().using_native_gesture = false;
        true
    }

    // =========================================================================
    // Single-action dispatch
    // =========================================================================

    fn try_run_single_action_shortcut(
        &self,
        trigger: SingleActionTrigger,
        event: Option<&InputEvent>,
        keys_state: &HashSet<Key>,
    ) -> bool {
        if self.state.read().actions_suppressed_ignore_focus() {
            debug!(target: "easel_input::matcher", "single-action dispatch suppressed");
            return false;
        }

        let mask = self.current_mask();
        let winner = {
            let st = self.state.read();
            let mut best: Option<usize> = None;
            for (i, shortcut) in st.single_action_shortcuts.iter().enumerate() {
                if st.suppressed_single_actions.contains(&i) {
                    continue;
                }
                if !shortcut.is_available(mask) || !shortcut.matches(keys_state, trigger) {
                    continue;
                }
                if best.map_or(true, |b| {
                    shortcut.priority() > st.single_action_shortcuts[b].priority()
                }) {
                    best = Some(i);
                }
            }
            best
        };

        let Some(idx) = winner else {
            return false;
        };
        let Some((action, shortcut_index)) = self.single_action(idx) else {
            return false;
        };
        action.begin(shortcut_index, event);
        action.end(None);
        true
    }

    // =========================================================================
    // Stroke engine
    // =========================================================================

    /// Recompute the candidate strokes from the held keys and buttons.
    fn prepare_ready_shortcuts(&self) {
        let mut guard = self.state.write();
        let st = &mut *guard;
        st.candidate_strokes.clear();
        if st.actions_suppressed(&self.config) {
            return;
        }
        let keys = &st.keys;
        let buttons = &st.buttons;
        st.candidate_strokes = st
            .stroke_shortcuts
            .iter()
            .enumerate()
            .filter(|(_, s)| s.match_ready(keys, buttons))
            .map(|(i, _)| i)
            .collect();
    }

    /// Activate the best candidate as the ready shortcut, swapping out a
    /// previously ready one if the winner changed.
    fn try_activate_ready_shortcut(&self) {
        let (winner, prev_ready) = {
            let st = self.state.read();
            let mut best: Option<usize> = None;
            for &i in &st.candidate_strokes {
                if best.map_or(true, |b| {
                    st.stroke_shortcuts[i].priority() > st.stroke_shortcuts[b].priority()
                }) {
                    best = Some(i);
                }
            }
            (best, st.ready_stroke)
        };

        match winner {
            Some(winner) => {
                if prev_ready == Some(winner) {
                    return;
                }
                if let Some(prev) = prev_ready {
                    self.state.write().ready_stroke = None;
                    if let Some((action, index)) = self.stroke_action(prev) {
                        action.deactivate(index);
                    }
                }
                if let Some((action, index)) = self.stroke_action(winner) {
                    action.activate(index);
                }
                self.state.write().ready_stroke = Some(winner);
            }
            None => {
                let prev = self.state.write().ready_stroke.take();
                if let Some(prev) = prev {
                    if let Some((action, index)) = self.stroke_action(prev) {
                        action.deactivate(index);
                    }
                }
            }
        }
    }

    /// Promote the best candidate whose button set is completed by
    /// `button` to the running stroke and begin it.
    fn try_run_ready_shortcut(&self, button: PointerButton, event: &InputEvent) -> bool {
        let mask = self.current_mask();
        let winner = {
            let st = self.state.read();
            let mut best: Option<usize> = None;
            for &i in &st.candidate_strokes {
                let shortcut = &st.stroke_shortcuts[i];
                if shortcut.is_available(mask)
                    && shortcut.match_begin(&st.keys, &st.buttons, button)
                    && best.map_or(true, |b| {
                        shortcut.priority() > st.stroke_shortcuts[b].priority()
                    })
                {
                    best = Some(i);
                }
            }
            best
        };

        let Some(winner) = winner else {
            return self.has_running_shortcut();
        };

        let prev_ready = self.state.write().ready_stroke.take();
        match prev_ready {
            // Already activated while it was the ready shortcut.
            Some(ready) if ready == winner => {}
            Some(ready) => {
                if let Some((action, index)) = self.stroke_action(ready) {
                    action.deactivate(index);
                }
                if let Some((action, index)) = self.stroke_action(winner) {
                    action.activate(index);
                }
            }
            None => {
                if let Some((action, index)) = self.stroke_action(winner) {
                    action.activate(index);
                }
            }
        }

        self.state.write().running_stroke = Some(winner);
        if let Some((action, shortcut_index)) = self.stroke_action(winner) {
            let guard = RecursionGuard::new(self);
            action.begin(shortcut_index, Some(event));

            // The action might have opened a dialog whose event loop fed
            // events back into us; the interaction is already over.
            if guard.broken_by_recursion() {
                action.end(Some(event));
                self.state.write().running_stroke = None;
                action.deactivate(shortcut_index);
                self.force_deactivate_all_actions();
            }
        }

        self.has_running_shortcut()
    }

    /// End the running stroke if releasing `button` completes its match.
    fn try_end_running_shortcut(&self, button: PointerButton, event: &InputEvent) -> bool {
        {
            let st = self.state.read();
            if st.running_stroke.is_none() {
                warn!(target: "easel_input::matcher", "asked to end a stroke but none is running");
                return true;
            }
            let inconsistent = st.ready_stroke.is_some();
            drop(st);
            if inconsistent {
                warn!(target: "easel_input::matcher", "running and ready strokes were set at the same time");
                self.force_deactivate_all_actions();
            }
        }

        let finished = {
            let mut st = self.state.write();
            match st.running_stroke {
                Some(idx)
                    if st
                        .stroke_shortcuts
                        .get(idx)
                        .is_some_and(|s| s.match_begin(&st.keys, &st.buttons, button)) =>
                {
                    // Clear the slot before calling out so re-entry from
                    // end() cannot find a half-dead stroke.
                    st.running_stroke = None;
                    Some(idx)
                }
                _ => None,
            }
        };

        if let Some(idx) = finished {
            if let Some((action, shortcut_index)) = self.stroke_action(idx) {
                action.end(Some(event));
                action.deactivate(shortcut_index);
            }
        }

        !self.has_running_shortcut()
    }

    /// Force-terminate the running stroke with a synthetic release at
    /// `local_pos`.
    fn force_end_running_shortcut(&self, local_pos: Point) {
        {
            let st = self.state.read();
            if st.running_stroke.is_none() {
                warn!(target: "easel_input::matcher", "asked to force-end a stroke but none is running");
                return;
            }
            let inconsistent = st.ready_stroke.is_some();
            drop(st);
            if inconsistent {
                warn!(target: "easel_input::matcher", "running and ready strokes were set at the same time");
                self.force_deactivate_all_actions();
            }
        }

        let taken = self.state.write().running_stroke.take();
        if let Some(idx) = taken {
            let ending = {
                let st = self.state.read();
                st.stroke_shortcuts.get(idx).map(|s| {
                    (
                        s.fake_end_event(local_pos),
                        Arc::clone(s.action()),
                        s.shortcut_index(),
                    )
                })
            };
            if let Some((fake_event, action, shortcut_index)) = ending {
                action.end(Some(&fake_event));
                action.deactivate(shortcut_index);
            }
        }
    }

    /// Deactivate the ready shortcut, if any.
    fn force_deactivate_all_actions(&self) {
        let taken = self.state.write().ready_stroke.take();
        if let Some(idx) = taken {
            if let Some((action, index)) = self.stroke_action(idx) {
                action.deactivate(index);
            }
        }
    }

    /// Shared tail of most entry points: a nested invocation tears the
    /// ready state down, a top-level one recomputes it.
    fn update_ready_state(&self, notifier: &RecursionNotifier<'_>) {
        if notifier.in_recursion() {
            self.force_deactivate_all_actions();
        } else if !self.has_running_shortcut() {
            self.prepare_ready_shortcuts();
            self.try_activate_ready_shortcut();
        }
    }

    // =========================================================================
    // Touch engine
    // =========================================================================

    /// Select the highest-priority touch shortcut matching the event under
    /// the current drag/tap classification.
    fn match_touch_shortcut(&self, event: &TouchEvent) -> Option<usize> {
        let mask = self.current_mask();
        let st = self.state.read();
        let drag = st.touch_drag_detected;
        let mut best: Option<usize> = None;
        for (i, shortcut) in st.touch_shortcuts.iter().enumerate() {
            let kind_matches = if drag {
                shortcut.match_drag(event)
            } else {
                shortcut.match_tap(event)
            };
            if shortcut.is_available(mask)
                && kind_matches
                && best.map_or(true, |b| shortcut.priority() > st.touch_shortcuts[b].priority())
            {
                best = Some(i);
            }
        }
        best
    }

    /// Run the matching touch shortcut as a continuous (drag) interaction.
    fn try_run_touch_shortcut(&self, event: &TouchEvent) -> bool {
        let winner = self.match_touch_shortcut(event);

        if self.state.read().actions_suppressed(&self.config) {
            return false;
        }
        let Some(winner) = winner else {
            return self.state.read().running_touch.is_some();
        };

        if self.has_running_shortcut() {
            // A pointer stroke was in flight; synthesize a release so it
            // can finish before touch takes over.
            let released: Vec<TouchPoint> = event
                .points
                .iter()
                .map(|p| TouchPoint {
                    state: TouchPointState::Released,
                    ..*p
                })
                .collect();
            let synthetic = InputEvent::Touch(TouchEvent::new(released, event.modifiers));
            self.try_end_running_shortcut(PointerButton::Left, &synthetic);
        }

        // Touch matching bypasses the key/button state machine, so an
        // activated ready shortcut must be let go first.
        let prev_ready = self.state.write().ready_stroke.take();
        if let Some(ready) = prev_ready {
            if let Some((action, index)) = self.stroke_action(ready) {
                action.deactivate(index);
            }
        }

        {
            let mut st = self.state.write();
            st.running_touch = Some(winner);
            st.using_touch = true;
        }

        if let Some((action, shortcut_index)) = self.touch_action(winner) {
            let guard = RecursionGuard::new(self);
            let input = InputEvent::Touch(event.clone());
            action.activate(shortcut_index);
            action.begin(shortcut_index, Some(&input));

            if guard.broken_by_recursion() {
                action.end(Some(&input));
                self.state.write().running_touch = None;
                action.deactivate(shortcut_index);
                self.force_deactivate_all_actions();
            }
        }

        self.state.read().running_touch.is_some()
    }

    /// End the running touch shortcut, if any.
    fn try_end_touch_shortcut(&self, event: &TouchEvent) -> bool {
        let taken = self.state.write().running_touch.take();
        let Some(idx) = taken else {
            return false;
        };
        if let Some((action, shortcut_index)) = self.touch_action(idx) {
            action.end(Some(&InputEvent::Touch(event.clone())));
            action.deactivate(shortcut_index);
        }
        true
    }

    /// Fire the matching touch shortcut as a one-shot tap: the full
    /// lifecycle runs synchronously.
    fn fire_ready_touch_shortcut(&self, event: &TouchEvent) {
        let Some(idx) = self.match_touch_shortcut(event) else {
            return;
        };
        if let Some((action, shortcut_index)) = self.touch_action(idx) {
            let input = InputEvent::Touch(event.clone());
            action.activate(shortcut_index);
            action.begin(shortcut_index, Some(&input));
            action.end(Some(&input));
            action.deactivate(shortcut_index);
        }
    }

    // =========================================================================
    // Native gesture engine
    // =========================================================================

    fn try_run_native_gesture_shortcut(&self, event: &NativeGestureEvent) -> bool {
        if self.state.read().actions_suppressed(&self.config) {
            return false;
        }

        let mask = self.current_mask();
        let winner = {
            let st = self.state.read();
            let mut best: Option<usize> = None;
            for (i, shortcut) in st.native_gesture_shortcuts.iter().enumerate() {
                if shortcut.is_available(mask)
                    && shortcut.matches(event)
                    && best.map_or(true, |b| {
                        shortcut.priority() > st.native_gesture_shortcuts[b].priority()
                    })
                {
                    best = Some(i);
                }
            }
            best
        };
        let Some(winner) = winner else {
            return self.state.read().running_native_gesture.is_some();
        };

        {
            let mut st = self.state.write();
            st.running_native_gesture = Some(winner);
            st.using_native_gesture = true;
        }

        if let Some((action, shortcut_index)) = self.native_gesture_action(winner) {
            let guard = RecursionGuard::new(self);
            let input = InputEvent::NativeGesture(*event);
            action.activate(shortcut_index);
            action.begin(shortcut_index, Some(&input));

            if guard.broken_by_recursion() {
                action.end(Some(&input));
                self.state.write().running_native_gesture = None;
                action.deactivate(shortcut_index);
                self.force_deactivate_all_actions();
            }
        }

        self.state.read().running_native_gesture.is_some()
    }

    fn try_end_native_gesture_shortcut(&self, event: &NativeGestureEvent) -> bool {
        let taken = self.state.write().running_native_gesture.take();
        let Some(idx) = taken else {
            return false;
        };
        if let Some((action, shortcut_index)) = self.native_gesture_action(idx) {
            action.end(Some(&InputEvent::NativeGesture(*event)));
            action.deactivate(shortcut_index);
        }
        true
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    /// Terminate every in-flight interaction (stroke, touch, native
    /// gesture) through the forced-end paths.
    fn terminate_in_flight_actions(&self, local_pos: Point) {
        if self.has_running_shortcut() {
            self.force_end_running_shortcut(local_pos);
        }

        let touch = {
            let mut st = self.state.write();
            st.using_touch = false;
            st.running_touch
                .take()
                .map(|idx| (idx, st.last_touch_points.clone()))
        };
        if let Some((idx, points)) = touch {
            if let Some((action, shortcut_index)) = self.touch_action(idx) {
                let synthetic = TouchEvent::new(points, KeyboardModifiers::NONE);
                action.end(Some(&InputEvent::Touch(synthetic)));
                action.deactivate(shortcut_index);
            }
        }

        let native = {
            let mut st = self.state.write();
            st.using_native_gesture = false;
            st.running_native_gesture.take()
        };
        if let Some(idx) = native {
            if let Some((action, shortcut_index)) = self.native_gesture_action(idx) {
                action.end(None);
                action.deactivate(shortcut_index);
            }
        }
    }

    fn current_mask(&self) -> ActionGroupMask {
        (self.mask_callback.read())()
    }

    fn single_action(&self, idx: usize) -> Option<(Arc<dyn InputAction>, usize)> {
        let st = self.state.read();
        st.single_action_shortcuts
            .get(idx)
            .map(|s| (Arc::clone(s.action()), s.shortcut_index()))
    }

    fn stroke_action(&self, idx: usize) -> Option<(Arc<dyn InputAction>, usize)> {
        let st = self.state.read();
        st.stroke_shortcuts
            .get(idx)
            .map(|s| (Arc::clone(s.action()), s.shortcut_index()))
    }

    fn touch_action(&self, idx: usize) -> Option<(Arc<dyn InputAction>, usize)> {
        let st = self.state.read();
        st.touch_shortcuts
            .get(idx)
            .map(|s| (Arc::clone(s.action()), s.shortcut_index()))
    }

    fn native_gesture_action(&self, idx: usize) -> Option<(Arc<dyn InputAction>, usize)> {
        let st = self.state.read();
        st.native_gesture_shortcuts
            .get(idx)
            .map(|s| (Arc::clone(s.action()), s.shortcut_index()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionGroup;
    use crate::shortcut::TouchGestureKind;
    use parking_lot::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Activate(usize),
        Begin(usize),
        Input,
        End,
        Deactivate(usize),
    }

    #[derive(Default)]
    struct RecordingAction {
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingAction {
        fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().clone()
        }

        fn clear(&self) {
            self.calls.lock().clear();
        }
    }

    impl InputAction for RecordingAction {
        fn activate(&self, shortcut_index: usize) {
            self.calls.lock().push(Call::Activate(shortcut_index));
        }

        fn begin(&self, shortcut_index: usize, _event: Option<&InputEvent>) {
            self.calls.lock().push(Call::Begin(shortcut_index));
        }

        fn input_event(&self, _event: &InputEvent) {
            self.calls.lock().push(Call::Input);
        }

        fn end(&self, _event: Option<&InputEvent>) {
            self.calls.lock().push(Call::End);
        }

        fn deactivate(&self, shortcut_index: usize) {
            self.calls.lock().push(Call::Deactivate(shortcut_index));
        }
    }

    fn entered_matcher() -> ShortcutMatcher {
        let matcher = ShortcutMatcher::new();
        matcher.enter_event();
        matcher
    }

    fn press(button: PointerButton) -> PointerPressEvent {
        PointerPressEvent::new(button, Point::ZERO, Point::ZERO, KeyboardModifiers::NONE)
    }

    fn release(button: PointerButton) -> PointerReleaseEvent {
        PointerReleaseEvent::new(button, Point::ZERO, Point::ZERO, KeyboardModifiers::NONE)
    }

    fn touch_point(id: u64, start: Point, pos: Point, state: TouchPointState) -> TouchPoint {
        TouchPoint::new(id, pos, start, state)
    }

    fn touch(points: Vec<TouchPoint>) -> TouchEvent {
        TouchEvent::new(points, KeyboardModifiers::NONE)
    }

    fn stationary_touch(count: usize) -> TouchEvent {
        let points = (0..count)
            .map(|i| {
                touch_point(
                    i as u64,
                    Point::ZERO,
                    Point::ZERO,
                    TouchPointState::Stationary,
                )
            })
            .collect();
        touch(points)
    }

    #[test]
    fn test_single_action_fires_begin_then_end() {
        let matcher = entered_matcher();
        let action = RecordingAction::new();
        matcher.add_single_action_shortcut(SingleActionShortcut::new(
            action.clone(),
            0,
            [Key::Control],
            SingleActionTrigger::Key(Key::Z),
            ActionGroup::Modifying,
            0,
        ));

        assert!(!matcher.key_pressed(Key::Control));
        assert!(matcher.key_pressed(Key::Z));
        assert_eq!(action.calls(), vec![Call::Begin(0), Call::End]);
    }

    #[test]
    fn test_duplicate_key_press_does_not_refire() {
        let matcher = entered_matcher();
        let action = RecordingAction::new();
        matcher.add_single_action_shortcut(SingleActionShortcut::new(
            action.clone(),
            0,
            [],
            SingleActionTrigger::Key(Key::K),
            ActionGroup::Modifying,
            0,
        ));

        assert!(matcher.key_pressed(Key::K));
        action.clear();

        // The OS delivering a repeat as a plain press finds the key already
        // held, so the key state no longer matches.
        assert!(!matcher.key_pressed(Key::K));
        assert!(action.calls().is_empty());
    }

    #[test]
    fn test_autorepeat_keeps_modifier_shortcut_firing() {
        let matcher = entered_matcher();
        let action = RecordingAction::new();
        matcher.add_single_action_shortcut(SingleActionShortcut::new(
            action.clone(),
            0,
            [Key::Shift],
            SingleActionTrigger::Key(Key::K),
            ActionGroup::Modifying,
            0,
        ));

        matcher.key_pressed(Key::Shift);
        assert!(matcher.key_pressed(Key::K));
        assert!(matcher.auto_repeated_key_pressed(Key::K));
        assert_eq!(
            action.calls(),
            vec![Call::Begin(0), Call::End, Call::Begin(0), Call::End]
        );
    }

    #[test]
    fn test_single_action_priority_and_registration_order() {
        let matcher = entered_matcher();
        let low = RecordingAction::new();
        let high = RecordingAction::new();
        matcher.add_single_action_shortcut(SingleActionShortcut::new(
            low.clone(),
            0,
            [],
            SingleActionTrigger::Key(Key::T),
            ActionGroup::Modifying,
            1,
        ));
        matcher.add_single_action_shortcut(SingleActionShortcut::new(
            high.clone(),
            0,
            [],
            SingleActionTrigger::Key(Key::T),
            ActionGroup::Modifying,
            5,
        ));

        matcher.key_pressed(Key::T);
        assert!(low.calls().is_empty());
        assert_eq!(high.calls(), vec![Call::Begin(0), Call::End]);

        matcher.key_released(Key::T);
        high.clear();

        // Equal priorities: the earlier registration wins.
        let first = RecordingAction::new();
        let second = RecordingAction::new();
        matcher.add_single_action_shortcut(SingleActionShortcut::new(
            first.clone(),
            0,
            [],
            SingleActionTrigger::Key(Key::U),
            ActionGroup::Modifying,
            7,
        ));
        matcher.add_single_action_shortcut(SingleActionShortcut::new(
            second.clone(),
            0,
            [],
            SingleActionTrigger::Key(Key::U),
            ActionGroup::Modifying,
            7,
        ));
        matcher.key_pressed(Key::U);
        assert_eq!(first.calls(), vec![Call::Begin(0), Call::End]);
        assert!(second.calls().is_empty());
    }

    #[test]
    fn test_wheel_shortcut_fires() {
        let matcher = entered_matcher();
        let action = RecordingAction::new();
        matcher.add_single_action_shortcut(SingleActionShortcut::new(
            action.clone(),
            2,
            [Key::Control],
            SingleActionTrigger::Wheel(WheelAction::Up),
            ActionGroup::ViewTransform,
            0,
        ));

        matcher.key_pressed(Key::Control);
        let wheel = WheelEvent::new(Point::ZERO, 0.0, 1.0, KeyboardModifiers::CTRL);
        assert!(matcher.wheel_event(WheelAction::Up, &wheel));
        assert!(!matcher.wheel_event(WheelAction::Down, &wheel));
        assert_eq!(action.calls(), vec![Call::Begin(2), Call::End]);
    }

    #[test]
    fn test_group_mask_filters_shortcuts() {
        let matcher = entered_matcher();
        let action = RecordingAction::new();
        matcher.add_single_action_shortcut(SingleActionShortcut::new(
            action.clone(),
            0,
            [],
            SingleActionTrigger::Key(Key::M),
            ActionGroup::Modifying,
            0,
        ));
        matcher
            .set_action_group_mask_callback(|| ActionGroupMask::from_group(ActionGroup::ViewTransform));

        assert!(!matcher.key_pressed(Key::M));
        assert!(action.calls().is_empty());

        matcher.key_released(Key::M);
        matcher.set_action_group_mask_callback(|| ActionGroupMask::ALL);
        assert!(matcher.key_pressed(Key::M));
        assert_eq!(action.calls(), vec![Call::Begin(0), Call::End]);
    }

    #[test]
    fn test_suppress_all_blocks_dispatch_but_tracks_state() {
        let matcher = entered_matcher();
        let action = RecordingAction::new();
        matcher.add_single_action_shortcut(SingleActionShortcut::new(
            action.clone(),
            0,
            [Key::Control],
            SingleActionTrigger::Key(Key::S),
            ActionGroup::Modifying,
            0,
        ));

        matcher.suppress_all_actions(true);
        matcher.key_pressed(Key::Control);
        matcher.key_pressed(Key::S);
        assert!(action.calls().is_empty());
        // State tracking continues while suppressed.
        let mut held = matcher.debug_pressed_keys();
        held.sort_by_key(|k| format!("{:?}", k));
        assert_eq!(held.len(), 2);

        matcher.suppress_all_actions(false);
        matcher.key_released(Key::S);
        assert!(matcher.key_pressed(Key::S));
        assert_eq!(action.calls(), vec![Call::Begin(0), Call::End]);
    }

    #[test]
    fn test_ready_shortcut_lifecycle() {
        let matcher = entered_matcher();
        let action = RecordingAction::new();
        matcher.add_stroke_shortcut(StrokeShortcut::new(
            action.clone(),
            0,
            [Key::Space],
            [PointerButton::Left],
            ActionGroup::ViewTransform,
            0,
        ));

        matcher.key_pressed(Key::Space);
        assert_eq!(action.calls(), vec![Call::Activate(0)]);

        matcher.key_released(Key::Space);
        assert_eq!(action.calls(), vec![Call::Activate(0), Call::Deactivate(0)]);
    }

    #[test]
    fn test_ready_shortcut_swaps_when_keys_change() {
        let matcher = entered_matcher();
        let pan = RecordingAction::new();
        let zoom = RecordingAction::new();
        matcher.add_stroke_shortcut(StrokeShortcut::new(
            pan.clone(),
            0,
            [Key::Space],
            [PointerButton::Left],
            ActionGroup::ViewTransform,
            0,
        ));
        matcher.add_stroke_shortcut(StrokeShortcut::new(
            zoom.clone(),
            1,
            [Key::Space, Key::X],
            [PointerButton::Left],
            ActionGroup::ViewTransform,
            0,
        ));

        matcher.key_pressed(Key::Space);
        assert_eq!(pan.calls(), vec![Call::Activate(0)]);
        assert!(zoom.calls().is_empty());

        matcher.key_pressed(Key::X);
        assert_eq!(pan.calls(), vec![Call::Activate(0), Call::Deactivate(0)]);
        assert_eq!(zoom.calls(), vec![Call::Activate(1)]);
    }

    #[test]
    fn test_stroke_runs_while_candidate_buttons_complete() {
        let matcher = entered_matcher();
        let action = RecordingAction::new();
        matcher.add_stroke_shortcut(StrokeShortcut::new(
            action.clone(),
            0,
            [],
            [PointerButton::Left, PointerButton::Right],
            ActionGroup::Modifying,
            0,
        ));

        matcher.button_pressed(PointerButton::Left, &press(PointerButton::Left));
        // One of two required buttons held: armed but not begun.
        assert_eq!(action.calls(), vec![Call::Activate(0)]);

        matcher.button_pressed(PointerButton::Right, &press(PointerButton::Right));
        assert_eq!(action.calls(), vec![Call::Activate(0), Call::Begin(0)]);
        assert!(matcher.has_running_shortcut());

        // Releasing either required button ends the stroke; with the other
        // button still held the shortcut re-arms immediately.
        matcher.button_released(PointerButton::Left, &release(PointerButton::Left));
        assert_eq!(
            action.calls(),
            vec![
                Call::Activate(0),
                Call::Begin(0),
                Call::End,
                Call::Deactivate(0),
                Call::Activate(0)
            ]
        );
        assert!(!matcher.has_running_shortcut());
    }

    #[test]
    fn test_pointer_moves_stream_to_running_stroke_only() {
        let matcher = entered_matcher();
        let action = RecordingAction::new();
        matcher.add_stroke_shortcut(StrokeShortcut::new(
            action.clone(),
            0,
            [],
            [PointerButton::Left],
            ActionGroup::Modifying,
            0,
        ));

        let move_event =
            PointerMoveEvent::new(Point::new(1.0, 2.0), Point::new(1.0, 2.0), KeyboardModifiers::NONE);
        assert!(!matcher.pointer_moved(&move_event));

        matcher.button_pressed(PointerButton::Left, &press(PointerButton::Left));
        assert!(matcher.pointer_moved(&move_event));
        assert!(matcher.pointer_moved(&move_event));

        matcher.button_released(PointerButton::Left, &release(PointerButton::Left));
        assert!(!matcher.pointer_moved(&move_event));

        let inputs = action
            .calls()
            .iter()
            .filter(|c| **c == Call::Input)
            .count();
        assert_eq!(inputs, 2);
    }

    #[test]
    fn test_touch_slop_boundary() {
        // Exactly the slop distance is still a tap; one pixel-square more
        // becomes a drag.
        let matcher = entered_matcher();
        let tap = RecordingAction::new();
        let drag = RecordingAction::new();
        matcher.add_touch_shortcut(TouchShortcut::new(
            tap.clone(),
            0,
            TouchGestureKind::Tap,
            1,
            1,
            ActionGroup::ViewTransform,
            0,
        ));
        matcher.add_touch_shortcut(TouchShortcut::new(
            drag.clone(),
            1,
            TouchGestureKind::Drag,
            1,
            1,
            ActionGroup::ViewTransform,
            0,
        ));

        let begin = touch(vec![touch_point(
            1,
            Point::ZERO,
            Point::ZERO,
            TouchPointState::Pressed,
        )]);
        matcher.touch_begin_event(&begin);

        // delta^2 == 256: not a drag.
        let at_slop = touch(vec![touch_point(
            1,
            Point::ZERO,
            Point::new(16.0, 0.0),
            TouchPointState::Moved,
        )]);
        matcher.touch_update_event(&at_slop);
        assert!(drag.calls().is_empty());

        // delta^2 == 257: a drag.
        let past_slop = touch(vec![touch_point(
            1,
            Point::ZERO,
            Point::new(257.0_f32.sqrt(), 0.0),
            TouchPointState::Moved,
        )]);
        matcher.touch_update_event(&past_slop);
        assert_eq!(drag.calls(), vec![Call::Activate(1), Call::Begin(1)]);
        assert!(tap.calls().is_empty());
    }

    #[test]
    fn test_touch_early_window_commits_on_eleventh_update() {
        let matcher = entered_matcher();
        let tap = RecordingAction::new();
        matcher.add_touch_shortcut(TouchShortcut::new(
            tap.clone(),
            0,
            TouchGestureKind::Tap,
            2,
            2,
            ActionGroup::ViewTransform,
            0,
        ));

        let begin = touch(vec![
            touch_point(1, Point::ZERO, Point::ZERO, TouchPointState::Pressed),
            touch_point(2, Point::ZERO, Point::ZERO, TouchPointState::Pressed),
        ]);
        matcher.touch_begin_event(&begin);

        // Ten buffered updates; a release inside the window does not fire.
        let released = touch(vec![
            touch_point(1, Point::ZERO, Point::ZERO, TouchPointState::Released),
            touch_point(2, Point::ZERO, Point::ZERO, TouchPointState::Stationary),
        ]);
        for _ in 0..10 {
            matcher.touch_update_event(&released);
        }
        assert!(tap.calls().is_empty());

        // The eleventh update commits.
        matcher.touch_update_event(&released);
        assert_eq!(
            tap.calls(),
            vec![Call::Activate(0), Call::Begin(0), Call::End, Call::Deactivate(0)]
        );
    }

    #[test]
    fn test_touch_drag_streams_input_events() {
        let matcher = entered_matcher();
        let tap = RecordingAction::new();
        let drag = RecordingAction::new();
        matcher.add_touch_shortcut(TouchShortcut::new(
            tap.clone(),
            0,
            TouchGestureKind::Tap,
            2,
            2,
            ActionGroup::ViewTransform,
            0,
        ));
        matcher.add_touch_shortcut(TouchShortcut::new(
            drag.clone(),
            1,
            TouchGestureKind::Drag,
            2,
            2,
            ActionGroup::ViewTransform,
            0,
        ));

        let begin = touch(vec![
            touch_point(1, Point::ZERO, Point::ZERO, TouchPointState::Pressed),
            touch_point(2, Point::new(50.0, 0.0), Point::new(50.0, 0.0), TouchPointState::Pressed),
        ]);
        matcher.touch_begin_event(&begin);

        let dragged = touch(vec![
            touch_point(1, Point::ZERO, Point::new(40.0, 0.0), TouchPointState::Moved),
            touch_point(2, Point::new(50.0, 0.0), Point::new(90.0, 0.0), TouchPointState::Moved),
        ]);
        matcher.touch_update_event(&dragged);
        assert_eq!(drag.calls(), vec![Call::Activate(1), Call::Begin(1)]);

        matcher.touch_update_event(&dragged);
        // Stationary-only updates are forwarded too.
        let stationary = touch(vec![
            touch_point(1, Point::ZERO, Point::new(40.0, 0.0), TouchPointState::Stationary),
            touch_point(2, Point::new(50.0, 0.0), Point::new(90.0, 0.0), TouchPointState::Stationary),
        ]);
        matcher.touch_update_event(&stationary);

        let end = touch(vec![
            touch_point(1, Point::ZERO, Point::new(40.0, 0.0), TouchPointState::Released),
            touch_point(2, Point::new(50.0, 0.0), Point::new(90.0, 0.0), TouchPointState::Released),
        ]);
        matcher.touch_end_event(&end);

        assert_eq!(
            drag.calls(),
            vec![
                Call::Activate(1),
                Call::Begin(1),
                Call::Input,
                Call::Input,
                Call::End,
                Call::Deactivate(1)
            ]
        );
        assert!(tap.calls().is_empty());
    }

    #[test]
    fn test_touch_cancel_reconstructs_last_points() {
        let matcher = entered_matcher();
        let drag = RecordingAction::new();
        matcher.add_touch_shortcut(TouchShortcut::new(
            drag.clone(),
            0,
            TouchGestureKind::Drag,
            2,
            2,
            ActionGroup::ViewTransform,
            0,
        ));

        let begin = touch(vec![
            touch_point(1, Point::ZERO, Point::ZERO, TouchPointState::Pressed),
            touch_point(2, Point::new(50.0, 0.0), Point::new(50.0, 0.0), TouchPointState::Pressed),
        ]);
        matcher.touch_begin_event(&begin);

        let dragged = touch(vec![
            touch_point(1, Point::ZERO, Point::new(40.0, 0.0), TouchPointState::Moved),
            touch_point(2, Point::new(50.0, 0.0), Point::new(90.0, 0.0), TouchPointState::Moved),
        ]);
        matcher.touch_update_event(&dragged);
        assert_eq!(drag.calls(), vec![Call::Activate(0), Call::Begin(0)]);

        // The OS cancel event arrives stripped of its touch points.
        matcher.touch_cancel_event(&touch(vec![]), Point::ZERO);
        assert_eq!(
            drag.calls(),
            vec![Call::Activate(0), Call::Begin(0), Call::End, Call::Deactivate(0)]
        );
    }

    #[test]
    fn test_native_gesture_lifecycle() {
        let matcher = entered_matcher();
        let zoom = RecordingAction::new();
        matcher.add_native_gesture_shortcut(NativeGestureShortcut::new(
            zoom.clone(),
            0,
            crate::events::NativeGestureKind::Zoom,
            ActionGroup::ViewTransform,
            0,
        ));

        let event = NativeGestureEvent::new(
            crate::events::NativeGestureKind::Zoom,
            0.1,
            Point::ZERO,
            KeyboardModifiers::NONE,
        );
        assert!(matcher.native_gesture_begin_event(&event));
        assert!(matcher.native_gesture_event(&event));
        assert!(matcher.native_gesture_event(&event));
        matcher.native_gesture_end_event(&event);

        assert_eq!(
            zoom.calls(),
            vec![
                Call::Activate(0),
                Call::Begin(0),
                Call::Input,
                Call::End,
                Call::Deactivate(0)
            ]
        );
    }

    #[test]
    fn test_reinitialize_is_idempotent() {
        let matcher = entered_matcher();
        let action = RecordingAction::new();
        matcher.add_stroke_shortcut(StrokeShortcut::new(
            action.clone(),
            0,
            [Key::Space],
            [PointerButton::Left],
            ActionGroup::ViewTransform,
            0,
        ));

        matcher.key_pressed(Key::Space);
        assert_eq!(action.calls(), vec![Call::Activate(0)]);

        matcher.reinitialize();
        assert!(matcher.debug_pressed_keys().is_empty());
        assert_eq!(action.calls(), vec![Call::Activate(0), Call::Deactivate(0)]);

        matcher.reinitialize();
        assert_eq!(action.calls(), vec![Call::Activate(0), Call::Deactivate(0)]);
    }

    #[test]
    fn test_key_round_trip_leaves_state_unchanged() {
        let matcher = entered_matcher();
        let action = RecordingAction::new();
        matcher.add_stroke_shortcut(StrokeShortcut::new(
            action.clone(),
            0,
            [Key::Space],
            [PointerButton::Left],
            ActionGroup::ViewTransform,
            0,
        ));

        matcher.key_pressed(Key::Space);
        matcher.key_released(Key::Space);
        assert!(matcher.debug_pressed_keys().is_empty());
        assert!(!matcher.has_running_shortcut());

        // The same sequence again behaves identically.
        action.clear();
        matcher.key_pressed(Key::Space);
        matcher.key_released(Key::Space);
        assert_eq!(action.calls(), vec![Call::Activate(0), Call::Deactivate(0)]);
    }

    #[test]
    fn test_sanity_check_modifiers() {
        let matcher = entered_matcher();
        assert!(matcher.sanity_check_modifiers_correctness(KeyboardModifiers::NONE));

        matcher.key_pressed(Key::Control);
        assert!(matcher.sanity_check_modifiers_correctness(KeyboardModifiers::CTRL));
        assert!(!matcher.sanity_check_modifiers_correctness(KeyboardModifiers::NONE));
        assert!(!matcher.sanity_check_modifiers_correctness(KeyboardModifiers::SHIFT));
    }

    #[test]
    fn test_recovery_modifiers_without_focus() {
        let matcher = entered_matcher();
        matcher.key_pressed(Key::Control);
        matcher.key_pressed(Key::Shift);

        matcher.recovery_modifiers_without_focus(&[Key::Shift, Key::Alt]);

        let mut held = matcher.debug_pressed_keys();
        held.sort_by_key(|k| format!("{:?}", k));
        assert_eq!(held, vec![Key::Alt, Key::Shift]);
    }

    #[test]
    fn test_buttons_ignored_while_touch_in_flight() {
        let matcher = entered_matcher();
        let drag = RecordingAction::new();
        let stroke = RecordingAction::new();
        matcher.add_touch_shortcut(TouchShortcut::new(
            drag.clone(),
            0,
            TouchGestureKind::Drag,
            1,
            1,
            ActionGroup::ViewTransform,
            0,
        ));
        matcher.add_stroke_shortcut(StrokeShortcut::new(
            stroke.clone(),
            0,
            [],
            [PointerButton::Left],
            ActionGroup::Modifying,
            0,
        ));
        let begin = touch(vec![touch_point(
            1,
            Point::ZERO,
            Point::ZERO,
            TouchPointState::Pressed,
        )]);
        matcher.touch_begin_event(&begin);
        let dragged = touch(vec![touch_point(
            1,
            Point::ZERO,
            Point::new(40.0, 0.0),
            TouchPointState::Moved,
        )]);
        matcher.touch_update_event(&dragged);
        assert_eq!(drag.calls(), vec![Call::Activate(0), Call::Begin(0)]);

        // Pointer events are ignored while a touch interaction runs.
        assert!(!matcher.button_pressed(PointerButton::Left, &press(PointerButton::Left)));
        assert!(!matcher.button_released(PointerButton::Left, &release(PointerButton::Left)));
        assert!(stroke.calls().is_empty());
    }
}
