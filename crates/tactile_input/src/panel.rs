//! The touch panel context object tying the pieces together.

use core::time::Duration;

use glam::Vec2;
use log::warn;

use crate::gesture::{GestureReadError, GestureRecognizer, GestureSample, GestureStore, GestureType};
use crate::id_map::TouchIdMapper;
use crate::store::TouchLocationStore;
use crate::touch::{TouchEvent, TouchLocation, TouchPhase};

/// Touch hardware capabilities reported by the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchCapabilities {
    /// Whether a touch device is available.
    pub is_connected: bool,
    /// Number of simultaneous touch points the panel tracks.
    pub maximum_touch_count: usize,
    /// Whether per-point pressure is sensed. Always `false`; points report
    /// a constant placeholder pressure.
    pub has_pressure: bool,
}

const MAXIMUM_TOUCH_COUNT: usize = 8;

/// Converts raw platform touch events into per-frame touch snapshots and a
/// queue of synthesized gestures.
///
/// The panel is an explicit context object owned by whatever drives the
/// per-frame update loop. All calls are expected from that one logical
/// thread; nothing blocks and nothing locks.
///
/// ## Usage
///
/// Once per update tick, call [`TouchPanel::update_timestamp`] *before*
/// feeding that tick's events. Poll [`TouchPanel::get_state`] once per
/// frame for the touch snapshot, and drain gestures with
/// [`TouchPanel::read_gesture`] after checking
/// [`TouchPanel::is_gesture_available`].
#[derive(Debug, Default)]
pub struct TouchPanel {
    id_map: TouchIdMapper,
    touch_store: TouchLocationStore,
    gesture_store: GestureStore,
    recognizer: GestureRecognizer,
    enabled_gestures: GestureType,
    display_size: Vec2,
    window_size: Vec2,
    now: Duration,
    frame: u64,
}

impl TouchPanel {
    /// Creates a panel with no tracked touches, no enabled gestures, and
    /// 1:1 position scaling.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the logical frame counter and records the current time.
    ///
    /// Must be called exactly once per update tick, before any of the
    /// tick's events are fed in. Framestamps exist because two events can
    /// legitimately share a wall-clock time; only the frame counter can
    /// tell same-tick apart from cross-tick.
    pub fn update_timestamp(&mut self, now: Duration) {
        debug_assert!(now >= self.now, "panel time went backwards");
        self.now = now;
        self.frame += 1;
    }

    /// The gestures the recognizer is allowed to emit.
    pub fn enabled_gestures(&self) -> GestureType {
        self.enabled_gestures
    }

    /// Sets the gestures the recognizer is allowed to emit.
    pub fn set_enabled_gestures(&mut self, gestures: GestureType) {
        self.enabled_gestures = gestures;
    }

    /// Logical display size positions are scaled into.
    pub fn set_display_size(&mut self, size: Vec2) {
        self.display_size = size;
    }

    /// Native window size raw event positions arrive in.
    pub fn set_window_size(&mut self, size: Vec2) {
        self.window_size = size;
    }

    /// Static capability report for the panel.
    pub fn capabilities(&self) -> TouchCapabilities {
        TouchCapabilities {
            is_connected: true,
            maximum_touch_count: MAXIMUM_TOUCH_COUNT,
            has_pressure: false,
        }
    }

    /// Dispatches a raw platform event by phase.
    pub fn process_event(&mut self, event: &TouchEvent) {
        match event.phase {
            TouchPhase::Started => self.add_pressed_event(event.id, event.position),
            TouchPhase::Moved => self.add_moved_event(event.id, event.position),
            TouchPhase::Ended => self.add_released_event(event.id, event.position),
            TouchPhase::Cancelled => self.add_canceled_event(event.id, event.position),
        }
    }

    /// Feeds a press for a native contact id.
    pub fn add_pressed_event(&mut self, native_id: u64, raw_position: Vec2) {
        let position = raw_position * self.scale();
        let id = self.id_map.register(native_id);
        self.touch_store.on_press(id, position, self.now, self.frame);
        if self.track_gestures() {
            self.gesture_store.on_press(id, position, self.now, self.frame);
            self.run_gesture_pass(true);
        }
    }

    /// Feeds a move for a native contact id. Moves for unmapped ids are
    /// stale platform events and are dropped.
    pub fn add_moved_event(&mut self, native_id: u64, raw_position: Vec2) {
        let Some(id) = self.id_map.resolve(native_id) else {
            warn!("dropping move event for unmapped native touch id {native_id}");
            return;
        };
        let position = raw_position * self.scale();
        self.touch_store.on_move(id, position, self.now, self.frame);
        if self.track_gestures() {
            self.gesture_store.on_move(id, position, self.now, self.frame);
            self.run_gesture_pass(true);
        }
    }

    /// Feeds a release for a native contact id and closes its mapping.
    pub fn add_released_event(&mut self, native_id: u64, raw_position: Vec2) {
        let Some(id) = self.id_map.unregister(native_id) else {
            warn!("dropping release event for unmapped native touch id {native_id}");
            return;
        };
        let position = raw_position * self.scale();
        self.release(id, position);
    }

    /// Feeds a cancel for a native contact id. The point vanishes from both
    /// stores without a `Released` report and without gesture emission.
    pub fn add_canceled_event(&mut self, native_id: u64, _raw_position: Vec2) {
        let Some(id) = self.id_map.unregister(native_id) else {
            warn!("dropping cancel event for unmapped native touch id {native_id}");
            return;
        };
        self.touch_store.on_cancel(id);
        self.gesture_store.on_cancel(id);
        self.recognizer.drop_touch(id);
        if self.gesture_store.is_empty() {
            self.recognizer.reset_sequence();
        }
    }

    /// Synthesizes a cancel for every native id currently mapped. The only
    /// supported way to forcibly reset in-flight touch state, e.g. on
    /// orientation change or window focus loss.
    pub fn cancel_all_touches(&mut self) {
        for native_id in self.id_map.open_native_ids() {
            self.add_canceled_event(native_id, Vec2::ZERO);
        }
    }

    /// Synthesizes a release (at the last known position) for every native
    /// id currently mapped.
    pub fn release_all_touches(&mut self) {
        for native_id in self.id_map.open_native_ids() {
            if let Some(id) = self.id_map.unregister(native_id) {
                let position = self.touch_store.position_of(id).unwrap_or(Vec2::ZERO);
                self.release(id, position);
            }
        }
    }

    /// Returns the per-frame snapshot of tracked touch points and advances
    /// their lifecycle by one step.
    pub fn get_state(&mut self) -> Vec<TouchLocation> {
        self.touch_store.poll(self.frame)
    }

    /// Whether a gesture is queued. Runs one recognition pass as a side
    /// effect, so time-based gestures (hold) can fire without a platform
    /// event attached.
    pub fn is_gesture_available(&mut self) -> bool {
        if self.track_gestures() {
            self.run_gesture_pass(false);
        }
        self.recognizer.has_queued()
    }

    /// Dequeues one gesture sample.
    ///
    /// # Errors
    ///
    /// Returns [`GestureReadError::Empty`] when nothing is queued; callers
    /// must check [`TouchPanel::is_gesture_available`] first.
    pub fn read_gesture(&mut self) -> Result<GestureSample, GestureReadError> {
        self.recognizer.read()
    }

    /// Gesture tracking runs while any gesture is enabled or touches are
    /// already mid-flight; otherwise the whole gesture side is skipped.
    fn track_gestures(&self) -> bool {
        !self.enabled_gestures.is_empty() || !self.gesture_store.is_empty()
    }

    fn run_gesture_pass(&mut self, state_changed: bool) {
        // Runs even with an empty mask: the recognizer's end-of-sequence
        // bookkeeping (drag/pinch closure, flag resets when the last point
        // lifts) must not depend on which gestures happen to be enabled.
        self.recognizer.update(
            &self.gesture_store.entries,
            self.enabled_gestures,
            self.now,
            state_changed,
        );
        self.gesture_store.age();
    }

    fn release(&mut self, id: u32, position: Vec2) {
        self.touch_store.on_release(id, position, self.now, self.frame);
        if self.track_gestures() {
            self.gesture_store.on_release(id, position, self.now, self.frame);
            self.run_gesture_pass(true);
        }
    }

    fn scale(&self) -> Vec2 {
        // 1:1 until both sizes have been supplied.
        if self.window_size.cmpgt(Vec2::ZERO).all() && self.display_size.cmpgt(Vec2::ZERO).all() {
            self.display_size / self.window_size
        } else {
            Vec2::ONE
        }
    }
}
