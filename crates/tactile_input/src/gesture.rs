//! Gesture classification over the touch event stream.
//!
//! A second projection of the event stream ([`GestureStore`]) feeds a
//! classification state machine ([`GestureRecognizer`]) which appends
//! [`GestureSample`]s to a FIFO queue drained through
//! [`TouchPanel::read_gesture`](crate::TouchPanel::read_gesture).

use core::time::Duration;
use std::collections::VecDeque;

use bitflags::bitflags;
use glam::Vec2;
use log::warn;
use thiserror::Error;

use crate::store::{ReleaseOutcome, TouchEntry};
use crate::touch::TouchState;

/// Maximum positional drift, in logical display units, still considered
/// stationary for tap and hold classification. Compared squared.
pub(crate) const TAP_JITTER_TOLERANCE: f32 = 35.0;

/// Time a stationary touch must stay down before a hold fires.
pub(crate) const HOLD_THRESHOLD: Duration = Duration::from_millis(1024);

/// Maximum time between two taps forming a double tap.
pub(crate) const DOUBLE_TAP_WINDOW: Duration = Duration::from_millis(300);

/// Minimum filtered speed, in logical display units per second, for a
/// release to classify as a flick. Compared squared.
pub(crate) const FLICK_VELOCITY_THRESHOLD: f32 = 100.0;

/// Delta ratio beyond which a fresh drag locks to one axis.
const DRAG_AXIS_LOCK_RATIO: f32 = 2.0;

bitflags! {
    /// Kinds of gestures, used both as the enabled-gesture mask and as the
    /// kind tag of a [`GestureSample`] (where exactly one bit is set).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct GestureType: u16 {
        /// A brief touch-and-release within the jitter tolerance.
        const TAP = 1 << 0;
        /// A second tap close in time and space to the previous one.
        /// Emitted on the second press, not on its release.
        const DOUBLE_TAP = 1 << 1;
        /// A touch held stationary past the hold threshold.
        const HOLD = 1 << 2;
        /// A drag locked to the horizontal axis.
        const HORIZONTAL_DRAG = 1 << 3;
        /// A drag locked to the vertical axis.
        const VERTICAL_DRAG = 1 << 4;
        /// A drag free to move along both axes.
        const FREE_DRAG = 1 << 5;
        /// The touch driving a drag was lifted.
        const DRAG_COMPLETE = 1 << 6;
        /// A fast release; the sample's delta carries the final filtered
        /// velocity in units per second.
        const FLICK = 1 << 7;
        /// Two touches moving relative to one another.
        const PINCH = 1 << 8;
        /// One of the touches driving a pinch was lifted.
        const PINCH_COMPLETE = 1 << 9;
    }
}

/// One synthesized gesture, drained from the panel's FIFO queue.
///
/// `position2`/`delta2` are only meaningful for [`GestureType::PINCH`]
/// samples, which carry both touch points; every other kind leaves them
/// zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSample {
    /// The kind of gesture; exactly one bit is set.
    pub gesture_type: GestureType,
    /// Time the gesture was classified at.
    pub timestamp: Duration,
    /// Position of the (first) touch point.
    pub position: Vec2,
    /// Position of the second touch point of a pinch.
    pub position2: Vec2,
    /// Positional change of the (first) touch point; a flick carries its
    /// final velocity here instead.
    pub delta: Vec2,
    /// Positional change of the second touch point of a pinch.
    pub delta2: Vec2,
}

/// Errors from draining the gesture queue.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureReadError {
    /// [`read_gesture`](crate::TouchPanel::read_gesture) was called with
    /// nothing queued. Callers must check
    /// [`is_gesture_available`](crate::TouchPanel::is_gesture_available)
    /// first.
    #[error("no gesture is available to read")]
    Empty,
}

/// The gesture-side projection of the touch event stream.
///
/// Populated only while gesture recognition is active or touches are
/// mid-flight; entries additionally carry a filtered velocity estimate.
#[derive(Debug, Default)]
pub(crate) struct GestureStore {
    pub(crate) entries: Vec<TouchEntry>,
}

impl GestureStore {
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn on_press(&mut self, id: u32, position: Vec2, timestamp: Duration, framestamp: u64) {
        debug_assert!(
            self.entries.iter().all(|entry| entry.id != id),
            "stable touch id {id} is already gesture-tracked"
        );
        self.entries.push(TouchEntry::pressed(id, position, timestamp, framestamp));
    }

    pub(crate) fn on_move(&mut self, id: u32, position: Vec2, timestamp: Duration, framestamp: u64) {
        let Some(entry) = self.entries.iter_mut().find(|entry| entry.id == id) else {
            warn!("dropping gesture-side move for untracked touch id {id}");
            return;
        };
        entry.apply_move(position, timestamp, framestamp);
    }

    pub(crate) fn on_release(
        &mut self,
        id: u32,
        position: Vec2,
        timestamp: Duration,
        framestamp: u64,
    ) {
        let Some(index) = self.entries.iter().position(|entry| entry.id == id) else {
            warn!("dropping gesture-side release for untracked touch id {id}");
            return;
        };
        if self.entries[index].apply_release(position, timestamp, framestamp)
            == ReleaseOutcome::Discard
        {
            self.entries.swap_remove(index);
        }
    }

    pub(crate) fn on_cancel(&mut self, id: u32) {
        self.entries.retain(|entry| entry.id != id);
    }

    /// Ages every entry by one recognition pass and drops finished ones.
    pub(crate) fn age(&mut self) {
        self.entries.retain_mut(TouchEntry::age);
    }
}

/// The gesture classification state machine.
///
/// Consumes [`GestureStore`] transitions and emits classified samples into
/// the output queue. All state lives across passes: which gestures are
/// temporarily disabled, the drag in progress, the pinch slots, and the
/// last completed tap for double-tap matching.
#[derive(Debug, Default)]
pub(crate) struct GestureRecognizer {
    tap_disabled: bool,
    hold_disabled: bool,
    /// Empty while no drag is in progress; [`GestureType::DRAG_COMPLETE`]
    /// parks an unclassifiable drag so later deltas are ignored.
    drag_gesture: GestureType,
    pinch_started: bool,
    /// The two points driving a pinch. A third simultaneous touch never
    /// takes part; pinches are strictly two-point.
    pinch_slots: [Option<TouchEntry>; 2],
    /// The last completed tap. Matched by position and time only, never by
    /// id: stable ids may be recycled across touch sequences.
    last_tap: Option<TouchEntry>,
    queue: VecDeque<GestureSample>,
}

impl GestureRecognizer {
    pub(crate) fn has_queued(&self) -> bool {
        !self.queue.is_empty()
    }

    pub(crate) fn read(&mut self) -> Result<GestureSample, GestureReadError> {
        self.queue.pop_front().ok_or(GestureReadError::Empty)
    }

    /// Forgets a touch that was canceled by the platform. The pinch it was
    /// driving, if any, dissolves without a completion sample.
    pub(crate) fn drop_touch(&mut self, id: u32) {
        if self.pinch_slots.iter().flatten().any(|slot| slot.id == id) {
            self.pinch_slots = [None, None];
            self.pinch_started = false;
        }
    }

    /// Resets all per-sequence state. Queued samples and the last-tap
    /// memory survive; they describe gestures that already happened.
    pub(crate) fn reset_sequence(&mut self) {
        self.tap_disabled = false;
        self.hold_disabled = false;
        self.drag_gesture = GestureType::empty();
        self.pinch_started = false;
        self.pinch_slots = [None, None];
    }

    /// Runs one classification pass over the gesture store.
    ///
    /// `state_changed` is true when a platform event was just applied;
    /// passes triggered by availability checks only let time-based gestures
    /// (hold) fire.
    pub(crate) fn update(
        &mut self,
        entries: &[TouchEntry],
        enabled: GestureType,
        now: Duration,
        state_changed: bool,
    ) {
        let held = entries
            .iter()
            .filter(|entry| entry.state != TouchState::Released)
            .count();
        // Any multi-touch contact rules out taps and holds until every
        // point has been lifted.
        if held > 1 {
            self.tap_disabled = true;
            self.hold_disabled = true;
        }

        let tolerance_squared = TAP_JITTER_TOLERANCE * TAP_JITTER_TOLERANCE;

        for touch in entries {
            match touch.state {
                TouchState::Pressed | TouchState::Moved => {
                    // A fresh press may complete a double tap; that consumes
                    // the point for this pass.
                    if touch.state == TouchState::Pressed
                        && self.process_double_tap(enabled, touch)
                    {
                        continue;
                    }

                    if enabled.contains(GestureType::PINCH) && held > 1 {
                        if self.pinch_slots[0].map_or(true, |slot| slot.id == touch.id) {
                            self.pinch_slots[0] = Some(*touch);
                        } else if self.pinch_slots[1].map_or(true, |slot| slot.id == touch.id) {
                            self.pinch_slots[1] = Some(*touch);
                        }
                        // Pinch is evaluated once, after the loop.
                        continue;
                    }

                    let drift_squared =
                        (touch.position - touch.press_position).length_squared();
                    if self.drag_gesture.is_empty() && drift_squared < tolerance_squared {
                        if self.hold_disabled || !enabled.contains(GestureType::HOLD) {
                            continue;
                        }
                        if now.saturating_sub(touch.press_timestamp) < HOLD_THRESHOLD {
                            continue;
                        }
                        self.hold_disabled = true;
                        self.enqueue(GestureType::HOLD, now, touch.position, Vec2::ZERO);
                        continue;
                    }

                    if state_changed {
                        self.process_drag(enabled, touch);
                    }
                }
                TouchState::Released => {
                    if self.pinch_started
                        && self.pinch_slots.iter().flatten().any(|slot| slot.id == touch.id)
                    {
                        if enabled.contains(GestureType::PINCH_COMPLETE) {
                            self.enqueue(
                                GestureType::PINCH_COMPLETE,
                                touch.timestamp,
                                Vec2::ZERO,
                                Vec2::ZERO,
                            );
                        }
                        self.pinch_started = false;
                        self.pinch_slots = [None, None];
                        continue;
                    }

                    // While other points are still held this release means
                    // nothing on its own.
                    if held != 0 {
                        continue;
                    }

                    let drift_squared =
                        (touch.position - touch.press_position).length_squared();
                    if enabled.contains(GestureType::FLICK)
                        && drift_squared > tolerance_squared
                        && touch.velocity.get().length_squared()
                            > FLICK_VELOCITY_THRESHOLD * FLICK_VELOCITY_THRESHOLD
                    {
                        // The delta carries the final velocity. No
                        // `continue`: a flick does not suppress the drag
                        // completion below.
                        self.enqueue(
                            GestureType::FLICK,
                            touch.timestamp,
                            Vec2::ZERO,
                            touch.velocity.get(),
                        );
                    }

                    if !self.drag_gesture.is_empty() {
                        if enabled.contains(GestureType::DRAG_COMPLETE) {
                            self.enqueue(
                                GestureType::DRAG_COMPLETE,
                                touch.timestamp,
                                Vec2::ZERO,
                                Vec2::ZERO,
                            );
                        }
                        self.drag_gesture = GestureType::empty();
                        continue;
                    }

                    if !self.tap_disabled
                        && drift_squared <= tolerance_squared
                        && touch.timestamp.saturating_sub(touch.press_timestamp)
                            <= HOLD_THRESHOLD
                    {
                        // Remembered even when TAP itself is disabled so a
                        // following press can still match a double tap.
                        self.last_tap = Some(*touch);
                        if enabled.contains(GestureType::TAP) {
                            self.enqueue(
                                GestureType::TAP,
                                touch.timestamp,
                                touch.position,
                                Vec2::ZERO,
                            );
                        }
                    }
                }
                TouchState::Invalid => {}
            }
        }

        if enabled.contains(GestureType::PINCH) && state_changed {
            if let (Some(first), Some(second)) = (self.pinch_slots[0], self.pinch_slots[1]) {
                self.process_pinch(enabled, &first, &second);
            }
        }

        if held == 0 {
            self.tap_disabled = false;
            self.hold_disabled = false;
            self.drag_gesture = GestureType::empty();
        }
    }

    /// Matches a fresh press against the last completed tap. On a match the
    /// double tap fires immediately and taps are disabled until the next
    /// full release.
    fn process_double_tap(&mut self, enabled: GestureType, touch: &TouchEntry) -> bool {
        if !enabled.contains(GestureType::DOUBLE_TAP) {
            return false;
        }
        let Some(last_tap) = self.last_tap else {
            return false;
        };
        let drift_squared = (touch.position - last_tap.position).length_squared();
        if drift_squared > TAP_JITTER_TOLERANCE * TAP_JITTER_TOLERANCE {
            return false;
        }
        if touch.timestamp.saturating_sub(last_tap.timestamp) > DOUBLE_TAP_WINDOW {
            return false;
        }
        self.enqueue(GestureType::DOUBLE_TAP, touch.timestamp, touch.position, Vec2::ZERO);
        self.tap_disabled = true;
        true
    }

    /// Classifies the movement of one touch as a drag sample.
    ///
    /// The first qualifying delta decides the drag's kind; a drag locked to
    /// one axis stays on that axis for the rest of the sequence, with the
    /// orthogonal component zeroed on every sample.
    fn process_drag(&mut self, enabled: GestureType, touch: &TouchEntry) {
        let drag_horizontal = enabled.contains(GestureType::HORIZONTAL_DRAG);
        let drag_vertical = enabled.contains(GestureType::VERTICAL_DRAG);
        let drag_free = enabled.contains(GestureType::FREE_DRAG);
        if !drag_horizontal && !drag_vertical && !drag_free {
            return;
        }
        if touch.state != TouchState::Moved || touch.previous_state == TouchState::Invalid {
            return;
        }

        let mut delta = touch.position - touch.previous_position;
        if self.drag_gesture != GestureType::FREE_DRAG {
            let classify = self.drag_gesture.is_empty();
            let horizontal = delta.x.abs() > (delta.y * DRAG_AXIS_LOCK_RATIO).abs();
            let vertical = delta.y.abs() > (delta.x * DRAG_AXIS_LOCK_RATIO).abs();
            if drag_horizontal
                && ((classify && horizontal) || self.drag_gesture == GestureType::HORIZONTAL_DRAG)
            {
                delta.y = 0.0;
                self.drag_gesture = GestureType::HORIZONTAL_DRAG;
            } else if drag_vertical
                && ((classify && vertical) || self.drag_gesture == GestureType::VERTICAL_DRAG)
            {
                delta.x = 0.0;
                self.drag_gesture = GestureType::VERTICAL_DRAG;
            } else if drag_free && classify {
                self.drag_gesture = GestureType::FREE_DRAG;
            } else {
                // Unclassifiable: park the drag so later deltas are ignored
                // until the sequence ends.
                self.drag_gesture = GestureType::DRAG_COMPLETE;
                return;
            }
        }

        // A drag sample rules out tap and hold for the rest of the sequence.
        self.tap_disabled = true;
        self.hold_disabled = true;
        self.enqueue(self.drag_gesture, touch.timestamp, touch.position, delta);
    }

    /// Emits one pinch sample from the two slot points, closing out any
    /// drag that was in progress first.
    fn process_pinch(&mut self, enabled: GestureType, first: &TouchEntry, second: &TouchEntry) {
        let delta = if first.previous_state == TouchState::Invalid {
            Vec2::ZERO
        } else {
            first.position - first.previous_position
        };
        let delta2 = if second.previous_state == TouchState::Invalid {
            Vec2::ZERO
        } else {
            second.position - second.previous_position
        };

        // Until either point actually moves there is no pinch to report;
        // the sample would carry two zero deltas.
        if delta == Vec2::ZERO && delta2 == Vec2::ZERO {
            return;
        }

        if !self.drag_gesture.is_empty() && self.drag_gesture != GestureType::DRAG_COMPLETE {
            if enabled.contains(GestureType::DRAG_COMPLETE) {
                self.enqueue(
                    GestureType::DRAG_COMPLETE,
                    first.timestamp.max(second.timestamp),
                    Vec2::ZERO,
                    Vec2::ZERO,
                );
            }
            self.drag_gesture = GestureType::empty();
        }

        self.queue.push_back(GestureSample {
            gesture_type: GestureType::PINCH,
            timestamp: first.timestamp.max(second.timestamp),
            position: first.position,
            position2: second.position,
            delta,
            delta2,
        });
        self.pinch_started = true;
        self.tap_disabled = true;
        self.hold_disabled = true;
    }

    fn enqueue(&mut self, gesture_type: GestureType, timestamp: Duration, position: Vec2, delta: Vec2) {
        self.queue.push_back(GestureSample {
            gesture_type,
            timestamp,
            position,
            position2: Vec2::ZERO,
            delta,
            delta2: Vec2::ZERO,
        });
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use glam::Vec2;

    use super::{GestureRecognizer, GestureType};
    use crate::store::TouchEntry;

    fn millis(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    fn moved_entry(id: u32, from: Vec2, to: Vec2, elapsed: Duration, frame: u64) -> TouchEntry {
        let mut entry = TouchEntry::pressed(id, from, Duration::ZERO, 1);
        entry.age();
        entry.apply_move(to, elapsed, frame);
        entry
    }

    #[test]
    fn unclassifiable_delta_parks_the_drag_without_a_sample() {
        // Vertical movement with only horizontal drags enabled matches
        // neither axis nor free drag.
        let entry = moved_entry(2, Vec2::ZERO, Vec2::new(0.0, 50.0), millis(16), 2);
        let mut recognizer = GestureRecognizer::default();
        recognizer.update(&[entry], GestureType::HORIZONTAL_DRAG, millis(16), true);
        assert!(!recognizer.has_queued());
    }

    #[test]
    fn slow_releases_never_flick() {
        let mut entry = moved_entry(2, Vec2::ZERO, Vec2::new(100.0, 0.0), millis(10_000), 2);
        entry.apply_release(Vec2::new(100.0, 0.0), millis(10_016), 3);
        // Well past the jitter tolerance, but at ~4.5 units/sec.
        let mut recognizer = GestureRecognizer::default();
        recognizer.update(&[entry], GestureType::FLICK | GestureType::TAP, millis(10_016), true);
        assert!(!recognizer.has_queued());
    }

    #[test]
    fn availability_passes_do_not_emit_drag_samples() {
        let entry = moved_entry(2, Vec2::ZERO, Vec2::new(100.0, 0.0), millis(16), 2);
        let mut recognizer = GestureRecognizer::default();
        recognizer.update(&[entry], GestureType::FREE_DRAG, millis(16), false);
        assert!(!recognizer.has_queued());
        recognizer.update(&[entry], GestureType::FREE_DRAG, millis(16), true);
        assert!(recognizer.has_queued());
    }
}
