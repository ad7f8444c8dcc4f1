//! Lifecycle tracking of touch points between platform events and polls.

use core::time::Duration;

use glam::Vec2;
use log::warn;

use crate::touch::{TouchLocation, TouchState};
use crate::velocity::VelocityFilter;

/// What a release event did to an entry.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ReleaseOutcome {
    /// The entry carries state a poller still has to observe.
    Keep,
    /// The press was never observable; the entry must be dropped with
    /// nothing reported.
    Discard,
}

/// One tracked touch point.
///
/// Both projections of the event stream (the polling store and the gesture
/// store) share this record and its update rules; they differ only in
/// retention.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TouchEntry {
    pub(crate) id: u32,
    pub(crate) state: TouchState,
    pub(crate) position: Vec2,
    pub(crate) previous_state: TouchState,
    pub(crate) previous_position: Vec2,
    pub(crate) press_position: Vec2,
    pub(crate) press_timestamp: Duration,
    pub(crate) press_framestamp: u64,
    pub(crate) timestamp: Duration,
    pub(crate) framestamp: u64,
    pub(crate) same_frame_released: bool,
    pub(crate) velocity: VelocityFilter,
}

impl TouchEntry {
    pub(crate) fn pressed(id: u32, position: Vec2, timestamp: Duration, framestamp: u64) -> Self {
        Self {
            id,
            state: TouchState::Pressed,
            position,
            previous_state: TouchState::Invalid,
            previous_position: position,
            press_position: position,
            press_timestamp: timestamp,
            press_framestamp: framestamp,
            timestamp,
            framestamp,
            same_frame_released: false,
            velocity: VelocityFilter::default(),
        }
    }

    /// Applies a move event to this entry.
    ///
    /// The state is deliberately left untouched: the `Pressed` -> `Moved`
    /// transition happens only through aging, so a once-per-frame poller
    /// always observes at least one `Pressed` report.
    pub(crate) fn apply_move(&mut self, position: Vec2, timestamp: Duration, framestamp: u64) {
        debug_assert!(
            self.state != TouchState::Released,
            "move event applied to a released touch point"
        );
        debug_assert!(
            timestamp >= self.timestamp,
            "touch event timestamp went backwards"
        );
        let elapsed = timestamp.saturating_sub(self.timestamp);
        self.velocity.sample(position - self.position, elapsed);
        self.previous_state = self.state;
        self.previous_position = self.position;
        self.position = position;
        self.timestamp = timestamp;
        self.framestamp = framestamp;
    }

    /// Applies a release event to this entry.
    ///
    /// A point still `Pressed` whose last update landed on an earlier frame
    /// was never polled, so there is nothing a caller could coherently
    /// observe; such entries are discarded outright. A release landing in
    /// the press's own frame keeps reporting `Pressed` for exactly one more
    /// poll (the same-frame grace window).
    pub(crate) fn apply_release(
        &mut self,
        position: Vec2,
        timestamp: Duration,
        framestamp: u64,
    ) -> ReleaseOutcome {
        debug_assert!(
            self.state != TouchState::Released,
            "release event applied to a released touch point"
        );
        debug_assert!(
            timestamp >= self.timestamp,
            "touch event timestamp went backwards"
        );
        if self.state == TouchState::Pressed && self.framestamp != framestamp {
            return ReleaseOutcome::Discard;
        }
        let elapsed = timestamp.saturating_sub(self.timestamp);
        self.velocity.sample(position - self.position, elapsed);
        self.previous_state = self.state;
        self.previous_position = self.position;
        self.position = position;
        self.timestamp = timestamp;
        self.framestamp = framestamp;
        if self.previous_state == TouchState::Pressed && self.press_framestamp == framestamp {
            // Pressed and released inside one frame: lie about the state so
            // one poll can still observe the contact.
            self.same_frame_released = true;
        } else {
            self.state = TouchState::Released;
        }
        ReleaseOutcome::Keep
    }

    /// One aging step, run strictly after a poll snapshot (polling side) or
    /// after a recognition pass (gesture side).
    ///
    /// Returns `false` when the entry is finished and must be dropped. A
    /// `Pressed` entry with the same-frame flag has had its one grace
    /// report; its release is considered consumed and the point simply
    /// disappears. The flag only ever arises on the polling side: a
    /// gesture-side press is aged to `Moved` by the pass that follows it
    /// before any release can land.
    pub(crate) fn age(&mut self) -> bool {
        match self.state {
            TouchState::Released => false,
            TouchState::Pressed if self.same_frame_released => false,
            TouchState::Pressed => {
                self.previous_state = self.state;
                self.previous_position = self.position;
                self.state = TouchState::Moved;
                true
            }
            TouchState::Moved => {
                self.previous_state = self.state;
                self.previous_position = self.position;
                true
            }
            TouchState::Invalid => {
                debug_assert!(false, "aged a touch entry with an invalid state");
                false
            }
        }
    }

    /// The externally visible view of this entry.
    pub(crate) fn location(&self) -> TouchLocation {
        TouchLocation {
            id: self.id,
            state: self.state,
            position: self.position,
            previous_state: self.previous_state,
            previous_position: self.previous_position,
            press_position: self.press_position,
            press_timestamp: self.press_timestamp,
        }
    }
}

/// The polling-side projection of the touch event stream, answering
/// [`TouchPanel::get_state`](crate::TouchPanel::get_state).
#[derive(Debug, Default)]
pub(crate) struct TouchLocationStore {
    entries: Vec<TouchEntry>,
}

impl TouchLocationStore {
    pub(crate) fn on_press(&mut self, id: u32, position: Vec2, timestamp: Duration, framestamp: u64) {
        debug_assert!(
            self.entries.iter().all(|entry| entry.id != id),
            "stable touch id {id} is already tracked"
        );
        self.entries.push(TouchEntry::pressed(id, position, timestamp, framestamp));
    }

    /// Stale or duplicate platform events may reference a point that is no
    /// longer (or never was) tracked; those are dropped.
    pub(crate) fn on_move(&mut self, id: u32, position: Vec2, timestamp: Duration, framestamp: u64) {
        let Some(entry) = self.entries.iter_mut().find(|entry| entry.id == id) else {
            warn!("dropping move for untracked touch id {id}");
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
            warn!("dropping release for untracked touch id {id}");
            return;
        };
        if self.entries[index].apply_release(position, timestamp, framestamp)
            == ReleaseOutcome::Discard
        {
            self.entries.swap_remove(index);
        }
    }

    /// Drops the point without a `Released` report.
    pub(crate) fn on_cancel(&mut self, id: u32) {
        self.entries.retain(|entry| entry.id != id);
    }

    /// Last known position of a tracked point, used when synthesizing
    /// release events for the bulk-reset sweeps.
    pub(crate) fn position_of(&self, id: u32) -> Option<Vec2> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.position)
    }

    /// Produces the per-frame snapshot and advances every point's lifecycle
    /// by one step.
    ///
    /// Order matters: same-frame taps whose grace poll never came are swept
    /// first, the snapshot is taken second, and aging runs last so the
    /// returned states are the ones a caller polling once per frame is
    /// entitled to see.
    pub(crate) fn poll(&mut self, current_frame: u64) -> Vec<TouchLocation> {
        self.entries.retain(|entry| {
            !(entry.same_frame_released
                && entry.state == TouchState::Pressed
                && entry.framestamp < current_frame)
        });
        let snapshot = self.entries.iter().map(TouchEntry::location).collect();
        self.entries.retain_mut(TouchEntry::age);
        snapshot
    }
}
