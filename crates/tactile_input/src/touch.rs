//! Raw touch events and the polled touch point view.

use core::time::Duration;

use glam::Vec2;

/// A phase of a raw platform touch event.
///
/// ## Usage
///
/// It is used to describe the phase of the touch input that is currently
/// active. This includes a phase that indicates that a touch input has
/// started or ended, or that a finger has moved. There is also a cancelled
/// phase that indicates that the platform cancelled the tracking of the
/// finger.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum TouchPhase {
    /// A finger started to touch the touchscreen.
    Started,
    /// A finger moved over the touchscreen.
    Moved,
    /// A finger stopped touching the touchscreen.
    Ended,
    /// The platform cancelled the tracking of the finger.
    ///
    /// This occurs when the window loses focus, or on iOS if the user moves
    /// the device against their face.
    Cancelled,
}

/// A raw touch event as delivered by the platform.
///
/// The position is in native window pixels; the panel scales it into the
/// logical display space before storing it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct TouchEvent {
    /// Phase of the touch event.
    pub phase: TouchPhase,
    /// Position of the touch, in native window pixels.
    pub position: Vec2,
    /// Platform-assigned identifier of a finger.
    ///
    /// Not guaranteed to be stable in meaning or uniqueness across time;
    /// the panel remaps it to a stable id.
    pub id: u64,
}

/// Lifecycle state of a tracked touch point.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum TouchState {
    /// No state. Only ever reported as the previous state of a point that
    /// has no one-step lookback yet.
    #[default]
    Invalid,
    /// The point is down and has not been reported as anything else yet.
    Pressed,
    /// The point is down and its `Pressed` report has already been observed.
    Moved,
    /// The point was lifted.
    Released,
}

/// A snapshot of one tracked touch point, as returned by
/// [`TouchPanel::get_state`](crate::TouchPanel::get_state).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchLocation {
    pub(crate) id: u32,
    pub(crate) state: TouchState,
    pub(crate) position: Vec2,
    pub(crate) previous_state: TouchState,
    pub(crate) previous_position: Vec2,
    pub(crate) press_position: Vec2,
    pub(crate) press_timestamp: Duration,
}

impl TouchLocation {
    /// Stable identifier of the point, unique among currently active points.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Current lifecycle state of the point.
    pub fn state(&self) -> TouchState {
        self.state
    }

    /// Current position, in logical display space.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Position captured when the point was pressed. Never changes for the
    /// lifetime of the point.
    pub fn press_position(&self) -> Vec2 {
        self.press_position
    }

    /// Time at which the point was pressed. Never changes for the lifetime
    /// of the point.
    pub fn press_timestamp(&self) -> Duration {
        self.press_timestamp
    }

    /// The state and position from one aging step back, if the point has
    /// been tracked for more than one step.
    pub fn previous_location(&self) -> Option<(TouchState, Vec2)> {
        (self.previous_state != TouchState::Invalid)
            .then_some((self.previous_state, self.previous_position))
    }

    /// Positional change since the previous location, or zero if the point
    /// has no previous location yet.
    pub fn delta(&self) -> Vec2 {
        if self.previous_state == TouchState::Invalid {
            Vec2::ZERO
        } else {
            self.position - self.previous_position
        }
    }

    /// Total positional change since the point was pressed.
    pub fn distance(&self) -> Vec2 {
        self.position - self.press_position
    }
}
