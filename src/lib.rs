//! Multi-touch tracking and gesture recognition.
//!
//! This crate re-exports [`tactile_input`], which converts raw platform
//! touch events into per-frame touch snapshots and synthesized gestures.
//! See [`TouchPanel`] for the entry point.

pub use tactile_input::{
    gesture, touch, GestureReadError, GestureSample, GestureType, TouchCapabilities, TouchEvent,
    TouchLocation, TouchPanel, TouchPhase, TouchState,
};

/// Commonly used types, re-exported for glob import.
pub mod prelude {
    pub use tactile_input::prelude::*;
}
