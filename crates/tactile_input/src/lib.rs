//! Multi-touch tracking and gesture recognition.
//!
//! Raw platform touch events go in one side of a [`TouchPanel`]; stable
//! per-frame touch snapshots and a queue of synthesized gestures come out
//! the other. Native contact ids are remapped to stable ids, touch points
//! age through an explicit `Pressed`/`Moved`/`Released` lifecycle tuned so
//! a once-per-frame poller never misses a state, and a parallel
//! gesture-tracking store drives tap/double-tap/hold/drag/flick/pinch
//! classification.
//!
//! ```
//! use core::time::Duration;
//! use glam::Vec2;
//! use tactile_input::{GestureType, TouchPanel};
//!
//! let mut panel = TouchPanel::new();
//! panel.set_enabled_gestures(GestureType::TAP | GestureType::FREE_DRAG);
//!
//! // Once per update tick: advance the clock, then feed the tick's events.
//! panel.update_timestamp(Duration::from_millis(16));
//! panel.add_pressed_event(7, Vec2::new(120.0, 80.0));
//!
//! for touch in panel.get_state() {
//!     println!("touch {} is {:?} at {}", touch.id(), touch.state(), touch.position());
//! }
//!
//! while panel.is_gesture_available() {
//!     let gesture = panel.read_gesture().unwrap();
//!     println!("{:?} at {}", gesture.gesture_type, gesture.position);
//! }
//! ```

pub mod gesture;
pub mod touch;

mod id_map;
mod panel;
mod store;
mod velocity;

pub use gesture::{GestureReadError, GestureSample, GestureType};
pub use panel::{TouchCapabilities, TouchPanel};
pub use touch::{TouchEvent, TouchLocation, TouchPhase, TouchState};

/// Commonly used types, re-exported for glob import.
pub mod prelude {
    pub use crate::{
        GestureReadError, GestureSample, GestureType, TouchCapabilities, TouchEvent,
        TouchLocation, TouchPanel, TouchPhase, TouchState,
    };
}
