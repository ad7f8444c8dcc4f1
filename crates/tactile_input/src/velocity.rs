//! Low-pass filtering of per-update touch velocity.

use core::time::Duration;

use glam::Vec2;

/// Smoothing coefficient of the exponential low-pass filter.
pub(crate) const VELOCITY_SMOOTHING: f32 = 0.45;

/// Exponential low-pass filter over instantaneous `delta / elapsed`
/// velocity samples.
///
/// Raw per-update deltas are far too noisy to threshold directly (flick
/// detection keys off this estimate), so each sample only pulls the
/// estimate [`VELOCITY_SMOOTHING`] of the way toward the instantaneous
/// velocity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct VelocityFilter {
    velocity: Vec2,
}

impl VelocityFilter {
    /// Current filtered velocity, in logical display units per second.
    pub(crate) fn get(&self) -> Vec2 {
        self.velocity
    }

    /// Feeds one positional delta observed over `elapsed`.
    ///
    /// A zero elapsed time leaves the estimate unchanged; two events inside
    /// the same clock tick carry no usable velocity information.
    pub(crate) fn sample(&mut self, delta: Vec2, elapsed: Duration) {
        let secs = elapsed.as_secs_f32();
        if secs > 0.0 {
            let instantaneous = delta / secs;
            self.velocity += (instantaneous - self.velocity) * VELOCITY_SMOOTHING;
        }
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use glam::Vec2;

    use super::VelocityFilter;

    const STEP: Duration = Duration::from_millis(100);

    #[test]
    fn first_sample_does_not_overshoot() {
        let mut filter = VelocityFilter::default();
        filter.sample(Vec2::new(50.0, 0.0), STEP);
        // One step from rest lands at 0.45 of the instantaneous velocity.
        assert_eq!(filter.get(), Vec2::new(225.0, 0.0));
    }

    #[test]
    fn repeated_samples_converge_monotonically() {
        let mut filter = VelocityFilter::default();
        let target = 500.0;
        let mut previous = 0.0;
        for _ in 0..20 {
            filter.sample(Vec2::new(50.0, 0.0), STEP);
            let current = filter.get().x;
            assert!(current > previous);
            assert!(current < target);
            previous = current;
        }
        assert!((target - previous) < 1.0);
    }

    #[test]
    fn zero_elapsed_sample_is_ignored() {
        let mut filter = VelocityFilter::default();
        filter.sample(Vec2::new(50.0, 0.0), STEP);
        let before = filter.get();
        filter.sample(Vec2::new(1000.0, 1000.0), Duration::ZERO);
        assert_eq!(filter.get(), before);
    }
}
