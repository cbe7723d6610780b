//! Inertial drift: velocity-driven origin motion that decays after a flick.

use crate::core::config::MosaicConfig;
use crate::core::geo::Point;
use std::time::Duration;

/// Decaying drift velocity in origin space (pixels per second).
///
/// Each tick moves the origin by `velocity * elapsed` and then multiplies the
/// velocity by the decay factor. Once the speed falls under the stop
/// threshold the velocity snaps to exactly zero.
#[derive(Debug, Clone)]
pub struct Drift {
    velocity: Point,
    decay: f64,
    stop_threshold: f64,
    suspended: bool,
}

impl Drift {
    pub fn new(decay: f64, stop_threshold: f64) -> Self {
        Self {
            velocity: Point::zero(),
            decay,
            stop_threshold,
            suspended: false,
        }
    }

    pub fn from_config(config: &MosaicConfig) -> Self {
        Self::new(config.drift_decay_factor, config.drift_stop_threshold)
    }

    pub fn velocity(&self) -> Point {
        self.velocity
    }

    /// True while there is velocity left to apply, suspended or not
    pub fn is_moving(&self) -> bool {
        !self.velocity.is_zero()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Replaces the current velocity
    pub fn set_velocity(&mut self, velocity: Point) {
        self.velocity = self.snap(velocity);
    }

    pub fn stop(&mut self) {
        self.velocity = Point::zero();
    }

    /// Holds the drift in place without losing its velocity
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    pub fn resume(&mut self) {
        self.suspended = false;
    }

    /// Advances one tick and returns the origin shift to apply, if any
    pub fn tick(&mut self, elapsed: Duration) -> Option<Point> {
        if self.suspended || self.velocity.is_zero() {
            return None;
        }

        let delta = self.velocity.multiply(elapsed.as_secs_f64());
        self.velocity = self.snap(self.velocity.multiply(self.decay));

        if delta.is_zero() {
            None
        } else {
            Some(delta)
        }
    }

    fn snap(&self, velocity: Point) -> Point {
        if velocity.magnitude() < self.stop_threshold {
            Point::zero()
        } else {
            velocity
        }
    }
}

impl Default for Drift {
    fn default() -> Self {
        Self::from_config(&MosaicConfig::default())
    }
}
