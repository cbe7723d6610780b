//! Opacity ramp for tiles whose image just arrived.

use crate::animation::easing::EasingFunction;
use crate::prelude::{HashMap, HashSet};
use std::time::Duration;

/// Tracks fade progress per tile id and maps it to an opacity.
///
/// Progress only advances while the caller reports the tile as ready, so a
/// tile fades in from the tick its image lands. A zero duration shows
/// images at full opacity immediately.
#[derive(Debug, Clone)]
pub struct FadeIn {
    duration: Duration,
    easing: EasingFunction,
    progress: HashMap<u64, f64>,
}

impl FadeIn {
    pub fn new(duration: Duration) -> Self {
        Self::with_easing(duration, EasingFunction::default())
    }

    pub fn with_easing(duration: Duration, easing: EasingFunction) -> Self {
        Self {
            duration,
            easing,
            progress: HashMap::default(),
        }
    }

    /// Advances the fade of tile `id` by `elapsed` and returns its opacity
    pub fn advance(&mut self, id: u64, elapsed: Duration) -> f32 {
        let step = if self.duration.is_zero() {
            1.0
        } else {
            elapsed.as_secs_f64() / self.duration.as_secs_f64()
        };
        let progress = self.progress.entry(id).or_insert(0.0);
        *progress = (*progress + step).min(1.0);
        self.easing.apply(*progress) as f32
    }

    /// Current opacity of tile `id`; zero if it has not started fading
    pub fn opacity(&self, id: u64) -> f32 {
        self.progress
            .get(&id)
            .map(|progress| self.easing.apply(*progress) as f32)
            .unwrap_or(0.0)
    }

    /// Forgets every tile not in `live`
    pub fn retain(&mut self, live: &HashSet<u64>) {
        self.progress.retain(|id, _| live.contains(id));
    }

    pub fn tracked(&self) -> usize {
        self.progress.len()
    }
}
