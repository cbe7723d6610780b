use crate::{
    core::{constants::VELOCITY_SAMPLE_WINDOW_MS, geo::Point},
    input::events::{InputEvent, TouchEventType, TouchPoint},
    prelude::{Duration, HashMap, Instant, VecDeque},
};

/// Gestures recognised from raw input, in the order they happened
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// A pointer or first finger went down
    Press { position: Point },
    /// Drag movement as a scroll offset: previous position minus current
    Pan { delta: Point },
    /// Scale the surface by `factor` around `focus`
    Zoom { factor: f64, focus: Point },
    /// The last pointer or finger lifted
    Release(PointerRelease),
    Resize { size: Point },
}

/// Summary of a finished press
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerRelease {
    pub position: Point,
    /// Total distance moved while pressed, in pixels
    pub travel: f64,
    /// Pointer velocity over the last sample window, in pixels per second
    pub velocity: Point,
    /// More than one finger was down at some point during the press
    pub multi_touch: bool,
}

impl PointerRelease {
    /// Only a single-pointer press that never moved counts as a tap
    pub fn is_tap(&self) -> bool {
        self.travel == 0.0 && !self.multi_touch
    }
}

#[derive(Debug, Clone)]
struct PressState {
    last_position: Point,
    travel: f64,
    multi_touch: bool,
    samples: VecDeque<(Point, Instant)>,
}

impl PressState {
    fn new(position: Point, now: Instant) -> Self {
        let mut samples = VecDeque::new();
        samples.push_back((position, now));
        Self {
            last_position: position,
            travel: 0.0,
            multi_touch: false,
            samples,
        }
    }

    /// Records a move and returns the pan delta it produced
    fn move_to(&mut self, position: Point, now: Instant, window: Duration) -> Option<Point> {
        let delta = self.last_position.subtract(&position);
        self.last_position = position;
        self.samples.push_back((position, now));
        self.prune(now, window);
        if delta.is_zero() {
            return None;
        }
        self.travel += delta.magnitude();
        Some(delta)
    }

    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some((_, at)) = self.samples.front() {
            if now.saturating_duration_since(*at) > window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    fn velocity(&mut self, now: Instant, window: Duration) -> Point {
        self.prune(now, window);
        match (self.samples.front(), self.samples.back()) {
            (Some((first, started)), Some((last, ended))) => {
                let seconds = ended.saturating_duration_since(*started).as_secs_f64();
                if seconds > 0.0 {
                    last.subtract(first).divide(seconds)
                } else {
                    Point::zero()
                }
            }
            _ => Point::zero(),
        }
    }
}

/// Turns pointer, wheel and touch events into [`Gesture`]s.
///
/// Tracks the travel of each press so a release can be told apart as a tap,
/// and the recent pointer samples so a release carries a flick velocity.
pub struct GestureTracker {
    pub enabled: bool,
    wheel_sensitivity: f64,
    sample_window: Duration,
    press: Option<PressState>,
    touches: HashMap<u64, Point>,
    pinch_distance: Option<f64>,
}

impl GestureTracker {
    pub fn new(wheel_sensitivity: f64) -> Self {
        Self {
            enabled: true,
            wheel_sensitivity,
            sample_window: Duration::from_millis(VELOCITY_SAMPLE_WINDOW_MS),
            press: None,
            touches: HashMap::default(),
            pinch_distance: None,
        }
    }

    /// Whether a pointer or finger is currently down
    pub fn is_pressed(&self) -> bool {
        self.press.is_some()
    }

    pub fn process(&mut self, event: InputEvent, now: Instant) -> Vec<Gesture> {
        if !self.enabled {
            return Vec::new();
        }

        let mut gestures = Vec::new();
        match event {
            InputEvent::PointerDown { position } => {
                self.press = Some(PressState::new(position, now));
                gestures.push(Gesture::Press { position });
            }
            InputEvent::PointerMove { position } => {
                self.pointer_move(position, now, &mut gestures);
            }
            InputEvent::PointerUp { position } => {
                self.pointer_move(position, now, &mut gestures);
                self.release(position, now, &mut gestures);
            }
            InputEvent::Scroll { delta, position } => {
                if delta != 0.0 {
                    gestures.push(Gesture::Zoom {
                        factor: (-delta * self.wheel_sensitivity).exp(),
                        focus: position,
                    });
                }
            }
            InputEvent::Touch {
                event_type,
                touches,
            } => {
                self.process_touch(event_type, touches, now, &mut gestures);
            }
            InputEvent::Resize { size } => gestures.push(Gesture::Resize { size }),
        }
        gestures
    }

    fn pointer_move(&mut self, position: Point, now: Instant, gestures: &mut Vec<Gesture>) {
        let window = self.sample_window;
        if let Some(press) = self.press.as_mut() {
            if let Some(delta) = press.move_to(position, now, window) {
                gestures.push(Gesture::Pan { delta });
            }
        }
    }

    fn release(&mut self, position: Point, now: Instant, gestures: &mut Vec<Gesture>) {
        if let Some(mut press) = self.press.take() {
            let velocity = press.velocity(now, self.sample_window);
            gestures.push(Gesture::Release(PointerRelease {
                position,
                travel: press.travel,
                velocity,
                multi_touch: press.multi_touch,
            }));
        }
    }

    fn process_touch(
        &mut self,
        event_type: TouchEventType,
        touches: Vec<TouchPoint>,
        now: Instant,
        gestures: &mut Vec<Gesture>,
    ) {
        match event_type {
            TouchEventType::Start => {
                for touch in touches {
                    self.touches.insert(touch.id, touch.position);
                }
                if self.press.is_none() {
                    if let Some(position) = self.touch_centroid() {
                        self.press = Some(PressState::new(position, now));
                        gestures.push(Gesture::Press { position });
                    }
                }
                self.restart_touch_tracking(now);
            }
            TouchEventType::Move => {
                for touch in touches {
                    if let Some(current) = self.touches.get_mut(&touch.id) {
                        *current = touch.position;
                    }
                }
                if let (Some(previous), Some(distance)) =
                    (self.pinch_distance, self.pinch_span())
                {
                    if previous > 0.0 && distance > 0.0 && distance != previous {
                        if let Some(focus) = self.touch_centroid() {
                            gestures.push(Gesture::Zoom {
                                factor: distance / previous,
                                focus,
                            });
                        }
                    }
                    self.pinch_distance = Some(distance);
                }
                if let Some(centroid) = self.touch_centroid() {
                    self.pointer_move(centroid, now, gestures);
                }
            }
            TouchEventType::End | TouchEventType::Cancel => {
                let last_position = self.touch_centroid();
                for touch in &touches {
                    self.touches.remove(&touch.id);
                }
                if self.touches.is_empty() {
                    let position = touches
                        .first()
                        .map(|t| t.position)
                        .or(last_position)
                        .unwrap_or_else(Point::zero);
                    self.pinch_distance = None;
                    self.release(position, now, gestures);
                } else {
                    self.restart_touch_tracking(now);
                }
            }
        }
    }

    /// Re-anchors the press after the finger count changes so the centroid
    /// jump is not read as a pan. A multi-finger press is never a tap.
    fn restart_touch_tracking(&mut self, now: Instant) {
        self.pinch_distance = self.pinch_span();
        let centroid = self.touch_centroid();
        if let (Some(press), Some(centroid)) = (self.press.as_mut(), centroid) {
            press.last_position = centroid;
            press.samples.clear();
            press.samples.push_back((centroid, now));
            if self.touches.len() > 1 {
                press.multi_touch = true;
            }
        }
    }

    fn touch_centroid(&self) -> Option<Point> {
        if self.touches.is_empty() {
            return None;
        }
        let sum = self
            .touches
            .values()
            .fold(Point::zero(), |acc, p| acc.add(p));
        Some(sum.divide(self.touches.len() as f64))
    }

    /// Distance between the first two fingers, when two are down
    fn pinch_span(&self) -> Option<f64> {
        let mut ids: Vec<&u64> = self.touches.keys().collect();
        if ids.len() < 2 {
            return None;
        }
        ids.sort();
        let a = self.touches[ids[0]];
        let b = self.touches[ids[1]];
        Some(a.distance_to(&b))
    }
}

impl Default for GestureTracker {
    fn default() -> Self {
        Self::new(crate::core::constants::WHEEL_ZOOM_SENSITIVITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(start: Instant, ms: u64) -> Instant {
        start + Duration::from_millis(ms)
    }

    #[test]
    fn test_press_without_motion_is_tap() {
        let mut tracker = GestureTracker::default();
        let start = Instant::now();
        let position = Point::new(40.0, 40.0);

        tracker.process(InputEvent::PointerDown { position }, start);
        let gestures = tracker.process(InputEvent::PointerUp { position }, at(start, 80));

        match gestures.as_slice() {
            [Gesture::Release(release)] => {
                assert!(release.is_tap());
                assert!(release.velocity.is_zero());
            }
            other => panic!("unexpected gestures {:?}", other),
        }
    }

    #[test]
    fn test_drag_emits_scroll_style_deltas() {
        let mut tracker = GestureTracker::default();
        let start = Instant::now();

        tracker.process(
            InputEvent::PointerDown {
                position: Point::new(100.0, 100.0),
            },
            start,
        );
        let gestures = tracker.process(
            InputEvent::PointerMove {
                position: Point::new(130.0, 100.0),
            },
            at(start, 16),
        );

        assert_eq!(
            gestures,
            vec![Gesture::Pan {
                delta: Point::new(-30.0, 0.0)
            }]
        );
        assert!(tracker.is_pressed());
    }

    #[test]
    fn test_one_pixel_drag_is_not_a_tap() {
        let mut tracker = GestureTracker::default();
        let start = Instant::now();

        tracker.process(
            InputEvent::PointerDown {
                position: Point::new(10.0, 10.0),
            },
            start,
        );
        let gestures = tracker.process(
            InputEvent::PointerUp {
                position: Point::new(11.0, 10.0),
            },
            at(start, 10),
        );

        let release = gestures
            .iter()
            .find_map(|g| match g {
                Gesture::Release(r) => Some(*r),
                _ => None,
            })
            .unwrap();
        assert!(!release.is_tap());
        assert_eq!(release.travel, 1.0);
    }

    #[test]
    fn test_release_velocity_uses_recent_samples() {
        let mut tracker = GestureTracker::default();
        let start = Instant::now();

        tracker.process(
            InputEvent::PointerDown {
                position: Point::new(0.0, 0.0),
            },
            start,
        );
        tracker.process(
            InputEvent::PointerMove {
                position: Point::new(50.0, 0.0),
            },
            at(start, 50),
        );
        let gestures = tracker.process(
            InputEvent::PointerUp {
                position: Point::new(100.0, 0.0),
            },
            at(start, 100),
        );

        let release = gestures
            .iter()
            .find_map(|g| match g {
                Gesture::Release(r) => Some(*r),
                _ => None,
            })
            .unwrap();
        assert!((release.velocity.x - 1000.0).abs() < 1e-6);
        assert_eq!(release.velocity.y, 0.0);
    }

    #[test]
    fn test_held_still_release_has_no_velocity() {
        let mut tracker = GestureTracker::default();
        let start = Instant::now();

        tracker.process(
            InputEvent::PointerDown {
                position: Point::new(0.0, 0.0),
            },
            start,
        );
        tracker.process(
            InputEvent::PointerMove {
                position: Point::new(60.0, 0.0),
            },
            at(start, 20),
        );
        let gestures = tracker.process(
            InputEvent::PointerUp {
                position: Point::new(60.0, 0.0),
            },
            at(start, 500),
        );

        match gestures.last() {
            Some(Gesture::Release(release)) => assert!(release.velocity.is_zero()),
            other => panic!("unexpected gesture {:?}", other),
        }
    }

    #[test]
    fn test_wheel_maps_to_zoom_factor() {
        let mut tracker = GestureTracker::new(0.01);
        let gestures = tracker.process(
            InputEvent::Scroll {
                delta: -100.0,
                position: Point::new(5.0, 5.0),
            },
            Instant::now(),
        );

        match gestures.as_slice() {
            [Gesture::Zoom { factor, focus }] => {
                assert!((factor - 1f64.exp()).abs() < 1e-9);
                assert_eq!(*focus, Point::new(5.0, 5.0));
            }
            other => panic!("unexpected gestures {:?}", other),
        }
    }

    #[test]
    fn test_pinch_zooms_around_midpoint() {
        let mut tracker = GestureTracker::default();
        let start = Instant::now();

        tracker.process(
            InputEvent::Touch {
                event_type: TouchEventType::Start,
                touches: vec![
                    TouchPoint::new(1, Point::new(100.0, 100.0)),
                    TouchPoint::new(2, Point::new(200.0, 100.0)),
                ],
            },
            start,
        );
        let gestures = tracker.process(
            InputEvent::Touch {
                event_type: TouchEventType::Move,
                touches: vec![
                    TouchPoint::new(1, Point::new(50.0, 100.0)),
                    TouchPoint::new(2, Point::new(250.0, 100.0)),
                ],
            },
            at(start, 16),
        );

        assert_eq!(
            gestures,
            vec![Gesture::Zoom {
                factor: 2.0,
                focus: Point::new(150.0, 100.0)
            }]
        );

        let released = tracker.process(
            InputEvent::Touch {
                event_type: TouchEventType::End,
                touches: vec![
                    TouchPoint::new(1, Point::new(50.0, 100.0)),
                    TouchPoint::new(2, Point::new(250.0, 100.0)),
                ],
            },
            at(start, 32),
        );
        match released.as_slice() {
            [Gesture::Release(release)] => {
                assert!(release.multi_touch);
                assert_eq!(release.travel, 0.0);
                assert!(!release.is_tap());
            }
            other => panic!("unexpected gestures {:?}", other),
        }
    }

    #[test]
    fn test_single_touch_without_motion_is_tap() {
        let mut tracker = GestureTracker::default();
        let start = Instant::now();
        let finger = vec![TouchPoint::new(7, Point::new(30.0, 30.0))];

        tracker.process(
            InputEvent::Touch {
                event_type: TouchEventType::Start,
                touches: finger.clone(),
            },
            start,
        );
        let released = tracker.process(
            InputEvent::Touch {
                event_type: TouchEventType::End,
                touches: finger,
            },
            at(start, 40),
        );

        match released.as_slice() {
            [Gesture::Release(release)] => {
                assert!(!release.multi_touch);
                assert!(release.is_tap());
            }
            other => panic!("unexpected gestures {:?}", other),
        }
    }

    #[test]
    fn test_disabled_tracker_ignores_input() {
        let mut tracker = GestureTracker::default();
        tracker.enabled = false;
        assert!(tracker
            .process(
                InputEvent::PointerDown {
                    position: Point::zero()
                },
                Instant::now()
            )
            .is_empty());
        assert!(!tracker.is_pressed());
    }
}
