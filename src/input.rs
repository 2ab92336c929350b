use std::time::Duration;

use bevy::input::{keyboard::KeyCode, ButtonInput};
use bevy::math::Vec2;
use bevy::time::Time;

use crate::camera::CameraProvider;

/// Monotonic time source, sampled once per simulation tick.
pub trait Clock {
    /// Time since the clock started.
    fn elapsed(&self) -> Duration;
    /// Seconds since the previous tick.
    fn delta_seconds(&self) -> f32;
}

/// Screen space cursor in logical pixels, origin at the top left corner.
pub trait PointerInput {
    /// `None` while the cursor is outside the window.
    fn cursor_position(&self) -> Option<Vec2>;
}

pub trait KeyInput {
    fn pressed(&self, key: KeyCode) -> bool;
    fn just_pressed(&self, key: KeyCode) -> bool;
    fn just_released(&self, key: KeyCode) -> bool;
}

/// Everything the simulation reads from the outside world for one tick.
#[derive(Clone, Copy)]
pub struct SimulationInput<'a> {
    pub clock: &'a dyn Clock,
    pub pointer: &'a dyn PointerInput,
    pub keys: &'a dyn KeyInput,
    pub camera: &'a dyn CameraProvider,
}

impl Clock for Time {
    fn elapsed(&self) -> Duration {
        Time::elapsed(self)
    }

    fn delta_seconds(&self) -> f32 {
        Time::delta_seconds(self)
    }
}

impl KeyInput for ButtonInput<KeyCode> {
    fn pressed(&self, key: KeyCode) -> bool {
        ButtonInput::pressed(self, key)
    }

    fn just_pressed(&self, key: KeyCode) -> bool {
        ButtonInput::just_pressed(self, key)
    }

    fn just_released(&self, key: KeyCode) -> bool {
        ButtonInput::just_released(self, key)
    }
}

/// Cursor position of the primary window, `None` when it is outside or there is no window.
impl PointerInput for Option<Vec2> {
    fn cursor_position(&self) -> Option<Vec2> {
        *self
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::Cell;
    use std::collections::HashSet;

    use super::*;

    /// Clock advanced by hand.
    #[derive(Default)]
    pub struct ManualClock {
        elapsed: Cell<Duration>,
        delta: Cell<f32>,
    }

    impl ManualClock {
        pub fn advance(&self, by: Duration) {
            self.elapsed.set(self.elapsed.get() + by);
            self.delta.set(by.as_secs_f32());
        }
    }

    impl Clock for ManualClock {
        fn elapsed(&self) -> Duration {
            self.elapsed.get()
        }

        fn delta_seconds(&self) -> f32 {
            self.delta.get()
        }
    }

    /// Keyboard snapshot with explicit edges, mirroring how `ButtonInput` reports a frame.
    #[derive(Default, Clone)]
    pub struct KeySet {
        held: HashSet<KeyCode>,
        pressed_now: HashSet<KeyCode>,
        released_now: HashSet<KeyCode>,
    }

    impl KeySet {
        pub fn press(&mut self, key: KeyCode) {
            if self.held.insert(key) {
                self.pressed_now.insert(key);
            }
        }

        pub fn release(&mut self, key: KeyCode) {
            if self.held.remove(&key) {
                self.released_now.insert(key);
            }
        }

        /// Ends the frame, dropping edges but keeping held keys.
        pub fn clear_edges(&mut self) {
            self.pressed_now.clear();
            self.released_now.clear();
        }
    }

    impl KeyInput for KeySet {
        fn pressed(&self, key: KeyCode) -> bool {
            self.held.contains(&key)
        }

        fn just_pressed(&self, key: KeyCode) -> bool {
            self.pressed_now.contains(&key)
        }

        fn just_released(&self, key: KeyCode) -> bool {
            self.released_now.contains(&key)
        }
    }

    #[test]
    fn key_set_edges_last_one_frame() {
        let mut keys = KeySet::default();
        keys.press(KeyCode::KeyF);
        assert!(keys.just_pressed(KeyCode::KeyF));
        keys.clear_edges();
        assert!(keys.pressed(KeyCode::KeyF));
        assert!(!keys.just_pressed(KeyCode::KeyF));
        keys.release(KeyCode::KeyF);
        assert!(keys.just_released(KeyCode::KeyF));
        assert!(!keys.pressed(KeyCode::KeyF));
    }
}
