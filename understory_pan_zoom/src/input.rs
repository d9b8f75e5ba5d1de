// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-agnostic input records and the small sets the engine tracks between events.
//!
//! Positions are viewport-local pixels and timestamps are host milliseconds.
//! Touch records carry the complete list of touches currently down, not just
//! the ones that changed, so the engine can drop touches whose end event never
//! arrived.

use kurbo::Point;

/// A mouse button.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button.
    Left,
    /// Wheel button.
    Middle,
    /// Secondary button.
    Right,
}

/// A mouse pointer event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerInput {
    /// Pointer position in viewport pixels.
    pub position: Point,
    /// Button involved in a press or release, if any.
    pub button: Option<MouseButton>,
    /// Host timestamp in milliseconds.
    pub time_ms: u64,
}

impl PointerInput {
    /// A pointer event without a button.
    #[must_use]
    pub fn new(position: Point, time_ms: u64) -> Self {
        Self {
            position,
            button: None,
            time_ms,
        }
    }

    /// Sets the button.
    #[must_use]
    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = Some(button);
        self
    }
}

/// A wheel event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WheelInput {
    /// Pointer position in viewport pixels.
    pub position: Point,
    /// Vertical delta; negative values zoom in.
    pub delta_y: f64,
    /// Ctrl held, which browsers also report for touchpad pinches.
    pub ctrl_key: bool,
    /// Host timestamp in milliseconds.
    pub time_ms: u64,
}

impl WheelInput {
    /// A wheel event without modifiers.
    #[must_use]
    pub fn new(position: Point, delta_y: f64, time_ms: u64) -> Self {
        Self {
            position,
            delta_y,
            ctrl_key: false,
            time_ms,
        }
    }
}

/// One finger on the surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchPoint {
    /// Host identifier, stable for the lifetime of the touch.
    pub id: u64,
    /// Position in viewport pixels.
    pub position: Point,
}

impl TouchPoint {
    /// Creates a touch point.
    #[must_use]
    pub fn new(id: u64, position: Point) -> Self {
        Self { id, position }
    }
}

/// A touch event.
#[derive(Clone, Debug, PartialEq)]
pub struct TouchInput {
    /// Every touch currently down after this event.
    pub touches: Vec<TouchPoint>,
    /// Host timestamp in milliseconds.
    pub time_ms: u64,
}

impl TouchInput {
    /// Creates a touch event.
    #[must_use]
    pub fn new(touches: Vec<TouchPoint>, time_ms: u64) -> Self {
        Self { touches, time_ms }
    }
}

/// The raw input that caused a notification.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    /// Wheel or touchpad pinch.
    Wheel(WheelInput),
    /// Mouse pointer.
    Pointer(PointerInput),
    /// Touch.
    Touch(TouchInput),
}

/// Keys currently held, by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PressedKeys {
    keys: Vec<String>,
}

impl PressedKeys {
    /// Records `key` as held.
    pub fn press(&mut self, key: &str) {
        if !self.is_pressed(key) {
            self.keys.push(key.to_owned());
        }
    }

    /// Records `key` as released.
    pub fn release(&mut self, key: &str) {
        self.keys.retain(|held| held != key);
    }

    /// Forgets every held key.
    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Returns `true` if `key` is held.
    #[must_use]
    pub fn is_pressed(&self, key: &str) -> bool {
        self.keys.iter().any(|held| held == key)
    }

    /// Returns `true` when `required` is empty or any of its keys is held.
    #[must_use]
    pub fn any_pressed(&self, required: &[String]) -> bool {
        required.is_empty() || required.iter().any(|key| self.is_pressed(key))
    }

    /// Returns `true` when no key is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Touches that are down, in the order they went down.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActiveTouches {
    touches: Vec<TouchPoint>,
}

impl ActiveTouches {
    /// Makes the set match `current`.
    ///
    /// Touches missing from `current` are removed, known ones take their new
    /// positions, and unknown ones are appended. Duplicate ids in `current`
    /// collapse into a single entry.
    pub fn reconcile(&mut self, current: &[TouchPoint]) {
        self.touches
            .retain(|touch| current.iter().any(|other| other.id == touch.id));
        for point in current {
            match self.touches.iter_mut().find(|touch| touch.id == point.id) {
                Some(touch) => touch.position = point.position,
                None => self.touches.push(*point),
            }
        }
    }

    /// Forgets every touch.
    pub fn clear(&mut self) {
        self.touches.clear();
    }

    /// Number of touches down.
    #[must_use]
    pub fn len(&self) -> usize {
        self.touches.len()
    }

    /// Returns `true` when no touch is down.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.touches.is_empty()
    }

    /// The oldest touch.
    #[must_use]
    pub fn first(&self) -> Option<TouchPoint> {
        self.touches.first().copied()
    }

    /// Positions of the two oldest touches.
    #[must_use]
    pub fn pair(&self) -> Option<(Point, Point)> {
        match self.touches.as_slice() {
            [a, b, ..] => Some((a.position, b.position)),
            _ => None,
        }
    }

    /// Iterates over the touches in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &TouchPoint> {
        self.touches.iter()
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Point;

    use super::*;

    #[test]
    fn pressed_keys_deduplicate_and_match_any() {
        let mut keys = PressedKeys::default();
        keys.press("Shift");
        keys.press("Shift");
        assert!(keys.is_pressed("Shift"));

        let required = vec!["Control".to_owned(), "Shift".to_owned()];
        assert!(keys.any_pressed(&required));
        assert!(keys.any_pressed(&[]));

        keys.release("Shift");
        assert!(!keys.any_pressed(&required));
        assert!(keys.is_empty());
    }

    #[test]
    fn reconcile_keeps_arrival_order_and_drops_stale_touches() {
        let mut active = ActiveTouches::default();
        active.reconcile(&[TouchPoint::new(7, Point::new(1.0, 1.0))]);
        active.reconcile(&[
            TouchPoint::new(3, Point::new(5.0, 5.0)),
            TouchPoint::new(7, Point::new(2.0, 2.0)),
        ]);
        let ids: Vec<u64> = active.iter().map(|t| t.id).collect();
        assert_eq!(ids, [7, 3]);
        assert_eq!(
            active.pair(),
            Some((Point::new(2.0, 2.0), Point::new(5.0, 5.0)))
        );

        // Touch 7 ended without an end event reaching us.
        active.reconcile(&[TouchPoint::new(3, Point::new(6.0, 6.0))]);
        assert_eq!(active.len(), 1);
        assert_eq!(active.first().map(|t| t.id), Some(3));
        assert_eq!(active.pair(), None);
    }

    #[test]
    fn reconcile_collapses_duplicate_ids() {
        let mut active = ActiveTouches::default();
        active.reconcile(&[
            TouchPoint::new(1, Point::new(0.0, 0.0)),
            TouchPoint::new(1, Point::new(9.0, 9.0)),
        ]);
        assert_eq!(active.len(), 1);
        active.clear();
        assert!(active.is_empty());
    }
}
