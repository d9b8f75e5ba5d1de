// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two-finger pinch.
//!
//! The scale follows the ratio of finger distances to the distance at
//! gesture start. The translation superposes the anchored-zoom solve around
//! the finger midpoint with the midpoint's own frame-to-frame movement.

use kurbo::{Point, Vec2};

use super::Layout;
use crate::bounds::{anchored_zoom_position, clamp_position, clamp_scale, gesture_padding};
use crate::config::Setup;
use crate::input::PressedKeys;
use crate::state::TransformState;

/// Values captured when a pinch starts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PinchStart {
    pub(crate) distance: f64,
    pub(crate) scale: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct PinchRuntime {
    pub(crate) start: Option<PinchStart>,
    /// Finger midpoint of the previous sample, in viewport pixels.
    pub(crate) last_center: Option<Point>,
}

impl PinchRuntime {
    /// Begins a pinch. Returns `false` when the fingers coincide.
    pub(crate) fn start(&mut self, a: Point, b: Point, state: &TransformState) -> bool {
        let distance = a.distance(b);
        if !(distance.is_finite() && distance > 0.0) {
            return false;
        }
        self.start = Some(PinchStart {
            distance,
            scale: state.scale,
        });
        self.last_center = Some(a.midpoint(b));
        true
    }

    pub(crate) fn is_pinching(&self) -> bool {
        self.start.is_some()
    }

    /// Ends the pinch, returning the last midpoint.
    pub(crate) fn end(&mut self) -> Option<Point> {
        let center = self.last_center;
        *self = Self::default();
        center
    }
}

/// Gating for starting a pinch.
pub(crate) fn pinch_allowed(keys: &PressedKeys, setup: &Setup) -> bool {
    !setup.disabled
        && !setup.pinch.disabled
        && !setup.zoom.disabled
        && keys.any_pressed(&setup.zoom.activation_keys)
}

/// Scale for the current finger distance, with the padded lower limit.
pub(crate) fn pinch_scale(start: &PinchStart, distance: f64, setup: &Setup) -> f64 {
    let ratio = distance / start.distance;
    let adjusted = 1.0 + (ratio - 1.0) * setup.pinch.step;
    clamp_scale(start.scale * adjusted, setup, true)
}

/// Candidate transform for fingers at `a` and `b`.
///
/// Returns `None` when the midpoint cannot be mapped into content
/// coordinates, or when neither the scale nor the midpoint moved.
pub(crate) fn pinch_transform(
    state: &TransformState,
    start: &PinchStart,
    last_center: Point,
    a: Point,
    b: Point,
    layout: &Layout,
    setup: &Setup,
) -> Option<TransformState> {
    let center = a.midpoint(b);
    let anchor = state.viewport_to_content(center);
    if !(anchor.x.is_finite() && anchor.y.is_finite()) {
        return None;
    }
    let new_scale = pinch_scale(start, a.distance(b), setup);
    if !new_scale.is_finite() {
        return None;
    }
    let pan: Vec2 = center - last_center;
    if new_scale == state.scale && pan == Vec2::ZERO {
        return None;
    }
    let candidate = anchored_zoom_position(state, anchor, new_scale) + pan;
    let bounds = layout.bounds(new_scale, setup);
    let position = clamp_position(
        candidate,
        &bounds,
        setup.bounds.limit_to_bounds,
        gesture_padding(setup, new_scale),
    );
    Some(state.with(new_scale, position.x, position.y))
}

#[cfg(test)]
mod tests {
    use kurbo::{Point, Size};

    use super::*;
    use crate::config::Config;

    fn layout() -> Layout {
        Layout {
            content: Size::new(800.0, 600.0),
            viewport: Size::new(400.0, 300.0),
        }
    }

    fn setup() -> Setup {
        Setup::from_config(&Config::default()).0
    }

    fn started(state: &TransformState, a: Point, b: Point) -> PinchRuntime {
        let mut pinch = PinchRuntime::default();
        assert!(pinch.start(a, b, state));
        pinch
    }

    #[test]
    fn spreading_fingers_scales_by_distance_ratio() {
        let state = TransformState::new(1.0, 0.0, 0.0);
        let pinch = started(&state, Point::new(100.0, 100.0), Point::new(200.0, 100.0));
        let start = pinch.start.expect("pinching");
        let next = pinch_transform(
            &state,
            &start,
            pinch.last_center.expect("center"),
            Point::new(80.0, 100.0),
            Point::new(220.0, 100.0),
            &layout(),
            &setup(),
        )
        .expect("scale changed");
        assert!((next.scale - 1.4).abs() < 1e-12);

        // The midpoint did not move, so the content under it stays put.
        let anchor = state.viewport_to_content(Point::new(150.0, 100.0));
        let pixel = next.content_to_viewport(anchor);
        assert!((pixel.x - 150.0).abs() < 1e-9);
        assert!((pixel.y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn ratio_is_clamped_to_max_scale() {
        let state = TransformState::new(6.0, -1000.0, -1000.0);
        let pinch = started(&state, Point::new(100.0, 100.0), Point::new(110.0, 100.0));
        let start = pinch.start.expect("pinching");
        assert_eq!(pinch_scale(&start, 100.0, &setup()), 8.0);
    }

    #[test]
    fn unchanged_fingers_produce_no_candidate() {
        let state = TransformState::new(2.0, -100.0, -100.0);
        let a = Point::new(100.0, 100.0);
        let b = Point::new(200.0, 150.0);
        let pinch = started(&state, a, b);
        let start = pinch.start.expect("pinching");
        let center = pinch.last_center.expect("center");
        assert!(pinch_transform(&state, &start, center, a, b, &layout(), &setup()).is_none());
    }

    #[test]
    fn moving_midpoint_pans_without_scaling() {
        let state = TransformState::new(2.0, -100.0, -100.0);
        let pinch = started(&state, Point::new(100.0, 100.0), Point::new(200.0, 100.0));
        let start = pinch.start.expect("pinching");
        let center = pinch.last_center.expect("center");
        let next = pinch_transform(
            &state,
            &start,
            center,
            Point::new(90.0, 110.0),
            Point::new(190.0, 110.0),
            &layout(),
            &setup(),
        )
        .expect("midpoint moved");
        assert_eq!(next.scale, 2.0);
        assert_eq!(next.position(), Point::new(-110.0, -90.0));
    }

    #[test]
    fn coincident_fingers_do_not_start() {
        let mut pinch = PinchRuntime::default();
        let p = Point::new(5.0, 5.0);
        assert!(!pinch.start(p, p, &TransformState::default()));
        assert!(!pinch.is_pinching());
    }

    #[test]
    fn sensitivity_damps_the_ratio() {
        let mut config = Config::default();
        config.pinch.step = 0.5;
        let setup = Setup::from_config(&config).0;
        let start = PinchStart {
            distance: 100.0,
            scale: 2.0,
        };
        assert!((pinch_scale(&start, 140.0, &setup) - 2.4).abs() < 1e-12);
    }
}
