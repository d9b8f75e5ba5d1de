// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Double-click and double-tap.

use kurbo::Point;

use super::{Layout, step_zoom_target};
use crate::config::{DoubleClickMode, Setup};
use crate::input::PressedKeys;
use crate::state::TransformState;

/// Maximum gap between two touch starts that counts as a double tap.
pub(crate) const DOUBLE_TAP_WINDOW_MS: u64 = 200;

/// Scale tolerance when comparing against the initial scale.
const SCALE_EPSILON: f64 = 1e-9;

/// Detects double taps from touch start times.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TapTracker {
    last_tap: Option<u64>,
}

impl TapTracker {
    /// Records a single-finger touch start. Returns `true` when it completes a
    /// double tap; the pair is then consumed.
    pub(crate) fn register(&mut self, time_ms: u64) -> bool {
        match self.last_tap {
            Some(last) if time_ms.saturating_sub(last) < DOUBLE_TAP_WINDOW_MS => {
                self.last_tap = None;
                true
            }
            _ => {
                self.last_tap = Some(time_ms);
                false
            }
        }
    }

    pub(crate) fn reset(&mut self) {
        self.last_tap = None;
    }
}

pub(crate) fn double_click_allowed(keys: &PressedKeys, setup: &Setup) -> bool {
    !setup.disabled
        && !setup.double_click.disabled
        && keys.any_pressed(&setup.double_click.activation_keys)
}

/// Transform that the initial configuration describes.
pub(crate) fn reset_target(state: &TransformState, setup: &Setup) -> TransformState {
    state.with(
        setup.initial_scale,
        setup.initial_position_x,
        setup.initial_position_y,
    )
}

/// Target of a double-click at `pixel`.
pub(crate) fn double_click_target(
    state: &TransformState,
    pixel: Point,
    layout: &Layout,
    setup: &Setup,
) -> TransformState {
    let step = setup.double_click.step;
    match setup.double_click.mode {
        DoubleClickMode::ZoomIn => step_zoom_target(state, pixel, step, layout, setup),
        DoubleClickMode::ZoomOut => step_zoom_target(state, pixel, -step, layout, setup),
        DoubleClickMode::Reset => reset_target(state, setup),
        DoubleClickMode::Toggle => {
            if state.scale <= setup.initial_scale + SCALE_EPSILON {
                step_zoom_target(state, pixel, step, layout, setup)
            } else {
                reset_target(state, setup)
            }
        }
    }
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

    fn setup_with(mode: DoubleClickMode, step: f64) -> Setup {
        let mut config = Config::default();
        config.double_click.mode = mode;
        config.double_click.step = step;
        Setup::from_config(&config).0
    }

    #[test]
    fn toggle_alternates_between_two_scales() {
        let setup = setup_with(DoubleClickMode::Toggle, 1.0);
        let layout = layout();
        let click = Point::new(120.0, 90.0);
        let mut state = TransformState::default();
        let mut scales = Vec::new();
        for _ in 0..4 {
            state = double_click_target(&state, click, &layout, &setup);
            scales.push(state.scale);
        }
        assert_eq!(scales, [2.0, 1.0, 2.0, 1.0]);
        assert_eq!(state.position(), Point::ORIGIN);
    }

    #[test]
    fn zoom_in_keeps_click_point_fixed() {
        let setup = setup_with(DoubleClickMode::ZoomIn, 0.7);
        let state = TransformState::new(2.0, -200.0, -150.0);
        let click = Point::new(200.0, 150.0);
        let anchor = state.viewport_to_content(click);
        let next = double_click_target(&state, click, &layout(), &setup);
        assert!((next.scale - 2.7).abs() < 1e-12);
        let pixel = next.content_to_viewport(anchor);
        assert!((pixel.x - 200.0).abs() < 1e-9);
        assert!((pixel.y - 150.0).abs() < 1e-9);
    }

    #[test]
    fn zoom_out_stops_at_min_scale() {
        let setup = setup_with(DoubleClickMode::ZoomOut, 0.7);
        let state = TransformState::new(1.2, -50.0, -50.0);
        let next = double_click_target(&state, Point::new(10.0, 10.0), &layout(), &setup);
        assert_eq!(next.scale, 1.0);
    }

    #[test]
    fn taps_pair_inside_the_window_only() {
        let mut taps = TapTracker::default();
        assert!(!taps.register(1_000));
        assert!(taps.register(1_150));
        // A third tap starts a new pair.
        assert!(!taps.register(1_250));
        assert!(!taps.register(1_500));
        taps.reset();
        assert!(!taps.register(1_510));
    }
}
