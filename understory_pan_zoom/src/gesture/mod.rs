// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gesture recognizers.
//!
//! Each recognizer is split into a small runtime struct, owned by the
//! controller and cleared when its gesture ends, and pure transition
//! functions that map `(state, input, layout, setup)` to a candidate
//! transform. Nothing in here commits; the controller does that.

pub(crate) mod double_click;
pub(crate) mod pan;
pub(crate) mod pinch;
pub(crate) mod wheel;

use kurbo::{Point, Rect, Size, Vec2};

use crate::bounds::{
    ZoomedOutMode, anchored_zoom_position, calculate_bounds, clamp_position, clamp_scale,
};
use crate::config::Setup;
use crate::state::{Bounds, TransformState};

/// Measured sizes of the bound surfaces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Layout {
    /// Unscaled natural size of the content.
    pub(crate) content: Size,
    /// Size of the viewport.
    pub(crate) viewport: Size,
}

impl Layout {
    pub(crate) fn bounds(&self, scale: f64, setup: &Setup) -> Bounds {
        calculate_bounds(
            self.content,
            self.viewport,
            scale,
            ZoomedOutMode::from_flag(setup.bounds.center_zoomed_out),
        )
    }

    /// Returns `true` when `point` (viewport pixels) lies on the viewport.
    pub(crate) fn viewport_contains(&self, point: Point) -> bool {
        let rect = Rect::from_origin_size(Point::ORIGIN, self.viewport);
        point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
    }

    pub(crate) fn viewport_center(&self) -> Point {
        Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0)
    }

    /// Returns `true` when the content at `scale` is larger than the viewport
    /// on at least one axis.
    pub(crate) fn content_exceeds_viewport(&self, scale: f64) -> bool {
        self.content.width * scale > self.viewport.width
            || self.content.height * scale > self.viewport.height
    }
}

/// Transform at `new_scale`, anchored at viewport pixel `pixel`, clamped to
/// the strict bounds.
pub(crate) fn point_zoom_target(
    state: &TransformState,
    pixel: Point,
    new_scale: f64,
    layout: &Layout,
    setup: &Setup,
) -> TransformState {
    let new_scale = clamp_scale(new_scale, setup, false);
    let anchor = state.viewport_to_content(pixel);
    let candidate = anchored_zoom_position(state, anchor, new_scale);
    let bounds = layout.bounds(new_scale, setup);
    let position = clamp_position(candidate, &bounds, setup.bounds.limit_to_bounds, Vec2::ZERO);
    state.with(new_scale, position.x, position.y)
}

/// Additive zoom by `delta`, anchored at viewport pixel `pixel`.
pub(crate) fn step_zoom_target(
    state: &TransformState,
    pixel: Point,
    delta: f64,
    layout: &Layout,
    setup: &Setup,
) -> TransformState {
    point_zoom_target(state, pixel, state.scale + delta, layout, setup)
}

/// `state` with its position clamped into the strict bounds.
pub(crate) fn bounded(state: &TransformState, layout: &Layout, setup: &Setup) -> TransformState {
    let bounds = layout.bounds(state.scale, setup);
    let position = clamp_position(
        state.position(),
        &bounds,
        setup.bounds.limit_to_bounds,
        Vec2::ZERO,
    );
    state.with(state.scale, position.x, position.y)
}

/// Position clamped into the strict bounds, when that moves it.
///
/// Returns `None` when the state is already inside, alignment is disabled,
/// or bounds are not enforced.
pub(crate) fn alignment_target(
    state: &TransformState,
    layout: &Layout,
    setup: &Setup,
) -> Option<TransformState> {
    if setup.alignment_animation.disabled {
        return None;
    }
    let target = bounded(state, layout, setup);
    (target.position() != state.position()).then_some(target)
}

/// Settling target after a zoom gesture.
///
/// A scale left below the lower limit by padding returns to that limit,
/// anchored at `anchor` (viewport pixels, the viewport center when absent).
/// Otherwise this is [`alignment_target`].
pub(crate) fn scale_alignment_target(
    state: &TransformState,
    anchor: Option<Point>,
    layout: &Layout,
    setup: &Setup,
) -> Option<TransformState> {
    let min_scale = setup.zoom.min_scale;
    if state.scale >= min_scale {
        return alignment_target(state, layout, setup);
    }
    let pixel = anchor.unwrap_or_else(|| layout.viewport_center());
    let content_anchor = state.viewport_to_content(pixel);
    let candidate = anchored_zoom_position(state, content_anchor, min_scale);
    let bounds = layout.bounds(min_scale, setup);
    let position = clamp_position(candidate, &bounds, setup.bounds.limit_to_bounds, Vec2::ZERO);
    Some(state.with(min_scale, position.x, position.y))
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

    #[test]
    fn alignment_pulls_overscroll_back_inside() {
        let state = TransformState::new(1.0, 60.0, -350.0);
        let target = alignment_target(&state, &layout(), &setup()).expect("outside bounds");
        assert_eq!(target.position(), Point::new(0.0, -300.0));
        assert_eq!(target.scale, 1.0);
    }

    #[test]
    fn alignment_is_none_inside_bounds_or_when_disabled() {
        let inside = TransformState::new(1.0, -10.0, -10.0);
        assert!(alignment_target(&inside, &layout(), &setup()).is_none());

        let mut config = Config::default();
        config.alignment_animation.disabled = true;
        let disabled = Setup::from_config(&config).0;
        let outside = TransformState::new(1.0, 60.0, 0.0);
        assert!(alignment_target(&outside, &layout(), &disabled).is_none());
    }

    #[test]
    fn undershot_scale_returns_to_minimum() {
        let state = TransformState::new(0.8, 40.0, 30.0);
        let anchor = Some(Point::new(200.0, 150.0));
        let target =
            scale_alignment_target(&state, anchor, &layout(), &setup()).expect("below minimum");
        assert_eq!(target.scale, 1.0);
        assert!(layout().bounds(1.0, &setup()).contains(target.position()));
    }

    #[test]
    fn step_zoom_is_additive_and_stays_in_bounds() {
        let state = TransformState::new(1.0, 0.0, 0.0);
        let layout = layout();
        let setup = setup();
        let target = step_zoom_target(&state, layout.viewport_center(), 0.5, &layout, &setup);
        assert_eq!(target.scale, 1.5);
        assert!(layout.bounds(1.5, &setup).contains(target.position()));
        assert_eq!(target.position(), Point::new(-100.0, -75.0));

        let floor = step_zoom_target(&state, layout.viewport_center(), -0.5, &layout, &setup);
        assert_eq!(floor.scale, 1.0);
    }

    #[test]
    fn layout_reports_containment_and_overflow() {
        let layout = layout();
        assert!(layout.viewport_contains(Point::new(0.0, 300.0)));
        assert!(!layout.viewport_contains(Point::new(-1.0, 10.0)));
        assert!(layout.content_exceeds_viewport(1.0));
        assert!(!layout.content_exceeds_viewport(0.5));
        assert_eq!(layout.viewport_center(), Point::new(200.0, 150.0));
    }
}
