// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounds calculation, position clamping, and the anchored-zoom solve.
//!
//! All functions here are pure and total over finite inputs with a positive
//! scale. They are shared by every recognizer and control operation so that
//! gesture-driven and programmatic updates settle identically.

use kurbo::{Point, Rect, Size, Vec2};

use crate::config::Setup;
use crate::state::{Bounds, TransformState};

/// How content smaller than the viewport may be positioned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomedOutMode {
    /// The allowed range collapses to the single centered position.
    Center,
    /// The content may sit anywhere as long as it stays inside the viewport.
    Contain,
}

impl ZoomedOutMode {
    /// Maps the `center_zoomed_out` flag onto a mode.
    #[must_use]
    pub fn from_flag(center_zoomed_out: bool) -> Self {
        if center_zoomed_out {
            Self::Center
        } else {
            Self::Contain
        }
    }
}

/// Computes the translation rectangle for `content` displayed at `scale`
/// inside `viewport`.
///
/// Per axis, when the scaled content covers the viewport the range is
/// `[viewport - scaled, 0]`. When it does not, `mode` decides between the
/// centering point and the range that keeps the content fully visible.
#[must_use]
pub fn calculate_bounds(content: Size, viewport: Size, scale: f64, mode: ZoomedOutMode) -> Bounds {
    let (min_position_x, max_position_x) =
        axis_range(content.width * scale, viewport.width, mode);
    let (min_position_y, max_position_y) =
        axis_range(content.height * scale, viewport.height, mode);
    Bounds {
        min_position_x,
        max_position_x,
        min_position_y,
        max_position_y,
    }
}

fn axis_range(scaled: f64, viewport: f64, mode: ZoomedOutMode) -> (f64, f64) {
    let diff = viewport - scaled;
    if diff <= 0.0 {
        return (diff, 0.0);
    }
    match mode {
        ZoomedOutMode::Center => (diff / 2.0, diff / 2.0),
        ZoomedOutMode::Contain => (0.0, diff),
    }
}

/// Clamps `candidate` into `bounds` widened by `padding` on each side.
///
/// With `limit_to_bounds` unset the candidate passes through unchanged.
#[must_use]
pub fn clamp_position(
    candidate: Point,
    bounds: &Bounds,
    limit_to_bounds: bool,
    padding: Vec2,
) -> Point {
    if !limit_to_bounds {
        return candidate;
    }
    Point::new(
        limit(
            candidate.x,
            bounds.min_position_x - padding.x,
            bounds.max_position_x + padding.x,
        ),
        limit(
            candidate.y,
            bounds.min_position_y - padding.y,
            bounds.max_position_y + padding.y,
        ),
    )
}

fn limit(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Solves the translation that keeps content point `anchor` (unscaled content
/// coordinates) at the same viewport pixel when scaling from `state.scale` to
/// `new_scale`.
#[must_use]
pub fn anchored_zoom_position(state: &TransformState, anchor: Point, new_scale: f64) -> Point {
    let scale_difference = new_scale - state.scale;
    Point::new(
        state.position_x - anchor.x * scale_difference,
        state.position_y - anchor.y * scale_difference,
    )
}

/// Clamps `scale` to `[min_scale - padding, max_scale]`.
#[must_use]
pub fn clamp_scale(scale: f64, setup: &Setup, allow_padding: bool) -> f64 {
    let min = if allow_padding {
        setup.padded_min_scale()
    } else {
        setup.zoom.min_scale
    };
    scale.clamp(min, setup.zoom.max_scale)
}

/// Position that centers `content` at `scale` inside `viewport`.
#[must_use]
pub fn center_position(content: Size, viewport: Size, scale: f64) -> Point {
    Point::new(
        (viewport.width - content.width * scale) / 2.0,
        (viewport.height - content.height * scale) / 2.0,
    )
}

/// Elastic padding allowed while a gesture is in flight.
///
/// Padding only applies when alignment is enabled and the scale is not below
/// its lower limit.
#[must_use]
pub fn gesture_padding(setup: &Setup, scale: f64) -> Vec2 {
    let alignment = &setup.alignment_animation;
    if alignment.disabled || scale < setup.zoom.min_scale {
        return Vec2::ZERO;
    }
    Vec2::new(alignment.size_x, alignment.size_y)
}

/// Transform that frames `element` (unscaled content coordinates) in the
/// viewport, clamped to bounds.
#[must_use]
pub fn frame_element(
    element: Rect,
    content: Size,
    viewport: Size,
    scale: Option<f64>,
    setup: &Setup,
) -> TransformState {
    let width = element.width().max(f64::MIN_POSITIVE);
    let height = element.height().max(f64::MIN_POSITIVE);
    let fit = (viewport.width / width).min(viewport.height / height);
    let new_scale = clamp_scale(scale.unwrap_or(fit), setup, false);

    let offset_x = (viewport.width - width * new_scale) / 2.0;
    let offset_y = (viewport.height - height * new_scale) / 2.0;
    let candidate = Point::new(
        offset_x - element.x0 * new_scale,
        offset_y - element.y0 * new_scale,
    );
    let bounds = calculate_bounds(
        content,
        viewport,
        new_scale,
        ZoomedOutMode::from_flag(setup.bounds.center_zoomed_out),
    );
    let position = clamp_position(candidate, &bounds, setup.bounds.limit_to_bounds, Vec2::ZERO);
    TransformState::new(new_scale, position.x, position.y)
}

#[cfg(test)]
mod tests {
    use kurbo::{Point, Rect, Size, Vec2};

    use super::*;
    use crate::config::Config;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn larger_content_slides_until_trailing_edges_meet() {
        let bounds = calculate_bounds(
            Size::new(800.0, 600.0),
            Size::new(400.0, 300.0),
            1.5,
            ZoomedOutMode::Center,
        );
        assert_eq!(bounds.min_position_x, -800.0);
        assert_eq!(bounds.max_position_x, 0.0);
        assert_eq!(bounds.min_position_y, -600.0);
        assert_eq!(bounds.max_position_y, 0.0);
    }

    #[test]
    fn bounds_are_ordered_across_scales() {
        let content = Size::new(640.0, 480.0);
        let viewport = Size::new(500.0, 700.0);
        for mode in [ZoomedOutMode::Center, ZoomedOutMode::Contain] {
            for i in 1..=80 {
                let scale = f64::from(i) * 0.1;
                let b = calculate_bounds(content, viewport, scale, mode);
                assert!(b.min_position_x <= b.max_position_x, "x at {scale}");
                assert!(b.min_position_y <= b.max_position_y, "y at {scale}");
            }
        }
    }

    #[test]
    fn smaller_content_centers_or_floats_by_mode() {
        let content = Size::new(200.0, 100.0);
        let viewport = Size::new(400.0, 300.0);

        let centered = calculate_bounds(content, viewport, 1.0, ZoomedOutMode::Center);
        assert_eq!(centered.min_position_x, 100.0);
        assert_eq!(centered.max_position_x, 100.0);
        assert_eq!(centered.min_position_y, 100.0);
        assert_eq!(centered.max_position_y, 100.0);

        let contained = calculate_bounds(content, viewport, 1.0, ZoomedOutMode::Contain);
        assert_eq!(contained.min_position_x, 0.0);
        assert_eq!(contained.max_position_x, 200.0);
        assert_eq!(contained.min_position_y, 0.0);
        assert_eq!(contained.max_position_y, 200.0);
    }

    #[test]
    fn clamp_respects_padding_and_is_idempotent() {
        let bounds = calculate_bounds(
            Size::new(800.0, 600.0),
            Size::new(400.0, 300.0),
            1.0,
            ZoomedOutMode::Contain,
        );
        let padding = Vec2::new(25.0, 10.0);
        let candidates = [
            Point::new(-1000.0, 50.0),
            Point::new(30.0, -400.0),
            Point::new(-200.0, -100.0),
            Point::new(1e9, -1e9),
        ];
        for candidate in candidates {
            let once = clamp_position(candidate, &bounds, true, padding);
            assert!(once.x >= bounds.min_position_x - padding.x);
            assert!(once.x <= bounds.max_position_x + padding.x);
            assert!(once.y >= bounds.min_position_y - padding.y);
            assert!(once.y <= bounds.max_position_y + padding.y);
            let twice = clamp_position(once, &bounds, true, padding);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn clamp_passes_through_when_unlimited() {
        let bounds = calculate_bounds(
            Size::new(800.0, 600.0),
            Size::new(400.0, 300.0),
            1.0,
            ZoomedOutMode::Contain,
        );
        let candidate = Point::new(5000.0, -5000.0);
        assert_eq!(clamp_position(candidate, &bounds, false, Vec2::ZERO), candidate);
    }

    #[test]
    fn anchored_zoom_keeps_anchor_under_the_same_pixel() {
        let state = TransformState::new(1.3, -57.0, 22.0);
        let pointer = Point::new(180.0, 95.0);
        let anchor = state.viewport_to_content(pointer);

        for new_scale in [0.5, 1.0, 2.75, 6.0] {
            let position = anchored_zoom_position(&state, anchor, new_scale);
            let next = state.with(new_scale, position.x, position.y);
            let pixel = next.content_to_viewport(anchor);
            assert!(approx(pixel.x, pointer.x), "x drifted at {new_scale}");
            assert!(approx(pixel.y, pointer.y), "y drifted at {new_scale}");
        }
    }

    #[test]
    fn clamp_scale_honors_padding_flag() {
        let (setup, _) = Setup::from_config(&Config::default());
        assert_eq!(clamp_scale(0.1, &setup, false), 1.0);
        assert!(approx(clamp_scale(0.1, &setup, true), 0.6));
        assert_eq!(clamp_scale(100.0, &setup, true), 8.0);
        assert_eq!(clamp_scale(3.0, &setup, true), 3.0);
    }

    #[test]
    fn gesture_padding_vanishes_when_alignment_disabled() {
        let mut config = Config::default();
        let (setup, _) = Setup::from_config(&config);
        assert_eq!(gesture_padding(&setup, 1.0), Vec2::new(100.0, 100.0));
        assert_eq!(gesture_padding(&setup, 0.8), Vec2::ZERO);

        config.alignment_animation.disabled = true;
        let (setup, _) = Setup::from_config(&config);
        assert_eq!(gesture_padding(&setup, 2.0), Vec2::ZERO);
    }

    #[test]
    fn frame_element_fits_and_centers_the_rect() {
        let (setup, _) = Setup::from_config(&Config::default());
        let content = Size::new(800.0, 600.0);
        let viewport = Size::new(400.0, 300.0);
        let element = Rect::new(400.0, 300.0, 500.0, 375.0);

        let target = frame_element(element, content, viewport, None, &setup);
        assert!(approx(target.scale, 4.0));
        let center = target.content_to_viewport(element.center());
        assert!(approx(center.x, 200.0));
        assert!(approx(center.y, 150.0));
    }

    #[test]
    fn frame_element_clamps_scale_and_position() {
        let (setup, _) = Setup::from_config(&Config::default());
        let content = Size::new(800.0, 600.0);
        let viewport = Size::new(400.0, 300.0);
        let element = Rect::new(0.0, 0.0, 10.0, 10.0);

        let target = frame_element(element, content, viewport, None, &setup);
        assert_eq!(target.scale, 8.0);
        assert_eq!(target.position_x, 0.0);
        assert_eq!(target.position_y, 0.0);
    }
}
