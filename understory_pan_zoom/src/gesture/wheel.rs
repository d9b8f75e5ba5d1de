// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wheel and touchpad-pinch zoom.
//!
//! A burst of wheel events is one logical gesture. Each event commits
//! immediately; the burst ends [`WHEEL_STOP_MS`] after the last event, and a
//! scale-bounds alignment runs [`WHEEL_ALIGN_MS`] after it.

use kurbo::Point;

use super::Layout;
use crate::bounds::{anchored_zoom_position, clamp_position, clamp_scale, gesture_padding};
use crate::config::Setup;
use crate::input::{PressedKeys, WheelInput};
use crate::schedule::ScheduledTask;
use crate::state::TransformState;

/// Quiet period that ends a wheel burst.
pub(crate) const WHEEL_STOP_MS: u64 = 160;
/// Quiet period before settling the scale after wheel zoom.
pub(crate) const WHEEL_ALIGN_MS: u64 = 100;

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct WheelRuntime {
    pub(crate) active: bool,
    pub(crate) stop: ScheduledTask,
    pub(crate) align: ScheduledTask,
    /// Last pointer position, used to anchor the settling zoom.
    pub(crate) anchor: Option<Point>,
}

impl WheelRuntime {
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Gating for a wheel event.
pub(crate) fn wheel_allowed(
    input: &WheelInput,
    keys: &PressedKeys,
    layout: &Layout,
    setup: &Setup,
) -> bool {
    if setup.disabled || setup.zoom.disabled {
        return false;
    }
    let device_disabled = if input.ctrl_key {
        setup.zoom.touch_pad_disabled
    } else {
        setup.zoom.wheel_disabled
    };
    !device_disabled
        && input.delta_y.is_finite()
        && input.delta_y != 0.0
        && keys.any_pressed(&setup.zoom.activation_keys)
        && layout.viewport_contains(input.position)
}

/// Scale after one wheel event, padded lower limit included.
pub(crate) fn wheel_scale(scale: f64, delta_y: f64, setup: &Setup) -> f64 {
    let zoom = &setup.zoom;
    let amount = if zoom.smooth_wheel {
        delta_y.abs() * zoom.smooth_wheel_step
    } else {
        zoom.wheel_step
    };
    let factor = (-delta_y.signum() * amount).exp();
    clamp_scale(scale * factor, setup, true)
}

/// Transform after one wheel event, anchored at the pointer.
///
/// Returns `None` when the scale cannot move any further.
pub(crate) fn wheel_transform(
    state: &TransformState,
    input: &WheelInput,
    layout: &Layout,
    setup: &Setup,
) -> Option<TransformState> {
    let new_scale = wheel_scale(state.scale, input.delta_y, setup);
    if new_scale == state.scale {
        return None;
    }
    let anchor = state.viewport_to_content(input.position);
    let candidate = anchored_zoom_position(state, anchor, new_scale);
    let bounds = layout.bounds(new_scale, setup);
    let position = clamp_position(
        candidate,
        &bounds,
        setup.bounds.limit_to_bounds,
        gesture_padding(setup, new_scale),
    );
    Some(state.with(new_scale, position.x, position.y))
}
