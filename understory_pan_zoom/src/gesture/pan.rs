// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag panning with velocity sampling for momentum.
//!
//! ## Usage
//!
//! 1) [`PanRuntime::start`] records the offset between the pointer and the
//!    content origin.
//! 2) Each move calls [`pan_position`] with that offset, then
//!    [`PanRuntime::sample`] to update the velocity estimate.
//! 3) On release, [`momentum_for`] decides whether the drag continues under
//!    friction.

use kurbo::{Point, Vec2};

use super::Layout;
use crate::animation::{Momentum, Velocity, velocity_from};
use crate::bounds::{clamp_position, gesture_padding};
use crate::config::{AllowedButtons, Setup};
use crate::input::{MouseButton, PressedKeys};
use crate::state::TransformState;

/// Release speed in pixels per millisecond above which momentum starts.
pub(crate) const MOMENTUM_MIN_SPEED: f64 = 0.1;

/// A release this long after the last pointer motion carries no velocity.
pub(crate) const RELEASE_STALE_MS: u64 = 100;

/// Tracks one drag.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct PanRuntime {
    /// Pointer position minus content position at drag start.
    pub(crate) start_coords: Option<Vec2>,
    last_sample: Option<(Point, u64)>,
    pub(crate) velocity: Option<Velocity>,
}

impl PanRuntime {
    /// Starts a drag at `pointer` over content positioned at `state`.
    pub(crate) fn start(&mut self, pointer: Point, state: &TransformState, time_ms: u64) {
        self.start_coords = Some(pointer - state.position());
        self.last_sample = Some((pointer, time_ms));
        self.velocity = None;
    }

    /// Records a pointer sample and refreshes the velocity estimate.
    pub(crate) fn sample(&mut self, pointer: Point, time_ms: u64) {
        if let Some((last, last_time)) = self.last_sample {
            let elapsed = time_ms.saturating_sub(last_time) as f64;
            if let Some(vector) = velocity_from(pointer - last, elapsed) {
                self.velocity = Some(Velocity { vector });
            }
        }
        self.last_sample = Some((pointer, time_ms));
    }

    /// Ends the drag with the pointer released at `pointer` (the last sampled
    /// position when `None`) at `time_ms`, returning the release velocity.
    ///
    /// A pointer that held still for more than [`RELEASE_STALE_MS`] before
    /// release has no velocity.
    pub(crate) fn release(&mut self, pointer: Option<Point>, time_ms: u64) -> Option<Velocity> {
        if let Some((last, last_time)) = self.last_sample {
            let pointer = pointer.unwrap_or(last);
            if pointer != last {
                self.sample(pointer, time_ms);
            } else if time_ms.saturating_sub(last_time) > RELEASE_STALE_MS {
                self.velocity = None;
            }
        }
        self.end()
    }

    /// Last sampled pointer position.
    pub(crate) fn last_position(&self) -> Option<Point> {
        self.last_sample.map(|(position, _)| position)
    }

    /// Ends the drag, returning the last velocity estimate.
    pub(crate) fn end(&mut self) -> Option<Velocity> {
        let velocity = self.velocity;
        *self = Self::default();
        velocity
    }

    pub(crate) fn is_panning(&self) -> bool {
        self.start_coords.is_some()
    }
}

/// Returns `true` when `button` may start a drag. Touch input has no button.
pub(crate) fn button_allowed(allowed: &AllowedButtons, button: Option<MouseButton>) -> bool {
    match button {
        None => true,
        Some(MouseButton::Left) => allowed.left,
        Some(MouseButton::Middle) => allowed.middle,
        Some(MouseButton::Right) => allowed.right,
    }
}

/// Gating for starting a drag.
pub(crate) fn pan_allowed(button: Option<MouseButton>, keys: &PressedKeys, setup: &Setup) -> bool {
    !setup.disabled
        && !setup.pan.disabled
        && button_allowed(&setup.pan.allowed_buttons, button)
        && keys.any_pressed(&setup.pan.activation_keys)
}

/// Content position for `pointer` during a drag started with `start_coords`.
///
/// Locked axes keep their current value; the result is clamped with elastic
/// padding.
pub(crate) fn pan_position(
    state: &TransformState,
    pointer: Point,
    start_coords: Vec2,
    layout: &Layout,
    setup: &Setup,
) -> Point {
    let mut candidate = pointer - start_coords;
    if setup.pan.lock_axis_x {
        candidate.x = state.position_x;
    }
    if setup.pan.lock_axis_y {
        candidate.y = state.position_y;
    }
    let bounds = layout.bounds(state.scale, setup);
    clamp_position(
        candidate,
        &bounds,
        setup.bounds.limit_to_bounds,
        gesture_padding(setup, state.scale),
    )
}

/// Momentum to hand to the animation scheduler on release, if any.
pub(crate) fn momentum_for(
    state: &TransformState,
    velocity: Option<Velocity>,
    layout: &Layout,
    setup: &Setup,
) -> Option<Momentum> {
    let velocity = velocity?;
    if !setup.pan.velocity_enabled
        || velocity.speed() <= MOMENTUM_MIN_SPEED
        || !layout.content_exceeds_viewport(state.scale)
    {
        return None;
    }
    let mut vector = velocity.vector;
    if setup.pan.lock_axis_x {
        vector.x = 0.0;
    }
    if setup.pan.lock_axis_y {
        vector.y = 0.0;
    }
    Some(Momentum {
        velocity: vector,
        friction: setup.pan.velocity_friction,
        bounds: layout.bounds(state.scale, setup),
        padding: gesture_padding(setup, state.scale),
        limit_to_bounds: setup.bounds.limit_to_bounds,
    })
}

#[cfg(test)]
mod tests {
    use kurbo::{Point, Size, Vec2};

    use super::*;
    use crate::config::Config;

    fn layout() -> Layout {
        Layout {
            content: Size::new(800.0, 600.0),
            viewport: Size::new(400.0, 300.0),
        }
    }

    fn setup_with(edit: impl FnOnce(&mut Config)) -> Setup {
        let mut config = Config::default();
        edit(&mut config);
        Setup::from_config(&config).0
    }

    #[test]
    fn new_runtime_is_not_panning() {
        let pan = PanRuntime::default();
        assert!(!pan.is_panning());
        assert!(pan.velocity.is_none());
    }

    #[test]
    fn drag_follows_pointer_offset() {
        let setup = setup_with(|_| {});
        let state = TransformState::new(1.0, -50.0, -40.0);
        let mut pan = PanRuntime::default();
        pan.start(Point::new(100.0, 100.0), &state, 0);
        let start = pan.start_coords.expect("drag started");
        assert_eq!(start, Vec2::new(150.0, 140.0));

        let position = pan_position(&state, Point::new(70.0, 90.0), start, &layout(), &setup);
        assert_eq!(position, Point::new(-80.0, -50.0));
    }

    #[test]
    fn locked_axis_keeps_current_value() {
        let setup = setup_with(|c| c.pan.lock_axis_y = true);
        let state = TransformState::new(1.0, -50.0, -40.0);
        let position = pan_position(
            &state,
            Point::new(0.0, 0.0),
            Vec2::new(30.0, 30.0),
            &layout(),
            &setup,
        );
        assert_eq!(position, Point::new(-30.0, -40.0));
    }

    #[test]
    fn overscroll_is_limited_to_padding() {
        let setup = setup_with(|_| {});
        let state = TransformState::new(1.0, 0.0, 0.0);
        let position = pan_position(
            &state,
            Point::new(1000.0, -1000.0),
            Vec2::ZERO,
            &layout(),
            &setup,
        );
        assert_eq!(position, Point::new(100.0, -400.0));
    }

    #[test]
    fn velocity_tracks_the_latest_sample() {
        let state = TransformState::default();
        let mut pan = PanRuntime::default();
        pan.start(Point::new(0.0, 0.0), &state, 100);
        pan.sample(Point::new(10.0, 0.0), 110);
        pan.sample(Point::new(10.0, 20.0), 120);
        let velocity = pan.end().expect("moved");
        assert_eq!(velocity.vector, Vec2::new(0.0, 2.0));
        assert!(!pan.is_panning());
    }

    #[test]
    fn release_after_a_pause_has_no_velocity() {
        let state = TransformState::default();
        let mut pan = PanRuntime::default();
        pan.start(Point::new(200.0, 150.0), &state, 1_000);
        pan.sample(Point::new(180.0, 150.0), 1_010);
        assert_eq!(pan.last_position(), Some(Point::new(180.0, 150.0)));
        assert!(pan.release(Some(Point::new(180.0, 150.0)), 3_010).is_none());

        pan.start(Point::new(200.0, 150.0), &state, 1_000);
        pan.sample(Point::new(180.0, 150.0), 1_010);
        let quick = pan.release(None, 1_012).expect("released while moving");
        assert_eq!(quick.vector, Vec2::new(-2.0, 0.0));
    }

    #[test]
    fn release_position_is_sampled() {
        let state = TransformState::default();
        let mut pan = PanRuntime::default();
        pan.start(Point::new(200.0, 150.0), &state, 1_000);
        pan.sample(Point::new(180.0, 150.0), 1_010);
        // The pointer moved back before release.
        let velocity = pan
            .release(Some(Point::new(190.0, 150.0)), 1_020)
            .expect("moved before release");
        assert_eq!(velocity.vector, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn momentum_requires_speed_and_overflowing_content() {
        let setup = setup_with(|_| {});
        let state = TransformState::new(1.0, -100.0, -100.0);
        let fast = Some(Velocity {
            vector: Vec2::new(-1.0, 0.5),
        });
        let slow = Some(Velocity {
            vector: Vec2::new(0.05, 0.0),
        });
        assert!(momentum_for(&state, fast, &layout(), &setup).is_some());
        assert!(momentum_for(&state, slow, &layout(), &setup).is_none());

        let small = TransformState::new(0.5, 0.0, 0.0);
        assert!(momentum_for(&small, fast, &layout(), &setup).is_none());

        let off = setup_with(|c| c.pan.velocity_enabled = false);
        assert!(momentum_for(&state, fast, &layout(), &off).is_none());
    }

    #[test]
    fn disallowed_button_blocks_drag() {
        let setup = setup_with(|c| c.pan.allowed_buttons.right = false);
        let keys = PressedKeys::default();
        assert!(pan_allowed(Some(MouseButton::Left), &keys, &setup));
        assert!(!pan_allowed(Some(MouseButton::Right), &keys, &setup));
        assert!(pan_allowed(None, &keys, &setup));
    }
}
