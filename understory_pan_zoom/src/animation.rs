// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Time-based transitions between transforms.
//!
//! An [`Animation`] is a value advanced by an external driver: the caller
//! passes the milliseconds elapsed since the animation started and receives
//! the interpolated transform plus a completion flag. Nothing here schedules
//! frames on its own.
//!
//! [`AnimationScheduler`] owns the single active animation slot. Starting a
//! new animation replaces the current one outright; there is no blending.

use kurbo::Vec2;

use crate::bounds::clamp_position;
use crate::easing::Easing;
use crate::state::{Bounds, TransformState};

/// Nominal frame duration that momentum friction is expressed against.
const FRAME_MS: f64 = 16.0;

/// Speed in pixels per millisecond below which momentum stops.
pub(crate) const MOMENTUM_STOP_SPEED: f64 = 0.01;

/// Result of advancing an [`Animation`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationStep {
    /// Transform to commit for this frame.
    pub state: TransformState,
    /// `true` once the animation has reached its end.
    pub done: bool,
}

/// Inertial pan continuation after a drag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Momentum {
    /// Current velocity in pixels per millisecond.
    pub velocity: Vec2,
    /// Fraction of velocity retained per 16 ms.
    pub friction: f64,
    /// Bounds the motion is confined to.
    pub bounds: Bounds,
    /// Elastic padding around `bounds`.
    pub padding: Vec2,
    /// Whether `bounds` are enforced at all.
    pub limit_to_bounds: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Motion {
    Tween {
        target: TransformState,
        duration_ms: f64,
        easing: Easing,
    },
    Momentum(Momentum),
}

/// A transition from a start transform, either eased toward a target or
/// decaying under friction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Animation {
    start: TransformState,
    current: TransformState,
    last_elapsed: f64,
    motion: Motion,
}

impl Animation {
    /// Eases from `start` to `target` over `duration_ms`.
    #[must_use]
    pub fn tween(
        start: TransformState,
        target: TransformState,
        duration_ms: u64,
        easing: Easing,
    ) -> Self {
        Self {
            start,
            current: start,
            last_elapsed: 0.0,
            motion: Motion::Tween {
                target,
                duration_ms: duration_ms as f64,
                easing,
            },
        }
    }

    /// Continues panning from `start` with `momentum`.
    #[must_use]
    pub fn momentum(start: TransformState, momentum: Momentum) -> Self {
        Self {
            start,
            current: start,
            last_elapsed: 0.0,
            motion: Motion::Momentum(momentum),
        }
    }

    /// Returns `true` for momentum animations.
    #[must_use]
    pub fn is_momentum(&self) -> bool {
        matches!(self.motion, Motion::Momentum(_))
    }

    /// Final transform of a tween, if this is one.
    #[must_use]
    pub fn target(&self) -> Option<TransformState> {
        match self.motion {
            Motion::Tween { target, .. } => Some(target),
            Motion::Momentum(_) => None,
        }
    }

    /// Advances to `elapsed_ms` after the start.
    ///
    /// Elapsed time that moves backwards is treated as no progress.
    pub fn advance(&mut self, elapsed_ms: f64) -> AnimationStep {
        let elapsed_ms = if elapsed_ms.is_finite() {
            elapsed_ms.max(self.last_elapsed)
        } else {
            self.last_elapsed
        };
        let dt = elapsed_ms - self.last_elapsed;
        self.last_elapsed = elapsed_ms;

        let done = match &mut self.motion {
            Motion::Tween {
                target,
                duration_ms,
                easing,
            } => {
                if elapsed_ms >= *duration_ms {
                    self.current = *target;
                    true
                } else {
                    let t = easing.apply(elapsed_ms / *duration_ms);
                    self.current = interpolate(&self.start, target, t);
                    false
                }
            }
            Motion::Momentum(momentum) => {
                let (state, done) = step_momentum(&self.current, momentum, dt);
                self.current = state;
                done
            }
        };
        AnimationStep {
            state: self.current,
            done,
        }
    }
}

fn interpolate(from: &TransformState, to: &TransformState, t: f64) -> TransformState {
    let lerp = |a: f64, b: f64| a + (b - a) * t;
    from.with(
        lerp(from.scale, to.scale),
        lerp(from.position_x, to.position_x),
        lerp(from.position_y, to.position_y),
    )
}

fn step_momentum(
    state: &TransformState,
    momentum: &mut Momentum,
    dt: f64,
) -> (TransformState, bool) {
    if dt <= 0.0 {
        return (*state, momentum.velocity.hypot() < MOMENTUM_STOP_SPEED);
    }
    let candidate = state.position() + momentum.velocity * dt;
    let position = clamp_position(
        candidate,
        &momentum.bounds,
        momentum.limit_to_bounds,
        momentum.padding,
    );
    // An axis that ran into the padded edge stops moving.
    if position.x != candidate.x {
        momentum.velocity.x = 0.0;
    }
    if position.y != candidate.y {
        momentum.velocity.y = 0.0;
    }
    momentum.velocity *= momentum.friction.powf(dt / FRAME_MS);
    let done = momentum.velocity.hypot() < MOMENTUM_STOP_SPEED;
    (state.with(state.scale, position.x, position.y), done)
}

/// Identifier of a started animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnimationId(u64);

#[derive(Clone, Debug)]
struct Active<T> {
    id: AnimationId,
    started_at: Option<u64>,
    animation: Animation,
    then: T,
}

/// Single-slot animation runner.
///
/// `T` is a completion marker handed back when an animation finishes, so the
/// owner can chain follow-up work (for example, settling after momentum).
#[derive(Clone, Debug)]
pub struct AnimationScheduler<T> {
    active: Option<Active<T>>,
    next_id: u64,
}

impl<T> Default for AnimationScheduler<T> {
    fn default() -> Self {
        Self {
            active: None,
            next_id: 0,
        }
    }
}

/// Output of [`AnimationScheduler::tick`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame<T> {
    /// Animation that produced this frame.
    pub id: AnimationId,
    /// Interpolated state and completion flag.
    pub step: AnimationStep,
    /// Completion marker, present only on the final frame.
    pub finished: Option<T>,
}

impl<T: Copy> AnimationScheduler<T> {
    /// Starts `animation`, cancelling any active one.
    ///
    /// The start time is taken from the first subsequent [`tick`](Self::tick).
    pub fn start(&mut self, animation: Animation, then: T) -> AnimationId {
        let id = AnimationId(self.next_id);
        self.next_id += 1;
        if self.active.is_some() {
            tracing::trace!(?id, "animation superseded");
        }
        self.active = Some(Active {
            id,
            started_at: None,
            animation,
            then,
        });
        id
    }

    /// Stops the active animation where it is. Returns `true` if one was running.
    pub fn cancel(&mut self) -> bool {
        self.active.take().is_some()
    }

    /// Returns `true` while an animation occupies the slot.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Returns the active animation.
    #[must_use]
    pub fn current(&self) -> Option<&Animation> {
        self.active.as_ref().map(|active| &active.animation)
    }

    /// Advances the active animation to host time `now_ms`.
    ///
    /// The slot is cleared on the final frame.
    pub fn tick(&mut self, now_ms: u64) -> Option<Frame<T>> {
        let active = self.active.as_mut()?;
        let started_at = *active.started_at.get_or_insert(now_ms);
        let elapsed = now_ms.saturating_sub(started_at) as f64;
        let step = active.animation.advance(elapsed);
        let id = active.id;
        let finished = if step.done {
            let then = active.then;
            self.active = None;
            Some(then)
        } else {
            None
        };
        Some(Frame { id, step, finished })
    }
}

/// Velocity of `displacement` covered over `elapsed_ms`.
pub(crate) fn velocity_from(displacement: Vec2, elapsed_ms: f64) -> Option<Vec2> {
    if elapsed_ms > 0.0 && displacement.is_finite() {
        Some(displacement / elapsed_ms)
    } else {
        None
    }
}

/// Speed and heading of the most recent pointer motion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Velocity {
    /// Velocity vector in pixels per millisecond.
    pub vector: Vec2,
}

impl Velocity {
    /// Magnitude in pixels per millisecond.
    #[must_use]
    pub fn speed(&self) -> f64 {
        self.vector.hypot()
    }

    /// Heading in radians, measured from the positive x axis.
    #[must_use]
    pub fn angle(&self) -> f64 {
        self.vector.atan2()
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Vec2;

    use super::*;

    fn bounds() -> Bounds {
        Bounds {
            min_position_x: -400.0,
            max_position_x: 0.0,
            min_position_y: -300.0,
            max_position_y: 0.0,
        }
    }

    #[test]
    fn tween_interpolates_and_lands_exactly_on_target() {
        let start = TransformState::new(1.0, 0.0, 0.0);
        let target = TransformState::new(2.0, -100.0, -50.0);
        let mut animation = Animation::tween(start, target, 200, Easing::Linear);

        let half = animation.advance(100.0);
        assert!(!half.done);
        assert!((half.state.scale - 1.5).abs() < 1e-12);
        assert!((half.state.position_x + 50.0).abs() < 1e-12);

        let end = animation.advance(250.0);
        assert!(end.done);
        assert_eq!(end.state.scale, target.scale);
        assert_eq!(end.state.position(), target.position());
    }

    #[test]
    fn zero_duration_tween_finishes_on_first_advance() {
        let start = TransformState::new(1.0, 0.0, 0.0);
        let target = TransformState::new(3.0, 5.0, 5.0);
        let mut animation = Animation::tween(start, target, 0, Easing::EaseOut);
        let step = animation.advance(0.0);
        assert!(step.done);
        assert_eq!(step.state.scale, 3.0);
    }

    #[test]
    fn momentum_decays_and_stops() {
        let start = TransformState::new(2.0, -100.0, -100.0);
        let mut animation = Animation::momentum(
            start,
            Momentum {
                velocity: Vec2::new(-1.0, 0.0),
                friction: 0.9,
                bounds: bounds(),
                padding: Vec2::ZERO,
                limit_to_bounds: true,
            },
        );

        let mut elapsed = 0.0;
        let mut last_x = start.position_x;
        let mut finished = false;
        for _ in 0..1_000 {
            elapsed += 16.0;
            let step = animation.advance(elapsed);
            assert!(step.state.position_x <= last_x);
            last_x = step.state.position_x;
            if step.done {
                finished = true;
                break;
            }
        }
        assert!(finished, "momentum never settled");
        assert!(last_x < -100.0);
        assert!(last_x >= -400.0);
    }

    #[test]
    fn momentum_stops_an_axis_at_the_padded_edge() {
        let start = TransformState::new(2.0, -390.0, -100.0);
        let mut animation = Animation::momentum(
            start,
            Momentum {
                velocity: Vec2::new(-5.0, -0.5),
                friction: 0.95,
                bounds: bounds(),
                padding: Vec2::new(20.0, 0.0),
                limit_to_bounds: true,
            },
        );
        let step = animation.advance(16.0);
        assert_eq!(step.state.position_x, -420.0);
        let step = animation.advance(32.0);
        assert_eq!(step.state.position_x, -420.0);
        assert!(step.state.position_y < -100.0);
    }

    #[test]
    fn scheduler_anchors_start_time_on_first_tick() {
        let mut scheduler = AnimationScheduler::<u8>::default();
        let start = TransformState::new(1.0, 0.0, 0.0);
        let target = TransformState::new(1.0, -100.0, 0.0);
        scheduler.start(Animation::tween(start, target, 100, Easing::Linear), 7);

        let first = scheduler.tick(5_000).expect("animation should tick");
        assert_eq!(first.step.state.position_x, 0.0);
        assert_eq!(first.finished, None);

        let mid = scheduler.tick(5_050).expect("animation should tick");
        assert!((mid.step.state.position_x + 50.0).abs() < 1e-12);

        let last = scheduler.tick(5_100).expect("animation should tick");
        assert_eq!(last.finished, Some(7));
        assert!(!scheduler.is_active());
        assert!(scheduler.tick(5_200).is_none());
    }

    #[test]
    fn starting_replaces_and_cancel_is_idempotent() {
        let mut scheduler = AnimationScheduler::<()>::default();
        let start = TransformState::default();
        let a = scheduler.start(
            Animation::tween(start, TransformState::new(2.0, 0.0, 0.0), 100, Easing::Linear),
            (),
        );
        let b = scheduler.start(
            Animation::tween(start, TransformState::new(3.0, 0.0, 0.0), 100, Easing::Linear),
            (),
        );
        assert_ne!(a, b);
        assert_eq!(
            scheduler.current().and_then(Animation::target).map(|t| t.scale),
            Some(3.0)
        );
        assert!(scheduler.cancel());
        assert!(!scheduler.cancel());
    }

    #[test]
    fn velocity_reports_speed_and_heading() {
        let velocity = Velocity {
            vector: velocity_from(Vec2::new(0.0, 30.0), 10.0).expect("positive interval"),
        };
        assert!((velocity.speed() - 3.0).abs() < 1e-12);
        assert!((velocity.angle() - core::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!(velocity_from(Vec2::new(1.0, 1.0), 0.0).is_none());
    }
}
