// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The orchestrating [`Controller`].
//!
//! The controller owns the committed transform, the recognizer runtimes, the
//! animation slot and the observers. Every state change, whether it comes
//! from a gesture, an animation frame or a control call, goes through one
//! commit path that validates the candidate, stores it, hands it to the
//! content surface and notifies observers, in that order.

use core::fmt;
use std::rc::Rc;

use kurbo::{Point, Size};

use crate::animation::{Animation, AnimationScheduler};
use crate::bounds::{center_position, clamp_scale, frame_element};
use crate::config::{Config, ConfigIssue, Setup};
use crate::easing::Easing;
use crate::error::{PanZoomError, Result};
use crate::gesture::double_click::{
    TapTracker, double_click_allowed, double_click_target, reset_target,
};
use crate::gesture::pan::{PanRuntime, momentum_for, pan_allowed, pan_position};
use crate::gesture::pinch::{PinchRuntime, pinch_allowed, pinch_transform};
use crate::gesture::wheel::{
    WHEEL_ALIGN_MS, WHEEL_STOP_MS, WheelRuntime, wheel_allowed, wheel_transform,
};
use crate::gesture::{
    Layout, bounded, point_zoom_target, scale_alignment_target, step_zoom_target,
};
use crate::input::{
    ActiveTouches, InputEvent, PointerInput, PressedKeys, TouchInput, WheelInput,
};
use crate::observe::{
    Channel, ControllerId, GestureEvent, GestureEventKind, Lifecycle, Observers, Snapshot,
    Subscription,
};
use crate::state::{Bounds, TransformState, is_valid_transform};
use crate::surface::{
    ContentSurface, ElementHandle, ListenerGuard, ListenerKind, ListenerRegistry, Surface,
};

/// Follow-up work once an animation completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AfterAnimation {
    Nothing,
    /// Settle into bounds over the given duration.
    Settle(u64),
}

/// Gesture-to-transform engine for one viewport.
///
/// See the [crate documentation](crate) for an overview.
pub struct Controller {
    id: ControllerId,
    config: Config,
    setup: Setup,
    issues: Vec<ConfigIssue>,
    lifecycle: Lifecycle,
    state: TransformState,
    viewport: Option<Box<dyn Surface>>,
    content: Option<Box<dyn ContentSurface>>,
    centered: bool,
    listeners: Vec<ListenerGuard>,
    keys: PressedKeys,
    touches: ActiveTouches,
    taps: TapTracker,
    pan: PanRuntime,
    pinch: PinchRuntime,
    wheel: WheelRuntime,
    animations: AnimationScheduler<AfterAnimation>,
    observers: Observers,
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("id", &self.id)
            .field("lifecycle", &self.lifecycle)
            .field("state", &self.state)
            .field("mounted", &self.is_mounted())
            .field("panning", &self.pan.is_panning())
            .field("pinching", &self.pinch.is_pinching())
            .field("wheeling", &self.wheel.active)
            .field("animating", &self.animations.is_active())
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}

impl Controller {
    /// Creates an uninitialized controller.
    ///
    /// Invalid configuration values are replaced and reported through
    /// [`config_issues`](Self::config_issues).
    #[must_use]
    pub fn new(config: Config) -> Self {
        let (setup, issues) = Setup::from_config(&config);
        let state = initial_state(&setup);
        let id = ControllerId::next();
        tracing::debug!(?id, "controller created");
        Self {
            id,
            config,
            setup,
            issues,
            lifecycle: Lifecycle::Uninitialized,
            state,
            viewport: None,
            content: None,
            centered: false,
            listeners: Vec::new(),
            keys: PressedKeys::default(),
            touches: ActiveTouches::default(),
            taps: TapTracker::default(),
            pan: PanRuntime::default(),
            pinch: PinchRuntime::default(),
            wheel: WheelRuntime::default(),
            animations: AnimationScheduler::default(),
            observers: Observers::default(),
        }
    }

    // --- lifecycle -------------------------------------------------------

    /// Binds the controller to a viewport and a content surface.
    ///
    /// Binding again releases the previous surfaces and gesture state first
    /// and starts over from the initial transform.
    pub fn init(
        &mut self,
        viewport: Box<dyn Surface>,
        content: Box<dyn ContentSurface>,
    ) -> Result<()> {
        self.ensure_alive("init")?;
        if self.lifecycle == Lifecycle::Initialized {
            tracing::debug!(id = ?self.id, "re-binding surfaces");
            self.release_bindings();
        }
        self.viewport = Some(viewport);
        self.content = Some(content);
        self.lifecycle = Lifecycle::Initialized;
        self.centered = false;

        let layout = self.current_layout();
        let mut state = initial_state(&self.setup);
        if has_area(layout.content) && has_area(layout.viewport) {
            if self.setup.bounds.center_on_init {
                let center = center_position(layout.content, layout.viewport, state.scale);
                state = state.with(state.scale, center.x, center.y);
                self.centered = true;
            } else {
                state = bounded(&state, &layout, &self.setup);
            }
        }
        if !state.is_valid() {
            // The configured values were validated, so only a broken surface
            // measurement lands here.
            tracing::warn!(id = ?self.id, ?state, "initial transform invalid, using default");
            state = TransformState::default();
        }
        self.state = state;
        if let Some(content) = self.content.as_mut() {
            content.apply_transform(&self.state);
        }
        tracing::debug!(id = ?self.id, state = ?self.state, "controller initialized");
        let snapshot = self.snapshot();
        self.observers.notify(Channel::Init, &snapshot);
        self.emit(GestureEventKind::Init, None);
        Ok(())
    }

    /// Replaces the configuration.
    ///
    /// The committed transform is kept unless it falls outside the new scale
    /// limits or bounds, in which case it moves to the nearest valid one at
    /// once and any running animation is cancelled.
    pub fn update(&mut self, config: Config) -> Result<()> {
        self.ensure_alive("update")?;
        let (setup, issues) = Setup::from_config(&config);
        self.config = config;
        self.setup = setup;
        self.issues = issues;
        tracing::debug!(id = ?self.id, issues = self.issues.len(), "configuration updated");
        let (Lifecycle::Initialized, Some(layout)) = (self.lifecycle, self.layout()) else {
            return Ok(());
        };
        // Running animations captured the old limits.
        self.cancel_animation();
        let scale = clamp_scale(self.state.scale, &self.setup, false);
        let rescaled = self
            .state
            .with(scale, self.state.position_x, self.state.position_y);
        let target = bounded(&rescaled, &layout, &self.setup);
        if same_transform(&target, &self.state) {
            return Ok(());
        }
        tracing::debug!(id = ?self.id, ?target, "transform moved into new limits");
        self.commit(target)
    }

    /// Acquires environment-level listeners (pointer, keyboard, blur).
    ///
    /// Mounting again releases the previous registrations first.
    pub fn mount(&mut self, registry: Rc<dyn ListenerRegistry>) -> Result<()> {
        self.ensure_alive("mount")?;
        self.listeners.clear();
        self.listeners = ListenerKind::ALL
            .iter()
            .map(|kind| ListenerGuard::acquire(registry.clone(), *kind))
            .collect();
        tracing::debug!(id = ?self.id, listeners = self.listeners.len(), "mounted");
        Ok(())
    }

    /// Releases environment-level listeners. Idempotent.
    pub fn unmount(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        self.listeners.clear();
        self.keys.clear();
        if self.touches.is_empty() {
            // A mouse drag cannot finish without the pointer listeners.
            self.finish_pan(None, None);
        }
        tracing::debug!(id = ?self.id, "unmounted");
    }

    /// Releases everything and makes the controller unusable. Idempotent.
    pub fn teardown(&mut self) {
        if self.lifecycle == Lifecycle::TornDown {
            return;
        }
        self.release_bindings();
        self.listeners.clear();
        self.keys.clear();
        self.observers.clear();
        self.lifecycle = Lifecycle::TornDown;
        tracing::debug!(id = ?self.id, "torn down");
    }

    fn release_bindings(&mut self) {
        self.animations.cancel();
        self.wheel.reset();
        self.pan.end();
        self.pinch.end();
        self.touches.clear();
        self.taps.reset();
        self.viewport = None;
        self.content = None;
    }

    // --- introspection ---------------------------------------------------

    /// Process-unique identifier.
    #[must_use]
    pub fn id(&self) -> ControllerId {
        self.id
    }

    /// Committed transform.
    #[must_use]
    pub fn state(&self) -> TransformState {
        self.state
    }

    /// Bounds at the committed scale, once surfaces are bound.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        self.layout().map(|layout| layout.bounds(self.state.scale, &self.setup))
    }

    /// Validated configuration in effect.
    #[must_use]
    pub fn setup(&self) -> &Setup {
        &self.setup
    }

    /// Configuration as supplied, before validation.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Substitutions made while validating the current configuration.
    #[must_use]
    pub fn config_issues(&self) -> &[ConfigIssue] {
        &self.issues
    }

    /// Lifecycle stage.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Returns `true` while environment-level listeners are held.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// Returns `true` while an animation occupies the slot.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.animations.is_active()
    }

    /// Returns `true` during a drag.
    #[must_use]
    pub fn is_panning(&self) -> bool {
        self.pan.is_panning()
    }

    /// Returns `true` during a two-finger pinch.
    #[must_use]
    pub fn is_pinching(&self) -> bool {
        self.pinch.is_pinching()
    }

    /// Returns `true` during a wheel burst.
    #[must_use]
    pub fn is_wheeling(&self) -> bool {
        self.wheel.active
    }

    /// Read-only view handed to observers.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            id: self.id,
            state: self.state,
            bounds: self.bounds(),
            lifecycle: self.lifecycle,
        }
    }

    // --- observers -------------------------------------------------------

    /// Calls `callback` after every committed transform.
    pub fn on_change(&mut self, callback: impl FnMut(&Snapshot) + 'static) -> Subscription {
        self.observers.add_snapshot(Channel::Change, Box::new(callback))
    }

    /// Calls `callback` whenever surfaces are bound.
    pub fn on_init(&mut self, callback: impl FnMut(&Snapshot) + 'static) -> Subscription {
        self.observers.add_snapshot(Channel::Init, Box::new(callback))
    }

    /// Calls `callback` for every gesture lifecycle notification.
    pub fn on_event(&mut self, callback: impl FnMut(&GestureEvent) + 'static) -> Subscription {
        self.observers.add_event(Box::new(callback))
    }

    /// Removes an observer. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.observers.remove(subscription)
    }

    // --- control ---------------------------------------------------------

    /// Sets the transform, optionally animating over `animation_time` ms.
    ///
    /// The scale is clamped to the configured limits and the position to the
    /// bounds. Non-finite values are rejected and leave the state untouched.
    pub fn set_transform(
        &mut self,
        scale: f64,
        position_x: f64,
        position_y: f64,
        animation_time: Option<u64>,
    ) -> Result<()> {
        let layout = self.ensure_initialized("set_transform")?;
        self.cancel_animation();
        if !is_valid_transform(scale, position_x, position_y) {
            return Err(self.reject(scale, position_x, position_y));
        }
        let scale = clamp_scale(scale, &self.setup, false);
        let target = bounded(
            &self.state.with(scale, position_x, position_y),
            &layout,
            &self.setup,
        );
        let easing = self.setup.zoom.animation_type;
        self.animate_to(target, animation_time.unwrap_or(0), easing, AfterAnimation::Nothing)
    }

    /// Animates back to the initial transform.
    pub fn reset_transform(&mut self) -> Result<()> {
        self.ensure_initialized("reset_transform")?;
        self.cancel_animation();
        let target = reset_target(&self.state, &self.setup);
        self.animate_zoom(target)
    }

    /// Zooms in by `step` (the configured step when `None`) around the
    /// viewport center.
    pub fn zoom_in(&mut self, step: Option<f64>) -> Result<()> {
        let step = step.unwrap_or(self.setup.zoom.step);
        self.zoom_by(step, "zoom_in")
    }

    /// Zooms out by `step` (the configured step when `None`) around the
    /// viewport center.
    pub fn zoom_out(&mut self, step: Option<f64>) -> Result<()> {
        let step = step.unwrap_or(self.setup.zoom.step);
        self.zoom_by(-step, "zoom_out")
    }

    fn zoom_by(&mut self, delta: f64, operation: &'static str) -> Result<()> {
        let layout = self.ensure_initialized(operation)?;
        self.cancel_animation();
        let target = step_zoom_target(
            &self.state,
            layout.viewport_center(),
            delta,
            &layout,
            &self.setup,
        );
        self.animate_zoom(target)
    }

    /// Centers the content at `scale` (the current scale when `None`).
    pub fn center_view(&mut self, scale: Option<f64>) -> Result<()> {
        let layout = self.ensure_initialized("center_view")?;
        self.cancel_animation();
        let scale = clamp_scale(scale.unwrap_or(self.state.scale), &self.setup, false);
        let center = center_position(layout.content, layout.viewport, scale);
        let target = self.state.with(scale, center.x, center.y);
        self.animate_zoom(target)
    }

    /// Frames `element` in the viewport, fitting it when `scale` is `None`.
    pub fn zoom_to_element(
        &mut self,
        element: &dyn ElementHandle,
        scale: Option<f64>,
    ) -> Result<()> {
        let layout = self.ensure_initialized("zoom_to_element")?;
        self.cancel_animation();
        let framed = frame_element(
            element.content_rect(),
            layout.content,
            layout.viewport,
            scale,
            &self.setup,
        );
        let target = self
            .state
            .with(framed.scale, framed.position_x, framed.position_y);
        self.animate_zoom(target)
    }

    /// Zooms to `scale` keeping viewport pixel `point` fixed.
    ///
    /// Without a scale this zooms in by the configured step.
    pub fn zoom_to_point(&mut self, point: Point, scale: Option<f64>) -> Result<()> {
        let layout = self.ensure_initialized("zoom_to_point")?;
        self.cancel_animation();
        let scale = scale.unwrap_or(self.state.scale + self.setup.zoom.step);
        let target = point_zoom_target(&self.state, point, scale, &layout, &self.setup);
        self.animate_zoom(target)
    }

    /// Re-measures after a viewport or content resize.
    ///
    /// Centers once if `center_on_init` is set and centering has not happened
    /// yet. Otherwise an alignment animation pulls the transform back inside
    /// the new bounds.
    pub fn resized(&mut self) -> Result<()> {
        let layout = self.ensure_initialized("resized")?;
        self.cancel_animation();
        if self.setup.bounds.center_on_init && !self.centered {
            if has_area(layout.content) && has_area(layout.viewport) {
                let center = center_position(layout.content, layout.viewport, self.state.scale);
                self.centered = true;
                return self.commit(self.state.with(self.state.scale, center.x, center.y));
            }
            return Ok(());
        }
        let target = bounded(&self.state, &layout, &self.setup);
        if target.position() == self.state.position() {
            return Ok(());
        }
        let alignment = &self.setup.alignment_animation;
        let duration = if alignment.disabled {
            0
        } else {
            alignment.animation_time
        };
        let easing = alignment.animation_type;
        self.animate_to(target, duration, easing, AfterAnimation::Nothing)
    }

    /// Advances animations and fires due timers at host time `now_ms`.
    pub fn tick(&mut self, now_ms: u64) -> Result<()> {
        self.ensure_initialized("tick")?;
        if self.wheel.align.fire_if_due(now_ms) {
            let anchor = self.wheel.anchor;
            self.settle(anchor, self.setup.alignment_animation.animation_time);
        }
        if self.wheel.stop.fire_if_due(now_ms) {
            self.finish_wheel();
        }
        let Some(frame) = self.animations.tick(now_ms) else {
            return Ok(());
        };
        let step = frame.step.state;
        if !same_transform(&step, &self.state) && !self.commit_quietly(step) {
            self.animations.cancel();
            return Ok(());
        }
        tracing::trace!(animation = ?frame.id, done = frame.step.done, "animation frame");
        if let Some(AfterAnimation::Settle(duration)) = frame.finished {
            self.settle(None, duration);
        }
        Ok(())
    }

    // --- wheel -----------------------------------------------------------

    /// Handles a wheel event (ctrl held means touchpad pinch).
    pub fn wheel(&mut self, input: &WheelInput) -> Result<()> {
        let layout = self.ensure_initialized("wheel")?;
        if self.pinch.is_pinching() || !wheel_allowed(input, &self.keys, &layout, &self.setup) {
            return Ok(());
        }
        let raw = InputEvent::Wheel(*input);
        self.cancel_animation();
        if !self.wheel.active {
            self.wheel.active = true;
            tracing::debug!(id = ?self.id, "wheel start");
            self.emit(GestureEventKind::WheelStart, Some(&raw));
            self.emit(GestureEventKind::ZoomStart, Some(&raw));
        }
        self.wheel.anchor = Some(input.position);
        if let Some(target) = wheel_transform(&self.state, input, &layout, &self.setup) {
            if self.commit_quietly(target) {
                self.emit(GestureEventKind::Zoom, Some(&raw));
            }
        }
        self.emit(GestureEventKind::Wheel, Some(&raw));
        self.wheel.stop.schedule(input.time_ms, WHEEL_STOP_MS);
        self.wheel.align.schedule(input.time_ms, WHEEL_ALIGN_MS);
        Ok(())
    }

    fn finish_wheel(&mut self) {
        if !self.wheel.active {
            return;
        }
        self.wheel.active = false;
        tracing::debug!(id = ?self.id, "wheel stop");
        self.emit(GestureEventKind::WheelStop, None);
        self.emit(GestureEventKind::ZoomStop, None);
    }

    // --- mouse -----------------------------------------------------------

    /// Handles a mouse button press on the viewport.
    pub fn pointer_down(&mut self, input: &PointerInput) -> Result<()> {
        let layout = self.ensure_initialized("pointer_down")?;
        if !self.is_mounted()
            || self.pinch.is_pinching()
            || !self.touches.is_empty()
            || !layout.viewport_contains(input.position)
            || !pan_allowed(input.button, &self.keys, &self.setup)
        {
            return Ok(());
        }
        self.start_pan(input.position, input.time_ms, &InputEvent::Pointer(*input));
        Ok(())
    }

    /// Handles mouse movement.
    pub fn pointer_move(&mut self, input: &PointerInput) -> Result<()> {
        let layout = self.ensure_initialized("pointer_move")?;
        if !self.is_mounted() || !self.touches.is_empty() {
            return Ok(());
        }
        self.move_pan(
            input.position,
            input.time_ms,
            &layout,
            &InputEvent::Pointer(*input),
        );
        Ok(())
    }

    /// Handles a mouse button release.
    pub fn pointer_up(&mut self, input: &PointerInput) -> Result<()> {
        self.ensure_initialized("pointer_up")?;
        if !self.is_mounted() || !self.touches.is_empty() {
            return Ok(());
        }
        let release = Some((input.position, input.time_ms));
        self.finish_pan(Some(&InputEvent::Pointer(*input)), release);
        Ok(())
    }

    /// Handles the pointer leaving the document, which ends a drag.
    pub fn pointer_leave(&mut self, input: &PointerInput) -> Result<()> {
        self.ensure_initialized("pointer_leave")?;
        if !self.is_mounted() || !self.touches.is_empty() {
            return Ok(());
        }
        let release = Some((input.position, input.time_ms));
        self.finish_pan(Some(&InputEvent::Pointer(*input)), release);
        Ok(())
    }

    /// Handles a double-click on the viewport.
    pub fn double_click(&mut self, input: &PointerInput) -> Result<()> {
        let layout = self.ensure_initialized("double_click")?;
        if !layout.viewport_contains(input.position) {
            return Ok(());
        }
        self.perform_double_click(input.position, &layout);
        Ok(())
    }

    fn perform_double_click(&mut self, position: Point, layout: &Layout) {
        if !double_click_allowed(&self.keys, &self.setup) {
            return;
        }
        self.cancel_animation();
        let target = double_click_target(&self.state, position, layout, &self.setup);
        tracing::debug!(id = ?self.id, mode = ?self.setup.double_click.mode, "double click");
        let double_click = &self.setup.double_click;
        let (duration, easing) = (double_click.animation_time, double_click.animation_type);
        if let Err(error) = self.animate_to(target, duration, easing, AfterAnimation::Nothing) {
            tracing::warn!(id = ?self.id, %error, "double click target dropped");
        }
    }

    // --- touch -----------------------------------------------------------

    /// Handles touches going down.
    pub fn touch_start(&mut self, input: &TouchInput) -> Result<()> {
        let layout = self.ensure_initialized("touch_start")?;
        self.touches.reconcile(&input.touches);
        let raw = InputEvent::Touch(input.clone());
        match self.touches.len() {
            0 => {}
            1 => {
                let Some(touch) = self.touches.first() else {
                    return Ok(());
                };
                if self.pinch.is_pinching() {
                    self.finish_pinch(Some(&raw), false);
                }
                if self.taps.register(input.time_ms)
                    && double_click_allowed(&self.keys, &self.setup)
                {
                    if self.pan.is_panning() {
                        self.pan.end();
                        self.emit(GestureEventKind::PanningStop, Some(&raw));
                    }
                    self.perform_double_click(touch.position, &layout);
                    return Ok(());
                }
                if pan_allowed(None, &self.keys, &self.setup) {
                    self.start_pan(touch.position, input.time_ms, &raw);
                }
            }
            _ => self.enter_pinch(&raw),
        }
        Ok(())
    }

    /// Handles touches moving.
    pub fn touch_move(&mut self, input: &TouchInput) -> Result<()> {
        let layout = self.ensure_initialized("touch_move")?;
        self.touches.reconcile(&input.touches);
        let raw = InputEvent::Touch(input.clone());
        if self.sync_touch_count(input.time_ms, &raw) {
            return Ok(());
        }
        if self.pinch.is_pinching() {
            self.move_pinch(&layout, &raw);
        } else if let Some(touch) = self.touches.first() {
            self.move_pan(touch.position, input.time_ms, &layout, &raw);
        }
        Ok(())
    }

    /// Handles touches lifting; `input` lists the touches still down.
    pub fn touch_end(&mut self, input: &TouchInput) -> Result<()> {
        self.ensure_initialized("touch_end")?;
        self.touches.reconcile(&input.touches);
        let raw = InputEvent::Touch(input.clone());
        if self.sync_touch_count(input.time_ms, &raw) {
            return Ok(());
        }
        if self.pan.is_panning() && self.touches.is_empty() {
            let release = self.pan.last_position().map(|last| (last, input.time_ms));
            self.finish_pan(Some(&raw), release);
        }
        Ok(())
    }

    /// Switches between pinch and drag when the active touch count no longer
    /// matches the running gesture. Returns `true` when it switched.
    ///
    /// Runs on every touch record, since a platform may drop the end event
    /// of a single finger.
    fn sync_touch_count(&mut self, time_ms: u64, raw: &InputEvent) -> bool {
        let count = self.touches.len();
        if self.pinch.is_pinching() && count < 2 {
            match self.touches.first() {
                Some(touch) => {
                    // One finger left of a pinch continues as a drag.
                    self.finish_pinch(Some(raw), false);
                    if pan_allowed(None, &self.keys, &self.setup) {
                        self.start_pan(touch.position, time_ms, raw);
                    }
                }
                None => self.finish_pinch(Some(raw), true),
            }
            return true;
        }
        if !self.pinch.is_pinching() && count >= 2 && pinch_allowed(&self.keys, &self.setup) {
            self.enter_pinch(raw);
            return true;
        }
        false
    }

    /// Drops any drag in favour of a pinch over the first two touches.
    fn enter_pinch(&mut self, raw: &InputEvent) {
        self.taps.reset();
        if self.pan.is_panning() {
            self.pan.end();
            self.emit(GestureEventKind::PanningStop, Some(raw));
        }
        if !self.pinch.is_pinching() {
            self.start_pinch(raw);
        }
    }

    /// Handles the platform cancelling all touches.
    pub fn touch_cancel(&mut self) -> Result<()> {
        self.ensure_initialized("touch_cancel")?;
        self.touches.clear();
        self.taps.reset();
        if self.pinch.is_pinching() {
            self.finish_pinch(None, true);
        }
        if self.pan.is_panning() {
            self.finish_pan(None, None);
        }
        Ok(())
    }

    // --- keys ------------------------------------------------------------

    /// Records a key press.
    pub fn key_down(&mut self, key: &str) -> Result<()> {
        self.ensure_alive("key_down")?;
        if self.is_mounted() {
            self.keys.press(key);
        }
        Ok(())
    }

    /// Records a key release.
    pub fn key_up(&mut self, key: &str) -> Result<()> {
        self.ensure_alive("key_up")?;
        if self.is_mounted() {
            self.keys.release(key);
        }
        Ok(())
    }

    /// Forgets held keys when the window loses focus.
    pub fn blur(&mut self) -> Result<()> {
        self.ensure_alive("blur")?;
        self.keys.clear();
        Ok(())
    }

    // --- pan internals ---------------------------------------------------

    fn start_pan(&mut self, position: Point, time_ms: u64, raw: &InputEvent) {
        self.cancel_animation();
        self.pan.start(position, &self.state, time_ms);
        tracing::debug!(id = ?self.id, ?position, "panning start");
        self.emit(GestureEventKind::PanningStart, Some(raw));
    }

    fn move_pan(&mut self, pointer: Point, time_ms: u64, layout: &Layout, raw: &InputEvent) {
        let Some(start_coords) = self.pan.start_coords else {
            return;
        };
        self.pan.sample(pointer, time_ms);
        let position = pan_position(&self.state, pointer, start_coords, layout, &self.setup);
        if position == self.state.position() {
            return;
        }
        let target = self.state.with(self.state.scale, position.x, position.y);
        if self.commit_quietly(target) {
            self.emit(GestureEventKind::Panning, Some(raw));
        }
    }

    /// Ends a drag. With a `release` position and time, a fast release
    /// keeps moving.
    fn finish_pan(&mut self, raw: Option<&InputEvent>, release: Option<(Point, u64)>) {
        if !self.pan.is_panning() {
            return;
        }
        let velocity = match release {
            Some((pointer, time_ms)) => self.pan.release(Some(pointer), time_ms),
            None => self.pan.end(),
        };
        tracing::debug!(id = ?self.id, ?velocity, "panning stop");
        self.emit(GestureEventKind::PanningStop, raw);

        let Some(layout) = self.layout() else {
            return;
        };
        let momentum = momentum_for(&self.state, velocity, &layout, &self.setup);
        match momentum {
            Some(momentum) => {
                let settle = self.setup.alignment_animation.velocity_alignment_time;
                self.animations.start(
                    Animation::momentum(self.state, momentum),
                    AfterAnimation::Settle(settle),
                );
            }
            None => self.settle(None, self.setup.alignment_animation.animation_time),
        }
    }

    // --- pinch internals -------------------------------------------------

    fn start_pinch(&mut self, raw: &InputEvent) {
        if !pinch_allowed(&self.keys, &self.setup) {
            return;
        }
        let Some((a, b)) = self.touches.pair() else {
            return;
        };
        if self.pinch.start(a, b, &self.state) {
            self.cancel_animation();
            tracing::debug!(id = ?self.id, "pinching start");
            self.emit(GestureEventKind::PinchingStart, Some(raw));
        }
    }

    fn move_pinch(&mut self, layout: &Layout, raw: &InputEvent) {
        let (Some(start), Some(last_center), Some((a, b))) =
            (self.pinch.start, self.pinch.last_center, self.touches.pair())
        else {
            return;
        };
        let Some(target) =
            pinch_transform(&self.state, &start, last_center, a, b, layout, &self.setup)
        else {
            return;
        };
        self.pinch.last_center = Some(a.midpoint(b));
        if self.commit_quietly(target) {
            self.emit(GestureEventKind::Pinching, Some(raw));
        }
    }

    /// Ends a pinch. With `settle`, the transform animates back into limits
    /// around the last midpoint.
    fn finish_pinch(&mut self, raw: Option<&InputEvent>, settle: bool) {
        let center = self.pinch.end();
        tracing::debug!(id = ?self.id, "pinching stop");
        self.emit(GestureEventKind::PinchingStop, raw);
        if settle {
            self.settle(center, self.setup.alignment_animation.animation_time);
        }
    }

    // --- animation and commit --------------------------------------------

    /// Cancels the running animation and any settling still queued by a
    /// wheel burst.
    fn cancel_animation(&mut self) {
        self.wheel.align.cancel();
        if self.animations.cancel() {
            tracing::trace!(id = ?self.id, "animation cancelled");
        }
    }

    /// Animates into the scale limits and bounds, anchored at `anchor`.
    fn settle(&mut self, anchor: Option<Point>, duration: u64) {
        let Some(layout) = self.layout() else {
            return;
        };
        if let Some(target) = scale_alignment_target(&self.state, anchor, &layout, &self.setup) {
            let easing = self.setup.alignment_animation.animation_type;
            if let Err(error) = self.animate_to(target, duration, easing, AfterAnimation::Nothing) {
                tracing::warn!(id = ?self.id, %error, "settle target dropped");
            }
        }
    }

    fn animate_zoom(&mut self, target: TransformState) -> Result<()> {
        let (duration, easing) = (self.setup.zoom.animation_time, self.setup.zoom.animation_type);
        self.animate_to(target, duration, easing, AfterAnimation::Nothing)
    }

    fn animate_to(
        &mut self,
        target: TransformState,
        duration: u64,
        easing: Easing,
        then: AfterAnimation,
    ) -> Result<()> {
        if !target.is_valid() {
            return Err(self.reject(target.scale, target.position_x, target.position_y));
        }
        if same_transform(&target, &self.state) {
            return Ok(());
        }
        if duration == 0 {
            return self.commit(target);
        }
        let id = self
            .animations
            .start(Animation::tween(self.state, target, duration, easing), then);
        tracing::trace!(id = ?self.id, animation = ?id, duration, "animation start");
        Ok(())
    }

    /// Commits a candidate, logging rather than returning a rejection.
    fn commit_quietly(&mut self, target: TransformState) -> bool {
        self.commit(target).is_ok()
    }

    /// The single commit path: validate, store, apply, notify.
    fn commit(&mut self, target: TransformState) -> Result<()> {
        if self.lifecycle != Lifecycle::Initialized {
            return Err(self.misuse("commit"));
        }
        if !target.is_valid() {
            return Err(self.reject(target.scale, target.position_x, target.position_y));
        }
        self.state = self
            .state
            .with(target.scale, target.position_x, target.position_y);
        if let Some(content) = self.content.as_mut() {
            content.apply_transform(&self.state);
        }
        tracing::trace!(id = ?self.id, state = ?self.state, "commit");
        let snapshot = self.snapshot();
        self.observers.notify(Channel::Change, &snapshot);
        self.emit(GestureEventKind::Transformed, None);
        Ok(())
    }

    fn reject(&self, scale: f64, position_x: f64, position_y: f64) -> PanZoomError {
        tracing::error!(
            id = ?self.id,
            scale,
            position_x,
            position_y,
            "rejected non-finite transform"
        );
        PanZoomError::NonFiniteTransform {
            scale,
            position_x,
            position_y,
        }
    }

    fn emit(&mut self, kind: GestureEventKind, input: Option<&InputEvent>) {
        if !self.observers.has_event_observers() {
            return;
        }
        let event = GestureEvent {
            kind,
            snapshot: self.snapshot(),
            input: input.cloned(),
        };
        self.observers.emit(&event);
    }

    // --- guards ----------------------------------------------------------

    fn layout(&self) -> Option<Layout> {
        match (&self.viewport, &self.content) {
            (Some(viewport), Some(content)) => Some(Layout {
                content: content.size(),
                viewport: viewport.size(),
            }),
            _ => None,
        }
    }

    fn current_layout(&self) -> Layout {
        self.layout().unwrap_or(Layout {
            content: Size::ZERO,
            viewport: Size::ZERO,
        })
    }

    fn ensure_alive(&self, operation: &'static str) -> Result<()> {
        if self.lifecycle == Lifecycle::TornDown {
            return Err(self.misuse(operation));
        }
        Ok(())
    }

    fn ensure_initialized(&self, operation: &'static str) -> Result<Layout> {
        match (self.lifecycle, self.layout()) {
            (Lifecycle::Initialized, Some(layout)) => Ok(layout),
            _ => Err(self.misuse(operation)),
        }
    }

    fn misuse(&self, operation: &'static str) -> PanZoomError {
        let error = match self.lifecycle {
            Lifecycle::TornDown => PanZoomError::TornDown,
            Lifecycle::Uninitialized | Lifecycle::Initialized => PanZoomError::NotInitialized,
        };
        tracing::warn!(id = ?self.id, operation, %error, "lifecycle misuse");
        error
    }
}

fn initial_state(setup: &Setup) -> TransformState {
    TransformState::new(
        setup.initial_scale,
        setup.initial_position_x,
        setup.initial_position_y,
    )
}

fn has_area(size: Size) -> bool {
    size.width > 0.0 && size.height > 0.0
}

fn same_transform(a: &TransformState, b: &TransformState) -> bool {
    a.scale == b.scale && a.position_x == b.position_x && a.position_y == b.position_y
}

#[cfg(test)]
mod tests {
    use kurbo::{Point, Size};

    use super::*;
    use crate::input::TouchPoint;

    fn controller() -> Controller {
        let mut controller = Controller::new(Config::default());
        controller
            .init(
                Box::new(Size::new(400.0, 300.0)),
                Box::new(Size::new(800.0, 600.0)),
            )
            .expect("fresh controller initializes");
        controller
    }

    #[test]
    fn reinit_starts_over_from_the_initial_transform() {
        let mut controller = controller();
        controller
            .set_transform(2.0, -100.0, -100.0, None)
            .expect("valid transform");
        controller
            .init(
                Box::new(Size::new(400.0, 300.0)),
                Box::new(Size::new(800.0, 600.0)),
            )
            .expect("re-binding is allowed");
        assert_eq!(controller.state(), TransformState::default());
    }

    #[test]
    fn touch_dispatch_switches_between_pan_and_pinch() {
        let mut controller = controller();
        let a = TouchPoint::new(1, Point::new(100.0, 100.0));
        let b = TouchPoint::new(2, Point::new(200.0, 100.0));

        controller
            .touch_start(&TouchInput::new(vec![a], 0))
            .expect("initialized");
        assert!(controller.is_panning());

        controller
            .touch_start(&TouchInput::new(vec![a, b], 500))
            .expect("initialized");
        assert!(!controller.is_panning());
        assert!(controller.is_pinching());

        controller
            .touch_end(&TouchInput::new(vec![b], 600))
            .expect("initialized");
        assert!(!controller.is_pinching());
        assert!(controller.is_panning());

        controller
            .touch_end(&TouchInput::new(vec![], 700))
            .expect("initialized");
        assert!(!controller.is_panning());
    }

    #[test]
    fn stale_touches_are_reconciled_away() {
        let mut controller = controller();
        let a = TouchPoint::new(1, Point::new(100.0, 100.0));
        let b = TouchPoint::new(2, Point::new(200.0, 100.0));
        controller
            .touch_start(&TouchInput::new(vec![a, b], 0))
            .expect("initialized");
        assert!(controller.is_pinching());

        // The end event for touch 1 never arrived; the next start only lists 3.
        let c = TouchPoint::new(3, Point::new(50.0, 50.0));
        controller
            .touch_start(&TouchInput::new(vec![b, c], 1_000))
            .expect("initialized");
        assert_eq!(controller.touches.len(), 2);
        assert!(controller.is_pinching());

        controller.touch_cancel().expect("initialized");
        assert!(controller.touches.is_empty());
        assert!(!controller.is_pinching());
    }
}
