// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Pan Zoom: a headless gesture-to-transform engine.
//!
//! This crate turns pointer, wheel, touch and keyboard input into a single
//! bounded 2D transform (a uniform scale followed by a translation) for one
//! piece of content shown inside a viewport. It focuses on:
//! - Recognizers for wheel zoom, drag panning, two-finger pinch and
//!   double-click / double-tap.
//! - Bounds that keep the content covering the viewport, with elastic
//!   overscroll while a gesture is in flight.
//! - Animated settling, momentum after a fast drag, and programmatic
//!   transitions (`zoom_in`, `center_view`, `zoom_to_element`, ...).
//!
//! It does **not** own a window, a DOM or a frame clock. Callers are
//! expected to:
//! - Implement [`Surface`] / [`ContentSurface`] for the viewport and the
//!   content, and optionally a [`ListenerRegistry`] for environment-level
//!   listeners.
//! - Translate platform events into [`WheelInput`], [`PointerInput`] and
//!   [`TouchInput`] records stamped with a millisecond clock.
//! - Call [`Controller::tick`] once per frame to advance animations and
//!   timers.
//!
//! ## Minimal example
//!
//! ```rust
//! use kurbo::{Point, Size};
//! use understory_pan_zoom::{Config, Controller, WheelInput};
//!
//! let mut controller = Controller::new(Config::default());
//!
//! // Plain sizes work as surfaces: a 400x300 viewport showing 800x600 content.
//! controller.init(
//!     Box::new(Size::new(400.0, 300.0)),
//!     Box::new(Size::new(800.0, 600.0)),
//! )?;
//!
//! // Wheel zoom commits immediately, anchored under the pointer.
//! controller.wheel(&WheelInput::new(Point::new(200.0, 150.0), -100.0, 0))?;
//! let wheeled = controller.state().scale;
//! assert!(wheeled > 1.0);
//!
//! // Control calls animate; the host drives time.
//! controller.zoom_in(None)?;
//! controller.tick(16)?;
//! controller.tick(400)?;
//! assert!((controller.state().scale - (wheeled + 0.5)).abs() < 1e-9);
//! assert!(!controller.is_animating());
//!
//! let bounds = controller.bounds().expect("surfaces are bound");
//! assert!(bounds.contains(controller.state().position()));
//! # Ok::<(), understory_pan_zoom::PanZoomError>(())
//! ```
//!
//! ## Observing changes
//!
//! Observers receive read-only [`Snapshot`]s. They cannot reach back into the
//! controller, so a callback never interleaves with a commit in progress.
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use kurbo::Size;
//! use understory_pan_zoom::{Config, Controller};
//!
//! let mut controller = Controller::new(Config::default());
//! let scales = Rc::new(RefCell::new(Vec::new()));
//! let sink = scales.clone();
//! let subscription =
//!     controller.on_change(move |snapshot| sink.borrow_mut().push(snapshot.state.scale));
//!
//! controller.init(Box::new(Size::new(400.0, 300.0)), Box::new(Size::new(800.0, 600.0)))?;
//! controller.set_transform(2.0, -100.0, -100.0, None)?;
//! assert_eq!(*scales.borrow(), [2.0]);
//!
//! assert!(controller.unsubscribe(subscription));
//! # Ok::<(), understory_pan_zoom::PanZoomError>(())
//! ```
//!
//! ## Configuration
//!
//! [`Config`] deserializes from camelCase JSON with defaults for anything
//! omitted. Inconsistent values are replaced and reported as
//! [`ConfigIssue`]s instead of failing.
//!
//! ```rust
//! use understory_pan_zoom::{Config, Controller, DoubleClickMode};
//!
//! let config = Config::from_json_str(
//!     r#"{ "zoom": { "maxScale": 4 }, "doubleClick": { "mode": "toggle" } }"#,
//! )?;
//! assert_eq!(config.zoom.max_scale, 4.0);
//! assert_eq!(config.double_click.mode, DoubleClickMode::Toggle);
//!
//! let swapped = Config::from_json_str(
//!     r#"{ "initialScale": 3, "zoom": { "minScale": 5, "maxScale": 2 } }"#,
//! )?;
//! let controller = Controller::new(swapped);
//! assert_eq!(controller.config_issues().len(), 1);
//! assert_eq!(controller.setup().zoom.min_scale, 2.0);
//! # Ok::<(), understory_pan_zoom::ConfigError>(())
//! ```
//!
//! ## Design notes
//!
//! - Recognizers are pure functions over `(state, input, layout, setup)`;
//!   only the [`Controller`] commits.
//! - One animation slot. A new gesture or control call cancels the running
//!   animation outright; nothing is blended.
//! - Non-finite candidates are rejected before commit and leave the state
//!   untouched.
//! - Logging goes through `tracing`; the crate never installs a subscriber.

mod animation;
mod bounds;
mod config;
mod controller;
mod easing;
mod error;
mod gesture;
mod input;
mod observe;
mod schedule;
mod state;
mod surface;

pub use animation::{
    Animation, AnimationId, AnimationScheduler, AnimationStep, Frame, Momentum, Velocity,
};
pub use bounds::{
    ZoomedOutMode, anchored_zoom_position, calculate_bounds, center_position, clamp_position,
    clamp_scale, frame_element, gesture_padding,
};
pub use config::{
    AlignmentConfig, AllowedButtons, BoundsConfig, Config, ConfigIssue, DoubleClickConfig,
    DoubleClickMode, PanConfig, PinchConfig, Setup, ZoomConfig,
};
pub use controller::Controller;
pub use easing::Easing;
pub use error::{ConfigError, PanZoomError, Result};
pub use input::{
    ActiveTouches, InputEvent, MouseButton, PointerInput, PressedKeys, TouchInput, TouchPoint,
    WheelInput,
};
pub use observe::{ControllerId, GestureEvent, GestureEventKind, Lifecycle, Snapshot, Subscription};
pub use schedule::ScheduledTask;
pub use state::{Bounds, TransformState};
pub use surface::{
    ContentSurface, ElementHandle, ListenerGuard, ListenerKind, ListenerRegistry, ListenerToken,
    Surface,
};
