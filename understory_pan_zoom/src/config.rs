// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine configuration and its validated form.
//!
//! [`Config`] is the raw, serializable option surface. Hosts may build it in
//! code or load partial JSON with [`Config::from_json_str`]; omitted fields
//! take their defaults. The [`crate::Controller`] never consumes a `Config`
//! directly: it validates it into a [`Setup`], substituting safe values for
//! inconsistent options and reporting each substitution as a [`ConfigIssue`].

use core::ops::Deref;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::easing::Easing;
use crate::error::ConfigError;

/// Complete option surface of the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Disables every gesture. Control methods such as `zoom_in` still apply.
    pub disabled: bool,
    /// Scale applied on init and restored by reset.
    pub initial_scale: f64,
    /// Horizontal translation applied on init and restored by reset.
    pub initial_position_x: f64,
    /// Vertical translation applied on init and restored by reset.
    pub initial_position_y: f64,
    /// Zoom limits and wheel behavior.
    pub zoom: ZoomConfig,
    /// Drag panning behavior.
    pub pan: PanConfig,
    /// Two-finger pinch behavior.
    pub pinch: PinchConfig,
    /// Double-click and double-tap behavior.
    pub double_click: DoubleClickConfig,
    /// Elastic padding and settling animation.
    pub alignment_animation: AlignmentConfig,
    /// Bounds enforcement.
    pub bounds: BoundsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            disabled: false,
            initial_scale: 1.0,
            initial_position_x: 0.0,
            initial_position_y: 0.0,
            zoom: ZoomConfig::default(),
            pan: PanConfig::default(),
            pinch: PinchConfig::default(),
            double_click: DoubleClickConfig::default(),
            alignment_animation: AlignmentConfig::default(),
            bounds: BoundsConfig::default(),
        }
    }
}

impl Config {
    /// Parses a configuration from JSON, filling omitted fields with defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Zoom limits, step sizes, and wheel gating.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZoomConfig {
    /// Disables zoom gestures (wheel, touchpad and pinch). Control methods are
    /// not affected.
    pub disabled: bool,
    /// Additive scale step for `zoom_in`/`zoom_out` without an explicit step.
    pub step: f64,
    /// Lower scale limit.
    pub min_scale: f64,
    /// Upper scale limit.
    pub max_scale: f64,
    /// Duration of control-operation animations in milliseconds.
    pub animation_time: u64,
    /// Easing of control-operation animations.
    pub animation_type: Easing,
    /// Blocks plain wheel zoom (touchpad pinch remains available).
    pub wheel_disabled: bool,
    /// Blocks touchpad pinch, delivered as ctrl-modified wheel events.
    pub touch_pad_disabled: bool,
    /// Logarithmic zoom amount per wheel notch.
    pub wheel_step: f64,
    /// Scales the wheel zoom amount by the delta magnitude.
    pub smooth_wheel: bool,
    /// Zoom amount per delta unit when `smooth_wheel` is set.
    pub smooth_wheel_step: f64,
    /// How far gestures may undershoot `min_scale` before settling back.
    pub scale_padding: f64,
    /// Keys of which at least one must be held for wheel zoom. Empty means none.
    pub activation_keys: Vec<String>,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            step: 0.5,
            min_scale: 1.0,
            max_scale: 8.0,
            animation_time: 200,
            animation_type: Easing::EaseOut,
            wheel_disabled: false,
            touch_pad_disabled: false,
            wheel_step: 0.2,
            smooth_wheel: false,
            smooth_wheel_step: 0.001,
            scale_padding: 0.4,
            activation_keys: Vec::new(),
        }
    }
}

/// Mouse buttons permitted to start a drag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllowedButtons {
    /// Primary button.
    pub left: bool,
    /// Auxiliary (wheel) button.
    pub middle: bool,
    /// Secondary button.
    pub right: bool,
}

impl Default for AllowedButtons {
    fn default() -> Self {
        Self {
            left: true,
            middle: true,
            right: true,
        }
    }
}

/// Drag panning options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PanConfig {
    /// Disables drag panning.
    pub disabled: bool,
    /// Freezes the horizontal translation while panning.
    pub lock_axis_x: bool,
    /// Freezes the vertical translation while panning.
    pub lock_axis_y: bool,
    /// Buttons allowed to start a mouse drag.
    pub allowed_buttons: AllowedButtons,
    /// Keys of which at least one must be held to start a drag. Empty means none.
    pub activation_keys: Vec<String>,
    /// Enables momentum after a fast drag.
    pub velocity_enabled: bool,
    /// Fraction of velocity retained per 16 ms frame of momentum, in `(0, 1)`.
    pub velocity_friction: f64,
}

impl Default for PanConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            lock_axis_x: false,
            lock_axis_y: false,
            allowed_buttons: AllowedButtons::default(),
            activation_keys: Vec::new(),
            velocity_enabled: true,
            velocity_friction: 0.92,
        }
    }
}

/// Pinch options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PinchConfig {
    /// Disables two-finger pinch.
    pub disabled: bool,
    /// Sensitivity applied to the change of finger distance; `1.0` tracks the
    /// fingers exactly.
    pub step: f64,
}

impl Default for PinchConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            step: 1.0,
        }
    }
}

/// What a double-click or double-tap does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DoubleClickMode {
    /// Zoom in by the step, anchored at the click.
    #[default]
    ZoomIn,
    /// Zoom out by the step, anchored at the click.
    ZoomOut,
    /// Animate back to the initial transform.
    Reset,
    /// Zoom in when at the initial scale, reset otherwise.
    Toggle,
}

/// Double-click options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DoubleClickConfig {
    /// Disables double-click and double-tap handling.
    pub disabled: bool,
    /// Action to perform.
    pub mode: DoubleClickMode,
    /// Additive scale step.
    pub step: f64,
    /// Animation duration in milliseconds.
    pub animation_time: u64,
    /// Animation easing.
    pub animation_type: Easing,
    /// Keys of which at least one must be held. Empty means none.
    pub activation_keys: Vec<String>,
}

impl Default for DoubleClickConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            mode: DoubleClickMode::ZoomIn,
            step: 0.7,
            animation_time: 200,
            animation_type: Easing::EaseOut,
            activation_keys: Vec::new(),
        }
    }
}

/// Elastic overscroll and settling options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlignmentConfig {
    /// Disables elastic padding and the settling animation.
    pub disabled: bool,
    /// Horizontal overscroll allowed during a gesture, in viewport pixels.
    pub size_x: f64,
    /// Vertical overscroll allowed during a gesture, in viewport pixels.
    pub size_y: f64,
    /// Settling duration in milliseconds.
    pub animation_time: u64,
    /// Settling duration after momentum, in milliseconds.
    pub velocity_alignment_time: u64,
    /// Settling easing.
    pub animation_type: Easing,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            size_x: 100.0,
            size_y: 100.0,
            animation_time: 200,
            velocity_alignment_time: 400,
            animation_type: Easing::EaseOut,
        }
    }
}

/// Bounds enforcement options.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoundsConfig {
    /// Clamp translations to the computed bounds.
    pub limit_to_bounds: bool,
    /// Pin content smaller than the viewport to the centered position.
    pub center_zoomed_out: bool,
    /// Center content once both surfaces report a size.
    pub center_on_init: bool,
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            limit_to_bounds: true,
            center_zoomed_out: false,
            center_on_init: false,
        }
    }
}

/// A configuration inconsistency that was replaced with a safe value.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigIssue {
    /// A scale limit was not a positive finite number.
    #[error("scale limit `{field}` = {value} is invalid; using {replacement}")]
    InvalidScaleLimit {
        /// Offending option.
        field: &'static str,
        /// Value supplied.
        value: f64,
        /// Value used instead.
        replacement: f64,
    },
    /// `min_scale` exceeded `max_scale`.
    #[error("min scale {min} exceeds max scale {max}; limits swapped")]
    SwappedScaleLimits {
        /// Supplied minimum.
        min: f64,
        /// Supplied maximum.
        max: f64,
    },
    /// The initial scale fell outside the scale limits.
    #[error("initial scale {value} outside [{min}, {max}]; clamped to {replacement}")]
    InitialScaleOutOfRange {
        /// Supplied initial scale.
        value: f64,
        /// Effective minimum.
        min: f64,
        /// Effective maximum.
        max: f64,
        /// Value used instead.
        replacement: f64,
    },
    /// A numeric option was non-finite or outside its domain.
    #[error("option `{field}` = {value} is invalid; using {replacement}")]
    InvalidValue {
        /// Offending option.
        field: &'static str,
        /// Value supplied.
        value: f64,
        /// Value used instead.
        replacement: f64,
    },
}

/// Validated, immutable configuration used by the engine.
///
/// A `Setup` dereferences to the [`Config`] it was built from, with invalid
/// values already replaced.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Setup {
    config: Config,
}

impl Deref for Setup {
    type Target = Config;

    fn deref(&self) -> &Config {
        &self.config
    }
}

impl Setup {
    /// Validates `config`, returning the usable setup and every substitution made.
    #[must_use]
    pub fn from_config(config: &Config) -> (Self, Vec<ConfigIssue>) {
        let defaults = Config::default();
        let mut config = config.clone();
        let mut issues = Vec::new();

        let zoom = &mut config.zoom;
        positive(
            &mut zoom.min_scale,
            "zoom.minScale",
            defaults.zoom.min_scale,
            &mut issues,
            true,
        );
        positive(
            &mut zoom.max_scale,
            "zoom.maxScale",
            defaults.zoom.max_scale,
            &mut issues,
            true,
        );
        if zoom.min_scale > zoom.max_scale {
            issues.push(ConfigIssue::SwappedScaleLimits {
                min: zoom.min_scale,
                max: zoom.max_scale,
            });
            core::mem::swap(&mut zoom.min_scale, &mut zoom.max_scale);
        }
        non_negative(&mut zoom.step, "zoom.step", defaults.zoom.step, &mut issues);
        non_negative(
            &mut zoom.wheel_step,
            "zoom.wheelStep",
            defaults.zoom.wheel_step,
            &mut issues,
        );
        non_negative(
            &mut zoom.smooth_wheel_step,
            "zoom.smoothWheelStep",
            defaults.zoom.smooth_wheel_step,
            &mut issues,
        );
        non_negative(
            &mut zoom.scale_padding,
            "zoom.scalePadding",
            defaults.zoom.scale_padding,
            &mut issues,
        );
        // Padding may not push the effective lower limit to zero or below.
        if zoom.scale_padding >= zoom.min_scale {
            let replacement = zoom.min_scale / 2.0;
            issues.push(ConfigIssue::InvalidValue {
                field: "zoom.scalePadding",
                value: zoom.scale_padding,
                replacement,
            });
            zoom.scale_padding = replacement;
        }

        let (min, max) = (config.zoom.min_scale, config.zoom.max_scale);
        if !config.initial_scale.is_finite() || config.initial_scale <= 0.0 {
            issues.push(ConfigIssue::InvalidScaleLimit {
                field: "initialScale",
                value: config.initial_scale,
                replacement: min,
            });
            config.initial_scale = min;
        } else if config.initial_scale < min || config.initial_scale > max {
            let replacement = config.initial_scale.clamp(min, max);
            issues.push(ConfigIssue::InitialScaleOutOfRange {
                value: config.initial_scale,
                min,
                max,
                replacement,
            });
            config.initial_scale = replacement;
        }
        finite(
            &mut config.initial_position_x,
            "initialPositionX",
            &mut issues,
        );
        finite(
            &mut config.initial_position_y,
            "initialPositionY",
            &mut issues,
        );

        let friction = config.pan.velocity_friction;
        if !(friction > 0.0 && friction < 1.0) {
            issues.push(ConfigIssue::InvalidValue {
                field: "pan.velocityFriction",
                value: friction,
                replacement: defaults.pan.velocity_friction,
            });
            config.pan.velocity_friction = defaults.pan.velocity_friction;
        }
        positive(
            &mut config.pinch.step,
            "pinch.step",
            defaults.pinch.step,
            &mut issues,
            false,
        );
        non_negative(
            &mut config.double_click.step,
            "doubleClick.step",
            defaults.double_click.step,
            &mut issues,
        );
        non_negative(
            &mut config.alignment_animation.size_x,
            "alignmentAnimation.sizeX",
            defaults.alignment_animation.size_x,
            &mut issues,
        );
        non_negative(
            &mut config.alignment_animation.size_y,
            "alignmentAnimation.sizeY",
            defaults.alignment_animation.size_y,
            &mut issues,
        );

        for issue in &issues {
            tracing::warn!(%issue, "configuration issue");
        }
        (Self { config }, issues)
    }

    /// Returns the validated configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Lowest scale a gesture may reach before settling back.
    pub(crate) fn padded_min_scale(&self) -> f64 {
        self.config.zoom.min_scale - self.config.zoom.scale_padding
    }
}

fn positive(
    value: &mut f64,
    field: &'static str,
    replacement: f64,
    issues: &mut Vec<ConfigIssue>,
    scale_limit: bool,
) {
    if value.is_finite() && *value > 0.0 {
        return;
    }
    let issue = if scale_limit {
        ConfigIssue::InvalidScaleLimit {
            field,
            value: *value,
            replacement,
        }
    } else {
        ConfigIssue::InvalidValue {
            field,
            value: *value,
            replacement,
        }
    };
    issues.push(issue);
    *value = replacement;
}

fn non_negative(
    value: &mut f64,
    field: &'static str,
    replacement: f64,
    issues: &mut Vec<ConfigIssue>,
) {
    if value.is_finite() && *value >= 0.0 {
        return;
    }
    issues.push(ConfigIssue::InvalidValue {
        field,
        value: *value,
        replacement,
    });
    *value = replacement;
}

fn finite(value: &mut f64, field: &'static str, issues: &mut Vec<ConfigIssue>) {
    if value.is_finite() {
        return;
    }
    issues.push(ConfigIssue::InvalidValue {
        field,
        value: *value,
        replacement: 0.0,
    });
    *value = 0.0;
}
