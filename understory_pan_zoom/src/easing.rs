// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Named easing curves used by animated transitions.

use core::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Easing curve applied to the normalized progress of an animation.
///
/// Every curve maps `0.0` to `0.0` and `1.0` to `1.0`. Names follow the
/// conventional `easeIn`/`easeOut`/`easeInOut` families and deserialize from
/// their camelCase spelling (for example `"easeInOutCubic"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    /// Constant speed.
    Linear,
    /// Half-cosine deceleration.
    #[default]
    EaseOut,
    /// Quadratic acceleration.
    EaseInQuad,
    /// Quadratic deceleration.
    EaseOutQuad,
    /// Quadratic acceleration then deceleration.
    EaseInOutQuad,
    /// Cubic acceleration.
    EaseInCubic,
    /// Cubic deceleration.
    EaseOutCubic,
    /// Cubic acceleration then deceleration.
    EaseInOutCubic,
    /// Quartic acceleration.
    EaseInQuart,
    /// Quartic deceleration.
    EaseOutQuart,
    /// Quartic acceleration then deceleration.
    EaseInOutQuart,
    /// Quintic acceleration.
    EaseInQuint,
    /// Quintic deceleration.
    EaseOutQuint,
    /// Quintic acceleration then deceleration.
    EaseInOutQuint,
}

impl Easing {
    /// Maps linear progress `t` (clamped into `[0, 1]`) through the curve.
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 1.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Self::Linear => t,
            Self::EaseOut => -(t * PI).cos() / 2.0 + 0.5,
            Self::EaseInQuad => t * t,
            Self::EaseOutQuad => t * (2.0 - t),
            Self::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Self::EaseInCubic => t.powi(3),
            Self::EaseOutCubic => (t - 1.0).powi(3) + 1.0,
            Self::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t.powi(3)
                } else {
                    (t - 1.0) * (2.0 * t - 2.0) * (2.0 * t - 2.0) + 1.0
                }
            }
            Self::EaseInQuart => t.powi(4),
            Self::EaseOutQuart => 1.0 - (t - 1.0).powi(4),
            Self::EaseInOutQuart => {
                if t < 0.5 {
                    8.0 * t.powi(4)
                } else {
                    1.0 - 8.0 * (t - 1.0).powi(4)
                }
            }
            Self::EaseInQuint => t.powi(5),
            Self::EaseOutQuint => 1.0 + (t - 1.0).powi(5),
            Self::EaseInOutQuint => {
                if t < 0.5 {
                    16.0 * t.powi(5)
                } else {
                    1.0 + 16.0 * (t - 1.0).powi(5)
                }
            }
        }
    }
}
