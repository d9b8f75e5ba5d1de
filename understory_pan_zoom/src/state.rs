// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// The committed transform: a uniform scale followed by a translation.
///
/// A content point `c` is displayed at viewport pixel `c * scale + position`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformState {
    /// Uniform scale factor, always positive.
    pub scale: f64,
    /// Horizontal translation in viewport pixels.
    pub position_x: f64,
    /// Vertical translation in viewport pixels.
    pub position_y: f64,
    /// Scale before the most recent scale change.
    pub previous_scale: f64,
}

impl Default for TransformState {
    fn default() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }
}

impl TransformState {
    /// Creates a state whose previous scale equals its scale.
    #[must_use]
    pub const fn new(scale: f64, position_x: f64, position_y: f64) -> Self {
        Self {
            scale,
            position_x,
            position_y,
            previous_scale: scale,
        }
    }

    /// Returns the translation as a point.
    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.position_x, self.position_y)
    }

    /// Returns `true` when all values are finite and the scale is positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        is_valid_transform(self.scale, self.position_x, self.position_y)
    }

    /// Returns the state that results from committing `(scale, x, y)`.
    ///
    /// `previous_scale` only moves when the scale actually changes.
    #[must_use]
    pub fn with(&self, scale: f64, position_x: f64, position_y: f64) -> Self {
        let previous_scale = if scale == self.scale {
            self.previous_scale
        } else {
            self.scale
        };
        Self {
            scale,
            position_x,
            position_y,
            previous_scale,
        }
    }

    /// Maps a viewport point into unscaled content coordinates.
    #[must_use]
    pub fn viewport_to_content(&self, point: Point) -> Point {
        ((point - self.position()) / self.scale).to_point()
    }

    /// Maps an unscaled content point into viewport coordinates.
    #[must_use]
    pub fn content_to_viewport(&self, point: Point) -> Point {
        self.position() + point.to_vec2() * self.scale
    }

    /// The transform as an affine map from content to viewport space.
    #[must_use]
    pub fn to_affine(&self) -> Affine {
        Affine::translate(Vec2::new(self.position_x, self.position_y)) * Affine::scale(self.scale)
    }

    /// Renders the transform as a CSS `transform` value.
    #[must_use]
    pub fn to_css(&self) -> String {
        format!(
            "translate({}px, {}px) scale({})",
            self.position_x, self.position_y, self.scale
        )
    }
}

/// Returns `true` when a candidate transform may be committed.
pub(crate) fn is_valid_transform(scale: f64, position_x: f64, position_y: f64) -> bool {
    scale.is_finite() && scale > 0.0 && position_x.is_finite() && position_y.is_finite()
}

/// Rectangle of permissible translations at a given scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    /// Smallest allowed horizontal translation.
    pub min_position_x: f64,
    /// Largest allowed horizontal translation.
    pub max_position_x: f64,
    /// Smallest allowed vertical translation.
    pub min_position_y: f64,
    /// Largest allowed vertical translation.
    pub max_position_y: f64,
}

impl Bounds {
    /// Returns `true` when `point` lies inside the rectangle (edges included).
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_position_x
            && point.x <= self.max_position_x
            && point.y >= self.min_position_y
            && point.y <= self.max_position_y
    }
}
