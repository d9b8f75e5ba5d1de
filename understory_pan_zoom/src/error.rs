// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

/// Result alias used by fallible [`crate::Controller`] operations.
pub type Result<T> = core::result::Result<T, PanZoomError>;

/// Errors reported by the pan/zoom engine.
///
/// Gating rejections (a disabled recognizer, a missing activation key, a
/// pointer outside the viewport) are not errors; those inputs are ignored.
#[derive(Debug, Error)]
pub enum PanZoomError {
    /// A candidate transform contained NaN or an infinite value, or a
    /// non-positive scale. The committed state was left untouched.
    #[error("rejected non-finite transform: scale={scale} x={position_x} y={position_y}")]
    NonFiniteTransform {
        /// Candidate scale.
        scale: f64,
        /// Candidate horizontal translation.
        position_x: f64,
        /// Candidate vertical translation.
        position_y: f64,
    },

    /// The operation needs surfaces bound through [`crate::Controller::init`].
    #[error("controller is not initialized")]
    NotInitialized,

    /// The controller was torn down; no further operations are accepted.
    #[error("controller has been torn down")]
    TornDown,

    /// Configuration could not be parsed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failure to load a [`crate::Config`] from its serialized form.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed into a configuration.
    #[error("invalid configuration json: {0}")]
    Json(#[from] serde_json::Error),
}
