// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-side collaborators.
//!
//! The engine never touches a windowing system directly. It measures the
//! viewport and content through [`Surface`], hands committed transforms to a
//! [`ContentSurface`], and registers environment-level listeners through a
//! [`ListenerRegistry`]. Registrations are held as [`ListenerGuard`]s, which
//! release themselves when dropped.

use core::fmt;
use std::rc::Rc;

use kurbo::{Rect, Size};

use crate::state::TransformState;

/// Something with a measurable size in pixels.
pub trait Surface {
    /// Current size. Content surfaces report their unscaled natural size.
    fn size(&self) -> Size;
}

/// The surface that displays the transformed content.
pub trait ContentSurface: Surface {
    /// Receives every committed transform.
    fn apply_transform(&mut self, state: &TransformState) {
        let _ = state;
    }
}

impl Surface for Size {
    fn size(&self) -> Size {
        *self
    }
}

impl ContentSurface for Size {}

/// An element inside the content that can be zoomed to.
pub trait ElementHandle {
    /// Bounding rectangle in unscaled content coordinates.
    fn content_rect(&self) -> Rect;
}

impl ElementHandle for Rect {
    fn content_rect(&self) -> Rect {
        *self
    }
}

/// Environment-level events the engine listens for while mounted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    /// Mouse button pressed.
    PointerDown,
    /// Mouse moved.
    PointerMove,
    /// Mouse button released.
    PointerUp,
    /// Pointer left the document.
    PointerLeave,
    /// Key pressed.
    KeyDown,
    /// Key released.
    KeyUp,
    /// Window lost focus.
    Blur,
}

impl ListenerKind {
    /// Every kind acquired by [`Controller::mount`](crate::Controller::mount).
    pub const ALL: [Self; 7] = [
        Self::PointerDown,
        Self::PointerMove,
        Self::PointerUp,
        Self::PointerLeave,
        Self::KeyDown,
        Self::KeyUp,
        Self::Blur,
    ];
}

/// Host identifier for one registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerToken(pub u64);

/// Host facility for attaching environment-level listeners.
///
/// Methods take `&self`; hosts keep their bookkeeping behind interior mutability.
pub trait ListenerRegistry {
    /// Attaches a listener for `kind`.
    fn add_listener(&self, kind: ListenerKind) -> ListenerToken;
    /// Detaches the listener identified by `token`.
    fn remove_listener(&self, token: ListenerToken);
}

/// A registration that is released when dropped.
pub struct ListenerGuard {
    registry: Rc<dyn ListenerRegistry>,
    kind: ListenerKind,
    token: ListenerToken,
}

impl ListenerGuard {
    /// Registers a listener for `kind` with `registry`.
    #[must_use]
    pub fn acquire(registry: Rc<dyn ListenerRegistry>, kind: ListenerKind) -> Self {
        let token = registry.add_listener(kind);
        Self {
            registry,
            kind,
            token,
        }
    }

    /// Event kind this guard listens for.
    #[must_use]
    pub fn kind(&self) -> ListenerKind {
        self.kind
    }

    /// Host token of the registration.
    #[must_use]
    pub fn token(&self) -> ListenerToken {
        self.token
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.registry.remove_listener(self.token);
    }
}

impl fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerGuard")
            .field("kind", &self.kind)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}
