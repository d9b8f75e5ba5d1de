// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change notification.
//!
//! Observers receive read-only [`Snapshot`]s rather than the controller
//! itself, so a callback can never re-enter a commit that is still running.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::input::InputEvent;
use crate::state::{Bounds, TransformState};

/// Process-unique identifier of a [`Controller`](crate::Controller).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerId(u64);

impl ControllerId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Where a controller is in its lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Lifecycle {
    /// Created, surfaces not yet bound.
    #[default]
    Uninitialized,
    /// Bound to a viewport and content surface.
    Initialized,
    /// Torn down. Terminal.
    TornDown,
}

/// Read-only view of a controller at the moment of a notification.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Snapshot {
    /// Controller that produced the notification.
    pub id: ControllerId,
    /// Committed transform.
    pub state: TransformState,
    /// Bounds at the committed scale, once surfaces are bound.
    pub bounds: Option<Bounds>,
    /// Lifecycle stage.
    pub lifecycle: Lifecycle,
}

/// What a [`GestureEvent`] reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GestureEventKind {
    /// Surfaces were bound.
    Init,
    /// A transform was committed.
    Transformed,
    /// A zoom gesture (wheel or touchpad pinch) began.
    ZoomStart,
    /// A zoom gesture changed the transform.
    Zoom,
    /// A zoom gesture ended.
    ZoomStop,
    /// A wheel burst began.
    WheelStart,
    /// A wheel event inside a burst.
    Wheel,
    /// A wheel burst ended.
    WheelStop,
    /// A drag began.
    PanningStart,
    /// A drag moved the content.
    Panning,
    /// A drag ended.
    PanningStop,
    /// A two-finger pinch began.
    PinchingStart,
    /// A pinch changed the transform.
    Pinching,
    /// A pinch ended.
    PinchingStop,
}

/// A lifecycle notification with the input that caused it.
#[derive(Clone, Debug, PartialEq)]
pub struct GestureEvent {
    /// Notification kind.
    pub kind: GestureEventKind,
    /// Controller state after the event.
    pub snapshot: Snapshot,
    /// Originating input, when there is one.
    pub input: Option<InputEvent>,
}

/// Handle returned by subscriptions; pass it to
/// [`Controller::unsubscribe`](crate::Controller::unsubscribe).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use = "dropping a Subscription makes the observer impossible to remove"]
pub struct Subscription(u64);

type Callback<T> = Box<dyn FnMut(&T)>;

/// Which notifications an observer receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Channel {
    Change,
    Init,
}

#[derive(Default)]
pub(crate) struct Observers {
    next_id: u64,
    snapshots: Vec<(Subscription, Channel, Callback<Snapshot>)>,
    events: Vec<(Subscription, Callback<GestureEvent>)>,
}

impl Observers {
    fn allocate(&mut self) -> Subscription {
        let subscription = Subscription(self.next_id);
        self.next_id += 1;
        subscription
    }

    pub(crate) fn add_snapshot(
        &mut self,
        channel: Channel,
        callback: Callback<Snapshot>,
    ) -> Subscription {
        let subscription = self.allocate();
        self.snapshots.push((subscription, channel, callback));
        subscription
    }

    pub(crate) fn add_event(&mut self, callback: Callback<GestureEvent>) -> Subscription {
        let subscription = self.allocate();
        self.events.push((subscription, callback));
        subscription
    }

    pub(crate) fn remove(&mut self, subscription: Subscription) -> bool {
        let before = self.snapshots.len() + self.events.len();
        self.snapshots.retain(|(id, _, _)| *id != subscription);
        self.events.retain(|(id, _)| *id != subscription);
        before != self.snapshots.len() + self.events.len()
    }

    pub(crate) fn notify(&mut self, channel: Channel, snapshot: &Snapshot) {
        for (_, _, callback) in self
            .snapshots
            .iter_mut()
            .filter(|(_, target, _)| *target == channel)
        {
            callback(snapshot);
        }
    }

    pub(crate) fn emit(&mut self, event: &GestureEvent) {
        for (_, callback) in &mut self.events {
            callback(event);
        }
    }

    pub(crate) fn has_event_observers(&self) -> bool {
        !self.events.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.snapshots.clear();
        self.events.clear();
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("next_id", &self.next_id)
            .field("snapshots", &self.snapshots.len())
            .field("events", &self.events.len())
            .finish()
    }
}
