//! Route lifecycle notifications for external consumers (notes, visits, UI).
//!
//! # Invariants
//! - Listeners are notified synchronously, in subscription order.
//! - Events are emitted only after the state they describe is committed.

use crate::model::route::{Route, RouteId};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum RouteEvent {
    Created { route: Rc<Route> },
    Cleared { route_id: RouteId },
    NavigationStarted { route_id: RouteId },
    ActiveStopChanged { route_id: RouteId, index: usize },
    NavigationStopped { route_id: RouteId },
}

impl RouteEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created { .. } => "route_created",
            Self::Cleared { .. } => "route_cleared",
            Self::NavigationStarted { .. } => "navigation_started",
            Self::ActiveStopChanged { .. } => "active_stop_changed",
            Self::NavigationStopped { .. } => "navigation_stopped",
        }
    }
}

pub trait RouteEventListener {
    fn on_route_event(&self, event: &RouteEvent);
}

/// Subscriber list for route lifecycle events.
#[derive(Default)]
pub struct EventBus {
    listeners: RefCell<Vec<Rc<dyn RouteEventListener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Rc<dyn RouteEventListener>) {
        self.listeners.borrow_mut().push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }

    pub fn emit(&self, event: RouteEvent) {
        // Snapshot so a listener may subscribe others while being notified.
        let listeners: Vec<_> = self.listeners.borrow().iter().cloned().collect();
        log::debug!(
            "event=route_event module=events status=emit name={} listeners={}",
            event.name(),
            listeners.len()
        );
        for listener in listeners {
            listener.on_route_event(&event);
        }
    }
}

/// Listener that keeps every event it receives.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: RefCell<Vec<RouteEvent>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RouteEvent> {
        self.events.borrow().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.borrow().iter().map(RouteEvent::name).collect()
    }
}

impl RouteEventListener for RecordingListener {
    fn on_route_event(&self, event: &RouteEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
