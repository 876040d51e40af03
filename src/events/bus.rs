//! Typed publish/subscribe channel between the simulation subsystems
//!
//! Published events are queued and fanned out by the level in a fixed
//! subsystem order (aggregate -> influence -> scoring). External listeners
//! (logging, HUD, audio) are called synchronously at publish time in
//! registration order.

use std::collections::VecDeque;
use std::fmt;

use crate::core::types::{EventId, StudentId};
use crate::events::notification::Notification;
use crate::events::types::ClassroomEvent;

/// Message handed to external listeners
#[derive(Debug, Clone, Copy)]
pub enum BusMessage<'a> {
    Event(&'a ClassroomEvent),
    Notification(&'a Notification),
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub usize);

type Listener = Box<dyn FnMut(BusMessage<'_>)>;

pub struct EventBus {
    pending: VecDeque<ClassroomEvent>,
    history: VecDeque<ClassroomEvent>,
    history_capacity: usize,
    notifications: Vec<Notification>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: usize,
    published: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_history_capacity(256)
    }

    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            history: VecDeque::with_capacity(capacity),
            history_capacity: capacity,
            notifications: Vec::new(),
            listeners: Vec::new(),
            next_listener: 0,
            published: 0,
        }
    }

    /// Register an external listener; listeners fire in registration order
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(BusMessage<'_>) + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Publish a behavioral event, stamping it with the next sequential id
    pub fn publish(&mut self, mut event: ClassroomEvent) {
        self.published += 1;
        event.id = EventId::from_sequence(self.published);
        tracing::debug!(
            source = %event.source,
            event_type = %event.event_type,
            t = event.timestamp,
            "event published"
        );
        for (_, listener) in self.listeners.iter_mut() {
            listener(BusMessage::Event(&event));
        }
        if self.history_capacity > 0 {
            if self.history.len() >= self.history_capacity {
                self.history.pop_front();
            }
            self.history.push_back(event.clone());
        }
        self.pending.push_back(event);
    }

    /// Publish a state-change notification
    pub fn notify(&mut self, notification: Notification) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(BusMessage::Notification(&notification));
        }
        self.notifications.push(notification);
    }

    /// Next event awaiting subsystem dispatch
    pub fn next_pending(&mut self) -> Option<ClassroomEvent> {
        self.pending.pop_front()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Notifications accumulated since the last drain
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Recently published events, oldest first
    pub fn history(&self) -> impl Iterator<Item = &ClassroomEvent> {
        self.history.iter()
    }

    pub fn events_by_source(&self, source: StudentId) -> impl Iterator<Item = &ClassroomEvent> {
        self.history.iter().filter(move |e| e.source == source)
    }

    /// Total events published since the last reset
    pub fn published_count(&self) -> u64 {
        self.published
    }

    /// Drop queued events, history and notifications; listeners stay registered
    pub fn reset(&mut self) {
        self.pending.clear();
        self.history.clear();
        self.notifications.clear();
        self.published = 0;
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("pending", &self.pending.len())
            .field("history", &self.history.len())
            .field("notifications", &self.notifications.len())
            .field("listeners", &self.listeners.len())
            .field("published", &self.published)
            .finish()
    }
}
