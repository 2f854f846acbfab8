//! Model → view synchronization.
//!
//! The editor publishes `SyncEvent`s on a `SyncBus`; renderers and host
//! panels subscribe to them. Every event carries a `Scene`, a read-only view
//! of the current state, so listeners never hold on to the model.

use crate::backend::StoreError;
use gd_core::{GraphModel, NodeId, Point, RelationshipId};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// The model was replaced wholesale; listeners rebuild from scratch.
    GraphSwapped,
    /// Something visible changed; re-render from the current scene.
    RedrawRequested,
    ActiveNodeChanged(Option<NodeId>),
    ActiveRelationshipChanged(Option<RelationshipId>),
    /// A store call failed and its local effect was rolled back.
    PersistenceFailed(StoreError),
}

/// What listeners get to look at.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub model: &'a GraphModel,
    /// Working positions of an in-flight settling pass, if any.
    pub settling: Option<&'a [(NodeId, Point)]>,
}

impl<'a> Scene<'a> {
    pub fn new(model: &'a GraphModel) -> Self {
        Self {
            model,
            settling: None,
        }
    }

    /// Where `node` should be drawn: its settling position while a pass is
    /// running, its model position otherwise.
    pub fn position_of(&self, node: NodeId) -> Option<Point> {
        self.settling
            .and_then(|working| working.iter().find(|(id, _)| *id == node))
            .map(|(_, at)| *at)
            .or_else(|| self.model.node(node).map(|n| n.position))
    }
}

pub trait SyncListener {
    fn on_event(&mut self, event: &SyncEvent, scene: &Scene<'_>);
}

impl<F> SyncListener for F
where
    F: FnMut(&SyncEvent, &Scene<'_>),
{
    fn on_event(&mut self, event: &SyncEvent, scene: &Scene<'_>) {
        self(event, scene)
    }
}

/// A listener that records every event it sees. Clones share one log, so a
/// host can subscribe one clone and read through another.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<SyncEvent>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SyncEvent> {
        self.0.borrow().clone()
    }

    /// Drain the recorded events.
    pub fn take(&self) -> Vec<SyncEvent> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn count(&self, event: &SyncEvent) -> usize {
        self.0.borrow().iter().filter(|e| *e == event).count()
    }
}

impl SyncListener for EventLog {
    fn on_event(&mut self, event: &SyncEvent, _scene: &Scene<'_>) {
        self.0.borrow_mut().push(event.clone());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u32);

#[derive(Default)]
pub struct SyncBus {
    listeners: Vec<(SubscriptionId, Box<dyn SyncListener>)>,
    next_id: u32,
}

impl std::fmt::Debug for SyncBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl SyncBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl SyncListener + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver `event` to every listener in subscription order.
    pub fn emit(&mut self, event: &SyncEvent, scene: &Scene<'_>) {
        log::trace!("emit {event:?} to {} listener(s)", self.listeners.len());
        for (_, listener) in &mut self.listeners {
            listener.on_event(event, scene);
        }
    }
}
