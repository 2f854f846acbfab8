//! Graph backends.
//!
//! A `StaticGraph` lives only in memory, so every change is final as soon as
//! it is applied. A `LiveGraph` mirrors a remote store: changes go out as
//! `StoreRequest`s and the host reports the outcome later through
//! `Editor::complete`.
//!
//! Request ids are minted by the editor, not the store. Each id carries the
//! generation of the graph it was made for, so a reply that arrives after the
//! graph was swapped out cannot be mistaken for one meant for the new graph.

use gd_core::{NodeId, Point, Properties, RelationshipId, StoreId};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId {
    /// Bumped every time the editor swaps in a new graph.
    pub generation: u32,
    pub seq: u64,
}

impl RequestId {
    pub fn new(generation: u32, seq: u64) -> Self {
        Self { generation, seq }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req#{}.{}", self.generation, self.seq)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreRequest {
    AddNode {
        node: NodeId,
        caption: String,
        position: Point,
        properties: Properties,
    },
    DeleteNode {
        node: NodeId,
        store_id: Option<StoreId>,
    },
    UpdateNode {
        node: NodeId,
        store_id: Option<StoreId>,
        caption: String,
        /// The caption before the edit, so the store can relabel.
        previous_caption: String,
        properties: Properties,
    },
    UpdateRelationship {
        relationship: RelationshipId,
        store_id: Option<StoreId>,
        properties: Properties,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreReply {
    /// The store created the node and assigned it an identity.
    NodeAdded { store_id: StoreId },
    Ack,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("store rejected the request: {0}")]
    Rejected(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Transport to a remote graph store. The reply to `request` is reported
/// back under `id`.
pub trait GraphStore {
    fn submit(&mut self, id: RequestId, request: StoreRequest);
}

/// Whether a change is final or waiting on the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persist {
    Done,
    Pending,
}

pub trait GraphBackend {
    fn name(&self) -> &str;

    /// Run a settling pass right after a graph is loaded.
    fn settles_on_load(&self) -> bool {
        false
    }

    fn persist(&mut self, id: RequestId, request: StoreRequest) -> Persist;
}

/// An in-memory graph, e.g. one loaded from a file.
#[derive(Debug, Clone, Default)]
pub struct StaticGraph {
    name: String,
}

impl StaticGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl GraphBackend for StaticGraph {
    fn name(&self) -> &str {
        &self.name
    }

    fn persist(&mut self, _id: RequestId, _request: StoreRequest) -> Persist {
        Persist::Done
    }
}

/// A graph backed by a remote store.
#[derive(Debug, Clone)]
pub struct LiveGraph<S> {
    name: String,
    store: S,
}

impl<S: GraphStore> LiveGraph<S> {
    pub fn new(name: impl Into<String>, store: S) -> Self {
        Self {
            name: name.into(),
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: GraphStore> GraphBackend for LiveGraph<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn settles_on_load(&self) -> bool {
        true
    }

    fn persist(&mut self, id: RequestId, request: StoreRequest) -> Persist {
        self.store.submit(id, request);
        log::debug!("{}: submitted {id}", self.name);
        Persist::Pending
    }
}

/// A store that only queues requests. Clones share the queue, so the host
/// (or a test) keeps one handle and answers requests at its own pace.
#[derive(Debug, Clone, Default)]
pub struct QueuedStore {
    queue: Rc<RefCell<VecDeque<(RequestId, StoreRequest)>>>,
}

impl QueuedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every request submitted so far, oldest first.
    pub fn drain(&self) -> Vec<(RequestId, StoreRequest)> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl GraphStore for QueuedStore {
    fn submit(&mut self, id: RequestId, request: StoreRequest) {
        self.queue.borrow_mut().push_back((id, request));
    }
}
