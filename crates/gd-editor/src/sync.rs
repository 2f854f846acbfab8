//! The editor: one graph, its gestures, its settling pass, and its view.
//!
//! `Editor` is the single entry point for the host. Everything arrives one
//! call at a time through `&mut self`:
//!
//! - **Input**: pointer, double-click and key events via `handle_input`.
//! - **Timer**: `tick` advances an in-flight settling pass by one step.
//! - **Store**: `complete` reports the outcome of a `StoreRequest` sent by a
//!   live backend. Failures roll the local change back.
//!
//! Listeners on the `SyncBus` see exactly one `RedrawRequested` per visible
//! change and one `GraphSwapped` per model replacement.

use crate::backend::{
    GraphBackend, Persist, RequestId, StaticGraph, StoreError, StoreReply, StoreRequest,
};
use crate::bus::{Scene, SubscriptionId, SyncBus, SyncEvent, SyncListener};
use crate::config::EditorConfig;
use crate::drag::{Committed, DragController, DragSession};
use crate::input::{DragTarget, HitTarget, InputEvent};
use crate::render::hit_test;
use crate::settle::{SettleRun, SettleStatus};
use crate::shortcuts::{EditorAction, ShortcutMap};
use gd_core::{
    Geometry, GraphData, GraphModel, ModelError, NodeId, Point, Properties, RelationshipId,
    SnapResolver,
};
use std::collections::HashMap;

/// Zoom step applied to the internal scale by `ZoomIn` / `ZoomOut`.
const ZOOM_STEP: f64 = 1.25;

/// An element whose caption or properties an update overwrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Element {
    Node(NodeId),
    Relationship(RelationshipId),
}

/// The values an update replaced. Relationships have no caption.
#[derive(Debug, Clone)]
struct Overwritten {
    caption: Option<String>,
    properties: Properties,
}

/// A store request still waiting for its reply, with what is needed to undo
/// (or, for deletes, to apply) its local effect.
#[derive(Debug, Clone)]
enum PendingOp {
    AddNode(NodeId),
    DeleteNode(NodeId),
    Update {
        element: Element,
        overwritten: Overwritten,
        /// The pending update to the same element that this one was made on
        /// top of.
        prior: Option<RequestId>,
    },
}

pub struct Editor {
    model: GraphModel,
    config: EditorConfig,
    bus: SyncBus,
    drag: DragController,
    backend: Box<dyn GraphBackend>,
    geometry: Box<dyn Geometry>,
    settle: Option<SettleRun>,
    pending: HashMap<RequestId, PendingOp>,
    /// Newest pending update per element.
    latest_update: HashMap<Element, RequestId>,
    generation: u32,
    next_request: u64,
    active_node: Option<NodeId>,
    active_relationship: Option<RelationshipId>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    /// An editor on an empty in-memory graph.
    pub fn new(config: EditorConfig) -> Self {
        Self {
            model: GraphModel::new(),
            bus: SyncBus::new(),
            drag: DragController::new(SnapResolver::new(config.snap_threshold)),
            backend: Box::new(StaticGraph::new("untitled")),
            geometry: Box::new(config.geometry()),
            settle: None,
            pending: HashMap::new(),
            latest_update: HashMap::new(),
            generation: 0,
            next_request: 0,
            active_node: None,
            active_relationship: None,
            config,
        }
    }

    /// Replace the geometry service used for hit testing and settling radii.
    #[must_use]
    pub fn with_geometry(mut self, geometry: impl Geometry + 'static) -> Self {
        self.geometry = Box::new(geometry);
        self
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn active_node(&self) -> Option<NodeId> {
        self.active_node
    }

    pub fn active_relationship(&self) -> Option<RelationshipId> {
        self.active_relationship
    }

    pub fn drag_session(&self) -> &DragSession {
        self.drag.session()
    }

    pub fn settle_run(&self) -> Option<&SettleRun> {
        self.settle.as_ref()
    }

    pub fn is_settling(&self) -> bool {
        self.settle.is_some()
    }

    /// Number of store requests still waiting for a reply.
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    /// The current view of the graph, including in-flight settling positions.
    pub fn scene(&self) -> Scene<'_> {
        Scene {
            model: &self.model,
            settling: self.settle.as_ref().map(SettleRun::working),
        }
    }

    /// The drag affordance under a canvas point.
    pub fn drag_target_at(&self, at: Point) -> DragTarget {
        hit_test(&self.scene(), self.geometry.as_ref(), at)
    }

    // ─── Subscriptions ───────────────────────────────────────────────────

    pub fn subscribe(&mut self, listener: impl SyncListener + 'static) -> SubscriptionId {
        self.bus.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    fn emit(&mut self, event: SyncEvent) {
        let scene = Scene {
            model: &self.model,
            settling: self.settle.as_ref().map(SettleRun::working),
        };
        self.bus.emit(&event, &scene);
    }

    fn redraw(&mut self) {
        self.emit(SyncEvent::RedrawRequested);
    }

    // ─── Graph swap ──────────────────────────────────────────────────────

    /// Open `model` on a new backend.
    pub fn open(&mut self, model: GraphModel, backend: impl GraphBackend + 'static) {
        self.backend = Box::new(backend);
        self.swap_graph(model);
    }

    /// Build a model from graph data and swap it in.
    pub fn load(&mut self, data: &GraphData) -> Result<(), ModelError> {
        let model = data.to_model(self.config.viewport)?;
        self.swap_graph(model);
        Ok(())
    }

    /// Replace the model wholesale.
    ///
    /// The running gesture and settling pass are dropped without touching the
    /// new model, and replies to requests made for the old graph are ignored.
    /// The first node and relationship become active.
    pub fn swap_graph(&mut self, model: GraphModel) {
        self.drag.reset();
        self.settle = None;
        self.pending.clear();
        self.latest_update.clear();
        self.generation = self.generation.wrapping_add(1);
        self.model = model;
        log::info!(
            "{}: graph swapped in ({} nodes, {} relationships)",
            self.backend.name(),
            self.model.node_count(),
            self.model.relationship_count()
        );
        self.emit(SyncEvent::GraphSwapped);

        let first_node = self.model.nodes().next().map(|n| n.id());
        let first_relationship = self.model.relationships().next().map(|r| r.id());
        self.activate_node(first_node);
        self.activate_relationship(first_relationship);

        if self.backend.settles_on_load() {
            self.start_settling(None);
        }
    }

    // ─── Input ───────────────────────────────────────────────────────────

    pub fn handle_input(&mut self, event: &InputEvent) {
        match event {
            InputEvent::Key {
                key,
                ctrl,
                shift,
                alt,
                meta,
            } => {
                if let Some(action) = ShortcutMap::resolve(key, *ctrl, *shift, *alt, *meta) {
                    self.perform(action);
                }
            }
            InputEvent::DoubleClick { target } => match *target {
                HitTarget::Node(node) => {
                    self.set_active_node(Some(node));
                }
                HitTarget::Relationship(relationship) => {
                    self.set_active_relationship(Some(relationship));
                }
                HitTarget::Canvas => {}
            },
            _ => {
                // Settling stops where it is drawn, so the gesture starts
                // from the positions the user sees.
                if matches!(event, InputEvent::PointerDown { .. }) {
                    self.finish_settling();
                }
                let effect = self.drag.handle(event, &mut self.model);
                if effect.redraw {
                    self.redraw();
                }
                if let Some(committed) = effect.committed {
                    self.on_committed(committed);
                }
                self.refresh_active();
            }
        }
    }

    fn on_committed(&mut self, committed: Committed) {
        match committed {
            Committed::Node { node, .. } => self.persist_new_node(node),
            Committed::Relationship(relationship) => {
                log::debug!("{relationship} connected by ring drag");
            }
            Committed::Moved(node) => log::trace!("{node} moved"),
        }
    }

    pub fn perform(&mut self, action: EditorAction) {
        log::debug!("perform {action:?}");
        match action {
            EditorAction::AddNode => {
                if let Err(err) = self.add_node(None) {
                    log::warn!("cannot add node: {err}");
                }
            }
            EditorAction::DeleteActiveNode => {
                self.delete_active_node();
            }
            EditorAction::DeleteActiveRelationship => {
                self.delete_active_relationship();
            }
            EditorAction::ReverseActiveRelationship => {
                self.reverse_active_relationship();
            }
            EditorAction::ForceLayout => self.start_settling(None),
            EditorAction::ZoomIn => {
                self.set_internal_scale(self.model.internal_scale() * ZOOM_STEP);
            }
            EditorAction::ZoomOut => {
                self.set_internal_scale(self.model.internal_scale() / ZOOM_STEP);
            }
            EditorAction::Cancel => {
                if self.drag.cancel(&mut self.model).redraw {
                    self.redraw();
                }
                self.refresh_active();
            }
        }
    }

    // ─── Active elements ─────────────────────────────────────────────────

    /// Returns false for an unknown node.
    pub fn set_active_node(&mut self, node: Option<NodeId>) -> bool {
        if node.is_some_and(|id| !self.model.contains_node(id)) {
            return false;
        }
        self.activate_node(node);
        true
    }

    /// Returns false for an unknown relationship.
    pub fn set_active_relationship(&mut self, relationship: Option<RelationshipId>) -> bool {
        if relationship.is_some_and(|id| !self.model.contains_relationship(id)) {
            return false;
        }
        self.activate_relationship(relationship);
        true
    }

    fn activate_node(&mut self, node: Option<NodeId>) {
        if self.active_node != node {
            self.active_node = node;
            self.emit(SyncEvent::ActiveNodeChanged(node));
        }
    }

    fn activate_relationship(&mut self, relationship: Option<RelationshipId>) {
        if self.active_relationship != relationship {
            self.active_relationship = relationship;
            self.emit(SyncEvent::ActiveRelationshipChanged(relationship));
        }
    }

    /// Clear active elements that no longer exist.
    fn refresh_active(&mut self) {
        if self.active_node.is_some_and(|id| !self.model.contains_node(id)) {
            self.activate_node(None);
        }
        if self
            .active_relationship
            .is_some_and(|id| !self.model.contains_relationship(id))
        {
            self.activate_relationship(None);
        }
    }

    // ─── Structural edits ────────────────────────────────────────────────

    /// Add a node at `at` (the viewport center by default) and make it active.
    /// On a live graph the node is rolled back if the store refuses it.
    pub fn add_node(&mut self, at: Option<Point>) -> Result<NodeId, ModelError> {
        let at = at.unwrap_or_else(|| self.config.viewport.center());
        let node = self.model.create_node(at)?;
        log::debug!("add {node} at ({:.1}, {:.1})", at.x, at.y);
        self.activate_node(Some(node));
        self.persist_new_node(node);
        self.redraw();
        Ok(node)
    }

    fn next_request_id(&mut self) -> RequestId {
        self.next_request = self.next_request.wrapping_add(1);
        RequestId::new(self.generation, self.next_request)
    }

    fn persist_new_node(&mut self, node: NodeId) {
        let Some(n) = self.model.node(node) else {
            return;
        };
        let request = StoreRequest::AddNode {
            node,
            caption: n.caption.clone(),
            position: n.position,
            properties: n.properties.clone(),
        };
        let id = self.next_request_id();
        if self.backend.persist(id, request) == Persist::Pending {
            self.pending.insert(id, PendingOp::AddNode(node));
        }
    }

    /// Delete the active node and its relationships. On a live graph the
    /// deletion waits for the store to confirm it.
    pub fn delete_active_node(&mut self) -> bool {
        let Some(node) = self.active_node else {
            return false;
        };
        let store_id = self.model.node(node).and_then(|n| n.store_id);
        let id = self.next_request_id();
        match self.backend.persist(id, StoreRequest::DeleteNode { node, store_id }) {
            Persist::Done => self.remove_node(node),
            Persist::Pending => {
                self.pending.insert(id, PendingOp::DeleteNode(node));
            }
        }
        true
    }

    fn remove_node(&mut self, node: NodeId) {
        if let Some(removed) = self.model.delete_node(node) {
            log::debug!(
                "deleted {node} with {} relationship(s)",
                removed.relationships.len()
            );
            self.refresh_active();
            self.redraw();
        }
    }

    pub fn delete_active_relationship(&mut self) -> bool {
        let Some(relationship) = self.active_relationship else {
            return false;
        };
        if self.model.delete_relationship(relationship).is_none() {
            return false;
        }
        self.refresh_active();
        self.redraw();
        true
    }

    pub fn reverse_active_relationship(&mut self) -> bool {
        let Some(relationship) = self.active_relationship else {
            return false;
        };
        match self.model.reverse_relationship(relationship) {
            Ok(()) => {
                self.redraw();
                true
            }
            Err(err) => {
                log::warn!("cannot reverse: {err}");
                false
            }
        }
    }

    /// Set a node's caption and properties. The store receives the previous
    /// caption as well. If it refuses, the old values come back unless a
    /// later update to the node has already replaced them.
    pub fn update_node(
        &mut self,
        node: NodeId,
        caption: impl Into<String>,
        properties: Properties,
    ) -> Result<(), ModelError> {
        let n = self
            .model
            .node_mut(node)
            .ok_or(ModelError::UnknownNode(node))?;
        let caption = caption.into();
        let previous_caption = std::mem::replace(&mut n.caption, caption.clone());
        let previous_properties = std::mem::replace(&mut n.properties, properties.clone());
        let store_id = n.store_id;
        self.redraw();

        let request = StoreRequest::UpdateNode {
            node,
            store_id,
            caption,
            previous_caption: previous_caption.clone(),
            properties,
        };
        let id = self.next_request_id();
        if self.backend.persist(id, request) == Persist::Pending {
            self.track_update(
                id,
                Element::Node(node),
                Overwritten {
                    caption: Some(previous_caption),
                    properties: previous_properties,
                },
            );
        }
        Ok(())
    }

    pub fn update_relationship(
        &mut self,
        relationship: RelationshipId,
        properties: Properties,
    ) -> Result<(), ModelError> {
        let rel = self
            .model
            .relationship_mut(relationship)
            .ok_or(ModelError::UnknownRelationship(relationship))?;
        let previous = std::mem::replace(&mut rel.properties, properties.clone());
        let store_id = rel.store_id;
        self.redraw();

        let request = StoreRequest::UpdateRelationship {
            relationship,
            store_id,
            properties,
        };
        let id = self.next_request_id();
        if self.backend.persist(id, request) == Persist::Pending {
            self.track_update(
                id,
                Element::Relationship(relationship),
                Overwritten {
                    caption: None,
                    properties: previous,
                },
            );
        }
        Ok(())
    }

    fn track_update(&mut self, id: RequestId, element: Element, overwritten: Overwritten) {
        let prior = self.latest_update.insert(element, id);
        self.pending.insert(
            id,
            PendingOp::Update {
                element,
                overwritten,
                prior,
            },
        );
    }

    /// The pending update made directly on top of `request`, if any.
    fn successor_of(
        &mut self,
        request: RequestId,
    ) -> Option<(&mut Overwritten, &mut Option<RequestId>)> {
        self.pending.values_mut().find_map(|op| match op {
            PendingOp::Update {
                overwritten,
                prior,
                ..
            } if *prior == Some(request) => Some((overwritten, prior)),
            _ => None,
        })
    }

    fn update_accepted(&mut self, request: RequestId, element: Element) {
        if self.latest_update.get(&element) == Some(&request) {
            self.latest_update.remove(&element);
        }
        // The store now holds this update's values, which is what the next
        // update would restore on failure.
        if let Some((_, prior)) = self.successor_of(request) {
            *prior = None;
        }
    }

    fn update_refused(
        &mut self,
        request: RequestId,
        element: Element,
        overwritten: Overwritten,
        prior: Option<RequestId>,
    ) {
        if self.latest_update.get(&element) != Some(&request) {
            // A later update replaced these values locally; it inherits what
            // this one would have restored.
            if let Some((next_overwritten, next_prior)) = self.successor_of(request) {
                *next_overwritten = overwritten;
                *next_prior = prior;
            }
            log::debug!("{request} superseded, keeping current values");
            return;
        }
        match prior {
            Some(prior) => self.latest_update.insert(element, prior),
            None => self.latest_update.remove(&element),
        };
        let restored = match element {
            Element::Node(node) => self.model.node_mut(node).map(|n| {
                if let Some(caption) = overwritten.caption {
                    n.caption = caption;
                }
                n.properties = overwritten.properties;
            }),
            Element::Relationship(relationship) => self
                .model
                .relationship_mut(relationship)
                .map(|rel| rel.properties = overwritten.properties),
        };
        if restored.is_some() {
            self.redraw();
        }
    }

    /// Returns false (and changes nothing) for a non-finite or non-positive
    /// scale.
    pub fn set_internal_scale(&mut self, scale: f64) -> bool {
        if !self.model.set_internal_scale(scale) {
            return false;
        }
        self.redraw();
        true
    }

    // ─── Store replies ───────────────────────────────────────────────────

    /// Apply the store's answer to an earlier request.
    pub fn complete(&mut self, request: RequestId, result: Result<StoreReply, StoreError>) {
        if request.generation != self.generation {
            log::warn!("ignoring reply to {request} made for an earlier graph");
            return;
        }
        let Some(op) = self.pending.remove(&request) else {
            log::warn!("ignoring reply to unknown or stale {request}");
            return;
        };

        let error = match (op, result) {
            (PendingOp::AddNode(node), Ok(StoreReply::NodeAdded { store_id })) => {
                if let Some(n) = self.model.node_mut(node) {
                    n.store_id = Some(store_id);
                    self.redraw();
                }
                return;
            }
            (PendingOp::DeleteNode(node), Ok(_)) => {
                self.remove_node(node);
                return;
            }
            (PendingOp::Update { element, .. }, Ok(_)) => {
                self.update_accepted(request, element);
                return;
            }
            (PendingOp::AddNode(node), Ok(reply)) => {
                log::warn!("unexpected reply {reply:?} for new node {node}");
                return;
            }
            (PendingOp::AddNode(node), Err(err)) => {
                log::warn!("store refused new node {node}: {err}");
                self.model.delete_node(node);
                self.refresh_active();
                self.redraw();
                err
            }
            (PendingOp::DeleteNode(node), Err(err)) => {
                log::warn!("store refused to delete {node}: {err}");
                err
            }
            (
                PendingOp::Update {
                    element,
                    overwritten,
                    prior,
                },
                Err(err),
            ) => {
                log::warn!("store refused update {request}: {err}");
                self.update_refused(request, element, overwritten, prior);
                err
            }
        };
        self.emit(SyncEvent::PersistenceFailed(error));
    }

    // ─── Settling ────────────────────────────────────────────────────────

    /// Start a settling pass over the whole graph. A pass already in flight
    /// is committed first. `max_ticks` overrides the configured cap.
    pub fn start_settling(&mut self, max_ticks: Option<u32>) {
        self.finish_settling();
        let mut config = self.config.settle.clone();
        if let Some(cap) = max_ticks {
            config.max_ticks = cap;
        }
        self.settle = Some(SettleRun::start(
            &self.model,
            self.geometry.as_ref(),
            self.config.viewport,
            &config,
        ));
    }

    /// Advance the settling pass by one tick. Returns `None` when no pass is
    /// in flight. The tick that finishes the pass also commits it.
    pub fn tick(&mut self) -> Option<SettleStatus> {
        let run = self.settle.as_mut()?;
        let before = run.ticks();
        let status = run.tick();
        if run.ticks() != before {
            self.redraw();
        }
        if status == SettleStatus::Finished {
            self.finish_settling();
        }
        Some(status)
    }

    /// Commit the pass in flight, if any, at its current positions.
    fn finish_settling(&mut self) {
        if let Some(run) = self.settle.take() {
            run.commit(&mut self.model);
            self.redraw();
        }
    }

    /// Tick until the pass finishes. Returns the number of ticks taken.
    pub fn settle_to_completion(&mut self) -> u32 {
        let mut ticks = 0;
        while let Some(run) = &self.settle {
            // A run still held by the editor has not ended, so it steps
            // unless it is already at its cap.
            if run.ticks() < run.max_ticks() {
                ticks += 1;
            }
            if self.tick() != Some(SettleStatus::Running) {
                break;
            }
        }
        ticks
    }
}
