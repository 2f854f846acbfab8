//! Graph model for node/relationship diagrams.
//!
//! Nodes live in a `petgraph` stable graph and relationships are its edges,
//! so removing a node drops every edge touching it in the same call. Local
//! ids are minted in creation order and indexed through `BTreeMap`s, which
//! gives the deterministic iteration order used for render layering and the
//! snap tie-break.

use crate::error::{ModelError, Result};
use crate::id::{NodeId, RelationshipId, StoreId};
use kurbo::{Point, Vec2};
use petgraph::Direction;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;

// ─── Properties ──────────────────────────────────────────────────────────

/// A scalar property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for PropertyValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Property map, ordered by key.
pub type Properties = BTreeMap<String, PropertyValue>;

// ─── Elements ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    /// Assigned by a remote store; `None` until the store answers.
    pub store_id: Option<StoreId>,
    pub caption: String,
    pub position: Point,
    pub properties: Properties,
}

impl Node {
    fn new(id: NodeId, position: Point) -> Self {
        Self {
            id,
            store_id: None,
            caption: String::new(),
            position,
            properties: Properties::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Euclidean distance between the two node centers.
    pub fn distance_to(&self, other: &Node) -> f64 {
        self.position.distance(other.position)
    }

    /// Shift the node by an incremental pointer delta.
    pub fn drag(&mut self, delta: Vec2) {
        self.position += delta;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    id: RelationshipId,
    start: NodeId,
    end: NodeId,
    pub store_id: Option<StoreId>,
    pub rel_type: String,
    pub properties: Properties,
}

impl Relationship {
    fn new(id: RelationshipId, start: NodeId, end: NodeId) -> Self {
        Self {
            id,
            start,
            end,
            store_id: None,
            rel_type: String::new(),
            properties: Properties::new(),
        }
    }

    pub fn id(&self) -> RelationshipId {
        self.id
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn end(&self) -> NodeId {
        self.end
    }

    /// Whether `node` is either endpoint.
    pub fn touches(&self, node: NodeId) -> bool {
        self.start == node || self.end == node
    }
}

/// A node removed from the model together with the relationships that were
/// cascade-deleted with it (sorted by id).
#[derive(Debug, Clone)]
pub struct RemovedNode {
    pub node: Node,
    pub relationships: SmallVec<[Relationship; 4]>,
}

// ─── Graph Model ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GraphModel {
    graph: StableDiGraph<Node, Relationship>,
    nodes: BTreeMap<NodeId, NodeIndex>,
    relationships: BTreeMap<RelationshipId, EdgeIndex>,
    internal_scale: f64,
    next_node: u32,
    next_relationship: u32,
}

impl Default for GraphModel {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphModel {
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
            nodes: BTreeMap::new(),
            relationships: BTreeMap::new(),
            internal_scale: 1.0,
            next_node: 0,
            next_relationship: 0,
        }
    }

    // ─── Mutation ────────────────────────────────────────────────────────

    /// Create a node at `at` and return its id.
    pub fn create_node(&mut self, at: Point) -> Result<NodeId> {
        let id = NodeId(self.next_node);
        self.next_node = self
            .next_node
            .checked_add(1)
            .ok_or(ModelError::IdsExhausted("node"))?;
        let idx = self.graph.add_node(Node::new(id, at));
        self.nodes.insert(id, idx);
        Ok(id)
    }

    /// Connect `start` → `end`. Both nodes must exist and differ.
    pub fn create_relationship(&mut self, start: NodeId, end: NodeId) -> Result<RelationshipId> {
        if start == end {
            return Err(ModelError::SelfLoop(start));
        }
        let s = self.index_of(start)?;
        let e = self.index_of(end)?;
        let id = RelationshipId(self.next_relationship);
        self.next_relationship = self
            .next_relationship
            .checked_add(1)
            .ok_or(ModelError::IdsExhausted("relationship"))?;
        let edge = self.graph.add_edge(s, e, Relationship::new(id, start, end));
        self.relationships.insert(id, edge);
        Ok(id)
    }

    /// Remove a node and every relationship touching it.
    pub fn delete_node(&mut self, id: NodeId) -> Option<RemovedNode> {
        let idx = self.nodes.remove(&id)?;
        let touching: Vec<EdgeIndex> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|e| e.id())
            .collect();

        let mut relationships: SmallVec<[Relationship; 4]> = SmallVec::new();
        for edge in touching {
            if let Some(rel) = self.graph.remove_edge(edge) {
                self.relationships.remove(&rel.id);
                relationships.push(rel);
            }
        }
        relationships.sort_by_key(|r| r.id);

        let node = self.graph.remove_node(idx)?;
        log::trace!(
            "deleted node {id} with {} relationship(s)",
            relationships.len()
        );
        Some(RemovedNode {
            node,
            relationships,
        })
    }

    pub fn delete_relationship(&mut self, id: RelationshipId) -> Option<Relationship> {
        let edge = self.relationships.remove(&id)?;
        self.graph.remove_edge(edge)
    }

    /// Repoint the end of a relationship, keeping its id, type, and properties.
    pub fn set_relationship_end(&mut self, id: RelationshipId, end: NodeId) -> Result<()> {
        let edge = self.edge_of(id)?;
        let current = &self.graph[edge];
        if current.end == end {
            return Ok(());
        }
        if current.start == end {
            return Err(ModelError::SelfLoop(end));
        }
        let s = self.index_of(current.start)?;
        let e = self.index_of(end)?;
        self.rewire(id, edge, s, e, |rel| rel.end = end);
        Ok(())
    }

    /// Swap the direction of a relationship.
    pub fn reverse_relationship(&mut self, id: RelationshipId) -> Result<()> {
        let edge = self.edge_of(id)?;
        let (s, e) = self
            .graph
            .edge_endpoints(edge)
            .ok_or(ModelError::UnknownRelationship(id))?;
        self.rewire(id, edge, e, s, |rel| {
            std::mem::swap(&mut rel.start, &mut rel.end);
        });
        Ok(())
    }

    fn rewire(
        &mut self,
        id: RelationshipId,
        edge: EdgeIndex,
        from: NodeIndex,
        to: NodeIndex,
        update: impl FnOnce(&mut Relationship),
    ) {
        if let Some(mut rel) = self.graph.remove_edge(edge) {
            update(&mut rel);
            let new_edge = self.graph.add_edge(from, to, rel);
            self.relationships.insert(id, new_edge);
        }
    }

    /// Apply an incremental delta to a node. Returns false for unknown nodes.
    pub fn move_node(&mut self, id: NodeId, delta: Vec2) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.drag(delta);
                true
            }
            None => false,
        }
    }

    pub fn set_node_position(&mut self, id: NodeId, at: Point) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.position = at;
                true
            }
            None => false,
        }
    }

    pub fn internal_scale(&self) -> f64 {
        self.internal_scale
    }

    /// Set the uniform scale applied to on-screen distance comparisons.
    /// Non-finite or non-positive values are ignored.
    pub fn set_internal_scale(&mut self, scale: f64) -> bool {
        if !scale.is_finite() || scale <= 0.0 {
            log::warn!("ignoring internal scale {scale}");
            return false;
        }
        self.internal_scale = scale;
        true
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get(&id).copied().map(|idx| &mut self.graph[idx])
    }

    pub fn relationship(&self, id: RelationshipId) -> Option<&Relationship> {
        self.relationships.get(&id).map(|edge| &self.graph[*edge])
    }

    pub fn relationship_mut(&mut self, id: RelationshipId) -> Option<&mut Relationship> {
        self.relationships
            .get(&id)
            .copied()
            .map(|edge| &mut self.graph[edge])
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn contains_relationship(&self, id: RelationshipId) -> bool {
        self.relationships.contains_key(&id)
    }

    /// Nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values().map(|idx| &self.graph[*idx])
    }

    /// Relationships in creation order.
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> + '_ {
        self.relationships.values().map(|edge| &self.graph[*edge])
    }

    pub fn node_list(&self) -> Vec<&Node> {
        self.nodes().collect()
    }

    pub fn relationship_list(&self) -> Vec<&Relationship> {
        self.relationships().collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of every relationship touching `node`, sorted.
    pub fn relationships_of(&self, node: NodeId) -> Vec<RelationshipId> {
        let Some(&idx) = self.nodes.get(&node) else {
            return Vec::new();
        };
        let mut ids: Vec<RelationshipId> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|e| e.weight().id)
            .collect();
        ids.sort();
        ids
    }

    /// Find a node by the id a store (or loaded data) gave it.
    pub fn node_by_store_id(&self, store_id: StoreId) -> Option<NodeId> {
        self.nodes()
            .find(|n| n.store_id == Some(store_id))
            .map(|n| n.id)
    }

    /// Verify that every relationship joins two distinct live nodes.
    pub fn check_integrity(&self) -> Result<()> {
        for (&id, &edge) in &self.relationships {
            let rel = self
                .graph
                .edge_weight(edge)
                .ok_or(ModelError::UnknownRelationship(id))?;
            let (s, e) = self
                .graph
                .edge_endpoints(edge)
                .ok_or(ModelError::UnknownRelationship(id))?;
            if rel.start == rel.end {
                return Err(ModelError::SelfLoop(rel.start));
            }
            for (endpoint, idx) in [(rel.start, s), (rel.end, e)] {
                if self.nodes.get(&endpoint) != Some(&idx) {
                    return Err(ModelError::MissingEndpoint {
                        relationship: id.to_string(),
                        node: endpoint.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn index_of(&self, id: NodeId) -> Result<NodeIndex> {
        self.nodes
            .get(&id)
            .copied()
            .ok_or(ModelError::UnknownNode(id))
    }

    fn edge_of(&self, id: RelationshipId) -> Result<EdgeIndex> {
        self.relationships
            .get(&id)
            .copied()
            .ok_or(ModelError::UnknownRelationship(id))
    }
}
