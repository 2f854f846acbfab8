//! Graph data as handed over by a graph source (a loaded file or a store
//! query result), and its conversion into a fresh `GraphModel`.

use crate::error::{DataError, ModelError};
use crate::id::StoreId;
use crate::layout::{Viewport, circle_slot};
use crate::model::{GraphModel, Properties};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Radius of the seed circle for nodes that arrive without a position.
const SEED_RADIUS: f64 = 150.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<NodeData>,
    #[serde(default)]
    pub relationships: Vec<RelationshipData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub id: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipData {
    #[serde(default)]
    pub id: Option<String>,
    pub start: String,
    pub end: String,
    #[serde(default, rename = "type")]
    pub rel_type: String,
    #[serde(default)]
    pub properties: Properties,
}

impl NodeData {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            caption: String::new(),
            x: None,
            y: None,
            properties: Properties::new(),
        }
    }

    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }
}

impl RelationshipData {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            id: None,
            start: start.into(),
            end: end.into(),
            rel_type: String::new(),
            properties: Properties::new(),
        }
    }
}

impl GraphData {
    pub fn from_json(text: &str) -> Result<Self, DataError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse `text` and build a model from it in one go.
    pub fn load(text: &str, viewport: Viewport) -> Result<GraphModel, DataError> {
        Ok(Self::from_json(text)?.to_model(viewport)?)
    }

    /// Build a model from this data.
    ///
    /// Nodes keep their data id as `store_id`. Nodes without a position are
    /// spread on a circle around the viewport center. Relationships joining a
    /// node to itself are skipped; relationships naming an unknown node fail.
    pub fn to_model(&self, viewport: Viewport) -> Result<GraphModel, ModelError> {
        let mut model = GraphModel::new();
        let mut by_data_id = HashMap::with_capacity(self.nodes.len());

        let unplaced = self
            .nodes
            .iter()
            .filter(|n| n.x.is_none() || n.y.is_none())
            .count();
        let mut slot = 0;

        for data in &self.nodes {
            let at = match (data.x, data.y) {
                (Some(x), Some(y)) => Point::new(x, y),
                _ => {
                    let p = circle_slot(slot, unplaced, viewport.center(), SEED_RADIUS);
                    slot += 1;
                    p
                }
            };
            let id = model.create_node(at)?;
            if let Some(node) = model.node_mut(id) {
                node.store_id = Some(StoreId::intern(&data.id));
                node.caption = data.caption.clone();
                node.properties = data.properties.clone();
            }
            by_data_id.insert(data.id.as_str(), id);
        }

        for (i, data) in self.relationships.iter().enumerate() {
            let name = data.id.clone().unwrap_or_else(|| format!("#{i}"));
            let lookup = |key: &str| {
                by_data_id
                    .get(key)
                    .copied()
                    .ok_or_else(|| ModelError::MissingEndpoint {
                        relationship: name.clone(),
                        node: key.to_string(),
                    })
            };
            let start = lookup(&data.start)?;
            let end = lookup(&data.end)?;
            if start == end {
                log::warn!("skipping self-loop relationship {name} on {}", data.start);
                continue;
            }
            let id = model.create_relationship(start, end)?;
            if let Some(rel) = model.relationship_mut(id) {
                rel.store_id = data.id.as_deref().map(StoreId::intern);
                rel.rel_type = data.rel_type.clone();
                rel.properties = data.properties.clone();
            }
        }

        log::debug!(
            "built model with {} node(s), {} relationship(s)",
            model.node_count(),
            model.relationship_count()
        );
        Ok(model)
    }
}
