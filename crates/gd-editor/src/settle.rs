//! Bounded settling pass.
//!
//! A `SettleRun` seeds a `force_graph` simulation from the model, steps it one
//! tick at a time, and writes the final positions back with `commit`.
//! Consuming `commit` means a run can complete at most once.
//!
//! Forces come from the integrator: pairwise repulsion weighted by node mass
//! (sized from the collision radius) and springs along relationships. Every
//! node is also tied by a spring to an anchored hub at the viewport center,
//! which keeps the layout from drifting off the canvas.

use crate::config::SettleConfig;
use force_graph::{EdgeData, ForceGraph, NodeData};
use gd_core::{Geometry, GraphModel, NodeId, Point, Viewport};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleStatus {
    Running,
    Finished,
}

pub struct SettleRun {
    /// Simulation nodes carry their model id; the hub carries `None`.
    graph: ForceGraph<Option<NodeId>, ()>,
    /// Working position per model node, in creation order.
    working: Vec<(NodeId, Point)>,
    time_step: f32,
    rest_distance: f64,
    ticks: u32,
    max_ticks: u32,
    ended: bool,
}

impl fmt::Debug for SettleRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettleRun")
            .field("nodes", &self.working.len())
            .field("ticks", &self.ticks)
            .field("max_ticks", &self.max_ticks)
            .field("ended", &self.ended)
            .finish_non_exhaustive()
    }
}

impl SettleRun {
    /// Seed a run from the model's current nodes and relationships.
    ///
    /// Each node is sized at twice its inner radius so settled nodes keep a
    /// visible gap.
    pub fn start(
        model: &GraphModel,
        geometry: &dyn Geometry,
        viewport: Viewport,
        config: &SettleConfig,
    ) -> Self {
        let mut graph = ForceGraph::new(config.parameters());
        let center = viewport.center();
        let hub = graph.add_node(NodeData {
            x: center.x as f32,
            y: center.y as f32,
            mass: 0.0,
            is_anchor: true,
            user_data: None,
        });

        let mut index = HashMap::with_capacity(model.node_count());
        let mut working = Vec::with_capacity(model.node_count());
        for node in model.nodes() {
            let collision_radius = 2.0 * geometry.inner_radius(node);
            let idx = graph.add_node(NodeData {
                x: node.position.x as f32,
                y: node.position.y as f32,
                mass: collision_radius as f32 * config.mass_per_radius,
                is_anchor: false,
                user_data: Some(node.id()),
            });
            graph.add_edge(hub, idx, EdgeData::default());
            index.insert(node.id(), idx);
            working.push((node.id(), node.position));
        }

        let mut links = 0;
        for rel in model.relationships() {
            if let (Some(&start), Some(&end)) = (index.get(&rel.start()), index.get(&rel.end())) {
                graph.add_edge(start, end, EdgeData::default());
                links += 1;
            }
        }

        log::debug!(
            "settle run over {} node(s), {links} link(s), cap {}",
            working.len(),
            config.max_ticks
        );
        Self {
            graph,
            working,
            time_step: config.time_step,
            rest_distance: config.rest_distance,
            ticks: 0,
            max_ticks: config.max_ticks,
            ended: false,
        }
    }

    /// Advance one tick. Returns `Finished` on the tick that hits the cap or
    /// comes to rest, and on every call after that.
    pub fn tick(&mut self) -> SettleStatus {
        if self.ended {
            return SettleStatus::Finished;
        }
        if self.ticks >= self.max_ticks {
            self.ended = true;
            return SettleStatus::Finished;
        }

        self.graph.update(self.time_step);
        self.ticks += 1;

        let mut stepped = HashMap::with_capacity(self.working.len());
        self.graph.visit_nodes(|node| {
            if let Some(id) = node.data.user_data {
                stepped.insert(id, Point::new(node.x() as f64, node.y() as f64));
            }
        });
        let mut farthest: f64 = 0.0;
        for (id, at) in &mut self.working {
            // A diverged node keeps its last finite position.
            if let Some(&next) = stepped.get(id)
                && next.is_finite()
            {
                farthest = farthest.max(at.distance(next));
                *at = next;
            }
        }
        log::trace!(
            "settle tick {}/{}, largest step {farthest:.3}",
            self.ticks,
            self.max_ticks
        );

        if farthest < self.rest_distance || self.ticks >= self.max_ticks {
            self.ended = true;
            SettleStatus::Finished
        } else {
            SettleStatus::Running
        }
    }

    pub fn is_finished(&self) -> bool {
        self.ended
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn max_ticks(&self) -> u32 {
        self.max_ticks
    }

    /// Current working positions, for drawing while the run is in flight.
    pub fn working(&self) -> &[(NodeId, Point)] {
        &self.working
    }

    /// Copy the working positions into the model. Nodes deleted while the run
    /// was in flight are skipped. Returns how many nodes were updated.
    pub fn commit(self, model: &mut GraphModel) -> usize {
        let updated = self
            .working
            .iter()
            .filter(|(id, at)| model.set_node_position(*id, *at))
            .count();
        log::info!("settled {updated} node(s) after {} tick(s)", self.ticks);
        updated
    }
}
