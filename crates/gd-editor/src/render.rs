//! Render seam and hit testing.
//!
//! Drawing is done elsewhere; the editor only needs something that can redraw
//! a `Scene` and start over after a graph swap. `ViewBinding` plugs such a
//! service into the `SyncBus`.

use crate::bus::{Scene, SyncEvent, SyncListener};
use crate::input::DragTarget;
use gd_core::{Geometry, Point};
use std::cell::RefCell;
use std::rc::Rc;

/// Width of the connection ring drawn just outside a node's border.
pub const RING_WIDTH: f64 = 10.0;

pub trait RenderService {
    /// Drop any per-graph state. Called when the graph is swapped.
    fn reset(&mut self) {}

    /// Draw `scene`. Must be idempotent.
    fn render(&mut self, scene: &Scene<'_>);
}

impl<R: RenderService> RenderService for Rc<RefCell<R>> {
    fn reset(&mut self) {
        self.borrow_mut().reset();
    }

    fn render(&mut self, scene: &Scene<'_>) {
        self.borrow_mut().render(scene);
    }
}

/// Subscribes a `RenderService` to editor events.
#[derive(Debug)]
pub struct ViewBinding<R> {
    service: R,
}

impl<R: RenderService> ViewBinding<R> {
    pub fn new(service: R) -> Self {
        Self { service }
    }

    pub fn into_inner(self) -> R {
        self.service
    }
}

impl<R: RenderService> SyncListener for ViewBinding<R> {
    fn on_event(&mut self, event: &SyncEvent, scene: &Scene<'_>) {
        match event {
            SyncEvent::GraphSwapped => {
                self.service.reset();
                self.service.render(scene);
            }
            SyncEvent::RedrawRequested => self.service.render(scene),
            _ => {}
        }
    }
}

/// Find the affordance under `at`.
///
/// Nodes are checked topmost first (last created is drawn last). Inside the
/// inner radius is the body; from there out to the ring's outer edge is the
/// ring. Anything else is the free overlay.
pub fn hit_test(scene: &Scene<'_>, geometry: &dyn Geometry, at: Point) -> DragTarget {
    let nodes = scene.model.node_list();
    for node in nodes.into_iter().rev() {
        let center = scene.position_of(node.id()).unwrap_or(node.position);
        let distance = center.distance(at);
        if distance <= geometry.inner_radius(node) {
            return DragTarget::NodeBody(node.id());
        }
        if distance <= geometry.outer_radius(node) + RING_WIDTH {
            return DragTarget::Ring(node.id());
        }
    }
    DragTarget::Overlay
}
