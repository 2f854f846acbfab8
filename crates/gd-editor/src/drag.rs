//! Drag gestures on the canvas.
//!
//! The controller owns one `DragSession` and turns pointer events into model
//! mutations. It reports what happened as a `DragEffect`; redraws and
//! persistence are left to the caller.
//!
//! ## Affordances
//!
//! | Target | Move | Release |
//! |--------|------|---------|
//! | **Node body** | Translate node by pointer delta | Nothing to resolve |
//! | **Ring** | Grow a provisional node + relationship, snap the end | Keep or drop the provisional node |
//! | **Overlay** | Track pointer | Shared resolution |

use crate::input::{DragTarget, InputEvent};
use gd_core::{GraphModel, ModelError, NodeId, Point, RelationshipId, SnapResolver};

/// A node and relationship created by a ring drag that has not been released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provisional {
    pub node: NodeId,
    pub relationship: RelationshipId,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragSession {
    #[default]
    Idle,
    Node {
        node: NodeId,
        last: Point,
        moved: bool,
    },
    Ring {
        anchor: NodeId,
        last: Point,
        provisional: Option<Provisional>,
    },
    Overlay {
        last: Point,
    },
}

impl DragSession {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn provisional(&self) -> Option<Provisional> {
        match self {
            Self::Ring { provisional, .. } => *provisional,
            _ => None,
        }
    }
}

/// Structural outcome of a finished gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Committed {
    /// A ring drag released over empty space: new node plus relationship.
    Node {
        node: NodeId,
        relationship: RelationshipId,
    },
    /// A ring drag released over an existing node.
    Relationship(RelationshipId),
    /// A node body drag that moved the node.
    Moved(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DragEffect {
    /// The model or the gesture overlay changed; one redraw is due.
    pub redraw: bool,
    pub committed: Option<Committed>,
}

impl DragEffect {
    const NONE: Self = Self {
        redraw: false,
        committed: None,
    };

    const REDRAW: Self = Self {
        redraw: true,
        committed: None,
    };
}

#[derive(Debug, Clone, Default)]
pub struct DragController {
    session: DragSession,
    resolver: SnapResolver,
}

impl DragController {
    pub fn new(resolver: SnapResolver) -> Self {
        Self {
            session: DragSession::Idle,
            resolver,
        }
    }

    pub fn session(&self) -> &DragSession {
        &self.session
    }

    pub fn resolver(&self) -> &SnapResolver {
        &self.resolver
    }

    /// Handle a pointer event. Other events are ignored.
    pub fn handle(&mut self, event: &InputEvent, model: &mut GraphModel) -> DragEffect {
        match *event {
            InputEvent::PointerDown { x, y, target } => self.begin(target, Point::new(x, y), model),
            InputEvent::PointerMove { x, y } => self.drag_to(Point::new(x, y), model),
            InputEvent::PointerUp { .. } => self.end(model),
            _ => DragEffect::NONE,
        }
    }

    /// Abandon the current gesture, deleting any provisional node.
    pub fn cancel(&mut self, model: &mut GraphModel) -> DragEffect {
        let discarded = self.discard(model);
        DragEffect {
            redraw: discarded,
            committed: None,
        }
    }

    /// Forget the current gesture without touching any model. Used when the
    /// model it was made against is replaced.
    pub fn reset(&mut self) {
        self.session = DragSession::Idle;
    }

    fn begin(&mut self, target: DragTarget, at: Point, model: &mut GraphModel) -> DragEffect {
        let discarded = self.discard(model);

        self.session = match target {
            DragTarget::NodeBody(node) if model.contains_node(node) => DragSession::Node {
                node,
                last: at,
                moved: false,
            },
            DragTarget::Ring(anchor) if model.contains_node(anchor) => DragSession::Ring {
                anchor,
                last: at,
                provisional: None,
            },
            DragTarget::Overlay => DragSession::Overlay { last: at },
            DragTarget::NodeBody(node) | DragTarget::Ring(node) => {
                log::debug!("drag started on missing node {node}, ignoring");
                DragSession::Idle
            }
        };
        log::debug!("drag start: {:?}", self.session);

        DragEffect {
            redraw: discarded,
            committed: None,
        }
    }

    fn drag_to(&mut self, at: Point, model: &mut GraphModel) -> DragEffect {
        match &mut self.session {
            DragSession::Idle => DragEffect::NONE,
            DragSession::Node { node, last, moved } => {
                let delta = at - *last;
                if !model.move_node(*node, delta) {
                    log::debug!("dragged node {node} is gone, ending drag");
                    self.session = DragSession::Idle;
                    return DragEffect::NONE;
                }
                *last = at;
                *moved = true;
                DragEffect::REDRAW
            }
            DragSession::Ring {
                anchor,
                last,
                provisional,
            } => {
                let delta = at - *last;
                *last = at;

                if let Some(p) = *provisional
                    && !model.contains_node(p.node)
                {
                    log::debug!("provisional node {} deleted mid-drag", p.node);
                    *provisional = None;
                    return DragEffect::REDRAW;
                }

                let p = match *provisional {
                    Some(p) => {
                        model.move_node(p.node, delta);
                        p
                    }
                    None => {
                        if !model.contains_node(*anchor) {
                            return DragEffect::NONE;
                        }
                        match start_provisional(model, *anchor, at) {
                            Ok(p) => {
                                log::trace!("provisional {} via {}", p.node, p.relationship);
                                *provisional = Some(p);
                                p
                            }
                            Err(err) => {
                                log::warn!("cannot start relationship from {anchor}: {err}");
                                return DragEffect::NONE;
                            }
                        }
                    }
                };
                // The move that creates the provisional node may already land
                // on a target.
                snap_end(&self.resolver, model, *anchor, p);
                DragEffect::REDRAW
            }
            DragSession::Overlay { last } => {
                *last = at;
                DragEffect::REDRAW
            }
        }
    }

    fn end(&mut self, model: &mut GraphModel) -> DragEffect {
        match std::mem::take(&mut self.session) {
            DragSession::Idle => DragEffect::NONE,
            DragSession::Node { node, moved, .. } => DragEffect {
                redraw: true,
                committed: (moved && model.contains_node(node)).then_some(Committed::Moved(node)),
            },
            DragSession::Ring {
                provisional: Some(p),
                ..
            } => DragEffect {
                redraw: true,
                committed: resolve(model, p),
            },
            DragSession::Ring { .. } | DragSession::Overlay { .. } => DragEffect::REDRAW,
        }
    }

    /// Drop the session, deleting an unresolved provisional node.
    fn discard(&mut self, model: &mut GraphModel) -> bool {
        let provisional = self.session.provisional();
        self.session = DragSession::Idle;
        match provisional {
            Some(p) => {
                log::debug!("discarding provisional node {}", p.node);
                model.delete_node(p.node).is_some()
            }
            None => false,
        }
    }
}

fn start_provisional(
    model: &mut GraphModel,
    anchor: NodeId,
    at: Point,
) -> Result<Provisional, ModelError> {
    let node = model.create_node(at)?;
    match model.create_relationship(anchor, node) {
        Ok(relationship) => Ok(Provisional { node, relationship }),
        Err(err) => {
            model.delete_node(node);
            Err(err)
        }
    }
}

/// Point the provisional relationship at the nearest node in range, or back
/// at the provisional node when nothing is close enough.
fn snap_end(resolver: &SnapResolver, model: &mut GraphModel, anchor: NodeId, p: Provisional) {
    let Some(current) = model.relationship(p.relationship).map(|r| r.end()) else {
        return;
    };
    if !model.contains_node(anchor) {
        return;
    }
    let end = resolver
        .find_closest(model, p.node, &[anchor])
        .unwrap_or(p.node);
    if end == current {
        return;
    }
    match model.set_relationship_end(p.relationship, end) {
        Ok(()) if end == p.node => log::trace!("{} unsnapped", p.relationship),
        Ok(()) => log::trace!("{} snapped to {end}", p.relationship),
        Err(err) => log::warn!("cannot repoint {}: {err}", p.relationship),
    }
}

fn resolve(model: &mut GraphModel, p: Provisional) -> Option<Committed> {
    match model.relationship(p.relationship).map(|r| r.end()) {
        Some(end) if end == p.node => {
            log::debug!("ring drag created {} via {}", p.node, p.relationship);
            Some(Committed::Node {
                node: p.node,
                relationship: p.relationship,
            })
        }
        Some(end) => {
            model.delete_node(p.node);
            log::debug!("ring drag connected {} to {end}", p.relationship);
            Some(Committed::Relationship(p.relationship))
        }
        None => {
            // Anchor deleted during the gesture took the relationship with it.
            model.delete_node(p.node);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn down(x: f64, y: f64, target: DragTarget) -> InputEvent {
        InputEvent::pointer_down(x, y, target)
    }

    fn mv(x: f64, y: f64) -> InputEvent {
        InputEvent::pointer_move(x, y)
    }

    fn up(x: f64, y: f64) -> InputEvent {
        InputEvent::pointer_up(x, y)
    }

    #[test]
    fn node_body_drag_is_additive() {
        let mut model = GraphModel::new();
        let a = model.create_node(Point::new(100.0, 100.0)).unwrap();
        let mut drag = DragController::default();

        drag.handle(&down(100.0, 100.0, DragTarget::NodeBody(a)), &mut model);
        let effect = drag.handle(&mv(110.0, 105.0), &mut model);
        assert!(effect.redraw);
        drag.handle(&mv(130.0, 95.0), &mut model);
        assert_eq!(model.node(a).unwrap().position, Point::new(130.0, 95.0));

        let effect = drag.handle(&up(130.0, 95.0), &mut model);
        assert_eq!(effect.committed, Some(Committed::Moved(a)));
        assert!(drag.session().is_idle());
        assert_eq!(model.relationship_count(), 0);
    }

    #[test]
    fn ring_drag_to_empty_space_creates_node_and_relationship() {
        let mut model = GraphModel::new();
        let a = model.create_node(Point::new(100.0, 100.0)).unwrap();
        let mut drag = DragController::default();

        drag.handle(&down(127.0, 100.0, DragTarget::Ring(a)), &mut model);
        drag.handle(&mv(200.0, 100.0), &mut model);
        drag.handle(&mv(260.0, 120.0), &mut model);
        let effect = drag.handle(&up(260.0, 120.0), &mut model);

        let Some(Committed::Node { node, relationship }) = effect.committed else {
            panic!("expected a new node, got {:?}", effect.committed);
        };
        assert_eq!(model.node_count(), 2);
        assert_eq!(model.node(node).unwrap().position, Point::new(260.0, 120.0));
        let rel = model.relationship(relationship).unwrap();
        assert_eq!((rel.start(), rel.end()), (a, node));
    }

    #[test]
    fn ring_drag_onto_node_snaps_and_drops_provisional() {
        let mut model = GraphModel::new();
        let a = model.create_node(Point::new(100.0, 100.0)).unwrap();
        let b = model.create_node(Point::new(400.0, 100.0)).unwrap();
        let mut drag = DragController::default();

        drag.handle(&down(127.0, 100.0, DragTarget::Ring(a)), &mut model);
        drag.handle(&mv(300.0, 100.0), &mut model);
        drag.handle(&mv(390.0, 100.0), &mut model);

        let p = drag.session().provisional().unwrap();
        assert_eq!(model.relationship(p.relationship).unwrap().end(), b);

        let effect = drag.handle(&up(390.0, 100.0), &mut model);
        assert_eq!(effect.committed, Some(Committed::Relationship(p.relationship)));
        assert_eq!(model.node_count(), 2);
        assert!(!model.contains_node(p.node));
        let rel = model.relationship(p.relationship).unwrap();
        assert_eq!((rel.start(), rel.end()), (a, b));
    }

    #[test]
    fn single_move_onto_node_snaps() {
        let mut model = GraphModel::new();
        let a = model.create_node(Point::new(100.0, 100.0)).unwrap();
        let b = model.create_node(Point::new(400.0, 100.0)).unwrap();
        let mut drag = DragController::default();

        drag.handle(&down(127.0, 100.0, DragTarget::Ring(a)), &mut model);
        drag.handle(&mv(395.0, 100.0), &mut model);
        let p = drag.session().provisional().unwrap();
        assert_eq!(model.relationship(p.relationship).unwrap().end(), b);

        let effect = drag.handle(&up(395.0, 100.0), &mut model);
        assert_eq!(effect.committed, Some(Committed::Relationship(p.relationship)));
        assert_eq!(model.node_count(), 2);
        assert!(model.check_integrity().is_ok());
    }

    #[test]
    fn moving_away_unsnaps() {
        let mut model = GraphModel::new();
        let a = model.create_node(Point::new(100.0, 100.0)).unwrap();
        let b = model.create_node(Point::new(400.0, 100.0)).unwrap();
        let mut drag = DragController::default();

        drag.handle(&down(127.0, 100.0, DragTarget::Ring(a)), &mut model);
        drag.handle(&mv(380.0, 100.0), &mut model);
        drag.handle(&mv(390.0, 100.0), &mut model);
        let p = drag.session().provisional().unwrap();
        assert_eq!(model.relationship(p.relationship).unwrap().end(), b);

        drag.handle(&mv(390.0, 300.0), &mut model);
        assert_eq!(model.relationship(p.relationship).unwrap().end(), p.node);
    }

    #[test]
    fn anchor_is_never_a_snap_target() {
        let mut model = GraphModel::new();
        let a = model.create_node(Point::new(100.0, 100.0)).unwrap();
        let mut drag = DragController::default();

        drag.handle(&down(127.0, 100.0, DragTarget::Ring(a)), &mut model);
        drag.handle(&mv(140.0, 100.0), &mut model);
        drag.handle(&mv(110.0, 100.0), &mut model);
        let p = drag.session().provisional().unwrap();
        assert_eq!(model.relationship(p.relationship).unwrap().end(), p.node);
    }

    #[test]
    fn press_and_release_on_ring_creates_nothing() {
        let mut model = GraphModel::new();
        let a = model.create_node(Point::new(100.0, 100.0)).unwrap();
        let mut drag = DragController::default();

        drag.handle(&down(127.0, 100.0, DragTarget::Ring(a)), &mut model);
        let effect = drag.handle(&up(127.0, 100.0), &mut model);
        assert_eq!(effect.committed, None);
        assert_eq!(model.node_count(), 1);
        assert_eq!(model.relationship_count(), 0);
    }

    #[test]
    fn new_pointer_down_discards_unresolved_provisional() {
        let mut model = GraphModel::new();
        let a = model.create_node(Point::new(100.0, 100.0)).unwrap();
        let mut drag = DragController::default();

        drag.handle(&down(127.0, 100.0, DragTarget::Ring(a)), &mut model);
        drag.handle(&mv(300.0, 300.0), &mut model);
        assert_eq!(model.node_count(), 2);

        // Pointer-up was lost; the next gesture starts.
        let effect = drag.handle(&down(100.0, 100.0, DragTarget::NodeBody(a)), &mut model);
        assert!(effect.redraw);
        assert_eq!(model.node_count(), 1);
        assert_eq!(model.relationship_count(), 0);
    }

    #[test]
    fn cancel_discards_provisional() {
        let mut model = GraphModel::new();
        let a = model.create_node(Point::new(100.0, 100.0)).unwrap();
        let mut drag = DragController::default();

        drag.handle(&down(127.0, 100.0, DragTarget::Ring(a)), &mut model);
        drag.handle(&mv(300.0, 300.0), &mut model);
        assert!(drag.cancel(&mut model).redraw);
        assert!(drag.session().is_idle());
        assert_eq!(model.node_count(), 1);
    }

    #[test]
    fn anchor_deleted_mid_drag_is_harmless() {
        let mut model = GraphModel::new();
        let a = model.create_node(Point::new(100.0, 100.0)).unwrap();
        let _b = model.create_node(Point::new(400.0, 100.0)).unwrap();
        let mut drag = DragController::default();

        drag.handle(&down(127.0, 100.0, DragTarget::Ring(a)), &mut model);
        drag.handle(&mv(300.0, 100.0), &mut model);
        model.delete_node(a).unwrap();

        drag.handle(&mv(395.0, 100.0), &mut model);
        let effect = drag.handle(&up(395.0, 100.0), &mut model);
        assert_eq!(effect.committed, None);
        assert_eq!(model.node_count(), 1);
        assert!(model.check_integrity().is_ok());
    }

    #[test]
    fn stale_pointer_up_is_a_no_op() {
        let mut model = GraphModel::new();
        let mut drag = DragController::default();
        assert_eq!(drag.handle(&up(0.0, 0.0), &mut model), DragEffect::default());
        assert_eq!(drag.handle(&mv(5.0, 5.0), &mut model), DragEffect::default());
    }

    #[test]
    fn overlay_drag_changes_nothing() {
        let mut model = GraphModel::new();
        model.create_node(Point::new(100.0, 100.0)).unwrap();
        let mut drag = DragController::default();

        drag.handle(&down(0.0, 0.0, DragTarget::Overlay), &mut model);
        assert!(drag.handle(&mv(50.0, 50.0), &mut model).redraw);
        let effect = drag.handle(&up(50.0, 50.0), &mut model);
        assert_eq!(effect, DragEffect::REDRAW);
        assert_eq!(model.node_count(), 1);
    }
}
