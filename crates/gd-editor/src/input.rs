//! Input abstraction layer.
//!
//! The host does its own hit testing and tells the editor which affordance a
//! pointer-down landed on. Coordinates are canvas pixels.

use gd_core::{NodeId, Point, RelationshipId};

/// The affordance a drag starts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    /// The filled body of a node: moves it.
    NodeBody(NodeId),
    /// The connection ring around a node: draws a new relationship.
    Ring(NodeId),
    /// The free overlay above the canvas.
    Overlay,
}

/// What a double-click landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Node(NodeId),
    Relationship(RelationshipId),
    Canvas,
}

/// A normalized input event from the host.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f64, y: f64, target: DragTarget },

    PointerMove { x: f64, y: f64 },

    PointerUp { x: f64, y: f64 },

    /// Activates the element under the pointer.
    DoubleClick { target: HitTarget },

    /// Keyboard shortcut.
    Key {
        key: String,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
    },
}

impl InputEvent {
    pub fn pointer_down(x: f64, y: f64, target: DragTarget) -> Self {
        Self::PointerDown { x, y, target }
    }

    pub fn pointer_move(x: f64, y: f64) -> Self {
        Self::PointerMove { x, y }
    }

    pub fn pointer_up(x: f64, y: f64) -> Self {
        Self::PointerUp { x, y }
    }

    /// A bare key press with no modifiers.
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key {
            key: key.into(),
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
        }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PointerDown { x, y, .. } | Self::PointerMove { x, y } | Self::PointerUp { x, y } => {
                Some(Point::new(*x, *y))
            }
            _ => None,
        }
    }
}
