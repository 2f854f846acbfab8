//! Canvas geometry seam.
//!
//! The core never computes rendered sizes itself: radii come from a
//! `Geometry` implementation supplied by whatever draws the diagram.

use crate::model::Node;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// The canvas (viewport) dimensions in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 700.0,
        }
    }
}

impl Viewport {
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Rendered-size queries answered by the layout/render service.
pub trait Geometry {
    /// Radius of the node's filled circle.
    fn inner_radius(&self, node: &Node) -> f64;

    /// Radius including the border; the connection ring sits just outside it.
    fn outer_radius(&self, node: &Node) -> f64 {
        self.inner_radius(node) + 2.0
    }
}

/// Every node drawn with the same radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformGeometry {
    pub inner_radius: f64,
}

impl Default for UniformGeometry {
    fn default() -> Self {
        Self { inner_radius: 25.0 }
    }
}

impl Geometry for UniformGeometry {
    fn inner_radius(&self, _node: &Node) -> f64 {
        self.inner_radius
    }
}

/// Seed position for the `index`-th of `count` unplaced nodes: evenly spaced
/// on a circle of `radius` around `center`.
pub fn circle_slot(index: usize, count: usize, center: Point, radius: f64) -> Point {
    if count <= 1 {
        return center;
    }
    let angle = index as f64 * 2.0 * PI / count as f64;
    Point::new(
        center.x + radius * angle.cos(),
        center.y + radius * angle.sin(),
    )
}
