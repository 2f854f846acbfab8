pub mod data;
pub mod error;
pub mod id;
pub mod layout;
pub mod model;
pub mod snap;

pub use data::{GraphData, NodeData, RelationshipData};
pub use error::{DataError, ModelError};
pub use id::{NodeId, RelationshipId, StoreId};
pub use layout::{Geometry, UniformGeometry, Viewport};
pub use model::*;
pub use snap::{DEFAULT_SNAP_THRESHOLD, SnapResolver};

// Re-export kurbo types so downstream crates don't need a direct dependency
pub use kurbo::{Point, Vec2};
