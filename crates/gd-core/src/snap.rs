//! Nearest-node snapping for dangling relationship ends.
//!
//! A single linear pass over the node set in creation order. Node counts in a
//! hand-edited diagram are in the tens, so no spatial index is kept; a grid or
//! quad-tree could replace the scan without changing `find_closest`.

use crate::id::NodeId;
use crate::model::GraphModel;
use kurbo::Point;

/// Snap distance in device pixels, before the model's internal scale.
pub const DEFAULT_SNAP_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResolver {
    pub threshold: f64,
}

impl Default for SnapResolver {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SNAP_THRESHOLD,
        }
    }
}

impl SnapResolver {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Nearest node to `subject` whose scaled distance is under the threshold.
    ///
    /// `subject` itself and any id in `exclude` are skipped. On equal
    /// distances the node created first wins.
    pub fn find_closest(
        &self,
        model: &GraphModel,
        subject: NodeId,
        exclude: &[NodeId],
    ) -> Option<NodeId> {
        let origin = model.node(subject)?.position;
        self.find_closest_to(model, origin, |id| id == subject || exclude.contains(&id))
    }

    /// Nearest node to an arbitrary point, skipping ids for which `skip` is true.
    pub fn find_closest_to(
        &self,
        model: &GraphModel,
        origin: Point,
        skip: impl Fn(NodeId) -> bool,
    ) -> Option<NodeId> {
        let scale = model.internal_scale();
        let mut closest = None;
        let mut closest_distance = f64::MAX;

        for candidate in model.nodes() {
            if skip(candidate.id()) {
                continue;
            }
            let distance = origin.distance(candidate.position) * scale;
            if distance < self.threshold && distance < closest_distance {
                closest = Some(candidate.id());
                closest_distance = distance;
            }
        }
        closest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_with(points: &[(f64, f64)]) -> (GraphModel, Vec<NodeId>) {
        let mut model = GraphModel::new();
        let ids = points
            .iter()
            .map(|&(x, y)| model.create_node(Point::new(x, y)).unwrap())
            .collect();
        (model, ids)
    }

    #[test]
    fn picks_nearest_under_threshold() {
        let (model, ids) = model_with(&[(0.0, 0.0), (60.0, 0.0), (0.0, 40.0), (10.0, 0.0)]);
        let resolver = SnapResolver::default();
        assert_eq!(resolver.find_closest(&model, ids[0], &[]), Some(ids[3]));
    }

    #[test]
    fn nothing_under_threshold() {
        let (model, ids) = model_with(&[(0.0, 0.0), (60.0, 0.0), (0.0, -50.0)]);
        assert_eq!(SnapResolver::default().find_closest(&model, ids[0], &[]), None);
    }

    #[test]
    fn tie_goes_to_first_created() {
        let (model, ids) = model_with(&[(0.0, 0.0), (20.0, 0.0), (0.0, 20.0)]);
        let resolver = SnapResolver::default();
        assert_eq!(resolver.find_closest(&model, ids[0], &[]), Some(ids[1]));
        // Same answer every time.
        assert_eq!(resolver.find_closest(&model, ids[0], &[]), Some(ids[1]));
    }

    #[test]
    fn internal_scale_stretches_distances() {
        let (mut model, ids) = model_with(&[(0.0, 0.0), (30.0, 0.0)]);
        let resolver = SnapResolver::default();
        assert_eq!(resolver.find_closest(&model, ids[0], &[]), Some(ids[1]));
        model.set_internal_scale(2.0);
        assert_eq!(resolver.find_closest(&model, ids[0], &[]), None);
    }

    #[test]
    fn excluded_nodes_are_skipped() {
        let (model, ids) = model_with(&[(0.0, 0.0), (5.0, 0.0), (30.0, 0.0)]);
        let resolver = SnapResolver::default();
        assert_eq!(resolver.find_closest(&model, ids[0], &[ids[1]]), Some(ids[2]));
    }
}
