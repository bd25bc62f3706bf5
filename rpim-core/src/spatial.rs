//! Radius queries over a point set.
//!
//! The index is an R-tree built once over a dataset cloud and queried as many
//! times as needed. Distances use the L1 (Manhattan) metric: a point matches
//! when `|dx| + |dy| < radius`. The L1 ball is a diamond inscribed in the
//! Euclidean disc of the same radius, which is what decides membership near the
//! edge of a support domain.

use crate::error::{Error, Result};
use crate::types::{Point2, PointCloud};
use rstar::primitives::GeomWithData;
use rstar::{RTree, AABB};

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// L1 distance between two points.
#[inline]
pub fn l1_distance(a: &Point2, b: &Point2) -> f64 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Spatial index of a dataset cloud, queried from points of a queries cloud.
pub struct SpatialIndex<'a> {
    queries: &'a PointCloud,
    dataset: &'a PointCloud,
    tree: RTree<IndexedPoint>,
}

impl<'a> SpatialIndex<'a> {
    /// Build the index over `dataset`.
    pub fn new(queries: &'a PointCloud, dataset: &'a PointCloud) -> Self {
        let entries = dataset
            .iter()
            .enumerate()
            .map(|(i, p)| IndexedPoint::new([p.x, p.y], i))
            .collect();
        Self {
            queries,
            dataset,
            tree: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed dataset points.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Dataset indices within L1 distance `radius` of query point `query_idx`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexConsistency`] if `query_idx` is not a point of the
    /// queries cloud.
    pub fn radius_search(&self, query_idx: usize, radius: f64) -> Result<Vec<usize>> {
        let query = self.queries.get(query_idx).ok_or_else(|| {
            Error::IndexConsistency(format!(
                "query index {} out of range ({} query points)",
                query_idx,
                self.queries.len()
            ))
        })?;
        Ok(self.within(query, radius))
    }

    /// Dataset indices within L1 distance `radius` of an arbitrary point,
    /// sorted ascending.
    pub fn within(&self, point: &Point2, radius: f64) -> Vec<usize> {
        let envelope = AABB::from_corners(
            [point.x - radius, point.y - radius],
            [point.x + radius, point.y + radius],
        );
        let mut found: Vec<usize> = self
            .tree
            .locate_in_envelope(&envelope)
            .filter(|entry| l1_distance(point, &self.dataset[entry.data]) < radius)
            .map(|entry| entry.data)
            .collect();
        found.sort_unstable();
        found
    }
}
