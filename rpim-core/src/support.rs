//! Support domains of quadrature points.
//!
//! A support domain is the set of field nodes whose shape functions are
//! non-zero at a quadrature point. Conceptually it is a rectangle of
//! `as·dc_x × as·dc_y` centred on the point; it is approximated by an L1 radius
//! query with the radius of the circumscribing circle, with no secondary
//! rectangular cut, so it is slightly over-inclusive near the corners.
//!
//! Two interchangeable builders are provided:
//!
//! - [`InvertedSearch`] queries once per field node and scatters each match
//!   into the support domain of the matched quadrature point. There are
//!   usually several times fewer field nodes than quadrature points.
//! - [`DirectSearch`] queries once per quadrature point against the field
//!   nodes.
//!
//! Because the L1 relation is symmetric both produce the same domains, with
//! support nodes sorted by ascending global node id.

use crate::config::RpimParameters;
use crate::error::{Error, Result};
use crate::spatial::SpatialIndex;
use crate::types::{Point2, PointCloud};
use rayon::prelude::*;

/// Support domain of one quadrature (or interest) point.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportDomainPoint {
    /// Index of the point in the merged cloud.
    pub point_idx: usize,
    /// Coordinates of the point.
    pub point_coords: Point2,
    /// Global ids of the supporting field nodes.
    pub support_indices: Vec<usize>,
    /// Coordinates of the supporting field nodes, parallel to `support_indices`.
    pub support_coords: Vec<Point2>,
}

impl SupportDomainPoint {
    /// Empty support domain for a point.
    pub fn new(point_idx: usize, point_coords: Point2) -> Self {
        Self {
            point_idx,
            point_coords,
            support_indices: Vec::new(),
            support_coords: Vec::new(),
        }
    }

    /// Register a supporting field node.
    pub fn push(&mut self, node_id: usize, coords: Point2) {
        self.support_indices.push(node_id);
        self.support_coords.push(coords);
    }

    /// Number of supporting nodes.
    pub fn len(&self) -> usize {
        self.support_indices.len()
    }

    /// Whether no field node supports the point.
    pub fn is_empty(&self) -> bool {
        self.support_indices.is_empty()
    }
}

/// Support-domain construction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStrategy {
    /// Query from field nodes outward.
    #[default]
    Inverted,
    /// Query from each quadrature point.
    Direct,
}

impl SearchStrategy {
    /// Builder implementing the strategy.
    pub fn builder(self) -> Box<dyn SupportDomainBuilder> {
        match self {
            SearchStrategy::Inverted => Box::new(InvertedSearch),
            SearchStrategy::Direct => Box::new(DirectSearch),
        }
    }
}

/// Builds one support domain per non-field point of a merged cloud.
///
/// `cloud` starts with the `field_nodes` (same order, same coordinates)
/// followed by the points to support. The result has one entry per such
/// point, entry `k` describing cloud point `field_nodes.len() + k`.
pub trait SupportDomainBuilder: Send + Sync {
    /// Build the support domains.
    fn build(
        &self,
        field_nodes: &PointCloud,
        cloud: &PointCloud,
        params: &RpimParameters,
    ) -> Result<Vec<SupportDomainPoint>>;

    /// Builder name for diagnostics.
    fn name(&self) -> &str;
}

fn check_cloud(field_nodes: &PointCloud, cloud: &PointCloud) -> Result<()> {
    if cloud.len() < field_nodes.len() {
        return Err(Error::IndexConsistency(format!(
            "merged cloud has {} points but {} field nodes",
            cloud.len(),
            field_nodes.len()
        )));
    }
    Ok(())
}

fn empty_domains(field_nodes: &PointCloud, cloud: &PointCloud) -> Vec<SupportDomainPoint> {
    (field_nodes.len()..cloud.len())
        .map(|idx| SupportDomainPoint::new(idx, cloud[idx]))
        .collect()
}

/// Field-node-centred search.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvertedSearch;

impl SupportDomainBuilder for InvertedSearch {
    fn build(
        &self,
        field_nodes: &PointCloud,
        cloud: &PointCloud,
        params: &RpimParameters,
    ) -> Result<Vec<SupportDomainPoint>> {
        check_cloud(field_nodes, cloud)?;
        let n_field = field_nodes.len();
        let radius = params.search_radius();
        let index = SpatialIndex::new(field_nodes, cloud);

        let matches = (0..n_field)
            .into_par_iter()
            .map(|node| index.radius_search(node, radius))
            .collect::<Result<Vec<_>>>()?;

        let mut domains = empty_domains(field_nodes, cloud);
        for (node, found) in matches.iter().enumerate() {
            for &idx in found.iter().filter(|&&idx| idx >= n_field) {
                domains[idx - n_field].push(node, field_nodes[node]);
            }
        }
        Ok(domains)
    }

    fn name(&self) -> &str {
        "inverted"
    }
}

/// Quadrature-point-centred search.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectSearch;

impl SupportDomainBuilder for DirectSearch {
    fn build(
        &self,
        field_nodes: &PointCloud,
        cloud: &PointCloud,
        params: &RpimParameters,
    ) -> Result<Vec<SupportDomainPoint>> {
        check_cloud(field_nodes, cloud)?;
        let radius = params.search_radius();
        let index = SpatialIndex::new(cloud, field_nodes);

        let mut domains = empty_domains(field_nodes, cloud);
        domains.par_iter_mut().try_for_each(|domain| -> Result<()> {
            for node in index.radius_search(domain.point_idx, radius)? {
                domain.push(node, field_nodes[node]);
            }
            Ok(())
        })?;
        Ok(domains)
    }

    fn name(&self) -> &str {
        "direct"
    }
}

/// Closed outline of the support rectangle centred on `center`.
pub fn support_rectangle(center: &Point2, width: f64, height: f64) -> [Point2; 5] {
    let (w2, h2) = (width / 2.0, height / 2.0);
    [
        Point2::new(center.x - w2, center.y + h2),
        Point2::new(center.x - w2, center.y - h2),
        Point2::new(center.x + w2, center.y - h2),
        Point2::new(center.x + w2, center.y + h2),
        Point2::new(center.x - w2, center.y + h2),
    ]
}

/// Log, point by point, the support rectangle and the matched nodes.
pub fn trace_support_domains(domains: &[SupportDomainPoint], params: &RpimParameters) {
    let (width, height) = (params.support_width(), params.support_height());
    for domain in domains {
        let rect = support_rectangle(&domain.point_coords, width, height);
        log::info!(
            "support of point {} at ({:.4}, {:.4}): rectangle [{:.4}, {:.4}] x [{:.4}, {:.4}], {} nodes {:?}",
            domain.point_idx,
            domain.point_coords.x,
            domain.point_coords.y,
            rect[1].x,
            rect[3].x,
            rect[1].y,
            rect[3].y,
            domain.len(),
            domain.support_indices
        );
    }
}

/// Smallest and largest support sizes.
pub fn support_size_range(domains: &[SupportDomainPoint]) -> Option<(usize, usize)> {
    let min = domains.iter().map(SupportDomainPoint::len).min()?;
    let max = domains.iter().map(SupportDomainPoint::len).max()?;
    Some((min, max))
}
