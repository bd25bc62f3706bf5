//! Merged point cloud of field nodes and quadrature points.
//!
//! The cloud is laid out as `[field nodes | volume points | surface points]`.
//! That order is load-bearing: support domains, kinematics and assembly all
//! identify quadrature points by their position in it.

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::quadrature::{rebase, LineCell, LineQuadrature, TriangleCell, TriangleQuadrature, TriangleRule};
use crate::types::{Point2, PointCloud};
use std::ops::Range;

/// Quadrature-to-field-node ratio below which coverage is reported as poor.
pub const MIN_COVERAGE_RATIO: f64 = 3.0;

/// Role of a point in the merged cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointKind {
    /// Field node carrying degrees of freedom.
    Field,
    /// Gauss point of a background triangle.
    Volume,
    /// Gauss point of a boundary line.
    Surface,
}

/// Field nodes and background quadrature merged into one cloud.
#[derive(Debug, Clone)]
pub struct QuadratureCloud {
    cloud: PointCloud,
    n_field: usize,
    surface_offset: usize,
    rule: TriangleRule,
    volume_cells: Vec<TriangleCell>,
    volume_weights: Vec<f64>,
    surface_cells: Vec<LineCell>,
    surface_weights: Vec<f64>,
}

impl QuadratureCloud {
    /// Generate volume and surface quadrature over `field_mesh` and merge it
    /// behind the field nodes. Cell point indices refer to the merged cloud.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyMesh`] if the mesh has no nodes.
    /// - Quadrature generation errors (invalid rule size, broken elements).
    pub fn build(field_mesh: &Mesh, rule: TriangleRule, surface_points: usize) -> Result<Self> {
        if field_mesh.n_nodes() == 0 {
            return Err(Error::EmptyMesh);
        }
        let volume = TriangleQuadrature::generate(field_mesh, rule)?;
        let surface = LineQuadrature::generate(field_mesh, surface_points)?;

        let n_field = field_mesh.n_nodes();
        let mut cloud =
            PointCloud::with_capacity(n_field + volume.points.len() + surface.points.len());
        cloud.append(field_mesh.nodes());
        let volume_offset = cloud.append(&volume.points);
        let surface_offset = cloud.append(&surface.points);

        let mut volume_cells = volume.cells;
        for cell in &mut volume_cells {
            rebase(&mut cell.points, volume_offset);
        }
        let mut surface_cells = surface.cells;
        for cell in &mut surface_cells {
            rebase(&mut cell.points, surface_offset);
        }

        let merged = Self {
            cloud,
            n_field,
            surface_offset,
            rule,
            volume_cells,
            volume_weights: volume.weights,
            surface_cells,
            surface_weights: surface.weights,
        };
        merged.report_coverage();
        Ok(merged)
    }

    fn report_coverage(&self) {
        let ratio = self.coverage_ratio();
        if ratio < MIN_COVERAGE_RATIO {
            log::warn!(
                "quadrature/field-node ratio {:.3} is below {} ({} quadrature points, {} field nodes)",
                ratio,
                MIN_COVERAGE_RATIO,
                self.n_quadrature_points(),
                self.n_field
            );
        } else {
            log::info!(
                "quadrature/field-node ratio {:.3}: {} field nodes, {} volume points, {} surface points",
                ratio,
                self.n_field,
                self.n_volume_points(),
                self.n_surface_points()
            );
        }
    }

    /// Merged cloud.
    pub fn cloud(&self) -> &PointCloud {
        &self.cloud
    }

    /// Move the field-node part of the cloud.
    pub(crate) fn field_points_mut(&mut self) -> &mut [Point2] {
        &mut self.cloud.points_mut()[..self.n_field]
    }

    /// Total number of points.
    pub fn len(&self) -> usize {
        self.cloud.len()
    }

    /// Whether the cloud is empty.
    pub fn is_empty(&self) -> bool {
        self.cloud.is_empty()
    }

    /// Number of field nodes.
    pub fn n_field_nodes(&self) -> usize {
        self.n_field
    }

    /// Number of volume quadrature points.
    pub fn n_volume_points(&self) -> usize {
        self.surface_offset - self.n_field
    }

    /// Number of surface quadrature points.
    pub fn n_surface_points(&self) -> usize {
        self.cloud.len() - self.surface_offset
    }

    /// Number of quadrature points of both kinds.
    pub fn n_quadrature_points(&self) -> usize {
        self.cloud.len() - self.n_field
    }

    /// Quadrature points per field node.
    pub fn coverage_ratio(&self) -> f64 {
        self.n_quadrature_points() as f64 / self.n_field as f64
    }

    /// Cloud indices of the volume points.
    pub fn volume_range(&self) -> Range<usize> {
        self.n_field..self.surface_offset
    }

    /// Cloud indices of the surface points.
    pub fn surface_range(&self) -> Range<usize> {
        self.surface_offset..self.cloud.len()
    }

    /// Role of cloud point `idx`.
    pub fn kind(&self, idx: usize) -> Option<PointKind> {
        if idx < self.n_field {
            Some(PointKind::Field)
        } else if idx < self.surface_offset {
            Some(PointKind::Volume)
        } else if idx < self.cloud.len() {
            Some(PointKind::Surface)
        } else {
            None
        }
    }

    /// Volume rule.
    pub fn volume_rule(&self) -> TriangleRule {
        self.rule
    }

    /// Background triangles with merged-cloud point indices.
    pub fn volume_cells(&self) -> &[TriangleCell] {
        &self.volume_cells
    }

    /// Triangle rule weights.
    pub fn volume_weights(&self) -> &[f64] {
        &self.volume_weights
    }

    /// Boundary lines with merged-cloud point indices.
    pub fn surface_cells(&self) -> &[LineCell] {
        &self.surface_cells
    }

    /// Gauss-Legendre weights.
    pub fn surface_weights(&self) -> &[f64] {
        &self.surface_weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::fixtures::{cantilever_grid, rectangular_grid};
    use approx::assert_relative_eq;

    #[test]
    fn test_layout_and_offsets() {
        let mesh = rectangular_grid(Point2::new(0.0, 0.0), Point2::new(3.0, 2.0), 4, 3);
        let qc = QuadratureCloud::build(&mesh, TriangleRule::Quadratic, 2).unwrap();

        assert_eq!(qc.n_field_nodes(), 12);
        assert_eq!(qc.n_volume_points(), 3 * 12);
        assert_eq!(qc.n_surface_points(), 2 * 10);
        assert_eq!(qc.len(), 12 + 36 + 20);
        assert_eq!(qc.volume_range(), 12..48);
        assert_eq!(qc.surface_range(), 48..68);

        for i in 0..12 {
            assert_eq!(qc.cloud()[i], mesh.nodes()[i]);
        }
        assert_eq!(qc.kind(0), Some(PointKind::Field));
        assert_eq!(qc.kind(12), Some(PointKind::Volume));
        assert_eq!(qc.kind(67), Some(PointKind::Surface));
        assert_eq!(qc.kind(68), None);
    }

    #[test]
    fn test_cells_reference_merged_cloud() {
        let mesh = rectangular_grid(Point2::new(0.0, 0.0), Point2::new(3.0, 2.0), 4, 3);
        let qc = QuadratureCloud::build(&mesh, TriangleRule::Cubic, 3).unwrap();

        // cell-major, point-minor
        let mut expected = qc.volume_range();
        for cell in qc.volume_cells() {
            for &p in &cell.points {
                assert_eq!(Some(p), expected.next());
            }
        }
        let mut expected = qc.surface_range();
        for cell in qc.surface_cells() {
            for &p in &cell.points {
                assert_eq!(Some(p), expected.next());
            }
        }

        let area: f64 = qc
            .volume_cells()
            .iter()
            .map(|c| c.scale() * qc.volume_weights().iter().sum::<f64>())
            .sum();
        assert_relative_eq!(area, 6.0, epsilon = 1e-10);
    }

    #[test]
    fn test_coverage_ratio() {
        let qc = QuadratureCloud::build(&cantilever_grid(), TriangleRule::Quadratic, 3).unwrap();
        // (3·288 + 3·48) / 169
        assert_relative_eq!(qc.coverage_ratio(), 1008.0 / 169.0, epsilon = 1e-12);
        assert!(qc.coverage_ratio() >= MIN_COVERAGE_RATIO);
    }

    #[test]
    fn test_sparse_coverage_still_builds() {
        // 2 triangles · 1 point + 4 lines · 1 point over 4 field nodes
        let mesh = rectangular_grid(Point2::new(0.0, 0.0), Point2::new(2.0, 1.0), 2, 2);
        let qc = QuadratureCloud::build(&mesh, TriangleRule::Linear, 1).unwrap();
        assert_relative_eq!(qc.coverage_ratio(), 1.5, epsilon = 1e-12);
        assert!(qc.coverage_ratio() < MIN_COVERAGE_RATIO);
        assert_eq!(qc.len(), 4 + 2 + 4);
    }

    #[test]
    fn test_empty_mesh() {
        assert!(matches!(
            QuadratureCloud::build(&Mesh::new(), TriangleRule::Linear, 1),
            Err(Error::EmptyMesh)
        ));
    }
}
