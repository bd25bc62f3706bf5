//! Gauss quadrature over background triangles.
//!
//! Rules are given in area coordinates (L1, L2, L3) for the 1, 3, 4 and 7
//! point families (Zienkiewicz, Table 9.2; Strang-Fix interior 3-point rule).
//! Weights are normalised so that every rule sums to 2, the cell scale factor
//! being half the triangle area. Every rule places its points strictly inside
//! the triangle.

use super::GaussPoint;
use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::types::{Point2, PointCloud};
use nalgebra::{Matrix2, Matrix3, Vector2};

/// Integration order over triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriangleRule {
    /// 1 point, exact for degree 1.
    Linear,
    /// 3 points, exact for degree 2.
    Quadratic,
    /// 4 points, exact for degree 3.
    Cubic,
    /// 7 points, exact for degree 5.
    Quintic,
}

impl TriangleRule {
    /// Every available rule.
    pub const ALL: [TriangleRule; 4] = [
        TriangleRule::Linear,
        TriangleRule::Quadratic,
        TriangleRule::Cubic,
        TriangleRule::Quintic,
    ];

    /// Rule with the given number of points.
    pub fn from_points(n: usize) -> Result<Self> {
        match n {
            1 => Ok(TriangleRule::Linear),
            3 => Ok(TriangleRule::Quadratic),
            4 => Ok(TriangleRule::Cubic),
            7 => Ok(TriangleRule::Quintic),
            _ => Err(Error::InvalidParameters(format!(
                "triangle rule must have 1, 3, 4 or 7 points, got {}",
                n
            ))),
        }
    }

    /// Number of points per triangle.
    pub fn n_points(self) -> usize {
        match self {
            TriangleRule::Linear => 1,
            TriangleRule::Quadratic => 3,
            TriangleRule::Cubic => 4,
            TriangleRule::Quintic => 7,
        }
    }

    /// Area coordinates and weights of the rule.
    pub fn points(self) -> Vec<GaussPoint> {
        const THIRD: f64 = 1.0 / 3.0;
        match self {
            TriangleRule::Linear => vec![GaussPoint::new([THIRD, THIRD, THIRD], 2.0)],
            TriangleRule::Quadratic => {
                let (a, b) = (2.0 / 3.0, 1.0 / 6.0);
                let w = 2.0 / 3.0;
                vec![
                    GaussPoint::new([a, b, b], w),
                    GaussPoint::new([b, a, b], w),
                    GaussPoint::new([b, b, a], w),
                ]
            }
            TriangleRule::Cubic => {
                let w_center = -27.0 / 24.0;
                let w_corner = 25.0 / 24.0;
                vec![
                    GaussPoint::new([THIRD, THIRD, THIRD], w_center),
                    GaussPoint::new([0.6, 0.2, 0.2], w_corner),
                    GaussPoint::new([0.2, 0.6, 0.2], w_corner),
                    GaussPoint::new([0.2, 0.2, 0.6], w_corner),
                ]
            }
            TriangleRule::Quintic => {
                let a1 = 0.059_715_871_789_770;
                let b1 = 0.470_142_064_105_115;
                let a2 = 0.797_426_985_353_087;
                let b2 = 0.101_286_507_323_456;
                let w0 = 2.0 * 0.225;
                let w1 = 2.0 * 0.132_394_152_788_506;
                let w2 = 2.0 * 0.125_939_180_544_827;
                vec![
                    GaussPoint::new([THIRD, THIRD, THIRD], w0),
                    GaussPoint::new([a1, b1, b1], w1),
                    GaussPoint::new([b1, a1, b1], w1),
                    GaussPoint::new([b1, b1, a1], w1),
                    GaussPoint::new([a2, b2, b2], w2),
                    GaussPoint::new([b2, a2, b2], w2),
                    GaussPoint::new([b2, b2, a2], w2),
                ]
            }
        }
    }

    /// Weights of the rule, in point order.
    pub fn weights(self) -> Vec<f64> {
        self.points().iter().map(|gp| gp.weight).collect()
    }
}

/// One background triangle used as an integration cell.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleCell {
    /// Index of the triangle in the mesh.
    pub index: usize,
    /// Triangle area.
    pub area: f64,
    /// Indices of the cell's quadrature points, in rule order.
    pub points: Vec<usize>,
}

impl TriangleCell {
    /// Jacobian scale matching the rule normalisation (area / 2).
    pub fn scale(&self) -> f64 {
        0.5 * self.area
    }
}

/// Volume quadrature points of a mesh.
#[derive(Debug, Clone)]
pub struct TriangleQuadrature {
    /// Rule used for every cell.
    pub rule: TriangleRule,
    /// Quadrature points, cell-major.
    pub points: PointCloud,
    /// One record per triangle, in mesh order.
    pub cells: Vec<TriangleCell>,
    /// Rule weights (independent of the cell).
    pub weights: Vec<f64>,
}

/// Area of a triangle from the 3×3 coordinate determinant.
pub fn triangle_area(v: &[Point2; 3]) -> f64 {
    let m = Matrix3::new(
        1.0, v[0].x, v[0].y,
        1.0, v[1].x, v[1].y,
        1.0, v[2].x, v[2].y,
    );
    0.5 * m.determinant().abs()
}

/// Map area coordinates (u, v) onto a triangle: `v3 + J·(u, v)`.
///
/// `J = [[x1 - x3, x2 - x3], [y1 - y3, y2 - y3]]`.
pub fn map_to_triangle(v: &[Point2; 3], u: f64, w: f64) -> Point2 {
    let j = Matrix2::new(
        v[0].x - v[2].x, v[1].x - v[2].x,
        v[0].y - v[2].y, v[1].y - v[2].y,
    );
    v[2] + j * Vector2::new(u, w)
}

impl TriangleQuadrature {
    /// Generate quadrature points over every triangle of the mesh.
    pub fn generate(mesh: &Mesh, rule: TriangleRule) -> Result<Self> {
        let gauss = rule.points();
        let mut points = PointCloud::with_capacity(mesh.n_triangles() * gauss.len());
        let mut cells = Vec::with_capacity(mesh.n_triangles());

        for index in 0..mesh.n_triangles() {
            let verts = mesh.triangle_coords(index).ok_or_else(|| {
                Error::IndexConsistency(format!("triangle {} references a missing node", index))
            })?;

            let cell_points = gauss
                .iter()
                .map(|gp| points.push(map_to_triangle(&verts, gp.coords[0], gp.coords[1])))
                .collect();

            cells.push(TriangleCell {
                index,
                area: triangle_area(&verts),
                points: cell_points,
            });
        }

        Ok(Self {
            rule,
            points,
            cells,
            weights: gauss.iter().map(|gp| gp.weight).collect(),
        })
    }

    /// Integrate a scalar function over the meshed area.
    pub fn integrate(&self, f: impl Fn(&Point2) -> f64) -> f64 {
        self.cells
            .iter()
            .map(|cell| {
                cell.points
                    .iter()
                    .zip(&self.weights)
                    .map(|(&p, &w)| w * f(&self.points[p]))
                    .sum::<f64>()
                    * cell.scale()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::fixtures::rectangular_grid;
    use approx::assert_relative_eq;

    fn single_triangle() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.add_nodes([Point2::new(1.0, 1.0), Point2::new(5.0, 2.0), Point2::new(2.0, 4.0)]);
        mesh.add_triangle([0, 1, 2]).unwrap();
        mesh
    }

    #[test]
    fn test_weights_sum_to_two() {
        for rule in TriangleRule::ALL {
            let sum: f64 = rule.weights().iter().sum();
            assert_relative_eq!(sum, 2.0, epsilon = 1e-12);
            assert_eq!(rule.points().len(), rule.n_points());
        }
    }

    #[test]
    fn test_barycentric_strictly_interior() {
        for rule in TriangleRule::ALL {
            for gp in rule.points() {
                let sum: f64 = gp.coords.iter().sum();
                assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
                for l in gp.coords {
                    assert!(l > 0.0 && l < 1.0, "{:?}: coordinate {} on boundary", rule, l);
                }
            }
        }
    }

    #[test]
    fn test_area_and_cell_layout() {
        let mesh = single_triangle();
        let quad = TriangleQuadrature::generate(&mesh, TriangleRule::Cubic).unwrap();

        assert_eq!(quad.points.len(), 4);
        assert_eq!(quad.cells.len(), 1);
        assert_eq!(quad.cells[0].points, vec![0, 1, 2, 3]);
        // 0.5 * |(4)(3) - (1)(1)| = 5.5
        assert_relative_eq!(quad.cells[0].area, 5.5, epsilon = 1e-12);
    }

    #[test]
    fn test_mapped_points_inside_triangle() {
        let mesh = single_triangle();
        let verts = mesh.triangle_coords(0).unwrap();
        for rule in TriangleRule::ALL {
            let quad = TriangleQuadrature::generate(&mesh, rule).unwrap();
            for p in quad.points.iter() {
                // Same-side test against each edge (counter-clockwise vertices)
                for k in 0..3 {
                    let a = verts[k];
                    let b = verts[(k + 1) % 3];
                    let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
                    assert!(cross > 0.0);
                }
            }
        }
    }

    #[test]
    fn test_centroid_rule_maps_to_centroid() {
        let mesh = single_triangle();
        let quad = TriangleQuadrature::generate(&mesh, TriangleRule::Linear).unwrap();
        assert_relative_eq!(quad.points[0], mesh.volume_centroids()[0], epsilon = 1e-12);
    }

    #[test]
    fn test_integrates_polynomials() {
        let mesh = rectangular_grid(Point2::new(0.0, 0.0), Point2::new(2.0, 1.0), 3, 3);

        for rule in TriangleRule::ALL {
            let quad = TriangleQuadrature::generate(&mesh, rule).unwrap();
            // ∫ 1 dA = 2
            assert_relative_eq!(quad.integrate(|_| 1.0), 2.0, epsilon = 1e-10);
            // ∫ x dA = 2
            assert_relative_eq!(quad.integrate(|p| p.x), 2.0, epsilon = 1e-10);
        }

        // ∫ x² y dA = (8/3)(1/2) = 4/3, degree 3
        for rule in [TriangleRule::Cubic, TriangleRule::Quintic] {
            let quad = TriangleQuadrature::generate(&mesh, rule).unwrap();
            assert_relative_eq!(quad.integrate(|p| p.x * p.x * p.y), 4.0 / 3.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_rule_from_points() {
        assert_eq!(TriangleRule::from_points(7).unwrap(), TriangleRule::Quintic);
        assert!(TriangleRule::from_points(2).is_err());
    }
}
