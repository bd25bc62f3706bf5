//! External loads.
//!
//! Distributed loads are pure functions of a physical point and the current
//! global displacement vector. Nodal point loads are added directly to the
//! assembled force vector.

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::types::{Point2, Vec2, DOFS_PER_NODE};
use nalgebra::DVector;

/// Body force and surface traction fields.
pub trait Loading: Send + Sync {
    /// Body force per unit volume at `x`.
    fn external_force(&self, x: &Point2, q: &DVector<f64>) -> Vec2;

    /// Surface traction at boundary point `x`.
    fn external_traction(&self, x: &Point2, q: &DVector<f64>) -> Vec2;
}

/// No distributed load.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLoad;

impl Loading for NoLoad {
    fn external_force(&self, _x: &Point2, _q: &DVector<f64>) -> Vec2 {
        Vec2::zeros()
    }

    fn external_traction(&self, _x: &Point2, _q: &DVector<f64>) -> Vec2 {
        Vec2::zeros()
    }
}

/// Parabolic end shear on a cantilever of depth `depth` centred on y = 0.
///
/// `t_y = P/(2I)·(D²/4 - y²)` with `I = D³/12`, applied where `x >= x_end`.
/// No body force.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndShear {
    /// Beam depth D.
    pub depth: f64,
    /// Total shear load P.
    pub load: f64,
    /// Abscissa from which the traction acts.
    pub x_end: f64,
}

impl EndShear {
    /// Load case of the 48 × 12 cantilever benchmark.
    pub fn benchmark() -> Self {
        Self {
            depth: 12.0,
            load: -5.0e5,
            x_end: 47.8,
        }
    }

    /// Second moment of area per unit thickness.
    pub fn inertia(&self) -> f64 {
        self.depth.powi(3) / 12.0
    }
}

impl Loading for EndShear {
    fn external_force(&self, _x: &Point2, _q: &DVector<f64>) -> Vec2 {
        Vec2::zeros()
    }

    fn external_traction(&self, x: &Point2, _q: &DVector<f64>) -> Vec2 {
        if x.x >= self.x_end {
            let ty = 0.5 * (self.load / self.inertia())
                * (self.depth * self.depth / 4.0 - x.y * x.y);
            Vec2::new(0.0, ty)
        } else {
            Vec2::zeros()
        }
    }
}

/// Concentrated force on one field node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLoad {
    /// Field node id (partitioned order).
    pub node: usize,
    /// Force vector.
    pub force: Vec2,
}

impl PointLoad {
    /// Load on the node at the mid-height of the largest-x edge of the mesh.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mesh`] if no node lies within `tol` of that point.
    pub fn at_free_end(mesh: &Mesh, force: Vec2, tol: f64) -> Result<Self> {
        let (min, max) = mesh.bounds().ok_or(Error::EmptyMesh)?;
        let target = Point2::new(max.x, 0.5 * (min.y + max.y));
        let node = mesh
            .nodes()
            .iter()
            .position(|p| (p - target).norm() <= tol)
            .ok_or_else(|| {
                Error::Mesh(format!(
                    "no node within {} of ({}, {})",
                    tol, target.x, target.y
                ))
            })?;
        Ok(Self { node, force })
    }

    /// Global degrees of freedom of the loaded node.
    pub fn dofs(&self) -> [usize; 2] {
        [DOFS_PER_NODE * self.node, DOFS_PER_NODE * self.node + 1]
    }
}
