//! Per-point kinematics and elastic contributions.
//!
//! [`GeometryModel`] turns a support domain and a global displacement vector
//! into everything a caller needs at that point: the local-to-global selector
//! `Ls`, local displacements `e_s = Ls·q`, shape functions `Φ`, the strain
//! operator `Ds`, strain and stress, and the unscaled force and stiffness
//! contributions
//!
//! ```text
//! f_el = -(Ds·Ls)ᵀ · C · ε
//! f_b  =  (Φ·Ls)ᵀ · b(x, q)
//! f_t  =  (Φ·Ls)ᵀ · t(x, q)
//! K_el =  Lsᵀ · Dsᵀ · C · Ds · Ls
//! ```
//!
//! Contributions are meant to be scaled by the owning cell's weight and
//! measure and summed by the caller.

use crate::config::RpimParameters;
use crate::error::{Error, Result};
use crate::loading::Loading;
use crate::material::Material;
use crate::shape::{shape_functions, ShapeFunctionMeasures, ShapeParameters};
use crate::sparse::{csr_mul_vec, csr_transpose_mul_vec, selector_matrix, CsrMatrix, TripletMatrix};
use crate::strain::StrainOperator;
use crate::support::SupportDomainPoint;
use crate::types::{PlaneStrain, PlaneStress, Point2, Vec2, DOFS_PER_NODE};
use nalgebra::{DMatrix, DVector, Matrix3};
use rayon::prelude::*;

/// Evaluates support domains against a displacement vector.
#[derive(Debug, Clone)]
pub struct GeometryModel<'a> {
    domains: &'a [SupportDomainPoint],
    shape: ShapeParameters,
    elasticity: Matrix3<f64>,
}

impl<'a> GeometryModel<'a> {
    /// Create a model over a set of support domains.
    pub fn new(domains: &'a [SupportDomainPoint], params: &RpimParameters, material: &Material) -> Self {
        Self {
            domains,
            shape: ShapeParameters::from_rpim(params),
            elasticity: material.elasticity_matrix(),
        }
    }

    /// Number of evaluable points.
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Whether there is nothing to evaluate.
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Support domains, in evaluation order.
    pub fn domains(&self) -> &'a [SupportDomainPoint] {
        self.domains
    }

    /// Elasticity matrix used for stresses and stiffness.
    pub fn elasticity(&self) -> &Matrix3<f64> {
        &self.elasticity
    }

    /// Evaluate the support domain at position `idx` for displacements `q`.
    ///
    /// # Errors
    ///
    /// Failures are returned as [`Error::PointEvaluation`] carrying `idx`.
    pub fn evaluate(&self, idx: usize, q: &DVector<f64>) -> Result<PointKinematics> {
        self.evaluate_inner(idx, q).map_err(|e| e.at_point(idx))
    }

    fn evaluate_inner(&self, idx: usize, q: &DVector<f64>) -> Result<PointKinematics> {
        let domain = self.domains.get(idx).ok_or_else(|| {
            Error::IndexConsistency(format!(
                "support domain {} out of range ({} domains)",
                idx,
                self.domains.len()
            ))
        })?;

        let dofs = dof_indices(&domain.support_indices);
        let mapping = selector_matrix(q.len(), &dofs)?;
        let local = csr_mul_vec(&mapping, q)?;

        let shape = shape_functions(&domain.point_coords, &domain.support_coords, &self.shape)?;
        let strain_operator = StrainOperator::from_jacobian(&shape.jacobian);
        let strain = strain_operator.strain(&local)?;

        Ok(PointKinematics {
            point_idx: domain.point_idx,
            coords: domain.point_coords,
            dofs,
            mapping,
            local,
            shape,
            strain_operator,
            strain,
            elasticity: self.elasticity,
        })
    }

    /// Evaluate every support domain in parallel.
    ///
    /// Each point's result is independent; a failure at one point leaves the
    /// others untouched.
    pub fn evaluate_all(&self, q: &DVector<f64>) -> Vec<Result<PointKinematics>> {
        (0..self.domains.len())
            .into_par_iter()
            .map(|idx| self.evaluate(idx, q))
            .collect()
    }
}

/// Interleaved global degrees of freedom of a list of nodes.
pub fn dof_indices(nodes: &[usize]) -> Vec<usize> {
    nodes
        .iter()
        .flat_map(|&node| (0..DOFS_PER_NODE).map(move |d| node * DOFS_PER_NODE + d))
        .collect()
}

/// Kinematic state of one point.
#[derive(Debug, Clone)]
pub struct PointKinematics {
    point_idx: usize,
    coords: Point2,
    dofs: Vec<usize>,
    mapping: CsrMatrix,
    local: DVector<f64>,
    shape: ShapeFunctionMeasures,
    strain_operator: StrainOperator,
    strain: PlaneStrain,
    elasticity: Matrix3<f64>,
}

impl PointKinematics {
    /// Index of the point in the merged cloud.
    pub fn point_idx(&self) -> usize {
        self.point_idx
    }

    /// Coordinates of the point.
    pub fn coords(&self) -> &Point2 {
        &self.coords
    }

    /// Global degrees of freedom of the local vector, in local order.
    pub fn dof_indices(&self) -> &[usize] {
        &self.dofs
    }

    /// Total number of global degrees of freedom.
    pub fn n_dofs(&self) -> usize {
        self.mapping.ncols()
    }

    /// Local-to-global selector Ls (2ns × n_dofs).
    pub fn mapping(&self) -> &CsrMatrix {
        &self.mapping
    }

    /// Local nodal displacements e_s.
    pub fn local_displacements(&self) -> &DVector<f64> {
        &self.local
    }

    /// Shape functions at the point.
    pub fn shape(&self) -> &ShapeFunctionMeasures {
        &self.shape
    }

    /// Strain-displacement operator Ds.
    pub fn strain_operator(&self) -> &StrainOperator {
        &self.strain_operator
    }

    /// Displacement of the point, Φ·e_s.
    pub fn deformation(&self) -> Vec2 {
        let u = &self.shape.matrix * &self.local;
        Vec2::new(u[0], u[1])
    }

    /// Φ·Ls (2 × n_dofs).
    pub fn deformation_jacobian(&self) -> DMatrix<f64> {
        self.scatter_columns(&self.shape.matrix)
    }

    /// Strain ε = Ds·e_s.
    pub fn strain(&self) -> PlaneStrain {
        self.strain
    }

    /// Ds·Ls (3 × n_dofs).
    pub fn strain_jacobian(&self) -> DMatrix<f64> {
        self.scatter_columns(self.strain_operator.matrix())
    }

    /// Stress σ = C·ε.
    pub fn stress(&self) -> PlaneStress {
        PlaneStress(self.elasticity * self.strain.0)
    }

    /// -Dsᵀ·C·ε (2ns).
    pub fn local_elastic_force(&self) -> DVector<f64> {
        let sigma = DVector::from_column_slice(self.stress().0.as_slice());
        -(self.strain_operator.matrix().transpose() * sigma)
    }

    /// -Lsᵀ·Dsᵀ·C·ε (n_dofs).
    pub fn elastic_force(&self) -> Result<DVector<f64>> {
        csr_transpose_mul_vec(&self.mapping, &self.local_elastic_force())
    }

    /// Φᵀ·b(x, q) (2ns).
    pub fn local_body_force(&self, loading: &dyn Loading, q: &DVector<f64>) -> DVector<f64> {
        self.project(loading.external_force(&self.coords, q))
    }

    /// (Φ·Ls)ᵀ·b(x, q) (n_dofs).
    pub fn body_force(&self, loading: &dyn Loading, q: &DVector<f64>) -> Result<DVector<f64>> {
        csr_transpose_mul_vec(&self.mapping, &self.local_body_force(loading, q))
    }

    /// Φᵀ·t(x, q) (2ns).
    pub fn local_traction_force(&self, loading: &dyn Loading, q: &DVector<f64>) -> DVector<f64> {
        self.project(loading.external_traction(&self.coords, q))
    }

    /// (Φ·Ls)ᵀ·t(x, q) (n_dofs).
    pub fn traction_force(&self, loading: &dyn Loading, q: &DVector<f64>) -> Result<DVector<f64>> {
        csr_transpose_mul_vec(&self.mapping, &self.local_traction_force(loading, q))
    }

    /// Dsᵀ·C·Ds (2ns × 2ns).
    pub fn local_stiffness(&self) -> DMatrix<f64> {
        let ds = self.strain_operator.matrix();
        let c = DMatrix::from_column_slice(3, 3, self.elasticity.as_slice());
        ds.transpose() * c * ds
    }

    /// Lsᵀ·Dsᵀ·C·Ds·Ls (n_dofs × n_dofs).
    pub fn stiffness(&self) -> Result<CsrMatrix> {
        let n = self.n_dofs();
        let ke = self.local_stiffness();
        let mut triplets = TripletMatrix::with_capacity(n, n, self.dofs.len() * self.dofs.len());
        triplets.add_submatrix(&self.dofs, &ke, 1.0);
        triplets.to_csr()
    }

    fn project(&self, v: Vec2) -> DVector<f64> {
        self.shape.matrix.transpose() * DVector::from_column_slice(v.as_slice())
    }

    /// `A·Ls` for a dense `A` with 2ns columns.
    fn scatter_columns(&self, a: &DMatrix<f64>) -> DMatrix<f64> {
        let mut out = DMatrix::zeros(a.nrows(), self.n_dofs());
        for (local, global, &v) in self.mapping.triplet_iter() {
            let mut column = out.column_mut(global);
            column.axpy(v, &a.column(local), 1.0);
        }
        out
    }
}
