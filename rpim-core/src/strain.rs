//! Strain-displacement operator.
//!
//! For each support node `i` the operator carries the block
//!
//! ```text
//! | ∂φ_i/∂x     0     |
//! |    0     ∂φ_i/∂y  |
//! | ∂φ_i/∂y  ∂φ_i/∂x  |
//! ```
//!
//! at columns `2i, 2i+1`, so that `ε = [ε_xx, ε_yy, γ_xy] = Ds · e_s` for the
//! interleaved local displacement vector `e_s`.

use crate::error::{Error, Result};
use crate::types::{PlaneStrain, DOFS_PER_NODE};
use nalgebra::{DMatrix, DVector, Vector3};

/// Strain-displacement matrix Ds (3 × 2ns) of one point.
#[derive(Debug, Clone, PartialEq)]
pub struct StrainOperator {
    ds: DMatrix<f64>,
}

impl StrainOperator {
    /// Build Ds from shape-function gradients (ns × 2).
    pub fn from_jacobian(jacobian: &DMatrix<f64>) -> Self {
        let ns = jacobian.nrows();
        let mut ds = DMatrix::zeros(3, DOFS_PER_NODE * ns);
        for i in 0..ns {
            let (dx, dy) = (jacobian[(i, 0)], jacobian[(i, 1)]);
            let c = DOFS_PER_NODE * i;
            ds[(0, c)] = dx;
            ds[(1, c + 1)] = dy;
            ds[(2, c)] = dy;
            ds[(2, c + 1)] = dx;
        }
        Self { ds }
    }

    /// The Ds matrix.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.ds
    }

    /// Number of local degrees of freedom (2ns).
    pub fn n_local_dofs(&self) -> usize {
        self.ds.ncols()
    }

    /// Strain produced by local nodal displacements.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `local` does not have 2ns entries.
    pub fn strain(&self, local: &DVector<f64>) -> Result<PlaneStrain> {
        if local.len() != self.ds.ncols() {
            return Err(Error::DimensionMismatch {
                expected: self.ds.ncols(),
                found: local.len(),
            });
        }
        let eps = &self.ds * local;
        Ok(PlaneStrain(Vector3::new(eps[0], eps[1], eps[2])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{shape_functions, ShapeParameters};
    use crate::types::Point2;
    use approx::assert_relative_eq;

    #[test]
    fn test_block_pattern() {
        let jac = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let op = StrainOperator::from_jacobian(&jac);
        #[rustfmt::skip]
        let expected = DMatrix::from_row_slice(3, 4, &[
            1.0, 0.0, 3.0, 0.0,
            0.0, 2.0, 0.0, 4.0,
            2.0, 1.0, 4.0, 3.0,
        ]);
        assert_eq!(op.matrix(), &expected);
        assert_eq!(op.n_local_dofs(), 4);
    }

    #[test]
    fn test_recovers_homogeneous_strain() {
        // u = (a·x + g1·y, b·y + g2·x): ε = (a, b, g1 + g2)
        let (a, b, g1, g2) = (1e-3, -4e-4, 2e-4, 5e-4);
        let support: Vec<Point2> = (0..16)
            .map(|k| Point2::new((k % 4) as f64, (k / 4) as f64))
            .collect();
        let params = ShapeParameters { ac: 1.0, dc: 1.0, q: 1.03 };
        let sf = shape_functions(&Point2::new(1.4, 1.8), &support, &params).unwrap();

        let local = DVector::from_iterator(
            32,
            support
                .iter()
                .flat_map(|p| [a * p.x + g1 * p.y, b * p.y + g2 * p.x]),
        );
        let eps = StrainOperator::from_jacobian(&sf.jacobian).strain(&local).unwrap();
        assert_relative_eq!(eps.0[0], a, epsilon = 1e-9);
        assert_relative_eq!(eps.0[1], b, epsilon = 1e-9);
        assert_relative_eq!(eps.0[2], g1 + g2, epsilon = 1e-9);
    }

    #[test]
    fn test_dimension_mismatch() {
        let op = StrainOperator::from_jacobian(&DMatrix::zeros(3, 2));
        assert!(matches!(
            op.strain(&DVector::zeros(4)),
            Err(Error::DimensionMismatch { expected: 6, found: 4 })
        ));
    }
}
