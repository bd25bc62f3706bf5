//! RPIM shape functions.
//!
//! At an evaluation point `x` with support nodes `x_1..x_ns` the approximation
//! combines multiquadric radial basis functions
//!
//! ```text
//! r_i(x) = (|x - x_i|² + (ac·dc)²)^q
//! ```
//!
//! with the linear polynomial basis `p(x) = [1, x, y]`. The moment matrix
//!
//! ```text
//! G = | R  P |      R_ij = r_j(x_i),  P_ik = p_k(x_i)
//!     | Pᵀ 0 |
//! ```
//!
//! is symmetric, so the shape functions and their gradients are the first `ns`
//! rows of the solutions of `G·a = [r(x); p(x)]` and `G·A = [∇r(x); ∇p(x)]`.
//!
//! Evaluation is pure: every call returns a fresh [`ShapeFunctionMeasures`].

use crate::config::RpimParameters;
use crate::error::{Error, Result};
use crate::types::{Point2, Vec2, DOFS_PER_NODE};
use nalgebra::{DMatrix, DVector, Matrix2, Matrix3x2, Vector3};
use rayon::prelude::*;

/// Number of polynomial terms (linear basis in 2D).
pub const POLYNOMIAL_TERMS: usize = 3;

/// Relative threshold on the centred second-moment determinant below which a
/// support is treated as collinear.
const COLLINEAR_TOLERANCE: f64 = 1e-12;

/// Relative distance below which two support nodes are treated as one.
const COINCIDENCE_TOLERANCE: f64 = 1e-8;

/// Largest accepted deviation of Σφ from one.
const UNITY_TOLERANCE: f64 = 1e-8;

/// Supports below this size evaluate the radial block serially.
const PARALLEL_THRESHOLD: usize = 64;

/// Constants of the multiquadric basis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeParameters {
    /// Dimensionless shape constant.
    pub ac: f64,
    /// Characteristic nodal spacing.
    pub dc: f64,
    /// Exponent.
    pub q: f64,
}

impl ShapeParameters {
    /// Shape constants derived from the model parameters (`ac = as`).
    pub fn from_rpim(params: &RpimParameters) -> Self {
        Self {
            ac: params.alpha_s,
            dc: params.dc,
            q: params.q,
        }
    }

    /// Squared shape length `(ac·dc)²`.
    #[inline]
    pub fn c_squared(&self) -> f64 {
        let c = self.ac * self.dc;
        c * c
    }
}

/// Multiquadric basis value and gradient of node `xi` at `x`.
#[inline]
pub fn rbf_mq(x: &Point2, xi: &Point2, params: &ShapeParameters) -> (f64, Vec2) {
    let delta = x - xi;
    let base = delta.norm_squared() + params.c_squared();
    let value = base.powf(params.q);
    let gradient = delta * (2.0 * params.q * base.powf(params.q - 1.0));
    (value, gradient)
}

/// Linear polynomial basis `[1, x, y]` and its jacobian.
#[inline]
pub fn polynomial_basis(x: &Point2) -> (Vector3<f64>, Matrix3x2<f64>) {
    (
        Vector3::new(1.0, x.x, x.y),
        Matrix3x2::new(
            0.0, 0.0,
            1.0, 0.0,
            0.0, 1.0,
        ),
    )
}

/// Assemble the `(ns + 3) × (ns + 3)` moment matrix of a support.
pub fn moment_matrix(support: &[Point2], params: &ShapeParameters) -> DMatrix<f64> {
    let ns = support.len();
    let radial_row = |i: usize| -> Vec<f64> {
        support
            .iter()
            .map(|xj| rbf_mq(&support[i], xj, params).0)
            .collect()
    };
    let rows: Vec<Vec<f64>> = if ns >= PARALLEL_THRESHOLD {
        (0..ns).into_par_iter().map(radial_row).collect()
    } else {
        (0..ns).map(radial_row).collect()
    };

    let n = ns + POLYNOMIAL_TERMS;
    let mut g = DMatrix::zeros(n, n);
    for (i, row) in rows.iter().enumerate() {
        for (j, &value) in row.iter().enumerate() {
            g[(i, j)] = value;
        }
        let (p, _) = polynomial_basis(&support[i]);
        for k in 0..POLYNOMIAL_TERMS {
            g[(i, ns + k)] = p[k];
            g[(ns + k, i)] = p[k];
        }
    }
    g
}

/// Shape function values and derivatives at one point.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeFunctionMeasures {
    /// φ_i for each support node.
    pub values: DVector<f64>,
    /// ∂φ_i/∂x and ∂φ_i/∂y, one row per support node.
    pub jacobian: DMatrix<f64>,
    /// Interpolation matrix Φ (2 × 2ns): columns 2i, 2i+1 hold φ_i·I₂.
    pub matrix: DMatrix<f64>,
}

impl ShapeFunctionMeasures {
    /// Number of support nodes.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the support is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Σ φ_i.
    pub fn value_sum(&self) -> f64 {
        self.values.sum()
    }

    /// Σ ∇φ_i.
    pub fn gradient_sum(&self) -> Vec2 {
        Vec2::new(self.jacobian.column(0).sum(), self.jacobian.column(1).sum())
    }

    /// Gradient of the shape function of support node `i`.
    pub fn gradient(&self, i: usize) -> Vec2 {
        Vec2::new(self.jacobian[(i, 0)], self.jacobian[(i, 1)])
    }
}

/// Expand nodal shape values into the 2 × 2ns interpolation matrix.
pub fn interpolation_matrix(values: &DVector<f64>) -> DMatrix<f64> {
    let mut phi = DMatrix::zeros(DOFS_PER_NODE, DOFS_PER_NODE * values.len());
    for (i, &v) in values.iter().enumerate() {
        phi.fixed_view_mut::<2, 2>(0, DOFS_PER_NODE * i)
            .copy_from(&(Matrix2::identity() * v));
    }
    phi
}

fn check_support(support: &[Point2], params: &ShapeParameters) -> Result<()> {
    let ns = support.len();
    if ns == 0 {
        return Err(Error::InsufficientSupport {
            found: 0,
            required: POLYNOMIAL_TERMS,
        });
    }
    if ns < POLYNOMIAL_TERMS {
        return Err(Error::SingularMomentMatrix(format!(
            "{} support nodes cannot determine {} polynomial terms",
            ns, POLYNOMIAL_TERMS
        )));
    }

    let centroid = support.iter().fold(Point2::zeros(), |acc, p| acc + p) / ns as f64;
    let extent = support
        .iter()
        .map(|p| (p - centroid).norm())
        .fold(0.0, f64::max)
        .max(params.ac * params.dc);
    let tolerance = COINCIDENCE_TOLERANCE * extent;
    for i in 0..ns {
        for j in (i + 1)..ns {
            if (support[i] - support[j]).norm() <= tolerance {
                return Err(Error::SingularMomentMatrix(format!(
                    "support nodes {} and {} coincide at ({}, {})",
                    i, j, support[i].x, support[i].y
                )));
            }
        }
    }

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for p in support {
        let d = p - centroid;
        sxx += d.x * d.x;
        syy += d.y * d.y;
        sxy += d.x * d.y;
    }
    let trace = sxx + syy;
    if sxx * syy - sxy * sxy <= COLLINEAR_TOLERANCE * trace * trace {
        return Err(Error::SingularMomentMatrix(format!(
            "{} support nodes are collinear",
            ns
        )));
    }
    Ok(())
}

/// Evaluate the RPIM shape functions of a support at `x`.
///
/// # Errors
///
/// - [`Error::InsufficientSupport`] for an empty support.
/// - [`Error::SingularMomentMatrix`] when the support has fewer than three
///   nodes, coincident or collinear nodes, or `G` cannot be solved to finite
///   values that reproduce a constant field.
pub fn shape_functions(
    x: &Point2,
    support: &[Point2],
    params: &ShapeParameters,
) -> Result<ShapeFunctionMeasures> {
    check_support(support, params)?;
    let ns = support.len();
    let n = ns + POLYNOMIAL_TERMS;

    // Column 0: [r; p], columns 1-2: [∇r; ∇p]
    let mut rhs = DMatrix::zeros(n, 3);
    for (i, xi) in support.iter().enumerate() {
        let (r, dr) = rbf_mq(x, xi, params);
        rhs[(i, 0)] = r;
        rhs[(i, 1)] = dr.x;
        rhs[(i, 2)] = dr.y;
    }
    let (p, dp) = polynomial_basis(x);
    for k in 0..POLYNOMIAL_TERMS {
        rhs[(ns + k, 0)] = p[k];
        rhs[(ns + k, 1)] = dp[(k, 0)];
        rhs[(ns + k, 2)] = dp[(k, 1)];
    }

    let lu = moment_matrix(support, params).lu();
    if !lu.is_invertible() {
        return Err(Error::SingularMomentMatrix(format!(
            "LU factorisation of {}×{} moment matrix failed",
            n, n
        )));
    }
    let solution = lu.solve(&rhs).ok_or_else(|| {
        Error::SingularMomentMatrix("moment matrix solve failed".into())
    })?;
    if solution.iter().any(|v| !v.is_finite()) {
        return Err(Error::SingularMomentMatrix(
            "moment matrix solve produced non-finite coefficients".into(),
        ));
    }

    let values = DVector::from_iterator(ns, solution.column(0).rows(0, ns).iter().copied());
    let deviation = values.sum() - 1.0;
    if deviation.abs() > UNITY_TOLERANCE {
        return Err(Error::SingularMomentMatrix(format!(
            "shape functions sum to 1 {:+e}, moment matrix is ill-conditioned",
            deviation
        )));
    }
    let jacobian = solution.view((0, 1), (ns, 2)).into_owned();
    let matrix = interpolation_matrix(&values);

    Ok(ShapeFunctionMeasures {
        values,
        jacobian,
        matrix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn params(q: f64) -> ShapeParameters {
        ShapeParameters { ac: 1.0, dc: 1.0, q }
    }

    fn grid(n: usize) -> Vec<Point2> {
        (0..n * n)
            .map(|k| Point2::new((k % n) as f64, (k / n) as f64))
            .collect()
    }

    #[test]
    fn test_partition_of_unity() {
        let support = grid(3);
        for q in [1.03, 0.5] {
            for x in [Point2::new(0.4, 1.3), Point2::new(1.0, 1.0), Point2::new(1.9, 0.05)] {
                let sf = shape_functions(&x, &support, &params(q)).unwrap();
                assert_eq!(sf.len(), 9);
                assert_relative_eq!(sf.value_sum(), 1.0, epsilon = 1e-8);
                let grad = sf.gradient_sum();
                assert!(grad.norm() < 1e-8, "gradient sum {:?}", grad);
            }
        }
    }

    #[test]
    fn test_linear_reproduction() {
        let support = grid(4);
        let field = |p: &Point2| 2.0 - 0.5 * p.x + 3.0 * p.y;
        let x = Point2::new(1.7, 2.2);
        let sf = shape_functions(&x, &support, &params(1.03)).unwrap();

        let value: f64 = support.iter().enumerate().map(|(i, p)| sf.values[i] * field(p)).sum();
        assert_relative_eq!(value, field(&x), epsilon = 1e-8);

        let grad = support
            .iter()
            .enumerate()
            .fold(Vec2::zeros(), |acc, (i, p)| acc + sf.gradient(i) * field(p));
        assert_relative_eq!(grad.x, -0.5, epsilon = 1e-7);
        assert_relative_eq!(grad.y, 3.0, epsilon = 1e-7);
    }

    #[test]
    fn test_kronecker_delta_at_nodes() {
        let support = grid(3);
        for (k, node) in support.iter().enumerate() {
            let sf = shape_functions(node, &support, &params(1.03)).unwrap();
            for i in 0..support.len() {
                let expected = if i == k { 1.0 } else { 0.0 };
                assert_relative_eq!(sf.values[i], expected, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn test_interpolation_matrix_layout() {
        let support = grid(3);
        let sf = shape_functions(&Point2::new(0.3, 0.6), &support, &params(1.03)).unwrap();
        assert_eq!(sf.matrix.shape(), (2, 18));
        for i in 0..9 {
            assert_eq!(sf.matrix[(0, 2 * i)], sf.values[i]);
            assert_eq!(sf.matrix[(1, 2 * i + 1)], sf.values[i]);
            assert_eq!(sf.matrix[(0, 2 * i + 1)], 0.0);
            assert_eq!(sf.matrix[(1, 2 * i)], 0.0);
        }
    }

    #[test]
    fn test_rbf_gradient_matches_finite_difference() {
        let p = ShapeParameters { ac: 2.0, dc: 0.7, q: 1.03 };
        let x = Point2::new(0.3, -0.2);
        let xi = Point2::new(1.1, 0.4);
        let (_, grad) = rbf_mq(&x, &xi, &p);
        let h = 1e-6;
        let fd_x = (rbf_mq(&(x + Vec2::new(h, 0.0)), &xi, &p).0
            - rbf_mq(&(x - Vec2::new(h, 0.0)), &xi, &p).0)
            / (2.0 * h);
        let fd_y = (rbf_mq(&(x + Vec2::new(0.0, h)), &xi, &p).0
            - rbf_mq(&(x - Vec2::new(0.0, h)), &xi, &p).0)
            / (2.0 * h);
        assert_relative_eq!(grad.x, fd_x, epsilon = 1e-6);
        assert_relative_eq!(grad.y, fd_y, epsilon = 1e-6);
    }

    #[test]
    fn test_moment_matrix_is_symmetric() {
        let support = grid(3);
        let g = moment_matrix(&support, &params(1.03));
        assert_eq!(g.shape(), (12, 12));
        assert_relative_eq!(g.clone(), g.transpose(), epsilon = 1e-14);
        assert_eq!(g.view((9, 9), (3, 3)).iter().copied().sum::<f64>(), 0.0);
    }

    #[test]
    fn test_coincident_nodes_rejected() {
        let mut support = grid(3);
        support.push(support[4]);
        let err = shape_functions(&Point2::new(0.5, 0.5), &support, &params(1.03)).unwrap_err();
        assert!(matches!(err, Error::SingularMomentMatrix(_)));
    }

    #[test]
    fn test_nearly_coincident_nodes_rejected() {
        for offset in [1e-15, 1e-12, 1e-11, 1e-9] {
            let mut support = grid(3);
            support.push(support[4] + Vec2::new(offset, 0.0));
            let err = shape_functions(&Point2::new(0.5, 0.5), &support, &params(1.03)).unwrap_err();
            assert!(
                matches!(err, Error::SingularMomentMatrix(_)),
                "offset {} gave {:?}",
                offset,
                err
            );
        }
    }

    #[test]
    fn test_two_nodes_fail_deterministically() {
        let support = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)];
        for _ in 0..3 {
            let err = shape_functions(&Point2::new(0.5, 0.1), &support, &params(1.03)).unwrap_err();
            assert!(matches!(err, Error::SingularMomentMatrix(_)));
        }
    }

    #[test]
    fn test_collinear_support_rejected() {
        let support: Vec<Point2> = (0..5).map(|i| Point2::new(i as f64, 0.5 * i as f64)).collect();
        let err = shape_functions(&Point2::new(1.5, 0.7), &support, &params(1.03)).unwrap_err();
        assert!(matches!(err, Error::SingularMomentMatrix(_)));
    }

    #[test]
    fn test_empty_support() {
        let err = shape_functions(&Point2::new(0.0, 0.0), &[], &params(1.03)).unwrap_err();
        assert!(matches!(err, Error::InsufficientSupport { found: 0, required: 3 }));
    }

    #[test]
    fn test_from_rpim_uses_support_scale() {
        let rpim = RpimParameters::new(1.03, 2.0, 2.0, 1.0, 4.0).unwrap();
        let p = ShapeParameters::from_rpim(&rpim);
        assert_relative_eq!(p.ac, 4.0);
        assert_relative_eq!(p.c_squared(), 64.0);
    }
}
