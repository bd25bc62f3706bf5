//! Background-cell quadrature.
//!
//! Integration cells come from the background mesh: triangles carry the
//! volume integral, boundary lines carry the surface (traction) integral.
//!
//! # Submodules
//!
//! - [`triangle`] - Gauss rules over triangles and volume point generation
//! - [`line`] - Gauss-Legendre rules and surface point generation
//!
//! Both generators return their points in a local cloud, cell-major and
//! point-minor, and cells that list local point indices. The weights of a rule
//! are shared by every cell; a caller integrates with
//! `Σ weight[k] · cell.scale() · f(x_k)`.

pub mod line;
pub mod triangle;

pub use line::{gauss_legendre, LineCell, LineQuadrature};
pub use triangle::{TriangleCell, TriangleQuadrature, TriangleRule};

/// A quadrature point in reference coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussPoint {
    /// Reference coordinates.
    /// - For lines: [ξ, 0, 0] with ξ ∈ [-1, 1]
    /// - For triangles: [L1, L2, L3] barycentric, sum = 1
    pub coords: [f64; 3],
    /// Integration weight.
    pub weight: f64,
}

impl GaussPoint {
    /// Create a new Gauss point.
    pub fn new(coords: [f64; 3], weight: f64) -> Self {
        Self { coords, weight }
    }

    /// Get ξ (first reference coordinate).
    #[inline]
    pub fn xi(&self) -> f64 {
        self.coords[0]
    }
}

/// Shift local point indices of a set of cells into a global cloud.
pub(crate) fn rebase(points: &mut [usize], offset: usize) {
    for p in points {
        *p += offset;
    }
}
