//! Parallel global assembly of RPIM contributions.
//!
//! Sums the per-point contributions of [`crate::geometry::PointKinematics`]
//! over the background quadrature and splits the result along the
//! boundary/free partition:
//!
//! ```text
//! | Kcc  Kca |   | f_c |
//! | Kac  Kaa |   | f_a |
//! ```
//!
//! Volume points contribute `w·(area/2)·t·K_el` and `w·(area/2)·t·(f_el + f_b)`,
//! surface points contribute `w·ls·t·f_t`. Point loads are added last.

use crate::cloud::PointKind;
use crate::error::{Error, Result};
use crate::geometry::GeometryModel;
use crate::loading::{Loading, PointLoad};
use crate::model::Rpim2D;
use crate::sparse::{csr_block, CsrMatrix, SparseVector, TripletMatrix};
use nalgebra::DVector;
use rayon::prelude::*;

/// Assembled system split along the boundary partition.
#[derive(Debug, Clone)]
pub struct PartitionedSystem {
    /// Full stiffness matrix.
    pub stiffness: CsrMatrix,
    /// Full force vector.
    pub force: DVector<f64>,
    /// Boundary-boundary block.
    pub kcc: CsrMatrix,
    /// Boundary-free block.
    pub kca: CsrMatrix,
    /// Free-free block.
    pub kaa: CsrMatrix,
    /// Boundary forces.
    pub fc: DVector<f64>,
    /// Free forces.
    pub fa: DVector<f64>,
}

/// One weighted integration point.
#[derive(Debug, Clone, Copy)]
struct Sample {
    /// Index of the support domain (cloud index minus field-node count).
    domain: usize,
    /// Weight × cell measure × thickness.
    scale: f64,
    kind: PointKind,
}

fn samples(model: &Rpim2D) -> Vec<Sample> {
    let qc = model.cloud();
    let n_field = qc.n_field_nodes();
    let t = model.thickness();

    let volume = qc.volume_cells().iter().flat_map(|cell| {
        cell.points
            .iter()
            .zip(qc.volume_weights())
            .map(move |(&p, &w)| Sample {
                domain: p - n_field,
                scale: w * cell.scale() * t,
                kind: PointKind::Volume,
            })
    });
    let surface = qc.surface_cells().iter().flat_map(|cell| {
        cell.points
            .iter()
            .zip(qc.surface_weights())
            .map(move |(&p, &w)| Sample {
                domain: p - n_field,
                scale: w * cell.scale() * t,
                kind: PointKind::Surface,
            })
    });
    volume.chain(surface).collect()
}

struct Partial {
    stiffness: TripletMatrix,
    force: SparseVector,
}

impl Partial {
    fn new(n_dofs: usize) -> Self {
        Self {
            stiffness: TripletMatrix::new(n_dofs, n_dofs),
            force: SparseVector::zeros(n_dofs),
        }
    }

    fn merge(mut self, other: Partial) -> Self {
        self.stiffness.extend(other.stiffness);
        self.force += &other.force;
        self
    }

    fn add_sample(
        mut self,
        geometry: &GeometryModel<'_>,
        sample: &Sample,
        q: &DVector<f64>,
        loading: &dyn Loading,
    ) -> Result<Self> {
        let k = geometry.evaluate(sample.domain, q)?;
        let dofs = k.dof_indices();
        match sample.kind {
            PointKind::Volume => {
                self.stiffness.add_submatrix(dofs, &k.local_stiffness(), sample.scale);
                let f = k.local_elastic_force() + k.local_body_force(loading, q);
                self.force.add_subvector(dofs, &f, sample.scale);
            }
            PointKind::Surface => {
                self.force
                    .add_subvector(dofs, &k.local_traction_force(loading, q), sample.scale);
            }
            PointKind::Field => {}
        }
        Ok(self)
    }
}

/// Assemble the partitioned stiffness blocks and force vectors of a model at
/// displacement `q`.
///
/// # Errors
///
/// - [`Error::PointEvaluation`] for the first quadrature point that fails.
/// - [`Error::Assembly`] for a point load on a missing node.
pub fn assemble_partitioned(
    model: &Rpim2D,
    q: &DVector<f64>,
    loading: &dyn Loading,
    point_loads: &[PointLoad],
) -> Result<PartitionedSystem> {
    let n_dofs = model.n_dofs();
    let geometry = model.geometry_model();
    let samples = samples(model);

    let partial = samples
        .par_iter()
        .try_fold(
            || Partial::new(n_dofs),
            |acc, sample| acc.add_sample(&geometry, sample, q, loading),
        )
        .try_reduce(|| Partial::new(n_dofs), |a, b| Ok(a.merge(b)))?;

    let mut force = partial.force;
    for load in point_loads {
        if load.node >= model.n_field_nodes() {
            return Err(Error::Assembly(format!(
                "point load on node {} but the model has {} field nodes",
                load.node,
                model.n_field_nodes()
            )));
        }
        let [dx, dy] = load.dofs();
        force.add(dx, load.force.x);
        force.add(dy, load.force.y);
    }

    let stiffness = partial.stiffness.to_csr()?;
    let force = force.into_dvector();
    let nb = model.partition().n_boundary_dofs();

    log::debug!(
        "assembled {} dofs ({} boundary), {} stiffness entries from {} samples",
        n_dofs,
        nb,
        stiffness.nnz(),
        samples.len()
    );

    Ok(PartitionedSystem {
        kcc: csr_block(&stiffness, 0..nb, 0..nb)?,
        kca: csr_block(&stiffness, 0..nb, nb..n_dofs)?,
        kaa: csr_block(&stiffness, nb..n_dofs, nb..n_dofs)?,
        fc: force.rows(0, nb).into_owned(),
        fa: force.rows(nb, n_dofs - nb).into_owned(),
        stiffness,
        force,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RpimParameters;
    use crate::loading::NoLoad;
    use crate::mesh::fixtures::rectangular_grid;
    use crate::types::{Point2, Vec2};
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    /// Uniform downward traction on the x = 4 edge.
    struct EdgeTraction;

    impl Loading for EdgeTraction {
        fn external_force(&self, _x: &Point2, _q: &DVector<f64>) -> Vec2 {
            Vec2::zeros()
        }

        fn external_traction(&self, x: &Point2, _q: &DVector<f64>) -> Vec2 {
            if x.x >= 3.99 {
                Vec2::new(0.0, -3.0)
            } else {
                Vec2::zeros()
            }
        }
    }

    fn model(thickness: f64) -> Rpim2D {
        let mesh = rectangular_grid(Point2::new(0.0, 0.0), Point2::new(4.0, 2.0), 5, 3);
        let params = RpimParameters::new(1.03, 1.0 / 3.0, 1.0, 1.0, 3.0).unwrap();
        Rpim2D::initialize(&mesh, thickness, params, false).unwrap()
    }

    #[test]
    fn test_stiffness_symmetric_with_rigid_modes() {
        let model = model(1.0);
        let n = model.n_dofs();
        let system = model.assemble(&DVector::zeros(n), &NoLoad, &[]).unwrap();
        let k = DMatrix::from(&system.stiffness);
        let scale = k.amax();

        assert_relative_eq!(k.clone(), k.transpose(), epsilon = 1e-9 * scale);
        for i in 0..n {
            assert!(k[(i, i)] > 0.0, "diagonal {} not positive", i);
        }

        // Rigid translations produce no forces
        let ux = DVector::from_iterator(n, (0..n).map(|i| if i % 2 == 0 { 1.0 } else { 0.0 }));
        let uy = DVector::from_iterator(n, (0..n).map(|i| if i % 2 == 1 { 1.0 } else { 0.0 }));
        assert!((&k * ux).amax() < 1e-6 * scale);
        assert!((&k * uy).amax() < 1e-6 * scale);
    }

    #[test]
    fn test_partition_blocks() {
        let model = model(1.0);
        let n = model.n_dofs();
        let nb = 2 * model.n_boundary_nodes();
        let system = model.assemble(&DVector::zeros(n), &NoLoad, &[]).unwrap();

        assert_eq!((system.kcc.nrows(), system.kcc.ncols()), (nb, nb));
        assert_eq!((system.kca.nrows(), system.kca.ncols()), (nb, n - nb));
        assert_eq!((system.kaa.nrows(), system.kaa.ncols()), (n - nb, n - nb));
        assert_eq!(system.fc.len() + system.fa.len(), n);

        let k = DMatrix::from(&system.stiffness);
        let kca = DMatrix::from(&system.kca);
        let kaa = DMatrix::from(&system.kaa);
        assert_eq!(kca[(1, 2)], k[(1, nb + 2)]);
        assert_eq!(kaa[(3, 0)], k[(nb + 3, nb)]);
    }

    #[test]
    fn test_external_forces_balance() {
        let thickness = 0.5;
        let model = model(thickness);
        let n = model.n_dofs();
        let tip = PointLoad {
            node: model.n_field_nodes() - 1,
            force: Vec2::new(2.0, -1.0),
        };
        let system = model.assemble(&DVector::zeros(n), &EdgeTraction, &[tip]).unwrap();

        let fx: f64 = system.force.iter().step_by(2).sum();
        let fy: f64 = system.force.iter().skip(1).step_by(2).sum();
        // traction -3 over an edge of length 2, plus the point load
        assert_relative_eq!(fx, 2.0, epsilon = 1e-8);
        assert_relative_eq!(fy, -3.0 * 2.0 * thickness - 1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_elastic_force_matches_stiffness() {
        let model = model(1.0);
        let n = model.n_dofs();
        let q = DVector::from_iterator(n, (0..n).map(|i| 1e-4 * ((i * 3 % 7) as f64 - 3.0)));
        let system = model.assemble(&q, &NoLoad, &[]).unwrap();
        let kq = DMatrix::from(&system.stiffness) * &q;
        assert_relative_eq!(system.force, -kq, epsilon = 1e-6, max_relative = 1e-8);
    }

    #[test]
    fn test_point_load_on_missing_node() {
        let model = model(1.0);
        let bad = PointLoad {
            node: model.n_field_nodes(),
            force: Vec2::zeros(),
        };
        let result = model.assemble(&DVector::zeros(model.n_dofs()), &NoLoad, &[bad]);
        assert!(matches!(result, Err(Error::Assembly(_))));
    }
}
