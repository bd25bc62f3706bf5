//! Top-level RPIM model.
//!
//! [`Rpim2D`] owns the partitioned field-node mesh, the merged quadrature
//! cloud and the current support domains. It follows an updated-geometry
//! scheme: every [`Rpim2D::update`] moves the field nodes to
//! `initial + displacement` and rebuilds the support domains from the moved
//! coordinates. Quadrature points stay where they were generated.
//!
//! # Example
//!
//! ```ignore
//! use rpim_core::{Rpim2D, RpimParameters};
//! use nalgebra::DVector;
//!
//! let params = RpimParameters::new(1.03, dc, dc_x, dc_y, 4.0)?;
//! let mut model = Rpim2D::initialize(&mesh, 1.0, params, false)?;
//! model.update(&DVector::zeros(model.n_dofs()))?;
//!
//! let geometry = model.geometry_model();
//! let kinematics = geometry.evaluate(0, &q)?;
//! ```

use crate::assembly::{assemble_partitioned, PartitionedSystem};
use crate::cloud::QuadratureCloud;
use crate::config::{RpimConfig, RpimParameters};
use crate::error::{Error, Result};
use crate::geometry::GeometryModel;
use crate::loading::{Loading, PointLoad};
use crate::mesh::Mesh;
use crate::partition::FieldPartition;
use crate::support::{support_size_range, trace_support_domains, SupportDomainPoint};
use crate::types::{Point2, PointCloud, DOFS_PER_NODE};
use nalgebra::DVector;
use rayon::prelude::*;

/// Meshfree RPIM model of a 2D elastic body.
#[derive(Debug, Clone)]
pub struct Rpim2D {
    params: RpimParameters,
    config: RpimConfig,
    thickness: f64,
    partition: FieldPartition,
    field_mesh: Mesh,
    quadrature: QuadratureCloud,
    initial_cloud: PointCloud,
    support_domains: Vec<SupportDomainPoint>,
}

impl Rpim2D {
    /// Build a model with default discretisation options.
    ///
    /// `animate` logs every support domain after each rebuild.
    pub fn initialize(
        mesh: &Mesh,
        thickness: f64,
        params: RpimParameters,
        animate: bool,
    ) -> Result<Self> {
        let config = RpimConfig {
            animate,
            ..RpimConfig::default()
        };
        Self::with_config(mesh, thickness, params, config)
    }

    /// Build a model: partition the field nodes, generate quadrature and the
    /// support domains of the undeformed configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidParameters`] for a bad thickness or configuration.
    /// - [`Error::EmptyMesh`] / [`Error::IndexConsistency`] from partitioning.
    pub fn with_config(
        mesh: &Mesh,
        thickness: f64,
        params: RpimParameters,
        config: RpimConfig,
    ) -> Result<Self> {
        config.validate()?;
        if !thickness.is_finite() || thickness <= 0.0 {
            return Err(Error::InvalidParameters(format!(
                "thickness must be positive, got {}",
                thickness
            )));
        }

        let partition = FieldPartition::new(mesh, config.boundary_scale)?;
        let field_mesh = partition.mesh().clone();
        let quadrature =
            QuadratureCloud::build(&field_mesh, config.volume_rule, config.surface_points)?;
        let initial_cloud = quadrature.cloud().clone();

        let mut model = Self {
            params,
            config,
            thickness,
            partition,
            field_mesh,
            quadrature,
            initial_cloud,
            support_domains: Vec::new(),
        };
        model.rebuild_support_domains()?;
        Ok(model)
    }

    /// Move the field nodes to `initial + q` and rebuild the support domains.
    ///
    /// # Errors
    ///
    /// - [`Error::DimensionMismatch`] if `q` does not have [`Rpim2D::n_dofs`]
    ///   entries.
    /// - [`Error::InvalidParameters`] if an entry of `q` is not finite. The
    ///   model is left untouched.
    pub fn update(&mut self, q: &DVector<f64>) -> Result<()> {
        self.check_state(q)?;

        let initial = self.partition.mesh().nodes();
        self.field_mesh
            .nodes_mut()
            .points_mut()
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, p)| *p = initial[i] + displacement(q, i));

        let initial_cloud = &self.initial_cloud;
        self.quadrature
            .field_points_mut()
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, p)| *p = initial_cloud[i] + displacement(q, i));

        self.rebuild_support_domains()
    }

    fn rebuild_support_domains(&mut self) -> Result<()> {
        let builder = self.config.search.builder();
        self.support_domains =
            builder.build(self.field_mesh.nodes(), self.quadrature.cloud(), &self.params)?;

        if let Some((min, max)) = support_size_range(&self.support_domains) {
            log::debug!(
                "{} search: {} support domains, {}..={} nodes each",
                builder.name(),
                self.support_domains.len(),
                min,
                max
            );
        }
        if self.config.animate {
            trace_support_domains(&self.support_domains, &self.params);
        }
        Ok(())
    }

    fn check_state(&self, q: &DVector<f64>) -> Result<()> {
        if q.len() != self.n_dofs() {
            return Err(Error::DimensionMismatch {
                expected: self.n_dofs(),
                found: q.len(),
            });
        }
        if let Some(dof) = q.iter().position(|v| !v.is_finite()) {
            return Err(Error::InvalidParameters(format!(
                "displacement dof {} is not finite ({})",
                dof, q[dof]
            )));
        }
        Ok(())
    }

    /// RPIM constants.
    pub fn params(&self) -> &RpimParameters {
        &self.params
    }

    /// Discretisation options.
    pub fn config(&self) -> &RpimConfig {
        &self.config
    }

    /// Out-of-plane thickness.
    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    /// Number of field nodes.
    pub fn n_field_nodes(&self) -> usize {
        self.field_mesh.n_nodes()
    }

    /// Number of global degrees of freedom.
    pub fn n_dofs(&self) -> usize {
        DOFS_PER_NODE * self.n_field_nodes()
    }

    /// Number of boundary (clamped) field nodes.
    pub fn n_boundary_nodes(&self) -> usize {
        self.partition.n_boundary()
    }

    /// Boundary/free split of the field nodes.
    pub fn partition(&self) -> &FieldPartition {
        &self.partition
    }

    /// Merged cloud with quadrature cells.
    pub fn cloud(&self) -> &QuadratureCloud {
        &self.quadrature
    }

    /// Current support domain of every quadrature point.
    pub fn support_domains(&self) -> &[SupportDomainPoint] {
        &self.support_domains
    }

    /// Field-node mesh in the current configuration.
    pub fn field_nodes_mesh(&self) -> &Mesh {
        &self.field_mesh
    }

    /// Field-node mesh in the reference configuration.
    pub fn initial_field_nodes_mesh(&self) -> &Mesh {
        self.partition.mesh()
    }

    /// Kinematics evaluator over the current support domains.
    pub fn geometry_model(&self) -> GeometryModel<'_> {
        GeometryModel::new(&self.support_domains, &self.params, &self.config.material)
    }

    /// Assemble the boundary-partitioned stiffness blocks and force vectors.
    pub fn assemble(
        &self,
        q: &DVector<f64>,
        loading: &dyn Loading,
        point_loads: &[PointLoad],
    ) -> Result<PartitionedSystem> {
        self.check_state(q)?;
        assemble_partitioned(self, q, loading, point_loads)
    }

    /// Boundary part `q[0..2B]` of a state vector.
    pub fn boundary_state_vector(&self, q: &DVector<f64>) -> Result<DVector<f64>> {
        self.check_state(q)?;
        Ok(q.rows(0, self.partition.n_boundary_dofs()).into_owned())
    }

    /// Full state vector from the free part, with the boundary clamped at zero.
    pub fn full_state_vector(&self, qa: &DVector<f64>) -> Result<DVector<f64>> {
        let n_boundary = self.partition.n_boundary_dofs();
        let n_free = self.n_dofs() - n_boundary;
        if qa.len() != n_free {
            return Err(Error::DimensionMismatch {
                expected: n_free,
                found: qa.len(),
            });
        }
        let mut q = DVector::zeros(self.n_dofs());
        q.rows_mut(n_boundary, n_free).copy_from(qa);
        Ok(q)
    }

    /// Deformed positions of arbitrary points of interest.
    ///
    /// The points are interpolated from the reference field nodes: each gets
    /// a support domain in the reference configuration and moves by `Φ·e_s`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidParameters`] for non-finite displacements or points.
    /// - [`Error::PointEvaluation`] (carrying the index into `points`) if a
    ///   point cannot be interpolated.
    pub fn deformed_state(&self, points: &PointCloud, q: &DVector<f64>) -> Result<PointCloud> {
        self.check_state(q)?;
        if let Some(idx) = points.iter().position(|p| !(p.x.is_finite() && p.y.is_finite())) {
            return Err(Error::InvalidParameters(format!(
                "point of interest {} has non-finite coordinates",
                idx
            )));
        }
        let field_nodes = self.partition.mesh().nodes();
        let mut cloud = PointCloud::with_capacity(field_nodes.len() + points.len());
        cloud.append(field_nodes);
        cloud.append(points);

        let domains = self.config.search.builder().build(field_nodes, &cloud, &self.params)?;
        let geometry = GeometryModel::new(&domains, &self.params, &self.config.material);

        geometry
            .evaluate_all(q)
            .into_iter()
            .zip(points.iter())
            .map(|(kinematics, p)| -> Result<Point2> { Ok(p + kinematics?.deformation()) })
            .collect()
    }

    /// Reference field-node mesh moved by `q`.
    pub fn deformed_mesh(&self, q: &DVector<f64>) -> Result<Mesh> {
        self.check_state(q)?;
        let mut mesh = self.partition.mesh().clone();
        for (i, p) in mesh.nodes_mut().points_mut().iter_mut().enumerate() {
            *p += displacement(q, i);
        }
        Ok(mesh)
    }
}

fn displacement(q: &DVector<f64>, node: usize) -> Point2 {
    Point2::new(q[DOFS_PER_NODE * node], q[DOFS_PER_NODE * node + 1])
}
