//! RPIM Core - Radial Point Interpolation for 2D elasticity
//!
//! Meshfree kinematics over a moving point cloud:
//! - Boundary/free partitioning of field nodes
//! - Background triangle and line quadrature merged into one cloud
//! - Support domains from L1 radius searches over an R-tree
//! - Multiquadric RPIM shape functions with linear polynomial reproduction
//! - Per-point strain, stress, force and stiffness contributions
//! - Optional parallel assembly of boundary-partitioned global blocks
//!
//! # Architecture
//!
//! - [`Rpim2D`]: owns the field nodes, quadrature cloud and support domains
//! - [`SupportDomainBuilder`] trait: inverted or direct support search
//! - [`shape::shape_functions`]: pure evaluation of φ and ∇φ at a point
//! - [`GeometryModel`]: kinematics of one support domain for a displacement
//!
//! The library logs through the `log` facade and installs no logger.

pub mod assembly;
pub mod cloud;
pub mod config;
pub mod error;
pub mod geometry;
pub mod loading;
pub mod material;
pub mod mesh;
pub mod model;
pub mod partition;
pub mod quadrature;
pub mod shape;
pub mod sparse;
pub mod spatial;
pub mod strain;
pub mod support;
pub mod types;

pub use assembly::PartitionedSystem;
pub use cloud::QuadratureCloud;
pub use config::{RpimConfig, RpimParameters};
pub use error::{Error, Result};
pub use geometry::{GeometryModel, PointKinematics};
pub use loading::{EndShear, Loading, NoLoad, PointLoad};
pub use material::Material;
pub use mesh::Mesh;
pub use model::Rpim2D;
pub use shape::ShapeFunctionMeasures;
pub use sparse::CsrMatrix;
pub use support::{SearchStrategy, SupportDomainBuilder, SupportDomainPoint};
pub use types::{Point2, PointCloud};
