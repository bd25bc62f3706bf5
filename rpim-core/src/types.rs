//! Core data types for RPIM operations.
//!
//! This module defines fundamental types used throughout the crate:
//! - Geometric primitives (points, point clouds)
//! - Plane stress and strain vectors in Voigt notation

use nalgebra::{Vector2, Vector3};
use std::ops::Index;

/// A point in the plane.
pub type Point2 = Vector2<f64>;

/// A 2D vector (displacement, force, traction).
pub type Vec2 = Vector2<f64>;

/// Degrees of freedom carried by every field node (u, v).
pub const DOFS_PER_NODE: usize = 2;

/// Ordered, append-only collection of points.
///
/// The insertion order defines the global index of each point. Points can be
/// moved in place but never removed, so an index stays valid for the lifetime
/// of the cloud.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    pts: Vec<Point2>,
}

impl PointCloud {
    /// Create an empty cloud.
    pub fn new() -> Self {
        Self { pts: Vec::new() }
    }

    /// Create an empty cloud with reserved capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pts: Vec::with_capacity(capacity),
        }
    }

    /// Append a point, returning its index.
    pub fn push(&mut self, point: Point2) -> usize {
        let idx = self.pts.len();
        self.pts.push(point);
        idx
    }

    /// Append every point of another cloud, returning the index of the first one.
    pub fn append(&mut self, other: &PointCloud) -> usize {
        let offset = self.pts.len();
        self.pts.extend_from_slice(&other.pts);
        offset
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.pts.len()
    }

    /// Whether the cloud holds no points.
    pub fn is_empty(&self) -> bool {
        self.pts.is_empty()
    }

    /// Get a point by index.
    pub fn get(&self, idx: usize) -> Option<&Point2> {
        self.pts.get(idx)
    }

    /// All points in index order.
    pub fn points(&self) -> &[Point2] {
        &self.pts
    }

    /// Mutable view of the coordinates. The length cannot change through it.
    pub fn points_mut(&mut self) -> &mut [Point2] {
        &mut self.pts
    }

    /// Iterate over points in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, Point2> {
        self.pts.iter()
    }

    /// Axis-aligned bounding box as (min, max).
    pub fn bounds(&self) -> Option<(Point2, Point2)> {
        let first = *self.pts.first()?;
        Some(self.pts[1..].iter().fold((first, first), |(min, max), p| {
            (
                Point2::new(min.x.min(p.x), min.y.min(p.y)),
                Point2::new(max.x.max(p.x), max.y.max(p.y)),
            )
        }))
    }
}

impl Index<usize> for PointCloud {
    type Output = Point2;

    fn index(&self, idx: usize) -> &Point2 {
        &self.pts[idx]
    }
}

impl From<Vec<Point2>> for PointCloud {
    fn from(pts: Vec<Point2>) -> Self {
        Self { pts }
    }
}

impl FromIterator<Point2> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point2>>(iter: I) -> Self {
        Self {
            pts: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PointCloud {
    type Item = &'a Point2;
    type IntoIter = std::slice::Iter<'a, Point2>;

    fn into_iter(self) -> Self::IntoIter {
        self.pts.iter()
    }
}

/// In-plane stress in Voigt notation.
///
/// Components are ordered as: [σ_xx, σ_yy, τ_xy]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneStress(pub Vector3<f64>);

/// In-plane strain in Voigt notation.
///
/// Components are ordered as: [ε_xx, ε_yy, γ_xy] with γ = 2ε (engineering shear).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneStrain(pub Vector3<f64>);
