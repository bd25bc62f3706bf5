//! Background mesh for RPIM integration.
//!
//! Stores nodal coordinates, triangular volume elements and boundary line
//! elements. The mesh is produced by an external generator and consumed as a
//! value object.

use crate::error::{Error, Result};
use crate::types::{Point2, PointCloud};

/// Node indices of a 3-node triangle.
pub type Triangle = [usize; 3];

/// Node indices of a 2-node boundary line.
pub type Line = [usize; 2];

/// Background mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// External node identifiers.
    node_indices: Vec<usize>,
    /// Nodal coordinates.
    nodes: PointCloud,
    /// Volume elements.
    triangles: Vec<Triangle>,
    /// Boundary elements.
    lines: Vec<Line>,
}

impl Mesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(n_nodes: usize, n_triangles: usize, n_lines: usize) -> Self {
        Self {
            node_indices: Vec::with_capacity(n_nodes),
            nodes: PointCloud::with_capacity(n_nodes),
            triangles: Vec::with_capacity(n_triangles),
            lines: Vec::with_capacity(n_lines),
        }
    }

    /// Build a mesh from raw parts, validating every element.
    pub fn from_parts(nodes: PointCloud, triangles: Vec<Triangle>, lines: Vec<Line>) -> Result<Self> {
        let mesh = Self {
            node_indices: (0..nodes.len()).collect(),
            nodes,
            triangles,
            lines,
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Replace the external node identifiers, one per node.
    pub fn with_node_indices(mut self, node_indices: Vec<usize>) -> Result<Self> {
        if node_indices.len() != self.nodes.len() {
            return Err(Error::Mesh(format!(
                "{} node identifiers for {} nodes",
                node_indices.len(),
                self.nodes.len()
            )));
        }
        self.node_indices = node_indices;
        Ok(self)
    }

    /// Add a node to the mesh, returning its index.
    pub fn add_node(&mut self, point: Point2) -> usize {
        let idx = self.nodes.push(point);
        self.node_indices.push(idx);
        idx
    }

    /// Add multiple nodes at once.
    pub fn add_nodes(&mut self, points: impl IntoIterator<Item = Point2>) {
        for p in points {
            self.add_node(p);
        }
    }

    /// Add a triangular volume element.
    pub fn add_triangle(&mut self, nodes: Triangle) -> Result<usize> {
        self.check_nodes(&nodes)?;
        let idx = self.triangles.len();
        self.triangles.push(nodes);
        Ok(idx)
    }

    /// Add a boundary line element.
    pub fn add_line(&mut self, nodes: Line) -> Result<usize> {
        self.check_nodes(&nodes)?;
        let idx = self.lines.len();
        self.lines.push(nodes);
        Ok(idx)
    }

    fn check_nodes(&self, nodes: &[usize]) -> Result<()> {
        for &node_idx in nodes {
            if node_idx >= self.nodes.len() {
                return Err(Error::Mesh(format!(
                    "Node index {} out of bounds (mesh has {} nodes)",
                    node_idx,
                    self.nodes.len()
                )));
            }
        }
        Ok(())
    }

    /// Check that every element references existing nodes.
    pub fn validate(&self) -> Result<()> {
        for tri in &self.triangles {
            self.check_nodes(tri)?;
        }
        for line in &self.lines {
            self.check_nodes(line)?;
        }
        Ok(())
    }

    /// Number of nodes in the mesh.
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of triangles.
    pub fn n_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Number of boundary lines.
    pub fn n_lines(&self) -> usize {
        self.lines.len()
    }

    /// External node identifiers.
    pub fn node_indices(&self) -> &[usize] {
        &self.node_indices
    }

    /// Nodal coordinates.
    pub fn nodes(&self) -> &PointCloud {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut PointCloud {
        &mut self.nodes
    }

    /// Get a specific node's coordinates.
    pub fn node(&self, idx: usize) -> Option<&Point2> {
        self.nodes.get(idx)
    }

    /// Volume elements.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Boundary elements.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Vertex coordinates of a triangle.
    pub fn triangle_coords(&self, idx: usize) -> Option<[Point2; 3]> {
        let [a, b, c] = *self.triangles.get(idx)?;
        Some([*self.nodes.get(a)?, *self.nodes.get(b)?, *self.nodes.get(c)?])
    }

    /// End point coordinates of a boundary line.
    pub fn line_coords(&self, idx: usize) -> Option<[Point2; 2]> {
        let [a, b] = *self.lines.get(idx)?;
        Some([*self.nodes.get(a)?, *self.nodes.get(b)?])
    }

    /// Centroid of every triangle.
    pub fn volume_centroids(&self) -> PointCloud {
        self.triangles
            .iter()
            .map(|&[a, b, c]| (self.nodes[a] + self.nodes[b] + self.nodes[c]) / 3.0)
            .collect()
    }

    /// Midpoint of every boundary line.
    pub fn surface_centroids(&self) -> PointCloud {
        self.lines
            .iter()
            .map(|&[a, b]| (self.nodes[a] + self.nodes[b]) / 2.0)
            .collect()
    }

    /// Compute mesh bounding box.
    pub fn bounds(&self) -> Option<(Point2, Point2)> {
        self.nodes.bounds()
    }
}
