//! Boundary/active partitioning of field nodes.
//!
//! Nodes lying within a thin band at the minimum-x end of the domain are
//! treated as the clamped boundary. The mesh is reindexed so that boundary
//! nodes come first (`0..B`) followed by the free nodes (`B..N`); this order
//! is the canonical degree-of-freedom order of the whole pipeline.

use crate::error::{Error, Result};
use crate::mesh::{Line, Mesh, Triangle};
use crate::types::{PointCloud, DOFS_PER_NODE};
use std::ops::Range;

/// Reindexed field-node mesh with its boundary split.
#[derive(Debug, Clone)]
pub struct FieldPartition {
    mesh: Mesh,
    n_boundary: usize,
    /// `old_index[new] = old`.
    old_index: Vec<usize>,
}

impl FieldPartition {
    /// Partition a raw mesh with the given boundary band fraction.
    ///
    /// A node is a boundary node when `x < x_min + scale * |x_max - x_min|`.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyMesh`] when the mesh has no nodes.
    /// - [`Error::IndexConsistency`] when an element references a node that
    ///   is not part of the mesh.
    pub fn new(raw: &Mesh, scale: f64) -> Result<Self> {
        let (min, max) = raw.bounds().ok_or(Error::EmptyMesh)?;
        let threshold = min.x + scale * (max.x - min.x).abs();

        let is_boundary: Vec<bool> = raw.nodes().iter().map(|p| p.x < threshold).collect();

        let old_index: Vec<usize> = (0..raw.n_nodes())
            .filter(|&i| is_boundary[i])
            .chain((0..raw.n_nodes()).filter(|&i| !is_boundary[i]))
            .collect();
        let n_boundary = is_boundary.iter().filter(|&&b| b).count();

        let mut new_index = vec![usize::MAX; raw.n_nodes()];
        for (new, &old) in old_index.iter().enumerate() {
            new_index[old] = new;
        }

        let remap = |old: usize| -> Result<usize> {
            match new_index.get(old) {
                Some(&new) if new != usize::MAX => Ok(new),
                _ => Err(Error::IndexConsistency(format!(
                    "element references node {} which is not in the field-node mesh ({} nodes)",
                    old,
                    raw.n_nodes()
                ))),
            }
        };

        let triangles = raw
            .triangles()
            .iter()
            .map(|&[a, b, c]| Ok::<Triangle, Error>([remap(a)?, remap(b)?, remap(c)?]))
            .collect::<Result<Vec<_>>>()?;
        let lines = raw
            .lines()
            .iter()
            .map(|&[a, b]| Ok::<Line, Error>([remap(a)?, remap(b)?]))
            .collect::<Result<Vec<_>>>()?;

        let nodes: PointCloud = old_index.iter().map(|&old| raw.nodes()[old]).collect();
        let node_indices = old_index.iter().map(|&old| raw.node_indices()[old]).collect();
        let mesh = Mesh::from_parts(nodes, triangles, lines)?.with_node_indices(node_indices)?;

        log::debug!(
            "field partition: {} boundary nodes, {} free nodes (x threshold {:.6})",
            n_boundary,
            raw.n_nodes() - n_boundary,
            threshold
        );

        Ok(Self {
            mesh,
            n_boundary,
            old_index,
        })
    }

    /// The reindexed field-node mesh.
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Consume the partition, keeping only the mesh.
    pub fn into_mesh(self) -> Mesh {
        self.mesh
    }

    /// Number of boundary nodes.
    pub fn n_boundary(&self) -> usize {
        self.n_boundary
    }

    /// Number of free (active) nodes.
    pub fn n_free(&self) -> usize {
        self.mesh.n_nodes() - self.n_boundary
    }

    /// Reindexed boundary node range.
    pub fn boundary_indices(&self) -> Range<usize> {
        0..self.n_boundary
    }

    /// Reindexed free node range.
    pub fn free_indices(&self) -> Range<usize> {
        self.n_boundary..self.mesh.n_nodes()
    }

    /// Index in the raw mesh of a reindexed node.
    pub fn original_index(&self, new: usize) -> Option<usize> {
        self.old_index.get(new).copied()
    }

    /// Number of boundary degrees of freedom.
    pub fn n_boundary_dofs(&self) -> usize {
        DOFS_PER_NODE * self.n_boundary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::fixtures::cantilever_grid;
    use crate::types::Point2;
    use std::collections::HashSet;

    #[test]
    fn test_empty_mesh_fails() {
        let result = FieldPartition::new(&Mesh::new(), 0.02);
        assert!(matches!(result, Err(Error::EmptyMesh)));
    }

    #[test]
    fn test_partition_is_bijection() {
        let raw = cantilever_grid();
        let part = FieldPartition::new(&raw, 0.02).unwrap();

        assert_eq!(part.n_boundary() + part.n_free(), raw.n_nodes());

        let seen: HashSet<usize> = (0..raw.n_nodes())
            .map(|i| part.original_index(i).unwrap())
            .collect();
        assert_eq!(seen.len(), raw.n_nodes());

        for new in 0..raw.n_nodes() {
            let old = part.original_index(new).unwrap();
            assert_eq!(part.mesh().nodes()[new], raw.nodes()[old]);
        }
    }

    #[test]
    fn test_boundary_nodes_come_first() {
        let raw = cantilever_grid();
        let part = FieldPartition::new(&raw, 0.02).unwrap();

        // threshold = 0 + 0.02 * 48 = 0.96, i.e. the 13 nodes of the x = 0 column
        assert_eq!(part.n_boundary(), 13);
        for i in part.boundary_indices() {
            assert!(part.mesh().nodes()[i].x < 0.96);
        }
        for i in part.free_indices() {
            assert!(part.mesh().nodes()[i].x >= 0.96);
        }
        assert_eq!(part.n_boundary_dofs(), 26);
    }

    #[test]
    fn test_elements_follow_the_permutation() {
        let raw = cantilever_grid();
        let part = FieldPartition::new(&raw, 0.02).unwrap();

        assert_eq!(part.mesh().n_triangles(), raw.n_triangles());
        assert_eq!(part.mesh().n_lines(), raw.n_lines());

        for (raw_tri, new_tri) in raw.triangles().iter().zip(part.mesh().triangles()) {
            for k in 0..3 {
                assert_eq!(part.original_index(new_tri[k]), Some(raw_tri[k]));
            }
        }
        for (raw_line, new_line) in raw.lines().iter().zip(part.mesh().lines()) {
            for k in 0..2 {
                assert_eq!(part.original_index(new_line[k]), Some(raw_line[k]));
            }
        }
    }

    #[test]
    fn test_external_node_ids_follow_the_permutation() {
        let raw = cantilever_grid();
        let ids: Vec<usize> = (0..raw.n_nodes()).map(|i| 1000 + 3 * i).collect();
        let raw = raw.with_node_indices(ids.clone()).unwrap();
        let part = FieldPartition::new(&raw, 0.02).unwrap();

        for new in 0..raw.n_nodes() {
            let old = part.original_index(new).unwrap();
            assert_eq!(part.mesh().node_indices()[new], ids[old]);
        }
        // The first boundary node is raw node 0 (x = 0, y = -6)
        assert_eq!(part.mesh().node_indices()[0], 1000);
    }

    #[test]
    fn test_relative_order_is_stable() {
        let mut raw = Mesh::new();
        raw.add_nodes([
            Point2::new(5.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(3.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(10.0, 1.0),
        ]);
        let part = FieldPartition::new(&raw, 0.02).unwrap();

        assert_eq!(part.n_boundary(), 2);
        let order: Vec<usize> = (0..5).map(|i| part.original_index(i).unwrap()).collect();
        assert_eq!(order, vec![1, 3, 0, 2, 4]);
    }
}
