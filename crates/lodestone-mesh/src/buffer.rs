//! CPU-side render mesh buffers whose triangle lists get swapped on LOD changes.

use crate::simplify::SourceMesh;

/// Anything that accepts per-sub-mesh triangle list replacements.
pub trait TriangleSink {
    /// Number of sub-meshes that can be written.
    fn sub_mesh_count(&self) -> usize;

    /// Replace the triangle list of `sub_mesh`.
    ///
    /// Returns `false` (and changes nothing) if `sub_mesh` is out of range.
    fn set_triangles(&mut self, sub_mesh: usize, triangles: &[u32]) -> bool;
}

/// A render mesh: a vertex count plus one triangle list per sub-mesh.
///
/// Vertex data itself never changes on LOD switches, so only the count is
/// kept here. Shared originals live behind an `Arc`; objects that swap
/// triangles work on their own clone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MeshBuffer {
    /// Mesh name.
    pub name: String,
    /// Number of vertices the index lists refer to.
    pub vertex_count: usize,
    sub_meshes: Vec<Vec<u32>>,
    /// Number of triangle list writes since creation.
    revision: u64,
}

impl MeshBuffer {
    /// Create a buffer from per-sub-mesh triangle lists.
    pub fn new(name: impl Into<String>, vertex_count: usize, sub_meshes: Vec<Vec<u32>>) -> Self {
        Self {
            name: name.into(),
            vertex_count,
            sub_meshes,
            revision: 0,
        }
    }

    /// Create the render buffer for an imported source mesh.
    pub fn from_source(source: &SourceMesh) -> Self {
        Self::new(
            source.name.clone(),
            source.positions.len(),
            source.sub_meshes.clone(),
        )
    }

    /// Triangle list of one sub-mesh.
    pub fn triangles(&self, sub_mesh: usize) -> Option<&[u32]> {
        self.sub_meshes.get(sub_mesh).map(Vec::as_slice)
    }

    /// Total triangle count across sub-meshes.
    pub fn triangle_count(&self) -> usize {
        self.sub_meshes.iter().map(|s| s.len() / 3).sum()
    }

    /// Number of successful triangle list writes.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl TriangleSink for MeshBuffer {
    fn sub_mesh_count(&self) -> usize {
        self.sub_meshes.len()
    }

    fn set_triangles(&mut self, sub_mesh: usize, triangles: &[u32]) -> bool {
        let Some(slot) = self.sub_meshes.get_mut(sub_mesh) else {
            return false;
        };
        slot.clear();
        slot.extend_from_slice(triangles);
        self.revision += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Writing a sub-mesh replaces its list and bumps the revision.
    #[test]
    fn test_set_triangles_replaces_list() {
        let mut buffer = MeshBuffer::new("rock", 8, vec![vec![0, 1, 2, 2, 1, 3], vec![4, 5, 6]]);
        assert_eq!(buffer.triangle_count(), 3);
        assert!(buffer.set_triangles(0, &[0, 1, 2]));
        assert_eq!(buffer.triangles(0), Some(&[0, 1, 2][..]));
        assert_eq!(buffer.triangle_count(), 2);
        assert_eq!(buffer.revision(), 1);
    }

    /// Writing past the last sub-mesh is refused without side effects.
    #[test]
    fn test_out_of_range_write_ignored() {
        let mut buffer = MeshBuffer::new("rock", 3, vec![vec![0, 1, 2]]);
        assert!(!buffer.set_triangles(1, &[0, 1, 2]));
        assert_eq!(buffer.sub_mesh_count(), 1);
        assert_eq!(buffer.revision(), 0);
    }

    /// Clones are independent of the original.
    #[test]
    fn test_clone_is_independent() {
        let original = MeshBuffer::new("rock", 3, vec![vec![0, 1, 2]]);
        let mut copy = original.clone();
        copy.set_triangles(0, &[]);
        assert_eq!(original.triangles(0), Some(&[0, 1, 2][..]));
        assert_eq!(copy.triangles(0), Some(&[][..]));
    }

    /// A buffer built from a source mesh keeps its name, vertex count and lists.
    #[test]
    fn test_from_source() {
        let source = SourceMesh {
            name: "crate".to_string(),
            positions: vec![glam::Vec3::ZERO; 4],
            sub_meshes: vec![vec![0, 1, 2], vec![2, 1, 3]],
            ..SourceMesh::default()
        };
        let buffer = MeshBuffer::from_source(&source);
        assert_eq!(buffer.name, "crate");
        assert_eq!(buffer.vertex_count, 4);
        assert_eq!(buffer.sub_mesh_count(), 2);
    }
}
