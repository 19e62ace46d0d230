//! Packed progressive mesh: every LOD level of every sub-object and sub-mesh in one flat `u32` stream.
//!
//! Stream layout:
//!
//! ```text
//! lod_count
//!   sub_object_count                          (once per LOD)
//!     sub_mesh_count                          (once per sub-object)
//!       index_count, index_0 .. index_{n-1}   (once per sub-mesh)
//! ```
//!
//! There is no offset table. Every lookup walks the length prefixes from the
//! start of the stream, so a lookup costs O(bytes before the target). Lookups
//! only happen on LOD transitions.

use serde::{Deserialize, Serialize};

use crate::error::MeshError;

/// Maximum number of LOD levels a progressive mesh may store.
pub const MAX_LOD_COUNT: usize = 20;

/// All LOD levels of a model, packed into a single validated index stream.
///
/// Every level describes the same sub-objects with the same number of
/// sub-meshes; only the triangle lists differ. Instances are immutable and
/// are meant to be shared read-only (typically behind an `Arc`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PackedTriangles", into = "PackedTriangles")]
pub struct ProgressiveMesh {
    packed: Vec<u32>,
    /// Sub-mesh count of each sub-object, identical for every level.
    topology: Vec<usize>,
}

/// On-disk form: the packed stream as a single array field.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename = "ProgressiveMesh")]
struct PackedTriangles {
    triangles: Vec<u32>,
}

impl TryFrom<PackedTriangles> for ProgressiveMesh {
    type Error = MeshError;

    fn try_from(value: PackedTriangles) -> Result<Self, Self::Error> {
        Self::from_packed(value.triangles)
    }
}

impl From<ProgressiveMesh> for PackedTriangles {
    fn from(mesh: ProgressiveMesh) -> Self {
        Self {
            triangles: mesh.packed,
        }
    }
}

/// One triangle list encountered while walking the packed stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment<'a> {
    /// LOD level.
    pub lod: usize,
    /// Sub-object within the level.
    pub sub_object: usize,
    /// Sub-mesh within the sub-object.
    pub sub_mesh: usize,
    /// Vertex index triples.
    pub indices: &'a [u32],
}

impl ProgressiveMesh {
    /// Wrap a stream already known to be well formed.
    pub(crate) fn from_validated(packed: Vec<u32>, topology: Vec<usize>) -> Self {
        Self { packed, topology }
    }

    /// Validate a packed stream and wrap it.
    ///
    /// The whole stream is walked once: the level count must be in
    /// `1..=MAX_LOD_COUNT`, every length prefix must stay inside the buffer,
    /// every list must hold whole triangles, all levels must share LOD 0's
    /// topology and nothing may follow the last list.
    pub fn from_packed(packed: Vec<u32>) -> Result<Self, MeshError> {
        let topology = validate(&packed)?;
        Ok(Self { packed, topology })
    }

    /// The packed stream, exactly as persisted.
    pub fn packed(&self) -> &[u32] {
        &self.packed
    }

    /// Consume the mesh and return the packed stream.
    pub fn into_packed(self) -> Vec<u32> {
        self.packed
    }

    /// Number of stored LOD levels.
    pub fn lod_count(&self) -> usize {
        self.packed.first().map_or(0, |&count| count as usize)
    }

    /// Number of sub-objects in every level.
    pub fn sub_object_count(&self) -> usize {
        self.topology.len()
    }

    /// Number of sub-meshes of `sub_object` in every level.
    pub fn sub_mesh_count(&self, sub_object: usize) -> Option<usize> {
        self.topology.get(sub_object).copied()
    }

    /// Walk every stored triangle list in stream order.
    pub fn segments(&self) -> Segments<'_> {
        Segments {
            data: &self.packed,
            topology: &self.topology,
            lod_count: self.lod_count(),
            pos: 1,
            lod: 0,
            sub_object: 0,
            sub_mesh: 0,
            enter_lod: true,
            enter_sub_object: true,
        }
    }

    /// Look up the triangle list stored at `(lod, sub_object, sub_mesh)`.
    ///
    /// Coordinates outside the stored ranges yield
    /// [`MeshError::TriangleDataNotFound`]. An empty list is a valid result:
    /// it means the sub-mesh has no triangles at that level.
    pub fn decode(
        &self,
        lod: usize,
        sub_object: usize,
        sub_mesh: usize,
    ) -> Result<&[u32], MeshError> {
        self.triangles(lod, sub_object, sub_mesh)
            .ok_or(MeshError::TriangleDataNotFound {
                lod,
                sub_object,
                sub_mesh,
            })
    }

    /// Like [`Self::decode`], returning `None` on a miss.
    pub fn triangles(&self, lod: usize, sub_object: usize, sub_mesh: usize) -> Option<&[u32]> {
        if lod >= self.lod_count() || sub_mesh >= self.sub_mesh_count(sub_object)? {
            return None;
        }
        self.segments()
            .find(|s| s.lod == lod && s.sub_object == sub_object && s.sub_mesh == sub_mesh)
            .map(|s| s.indices)
    }

    /// Total number of indices stored for one level, across all sub-meshes.
    pub fn index_count(&self, lod: usize) -> usize {
        self.segments()
            .filter(|s| s.lod == lod)
            .map(|s| s.indices.len())
            .sum()
    }

    /// Total number of triangles stored for one level.
    pub fn triangle_count(&self, lod: usize) -> usize {
        self.index_count(lod) / 3
    }
}

/// Iterator over the triangle lists of a [`ProgressiveMesh`] in stream order.
pub struct Segments<'a> {
    data: &'a [u32],
    topology: &'a [usize],
    lod_count: usize,
    pos: usize,
    lod: usize,
    sub_object: usize,
    sub_mesh: usize,
    enter_lod: bool,
    enter_sub_object: bool,
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.lod < self.lod_count {
            if self.enter_lod {
                // sub_object_count
                self.pos += 1;
                self.enter_lod = false;
            }
            if let Some(&sub_mesh_count) = self.topology.get(self.sub_object) {
                if self.enter_sub_object {
                    // sub_mesh_count
                    self.pos += 1;
                    self.enter_sub_object = false;
                }
                if self.sub_mesh < sub_mesh_count {
                    let len = *self.data.get(self.pos)? as usize;
                    let start = self.pos + 1;
                    let indices = self.data.get(start..start + len)?;
                    let segment = Segment {
                        lod: self.lod,
                        sub_object: self.sub_object,
                        sub_mesh: self.sub_mesh,
                        indices,
                    };
                    self.pos = start + len;
                    self.sub_mesh += 1;
                    return Some(segment);
                }
                self.sub_object += 1;
                self.sub_mesh = 0;
                self.enter_sub_object = true;
                continue;
            }
            self.lod += 1;
            self.sub_object = 0;
            self.sub_mesh = 0;
            self.enter_lod = true;
            self.enter_sub_object = true;
        }
        None
    }
}

/// Bounds-checked reader over the packed stream.
struct Cursor<'a> {
    data: &'a [u32],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn read(&mut self) -> Result<usize, MeshError> {
        let value = *self
            .data
            .get(self.pos)
            .ok_or(MeshError::Malformed { offset: self.pos })?;
        self.pos += 1;
        Ok(value as usize)
    }

    fn skip(&mut self, len: usize) -> Result<(), MeshError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(MeshError::Malformed { offset: self.pos })?;
        self.pos = end;
        Ok(())
    }
}

/// Walk the stream once, returning LOD 0's topology if everything checks out.
fn validate(data: &[u32]) -> Result<Vec<usize>, MeshError> {
    let mut cursor = Cursor { data, pos: 0 };
    let lod_count = cursor.read()?;
    if lod_count == 0 || lod_count > MAX_LOD_COUNT {
        return Err(MeshError::LodCountOutOfRange {
            count: lod_count,
            max: MAX_LOD_COUNT,
        });
    }

    let mut topology: Vec<usize> = Vec::new();
    for lod in 0..lod_count {
        let sub_objects = cursor.read()?;
        if lod > 0 && sub_objects != topology.len() {
            return Err(MeshError::TopologyMismatch {
                lod,
                unit: "sub-objects",
                expected: topology.len(),
                found: sub_objects,
            });
        }
        for sub_object in 0..sub_objects {
            let sub_meshes = cursor.read()?;
            if lod == 0 {
                topology.push(sub_meshes);
            } else if topology[sub_object] != sub_meshes {
                return Err(MeshError::TopologyMismatch {
                    lod,
                    unit: "sub-meshes",
                    expected: topology[sub_object],
                    found: sub_meshes,
                });
            }
            for sub_mesh in 0..sub_meshes {
                let len = cursor.read()?;
                if len % 3 != 0 {
                    return Err(MeshError::PartialTriangle {
                        lod,
                        sub_object,
                        sub_mesh,
                        len,
                    });
                }
                cursor.skip(len)?;
            }
        }
    }

    if cursor.pos != data.len() {
        return Err(MeshError::Malformed { offset: cursor.pos });
    }
    Ok(topology)
}
