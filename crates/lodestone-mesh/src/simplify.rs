//! Contract with the mesh-simplification provider and the bake driver built on it.
//!
//! The provider is opaque: it is handed a source mesh once, then asked for
//! triangle lists at decreasing quality percentages, then released. [`bake`]
//! turns those answers into a [`ProgressiveMesh`], one sub-object per source
//! mesh.

use std::collections::HashMap;

use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::builder::ProgressiveMeshBuilder;
use crate::error::MeshError;
use crate::progressive::ProgressiveMesh;

/// A source mesh as imported, before any simplification.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceMesh {
    /// Name of the mesh, used for logging only.
    pub name: String,
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Vertex normals (may be empty).
    pub normals: Vec<Vec3>,
    /// Vertex colors (may be empty).
    pub colors: Vec<Vec4>,
    /// Texture coordinates (may be empty).
    pub uvs: Vec<Vec2>,
    /// Triangle index list per sub-mesh (material slot).
    pub sub_meshes: Vec<Vec<u32>>,
}

impl SourceMesh {
    /// Number of sub-meshes.
    pub fn sub_mesh_count(&self) -> usize {
        self.sub_meshes.len()
    }

    /// Total number of triangles across all sub-meshes.
    pub fn triangle_count(&self) -> usize {
        self.sub_meshes.iter().map(|s| s.len() / 3).sum()
    }
}

/// Features the simplifier should try to preserve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifyFlags {
    /// Keep open mesh borders in place.
    pub protect_boundary: bool,
    /// Spend more of the triangle budget on fine detail.
    pub protect_detail: bool,
    /// Keep mirrored halves symmetric.
    pub protect_symmetry: bool,
}

impl Default for SimplifyFlags {
    fn default() -> Self {
        Self {
            protect_boundary: true,
            protect_detail: false,
            protect_symmetry: false,
        }
    }
}

/// Buffers handed to [`Simplifier::create`].
#[derive(Clone, Copy, Debug)]
pub struct SimplifierInput<'a> {
    /// Vertex positions.
    pub positions: &'a [Vec3],
    /// Sub-mesh-length-prefixed triangle buffer, see [`flatten_sub_meshes`].
    pub triangles: &'a [u32],
    /// Vertex normals.
    pub normals: &'a [Vec3],
    /// Vertex colors.
    pub colors: &'a [Vec4],
    /// Texture coordinates.
    pub uvs: &'a [Vec2],
}

/// A mesh-simplification provider.
///
/// `query` answers with a sub-mesh-length-prefixed buffer in the same shape
/// as [`SimplifierInput::triangles`]. An empty answer means "no triangles at
/// this quality" for every sub-mesh.
pub trait Simplifier {
    /// Opaque handle to a prepared mesh.
    type Handle;

    /// Prepare a mesh for repeated queries.
    fn create(
        &mut self,
        input: &SimplifierInput<'_>,
        flags: SimplifyFlags,
    ) -> Result<Self::Handle, MeshError>;

    /// Triangle lists at `quality_percent` (0 to 100) of the original detail.
    fn query(&mut self, handle: &Self::Handle, quality_percent: f32) -> Result<Vec<u32>, MeshError>;

    /// Release a prepared mesh.
    fn dispose(&mut self, handle: Self::Handle);
}

/// Flatten sub-mesh triangle lists into `len_0, tris_0.., len_1, tris_1.., ...`.
pub fn flatten_sub_meshes(sub_meshes: &[Vec<u32>]) -> Vec<u32> {
    let total = sub_meshes.iter().map(|s| s.len() + 1).sum();
    let mut flat = Vec::with_capacity(total);
    for triangles in sub_meshes {
        flat.push(triangles.len() as u32);
        flat.extend_from_slice(triangles);
    }
    flat
}

/// Split a sub-mesh-length-prefixed buffer back into per-sub-mesh slices.
pub fn split_sub_meshes(flat: &[u32]) -> Result<Vec<&[u32]>, MeshError> {
    let mut parts = Vec::new();
    let mut pos = 0;
    while pos < flat.len() {
        let len = flat[pos] as usize;
        let start = pos + 1;
        let part = flat
            .get(start..start + len)
            .ok_or(MeshError::Malformed { offset: pos })?;
        parts.push(part);
        pos = start + len;
    }
    Ok(parts)
}

/// Quality percentage requested for `lod` out of `lod_count` levels.
///
/// LOD 0 is always 100%; each further level drops by `100 / lod_count`.
pub fn lod_quality(lod: usize, lod_count: usize) -> f32 {
    100.0 * (lod_count - lod) as f32 / lod_count as f32
}

/// Run `simplifier` over `meshes` and pack `lod_count` levels.
///
/// Each source mesh becomes one sub-object. All handles created here are
/// disposed before returning, whether or not baking succeeded.
pub fn bake<S: Simplifier>(
    simplifier: &mut S,
    meshes: &[SourceMesh],
    lod_count: usize,
    flags: SimplifyFlags,
) -> Result<ProgressiveMesh, MeshError> {
    let builder = ProgressiveMeshBuilder::new(lod_count)?;

    let mut handles = Vec::with_capacity(meshes.len());
    for mesh in meshes {
        let triangles = flatten_sub_meshes(&mesh.sub_meshes);
        let input = SimplifierInput {
            positions: &mesh.positions,
            triangles: &triangles,
            normals: &mesh.normals,
            colors: &mesh.colors,
            uvs: &mesh.uvs,
        };
        match simplifier.create(&input, flags) {
            Ok(handle) => handles.push(handle),
            Err(err) => {
                log::warn!("Simplifier rejected mesh '{}': {err}", mesh.name);
                for handle in handles {
                    simplifier.dispose(handle);
                }
                return Err(err);
            }
        }
    }

    let result = write_levels(simplifier, &handles, meshes, builder, lod_count);
    for handle in handles {
        simplifier.dispose(handle);
    }

    if let Ok(mesh) = &result {
        log::info!(
            "Baked {} LODs for {} meshes ({} -> {} triangles)",
            lod_count,
            meshes.len(),
            mesh.triangle_count(0),
            mesh.triangle_count(lod_count - 1)
        );
    }
    result
}

fn write_levels<S: Simplifier>(
    simplifier: &mut S,
    handles: &[S::Handle],
    meshes: &[SourceMesh],
    mut builder: ProgressiveMeshBuilder,
    lod_count: usize,
) -> Result<ProgressiveMesh, MeshError> {
    for lod in 0..lod_count {
        let quality = lod_quality(lod, lod_count);
        builder.begin_lod(meshes.len())?;
        for (mesh, handle) in meshes.iter().zip(handles) {
            let flat = simplifier.query(handle, quality)?;
            let sub_mesh_count = mesh.sub_mesh_count();
            builder.begin_sub_object(sub_mesh_count)?;
            if flat.is_empty() {
                for _ in 0..sub_mesh_count {
                    builder.push_sub_mesh(&[])?;
                }
                continue;
            }
            let parts = split_sub_meshes(&flat)?;
            if parts.len() != sub_mesh_count {
                return Err(MeshError::TopologyMismatch {
                    lod,
                    unit: "sub-meshes",
                    expected: sub_mesh_count,
                    found: parts.len(),
                });
            }
            for triangles in parts {
                builder.push_sub_mesh(triangles)?;
            }
        }
        log::debug!("Baked LOD {lod} at {quality:.1}% quality");
    }
    builder.finish()
}

/// Handle issued by [`PrefixSimplifier`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PrefixHandle(usize);

/// Deterministic stand-in provider that keeps the leading share of each sub-mesh.
///
/// At quality `q` every sub-mesh keeps its first `floor(triangles * q / 100)`
/// triangles. This is not a decimator; it exists so that baking, packing and
/// runtime switching can be exercised without a native simplifier.
#[derive(Debug, Default)]
pub struct PrefixSimplifier {
    meshes: HashMap<PrefixHandle, Vec<Vec<u32>>>,
    next_handle: usize,
}

impl PrefixSimplifier {
    /// Create a provider with no prepared meshes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles that have been created and not yet disposed.
    pub fn live_handles(&self) -> usize {
        self.meshes.len()
    }
}

impl Simplifier for PrefixSimplifier {
    type Handle = PrefixHandle;

    fn create(
        &mut self,
        input: &SimplifierInput<'_>,
        _flags: SimplifyFlags,
    ) -> Result<Self::Handle, MeshError> {
        let sub_meshes = split_sub_meshes(input.triangles)?
            .into_iter()
            .map(<[u32]>::to_vec)
            .collect();
        let handle = PrefixHandle(self.next_handle);
        self.next_handle += 1;
        self.meshes.insert(handle, sub_meshes);
        Ok(handle)
    }

    fn query(&mut self, handle: &Self::Handle, quality_percent: f32) -> Result<Vec<u32>, MeshError> {
        let sub_meshes = self
            .meshes
            .get(handle)
            .ok_or_else(|| MeshError::Simplifier(format!("unknown handle {}", handle.0)))?;
        let quality = quality_percent.clamp(0.0, 100.0);
        let kept: Vec<Vec<u32>> = sub_meshes
            .iter()
            .map(|triangles| {
                let keep = ((triangles.len() / 3) as f32 * quality / 100.0).floor() as usize;
                triangles[..keep * 3].to_vec()
            })
            .collect();
        Ok(flatten_sub_meshes(&kept))
    }

    fn dispose(&mut self, handle: Self::Handle) {
        self.meshes.remove(&handle);
    }
}
