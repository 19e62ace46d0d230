//! Progressive mesh data: the packed multi-LOD triangle format, its streaming
//! encoder and decoder, the simplifier contract used to bake it, and the render
//! buffers it gets applied to.

pub mod asset;
pub mod buffer;
pub mod builder;
pub mod error;
pub mod progressive;
pub mod simplify;

pub use asset::{asset_file_name, load_asset, save_asset, unique_asset_path};
pub use buffer::{MeshBuffer, TriangleSink};
pub use builder::{ProgressiveMeshBuilder, encode};
pub use error::{AssetError, MeshError};
pub use progressive::{MAX_LOD_COUNT, ProgressiveMesh, Segment, Segments};
pub use simplify::{
    PrefixHandle, PrefixSimplifier, Simplifier, SimplifierInput, SimplifyFlags, SourceMesh, bake,
    flatten_sub_meshes, lod_quality, split_sub_meshes,
};
