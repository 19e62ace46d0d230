//! RON persistence for progressive mesh assets and collision-free asset naming.

use std::path::{Path, PathBuf};

use crate::error::AssetError;
use crate::progressive::ProgressiveMesh;

/// File extension used for progressive mesh assets.
pub const ASSET_EXTENSION: &str = "ron";

/// Build the asset file name for a model: `<stem><suffix>_progressive_mesh.ron`.
pub fn asset_file_name(model_stem: &str, suffix: &str) -> String {
    format!("{model_stem}{suffix}_progressive_mesh.{ASSET_EXTENSION}")
}

/// First path in `dir` for `file_name` that does not exist yet.
///
/// Tries `name.ext`, then `name 1.ext`, `name 2.ext`, and so on.
pub fn unique_asset_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let as_path = Path::new(file_name);
    let stem = as_path
        .file_stem()
        .map_or_else(|| file_name.to_string(), |s| s.to_string_lossy().into_owned());
    let extension = as_path
        .extension()
        .map(|e| e.to_string_lossy().into_owned());

    (1u32..)
        .map(|n| match &extension {
            Some(ext) => dir.join(format!("{stem} {n}.{ext}")),
            None => dir.join(format!("{stem} {n}")),
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

/// Write `mesh` to `path` as RON, creating parent directories as needed.
pub fn save_asset(mesh: &ProgressiveMesh, path: &Path) -> Result<(), AssetError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(AssetError::WriteError)?;
    }
    let pretty = ron::ser::PrettyConfig::new().depth_limit(1);
    let serialized = ron::ser::to_string_pretty(mesh, pretty).map_err(AssetError::SerializeError)?;
    std::fs::write(path, serialized).map_err(AssetError::WriteError)?;
    log::info!(
        "Saved progressive mesh ({} LODs, {} indices) to {}",
        mesh.lod_count(),
        mesh.packed().len(),
        path.display()
    );
    Ok(())
}

/// Read and validate a progressive mesh asset.
pub fn load_asset(path: &Path) -> Result<ProgressiveMesh, AssetError> {
    let contents = std::fs::read_to_string(path).map_err(AssetError::ReadError)?;
    let mesh: ProgressiveMesh = ron::from_str(&contents).map_err(AssetError::ParseError)?;
    log::debug!(
        "Loaded progressive mesh with {} LODs from {}",
        mesh.lod_count(),
        path.display()
    );
    Ok(mesh)
}
