//! LOD runtime error types.

/// Errors reported by LOD selection, scheduling and managed objects.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LodError {
    /// A LOD index outside the levels stored in the progressive mesh.
    #[error("LOD {lod} is out of range, select a LOD between 0 and {}", .available.saturating_sub(1))]
    InvalidLodIndex {
        /// Requested level.
        lod: u32,
        /// Number of stored levels.
        available: usize,
    },

    /// `min_lod` greater than `max_lod`, or `max_lod` beyond the format's limit.
    #[error("invalid LOD bounds: min {min}, max {max}")]
    InvalidBounds {
        /// Lower bound.
        min: u32,
        /// Upper bound.
        max: u32,
    },

    /// A cull ratio outside `[0, 1]`.
    #[error("cull ratio {0} is outside [0, 1]")]
    InvalidCullRatio(f32),

    /// A scheduler needs at least one bucket.
    #[error("scheduler needs at least one bucket")]
    InvalidBucketCount,

    /// An intensity name that is not one of the known levels.
    #[error("unknown switch intensity '{0}' (expected lowest, low, medium, high or extreme)")]
    UnknownIntensity(String),
}
