//! Error types for progressive mesh encoding, decoding and persistence.

/// Errors produced while building, validating or querying a progressive mesh.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    /// The number of LOD levels is zero or above [`crate::MAX_LOD_COUNT`].
    #[error("LOD count {count} is outside 1..={max}")]
    LodCountOutOfRange {
        /// Requested or stored level count.
        count: usize,
        /// Largest supported level count.
        max: usize,
    },

    /// A LOD level does not describe the same sub-objects and sub-meshes as LOD 0.
    #[error("LOD {lod} disagrees with LOD 0: expected {expected} {unit}, found {found}")]
    TopologyMismatch {
        /// Offending level.
        lod: usize,
        /// What was counted ("sub-objects" or "sub-meshes").
        unit: &'static str,
        /// Count established by LOD 0.
        expected: usize,
        /// Count found at `lod`.
        found: usize,
    },

    /// A triangle index list whose length is not a multiple of three.
    #[error("sub-mesh ({lod}, {sub_object}, {sub_mesh}) has {len} indices, not a whole number of triangles")]
    PartialTriangle {
        /// Level of the offending list.
        lod: usize,
        /// Sub-object of the offending list.
        sub_object: usize,
        /// Sub-mesh of the offending list.
        sub_mesh: usize,
        /// Number of indices in the list.
        len: usize,
    },

    /// More levels, sub-objects or sub-meshes were written than were declared.
    #[error("wrote more {0} than were declared")]
    SegmentOverflow(&'static str),

    /// A level or sub-object was closed before all declared entries were written.
    #[error("LOD {lod} was not completely written")]
    IncompleteSegment {
        /// Level that was left open.
        lod: usize,
    },

    /// No triangle list is stored at the requested coordinates.
    #[error("no triangle data for LOD {lod}, sub-object {sub_object}, sub-mesh {sub_mesh}")]
    TriangleDataNotFound {
        /// Requested level.
        lod: usize,
        /// Requested sub-object.
        sub_object: usize,
        /// Requested sub-mesh.
        sub_mesh: usize,
    },

    /// A packed stream whose length prefixes run past the end or leave trailing data.
    #[error("malformed packed data at offset {offset}")]
    Malformed {
        /// Position in the stream where the walk failed.
        offset: usize,
    },

    /// The simplification provider reported a failure.
    #[error("simplifier failed: {0}")]
    Simplifier(String),
}

/// Errors that can occur when saving or loading progressive mesh assets.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// Failed to read the asset file.
    #[error("failed to read asset: {0}")]
    ReadError(#[source] std::io::Error),

    /// Failed to write the asset file.
    #[error("failed to write asset: {0}")]
    WriteError(#[source] std::io::Error),

    /// The file is not valid RON or its packed data does not validate.
    #[error("failed to parse asset: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    /// Failed to serialize the asset to RON.
    #[error("failed to serialize asset: {0}")]
    SerializeError(#[source] ron::Error),
}
