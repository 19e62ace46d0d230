//! Streaming encoder for [`ProgressiveMesh`].
//!
//! [`ProgressiveMeshBuilder`] appends length-prefixed segments straight into
//! the packed stream, so callers never need to hold every level's triangle
//! lists at once. The builder checks the declared counts as it goes and
//! enforces that every level repeats LOD 0's topology.

use crate::error::MeshError;
use crate::progressive::{MAX_LOD_COUNT, ProgressiveMesh};

/// Writes levels, sub-objects and sub-meshes into a packed stream in order.
///
/// ```
/// use lodestone_mesh::ProgressiveMeshBuilder;
///
/// let mut builder = ProgressiveMeshBuilder::new(2).unwrap();
/// builder.begin_lod(1).unwrap();
/// builder.begin_sub_object(1).unwrap();
/// builder.push_sub_mesh(&[0, 1, 2, 3, 4, 5]).unwrap();
/// builder.begin_lod(1).unwrap();
/// builder.begin_sub_object(1).unwrap();
/// builder.push_sub_mesh(&[0, 1, 2]).unwrap();
/// let mesh = builder.finish().unwrap();
/// assert_eq!(mesh.decode(1, 0, 0).unwrap(), &[0, 1, 2]);
/// ```
#[derive(Debug)]
pub struct ProgressiveMeshBuilder {
    packed: Vec<u32>,
    lod_count: usize,
    /// Levels begun so far.
    lods_begun: usize,
    /// Sub-mesh count per sub-object, fixed by LOD 0.
    topology: Vec<usize>,
    /// Sub-objects declared for the current level.
    sub_object_count: usize,
    /// Index of the next sub-object to begin in the current level.
    next_sub_object: usize,
    /// Sub-meshes declared for the current sub-object.
    sub_mesh_count: usize,
    /// Index of the next sub-mesh to push in the current sub-object.
    next_sub_mesh: usize,
}

impl ProgressiveMeshBuilder {
    /// Start a stream that will hold `lod_count` levels.
    pub fn new(lod_count: usize) -> Result<Self, MeshError> {
        if lod_count == 0 || lod_count > MAX_LOD_COUNT {
            return Err(MeshError::LodCountOutOfRange {
                count: lod_count,
                max: MAX_LOD_COUNT,
            });
        }
        Ok(Self {
            packed: vec![lod_count as u32],
            lod_count,
            lods_begun: 0,
            topology: Vec::new(),
            sub_object_count: 0,
            next_sub_object: 0,
            sub_mesh_count: 0,
            next_sub_mesh: 0,
        })
    }

    /// Begin the next level, declaring how many sub-objects it holds.
    pub fn begin_lod(&mut self, sub_object_count: usize) -> Result<(), MeshError> {
        self.ensure_level_closed()?;
        if self.lods_begun == self.lod_count {
            return Err(MeshError::SegmentOverflow("LOD levels"));
        }
        if self.lods_begun > 0 && sub_object_count != self.topology.len() {
            return Err(MeshError::TopologyMismatch {
                lod: self.lods_begun,
                unit: "sub-objects",
                expected: self.topology.len(),
                found: sub_object_count,
            });
        }
        self.packed.push(sub_object_count as u32);
        self.lods_begun += 1;
        self.sub_object_count = sub_object_count;
        self.next_sub_object = 0;
        self.sub_mesh_count = 0;
        self.next_sub_mesh = 0;
        Ok(())
    }

    /// Begin the next sub-object of the current level, declaring its sub-mesh count.
    pub fn begin_sub_object(&mut self, sub_mesh_count: usize) -> Result<(), MeshError> {
        if self.lods_begun == 0 || self.next_sub_object == self.sub_object_count {
            return Err(MeshError::SegmentOverflow("sub-objects"));
        }
        if self.next_sub_mesh < self.sub_mesh_count {
            return Err(MeshError::IncompleteSegment {
                lod: self.current_lod(),
            });
        }
        let sub_object = self.next_sub_object;
        if self.current_lod() == 0 {
            self.topology.push(sub_mesh_count);
        } else if self.topology[sub_object] != sub_mesh_count {
            return Err(MeshError::TopologyMismatch {
                lod: self.current_lod(),
                unit: "sub-meshes",
                expected: self.topology[sub_object],
                found: sub_mesh_count,
            });
        }
        self.packed.push(sub_mesh_count as u32);
        self.next_sub_object += 1;
        self.sub_mesh_count = sub_mesh_count;
        self.next_sub_mesh = 0;
        Ok(())
    }

    /// Append the triangle list of the next sub-mesh of the current sub-object.
    pub fn push_sub_mesh(&mut self, triangles: &[u32]) -> Result<(), MeshError> {
        if self.next_sub_mesh == self.sub_mesh_count {
            return Err(MeshError::SegmentOverflow("sub-meshes"));
        }
        if triangles.len() % 3 != 0 {
            return Err(MeshError::PartialTriangle {
                lod: self.current_lod(),
                sub_object: self.next_sub_object - 1,
                sub_mesh: self.next_sub_mesh,
                len: triangles.len(),
            });
        }
        self.packed.push(triangles.len() as u32);
        self.packed.extend_from_slice(triangles);
        self.next_sub_mesh += 1;
        Ok(())
    }

    /// Close the stream. Every declared level, sub-object and sub-mesh must be written.
    pub fn finish(self) -> Result<ProgressiveMesh, MeshError> {
        self.ensure_level_closed()?;
        if self.lods_begun < self.lod_count {
            return Err(MeshError::IncompleteSegment {
                lod: self.lods_begun,
            });
        }
        Ok(ProgressiveMesh::from_validated(self.packed, self.topology))
    }

    fn current_lod(&self) -> usize {
        self.lods_begun.saturating_sub(1)
    }

    fn ensure_level_closed(&self) -> Result<(), MeshError> {
        if self.next_sub_object < self.sub_object_count || self.next_sub_mesh < self.sub_mesh_count
        {
            return Err(MeshError::IncompleteSegment {
                lod: self.current_lod(),
            });
        }
        Ok(())
    }
}

/// Encode a nested `lod -> sub-object -> sub-mesh -> indices` structure.
///
/// Fails with [`MeshError::TopologyMismatch`] when a level does not repeat
/// LOD 0's sub-object and sub-mesh counts.
pub fn encode(levels: &[Vec<Vec<Vec<u32>>>]) -> Result<ProgressiveMesh, MeshError> {
    let mut builder = ProgressiveMeshBuilder::new(levels.len())?;
    for level in levels {
        builder.begin_lod(level.len())?;
        for sub_object in level {
            builder.begin_sub_object(sub_object.len())?;
            for triangles in sub_object {
                builder.push_sub_mesh(triangles)?;
            }
        }
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256StarStar;

    type Levels = Vec<Vec<Vec<Vec<u32>>>>;

    /// A model with varying per-level triangle counts, including empty sub-meshes.
    fn sample_levels() -> Levels {
        vec![
            vec![
                vec![vec![0, 1, 2, 2, 1, 3, 3, 1, 4], vec![5, 6, 7]],
                vec![vec![8, 9, 10, 10, 9, 11]],
            ],
            vec![
                vec![vec![0, 1, 2, 2, 1, 3], vec![5, 6, 7]],
                vec![vec![8, 9, 10]],
            ],
            vec![vec![vec![0, 1, 2], vec![]], vec![vec![]]],
        ]
    }

    /// Every coordinate decodes to the list that was encoded there.
    #[test]
    fn test_decode_matches_every_encoded_list() {
        let levels = sample_levels();
        let mesh = encode(&levels).unwrap();
        for (lod, level) in levels.iter().enumerate() {
            for (sub_object, meshes) in level.iter().enumerate() {
                for (sub_mesh, triangles) in meshes.iter().enumerate() {
                    assert_eq!(
                        mesh.decode(lod, sub_object, sub_mesh).unwrap(),
                        triangles.as_slice(),
                        "mismatch at ({lod}, {sub_object}, {sub_mesh})"
                    );
                }
            }
        }
    }

    /// Random structures sharing one topology decode back to what was encoded.
    #[test]
    fn test_random_structures_round_trip() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(19);
        for _ in 0..200 {
            let lod_count = rng.gen_range(1..=MAX_LOD_COUNT);
            let sub_meshes: Vec<usize> = (0..rng.gen_range(1..5))
                .map(|_| rng.gen_range(1..4))
                .collect();
            let mut levels: Levels = Vec::with_capacity(lod_count);
            for _ in 0..lod_count {
                let mut level = Vec::with_capacity(sub_meshes.len());
                for &count in &sub_meshes {
                    let mut lists = Vec::with_capacity(count);
                    for _ in 0..count {
                        let len = rng.gen_range(0..8usize) * 3;
                        lists.push((0..len).map(|_| rng.gen_range(0..1_000u32)).collect());
                    }
                    level.push(lists);
                }
                levels.push(level);
            }

            let mesh = encode(&levels).unwrap();
            assert_eq!(mesh.lod_count(), lod_count);
            assert_eq!(mesh.sub_object_count(), sub_meshes.len());
            for (lod, level) in levels.iter().enumerate() {
                for (sub_object, meshes) in level.iter().enumerate() {
                    for (sub_mesh, triangles) in meshes.iter().enumerate() {
                        assert_eq!(
                            mesh.decode(lod, sub_object, sub_mesh).unwrap(),
                            triangles.as_slice()
                        );
                    }
                }
            }
            assert!(mesh.decode(lod_count, 0, 0).is_err());
            assert_eq!(
                ProgressiveMesh::from_packed(mesh.packed().to_vec()).unwrap(),
                mesh
            );
        }
    }

    /// The builder output passes the same validation as persisted data.
    #[test]
    fn test_builder_output_revalidates() {
        let mesh = encode(&sample_levels()).unwrap();
        let reparsed = ProgressiveMesh::from_packed(mesh.packed().to_vec()).unwrap();
        assert_eq!(reparsed, mesh);
    }

    /// Identical adjacent levels are both stored in full.
    #[test]
    fn test_identical_levels_not_deduplicated() {
        let level = vec![vec![vec![0, 1, 2]]];
        let mesh = encode(&[level.clone(), level]).unwrap();
        assert_eq!(mesh.packed(), &[2, 1, 1, 3, 0, 1, 2, 1, 1, 3, 0, 1, 2]);
    }

    /// A level with a different number of sub-objects is rejected.
    #[test]
    fn test_sub_object_mismatch_rejected() {
        let result = encode(&[
            vec![vec![vec![0, 1, 2]]],
            vec![vec![vec![0, 1, 2]], vec![vec![]]],
        ]);
        assert_eq!(
            result,
            Err(MeshError::TopologyMismatch {
                lod: 1,
                unit: "sub-objects",
                expected: 1,
                found: 2
            })
        );
    }

    /// A sub-object with a different number of sub-meshes is rejected.
    #[test]
    fn test_sub_mesh_mismatch_rejected() {
        let result = encode(&[
            vec![vec![vec![0, 1, 2], vec![]]],
            vec![vec![vec![0, 1, 2]]],
        ]);
        assert!(matches!(
            result,
            Err(MeshError::TopologyMismatch {
                unit: "sub-meshes",
                ..
            })
        ));
    }

    /// No levels, or more than the maximum, cannot be encoded.
    #[test]
    fn test_level_count_bounds() {
        assert!(encode(&[]).is_err());
        let too_many: Levels = vec![vec![vec![vec![]]]; MAX_LOD_COUNT + 1];
        assert!(matches!(
            encode(&too_many),
            Err(MeshError::LodCountOutOfRange { .. })
        ));
        let max: Levels = vec![vec![vec![vec![]]]; MAX_LOD_COUNT];
        assert_eq!(encode(&max).unwrap().lod_count(), MAX_LOD_COUNT);
    }

    /// Writing more than declared, or finishing early, is reported.
    #[test]
    fn test_streaming_misuse_detected() {
        let mut builder = ProgressiveMeshBuilder::new(1).unwrap();
        assert_eq!(
            builder.begin_sub_object(1),
            Err(MeshError::SegmentOverflow("sub-objects"))
        );
        builder.begin_lod(1).unwrap();
        builder.begin_sub_object(1).unwrap();
        builder.push_sub_mesh(&[0, 1, 2]).unwrap();
        assert_eq!(
            builder.push_sub_mesh(&[0, 1, 2]),
            Err(MeshError::SegmentOverflow("sub-meshes"))
        );
        assert_eq!(
            builder.begin_lod(1),
            Err(MeshError::SegmentOverflow("LOD levels"))
        );

        let mut early = ProgressiveMeshBuilder::new(2).unwrap();
        early.begin_lod(2).unwrap();
        early.begin_sub_object(0).unwrap();
        assert_eq!(
            early.begin_lod(2),
            Err(MeshError::IncompleteSegment { lod: 0 })
        );
        early.begin_sub_object(0).unwrap();
        assert!(matches!(
            early.finish(),
            Err(MeshError::IncompleteSegment { lod: 1 })
        ));
    }

    /// Partial triangles are rejected with their coordinates.
    #[test]
    fn test_partial_triangle_reports_coordinates() {
        let mut builder = ProgressiveMeshBuilder::new(1).unwrap();
        builder.begin_lod(2).unwrap();
        builder.begin_sub_object(0).unwrap();
        builder.begin_sub_object(2).unwrap();
        builder.push_sub_mesh(&[]).unwrap();
        assert_eq!(
            builder.push_sub_mesh(&[0, 1, 2, 3]),
            Err(MeshError::PartialTriangle {
                lod: 0,
                sub_object: 1,
                sub_mesh: 1,
                len: 4
            })
        );
    }
}
