//! Round-robin bucket scheduler that spreads LOD updates across frames.
//!
//! Objects register into a uniformly random bucket. Each tick visits every
//! member of the bucket under the cursor and then advances the cursor, so a
//! registered object is updated exactly once every `bucket_count` ticks.

use std::collections::HashSet;
use std::hash::Hash;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

use crate::error::LodError;

/// Number of buckets used when none is configured.
pub const DEFAULT_BUCKET_COUNT: usize = 30;

/// Handle returned by [`UpdateScheduler::register`], needed to unregister.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BucketToken(usize);

impl BucketToken {
    /// Bucket the member was placed in.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Partitions members into buckets and visits one bucket per tick.
///
/// Owned by whoever drives the frame loop; there is no global instance.
#[derive(Clone, Debug)]
pub struct UpdateScheduler<T> {
    buckets: Vec<HashSet<T>>,
    cursor: usize,
    rng: Xoshiro256StarStar,
}

impl<T: Copy + Eq + Hash> UpdateScheduler<T> {
    /// Create a scheduler seeded from OS entropy.
    pub fn new(bucket_count: usize) -> Result<Self, LodError> {
        Self::with_rng(bucket_count, Xoshiro256StarStar::from_entropy())
    }

    /// Create a scheduler with a fixed seed for reproducible bucket placement.
    pub fn with_seed(bucket_count: usize, seed: u64) -> Result<Self, LodError> {
        Self::with_rng(bucket_count, Xoshiro256StarStar::seed_from_u64(seed))
    }

    fn with_rng(bucket_count: usize, rng: Xoshiro256StarStar) -> Result<Self, LodError> {
        if bucket_count == 0 {
            return Err(LodError::InvalidBucketCount);
        }
        Ok(Self {
            buckets: (0..bucket_count).map(|_| HashSet::new()).collect(),
            cursor: 0,
            rng,
        })
    }

    /// Add `member` to a uniformly chosen bucket.
    ///
    /// Registering a member that is already present under another token
    /// places a second copy; callers unregister before re-registering.
    pub fn register(&mut self, member: T) -> BucketToken {
        let index = self.rng.gen_range(0..self.buckets.len());
        self.buckets[index].insert(member);
        log::trace!("Registered LOD update member in bucket {index}");
        BucketToken(index)
    }

    /// Remove `member` from the bucket named by `token`.
    ///
    /// Returns `false` if it was not there. Safe to call between ticks only;
    /// the borrow checker rules out calls from inside [`Self::tick`].
    pub fn unregister(&mut self, token: BucketToken, member: &T) -> bool {
        self.buckets
            .get_mut(token.0)
            .is_some_and(|bucket| bucket.remove(member))
    }

    /// Visit every member of the current bucket, then advance the cursor.
    ///
    /// Returns the number of members visited. Visit order within a bucket
    /// is unspecified.
    pub fn tick(&mut self, mut visit: impl FnMut(T)) -> usize {
        let bucket = &self.buckets[self.cursor];
        let visited = bucket.len();
        for &member in bucket {
            visit(member);
        }
        self.cursor = (self.cursor + 1) % self.buckets.len();
        visited
    }

    /// Number of buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Bucket the next tick will visit.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Members in one bucket, or 0 for an index past the end.
    pub fn bucket_len(&self, index: usize) -> usize {
        self.buckets.get(index).map_or(0, HashSet::len)
    }

    /// Total registered members.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(HashSet::len).sum()
    }

    /// Whether no members are registered.
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(HashSet::is_empty)
    }

    /// Whether `member` is registered under `token`.
    pub fn contains(&self, token: BucketToken, member: &T) -> bool {
        self.buckets
            .get(token.0)
            .is_some_and(|bucket| bucket.contains(member))
    }

    /// Drop all members and rewind the cursor.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Over `bucket_count` consecutive ticks every member is visited exactly once.
    #[test]
    fn test_every_member_visited_once_per_cycle() {
        for bucket_count in [1, 2, 7, DEFAULT_BUCKET_COUNT] {
            for members in [0u32, 1, 5, 100] {
                let mut scheduler = UpdateScheduler::with_seed(bucket_count, 42).unwrap();
                for id in 0..members {
                    scheduler.register(id);
                }
                // Start mid-cycle to show the window can begin anywhere.
                scheduler.tick(|_| {});

                let mut visits: HashMap<u32, usize> = HashMap::new();
                for _ in 0..bucket_count {
                    scheduler.tick(|id| *visits.entry(id).or_default() += 1);
                }
                assert_eq!(visits.len(), members as usize);
                assert!(visits.values().all(|&n| n == 1));
            }
        }
    }

    /// The cursor visits buckets in order and wraps around.
    #[test]
    fn test_cursor_wraps() {
        let mut scheduler: UpdateScheduler<u32> = UpdateScheduler::with_seed(3, 1).unwrap();
        let order: Vec<usize> = (0..7)
            .map(|_| {
                let at = scheduler.cursor();
                scheduler.tick(|_| {});
                at
            })
            .collect();
        assert_eq!(order, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    /// A member is visited on the tick that lands on its bucket.
    #[test]
    fn test_member_visited_on_its_bucket() {
        let mut scheduler = UpdateScheduler::with_seed(5, 9).unwrap();
        let token = scheduler.register(77u32);
        for tick in 0..5 {
            let mut seen = false;
            scheduler.tick(|id| seen |= id == 77);
            assert_eq!(seen, tick == token.index());
        }
    }

    /// Unregistered members are no longer visited.
    #[test]
    fn test_unregister() {
        let mut scheduler = UpdateScheduler::with_seed(1, 3).unwrap();
        let token = scheduler.register(1u32);
        scheduler.register(2u32);
        assert!(scheduler.contains(token, &1));
        assert!(scheduler.unregister(token, &1));
        assert!(!scheduler.unregister(token, &1));
        assert!(!scheduler.contains(token, &1));

        let mut seen = Vec::new();
        scheduler.tick(|id| seen.push(id));
        assert_eq!(seen, vec![2]);
        assert_eq!(scheduler.len(), 1);
    }

    /// Placement is uniform and reaches the last bucket.
    #[test]
    fn test_placement_covers_all_buckets() {
        let bucket_count = 10;
        let mut scheduler = UpdateScheduler::with_seed(bucket_count, 2024).unwrap();
        for id in 0..10_000u32 {
            scheduler.register(id);
        }
        for index in 0..bucket_count {
            let len = scheduler.bucket_len(index);
            assert!(
                (800..=1200).contains(&len),
                "bucket {index} holds {len} members"
            );
        }
        assert_eq!(scheduler.bucket_len(bucket_count), 0);
    }

    /// Zero buckets is a configuration error.
    #[test]
    fn test_zero_buckets_rejected() {
        assert!(matches!(
            UpdateScheduler::<u32>::new(0),
            Err(LodError::InvalidBucketCount)
        ));
    }

    /// Same seed, same placement.
    #[test]
    fn test_seeded_placement_is_reproducible() {
        let mut a = UpdateScheduler::with_seed(30, 5).unwrap();
        let mut b = UpdateScheduler::with_seed(30, 5).unwrap();
        for id in 0..50u32 {
            assert_eq!(a.register(id), b.register(id));
        }
    }

    /// Clearing empties every bucket and rewinds.
    #[test]
    fn test_clear() {
        let mut scheduler = UpdateScheduler::with_seed(4, 0).unwrap();
        scheduler.register(1u32);
        scheduler.tick(|_| {});
        scheduler.clear();
        assert!(scheduler.is_empty());
        assert_eq!(scheduler.cursor(), 0);
        assert_eq!(scheduler.tick(|_| {}), 0);
    }
}
