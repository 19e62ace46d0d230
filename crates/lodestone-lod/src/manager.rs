//! Owner of all managed objects and the scheduler that amortizes their updates.

use std::collections::HashMap;

use crate::error::LodError;
use crate::managed::{LodState, ManagedObject, UpdateOutcome};
use crate::projection::ViewProbe;
use crate::scheduler::{BucketToken, UpdateScheduler};

/// Identifier handed out by [`LodManager::attach`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Raw id value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Summary of one [`LodManager::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Bucket that was visited.
    pub bucket: usize,
    /// Objects updated.
    pub visited: usize,
    /// Objects whose automatic selection moved to another level.
    pub switched: usize,
    /// Objects that went from shown to culled in this tick.
    pub culled: usize,
}

struct Entry {
    object: ManagedObject,
    token: BucketToken,
}

/// Drives LOD updates for every attached object, one bucket per tick.
pub struct LodManager {
    scheduler: UpdateScheduler<ObjectId>,
    objects: HashMap<ObjectId, Entry>,
    next_id: u64,
}

impl LodManager {
    /// Manager with `bucket_count` buckets and entropy-seeded placement.
    pub fn new(bucket_count: usize) -> Result<Self, LodError> {
        Ok(Self::from_scheduler(UpdateScheduler::new(bucket_count)?))
    }

    /// Manager with reproducible bucket placement.
    pub fn with_seed(bucket_count: usize, seed: u64) -> Result<Self, LodError> {
        Ok(Self::from_scheduler(UpdateScheduler::with_seed(
            bucket_count,
            seed,
        )?))
    }

    fn from_scheduler(scheduler: UpdateScheduler<ObjectId>) -> Self {
        log::info!(
            "LOD manager ready with {} update buckets",
            scheduler.bucket_count()
        );
        Self {
            scheduler,
            objects: HashMap::new(),
            next_id: 0,
        }
    }

    /// Activate `object` and schedule it.
    pub fn attach(&mut self, mut object: ManagedObject) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        object.activate();
        let token = self.scheduler.register(id);
        log::debug!("Attached LOD object {} to bucket {}", id.0, token.index());
        self.objects.insert(id, Entry { object, token });
        id
    }

    /// Unschedule and deactivate an object, handing it back.
    pub fn detach(&mut self, id: ObjectId) -> Option<ManagedObject> {
        let Entry { mut object, token } = self.objects.remove(&id)?;
        self.scheduler.unregister(token, &id);
        object.deactivate();
        log::debug!("Detached LOD object {}", id.0);
        Some(object)
    }

    /// Update every object in the current bucket and advance.
    pub fn tick(&mut self, probe: &impl ViewProbe) -> TickReport {
        let bucket = self.scheduler.cursor();
        let (mut switched, mut culled) = (0, 0);
        let objects = &mut self.objects;
        let visited = self.scheduler.tick(|id| {
            let Some(entry) = objects.get_mut(&id) else {
                return;
            };
            let was_culled = entry.object.state() == LodState::Culled;
            match entry.object.update(probe) {
                UpdateOutcome::Switched { .. } => switched += 1,
                UpdateOutcome::Culled { .. } if !was_culled => culled += 1,
                _ => {}
            }
        });
        let report = TickReport {
            bucket,
            visited,
            switched,
            culled,
        };
        log::trace!(
            "LOD tick bucket {}: {} visited, {} switched, {} culled",
            report.bucket,
            report.visited,
            report.switched,
            report.culled
        );
        report
    }

    /// An attached object.
    pub fn get(&self, id: ObjectId) -> Option<&ManagedObject> {
        self.objects.get(&id).map(|entry| &entry.object)
    }

    /// An attached object, mutably (for overrides and moving bounds).
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut ManagedObject> {
        self.objects.get_mut(&id).map(|entry| &mut entry.object)
    }

    /// Attached objects in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &ManagedObject)> {
        self.objects.iter().map(|(id, entry)| (*id, &entry.object))
    }

    /// Number of attached objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether nothing is attached.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Number of update buckets.
    pub fn bucket_count(&self) -> usize {
        self.scheduler.bucket_count()
    }

    /// Detach everything, deactivating each object.
    pub fn clear(&mut self) {
        for (_, mut entry) in self.objects.drain() {
            entry.object.deactivate();
        }
        self.scheduler.clear();
    }
}
