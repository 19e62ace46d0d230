//! Runtime LOD switching: screen-coverage selection, round-robin update
//! scheduling and the per-object state machine that swaps progressive mesh
//! triangle lists into render buffers.

pub mod error;
pub mod managed;
pub mod manager;
pub mod projection;
pub mod scheduler;
pub mod selector;
pub mod settings;

pub use error::LodError;
pub use managed::{LodState, ManagedObject, Renderer, UpdateOutcome};
pub use manager::{LodManager, ObjectId, TickReport};
pub use projection::{Aabb, CameraView, Frustum, ViewProbe};
pub use scheduler::{BucketToken, DEFAULT_BUCKET_COUNT, UpdateScheduler};
pub use selector::{
    LodBounds, LodLevel, LodSelector, SelectionPolicy, SwitchIntensity, validate_override,
};
pub use settings::LodSettings;
