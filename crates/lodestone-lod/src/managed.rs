//! Per-object LOD state machine: visibility, culling, selection and
//! triangle swapping for one renderable model.

use std::sync::Arc;

use lodestone_mesh::{MeshBuffer, ProgressiveMesh, TriangleSink};

use crate::error::LodError;
use crate::projection::{Aabb, ViewProbe};
use crate::selector::{LodSelector, validate_override};
use crate::settings::LodSettings;

/// Lifecycle state of a managed object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LodState {
    /// Created but never activated.
    #[default]
    Uninitialized,
    /// Renderers shown and LOD switching live.
    Active,
    /// Coverage at or below the cull ratio; renderers hidden.
    Culled,
    /// Deactivated; renderers back on their shared meshes.
    Disabled,
}

/// What one [`ManagedObject::update`] call did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UpdateOutcome {
    /// Not active; nothing evaluated.
    Inactive,
    /// No progressive mesh attached; the base mesh stays.
    NoData,
    /// Not culled and not visible; ratio not recomputed.
    Offscreen,
    /// Hidden because the ratio is at or below the cull ratio.
    Culled {
        /// Coverage ratio that caused the cull.
        ratio: f32,
    },
    /// Selected level already applied.
    Unchanged {
        /// Current level.
        lod: u32,
    },
    /// A new level was decoded and written to the buffers.
    Switched {
        /// Previous level, `None` on the first switch.
        from: Option<u32>,
        /// New level.
        to: u32,
    },
    /// The diagnostic override is in effect.
    Overridden {
        /// Override level.
        lod: u32,
    },
}

/// One render slot: a shared source mesh, an optional private copy, and its bounds.
#[derive(Clone, Debug)]
pub struct Renderer {
    shared: Arc<MeshBuffer>,
    instance: Option<MeshBuffer>,
    bounds: Aabb,
    enabled: bool,
}

impl Renderer {
    /// A renderer drawing `shared` inside world-space `bounds`.
    pub fn new(shared: Arc<MeshBuffer>, bounds: Aabb) -> Self {
        Self {
            shared,
            instance: None,
            bounds,
            enabled: true,
        }
    }

    /// Mesh currently drawn: the private copy while managed, otherwise the shared one.
    pub fn mesh(&self) -> &MeshBuffer {
        self.instance.as_ref().unwrap_or(self.shared.as_ref())
    }

    /// The shared source mesh.
    pub fn shared(&self) -> &Arc<MeshBuffer> {
        &self.shared
    }

    /// Whether a private copy is in use.
    pub fn is_cloned(&self) -> bool {
        self.instance.is_some()
    }

    /// Whether the renderer draws.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// World-space bounds.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }
}

/// A renderable model under LOD management.
///
/// Renderer `i` is sub-object `i` of the progressive mesh. The mesh is
/// shared read-only; each object owns private copies of its buffers while
/// active.
#[derive(Debug)]
pub struct ManagedObject {
    selector: LodSelector,
    mesh: Option<Arc<ProgressiveMesh>>,
    renderers: Vec<Renderer>,
    state: LodState,
    current_lod: Option<u32>,
    current_ratio: f32,
    lod_override: Option<u32>,
}

impl ManagedObject {
    /// Create an object from validated settings.
    ///
    /// `mesh` may be `None`, in which case updates are no-ops.
    pub fn new(
        settings: &LodSettings,
        mesh: Option<Arc<ProgressiveMesh>>,
        renderers: Vec<Renderer>,
    ) -> Result<Self, LodError> {
        let selector = settings.to_selector()?;
        if let Some(mesh) = &mesh {
            if selector.bounds().max() as usize >= mesh.lod_count() {
                log::warn!(
                    "max_lod {} exceeds the {} stored LODs; selection is limited to stored levels first",
                    selector.bounds().max(),
                    mesh.lod_count()
                );
            }
            if renderers.len() != mesh.sub_object_count() {
                log::warn!(
                    "{} renderers for a progressive mesh with {} sub-objects",
                    renderers.len(),
                    mesh.sub_object_count()
                );
            }
        }
        Ok(Self {
            selector,
            mesh,
            renderers,
            state: LodState::Uninitialized,
            current_lod: None,
            current_ratio: 0.0,
            lod_override: None,
        })
    }

    /// Start managing: clone the shared buffers and show every renderer.
    ///
    /// No-op when already active or culled.
    pub fn activate(&mut self) {
        if matches!(self.state, LodState::Active | LodState::Culled) {
            return;
        }
        let clone_buffers = self.mesh.is_some();
        for renderer in &mut self.renderers {
            if clone_buffers {
                renderer.instance = Some(MeshBuffer::clone(&renderer.shared));
            }
            renderer.enabled = true;
        }
        if !clone_buffers {
            log::warn!("Activated LOD object without progressive mesh data; base mesh stays");
        }
        self.current_lod = None;
        self.state = LodState::Active;
        log::debug!("Activated LOD object with {} renderers", self.renderers.len());
    }

    /// Stop managing: drop the private copies and show the shared meshes again.
    pub fn deactivate(&mut self) {
        if self.state == LodState::Disabled {
            return;
        }
        for renderer in &mut self.renderers {
            renderer.instance = None;
            renderer.enabled = true;
        }
        self.current_lod = None;
        self.state = LodState::Disabled;
        log::debug!("Deactivated LOD object");
    }

    /// Run one scheduled update against the current camera.
    pub fn update(&mut self, probe: &impl ViewProbe) -> UpdateOutcome {
        if !matches!(self.state, LodState::Active | LodState::Culled) {
            return UpdateOutcome::Inactive;
        }
        let Some(mesh) = self.mesh.clone() else {
            return UpdateOutcome::NoData;
        };

        if let Some(lod) = self.lod_override {
            if self.current_lod != Some(lod) {
                self.apply_lod(&mesh, lod);
            }
            return UpdateOutcome::Overridden { lod };
        }

        let culled = self.state == LodState::Culled;
        if !culled && !self.renderers.iter().any(|r| probe.is_visible(&r.bounds)) {
            return UpdateOutcome::Offscreen;
        }

        let bounds: Vec<Aabb> = self.renderers.iter().map(|r| r.bounds).collect();
        let ratio = probe.coverage_ratio(&bounds);
        self.current_ratio = ratio;

        if self.selector.is_culled(ratio) {
            if !culled {
                self.set_enabled(false);
                self.state = LodState::Culled;
                log::debug!("Culled LOD object at ratio {ratio:.4}");
            }
            return UpdateOutcome::Culled { ratio };
        }
        if culled {
            self.set_enabled(true);
            self.state = LodState::Active;
            log::debug!("Unculled LOD object at ratio {ratio:.4}");
        }

        let lod = self.selector.select_lod(ratio, mesh.lod_count());
        match self.current_lod {
            Some(current) if current == lod => UpdateOutcome::Unchanged { lod },
            from => {
                self.apply_lod(&mesh, lod);
                UpdateOutcome::Switched { from, to: lod }
            }
        }
    }

    /// Engage (`Some`) or release (`None`) the diagnostic override.
    ///
    /// An out-of-range level is logged and reported but still stored; the
    /// next update applies whatever sub-meshes it can decode.
    pub fn set_lod_override(&mut self, lod: Option<u32>) -> Result<(), LodError> {
        self.lod_override = lod;
        match lod {
            None => {
                // Force reselection on the next update.
                self.current_lod = None;
                Ok(())
            }
            Some(lod) => {
                let result = validate_override(lod, self.lods_available());
                if let Err(err) = &result {
                    log::error!("{err}");
                }
                result
            }
        }
    }

    /// Replace the world bounds of one renderer. Returns `false` for a bad index.
    pub fn set_renderer_bounds(&mut self, index: usize, bounds: Aabb) -> bool {
        let Some(renderer) = self.renderers.get_mut(index) else {
            return false;
        };
        renderer.bounds = bounds;
        true
    }

    /// Lifecycle state.
    pub fn state(&self) -> LodState {
        self.state
    }

    /// Last applied level, `None` before the first switch.
    pub fn current_lod(&self) -> Option<u32> {
        self.current_lod
    }

    /// Coverage ratio from the last evaluation.
    pub fn current_ratio(&self) -> f32 {
        self.current_ratio
    }

    /// The diagnostic override, if engaged.
    pub fn lod_override(&self) -> Option<u32> {
        self.lod_override
    }

    /// Stored level count, 0 without mesh data.
    pub fn lods_available(&self) -> usize {
        self.mesh.as_ref().map_or(0, |mesh| mesh.lod_count())
    }

    /// The selector built from the settings.
    pub fn selector(&self) -> &LodSelector {
        &self.selector
    }

    /// The progressive mesh, if any.
    pub fn mesh(&self) -> Option<&Arc<ProgressiveMesh>> {
        self.mesh.as_ref()
    }

    /// Render slots in sub-object order.
    pub fn renderers(&self) -> &[Renderer] {
        &self.renderers
    }

    fn set_enabled(&mut self, enabled: bool) {
        for renderer in &mut self.renderers {
            renderer.enabled = enabled;
        }
    }

    fn apply_lod(&mut self, mesh: &ProgressiveMesh, lod: u32) {
        let mut writes = 0usize;
        for (sub_object, renderer) in self.renderers.iter_mut().enumerate() {
            let Some(buffer) = renderer.instance.as_mut() else {
                continue;
            };
            for sub_mesh in 0..buffer.sub_mesh_count() {
                match mesh.decode(lod as usize, sub_object, sub_mesh) {
                    Ok(triangles) => {
                        if buffer.triangles(sub_mesh) != Some(triangles)
                            && buffer.set_triangles(sub_mesh, triangles)
                        {
                            writes += 1;
                        }
                    }
                    Err(err) => log::trace!("Keeping current triangles: {err}"),
                }
            }
        }
        log::trace!(
            "Applied LOD {lod} ({writes} sub-mesh writes), previous {:?}",
            self.current_lod
        );
        self.current_lod = Some(lod);
    }
}
