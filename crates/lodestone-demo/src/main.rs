//! Demo binary that bakes a procedural model into a progressive mesh and
//! flies a camera over a field of LOD-managed copies.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p lodestone-demo -- --objects 1000 --ticks 600`.
//! Add `--export ./assets` to write the baked asset next to the run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use glam::{Vec2, Vec3, Vec4};
use lodestone_config::{CliArgs, Config, default_config_dir};
use lodestone_lod::{Aabb, CameraView, LodManager, LodState, ManagedObject, Renderer};
use lodestone_mesh::{
    MeshBuffer, PrefixSimplifier, ProgressiveMesh, SourceMesh, asset_file_name, bake, load_asset,
    save_asset, unique_asset_path,
};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use tracing::{error, info, warn};

const MODEL_NAME: &str = "tower";
const FIELD_HALF_WIDTH: f32 = 120.0;
const FIELD_DEPTH: f32 = 480.0;
const CAMERA_START_Z: f32 = 40.0;
const CAMERA_SPEED: f32 = 1.5;

/// A flat `cells` x `cells` grid of quads in the XZ plane, `size` wide, at height `y`.
///
/// Quads alternate between two sub-meshes in a checkerboard when
/// `two_materials` is set.
fn grid_part(name: &str, cells: u32, size: f32, y: f32, two_materials: bool) -> SourceMesh {
    let row = cells + 1;
    let step = size / cells as f32;
    let mut positions = Vec::with_capacity((row * row) as usize);
    let mut uvs = Vec::with_capacity(positions.capacity());
    for j in 0..row {
        for i in 0..row {
            positions.push(Vec3::new(
                i as f32 * step - size * 0.5,
                y,
                j as f32 * step - size * 0.5,
            ));
            uvs.push(Vec2::new(i as f32 / cells as f32, j as f32 / cells as f32));
        }
    }

    let mut sub_meshes = vec![Vec::new(); if two_materials { 2 } else { 1 }];
    for j in 0..cells {
        for i in 0..cells {
            let a = j * row + i;
            let b = a + 1;
            let c = a + row;
            let d = c + 1;
            let slot = if two_materials { ((i + j) % 2) as usize } else { 0 };
            sub_meshes[slot].extend_from_slice(&[a, c, b, b, c, d]);
        }
    }

    SourceMesh {
        name: name.to_string(),
        normals: vec![Vec3::Y; positions.len()],
        colors: vec![Vec4::ONE; positions.len()],
        positions,
        uvs,
        sub_meshes,
    }
}

/// The demo model: a two-material base plate and a single-material roof.
fn build_model() -> Vec<SourceMesh> {
    vec![
        grid_part("base", 24, 8.0, 0.0, true),
        grid_part("roof", 12, 4.0, 6.0, false),
    ]
}

/// Local bounds of a part's vertices.
fn part_bounds(part: &SourceMesh) -> Aabb {
    let (min, max) = part.positions.iter().fold(
        (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
        |(min, max), p| (min.min(*p), max.max(*p)),
    );
    if min.cmpgt(max).any() {
        return Aabb::new(Vec3::ZERO, Vec3::ZERO);
    }
    // Flat parts still need some thickness to project.
    Aabb::new(min - Vec3::splat(0.05), max + Vec3::splat(0.05))
}

fn log_levels(mesh: &ProgressiveMesh) {
    for lod in 0..mesh.lod_count() {
        info!(
            "  LOD {lod:>2}: {:>5} triangles",
            mesh.triangle_count(lod)
        );
    }
}

fn export_asset(mesh: &ProgressiveMesh, dir: &Path, suffix: &str) {
    let path = unique_asset_path(dir, &asset_file_name(MODEL_NAME, suffix));
    if let Err(e) = save_asset(mesh, &path) {
        error!("Failed to export progressive mesh: {e}");
        return;
    }
    match load_asset(&path) {
        Ok(loaded) if &loaded == mesh => info!("Verified exported asset {}", path.display()),
        Ok(_) => warn!("Exported asset {} does not match the baked mesh", path.display()),
        Err(e) => error!("Failed to read back {}: {e}", path.display()),
    }
}

fn spawn_objects(
    manager: &mut LodManager,
    config: &Config,
    model: &[SourceMesh],
    mesh: &Arc<ProgressiveMesh>,
    rng: &mut Xoshiro256StarStar,
) {
    let shared: Vec<(Arc<MeshBuffer>, Aabb)> = model
        .iter()
        .map(|part| (Arc::new(MeshBuffer::from_source(part)), part_bounds(part)))
        .collect();

    for _ in 0..config.demo.objects {
        let offset = Vec3::new(
            rng.gen_range(-FIELD_HALF_WIDTH..FIELD_HALF_WIDTH),
            0.0,
            -rng.gen_range(0.0..FIELD_DEPTH),
        );
        let renderers = shared
            .iter()
            .map(|(buffer, bounds)| Renderer::new(Arc::clone(buffer), bounds.translated(offset)))
            .collect();
        match ManagedObject::new(&config.runtime, Some(Arc::clone(mesh)), renderers) {
            Ok(object) => {
                manager.attach(object);
            }
            Err(e) => {
                error!("Failed to create managed object: {e}");
                return;
            }
        }
    }
}

fn camera_at(tick: usize) -> CameraView {
    let eye = Vec3::new(0.0, 12.0, CAMERA_START_Z - tick as f32 * CAMERA_SPEED);
    CameraView::look_at(
        eye,
        eye + Vec3::new(0.0, -0.15, -1.0),
        Vec3::Y,
        std::f32::consts::FRAC_PI_3,
        1920.0,
        1080.0,
        0.1,
        1000.0,
    )
}

fn log_histogram(manager: &LodManager) {
    let mut by_lod: BTreeMap<u32, usize> = BTreeMap::new();
    let (mut culled, mut pending) = (0usize, 0usize);
    for (_, object) in manager.iter() {
        if object.state() == LodState::Culled {
            culled += 1;
        } else if let Some(lod) = object.current_lod() {
            *by_lod.entry(lod).or_default() += 1;
        } else {
            pending += 1;
        }
    }
    info!("Final LOD distribution over {} objects:", manager.len());
    for (lod, count) in &by_lod {
        info!("  LOD {lod:>2}: {count}");
    }
    info!("  culled: {culled}, never switched: {pending}");
}

fn main() {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args
        .config
        .clone()
        .or_else(default_config_dir)
        .unwrap_or_else(|| PathBuf::from(".lodestone"));

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    lodestone_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {e}");
        std::process::exit(2);
    }

    // Bake
    let model = build_model();
    let mesh = match bake(
        &mut PrefixSimplifier::new(),
        &model,
        config.bake.lod_count,
        config.bake.flags(),
    ) {
        Ok(mesh) => Arc::new(mesh),
        Err(e) => {
            error!("Failed to bake progressive mesh: {e}");
            std::process::exit(1);
        }
    };
    info!(
        "Baked '{MODEL_NAME}': {} LODs, {} sub-objects, {} packed values",
        mesh.lod_count(),
        mesh.sub_object_count(),
        mesh.packed().len()
    );
    log_levels(&mesh);

    if let Some(dir) = &args.export {
        export_asset(&mesh, dir, &config.bake.file_suffix);
    }

    // Scene
    let (mut rng, manager) = match config.schedule.seed {
        Some(seed) => (
            Xoshiro256StarStar::seed_from_u64(seed),
            LodManager::with_seed(config.schedule.bucket_count, seed),
        ),
        None => (
            Xoshiro256StarStar::from_entropy(),
            LodManager::new(config.schedule.bucket_count),
        ),
    };
    let mut manager = match manager {
        Ok(manager) => manager,
        Err(e) => {
            error!("Failed to create LOD manager: {e}");
            std::process::exit(2);
        }
    };
    spawn_objects(&mut manager, &config, &model, &mesh, &mut rng);
    info!(
        "Spawned {} objects across {} buckets",
        manager.len(),
        manager.bucket_count()
    );

    // Fly
    let cycle = manager.bucket_count();
    let (mut switched, mut culled) = (0usize, 0usize);
    for tick in 0..config.demo.ticks {
        let report = manager.tick(&camera_at(tick));
        switched += report.switched;
        culled += report.culled;
        if (tick + 1) % cycle == 0 {
            info!(
                "Tick {:>4}: {switched} switches, {culled} newly culled in the last {cycle} ticks",
                tick + 1
            );
            switched = 0;
            culled = 0;
        }
    }

    log_histogram(&manager);
    manager.clear();
}
