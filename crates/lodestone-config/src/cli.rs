//! Command-line argument parsing for lodestone tools.

use std::path::PathBuf;

use clap::Parser;
use lodestone_lod::SwitchIntensity;

use crate::Config;

/// Lodestone command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "lodestone", about = "Progressive mesh LOD switching demo")]
pub struct CliArgs {
    /// Lowest LOD index allowed (most detail).
    #[arg(long)]
    pub min_lod: Option<u32>,

    /// Highest LOD index allowed (least detail).
    #[arg(long)]
    pub max_lod: Option<u32>,

    /// Screen coverage at or below which objects are hidden.
    #[arg(long)]
    pub cull_ratio: Option<f32>,

    /// Automatic switching intensity (lowest, low, medium, high, extreme).
    #[arg(long)]
    pub intensity: Option<SwitchIntensity>,

    /// Number of update buckets.
    #[arg(long)]
    pub buckets: Option<usize>,

    /// Seed for bucket placement and the demo scene.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of LODs to bake.
    #[arg(long)]
    pub lod_count: Option<usize>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of managed objects in the demo scene.
    #[arg(long)]
    pub objects: Option<usize>,

    /// Number of scheduler ticks to simulate.
    #[arg(long)]
    pub ticks: Option<usize>,

    /// Directory to export the baked progressive mesh asset to.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(min) = args.min_lod {
            self.runtime.min_lod = min;
        }
        if let Some(max) = args.max_lod {
            self.runtime.max_lod = max;
        }
        if let Some(ratio) = args.cull_ratio {
            self.runtime.cull_ratio = ratio;
        }
        if let Some(intensity) = args.intensity {
            self.runtime.intensity = intensity;
            self.runtime.manual_mode = false;
        }
        if let Some(buckets) = args.buckets {
            self.schedule.bucket_count = buckets;
        }
        if let Some(seed) = args.seed {
            self.schedule.seed = Some(seed);
        }
        if let Some(count) = args.lod_count {
            self.bake.lod_count = count;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if let Some(objects) = args.objects {
            self.demo.objects = objects;
        }
        if let Some(ticks) = args.ticks {
            self.demo.ticks = ticks;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            max_lod: Some(9),
            buckets: Some(8),
            seed: Some(3),
            log_level: Some("debug".to_string()),
            ..CliArgs::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.runtime.max_lod, 9);
        assert_eq!(config.schedule.bucket_count, 8);
        assert_eq!(config.schedule.seed, Some(3));
        assert_eq!(config.debug.log_level, "debug");
        // Non-overridden fields retain defaults
        assert_eq!(config.runtime.min_lod, 0);
        assert_eq!(config.bake.lod_count, 20);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    /// An explicit intensity switches a manual config back to automatic.
    #[test]
    fn test_intensity_override_leaves_manual_mode() {
        let mut config = Config::default();
        config.runtime.manual_mode = true;
        let args = CliArgs {
            intensity: Some(SwitchIntensity::Extreme),
            ..CliArgs::default()
        };
        config.apply_cli_overrides(&args);
        assert!(!config.runtime.manual_mode);
        assert_eq!(config.runtime.intensity, SwitchIntensity::Extreme);
    }

    #[test]
    fn test_parse_flags() {
        let args = CliArgs::try_parse_from([
            "lodestone",
            "--intensity",
            "high",
            "--cull-ratio",
            "0.1",
            "--objects",
            "64",
            "--export",
            "out",
        ])
        .unwrap();
        assert_eq!(args.intensity, Some(SwitchIntensity::High));
        assert_eq!(args.cull_ratio, Some(0.1));
        assert_eq!(args.objects, Some(64));
        assert_eq!(args.export, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_parse_rejects_unknown_intensity() {
        assert!(CliArgs::try_parse_from(["lodestone", "--intensity", "ultra"]).is_err());
    }
}
