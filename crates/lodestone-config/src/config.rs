//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use lodestone_lod::{DEFAULT_BUCKET_COUNT, LodSettings};
use lodestone_mesh::{MAX_LOD_COUNT, SimplifyFlags};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Platform config directory for lodestone, e.g. `~/.config/lodestone`.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("lodestone"))
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Switching settings applied to every managed object.
    pub runtime: LodSettings,
    /// Update scheduler settings.
    pub schedule: ScheduleConfig,
    /// Offline bake settings.
    pub bake: BakeConfig,
    /// Demo scene settings.
    pub demo: DemoConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Update scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Number of buckets; each object is re-evaluated once per this many ticks.
    pub bucket_count: usize,
    /// Fixed seed for bucket placement. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

/// Progressive mesh bake configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BakeConfig {
    /// Number of levels to bake (1 to 20).
    pub lod_count: usize,
    /// Keep open mesh borders in place.
    pub protect_boundary: bool,
    /// Favour small features over uniform reduction.
    pub protect_detail: bool,
    /// Keep mirrored halves collapsing together.
    pub protect_symmetry: bool,
    /// Appended to the model name in the asset file name.
    pub file_suffix: String,
}

/// Demo scene configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    /// Number of managed objects to spawn.
    pub objects: usize,
    /// Number of scheduler ticks to simulate.
    pub ticks: usize,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            bucket_count: DEFAULT_BUCKET_COUNT,
            seed: None,
        }
    }
}

impl Default for BakeConfig {
    fn default() -> Self {
        let flags = SimplifyFlags::default();
        Self {
            lod_count: MAX_LOD_COUNT,
            protect_boundary: flags.protect_boundary,
            protect_detail: flags.protect_detail,
            protect_symmetry: flags.protect_symmetry,
            file_suffix: String::new(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            objects: 500,
            ticks: 300,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl BakeConfig {
    /// Simplifier flags from the protect switches.
    pub fn flags(&self) -> SimplifyFlags {
        SimplifyFlags {
            protect_boundary: self.protect_boundary,
            protect_detail: self.protect_detail,
            protect_symmetry: self.protect_symmetry,
        }
    }
}

// --- Validation ---

impl Config {
    /// Check everything that cannot be expressed in the types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.runtime.to_selector()?;
        if self.schedule.bucket_count == 0 {
            return Err(lodestone_lod::LodError::InvalidBucketCount.into());
        }
        if !(1..=MAX_LOD_COUNT).contains(&self.bake.lod_count) {
            return Err(ConfigError::InvalidLodCount {
                count: self.bake.lod_count,
                max: MAX_LOD_COUNT,
            });
        }
        Ok(())
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
