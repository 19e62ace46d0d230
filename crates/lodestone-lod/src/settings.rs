//! Per-object LOD settings as they appear in configuration files.

use serde::{Deserialize, Serialize};

use crate::error::LodError;
use crate::selector::{LodBounds, LodLevel, LodSelector, SelectionPolicy, SwitchIntensity};

/// User-facing switching settings for one managed object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodSettings {
    /// Lowest level index allowed (most detail).
    pub min_lod: u32,
    /// Highest level index allowed (least detail).
    pub max_lod: u32,
    /// Coverage ratio at or below which the object is hidden.
    pub cull_ratio: f32,
    /// Automatic switching aggressiveness.
    pub intensity: SwitchIntensity,
    /// Use `lod_levels` instead of the automatic policy.
    pub manual_mode: bool,
    /// Manual switching table, evaluated in order.
    pub lod_levels: Vec<LodLevel>,
}

impl Default for LodSettings {
    fn default() -> Self {
        Self {
            min_lod: 0,
            max_lod: 19,
            cull_ratio: 0.05,
            intensity: SwitchIntensity::Medium,
            manual_mode: false,
            lod_levels: Vec::new(),
        }
    }
}

impl LodSettings {
    /// Validate the settings and build a selector from them.
    pub fn to_selector(&self) -> Result<LodSelector, LodError> {
        let bounds = LodBounds::new(self.min_lod, self.max_lod)?;
        let policy = if self.manual_mode {
            SelectionPolicy::Manual(self.lod_levels.clone())
        } else {
            SelectionPolicy::Automatic(self.intensity)
        };
        LodSelector::new(policy, bounds, self.cull_ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Defaults produce the default selector.
    #[test]
    fn test_default_settings_build_default_selector() {
        let selector = LodSettings::default().to_selector().unwrap();
        assert_eq!(selector, LodSelector::default());
    }

    /// Manual mode uses the table even when it is empty.
    #[test]
    fn test_manual_mode_uses_table() {
        let settings = LodSettings {
            manual_mode: true,
            lod_levels: vec![LodLevel::new(4, 0.5)],
            ..LodSettings::default()
        };
        let selector = settings.to_selector().unwrap();
        assert_eq!(
            selector.policy(),
            &SelectionPolicy::Manual(vec![LodLevel::new(4, 0.5)])
        );
        assert_eq!(selector.select_lod(0.3, 20), 4);
    }

    /// Bad bounds or cull ratios are reported.
    #[test]
    fn test_invalid_settings_rejected() {
        let settings = LodSettings {
            min_lod: 5,
            max_lod: 2,
            ..LodSettings::default()
        };
        assert_eq!(
            settings.to_selector(),
            Err(LodError::InvalidBounds { min: 5, max: 2 })
        );

        let settings = LodSettings {
            cull_ratio: -0.1,
            ..LodSettings::default()
        };
        assert!(matches!(
            settings.to_selector(),
            Err(LodError::InvalidCullRatio(_))
        ));
    }

    /// Missing fields fall back to defaults when parsed.
    #[test]
    fn test_partial_ron_uses_defaults() {
        let settings: LodSettings = ron::from_str("(max_lod: 8, intensity: High)").unwrap();
        assert_eq!(settings.max_lod, 8);
        assert_eq!(settings.intensity, SwitchIntensity::High);
        assert_eq!(settings.cull_ratio, 0.05);
        assert!(settings.lod_levels.is_empty());
    }

    #[test]
    fn test_ron_roundtrip() {
        let settings = LodSettings {
            manual_mode: true,
            lod_levels: vec![LodLevel::new(0, 0.8), LodLevel::new(3, 0.2)],
            ..LodSettings::default()
        };
        let text = ron::ser::to_string_pretty(&settings, ron::ser::PrettyConfig::default())
            .unwrap();
        let back: LodSettings = ron::from_str(&text).unwrap();
        assert_eq!(back, settings);
    }
}
