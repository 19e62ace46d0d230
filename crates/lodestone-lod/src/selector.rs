//! Screen-coverage LOD selection with automatic and manual policies.
//!
//! The coverage ratio is the fraction of the screen (width or height,
//! whichever is larger) covered by an object's bounds. A ratio at or below
//! the cull ratio hides the object; otherwise the policy picks a level and
//! the result is clamped to the stored levels and then to `[min_lod, max_lod]`.

use std::str::FromStr;

use lodestone_mesh::MAX_LOD_COUNT;
use serde::{Deserialize, Serialize};

use crate::error::LodError;

/// How aggressively the automatic policy walks through the stored levels.
///
/// Higher intensities spread the transitions over more of the stored
/// levels, so detail drops off earlier and in bigger steps. Lower
/// intensities only use the first few levels across the whole ratio range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwitchIntensity {
    /// Uses a sixth of the stored levels.
    Lowest,
    /// Uses a third of the stored levels.
    Low,
    /// Uses half of the stored levels.
    #[default]
    Medium,
    /// Uses two thirds of the stored levels (rounded to nearest).
    High,
    /// Uses every stored level.
    Extreme,
}

impl SwitchIntensity {
    /// All intensities, lowest first.
    pub const ALL: [Self; 5] = [
        Self::Lowest,
        Self::Low,
        Self::Medium,
        Self::High,
        Self::Extreme,
    ];

    /// Number of levels the automatic policy spreads the ratio range over.
    pub fn effective_lod_count(self, lod_count: usize) -> usize {
        match self {
            Self::Extreme => lod_count,
            Self::High => (lod_count as f32 / 1.5).round() as usize,
            Self::Medium => lod_count / 2,
            Self::Low => lod_count / 3,
            Self::Lowest => lod_count / 6,
        }
    }
}

impl FromStr for SwitchIntensity {
    type Err = LodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lowest" => Ok(Self::Lowest),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "extreme" => Ok(Self::Extreme),
            _ => Err(LodError::UnknownIntensity(s.to_string())),
        }
    }
}

/// One row of a manual switching table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LodLevel {
    /// Level to use when this row wins.
    pub lod: u32,
    /// The row qualifies when the coverage ratio is at or below this value.
    pub ratio_needed: f32,
}

impl LodLevel {
    /// Create a table row.
    pub fn new(lod: u32, ratio_needed: f32) -> Self {
        Self { lod, ratio_needed }
    }
}

/// How a coverage ratio maps to a level.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectionPolicy {
    /// `floor((1 - ratio) * effective_lod_count)`.
    Automatic(SwitchIntensity),
    /// The last row, in table order, whose `ratio_needed` is at or above the
    /// ratio. Rows are not sorted; a later qualifying row overrides an earlier one.
    Manual(Vec<LodLevel>),
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::Automatic(SwitchIntensity::default())
    }
}

/// Inclusive `[min, max]` range a selected level is clamped to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LodBounds {
    min: u32,
    max: u32,
}

impl LodBounds {
    /// Create bounds; `min` must not exceed `max` and `max` must be a storable level.
    pub fn new(min: u32, max: u32) -> Result<Self, LodError> {
        if min > max || max as usize >= MAX_LOD_COUNT {
            return Err(LodError::InvalidBounds { min, max });
        }
        Ok(Self { min, max })
    }

    /// Lowest level index (most detail) allowed.
    pub fn min(&self) -> u32 {
        self.min
    }

    /// Highest level index (least detail) allowed.
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Clamp `lod` into the bounds, raising to `min` first and then lowering to `max`.
    pub fn clamp(&self, lod: u32) -> u32 {
        let mut lod = lod;
        if lod < self.min {
            lod = self.min;
        }
        if lod > self.max {
            lod = self.max;
        }
        lod
    }
}

impl Default for LodBounds {
    fn default() -> Self {
        Self {
            min: 0,
            max: MAX_LOD_COUNT as u32 - 1,
        }
    }
}

/// Picks a level for one object from its coverage ratio.
#[derive(Clone, Debug, PartialEq)]
pub struct LodSelector {
    policy: SelectionPolicy,
    bounds: LodBounds,
    cull_ratio: f32,
}

impl Default for LodSelector {
    fn default() -> Self {
        Self {
            policy: SelectionPolicy::default(),
            bounds: LodBounds::default(),
            cull_ratio: 0.05,
        }
    }
}

impl LodSelector {
    /// Create a selector. `cull_ratio` must lie in `[0, 1]`.
    pub fn new(
        policy: SelectionPolicy,
        bounds: LodBounds,
        cull_ratio: f32,
    ) -> Result<Self, LodError> {
        if !(0.0..=1.0).contains(&cull_ratio) {
            return Err(LodError::InvalidCullRatio(cull_ratio));
        }
        Ok(Self {
            policy,
            bounds,
            cull_ratio,
        })
    }

    /// The selection policy.
    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    /// The clamp bounds.
    pub fn bounds(&self) -> LodBounds {
        self.bounds
    }

    /// Ratio at or below which the object is hidden.
    pub fn cull_ratio(&self) -> f32 {
        self.cull_ratio
    }

    /// Whether `ratio` hides the object. The threshold is inclusive.
    ///
    /// A culled object must not have its triangles swapped; callers check
    /// this before [`Self::select_lod`].
    pub fn is_culled(&self, ratio: f32) -> bool {
        ratio <= self.cull_ratio
    }

    /// Level chosen for `ratio` given `lod_count` stored levels, after clamping.
    ///
    /// The result is first limited to `lod_count - 1`, then raised to
    /// `min_lod`, then lowered to `max_lod`, so it always lies in the bounds.
    pub fn select_lod(&self, ratio: f32, lod_count: usize) -> u32 {
        let ratio = ratio.clamp(0.0, 1.0);
        let raw = match &self.policy {
            SelectionPolicy::Automatic(intensity) => {
                let effective = intensity.effective_lod_count(lod_count) as f32;
                ((1.0 - ratio) * effective).floor() as u32
            }
            SelectionPolicy::Manual(levels) => levels
                .iter()
                .filter(|level| ratio <= level.ratio_needed)
                .last()
                .map_or(self.bounds.min, |level| level.lod),
        };
        let highest_stored = lod_count.saturating_sub(1) as u32;
        self.bounds.clamp(raw.min(highest_stored))
    }
}

/// Check a diagnostic override level against the stored level count.
pub fn validate_override(lod: u32, lod_count: usize) -> Result<(), LodError> {
    if lod as usize >= lod_count {
        return Err(LodError::InvalidLodIndex {
            lod,
            available: lod_count,
        });
    }
    Ok(())
}
