//! Viewer configuration.
//!
//! Every field has a default, so a config file only needs to name what it
//! overrides:
//!
//! ```json
//! { "zoom": { "max": 8.0 }, "debounce_ms": 30 }
//! ```

use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, projector::SliceIndex};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub zoom: ZoomLimits,
    /// Edge length in voxels of the image frame the view transform centres.
    pub reference_size: f32,
    pub dash: DashPattern,
    /// Window in which streamed points collapse into one redraw.
    pub debounce_ms: u64,
    /// How often the CSV point source re-reads its file.
    pub poll_interval_ms: u64,
    /// Maps the raw depth slider onto the z index. `None` clamps directly.
    pub slab_window: Option<SlabWindow>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            zoom: ZoomLimits::default(),
            reference_size: 512.0,
            dash: DashPattern::default(),
            debounce_ms: 16,
            poll_interval_ms: 100,
            slab_window: None,
        }
    }
}

impl ViewerConfig {
    /// Load a configuration from a JSON file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is not valid JSON or has
    /// inconsistent zoom limits
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every numeric field the views depend on.
    ///
    /// # Errors
    ///
    /// Returns the first field found out of range. Non-finite values are
    /// always out of range
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ZoomLimits { min, max, step } = self.zoom;
        if !self.zoom.bounds_valid() {
            return Err(ConfigError::ZoomLimits { min, max });
        }
        if !(step.is_finite() && step > 0.0) {
            return Err(ConfigError::ZoomStep(step));
        }
        let DashPattern { dash, gap } = self.dash;
        if !(dash.is_finite() && dash > 0.0 && gap.is_finite() && gap >= 0.0) {
            return Err(ConfigError::DashPattern { dash, gap });
        }
        if !(self.reference_size.is_finite() && self.reference_size > 0.0) {
            return Err(ConfigError::ReferenceSize(self.reference_size));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomLimits {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: 0.1,
            max: 5.0,
            step: 0.1,
        }
    }
}

impl ZoomLimits {
    /// `0 < min < max`, both finite.
    pub fn bounds_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min > 0.0 && self.min < self.max
    }
}

/// Screen-space dash pattern in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashPattern {
    pub dash: f32,
    pub gap: f32,
}

impl Default for DashPattern {
    fn default() -> Self {
        Self { dash: 5.0, gap: 3.0 }
    }
}

/// A depth window of `depth` slider positions centred on `centre`.
///
/// Slider values outside the window select no slice at all. Inside it the
/// offset from the low end either counts down from the last slice
/// (`reversed`) or up from the first.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlabWindow {
    pub centre: i64,
    pub reversed: bool,
}

impl Default for SlabWindow {
    fn default() -> Self {
        Self {
            centre: 256,
            reversed: true,
        }
    }
}

impl SlabWindow {
    pub fn resolve(&self, value: i64, depth: usize) -> SliceIndex {
        let half = i64::try_from(depth / 2).unwrap_or(i64::MAX);
        let low = self.centre.saturating_sub(half);
        let high = self.centre.saturating_add(half);
        if value < low || value > high || depth == 0 {
            return SliceIndex::OutOfSlab;
        }
        let offset = usize::try_from(value.saturating_sub(low)).unwrap_or(usize::MAX);
        let index = if self.reversed {
            depth.saturating_sub(offset.max(1))
        } else {
            offset.min(depth - 1)
        };
        SliceIndex::At(index)
    }
}
