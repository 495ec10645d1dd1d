// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline settings, persisted as RON.

use crate::audio::DEFAULT_WAVEFORM_POINTS_PER_SECOND;
use crate::error::{TimelineError, TimelineResult};
use crate::interpolation::Easing;
use crate::onion::OnionSkinSettings;
use crate::scheduler::DEFAULT_TICK_INTERVAL_MS;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current settings file version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Default settings file name
pub const SETTINGS_FILE_NAME: &str = "timeline.ron";

/// Frames per second allowed for canvas animations
pub const FPS_RANGE: std::ops::RangeInclusive<u32> = 1..=60;

/// Editor-wide timeline preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineSettings {
    /// File format version
    pub version: u32,
    /// Frame rate for new animations
    pub default_fps: u32,
    /// Frame count for new animations
    pub default_frame_count: usize,
    /// Whether new animations loop
    pub default_looping: bool,
    /// Host tick cadence
    pub tick_interval_ms: u64,
    /// Waveform resolution
    pub waveform_points_per_second: u32,
    /// Easing for captured stage keyframes
    pub stage_easing: Easing,
    /// Onion skin defaults
    pub onion_skin: OnionSkinSettings,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            default_fps: 12,
            default_frame_count: 24,
            default_looping: true,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            waveform_points_per_second: DEFAULT_WAVEFORM_POINTS_PER_SECOND,
            stage_easing: Easing::Linear,
            onion_skin: OnionSkinSettings::default(),
        }
    }
}

impl TimelineSettings {
    /// Serialize to RON
    pub fn to_ron(&self) -> TimelineResult<String> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Parse from RON, clamping out-of-range values
    pub fn from_ron(s: &str) -> TimelineResult<Self> {
        let mut settings: TimelineSettings = ron::from_str(s)?;
        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(TimelineError::Malformed(format!(
                "settings version {} is newer than supported version {}",
                settings.version, SETTINGS_FORMAT_VERSION
            )));
        }
        settings.default_fps = settings.default_fps.clamp(*FPS_RANGE.start(), *FPS_RANGE.end());
        settings.default_frame_count = settings.default_frame_count.max(1);
        settings.tick_interval_ms = settings.tick_interval_ms.max(1);
        Ok(settings)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> TimelineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Load settings, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> TimelineResult<Self> {
        if !path.exists() {
            tracing::debug!("No settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> TimelineResult<()> {
        std::fs::write(path, self.to_ron()?)?;
        tracing::info!("Saved timeline settings to {:?}", path);
        Ok(())
    }
}
