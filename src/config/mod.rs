use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::aim_assist::ScoreWeights;
use crate::constants::*;
use crate::logging::TracingConfig;
use crate::world::CollisionChannel;

/// Error type for loading [`CoreConfig`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Session-wide configuration for the tethered core.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub scan_interval_secs: f32,
    pub scan_initial_delay_secs: f32,
    pub los_height_offset: f32,
    pub weights: ScoreWeights,
    /// Object types the target scan overlaps
    pub object_types: Vec<CollisionChannel>,
    pub los_channel: CollisionChannel,
    pub dash: DashSettings,
    pub diagnostics: Diagnostics,
    pub tracing: TracingConfig,
    /// Aim-assist profile file loaded at startup and watched for changes
    pub profile_path: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: SCAN_INTERVAL_SECS,
            scan_initial_delay_secs: SCAN_INITIAL_DELAY_SECS,
            los_height_offset: LOS_HEIGHT_OFFSET,
            weights: ScoreWeights::default(),
            object_types: vec![CollisionChannel::Pawn, CollisionChannel::WorldDynamic],
            los_channel: CollisionChannel::Visibility,
            dash: DashSettings::default(),
            diagnostics: Diagnostics::default(),
            tracing: TracingConfig::default(),
            profile_path: None,
        }
    }
}

impl CoreConfig {
    /// Load from a `.ron` or `.json` file (chosen by extension).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => ron::from_str(&content)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.scan_interval_secs.is_finite() && self.scan_interval_secs > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "scan_interval_secs must be positive, got {}",
                self.scan_interval_secs
            )));
        }
        if !(self.scan_initial_delay_secs.is_finite() && self.scan_initial_delay_secs >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "scan_initial_delay_secs must be non-negative, got {}",
                self.scan_initial_delay_secs
            )));
        }
        if self.object_types.is_empty() {
            return Err(ConfigError::Invalid(
                "object_types must name at least one channel".into(),
            ));
        }
        if !(self.dash.speed.is_finite() && self.dash.speed > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "dash.speed must be positive, got {}",
                self.dash.speed
            )));
        }
        Ok(())
    }
}

/// How a resolved dash is carried out.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DashSettings {
    /// Travel speed toward the endpoint (cm/s)
    pub speed: f32,
    /// Shorter dashes are cancelled (cm)
    pub min_distance: f32,
}

impl Default for DashSettings {
    fn default() -> Self {
        Self {
            speed: DASH_DEFAULT_SPEED,
            min_distance: DASH_DEFAULT_MIN_DISTANCE,
        }
    }
}

/// Debug visualisation switch, scoped to the session instead of a global.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub enabled: bool,
}
