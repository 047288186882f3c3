//! Designer-authored aim-assist tuning, loaded from RON.

use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Error type for loading an [`AimAssistProfile`]
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
}

/// Aim-assist tuning. Shared read-only between agents through an `Arc`.
///
/// Angles are in degrees, distances in cm, times in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AimAssistProfile {
    /// Radius of the target scan
    pub assist_range_cm: f32,
    /// Full width of the targeting cone
    pub query_fov_deg: f32,
    /// 0 never resists switching, 1 requires +25% to switch
    pub stickiness: f32,
    /// Full width of the cone where look sensitivity is reduced
    pub friction_cone_deg: f32,
    /// Look sensitivity multiplier inside the friction cone
    pub friction_scale: f32,
    /// Targets closer than this angle are snapped toward
    pub snap_cone_deg: f32,
    /// Largest single snap
    pub max_snap_deg: f32,
    pub max_yaw_deg_per_sec: f32,
    pub projectile_steer_deg: f32,
    /// Homing duration after ranged fire; 0 disables homing
    pub initial_homing_time: f32,
    pub melee_lunge_dist_cm: f32,
    pub melee_lunge_speed: f32,
    pub melee_max_turn_on_attack: f32,
}

impl Default for AimAssistProfile {
    fn default() -> Self {
        Self {
            assist_range_cm: 1800.0,
            query_fov_deg: 45.0,
            stickiness: 0.6,
            friction_cone_deg: 8.0,
            friction_scale: 0.7,
            snap_cone_deg: 4.0,
            max_snap_deg: 3.0,
            max_yaw_deg_per_sec: 160.0,
            projectile_steer_deg: 2.0,
            initial_homing_time: 0.12,
            melee_lunge_dist_cm: 300.0,
            melee_lunge_speed: 1200.0,
            melee_max_turn_on_attack: 30.0,
        }
    }
}

const RANGES: [(&str, RangeInclusive<f32>); 13] = [
    ("assist_range_cm", 100.0..=5000.0),
    ("query_fov_deg", 5.0..=180.0),
    ("stickiness", 0.0..=1.0),
    ("friction_cone_deg", 1.0..=30.0),
    ("friction_scale", 0.1..=1.0),
    ("snap_cone_deg", 1.0..=15.0),
    ("max_snap_deg", 0.5..=10.0),
    ("max_yaw_deg_per_sec", 30.0..=500.0),
    ("projectile_steer_deg", 0.0..=15.0),
    ("initial_homing_time", 0.0..=1.0),
    ("melee_lunge_dist_cm", 50.0..=800.0),
    ("melee_lunge_speed", 400.0..=3000.0),
    ("melee_max_turn_on_attack", 0.0..=90.0),
];

impl AimAssistProfile {
    pub fn from_ron_str(source: &str) -> Result<Self, ProfileError> {
        let profile: Self = ron::from_str(source)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron_str(&source)
    }

    pub fn to_ron_string(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Check every field against its authoring range.
    pub fn validate(&self) -> Result<(), ProfileError> {
        let values = [
            self.assist_range_cm,
            self.query_fov_deg,
            self.stickiness,
            self.friction_cone_deg,
            self.friction_scale,
            self.snap_cone_deg,
            self.max_snap_deg,
            self.max_yaw_deg_per_sec,
            self.projectile_steer_deg,
            self.initial_homing_time,
            self.melee_lunge_dist_cm,
            self.melee_lunge_speed,
            self.melee_max_turn_on_attack,
        ];
        for ((field, range), value) in RANGES.iter().zip(values) {
            if !range.contains(&value) {
                return Err(ProfileError::OutOfRange {
                    field: *field,
                    value,
                    min: *range.start(),
                    max: *range.end(),
                });
            }
        }
        Ok(())
    }

    /// Cosine of half the query FOV: the minimum alignment a target needs.
    pub fn fov_cos(&self) -> f32 {
        (self.query_fov_deg * 0.5).to_radians().cos()
    }
}
