//! Centralized gameplay constants for the tethered core.
//!
//! Tunables that designers change live in [`AimAssistProfile`] or
//! [`CoreConfig`]; the values here are fixed engineering constants shared by
//! the dash resolver and the aim-assist passes.
//!
//! [`AimAssistProfile`]: crate::aim_assist::AimAssistProfile
//! [`CoreConfig`]: crate::config::CoreConfig

// =====================================================
// Dash query
// =====================================================

/// Default maximum dash travel (cm)
pub const DASH_DEFAULT_MAX_DISTANCE: f32 = 900.0;

/// Default number of samples along the dash path
pub const DASH_DEFAULT_SAMPLES: u32 = 12;

/// Sample count bounds applied at the caller boundary
pub const DASH_MIN_SAMPLES: u32 = 1;
pub const DASH_MAX_SAMPLES: u32 = 60;

/// Default allowed vertical deviation from the start plane (cm)
pub const DASH_DEFAULT_MAX_HEIGHT_DELTA: f32 = 120.0;

/// Default extra radius added to the agent capsule for the overlap test (cm)
pub const DASH_DEFAULT_CLEARANCE: f32 = 10.0;

/// Ground probe starts this far above the capsule half-height (cm)
pub const GROUND_PROBE_UP: f32 = 15.0;

/// Ground probe ends this far below the capsule half-height (cm)
pub const GROUND_PROBE_DOWN: f32 = 200.0;

/// Lift applied above a ground hit to avoid resting inside the floor (cm)
pub const GROUND_CLEARANCE: f32 = 1.0;

/// Default dash movement speed once an endpoint is chosen (cm/s)
pub const DASH_DEFAULT_SPEED: f32 = 2000.0;

/// Dashes shorter than this are cancelled (cm)
pub const DASH_DEFAULT_MIN_DISTANCE: f32 = 100.0;

/// Horizontal reach of a navigation projection (cm)
pub const NAV_QUERY_EXTENT_HORIZONTAL: f32 = 50.0;

/// Vertical reach of a navigation projection (cm)
pub const NAV_QUERY_EXTENT_VERTICAL: f32 = 250.0;

// =====================================================
// Targeting
// =====================================================

/// Seconds between target scans
pub const SCAN_INTERVAL_SECS: f32 = 0.07;

/// Delay before the first scan after an agent is spawned
pub const SCAN_INITIAL_DELAY_SECS: f32 = 0.05;

/// Line-of-sight rays start this far above the agent origin (cm)
pub const LOS_HEIGHT_OFFSET: f32 = 50.0;

/// Planar distances at or below this are treated as degenerate
pub const DEGENERATE_DISTANCE: f32 = 1.0e-4;

/// Default score weights
pub const WEIGHT_DISTANCE: f32 = 0.6;
pub const WEIGHT_ANGLE: f32 = 1.0;
pub const WEIGHT_VELOCITY: f32 = 0.2;
pub const WEIGHT_STICKY: f32 = 0.5;

/// Hysteresis margin at stickiness 1.0 (+25% required to switch)
pub const MAX_HYSTERESIS_MARGIN: f32 = 0.25;

// =====================================================
// Aim correction
// =====================================================

/// Assist strength at zero stick input
pub const ASSIST_STRENGTH_MAX: f32 = 1.0;

/// Assist strength at full stick input
pub const ASSIST_STRENGTH_MIN: f32 = 0.25;

/// Rate-limited turns below this many degrees are skipped
pub const MIN_ASSIST_STEP_DEG: f32 = 0.01;

/// Floor for projectile homing acceleration once homing is enabled (cm/s^2)
pub const MIN_HOMING_ACCELERATION: f32 = 8000.0;
