//! Tethered - Gameplay Core Library
//!
//! Host-agnostic gameplay algorithms for a third-person action game:
//! - Dash endpoint resolution (sampled path, nav/ground/collision validation)
//! - Aim assist target acquisition (scoring with hysteresis)
//! - Aim correction (soft snap, rate-limited turn, melee lunge, projectile homing)
//!
//! The algorithms are plain functions over the [`world`] traits. The Bevy
//! plugins wire them into an app backed by `bevy_rapier3d`.

pub mod aim_assist;
pub mod config;
pub mod constants;
pub mod dash;
pub mod debug;
pub mod hotreload;
pub mod logging;
pub mod math;
pub mod movement;
pub mod physics;
pub mod world;

use std::sync::Arc;

use bevy::prelude::*;

use aim_assist::{ActiveProfile, AimAssistPlugin, AimAssistProfile};
use config::CoreConfig;
use dash::DashPlugin;
use hotreload::ProfileHotReloadPlugin;
use movement::MovementPlugin;

/// Everything the gameplay core needs, driven by one [`CoreConfig`].
///
/// Rapier's physics plugin and the debug-draw plugin are left to the host.
#[derive(Default)]
pub struct TetheredCorePlugin {
    pub config: CoreConfig,
    /// Profile used when `config.profile_path` is unset or fails to load
    pub profile: AimAssistProfile,
}

impl Plugin for TetheredCorePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.clone())
            .insert_resource(self.config.dash)
            .insert_resource(self.config.diagnostics)
            .insert_resource(ActiveProfile(Arc::new(self.profile.clone())))
            .add_plugins((DashPlugin, MovementPlugin, AimAssistPlugin));

        if let Some(path) = &self.config.profile_path {
            app.add_plugins(ProfileHotReloadPlugin { path: path.clone() });
        }
    }
}

pub mod prelude {
    pub use crate::aim_assist::{
        AimAssist, AimAssistPlugin, AimAssistProfile, MeleeCommit, ProjectileMotion, RangedFire,
        TargetChanged, Targetable,
    };
    pub use crate::config::{CoreConfig, DashSettings, Diagnostics};
    pub use crate::dash::{
        resolve_dash_endpoint, DashPlugin, DashQueryParams, DashQueryResult, DashRequest,
        DashResolved,
    };
    pub use crate::debug::AimAssistDebugPlugin;
    pub use crate::movement::{DashMotion, Lunge, MovementPlugin};
    pub use crate::physics::NavArea;
    pub use crate::world::{
        ActorRegistry, AgentState, Aimable, CharacterCapsule, CollisionChannel,
        ProjectileControl, WorldQuery,
    };
    pub use crate::TetheredCorePlugin;
}
