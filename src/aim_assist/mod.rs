//! Aim assist: periodic target acquisition plus per-frame facing correction.
//!
//! The [`AimAssist`] component owns the per-agent state (profile, current
//! target, scan timer, last scan report). Its methods are pure over the
//! [`world`](crate::world) traits; the systems in this module feed them from
//! the ECS and the rapier scene.

use std::sync::Arc;
use std::time::Duration;

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

pub mod correction;
pub mod profile;
pub mod scoring;

pub use correction::{apply_assist, assist_strength, melee_commit, ranged_fire, MeleeLunge};
pub use profile::{AimAssistProfile, ProfileError};
pub use scoring::{scan_targets, ScanReport, ScanSettings, ScoreWeights, TargetCandidate};

use crate::config::CoreConfig;
use crate::constants::*;
use crate::math;
use crate::movement::Lunge;
use crate::physics::RapierScene;
use crate::world::{
    ActorRegistry, AgentState, Aimable, CharacterCapsule, ProjectileControl, WorldQuery,
};

pub struct AimAssistPlugin;

impl Plugin for AimAssistPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<MeleeCommit>()
            .add_event::<RangedFire>()
            .add_event::<TargetChanged>()
            .init_resource::<ActiveProfile>()
            .add_systems(
                Update,
                (
                    apply_core_config,
                    attach_active_profile,
                    scan_for_targets,
                    apply_aim_assist,
                    handle_melee_commits,
                    handle_ranged_fire,
                    steer_projectiles,
                )
                    .chain(),
            );
    }
}

// ============================================================================
// Components, resources and events
// ============================================================================

/// Profile handed to agents that are spawned without one.
#[derive(Resource, Debug, Clone, Default)]
pub struct ActiveProfile(pub Arc<AimAssistProfile>);

/// Marks an actor that aim assist may lock onto.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Targetable {
    /// Aim point relative to the actor origin (head/torso)
    pub aim_offset: Vec3,
    pub targetable: bool,
}

impl Default for Targetable {
    fn default() -> Self {
        Self {
            aim_offset: Vec3::Y * 60.0,
            targetable: true,
        }
    }
}

/// An agent committed to a melee attack this frame.
#[derive(Event, Debug, Clone, Copy)]
pub struct MeleeCommit {
    pub agent: Entity,
}

/// `shooter` launched `projectile` this frame.
#[derive(Event, Debug, Clone, Copy)]
pub struct RangedFire {
    pub shooter: Entity,
    pub projectile: Entity,
}

/// A scan changed an agent's selected target.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetChanged {
    pub agent: Entity,
    pub previous: Option<Entity>,
    pub current: Option<Entity>,
}

/// Per-agent aim-assist state.
#[derive(Component, Debug)]
pub struct AimAssist {
    profile: Option<Arc<AimAssistProfile>>,
    pub settings: ScanSettings,
    current_target: Option<Entity>,
    aim_input_magnitude: f32,
    scan_interval: f32,
    scan_timer: Timer,
    last_scan: ScanReport,
    /// Take scan settings from the session's [`CoreConfig`] when spawned
    inherit_config: bool,
}

impl Default for AimAssist {
    fn default() -> Self {
        Self::with_timing(None, ScanSettings::default(), SCAN_INTERVAL_SECS, SCAN_INITIAL_DELAY_SECS)
    }
}

impl AimAssist {
    pub fn new(profile: Arc<AimAssistProfile>) -> Self {
        Self {
            profile: Some(profile),
            ..default()
        }
    }

    /// Scan settings and timing taken from `config`. The session config
    /// will not override them.
    pub fn from_config(config: &CoreConfig, profile: Option<Arc<AimAssistProfile>>) -> Self {
        let mut assist = Self {
            profile,
            ..default()
        };
        assist.apply_config(config);
        assist
    }

    /// Replace scan settings and timing with `config`'s and restart the
    /// scan timer from the initial delay.
    pub fn apply_config(&mut self, config: &CoreConfig) {
        self.settings = ScanSettings {
            weights: config.weights,
            object_types: config.object_types.clone(),
            los_channel: config.los_channel,
            los_height_offset: config.los_height_offset,
        };
        self.scan_interval = config.scan_interval_secs.max(f32::EPSILON);
        self.scan_timer =
            Timer::from_seconds(config.scan_initial_delay_secs.max(0.0), TimerMode::Once);
        self.inherit_config = false;
    }

    fn with_timing(
        profile: Option<Arc<AimAssistProfile>>,
        settings: ScanSettings,
        interval: f32,
        initial_delay: f32,
    ) -> Self {
        Self {
            profile,
            settings,
            current_target: None,
            aim_input_magnitude: 0.0,
            scan_interval: interval.max(f32::EPSILON),
            scan_timer: Timer::from_seconds(initial_delay.max(0.0), TimerMode::Once),
            last_scan: ScanReport::default(),
            inherit_config: true,
        }
    }

    pub fn profile(&self) -> Option<&Arc<AimAssistProfile>> {
        self.profile.as_ref()
    }

    /// Swap the profile. Takes effect on the next scan or tick.
    pub fn set_profile(&mut self, profile: Arc<AimAssistProfile>) {
        self.profile = Some(profile);
    }

    pub fn current_target(&self) -> Option<Entity> {
        self.current_target
    }

    /// The current target, if it still resolves.
    pub fn resolved_target<'r, R: ActorRegistry + ?Sized>(
        &self,
        registry: &'r R,
    ) -> Option<R::Target<'r>> {
        registry.resolve(self.current_target?)
    }

    pub fn clear_target(&mut self) {
        self.current_target = None;
    }

    pub fn aim_input_magnitude(&self) -> f32 {
        self.aim_input_magnitude
    }

    pub fn set_aim_input_magnitude(&mut self, magnitude: f32) {
        self.aim_input_magnitude = if magnitude.is_nan() {
            0.0
        } else {
            magnitude.clamp(0.0, 1.0)
        };
    }

    /// Seconds between scans once the initial delay has passed.
    pub fn scan_interval(&self) -> f32 {
        self.scan_interval
    }

    pub fn last_scan(&self) -> &ScanReport {
        &self.last_scan
    }

    /// Advance the scan timer. True when a scan is due this frame.
    pub fn scan_due(&mut self, delta: Duration) -> bool {
        self.scan_timer.tick(delta);
        if !self.scan_timer.just_finished() {
            return false;
        }
        if self.scan_timer.mode() == TimerMode::Once {
            self.scan_timer = Timer::from_seconds(self.scan_interval, TimerMode::Repeating);
        }
        true
    }

    /// Run target acquisition and store the selection. Without a profile
    /// nothing changes.
    pub fn periodic_scan<W, R>(&mut self, agent: &AgentState, world: &W, registry: &R) -> Option<Entity>
    where
        W: WorldQuery + ?Sized,
        R: ActorRegistry + ?Sized,
    {
        let Some(profile) = self.profile.as_deref() else {
            return self.current_target;
        };
        let report = scan_targets(
            agent,
            profile,
            &self.settings,
            self.current_target,
            world,
            registry,
        );
        self.current_target = report.selected;
        self.last_scan = report;
        self.current_target
    }

    /// Per-frame correction. Writes the new yaw into `agent` and returns the
    /// yaw change in degrees.
    pub fn tick<R: ActorRegistry + ?Sized>(&self, agent: &mut AgentState, registry: &R, dt: f32) -> f32 {
        let Some(profile) = self.profile.as_deref() else {
            return 0.0;
        };
        let Some(target) = self.resolved_target(registry) else {
            return 0.0;
        };
        apply_assist(
            agent,
            target.aim_point(),
            profile,
            self.aim_input_magnitude,
            dt,
        )
    }

    /// Turn toward the target on a melee commit and return the lunge.
    pub fn on_melee_commit<R: ActorRegistry + ?Sized>(
        &self,
        agent: &mut AgentState,
        registry: &R,
    ) -> Option<MeleeLunge> {
        let profile = self.profile.as_deref()?;
        let target = self.resolved_target(registry)?;
        melee_commit(agent, target.aim_point(), profile)
    }

    /// Steer and arm homing on a freshly fired projectile. False when there
    /// was nothing to assist toward.
    pub fn on_ranged_fire<P, R>(&self, projectile: &mut P, registry: &R) -> bool
    where
        P: ProjectileControl + ?Sized,
        R: ActorRegistry + ?Sized,
    {
        let (Some(profile), Some(actor)) = (self.profile.as_deref(), self.current_target) else {
            return false;
        };
        let Some(target) = registry.resolve(actor) else {
            return false;
        };
        ranged_fire(projectile, actor, target.aim_point(), profile);
        true
    }

    /// Look-sensitivity multiplier for camera code: the profile's friction
    /// scale while the target sits in the friction cone, otherwise 1.
    pub fn look_sensitivity_scale<R: ActorRegistry + ?Sized>(
        &self,
        agent: &AgentState,
        registry: &R,
    ) -> f32 {
        let (Some(profile), Some(target)) = (self.profile.as_deref(), self.resolved_target(registry))
        else {
            return 1.0;
        };
        if correction::in_friction_cone(agent, target.aim_point(), profile) {
            profile.friction_scale
        } else {
            1.0
        }
    }
}

// ============================================================================
// Registry over the ECS
// ============================================================================

/// Snapshot of a targetable actor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetView {
    pub aim_point: Vec3,
    pub targetable: bool,
    pub velocity: Vec3,
}

impl Aimable for TargetView {
    fn aim_point(&self) -> Vec3 {
        self.aim_point
    }

    fn can_be_targeted(&self) -> bool {
        self.targetable
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }
}

pub type TargetData = (
    &'static Transform,
    &'static Targetable,
    Option<&'static Velocity>,
);

/// Agents running aim assist and in-flight projectiles are never targets.
pub type TargetFilter = (Without<AimAssist>, Without<ProjectileMotion>);

/// [`ActorRegistry`] over the targetable actors in the world.
pub struct TargetRegistry<'q, 'w, 's>(pub &'q Query<'w, 's, TargetData, TargetFilter>);

impl ActorRegistry for TargetRegistry<'_, '_, '_> {
    type Target<'a>
        = TargetView
    where
        Self: 'a;

    fn resolve(&self, actor: Entity) -> Option<TargetView> {
        let (transform, targetable, velocity) = self.0.get(actor).ok()?;
        Some(TargetView {
            aim_point: transform.translation + targetable.aim_offset,
            targetable: targetable.targetable,
            velocity: velocity.map_or(Vec3::ZERO, |v| v.linvel),
        })
    }
}

// ============================================================================
// Projectiles
// ============================================================================

/// Time-limited homing on a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homing {
    pub target: Entity,
    /// cm/s^2
    pub acceleration: f32,
    /// Seconds left before homing switches off
    pub remaining: f32,
}

/// Planar projectile flight at constant speed along its yaw.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct ProjectileMotion {
    /// cm/s
    pub speed: f32,
    /// Acceleration used when homing is armed (cm/s^2)
    pub homing_acceleration: f32,
    pub homing: Option<Homing>,
    /// Seconds until the projectile despawns
    pub lifetime: f32,
}

impl ProjectileMotion {
    pub fn new(speed: f32, lifetime: f32) -> Self {
        Self {
            speed: speed.max(0.0),
            homing_acceleration: 0.0,
            homing: None,
            lifetime,
        }
    }
}

/// [`ProjectileControl`] over a projectile's components.
pub struct ProjectileHandle<'a> {
    pub transform: &'a mut Transform,
    pub motion: &'a mut ProjectileMotion,
}

impl ProjectileControl for ProjectileHandle<'_> {
    fn position(&self) -> Vec3 {
        self.transform.translation
    }

    fn yaw(&self) -> f32 {
        math::yaw_of(self.transform.rotation)
    }

    fn set_yaw(&mut self, yaw: f32) {
        self.transform.rotation = math::yaw_rotation(yaw);
    }

    fn homing_acceleration(&self) -> f32 {
        self.motion.homing_acceleration
    }

    fn enable_homing(&mut self, target: Entity, acceleration: f32, duration: f32) {
        self.motion.homing_acceleration = acceleration;
        self.motion.homing = Some(Homing {
            target,
            acceleration,
            remaining: duration,
        });
    }
}

/// Pure pursuit: bend the planar velocity toward `aim_point` by
/// `acceleration * dt`, keeping the speed. Returns the new yaw.
pub fn homing_yaw(
    position: Vec3,
    yaw: f32,
    aim_point: Vec3,
    speed: f32,
    acceleration: f32,
    dt: f32,
) -> f32 {
    let Some(to_target) = math::planar_direction(aim_point - position) else {
        return yaw;
    };
    let velocity = math::forward_from_yaw(yaw) * speed;
    let bent = velocity + to_target * acceleration * dt;
    match bent.try_normalize() {
        Some(direction) => math::yaw_from_direction(direction),
        None => yaw,
    }
}

// ============================================================================
// Systems
// ============================================================================

/// System: newly added agents built without a config take the session's
/// scan settings and timing.
pub fn apply_core_config(
    config: Option<Res<CoreConfig>>,
    mut agents: Query<&mut AimAssist, Added<AimAssist>>,
) {
    let Some(config) = config else {
        return;
    };
    for mut assist in &mut agents {
        if assist.inherit_config {
            assist.apply_config(&config);
        }
    }
}

/// System: give newly added agents the active profile if they have none.
pub fn attach_active_profile(
    active: Res<ActiveProfile>,
    mut agents: Query<&mut AimAssist, Added<AimAssist>>,
) {
    for mut assist in &mut agents {
        if assist.profile.is_none() {
            assist.set_profile(Arc::clone(&active.0));
        }
    }
}

/// System: run due target scans against the rapier scene.
pub fn scan_for_targets(
    time: Res<Time>,
    rapier: ReadDefaultRapierContext,
    mut agents: Query<(Entity, &Transform, Option<&CharacterCapsule>, &mut AimAssist)>,
    targets: Query<TargetData, TargetFilter>,
    mut changed: EventWriter<TargetChanged>,
) {
    let scene = RapierScene::new(rapier.single(), Vec::new());
    let registry = TargetRegistry(&targets);

    for (entity, transform, capsule, mut assist) in &mut agents {
        if !assist.scan_due(time.delta()) {
            continue;
        }
        let agent = AgentState::from_transform(entity, transform, capsule.copied().unwrap_or_default());
        let previous = assist.current_target();
        let current = assist.periodic_scan(&agent, &scene, &registry);
        if previous != current {
            debug!(agent = ?entity, ?previous, ?current, "aim target changed");
            changed.send(TargetChanged {
                agent: entity,
                previous,
                current,
            });
        }
    }
}

/// System: nudge agent facing toward their targets.
pub fn apply_aim_assist(
    time: Res<Time>,
    mut agents: Query<(Entity, &mut Transform, Option<&CharacterCapsule>, &AimAssist)>,
    targets: Query<TargetData, TargetFilter>,
) {
    let dt = time.delta_secs();
    let registry = TargetRegistry(&targets);

    for (entity, mut transform, capsule, assist) in &mut agents {
        let mut agent =
            AgentState::from_transform(entity, &transform, capsule.copied().unwrap_or_default());
        let applied = assist.tick(&mut agent, &registry, dt);
        if applied != 0.0 {
            transform.rotation = math::yaw_rotation(agent.yaw);
        }
    }
}

/// System: melee commit turn and lunge.
pub fn handle_melee_commits(
    mut commands: Commands,
    mut commits: EventReader<MeleeCommit>,
    mut agents: Query<(&mut Transform, Option<&CharacterCapsule>, &AimAssist)>,
    targets: Query<TargetData, TargetFilter>,
) {
    let registry = TargetRegistry(&targets);

    for commit in commits.read() {
        let Ok((mut transform, capsule, assist)) = agents.get_mut(commit.agent) else {
            continue;
        };
        let mut agent =
            AgentState::from_transform(commit.agent, &transform, capsule.copied().unwrap_or_default());
        let Some(lunge) = assist.on_melee_commit(&mut agent, &registry) else {
            continue;
        };
        transform.rotation = math::yaw_rotation(agent.yaw);
        debug!(agent = ?commit.agent, distance = lunge.distance, "melee lunge");
        commands
            .entity(commit.agent)
            .insert(Lunge::new(lunge.direction, lunge.speed, lunge.distance));
    }
}

/// System: projectile steering and homing on ranged fire.
pub fn handle_ranged_fire(
    mut fired: EventReader<RangedFire>,
    shooters: Query<&AimAssist>,
    mut projectiles: Query<(&mut Transform, &mut ProjectileMotion)>,
    targets: Query<TargetData, TargetFilter>,
) {
    let registry = TargetRegistry(&targets);

    for event in fired.read() {
        let Ok(assist) = shooters.get(event.shooter) else {
            continue;
        };
        let Ok((mut transform, mut motion)) = projectiles.get_mut(event.projectile) else {
            warn!(projectile = ?event.projectile, "ranged fire for missing projectile");
            continue;
        };
        let mut handle = ProjectileHandle {
            transform: &mut transform,
            motion: &mut motion,
        };
        if assist.on_ranged_fire(&mut handle, &registry) {
            debug!(shooter = ?event.shooter, projectile = ?event.projectile, "projectile assisted");
        }
    }
}

/// System: fly projectiles, pursue homing targets and expire homing/lifetime.
pub fn steer_projectiles(
    time: Res<Time>,
    mut commands: Commands,
    mut projectiles: Query<(Entity, &mut Transform, &mut ProjectileMotion)>,
    targets: Query<TargetData, TargetFilter>,
) {
    let dt = time.delta_secs();
    let registry = TargetRegistry(&targets);

    for (entity, mut transform, mut motion) in &mut projectiles {
        if let Some(mut homing) = motion.homing {
            homing.remaining -= dt;
            let target = registry.resolve(homing.target);
            motion.homing = match target {
                Some(target) if homing.remaining > 0.0 => {
                    let yaw = homing_yaw(
                        transform.translation,
                        math::yaw_of(transform.rotation),
                        target.aim_point(),
                        motion.speed,
                        homing.acceleration,
                        dt,
                    );
                    transform.rotation = math::yaw_rotation(yaw);
                    Some(homing)
                }
                _ => {
                    trace!(projectile = ?entity, "homing disabled");
                    None
                }
            };
        }

        let forward = math::forward_from_yaw(math::yaw_of(transform.rotation));
        transform.translation += math::unplanar(forward, 0.0) * motion.speed * dt;

        motion.lifetime -= dt;
        if motion.lifetime <= 0.0 {
            commands.entity(entity).despawn();
        }
    }
}
