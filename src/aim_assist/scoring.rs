//! Target acquisition: overlap, score, filter and select with hysteresis.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::AimAssistProfile;
use crate::constants::*;
use crate::math;
use crate::world::{ActorRegistry, AgentState, Aimable, CollisionChannel, WorldQuery};

/// Weights of the target score terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub distance: f32,
    pub angle: f32,
    pub velocity: f32,
    pub sticky: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            distance: WEIGHT_DISTANCE,
            angle: WEIGHT_ANGLE,
            velocity: WEIGHT_VELOCITY,
            sticky: WEIGHT_STICKY,
        }
    }
}

/// Per-agent scan configuration that is not part of the shared profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSettings {
    pub weights: ScoreWeights,
    pub object_types: Vec<CollisionChannel>,
    pub los_channel: CollisionChannel,
    pub los_height_offset: f32,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            object_types: vec![CollisionChannel::Pawn, CollisionChannel::WorldDynamic],
            los_channel: CollisionChannel::Visibility,
            los_height_offset: LOS_HEIGHT_OFFSET,
        }
    }
}

/// One scored actor from a scan. Scores only compare within the same scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetCandidate {
    pub actor: Entity,
    pub aim_point: Vec3,
    pub distance_2d: f32,
    /// Planar alignment of the agent's facing with the direction to the target
    pub angle_dot: f32,
    pub velocity_align: f32,
    pub score: f32,
    pub in_fov: bool,
    pub has_los: bool,
}

impl TargetCandidate {
    pub fn eligible(&self) -> bool {
        self.in_fov && self.has_los
    }
}

/// Outcome of one scan, kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    pub candidates: Vec<TargetCandidate>,
    /// Score of the previous target; `-inf` when absent or failing FOV/LOS
    pub baseline: f32,
    /// Overlapped actors
    pub processed: usize,
    /// Actors that resolved as aimable and accepted targeting
    pub valid: usize,
    pub in_fov: usize,
    pub with_los: usize,
    pub previous: Option<Entity>,
    pub selected: Option<Entity>,
    /// Hysteresis held on to `previous` over a better-scoring candidate
    pub kept_by_hysteresis: bool,
}

impl Default for ScanReport {
    fn default() -> Self {
        Self {
            candidates: Vec::new(),
            baseline: f32::NEG_INFINITY,
            processed: 0,
            valid: 0,
            in_fov: 0,
            with_los: 0,
            previous: None,
            selected: None,
            kept_by_hysteresis: false,
        }
    }
}

impl ScanReport {
    pub fn candidate(&self, actor: Entity) -> Option<&TargetCandidate> {
        self.candidates.iter().find(|c| c.actor == actor)
    }
}

/// Score terms for a target seen at `distance_2d` with alignment `angle_dot`.
pub fn score_target(
    weights: &ScoreWeights,
    distance_2d: f32,
    angle_dot: f32,
    velocity_align: f32,
    is_current: bool,
) -> f32 {
    let distance_term = if distance_2d > DEGENERATE_DISTANCE {
        1.0 / distance_2d
    } else {
        1.0
    };
    let sticky = if is_current { 1.0 } else { 0.0 };
    weights.distance * distance_term
        + weights.angle * angle_dot
        + weights.velocity * velocity_align
        + weights.sticky * sticky
}

/// Alignment of the target's planar velocity with the agent's facing.
/// Zero when the target is (nearly) still.
pub fn velocity_alignment(forward: Vec2, velocity: Vec3) -> f32 {
    math::planar_direction(velocity).map_or(0.0, |dir| dir.dot(forward))
}

/// Inclusive FOV test against a precomputed half-angle cosine.
pub fn passes_fov(angle_dot: f32, fov_cos: f32) -> bool {
    angle_dot >= fov_cos
}

/// Extra fraction a challenger must beat the current target by.
pub fn hysteresis_margin(stickiness: f32) -> f32 {
    MAX_HYSTERESIS_MARGIN * stickiness.clamp(0.0, 1.0)
}

/// Whether hysteresis keeps the current target over a challenger scoring
/// `best`. The margin scales with the baseline's magnitude so negative
/// scores still favour the current target. A `-inf` baseline never keeps.
pub fn keeps_current(best: f32, baseline: f32, stickiness: f32) -> bool {
    if !baseline.is_finite() {
        return false;
    }
    best < baseline + baseline.abs() * hysteresis_margin(stickiness)
}

/// Clear sight from just above the agent to `aim_point`. A hit on the
/// target itself counts as clear.
pub fn has_line_of_sight<W: WorldQuery + ?Sized>(
    agent: &AgentState,
    target: Entity,
    aim_point: Vec3,
    settings: &ScanSettings,
    world: &W,
) -> bool {
    let from = agent.position + Vec3::Y * settings.los_height_offset;
    match world.line_trace(from, aim_point, settings.los_channel, Some(agent.entity)) {
        None => true,
        Some(hit) => hit.actor == Some(target),
    }
}

fn planar_alignment(agent: &AgentState, aim_point: Vec3) -> (f32, f32) {
    let to_target = math::planar(aim_point - agent.position);
    let dot = agent.forward_2d().dot(to_target.normalize_or_zero());
    (to_target.length(), dot)
}

/// Run one full scan for `agent`.
pub fn scan_targets<W, R>(
    agent: &AgentState,
    profile: &AimAssistProfile,
    settings: &ScanSettings,
    current: Option<Entity>,
    world: &W,
    registry: &R,
) -> ScanReport
where
    W: WorldQuery + ?Sized,
    R: ActorRegistry + ?Sized,
{
    let _span = tracing::debug_span!("aim_scan", agent = ?agent.entity).entered();
    let mut report = ScanReport {
        previous: current,
        ..default()
    };

    let actors = world.overlap_actors(
        agent.position,
        profile.assist_range_cm,
        &settings.object_types,
        Some(agent.entity),
    );
    if actors.is_empty() {
        debug!(agent = ?agent.entity, range = profile.assist_range_cm, "aim scan: nothing in range");
        return report;
    }

    let forward = agent.forward_2d();
    let fov_cos = profile.fov_cos();

    if let Some((actor, target)) =
        current.and_then(|actor| Some((actor, registry.resolve(actor)?)))
    {
        let aim_point = target.aim_point();
        let (distance, dot) = planar_alignment(agent, aim_point);
        if passes_fov(dot, fov_cos) && has_line_of_sight(agent, actor, aim_point, settings, world) {
            let vel = velocity_alignment(forward, target.velocity());
            report.baseline = score_target(&settings.weights, distance, dot, vel, true);
        }
    }

    let mut best: Option<(Entity, f32)> = None;
    for actor in actors {
        report.processed += 1;
        if actor == agent.entity {
            continue;
        }
        let Some(target) = registry.resolve(actor) else {
            trace!(?actor, "aim scan: not aimable");
            continue;
        };
        if !target.can_be_targeted() {
            trace!(?actor, "aim scan: refuses targeting");
            continue;
        }
        report.valid += 1;

        let aim_point = target.aim_point();
        let (distance, dot) = planar_alignment(agent, aim_point);
        if distance <= DEGENERATE_DISTANCE {
            trace!(?actor, "aim scan: too close");
            continue;
        }

        let velocity_align = velocity_alignment(forward, target.velocity());
        let score = score_target(
            &settings.weights,
            distance,
            dot,
            velocity_align,
            Some(actor) == current,
        );
        let in_fov = passes_fov(dot, fov_cos);
        let has_los = has_line_of_sight(agent, actor, aim_point, settings, world);
        report.in_fov += usize::from(in_fov);
        report.with_los += usize::from(has_los);

        let candidate = TargetCandidate {
            actor,
            aim_point,
            distance_2d: distance,
            angle_dot: dot,
            velocity_align,
            score,
            in_fov,
            has_los,
        };
        trace!(?actor, score, in_fov, has_los, distance, "aim scan: candidate");

        if candidate.eligible() && best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((actor, score));
        }
        report.candidates.push(candidate);
    }

    report.selected = match (best, current) {
        (Some((challenger, score)), Some(previous))
            if challenger != previous && keeps_current(score, report.baseline, profile.stickiness) =>
        {
            report.kept_by_hysteresis = true;
            Some(previous)
        }
        (best, _) => best.map(|(actor, _)| actor),
    };

    debug!(
        agent = ?agent.entity,
        processed = report.processed,
        valid = report.valid,
        in_fov = report.in_fov,
        with_los = report.with_los,
        selected = ?report.selected,
        "aim scan complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_terms() {
        let w = ScoreWeights::default();
        let score = score_target(&w, 100.0, 1.0, 0.0, false);
        assert!((score - (0.6 / 100.0 + 1.0)).abs() < 1e-6);
        let sticky = score_target(&w, 100.0, 1.0, 0.0, true);
        assert!((sticky - score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_distance_term_is_one() {
        let w = ScoreWeights {
            angle: 0.0,
            velocity: 0.0,
            sticky: 0.0,
            distance: 1.0,
        };
        assert!((score_target(&w, 0.0, 0.0, 0.0, false) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_velocity_alignment() {
        let forward = Vec2::X;
        assert_eq!(velocity_alignment(forward, Vec3::ZERO), 0.0);
        assert!((velocity_alignment(forward, Vec3::new(50.0, 0.0, 0.0)) - 1.0).abs() < 1e-6);
        assert!((velocity_alignment(forward, Vec3::new(0.0, 0.0, -20.0))).abs() < 1e-6);
        assert_eq!(velocity_alignment(forward, Vec3::Y * 300.0), 0.0);
    }

    #[test]
    fn test_hysteresis_margin_lerp() {
        assert_eq!(hysteresis_margin(0.0), 0.0);
        assert!((hysteresis_margin(0.6) - 0.15).abs() < 1e-6);
        assert!((hysteresis_margin(1.0) - 0.25).abs() < 1e-6);
        assert!((hysteresis_margin(4.0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_keeps_current_threshold() {
        assert!(keeps_current(11.0, 10.0, 0.6));
        assert!(!keeps_current(11.6, 10.0, 0.6));
        assert!(!keeps_current(-1.0e30, f32::NEG_INFINITY, 1.0));
    }

    #[test]
    fn test_keeps_current_negative_baseline() {
        // Threshold is -10 + 10 * 0.15 = -8.5
        assert!(keeps_current(-9.0, -10.0, 0.6));
        assert!(keeps_current(-10.0, -10.0, 0.6));
        assert!(!keeps_current(-8.0, -10.0, 0.6));
        assert!(!keeps_current(-9.0, -10.0, 0.0));
    }

    #[test]
    fn test_fov_inclusive() {
        let fov_cos = (22.5f32).to_radians().cos();
        assert!(passes_fov(fov_cos, fov_cos));
        assert!(!passes_fov(fov_cos - 1e-4, fov_cos));
    }
}
