//! Dash endpoint resolution.
//!
//! Samples evenly along the dash ray and keeps the last (furthest) sample
//! that survives navigation projection, ground snap, the height guard and the
//! per-channel capsule overlap test.

use bevy::prelude::*;

use super::{DashQueryParams, DashQueryResult};
use crate::constants::{GROUND_CLEARANCE, GROUND_PROBE_DOWN, GROUND_PROBE_UP};
use crate::math;
use crate::world::{AgentState, CollisionChannel, WorldQuery};

/// Why a dash sample was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleRejection {
    /// Navigation projection was requested and found nothing
    OffNavigation,
    /// Vertical deviation from the start exceeded the allowed delta
    HeightDelta,
    /// The capsule overlapped blocking geometry on this channel
    Blocked(CollisionChannel),
}

/// One sample of a dash query, reported for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashSample {
    /// 1-based sample index
    pub index: u32,
    /// Raw point on the dash ray
    pub candidate: Vec3,
    /// Validated capsule centre, or why the sample was rejected
    pub outcome: Result<Vec3, SampleRejection>,
}

/// Resolve the furthest valid dash endpoint for `agent`.
pub fn resolve_dash_endpoint<W: WorldQuery + ?Sized>(
    agent: &AgentState,
    params: &DashQueryParams,
    world: &W,
) -> DashQueryResult {
    resolve_dash_endpoint_traced(agent, params, world, |_| {})
}

/// [`resolve_dash_endpoint`] that also reports every sample to `on_sample`.
pub fn resolve_dash_endpoint_traced<W, F>(
    agent: &AgentState,
    params: &DashQueryParams,
    world: &W,
    mut on_sample: F,
) -> DashQueryResult
where
    W: WorldQuery + ?Sized,
    F: FnMut(DashSample),
{
    let _span = tracing::debug_span!("dash_query", agent = ?agent.entity).entered();
    let params = params.sanitized();
    let start = agent.position;

    let Some(direction) = math::planar_direction(params.desired_direction)
        .or_else(|| agent.forward_2d().try_normalize())
    else {
        debug!(agent = ?agent.entity, "dash query: no usable direction");
        return DashQueryResult::not_found();
    };

    let mut furthest = None;
    for index in 1..=params.num_samples {
        let t = index as f32 / params.num_samples as f32;
        let candidate = start + math::unplanar(direction, 0.0) * (params.max_distance * t);
        let outcome = validate_candidate(agent, &params, world, candidate);

        if let Ok(center) = outcome {
            furthest = Some(center);
        }
        on_sample(DashSample {
            index,
            candidate,
            outcome,
        });
    }

    match furthest {
        Some(end) => {
            let result = DashQueryResult {
                found: true,
                end_location: end,
                facing: math::yaw_rotation(math::yaw_from_direction(direction)),
                travel: math::distance_2d(start, end),
            };
            debug!(
                agent = ?agent.entity,
                end = ?result.end_location,
                travel = result.travel,
                "dash query resolved"
            );
            result
        }
        None => {
            debug!(agent = ?agent.entity, samples = params.num_samples, "dash query: no valid sample");
            DashQueryResult::not_found()
        }
    }
}

fn validate_candidate<W: WorldQuery + ?Sized>(
    agent: &AgentState,
    params: &DashQueryParams,
    world: &W,
    candidate: Vec3,
) -> Result<Vec3, SampleRejection> {
    let start = agent.position;
    let half = agent.capsule.half_height;

    let base = if params.project_to_nav {
        world
            .project_to_navigation(candidate)
            .ok_or(SampleRejection::OffNavigation)?
    } else {
        candidate
    };

    let mut center = Vec3::new(base.x, start.y, base.z);
    if params.snap_to_ground {
        let probe_from = base + Vec3::Y * (half + GROUND_PROBE_UP);
        let probe_to = base - Vec3::Y * (half + GROUND_PROBE_DOWN);
        if let Some(hit) = world.line_trace(
            probe_from,
            probe_to,
            CollisionChannel::Visibility,
            Some(agent.entity),
        ) {
            center = hit.location + Vec3::Y * (half + GROUND_CLEARANCE);
        }
    }

    if (center.y - start.y).abs() > params.max_height_delta {
        return Err(SampleRejection::HeightDelta);
    }

    let shape = agent.capsule.inflated(params.clearance_buffer);
    if let Some(channel) = params
        .channels
        .iter()
        .copied()
        .find(|channel| world.capsule_blocked(center, shape, *channel, Some(agent.entity)))
    {
        return Err(SampleRejection::Blocked(channel));
    }

    Ok(center)
}
