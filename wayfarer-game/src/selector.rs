//! Weighted random scene selection.
use crate::graph::SceneGraph;
use crate::scene::Scene;
use crate::state::PlayerState;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const STARTING_POOL: &str = "wayfarer.start";
const TRANSITION_POOL: &str = "wayfarer.transition";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// Nothing eligible to play next; callers end the adventure.
    #[error("no scene available{}", from.as_ref().map(|id| format!(" after '{id}'")).unwrap_or_default())]
    NoSceneAvailable { from: Option<String> },
}

/// Explainability telemetry for a weighted selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTrace {
    /// Identifier for the selection pool (e.g., `wayfarer.transition`).
    pub pool_id: String,
    /// Draw in `[0, total_weight)` that picked the winner.
    pub roll: f64,
    pub total_weight: f64,
    /// Candidate weights considered during selection, in draw order.
    pub candidates: Vec<WeightedCandidate>,
    pub chosen_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedCandidate {
    pub id: String,
    pub weight: f64,
}

/// Selected scene plus the trace of how it was drawn.
#[derive(Debug, Clone)]
pub struct SceneSelection<'g> {
    pub scene: &'g Scene,
    pub trace: DecisionTrace,
}

/// Cumulative-weight draw over `weights`.
///
/// Returns the chosen index and the roll, or `None` when the total weight is
/// not positive. Zero, negative and NaN weights are never chosen.
pub fn choose_weighted<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<(usize, f64)> {
    let total: f64 = weights.iter().copied().filter(|w| drawable(*w)).sum();
    if !(total.is_finite() && total > 0.0) {
        return None;
    }

    let roll = rng.gen_range(0.0..total);
    let mut cumulative = 0.0;
    let mut last_positive = None;
    for (idx, weight) in weights.iter().copied().enumerate() {
        if !drawable(weight) {
            continue;
        }
        cumulative += weight;
        last_positive = Some(idx);
        if roll < cumulative {
            return Some((idx, roll));
        }
    }

    // Floating point drift can leave the roll just past the final bucket.
    last_positive.map(|idx| (idx, roll))
}

// NaN fails every comparison, so test for the positive case.
fn drawable(weight: f64) -> bool {
    weight > 0.0
}

/// Pick the next scene: a starting scene when `current_scene` is `None`,
/// otherwise a target of an eligible outgoing transition.
///
/// # Errors
///
/// Returns [`SelectionError::NoSceneAvailable`] when no candidate can be drawn.
pub fn select_next<'g, R: Rng + ?Sized>(
    graph: &'g SceneGraph,
    state: &PlayerState,
    current_scene: Option<&str>,
    rng: &mut R,
) -> Result<SceneSelection<'g>, SelectionError> {
    let (pool_id, candidates): (&str, Vec<(&'g Scene, f64)>) = match current_scene {
        None => (
            STARTING_POOL,
            graph
                .eligible_starting_scenes(state)
                .into_iter()
                .map(|scene| (scene, scene.weight))
                .collect(),
        ),
        Some(from) => (
            TRANSITION_POOL,
            graph
                .eligible_transitions(from, state)
                .into_iter()
                .map(|(transition, scene)| (scene, transition.weight))
                .collect(),
        ),
    };

    let no_scene = || SelectionError::NoSceneAvailable {
        from: current_scene.map(str::to_string),
    };
    let weights: Vec<f64> = candidates.iter().map(|(_, weight)| *weight).collect();
    let (chosen_idx, roll) = choose_weighted(&weights, rng).ok_or_else(no_scene)?;
    let (scene, _) = *candidates.get(chosen_idx).ok_or_else(no_scene)?;

    log::debug!(
        "scene selection | pool:{pool_id} candidates:{} roll:{roll:.3} chosen:{}",
        candidates.len(),
        scene.id
    );

    let trace = DecisionTrace {
        pool_id: pool_id.to_string(),
        roll,
        total_weight: weights.iter().copied().filter(|w| *w > 0.0).sum(),
        candidates: candidates
            .iter()
            .map(|(candidate, weight)| WeightedCandidate {
                id: candidate.id.clone(),
                weight: *weight,
            })
            .collect(),
        chosen_id: scene.id.clone(),
    };

    Ok(SceneSelection { scene, trace })
}
