use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand_chacha::ChaCha20Rng;
use wayfarer_game::{
    PlayerState, Scene, SceneData, SceneGraph, SceneKind, SceneTransition, choose_weighted,
    select_next,
};

const DRAWS: usize = 30_000;
const TOLERANCE: f64 = 0.02;

fn frequencies(counts: &[usize]) -> Vec<f64> {
    let total: usize = counts.iter().sum();
    counts
        .iter()
        .map(|count| *count as f64 / total as f64)
        .collect()
}

#[test]
fn weighted_draws_match_their_weights() {
    let weights = [1.0, 2.0, 3.0];
    let mut rng = ChaCha20Rng::seed_from_u64(0x5EED);
    let mut counts = [0usize; 3];
    for _ in 0..DRAWS {
        let (idx, _) = choose_weighted(&weights, &mut rng).unwrap();
        counts[idx] += 1;
    }
    let expected = [1.0 / 6.0, 2.0 / 6.0, 3.0 / 6.0];
    for (observed, expected) in frequencies(&counts).into_iter().zip(expected) {
        assert!(
            (observed - expected).abs() < TOLERANCE,
            "observed {observed:.4}, expected {expected:.4}"
        );
    }
}

#[test]
fn zero_weight_candidates_are_never_drawn() {
    let weights = [0.0, 5.0, 0.0, 5.0];
    let mut rng = SmallRng::seed_from_u64(99);
    let mut counts = [0usize; 4];
    for _ in 0..DRAWS {
        let (idx, _) = choose_weighted(&weights, &mut rng).unwrap();
        counts[idx] += 1;
    }
    assert_eq!(counts[0], 0);
    assert_eq!(counts[2], 0);
    let freq = frequencies(&counts);
    assert!((freq[1] - 0.5).abs() < TOLERANCE);
}

#[test]
fn transition_weights_drive_scene_selection() {
    let graph = SceneGraph::from_data(SceneData {
        scenes: vec![
            Scene::new("fork", SceneKind::Choice)
                .with_transition(SceneTransition::new("left").with_weight(1.0))
                .with_transition(SceneTransition::new("middle").with_weight(2.0))
                .with_transition(SceneTransition::new("right").with_weight(3.0))
                .with_transition(SceneTransition::new("sealed").with_weight(0.0)),
            Scene::new("left", SceneKind::Story).requiring("visited:fork"),
            Scene::new("middle", SceneKind::Story).requiring("visited:fork"),
            Scene::new("right", SceneKind::Story).requiring("visited:fork"),
            Scene::new("sealed", SceneKind::Story).requiring("visited:fork"),
        ],
        end_conditions: Vec::new(),
    })
    .unwrap();
    let mut state = PlayerState::new(1);
    state.visited_scenes.insert("fork".into());

    let mut rng = ChaCha20Rng::seed_from_u64(2024);
    let mut counts = [0usize; 3];
    for _ in 0..DRAWS {
        let selection = select_next(&graph, &state, Some("fork"), &mut rng).unwrap();
        let slot = match selection.scene.id.as_str() {
            "left" => 0,
            "middle" => 1,
            "right" => 2,
            other => panic!("unexpected pick {other}"),
        };
        counts[slot] += 1;
    }
    let expected = [1.0 / 6.0, 2.0 / 6.0, 3.0 / 6.0];
    for (observed, expected) in frequencies(&counts).into_iter().zip(expected) {
        assert!((observed - expected).abs() < TOLERANCE);
    }
}

#[test]
fn same_seed_same_walk() {
    let graph = SceneGraph::load_from_static();
    let walk = |seed: u64| {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut state = PlayerState::new(5).with_stat("bravery", 3);
        let mut current: Option<String> = None;
        let mut visited = Vec::new();
        for _ in 0..12 {
            let Ok(selection) = select_next(&graph, &state, current.as_deref(), &mut rng) else {
                break;
            };
            let scene = selection.scene;
            graph.apply_consequences(scene, &mut state);
            visited.push(scene.id.clone());
            current = Some(scene.id.clone());
        }
        visited
    };
    let first = walk(77);
    assert!(!first.is_empty());
    assert_eq!(first, walk(77));
}
