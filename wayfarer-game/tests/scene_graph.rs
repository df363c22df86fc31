use std::io::Write;
use wayfarer_game::{
    Action, EndCondition, EndReason, GraphError, PlayerState, Scene, SceneData, SceneGraph,
    SceneKind, SceneReward, SceneTransition, apply_roll, available_actions, evaluate, resolve,
};

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("wayfarer-{}-{name}", std::process::id()))
}

#[test]
fn forest_encounter_is_gated_on_bravery() {
    let graph = SceneGraph::load_from_static();
    let forest = graph.scene("forest_encounter").expect("bundled scene");

    let brave = PlayerState::new(1).with_stat("bravery", 5);
    assert!(graph.is_available(forest, &brave));
    let timid = PlayerState::new(1).with_stat("bravery", 1);
    assert!(!graph.is_available(forest, &timid));
}

#[test]
fn requirement_strings_fail_closed() {
    let state = PlayerState::new(1)
        .with_stat("bravery", 4)
        .with_stat("gold", 10);
    assert!(evaluate("stat:bravery>=4", &state));
    assert!(evaluate("stat:gold<=10", &state));
    assert!(evaluate("stat:unknown==0", &state));
    assert!(!evaluate("stat:bravery>4", &state));
    assert!(!evaluate("mood:happy", &state));
    assert!(!evaluate("", &state));
    assert!(!evaluate("stat:bravery>=lots", &state));
}

#[test]
fn cooldown_hides_a_scene_for_n_applications() {
    let graph = SceneGraph::from_data(SceneData {
        scenes: vec![
            Scene::new("shrine", SceneKind::Rest).with_cooldown(2),
            Scene::new("path", SceneKind::Story),
        ],
        end_conditions: Vec::new(),
    })
    .unwrap();
    let shrine = graph.scene("shrine").unwrap();
    let path = graph.scene("path").unwrap();
    let mut state = PlayerState::new(1);

    graph.apply_consequences(shrine, &mut state);
    assert!(!graph.is_available(shrine, &state));
    graph.apply_consequences(path, &mut state);
    assert!(!graph.is_available(shrine, &state));
    graph.apply_consequences(path, &mut state);
    assert!(graph.is_available(shrine, &state));
    assert!(state.scene_cooldowns.is_empty());
}

#[test]
fn consequences_update_history_risk_steps_and_rewards() {
    let graph = SceneGraph::from_data(SceneData {
        scenes: vec![
            Scene::new("ambush", SceneKind::Encounter)
                .with_risk_delta(3)
                .with_reward(SceneReward {
                    gold: Some("2d6".into()),
                    xp: Some("1d4+1".into()),
                    stamina: Some("1".into()),
                }),
            Scene::new("sanctuary", SceneKind::Rest).with_risk_delta(-10),
        ],
        end_conditions: Vec::new(),
    })
    .unwrap();
    let mut state = PlayerState::new(1).with_energy(95);
    graph.apply_consequences(graph.scene("ambush").unwrap(), &mut state);
    assert_eq!(state.risk_level, 3);
    assert_eq!(state.step_count, 1);
    assert_eq!(state.stat("gold"), 5);
    assert_eq!(state.stat("xp"), 10);
    assert_eq!(state.energy, 100);
    assert!(state.has_visited("ambush"));

    graph.apply_consequences(graph.scene("sanctuary").unwrap(), &mut state);
    assert_eq!(state.risk_level, 0);
    assert_eq!(state.step_count, 2);
}

#[test]
fn once_and_blocks_remove_scenes() {
    let graph = SceneGraph::from_data(SceneData {
        scenes: vec![
            Scene::new("prologue", SceneKind::Story).once(),
            Scene::new("tavern", SceneKind::Dialogue).blocked_by("goal:banned"),
        ],
        end_conditions: Vec::new(),
    })
    .unwrap();
    let mut state = PlayerState::new(1);
    let prologue = graph.scene("prologue").unwrap();
    graph.apply_consequences(prologue, &mut state);
    assert!(!graph.is_available(prologue, &state));

    let tavern = graph.scene("tavern").unwrap();
    assert!(graph.is_available(tavern, &state));
    state.goals.insert("banned".into());
    assert!(!graph.is_available(tavern, &state));
}

#[test]
fn transitions_to_missing_scenes_are_filtered() {
    let graph = SceneGraph::from_data(SceneData {
        scenes: vec![
            Scene::new("dock", SceneKind::Story)
                .with_transition(SceneTransition::new("ghost_ship"))
                .with_transition(SceneTransition::new("pier").requiring("stat:charisma>=1")),
            Scene::new("pier", SceneKind::Loot),
        ],
        end_conditions: Vec::new(),
    })
    .unwrap();
    let state = PlayerState::new(1);
    let targets: Vec<_> = graph
        .eligible_transitions("dock", &state)
        .into_iter()
        .map(|(_, scene)| scene.id.as_str())
        .collect();
    assert_eq!(targets, ["pier"]);
    assert!(graph.eligible_transitions("nowhere", &state).is_empty());
}

#[test]
fn malformed_sources_degrade_to_an_empty_graph() {
    assert!(SceneGraph::from_json_or_empty("{ not json").is_empty());
    assert!(SceneGraph::load(temp_path("missing.json")).is_empty());
    assert!(matches!(
        SceneGraph::try_load(temp_path("also-missing.json")),
        Err(GraphError::Io { .. })
    ));

    let duplicate = r#"{"scenes":[{"id":"a","kind":"story"},{"id":"a","kind":"rest"}]}"#;
    assert!(matches!(
        SceneGraph::try_from_json(duplicate),
        Err(GraphError::DuplicateScene(id)) if id == "a"
    ));
    let lenient = SceneGraph::from_json_or_empty(duplicate);
    assert!(lenient.is_empty());
    assert!(lenient.end_conditions().is_empty());
}

#[test]
fn scene_files_load_from_disk() {
    let path = temp_path("scenes.json");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(
        br#"{
            "scenes": [{"id": "gate", "kind": "story", "weight": 2}],
            "end_conditions": [{"kind": "risk_threshold", "threshold": 10}]
        }"#,
    )
    .unwrap();
    drop(file);

    let graph = SceneGraph::try_load(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(graph.len(), 1);
    assert_eq!(graph.end_conditions(), [EndCondition::risk_threshold(10)]);

    let mut state = PlayerState::new(1);
    state.risk_level = 9;
    assert_eq!(graph.check_ended(&state), None);
    state.risk_level = 10;
    let reason = graph.check_ended(&state).unwrap();
    assert_eq!(
        reason,
        EndReason::RiskThreshold {
            risk_level: 10,
            threshold: 10
        }
    );
    assert!(reason.to_string().contains("threshold 10"));
}

#[test]
fn resting_restores_energy_and_eases_risk() {
    let mut state = PlayerState::new(1).with_energy(50);
    state.risk_level = 2;
    let consequence = resolve(Action::Rest, SceneKind::Story, &state);
    let result = apply_roll(&consequence, &mut state, 0.99);
    assert!(result.success);
    assert_eq!(state.energy, 70);
    assert_eq!(state.risk_level, 1);

    let mut tired = PlayerState::new(1).with_energy(90);
    let consequence = resolve(Action::Rest, SceneKind::Story, &tired);
    apply_roll(&consequence, &mut tired, 0.5);
    assert_eq!(tired.energy, 100);
    assert_eq!(tired.risk_level, 0);
}

#[test]
fn combat_scenes_offer_combat_actions_only_when_affordable() {
    let fresh = PlayerState::new(1);
    assert_eq!(
        available_actions(SceneKind::Combat, &fresh),
        [Action::Attack, Action::Defend, Action::UseItem, Action::Flee]
    );
    let scholar = PlayerState::new(1).with_stat("intellect", 2);
    assert!(available_actions(SceneKind::Combat, &scholar).contains(&Action::Cast));
    let drained = PlayerState::new(1).with_energy(4);
    assert!(available_actions(SceneKind::Combat, &drained).is_empty());
}
