//! Wayfarer Adventure Engine
//!
//! Platform-agnostic core for text adventures: a requirement-gated scene graph,
//! weighted scene selection, action consequences, end conditions and a
//! turn-based combat resolver. No transport, persistence or narration lives
//! here; those plug in through [`SceneSource`] and [`SessionStore`].

pub mod actions;
pub mod character;
pub mod combat;
pub mod config;
pub mod constants;
pub mod end_conditions;
pub mod graph;
pub mod numbers;
pub mod requirement;
pub mod rng;
pub mod scene;
pub mod selector;
pub mod session;
pub mod state;

// Re-export commonly used types
pub use actions::{
    Action, ActionConsequence, ActionResult, apply, apply_roll, available_actions, resolve,
    scene_actions,
};
pub use character::{Attributes, CharacterClass, DerivedStats, Hero, level_from_xp};
pub use combat::{
    ClassSkill, CombatError, CombatOutcome, CombatPhase, CombatState, CombatantStats, Enemy,
    EnemyKind, PlayerAction, Side, StatusEffect, StatusEffectInstance, TurnReport, enemy_turn,
    play_round, player_turn,
};
pub use config::{AdventureCfg, ConfigError};
pub use end_conditions::{EndCondition, EndReason};
pub use graph::{GraphError, SceneGraph};
pub use requirement::{Comparison, Requirement, RequirementError, evaluate};
pub use rng::{CountingRng, RngBundle, RngCursor, Roller};
pub use scene::{Scene, SceneData, SceneKind, SceneReward, SceneTransition};
pub use selector::{
    DecisionTrace, SceneSelection, SelectionError, WeightedCandidate, choose_weighted, select_next,
};
pub use session::{
    AdventureSession, CombatRoundReport, SessionError, SessionSnapshot, StepReport,
};
pub use state::PlayerState;

use std::sync::Arc;

/// Where scene definitions come from.
/// Platform-specific implementations should provide this
pub trait SceneSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the scene document.
    ///
    /// # Errors
    ///
    /// Returns an error if the scene data cannot be loaded.
    fn load_scene_data(&self) -> Result<SceneData, Self::Error>;
}

/// Trait for abstracting snapshot persistence.
/// Platform-specific implementations should provide this
pub trait SessionStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save a session snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    fn save_snapshot(&self, slot: &str, snapshot: &SessionSnapshot) -> Result<(), Self::Error>;

    /// Load a session snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded.
    fn load_snapshot(&self, slot: &str) -> Result<Option<SessionSnapshot>, Self::Error>;

    /// Delete a saved snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be deleted.
    fn delete_snapshot(&self, slot: &str) -> Result<(), Self::Error>;
}

/// Wires a scene source and a snapshot store around adventure sessions.
pub struct AdventureEngine<L, S>
where
    L: SceneSource,
    S: SessionStore,
{
    source: L,
    store: S,
    cfg: AdventureCfg,
}

impl<L, S> AdventureEngine<L, S>
where
    L: SceneSource,
    S: SessionStore,
{
    #[must_use]
    pub fn new(source: L, store: S) -> Self {
        Self {
            source,
            store,
            cfg: AdventureCfg::default(),
        }
    }

    #[must_use]
    pub fn with_cfg(mut self, cfg: AdventureCfg) -> Self {
        self.cfg = cfg;
        self
    }

    #[must_use]
    pub const fn cfg(&self) -> &AdventureCfg {
        &self.cfg
    }

    /// Build the scene graph from the source. Duplicate scene ids degrade to
    /// an empty graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot produce scene data.
    pub fn load_graph(&self) -> Result<Arc<SceneGraph>, L::Error> {
        let data = self.source.load_scene_data()?;
        let graph = SceneGraph::from_data(data).unwrap_or_else(|err| {
            log::warn!("scene data rejected, continuing with an empty graph: {err}");
            SceneGraph::empty()
        });
        Ok(Arc::new(graph))
    }

    /// Start a fresh session for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the scene data cannot be loaded.
    pub fn create_session(
        &self,
        user_id: u64,
        class: CharacterClass,
        seed: u64,
    ) -> Result<AdventureSession, L::Error> {
        let graph = self.load_graph()?;
        let state = PlayerState::new(user_id).with_class(class);
        Ok(AdventureSession::new(graph, self.cfg.clone(), state, seed))
    }

    /// Persist a session under `slot`.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    pub fn save_session(&self, slot: &str, session: &AdventureSession) -> Result<(), S::Error> {
        self.store.save_snapshot(slot, &session.snapshot())
    }

    /// Restore the session saved under `slot`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or the snapshot belongs to other
    /// scene data.
    pub fn load_session(&self, slot: &str) -> anyhow::Result<Option<AdventureSession>>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        let Some(snapshot) = self.store.load_snapshot(slot).map_err(Into::into)? else {
            return Ok(None);
        };
        let graph = self.load_graph().map_err(Into::into)?;
        let session = AdventureSession::restore(graph, self.cfg.clone(), snapshot)?;
        Ok(Some(session))
    }

    /// Drop the snapshot under `slot`.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be deleted.
    pub fn delete_session(&self, slot: &str) -> Result<(), S::Error> {
        self.store.delete_snapshot(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Copy, Default)]
    struct FixtureLoader;

    impl SceneSource for FixtureLoader {
        type Error = Infallible;

        fn load_scene_data(&self) -> Result<SceneData, Self::Error> {
            Ok(SceneData {
                scenes: vec![
                    Scene::new("trailhead", SceneKind::Story)
                        .with_transition(SceneTransition::new("glade")),
                    Scene::new("glade", SceneKind::Rest).requiring("visited:trailhead"),
                ],
                end_conditions: vec![EndCondition::step_budget(5)],
            })
        }
    }

    #[derive(Clone, Default)]
    struct MemoryStorage {
        saves: Rc<RefCell<HashMap<String, SessionSnapshot>>>,
    }

    impl SessionStore for MemoryStorage {
        type Error = Infallible;

        fn save_snapshot(&self, slot: &str, snapshot: &SessionSnapshot) -> Result<(), Self::Error> {
            self.saves
                .borrow_mut()
                .insert(slot.to_string(), snapshot.clone());
            Ok(())
        }

        fn load_snapshot(&self, slot: &str) -> Result<Option<SessionSnapshot>, Self::Error> {
            Ok(self.saves.borrow().get(slot).cloned())
        }

        fn delete_snapshot(&self, slot: &str) -> Result<(), Self::Error> {
            self.saves.borrow_mut().remove(slot);
            Ok(())
        }
    }

    #[test]
    fn engine_creates_and_roundtrips_sessions() {
        let engine = AdventureEngine::new(FixtureLoader, MemoryStorage::default());
        let mut session = engine
            .create_session(42, CharacterClass::Rogue, 0xABCD)
            .unwrap();
        session.start().unwrap();
        session.take_action(Action::Wait).unwrap();
        engine.save_session("slot-one", &session).unwrap();

        let loaded = engine
            .load_session("slot-one")
            .unwrap()
            .expect("save exists");
        assert_eq!(loaded.state(), session.state());
        assert_eq!(loaded.rng().cursor(), session.rng().cursor());
        assert_eq!(loaded.state().current_scene.as_deref(), Some("glade"));
        assert_eq!(loaded.state().hero.class, CharacterClass::Rogue);

        engine.delete_session("slot-one").unwrap();
        assert!(engine.load_session("slot-one").unwrap().is_none());
    }

    #[test]
    fn stale_snapshots_are_refused() {
        let engine = AdventureEngine::new(FixtureLoader, MemoryStorage::default());
        let session = engine.create_session(7, CharacterClass::Mage, 1).unwrap();
        let mut snapshot = session.snapshot();
        snapshot.graph_fingerprint ^= 1;
        engine.store.save_snapshot("old", &snapshot).unwrap();
        let err = engine.load_session("old").err().expect("mismatch");
        assert!(err.to_string().contains("snapshot belongs to scene graph"));
    }
}
