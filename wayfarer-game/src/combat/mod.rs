//! Turn-based combat: combatants, status effects and the encounter record.
//!
//! A [`CombatState`] is created by [`CombatState::begin`], which rolls
//! initiative, and then advanced one turn at a time by the functions in
//! [`resolver`] until it reaches victory, defeat or escape.

pub mod enemies;
pub mod formulas;
pub mod resolver;

pub use enemies::{EnemyKind, EnemyTemplate};
pub use resolver::{TurnReport, enemy_turn, play_round, player_turn};

use crate::character::CharacterClass;
use crate::constants::INITIATIVE_DIE;
use crate::rng::Roller;
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// One side of a fight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Player,
    Enemy,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Player => "player",
            Self::Enemy => "enemy",
        })
    }
}

pub type TurnOrder = SmallVec<[Side; 2]>;

/// Where the state machine currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatPhase {
    PlayerTurn,
    EnemyTurn,
    Victory,
    Defeat,
    Escaped,
}

impl CombatPhase {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Victory | Self::Defeat | Self::Escaped)
    }

    const fn for_side(side: Side) -> Self {
        match side {
            Side::Player => Self::PlayerTurn,
            Side::Enemy => Self::EnemyTurn,
        }
    }
}

impl fmt::Display for CombatPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PlayerTurn => "player turn",
            Self::EnemyTurn => "enemy turn",
            Self::Victory => "victory",
            Self::Defeat => "defeat",
            Self::Escaped => "escape",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusEffect {
    /// Loses a fixed amount of HP every round.
    Bleed,
    /// Attack-based damage is reduced by the effect value.
    Weaken,
    /// Skips the next turn.
    Stun,
}

impl StatusEffect {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bleed => "Bleed",
            Self::Weaken => "Weaken",
            Self::Stun => "Stun",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffectInstance {
    pub effect_type: StatusEffect,
    /// Rounds remaining; removed once it reaches zero.
    pub duration: u32,
    #[serde(default)]
    pub value: i32,
}

impl StatusEffectInstance {
    #[must_use]
    pub const fn new(effect_type: StatusEffect, duration: u32, value: i32) -> Self {
        Self {
            effect_type,
            duration,
            value,
        }
    }
}

/// Class-specific combat skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassSkill {
    PowerStrike,
    Backstab,
    ArcaneBolt,
    Smite,
    AimedShot,
}

impl ClassSkill {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PowerStrike => "Power Strike",
            Self::Backstab => "Backstab",
            Self::ArcaneBolt => "Arcane Bolt",
            Self::Smite => "Smite",
            Self::AimedShot => "Aimed Shot",
        }
    }
}

impl fmt::Display for ClassSkill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the player does on their turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "skill", rename_all = "snake_case")]
pub enum PlayerAction {
    Attack,
    Skill(ClassSkill),
    Escape,
}

/// The player's combat numbers, frozen when the fight begins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatantStats {
    pub class: CharacterClass,
    pub attack: i32,
    pub magic: i32,
    pub agility: i32,
    pub intelligence: i32,
    #[serde(default)]
    pub armor: i32,
    /// Percent chance to crit.
    pub crit_chance: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enemy {
    pub name: String,
    #[serde(default)]
    pub kind: EnemyKind,
    pub level: i32,
    pub hp_max: i32,
    pub hp_current: i32,
    pub attack: i32,
    pub magic: i32,
    pub agility: i32,
    pub armor: i32,
    pub gold_reward: i32,
    pub xp_reward: i32,
}

impl Enemy {
    /// Set hit points, clamped into `[0, hp_max]`.
    pub fn set_hp(&mut self, hp: i32) {
        self.hp_current = hp.clamp(0, self.hp_max.max(0));
    }

    pub fn take_damage(&mut self, amount: i32) {
        self.set_hp(self.hp_current.saturating_sub(amount));
    }

    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.hp_current > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatError {
    #[error("combat is already over ({phase})")]
    CombatOver { phase: CombatPhase },
    #[error("it is not the {side}'s turn")]
    OutOfTurn { side: Side },
    #[error("{skill} is on cooldown for {remaining} more round(s)")]
    SkillOnCooldown { skill: ClassSkill, remaining: u32 },
    #[error("a {class} cannot use {skill}")]
    SkillUnavailable {
        skill: ClassSkill,
        class: CharacterClass,
    },
}

/// How a finished fight ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CombatOutcome {
    Victory { xp: i32, gold: i32 },
    Defeat,
    Escaped,
}

/// The full record of one encounter; plain data so callers can persist it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatState {
    pub player: CombatantStats,
    pub player_hp: i32,
    pub player_max_hp: i32,
    pub enemy: Enemy,
    pub turn_order: TurnOrder,
    /// Turns taken so far; two turns make a round.
    pub current_turn: u32,
    pub phase: CombatPhase,
    #[serde(default)]
    pub player_status_effects: Vec<StatusEffectInstance>,
    #[serde(default)]
    pub enemy_status_effects: Vec<StatusEffectInstance>,
    #[serde(default)]
    pub player_skill_cooldowns: BTreeMap<ClassSkill, u32>,
    #[serde(default)]
    pub combat_log: Vec<String>,
    #[serde(default)]
    pub player_crit_bonus: f64,
}

impl CombatState {
    /// Open a fight and roll initiative: `agility + d6` per side, ties to the player.
    pub fn begin<D: Roller + ?Sized>(
        player: CombatantStats,
        player_hp: i32,
        player_max_hp: i32,
        enemy: Enemy,
        roller: &mut D,
    ) -> Self {
        let player_roll = i64::from(player.agility) + i64::from(roller.die(INITIATIVE_DIE));
        let enemy_roll = i64::from(enemy.agility) + i64::from(roller.die(INITIATIVE_DIE));
        let turn_order: TurnOrder = if player_roll >= enemy_roll {
            smallvec![Side::Player, Side::Enemy]
        } else {
            smallvec![Side::Enemy, Side::Player]
        };

        let player_max_hp = player_max_hp.max(1);
        let mut state = Self {
            player,
            player_hp: player_hp.clamp(0, player_max_hp),
            player_max_hp,
            phase: CombatPhase::for_side(turn_order[0]),
            enemy,
            turn_order,
            current_turn: 0,
            player_status_effects: Vec::new(),
            enemy_status_effects: Vec::new(),
            player_skill_cooldowns: BTreeMap::new(),
            combat_log: Vec::new(),
            player_crit_bonus: 0.0,
        };
        state.log(format!("A {} appears!", state.enemy.name));
        if state.player_first() {
            state.log("You take the initiative!");
        } else {
            state.log(format!("The {} strikes first!", state.enemy.name));
        }
        log::debug!(
            "combat start | player:{player_roll} enemy:{enemy_roll} order:{:?}",
            state.turn_order
        );
        state
    }

    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.phase.is_terminal()
    }

    /// One-based round counter.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.current_turn / 2 + 1
    }

    #[must_use]
    pub fn player_first(&self) -> bool {
        self.turn_order.first() == Some(&Side::Player)
    }

    /// Side that acts on the current turn.
    #[must_use]
    pub fn side_to_act(&self) -> Side {
        let slot = usize::try_from(self.current_turn % 2).unwrap_or(0);
        self.turn_order.get(slot).copied().unwrap_or(Side::Player)
    }

    #[must_use]
    pub fn cooldown(&self, skill: ClassSkill) -> u32 {
        self.player_skill_cooldowns.get(&skill).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn skill_ready(&self, skill: ClassSkill) -> bool {
        self.cooldown(skill) == 0
    }

    pub fn set_player_hp(&mut self, hp: i32) {
        self.player_hp = hp.clamp(0, self.player_max_hp);
    }

    pub fn add_player_effect(&mut self, effect: StatusEffectInstance) {
        self.player_status_effects.push(effect);
    }

    pub fn add_enemy_effect(&mut self, effect: StatusEffectInstance) {
        self.enemy_status_effects.push(effect);
    }

    #[must_use]
    pub fn outcome(&self) -> Option<CombatOutcome> {
        match self.phase {
            CombatPhase::Victory => Some(CombatOutcome::Victory {
                xp: self.enemy.xp_reward,
                gold: self.enemy.gold_reward,
            }),
            CombatPhase::Defeat => Some(CombatOutcome::Defeat),
            CombatPhase::Escaped => Some(CombatOutcome::Escaped),
            CombatPhase::PlayerTurn | CombatPhase::EnemyTurn => None,
        }
    }

    fn log(&mut self, line: impl Into<String>) {
        self.combat_log.push(line.into());
    }
}

/// Sum of `effect` values on a combatant.
pub(crate) fn effect_total(effects: &[StatusEffectInstance], effect: StatusEffect) -> i32 {
    effects
        .iter()
        .filter(|instance| instance.effect_type == effect && instance.duration > 0)
        .map(|instance| instance.value)
        .sum()
}

pub(crate) fn effect_count(effects: &[StatusEffectInstance], effect: StatusEffect) -> usize {
    effects
        .iter()
        .filter(|instance| instance.effect_type == effect && instance.duration > 0)
        .count()
}

pub(crate) fn has_effect(effects: &[StatusEffectInstance], effect: StatusEffect) -> bool {
    effects
        .iter()
        .any(|instance| instance.effect_type == effect && instance.duration > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{CharacterClass, Hero};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    pub(crate) fn goblin(agility: i32) -> Enemy {
        let mut enemy = EnemyKind::Goblin.generate(1, 1.0);
        enemy.agility = agility;
        enemy
    }

    #[test]
    fn initiative_ties_favor_the_player() {
        let hero = Hero::new(CharacterClass::Warrior);
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        for _ in 0..200 {
            // Enemy agility so low it can never out-roll the player.
            let state = CombatState::begin(hero.combat_profile(), 30, 68, goblin(4), &mut rng);
            assert_eq!(state.turn_order.as_slice(), &[Side::Player, Side::Enemy]);
            assert_eq!(state.phase, CombatPhase::PlayerTurn);
        }
        for _ in 0..200 {
            let state = CombatState::begin(hero.combat_profile(), 30, 68, goblin(17), &mut rng);
            assert_eq!(state.turn_order.as_slice(), &[Side::Enemy, Side::Player]);
            assert_eq!(state.phase, CombatPhase::EnemyTurn);
            assert_eq!(state.combat_log[1], "The Goblin strikes first!");
        }
    }

    #[test]
    fn enemy_hp_is_clamped() {
        let mut enemy = goblin(9);
        enemy.take_damage(50);
        assert_eq!(enemy.hp_current, 0);
        assert!(!enemy.is_alive());
        enemy.set_hp(99);
        assert_eq!(enemy.hp_current, enemy.hp_max);
    }

    #[test]
    fn state_round_trips_through_json() {
        let hero = Hero::new(CharacterClass::Mage);
        let mut rng = ChaCha20Rng::seed_from_u64(8);
        let mut state = CombatState::begin(hero.combat_profile(), 40, 60, goblin(9), &mut rng);
        state
            .player_skill_cooldowns
            .insert(ClassSkill::ArcaneBolt, 2);
        state.add_enemy_effect(StatusEffectInstance::new(StatusEffect::Weaken, 1, 1));

        let json = serde_json::to_string(&state).expect("serialize");
        let restored: CombatState = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, state);
        assert!(json.contains("\"arcane_bolt\":2"));
    }

    #[test]
    fn effect_helpers_ignore_expired_entries() {
        let effects = [
            StatusEffectInstance::new(StatusEffect::Weaken, 1, 1),
            StatusEffectInstance::new(StatusEffect::Weaken, 0, 5),
            StatusEffectInstance::new(StatusEffect::Bleed, 2, 0),
        ];
        assert_eq!(effect_total(&effects, StatusEffect::Weaken), 1);
        assert!(has_effect(&effects, StatusEffect::Bleed));
        assert!(!has_effect(&effects, StatusEffect::Stun));
    }
}
