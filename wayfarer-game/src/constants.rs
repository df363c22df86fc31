//! Centralized balance and tuning constants for Wayfarer adventure logic.
//!
//! These values define the deterministic math for the core simulation.
//! Keeping them together ensures that gameplay can only be adjusted via
//! code changes reviewed in version control, rather than through external
//! JSON assets.

// Player resources ---------------------------------------------------------
pub(crate) const ENERGY_MIN: i32 = 0;
pub(crate) const ENERGY_MAX: i32 = 100;
pub(crate) const RISK_MIN: i32 = 0;
pub(crate) const DEFAULT_NARRATIVE_STAT: i32 = 1;
pub(crate) const STAT_GOLD: &str = "gold";
pub(crate) const STAT_XP: &str = "xp";
pub(crate) const STAT_LEVEL: &str = "level";
pub(crate) const STAT_BRAVERY: &str = "bravery";
pub(crate) const STAT_CHARISMA: &str = "charisma";
pub(crate) const STAT_INTELLECT: &str = "intellect";
pub(crate) const STAT_STAMINA: &str = "stamina";

// Scene rewards ------------------------------------------------------------
pub(crate) const REWARD_GOLD_FLAT: i32 = 5;
pub(crate) const REWARD_XP_FLAT: i32 = 10;
pub(crate) const REWARD_STAMINA_ENERGY: i32 = 10;
pub(crate) const DEFAULT_SCENE_WEIGHT: f64 = 1.0;
pub(crate) const DEFAULT_STEP_BUDGET: u32 = 4;

// Scene-type action modifiers ----------------------------------------------
pub(crate) const COMBAT_ENERGY_MULTIPLIER: f64 = 1.5;
pub(crate) const COMBAT_RISK_BONUS: i32 = 1;
pub(crate) const REST_ENERGY_DISCOUNT: i32 = 5;
pub(crate) const REST_RISK_RELIEF: i32 = 1;
pub(crate) const REST_RISK_FLOOR: i32 = -2;
pub(crate) const EXPLORATION_ENERGY_MULTIPLIER: f64 = 1.2;
pub(crate) const EXPLORATION_SUCCESS_MULTIPLIER: f64 = 0.9;

// Stat-based action modifiers ----------------------------------------------
pub(crate) const STAT_MODIFIER_THRESHOLD: i32 = 3;
pub(crate) const INTELLECT_ENERGY_DISCOUNT: i32 = 2;
pub(crate) const STAMINA_ENERGY_DISCOUNT: i32 = 3;
pub(crate) const CHARISMA_SUCCESS_BONUS: f64 = 0.1;
pub(crate) const CAST_MIN_INTELLECT: i32 = 2;

// Combat formulas ----------------------------------------------------------
pub(crate) const INITIATIVE_DIE: u32 = 6;
pub(crate) const HIT_CHANCE_BASE: i32 = 75;
pub(crate) const HIT_CHANCE_PER_AGILITY: i32 = 2;
pub(crate) const HIT_CHANCE_MIN: i32 = 40;
pub(crate) const HIT_CHANCE_MAX: i32 = 95;
pub(crate) const CRIT_CHANCE_CAP: f64 = 100.0;
pub(crate) const CRIT_DAMAGE_MULTIPLIER: f64 = 1.5;
pub(crate) const MIN_DAMAGE: i32 = 1;
pub(crate) const ESCAPE_CHANCE_BASE: i32 = 50;
pub(crate) const ESCAPE_CHANCE_MAX: i32 = 85;
pub(crate) const ENEMY_CRIT_CHANCE: f64 = 5.0;
pub(crate) const BASIC_ATTACK_DIE: u32 = 6;
pub(crate) const SKILL_COOLDOWN_ROUNDS: u32 = 2;
pub(crate) const BLEED_DAMAGE_PER_TURN: i32 = 2;
pub(crate) const BACKSTAB_ARMOR_PIERCE_CHANCE: f64 = 0.5;
pub(crate) const ARCANE_BOLT_WEAKEN_CHANCE: f64 = 0.3;
pub(crate) const ARCANE_BOLT_WEAKEN_TURNS: u32 = 1;
pub(crate) const WEAKEN_ATTACK_PENALTY: i32 = 1;
pub(crate) const AIMED_SHOT_CRIT_BONUS: f64 = 10.0;

// Character progression ----------------------------------------------------
pub(crate) const BASE_ATTRIBUTE: i32 = 10;
pub(crate) const HP_BASE: i32 = 20;
pub(crate) const HP_PER_VITALITY: i32 = 4;
pub(crate) const ATTACK_BASE: i32 = 2;
pub(crate) const MAGIC_BASE: i32 = 2;
pub(crate) const CRIT_BASE: f64 = 5.0;
pub(crate) const CRIT_PER_AGILITY: f64 = 0.5;
pub(crate) const CRIT_CAP: f64 = 35.0;
pub(crate) const DODGE_BASE: f64 = 2.0;
pub(crate) const DODGE_PER_AGILITY: f64 = 0.4;
pub(crate) const DODGE_CAP: f64 = 25.0;
pub(crate) const XP_LEVEL_BASE: i32 = 50;
pub(crate) const XP_LEVEL_STEP: i32 = 25;
pub(crate) const MAX_LEVEL: i32 = 100;
