//! The combat turn cycle: player and enemy turns, round-end ticking and
//! terminal transitions.
//!
//! Every roll goes through [`Roller`] in a fixed order (hit, crit, damage
//! dice, then any side-effect roll) so a seeded source replays a fight
//! exactly.

use super::formulas::{crit_chance, damage, escape_chance, hit_chance};
use super::{
    ClassSkill, CombatError, CombatPhase, CombatState, PlayerAction, Side, StatusEffect,
    StatusEffectInstance, effect_count, effect_total, has_effect,
};
use crate::constants::{
    AIMED_SHOT_CRIT_BONUS, ARCANE_BOLT_WEAKEN_CHANCE, ARCANE_BOLT_WEAKEN_TURNS,
    BACKSTAB_ARMOR_PIERCE_CHANCE, BASIC_ATTACK_DIE, BLEED_DAMAGE_PER_TURN, ENEMY_CRIT_CHANCE,
    SKILL_COOLDOWN_ROUNDS, WEAKEN_ATTACK_PENALTY,
};
use crate::rng::Roller;
use serde::{Deserialize, Serialize};

/// Log lines produced by a single turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReport {
    pub actor: Side,
    pub entries: Vec<String>,
    /// Phase after the turn finished.
    pub phase: CombatPhase,
}

/// Dice and base stat for one strike.
#[derive(Debug, Clone, Copy)]
struct Strike {
    base: i32,
    dice: u32,
    sides: u32,
}

impl ClassSkill {
    const fn strike(self, state: &CombatState) -> Strike {
        let player = &state.player;
        match self {
            Self::PowerStrike => Strike {
                base: player.attack,
                dice: 2,
                sides: 4,
            },
            Self::Backstab => Strike {
                base: player.attack,
                dice: 1,
                sides: 4,
            },
            Self::ArcaneBolt => Strike {
                base: player.magic,
                dice: 1,
                sides: 8,
            },
            Self::Smite => Strike {
                base: player.magic,
                dice: 1,
                sides: 6,
            },
            Self::AimedShot => Strike {
                base: player.attack,
                dice: 1,
                sides: 6,
            },
        }
    }
}

/// Resolve the player's turn.
///
/// # Errors
///
/// Rejects the action when combat is over, when it is the enemy's turn, or
/// when the requested skill belongs to another class or is cooling down.
/// Rejected actions consume no rolls and leave the state untouched.
pub fn player_turn<D: Roller + ?Sized>(
    state: &mut CombatState,
    action: PlayerAction,
    roller: &mut D,
) -> Result<TurnReport, CombatError> {
    ensure_turn(state, Side::Player)?;
    if let PlayerAction::Skill(skill) = action {
        if skill != state.player.class.skill() {
            return Err(CombatError::SkillUnavailable {
                skill,
                class: state.player.class,
            });
        }
        let remaining = state.cooldown(skill);
        if remaining > 0 {
            return Err(CombatError::SkillOnCooldown { skill, remaining });
        }
    }

    let mark = state.combat_log.len();
    if has_effect(&state.player_status_effects, StatusEffect::Stun) {
        state.log("You are stunned and skip your turn!");
    } else {
        match action {
            PlayerAction::Attack => basic_attack(state, roller),
            PlayerAction::Skill(skill) => use_skill(state, skill, roller),
            PlayerAction::Escape => attempt_escape(state, roller),
        }
    }
    log::debug!(
        "combat | round:{} player:{action:?} enemy_hp:{}",
        state.round(),
        state.enemy.hp_current
    );
    finish_turn(state);
    Ok(report(state, Side::Player, mark))
}

/// Resolve the enemy's turn: a basic attack unless the enemy is stunned.
///
/// # Errors
///
/// Returns [`CombatError::CombatOver`] on a finished fight and
/// [`CombatError::OutOfTurn`] when the player is due to act.
pub fn enemy_turn<D: Roller + ?Sized>(
    state: &mut CombatState,
    roller: &mut D,
) -> Result<TurnReport, CombatError> {
    ensure_turn(state, Side::Enemy)?;
    let mark = state.combat_log.len();

    if has_effect(&state.enemy_status_effects, StatusEffect::Stun) {
        state.log("Enemy is stunned and skips their turn!");
    } else {
        let chance = hit_chance(state.enemy.agility, state.player.agility);
        if roller.percent() < f64::from(chance) {
            let critical = roller.percent() < ENEMY_CRIT_CHANCE;
            let base = state.enemy.attack - weaken_penalty(state, Side::Enemy);
            let dealt = damage(
                base,
                roller.die(BASIC_ATTACK_DIE),
                critical,
                state.player.armor,
                false,
            );
            state.set_player_hp(state.player_hp.saturating_sub(dealt));
            if critical {
                state.log(format!("Enemy critical hit! You take {dealt} damage!"));
            } else {
                state.log(format!("Enemy deals {dealt} damage!"));
            }
        } else {
            state.log("Enemy misses their attack!");
        }
    }
    log::debug!(
        "combat | round:{} enemy attack player_hp:{}",
        state.round(),
        state.player_hp
    );
    finish_turn(state);
    Ok(report(state, Side::Enemy, mark))
}

/// Play until the player is asked to act again.
///
/// Runs a pending enemy turn first, then the player's action, then every
/// enemy turn that follows it. Returns the reports in the order they ran.
///
/// # Errors
///
/// Propagates the player's [`CombatError`]; in that case only an enemy turn
/// that was already due has been played.
pub fn play_round<D: Roller + ?Sized>(
    state: &mut CombatState,
    action: PlayerAction,
    roller: &mut D,
) -> Result<Vec<TurnReport>, CombatError> {
    if state.is_over() {
        return Err(CombatError::CombatOver { phase: state.phase });
    }
    let mut reports = Vec::new();
    if state.phase == CombatPhase::EnemyTurn {
        reports.push(enemy_turn(state, roller)?);
        if state.is_over() {
            return Ok(reports);
        }
    }
    reports.push(player_turn(state, action, roller)?);
    while state.phase == CombatPhase::EnemyTurn {
        reports.push(enemy_turn(state, roller)?);
    }
    Ok(reports)
}

fn ensure_turn(state: &CombatState, side: Side) -> Result<(), CombatError> {
    if state.is_over() {
        return Err(CombatError::CombatOver { phase: state.phase });
    }
    let due = match side {
        Side::Player => CombatPhase::PlayerTurn,
        Side::Enemy => CombatPhase::EnemyTurn,
    };
    if state.phase == due {
        Ok(())
    } else {
        Err(CombatError::OutOfTurn { side })
    }
}

fn weaken_penalty(state: &CombatState, side: Side) -> i32 {
    let effects = match side {
        Side::Player => &state.player_status_effects,
        Side::Enemy => &state.enemy_status_effects,
    };
    effect_total(effects, StatusEffect::Weaken)
}

fn basic_attack<D: Roller + ?Sized>(state: &mut CombatState, roller: &mut D) {
    let chance = hit_chance(state.player.agility, state.enemy.agility);
    if roller.percent() >= f64::from(chance) {
        state.log("You miss your attack!");
        return;
    }
    let critical =
        roller.percent() < crit_chance(state.player.crit_chance, state.player_crit_bonus);
    let base = state.player.attack - weaken_penalty(state, Side::Player);
    let dealt = damage(
        base,
        roller.die(BASIC_ATTACK_DIE),
        critical,
        state.enemy.armor,
        false,
    );
    state.enemy.take_damage(dealt);
    if critical {
        state.log(format!("Critical hit! You deal {dealt} damage!"));
    } else {
        state.log(format!("You deal {dealt} damage!"));
    }
}

fn use_skill<D: Roller + ?Sized>(state: &mut CombatState, skill: ClassSkill, roller: &mut D) {
    // The cooldown starts on use, hit or miss.
    state
        .player_skill_cooldowns
        .insert(skill, SKILL_COOLDOWN_ROUNDS);
    if skill == ClassSkill::AimedShot {
        state.player_crit_bonus += AIMED_SHOT_CRIT_BONUS;
    }

    let chance = hit_chance(state.player.agility, state.enemy.agility);
    if roller.percent() >= f64::from(chance) {
        state.log(format!("{skill} misses!"));
        return;
    }
    let critical =
        roller.percent() < crit_chance(state.player.crit_chance, state.player_crit_bonus);
    let strike = skill.strike(state);
    let roll = roller.dice(strike.dice, strike.sides);
    let ignore_armor = skill == ClassSkill::Backstab
        && state.player_first()
        && roller.unit() < BACKSTAB_ARMOR_PIERCE_CHANCE;
    let uses_attack = matches!(
        skill,
        ClassSkill::PowerStrike | ClassSkill::Backstab | ClassSkill::AimedShot
    );
    let base = if uses_attack {
        strike.base - weaken_penalty(state, Side::Player)
    } else {
        strike.base
    };
    let dealt = damage(base, roll, critical, state.enemy.armor, ignore_armor);
    state.enemy.take_damage(dealt);
    if critical {
        state.log(format!("Critical {skill}! You deal {dealt} damage!"));
    } else {
        state.log(format!("{skill} deals {dealt} damage!"));
    }

    match skill {
        ClassSkill::ArcaneBolt => {
            if roller.unit() < ARCANE_BOLT_WEAKEN_CHANCE {
                state.add_enemy_effect(StatusEffectInstance::new(
                    StatusEffect::Weaken,
                    ARCANE_BOLT_WEAKEN_TURNS,
                    WEAKEN_ATTACK_PENALTY,
                ));
                state.log("Enemy is affected by Weaken!");
            }
        }
        ClassSkill::Smite => {
            let before = state.player_hp;
            state.set_player_hp(before.saturating_add(state.player.intelligence.max(0)));
            let healed = state.player_hp - before;
            if healed > 0 {
                state.log(format!("You are healed for {healed} HP!"));
            }
        }
        ClassSkill::Backstab if ignore_armor => {
            state.log("Your Backstab slips past their armor!");
        }
        ClassSkill::PowerStrike | ClassSkill::Backstab | ClassSkill::AimedShot => {}
    }
}

fn attempt_escape<D: Roller + ?Sized>(state: &mut CombatState, roller: &mut D) {
    let chance = escape_chance(state.player.agility);
    if roller.percent() < f64::from(chance) {
        state.phase = CombatPhase::Escaped;
        state.log("You successfully escape from combat!");
    } else {
        state.log("Escape attempt failed!");
    }
}

/// Settle deaths, then hand the turn over; a full round triggers the tick.
fn finish_turn(state: &mut CombatState) {
    if settle(state) {
        return;
    }
    state.current_turn = state.current_turn.saturating_add(1);
    if state.current_turn % 2 == 0 {
        end_round(state);
        if settle(state) {
            return;
        }
    }
    state.phase = match state.side_to_act() {
        Side::Player => CombatPhase::PlayerTurn,
        Side::Enemy => CombatPhase::EnemyTurn,
    };
}

fn end_round(state: &mut CombatState) {
    // Every active bleed instance ticks on its own.
    for _ in 0..effect_count(&state.enemy_status_effects, StatusEffect::Bleed) {
        state.enemy.take_damage(BLEED_DAMAGE_PER_TURN);
        state.log(format!(
            "Enemy bleeding deals {BLEED_DAMAGE_PER_TURN} damage!"
        ));
    }
    for _ in 0..effect_count(&state.player_status_effects, StatusEffect::Bleed) {
        state.set_player_hp(state.player_hp.saturating_sub(BLEED_DAMAGE_PER_TURN));
        state.log(format!("Bleeding deals {BLEED_DAMAGE_PER_TURN} damage!"));
    }

    tick_effects(&mut state.player_status_effects);
    tick_effects(&mut state.enemy_status_effects);
    state.player_skill_cooldowns.retain(|_, remaining| {
        *remaining = remaining.saturating_sub(1);
        *remaining > 0
    });
    state.player_crit_bonus = 0.0;
}

fn tick_effects(effects: &mut Vec<StatusEffectInstance>) {
    effects.retain_mut(|effect| {
        effect.duration = effect.duration.saturating_sub(1);
        effect.duration > 0
    });
}

/// Move to a terminal phase if either side has fallen. The enemy is checked
/// first, so a double knockout counts as a win.
fn settle(state: &mut CombatState) -> bool {
    if state.phase == CombatPhase::Escaped {
        return true;
    }
    if !state.enemy.is_alive() {
        state.phase = CombatPhase::Victory;
        state.log(format!("You defeated the {}!", state.enemy.name));
        return true;
    }
    if state.player_hp <= 0 {
        state.phase = CombatPhase::Defeat;
        state.log(format!("You have been defeated by the {}!", state.enemy.name));
        return true;
    }
    false
}

fn report(state: &CombatState, actor: Side, mark: usize) -> TurnReport {
    TurnReport {
        actor,
        entries: state.combat_log.get(mark..).unwrap_or_default().to_vec(),
        phase: state.phase,
    }
}
