//! Pure combat math shared by player and enemy turns.
use crate::constants::{
    CRIT_CHANCE_CAP, CRIT_DAMAGE_MULTIPLIER, ESCAPE_CHANCE_BASE, ESCAPE_CHANCE_MAX,
    HIT_CHANCE_BASE, HIT_CHANCE_MAX, HIT_CHANCE_MIN, HIT_CHANCE_PER_AGILITY, MIN_DAMAGE,
};
use crate::numbers::trunc_f64_to_i32;

/// Percent chance to land a blow, always within `[40, 95]`.
#[must_use]
pub fn hit_chance(attacker_agility: i32, defender_agility: i32) -> i32 {
    let diff = attacker_agility.saturating_sub(defender_agility);
    HIT_CHANCE_PER_AGILITY
        .saturating_mul(diff)
        .saturating_add(HIT_CHANCE_BASE)
        .clamp(HIT_CHANCE_MIN, HIT_CHANCE_MAX)
}

/// Percent chance to crit, never above 100.
#[must_use]
pub fn crit_chance(base: f64, bonus: f64) -> f64 {
    let total = base + bonus;
    if total.is_nan() {
        return 0.0;
    }
    total.clamp(0.0, CRIT_CHANCE_CAP)
}

/// Percent chance to flee, within `[50, 85]`.
#[must_use]
pub fn escape_chance(agility: i32) -> i32 {
    ESCAPE_CHANCE_BASE
        .saturating_add(agility.max(0))
        .min(ESCAPE_CHANCE_MAX)
}

/// Damage after crit scaling and armor. Never below 1.
#[must_use]
pub fn damage(base: i32, roll: u32, critical: bool, armor: i32, ignore_armor: bool) -> i32 {
    let roll = i32::try_from(roll).unwrap_or(i32::MAX);
    let mut raw = base.saturating_add(roll);
    if critical {
        raw = trunc_f64_to_i32(f64::from(raw) * CRIT_DAMAGE_MULTIPLIER);
    }
    raw = raw.max(MIN_DAMAGE);
    if ignore_armor {
        raw
    } else {
        raw.saturating_sub(armor.max(0)).max(MIN_DAMAGE)
    }
}
