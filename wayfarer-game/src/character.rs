//! Character classes, attributes, derived combat stats and level progression.

use crate::constants::{
    ATTACK_BASE, BASE_ATTRIBUTE, CRIT_BASE, CRIT_CAP, CRIT_PER_AGILITY, DODGE_BASE, DODGE_CAP,
    DODGE_PER_AGILITY, HP_BASE, HP_PER_VITALITY, MAGIC_BASE, MAX_LEVEL, XP_LEVEL_BASE,
    XP_LEVEL_STEP,
};
use crate::combat::{ClassSkill, CombatantStats};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Playable character classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CharacterClass {
    #[default]
    Warrior,
    Rogue,
    Mage,
    Cleric,
    Ranger,
}

impl CharacterClass {
    pub const ALL: [Self; 5] = [
        Self::Warrior,
        Self::Rogue,
        Self::Mage,
        Self::Cleric,
        Self::Ranger,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Warrior => "warrior",
            Self::Rogue => "rogue",
            Self::Mage => "mage",
            Self::Cleric => "cleric",
            Self::Ranger => "ranger",
        }
    }

    /// The one skill each class can use in combat.
    #[must_use]
    pub const fn skill(self) -> ClassSkill {
        match self {
            Self::Warrior => ClassSkill::PowerStrike,
            Self::Rogue => ClassSkill::Backstab,
            Self::Mage => ClassSkill::ArcaneBolt,
            Self::Cleric => ClassSkill::Smite,
            Self::Ranger => ClassSkill::AimedShot,
        }
    }

    /// Attribute bonuses granted once on creation.
    #[must_use]
    pub const fn attribute_bonus(self) -> Attributes {
        let mut bonus = Attributes::zero();
        match self {
            Self::Warrior => {
                bonus.strength = 2;
                bonus.vitality = 2;
            }
            Self::Rogue => {
                bonus.agility = 2;
                bonus.luck = 1;
            }
            Self::Mage => {
                bonus.intelligence = 3;
            }
            Self::Cleric => {
                bonus.intelligence = 1;
                bonus.vitality = 2;
            }
            Self::Ranger => {
                bonus.strength = 1;
                bonus.agility = 2;
            }
        }
        bonus
    }

    /// +1 to each of two class attributes per level gained.
    #[must_use]
    pub const fn level_up_bonus(self) -> Attributes {
        let mut bonus = Attributes::zero();
        match self {
            Self::Warrior => {
                bonus.strength = 1;
                bonus.vitality = 1;
            }
            Self::Rogue => {
                bonus.agility = 1;
                bonus.luck = 1;
            }
            Self::Mage => {
                bonus.intelligence = 1;
                bonus.agility = 1;
            }
            Self::Cleric => {
                bonus.vitality = 1;
                bonus.intelligence = 1;
            }
            Self::Ranger => {
                bonus.agility = 1;
                bonus.strength = 1;
            }
        }
        bonus
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for CharacterClass {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|class| class.key().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown character class '{value}'"))
    }
}

/// The five base attributes every character carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attributes {
    pub strength: i32,
    pub agility: i32,
    pub intelligence: i32,
    pub vitality: i32,
    pub luck: i32,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            strength: BASE_ATTRIBUTE,
            agility: BASE_ATTRIBUTE,
            intelligence: BASE_ATTRIBUTE,
            vitality: BASE_ATTRIBUTE,
            luck: BASE_ATTRIBUTE,
        }
    }
}

impl Attributes {
    const fn zero() -> Self {
        Self {
            strength: 0,
            agility: 0,
            intelligence: 0,
            vitality: 0,
            luck: 0,
        }
    }

    /// Base attributes with the class creation bonus applied.
    #[must_use]
    pub fn for_class(class: CharacterClass) -> Self {
        Self::default().plus(class.attribute_bonus())
    }

    #[must_use]
    pub const fn plus(self, other: Self) -> Self {
        Self {
            strength: self.strength + other.strength,
            agility: self.agility + other.agility,
            intelligence: self.intelligence + other.intelligence,
            vitality: self.vitality + other.vitality,
            luck: self.luck + other.luck,
        }
    }

    #[must_use]
    pub fn derived(&self) -> DerivedStats {
        let agility = f64::from(self.agility);
        DerivedStats {
            hp_max: HP_BASE + HP_PER_VITALITY * self.vitality,
            attack: ATTACK_BASE + self.strength,
            magic: MAGIC_BASE + self.intelligence,
            crit_chance: CRIT_PER_AGILITY.mul_add(agility, CRIT_BASE).min(CRIT_CAP),
            dodge_chance: DODGE_PER_AGILITY.mul_add(agility, DODGE_BASE).min(DODGE_CAP),
        }
    }
}

/// Combat numbers computed from attributes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub hp_max: i32,
    pub attack: i32,
    pub magic: i32,
    pub crit_chance: f64,
    pub dodge_chance: f64,
}

/// XP needed to advance from `level` to `level + 1`.
#[must_use]
pub const fn xp_to_next_level(level: i32) -> i32 {
    XP_LEVEL_BASE + XP_LEVEL_STEP * level
}

/// Level reached with `total_xp` accumulated experience, starting at level 1.
#[must_use]
pub fn level_from_xp(total_xp: i32) -> i32 {
    let mut level = 1;
    let mut remaining = total_xp.max(0);
    while level < MAX_LEVEL {
        let needed = xp_to_next_level(level);
        if remaining < needed {
            break;
        }
        remaining -= needed;
        level += 1;
    }
    level
}

/// The combatant half of a player: class, attributes and hit points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hero {
    pub class: CharacterClass,
    pub attributes: Attributes,
    pub hp: i32,
    #[serde(default)]
    pub armor: i32,
}

impl Default for Hero {
    fn default() -> Self {
        Self::new(CharacterClass::default())
    }
}

impl Hero {
    #[must_use]
    pub fn new(class: CharacterClass) -> Self {
        let attributes = Attributes::for_class(class);
        Self {
            class,
            attributes,
            hp: attributes.derived().hp_max,
            armor: 0,
        }
    }

    #[must_use]
    pub fn max_hp(&self) -> i32 {
        self.attributes.derived().hp_max
    }

    /// Set hit points, clamped into `[0, max_hp]`.
    pub fn set_hp(&mut self, hp: i32) {
        self.hp = hp.clamp(0, self.max_hp());
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Apply `levels` worth of class level-up bonuses and refill hit points.
    pub fn level_up(&mut self, levels: u32) {
        for _ in 0..levels {
            self.attributes = self.attributes.plus(self.class.level_up_bonus());
        }
        if levels > 0 {
            self.hp = self.max_hp();
        }
    }

    /// Snapshot of the numbers the combat resolver needs.
    #[must_use]
    pub fn combat_profile(&self) -> CombatantStats {
        let derived = self.attributes.derived();
        CombatantStats {
            class: self.class,
            attack: derived.attack,
            magic: derived.magic,
            agility: self.attributes.agility,
            intelligence: self.attributes.intelligence,
            armor: self.armor,
            crit_chance: derived.crit_chance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_bonuses_shape_derived_stats() {
        let warrior = Attributes::for_class(CharacterClass::Warrior).derived();
        assert_eq!(warrior.hp_max, 20 + 4 * 12);
        assert_eq!(warrior.attack, 14);
        assert_eq!(warrior.magic, 12);
        assert!((warrior.crit_chance - 10.0).abs() < f64::EPSILON);
        assert!((warrior.dodge_chance - 6.0).abs() < 1e-9);

        let mage = Attributes::for_class(CharacterClass::Mage).derived();
        assert_eq!(mage.magic, 15);
        assert_eq!(mage.hp_max, 60);

        let rogue = Attributes::for_class(CharacterClass::Rogue);
        assert_eq!(rogue.agility, 12);
        assert_eq!(rogue.luck, 11);
    }

    #[test]
    fn derived_chances_are_capped() {
        let nimble = Attributes {
            agility: 200,
            ..Attributes::default()
        };
        let derived = nimble.derived();
        assert!((derived.crit_chance - 35.0).abs() < f64::EPSILON);
        assert!((derived.dodge_chance - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn xp_thresholds_accumulate() {
        assert_eq!(xp_to_next_level(1), 75);
        assert_eq!(level_from_xp(0), 1);
        assert_eq!(level_from_xp(74), 1);
        assert_eq!(level_from_xp(75), 2);
        assert_eq!(level_from_xp(75 + 100), 3);
        assert_eq!(level_from_xp(-20), 1);
    }

    #[test]
    fn level_up_applies_bonus_and_heals() {
        let mut hero = Hero::new(CharacterClass::Cleric);
        hero.set_hp(3);
        hero.level_up(2);
        assert_eq!(hero.attributes.intelligence, 13);
        assert_eq!(hero.attributes.vitality, 14);
        assert_eq!(hero.hp, hero.max_hp());
    }

    #[test]
    fn level_ups_use_their_own_class_table() {
        let mut mage = Hero::new(CharacterClass::Mage);
        assert_eq!(mage.attributes.intelligence, 13);
        assert_eq!(mage.attributes.agility, 10);
        mage.level_up(1);
        assert_eq!(mage.attributes.intelligence, 14);
        assert_eq!(mage.attributes.agility, 11);

        let mut rogue = Hero::new(CharacterClass::Rogue);
        let before = rogue.attributes;
        rogue.level_up(3);
        assert_eq!(rogue.attributes.agility, before.agility + 3);
        assert_eq!(rogue.attributes.luck, before.luck + 3);
        assert_eq!(rogue.attributes.strength, before.strength);
    }

    #[test]
    fn hp_is_clamped_and_classes_parse() {
        let mut hero = Hero::new(CharacterClass::Ranger);
        hero.set_hp(-5);
        assert_eq!(hero.hp, 0);
        assert!(!hero.is_alive());
        hero.set_hp(10_000);
        assert_eq!(hero.hp, hero.max_hp());

        assert_eq!("Mage".parse::<CharacterClass>(), Ok(CharacterClass::Mage));
        assert!("bard".parse::<CharacterClass>().is_err());
        assert_eq!(CharacterClass::Rogue.skill(), ClassSkill::Backstab);
    }
}
