//! Enemy archetypes scaled by level and region.
use crate::numbers::trunc_f64_to_i32;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::Enemy;

/// Known enemy archetypes. Unknown names in data fall back to [`EnemyKind::Goblin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    #[default]
    Goblin,
    Orc,
    Skeleton,
    Wolf,
    Spider,
    Ghost,
    Gargoyle,
    CaveTroll,
    EarthElemental,
    Dragon,
    DarkDwarf,
}

/// Per-archetype multipliers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyTemplate {
    pub name: &'static str,
    pub hp_mult: f64,
    pub atk_mult: f64,
    pub mag_mult: f64,
    pub agi_mult: f64,
    pub armor: i32,
    pub gold_base: f64,
    pub xp_base: f64,
}

impl EnemyKind {
    pub const ALL: [Self; 11] = [
        Self::Goblin,
        Self::Orc,
        Self::Skeleton,
        Self::Wolf,
        Self::Spider,
        Self::Ghost,
        Self::Gargoyle,
        Self::CaveTroll,
        Self::EarthElemental,
        Self::Dragon,
        Self::DarkDwarf,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Goblin => "goblin",
            Self::Orc => "orc",
            Self::Skeleton => "skeleton",
            Self::Wolf => "wolf",
            Self::Spider => "spider",
            Self::Ghost => "ghost",
            Self::Gargoyle => "gargoyle",
            Self::CaveTroll => "cave_troll",
            Self::EarthElemental => "earth_elemental",
            Self::Dragon => "dragon",
            Self::DarkDwarf => "dark_dwarf",
        }
    }

    /// Lenient lookup; unrecognized names become goblins.
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        let needle = key.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(needle))
            .unwrap_or_else(|| {
                log::warn!("unknown enemy type '{key}', using goblin");
                Self::Goblin
            })
    }

    #[must_use]
    pub const fn template(self) -> EnemyTemplate {
        match self {
            Self::Goblin => tpl("Goblin", 8.0, 1.2, 0.5, 1.5, 0, 5.0, 10.0),
            Self::Orc => tpl("Orc", 12.0, 1.5, 0.3, 0.8, 2, 8.0, 15.0),
            Self::Skeleton => tpl("Skeleton", 6.0, 1.0, 0.8, 1.2, 1, 3.0, 8.0),
            Self::Wolf => tpl("Wild Wolf", 7.0, 1.3, 0.2, 1.8, 0, 4.0, 8.0),
            Self::Spider => tpl("Giant Spider", 5.0, 1.1, 0.6, 2.0, 0, 3.0, 6.0),
            Self::Ghost => tpl("Wailing Ghost", 4.0, 0.8, 1.5, 1.3, 0, 2.0, 12.0),
            Self::Gargoyle => tpl("Stone Gargoyle", 15.0, 1.8, 0.4, 0.6, 3, 12.0, 20.0),
            Self::CaveTroll => tpl("Cave Troll", 20.0, 2.0, 0.2, 0.5, 2, 15.0, 25.0),
            Self::EarthElemental => tpl("Earth Elemental", 18.0, 1.6, 1.2, 0.4, 4, 10.0, 22.0),
            Self::Dragon => tpl("Ancient Dragon", 30.0, 3.0, 2.5, 1.0, 5, 50.0, 100.0),
            Self::DarkDwarf => tpl("Corrupted Dwarf", 12.0, 1.7, 1.0, 0.7, 3, 8.0, 18.0),
        }
    }

    /// Build an enemy of this archetype for a level and region multiplier.
    #[must_use]
    pub fn generate(self, level: i32, region_multiplier: f64) -> Enemy {
        let template = self.template();
        let level = level.max(1);
        let lvl = f64::from(level);
        let region = if region_multiplier.is_finite() && region_multiplier > 0.0 {
            region_multiplier
        } else {
            1.0
        };
        let scaled = |value: f64| trunc_f64_to_i32(value * region);
        let hp_max = scaled(template.hp_mult * lvl).max(1);

        Enemy {
            name: template.name.to_string(),
            kind: self,
            level,
            hp_max,
            hp_current: hp_max,
            attack: scaled(template.atk_mult * lvl + 2.0),
            magic: scaled(template.mag_mult * lvl + 1.0),
            agility: scaled(template.agi_mult * lvl + 8.0),
            armor: scaled(f64::from(template.armor)),
            gold_reward: scaled(template.gold_base * lvl),
            xp_reward: scaled(template.xp_base * lvl),
        }
    }
}

#[allow(clippy::too_many_arguments)]
const fn tpl(
    name: &'static str,
    hp_mult: f64,
    atk_mult: f64,
    mag_mult: f64,
    agi_mult: f64,
    armor: i32,
    gold_base: f64,
    xp_base: f64,
) -> EnemyTemplate {
    EnemyTemplate {
        name,
        hp_mult,
        atk_mult,
        mag_mult,
        agi_mult,
        armor,
        gold_base,
        xp_base,
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl<'de> Deserialize<'de> for EnemyKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let key = String::deserialize(deserializer)?;
        Ok(Self::from_key(&key))
    }
}
