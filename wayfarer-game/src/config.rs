//! Run-level policy knobs that callers may override per deployment.
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: i64,
        value: i64,
    },
}

/// Session policy: start gate, defeat penalty, enemy scaling and driver limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdventureCfg {
    /// Energy a player needs before an adventure may begin.
    #[serde(default = "AdventureCfg::default_min_start_energy")]
    pub min_start_energy: i32,
    /// Fraction of gold lost on defeat.
    #[serde(default = "AdventureCfg::default_defeat_gold_penalty")]
    pub defeat_gold_penalty: f64,
    /// Hit points the hero is left with after a defeat.
    #[serde(default = "AdventureCfg::default_defeat_hp")]
    pub defeat_hp: i32,
    #[serde(default = "AdventureCfg::default_enemy_region_multiplier")]
    pub enemy_region_multiplier: f64,
    /// Upper bound on rounds an automated driver plays before forcing an escape.
    #[serde(default = "AdventureCfg::default_combat_round_limit")]
    pub combat_round_limit: u32,
}

impl AdventureCfg {
    #[must_use]
    pub const fn default_min_start_energy() -> i32 {
        20
    }

    #[must_use]
    pub const fn default_defeat_gold_penalty() -> f64 {
        0.10
    }

    #[must_use]
    pub const fn default_defeat_hp() -> i32 {
        1
    }

    #[must_use]
    pub const fn default_enemy_region_multiplier() -> f64 {
        1.0
    }

    #[must_use]
    pub const fn default_combat_round_limit() -> u32 {
        50
    }

    /// Parse a config document; absent fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::check_range("min_start_energy", f64::from(self.min_start_energy), 0.0, 100.0)?;
        Self::check_range("defeat_gold_penalty", self.defeat_gold_penalty, 0.0, 1.0)?;
        Self::check_range("enemy_region_multiplier", self.enemy_region_multiplier, 0.1, 10.0)?;
        if self.defeat_hp < 1 {
            return Err(ConfigError::MinViolation {
                field: "defeat_hp",
                min: 1,
                value: i64::from(self.defeat_hp),
            });
        }
        if self.combat_round_limit < 1 {
            return Err(ConfigError::MinViolation {
                field: "combat_round_limit",
                min: 1,
                value: i64::from(self.combat_round_limit),
            });
        }
        Ok(())
    }

    fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
        if (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(ConfigError::RangeViolation {
                field,
                min,
                max,
                value,
            })
        }
    }
}

impl Default for AdventureCfg {
    fn default() -> Self {
        Self {
            min_start_energy: Self::default_min_start_energy(),
            defeat_gold_penalty: Self::default_defeat_gold_penalty(),
            defeat_hp: Self::default_defeat_hp(),
            enemy_region_multiplier: Self::default_enemy_region_multiplier(),
            combat_round_limit: Self::default_combat_round_limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = AdventureCfg::from_json("{}").expect("parse");
        assert_eq!(cfg, AdventureCfg::default());
        assert_eq!(cfg.min_start_energy, 20);
        assert!((cfg.defeat_gold_penalty - 0.10).abs() < f64::EPSILON);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        let cfg = AdventureCfg::from_json(r#"{"defeat_gold_penalty": 1.5}"#).expect("parse");
        let err = cfg.validate().expect_err("penalty above one");
        assert_eq!(
            err.to_string(),
            "defeat_gold_penalty must be between 0.00 and 1.00 (got 1.50)"
        );

        let cfg = AdventureCfg {
            defeat_hp: 0,
            ..AdventureCfg::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MinViolation {
                field: "defeat_hp",
                ..
            })
        ));

        let cfg = AdventureCfg {
            enemy_region_multiplier: f64::NAN,
            ..AdventureCfg::default()
        };
        assert!(cfg.validate().is_err());
    }
}
