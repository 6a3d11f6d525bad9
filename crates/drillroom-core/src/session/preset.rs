use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A named bundle of the four timing/budget knobs governing a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Warmup,
    Standard,
    Onsite,
    Marathon,
}

/// Resolved preset knobs. Durations in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub prep_duration_ms: i64,
    pub coding_duration_ms: i64,
    pub silent_duration_ms: i64,
    pub nudge_budget: u32,
}

const fn minutes(m: i64) -> i64 {
    m * 60 * 1000
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::Warmup,
        Preset::Standard,
        Preset::Onsite,
        Preset::Marathon,
    ];

    /// Resolve the preset's knobs. Total over the closed enum; an unknown
    /// preset cannot be constructed.
    pub const fn config(self) -> SessionConfig {
        match self {
            Preset::Warmup => SessionConfig {
                prep_duration_ms: minutes(2),
                coding_duration_ms: minutes(15),
                silent_duration_ms: minutes(3),
                nudge_budget: 2,
            },
            Preset::Standard => SessionConfig {
                prep_duration_ms: minutes(5),
                coding_duration_ms: minutes(35),
                silent_duration_ms: minutes(5),
                nudge_budget: 3,
            },
            Preset::Onsite => SessionConfig {
                prep_duration_ms: minutes(10),
                coding_duration_ms: minutes(45),
                silent_duration_ms: minutes(5),
                nudge_budget: 4,
            },
            Preset::Marathon => SessionConfig {
                prep_duration_ms: minutes(10),
                coding_duration_ms: minutes(60),
                silent_duration_ms: minutes(10),
                nudge_budget: 5,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Preset::Warmup => "warmup",
            Preset::Standard => "standard",
            Preset::Onsite => "onsite",
            Preset::Marathon => "marathon",
        }
    }
}

impl std::str::FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "preset".into(),
                message: format!("unknown preset '{s}'"),
            })
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_knobs() {
        let c = Preset::Standard.config();
        assert_eq!(c.prep_duration_ms, 5 * 60 * 1000);
        assert_eq!(c.coding_duration_ms, 35 * 60 * 1000);
        assert_eq!(c.silent_duration_ms, 5 * 60 * 1000);
        assert_eq!(c.nudge_budget, 3);
    }

    #[test]
    fn every_preset_resolves() {
        for preset in Preset::ALL {
            let c = preset.config();
            assert!(c.prep_duration_ms > 0);
            assert!(c.coding_duration_ms > c.prep_duration_ms);
            assert!(c.nudge_budget > 0);
        }
    }

    #[test]
    fn name_round_trip() {
        for preset in Preset::ALL {
            assert_eq!(preset.as_str().parse::<Preset>().unwrap(), preset);
        }
        assert!("espresso".parse::<Preset>().is_err());
    }
}
