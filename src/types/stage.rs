//! Interaction lifecycle stages
//!
//! The stage lives in the store under `interaction.stage`. `awakening` is
//! the value that starts the tutorial; `attuned` is where the sequencer
//! leaves the session after completion.

use serde::{Deserialize, Serialize};

/// Named phase of the broader interaction lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Idle, nothing has happened yet
    Dormant,
    /// First contact: the onboarding tutorial runs here
    Awakening,
    /// Onboarding done, normal companionship
    Attuned,
}

impl Stage {
    /// Store representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Dormant => "dormant",
            Stage::Awakening => "awakening",
            Stage::Attuned => "attuned",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dormant" => Ok(Stage::Dormant),
            "awakening" => Ok(Stage::Awakening),
            "attuned" => Ok(Stage::Attuned),
            other => Err(format!("unknown stage: {:?}", other)),
        }
    }
}
