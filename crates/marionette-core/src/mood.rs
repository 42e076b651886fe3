//! Mood - the coarse emotional state a director is asked to show

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Mood requested by the caller (usually chat logic)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Neutral,
    Happy,
    Angry,
    Sad,
    Surprised,
    Thinking,
}

impl Mood {
    pub const ALL: [Mood; 6] = [
        Mood::Neutral,
        Mood::Happy,
        Mood::Angry,
        Mood::Sad,
        Mood::Surprised,
        Mood::Thinking,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Neutral => "neutral",
            Mood::Happy => "happy",
            Mood::Angry => "angry",
            Mood::Sad => "sad",
            Mood::Surprised => "surprised",
            Mood::Thinking => "thinking",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Mood::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == lower)
            .ok_or_else(|| format!("unknown mood: {s}"))
    }
}
