use buddy_core::BuddyError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MOTIVATION_PROMPT: &str = "Geef een inspirerende, persoonlijke motivatieboodschap voor iemand die bezig is met afvallen. Varieer in thema's zoals doorzettingsvermogen, kleine successen vieren, geduld hebben, en gezondheidsvoordelen. Maak het aanmoedigend en oprecht. Houd het onder 400 tekens en schrijf in het Nederlands.";

const CHECK_IN_PROMPT: &str = "Stel een persoonlijke, aanmoedigende check-in vraag over de voortgang van het afvallen. Varieer in thema's zoals voeding, beweging, mentale gezondheid, uitdagingen, of kleine overwinningen. Maak het een open vraag die aanzet tot reflectie. Houd het onder 400 tekens en schrijf in het Nederlands.";

/// Kind of unsolicited message sent to the group chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Motivation")]
    Motivation,
    #[serde(rename = "Check-in")]
    CheckIn,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Motivation, Category::CheckIn];

    pub fn random() -> Self {
        Self::ALL[rand::rng().random_range(0..Self::ALL.len())]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Motivation => "Motivation",
            Category::CheckIn => "Check-in",
        }
    }

    /// Completion prompt (Dutch) used to generate a message of this kind.
    pub fn prompt(&self) -> &'static str {
        match self {
            Category::Motivation => MOTIVATION_PROMPT,
            Category::CheckIn => CHECK_IN_PROMPT,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = BuddyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "motivation" => Ok(Category::Motivation),
            "check-in" | "checkin" | "check_in" => Ok(Category::CheckIn),
            other => Err(BuddyError::InvalidInput(format!("Invalid category: {}", other))),
        }
    }
}
