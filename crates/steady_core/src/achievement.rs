use serde::{Deserialize, Serialize};

/// Tier label for a streak, used by the achievements screen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum StreakRank {
    Starter,
    Stone,
    Silver,
    Gold,
    Platinum,
}

impl StreakRank {
    pub fn for_days(days: u32) -> Self {
        if days >= 30 {
            StreakRank::Platinum
        } else if days >= 20 {
            StreakRank::Gold
        } else if days >= 10 {
            StreakRank::Silver
        } else if days >= 5 {
            StreakRank::Stone
        } else {
            StreakRank::Starter
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StreakRank::Starter => "Starter",
            StreakRank::Stone => "Stone",
            StreakRank::Silver => "Silver",
            StreakRank::Gold => "Gold",
            StreakRank::Platinum => "Platinum",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Badge {
    pub title: String,
    pub description: String,
    pub earned: bool,
}

struct BadgeSpec {
    title: &'static str,
    description: &'static str,
    threshold: u32,
}

const BADGE_LADDER: &[BadgeSpec] = &[
    BadgeSpec {
        title: "First Step",
        description: "Complete every habit for one day",
        threshold: 1,
    },
    BadgeSpec {
        title: "Back on Track",
        description: "Keep a streak going for three days",
        threshold: 3,
    },
    BadgeSpec {
        title: "Full Week",
        description: "Seven days without missing a habit",
        threshold: 7,
    },
    BadgeSpec {
        title: "Fortnight Focus",
        description: "Fourteen consecutive completed days",
        threshold: 14,
    },
    BadgeSpec {
        title: "Monthly Momentum",
        description: "Thirty consecutive completed days",
        threshold: 30,
    },
    BadgeSpec {
        title: "Century Club",
        description: "One hundred consecutive completed days",
        threshold: 100,
    },
    BadgeSpec {
        title: "Year of Steady",
        description: "A full year without breaking the streak",
        threshold: 365,
    },
];

/// Evaluate the fixed badge ladder against a streak length.
pub fn badges_for(streak_days: u32) -> Vec<Badge> {
    BADGE_LADDER
        .iter()
        .map(|spec| Badge {
            title: spec.title.to_string(),
            description: spec.description.to_string(),
            earned: streak_days >= spec.threshold,
        })
        .collect()
}
