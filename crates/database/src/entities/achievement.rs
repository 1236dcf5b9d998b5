//! Achievement catalogue

use serde::{Deserialize, Serialize};
use skillswap_realtime::AchievementUnlocked;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    /// Programmatic key, e.g. `FIRST_EXCHANGE`.
    pub criteria: String,
    pub points: i64,
}

impl Achievement {
    pub fn unlocked_event(&self) -> AchievementUnlocked {
        AchievementUnlocked {
            name: self.name.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
            points: self.points,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AchievementSeed {
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub criteria: &'static str,
    pub points: i64,
}

pub const ACHIEVEMENT_CATALOGUE: &[AchievementSeed] = &[
    AchievementSeed {
        name: "First Exchange",
        description: "You completed your very first knowledge exchange!",
        icon: "🤝",
        criteria: "FIRST_EXCHANGE",
        points: 25,
    },
    AchievementSeed {
        name: "Knowledge Giver",
        description: "Successfully completed 5 knowledge exchanges.",
        icon: "🎁",
        criteria: "FIVE_EXCHANGES",
        points: 50,
    },
    AchievementSeed {
        name: "Serial Sharer",
        description: "Successfully completed 10 knowledge exchanges.",
        icon: "🌟",
        criteria: "TEN_EXCHANGES",
        points: 100,
    },
    AchievementSeed {
        name: "First Steps",
        description: "Mastered your first skill in a Skill Tree.",
        icon: "🌱",
        criteria: "FIRST_SKILL_NODE",
        points: 15,
    },
    AchievementSeed {
        name: "Project Pioneer",
        description: "Started your first collaborative project.",
        icon: "🚀",
        criteria: "FIRST_PROJECT",
        points: 40,
    },
];
