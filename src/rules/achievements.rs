use chrono::{DateTime, Utc};

use crate::progress::state::Achievement;

/// Inputs the achievement table is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AchievementContext {
    pub level: u32,
    pub points: u32,
    pub completed: usize,
    pub catalog_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Current level equals the value exactly.
    LevelReached(u32),
    AllPuzzlesCompleted,
    PointsAtLeast(u32),
    CompletedAtLeast(usize),
}

impl Trigger {
    pub fn is_met(self, ctx: &AchievementContext) -> bool {
        match self {
            Trigger::LevelReached(level) => ctx.level == level,
            Trigger::AllPuzzlesCompleted => {
                ctx.catalog_size > 0 && ctx.completed == ctx.catalog_size
            }
            Trigger::PointsAtLeast(points) => ctx.points >= points,
            Trigger::CompletedAtLeast(count) => ctx.completed >= count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AchievementRule {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub trigger: Trigger,
}

impl AchievementRule {
    fn award(&self, earned_at: DateTime<Utc>) -> Achievement {
        Achievement {
            id: self.id.to_string(),
            title: self.title.to_string(),
            description: self.description.to_string(),
            icon: self.icon.to_string(),
            earned_at,
        }
    }
}

const fn rule(
    id: &'static str,
    title: &'static str,
    description: &'static str,
    icon: &'static str,
    trigger: Trigger,
) -> AchievementRule {
    AchievementRule {
        id,
        title,
        description,
        icon,
        trigger,
    }
}

/// Evaluation order is award order.
pub static ACHIEVEMENT_RULES: [AchievementRule; 11] = [
    rule(
        "first_level",
        "First Steps",
        "Complete your first level",
        "star.fill",
        Trigger::LevelReached(2),
    ),
    rule(
        "quarter",
        "Getting Started",
        "Reach level 3",
        "flame.fill",
        Trigger::LevelReached(3),
    ),
    rule(
        "halfway",
        "Halfway Hero",
        "Reach level 5",
        "bolt.fill",
        Trigger::LevelReached(5),
    ),
    rule(
        "three_quarters",
        "Almost There",
        "Reach level 7",
        "speedometer",
        Trigger::LevelReached(7),
    ),
    rule(
        "master",
        "Puzzle Master",
        "Complete all 40 puzzles!",
        "crown.fill",
        Trigger::AllPuzzlesCompleted,
    ),
    rule(
        "points_500",
        "Point Collector",
        "Earn 500 points",
        "star.circle.fill",
        Trigger::PointsAtLeast(500),
    ),
    rule(
        "points_1000",
        "Point Master",
        "Earn 1000 points",
        "star.square.fill",
        Trigger::PointsAtLeast(1000),
    ),
    rule(
        "points_2000",
        "Point Legend",
        "Earn 2000 points",
        "sparkles",
        Trigger::PointsAtLeast(2000),
    ),
    rule(
        "puzzles_10",
        "Puzzle Solver",
        "Complete 10 puzzles",
        "puzzlepiece.fill",
        Trigger::CompletedAtLeast(10),
    ),
    rule(
        "puzzles_20",
        "Puzzle Expert",
        "Complete 20 puzzles",
        "brain.head.profile",
        Trigger::CompletedAtLeast(20),
    ),
    rule(
        "puzzles_30",
        "Puzzle Champion",
        "Complete 30 puzzles",
        "trophy.fill",
        Trigger::CompletedAtLeast(30),
    ),
];

pub fn rule_for(id: &str) -> Option<&'static AchievementRule> {
    ACHIEVEMENT_RULES.iter().find(|rule| rule.id == id)
}

/// Append every newly satisfied achievement to `earned` and return the ids
/// that were added. Ids already present are never added again.
pub fn evaluate_achievements(
    ctx: &AchievementContext,
    earned: &mut Vec<Achievement>,
    now: DateTime<Utc>,
) -> Vec<&'static str> {
    let mut added = Vec::new();
    for rule in &ACHIEVEMENT_RULES {
        if !rule.trigger.is_met(ctx) {
            continue;
        }
        if earned.iter().any(|achievement| achievement.id == rule.id) {
            continue;
        }
        earned.push(rule.award(now));
        added.push(rule.id);
    }
    added
}
