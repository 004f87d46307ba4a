use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::{Difficulty, PuzzleCatalog, PuzzleId};
use crate::rules::rule_for;

pub const SAVE_VERSION: u32 = 1;

/// A milestone record. Created once, never mutated or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub earned_at: DateTime<Utc>,
}

impl Default for Achievement {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            description: String::new(),
            icon: String::new(),
            earned_at: Utc::now(),
        }
    }
}

/// Player state persisted under the progress key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerProgress {
    pub version: u32,
    pub current_level: u32,
    pub total_points: u32,
    pub completed_puzzles: BTreeSet<PuzzleId>,
    /// Highest hint index unlocked per puzzle.
    pub unlocked_hints: BTreeMap<PuzzleId, usize>,
    pub achievements: Vec<Achievement>,
    pub last_played: DateTime<Utc>,
}

impl Default for PlayerProgress {
    fn default() -> Self {
        Self {
            version: SAVE_VERSION,
            current_level: 1,
            total_points: 0,
            completed_puzzles: BTreeSet::new(),
            unlocked_hints: BTreeMap::new(),
            achievements: Vec::new(),
            last_played: Utc::now(),
        }
    }
}

impl PlayerProgress {
    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|achievement| achievement.id == id)
    }

    /// True when both records hold the same game state, ignoring timestamps.
    #[cfg(test)]
    pub(crate) fn same_state(&self, other: &PlayerProgress) -> bool {
        self.current_level == other.current_level
            && self.total_points == other.total_points
            && self.completed_puzzles == other.completed_puzzles
            && self.unlocked_hints == other.unlocked_hints
            && self.achievements.len() == other.achievements.len()
            && self
                .achievements
                .iter()
                .zip(&other.achievements)
                .all(|(a, b)| a.id == b.id)
    }

    /// Bring a decoded record in line with the catalog it will be used with.
    /// Returns the number of fields that had to be corrected.
    pub fn sanitize(&mut self, catalog: &PuzzleCatalog) -> usize {
        let mut fixes = 0;
        if self.current_level == 0 {
            self.current_level = 1;
            fixes += 1;
        }
        let max_level = catalog.level_count() + 1;
        if self.current_level > max_level {
            self.current_level = max_level;
            fixes += 1;
        }

        let before = self.completed_puzzles.len();
        self.completed_puzzles.retain(|id| catalog.contains(id));
        fixes += before - self.completed_puzzles.len();

        let before = self.unlocked_hints.len();
        self.unlocked_hints.retain(|id, index| match catalog.get(id) {
            Some(puzzle) => {
                let last = puzzle.hints.len().saturating_sub(1);
                if *index > last {
                    *index = last;
                    fixes += 1;
                }
                true
            }
            None => false,
        });
        fixes += before - self.unlocked_hints.len();

        let mut seen = BTreeSet::new();
        let before = self.achievements.len();
        self.achievements.retain(|achievement| {
            !achievement.id.is_empty() && seen.insert(achievement.id.clone())
        });
        fixes += before - self.achievements.len();

        for achievement in &mut self.achievements {
            if achievement.title.is_empty()
                || achievement.description.is_empty()
                || achievement.icon.is_empty()
            {
                if let Some(rule) = rule_for(&achievement.id) {
                    fill_blank(&mut achievement.title, rule.title);
                    fill_blank(&mut achievement.description, rule.description);
                    fill_blank(&mut achievement.icon, rule.icon);
                    fixes += 1;
                }
            }
        }

        self.version = SAVE_VERSION;
        fixes
    }
}

fn fill_blank(field: &mut String, value: &str) {
    if field.is_empty() {
        *field = value.to_string();
    }
}

/// Cosmetic preferences, persisted under their own key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub version: u32,
    pub haptic_feedback: bool,
    pub preferred_difficulty: Difficulty,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            version: SAVE_VERSION,
            haptic_feedback: true,
            preferred_difficulty: Difficulty::Medium,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_progress_starts_at_level_one() {
        let progress = PlayerProgress::default();
        assert_eq!(progress.current_level, 1);
        assert_eq!(progress.total_points, 0);
        assert!(progress.completed_puzzles.is_empty());
        assert!(progress.unlocked_hints.is_empty());
        assert!(progress.achievements.is_empty());
        assert_eq!(progress.version, SAVE_VERSION);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let progress: PlayerProgress =
            serde_json::from_str(r#"{ "total_points": 250, "completed_puzzles": ["puzzle_1"] }"#)
                .unwrap();
        assert_eq!(progress.current_level, 1);
        assert_eq!(progress.total_points, 250);
        assert!(progress.completed_puzzles.contains(&PuzzleId::new("puzzle_1")));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let settings: GameSettings =
            serde_json::from_str(r#"{ "haptic_feedback": false, "theme": "dark" }"#).unwrap();
        assert!(!settings.haptic_feedback);
        assert_eq!(settings.preferred_difficulty, Difficulty::Medium);
    }

    #[test]
    fn negative_points_do_not_decode() {
        assert!(serde_json::from_str::<PlayerProgress>(r#"{ "total_points": -5 }"#).is_err());
    }

    #[test]
    fn sanitize_drops_unknown_ids_and_clamps_hints() {
        let catalog = PuzzleCatalog::bundled().unwrap();
        let mut progress = PlayerProgress {
            current_level: 0,
            ..PlayerProgress::default()
        };
        progress.completed_puzzles.insert("puzzle_1".into());
        progress.completed_puzzles.insert("ghost".into());
        progress.unlocked_hints.insert("puzzle_1".into(), 99);
        progress.unlocked_hints.insert("ghost".into(), 0);

        let fixes = progress.sanitize(&catalog);
        assert_eq!(fixes, 4);
        assert_eq!(progress.current_level, 1);
        assert_eq!(progress.completed_puzzles.len(), 1);
        assert_eq!(progress.unlocked_hints.get(&"puzzle_1".into()), Some(&2));
    }

    #[test]
    fn sanitize_leaves_clean_progress_alone() {
        let catalog = PuzzleCatalog::bundled().unwrap();
        let mut progress = PlayerProgress::default();
        progress.completed_puzzles.insert("puzzle_2".into());
        assert_eq!(progress.sanitize(&catalog), 0);
    }

    #[test]
    fn partial_achievement_keeps_the_rest_of_the_save() {
        let raw = r#"{
            "current_level": 3,
            "total_points": 1000,
            "achievements": [
                { "id": "first_level", "title": "First Steps", "description": "d",
                  "earned_at": "2025-01-01T00:00:00Z" },
                { "id": "quarter" }
            ]
        }"#;
        let mut progress: PlayerProgress = serde_json::from_str(raw).unwrap();
        assert_eq!(progress.current_level, 3);
        assert_eq!(progress.total_points, 1000);

        assert_eq!(progress.sanitize(&PuzzleCatalog::bundled().unwrap()), 2);
        let first = &progress.achievements[0];
        assert_eq!(first.icon, "star.fill");
        assert_eq!(first.description, "d");
        assert_eq!(progress.achievements[1].title, "Getting Started");
        assert_eq!(progress.current_level, 3);
    }

    #[test]
    fn achievement_without_id_is_dropped() {
        let mut progress: PlayerProgress =
            serde_json::from_str(r#"{ "achievements": [ { "title": "?" } ] }"#).unwrap();
        assert_eq!(progress.sanitize(&PuzzleCatalog::bundled().unwrap()), 1);
        assert!(progress.achievements.is_empty());
    }
}
