use bevy_utils::tracing::debug;

use crate::content::{Difficulty, Puzzle, PuzzleCatalog, PuzzleId};
use crate::persistence::{PreferenceError, PreferenceStore};
use crate::progress::{
    Achievement, CompletionOutcome, ProgressEvent, ProgressStore, ProgressSubscription,
};
use crate::rules::{is_correct, HintUnavailable};

/// Result of submitting an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    UnknownPuzzle,
    /// The puzzle belongs to a level the player has not reached.
    Locked { level: u32 },
    Incorrect,
    Correct {
        points: u32,
        completion: CompletionOutcome,
    },
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone)]
pub struct GameSnapshot {
    pub current_level: u32,
    pub total_points: u32,
    pub completed: usize,
    pub total_puzzles: usize,
    pub levels: Vec<LevelSummary>,
    pub achievements: Vec<Achievement>,
    pub haptic_feedback: bool,
    pub preferred_difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSummary {
    pub level: u32,
    pub unlocked: bool,
    pub completed: usize,
    pub total: usize,
}

/// Application context: owns the progress store and routes user actions.
pub struct Game {
    store: ProgressStore,
}

impl Game {
    pub fn new(store: ProgressStore) -> Self {
        Self { store }
    }

    pub fn open(
        catalog: PuzzleCatalog,
        prefs: Box<dyn PreferenceStore>,
    ) -> Result<Self, PreferenceError> {
        Ok(Self::new(ProgressStore::load(catalog, prefs)?))
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    pub fn puzzle(&self, id: &PuzzleId) -> Option<&Puzzle> {
        self.store.catalog().get(id)
    }

    /// Check `input` against the puzzle's answer and record a completion on a
    /// match.
    pub fn submit_answer(&mut self, id: &PuzzleId, input: &str) -> AnswerOutcome {
        let Some(puzzle) = self.store.catalog().get(id) else {
            return AnswerOutcome::UnknownPuzzle;
        };
        let level = self.store.level_of(id).unwrap_or(1);
        if !self.store.is_level_unlocked(level) {
            return AnswerOutcome::Locked { level };
        }
        if !is_correct(input, &puzzle.answer) {
            debug!("wrong answer for {}", id);
            return AnswerOutcome::Incorrect;
        }
        let points = puzzle.points;
        let completion = self.store.complete_puzzle(id);
        AnswerOutcome::Correct { points, completion }
    }

    pub fn buy_hint(&mut self, id: &PuzzleId) -> Result<String, HintUnavailable> {
        self.store.unlock_hint(id)
    }

    pub fn hints(&self, id: &PuzzleId) -> Vec<&str> {
        self.store.unlocked_hints(id)
    }

    pub fn reset(&mut self) {
        self.store.reset_game();
    }

    pub fn set_haptic_feedback(&mut self, enabled: bool) -> bool {
        self.store
            .update_settings(|settings| settings.haptic_feedback = enabled)
    }

    pub fn set_preferred_difficulty(&mut self, difficulty: Difficulty) -> bool {
        self.store
            .update_settings(|settings| settings.preferred_difficulty = difficulty)
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let catalog = self.store.catalog();
        let progress = self.store.progress();
        let settings = self.store.settings();
        let levels = (1..=catalog.level_count())
            .map(|level| {
                let puzzles = catalog.puzzles_for_level(level);
                LevelSummary {
                    level,
                    unlocked: self.store.is_level_unlocked(level),
                    completed: puzzles
                        .iter()
                        .filter(|puzzle| self.store.is_completed(&puzzle.id))
                        .count(),
                    total: puzzles.len(),
                }
            })
            .collect();

        GameSnapshot {
            current_level: progress.current_level,
            total_points: progress.total_points,
            completed: progress.completed_puzzles.len(),
            total_puzzles: catalog.len(),
            levels,
            achievements: progress.achievements.clone(),
            haptic_feedback: settings.haptic_feedback,
            preferred_difficulty: settings.preferred_difficulty,
        }
    }

    /// First unsolved puzzle in an unlocked level, preferring the player's
    /// chosen difficulty.
    pub fn suggest_next_puzzle(&self) -> Option<&Puzzle> {
        let preferred = self.store.settings().preferred_difficulty;
        let mut open = self.store.catalog().puzzles().iter().filter(|puzzle| {
            !self.store.is_completed(&puzzle.id)
                && self
                    .store
                    .level_of(&puzzle.id)
                    .is_some_and(|level| self.store.is_level_unlocked(level))
        });
        let first_open = open.next()?;
        if first_open.difficulty == preferred {
            return Some(first_open);
        }
        open.find(|puzzle| puzzle.difficulty == preferred)
            .or(Some(first_open))
    }

    pub fn subscribe(&self) -> ProgressSubscription {
        self.store.subscribe()
    }

    pub fn read_events(&self, subscription: &mut ProgressSubscription) -> Vec<ProgressEvent> {
        self.store.read_events(subscription)
    }

    pub fn end_frame(&mut self) {
        self.store.end_frame();
    }

    pub fn flush(&mut self) -> bool {
        self.store.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryPreferenceStore;

    fn new_game() -> Game {
        Game::open(
            PuzzleCatalog::bundled().unwrap(),
            Box::new(MemoryPreferenceStore::new()),
        )
        .unwrap()
    }

    fn answer_of(game: &Game, raw: &str) -> String {
        game.puzzle(&PuzzleId::new(raw)).unwrap().answer.clone()
    }

    #[test]
    fn correct_answer_completes_the_puzzle() {
        let mut game = new_game();
        let outcome = game.submit_answer(&"puzzle_1".into(), "  16 ");
        assert_eq!(
            outcome,
            AnswerOutcome::Correct {
                points: 100,
                completion: CompletionOutcome::Completed {
                    points_awarded: 100,
                    level_unlocked: None,
                    achievements: vec![],
                },
            }
        );
        assert_eq!(game.snapshot().total_points, 100);
    }

    #[test]
    fn case_is_ignored() {
        let mut game = new_game();
        let outcome = game.submit_answer(&"puzzle_3".into(), "TRIANGLE");
        assert!(matches!(outcome, AnswerOutcome::Correct { .. }));
    }

    #[test]
    fn wrong_answer_changes_nothing() {
        let mut game = new_game();
        assert_eq!(
            game.submit_answer(&"puzzle_1".into(), "17"),
            AnswerOutcome::Incorrect
        );
        assert_eq!(game.snapshot().total_points, 0);
        assert_eq!(game.snapshot().completed, 0);
    }

    #[test]
    fn repeated_correct_answer_reports_already_completed() {
        let mut game = new_game();
        game.submit_answer(&"puzzle_1".into(), "16");
        let outcome = game.submit_answer(&"puzzle_1".into(), "16");
        assert_eq!(
            outcome,
            AnswerOutcome::Correct {
                points: 100,
                completion: CompletionOutcome::AlreadyCompleted,
            }
        );
        assert_eq!(game.snapshot().total_points, 100);
    }

    #[test]
    fn locked_levels_reject_answers() {
        let mut game = new_game();
        let answer = answer_of(&game, "puzzle_6");
        assert_eq!(
            game.submit_answer(&"puzzle_6".into(), &answer),
            AnswerOutcome::Locked { level: 2 }
        );
        assert_eq!(
            game.submit_answer(&"missing".into(), "x"),
            AnswerOutcome::UnknownPuzzle
        );
    }

    #[test]
    fn snapshot_summarises_levels() {
        let mut game = new_game();
        for n in 1..=5 {
            let id = format!("puzzle_{n}");
            let answer = answer_of(&game, &id);
            game.submit_answer(&PuzzleId::new(id), &answer);
        }
        let snapshot = game.snapshot();
        assert_eq!(snapshot.current_level, 2);
        assert_eq!(snapshot.levels.len(), 8);
        assert_eq!(
            snapshot.levels[0],
            LevelSummary {
                level: 1,
                unlocked: true,
                completed: 5,
                total: 5
            }
        );
        assert!(snapshot.levels[1].unlocked);
        assert!(!snapshot.levels[2].unlocked);
        assert_eq!(snapshot.achievements.len(), 2);
    }

    #[test]
    fn suggestion_prefers_chosen_difficulty() {
        let mut game = new_game();
        // Only easy puzzles are unlocked at level 1, so medium falls back.
        assert_eq!(
            game.suggest_next_puzzle().map(|p| p.id.as_str()),
            Some("puzzle_1")
        );
        for n in 1..=5 {
            let id = format!("puzzle_{n}");
            let answer = answer_of(&game, &id);
            game.submit_answer(&PuzzleId::new(id), &answer);
        }
        game.set_preferred_difficulty(Difficulty::Medium);
        assert_eq!(
            game.suggest_next_puzzle().map(|p| p.id.as_str()),
            Some("puzzle_6")
        );
        game.set_preferred_difficulty(Difficulty::Hard);
        assert_eq!(
            game.suggest_next_puzzle().map(|p| p.id.as_str()),
            Some("puzzle_6")
        );
    }

    #[test]
    fn settings_changes_are_published() {
        let mut game = new_game();
        let mut subscription = game.subscribe();
        assert!(game.set_haptic_feedback(false));
        assert!(!game.set_haptic_feedback(false));
        assert_eq!(
            game.read_events(&mut subscription),
            vec![ProgressEvent::SettingsChanged]
        );
        assert!(!game.snapshot().haptic_feedback);
    }
}
