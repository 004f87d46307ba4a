use bevy_ecs::event::Events;
use bevy_utils::tracing::{debug, error, info, warn};
use chrono::Utc;
use serde::Serialize;

use crate::content::{Puzzle, PuzzleCatalog, PuzzleId};
use crate::persistence::{
    load_record, save_record, LoadOutcome, PreferenceError, PreferenceStore, PROGRESS_KEY,
    SETTINGS_KEY,
};
use crate::progress::events::{ProgressEvent, ProgressSubscription};
use crate::progress::state::{GameSettings, PlayerProgress};
use crate::rules::{
    check_hint_purchase, evaluate_achievements, revealed_hints, AchievementContext,
    HintUnavailable, HINT_COST,
};

/// What `complete_puzzle` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    UnknownPuzzle,
    AlreadyCompleted,
    Completed {
        points_awarded: u32,
        level_unlocked: Option<u32>,
        achievements: Vec<&'static str>,
    },
}

/// Sole owner of player progress and settings, and of their persistence.
///
/// Change events are double buffered and only dropped by `end_frame`. Hosts
/// that publish events must call it once per handled command, or the queue
/// keeps every event ever sent.
pub struct ProgressStore {
    catalog: PuzzleCatalog,
    prefs: Box<dyn PreferenceStore>,
    progress: PlayerProgress,
    settings: GameSettings,
    events: Events<ProgressEvent>,
    progress_dirty: bool,
    settings_dirty: bool,
}

impl ProgressStore {
    /// Read both records from `prefs`, falling back to defaults when a record
    /// is missing or does not decode. A backend that cannot be read is an
    /// error, so intact data is never overwritten with defaults.
    pub fn load(
        catalog: PuzzleCatalog,
        prefs: Box<dyn PreferenceStore>,
    ) -> Result<Self, PreferenceError> {
        let outcome: LoadOutcome<PlayerProgress> = load_record(&*prefs, PROGRESS_KEY)?;
        let restored = outcome.is_loaded();
        let mut progress = outcome.into_value_or_default(PROGRESS_KEY);
        let fixes = progress.sanitize(&catalog);
        if fixes > 0 {
            warn!("corrected {} inconsistent progress field(s) on load", fixes);
        }
        let outcome: LoadOutcome<GameSettings> = load_record(&*prefs, SETTINGS_KEY)?;
        let settings = outcome.into_value_or_default(SETTINGS_KEY);

        info!(
            "{} progress: level {}, {} points, {}/{} puzzles (catalog schema {})",
            if restored { "restored" } else { "new" },
            progress.current_level,
            progress.total_points,
            progress.completed_puzzles.len(),
            catalog.len(),
            catalog.schema_version()
        );

        Ok(Self {
            catalog,
            prefs,
            progress,
            settings,
            events: Events::default(),
            progress_dirty: false,
            settings_dirty: false,
        })
    }

    pub fn catalog(&self) -> &PuzzleCatalog {
        &self.catalog
    }

    pub fn progress(&self) -> &PlayerProgress {
        &self.progress
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Mark a puzzle as solved. Completing the same puzzle twice never awards
    /// points twice.
    pub fn complete_puzzle(&mut self, id: &PuzzleId) -> CompletionOutcome {
        let Some(points) = self.catalog.get(id).map(|puzzle| puzzle.points) else {
            debug!("ignoring completion of unknown puzzle {}", id);
            return CompletionOutcome::UnknownPuzzle;
        };
        if self.progress.completed_puzzles.contains(id) {
            return CompletionOutcome::AlreadyCompleted;
        }

        self.progress.completed_puzzles.insert(id.clone());
        self.progress.total_points = self.progress.total_points.saturating_add(points);
        self.events.send(ProgressEvent::PuzzleCompleted {
            puzzle_id: id.clone(),
            points,
        });

        let mut level_unlocked = None;
        let mut achievements = Vec::new();
        if self.current_level_cleared() {
            self.progress.current_level += 1;
            let level = self.progress.current_level;
            info!("level {} unlocked", level);
            self.events.send(ProgressEvent::LevelUnlocked { level });
            level_unlocked = Some(level);
            achievements = self.award_achievements();
        }

        self.save_progress();
        CompletionOutcome::Completed {
            points_awarded: points,
            level_unlocked,
            achievements,
        }
    }

    /// Buy the next hint for a puzzle. Fails without side effects when the
    /// puzzle is unknown, every hint is already revealed, or the player cannot
    /// afford it.
    pub fn unlock_hint(&mut self, id: &PuzzleId) -> Result<String, HintUnavailable> {
        let puzzle = self.catalog.get(id).ok_or(HintUnavailable::UnknownPuzzle)?;
        let index = check_hint_purchase(
            puzzle,
            &self.progress.unlocked_hints,
            self.progress.total_points,
        )?;
        let hint = puzzle.hints[index].clone();

        self.progress.total_points -= HINT_COST;
        self.progress.unlocked_hints.insert(id.clone(), index);
        self.events.send(ProgressEvent::HintUnlocked {
            puzzle_id: id.clone(),
            index,
        });
        self.save_progress();
        Ok(hint)
    }

    pub fn unlocked_hints(&self, id: &PuzzleId) -> Vec<&str> {
        self.catalog
            .get(id)
            .map(|puzzle| revealed_hints(puzzle, &self.progress.unlocked_hints))
            .unwrap_or_default()
    }

    pub fn can_unlock_hint(&self, id: &PuzzleId) -> bool {
        self.catalog.get(id).is_some_and(|puzzle| {
            check_hint_purchase(
                puzzle,
                &self.progress.unlocked_hints,
                self.progress.total_points,
            )
            .is_ok()
        })
    }

    pub fn puzzles_for_level(&self, level: u32) -> &[Puzzle] {
        self.catalog.puzzles_for_level(level)
    }

    pub fn is_level_unlocked(&self, level: u32) -> bool {
        level <= self.progress.current_level
    }

    pub fn level_of(&self, id: &PuzzleId) -> Option<u32> {
        self.catalog.level_of(id)
    }

    pub fn is_completed(&self, id: &PuzzleId) -> bool {
        self.progress.completed_puzzles.contains(id)
    }

    /// Throw away all progress. Settings are kept.
    pub fn reset_game(&mut self) {
        info!("resetting player progress");
        self.progress = PlayerProgress::default();
        self.events.send(ProgressEvent::ProgressReset);
        self.save_progress();
    }

    /// Apply `change` to the settings and persist them if anything changed.
    pub fn update_settings(&mut self, change: impl FnOnce(&mut GameSettings)) -> bool {
        let before = self.settings.clone();
        change(&mut self.settings);
        if self.settings == before {
            return false;
        }
        self.settings_dirty = !write_with_retry(&mut *self.prefs, SETTINGS_KEY, &self.settings);
        self.events.send(ProgressEvent::SettingsChanged);
        true
    }

    /// Retry any write that failed earlier. Returns true once nothing is
    /// pending.
    pub fn flush(&mut self) -> bool {
        if self.progress_dirty {
            self.progress_dirty = !write_with_retry(&mut *self.prefs, PROGRESS_KEY, &self.progress);
        }
        if self.settings_dirty {
            self.settings_dirty = !write_with_retry(&mut *self.prefs, SETTINGS_KEY, &self.settings);
        }
        !self.is_dirty()
    }

    pub fn is_dirty(&self) -> bool {
        self.progress_dirty || self.settings_dirty
    }

    pub fn subscribe(&self) -> ProgressSubscription {
        ProgressSubscription {
            reader: self.events.get_reader(),
        }
    }

    /// Events published since the subscription last read.
    pub fn read_events(&self, subscription: &mut ProgressSubscription) -> Vec<ProgressEvent> {
        subscription.reader.read(&self.events).cloned().collect()
    }

    /// Rotate the event buffers. Events survive two frames; subscribers that
    /// read less often than that miss events.
    pub fn end_frame(&mut self) {
        self.events.update();
    }

    fn current_level_cleared(&self) -> bool {
        let puzzles = self.catalog.puzzles_for_level(self.progress.current_level);
        !puzzles.is_empty()
            && puzzles
                .iter()
                .all(|puzzle| self.progress.completed_puzzles.contains(&puzzle.id))
    }

    fn award_achievements(&mut self) -> Vec<&'static str> {
        let ctx = AchievementContext {
            level: self.progress.current_level,
            points: self.progress.total_points,
            completed: self.progress.completed_puzzles.len(),
            catalog_size: self.catalog.len(),
        };
        let added = evaluate_achievements(&ctx, &mut self.progress.achievements, Utc::now());
        for id in &added {
            info!("achievement earned: {}", id);
            self.events.send(ProgressEvent::AchievementEarned { id: id.to_string() });
        }
        added
    }

    fn save_progress(&mut self) {
        self.progress.last_played = Utc::now();
        self.progress_dirty = !write_with_retry(&mut *self.prefs, PROGRESS_KEY, &self.progress);
    }
}

/// One retry, then give up; the in-memory copy stays authoritative.
fn write_with_retry<T: Serialize>(prefs: &mut dyn PreferenceStore, key: &str, value: &T) -> bool {
    match save_record(prefs, key, value) {
        Ok(()) => return true,
        Err(err) => warn!("failed to persist {}: {}; retrying", key, err),
    }
    match save_record(prefs, key, value) {
        Ok(()) => true,
        Err(err) => {
            error!("failed to persist {} after retry: {}", key, err);
            false
        }
    }
}
