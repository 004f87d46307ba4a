use bevy_ecs::event::{Event, ManualEventReader};

use crate::content::PuzzleId;

/// Change notifications published by the progress store.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    PuzzleCompleted { puzzle_id: PuzzleId, points: u32 },
    LevelUnlocked { level: u32 },
    AchievementEarned { id: String },
    HintUnlocked { puzzle_id: PuzzleId, index: usize },
    ProgressReset,
    SettingsChanged,
}

/// A subscriber's read position in the event queue.
pub struct ProgressSubscription {
    pub(crate) reader: ManualEventReader<ProgressEvent>,
}
