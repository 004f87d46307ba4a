// Re-export core modules for use by the binary or other consumers
pub mod content;
pub mod core;
pub mod persistence;
pub mod progress;
pub mod rules;

// Expose the game context and the types needed to drive it
pub use crate::content::{Difficulty, Puzzle, PuzzleCatalog, PuzzleId};
pub use crate::core::{AnswerOutcome, Game, GameSnapshot, LevelSummary};
pub use crate::progress::{CompletionOutcome, GameSettings, PlayerProgress, ProgressEvent};
