pub mod game;

pub use game::{AnswerOutcome, Game, GameSnapshot, LevelSummary};
