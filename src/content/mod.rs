pub mod catalog;
pub mod repository;

pub use catalog::{
    load_puzzle_catalog, parse_puzzle_catalog, CatalogError, PuzzleCatalog, PUZZLES_PER_LEVEL,
};
pub use repository::{Difficulty, ParseDifficultyError, Puzzle, PuzzleId};
