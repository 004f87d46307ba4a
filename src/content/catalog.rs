use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::content::repository::{Puzzle, PuzzleId};

pub const CATALOG_SCHEMA_VERSION: u32 = 1;
pub const PUZZLES_PER_LEVEL: usize = 5;

const BUNDLED_CATALOG: &str = include_str!("../../assets/data/puzzles.json");

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("{0}")]
    Validation(String),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    schema_version: u32,
    puzzles: Vec<Puzzle>,
}

/// Ordered, read-only puzzle list. Position in the list decides the level.
#[derive(Debug, Clone)]
pub struct PuzzleCatalog {
    schema_version: u32,
    puzzles: Vec<Puzzle>,
    index: HashMap<PuzzleId, usize>,
}

pub fn load_puzzle_catalog(path: impl AsRef<Path>) -> Result<PuzzleCatalog, CatalogError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_puzzle_catalog(&raw, &path.display().to_string())
}

pub fn parse_puzzle_catalog(raw: &str, origin: &str) -> Result<PuzzleCatalog, CatalogError> {
    let file: CatalogFile = serde_json::from_str(raw).map_err(|source| CatalogError::Json {
        path: origin.to_string(),
        source,
    })?;
    PuzzleCatalog::new(file.schema_version, file.puzzles)
}

impl PuzzleCatalog {
    pub fn new(schema_version: u32, puzzles: Vec<Puzzle>) -> Result<Self, CatalogError> {
        if schema_version != CATALOG_SCHEMA_VERSION {
            return Err(CatalogError::Validation(format!(
                "catalog schema version {} (expected {})",
                schema_version, CATALOG_SCHEMA_VERSION
            )));
        }
        let mut index = HashMap::with_capacity(puzzles.len());
        for (position, puzzle) in puzzles.iter().enumerate() {
            validate_puzzle(puzzle)?;
            if index.insert(puzzle.id.clone(), position).is_some() {
                return Err(CatalogError::Validation(format!(
                    "duplicate puzzle id {}",
                    puzzle.id
                )));
            }
        }
        Ok(Self {
            schema_version,
            puzzles,
            index,
        })
    }

    /// The catalog compiled into the binary.
    pub fn bundled() -> Result<Self, CatalogError> {
        parse_puzzle_catalog(BUNDLED_CATALOG, "bundled puzzles.json")
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }

    pub fn puzzles(&self) -> &[Puzzle] {
        &self.puzzles
    }

    pub fn get(&self, id: &PuzzleId) -> Option<&Puzzle> {
        self.index.get(id).map(|&position| &self.puzzles[position])
    }

    pub fn contains(&self, id: &PuzzleId) -> bool {
        self.index.contains_key(id)
    }

    /// 1-based level of a puzzle, from its catalog position.
    pub fn level_of(&self, id: &PuzzleId) -> Option<u32> {
        self.index
            .get(id)
            .map(|&position| (position / PUZZLES_PER_LEVEL) as u32 + 1)
    }

    pub fn level_count(&self) -> u32 {
        self.puzzles.len().div_ceil(PUZZLES_PER_LEVEL) as u32
    }

    /// The window of puzzles for a level; shorter for a short final slice and
    /// empty for level 0 or a level past the end.
    pub fn puzzles_for_level(&self, level: u32) -> &[Puzzle] {
        if level == 0 {
            return &[];
        }
        let start = (level as usize - 1).saturating_mul(PUZZLES_PER_LEVEL);
        if start >= self.puzzles.len() {
            return &[];
        }
        let end = (start + PUZZLES_PER_LEVEL).min(self.puzzles.len());
        &self.puzzles[start..end]
    }
}

fn validate_puzzle(puzzle: &Puzzle) -> Result<(), CatalogError> {
    if puzzle.id.as_str().trim().is_empty() {
        return Err(CatalogError::Validation(
            "puzzle id cannot be empty".to_string(),
        ));
    }
    if puzzle.title.trim().is_empty() {
        return Err(CatalogError::Validation(format!(
            "puzzle {} missing title",
            puzzle.id
        )));
    }
    if puzzle.answer.trim().is_empty() {
        return Err(CatalogError::Validation(format!(
            "puzzle {} missing answer",
            puzzle.id
        )));
    }
    if puzzle.hints.is_empty() {
        return Err(CatalogError::Validation(format!(
            "puzzle {} has no hints",
            puzzle.id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::repository::Difficulty;

    fn puzzle(id: &str) -> Puzzle {
        Puzzle {
            id: PuzzleId::new(id),
            title: format!("Title {id}"),
            description: "What is it?".to_string(),
            image_pattern: String::new(),
            answer: "42".to_string(),
            hints: vec!["first".to_string(), "second".to_string()],
            difficulty: Difficulty::Easy,
            points: 100,
        }
    }

    #[test]
    fn bundled_catalog_has_forty_puzzles_in_eight_levels() {
        let catalog = PuzzleCatalog::bundled().expect("bundled catalog");
        assert_eq!(catalog.len(), 40);
        assert_eq!(catalog.level_count(), 8);
        for level in 1..=8 {
            assert_eq!(catalog.puzzles_for_level(level).len(), 5);
        }
        assert_eq!(catalog.puzzles()[0].id, PuzzleId::new("puzzle_1"));
        assert_eq!(catalog.puzzles()[0].points, 100);
    }

    #[test]
    fn level_of_follows_catalog_position() {
        let catalog = PuzzleCatalog::bundled().unwrap();
        assert_eq!(catalog.level_of(&"puzzle_1".into()), Some(1));
        assert_eq!(catalog.level_of(&"puzzle_5".into()), Some(1));
        assert_eq!(catalog.level_of(&"puzzle_6".into()), Some(2));
        assert_eq!(catalog.level_of(&"puzzle_40".into()), Some(8));
        assert_eq!(catalog.level_of(&"puzzle_41".into()), None);
    }

    #[test]
    fn out_of_range_levels_are_empty() {
        let catalog = PuzzleCatalog::bundled().unwrap();
        assert!(catalog.puzzles_for_level(0).is_empty());
        assert!(catalog.puzzles_for_level(9).is_empty());
        assert!(catalog.puzzles_for_level(u32::MAX).is_empty());
    }

    #[test]
    fn short_final_level_is_truncated() {
        let puzzles = (1..=7).map(|n| puzzle(&format!("p{n}"))).collect();
        let catalog = PuzzleCatalog::new(CATALOG_SCHEMA_VERSION, puzzles).unwrap();
        assert_eq!(catalog.level_count(), 2);
        assert_eq!(catalog.puzzles_for_level(2).len(), 2);
        assert_eq!(catalog.puzzles_for_level(2)[0].id, PuzzleId::new("p6"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = PuzzleCatalog::new(CATALOG_SCHEMA_VERSION, vec![puzzle("a"), puzzle("a")])
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(message) if message.contains("duplicate")));
    }

    #[test]
    fn puzzles_without_hints_are_rejected() {
        let mut bare = puzzle("bare");
        bare.hints.clear();
        assert!(PuzzleCatalog::new(CATALOG_SCHEMA_VERSION, vec![bare]).is_err());
    }

    #[test]
    fn malformed_json_reports_origin() {
        let err = parse_puzzle_catalog("{ not json", "inline").unwrap_err();
        assert!(err.to_string().starts_with("failed to parse inline"));
    }

    #[test]
    fn catalog_file_loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("puzzles.json");
        let body = serde_json::json!({
            "schema_version": 1,
            "puzzles": [puzzle("only")],
        });
        std::fs::write(&path, body.to_string()).unwrap();
        let catalog = load_puzzle_catalog(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains(&"only".into()));
    }
}
