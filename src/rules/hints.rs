use std::collections::BTreeMap;

use crate::content::{Puzzle, PuzzleId};

/// Points deducted for every hint purchase.
pub const HINT_COST: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HintUnavailable {
    #[error("no such puzzle")]
    UnknownPuzzle,
    #[error("all hints already unlocked")]
    AllHintsUnlocked,
    #[error("need {needed} points for a hint, have {available}")]
    InsufficientPoints { needed: u32, available: u32 },
}

/// Index of the next hint to reveal, given the recorded highest index.
pub fn next_hint_index(unlocked: &BTreeMap<PuzzleId, usize>, id: &PuzzleId) -> usize {
    unlocked.get(id).map_or(0, |index| index + 1)
}

/// Check whether the next hint of `puzzle` can be bought with `points`.
/// Returns the index that would be revealed.
pub fn check_hint_purchase(
    puzzle: &Puzzle,
    unlocked: &BTreeMap<PuzzleId, usize>,
    points: u32,
) -> Result<usize, HintUnavailable> {
    let next = next_hint_index(unlocked, &puzzle.id);
    if next >= puzzle.hints.len() {
        return Err(HintUnavailable::AllHintsUnlocked);
    }
    if points < HINT_COST {
        return Err(HintUnavailable::InsufficientPoints {
            needed: HINT_COST,
            available: points,
        });
    }
    Ok(next)
}

/// Hints revealed so far, in catalog order.
pub fn revealed_hints<'a>(
    puzzle: &'a Puzzle,
    unlocked: &BTreeMap<PuzzleId, usize>,
) -> Vec<&'a str> {
    let count = next_hint_index(unlocked, &puzzle.id).min(puzzle.hints.len());
    puzzle.hints[..count].iter().map(String::as_str).collect()
}
