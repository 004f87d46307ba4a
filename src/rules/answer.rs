/// Trim surrounding whitespace and case-fold.
pub fn normalize_answer(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Exact match after normalisation; no fuzzy matching or partial credit.
pub fn is_correct(input: &str, canonical: &str) -> bool {
    normalize_answer(input) == normalize_answer(canonical)
}
