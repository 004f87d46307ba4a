pub mod achievements;
pub mod answer;
pub mod hints;

pub use achievements::{
    evaluate_achievements, rule_for, AchievementContext, AchievementRule, Trigger,
    ACHIEVEMENT_RULES,
};
pub use answer::{is_correct, normalize_answer};
pub use hints::{check_hint_purchase, next_hint_index, revealed_hints, HintUnavailable, HINT_COST};
