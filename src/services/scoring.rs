use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::db::models::RuleMap;

const RULE_KEY_MIN_TO_COUNT: &str = "minToCount";

/// Per-main-question scoring policy.
///
/// Only "best N of M" is recognised. Anything the rule parser does not understand degrades to
/// [`ScoringRule::SumAll`] instead of failing the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum ScoringRule {
    #[default]
    SumAll,
    BestOf(usize),
}

impl ScoringRule {
    pub(crate) fn from_value(value: &Value) -> Self {
        value
            .get(RULE_KEY_MIN_TO_COUNT)
            .and_then(positive_count)
            .map(ScoringRule::BestOf)
            .unwrap_or_default()
    }

    pub(crate) fn for_main_label(rules: &RuleMap, main_label: &str) -> Self {
        rules.get(main_label).map(Self::from_value).unwrap_or_default()
    }
}

fn positive_count(value: &Value) -> Option<usize> {
    let count = match value {
        Value::Number(number) => match number.as_u64() {
            Some(whole) => whole,
            None => {
                let float = number.as_f64()?;
                if float.fract() != 0.0 || float < 1.0 {
                    return None;
                }
                float as u64
            }
        },
        Value::String(raw) => raw.trim().parse::<u64>().ok()?,
        _ => return None,
    };

    (count > 0).then(|| usize::try_from(count).ok()).flatten()
}

/// Total for one main question: nulls are dropped, then either everything or the top `N`
/// values are summed. Fewer than `N` entered values is not an error.
pub(crate) fn main_question_total(values: &[Option<f64>], rule: ScoringRule) -> f64 {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();

    match rule {
        ScoringRule::SumAll => present.iter().sum(),
        ScoringRule::BestOf(count) => {
            present.sort_by(|left, right| right.total_cmp(left));
            present.iter().take(count).sum()
        }
    }
}

/// A mark or total as it is shown to people: integral values without a fraction, everything
/// else rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Score {
    Whole(i64),
    Fraction(f64),
}

impl Score {
    pub(crate) fn from_f64(value: f64) -> Self {
        let rounded = (value * 100.0).round() / 100.0;
        if rounded.fract() == 0.0 && rounded.abs() < i64::MAX as f64 {
            Score::Whole(rounded as i64)
        } else {
            Score::Fraction(rounded)
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Whole(value) => write!(f, "{value}"),
            Score::Fraction(value) => write!(f, "{value}"),
        }
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Score::Whole(value) => serializer.serialize_i64(*value),
            Score::Fraction(value) => serializer.serialize_f64(*value),
        }
    }
}
