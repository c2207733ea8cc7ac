//! Score normalizer.
//!
//! Maps one raw criterion value onto the canonical 0–10 scale. Dispatch is
//! per [`RawCriterionValue`] variant against the criterion's [`ScaleRule`];
//! any value whose shape does not fit the rule, and any missing value, scores
//! 0 with zero confidence instead of failing.

use crate::config::{Direction, NormalizerConfig, ScaleRule, SubFieldRule};
use crate::domain::RawCriterionValue;

pub const MAX_SCORE: f64 = 10.0;

/// Output of a single normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalized {
    /// 0–10.
    pub value: f64,
    /// 0–1.
    pub confidence: f64,
}

impl Normalized {
    const ZERO: Normalized = Normalized {
        value: 0.0,
        confidence: 0.0,
    };

    fn certain(value: f64) -> Self {
        Self {
            value,
            confidence: 1.0,
        }
    }
}

/// Pure normalizer over a set of per-criterion scale rules.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Normalize the raw value submitted for `criterion_name`.
    pub fn normalize(&self, criterion_name: &str, raw: Option<&RawCriterionValue>) -> Normalized {
        normalize_with(self.config.rule_for(criterion_name), raw)
    }
}

/// Normalize a raw value against an explicit rule.
pub fn normalize_with(rule: &ScaleRule, raw: Option<&RawCriterionValue>) -> Normalized {
    let Some(raw) = raw else {
        return Normalized::ZERO;
    };

    match (rule, raw) {
        (ScaleRule::YesNo, RawCriterionValue::Text(text)) => match parse_yes_no(text) {
            Some(true) => Normalized::certain(MAX_SCORE),
            Some(false) => Normalized::certain(0.0),
            None => Normalized::ZERO,
        },
        (ScaleRule::Linear { ceiling, direction }, RawCriterionValue::Number(n)) => {
            scale_linear(*n, *ceiling, *direction)
                .map(Normalized::certain)
                .unwrap_or(Normalized::ZERO)
        }
        (ScaleRule::Linear { ceiling, direction }, RawCriterionValue::Text(text)) => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(|n| scale_linear(n, *ceiling, *direction))
            .map(Normalized::certain)
            .unwrap_or(Normalized::ZERO),
        (ScaleRule::Composite { parts }, RawCriterionValue::Structured(_)) => {
            blend(parts, raw)
        }
        _ => Normalized::ZERO,
    }
}

fn parse_yes_no(text: &str) -> Option<bool> {
    let t = text.trim();
    if t.eq_ignore_ascii_case("yes") {
        Some(true)
    } else if t.eq_ignore_ascii_case("no") {
        Some(false)
    } else {
        None
    }
}

/// Linear score against `ceiling`, clamped to 0–10. `None` when the input
/// is unusable (non-finite, negative, or a non-positive ceiling).
fn scale_linear(raw: f64, ceiling: f64, direction: Direction) -> Option<f64> {
    if !raw.is_finite() || raw < 0.0 || !ceiling.is_finite() || ceiling <= 0.0 {
        return None;
    }
    let ratio = (raw / ceiling).min(1.0);
    let score = match direction {
        Direction::Direct => MAX_SCORE * ratio,
        Direction::Inverse => MAX_SCORE * (1.0 - ratio),
    };
    Some(score.clamp(0.0, MAX_SCORE))
}

fn blend(parts: &[SubFieldRule], raw: &RawCriterionValue) -> Normalized {
    if parts.is_empty() {
        return Normalized::ZERO;
    }

    let mut value = 0.0;
    let mut present = 0usize;
    for part in parts {
        let partial = raw
            .sub_field(&part.field)
            .and_then(|n| scale_linear(n, part.ceiling, part.direction));
        if let Some(p) = partial {
            present += 1;
            value += part.weight * p;
        }
    }

    Normalized {
        value: value.clamp(0.0, MAX_SCORE),
        confidence: present as f64 / parts.len() as f64,
    }
}
