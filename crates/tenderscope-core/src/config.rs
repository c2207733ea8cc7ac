//! Engine configuration.
//!
//! Every tunable the engine uses lives here: per-criterion scale rules,
//! the weight alignment tolerance, the Tukey fence multiplier, severity bands
//! and the collaborator timeout. All fields default, so a config file only
//! needs to name what it overrides.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{Result, TenderError};

const SUB_WEIGHT_EPSILON: f64 = 1e-6;

static YES_NO: ScaleRule = ScaleRule::YesNo;

/// Whether larger raw values are better (`Direct`) or worse (`Inverse`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Direct,
    Inverse,
}

/// One weighted sub-field of a composite rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubFieldRule {
    pub field: String,
    pub weight: f64,
    pub ceiling: f64,
    pub direction: Direction,
}

impl SubFieldRule {
    pub fn new(field: impl Into<String>, weight: f64, ceiling: f64, direction: Direction) -> Self {
        Self {
            field: field.into(),
            weight,
            ceiling,
            direction,
        }
    }
}

/// How a criterion's raw value maps onto 0–10.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScaleRule {
    /// "Yes" → 10, everything else → 0.
    YesNo,
    /// Number scaled against a reference ceiling.
    Linear { ceiling: f64, direction: Direction },
    /// Weighted blend of linear sub-field scores; weights sum to 1.0.
    Composite { parts: Vec<SubFieldRule> },
}

impl ScaleRule {
    pub fn linear(ceiling: f64, direction: Direction) -> Self {
        Self::Linear { ceiling, direction }
    }

    fn validate(&self, criterion: &str) -> Result<()> {
        match self {
            Self::YesNo => Ok(()),
            Self::Linear { ceiling, .. } => check_ceiling(criterion, *ceiling),
            Self::Composite { parts } => {
                if parts.is_empty() {
                    return Err(TenderError::InvalidConfig(format!(
                        "composite rule for '{criterion}' has no parts"
                    )));
                }
                for part in parts {
                    check_ceiling(&format!("{criterion}.{}", part.field), part.ceiling)?;
                    if part.weight < 0.0 {
                        return Err(TenderError::InvalidConfig(format!(
                            "negative sub-weight for '{criterion}.{}'",
                            part.field
                        )));
                    }
                }
                let total: f64 = parts.iter().map(|p| p.weight).sum();
                if (total - 1.0).abs() > SUB_WEIGHT_EPSILON {
                    return Err(TenderError::InvalidConfig(format!(
                        "sub-weights for '{criterion}' sum to {total}, expected 1.0"
                    )));
                }
                Ok(())
            }
        }
    }
}

fn check_ceiling(name: &str, ceiling: f64) -> Result<()> {
    if ceiling.is_finite() && ceiling > 0.0 {
        Ok(())
    } else {
        Err(TenderError::InvalidConfig(format!(
            "ceiling for '{name}' must be positive, got {ceiling}"
        )))
    }
}

/// Scale rules keyed by criterion name. Unlisted criteria are yes/no.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    #[serde(default)]
    pub rules: BTreeMap<String, ScaleRule>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl NormalizerConfig {
    /// No numeric rules: every criterion is scored yes/no.
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// Reference ceilings used for the common numeric criteria.
    ///
    /// | Criterion                      | Rule                                 |
    /// |--------------------------------|--------------------------------------|
    /// | Consultants                    | linear, ceiling 50, direct           |
    /// | Implementation Months          | linear, ceiling 24, inverse          |
    /// | Implementation Profile         | man_months 700 · 0.4, consultants 50 · 0.3, experience_years 20 · 0.3 |
    pub fn standard() -> Self {
        Self::empty()
            .with_rule("Consultants", ScaleRule::linear(50.0, Direction::Direct))
            .with_rule(
                "Implementation Months",
                ScaleRule::linear(24.0, Direction::Inverse),
            )
            .with_rule(
                "Implementation Profile",
                ScaleRule::Composite {
                    parts: vec![
                        SubFieldRule::new("man_months", 0.4, 700.0, Direction::Direct),
                        SubFieldRule::new("consultants", 0.3, 50.0, Direction::Direct),
                        SubFieldRule::new("experience_years", 0.3, 20.0, Direction::Direct),
                    ],
                },
            )
    }

    /// Add or replace a rule.
    pub fn with_rule(mut self, criterion_name: impl Into<String>, rule: ScaleRule) -> Self {
        self.rules.insert(criterion_name.into(), rule);
        self
    }

    pub fn rule_for(&self, criterion_name: &str) -> &ScaleRule {
        self.rules.get(criterion_name).unwrap_or(&YES_NO)
    }
}

/// Absolute deviation thresholds (percent) for presentation bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityBands {
    pub elevated_pct: f64,
    pub critical_pct: f64,
}

impl Default for SeverityBands {
    fn default() -> Self {
        Self {
            elevated_pct: 20.0,
            critical_pct: 50.0,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub normalizer: NormalizerConfig,
    /// Allowed distance of a category's weight sum from 100.
    pub weight_tolerance: f64,
    /// Tukey fence multiplier applied to the IQR.
    pub tukey_multiplier: f64,
    pub severity: SeverityBands,
    /// Upper bound on a single collaborator fetch.
    pub source_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            normalizer: NormalizerConfig::standard(),
            weight_tolerance: 5.0,
            tukey_multiplier: 1.5,
            severity: SeverityBands::default(),
            source_timeout_ms: 10_000,
        }
    }
}

impl EngineConfig {
    /// Load and validate a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let config: EngineConfig = serde_json::from_slice(&bytes)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), rules = config.normalizer.rules.len(), "loaded engine config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, rule) in &self.normalizer.rules {
            rule.validate(name)?;
        }
        if !(self.weight_tolerance >= 0.0) {
            return Err(TenderError::InvalidConfig(format!(
                "weight_tolerance must be non-negative, got {}",
                self.weight_tolerance
            )));
        }
        if !(self.tukey_multiplier >= 0.0) {
            return Err(TenderError::InvalidConfig(format!(
                "tukey_multiplier must be non-negative, got {}",
                self.tukey_multiplier
            )));
        }
        let bands = &self.severity;
        if !(bands.elevated_pct >= 0.0 && bands.elevated_pct <= bands.critical_pct) {
            return Err(TenderError::InvalidConfig(format!(
                "severity bands must satisfy 0 <= elevated ({}) <= critical ({})",
                bands.elevated_pct, bands.critical_pct
            )));
        }
        Ok(())
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_millis(self.source_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_unknown_criterion_defaults_to_yes_no() {
        let cfg = NormalizerConfig::standard();
        assert_eq!(cfg.rule_for("ISO 9001"), &ScaleRule::YesNo);
        assert!(matches!(
            cfg.rule_for("Consultants"),
            ScaleRule::Linear { .. }
        ));
    }

    #[test]
    fn test_sub_weights_must_sum_to_one() {
        let mut cfg = EngineConfig::default();
        cfg.normalizer = NormalizerConfig::empty().with_rule(
            "Profile",
            ScaleRule::Composite {
                parts: vec![
                    SubFieldRule::new("a", 0.5, 10.0, Direction::Direct),
                    SubFieldRule::new("b", 0.4, 10.0, Direction::Direct),
                ],
            },
        );
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("sum to"));
    }

    #[test]
    fn test_non_positive_ceiling_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.normalizer =
            NormalizerConfig::empty().with_rule("Staff", ScaleRule::linear(0.0, Direction::Direct));
        assert!(matches!(
            cfg.validate().unwrap_err(),
            TenderError::InvalidConfig(_)
        ));
    }

    #[test]
    fn test_inverted_severity_bands_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.severity = SeverityBands {
            elevated_pct: 60.0,
            critical_pct: 50.0,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_partial_json_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(
            &path,
            r#"{
                "tukey_multiplier": 3.0,
                "normalizer": { "rules": { "Staff": { "type": "linear", "ceiling": 100, "direction": "direct" } } }
            }"#,
        )
        .unwrap();

        let cfg = EngineConfig::from_json_file(&path).unwrap();
        assert_eq!(cfg.tukey_multiplier, 3.0);
        assert_eq!(cfg.weight_tolerance, 5.0);
        assert_eq!(cfg.source_timeout(), Duration::from_secs(10));
        assert_eq!(
            cfg.normalizer.rule_for("Staff"),
            &ScaleRule::linear(100.0, Direction::Direct)
        );
    }
}
