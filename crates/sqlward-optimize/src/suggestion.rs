//! Optimization suggestions and their impact weighting.

use std::fmt;

/// Expected impact of an optimization, used to weight the improvement
/// factor multiplicatively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OptimizationImpact {
    Low,
    Medium,
    High,
    Critical,
}

impl OptimizationImpact {
    /// The multiplicative improvement factor for an applied rewrite.
    pub fn factor(&self) -> f64 {
        match self {
            OptimizationImpact::Low => 1.1,
            OptimizationImpact::Medium => 1.2,
            OptimizationImpact::High => 1.5,
            OptimizationImpact::Critical => 2.0,
        }
    }
}

impl fmt::Display for OptimizationImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OptimizationImpact::Low => "low",
            OptimizationImpact::Medium => "medium",
            OptimizationImpact::High => "high",
            OptimizationImpact::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

/// One optimization finding: either an applied rewrite (with before/after
/// text) or an advisory the optimizer cannot safely apply itself.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationSuggestion {
    /// What was found and, if applied, what changed.
    pub description: String,
    /// Expected impact.
    pub impact: OptimizationImpact,
    /// Whether the rewrite was actually applied to the statement.
    pub applied: bool,
    /// Statement text before the rewrite, when applied.
    pub before: Option<String>,
    /// Statement text after the rewrite, when applied.
    pub after: Option<String>,
}

impl OptimizationSuggestion {
    /// Record an applied rewrite.
    pub fn applied(
        description: impl Into<String>,
        impact: OptimizationImpact,
        before: impl Into<String>,
        after: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            impact,
            applied: true,
            before: Some(before.into()),
            after: Some(after.into()),
        }
    }

    /// Record an advisory-only finding.
    pub fn advisory(description: impl Into<String>, impact: OptimizationImpact) -> Self {
        Self {
            description: description.into(),
            impact,
            applied: false,
            before: None,
            after: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impact_factors() {
        assert_eq!(OptimizationImpact::Low.factor(), 1.1);
        assert_eq!(OptimizationImpact::Medium.factor(), 1.2);
        assert_eq!(OptimizationImpact::High.factor(), 1.5);
        assert_eq!(OptimizationImpact::Critical.factor(), 2.0);
    }
}
