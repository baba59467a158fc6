//! Severity classification of a (systolic, diastolic) pair.
//!
//! Rules are data: an ordered table of predicates, first match wins, with
//! `Normal` as the residual bucket. The two modes share the predicates and
//! differ only in table order.

use super::types::{ClassificationMode, SeverityTier};

struct TierRule {
    tier: SeverityTier,
    matches: fn(i32, i32) -> bool,
}

const OPTIMAL: TierRule = TierRule {
    tier: SeverityTier::Optimal,
    matches: |sys, dia| sys < 120 && dia < 80,
};

const ELEVATED: TierRule = TierRule {
    tier: SeverityTier::Elevated,
    matches: |sys, dia| (120..=129).contains(&sys) && dia < 80,
};

const STAGE_1: TierRule = TierRule {
    tier: SeverityTier::Stage1Hypertension,
    matches: |sys, dia| (130..=139).contains(&sys) || (80..=89).contains(&dia),
};

const STAGE_2: TierRule = TierRule {
    tier: SeverityTier::Stage2Hypertension,
    matches: |sys, dia| sys >= 140 || dia >= 90,
};

const CRISIS: TierRule = TierRule {
    tier: SeverityTier::HypertensiveCrisis,
    matches: |sys, dia| sys > 180 || dia > 120,
};

static CLINICAL_RULES: [TierRule; 5] = [CRISIS, STAGE_2, STAGE_1, ELEVATED, OPTIMAL];

// CRISIS is shadowed by STAGE_2 here; kept for parity with historical results.
static LEGACY_RULES: [TierRule; 5] = [OPTIMAL, ELEVATED, STAGE_1, STAGE_2, CRISIS];

/// Classify a reading. Total over all integers; no range validation.
pub fn classify(systolic: i32, diastolic: i32, mode: ClassificationMode) -> SeverityTier {
    let rules: &[TierRule] = match mode {
        ClassificationMode::Clinical => &CLINICAL_RULES,
        ClassificationMode::Legacy => &LEGACY_RULES,
    };

    rules
        .iter()
        .find(|rule| (rule.matches)(systolic, diastolic))
        .map(|rule| rule.tier)
        .unwrap_or(SeverityTier::Normal)
}

/// Whether a reading counts as high for trend purposes (stage 2 thresholds).
pub fn is_high_reading(systolic: i32, diastolic: i32) -> bool {
    (STAGE_2.matches)(systolic, diastolic)
}
