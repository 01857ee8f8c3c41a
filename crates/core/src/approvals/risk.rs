use rust_decimal::Decimal;

use crate::domain::policy::PolicyFlags;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RiskThresholds {
    pub loan_to_value_pct: Decimal,
    pub debt_factor: Decimal,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self { loan_to_value_pct: Decimal::new(60, 0), debt_factor: Decimal::new(4, 0) }
    }
}

/// High loan-to-value and high debt-factor private mortgage on a home or
/// vacation home. Both metrics must be supplied and strictly above threshold.
pub fn risk_loan_override_applies(flags: &PolicyFlags, thresholds: &RiskThresholds) -> bool {
    if !flags.segment.covers_private()
        || !flags.is_mortgage_facility
        || !flags.owner_occupied_or_vacation_home
    {
        return false;
    }

    match (flags.loan_to_value_pct, flags.debt_factor) {
        (Some(ltv), Some(debt_factor)) => {
            ltv > thresholds.loan_to_value_pct && debt_factor > thresholds.debt_factor
        }
        _ => false,
    }
}
