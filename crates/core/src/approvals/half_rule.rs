use serde::{Deserialize, Serialize};

use crate::domain::policy::PolicyFlags;

/// How bank-facility ceilings are tightened before a case's first escalation
/// to Credit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HalfRuleMode {
    /// The total is classified against every ceiling divided by two.
    #[default]
    HalveCeilings,
    /// The total is classified against the full ceilings, and the bank
    /// component alone must also stay within half of the candidate ceiling.
    BankShare,
}

impl HalfRuleMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HalveCeilings => "halve_ceilings",
            Self::BankShare => "bank_share",
        }
    }
}

/// Only bank facilities are affected, and only until Credit has approved the
/// case once. Mortgage ceilings are never halved.
pub fn half_rule_applies(flags: &PolicyFlags) -> bool {
    flags.is_bank_facility && !flags.approved_by_credit_before
}
