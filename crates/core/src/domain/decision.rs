use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::limits::RoleLimits;

/// Approval authorities in escalating order. `Ord` follows authority, so the
/// stricter of two approvers is simply the larger one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Approver {
    Advisor,
    BusinessManager,
    BranchDirector,
    Credit,
    CreditPolicyBoard,
}

impl Approver {
    pub fn label(self) -> &'static str {
        match self {
            Self::Advisor => "Advisor",
            Self::BusinessManager => "Business Manager",
            Self::BranchDirector => "Branch Director",
            Self::Credit => "Credit",
            Self::CreditPolicyBoard => "Credit Policy & Approval Board",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Advisor => "advisor",
            Self::BusinessManager => "business_manager",
            Self::BranchDirector => "branch_director",
            Self::Credit => "credit",
            Self::CreditPolicyBoard => "credit_policy_board",
        }
    }

    /// Central authorities sit above the local branch chain and absorb any
    /// joint sign-off requirement.
    pub fn is_central(self) -> bool {
        matches!(self, Self::Credit | Self::CreditPolicyBoard)
    }
}

impl fmt::Display for Approver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The priority step that produced the approver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    RiskLoanOverride,
    BlockCrossing,
    SupplementaryAuthority,
    BaseClassification,
}

impl DecisionRule {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RiskLoanOverride => "risk_loan_override",
            Self::BlockCrossing => "block_crossing",
            Self::SupplementaryAuthority => "supplementary_authority",
            Self::BaseClassification => "base_classification",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionFlags {
    pub half_rule_active: bool,
    pub addon_active: bool,
    pub risk_override_active: bool,
    pub joint_approval_required: bool,
    pub limits_corrected: bool,
    /// Ten-million boundary (in millions) that forced escalation to Credit.
    pub crossed_multiple: Option<u64>,
}

/// Ceilings the classifier actually compared against, per selected track.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsUsed {
    pub bank: Option<RoleLimits>,
    /// Caps on the bank component alone; only set by the bank-share half rule.
    pub bank_component_caps: Option<RoleLimits>,
    pub mortgage: Option<RoleLimits>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    LimitsOutOfOrder { supplied: RoleLimits, used: RoleLimits },
}

impl Advisory {
    pub fn message(&self) -> String {
        match self {
            Self::LimitsOutOfOrder { supplied, used } => format!(
                "role ceilings {} were not increasing and were sorted to {}",
                supplied.describe(),
                used.describe()
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionResult {
    pub approver: Approver,
    pub rule: DecisionRule,
    pub rationale: Vec<String>,
    pub flags: DecisionFlags,
    pub limits_used: LimitsUsed,
    pub increase: Decimal,
    pub advisories: Vec<Advisory>,
}

impl DecisionResult {
    /// Headline suitable for a one-line summary, e.g.
    /// `Credit (crossed 30 mio.)`.
    pub fn headline(&self) -> String {
        let mut headline = self.approver.label().to_string();
        if let Some(multiple) = self.flags.crossed_multiple {
            headline.push_str(&format!(" (crossed {multiple} mio.)"));
        } else if self.rule == DecisionRule::SupplementaryAuthority {
            headline.push_str(" (supplementary authority)");
        }
        if self.flags.joint_approval_required {
            headline.push_str(", joint approval required");
        }
        headline
    }
}
