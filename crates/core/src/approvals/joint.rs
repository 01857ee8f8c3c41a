use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::decision::Approver;
use crate::domain::exposure::ExposureFigures;
use crate::domain::policy::PolicyFlags;

/// Second exposure figure checked, next to the new bank exposure, before new
/// business customers need joint sign-off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointApprovalTrigger {
    #[default]
    GroupExposure,
    NewTotal,
}

impl JointApprovalTrigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GroupExposure => "group_exposure",
            Self::NewTotal => "new_total",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JointApprovalThresholds {
    pub new_bank: Decimal,
    pub secondary: Decimal,
    pub trigger: JointApprovalTrigger,
}

impl Default for JointApprovalThresholds {
    fn default() -> Self {
        Self {
            new_bank: Decimal::new(500_000, 0),
            secondary: Decimal::new(1_000_000, 0),
            trigger: JointApprovalTrigger::GroupExposure,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JointApproval {
    NotApplicable,
    Required,
    AbsorbedBy(Approver),
}

pub fn joint_approval_triggered(
    exposure: &ExposureFigures,
    flags: &PolicyFlags,
    thresholds: &JointApprovalThresholds,
) -> bool {
    if !flags.segment.covers_business() || !flags.is_new_business_customer {
        return false;
    }

    let secondary = match thresholds.trigger {
        JointApprovalTrigger::GroupExposure => exposure.group_exposure,
        JointApprovalTrigger::NewTotal => Some(exposure.new_total),
    };

    exposure.new_bank > thresholds.new_bank
        || secondary.is_some_and(|value| value > thresholds.secondary)
}

/// Overlay on an already selected approver; never changes it.
pub fn annotate_joint_approval(
    exposure: &ExposureFigures,
    flags: &PolicyFlags,
    thresholds: &JointApprovalThresholds,
    approver: Approver,
) -> JointApproval {
    if !joint_approval_triggered(exposure, flags, thresholds) {
        return JointApproval::NotApplicable;
    }

    if approver.is_central() {
        return JointApproval::AbsorbedBy(approver);
    }

    JointApproval::Required
}
