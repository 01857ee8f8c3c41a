//! Approval decision engine.
//!
//! Rules are evaluated in a fixed priority order and the first match decides:
//!
//! 1. risk-loan override, always the Credit Policy & Approval Board
//! 2. ten-million block crossing, back to Credit
//! 3. supplementary authority inside an already approved block
//! 4. base classification against the (possibly halved) role ceilings
//!
//! Joint approval is an overlay on whichever approver was selected.

pub mod blocks;
pub mod classifier;
pub mod half_rule;
pub mod joint;
pub mod risk;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::decision::{Advisory, Approver, DecisionFlags, DecisionResult, DecisionRule};
use crate::domain::limits::RoleLimits;
use crate::domain::request::DecisionRequest;
use crate::errors::ValidationError;

use self::blocks::{
    detect_crossing, within_supplementary_authority, BlockPosition, CrossingBoundary,
};
use self::classifier::classify_tracks;
use self::half_rule::HalfRuleMode;
use self::joint::{
    annotate_joint_approval, JointApproval, JointApprovalThresholds, JointApprovalTrigger,
};
use self::risk::{risk_loan_override_applies, RiskThresholds};

/// Every knob where rule variants diverge. Defaults halve the bank ceilings,
/// report the first crossed boundary and gate joint approval on group exposure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalPolicy {
    pub limits: RoleLimits,
    pub half_rule_mode: HalfRuleMode,
    pub crossing_boundary: CrossingBoundary,
    pub supplementary_approver: Approver,
    pub joint_approval_trigger: JointApprovalTrigger,
    pub joint_bank_threshold: Decimal,
    pub joint_secondary_threshold: Decimal,
    pub risk_ltv_threshold_pct: Decimal,
    pub risk_debt_factor_threshold: Decimal,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        let joint = JointApprovalThresholds::default();
        let risk = RiskThresholds::default();
        Self {
            limits: RoleLimits::default(),
            half_rule_mode: HalfRuleMode::default(),
            crossing_boundary: CrossingBoundary::default(),
            supplementary_approver: Approver::BranchDirector,
            joint_approval_trigger: joint.trigger,
            joint_bank_threshold: joint.new_bank,
            joint_secondary_threshold: joint.secondary,
            risk_ltv_threshold_pct: risk.loan_to_value_pct,
            risk_debt_factor_threshold: risk.debt_factor,
        }
    }
}

impl ApprovalPolicy {
    pub fn joint_thresholds(&self) -> JointApprovalThresholds {
        JointApprovalThresholds {
            new_bank: self.joint_bank_threshold,
            secondary: self.joint_secondary_threshold,
            trigger: self.joint_approval_trigger,
        }
    }

    pub fn risk_thresholds(&self) -> RiskThresholds {
        RiskThresholds {
            loan_to_value_pct: self.risk_ltv_threshold_pct,
            debt_factor: self.risk_debt_factor_threshold,
        }
    }
}

pub trait DecisionEngine: Send + Sync {
    fn decide(&self, request: &DecisionRequest) -> Result<DecisionResult, ValidationError>;
}

#[derive(Clone, Debug, Default)]
pub struct DeterministicDecisionEngine {
    policy: ApprovalPolicy,
}

impl DeterministicDecisionEngine {
    pub fn new(policy: ApprovalPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ApprovalPolicy {
        &self.policy
    }
}

impl DecisionEngine for DeterministicDecisionEngine {
    fn decide(&self, request: &DecisionRequest) -> Result<DecisionResult, ValidationError> {
        decide_with_policy(&self.policy, request)
    }
}

/// Decides with the default policy.
pub fn evaluate_decision(request: &DecisionRequest) -> Result<DecisionResult, ValidationError> {
    decide_with_policy(&ApprovalPolicy::default(), request)
}

pub fn decide_with_policy(
    policy: &ApprovalPolicy,
    request: &DecisionRequest,
) -> Result<DecisionResult, ValidationError> {
    request.validate()?;

    let flags = &request.flags;
    let exposure = &request.exposure.with_derived_breakdown(flags);
    let supplied = request.limits.unwrap_or(policy.limits);
    let normalized = supplied.normalize()?;
    let limits = normalized.limits;

    let mut rationale = Vec::new();
    let mut advisories = Vec::new();
    let mut decision_flags =
        DecisionFlags { limits_corrected: normalized.corrected, ..DecisionFlags::default() };

    if normalized.corrected {
        let advisory = Advisory::LimitsOutOfOrder { supplied, used: limits };
        warn!(
            event_name = "approval.limits.out_of_order",
            supplied = %supplied.describe(),
            used = %limits.describe(),
            "role ceilings sorted ascending"
        );
        rationale.push(advisory.message());
        advisories.push(advisory);
    }

    let base = classify_tracks(&limits, exposure, flags, policy.half_rule_mode);
    decision_flags.half_rule_active = base.half_rule_active;
    if base.half_rule_active {
        rationale.push(match policy.half_rule_mode {
            HalfRuleMode::HalveCeilings => {
                "half rule active: bank facility ceilings halved until the first Credit approval"
                    .to_string()
            }
            HalfRuleMode::BankShare => concat!(
                "half rule active: bank exposure may use at most half ",
                "of the approving role's ceiling"
            )
            .to_string(),
        });
    }
    if let Some(bank) = base.bank {
        rationale
            .push(format!("bank track: new total {} classifies as {bank}", exposure.new_total));
    }
    if let Some(mortgage) = base.mortgage {
        rationale.push(format!(
            "mortgage track: new total {} classifies as {mortgage}",
            exposure.new_total
        ));
    }

    let position = BlockPosition::of(exposure);
    let crossing = detect_crossing(position, flags, policy.crossing_boundary);

    let (approver, rule) = if risk_loan_override_applies(flags, &policy.risk_thresholds()) {
        decision_flags.risk_override_active = true;
        rationale.push(format!(
            "risk loan override: private home mortgage with loan-to-value above {}% \
             and debt factor above {}",
            policy.risk_ltv_threshold_pct, policy.risk_debt_factor_threshold
        ));
        (Approver::CreditPolicyBoard, DecisionRule::RiskLoanOverride)
    } else if let Some(boundary) = crossing {
        decision_flags.crossed_multiple = Some(boundary);
        rationale.push(format!(
            "previously approved by Credit and the new total crosses {boundary} mio.; \
             Credit must approve"
        ));
        (Approver::Credit, DecisionRule::BlockCrossing)
    } else if within_supplementary_authority(position, flags)
        && base.approver > policy.supplementary_approver
    {
        decision_flags.addon_active = true;
        rationale.push(format!(
            "supplementary authority: no new ten-million boundary crossed since the Credit \
             approval; {} may approve",
            policy.supplementary_approver
        ));
        (policy.supplementary_approver, DecisionRule::SupplementaryAuthority)
    } else {
        rationale.push(format!("base classification: {}", base.approver));
        (base.approver, DecisionRule::BaseClassification)
    };

    match annotate_joint_approval(exposure, flags, &policy.joint_thresholds(), approver) {
        JointApproval::Required => {
            decision_flags.joint_approval_required = true;
            rationale.push(
                "new business customer: joint approval by advisor and local management required"
                    .to_string(),
            );
        }
        JointApproval::AbsorbedBy(central) => {
            rationale.push(format!(
                "new business customer: joint approval requirement absorbed by {central}"
            ));
        }
        JointApproval::NotApplicable => {}
    }

    debug!(
        event_name = "approval.decision.completed",
        approver = approver.as_str(),
        rule = rule.as_str(),
        new_total = %exposure.new_total,
        half_rule_active = decision_flags.half_rule_active,
        joint_approval_required = decision_flags.joint_approval_required,
        "approval decision computed"
    );

    Ok(DecisionResult {
        approver,
        rule,
        rationale,
        flags: decision_flags,
        limits_used: base.limits_used,
        increase: exposure.increase(),
        advisories,
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{
        decide_with_policy, evaluate_decision, ApprovalPolicy, DecisionEngine,
        DeterministicDecisionEngine,
    };
    use crate::approvals::blocks::CrossingBoundary;
    use crate::approvals::half_rule::HalfRuleMode;
    use crate::approvals::joint::JointApprovalTrigger;
    use crate::domain::decision::{Advisory, Approver, DecisionRule};
    use crate::domain::exposure::ExposureFigures;
    use crate::domain::limits::RoleLimits;
    use crate::domain::policy::{PolicyFlags, Segment};
    use crate::domain::request::DecisionRequest;
    use crate::errors::ValidationError;

    fn millions(value: i64) -> Decimal {
        Decimal::new(value * 1_000_000, 0)
    }

    fn request(previous: Decimal, new: Decimal, flags: PolicyFlags) -> DecisionRequest {
        DecisionRequest::new(ExposureFigures::from_totals(previous, new), flags)
    }

    fn escalated() -> PolicyFlags {
        PolicyFlags { approved_by_credit_before: true, ..PolicyFlags::default() }
    }

    #[test]
    fn half_rule_escalates_bank_facility_before_first_credit_approval() {
        let result = evaluate_decision(&request(Decimal::ZERO, millions(4), PolicyFlags::default()))
            .expect("valid request");

        assert_eq!(result.approver, Approver::BusinessManager);
        assert_eq!(result.rule, DecisionRule::BaseClassification);
        assert!(result.flags.half_rule_active);
        assert_eq!(result.limits_used.bank, Some(RoleLimits::default().halved()));
    }

    #[test]
    fn bank_share_mode_checks_bank_component_separately() {
        let policy =
            ApprovalPolicy { half_rule_mode: HalfRuleMode::BankShare, ..ApprovalPolicy::default() };
        let both = PolicyFlags { is_mortgage_facility: true, ..PolicyFlags::default() };
        let split = |bank: i64, mortgage: i64| {
            DecisionRequest::new(
                ExposureFigures::from_components(
                    Decimal::ZERO,
                    Decimal::new(bank, 0),
                    Decimal::ZERO,
                    Decimal::new(mortgage, 0),
                ),
                both.clone(),
            )
        };

        let result = decide_with_policy(&policy, &split(2_000_000, 3_500_000)).expect("valid");
        assert_eq!(result.approver, Approver::Advisor);

        let result = decide_with_policy(&policy, &split(3_500_000, 2_000_000)).expect("valid");
        assert_eq!(result.approver, Approver::BusinessManager);
        assert_eq!(result.limits_used.bank_component_caps, Some(RoleLimits::default().halved()));
    }

    #[test]
    fn bank_share_mode_books_totals_only_request_on_bank() {
        let policy =
            ApprovalPolicy { half_rule_mode: HalfRuleMode::BankShare, ..ApprovalPolicy::default() };
        let request = request(Decimal::ZERO, Decimal::new(5_500_000, 0), PolicyFlags::default());

        let result = decide_with_policy(&policy, &request).expect("valid");
        assert_eq!(result.approver, Approver::BranchDirector);
        assert!(result.flags.half_rule_active);
    }

    #[test]
    fn contradictory_breakdown_is_rejected() {
        let mut request = request(Decimal::ZERO, millions(1), PolicyFlags::default());
        request.exposure.new_bank = millions(50);

        let error = evaluate_decision(&request).expect_err("breakdown exceeds total");
        assert!(matches!(error, ValidationError::BreakdownMismatch { side: "new", .. }));
    }

    #[test]
    fn crossing_thirty_million_goes_to_credit() {
        let result =
            evaluate_decision(&request(millions(28), millions(31), escalated())).expect("valid");

        assert_eq!(result.approver, Approver::Credit);
        assert_eq!(result.rule, DecisionRule::BlockCrossing);
        assert_eq!(result.flags.crossed_multiple, Some(30));
        assert_eq!(result.increase, millions(3));
        assert_eq!(result.headline(), "Credit (crossed 30 mio.)");
    }

    #[test]
    fn last_boundary_policy_reports_highest_crossed_multiple() {
        let policy = ApprovalPolicy {
            crossing_boundary: CrossingBoundary::Last,
            ..ApprovalPolicy::default()
        };
        let result = decide_with_policy(&policy, &request(millions(28), millions(52), escalated()))
            .expect("valid");

        assert_eq!(result.flags.crossed_multiple, Some(50));
    }

    #[test]
    fn supplementary_authority_within_same_block() {
        let result =
            evaluate_decision(&request(millions(21), millions(25), escalated())).expect("valid");

        assert_eq!(result.approver, Approver::BranchDirector);
        assert_eq!(result.rule, DecisionRule::SupplementaryAuthority);
        assert!(result.flags.addon_active);
        assert_eq!(result.flags.crossed_multiple, None);
        assert_eq!(result.headline(), "Branch Director (supplementary authority)");
    }

    #[test]
    fn supplementary_approver_is_configurable() {
        let policy = ApprovalPolicy {
            supplementary_approver: Approver::BusinessManager,
            ..ApprovalPolicy::default()
        };
        let result = decide_with_policy(&policy, &request(millions(21), millions(25), escalated()))
            .expect("valid");

        assert_eq!(result.approver, Approver::BusinessManager);
    }

    #[test]
    fn supplementary_authority_never_raises_the_base_approver() {
        let limits = RoleLimits::new(millions(6), millions(30), millions(40));
        let request =
            request(millions(21), millions(25), escalated()).with_limits(limits);
        let result = evaluate_decision(&request).expect("valid");

        assert_eq!(result.approver, Approver::BusinessManager);
        assert_eq!(result.rule, DecisionRule::BaseClassification);
        assert!(!result.flags.addon_active);
    }

    #[test]
    fn risk_override_beats_every_other_rule() {
        let flags = PolicyFlags {
            is_bank_facility: true,
            is_mortgage_facility: true,
            approved_by_credit_before: true,
            segment: Segment::Private,
            owner_occupied_or_vacation_home: true,
            loan_to_value_pct: Some(Decimal::new(75, 0)),
            debt_factor: Some(Decimal::new(5, 0)),
            ..PolicyFlags::default()
        };

        for (previous, new) in [(0, 1), (28, 31), (21, 25)] {
            let result =
                evaluate_decision(&request(millions(previous), millions(new), flags.clone()))
                    .expect("valid");
            assert_eq!(result.approver, Approver::CreditPolicyBoard);
            assert_eq!(result.rule, DecisionRule::RiskLoanOverride);
            assert!(result.flags.risk_override_active);
            assert_eq!(result.flags.crossed_multiple, None);
        }
    }

    #[test]
    fn joint_approval_annotates_local_approver() {
        let flags = PolicyFlags {
            segment: Segment::Business,
            is_new_business_customer: true,
            ..PolicyFlags::default()
        };
        let request = request(Decimal::ZERO, Decimal::new(600_000, 0), flags);

        let result = evaluate_decision(&request).expect("valid");
        assert_eq!(result.approver, Approver::Advisor);
        assert!(result.flags.joint_approval_required);
        assert!(result.rationale.iter().any(|line| line.contains("joint approval")));
        assert_eq!(result.headline(), "Advisor, joint approval required");
    }

    #[test]
    fn joint_approval_is_absorbed_by_credit() {
        let flags = PolicyFlags {
            segment: Segment::Both,
            is_new_business_customer: true,
            ..PolicyFlags::default()
        };
        let policy = ApprovalPolicy {
            joint_approval_trigger: JointApprovalTrigger::NewTotal,
            ..ApprovalPolicy::default()
        };
        let result = decide_with_policy(&policy, &request(Decimal::ZERO, millions(25), flags))
            .expect("valid");

        assert_eq!(result.approver, Approver::Credit);
        assert!(!result.flags.joint_approval_required);
        assert!(result.rationale.iter().any(|line| line.contains("absorbed by Credit")));
    }

    #[test]
    fn risk_override_applies_to_both_segment() {
        let flags = PolicyFlags {
            is_bank_facility: false,
            is_mortgage_facility: true,
            segment: Segment::Both,
            owner_occupied_or_vacation_home: true,
            loan_to_value_pct: Some(Decimal::new(61, 0)),
            debt_factor: Some(Decimal::new(41, 1)),
            ..PolicyFlags::default()
        };
        let result = evaluate_decision(&request(Decimal::ZERO, millions(3), flags)).expect("valid");

        assert_eq!(result.approver, Approver::CreditPolicyBoard);
        assert_eq!(result.rule, DecisionRule::RiskLoanOverride);
        assert!(result.flags.risk_override_active);
    }

    #[test]
    fn joint_approval_rides_on_business_manager_and_branch_director() {
        let flags = PolicyFlags {
            approved_by_credit_before: true,
            segment: Segment::Business,
            is_new_business_customer: true,
            ..PolicyFlags::default()
        };

        for (total, expected) in [(8, Approver::BusinessManager), (15, Approver::BranchDirector)] {
            let result = evaluate_decision(&request(Decimal::ZERO, millions(total), flags.clone()))
                .expect("valid");
            assert_eq!(result.approver, expected);
            assert!(result.flags.joint_approval_required);
            assert!(result.headline().ends_with(", joint approval required"));
        }
    }

    #[test]
    fn joint_approval_is_absorbed_by_credit_policy_board() {
        let flags = PolicyFlags {
            is_bank_facility: false,
            is_mortgage_facility: true,
            segment: Segment::Both,
            is_new_business_customer: true,
            owner_occupied_or_vacation_home: true,
            loan_to_value_pct: Some(Decimal::new(75, 0)),
            debt_factor: Some(Decimal::new(5, 0)),
            ..PolicyFlags::default()
        };
        let policy = ApprovalPolicy {
            joint_approval_trigger: JointApprovalTrigger::NewTotal,
            ..ApprovalPolicy::default()
        };
        let result = decide_with_policy(&policy, &request(Decimal::ZERO, millions(2), flags))
            .expect("valid");

        assert_eq!(result.approver, Approver::CreditPolicyBoard);
        assert_eq!(result.rule, DecisionRule::RiskLoanOverride);
        assert!(!result.flags.joint_approval_required);
        assert!(result
            .rationale
            .iter()
            .any(|line| line.contains("absorbed by Credit Policy & Approval Board")));
    }

    #[test]
    fn new_total_trigger_is_exclusive_at_one_million() {
        let flags = PolicyFlags {
            is_bank_facility: false,
            is_mortgage_facility: true,
            segment: Segment::Business,
            is_new_business_customer: true,
            ..PolicyFlags::default()
        };
        let policy = ApprovalPolicy {
            joint_approval_trigger: JointApprovalTrigger::NewTotal,
            ..ApprovalPolicy::default()
        };

        let at_threshold = request(Decimal::ZERO, millions(1), flags.clone());
        let result = decide_with_policy(&policy, &at_threshold).expect("valid");
        assert!(!result.flags.joint_approval_required);

        let above = request(Decimal::ZERO, Decimal::new(1_000_001, 0), flags);
        let result = decide_with_policy(&policy, &above).expect("valid");
        assert!(result.flags.joint_approval_required);
    }

    #[test]
    fn huge_jump_after_credit_approval_goes_back_to_credit() {
        let huge = Decimal::from_i128_with_scale(10_i128.pow(27), 0);
        let result = evaluate_decision(&request(millions(25), huge, escalated())).expect("valid");

        assert_eq!(result.approver, Approver::Credit);
        assert_eq!(result.rule, DecisionRule::BlockCrossing);

        let policy = ApprovalPolicy {
            crossing_boundary: CrossingBoundary::Last,
            ..ApprovalPolicy::default()
        };
        let huge = Decimal::from_i128_with_scale(2 * 10_i128.pow(25), 0);
        let result =
            decide_with_policy(&policy, &request(Decimal::ZERO, huge, escalated())).expect("valid");
        assert_eq!(result.approver, Approver::Credit);
    }

    #[test]
    fn out_of_order_limits_are_sorted_and_reported() {
        let supplied = RoleLimits::new(millions(10), millions(6), millions(20));
        let request = request(Decimal::ZERO, millions(7), escalated()).with_limits(supplied);
        let result = evaluate_decision(&request).expect("valid");

        assert!(result.flags.limits_corrected);
        assert_eq!(result.approver, Approver::BusinessManager);
        assert_eq!(
            result.advisories,
            vec![Advisory::LimitsOutOfOrder {
                supplied,
                used: RoleLimits::new(millions(6), millions(10), millions(20)),
            }]
        );
    }

    #[test]
    fn invalid_requests_are_rejected_before_deciding() {
        let error = evaluate_decision(&request(millions(1), Decimal::ZERO, PolicyFlags::default()))
            .expect_err("zero total should fail");
        assert_eq!(error, ValidationError::NonPositiveNewTotal { new_total: Decimal::ZERO });

        let flags = PolicyFlags { is_bank_facility: false, ..PolicyFlags::default() };
        let error = evaluate_decision(&request(Decimal::ZERO, millions(1), flags))
            .expect_err("no facility should fail");
        assert_eq!(error, ValidationError::NoFacilitySelected);
    }

    #[test]
    fn engine_uses_configured_policy() {
        let engine = DeterministicDecisionEngine::new(ApprovalPolicy {
            limits: RoleLimits::new(millions(1), millions(2), millions(3)),
            ..ApprovalPolicy::default()
        });
        let result =
            engine.decide(&request(Decimal::ZERO, millions(4), escalated())).expect("valid");

        assert_eq!(result.approver, Approver::Credit);
        assert_eq!(engine.policy().limits.branch_director, millions(3));
    }
}
