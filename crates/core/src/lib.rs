pub mod approvals;
pub mod config;
pub mod domain;
pub mod errors;

pub use rust_decimal;

pub use approvals::blocks::CrossingBoundary;
pub use approvals::half_rule::HalfRuleMode;
pub use approvals::joint::JointApprovalTrigger;
pub use approvals::{
    decide_with_policy, evaluate_decision, ApprovalPolicy, DecisionEngine,
    DeterministicDecisionEngine,
};
pub use domain::decision::{
    Advisory, Approver, DecisionFlags, DecisionResult, DecisionRule, LimitsUsed,
};
pub use domain::exposure::ExposureFigures;
pub use domain::limits::{NormalizedLimits, RoleLimits};
pub use domain::policy::{PolicyFlags, Segment};
pub use domain::request::DecisionRequest;
pub use errors::{ApplicationError, InterfaceError, ValidationError};
