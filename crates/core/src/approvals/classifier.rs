use rust_decimal::Decimal;

use crate::approvals::half_rule::{half_rule_applies, HalfRuleMode};
use crate::domain::decision::{Approver, LimitsUsed};
use crate::domain::exposure::ExposureFigures;
use crate::domain::limits::RoleLimits;
use crate::domain::policy::PolicyFlags;

/// Lowest local role whose ceiling covers `total`; Credit above the top one.
/// `limits` must already be normalized.
pub fn classify(limits: &RoleLimits, total: Decimal) -> Approver {
    limits
        .tiers()
        .into_iter()
        .find(|(_, ceiling)| total <= *ceiling)
        .map(|(role, _)| role)
        .unwrap_or(Approver::Credit)
}

/// Like [`classify`], but the candidate role must also cover the bank
/// component at half its ceiling.
pub fn classify_with_bank_share(limits: &RoleLimits, total: Decimal, bank: Decimal) -> Approver {
    limits
        .tiers()
        .into_iter()
        .find(|(_, ceiling)| total <= *ceiling && bank <= *ceiling / Decimal::TWO)
        .map(|(role, _)| role)
        .unwrap_or(Approver::Credit)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseClassification {
    pub approver: Approver,
    pub bank: Option<Approver>,
    pub mortgage: Option<Approver>,
    pub half_rule_active: bool,
    pub limits_used: LimitsUsed,
}

/// Classifies every selected facility track and keeps the stricter result.
pub fn classify_tracks(
    limits: &RoleLimits,
    exposure: &ExposureFigures,
    flags: &PolicyFlags,
    mode: HalfRuleMode,
) -> BaseClassification {
    let half_rule_active = half_rule_applies(flags);
    let mut limits_used = LimitsUsed::default();

    let bank = flags.is_bank_facility.then(|| match (half_rule_active, mode) {
        (true, HalfRuleMode::HalveCeilings) => {
            let halved = limits.halved();
            limits_used.bank = Some(halved);
            classify(&halved, exposure.new_total)
        }
        (true, HalfRuleMode::BankShare) => {
            limits_used.bank = Some(*limits);
            limits_used.bank_component_caps = Some(limits.halved());
            classify_with_bank_share(limits, exposure.new_total, exposure.new_bank)
        }
        (false, _) => {
            limits_used.bank = Some(*limits);
            classify(limits, exposure.new_total)
        }
    });

    let mortgage = flags.is_mortgage_facility.then(|| {
        limits_used.mortgage = Some(*limits);
        classify(limits, exposure.new_total)
    });

    // Validation guarantees at least one track; Credit is the safe fallback.
    let approver = bank.into_iter().chain(mortgage).max().unwrap_or(Approver::Credit);

    BaseClassification { approver, bank, mortgage, half_rule_active, limits_used }
}
