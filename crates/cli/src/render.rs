use creditgate_core::{DecisionRequest, DecisionResult, RoleLimits};
use rust_decimal::{Decimal, RoundingStrategy};

/// Whole kroner with `.` as thousands separator, e.g. `28.000.000 kr`.
pub fn format_dkk(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{sign}{grouped} kr")
}

fn format_ceilings(limits: &RoleLimits) -> String {
    limits.as_array().map(format_dkk).join(" / ")
}

pub fn decision_report(request: &DecisionRequest, decision: &DecisionResult) -> String {
    let exposure = &request.exposure;
    let mut lines = vec![
        format!("Approver: {}", decision.headline()),
        format!("Rule: {}", decision.rule.as_str()),
        format!("Current exposure: {}", format_dkk(exposure.previous_total)),
        format!("New exposure: {}", format_dkk(exposure.new_total)),
        format!("Increase: {}", format_dkk(decision.increase)),
    ];

    let used = &decision.limits_used;
    if let Some(bank) = &used.bank {
        lines.push(format!("Ceilings (bank): {}", format_ceilings(bank)));
    }
    if let Some(caps) = &used.bank_component_caps {
        lines.push(format!("Bank share caps: {}", format_ceilings(caps)));
    }
    if let Some(mortgage) = &used.mortgage {
        lines.push(format!("Ceilings (mortgage): {}", format_ceilings(mortgage)));
    }

    let flags = &decision.flags;
    let active: Vec<&str> = [
        (flags.half_rule_active, "half rule"),
        (flags.addon_active, "supplementary authority"),
        (flags.risk_override_active, "risk loan override"),
        (flags.joint_approval_required, "joint approval"),
        (flags.limits_corrected, "limits corrected"),
    ]
    .into_iter()
    .filter_map(|(active, label)| active.then_some(label))
    .collect();
    if !active.is_empty() {
        lines.push(format!("Flags: {}", active.join(", ")));
    }

    lines.push("Rationale:".to_string());
    lines.extend(decision.rationale.iter().map(|line| format!("- {line}")));

    if !decision.advisories.is_empty() {
        lines.push("Advisories:".to_string());
        lines.extend(
            decision.advisories.iter().map(|advisory| format!("- {}", advisory.message())),
        );
    }

    lines.join("\n")
}
