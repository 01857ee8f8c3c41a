use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, ValueEnum};
use creditgate_core::config::AppConfig;
use creditgate_core::{
    ApplicationError, DecisionEngine, DecisionRequest, DecisionResult,
    DeterministicDecisionEngine, ExposureFigures, PolicyFlags, RoleLimits, Segment,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info_span;
use uuid::Uuid;

use crate::commands::{CommandResult, EXIT_INTERNAL, EXIT_VALIDATION};
use crate::render;

const COMMAND: &str = "decide";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SegmentArg {
    #[default]
    Private,
    Business,
    Both,
}

impl From<SegmentArg> for Segment {
    fn from(value: SegmentArg) -> Self {
        match value {
            SegmentArg::Private => Segment::Private,
            SegmentArg::Business => Segment::Business,
            SegmentArg::Both => Segment::Both,
        }
    }
}

#[derive(Clone, Debug, Default, Args)]
pub struct DecideArgs {
    #[arg(
        long,
        value_name = "PATH",
        help = "Read the whole request as JSON from a file, or `-` for stdin"
    )]
    pub request: Option<PathBuf>,
    #[arg(long, help = "Current total exposure (defaults to the sum of current components)")]
    pub previous_total: Option<Decimal>,
    #[arg(long, help = "Total exposure after the change (defaults to the sum of new components)")]
    pub new_total: Option<Decimal>,
    #[arg(long)]
    pub previous_bank: Option<Decimal>,
    #[arg(long)]
    pub new_bank: Option<Decimal>,
    #[arg(long)]
    pub previous_mortgage: Option<Decimal>,
    #[arg(long)]
    pub new_mortgage: Option<Decimal>,
    #[arg(long, help = "Exposure of the customer's whole group")]
    pub group_exposure: Option<Decimal>,
    #[arg(long, help = "Include a bank facility (selected by default when no facility is given)")]
    pub bank: bool,
    #[arg(long, help = "Include a mortgage facility")]
    pub mortgage: bool,
    #[arg(long, help = "The case has previously been approved by Credit")]
    pub approved_by_credit_before: bool,
    #[arg(long, value_enum, default_value_t = SegmentArg::Private)]
    pub segment: SegmentArg,
    #[arg(long)]
    pub new_business_customer: bool,
    #[arg(long, help = "Mortgage is on an owner-occupied home or vacation home")]
    pub owner_occupied: bool,
    #[arg(long, value_name = "PCT", help = "Loan-to-value in percent")]
    pub ltv: Option<Decimal>,
    #[arg(long)]
    pub debt_factor: Option<Decimal>,
    #[arg(
        long,
        value_delimiter = ',',
        value_name = "ADVISOR,BUSINESS_MANAGER,BRANCH_DIRECTOR",
        help = "Role ceilings for this request, overriding the configured ones"
    )]
    pub limits: Option<Vec<Decimal>>,
    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,
}

#[derive(Serialize)]
struct DecisionOutput<'a> {
    command: &'static str,
    status: &'static str,
    correlation_id: &'a str,
    decision: &'a DecisionResult,
}

pub fn run(args: &DecideArgs, config: &AppConfig) -> CommandResult {
    let correlation_id = Uuid::new_v4().to_string();
    let span = info_span!("decide", correlation_id = %correlation_id);
    let _entered = span.enter();

    let request = match build_request(args) {
        Ok(request) => request,
        Err(error) => {
            return CommandResult::failure_with_correlation(
                COMMAND,
                "validation",
                format!("{error:#}"),
                EXIT_VALIDATION,
                Some(correlation_id),
            );
        }
    };

    let engine = DeterministicDecisionEngine::new(config.engine.clone());
    let decision = match engine.decide(&request) {
        Ok(decision) => decision,
        Err(error) => {
            let interface = ApplicationError::from(error).into_interface(correlation_id.clone());
            return CommandResult::failure_with_correlation(
                COMMAND,
                interface.error_class(),
                interface.to_string(),
                EXIT_VALIDATION,
                Some(interface.correlation_id().to_string()),
            );
        }
    };

    if !args.json {
        return CommandResult { exit_code: 0, output: render::decision_report(&request, &decision) };
    }

    let payload = DecisionOutput {
        command: COMMAND,
        status: "ok",
        correlation_id: &correlation_id,
        decision: &decision,
    };
    match serde_json::to_string_pretty(&payload) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure_with_correlation(
            COMMAND,
            "serialization",
            error.to_string(),
            EXIT_INTERNAL,
            Some(correlation_id),
        ),
    }
}

pub fn build_request(args: &DecideArgs) -> anyhow::Result<DecisionRequest> {
    if let Some(source) = &args.request {
        let raw = read_request_source(source)?;
        return DecisionRequest::from_json(&raw).map_err(|error| match error {
            ApplicationError::Serialization(message) => anyhow::anyhow!(message),
            other => anyhow::Error::new(other),
        });
    }

    let previous_components = [args.previous_bank, args.previous_mortgage];
    let new_components = [args.new_bank, args.new_mortgage];

    let previous_total = args.previous_total.unwrap_or_else(|| sum(&previous_components));
    let Some(new_total) = args.new_total.or_else(|| {
        new_components.iter().any(Option::is_some).then(|| sum(&new_components))
    }) else {
        bail!("--new-total is required unless new components or --request are given");
    };

    let (previous_bank, previous_mortgage) =
        split(previous_total, args.previous_bank, args.previous_mortgage);
    let (new_bank, new_mortgage) = split(new_total, args.new_bank, args.new_mortgage);
    let exposure = ExposureFigures {
        previous_total,
        new_total,
        previous_bank,
        new_bank,
        previous_mortgage,
        new_mortgage,
        group_exposure: args.group_exposure,
    };

    let is_bank_facility = args.bank || !args.mortgage;
    let flags = PolicyFlags {
        is_bank_facility,
        is_mortgage_facility: args.mortgage,
        approved_by_credit_before: args.approved_by_credit_before,
        segment: args.segment.into(),
        is_new_business_customer: args.new_business_customer,
        owner_occupied_or_vacation_home: args.owner_occupied,
        loan_to_value_pct: args.ltv,
        debt_factor: args.debt_factor,
    };

    let mut request = DecisionRequest::new(exposure, flags);
    if let Some(limits) = &args.limits {
        let values: [Decimal; 3] = limits
            .as_slice()
            .try_into()
            .context("--limits takes exactly three ceilings")?;
        request = request.with_limits(RoleLimits::from_array(values));
    }

    Ok(request)
}

fn read_request_source(source: &Path) -> anyhow::Result<String> {
    if source == Path::new("-") {
        let mut raw = String::new();
        io::stdin().read_to_string(&mut raw).context("could not read request from stdin")?;
        return Ok(raw);
    }

    fs::read_to_string(source)
        .with_context(|| format!("could not read request file `{}`", source.display()))
}

fn sum(values: &[Option<Decimal>]) -> Decimal {
    values.iter().flatten().copied().sum()
}

/// A single given component leaves the rest of the total to the other one.
fn split(total: Decimal, bank: Option<Decimal>, mortgage: Option<Decimal>) -> (Decimal, Decimal) {
    match (bank, mortgage) {
        (Some(bank), None) if bank <= total => (bank, total - bank),
        (None, Some(mortgage)) if mortgage <= total => (total - mortgage, mortgage),
        (bank, mortgage) => (bank.unwrap_or_default(), mortgage.unwrap_or_default()),
    }
}
