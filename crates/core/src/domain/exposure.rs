use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::policy::PolicyFlags;
use crate::errors::ValidationError;

/// Current and proposed exposure for one customer, in DKK.
///
/// A total is `bank + mortgage`. Components left at zero mean no breakdown was
/// given for that side; [`ExposureFigures::with_derived_breakdown`] then books
/// the total on the selected facility.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureFigures {
    pub previous_total: Decimal,
    pub new_total: Decimal,
    #[serde(default)]
    pub previous_bank: Decimal,
    #[serde(default)]
    pub new_bank: Decimal,
    #[serde(default)]
    pub previous_mortgage: Decimal,
    #[serde(default)]
    pub new_mortgage: Decimal,
    #[serde(default)]
    pub group_exposure: Option<Decimal>,
}

impl ExposureFigures {
    pub fn from_totals(previous_total: Decimal, new_total: Decimal) -> Self {
        Self { previous_total, new_total, ..Self::default() }
    }

    pub fn from_components(
        previous_bank: Decimal,
        new_bank: Decimal,
        previous_mortgage: Decimal,
        new_mortgage: Decimal,
    ) -> Self {
        Self {
            previous_total: previous_bank + previous_mortgage,
            new_total: new_bank + new_mortgage,
            previous_bank,
            new_bank,
            previous_mortgage,
            new_mortgage,
            group_exposure: None,
        }
    }

    pub fn with_group_exposure(mut self, group_exposure: Decimal) -> Self {
        self.group_exposure = Some(group_exposure);
        self
    }

    /// Growth applied for; a reduction reports zero.
    pub fn increase(&self) -> Decimal {
        (self.new_total - self.previous_total).max(Decimal::ZERO)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let figures = [
            ("previous_total", self.previous_total),
            ("new_total", self.new_total),
            ("previous_bank", self.previous_bank),
            ("new_bank", self.new_bank),
            ("previous_mortgage", self.previous_mortgage),
            ("new_mortgage", self.new_mortgage),
        ];

        let negative = figures.into_iter().find(|(_, value)| *value < Decimal::ZERO);
        if let Some((field, value)) = negative {
            return Err(ValidationError::NegativeExposure { field, value });
        }

        if let Some(group_exposure) = self.group_exposure {
            if group_exposure < Decimal::ZERO {
                return Err(ValidationError::NegativeExposure {
                    field: "group_exposure",
                    value: group_exposure,
                });
            }
        }

        if self.new_total <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveNewTotal { new_total: self.new_total });
        }

        check_breakdown(
            "previous",
            self.previous_total,
            self.previous_bank,
            self.previous_mortgage,
        )?;
        check_breakdown("new", self.new_total, self.new_bank, self.new_mortgage)
    }

    /// Fills in a missing breakdown from the selected facilities. A single
    /// facility takes the whole total; with both selected and no split given the
    /// total counts as bank exposure, the stricter reading for the bank rules.
    pub fn with_derived_breakdown(&self, flags: &PolicyFlags) -> Self {
        let (previous_bank, previous_mortgage) =
            derive_split(self.previous_total, self.previous_bank, self.previous_mortgage, flags);
        let (new_bank, new_mortgage) =
            derive_split(self.new_total, self.new_bank, self.new_mortgage, flags);

        Self {
            previous_bank,
            previous_mortgage,
            new_bank,
            new_mortgage,
            ..self.clone()
        }
    }
}

fn has_breakdown(bank: Decimal, mortgage: Decimal) -> bool {
    !bank.is_zero() || !mortgage.is_zero()
}

fn check_breakdown(
    side: &'static str,
    total: Decimal,
    bank: Decimal,
    mortgage: Decimal,
) -> Result<(), ValidationError> {
    if has_breakdown(bank, mortgage) && bank + mortgage != total {
        return Err(ValidationError::BreakdownMismatch { side, total, bank, mortgage });
    }
    Ok(())
}

fn derive_split(
    total: Decimal,
    bank: Decimal,
    mortgage: Decimal,
    flags: &PolicyFlags,
) -> (Decimal, Decimal) {
    if has_breakdown(bank, mortgage) {
        return (bank, mortgage);
    }
    if flags.is_bank_facility {
        (total, Decimal::ZERO)
    } else {
        (Decimal::ZERO, total)
    }
}
