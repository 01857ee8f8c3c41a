use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    #[default]
    Private,
    Business,
    Both,
}

impl Segment {
    pub fn covers_private(self) -> bool {
        matches!(self, Self::Private | Self::Both)
    }

    pub fn covers_business(self) -> bool {
        matches!(self, Self::Business | Self::Both)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Business => "business",
            Self::Both => "both",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyFlags {
    pub is_bank_facility: bool,
    pub is_mortgage_facility: bool,
    pub approved_by_credit_before: bool,
    pub segment: Segment,
    pub is_new_business_customer: bool,
    pub owner_occupied_or_vacation_home: bool,
    pub loan_to_value_pct: Option<Decimal>,
    pub debt_factor: Option<Decimal>,
}

impl Default for PolicyFlags {
    fn default() -> Self {
        Self {
            is_bank_facility: true,
            is_mortgage_facility: false,
            approved_by_credit_before: false,
            segment: Segment::Private,
            is_new_business_customer: false,
            owner_occupied_or_vacation_home: false,
            loan_to_value_pct: None,
            debt_factor: None,
        }
    }
}

impl PolicyFlags {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.is_bank_facility && !self.is_mortgage_facility {
            return Err(ValidationError::NoFacilitySelected);
        }

        let metrics =
            [("loan_to_value_pct", self.loan_to_value_pct), ("debt_factor", self.debt_factor)];
        for (field, value) in metrics {
            if let Some(value) = value.filter(|value| *value < Decimal::ZERO) {
                return Err(ValidationError::NegativeRiskMetric { field, value });
            }
        }

        Ok(())
    }
}
