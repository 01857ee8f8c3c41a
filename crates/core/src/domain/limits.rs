use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::decision::Approver;
use crate::errors::ValidationError;

/// Exposure ceilings for the three local approval roles. Anything above the
/// branch director ceiling goes to Credit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleLimits {
    pub advisor: Decimal,
    pub business_manager: Decimal,
    pub branch_director: Decimal,
}

impl Default for RoleLimits {
    fn default() -> Self {
        Self {
            advisor: Decimal::new(6_000_000, 0),
            business_manager: Decimal::new(10_000_000, 0),
            branch_director: Decimal::new(20_000_000, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NormalizedLimits {
    pub limits: RoleLimits,
    pub corrected: bool,
}

impl RoleLimits {
    pub fn new(advisor: Decimal, business_manager: Decimal, branch_director: Decimal) -> Self {
        Self { advisor, business_manager, branch_director }
    }

    pub fn from_array(values: [Decimal; 3]) -> Self {
        let [advisor, business_manager, branch_director] = values;
        Self { advisor, business_manager, branch_director }
    }

    pub fn as_array(&self) -> [Decimal; 3] {
        [self.advisor, self.business_manager, self.branch_director]
    }

    pub fn tiers(&self) -> [(Approver, Decimal); 3] {
        [
            (Approver::Advisor, self.advisor),
            (Approver::BusinessManager, self.business_manager),
            (Approver::BranchDirector, self.branch_director),
        ]
    }

    pub fn halved(&self) -> Self {
        Self::from_array(self.as_array().map(|ceiling| ceiling / Decimal::TWO))
    }

    /// Sorts the ceilings ascending. Reordering is not an error; it is reported
    /// through `corrected` so the caller can surface it. Non-positive ceilings
    /// are rejected.
    pub fn normalize(&self) -> Result<NormalizedLimits, ValidationError> {
        if let Some((role, value)) =
            self.tiers().into_iter().find(|(_, ceiling)| *ceiling <= Decimal::ZERO)
        {
            return Err(ValidationError::NonPositiveLimit { role, value });
        }

        let mut sorted = self.as_array();
        sorted.sort();
        let limits = Self::from_array(sorted);

        Ok(NormalizedLimits { limits, corrected: limits != *self })
    }

    pub fn describe(&self) -> String {
        format!("{} / {} / {}", self.advisor, self.business_manager, self.branch_director)
    }
}
