use serde::{Deserialize, Serialize};

use crate::domain::exposure::ExposureFigures;
use crate::domain::limits::RoleLimits;
use crate::domain::policy::PolicyFlags;
use crate::errors::{ApplicationError, ValidationError};

/// One approval question. Built by the caller, read-only to the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub exposure: ExposureFigures,
    /// Overrides the engine's configured ceilings for this request.
    #[serde(default)]
    pub limits: Option<RoleLimits>,
    #[serde(default)]
    pub flags: PolicyFlags,
}

impl DecisionRequest {
    pub fn new(exposure: ExposureFigures, flags: PolicyFlags) -> Self {
        Self { exposure, limits: None, flags }
    }

    pub fn with_limits(mut self, limits: RoleLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn from_json(raw: &str) -> Result<Self, ApplicationError> {
        serde_json::from_str(raw).map_err(|error| {
            ApplicationError::Serialization(format!("invalid request json: {error}"))
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.exposure.validate()?;
        self.flags.validate()
    }
}
