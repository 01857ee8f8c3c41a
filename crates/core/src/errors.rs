use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::decision::Approver;

/// Reasons a request is rejected before any decision is computed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("new total exposure must be positive, got {new_total}")]
    NonPositiveNewTotal { new_total: Decimal },
    #[error("exposure figure `{field}` must not be negative, got {value}")]
    NegativeExposure { field: &'static str, value: Decimal },
    #[error("risk metric `{field}` must not be negative, got {value}")]
    NegativeRiskMetric { field: &'static str, value: Decimal },
    #[error("{side} breakdown {bank} + {mortgage} does not match the {side} total {total}")]
    BreakdownMismatch { side: &'static str, total: Decimal, bank: Decimal, mortgage: Decimal },
    #[error("no facility selected; choose bank, mortgage or both")]
    NoFacilitySelected,
    #[error("ceiling for {role} must be positive, got {value}")]
    NonPositiveLimit { role: Approver, value: Decimal },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("serialization failure: {0}")]
    Serialization(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The approval request was rejected. Check the exposure figures, flags and ceilings."
            }
            Self::Internal { .. } => "The approval engine could not complete the request.",
        }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "validation",
            Self::Internal { .. } => "internal",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. } | Self::Internal { correlation_id, .. } => {
                correlation_id
            }
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Validation(error) => Self::BadRequest {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Serialization(message) => {
                Self::BadRequest { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::errors::{ApplicationError, InterfaceError, ValidationError};

    #[test]
    fn validation_error_maps_to_bad_request_with_specific_message() {
        let interface = ApplicationError::from(ValidationError::NonPositiveNewTotal {
            new_total: Decimal::ZERO,
        })
        .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ref message,
            } if correlation_id == "req-1" && message.contains("must be positive")
        ));
        assert_eq!(interface.error_class(), "validation");
    }

    #[test]
    fn bad_request_has_user_safe_message() {
        let interface =
            ApplicationError::from(ValidationError::NoFacilitySelected).into_interface("req-2");

        assert_eq!(
            interface.user_message(),
            "The approval request was rejected. Check the exposure figures, flags and ceilings."
        );
    }

    #[test]
    fn serialization_error_is_a_bad_request() {
        let interface =
            ApplicationError::Serialization("trailing comma".to_owned()).into_interface("req-3");

        assert!(matches!(interface, InterfaceError::BadRequest { .. }));
        assert_eq!(interface.correlation_id(), "req-3");
    }

    #[test]
    fn configuration_error_maps_to_internal() {
        let interface =
            ApplicationError::Configuration("limits missing".to_owned()).into_interface("req-4");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "The approval engine could not complete the request.");
    }
}
