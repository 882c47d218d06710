use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Conditions under which an analysis keeps going with `None` fields instead of failing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// No price-list entry for the valve type; contract price is `None`.
    Unmapped,
    /// No historical order for the valve type; historical price is `None`.
    NoHistory,
    /// A commodity month is absent from the snapshot.
    MissingMarketData { month: u32 },
    /// The text-generation service was disabled or failed; a local summary was used.
    NarrativeUnavailable,
}

impl Degradation {
    pub fn describe(&self) -> String {
        match self {
            Self::Unmapped => "valve type is not in the price list".to_string(),
            Self::NoHistory => "no historical order for this valve type".to_string(),
            Self::MissingMarketData { month } => {
                format!("commodity data for month {month} is missing")
            }
            Self::NarrativeUnavailable => "narrative service unavailable".to_string(),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("data load failure: {0}")]
    DataLoad(String),
    #[error("unknown dataset `{0}`")]
    UnknownDataset(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::UnknownDataset(name) => Self::BadRequest {
                message: format!("unknown dataset `{name}`"),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::DataLoad(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, Degradation, InterfaceError};

    #[test]
    fn unknown_dataset_maps_to_bad_request_interface_error() {
        let interface =
            ApplicationError::UnknownDataset("invoices".to_owned()).into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
        assert_eq!(
            interface.user_message(),
            "The request could not be processed. Check inputs and try again."
        );
    }

    #[test]
    fn data_load_error_maps_to_service_unavailable() {
        let interface =
            ApplicationError::DataLoad("data dir unreadable".to_owned()).into_interface("req-3");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(interface.correlation_id(), "req-3");
    }

    #[test]
    fn degradations_serialize_with_kind_tag() {
        let json = serde_json::to_value(Degradation::MissingMarketData { month: 3 })
            .expect("serialize degradation");
        assert_eq!(json["kind"], "missing_market_data");
        assert_eq!(json["month"], 3);
        assert_eq!(Degradation::Unmapped.describe(), "valve type is not in the price list");
    }
}
