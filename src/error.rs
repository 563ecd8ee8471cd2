//! Error types for ticket intake, facility loading, and routing.

use thiserror::Error;

use crate::ticket::ValidationError;

/// Failures while fetching or decoding tickets at the intake boundary.
#[derive(Debug, Error)]
pub enum TicketError {
    #[error("ticket feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ticket payload is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{} ticket field(s) failed validation: {}", .0.len(), summarize(.0))]
    Invalid(Vec<ValidationError>),
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|err| err.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failures while loading or validating a facility definition.
#[derive(Debug, Error)]
pub enum FacilityError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("facility definition is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("floor {floor}: expected {expected}, found {found}")]
    GridShape {
        floor: String,
        expected: String,
        found: String,
    },

    #[error("duplicate floor id: {0}")]
    DuplicateFloor(String),

    #[error("duplicate cluster id: {0}")]
    DuplicateCluster(String),

    #[error("cluster {cluster} references unknown floor {floor}")]
    UnknownFloor { cluster: String, floor: String },
}

/// Configuration errors that prevent a technician route from being computed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoutingError {
    #[error("ops desk cluster '{cluster_id}' is missing from the cluster index")]
    MissingDesk { cluster_id: String },
}
