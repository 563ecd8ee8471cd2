//! Ticket records as delivered by the intake pipeline.
//!
//! Tickets arrive already normalized (mail, chat and LLM cleanup happen
//! upstream). This module only fixes the record shape and rejects records
//! that would confuse the bundling and routing core: empty required text,
//! blank optional text, and duplicate identifiers.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::TicketError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketSeverity {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Admin,
    Technician,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketKind {
    #[default]
    Known,
    Ambiguous,
    Dispatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Manual,
    Slack,
    Email,
}

/// A work-order ticket.
///
/// Only the fields the core reads are modelled; anything else in the JSON
/// payload is ignored on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub severity: TicketSeverity,
    pub team: Team,
    #[serde(default)]
    pub kind: TicketKind,
    pub eta: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload: Option<String>,
    /// Free text in the form "Level · Area".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_group: Option<String>,
    #[serde(default)]
    pub affected_systems: Vec<String>,
    #[serde(default)]
    pub affected_servers: Vec<String>,
}

impl Ticket {
    /// Creates a ticket with the required fields; everything else empty.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        severity: TicketSeverity,
        team: Team,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            severity,
            team,
            kind: TicketKind::Known,
            eta: "Unscheduled".to_string(),
            tags: Vec::new(),
            summary: String::new(),
            queue: None,
            owner: None,
            status: None,
            channel: None,
            location: None,
            customer: None,
            details: None,
            workload: None,
            floor: None,
            parallel_group: None,
            affected_systems: Vec::new(),
            affected_servers: Vec::new(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_eta(mut self, eta: impl Into<String>) -> Self {
        self.eta = eta.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_kind(mut self, kind: TicketKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_customer(mut self, customer: impl Into<String>) -> Self {
        self.customer = Some(customer.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_floor(mut self, floor: impl Into<String>) -> Self {
        self.floor = Some(floor.into());
        self
    }

    pub fn with_workload(mut self, workload: impl Into<String>) -> Self {
        self.workload = Some(workload.into());
        self
    }

    pub fn with_affected_system(mut self, system: impl Into<String>) -> Self {
        self.affected_systems.push(system.into());
        self
    }

    pub fn with_affected_server(mut self, server: impl Into<String>) -> Self {
        self.affected_servers.push(server.into());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate.eq_ignore_ascii_case(tag))
    }
}

/// A single rejected ticket field.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Position of the ticket in the submitted list.
    pub index: usize,
    pub field: &'static str,
    pub kind: ValidationErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A required text field is empty or whitespace.
    EmptyField,
    /// An optional text field is present but blank.
    BlankOptional,
    /// Two tickets share the same id.
    DuplicateId,
}

impl ValidationError {
    fn new(index: usize, field: &'static str, kind: ValidationErrorKind) -> Self {
        let message = match kind {
            ValidationErrorKind::EmptyField => {
                format!("Ticket {index} field \"{field}\" must be a non-empty string")
            }
            ValidationErrorKind::BlankOptional => format!(
                "Ticket {index} field \"{field}\" must be a non-empty string when provided"
            ),
            ValidationErrorKind::DuplicateId => {
                format!("Ticket {index} field \"{field}\" duplicates an earlier ticket")
            }
        };
        Self {
            index,
            field,
            kind,
            message,
        }
    }
}

/// Checks every ticket and reports all offending fields at once.
pub fn validate_tickets(tickets: &[Ticket]) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen_ids = HashSet::new();

    for (index, ticket) in tickets.iter().enumerate() {
        let required = [
            ("id", &ticket.id),
            ("title", &ticket.title),
            ("eta", &ticket.eta),
            ("summary", &ticket.summary),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                errors.push(ValidationError::new(index, field, ValidationErrorKind::EmptyField));
            }
        }

        let optional = [
            ("queue", &ticket.queue),
            ("owner", &ticket.owner),
            ("status", &ticket.status),
            ("location", &ticket.location),
            ("customer", &ticket.customer),
            ("details", &ticket.details),
            ("workload", &ticket.workload),
            ("floor", &ticket.floor),
            ("parallelGroup", &ticket.parallel_group),
        ];
        for (field, value) in optional {
            if value.as_deref().is_some_and(|text| text.trim().is_empty()) {
                errors.push(ValidationError::new(
                    index,
                    field,
                    ValidationErrorKind::BlankOptional,
                ));
            }
        }

        if !ticket.id.trim().is_empty() && !seen_ids.insert(ticket.id.as_str()) {
            errors.push(ValidationError::new(index, "id", ValidationErrorKind::DuplicateId));
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Decodes a JSON array of tickets and validates it.
pub fn decode_tickets(json: &str) -> Result<Vec<Ticket>, TicketError> {
    let tickets: Vec<Ticket> = serde_json::from_str(json)?;
    validate_tickets(&tickets).map_err(TicketError::Invalid)?;
    Ok(tickets)
}
