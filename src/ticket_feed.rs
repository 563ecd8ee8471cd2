//! HTTP ticket feed adapter.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::TicketError;
use crate::ticket::{Team, Ticket, TicketKind, validate_tickets};
use crate::traits::TicketSource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TicketFeedConfig {
    pub base_url: String,
    pub path: String,
    pub timeout_secs: u64,
}

impl Default for TicketFeedConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            path: "/api/tickets".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpTicketFeed {
    config: TicketFeedConfig,
    client: reqwest::blocking::Client,
}

impl HttpTicketFeed {
    pub fn new(config: TicketFeedConfig) -> Result<Self, TicketError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn url(&self) -> String {
        format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.path
        )
    }
}

impl TicketSource for HttpTicketFeed {
    fn fetch_tickets(&self) -> Result<Vec<Ticket>, TicketError> {
        let url = self.url();
        let body = self
            .client
            .get(&url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())?;

        let tickets = decode_feed(&body)?;
        info!(url = %url, count = tickets.len(), "fetched ticket feed");
        Ok(tickets)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedPayload {
    List(Vec<Ticket>),
    Envelope { tickets: Vec<Ticket> },
}

/// Decodes a feed body, either a bare array or `{ "tickets": [...] }`.
pub fn decode_feed(body: &str) -> Result<Vec<Ticket>, TicketError> {
    let tickets = match serde_json::from_str::<FeedPayload>(body)? {
        FeedPayload::List(tickets) => tickets,
        FeedPayload::Envelope { tickets } => tickets,
    };
    if let Err(errors) = validate_tickets(&tickets) {
        warn!(failures = errors.len(), "ticket feed failed validation");
        return Err(TicketError::Invalid(errors));
    }
    Ok(tickets)
}

/// Joins cached tickets with the backlog, keeping the first ticket per id.
pub fn merge_tickets(cached: &[Ticket], backlog: &[Ticket]) -> Vec<Ticket> {
    let mut seen = HashSet::new();
    cached
        .iter()
        .chain(backlog)
        .filter(|ticket| seen.insert(ticket.id.as_str()))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The whole dispatch board, minus tickets still awaiting triage.
    Board,
    Team(Team),
}

pub fn bundle_candidates(tickets: &[Ticket], scope: Scope) -> Vec<Ticket> {
    tickets
        .iter()
        .filter(|ticket| match scope {
            Scope::Board => ticket.kind != TicketKind::Ambiguous,
            Scope::Team(team) => ticket.team == team,
        })
        .cloned()
        .collect()
}
