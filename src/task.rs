//! Task model and the ticket → task mapper.
//!
//! A [`Task`] is the bundling view of a ticket: the free-text fields are
//! reduced to a category, priority, time window and resource flags that the
//! scorer can compare. Tasks are rebuilt from tickets on every call and are
//! never mutated afterwards.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ticket::{Channel, Team, Ticket, TicketSeverity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Critical, Severity::High, Severity::Medium];

    /// Estimated hands-on minutes for a task of this severity.
    pub fn duration_minutes(self) -> u32 {
        match self {
            Severity::Critical => 45,
            Severity::High => 35,
            Severity::Medium => 25,
        }
    }
}

impl From<TicketSeverity> for Severity {
    fn from(severity: TicketSeverity) -> Self {
        match severity {
            TicketSeverity::Critical => Severity::Critical,
            TicketSeverity::High => Severity::High,
            TicketSeverity::Medium | TicketSeverity::Low => Severity::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Provisioning,
    AccessControl,
    Configuration,
    Deployment,
    Monitoring,
    Emergency,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Provisioning,
        Category::AccessControl,
        Category::Configuration,
        Category::Deployment,
        Category::Monitoring,
        Category::Emergency,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Provisioning => "PROVISIONING",
            Category::AccessControl => "ACCESS_CONTROL",
            Category::Configuration => "CONFIGURATION",
            Category::Deployment => "DEPLOYMENT",
            Category::Monitoring => "MONITORING",
            Category::Emergency => "EMERGENCY",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Standard,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Standard,
    ];

    /// Sort rank for bundling; higher goes first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Critical => 4,
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Standard => 1,
        }
    }

    /// Routing tie-break weight; lower wins.
    pub fn weight(self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Standard => 3,
        }
    }
}

impl From<TicketSeverity> for Priority {
    fn from(severity: TicketSeverity) -> Self {
        match severity {
            TicketSeverity::Critical => Priority::Critical,
            TicketSeverity::High => Priority::High,
            TicketSeverity::Medium => Priority::Medium,
            TicketSeverity::Low => Priority::Standard,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLocation {
    pub building: Option<String>,
    pub floor: Option<String>,
    pub aisle: Option<String>,
    pub rack: Option<String>,
    pub region: Option<String>,
}

/// A window of the working day in minutes since midnight.
///
/// Written as `"HH:MM-HH:MM"`, or `"Now-HH:MM"` for work that can start
/// immediately (start minute 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeWindow {
    pub starts_now: bool,
    pub start_minute: u32,
    pub end_minute: u32,
}

impl TimeWindow {
    pub fn new(start_minute: u32, end_minute: u32) -> Self {
        Self {
            starts_now: false,
            start_minute,
            end_minute,
        }
    }

    pub fn now_until(end_minute: u32) -> Self {
        Self {
            starts_now: true,
            start_minute: 0,
            end_minute,
        }
    }

    /// Parses `"HH:MM-HH:MM"` or `"Now-HH:MM"`. Returns `None` for anything else.
    pub fn parse(text: &str) -> Option<Self> {
        let (start, end) = text.trim().split_once('-')?;
        let end_minute = parse_clock(end)?;
        if start.trim().starts_with("Now") {
            return Some(Self::now_until(end_minute));
        }
        Some(Self::new(parse_clock(start)?, end_minute))
    }

    /// Minutes both windows share; zero when disjoint.
    pub fn overlap_minutes(&self, other: &TimeWindow) -> u32 {
        let start = self.start_minute.max(other.start_minute);
        let end = self.end_minute.min(other.end_minute);
        end.saturating_sub(start)
    }
}

fn parse_clock(text: &str) -> Option<u32> {
    let (hours, minutes) = text.trim().split_once(':')?;
    let hours: u32 = hours.trim().parse().ok()?;
    let minutes: u32 = minutes.trim().parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    hours.checked_mul(60)?.checked_add(minutes)
}

fn format_clock(minute: u32) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.starts_now {
            write!(f, "Now-{}", format_clock(self.end_minute))
        } else {
            write!(
                f,
                "{}-{}",
                format_clock(self.start_minute),
                format_clock(self.end_minute)
            )
        }
    }
}

impl TryFrom<String> for TimeWindow {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TimeWindow::parse(&value).ok_or_else(|| format!("invalid time window: {value}"))
    }
}

impl From<TimeWindow> for String {
    fn from(window: TimeWindow) -> Self {
        window.to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequirements {
    pub crew: Option<String>,
    pub requires_shutdown: bool,
    pub requires_vendor_access: bool,
}

/// A unit of work as seen by the bundling engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub severity: Severity,
    pub eta: String,
    pub details: String,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub location: Option<TaskLocation>,
    pub time_window: Option<TimeWindow>,
    /// Minutes.
    pub estimated_duration: u32,
    pub company: Option<String>,
    pub resources: ResourceRequirements,
    pub task_type: Option<String>,
    pub parallel_group: Option<String>,
    pub source: Option<Channel>,
}

impl Task {
    /// Creates a bare task; duration follows the severity.
    pub fn new(id: impl Into<String>, title: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            severity,
            eta: String::new(),
            details: String::new(),
            category: None,
            priority: None,
            location: None,
            time_window: None,
            estimated_duration: severity.duration_minutes(),
            company: None,
            resources: ResourceRequirements::default(),
            task_type: None,
            parallel_group: None,
            source: None,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_location(mut self, location: TaskLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = Some(window);
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn with_shutdown(mut self) -> Self {
        self.resources.requires_shutdown = true;
        self
    }

    pub fn with_vendor_access(mut self) -> Self {
        self.resources.requires_vendor_access = true;
        self
    }

    /// Critical and emergency work is always dispatched on its own.
    pub fn is_unbundleable(&self) -> bool {
        self.severity == Severity::Critical || self.category == Some(Category::Emergency)
    }
}

/// Defaults the mapper falls back to when a ticket is silent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperOptions {
    pub default_building: String,
    pub default_region: String,
    /// Used when the ETA text carries no recognizable clock time.
    pub fallback_window: TimeWindow,
    /// Used when the ETA says the work is already in progress or dispatched.
    pub in_progress_window: TimeWindow,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            default_building: "Austin Fabric".to_string(),
            default_region: "us-south".to_string(),
            fallback_window: TimeWindow::new(30, 120),
            in_progress_window: TimeWindow::now_until(60),
        }
    }
}

/// Maps a ticket to a task using default mapper options.
pub fn map_ticket(ticket: &Ticket) -> Task {
    map_ticket_with(ticket, &MapperOptions::default())
}

pub fn map_ticket_with(ticket: &Ticket, options: &MapperOptions) -> Task {
    let severity = Severity::from(ticket.severity);
    let details = match &ticket.details {
        Some(details) => format!("{} · {}", ticket.summary, details),
        None => ticket.summary.clone(),
    };

    Task {
        id: ticket.id.clone(),
        title: ticket.title.clone(),
        severity,
        eta: ticket.eta.clone(),
        details,
        category: Some(derive_category(&ticket.title, &ticket.tags)),
        priority: Some(Priority::from(ticket.severity)),
        location: Some(derive_location(ticket, options)),
        time_window: Some(derive_time_window(&ticket.eta, options)),
        estimated_duration: severity.duration_minutes(),
        company: ticket.customer.clone(),
        resources: ResourceRequirements {
            crew: Some(team_label(ticket).to_string()),
            requires_shutdown: ticket.severity == TicketSeverity::Critical
                || ticket.has_tag("power")
                || ticket.has_tag("cooling"),
            requires_vendor_access: ticket.has_tag("vendor"),
        },
        task_type: ticket.workload.clone(),
        parallel_group: ticket.parallel_group.clone(),
        source: ticket.channel,
    }
}

fn team_label(ticket: &Ticket) -> &'static str {
    match ticket.team {
        Team::Admin => "admin",
        Team::Technician => "technician",
    }
}

/// Keyword rules checked in order; first hit wins.
const CATEGORY_KEYWORDS: &[(Category, &[&str], &str)] = &[
    (Category::Emergency, &["emergency", "incident"], ""),
    (
        Category::Provisioning,
        &["provision", "allocate", "quota", "cluster"],
        "provisioning",
    ),
    (
        Category::AccessControl,
        &["permission", "access", "policy"],
        "permissions",
    ),
    (
        Category::Deployment,
        &["deploy", "container", "install"],
        "deployment",
    ),
    (
        Category::Monitoring,
        &["monitor", "dashboard", "analysis"],
        "monitoring",
    ),
    (
        Category::Configuration,
        &["config", "update", "network", "firmware"],
        "configuration",
    ),
];

pub fn derive_category(title: &str, tags: &[String]) -> Category {
    let haystack = format!("{} {}", title, tags.join(" ")).to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords, tag)| {
            keywords.iter().any(|keyword| haystack.contains(keyword))
                || (!tag.is_empty() && tags.iter().any(|candidate| candidate == tag))
        })
        .map(|(category, _, _)| *category)
        .unwrap_or(Category::Provisioning)
}

static CLOCK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}:\d{2}").expect("clock pattern compiles"));

/// Reads a time window out of loose ETA text such as "Today 14:00-15:30".
pub fn derive_time_window(eta: &str, options: &MapperOptions) -> TimeWindow {
    let normalized = eta.to_lowercase();
    if normalized.contains("progress") || normalized.contains("dispatch") {
        return options.in_progress_window;
    }

    let clocks: Vec<&str> = CLOCK_PATTERN
        .find_iter(&normalized)
        .map(|found| found.as_str())
        .collect();
    let Some(start) = clocks.first() else {
        return options.fallback_window;
    };
    let end = clocks.get(1).copied().unwrap_or("02:00");

    match (parse_clock(start), parse_clock(end)) {
        (Some(start), Some(end)) => TimeWindow::new(start, end),
        _ => options.fallback_window,
    }
}

fn derive_location(ticket: &Ticket, options: &MapperOptions) -> TaskLocation {
    let mut parts = ticket
        .floor
        .as_deref()
        .map(|floor| floor.split('·').map(|part| part.trim().to_string()).collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter();

    TaskLocation {
        building: Some(
            ticket
                .location
                .clone()
                .unwrap_or_else(|| options.default_building.clone()),
        ),
        floor: parts.next(),
        aisle: parts.next(),
        rack: None,
        region: Some(options.default_region.clone()),
    }
}

/// Minutes saved by running tasks in parallel instead of back to back.
pub fn time_saved_minutes(tasks: &[Task]) -> u32 {
    if tasks.len() < 2 {
        return 0;
    }
    let sequential: u32 = tasks.iter().map(|task| task.estimated_duration).sum();
    let longest = tasks
        .iter()
        .map(|task| task.estimated_duration)
        .max()
        .unwrap_or(0);
    sequential.saturating_sub(longest)
}
