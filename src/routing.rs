//! Technician routing (greedy nearest-next with inventory unlocks).
//!
//! A technician bundle is walked as one loop from the ops desk and back.
//! At each turn the router looks at every task whose inventory needs are
//! already satisfied and every cluster stocking an item that is still
//! needed, prices each one with the path provider, and walks to the
//! cheapest. Equal distances go to the more urgent task; inventory stops
//! rank as standard priority.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::bundling::{Bundle, BundlingOptions, bundle_tasks};
use crate::error::RoutingError;
use crate::facility::{
    Cluster, ClusterIndex, ClusterMatchers, DESK_CLUSTER_ID, GridCoord, InventoryItem,
};
use crate::pathfinding::{FacilityCoord, PathResult};
use crate::route_path::{RoutePath, floor_transfers};
use crate::task::{Category, Priority, Task, map_ticket};
use crate::ticket::{Team, Ticket};
use crate::traits::PathProvider;

/// A bundled task with its resolved location and the kit it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianTask {
    pub task: Task,
    pub ticket: Ticket,
    /// `None` when no cluster pattern matched the ticket text.
    pub cluster: Option<Cluster>,
    pub inventory_needs: Vec<InventoryItem>,
}

impl TechnicianTask {
    pub fn new(task: Task, ticket: Ticket, clusters: &ClusterIndex, matchers: &ClusterMatchers) -> Self {
        let cluster = resolve_cluster_id(&ticket, matchers)
            .and_then(|id| clusters.get(id))
            .cloned();
        let inventory_needs = derive_inventory_needs(&ticket);
        Self {
            task,
            ticket,
            cluster,
            inventory_needs,
        }
    }

    pub fn id(&self) -> &str {
        &self.task.id
    }

    pub fn priority(&self) -> Priority {
        self.task.priority.unwrap_or(Priority::Standard)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianBundle {
    pub id: String,
    pub label: String,
    pub score: u32,
    pub reasons: Vec<String>,
    pub tasks: Vec<TechnicianTask>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopKind {
    Start,
    Task,
    Inventory,
    Elevator,
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopPriority {
    Critical,
    High,
    Standard,
}

impl From<Priority> for StopPriority {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Critical => StopPriority::Critical,
            Priority::High => StopPriority::High,
            Priority::Medium | Priority::Standard => StopPriority::Standard,
        }
    }
}

/// One narrated stop on a technician route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStop {
    pub id: String,
    pub floor_id: String,
    pub coord: GridCoord,
    pub label: String,
    pub kind: StopKind,
    pub action: String,
    pub priority: StopPriority,
    /// Cumulative meters walked on arrival.
    pub distance_meters: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianRoute {
    pub stops: Vec<RouteStop>,
    pub path: Vec<FacilityCoord>,
    pub total_distance: u32,
    /// Tasks left off the route: no cluster match, or unreachable.
    pub unresolved_tasks: Vec<TechnicianTask>,
}

/// Text the cluster matchers search, lowercased.
fn cluster_haystack(ticket: &Ticket) -> String {
    let mut parts: Vec<&str> = vec![ticket.title.as_str(), ticket.summary.as_str()];
    parts.extend(ticket.details.as_deref());
    parts.extend(ticket.floor.as_deref());
    parts.extend(ticket.affected_systems.iter().map(String::as_str));
    parts.extend(ticket.affected_servers.iter().map(String::as_str));
    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn resolve_cluster_id<'a>(ticket: &Ticket, matchers: &'a ClusterMatchers) -> Option<&'a str> {
    matchers.resolve(&cluster_haystack(ticket))
}

/// Infers the kit a ticket needs from its tags and wording.
pub fn derive_inventory_needs(ticket: &Ticket) -> Vec<InventoryItem> {
    let mut parts: Vec<&str> = vec![ticket.title.as_str(), ticket.summary.as_str()];
    parts.extend(ticket.details.as_deref());
    parts.extend(ticket.workload.as_deref());
    let text = parts.join(" ").to_lowercase();
    let mentions = |word: &str| text.contains(word);

    let mut needs = Vec::new();
    let mut need = |item: InventoryItem| {
        if !needs.contains(&item) {
            needs.push(item);
        }
    };

    if ticket.has_tag("optics") || mentions("qsfp") {
        need(InventoryItem::Qsfp);
    }
    if ticket.has_tag("cabling") || mentions("fiber") || mentions("bundle") {
        need(InventoryItem::FiberKit);
    }
    if ticket.has_tag("cooling") || ticket.has_tag("sensors") || mentions("loop") {
        need(InventoryItem::CoolingKit);
        if ticket.has_tag("sensors") {
            need(InventoryItem::Sensor);
        }
    }
    if ticket.has_tag("power") || mentions("psu") || mentions("pdu") {
        need(InventoryItem::Psu);
    }
    if ticket.has_tag("install") || ticket.has_tag("hardware") {
        need(InventoryItem::InstallKit);
    }
    if ticket.has_tag("robotics") || mentions("lidar") {
        need(InventoryItem::DiagnosticPack);
    }
    needs
}

/// Bundles technician tickets and resolves every task to the floor.
///
/// Bundles come back best-scoring first.
pub fn build_technician_bundles(
    tickets: &[Ticket],
    clusters: &ClusterIndex,
    matchers: &ClusterMatchers,
    options: &BundlingOptions,
) -> Vec<TechnicianBundle> {
    let technician: Vec<&Ticket> = tickets
        .iter()
        .filter(|ticket| ticket.team == Team::Technician)
        .collect();
    if technician.is_empty() {
        return Vec::new();
    }

    let by_id: HashMap<&str, &Ticket> = technician
        .iter()
        .map(|ticket| (ticket.id.as_str(), *ticket))
        .collect();
    let tasks: Vec<Task> = technician.iter().map(|ticket| map_ticket(ticket)).collect();
    let bundles = bundle_tasks(&tasks, options);

    let mut result: Vec<TechnicianBundle> = bundles
        .into_iter()
        .enumerate()
        .map(|(index, bundle)| {
            let label = bundle_label(index, &bundle);
            let tasks = bundle
                .tasks
                .into_iter()
                .filter_map(|task| {
                    let ticket = (*by_id.get(task.id.as_str())?).clone();
                    Some(TechnicianTask::new(task, ticket, clusters, matchers))
                })
                .collect();
            TechnicianBundle {
                id: bundle.id,
                label,
                score: bundle.score,
                reasons: bundle.reasons,
                tasks,
            }
        })
        .collect();

    result.sort_by(|a, b| b.score.cmp(&a.score));
    result
}

fn bundle_label(index: usize, bundle: &Bundle) -> String {
    let mut categories: Vec<Category> = Vec::new();
    for category in bundle.tasks.iter().filter_map(|task| task.category) {
        if !categories.contains(&category) {
            categories.push(category);
        }
    }
    let categories = if categories.is_empty() {
        "Mixed workload".to_string()
    } else {
        categories
            .iter()
            .map(|category| category.as_str())
            .collect::<Vec<_>>()
            .join(" · ")
    };
    format!("Bundle {} · {}", index + 1, categories)
}

#[derive(Debug, Clone, Copy)]
enum Target<'a> {
    Inventory(&'a Cluster),
    Task(&'a TechnicianTask, &'a Cluster),
}

impl Target<'_> {
    fn position(&self) -> FacilityCoord {
        let cluster = match self {
            Target::Inventory(cluster) => cluster,
            Target::Task(_, cluster) => cluster,
        };
        FacilityCoord {
            floor_id: cluster.floor_id.clone(),
            coord: cluster.coord,
        }
    }

    fn weight(&self) -> u8 {
        match self {
            Target::Inventory(_) => Priority::Standard.weight(),
            Target::Task(task, _) => task.priority().weight(),
        }
    }
}

struct Candidate<'a> {
    target: Target<'a>,
    path: PathResult,
}

/// Route state threaded through one [`generate_route`] call.
struct Walk<'p, P: PathProvider> {
    provider: &'p P,
    stops: Vec<RouteStop>,
    path: RoutePath,
    position: FacilityCoord,
    total_distance: u32,
    turn: u32,
}

impl<P: PathProvider> Walk<'_, P> {
    /// Moves along `segment`, narrating each elevator ride on the way.
    fn travel(&mut self, segment: &PathResult) {
        self.path.append_segment(segment);
        self.total_distance += segment.distance;
        if let Some(end) = segment.end() {
            self.position = end.clone();
        }

        for transfer in floor_transfers(segment, self.provider) {
            let stop = RouteStop {
                id: format!("elevator-{}-{}-{}", transfer.from, transfer.to, self.turn),
                floor_id: transfer.floor_id,
                coord: transfer.coord,
                label: format!("Lift A ({}→{})", transfer.from, transfer.to),
                kind: StopKind::Elevator,
                action: format!("Turn {} · Ride {} to {}", self.turn, transfer.direction, transfer.to),
                priority: StopPriority::Standard,
                distance_meters: self.total_distance,
            };
            self.push(stop);
        }
    }

    fn push(&mut self, stop: RouteStop) {
        debug!(stop = %stop.id, distance = stop.distance_meters, "route stop");
        self.stops.push(stop);
        self.turn += 1;
    }
}

/// Builds the walking loop for one technician bundle.
///
/// Fails only when the ops desk cluster is missing. Tasks without a cluster
/// or without a reachable path are returned in `unresolved_tasks`.
pub fn generate_route<P: PathProvider>(
    bundle: &TechnicianBundle,
    provider: &P,
    clusters: &ClusterIndex,
) -> Result<TechnicianRoute, RoutingError> {
    let desk = clusters
        .get(DESK_CLUSTER_ID)
        .ok_or_else(|| RoutingError::MissingDesk {
            cluster_id: DESK_CLUSTER_ID.to_string(),
        })?;
    let desk_position = FacilityCoord {
        floor_id: desk.floor_id.clone(),
        coord: desk.coord,
    };

    let mut remaining: Vec<(&TechnicianTask, &Cluster)> = Vec::new();
    let mut unresolved: Vec<TechnicianTask> = Vec::new();
    for task in &bundle.tasks {
        match &task.cluster {
            Some(cluster) => remaining.push((task, cluster)),
            None => unresolved.push(task.clone()),
        }
    }

    // Items nobody stocks cannot be fetched; treat them as on the cart.
    let mut satisfied: HashSet<InventoryItem> = remaining
        .iter()
        .flat_map(|(task, _)| task.inventory_needs.iter().copied())
        .filter(|item| clusters.stocking(*item).is_empty())
        .collect();

    let mut walk = Walk {
        provider,
        stops: Vec::new(),
        path: RoutePath::starting_at(desk_position.clone()),
        position: desk_position.clone(),
        total_distance: 0,
        turn: 0,
    };
    walk.push(RouteStop {
        id: "desk-start".to_string(),
        floor_id: desk.floor_id.clone(),
        coord: desk.coord,
        label: desk.label.clone(),
        kind: StopKind::Start,
        action: "Turn 0 · Briefing + cart checkout".to_string(),
        priority: StopPriority::Standard,
        distance_meters: 0,
    });

    while !remaining.is_empty() {
        let mut needed: Vec<InventoryItem> = Vec::new();
        for item in remaining
            .iter()
            .flat_map(|(task, _)| task.inventory_needs.iter().copied())
        {
            if !satisfied.contains(&item) && !needed.contains(&item) {
                needed.push(item);
            }
        }

        let mut targets: Vec<Target> = needed
            .iter()
            .flat_map(|item| clusters.stocking(*item))
            .map(Target::Inventory)
            .collect();
        targets.extend(
            remaining
                .iter()
                .filter(|(task, _)| task.inventory_needs.iter().all(|item| satisfied.contains(item)))
                .map(|&(task, cluster)| Target::Task(task, cluster)),
        );

        let origin = walk.position.clone();
        let candidates: Vec<Candidate> = targets
            .par_iter()
            .filter_map(|target| {
                provider
                    .find_path(&origin, &target.position())
                    .map(|path| Candidate {
                        target: *target,
                        path,
                    })
            })
            .collect();

        let Some(choice) = candidates
            .into_iter()
            .enumerate()
            .min_by_key(|(index, candidate)| (candidate.path.distance, candidate.target.weight(), *index))
            .map(|(_, candidate)| candidate)
        else {
            warn!(
                bundle = %bundle.id,
                remaining = remaining.len(),
                "no reachable stop left, ending route early"
            );
            break;
        };

        walk.travel(&choice.path);
        let turn = walk.turn;
        match choice.target {
            Target::Inventory(cluster) => {
                let mut pulled: Vec<InventoryItem> = Vec::new();
                for item in &cluster.inventory_items {
                    if satisfied.insert(*item) && !pulled.contains(item) {
                        pulled.push(*item);
                    }
                }
                let action = if pulled.is_empty() {
                    format!("Turn {turn} · Inventory check")
                } else {
                    let items: Vec<&str> = pulled.iter().map(|item| item.as_str()).collect();
                    format!("Turn {turn} · Pull {}", items.join(", "))
                };
                walk.push(RouteStop {
                    id: format!("{}-{}", cluster.id, turn),
                    floor_id: cluster.floor_id.clone(),
                    coord: cluster.coord,
                    label: cluster.label.clone(),
                    kind: StopKind::Inventory,
                    action,
                    priority: StopPriority::Standard,
                    distance_meters: walk.total_distance,
                });
            }
            Target::Task(task, cluster) => {
                walk.push(RouteStop {
                    id: format!("{}-{}", task.id(), turn),
                    floor_id: cluster.floor_id.clone(),
                    coord: cluster.coord,
                    label: task.task.title.clone(),
                    kind: StopKind::Task,
                    action: format!("Turn {turn} · {}", task.ticket.summary),
                    priority: task.priority().into(),
                    distance_meters: walk.total_distance,
                });
                remaining.retain(|(other, _)| other.id() != task.id());
            }
        }
    }

    unresolved.extend(remaining.into_iter().map(|(task, _)| task.clone()));

    if let Some(home) = provider.find_path(&walk.position, &desk_position) {
        walk.travel(&home);
    }
    let turn = walk.turn;
    walk.push(RouteStop {
        id: "desk-return".to_string(),
        floor_id: desk.floor_id.clone(),
        coord: desk.coord,
        label: desk.label.clone(),
        kind: StopKind::Return,
        action: format!("Turn {turn} · Close loop + update dispatcher"),
        priority: StopPriority::Standard,
        distance_meters: walk.total_distance,
    });

    info!(
        bundle = %bundle.id,
        stops = walk.stops.len(),
        distance = walk.total_distance,
        unresolved = unresolved.len(),
        "technician route ready"
    );
    for task in &unresolved {
        debug!(task = %task.id(), "task needs manual location tagging");
    }

    Ok(TechnicianRoute {
        stops: walk.stops,
        path: walk.path.into_points(),
        total_distance: walk.total_distance,
        unresolved_tasks: unresolved,
    })
}
