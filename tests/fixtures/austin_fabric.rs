//! Austin Fabric reference facility and ticket backlog.
//!
//! Every floor is 10 x 6 with a single elevator pad at (0, 0), so rides
//! always land on the pad directly above or below.
//!
//! Tile legend: 0 walkway, 1 rack, 2 wall, 3 CRAH, 4 hot aisle, 5 cold aisle,
//! 6 inventory cage, 7 elevator, 8 power room, 9 ops desk, 10 service bay.

use fabric_dispatch::facility::{
    Cluster, ClusterIndex, ClusterMatchers, FacilityDefinition, Floor, GridCoord, InventoryItem,
};
use fabric_dispatch::pathfinding::{FacilityGraph, PathCosts};
use fabric_dispatch::ticket::{Team, Ticket, TicketKind, TicketSeverity};

// ============================================================================
// Floors
// ============================================================================

fn floor(id: &str, label: &str, grid: Vec<Vec<u8>>) -> Floor {
    Floor {
        label: label.to_string(),
        ..Floor::from_grid(id, grid)
    }
}

pub fn level_one() -> Floor {
    floor(
        "L1",
        "Level 1 · Intake",
        vec![
            vec![7, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            vec![0, 0, 1, 1, 1, 1, 1, 1, 0, 0],
            vec![9, 0, 5, 5, 5, 5, 5, 5, 0, 0],
            vec![0, 0, 1, 1, 1, 1, 1, 1, 0, 10],
            vec![0, 6, 4, 4, 4, 4, 4, 4, 0, 0],
            vec![2, 2, 2, 2, 2, 2, 2, 2, 2, 2],
        ],
    )
}

pub fn level_two() -> Floor {
    floor(
        "L2",
        "Level 2 · Network",
        vec![
            vec![7, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            vec![0, 6, 1, 1, 1, 1, 1, 1, 0, 0],
            vec![0, 0, 5, 5, 5, 5, 5, 5, 0, 0],
            vec![0, 0, 1, 1, 1, 1, 1, 1, 0, 0],
            vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            vec![2, 2, 2, 2, 2, 2, 2, 2, 2, 2],
        ],
    )
}

pub fn level_three() -> Floor {
    floor(
        "L3",
        "Level 3 · Cooling",
        vec![
            vec![7, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            vec![0, 6, 3, 3, 0, 1, 1, 1, 0, 0],
            vec![0, 0, 0, 0, 0, 5, 5, 5, 0, 0],
            vec![0, 0, 8, 8, 0, 1, 1, 1, 0, 0],
            vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            vec![2, 2, 2, 2, 2, 2, 2, 2, 2, 2],
        ],
    )
}

// ============================================================================
// Clusters
// ============================================================================

pub fn clusters() -> Vec<Cluster> {
    vec![
        Cluster::new("desk", "Ops desk", "L1", GridCoord::new(0, 2)),
        Cluster::new("power-cage", "Power cage", "L1", GridCoord::new(1, 4))
            .stocking(&[InventoryItem::Psu, InventoryItem::InstallKit]),
        Cluster::new("rack-n09", "Rack N09", "L1", GridCoord::new(8, 1)),
        Cluster::new("row7-diagnostics", "Row 7 diagnostics", "L1", GridCoord::new(5, 2)),
        Cluster::new("service-bay", "Service bay", "L1", GridCoord::new(9, 3))
            .stocking(&[InventoryItem::DiagnosticPack]),
        Cluster::new("plant-chill", "Chiller plant", "L1", GridCoord::new(9, 0)),
        Cluster::new("inventory-l2-cache", "Fiber cache", "L2", GridCoord::new(1, 1))
            .stocking(&[InventoryItem::Qsfp, InventoryItem::FiberKit]),
        Cluster::new("spine-06", "Spine 06", "L2", GridCoord::new(6, 2)),
        Cluster::new("bundle-44b", "Patch panel 44B", "L2", GridCoord::new(8, 4)),
        Cluster::new("cooling-cage", "Cooling cage", "L3", GridCoord::new(1, 1))
            .stocking(&[InventoryItem::CoolingKit, InventoryItem::Sensor]),
        Cluster::new("cooling-manifold", "Cooling manifold", "L3", GridCoord::new(4, 2)),
        Cluster::new("delta-loop", "Delta loop", "L3", GridCoord::new(6, 2)),
    ]
}

pub fn austin_fabric() -> FacilityDefinition {
    FacilityDefinition {
        floors: vec![level_one(), level_two(), level_three()],
        tiles: None,
        clusters: clusters(),
        matchers: None,
        costs: PathCosts::default(),
    }
}

pub fn facility_graph() -> FacilityGraph {
    FacilityGraph::from_definition(&austin_fabric()).expect("reference facility is well formed")
}

pub fn cluster_index() -> ClusterIndex {
    austin_fabric().cluster_index()
}

pub fn matchers() -> ClusterMatchers {
    ClusterMatchers::default()
}

// ============================================================================
// Tickets
// ============================================================================

pub fn technician_ticket(id: &str, title: &str, severity: TicketSeverity) -> Ticket {
    Ticket::new(id, title, severity, Team::Technician)
        .with_summary(format!("{title} (dispatch)"))
        .with_eta("Today 14:00-16:00")
}

pub fn admin_ticket(id: &str, title: &str, severity: TicketSeverity) -> Ticket {
    Ticket::new(id, title, severity, Team::Admin)
        .with_summary(format!("{title} (queue)"))
        .with_eta("Today 09:00-10:00")
}

/// Technician work orders. WO-4106 matches no cluster.
pub fn technician_backlog() -> Vec<Ticket> {
    vec![
        technician_ticket("WO-4101", "Swap QSFP on Spine 6", TicketSeverity::High)
            .with_summary("CRC bursts on uplink 3")
            .with_tag("optics")
            .with_floor("Level 2 · Spine row"),
        technician_ticket("WO-4102", "Re-terminate patch panel 44B", TicketSeverity::Medium)
            .with_summary("Fiber loss above budget on 44B")
            .with_tag("cabling"),
        technician_ticket("WO-4103", "Bleed delta loop sensors", TicketSeverity::High)
            .with_summary("Pressure drift on the delta pod")
            .with_tag("cooling")
            .with_tag("sensors"),
        technician_ticket("WO-4104", "Replace PSU on rack N09", TicketSeverity::Critical)
            .with_summary("PSU B failed, rack on single feed")
            .with_tag("power"),
        technician_ticket("WO-4105", "LiDAR calibration run", TicketSeverity::Low)
            .with_summary("Robot cart drifting near the service bay")
            .with_tag("robotics"),
        technician_ticket("WO-4106", "Badge audit for contractors", TicketSeverity::Medium)
            .with_summary("Walk the cage with security"),
        technician_ticket("WO-4107", "Check coolant pressure", TicketSeverity::Medium)
            .with_summary("Gauge reads low after maintenance")
            .with_tag("cooling")
            .with_floor("Level 3 · Manifold"),
    ]
}

pub fn admin_backlog() -> Vec<Ticket> {
    vec![
        admin_ticket("T-2001", "Provision GPU quota", TicketSeverity::High).with_customer("Acme"),
        admin_ticket("T-2002", "Allocate storage cluster", TicketSeverity::High)
            .with_customer("Acme"),
        admin_ticket("T-2003", "Update firewall policy", TicketSeverity::Medium)
            .with_kind(TicketKind::Ambiguous),
        admin_ticket("T-2004", "Grant dashboard access", TicketSeverity::Medium),
        admin_ticket("T-2005", "Emergency incident bridge", TicketSeverity::High),
    ]
}

pub fn ticket_backlog() -> Vec<Ticket> {
    let mut tickets = admin_backlog();
    tickets.extend(technician_backlog());
    tickets
}
