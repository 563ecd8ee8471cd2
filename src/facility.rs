//! Facility reference data: floors, tiles, clusters and cluster matchers.
//!
//! Floors are tile-code grids ordered bottom to top. A [`TileTable`] says
//! which codes can be walked and what they cost. Clusters are named points
//! of interest (the ops desk, inventory caches, racks) that tickets resolve
//! to through an ordered keyword table.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FacilityError;
use crate::pathfinding::PathCosts;

pub type TileCode = u8;

/// Cluster id every route starts and ends at.
pub const DESK_CLUSTER_ID: &str = "desk";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    pub x: usize,
    pub y: usize,
}

impl GridCoord {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileDefinition {
    pub code: TileCode,
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub walkable: bool,
    /// Extra meters charged for stepping onto this tile.
    #[serde(default)]
    pub penalty: u32,
    /// Elevator pads link to the pad with the same index on adjacent floors.
    #[serde(default)]
    pub elevator: bool,
}

impl TileDefinition {
    fn new(code: TileCode, label: &str, walkable: bool, penalty: u32) -> Self {
        Self {
            code,
            label: label.to_string(),
            description: String::new(),
            walkable,
            penalty,
            elevator: false,
        }
    }
}

/// Walkability and cost lookup by tile code.
///
/// Codes missing from the table are walkable at no extra cost.
#[derive(Debug, Clone, PartialEq)]
pub struct TileTable {
    tiles: Vec<TileDefinition>,
}

impl TileTable {
    pub fn new(tiles: Vec<TileDefinition>) -> Self {
        Self { tiles }
    }

    /// The tile set used by the fabric floor plans.
    pub fn standard() -> Self {
        let mut elevator = TileDefinition::new(7, "Elevator pad", true, 2);
        elevator.elevator = true;
        Self::new(vec![
            TileDefinition::new(0, "Walkway", true, 0),
            TileDefinition::new(1, "Rack row", false, 0),
            TileDefinition::new(2, "Wall", false, 0),
            TileDefinition::new(3, "CRAH unit", false, 0),
            TileDefinition::new(4, "Hot aisle", true, 1),
            TileDefinition::new(5, "Cold aisle", true, 0),
            TileDefinition::new(6, "Inventory cage", true, 0),
            elevator,
            TileDefinition::new(8, "Power room", false, 0),
            TileDefinition::new(9, "Ops desk", true, 0),
            TileDefinition::new(10, "Service bay", true, 0),
        ])
    }

    pub fn get(&self, code: TileCode) -> Option<&TileDefinition> {
        self.tiles.iter().find(|tile| tile.code == code)
    }

    pub fn is_walkable(&self, code: TileCode) -> bool {
        self.get(code).is_none_or(|tile| tile.walkable)
    }

    pub fn penalty(&self, code: TileCode) -> u32 {
        self.get(code).map_or(0, |tile| tile.penalty)
    }

    pub fn is_elevator(&self, code: TileCode) -> bool {
        self.get(code).is_some_and(|tile| tile.elevator)
    }
}

impl Default for TileTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorSize {
    pub cols: usize,
    pub rows: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Server,
    Inventory,
    Task,
    Desk,
    Elevator,
    Sensor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorAnnotation {
    pub id: String,
    pub floor_id: String,
    pub coord: GridCoord,
    pub label: String,
    pub kind: AnnotationKind,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Environmental {
    pub temp: Option<String>,
    pub airflow: Option<String>,
    pub humidity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub elevation: String,
    /// Row-major: `grid[y][x]`.
    pub grid: Vec<Vec<TileCode>>,
    pub size: FloorSize,
    #[serde(default)]
    pub annotations: Vec<FloorAnnotation>,
    #[serde(default)]
    pub environmental: Option<Environmental>,
}

impl Floor {
    /// Builds a floor whose declared size is taken from the grid itself.
    pub fn from_grid(id: impl Into<String>, grid: Vec<Vec<TileCode>>) -> Self {
        let rows = grid.len();
        let cols = grid.first().map_or(0, Vec::len);
        Self {
            id: id.into(),
            label: String::new(),
            level: String::new(),
            elevation: String::new(),
            grid,
            size: FloorSize { cols, rows },
            annotations: Vec::new(),
            environmental: None,
        }
    }

    pub fn tile(&self, coord: GridCoord) -> Option<TileCode> {
        if coord.x >= self.size.cols || coord.y >= self.size.rows {
            return None;
        }
        self.grid.get(coord.y)?.get(coord.x).copied()
    }

    pub fn validate(&self) -> Result<(), FacilityError> {
        if self.grid.len() != self.size.rows {
            return Err(FacilityError::GridShape {
                floor: self.id.clone(),
                expected: format!("{} rows", self.size.rows),
                found: format!("{} rows", self.grid.len()),
            });
        }
        for (y, row) in self.grid.iter().enumerate() {
            if row.len() != self.size.cols {
                return Err(FacilityError::GridShape {
                    floor: self.id.clone(),
                    expected: format!("{} columns in row {}", self.size.cols, y),
                    found: format!("{} columns", row.len()),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InventoryItem {
    Qsfp,
    FiberKit,
    CoolingKit,
    Sensor,
    Psu,
    InstallKit,
    DiagnosticPack,
}

impl InventoryItem {
    pub fn as_str(self) -> &'static str {
        match self {
            InventoryItem::Qsfp => "qsfp",
            InventoryItem::FiberKit => "fiber-kit",
            InventoryItem::CoolingKit => "cooling-kit",
            InventoryItem::Sensor => "sensor",
            InventoryItem::Psu => "psu",
            InventoryItem::InstallKit => "install-kit",
            InventoryItem::DiagnosticPack => "diagnostic-pack",
        }
    }
}

impl fmt::Display for InventoryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named point of interest on one floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: String,
    pub label: String,
    pub floor_id: String,
    pub coord: GridCoord,
    /// Items a technician can pull here.
    #[serde(default)]
    pub inventory_items: Vec<InventoryItem>,
}

impl Cluster {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        floor_id: impl Into<String>,
        coord: GridCoord,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            floor_id: floor_id.into(),
            coord,
            inventory_items: Vec::new(),
        }
    }

    pub fn stocking(mut self, items: &[InventoryItem]) -> Self {
        self.inventory_items.extend_from_slice(items);
        self
    }

    pub fn stocks(&self, item: InventoryItem) -> bool {
        self.inventory_items.contains(&item)
    }
}

/// Clusters in declaration order, looked up by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterIndex {
    clusters: Vec<Cluster>,
}

impl ClusterIndex {
    pub fn new(clusters: Vec<Cluster>) -> Self {
        Self { clusters }
    }

    pub fn get(&self, id: &str) -> Option<&Cluster> {
        self.clusters.iter().find(|cluster| cluster.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter()
    }

    /// Every cluster that stocks `item`, in declaration order.
    pub fn stocking(&self, item: InventoryItem) -> Vec<&Cluster> {
        self.clusters.iter().filter(|cluster| cluster.stocks(item)).collect()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

impl FromIterator<Cluster> for ClusterIndex {
    fn from_iter<I: IntoIterator<Item = Cluster>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMatcher {
    pub id: String,
    /// Lowercase substrings; any one of them selects this cluster.
    pub patterns: Vec<String>,
}

impl ClusterMatcher {
    pub fn new(id: &str, patterns: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            patterns: patterns.iter().map(|pattern| pattern.to_lowercase()).collect(),
        }
    }
}

/// Ordered keyword table mapping ticket text to a cluster id.
///
/// Evaluation is first match in table order, not best match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterMatchers {
    entries: Vec<ClusterMatcher>,
}

impl ClusterMatchers {
    /// Patterns are lowercased here, so tables loaded from JSON match the
    /// same way as built-in ones.
    pub fn new(mut entries: Vec<ClusterMatcher>) -> Self {
        for entry in &mut entries {
            for pattern in &mut entry.patterns {
                *pattern = pattern.to_lowercase();
            }
        }
        Self { entries }
    }

    /// Returns the id of the first entry with a pattern contained in `text`.
    pub fn resolve(&self, text: &str) -> Option<&str> {
        let haystack = text.to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.patterns.iter().any(|pattern| haystack.contains(pattern.as_str())))
            .map(|entry| entry.id.as_str())
    }
}

impl Default for ClusterMatchers {
    fn default() -> Self {
        Self::new(vec![
            ClusterMatcher::new("spine-06", &["spine 6", "spine-06"]),
            ClusterMatcher::new("bundle-44b", &["44b", "patch panel 44b"]),
            ClusterMatcher::new("delta-loop", &["delta pod", "delta loop", "liquid loop"]),
            ClusterMatcher::new("row7-diagnostics", &["row 7", "pod 7", "7a-7c"]),
            ClusterMatcher::new("pod-j", &["pod j"]),
            ClusterMatcher::new("rack-n09", &["n09"]),
            ClusterMatcher::new("plant-chill", &["chill", "plant"]),
            ClusterMatcher::new("service-bay", &["service bay", "lidar"]),
            ClusterMatcher::new("c-01-01", &["c-01-01"]),
            ClusterMatcher::new("c-01-02", &["c-01-02"]),
            ClusterMatcher::new("g-02-02", &["g-02-02"]),
            ClusterMatcher::new("g-02-03", &["g-02-03"]),
            ClusterMatcher::new("cooling-manifold", &["manifold"]),
        ])
    }
}

/// A complete facility as loaded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityDefinition {
    /// Bottom floor first.
    pub floors: Vec<Floor>,
    /// Replaces the standard tile table when present.
    #[serde(default)]
    pub tiles: Option<Vec<TileDefinition>>,
    pub clusters: Vec<Cluster>,
    /// Replaces the standard cluster matcher table when present.
    #[serde(default)]
    pub matchers: Option<Vec<ClusterMatcher>>,
    #[serde(default)]
    pub costs: PathCosts,
}

impl FacilityDefinition {
    pub fn from_json(json: &str) -> Result<Self, FacilityError> {
        let definition: Self = serde_json::from_str(json)?;
        definition.validate()?;
        Ok(definition)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FacilityError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Checks grid shapes, id uniqueness, and that clusters sit on known floors.
    pub fn validate(&self) -> Result<(), FacilityError> {
        let mut floor_ids = HashSet::new();
        for floor in &self.floors {
            floor.validate()?;
            if !floor_ids.insert(floor.id.as_str()) {
                return Err(FacilityError::DuplicateFloor(floor.id.clone()));
            }
        }

        let mut cluster_ids = HashSet::new();
        for cluster in &self.clusters {
            if !cluster_ids.insert(cluster.id.as_str()) {
                return Err(FacilityError::DuplicateCluster(cluster.id.clone()));
            }
            if !floor_ids.contains(cluster.floor_id.as_str()) {
                return Err(FacilityError::UnknownFloor {
                    cluster: cluster.id.clone(),
                    floor: cluster.floor_id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn tile_table(&self) -> TileTable {
        match &self.tiles {
            Some(tiles) => TileTable::new(tiles.clone()),
            None => TileTable::standard(),
        }
    }

    pub fn cluster_index(&self) -> ClusterIndex {
        ClusterIndex::new(self.clusters.clone())
    }

    pub fn matchers(&self) -> ClusterMatchers {
        match &self.matchers {
            Some(entries) => ClusterMatchers::new(entries.clone()),
            None => ClusterMatchers::default(),
        }
    }
}
