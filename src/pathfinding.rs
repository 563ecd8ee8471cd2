//! Walking paths across a multi-floor facility.
//!
//! Every walkable tile is a node. Same-floor moves go to the four orthogonal
//! neighbours and cost the step cost plus the destination tile's penalty.
//! Elevator pads on adjacent floors are paired by index (first pad on floor
//! N with first pad on floor N+1, and so on) and joined by a fixed transfer
//! cost that ignores tile penalties.
//!
//! Because penalties are charged on arrival, `distance(a, b)` and
//! `distance(b, a)` differ by exactly `penalty(b) - penalty(a)`.
//!
//! # Cost units
//!
//! Meters, as whole numbers.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FacilityError;
use crate::facility::{FacilityDefinition, Floor, GridCoord, TileTable};
use crate::traits::PathProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PathCosts {
    /// Meters per in-floor step, before tile penalties.
    pub step: u32,
    /// Meters charged for riding an elevator one floor.
    pub elevator_transfer: u32,
}

impl Default for PathCosts {
    fn default() -> Self {
        Self {
            step: 2,
            elevator_transfer: 30,
        }
    }
}

/// A tile on a specific floor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityCoord {
    pub floor_id: String,
    pub coord: GridCoord,
}

impl FacilityCoord {
    pub fn new(floor_id: impl Into<String>, x: usize, y: usize) -> Self {
        Self {
            floor_id: floor_id.into(),
            coord: GridCoord::new(x, y),
        }
    }
}

/// A cheapest path, start and goal included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathResult {
    pub distance: u32,
    pub steps: Vec<FacilityCoord>,
}

impl PathResult {
    pub fn end(&self) -> Option<&FacilityCoord> {
        self.steps.last()
    }

    /// Number of elevator rides in the path.
    pub fn floor_transfers(&self) -> usize {
        self.steps
            .windows(2)
            .filter(|pair| pair[0].floor_id != pair[1].floor_id)
            .count()
    }
}

const DIRECTIONS: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Indexed facility ready for repeated path queries.
#[derive(Debug, Clone)]
pub struct FacilityGraph {
    floors: Vec<Floor>,
    tiles: TileTable,
    costs: PathCosts,
    /// First node id of each floor.
    offsets: Vec<usize>,
    node_count: usize,
    elevator_links: HashMap<usize, Vec<usize>>,
}

impl FacilityGraph {
    /// Builds the graph. Floors must be listed bottom to top.
    pub fn new(floors: Vec<Floor>, tiles: TileTable, costs: PathCosts) -> Result<Self, FacilityError> {
        let mut floor_ids = HashSet::new();
        for floor in &floors {
            floor.validate()?;
            if !floor_ids.insert(floor.id.as_str()) {
                return Err(FacilityError::DuplicateFloor(floor.id.clone()));
            }
        }

        let mut offsets = Vec::with_capacity(floors.len());
        let mut node_count = 0;
        for floor in &floors {
            offsets.push(node_count);
            node_count += floor.size.rows * floor.size.cols;
        }

        let mut graph = Self {
            floors,
            tiles,
            costs,
            offsets,
            node_count,
            elevator_links: HashMap::new(),
        };
        graph.elevator_links = graph.pair_elevators();
        Ok(graph)
    }

    pub fn from_definition(definition: &FacilityDefinition) -> Result<Self, FacilityError> {
        Self::new(definition.floors.clone(), definition.tile_table(), definition.costs)
    }

    pub fn floors(&self) -> &[Floor] {
        &self.floors
    }

    pub fn costs(&self) -> PathCosts {
        self.costs
    }

    fn floor_index(&self, floor_id: &str) -> Option<usize> {
        self.floors.iter().position(|floor| floor.id == floor_id)
    }

    fn node_of(&self, floor: usize, coord: GridCoord) -> usize {
        self.offsets[floor] + coord.y * self.floors[floor].size.cols + coord.x
    }

    fn locate(&self, node: usize) -> (usize, GridCoord) {
        let floor = self.offsets.partition_point(|&offset| offset <= node) - 1;
        let local = node - self.offsets[floor];
        let cols = self.floors[floor].size.cols;
        (floor, GridCoord::new(local % cols, local / cols))
    }

    fn walkable(&self, floor: usize, coord: GridCoord) -> bool {
        self.floors[floor]
            .tile(coord)
            .is_some_and(|code| self.tiles.is_walkable(code))
    }

    fn elevator_pads(&self, floor: usize) -> Vec<GridCoord> {
        let mut pads = Vec::new();
        for (y, row) in self.floors[floor].grid.iter().enumerate() {
            for (x, &code) in row.iter().enumerate() {
                if self.tiles.is_elevator(code) {
                    pads.push(GridCoord::new(x, y));
                }
            }
        }
        pads
    }

    fn pair_elevators(&self) -> HashMap<usize, Vec<usize>> {
        let mut links: HashMap<usize, Vec<usize>> = HashMap::new();
        let pads: Vec<Vec<GridCoord>> = (0..self.floors.len())
            .map(|floor| self.elevator_pads(floor))
            .collect();

        for lower in 0..self.floors.len().saturating_sub(1) {
            let upper = lower + 1;
            for (from, to) in pads[lower].iter().zip(&pads[upper]) {
                let from = self.node_of(lower, *from);
                let to = self.node_of(upper, *to);
                links.entry(from).or_default().push(to);
                links.entry(to).or_default().push(from);
            }
        }
        links
    }

    fn neighbors(&self, node: usize) -> Vec<(usize, u32)> {
        let (floor, coord) = self.locate(node);
        let mut result = Vec::with_capacity(5);

        for (dx, dy) in DIRECTIONS {
            let (Some(x), Some(y)) = (
                coord.x.checked_add_signed(dx),
                coord.y.checked_add_signed(dy),
            ) else {
                continue;
            };
            let next = GridCoord::new(x, y);
            let Some(code) = self.floors[floor].tile(next) else {
                continue;
            };
            if !self.tiles.is_walkable(code) {
                continue;
            }
            let cost = self.costs.step + self.tiles.penalty(code);
            result.push((self.node_of(floor, next), cost));
        }

        if let Some(targets) = self.elevator_links.get(&node) {
            for &target in targets {
                result.push((target, self.costs.elevator_transfer));
            }
        }
        result
    }

    fn to_coord(&self, node: usize) -> FacilityCoord {
        let (floor, coord) = self.locate(node);
        FacilityCoord {
            floor_id: self.floors[floor].id.clone(),
            coord,
        }
    }

    fn resolve(&self, position: &FacilityCoord) -> Option<usize> {
        let floor = self.floor_index(&position.floor_id)?;
        self.walkable(floor, position.coord)
            .then(|| self.node_of(floor, position.coord))
    }

    /// Uniform-cost search from `start` to `goal`.
    pub fn shortest_path(&self, start: &FacilityCoord, goal: &FacilityCoord) -> Option<PathResult> {
        let (Some(from), Some(to)) = (self.resolve(start), self.resolve(goal)) else {
            debug!(?start, ?goal, "path endpoint is not walkable");
            return None;
        };
        if from == to {
            return Some(PathResult {
                distance: 0,
                steps: vec![start.clone()],
            });
        }

        let mut dist = vec![u32::MAX; self.node_count];
        let mut prev: Vec<Option<usize>> = vec![None; self.node_count];
        let mut heap = BinaryHeap::new();

        dist[from] = 0;
        heap.push(Reverse((0u32, from)));

        while let Some(Reverse((cost, node))) = heap.pop() {
            if node == to {
                return Some(self.reconstruct(&prev, to, cost));
            }
            // Stale entry.
            if cost > dist[node] {
                continue;
            }
            for (neighbor, step) in self.neighbors(node) {
                let next = cost.saturating_add(step);
                if next < dist[neighbor] {
                    dist[neighbor] = next;
                    prev[neighbor] = Some(node);
                    heap.push(Reverse((next, neighbor)));
                }
            }
        }

        debug!(?start, ?goal, "goal unreachable");
        None
    }

    fn reconstruct(&self, prev: &[Option<usize>], to: usize, distance: u32) -> PathResult {
        let mut steps = vec![self.to_coord(to)];
        let mut current = to;
        while let Some(previous) = prev[current] {
            steps.push(self.to_coord(previous));
            current = previous;
        }
        steps.reverse();
        PathResult { distance, steps }
    }
}

impl PathProvider for FacilityGraph {
    fn find_path(&self, start: &FacilityCoord, goal: &FacilityCoord) -> Option<PathResult> {
        self.shortest_path(start, goal)
    }

    fn floor_rank(&self, floor_id: &str) -> Option<usize> {
        self.floor_index(floor_id)
    }
}

/// One-shot path query with the standard tile table and default costs.
///
/// Returns `None` for malformed floors as well as for unreachable goals.
pub fn find_facility_path(
    floors: &[Floor],
    start: &FacilityCoord,
    goal: &FacilityCoord,
) -> Option<PathResult> {
    let graph = FacilityGraph::new(floors.to_vec(), TileTable::standard(), PathCosts::default()).ok()?;
    graph.shortest_path(start, goal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_floor(id: &str, cols: usize, rows: usize) -> Floor {
        Floor::from_grid(id, vec![vec![0; cols]; rows])
    }

    #[test]
    fn test_straight_line_cost() {
        let floors = vec![open_floor("L1", 5, 1)];
        let path = find_facility_path(
            &floors,
            &FacilityCoord::new("L1", 0, 0),
            &FacilityCoord::new("L1", 4, 0),
        )
        .unwrap();
        assert_eq!(path.distance, 8);
        assert_eq!(path.steps.len(), 5);
    }

    #[test]
    fn test_same_start_and_goal() {
        let floors = vec![open_floor("L1", 3, 3)];
        let spot = FacilityCoord::new("L1", 1, 1);
        let path = find_facility_path(&floors, &spot, &spot).unwrap();
        assert_eq!(path.distance, 0);
        assert_eq!(path.steps, vec![spot]);
    }

    #[test]
    fn test_blocked_endpoints() {
        let floors = vec![Floor::from_grid("L1", vec![vec![0, 1, 0]])];
        let open = FacilityCoord::new("L1", 0, 0);
        let wall = FacilityCoord::new("L1", 1, 0);
        assert!(find_facility_path(&floors, &open, &wall).is_none());
        assert!(find_facility_path(&floors, &wall, &open).is_none());
        assert!(find_facility_path(&floors, &open, &FacilityCoord::new("L1", 9, 9)).is_none());
        assert!(find_facility_path(&floors, &open, &FacilityCoord::new("L7", 0, 0)).is_none());
    }

    #[test]
    fn test_disconnected_goal() {
        let floors = vec![Floor::from_grid("L1", vec![vec![0, 2, 0]])];
        let path = find_facility_path(
            &floors,
            &FacilityCoord::new("L1", 0, 0),
            &FacilityCoord::new("L1", 2, 0),
        );
        assert!(path.is_none());
    }

    #[test]
    fn test_hot_aisle_penalty_is_charged_on_arrival() {
        let floors = vec![Floor::from_grid("L1", vec![vec![0, 4, 4, 0]])];
        let path = find_facility_path(
            &floors,
            &FacilityCoord::new("L1", 0, 0),
            &FacilityCoord::new("L1", 3, 0),
        )
        .unwrap();
        assert_eq!(path.distance, 8);
    }

    #[test]
    fn test_cheaper_detour_beats_hot_aisle() {
        // Through the aisle: 5 * 3 + 2 = 17. Around it: 8 plain steps = 16.
        let floors = vec![Floor::from_grid(
            "L1",
            vec![vec![0, 4, 4, 4, 4, 4, 0], vec![0, 0, 0, 0, 0, 0, 0]],
        )];
        let path = find_facility_path(
            &floors,
            &FacilityCoord::new("L1", 0, 0),
            &FacilityCoord::new("L1", 6, 0),
        )
        .unwrap();
        assert_eq!(path.distance, 16);
        assert!(path.steps.iter().any(|step| step.coord.y == 1));
    }

    #[test]
    fn test_elevator_pairs_by_index() {
        let floors = vec![
            Floor::from_grid("L1", vec![vec![7, 0, 7]]),
            Floor::from_grid("L2", vec![vec![0, 7, 7]]),
        ];
        let graph = FacilityGraph::new(floors, TileTable::standard(), PathCosts::default()).unwrap();
        let path = graph
            .shortest_path(&FacilityCoord::new("L1", 0, 0), &FacilityCoord::new("L2", 1, 0))
            .unwrap();
        assert_eq!(path.distance, 30);
        assert_eq!(path.floor_transfers(), 1);
        assert_eq!(graph.floor_rank("L2"), Some(1));
        assert_eq!(graph.floor_rank("L3"), None);
    }

    #[test]
    fn test_floor_shape_is_validated() {
        let mut floor = open_floor("L1", 2, 2);
        floor.size.cols = 3;
        assert!(FacilityGraph::new(vec![floor], TileTable::standard(), PathCosts::default()).is_err());
    }

    #[test]
    fn test_duplicate_floor_ids_are_rejected() {
        let floors = vec![open_floor("L1", 2, 2), open_floor("L1", 3, 3)];
        assert!(matches!(
            FacilityGraph::new(floors, TileTable::standard(), PathCosts::default()),
            Err(FacilityError::DuplicateFloor(id)) if id == "L1"
        ));
        assert!(find_facility_path(
            &[open_floor("L1", 2, 2), open_floor("L1", 2, 2)],
            &FacilityCoord::new("L1", 0, 0),
            &FacilityCoord::new("L1", 1, 1),
        )
        .is_none());
    }
}
