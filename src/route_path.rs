//! The technician's accumulated walking path.
//!
//! Path segments from successive searches are stitched end to start, so
//! each segment's first step (the previous segment's last) is dropped.
//! Elevator rides are recovered from consecutive steps that change floor.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::facility::GridCoord;
use crate::pathfinding::{FacilityCoord, PathResult};
use crate::traits::PathProvider;

/// A walking path as an ordered list of facility tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePath {
    points: Vec<FacilityCoord>,
}

impl RoutePath {
    /// Starts a path at `origin`.
    pub fn starting_at(origin: FacilityCoord) -> Self {
        Self {
            points: vec![origin],
        }
    }

    pub fn points(&self) -> &[FacilityCoord] {
        &self.points
    }

    pub fn into_points(self) -> Vec<FacilityCoord> {
        self.points
    }

    pub fn current(&self) -> Option<&FacilityCoord> {
        self.points.last()
    }

    /// Appends a segment that begins where this path currently ends.
    pub fn append_segment(&mut self, segment: &PathResult) {
        self.points.extend(segment.steps.iter().skip(1).cloned());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
        }
    }
}

/// One elevator ride inside a path segment, located at the boarding pad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorTransfer {
    pub floor_id: String,
    pub coord: GridCoord,
    pub from: String,
    pub to: String,
    pub direction: Direction,
}

/// Lists every floor change in `segment`, in travel order.
pub fn floor_transfers<P: PathProvider>(segment: &PathResult, provider: &P) -> Vec<FloorTransfer> {
    segment
        .steps
        .windows(2)
        .filter(|pair| pair[0].floor_id != pair[1].floor_id)
        .map(|pair| {
            let (boarding, arriving) = (&pair[0], &pair[1]);
            let direction = if provider.floor_rank(&arriving.floor_id)
                > provider.floor_rank(&boarding.floor_id)
            {
                Direction::Up
            } else {
                Direction::Down
            };
            FloorTransfer {
                floor_id: boarding.floor_id.clone(),
                coord: boarding.coord,
                from: boarding.floor_id.clone(),
                to: arriving.floor_id.clone(),
                direction,
            }
        })
        .collect()
}
