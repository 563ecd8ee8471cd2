//! Facility pathfinding tests
//!
//! Elevator transfers, symmetry on plain tiles and the reference facility.

mod fixtures;

use fabric_dispatch::facility::{Floor, TileTable};
use fabric_dispatch::pathfinding::{FacilityCoord, FacilityGraph, PathCosts, find_facility_path};
use fabric_dispatch::traits::PathProvider;

use fixtures::*;

fn open_floor_with_pads(id: &str, size: usize, pads: &[(usize, usize)]) -> Floor {
    let mut grid = vec![vec![0; size]; size];
    for &(x, y) in pads {
        grid[y][x] = 7;
    }
    Floor::from_grid(id, grid)
}

#[test]
fn test_scenario_d_single_elevator_transfer() {
    let floors = vec![
        open_floor_with_pads("F1", 6, &[(0, 0)]),
        open_floor_with_pads("F2", 6, &[(0, 0)]),
    ];
    let path = find_facility_path(
        &floors,
        &FacilityCoord::new("F1", 5, 5),
        &FacilityCoord::new("F2", 5, 5),
    )
    .expect("floors are connected by the elevator");

    assert_eq!(path.floor_transfers(), 1);
    let ride: Vec<_> = path
        .steps
        .windows(2)
        .filter(|pair| pair[0].floor_id != pair[1].floor_id)
        .collect();
    assert_eq!(ride[0][0], FacilityCoord::new("F1", 0, 0));
    assert_eq!(ride[0][1], FacilityCoord::new("F2", 0, 0));

    // 10 steps to the pad (+2 pad penalty), ride, 10 steps to the goal.
    assert_eq!(path.distance, 20 + 2 + 30 + 20);
    assert_eq!(path.steps.first(), Some(&FacilityCoord::new("F1", 5, 5)));
    assert_eq!(path.end(), Some(&FacilityCoord::new("F2", 5, 5)));
}

#[test]
fn test_pads_pair_by_row_major_index() {
    let floors = vec![
        open_floor_with_pads("F1", 5, &[(0, 0), (4, 0)]),
        open_floor_with_pads("F2", 5, &[(4, 0), (0, 4)]),
    ];
    let graph = FacilityGraph::new(floors, TileTable::standard(), PathCosts::default()).unwrap();

    let ride = graph
        .shortest_path(&FacilityCoord::new("F1", 0, 0), &FacilityCoord::new("F2", 4, 0))
        .unwrap();
    assert_eq!(ride.distance, 30);
    assert_eq!(ride.steps.len(), 2);

    let second = graph
        .shortest_path(&FacilityCoord::new("F1", 4, 0), &FacilityCoord::new("F2", 0, 4))
        .unwrap();
    assert_eq!(second.distance, 30);
}

#[test]
fn test_start_equals_goal() {
    let graph = facility_graph();
    let desk = FacilityCoord::new("L1", 0, 2);
    let path = graph.find_path(&desk, &desk).unwrap();
    assert_eq!(path.distance, 0);
    assert_eq!(path.steps, vec![desk]);
}

#[test]
fn test_round_trip_between_plain_tiles() {
    let graph = facility_graph();
    let walkways = [
        FacilityCoord::new("L1", 8, 0),
        FacilityCoord::new("L1", 1, 2),
        FacilityCoord::new("L2", 8, 4),
        FacilityCoord::new("L3", 4, 2),
        FacilityCoord::new("L3", 9, 4),
    ];

    for a in &walkways {
        for b in &walkways {
            let there = graph.find_path(a, b).unwrap();
            let back = graph.find_path(b, a).unwrap();
            assert_eq!(there.distance, back.distance, "{a:?} <-> {b:?}");
        }
    }
}

#[test]
fn test_penalised_endpoint_breaks_symmetry_by_its_penalty() {
    let graph = facility_graph();
    let walkway = FacilityCoord::new("L1", 8, 3);
    let hot_aisle = FacilityCoord::new("L1", 5, 4);

    let into = graph.find_path(&walkway, &hot_aisle).unwrap();
    let out_of = graph.find_path(&hot_aisle, &walkway).unwrap();
    assert_eq!(into.distance, out_of.distance + 1);
}

#[test]
fn test_blocked_tiles_are_unreachable() {
    let graph = facility_graph();
    let desk = FacilityCoord::new("L1", 0, 2);

    assert!(graph.find_path(&desk, &FacilityCoord::new("L1", 3, 1)).is_none());
    assert!(graph.find_path(&desk, &FacilityCoord::new("L3", 2, 3)).is_none());
    assert!(graph.find_path(&desk, &FacilityCoord::new("L4", 0, 0)).is_none());
    assert!(graph.find_path(&desk, &FacilityCoord::new("L1", 40, 0)).is_none());
}

#[test]
fn test_paths_step_one_tile_at_a_time() {
    let graph = facility_graph();
    let path = graph
        .find_path(&FacilityCoord::new("L1", 0, 2), &FacilityCoord::new("L3", 6, 2))
        .unwrap();

    assert_eq!(path.floor_transfers(), 2);
    for pair in path.steps.windows(2) {
        let (from, to) = (&pair[0], &pair[1]);
        if from.floor_id == to.floor_id {
            assert_eq!(from.coord.x.abs_diff(to.coord.x) + from.coord.y.abs_diff(to.coord.y), 1);
        } else {
            assert_eq!(from.coord, to.coord);
        }
    }
}

#[test]
fn test_floor_rank_follows_declaration_order() {
    let graph = facility_graph();
    assert_eq!(graph.floor_rank("L1"), Some(0));
    assert_eq!(graph.floor_rank("L3"), Some(2));
    assert_eq!(graph.floor_rank("roof"), None);
}
