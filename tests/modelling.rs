//! End-to-end modelling scenarios: JSON ingest, graph assembly and
//! validation, then full evacuation runs.

use bim_evac::constants::EVACUATED_THRESHOLD;
use bim_evac::{BBuilding, Bim, BimComplexity, BimError, Moving, Sign, Zone};
use serde_json::json;
use uuid::Uuid;

const ROOM0: &str = "00000000-0000-0000-0000-000000000001";
const ROOM1: &str = "00000000-0000-0000-0000-000000000002";
const STAIR0: &str = "00000000-0000-0000-0000-000000000003";
const STAIR1: &str = "00000000-0000-0000-0000-000000000004";
const DOOR_OUT: &str = "00000000-0000-0000-0000-000000000011";
const DOOR_OUT2: &str = "00000000-0000-0000-0000-000000000012";
const DOOR_R0_S0: &str = "00000000-0000-0000-0000-000000000013";
const DOOR_S0_S1: &str = "00000000-0000-0000-0000-000000000014";
const DOOR_S1_R1: &str = "00000000-0000-0000-0000-000000000015";

fn points(coords: &[(f64, f64)]) -> serde_json::Value {
    let mut ring: Vec<serde_json::Value> = coords
        .iter()
        .map(|&(x, y)| json!({"x": x, "y": y}))
        .collect();
    ring.push(ring[0].clone());
    json!([{ "points": ring }])
}

fn element(id: &str, sign: &str, coords: &[(f64, f64)], output: &[&str]) -> serde_json::Value {
    json!({
        "Id": id,
        "Name": format!("{sign} {id}"),
        "Sign": sign,
        "SizeZ": 3.0,
        "Output": output,
        "XY": points(coords),
    })
}

/// A 36 m² room with one 2 m doorway out of the building.
fn one_exit_building() -> BBuilding {
    let text = json!({
        "NameBuilding": "one exit",
        "Level": [{
            "NameLevel": "ground",
            "ZLevel": 0.0,
            "BuildElement": [
                element(ROOM0, "Room", &[(0.0, 0.0), (6.0, 0.0), (6.0, 6.0), (0.0, 6.0)], &[DOOR_OUT]),
                element(DOOR_OUT, "DoorWayOut", &[(2.0, -0.2), (4.0, -0.2), (4.0, 0.2), (2.0, 0.2)], &[ROOM0]),
            ],
        }],
    });
    BBuilding::from_json(&text.to_string()).unwrap()
}

/// The same room with a second doorway on the opposite wall.
fn two_exit_building() -> BBuilding {
    let text = json!({
        "NameBuilding": "two exits",
        "Level": [{
            "NameLevel": "ground",
            "ZLevel": 0.0,
            "BuildElement": [
                element(ROOM0, "Room", &[(0.0, 0.0), (6.0, 0.0), (6.0, 6.0), (0.0, 6.0)], &[DOOR_OUT, DOOR_OUT2]),
                element(DOOR_OUT, "DoorWayOut", &[(2.0, -0.2), (4.0, -0.2), (4.0, 0.2), (2.0, 0.2)], &[ROOM0]),
                element(DOOR_OUT2, "DoorWayOut", &[(2.0, 5.8), (4.0, 5.8), (4.0, 6.2), (2.0, 6.2)], &[ROOM0]),
            ],
        }],
    });
    BBuilding::from_json(&text.to_string()).unwrap()
}

/// Two storeys joined by a staircase:
///
/// safety - room0 - stair0 - stair1 - room1
fn two_level_building() -> BBuilding {
    let text = json!({
        "NameBuilding": "two levels",
        "Level": [
            {
                "NameLevel": "ground",
                "ZLevel": 0.0,
                "BuildElement": [
                    element(ROOM0, "Room", &[(0.0, 0.0), (6.0, 0.0), (6.0, 6.0), (0.0, 6.0)], &[DOOR_OUT, DOOR_R0_S0]),
                    element(STAIR0, "Staircase", &[(6.0, 2.0), (8.0, 2.0), (8.0, 4.0), (6.0, 4.0)], &[DOOR_R0_S0, DOOR_S0_S1]),
                    element(DOOR_OUT, "DoorWayOut", &[(2.0, -0.2), (4.0, -0.2), (4.0, 0.2), (2.0, 0.2)], &[ROOM0]),
                    element(DOOR_R0_S0, "DoorWayInt", &[(5.8, 2.5), (6.2, 2.5), (6.2, 3.5), (5.8, 3.5)], &[ROOM0, STAIR0]),
                ],
            },
            {
                "NameLevel": "first",
                "ZLevel": 3.0,
                "BuildElement": [
                    element(STAIR1, "Staircase", &[(6.0, 2.0), (8.0, 2.0), (8.0, 4.0), (6.0, 4.0)], &[DOOR_S0_S1, DOOR_S1_R1]),
                    element(ROOM1, "Room", &[(8.0, 0.0), (14.0, 0.0), (14.0, 6.0), (8.0, 6.0)], &[DOOR_S1_R1]),
                    element(DOOR_S0_S1, "DoorWay", &[(6.5, 2.5), (7.5, 2.5), (7.5, 3.5), (6.5, 3.5)], &[STAIR0, STAIR1]),
                    element(DOOR_S1_R1, "DoorWayInt", &[(7.8, 2.5), (8.2, 2.5), (8.2, 3.5), (7.8, 3.5)], &[STAIR1, ROOM1]),
                ],
            },
        ],
    });
    BBuilding::from_json(&text.to_string()).unwrap()
}

fn id(text: &str) -> Uuid {
    Uuid::parse_str(text).unwrap()
}

/// Sweep the projected-density range and report evacuation times in
/// seconds, with every door forced to 2.0 m like the reference
/// scenarios.
fn density_sweep(building: &BBuilding) -> Vec<f64> {
    let densities = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];

    let mut bim = Bim::new(building).unwrap();
    BimComplexity::new(&mut bim).unwrap();
    for transit in bim.transits_mut() {
        transit.set_width(2.0);
    }

    let mut times = Vec::with_capacity(densities.len());
    for density in densities {
        let mut moving = Moving::new();
        bim.set_density(moving.pfv().to_pm2(density));
        let minutes = moving.run(&mut bim);
        times.push((minutes * 60.0 * 10.0).round() / 10.0);
    }
    times
}

/// Evacuation times produced by the flow model for a 36 m² room
/// draining through one 2.0 m doorway.
const SWEEP_SECONDS: [f64; 9] = [27.4, 37.9, 46.1, 53.3, 60.0, 66.7, 73.4, 80.2, 87.8];

#[test]
fn one_exit_density_sweep() {
    let times = density_sweep(&one_exit_building());
    for (time, expected) in times.iter().zip(SWEEP_SECONDS) {
        assert!((time - expected).abs() <= 0.5, "{time} != {expected} in {times:?}");
    }
}

#[test]
fn two_exit_sweep_matches_one_exit() {
    // Within one tick a zone gives through at most one transit, so the
    // symmetric second door does not change the curve.
    let times = density_sweep(&two_exit_building());
    for (time, expected) in times.iter().zip(SWEEP_SECONDS) {
        assert!((time - expected).abs() <= 0.5, "{time} != {expected} in {times:?}");
    }
}

#[test]
fn second_exit_carries_no_flow() {
    let mut bim = Bim::new(&two_exit_building()).unwrap();
    BimComplexity::new(&mut bim).unwrap();

    let mut moving = Moving::new();
    bim.set_density(1.0);
    for _ in 0..10 {
        moving.step(&mut bim);
    }
    assert!(bim.transit(&id(DOOR_OUT)).unwrap().num_of_people() > 0.0);
    assert_eq!(bim.transit(&id(DOOR_OUT2)).unwrap().num_of_people(), 0.0);
}

#[test]
fn two_level_building_metrics() {
    let mut bim = Bim::new(&two_level_building()).unwrap();
    assert_eq!(bim.area(), 80.0);

    let metrics = BimComplexity::new(&mut bim).unwrap();
    assert_eq!(metrics.number_of_zones, 4);
    assert_eq!(metrics.number_of_transits, 4);
    // One hop per zone along the single escape chain.
    assert_eq!(metrics.depth_of_bim_graph, 4);
    assert_eq!(metrics.width_of_bim_graph, 1);

    assert_eq!(bim.zone(&id(ROOM0)).unwrap().graph_level(), 1);
    assert_eq!(bim.zone(&id(STAIR0)).unwrap().graph_level(), 2);
    assert_eq!(bim.zone(&id(STAIR1)).unwrap().graph_level(), 3);
    assert_eq!(bim.zone(&id(ROOM1)).unwrap().graph_level(), 4);
}

#[test]
fn two_level_building_evacuates_through_the_staircase() {
    let mut bim = Bim::new(&two_level_building()).unwrap();
    BimComplexity::new(&mut bim).unwrap();

    bim.set_density(1.0);
    let total: f64 = bim.zones().map(Zone::num_of_people).sum();
    assert_eq!(total, 80.0);

    let mut moving = Moving::new();
    let minutes = moving.run(&mut bim);

    assert!(bim.remaining_people() < EVACUATED_THRESHOLD);
    let seconds = minutes * 60.0;
    assert!((seconds - 64.3).abs() <= 0.5, "evacuation took {seconds} s");

    let after: f64 = bim.zones().map(Zone::num_of_people).sum();
    assert!((after - total).abs() < 1e-9);
    assert!((bim.safety_zone().num_of_people() - total).abs() < EVACUATED_THRESHOLD);
}

#[test]
fn stair_junction_width_stays_unmeasured() {
    let bim = Bim::new(&two_level_building()).unwrap();
    assert_eq!(bim.transit(&id(DOOR_S0_S1)).unwrap().width(), None);
    assert_eq!(bim.transit(&id(DOOR_R0_S0)).unwrap().width(), Some(1.0));
    assert_eq!(bim.transit(&id(DOOR_S1_R1)).unwrap().width(), Some(1.0));
}

#[test]
fn blocked_staircase_door_breaks_connectivity() {
    let mut bim = Bim::new(&two_level_building()).unwrap();
    bim.transit_mut(&id(DOOR_S0_S1)).unwrap().set_blocked(true);

    match BimComplexity::new(&mut bim).unwrap_err() {
        BimError::GraphConnectivity(unreachable) => {
            let mut ids: Vec<Uuid> = unreachable.iter().map(|z| z.id).collect();
            ids.sort();
            assert_eq!(ids, vec![id(ROOM1), id(STAIR1)]);
            assert!(unreachable.iter().any(|z| z.sign == Sign::Staircase));
        }
        other => panic!("expected connectivity error, got {other}"),
    }
}
