//! Building description ingest.
//!
//! Maps the external JSON contract onto an immutable typed record
//! tree. Elements whose fields are malformed are collected and
//! reported together rather than failing one at a time, so a bad
//! export surfaces every offending element in a single pass.

use crate::error::{BimError, MalformedElement, Result};
use crate::geometry::BPoint;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

/// Classification of a building element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Sign {
    Room,
    Staircase,
    /// Virtual opening joining two rooms directly.
    DoorWay,
    /// Interior doorway.
    DoorWayInt,
    /// Doorway leading out of the building.
    DoorWayOut,
}

impl Sign {
    /// Whether elements of this kind become zones.
    pub fn is_zone(self) -> bool {
        matches!(self, Sign::Room | Sign::Staircase)
    }

    /// Whether elements of this kind become transits.
    pub fn is_transit(self) -> bool {
        matches!(self, Sign::DoorWay | Sign::DoorWayInt | Sign::DoorWayOut)
    }
}

impl FromStr for Sign {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Room" => Ok(Sign::Room),
            "Staircase" => Ok(Sign::Staircase),
            "DoorWay" => Ok(Sign::DoorWay),
            "DoorWayInt" => Ok(Sign::DoorWayInt),
            "DoorWayOut" => Ok(Sign::DoorWayOut),
            other => Err(format!("unknown sign `{other}`")),
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Sign::Room => "Room",
            Sign::Staircase => "Staircase",
            Sign::DoorWay => "DoorWay",
            Sign::DoorWayInt => "DoorWayInt",
            Sign::DoorWayOut => "DoorWayOut",
        };
        f.write_str(name)
    }
}

/// Raw, immutable description of one building element.
#[derive(Clone, Debug)]
pub struct BuildElement {
    pub id: Uuid,
    pub sign: Sign,
    pub name: String,
    /// Vertical size, metres. Forced to zero for `DoorWay` elements.
    pub size_z: f64,
    /// Identifiers of connected elements.
    pub output: Vec<Uuid>,
    /// Closed polygon ring (first vertex repeated last), with every
    /// vertex at the level's height.
    pub polygon: Vec<BPoint>,
}

/// One storey of the building.
#[derive(Clone, Debug)]
pub struct BLevel {
    pub name: String,
    pub z_level: f64,
    pub elements: Vec<BuildElement>,
}

/// The whole typed building description.
#[derive(Clone, Debug)]
pub struct BBuilding {
    pub name: String,
    pub address: Option<String>,
    pub levels: Vec<BLevel>,
}

impl BBuilding {
    /// Parse a building description from its JSON text.
    ///
    /// # Errors
    /// Fails on structurally invalid JSON, or with an aggregated
    /// [`BimError::Ingest`] report listing every malformed element.
    pub fn from_json(json: &str) -> Result<BBuilding> {
        map_building(serde_json::from_str(json)?)
    }

    /// Read and parse a building description file.
    ///
    /// # Errors
    /// As [`BBuilding::from_json`], plus I/O failures.
    pub fn from_file(path: impl AsRef<Path>) -> Result<BBuilding> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

// Wire format. Field names are fixed by the external exporter;
// identifiers and signs stay strings here so one bad value becomes a
// per-element diagnostic instead of a whole-file parse failure.

#[derive(Deserialize)]
struct RawBuilding {
    #[serde(rename = "NameBuilding")]
    name: String,
    #[serde(rename = "Address", default)]
    address: Option<String>,
    #[serde(rename = "Level")]
    levels: Vec<RawLevel>,
}

#[derive(Deserialize)]
struct RawLevel {
    #[serde(rename = "NameLevel")]
    name: String,
    #[serde(rename = "ZLevel")]
    z_level: f64,
    #[serde(rename = "BuildElement")]
    elements: Vec<RawElement>,
}

#[derive(Deserialize)]
struct RawElement {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Sign")]
    sign: String,
    #[serde(rename = "SizeZ", default)]
    size_z: f64,
    #[serde(rename = "Output", default)]
    output: Vec<String>,
    #[serde(rename = "XY", default)]
    xy: Vec<RawPolygon>,
}

#[derive(Deserialize)]
struct RawPolygon {
    points: Vec<RawPoint>,
}

#[derive(Deserialize)]
struct RawPoint {
    x: f64,
    y: f64,
}

fn map_building(raw: RawBuilding) -> Result<BBuilding> {
    let mut bad: Vec<MalformedElement> = Vec::new();
    let mut levels = Vec::with_capacity(raw.levels.len());

    for level in raw.levels {
        let mut elements = Vec::with_capacity(level.elements.len());
        for element in &level.elements {
            match map_element(element, level.z_level) {
                Ok(mapped) => elements.push(mapped),
                Err(reason) => bad.push(MalformedElement {
                    sign: element.sign.clone(),
                    id: element.id.clone(),
                    name: element.name.clone(),
                    z_level: level.z_level,
                    reason,
                }),
            }
        }
        levels.push(BLevel {
            name: level.name,
            z_level: level.z_level,
            elements,
        });
    }

    if !bad.is_empty() {
        return Err(BimError::Ingest(bad));
    }
    Ok(BBuilding {
        name: raw.name,
        address: raw.address,
        levels,
    })
}

fn map_element(raw: &RawElement, z_level: f64) -> std::result::Result<BuildElement, String> {
    let sign: Sign = raw.sign.parse()?;
    let id = Uuid::parse_str(&raw.id).map_err(|e| format!("bad id: {e}"))?;

    let mut output = Vec::with_capacity(raw.output.len());
    for out in &raw.output {
        output.push(Uuid::parse_str(out).map_err(|e| format!("bad output id `{out}`: {e}"))?);
    }

    let polygon: Vec<BPoint> = raw
        .xy
        .first()
        .ok_or_else(|| "missing polygon".to_string())?
        .points
        .iter()
        .map(|p| BPoint::new(p.x, p.y, z_level))
        .collect();
    if polygon.is_empty() {
        return Err("empty polygon".to_string());
    }

    // Door openings have no height of their own.
    let size_z = if sign == Sign::DoorWay { 0.0 } else { raw.size_z };

    Ok(BuildElement {
        id,
        sign,
        name: raw.name.clone(),
        size_z,
        output,
        polygon,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ROOM_ID: &str = "e840da2b-c41a-4771-a4ea-f0a2cf7b3414";
    const DOOR_ID: &str = "f46361f4-a99f-4e79-aebe-d36ebed45992";

    fn sample() -> serde_json::Value {
        json!({
            "NameBuilding": "sample",
            "Level": [{
                "NameLevel": "first",
                "ZLevel": 3.0,
                "BuildElement": [
                    {
                        "Id": ROOM_ID,
                        "Name": "hall",
                        "Sign": "Room",
                        "SizeZ": 3.0,
                        "Output": [DOOR_ID],
                        "XY": [{"points": [
                            {"x": 0.0, "y": 0.0},
                            {"x": 6.0, "y": 0.0},
                            {"x": 6.0, "y": 6.0},
                            {"x": 0.0, "y": 6.0},
                            {"x": 0.0, "y": 0.0}
                        ]}]
                    },
                    {
                        "Id": DOOR_ID,
                        "Name": "exit",
                        "Sign": "DoorWay",
                        "SizeZ": 2.0,
                        "Output": [ROOM_ID],
                        "XY": [{"points": [
                            {"x": 2.0, "y": -0.2},
                            {"x": 4.0, "y": -0.2},
                            {"x": 4.0, "y": 0.2},
                            {"x": 2.0, "y": 0.2},
                            {"x": 2.0, "y": -0.2}
                        ]}]
                    }
                ]
            }]
        })
    }

    #[test]
    fn maps_typed_records() {
        let building = BBuilding::from_json(&sample().to_string()).unwrap();
        assert_eq!(building.name, "sample");
        assert_eq!(building.levels.len(), 1);

        let level = &building.levels[0];
        assert_eq!(level.z_level, 3.0);
        let room = &level.elements[0];
        assert_eq!(room.sign, Sign::Room);
        assert_eq!(room.id, Uuid::parse_str(ROOM_ID).unwrap());
        assert_eq!(room.output, vec![Uuid::parse_str(DOOR_ID).unwrap()]);
        // Every vertex inherits the level height.
        assert!(room.polygon.iter().all(|p| p.z == 3.0));
    }

    #[test]
    fn doorway_size_z_is_forced_to_zero() {
        let building = BBuilding::from_json(&sample().to_string()).unwrap();
        let door = &building.levels[0].elements[1];
        assert_eq!(door.sign, Sign::DoorWay);
        assert_eq!(door.size_z, 0.0);
    }

    #[test]
    fn malformed_elements_are_aggregated() {
        let mut value = sample();
        let elements = value["Level"][0]["BuildElement"].as_array_mut().unwrap();
        elements[0]["Id"] = json!("not-a-uuid");
        elements[1]["Sign"] = json!("Hatch");

        let err = BBuilding::from_json(&value.to_string()).unwrap_err();
        match err {
            BimError::Ingest(bad) => {
                assert_eq!(bad.len(), 2);
                assert!(bad[0].reason.contains("bad id"));
                assert!(bad[1].reason.contains("unknown sign `Hatch`"));
            }
            other => panic!("expected ingest error, got {other}"),
        }
    }

    #[test]
    fn structural_json_failure_is_not_aggregated() {
        let err = BBuilding::from_json("{\"NameBuilding\": 1}").unwrap_err();
        assert!(matches!(err, BimError::Json(_)));
    }

    #[test]
    fn missing_polygon_is_malformed() {
        let mut value = sample();
        value["Level"][0]["BuildElement"][0]["XY"] = json!([]);
        let err = BBuilding::from_json(&value.to_string()).unwrap_err();
        match err {
            BimError::Ingest(bad) => assert!(bad[0].reason.contains("missing polygon")),
            other => panic!("expected ingest error, got {other}"),
        }
    }
}
