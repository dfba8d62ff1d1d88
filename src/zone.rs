//! Occupancy zones of the building graph.

use crate::building::{BuildElement, Sign};
use crate::error::{BimError, Result};
use crate::geometry::{self, BPoint, Triangle};
use bitflags::bitflags;
use log::warn;
use uuid::Uuid;

bitflags! {
    /// Traversal and simulation state of a zone.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ZoneState: u8 {
        const VISITED = 1;
        const BLOCKED = 1 << 1;
        const SAFE = 1 << 2;
    }
}

/// A room, staircase segment, or the synthetic safety zone.
///
/// The unit of occupancy: people are a scalar count per zone, coupled
/// with density through the floor area. The area is computed once from
/// the polygon and never changes, so only the people count is stored
/// and density is derived on read.
#[derive(Clone, Debug)]
pub struct Zone {
    id: Uuid,
    sign: Sign,
    name: String,
    polygon: Vec<BPoint>,
    size_z: f64,
    /// Identifiers of the transits adjacent to this zone.
    output: Vec<Uuid>,
    triangles: Vec<Triangle>,
    area: f64,
    num_of_people: f64,
    graph_level: u32,
    state: ZoneState,
}

impl Zone {
    /// Build a zone from its raw element, computing the floor area.
    ///
    /// # Errors
    /// The polygon must have at least three distinct vertices and a
    /// positive area.
    pub fn new(element: &BuildElement) -> Result<Zone> {
        let triangles = geometry::triangulate(&element.polygon);
        if triangles.is_empty() {
            return Err(BimError::InvariantViolation(format!(
                "zone {} `{}` needs at least 3 distinct polygon vertices",
                element.id, element.name
            )));
        }

        let area = geometry::round_ndigits(
            triangles
                .iter()
                .map(|t| geometry::triangle_area(t[0], t[1], t[2]))
                .sum(),
        );
        if area <= 0.0 {
            return Err(BimError::InvariantViolation(format!(
                "zone {} `{}` has no floor area",
                element.id, element.name
            )));
        }

        Ok(Zone {
            id: element.id,
            sign: element.sign,
            name: element.name.clone(),
            polygon: element.polygon.clone(),
            size_z: element.size_z,
            output: element.output.clone(),
            triangles,
            area,
            num_of_people: 0.0,
            graph_level: 0,
            state: ZoneState::empty(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sign(&self) -> Sign {
        self.sign
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn polygon(&self) -> &[BPoint] {
        &self.polygon
    }

    pub fn size_z(&self) -> f64 {
        self.size_z
    }

    /// Identifiers of the transits adjacent to this zone.
    pub fn output(&self) -> &[Uuid] {
        &self.output
    }

    /// Floor area, m².
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Height of the zone's level, metres.
    pub fn z_level(&self) -> f64 {
        self.polygon[0].z
    }

    /// People currently inside.
    pub fn num_of_people(&self) -> f64 {
        self.num_of_people
    }

    /// Set the people count; density follows through the constant area.
    ///
    /// A negative count is a simulation defect: it is reported and
    /// clamped to zero.
    pub fn set_num_of_people(&mut self, people: f64) {
        if people < 0.0 {
            warn!(
                "zone {} `{}`: people count {} clamped to 0",
                self.id, self.name, people
            );
            self.num_of_people = 0.0;
        } else {
            self.num_of_people = people;
        }
    }

    /// Current density, persons/m².
    pub fn density(&self) -> f64 {
        self.num_of_people / self.area
    }

    /// Set the density; the people count follows through the area.
    pub fn set_density(&mut self, density: f64) {
        self.set_num_of_people(density * self.area);
    }

    /// Whether the point lies inside the zone polygon (boundary
    /// included).
    pub fn contains(&self, point: BPoint) -> bool {
        geometry::point_in_polygon(&self.triangles, point)
    }

    /// Hop distance from the safety zone, assigned by the validator.
    pub fn graph_level(&self) -> u32 {
        self.graph_level
    }

    pub(crate) fn set_graph_level(&mut self, level: u32) {
        self.graph_level = level;
    }

    pub fn is_visited(&self) -> bool {
        self.state.contains(ZoneState::VISITED)
    }

    pub(crate) fn set_visited(&mut self, visited: bool) {
        self.state.set(ZoneState::VISITED, visited);
    }

    pub fn is_blocked(&self) -> bool {
        self.state.contains(ZoneState::BLOCKED)
    }

    pub fn set_blocked(&mut self, blocked: bool) {
        self.state.set(ZoneState::BLOCKED, blocked);
    }

    /// Whether this is the synthetic safety zone.
    pub fn is_safe(&self) -> bool {
        self.state.contains(ZoneState::SAFE)
    }

    pub(crate) fn set_safe(&mut self, safe: bool) {
        self.state.set(ZoneState::SAFE, safe);
    }
}
