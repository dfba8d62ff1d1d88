//! The building graph: zones wired to transits, plus the synthetic
//! safety zone.
//!
//! Zones and transits reference each other by identifier only; the
//! `Bim` owns every node and resolves references through its maps, so
//! the cyclic graph needs no reference counting. The graph shape is
//! immutable after construction; simulation mutates node state only.

use crate::building::{BBuilding, BuildElement, Sign};
use crate::constants::SAFETY_ZONE_ID;
use crate::error::{BimError, InvalidTransit, Result, TransitIssue};
use crate::geometry::BPoint;
use crate::transit::Transit;
use crate::zone::Zone;
use fnv::FnvHashMap;
use log::debug;
use uuid::Uuid;

/// The assembled building graph.
#[derive(Debug)]
pub struct Bim {
    zones: FnvHashMap<Uuid, Zone>,
    transits: FnvHashMap<Uuid, Transit>,
    area: f64,
    num_of_people: f64,
}

impl Bim {
    /// Assemble the graph from a building description.
    ///
    /// Rooms and staircases become zones, doorways become transits
    /// with their widths measured from geometry, and every
    /// single-sided transit is wired to a synthesized safety zone.
    ///
    /// # Errors
    /// Fails with an aggregated report when any zone or transit is
    /// geometrically invalid; a partial graph is never returned.
    pub fn new(building: &BBuilding) -> Result<Bim> {
        let mut zones: FnvHashMap<Uuid, Zone> = FnvHashMap::default();
        let mut transits: FnvHashMap<Uuid, Transit> = FnvHashMap::default();
        let mut sz_output: Vec<Uuid> = Vec::new();
        let mut area = 0.0;
        let mut num_of_people = 0.0;

        for level in &building.levels {
            for element in &level.elements {
                if element.sign.is_zone() {
                    let zone = Zone::new(element)?;
                    area += zone.area();
                    num_of_people += zone.num_of_people();
                    zones.insert(element.id, zone);
                } else if element.sign.is_transit() {
                    let transit = Transit::new(element);
                    if transit.output().len() == 1 {
                        sz_output.push(element.id);
                    }
                    transits.insert(element.id, transit);
                }
            }
        }

        let mut invalid: Vec<InvalidTransit> = Vec::new();
        for transit in transits.values_mut() {
            if let Err(report) = measure_transit(transit, &zones) {
                invalid.push(report);
            }
        }
        if !invalid.is_empty() {
            return Err(BimError::TransitGeometry(invalid));
        }

        let mut safety_zone = Zone::new(&safety_zone_element(sz_output))?;
        safety_zone.set_safe(true);
        zones.insert(SAFETY_ZONE_ID, safety_zone);

        debug!(
            "bim graph assembled: {} zones, {} transits, {:.1} m2",
            zones.len() - 1,
            transits.len(),
            area
        );
        Ok(Bim {
            zones,
            transits,
            area,
            num_of_people,
        })
    }

    /// Total people across building zones at construction time.
    pub fn num_of_people(&self) -> f64 {
        self.num_of_people
    }

    /// Total building floor area, m² (safety zone excluded).
    pub fn area(&self) -> f64 {
        self.area
    }

    /// The synthetic external safety zone.
    pub fn safety_zone(&self) -> &Zone {
        &self.zones[&SAFETY_ZONE_ID]
    }

    pub fn zone(&self, id: &Uuid) -> Option<&Zone> {
        self.zones.get(id)
    }

    pub fn zone_mut(&mut self, id: &Uuid) -> Option<&mut Zone> {
        self.zones.get_mut(id)
    }

    pub fn transit(&self, id: &Uuid) -> Option<&Transit> {
        self.transits.get(id)
    }

    pub fn transit_mut(&mut self, id: &Uuid) -> Option<&mut Transit> {
        self.transits.get_mut(id)
    }

    /// Every zone, the safety zone included.
    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values()
    }

    /// Every zone except the safety zone.
    pub fn building_zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values().filter(|zone| !zone.is_safe())
    }

    pub fn transits(&self) -> impl Iterator<Item = &Transit> {
        self.transits.values()
    }

    pub fn transits_mut(&mut self) -> impl Iterator<Item = &mut Transit> {
        self.transits.values_mut()
    }

    /// Assign a density to every building zone (the safety zone keeps
    /// its occupancy).
    pub fn set_density(&mut self, density: f64) {
        for zone in self.zones.values_mut() {
            if !zone.is_safe() {
                zone.set_density(density);
            }
        }
    }

    /// People still inside visited building zones.
    ///
    /// Zones never reached by a traversal (blocked off) do not count;
    /// run the validator or a simulation step first so reachable zones
    /// carry their visited mark.
    pub fn remaining_people(&self) -> f64 {
        self.building_zones()
            .filter(|zone| zone.is_visited())
            .map(Zone::num_of_people)
            .sum()
    }

    /// Clear per-pass visited marks on every zone and transit.
    pub(crate) fn reset_visited(&mut self) {
        for zone in self.zones.values_mut() {
            zone.set_visited(false);
        }
        for transit in self.transits.values_mut() {
            transit.set_visited(false);
        }
    }
}

/// Width measurement for one transit against its host zone (the first
/// listed output).
fn measure_transit(
    transit: &mut Transit,
    zones: &FnvHashMap<Uuid, Zone>,
) -> std::result::Result<(), InvalidTransit> {
    let (id, sign) = (transit.id(), transit.sign());
    let report = |issue, zone_id: Uuid, zone_name: &str| InvalidTransit {
        id,
        sign,
        zone_id,
        zone_name: zone_name.to_string(),
        issue,
    };

    let Some(&host_id) = transit.output().first() else {
        return Err(report(TransitIssue::Unconnected, Uuid::nil(), ""));
    };
    let host = zones
        .get(&host_id)
        .ok_or_else(|| report(TransitIssue::UnknownZone(host_id), host_id, ""))?;

    let second = match transit.output().get(1) {
        Some(second_id) => Some(zones.get(second_id).ok_or_else(|| {
            report(TransitIssue::UnknownZone(*second_id), host_id, host.name())
        })?),
        None => None,
    };

    // Stair-to-stair openings have no measurable doorway width; the
    // transit keeps its width unset.
    if sign == Sign::DoorWay {
        if let Some(second) = second {
            if host.sign() == Sign::Staircase && second.sign() == Sign::Staircase {
                return Ok(());
            }
        }
    }

    transit
        .calculate_width(host, second)
        .map(|_| ())
        .map_err(|issue| report(issue, host_id, host.name()))
}

/// Raw element for the synthetic external safety zone: a square so
/// large its capacity never binds, holding every single-sided transit
/// as its output.
fn safety_zone_element(output: Vec<Uuid>) -> BuildElement {
    let side = f64::MAX.powf(0.2);
    BuildElement {
        id: SAFETY_ZONE_ID,
        sign: Sign::Room,
        name: "Safety zone".to_string(),
        size_z: 0.0,
        output,
        polygon: vec![
            BPoint::xy(0.0, 0.0),
            BPoint::xy(side, 0.0),
            BPoint::xy(side, side),
            BPoint::xy(0.0, side),
            BPoint::xy(0.0, 0.0),
        ],
    }
}
