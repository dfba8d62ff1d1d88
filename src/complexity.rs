//! Graph validation: level assignment and structural metrics.

use crate::bim::Bim;
use crate::constants::SAFETY_ZONE_ID;
use crate::error::{BimError, Result, UnreachableZone};
use log::debug;
use std::collections::VecDeque;
use uuid::Uuid;

/// Structural metrics of a validated building graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BimComplexity {
    /// Building zones (the safety zone is not counted).
    pub number_of_zones: usize,
    pub number_of_transits: usize,
    /// Maximum graph level: hops from the safety zone to the furthest
    /// zone.
    pub depth_of_bim_graph: u32,
    /// Largest number of zones sharing one graph level.
    pub width_of_bim_graph: u32,
}

impl BimComplexity {
    /// Traverse the graph from the safety zone over unblocked
    /// transits, assigning each zone its graph level and measuring
    /// depth and width.
    ///
    /// Levels are hop counts: the safety zone sits at level 0 and
    /// every zone gets `1 + level(parent)` on first discovery. The
    /// traversal leaves every reached zone marked visited; the run
    /// driver's initial remaining-people sum relies on that.
    ///
    /// # Errors
    /// Fails listing every zone that unblocked transits cannot reach.
    pub fn new(bim: &mut Bim) -> Result<BimComplexity> {
        let mut queue: VecDeque<Uuid> = VecDeque::new();
        queue.push_back(SAFETY_ZONE_ID);

        let mut level_counts: Vec<u32> = Vec::new();
        let mut depth = 0u32;

        while let Some(receiving_id) = queue.pop_front() {
            let (current_level, transit_ids) = match bim.zone(&receiving_id) {
                Some(zone) => (zone.graph_level(), zone.output().to_vec()),
                None => continue,
            };

            for transit_id in transit_ids {
                let Some(transit) = bim.transit(&transit_id) else {
                    continue;
                };
                if transit.is_visited() || transit.is_blocked() {
                    continue;
                }
                let Some(giving_id) = transit.other_zone(receiving_id) else {
                    continue;
                };
                if giving_id == receiving_id {
                    continue;
                }
                let Some(giving) = bim.zone(&giving_id) else {
                    continue;
                };
                // The safety zone stays at level 0.
                if giving.is_safe() || giving.is_visited() {
                    continue;
                }

                let level = current_level + 1;
                depth = depth.max(level);
                if level_counts.len() < level as usize {
                    level_counts.resize(level as usize, 0);
                }
                level_counts[level as usize - 1] += 1;

                if let Some(zone) = bim.zone_mut(&giving_id) {
                    zone.set_graph_level(level);
                    zone.set_visited(true);
                }
                if let Some(transit) = bim.transit_mut(&transit_id) {
                    transit.set_visited(true);
                }
                queue.push_back(giving_id);
            }
        }

        let unreachable: Vec<UnreachableZone> = bim
            .building_zones()
            .filter(|zone| !zone.is_visited())
            .map(|zone| UnreachableZone {
                id: zone.id(),
                sign: zone.sign(),
                name: zone.name().to_string(),
                z_level: zone.z_level(),
            })
            .collect();
        if !unreachable.is_empty() {
            return Err(BimError::GraphConnectivity(unreachable));
        }

        let metrics = BimComplexity {
            number_of_zones: bim.zones().count() - 1,
            number_of_transits: bim.transits().count(),
            depth_of_bim_graph: depth,
            width_of_bim_graph: level_counts.iter().copied().max().unwrap_or(0),
        };
        debug!("graph validated: {metrics:?}");
        Ok(metrics)
    }
}
