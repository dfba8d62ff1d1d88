//! Fixed-step evacuation engine.
//!
//! One [`Moving::step`] propagates people from every giving zone
//! through every unblocked transit toward the safety zone under the
//! density-driven flow model. The traversal walks an explicit work
//! queue seeded with the safety zone; each transit transfers at most
//! once per tick, and a zone gives through at most one transit per
//! tick (its visited mark blocks the others until it becomes the
//! receiving side itself).

use crate::bim::Bim;
use crate::building::Sign;
use crate::constants::{
    EVACUATED_THRESHOLD, MAX_DENSITY, MAX_MODELLING_TICKS, MIN_DENSITY, MODELLING_STEP,
    SAFETY_ZONE_ID,
};
use crate::transit::Transit;
use crate::velocity::{PeopleFlowVelocity, StairDirection};
use crate::zone::Zone;
use log::{trace, warn};
use std::collections::VecDeque;
use uuid::Uuid;

/// Levels within this height of each other count as the same storey.
const SAME_LEVEL_EPS: f64 = 1e-3;

/// The evacuation stepper.
#[derive(Clone, Debug, Default)]
pub struct Moving {
    pfv: PeopleFlowVelocity,
    time_in_minutes: f64,
}

impl Moving {
    pub fn new() -> Moving {
        Moving::default()
    }

    /// Stepper with a custom velocity model.
    pub fn with_velocity(pfv: PeopleFlowVelocity) -> Moving {
        Moving {
            pfv,
            time_in_minutes: 0.0,
        }
    }

    /// The velocity model in use.
    pub fn pfv(&self) -> &PeopleFlowVelocity {
        &self.pfv
    }

    /// Simulated time accumulated so far, minutes.
    pub fn time_in_minutes(&self) -> f64 {
        self.time_in_minutes
    }

    /// Advance the simulation by one tick of `MODELLING_STEP` minutes.
    pub fn step(&mut self, bim: &mut Bim) {
        bim.reset_visited();

        let mut queue: VecDeque<Uuid> = VecDeque::new();
        queue.push_back(SAFETY_ZONE_ID);

        while let Some(receiving_id) = queue.pop_front() {
            let transit_ids = match bim.zone(&receiving_id) {
                Some(zone) => zone.output().to_vec(),
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
                // The safety zone only ever receives, and both sides
                // naming the receiving zone is a degenerate self-loop.
                if giving_id == SAFETY_ZONE_ID || giving_id == receiving_id {
                    continue;
                }
                let (Some(receiving), Some(giving)) =
                    (bim.zone(&receiving_id), bim.zone(&giving_id))
                else {
                    continue;
                };
                if giving.is_visited() {
                    continue;
                }

                let moved = self.part_of_people_flow(receiving, giving, transit);
                trace!(
                    "transit {}: {} -> {}, {moved} people",
                    transit_id,
                    giving_id,
                    receiving_id
                );

                if let Some(zone) = bim.zone_mut(&receiving_id) {
                    let people = zone.num_of_people() + moved;
                    zone.set_num_of_people(people);
                }
                if let Some(zone) = bim.zone_mut(&giving_id) {
                    let people = zone.num_of_people() - moved;
                    zone.set_num_of_people(people);
                    zone.set_visited(true);
                }
                if let Some(transit) = bim.transit_mut(&transit_id) {
                    transit.record_flow(moved, giving_id, receiving_id);
                    transit.set_visited(true);
                }
                queue.push_back(giving_id);
            }
        }

        self.time_in_minutes += MODELLING_STEP;
    }

    /// Step until the building has numerically emptied or the tick cap
    /// is hit. Returns simulated minutes.
    ///
    /// Run the validator first: the initial remaining-people sum only
    /// sees zones already marked visited.
    pub fn run(&mut self, bim: &mut Bim) -> f64 {
        let mut ticks = 0u32;
        while bim.remaining_people() >= EVACUATED_THRESHOLD && ticks < MAX_MODELLING_TICKS {
            self.step(bim);
            ticks += 1;
        }
        self.time_in_minutes
    }

    /// People crossing `transit` from `giving` into `receiving` this
    /// tick.
    fn part_of_people_flow(&self, receiving: &Zone, giving: &Zone, transit: &Transit) -> f64 {
        let density = giving.density();

        // A nearly empty giving zone gets an unbounded opening so the
        // last fraction of a person leaves in one tick instead of
        // being trapped. Stair junction openings carry no measured
        // width and get the same treatment.
        let effective_width = if density > MIN_DENSITY {
            transit.width().unwrap_or_else(|| giving.area())
        } else {
            giving.area()
        };

        let speed_at_exit = self
            .speed_in_element(receiving, giving)
            .min(self.pfv.speed_through_transit(effective_width, density));
        if speed_at_exit < 0.0 {
            warn!(
                "transit {}: negative flow speed {speed_at_exit}, clamped to 0",
                transit.id()
            );
            return 0.0;
        }

        let mut flow = density * speed_at_exit * effective_width * MODELLING_STEP;
        if density <= MIN_DENSITY && flow > giving.num_of_people() {
            warn!(
                "zone {} `{}`: flow {flow} exceeds the remaining {} people",
                giving.id(),
                giving.name(),
                giving.num_of_people()
            );
            flow = giving.num_of_people();
        }

        let capacity = MAX_DENSITY * receiving.area() - receiving.num_of_people();
        if capacity < 0.0 {
            trace!("zone {} `{}` is saturated", receiving.id(), receiving.name());
            return 0.0;
        }
        flow.min(capacity)
    }

    /// Flow speed inside the giving element, toward the receiving one.
    fn speed_in_element(&self, receiving: &Zone, giving: &Zone) -> f64 {
        if receiving.sign() == Sign::Staircase
            && (receiving.z_level() - giving.z_level()).abs() > SAME_LEVEL_EPS
        {
            let direction = if receiving.z_level() < giving.z_level() {
                StairDirection::Down
            } else {
                StairDirection::Up
            };
            self.pfv.speed_on_stair(direction, giving.density())
        } else {
            self.pfv.speed_in_room(giving.density())
        }
    }
}
