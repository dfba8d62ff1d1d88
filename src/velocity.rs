//! Density-dependent people-flow velocity model.
//!
//! A pure function library: closed-form speeds (m/min) from the local
//! people density for horizontal paths, doorways and stairs. The base
//! law is `v(d) = v0 * (1 - a * ln(d / d0))` above the critical
//! density `d0`, and `v0` below it.

use crate::constants::PROJECTION_AREA;

/// Path-kind parameters: initial speed (m/min), path coefficient,
/// critical density (persons/m²).
#[derive(Copy, Clone)]
struct PathParams {
    v0: f64,
    a: f64,
    d0: f64,
}

const ROOM: PathParams = PathParams { v0: 100.0, a: 0.295, d0: 0.51 };
const TRANSIT: PathParams = PathParams { v0: 100.0, a: 0.295, d0: 0.65 };
const STAIR_DOWN: PathParams = PathParams { v0: 100.0, a: 0.400, d0: 0.89 };
const STAIR_UP: PathParams = PathParams { v0: 60.0, a: 0.305, d0: 0.67 };

/// Travel direction on a staircase, relative to the giving zone.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StairDirection {
    /// The receiving zone lies below the giving zone.
    Down,
    /// The receiving zone lies above the giving zone.
    Up,
}

/// The empirical speed model, parameterized by the horizontal
/// projection area of one person.
#[derive(Copy, Clone, Debug)]
pub struct PeopleFlowVelocity {
    projection_area: f64,
}

impl Default for PeopleFlowVelocity {
    fn default() -> Self {
        PeopleFlowVelocity {
            projection_area: PROJECTION_AREA,
        }
    }
}

impl PeopleFlowVelocity {
    pub fn new(projection_area: f64) -> Self {
        PeopleFlowVelocity { projection_area }
    }

    pub fn projection_area(&self) -> f64 {
        self.projection_area
    }

    /// Upper bound on admissible density, persons/m² (a projected
    /// density of 0.9 m²/m²).
    pub fn d09(&self) -> f64 {
        0.9 / self.projection_area
    }

    /// Convert a projected density (m²/m²) to persons/m².
    pub fn to_pm2(&self, projected: f64) -> f64 {
        projected / self.projection_area
    }

    fn velocity(params: PathParams, density: f64) -> f64 {
        if density > params.d0 {
            params.v0 * (1.0 - params.a * (density / params.d0).ln())
        } else {
            params.v0
        }
    }

    /// Flow speed along a horizontal path, m/min.
    pub fn speed_in_room(&self, density: f64) -> f64 {
        Self::velocity(ROOM, density.min(self.d09()))
    }

    /// Flow speed on a staircase, m/min.
    pub fn speed_on_stair(&self, direction: StairDirection, density: f64) -> f64 {
        let params = match direction {
            StairDirection::Down => STAIR_DOWN,
            StairDirection::Up => STAIR_UP,
        };
        Self::velocity(params, density.min(self.d09()))
    }

    /// Flow speed through a doorway of the given width, m/min.
    ///
    /// Above the critical density the throughput follows the
    /// projected density `D = density * projection_area`; congested
    /// doorways (`D >= 0.9`) saturate at a width-dependent flow.
    pub fn speed_through_transit(&self, width: f64, density: f64) -> f64 {
        if density <= TRANSIT.d0 {
            return TRANSIT.v0;
        }
        let projected = density * self.projection_area;
        let m = if projected <= 0.5 {
            1.0
        } else {
            1.25 - 0.5 * projected
        };
        let mut q = Self::velocity(TRANSIT, density) * projected * m;
        if projected >= 0.9 {
            q = if width < 1.6 { 2.5 + 3.75 * width } else { 8.5 };
        }
        q / projected
    }
}
