//! Doorway transits of the building graph.

use crate::building::{BuildElement, Sign};
use crate::constants::{MIN_WIDTH, SAFETY_ZONE_ID};
use crate::error::TransitIssue;
use crate::geometry::{self, BLine2D, BPoint};
use crate::zone::Zone;
use bitflags::bitflags;
use uuid::Uuid;

bitflags! {
    /// Traversal state of a transit.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TransitState: u8 {
        const VISITED = 1;
        const BLOCKED = 1 << 1;
    }
}

/// A doorway or virtual opening: the unit of flow between two zones.
///
/// `output` names the adjacent zones. A transit with a single output
/// sits on the building boundary and implicitly joins that zone to the
/// safety zone.
#[derive(Clone, Debug)]
pub struct Transit {
    id: Uuid,
    sign: Sign,
    name: String,
    polygon: Vec<BPoint>,
    output: Vec<Uuid>,
    width: Option<f64>,
    num_of_people: f64,
    flow: Option<(Uuid, Uuid)>,
    state: TransitState,
}

impl Transit {
    pub fn new(element: &BuildElement) -> Transit {
        Transit {
            id: element.id,
            sign: element.sign,
            name: element.name.clone(),
            polygon: element.polygon.clone(),
            output: element.output.clone(),
            width: None,
            num_of_people: 0.0,
            flow: None,
            state: TransitState::empty(),
        }
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

    /// Identifiers of the adjacent zones (one or two).
    pub fn output(&self) -> &[Uuid] {
        &self.output
    }

    /// Measured doorway width, metres. `None` only for stair-to-stair
    /// openings, which have no measurable width.
    pub fn width(&self) -> Option<f64> {
        self.width
    }

    /// Override the measured width (scenario tuning).
    pub fn set_width(&mut self, width: f64) {
        assert!(width > 0.0, "transit width must be positive");
        self.width = Some(width);
    }

    /// People that crossed this transit on the latest tick.
    pub fn num_of_people(&self) -> f64 {
        self.num_of_people
    }

    /// Direction of the latest transfer as a `(giving, receiving)`
    /// pair.
    pub fn flow(&self) -> Option<(Uuid, Uuid)> {
        self.flow
    }

    pub(crate) fn record_flow(&mut self, people: f64, giving: Uuid, receiving: Uuid) {
        self.num_of_people = people;
        self.flow = Some((giving, receiving));
    }

    pub fn is_visited(&self) -> bool {
        self.state.contains(TransitState::VISITED)
    }

    pub(crate) fn set_visited(&mut self, visited: bool) {
        self.state.set(TransitState::VISITED, visited);
    }

    pub fn is_blocked(&self) -> bool {
        self.state.contains(TransitState::BLOCKED)
    }

    pub fn set_blocked(&mut self, blocked: bool) {
        self.state.set(TransitState::BLOCKED, blocked);
    }

    /// The zone on the other side of the transit, seen from
    /// `receiving`.
    ///
    /// A single-output transit always joins its building-side zone to
    /// the safety zone, whichever side is currently receiving. A
    /// self-loop resolves to `receiving` itself (callers skip those);
    /// an output list that is empty or longer than two is ill-formed
    /// and yields `None`.
    pub fn other_zone(&self, receiving: Uuid) -> Option<Uuid> {
        match *self.output.as_slice() {
            [only] => Some(if receiving == only { SAFETY_ZONE_ID } else { only }),
            [a, b] => Some(if a == receiving { b } else { a }),
            _ => None,
        }
    }

    /// Measure the doorway width against the host zone (`zone_a`, the
    /// transit's first output).
    ///
    /// The four doorway corners are split by containment in the host
    /// zone: the two interior corners span the opening, the exterior
    /// pair mirrors it across the wall. Doorways between rooms
    /// (`DoorWay`) are measured through the wall instead: each
    /// wall-normal edge must cross exactly one polygon edge of its
    /// zone, and the width is the mean overlap of those two door-plane
    /// edges. Every other sign takes the mean length of the two
    /// opening-parallel edges.
    pub(crate) fn calculate_width(
        &mut self,
        zone_a: &Zone,
        zone_b: Option<&Zone>,
    ) -> std::result::Result<f64, TransitIssue> {
        let mut corners = self.polygon.clone();
        if corners.len() > 1 && corners.first() == corners.last() {
            corners.pop();
        }
        if corners.len() != 4 {
            return Err(TransitIssue::NotQuadrilateral {
                vertices: corners.len(),
            });
        }

        let (inside, outside): (Vec<BPoint>, Vec<BPoint>) =
            corners.iter().copied().partition(|&p| zone_a.contains(p));
        if inside.len() != 2 {
            return Err(TransitIssue::InteriorVertices {
                found: inside.len(),
            });
        }

        // p1/p2 span the opening inside the host zone; the exterior
        // pair is ordered so the first normal edge p1-p3 is the
        // shorter of the two candidate pairings.
        let (p1, p2) = (inside[0], inside[1]);
        let (p3, p4) = if p1.distance_to(outside[0]) <= p1.distance_to(outside[1]) {
            (outside[0], outside[1])
        } else {
            (outside[1], outside[0])
        };

        let width = match self.sign {
            Sign::DoorWay => {
                let zone_b = zone_b.ok_or(TransitIssue::MissingSecondZone)?;
                let edge_a = crossed_edge(zone_a, BLine2D::new(p1, p3))?;
                let edge_b = crossed_edge(zone_b, BLine2D::new(p2, p4))?;
                (projected_length(edge_a, edge_b) + projected_length(edge_b, edge_a)) / 2.0
            }
            _ => (BLine2D::new(p1, p2).length() + BLine2D::new(p3, p4).length()) / 2.0,
        };

        let width = geometry::round_ndigits(width);
        if width <= MIN_WIDTH {
            return Err(TransitIssue::TooNarrow { width });
        }
        self.width = Some(width);
        Ok(width)
    }
}

/// The single zone-polygon edge crossed by a wall-normal edge of the
/// doorway.
fn crossed_edge(zone: &Zone, normal: BLine2D) -> std::result::Result<BLine2D, TransitIssue> {
    let crossed: Vec<BLine2D> = geometry::ring_edges(zone.polygon())
        .filter(|edge| edge.intersects(&normal))
        .collect();
    match crossed.as_slice() {
        [edge] => Ok(*edge),
        found => Err(TransitIssue::CrossedEdges {
            zone: zone.id(),
            found: found.len(),
        }),
    }
}

/// Length of `from` once projected onto `onto`, clamped to the
/// segment.
fn projected_length(from: BLine2D, onto: BLine2D) -> f64 {
    onto.nearest_point(from.p0).distance_to(onto.nearest_point(from.p1))
}
