//! Fatal error taxonomy.
//!
//! Every construction- or validation-time failure aggregates all
//! offending items into a single report; partial graphs are never
//! returned. Per-step simulation code never raises; violations there
//! are logged and clamped.

use crate::building::Sign;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, BimError>;

/// One element the ingest could not map.
#[derive(Clone, Debug)]
pub struct MalformedElement {
    pub sign: String,
    pub id: String,
    pub name: String,
    pub z_level: f64,
    pub reason: String,
}

impl fmt::Display for MalformedElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}), name={}, level={}: {}",
            self.sign, self.id, self.name, self.z_level, self.reason
        )
    }
}

/// Why a transit failed width measurement.
#[derive(Clone, Debug, PartialEq)]
pub enum TransitIssue {
    /// The transit lists no zones at all.
    Unconnected,
    /// The transit references a zone the building does not contain.
    UnknownZone(Uuid),
    /// The doorway polygon does not have exactly four distinct vertices.
    NotQuadrilateral { vertices: usize },
    /// Not exactly two doorway corners fall inside the host zone.
    InteriorVertices { found: usize },
    /// A `DoorWay` needs a zone on each side.
    MissingSecondZone,
    /// A wall-normal edge must cross exactly one edge of the zone polygon.
    CrossedEdges { zone: Uuid, found: usize },
    /// Measured width does not exceed `MIN_WIDTH`.
    TooNarrow { width: f64 },
}

impl fmt::Display for TransitIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitIssue::Unconnected => write!(f, "no zones listed in output"),
            TransitIssue::UnknownZone(id) => write!(f, "unknown zone {id}"),
            TransitIssue::NotQuadrilateral { vertices } => {
                write!(f, "expected 4 distinct doorway corners, found {vertices}")
            }
            TransitIssue::InteriorVertices { found } => {
                write!(f, "expected 2 corners inside the host zone, found {found}")
            }
            TransitIssue::MissingSecondZone => write!(f, "DoorWay has no second zone"),
            TransitIssue::CrossedEdges { zone, found } => {
                write!(f, "normal edge crosses {found} edges of zone {zone}, expected 1")
            }
            TransitIssue::TooNarrow { width } => write!(f, "width {width} below minimum"),
        }
    }
}

/// A transit whose geometry could not be measured, with its host zone.
#[derive(Clone, Debug)]
pub struct InvalidTransit {
    pub id: Uuid,
    pub sign: Sign,
    pub zone_id: Uuid,
    pub zone_name: String,
    pub issue: TransitIssue,
}

impl fmt::Display for InvalidTransit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}), Zone({}, name={}): {}",
            self.sign, self.id, self.zone_id, self.zone_name, self.issue
        )
    }
}

/// A zone the validator could not reach from the safety zone.
#[derive(Clone, Debug)]
pub struct UnreachableZone {
    pub id: Uuid,
    pub sign: Sign,
    pub name: String,
    pub z_level: f64,
}

impl fmt::Display for UnreachableZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}, {}) on level at {}",
            self.sign, self.id, self.name, self.z_level
        )
    }
}

#[derive(Error, Debug)]
pub enum BimError {
    /// The building description could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The building description is not structurally valid JSON.
    #[error("building description is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// One or more elements failed to map; all of them are listed.
    #[error("malformed building elements:{}", list(.0))]
    Ingest(Vec<MalformedElement>),

    /// One or more transits failed width measurement; all listed.
    #[error("invalid transit geometry:{}", list(.0))]
    TransitGeometry(Vec<InvalidTransit>),

    /// Zones unreachable from the safety zone; all listed.
    #[error("graph connectivity is broken, unreachable zones:{}", list(.0))]
    GraphConnectivity(Vec<UnreachableZone>),

    /// A data-model invariant failed at construction time.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

fn list<T: fmt::Display>(items: &[T]) -> String {
    items.iter().map(|item| format!("\n  {item}")).collect()
}
