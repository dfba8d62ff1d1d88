//! 2-D geometry kernel for building polygons.
//!
//! Everything operates in the x/y plane; `z` rides along on points so
//! callers keep level information attached to vertices. Polygons arrive
//! as closed rings (first vertex repeated at the end) and may be
//! non-convex with right angles (doorway cut-outs). Behavior on
//! self-intersecting rings is undefined.

use crate::constants::NDIGITS;
use itertools::Itertools;

/// A building vertex, metres.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl BPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        BPoint { x, y, z }
    }

    /// Point in the z = 0 plane.
    pub fn xy(x: f64, y: f64) -> Self {
        BPoint { x, y, z: 0.0 }
    }

    /// Planar (x/y) distance to another point.
    pub fn distance_to(self, other: Self) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

/// A line segment in the x/y plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BLine2D {
    pub p0: BPoint,
    pub p1: BPoint,
}

impl BLine2D {
    pub fn new(p0: BPoint, p1: BPoint) -> Self {
        BLine2D { p0, p1 }
    }

    pub fn length(&self) -> f64 {
        self.p0.distance_to(self.p1)
    }

    /// Nearest point of the segment to `p`: the projection onto the
    /// carrying line, clamped to the segment.
    pub fn nearest_point(&self, p: BPoint) -> BPoint {
        let dx = self.p1.x - self.p0.x;
        let dy = self.p1.y - self.p0.y;
        let len_sq = dx * dx + dy * dy;
        if len_sq == 0.0 {
            return self.p0;
        }
        let t = (((p.x - self.p0.x) * dx + (p.y - self.p0.y) * dy) / len_sq).clamp(0.0, 1.0);
        BPoint::new(self.p0.x + t * dx, self.p0.y + t * dy, self.p0.z)
    }

    /// Whether the two segments intersect; touching endpoints count.
    ///
    /// Bounding boxes must overlap on both axes and the endpoints of
    /// each segment must lie on opposite sides of (or on) the other.
    pub fn intersects(&self, other: &BLine2D) -> bool {
        let (a, b) = (self.p0, self.p1);
        let (c, d) = (other.p0, other.p1);

        let boxes_overlap = a.x.min(b.x) <= c.x.max(d.x)
            && c.x.min(d.x) <= a.x.max(b.x)
            && a.y.min(b.y) <= c.y.max(d.y)
            && c.y.min(d.y) <= a.y.max(b.y);
        if !boxes_overlap {
            return false;
        }

        cross(a, b, c) * cross(a, b, d) <= 0.0 && cross(c, d, a) * cross(c, d, b) <= 0.0
    }
}

/// Three vertices covering part of a polygon.
pub type Triangle = [BPoint; 3];

/// Twice the signed area of `abc`; positive when counter-clockwise.
fn cross(a: BPoint, b: BPoint, c: BPoint) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Absolute area of the triangle `abc`.
pub fn triangle_area(a: BPoint, b: BPoint, c: BPoint) -> f64 {
    (0.5 * cross(a, b, c)).abs()
}

/// Ear-clip triangulation of a simple polygon.
///
/// Accepts an open vertex list or a closed ring (first vertex repeated
/// last). Handles non-convex outlines and tolerates collinear
/// vertices; returns an empty list for degenerate input with fewer
/// than three distinct vertices.
pub fn triangulate(polygon: &[BPoint]) -> Vec<Triangle> {
    let mut points: Vec<BPoint> = polygon.to_vec();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    if points.len() < 3 {
        return Vec::new();
    }

    // Work on a counter-clockwise ring so ear convexity is sign-stable.
    if ring_signed_area(&points) < 0.0 {
        points.reverse();
    }

    let mut remaining: Vec<usize> = (0..points.len()).collect();
    let mut triangles = Vec::with_capacity(points.len() - 2);

    while remaining.len() > 3 {
        let ear = find_ear(&points, &remaining);
        let n = remaining.len();
        triangles.push([
            points[remaining[(ear + n - 1) % n]],
            points[remaining[ear]],
            points[remaining[(ear + 1) % n]],
        ]);
        remaining.remove(ear);
    }
    triangles.push([
        points[remaining[0]],
        points[remaining[1]],
        points[remaining[2]],
    ]);
    triangles
}

/// Index (into `remaining`) of a clippable ear: a convex corner whose
/// triangle holds no other remaining vertex. Numerically degenerate
/// rings fall back to the most convex corner so clipping always makes
/// progress.
fn find_ear(points: &[BPoint], remaining: &[usize]) -> usize {
    let n = remaining.len();
    let mut most_convex = 0;
    let mut most_convex_cross = f64::NEG_INFINITY;

    for i in 0..n {
        let prev = points[remaining[(i + n - 1) % n]];
        let cur = points[remaining[i]];
        let next = points[remaining[(i + 1) % n]];

        let c = cross(prev, cur, next);
        if c > most_convex_cross {
            most_convex_cross = c;
            most_convex = i;
        }
        if c < 0.0 {
            // Reflex corner.
            continue;
        }

        let holds_other_vertex = remaining.iter().enumerate().any(|(j, &k)| {
            j != (i + n - 1) % n
                && j != i
                && j != (i + 1) % n
                && strictly_inside(prev, cur, next, points[k])
        });
        if !holds_other_vertex {
            return i;
        }
    }
    most_convex
}

/// Strict interior test against a counter-clockwise triangle.
fn strictly_inside(a: BPoint, b: BPoint, c: BPoint, p: BPoint) -> bool {
    cross(a, b, p) > 0.0 && cross(b, c, p) > 0.0 && cross(c, a, p) > 0.0
}

fn ring_signed_area(points: &[BPoint]) -> f64 {
    points
        .iter()
        .chain(points.first())
        .tuple_windows()
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum::<f64>()
        / 2.0
}

/// Whether `p` lies inside the triangle, boundary included.
///
/// `p` must sit on the same side of every edge (or on it);
/// orientation-agnostic.
pub fn point_in_triangle(triangle: &Triangle, p: BPoint) -> bool {
    let s1 = cross(triangle[0], triangle[1], p);
    let s2 = cross(triangle[1], triangle[2], p);
    let s3 = cross(triangle[2], triangle[0], p);
    (s1 >= 0.0 && s2 >= 0.0 && s3 >= 0.0) || (s1 <= 0.0 && s2 <= 0.0 && s3 <= 0.0)
}

/// Whether `p` lies inside the triangulated polygon, boundary included.
pub fn point_in_polygon(triangles: &[Triangle], p: BPoint) -> bool {
    triangles.iter().any(|t| point_in_triangle(t, p))
}

/// Area of a polygon given as a (closed or open) vertex ring, rounded
/// to [`NDIGITS`] decimal places for determinism.
pub fn polygon_area(ring: &[BPoint]) -> f64 {
    let total: f64 = triangulate(ring)
        .iter()
        .map(|t| triangle_area(t[0], t[1], t[2]))
        .sum();
    round_ndigits(total)
}

/// Edges of a closed polygon ring.
pub fn ring_edges(ring: &[BPoint]) -> impl Iterator<Item = BLine2D> + '_ {
    ring.iter().tuple_windows().map(|(a, b)| BLine2D::new(*a, *b))
}

/// Round to [`NDIGITS`] decimal places.
///
/// Multiply-round-divide cannot represent 15 decimal places past 2^53,
/// so rounding goes through the decimal formatter instead.
pub fn round_ndigits(value: f64) -> f64 {
    if !value.is_finite() || value.abs() >= 1e16 {
        return value;
    }
    format!("{:.*}", NDIGITS, value).parse().unwrap_or(value)
}
