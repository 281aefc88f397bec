//! Planar polygon predicates in latitude/longitude space.
//!
//! All tests treat degrees as Cartesian coordinates, which is what the tile
//! selector needs: tile edges are straight lines of constant latitude or
//! longitude, and polygons are small compared to the curvature that would
//! make this approximation matter.

use crate::coord::{BoundingBox, GeoPoint};

/// Orientation of an ordered point triplet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Collinear,
    Clockwise,
    CounterClockwise,
}

/// Finds the orientation of the ordered triplet `(p, q, r)`.
pub fn orientation(p: GeoPoint, q: GeoPoint, r: GeoPoint) -> Orientation {
    let val = (q.lng - p.lng) * (r.lat - q.lat) - (q.lat - p.lat) * (r.lng - q.lng);
    if val == 0.0 {
        Orientation::Collinear
    } else if val > 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::CounterClockwise
    }
}

/// Checks whether `q` lies within the bounding box of segment `pr`.
///
/// Only meaningful once `p`, `q`, `r` are known to be collinear.
pub fn on_segment(p: GeoPoint, q: GeoPoint, r: GeoPoint) -> bool {
    q.lat <= p.lat.max(r.lat)
        && q.lat >= p.lat.min(r.lat)
        && q.lng <= p.lng.max(r.lng)
        && q.lng >= p.lng.min(r.lng)
}

/// Checks whether segment `p1q1` intersects segment `p2q2`.
///
/// Touching endpoints and collinear overlaps count as intersections.
pub fn segments_intersect(p1: GeoPoint, q1: GeoPoint, p2: GeoPoint, q2: GeoPoint) -> bool {
    let o1 = orientation(p1, q1, p2);
    let o2 = orientation(p1, q1, q2);
    let o3 = orientation(p2, q2, p1);
    let o4 = orientation(p2, q2, q1);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == Orientation::Collinear && on_segment(p1, p2, q1))
        || (o2 == Orientation::Collinear && on_segment(p1, q2, q1))
        || (o3 == Orientation::Collinear && on_segment(p2, p1, q2))
        || (o4 == Orientation::Collinear && on_segment(p2, q1, q2))
}

/// A simple polygon borrowed from request data.
///
/// The ring is implicitly closed: the last vertex connects back to the
/// first, and repeating the first vertex at the end is allowed but not
/// required.
#[derive(Debug, Clone)]
pub struct Polygon<'a> {
    vertices: &'a [GeoPoint],
    bbox: BoundingBox,
}

impl<'a> Polygon<'a> {
    /// Wraps a vertex ring. Returns `None` for rings with fewer than three
    /// points, which cannot enclose an area.
    pub fn new(vertices: &'a [GeoPoint]) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }
        let bbox = BoundingBox::enclosing(vertices)?;
        Some(Self { vertices, bbox })
    }

    pub fn vertices(&self) -> &'a [GeoPoint] {
        self.vertices
    }

    /// Axis-aligned bounding box of the vertices.
    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// Iterates over the closed ring's edges.
    pub fn edges(&self) -> impl Iterator<Item = (GeoPoint, GeoPoint)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Point-in-polygon by ray casting (even-odd rule).
    ///
    /// Points exactly on the boundary are resolved by the half-open
    /// crossing test rather than special-cased, so a shared edge between
    /// two polygons belongs to exactly one of them.
    pub fn contains(&self, point: GeoPoint) -> bool {
        let mut inside = false;
        let mut j = self.vertices.len() - 1;

        for i in 0..self.vertices.len() {
            let vi = self.vertices[i];
            let vj = self.vertices[j];

            if (vi.lat > point.lat) != (vj.lat > point.lat)
                && point.lng < (vj.lng - vi.lng) * (point.lat - vi.lat) / (vj.lat - vi.lat) + vi.lng
            {
                inside = !inside;
            }
            j = i;
        }

        inside
    }

    /// True if all four corners of `bounds` are inside the polygon.
    pub fn contains_box(&self, bounds: &BoundingBox) -> bool {
        bounds.corners().iter().all(|c| self.contains(*c))
    }

    /// True if every vertex lies within `bounds` (inclusive).
    pub fn is_within(&self, bounds: &BoundingBox) -> bool {
        self.vertices.iter().all(|v| bounds.contains(*v))
    }

    /// True if the polygon and `bounds` share any point.
    ///
    /// Checks vertices in the box, box corners in the polygon, then
    /// edge-against-edge crossings.
    pub fn intersects(&self, bounds: &BoundingBox) -> bool {
        if self.vertices.iter().any(|v| bounds.contains(*v)) {
            return true;
        }

        let corners = bounds.corners();
        if corners.iter().any(|c| self.contains(*c)) {
            return true;
        }

        self.edges().any(|(a, b)| {
            (0..4).any(|k| segments_intersect(a, b, corners[k], corners[(k + 1) % 4]))
        })
    }
}
