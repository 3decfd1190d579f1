use super::{BoundingBox, Point};
use serde::Serialize;

/// Distance (in degrees) within which a point counts as lying on an edge.
const EDGE_EPSILON: f64 = 1e-9;

/// Where a point sits relative to a shape.
///
/// Ordered so that the "strongest" containment wins when combining multipolygon parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Containment {
    Outside,
    Boundary,
    Inside,
}

impl Containment {
    pub fn is_contained(self) -> bool {
        !matches!(self, Containment::Outside)
    }
}

/// Structural problems detected while building a shape.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidShape {
    #[error("ring has {found} distinct vertices; at least 3 required")]
    TooFewVertices { found: usize },
    #[error("vertex ({lng}, {lat}) is not a valid longitude/latitude")]
    BadVertex { lng: f64, lat: f64 },
    #[error("ring encloses no area")]
    Degenerate,
    #[error("multipolygon has no parts")]
    Empty,
}

/// Closed ring of vertices. The closing vertex is implicit and never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    vertices: Vec<Point>,
}

impl Ring {
    pub fn new(mut vertices: Vec<Point>) -> Result<Self, InvalidShape> {
        if let Some(bad) = vertices
            .iter()
            .find(|vertex| Point::new(vertex.lng, vertex.lat).is_err())
        {
            return Err(InvalidShape::BadVertex {
                lng: bad.lng,
                lat: bad.lat,
            });
        }

        vertices.dedup();
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        if vertices.len() < 3 {
            return Err(InvalidShape::TooFewVertices {
                found: vertices.len(),
            });
        }

        let ring = Self { vertices };
        if ring.signed_area() == 0.0 {
            return Err(InvalidShape::Degenerate);
        }
        Ok(ring)
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Shoelace area; positive for counter-clockwise rings.
    pub fn signed_area(&self) -> f64 {
        self.edges()
            .map(|(a, b)| a.lng * b.lat - b.lng * a.lat)
            .sum::<f64>()
            / 2.0
    }

    pub fn bounding_box(&self) -> BoundingBox {
        // vertices is never empty after construction
        BoundingBox::of_points(&self.vertices).unwrap_or(BoundingBox {
            min_lng: 0.0,
            min_lat: 0.0,
            max_lng: 0.0,
            max_lat: 0.0,
        })
    }

    /// Even-odd ray cast with an explicit on-edge check first.
    pub fn locate(&self, point: Point) -> Containment {
        if self.edges().any(|(a, b)| on_segment(point, a, b)) {
            return Containment::Boundary;
        }

        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.lat > point.lat) != (b.lat > point.lat) {
                let crossing = (b.lng - a.lng) * (point.lat - a.lat) / (b.lat - a.lat) + a.lng;
                if point.lng < crossing {
                    inside = !inside;
                }
            }
        }

        if inside {
            Containment::Inside
        } else {
            Containment::Outside
        }
    }
}

fn on_segment(p: Point, a: Point, b: Point) -> bool {
    let dx = b.lng - a.lng;
    let dy = b.lat - a.lat;
    let length = dx.hypot(dy);
    if length == 0.0 {
        return p == a;
    }
    // |cross| / length is the perpendicular distance from p to the edge's line.
    let cross = dx * (p.lat - a.lat) - dy * (p.lng - a.lng);
    if cross.abs() > EDGE_EPSILON * length {
        return false;
    }

    p.lng >= a.lng.min(b.lng) - EDGE_EPSILON
        && p.lng <= a.lng.max(b.lng) + EDGE_EPSILON
        && p.lat >= a.lat.min(b.lat) - EDGE_EPSILON
        && p.lat <= a.lat.max(b.lat) + EDGE_EPSILON
}

/// Exterior ring with zero or more holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    exterior: Ring,
    holes: Vec<Ring>,
}

impl Polygon {
    pub fn new(exterior: Ring, holes: Vec<Ring>) -> Self {
        Self { exterior, holes }
    }

    /// First ring is the exterior, the rest are holes (GeoJSON ordering).
    pub fn from_rings(rings: Vec<Vec<Point>>) -> Result<Self, InvalidShape> {
        let mut rings = rings.into_iter();
        let exterior = Ring::new(rings.next().ok_or(InvalidShape::TooFewVertices { found: 0 })?)?;
        let holes = rings.map(Ring::new).collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(exterior, holes))
    }

    pub fn exterior(&self) -> &Ring {
        &self.exterior
    }

    pub fn holes(&self) -> &[Ring] {
        &self.holes
    }

    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|hole| hole.signed_area().abs()).sum();
        (self.exterior.signed_area().abs() - holes).max(0.0)
    }

    pub fn locate(&self, point: Point) -> Containment {
        match self.exterior.locate(point) {
            Containment::Outside => return Containment::Outside,
            Containment::Boundary => return Containment::Boundary,
            Containment::Inside => {}
        }

        for hole in &self.holes {
            match hole.locate(point) {
                Containment::Inside => return Containment::Outside,
                Containment::Boundary => return Containment::Boundary,
                Containment::Outside => {}
            }
        }

        Containment::Inside
    }
}

/// One or more polygons treated as a single shape.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiPolygon {
    parts: Vec<Polygon>,
    bbox: BoundingBox,
}

impl MultiPolygon {
    pub fn new(parts: Vec<Polygon>) -> Result<Self, InvalidShape> {
        let bbox = parts
            .iter()
            .map(|part| part.exterior.bounding_box())
            .reduce(|acc, next| acc.union(&next))
            .ok_or(InvalidShape::Empty)?;
        Ok(Self { parts, bbox })
    }

    pub fn parts(&self) -> &[Polygon] {
        &self.parts
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    pub fn area(&self) -> f64 {
        self.parts.iter().map(Polygon::area).sum()
    }

    pub fn locate(&self, point: Point) -> Containment {
        if !self.bbox.contains(point) {
            return Containment::Outside;
        }
        self.parts
            .iter()
            .map(|part| part.locate(point))
            .max()
            .unwrap_or(Containment::Outside)
    }
}

impl From<Polygon> for MultiPolygon {
    fn from(polygon: Polygon) -> Self {
        let bbox = polygon.exterior.bounding_box();
        Self {
            parts: vec![polygon],
            bbox,
        }
    }
}

#[cfg(test)]
pub(crate) fn rect(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Vec<Point> {
    vec![
        Point {
            lng: min_lng,
            lat: min_lat,
        },
        Point {
            lng: max_lng,
            lat: min_lat,
        },
        Point {
            lng: max_lng,
            lat: max_lat,
        },
        Point {
            lng: min_lng,
            lat: max_lat,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lng: f64, lat: f64) -> Point {
        Point { lng, lat }
    }

    fn square_with_hole() -> Polygon {
        Polygon::from_rings(vec![rect(0.0, 0.0, 10.0, 10.0), rect(4.0, 4.0, 6.0, 6.0)])
            .expect("valid polygon")
    }

    #[test]
    fn ring_drops_closing_vertex_and_rejects_degenerates() {
        let mut closed = rect(0.0, 0.0, 1.0, 1.0);
        closed.push(pt(0.0, 0.0));
        let ring = Ring::new(closed).expect("valid ring");
        assert_eq!(ring.vertices().len(), 4);
        assert_eq!(ring.signed_area(), 1.0);

        assert_eq!(
            Ring::new(vec![pt(0.0, 0.0), pt(1.0, 1.0), pt(0.0, 0.0)]),
            Err(InvalidShape::TooFewVertices { found: 2 })
        );
        assert_eq!(
            Ring::new(vec![pt(0.0, 0.0), pt(1.0, 1.0), pt(2.0, 2.0)]),
            Err(InvalidShape::Degenerate)
        );
        assert!(matches!(
            Ring::new(vec![pt(0.0, 0.0), pt(200.0, 1.0), pt(2.0, 0.0)]),
            Err(InvalidShape::BadVertex { .. })
        ));
    }

    #[test]
    fn hole_excludes_interior_points() {
        let polygon = square_with_hole();
        assert_eq!(polygon.locate(pt(2.0, 2.0)), Containment::Inside);
        assert_eq!(polygon.locate(pt(5.0, 5.0)), Containment::Outside);
        assert_eq!(polygon.locate(pt(11.0, 5.0)), Containment::Outside);
        assert_eq!(polygon.area(), 96.0);
    }

    #[test]
    fn edges_and_vertices_are_boundary() {
        let polygon = square_with_hole();
        assert_eq!(polygon.locate(pt(0.0, 5.0)), Containment::Boundary);
        assert_eq!(polygon.locate(pt(10.0, 10.0)), Containment::Boundary);
        assert_eq!(polygon.locate(pt(4.0, 5.0)), Containment::Boundary);
        assert_eq!(polygon.locate(pt(6.0, 6.0)), Containment::Boundary);
    }

    #[test]
    fn edge_tolerance_does_not_grow_on_short_edges() {
        // Two triangles sharing a 1e-5 degree diagonal, tract-scale.
        let (x, y, d) = (-81.63, 38.35, 1e-5);
        let lower = Polygon::from_rings(vec![vec![pt(x, y), pt(x + d, y), pt(x + d, y + d)]])
            .expect("lower triangle");
        let upper = Polygon::from_rings(vec![vec![pt(x, y), pt(x + d, y + d), pt(x, y + d)]])
            .expect("upper triangle");

        // About 0.28 m off the diagonal, strictly inside the upper triangle.
        let inside_upper = pt(x + 0.3 * d, y + 0.7 * d);
        assert_eq!(upper.locate(inside_upper), Containment::Inside);
        assert_eq!(lower.locate(inside_upper), Containment::Outside);

        let on_diagonal = pt(x + 0.5 * d, y + 0.5 * d);
        assert_eq!(upper.locate(on_diagonal), Containment::Boundary);
        assert_eq!(lower.locate(on_diagonal), Containment::Boundary);
    }

    #[test]
    fn concave_polygon_uses_even_odd_rule() {
        // L-shaped polygon: the notch at the top right is outside.
        let ring = vec![
            pt(0.0, 0.0),
            pt(4.0, 0.0),
            pt(4.0, 2.0),
            pt(2.0, 2.0),
            pt(2.0, 4.0),
            pt(0.0, 4.0),
        ];
        let polygon = Polygon::from_rings(vec![ring]).unwrap();
        assert_eq!(polygon.locate(pt(1.0, 3.0)), Containment::Inside);
        assert_eq!(polygon.locate(pt(3.0, 1.0)), Containment::Inside);
        assert_eq!(polygon.locate(pt(3.0, 3.0)), Containment::Outside);
        assert_eq!(polygon.area(), 12.0);
    }

    #[test]
    fn multipolygon_prefers_strongest_containment() {
        let west = Polygon::from_rings(vec![rect(0.0, 0.0, 1.0, 1.0)]).unwrap();
        let east = Polygon::from_rings(vec![rect(1.0, 0.0, 2.0, 1.0)]).unwrap();
        let shape = MultiPolygon::new(vec![west, east]).unwrap();

        assert_eq!(shape.locate(pt(0.5, 0.5)), Containment::Inside);
        assert_eq!(shape.locate(pt(1.5, 0.5)), Containment::Inside);
        assert_eq!(shape.locate(pt(1.0, 0.5)), Containment::Boundary);
        assert_eq!(shape.locate(pt(3.0, 0.5)), Containment::Outside);
        assert_eq!(shape.area(), 2.0);
        assert_eq!(shape.bounding_box().max_lng, 2.0);
        assert_eq!(MultiPolygon::new(Vec::new()), Err(InvalidShape::Empty));
    }
}
