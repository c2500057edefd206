//! Proptest strategies that produce reasonable grid input.
//!
//! "Reasonable" here means small coordinates, so that random shapes overlap
//! often and hit the interesting degenerate cases (shared vertices, collinear
//! edges, coincident segments).

use proptest::prelude::*;

use crate::{
    contour::Contour,
    geom::{orient, GridPoint},
    region::RegionSet,
};

pub fn point(range: i32) -> impl Strategy<Value = GridPoint> {
    (-range..=range, -range..=range).prop_map(|(x, y)| GridPoint::new(x, y))
}

/// An arbitrary (possibly self-intersecting, possibly degenerate) ring.
pub fn ring(max_len: usize) -> impl Strategy<Value = Vec<GridPoint>> {
    prop::collection::vec(point(20), 1..=max_len)
}

/// An axis-aligned rectangle as `(min, max)` corners, with positive area.
pub fn rect() -> impl Strategy<Value = (GridPoint, GridPoint)> {
    (point(20), 1..15i32, 1..15i32)
        .prop_map(|(min, w, h)| (min, GridPoint::new(min.x + w, min.y + h)))
}

/// The corners of a counter-clockwise triangle with positive area.
///
/// Its edges go in every direction, so two of them usually cross away from
/// the grid.
pub fn triangle() -> impl Strategy<Value = [GridPoint; 3]> {
    (point(20), point(20), point(20))
        .prop_filter("degenerate triangle", |&(a, b, c)| orient(a, b, c) != 0)
        .prop_map(|(a, b, c)| if orient(a, b, c) > 0 { [a, b, c] } else { [a, c, b] })
}

/// A set holding a single triangle.
pub fn triangle_set(t: [GridPoint; 3]) -> RegionSet {
    let mut c = Contour::new(t).unwrap();
    assert!(c.prepare());
    let mut set = RegionSet::new();
    set.add_contour(c).unwrap();
    set
}

/// Is `p` strictly inside the triangle, and further than `margin` from the
/// lines through its edges?
pub fn deep_in_triangle(p: GridPoint, t: [GridPoint; 3], margin: i64) -> bool {
    edge_clearance(p, t, margin).all(|o| o > 0)
}

/// Is `p` further than `margin` from the lines through the triangle's edges?
pub fn clear_of_triangle(p: GridPoint, t: [GridPoint; 3], margin: i64) -> bool {
    edge_clearance(p, t, margin).all(|o| o != 0)
}

/// For each edge, the orientation of `p` relative to it, or zero if `p` is
/// within `margin` of the edge's line.
fn edge_clearance(p: GridPoint, t: [GridPoint; 3], margin: i64) -> impl Iterator<Item = i64> {
    (0..3).map(move |i| {
        let (a, b) = (t[i], t[(i + 1) % 3]);
        let o = orient(a, b, p);
        let d = b - a;
        let len2 = d.dot(d) as i128;
        if (o as i128).pow(2) > (margin as i128).pow(2) * len2 {
            o
        } else {
            0
        }
    })
}

/// A counter-clockwise contour for a rectangle.
pub fn rect_contour((min, max): (GridPoint, GridPoint)) -> Contour {
    let mut c = Contour::from_point(min);
    c.append(GridPoint::new(max.x, min.y));
    c.append(max);
    c.append(GridPoint::new(min.x, max.y));
    assert!(c.prepare());
    c
}

/// A set holding a single rectangle.
pub fn rect_set(r: (GridPoint, GridPoint)) -> RegionSet {
    let mut set = RegionSet::new();
    set.add_contour(rect_contour(r)).unwrap();
    set
}

/// Is `p` strictly inside the rectangle?
pub fn in_rect(p: GridPoint, (min, max): (GridPoint, GridPoint)) -> bool {
    min.x < p.x && p.x < max.x && min.y < p.y && p.y < max.y
}
