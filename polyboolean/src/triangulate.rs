//! Ear-clipping triangulation of regions.
//!
//! Holes are first spliced into the outer boundary through zero-width
//! "bridges", turning the region into a single weakly-simple ring. That ring is
//! then cut into triangles by repeatedly clipping off ears. All the predicates
//! are exact, so the triangles are exact too; they refer back to the region's
//! own vertices instead of copying coordinates.

use crate::{
    contour::{Contour, VertexId},
    error::Error,
    geom::{orient, GridPoint},
    region::{ContourRef, Region},
};

/// A triangle corner: a vertex of one of the region's contours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TriangleVertex {
    pub contour: ContourRef,
    pub vertex: VertexId,
}

/// A counter-clockwise triangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Triangle {
    pub v0: TriangleVertex,
    pub v1: TriangleVertex,
    pub v2: TriangleVertex,
}

impl Triangle {
    /// The three corners, in order.
    pub fn vertices(&self) -> [TriangleVertex; 3] {
        [self.v0, self.v1, self.v2]
    }
}

#[derive(Clone, Copy, Debug)]
struct Node {
    p: GridPoint,
    src: TriangleVertex,
    prev: usize,
    next: usize,
}

/// A doubly-linked ring (or several) of points, stored in one `Vec`.
#[derive(Default)]
struct Rings {
    nodes: Vec<Node>,
}

impl Rings {
    fn push(&mut self, p: GridPoint, src: TriangleVertex) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Node {
            p,
            src,
            prev: idx,
            next: idx,
        });
        idx
    }

    fn p(&self, idx: usize) -> GridPoint {
        self.nodes[idx].p
    }

    fn next(&self, idx: usize) -> usize {
        self.nodes[idx].next
    }

    fn prev(&self, idx: usize) -> usize {
        self.nodes[idx].prev
    }

    /// Adds a contour as a new ring, oriented counter-clockwise if `ccw` and
    /// clockwise otherwise. Returns one of its nodes.
    fn add_contour(&mut self, contour: &Contour, which: ContourRef, ccw: bool) -> usize {
        let mut ids: Vec<_> = contour.vertex_ids().collect();
        if (contour.signed_area2() > 0) != ccw {
            ids.reverse();
        }

        let first = self.nodes.len();
        for id in ids {
            let Some(v) = contour.vertex(id) else {
                continue;
            };
            let idx = self.push(
                v.point,
                TriangleVertex {
                    contour: which,
                    vertex: id,
                },
            );
            if idx > first {
                self.nodes[idx].prev = idx - 1;
                self.nodes[idx - 1].next = idx;
            }
        }
        let last = self.nodes.len() - 1;
        self.nodes[last].next = first;
        self.nodes[first].prev = last;
        first
    }

    /// The node with the largest `x` in a ring (and the smallest `y` among those).
    fn rightmost(&self, start: usize) -> usize {
        let mut best = start;
        let mut i = self.next(start);
        while i != start {
            let (p, b) = (self.p(i), self.p(best));
            if p.x > b.x || (p.x == b.x && p.y < b.y) {
                best = i;
            }
            i = self.next(i);
        }
        best
    }

    fn ring_len(&self, start: usize) -> usize {
        let mut len = 1;
        let mut i = self.next(start);
        while i != start {
            len += 1;
            i = self.next(i);
        }
        len
    }

    fn unlink(&mut self, idx: usize) {
        let Node { prev, next, .. } = self.nodes[idx];
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
    }

    /// Is the diagonal from `a` towards `b` inside the ring, near `a`?
    fn locally_inside(&self, a: usize, b: GridPoint) -> bool {
        let (pa, prev, next) = (self.p(a), self.p(self.prev(a)), self.p(self.next(a)));
        if orient(prev, pa, next) > 0 {
            orient(pa, b, next) <= 0 && orient(pa, prev, b) <= 0
        } else {
            orient(pa, b, prev) > 0 || orient(pa, next, b) > 0
        }
    }

    /// Finds a vertex of the outer ring that can be connected to the hole
    /// vertex `h` without crossing anything.
    ///
    /// We cast a ray from `h` in the `+x` direction and take the closest edge
    /// it hits. The visible vertex is either that edge's right endpoint or,
    /// if some reflex vertex blocks the view, the blocking vertex making the
    /// smallest angle with the ray.
    fn find_bridge(&self, outer: usize, h: usize) -> Option<usize> {
        let hp = self.p(h);

        // The hit is at x = num / den, with den > 0.
        let mut hit: Option<(i128, i128, usize, usize)> = None;
        let mut i = outer;
        loop {
            let j = self.next(i);
            let (a, b) = (self.p(i), self.p(j));
            // A ray leaving the interior crosses an upward edge first.
            if a.y <= hp.y && hp.y <= b.y && a.y < b.y {
                let den = (b.y - a.y) as i128;
                let num = a.x as i128 * den + (hp.y - a.y) as i128 * (b.x - a.x) as i128;
                let closer = hit.map_or(true, |(n, d, ..)| num * d < n * den);
                if num >= hp.x as i128 * den && closer {
                    let m = if a.y == hp.y {
                        i
                    } else if b.y == hp.y || b.x >= a.x {
                        j
                    } else {
                        i
                    };
                    hit = Some((num, den, i, m));
                }
            }
            i = j;
            if i == outer {
                break;
            }
        }

        let (num, den, edge, m) = hit?;
        if num == hp.x as i128 * den {
            // The hole touches the edge.
            return Some(m);
        }

        // Look for reflex vertices inside the triangle spanned by `h`, the hit
        // point and `m`.
        let (ea, eb) = (self.p(edge), self.p(self.next(edge)));
        let mp = self.p(m);
        let (lo, hi) = (hp.y.min(mp.y), hp.y.max(mp.y));
        let side = (mp.y - hp.y).signum() as i64;
        let mut best = m;
        // tan = dy / dx, with dx > 0
        let mut best_tan: Option<(i64, i64)> = None;
        let mut i = m;
        loop {
            let p = self.p(i);
            let in_triangle = hp.x < p.x
                && p.x <= mp.x
                && lo <= p.y
                && p.y <= hi
                && orient(ea, eb, p) >= 0
                && orient(hp, mp, p).signum() * side <= 0;
            if in_triangle {
                let tan = ((hp.y as i64 - p.y as i64).abs(), p.x as i64 - hp.x as i64);
                let better = match best_tan {
                    None => true,
                    Some((dy, dx)) => {
                        let (lhs, rhs) = (tan.0 * dx, dy * tan.1);
                        lhs < rhs || (lhs == rhs && p.x < self.p(best).x)
                    }
                };
                if better && self.locally_inside(i, hp) {
                    best = i;
                    best_tan = Some(tan);
                }
            }
            i = self.next(i);
            if i == m {
                break;
            }
        }
        Some(best)
    }

    /// Connects `a` (on the outer ring) with `b` (on a hole) by a pair of
    /// coincident edges, duplicating both endpoints.
    fn split(&mut self, a: usize, b: usize) {
        let a2 = self.push(self.p(a), self.nodes[a].src);
        let b2 = self.push(self.p(b), self.nodes[b].src);
        let an = self.next(a);
        let bp = self.prev(b);

        self.nodes[a].next = b;
        self.nodes[b].prev = a;
        self.nodes[a2].next = an;
        self.nodes[an].prev = a2;
        self.nodes[b2].next = a2;
        self.nodes[a2].prev = b2;
        self.nodes[bp].next = b2;
        self.nodes[b2].prev = bp;
    }

    fn is_ear(&self, b: usize) -> bool {
        let (a, c) = (self.prev(b), self.next(b));
        let (pa, pb, pc) = (self.p(a), self.p(b), self.p(c));
        if orient(pa, pb, pc) <= 0 {
            return false;
        }

        let mut i = self.next(c);
        while i != a {
            let p = self.p(i);
            if p != pa
                && p != pb
                && p != pc
                && orient(self.p(self.prev(i)), p, self.p(self.next(i))) <= 0
                && orient(pa, pb, p) >= 0
                && orient(pb, pc, p) >= 0
                && orient(pc, pa, p) >= 0
            {
                return false;
            }
            i = self.next(i);
        }
        true
    }

    fn triangle(&self, b: usize) -> Triangle {
        Triangle {
            v0: self.nodes[self.prev(b)].src,
            v1: self.nodes[b].src,
            v2: self.nodes[self.next(b)].src,
        }
    }

    fn clip_ears(&mut self, start: usize, out: &mut Vec<Triangle>) {
        let mut len = self.ring_len(start);
        let mut cur = start;
        let mut misses = 0;
        while len > 3 {
            if self.is_ear(cur) {
                out.push(self.triangle(cur));
                let next = self.next(cur);
                self.unlink(cur);
                len -= 1;
                cur = next;
                misses = 0;
                continue;
            }

            cur = self.next(cur);
            misses += 1;
            if misses < len {
                continue;
            }

            // We went all the way around without finding an ear. That only
            // happens with degenerate input (for example a contour that
            // touches itself), so first try to get rid of flat vertices.
            misses = 0;
            let flat = self.find_in_ring(cur, |r, i| {
                orient(r.p(r.prev(i)), r.p(i), r.p(r.next(i))) == 0
            });
            if let Some(i) = flat {
                tracing::trace!(point = ?self.p(i), "dropping flat vertex");
                cur = self.next(i);
                self.unlink(i);
                len -= 1;
                continue;
            }

            let convex = self
                .find_in_ring(cur, |r, i| {
                    orient(r.p(r.prev(i)), r.p(i), r.p(r.next(i))) > 0
                })
                .unwrap_or(cur);
            tracing::warn!(point = ?self.p(convex), "no ear found, clipping anyway");
            out.push(self.triangle(convex));
            cur = self.next(convex);
            self.unlink(convex);
            len -= 1;
        }

        if len == 3 {
            let (a, c) = (self.prev(cur), self.next(cur));
            if orient(self.p(a), self.p(cur), self.p(c)) > 0 {
                out.push(self.triangle(cur));
            }
        }
    }

    fn find_in_ring(&self, start: usize, pred: impl Fn(&Self, usize) -> bool) -> Option<usize> {
        let mut i = start;
        loop {
            if pred(self, i) {
                return Some(i);
            }
            i = self.next(i);
            if i == start {
                return None;
            }
        }
    }
}

/// Triangulates a region, holes included.
///
/// The triangles cover exactly the inside of the region. Every triangle is
/// counter-clockwise and its corners refer to the region's own vertices, so
/// they stay valid as long as the region isn't modified.
///
/// Fails with [`Error::DegenerateContour`] if the region has no outer contour,
/// or if it has fewer than three vertices. Degenerate holes are ignored.
pub fn triangulate(region: &Region) -> Result<Vec<Triangle>, Error> {
    let outer = region.outer().ok_or(Error::DegenerateContour(0))?;
    if outer.len() < 3 {
        return Err(Error::DegenerateContour(outer.len()));
    }

    let mut rings = Rings::default();
    let start = rings.add_contour(outer, ContourRef::Outer, true);

    let mut holes = Vec::new();
    for (i, hole) in region.holes().iter().enumerate() {
        if hole.len() < 3 || hole.signed_area2() == 0 {
            continue;
        }
        let first = rings.add_contour(hole, ContourRef::Hole(i), false);
        holes.push(rings.rightmost(first));
    }

    // Rightmost holes first: later holes may then bridge to earlier ones.
    holes.sort_by(|&h0, &h1| {
        let (p0, p1) = (rings.p(h0), rings.p(h1));
        p1.x.cmp(&p0.x).then(p0.y.cmp(&p1.y))
    });
    for h in holes {
        match rings.find_bridge(start, h) {
            Some(m) => rings.split(m, h),
            None => tracing::warn!(point = ?rings.p(h), "couldn't bridge hole, skipping it"),
        }
    }

    let mut out = Vec::with_capacity(rings.nodes.len());
    rings.clip_ears(start, &mut out);
    tracing::debug!(
        vertices = rings.nodes.len(),
        triangles = out.len(),
        "triangulated region"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::strategies::rect_contour;

    fn point(region: &Region, tv: TriangleVertex) -> GridPoint {
        region
            .contour(tv.contour)
            .and_then(|c| c.vertex(tv.vertex))
            .unwrap()
            .point
    }

    fn area2(region: &Region, t: &Triangle) -> i64 {
        orient(point(region, t.v0), point(region, t.v1), point(region, t.v2))
    }

    fn rect(x0: i32, y0: i32, x1: i32, y1: i32) -> Contour {
        rect_contour((GridPoint::new(x0, y0), GridPoint::new(x1, y1)))
    }

    #[test]
    fn square() {
        let mut region = Region::new();
        region.add_contour(rect(0, 0, 10, 10)).unwrap();
        let triangles = triangulate(&region).unwrap();
        assert_eq!(triangles.len(), 2);
        assert!(triangles.iter().all(|t| area2(&region, t) > 0));
        assert_eq!(
            triangles.iter().map(|t| area2(&region, t)).sum::<i64>(),
            200
        );
    }

    #[test]
    fn concave() {
        // An L shape.
        let mut c = Contour::new([(0, 0), (10, 0), (10, 4), (4, 4), (4, 10), (0, 10)]).unwrap();
        assert!(c.prepare());
        let mut region = Region::new();
        region.add_contour(c).unwrap();

        let triangles = triangulate(&region).unwrap();
        assert_eq!(triangles.len(), 4);
        assert!(triangles.iter().all(|t| area2(&region, t) > 0));
        assert_eq!(
            triangles.iter().map(|t| area2(&region, t)).sum::<i64>(),
            2 * 64
        );
    }

    #[test]
    fn square_with_hole() {
        let mut hole = rect(3, 3, 7, 7);
        hole.make_inner();
        let mut region = Region::new();
        region.add_contour(rect(0, 0, 10, 10)).unwrap();
        region.add_contour(hole).unwrap();

        let triangles = triangulate(&region).unwrap();
        // Ten ring vertices after bridging: four outer, four hole, two copies.
        assert_eq!(triangles.len(), 8);
        assert!(triangles.iter().all(|t| area2(&region, t) > 0));
        assert_eq!(
            triangles.iter().map(|t| area2(&region, t)).sum::<i64>(),
            2 * (100 - 16)
        );
        assert!(triangles
            .iter()
            .flat_map(Triangle::vertices)
            .any(|tv| tv.contour == ContourRef::Hole(0)));
    }

    #[test]
    fn degenerate() {
        assert_matches!(
            triangulate(&Region::new()),
            Err(Error::DegenerateContour(0))
        );

        let mut c = Contour::new([(0, 0), (1, 1)]).unwrap();
        c.invert();
        let mut region = Region::new();
        region.add_contour(c).unwrap();
        assert_matches!(triangulate(&region), Err(Error::DegenerateContour(2)));
    }
}
