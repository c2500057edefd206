//! Closed contours: rings of grid points.

use slotmap::{SecondaryMap, SlotMap};

use crate::{
    error::Error,
    geom::{orient, GridBox, GridPoint},
};

slotmap::new_key_type! {
    /// An index into a contour's vertex arena.
    ///
    /// Vertex ids are only meaningful for the contour that handed them out. Looking
    /// one up after its vertex was removed (for example by [`Contour::prepare`])
    /// fails cleanly instead of aliasing another vertex.
    pub struct VertexId;
}

/// A vertex in a contour's ring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContourVertex {
    pub point: GridPoint,
    prev: VertexId,
    next: VertexId,
}

impl ContourVertex {
    /// The previous vertex in ring order.
    pub fn prev(&self) -> VertexId {
        self.prev
    }

    /// The next vertex in ring order.
    pub fn next(&self) -> VertexId {
        self.next
    }
}

/// A closed loop of grid points.
///
/// Depending on its orientation, a contour is either the outer boundary of a
/// polygon (counter-clockwise) or one of its holes (clockwise). The orientation
/// (and the bounding box) are only trustworthy after [`Contour::prepare`] has
/// returned `true`.
pub struct Contour {
    vertices: SlotMap<VertexId, ContourVertex>,
    head: VertexId,
    outer: bool,
    bbox: GridBox,
}

impl std::fmt::Debug for Contour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.outer { "outer" } else { "hole" };
        write!(f, "{kind} ")?;
        f.debug_list().entries(self.points()).finish()
    }
}

impl Clone for Contour {
    fn clone(&self) -> Self {
        self.copy()
    }
}

/// Two-way correspondence between the vertices of a contour and its copy.
///
/// Produced by [`Contour::copy_linked`]. Callers that simplify a copy (or run
/// it through a boolean operation) can use this to find their way back to the
/// original vertices, for example to restore arcs that were flattened before
/// entering the kernel.
#[derive(Clone, Debug, Default)]
pub struct VertexLinks {
    to_copy: SecondaryMap<VertexId, VertexId>,
    to_source: SecondaryMap<VertexId, VertexId>,
}

impl VertexLinks {
    fn link(&mut self, source: VertexId, copy: VertexId) {
        self.to_copy.insert(source, copy);
        self.to_source.insert(copy, source);
    }

    /// The copied vertex corresponding to a vertex of the source contour.
    pub fn copy_of(&self, source: VertexId) -> Option<VertexId> {
        self.to_copy.get(source).copied()
    }

    /// The source vertex corresponding to a vertex of the copy.
    pub fn source_of(&self, copy: VertexId) -> Option<VertexId> {
        self.to_source.get(copy).copied()
    }

    pub fn len(&self) -> usize {
        self.to_copy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_copy.is_empty()
    }
}

/// Iterates over the vertices of a contour in ring order, starting at the head.
pub struct VertexIds<'a> {
    contour: &'a Contour,
    next: VertexId,
    remaining: usize,
}

impl Iterator for VertexIds<'_> {
    type Item = VertexId;

    fn next(&mut self) -> Option<VertexId> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let ret = self.next;
        self.next = self.contour.vertices[ret].next;
        Some(ret)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for VertexIds<'_> {}

impl Contour {
    /// Creates a contour with a single vertex.
    pub fn from_point(g: GridPoint) -> Self {
        let mut vertices = SlotMap::with_key();
        let head = vertices.insert_with_key(|k| ContourVertex {
            point: g,
            prev: k,
            next: k,
        });
        Contour {
            vertices,
            head,
            outer: false,
            bbox: GridBox::from_point(g),
        }
    }

    /// Creates a contour from a list of points, in ring order.
    ///
    /// The contour still has to be [prepared](Contour::prepare) before it can be
    /// used in a region.
    pub fn new<P: Into<GridPoint>>(points: impl IntoIterator<Item = P>) -> Result<Self, Error> {
        let mut points = points.into_iter().map(Into::into);
        let first = points.next().ok_or(Error::EmptyContour)?;
        let mut ret = Contour::from_point(first);
        for p in points {
            ret.append(p);
        }
        Ok(ret)
    }

    /// Adds a vertex at the end of the ring (just before the head).
    pub fn append(&mut self, g: GridPoint) -> VertexId {
        let tail = self.vertices[self.head].prev;
        self.insert_between(tail, g)
    }

    /// Inserts a vertex right after `after`.
    ///
    /// Returns `None` if `after` isn't a vertex of this contour.
    pub fn insert_after(&mut self, after: VertexId, g: GridPoint) -> Option<VertexId> {
        self.vertices.contains_key(after).then(|| self.insert_between(after, g))
    }

    fn insert_between(&mut self, prev: VertexId, g: GridPoint) -> VertexId {
        let next = self.vertices[prev].next;
        let id = self.vertices.insert(ContourVertex {
            point: g,
            prev,
            next,
        });
        self.vertices[prev].next = id;
        self.vertices[next].prev = id;
        self.bbox.include(g);
        id
    }

    /// Removes a vertex from the ring. The head moves forward if it was removed.
    fn unlink(&mut self, id: VertexId) {
        if let Some(v) = self.vertices.remove(id) {
            self.vertices[v.prev].next = v.next;
            self.vertices[v.next].prev = v.prev;
            if self.head == id {
                self.head = v.next;
            }
        }
    }

    /// The number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Always false: a contour has at least one vertex.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// The first vertex of the ring.
    pub fn head(&self) -> VertexId {
        self.head
    }

    /// The point of the first vertex.
    pub fn first_point(&self) -> GridPoint {
        self.vertices[self.head].point
    }

    pub fn vertex(&self, id: VertexId) -> Option<&ContourVertex> {
        self.vertices.get(id)
    }

    /// The vertex ids in ring order, starting at the head.
    pub fn vertex_ids(&self) -> VertexIds<'_> {
        VertexIds {
            contour: self,
            next: self.head,
            remaining: self.vertices.len(),
        }
    }

    /// The points in ring order, starting at the head.
    pub fn points(&self) -> impl ExactSizeIterator<Item = GridPoint> + '_ {
        self.vertex_ids().map(|id| self.vertices[id].point)
    }

    pub fn bbox(&self) -> GridBox {
        self.bbox
    }

    /// Is this an outer (counter-clockwise) contour?
    pub fn is_outer(&self) -> bool {
        self.outer
    }

    /// Reverses the contour if necessary, to make it an outer contour.
    pub fn make_outer(&mut self) {
        if !self.is_outer() {
            self.invert();
        }
    }

    /// Reverses the contour if necessary, to make it a hole.
    pub fn make_inner(&mut self) {
        if self.is_outer() {
            self.invert();
        }
    }

    /// Twice the signed area enclosed by the ring; positive for
    /// counter-clockwise rings.
    pub fn signed_area2(&self) -> i128 {
        let o = self.first_point();
        let mut area = 0i128;
        for id in self.vertex_ids() {
            let v = &self.vertices[id];
            let p = v.point - o;
            let n = self.vertices[v.next].point - o;
            area += p.cross(n) as i128;
        }
        area
    }

    /// Normalizes the contour.
    ///
    /// Vertices that coincide with a neighbor or lie on the line through their
    /// two neighbors are removed (repeatedly, since removing one vertex can make
    /// its neighbor redundant). Then the bounding box and orientation are
    /// recomputed.
    ///
    /// Returns `false` if the contour is degenerate: fewer than three vertices
    /// survive, or the enclosed area is zero. A degenerate contour is still a
    /// valid ring, but it must not be handed to a region or a boolean operation.
    pub fn prepare(&mut self) -> bool {
        self.bbox = GridBox::from_point(self.first_point());
        if self.len() < 3 {
            return false;
        }

        // After a removal we step back, because the previous vertex may have
        // become redundant. Once we've seen `len` good vertices in a row, we've
        // been all the way around.
        let mut cur = self.head;
        let mut clean = 0;
        while clean < self.len() && self.len() >= 3 {
            let v = &self.vertices[cur];
            let (prev, next) = (v.prev, v.next);
            if orient(self.vertices[prev].point, v.point, self.vertices[next].point) == 0 {
                self.unlink(cur);
                cur = prev;
                clean = 0;
            } else {
                cur = next;
                clean += 1;
            }
        }
        if self.len() < 3 {
            return false;
        }

        let mut bbox = GridBox::from_point(self.first_point());
        for p in self.points() {
            bbox.include(p);
        }
        self.bbox = bbox;

        let area = self.signed_area2();
        if area == 0 {
            return false;
        }
        self.outer = area > 0;
        true
    }

    /// Reverses the direction of the ring, flipping its orientation.
    pub fn invert(&mut self) {
        for v in self.vertices.values_mut() {
            std::mem::swap(&mut v.prev, &mut v.next);
        }
        self.outer = !self.outer;
    }

    /// Is `g` inside this contour?
    ///
    /// Uses a horizontal ray with half-open vertical comparisons, so a ray
    /// passing exactly through a vertex is counted once. Points on the boundary
    /// may go either way.
    pub fn grid_inside(&self, g: GridPoint) -> bool {
        if !self.bbox.contains(g) {
            return false;
        }

        let mut inside = false;
        for id in self.vertex_ids() {
            let v = &self.vertices[id];
            let vc = v.point;
            let vp = self.vertices[v.prev].point;

            let lhs = (vp.y as i64 - vc.y as i64) * (g.x as i64 - vc.x as i64);
            let rhs = (g.y as i64 - vc.y as i64) * (vp.x as i64 - vc.x as i64);
            if (vc.y <= g.y && g.y < vp.y && lhs < rhs) || (vp.y <= g.y && g.y < vc.y && lhs > rhs)
            {
                inside = !inside;
            }
        }
        inside
    }

    /// Is `other` inside this contour?
    ///
    /// This only checks bounding boxes and one point of `other`, so it is only
    /// meaningful if the two contours don't cross.
    pub fn pline_inside(&self, other: &Contour) -> bool {
        self.bbox.contains_box(&other.bbox) && self.grid_inside(other.first_point())
    }

    /// A deep copy. The copy's vertex ids are unrelated to ours.
    pub fn copy(&self) -> Contour {
        self.copy_with(|_, _| {})
    }

    /// A deep copy, together with the correspondence between our vertices and
    /// the copy's.
    pub fn copy_linked(&self) -> (Contour, VertexLinks) {
        let mut links = VertexLinks::default();
        let copy = self.copy_with(|src, dst| links.link(src, dst));
        (copy, links)
    }

    fn copy_with(&self, mut link: impl FnMut(VertexId, VertexId)) -> Contour {
        let mut dst = Contour::from_point(self.first_point());
        link(self.head, dst.head);
        for id in self.vertex_ids().skip(1) {
            let new_id = dst.append(self.vertices[id].point);
            link(id, new_id);
        }
        dst.outer = self.outer;
        dst.bbox = self.bbox;
        dst
    }
}
