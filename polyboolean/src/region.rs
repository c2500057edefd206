//! Polygons with holes, and sets of them.

use slotmap::SlotMap;

use crate::{
    contour::{Contour, VertexLinks},
    error::Error,
    geom::{GridBox, GridPoint},
    triangulate::{triangulate, Triangle, TriangleVertex},
};

slotmap::new_key_type! {
    /// An index into a [`RegionSet`].
    pub struct RegionId;
}

/// Names one of the contours of a [`Region`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContourRef {
    Outer,
    Hole(usize),
}

/// A single polygon: an outer contour and any number of holes.
///
/// Holes are supposed to lie inside the outer contour, and not inside one
/// another. That isn't checked (it would need a full geometric test).
#[derive(Default)]
pub struct Region {
    outer: Option<Contour>,
    holes: Vec<Contour>,
    triangles: Vec<Triangle>,
}

impl std::fmt::Debug for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Region")
            .field("outer", &self.outer)
            .field("holes", &self.holes)
            .finish()
    }
}

impl Clone for Region {
    fn clone(&self) -> Self {
        self.copy()
    }
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a prepared contour to this region.
    ///
    /// An outer contour becomes the boundary; anything else becomes a hole.
    pub fn add_contour(&mut self, contour: Contour) -> Result<(), Error> {
        if contour.is_outer() {
            if self.outer.is_some() {
                return Err(Error::DuplicateOuter);
            }
            self.outer = Some(contour);
        } else {
            if self.outer.is_none() {
                return Err(Error::MissingOuter);
            }
            self.holes.push(contour);
        }
        self.triangles.clear();
        Ok(())
    }

    pub fn outer(&self) -> Option<&Contour> {
        self.outer.as_ref()
    }

    pub fn holes(&self) -> &[Contour] {
        &self.holes
    }

    pub fn contour(&self, which: ContourRef) -> Option<&Contour> {
        match which {
            ContourRef::Outer => self.outer.as_ref(),
            ContourRef::Hole(i) => self.holes.get(i),
        }
    }

    /// All contours, outer first.
    pub fn contours(&self) -> impl Iterator<Item = (ContourRef, &Contour)> {
        self.outer
            .iter()
            .map(|c| (ContourRef::Outer, c))
            .chain(
                self.holes
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (ContourRef::Hole(i), c)),
            )
    }

    /// The outer contour's bounding box.
    pub fn bbox(&self) -> Option<GridBox> {
        self.outer.as_ref().map(Contour::bbox)
    }

    /// The triangles computed by the last call to [`Region::triangulate`].
    ///
    /// Empty if the region was never triangulated, or was modified since.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Triangulates the region and remembers the result.
    pub fn triangulate(&mut self) -> Result<&[Triangle], Error> {
        self.triangles = triangulate(self)?;
        Ok(&self.triangles)
    }

    /// Is `g` inside the outer contour and outside all holes?
    pub fn grid_inside(&self, g: GridPoint) -> bool {
        self.outer.as_ref().is_some_and(|o| o.grid_inside(g))
            && !self.holes.iter().any(|h| h.grid_inside(g))
    }

    /// Is `c` inside the outer contour and not inside any hole?
    pub fn pline_inside(&self, c: &Contour) -> bool {
        self.outer.as_ref().is_some_and(|o| o.pline_inside(c))
            && !self.holes.iter().any(|h| h.pline_inside(c))
    }

    /// A deep copy. Triangles are carried over, pointing at the copied vertices.
    pub fn copy(&self) -> Region {
        let mut links = Vec::new();
        let mut copy_contour = |c: &Contour| {
            let (copy, l) = c.copy_linked();
            links.push(l);
            copy
        };
        let outer = self.outer.as_ref().map(&mut copy_contour);
        let holes = self.holes.iter().map(&mut copy_contour).collect();

        let link = |tv: TriangleVertex| -> Option<TriangleVertex> {
            let idx = match tv.contour {
                ContourRef::Outer => 0,
                ContourRef::Hole(i) => i + 1,
            };
            let l: &VertexLinks = links.get(idx)?;
            Some(TriangleVertex {
                contour: tv.contour,
                vertex: l.copy_of(tv.vertex)?,
            })
        };
        let triangles = self
            .triangles
            .iter()
            .filter_map(|t| {
                Some(Triangle {
                    v0: link(t.v0)?,
                    v1: link(t.v1)?,
                    v2: link(t.v2)?,
                })
            })
            .collect();

        Region {
            outer,
            holes,
            triangles,
        }
    }
}

/// A collection of disjoint regions.
///
/// This is what goes in and out of boolean operations: one operation can split
/// a polygon into several, or merge several into one. The order of regions is
/// insertion order, and doesn't mean anything.
#[derive(Default)]
pub struct RegionSet {
    regions: SlotMap<RegionId, Region>,
    order: Vec<RegionId>,
}

impl std::fmt::Debug for RegionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.regions()).finish()
    }
}

impl Clone for RegionSet {
    fn clone(&self) -> Self {
        self.copy()
    }
}

impl RegionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from a stream of prepared contours, in any order.
    ///
    /// Outer contours are placed first, so that holes can find their container
    /// no matter where they appear in the stream.
    pub fn from_contours(contours: impl IntoIterator<Item = Contour>) -> Result<Self, Error> {
        let mut ret = RegionSet::new();
        let mut holes = Vec::new();
        for c in contours {
            ret.put(c, &mut holes)?;
        }
        ret.add_contours(holes)?;
        Ok(ret)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id)
    }

    /// The regions with their ids, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (RegionId, &Region)> {
        self.order.iter().map(|id| (*id, &self.regions[*id]))
    }

    /// The regions, in insertion order.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.order.iter().map(|id| &self.regions[*id])
    }

    /// Appends a region. It must have an outer contour.
    pub fn push_region(&mut self, region: Region) -> Result<RegionId, Error> {
        if region.outer.is_none() {
            return Err(Error::MissingOuter);
        }
        let id = self.regions.insert(region);
        self.order.push(id);
        Ok(id)
    }

    pub fn remove(&mut self, id: RegionId) -> Option<Region> {
        let region = self.regions.remove(id)?;
        self.order.retain(|r| *r != id);
        Some(region)
    }

    /// Adds a prepared contour to the set.
    ///
    /// An outer contour starts a new region. A hole goes to the region with the
    /// smallest outer contour containing it; if there isn't one, the input is
    /// malformed and we return [`Error::OrphanHole`].
    pub fn add_contour(&mut self, contour: Contour) -> Result<(), Error> {
        if contour.is_outer() {
            let mut region = Region::new();
            region.add_contour(contour)?;
            self.push_region(region)?;
            return Ok(());
        }

        let mut best: Option<(RegionId, &Contour)> = None;
        for (id, region) in self.iter() {
            let Some(outer) = region.outer() else {
                continue;
            };
            let smaller = match best {
                None => true,
                Some((_, smallest)) => smallest.pline_inside(outer),
            };
            if smaller && outer.pline_inside(&contour) {
                best = Some((id, outer));
            }
        }
        let (id, _) = best.ok_or(Error::OrphanHole)?;
        self.regions[id].add_contour(contour)
    }

    /// Adds several prepared contours, one at a time.
    pub fn add_contours(&mut self, contours: impl IntoIterator<Item = Contour>) -> Result<(), Error> {
        for c in contours {
            self.add_contour(c)?;
        }
        Ok(())
    }

    /// Adds an outer contour straight away, or sets a hole aside in `holes`
    /// to be added once all the outer contours are in place.
    pub fn put(&mut self, contour: Contour, holes: &mut Vec<Contour>) -> Result<(), Error> {
        if contour.is_outer() {
            self.add_contour(contour)
        } else {
            holes.push(contour);
            Ok(())
        }
    }

    /// Moves all of `other`'s regions to the end of this set, leaving `other` empty.
    ///
    /// The contours themselves are moved, not copied. Each region is still
    /// re-keyed into this set's arena, so this is linear in the number of
    /// regions in `other` (but independent of how many vertices they hold).
    pub fn join(&mut self, other: &mut RegionSet) {
        for id in other.order.drain(..) {
            if let Some(region) = other.regions.remove(id) {
                let new_id = self.regions.insert(region);
                self.order.push(new_id);
            }
        }
        other.regions.clear();
    }

    /// Is `g` inside some region (and not inside one of its holes)?
    pub fn grid_inside(&self, g: GridPoint) -> bool {
        self.regions().any(|r| r.grid_inside(g))
    }

    /// Is `c` inside some region (and not inside one of its holes)?
    pub fn pline_inside(&self, c: &Contour) -> bool {
        self.regions().any(|r| r.pline_inside(c))
    }

    /// A deep copy of every region and contour.
    pub fn copy(&self) -> RegionSet {
        let mut ret = RegionSet::new();
        for region in self.regions() {
            let id = ret.regions.insert(region.copy());
            ret.order.push(id);
        }
        ret
    }

    /// Drops every region, contour and vertex in the set.
    pub fn clear(&mut self) {
        self.regions.clear();
        self.order.clear();
    }

    /// The bounding box of all the outer contours.
    pub fn bbox(&self) -> Option<GridBox> {
        self.regions()
            .filter_map(Region::bbox)
            .reduce(|a, b| a.union(&b))
    }

    /// Checks that every contour fits on the 20-bit grid.
    pub fn check_domain(&self) -> bool {
        self.regions().all(|r| {
            r.contours()
                .all(|(_, c)| c.bbox().min.in_domain() && c.bbox().max.in_domain())
        })
    }

    /// Triangulates one region, storing the triangles on it.
    pub fn triangulate(&mut self, id: RegionId) -> Result<&[Triangle], Error> {
        self.regions
            .get_mut(id)
            .ok_or(Error::UnknownRegion)?
            .triangulate()
    }

    /// Consumes the set, yielding its regions in order.
    pub fn into_regions(mut self) -> impl Iterator<Item = Region> {
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .filter_map(move |id| self.regions.remove(id))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::strategies::rect_contour;

    fn rect(x0: i32, y0: i32, x1: i32, y1: i32) -> Contour {
        rect_contour((GridPoint::new(x0, y0), GridPoint::new(x1, y1)))
    }

    fn hole(x0: i32, y0: i32, x1: i32, y1: i32) -> Contour {
        let mut c = rect(x0, y0, x1, y1);
        c.make_inner();
        c
    }

    fn p(x: i32, y: i32) -> GridPoint {
        GridPoint::new(x, y)
    }

    #[test]
    fn region_contours() {
        let mut r = Region::new();
        assert_matches!(r.add_contour(hole(2, 2, 4, 4)), Err(Error::MissingOuter));
        r.add_contour(rect(0, 0, 10, 10)).unwrap();
        assert_matches!(r.add_contour(rect(0, 0, 5, 5)), Err(Error::DuplicateOuter));
        r.add_contour(hole(2, 2, 4, 4)).unwrap();
        assert_eq!(r.holes().len(), 1);
        assert_eq!(
            r.contours().map(|(which, _)| which).collect::<Vec<_>>(),
            vec![ContourRef::Outer, ContourRef::Hole(0)]
        );
    }

    #[test]
    fn polygon_with_hole() {
        let mut set = RegionSet::new();
        set.add_contour(rect(0, 0, 10, 10)).unwrap();
        set.add_contour(hole(3, 3, 7, 7)).unwrap();
        assert_eq!(set.len(), 1);

        assert!(set.grid_inside(p(1, 1)));
        assert!(!set.grid_inside(p(5, 5)));
        assert!(!set.grid_inside(p(15, 5)));

        let small = Contour::new([(1, 1), (2, 1), (2, 2)]).map(|mut c| {
            assert!(c.prepare());
            c
        });
        assert!(set.pline_inside(&small.unwrap()));
        // Inside the hole isn't inside the set.
        assert!(!set.pline_inside(&rect(4, 4, 5, 5)));
    }

    #[test]
    fn hole_goes_to_smallest_container() {
        let mut set = RegionSet::new();
        set.add_contour(rect(0, 0, 100, 100)).unwrap();
        set.add_contour(hole(10, 10, 90, 90)).unwrap();
        // An island inside the big hole, with a hole of its own.
        set.add_contour(rect(20, 20, 80, 80)).unwrap();
        set.add_contour(hole(40, 40, 60, 60)).unwrap();

        let holes: Vec<_> = set.regions().map(|r| r.holes().len()).collect();
        assert_eq!(holes, vec![1, 1]);
        assert!(set.grid_inside(p(5, 5)));
        assert!(!set.grid_inside(p(15, 15)));
        assert!(set.grid_inside(p(30, 30)));
        assert!(!set.grid_inside(p(50, 50)));
    }

    #[test]
    fn orphan_hole() {
        let mut set = RegionSet::new();
        assert_matches!(set.add_contour(hole(0, 0, 1, 1)), Err(Error::OrphanHole));
        set.add_contour(rect(0, 0, 10, 10)).unwrap();
        assert_matches!(set.add_contour(hole(20, 20, 30, 30)), Err(Error::OrphanHole));
    }

    #[test]
    fn contours_in_any_order() {
        let set = RegionSet::from_contours([
            hole(2, 2, 4, 4),
            rect(20, 0, 30, 10),
            rect(0, 0, 10, 10),
            hole(22, 2, 24, 4),
        ])
        .unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.regions().all(|r| r.holes().len() == 1));
    }

    #[test]
    fn join_moves_everything() {
        let mut a = RegionSet::new();
        a.add_contour(rect(0, 0, 10, 10)).unwrap();
        let mut b = RegionSet::new();
        b.add_contour(rect(20, 0, 30, 10)).unwrap();
        b.add_contour(rect(40, 0, 50, 10)).unwrap();

        a.join(&mut b);
        assert_eq!(a.len(), 3);
        assert!(b.is_empty());
        assert!(a.grid_inside(p(45, 5)));
        assert_eq!(a.bbox().unwrap().max, p(50, 10));

        // Joining an empty set is a no-op.
        a.join(&mut b);
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn join_keeps_vertex_ids() {
        let mut b = RegionSet::new();
        b.add_contour(rect(20, 0, 30, 10)).unwrap();
        let id = b.iter().next().unwrap().0;
        let triangles = b.triangulate(id).unwrap().to_vec();
        let head = b.get(id).unwrap().outer().unwrap().head();

        let mut a = RegionSet::new();
        a.add_contour(rect(0, 0, 10, 10)).unwrap();
        a.join(&mut b);

        // The contour came across as-is, so its vertex ids and the cached
        // triangles still point at the same vertices.
        let moved = a.regions().nth(1).unwrap();
        let outer = moved.outer().unwrap();
        assert_eq!(outer.head(), head);
        assert_eq!(outer.vertex(head).unwrap().point, p(20, 0));
        assert_eq!(moved.triangles(), &triangles[..]);
    }

    #[test]
    fn copy_and_clear() {
        let mut set = RegionSet::new();
        set.add_contour(rect(0, 0, 10, 10)).unwrap();
        set.add_contour(hole(3, 3, 7, 7)).unwrap();
        let id = set.iter().next().unwrap().0;
        let triangles = set.triangulate(id).unwrap().len();

        let copy = set.copy();
        set.clear();
        assert!(set.is_empty());
        assert!(!set.grid_inside(p(1, 1)));

        assert_eq!(copy.len(), 1);
        assert!(copy.grid_inside(p(1, 1)));
        let region = copy.regions().next().unwrap();
        assert_eq!(region.triangles().len(), triangles);
        for t in region.triangles() {
            for tv in [t.v0, t.v1, t.v2] {
                assert!(region.contour(tv.contour).unwrap().vertex(tv.vertex).is_some());
            }
        }
    }

    #[test]
    fn remove_and_unknown_ids() {
        let mut set = RegionSet::new();
        set.add_contour(rect(0, 0, 10, 10)).unwrap();
        let id = set.iter().next().unwrap().0;
        assert!(set.remove(id).is_some());
        assert!(set.remove(id).is_none());
        assert_matches!(set.triangulate(id), Err(Error::UnknownRegion));
        assert_matches!(set.push_region(Region::new()), Err(Error::MissingOuter));
    }

    #[test]
    fn domain() {
        let mut set = RegionSet::new();
        set.add_contour(rect(0, 0, 10, 10)).unwrap();
        assert!(set.check_domain());
        set.add_contour(rect(20, 0, 30, crate::geom::GRID_MAX + 1))
            .unwrap();
        assert!(!set.check_domain());
    }
}
