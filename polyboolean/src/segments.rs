use crate::{
    contour::Contour,
    geom::{GridBox, GridPoint},
    region::RegionSet,
};

/// An index into our segment arena.
///
/// Throughout the boolean engine, we assign identities to segments, so that we
/// may consider segments as different even if they have the same start- and
/// end-points. (Coincident segments from the two operands are only merged once
/// the topology is built.)
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct SegIdx(pub usize);

impl std::fmt::Debug for SegIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s_{}", self.0)
    }
}

/// Which operand of a boolean operation a segment belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    A,
    B,
}

/// A line segment, with `start < end` in sweep-line order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    pub start: GridPoint,
    pub end: GridPoint,
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} -- {:?}", self.start, self.end)
    }
}

impl Segment {
    pub fn is_horizontal(&self) -> bool {
        self.start.y == self.end.y
    }

    pub fn bbox(&self) -> GridBox {
        let mut ret = GridBox::from_point(self.start);
        ret.include(self.end);
        ret
    }

    /// Is `p`, which must be collinear with this segment, strictly between its
    /// endpoints?
    pub fn interior_contains(&self, p: GridPoint) -> bool {
        p != self.start && p != self.end && self.bbox().contains(p)
    }
}

/// The input of a boolean operation: the edges of both operands.
#[derive(Debug, Default, Clone)]
pub struct Segments {
    segs: Vec<Segment>,
    /// For each segment, stores true if the sweep-line order (small y to big y)
    /// is the same as the orientation in its original contour.
    orientation: Vec<bool>,
    shape: Vec<Shape>,
}

fn cyclic_pairs<T>(xs: &[T]) -> impl Iterator<Item = (&T, &T)> {
    xs.windows(2)
        .map(|pair| (&pair[0], &pair[1]))
        .chain(xs.last().zip(xs.first()))
}

impl Segments {
    pub fn get(&self, idx: SegIdx) -> &Segment {
        &self.segs[idx.0]
    }

    pub fn indices(&self) -> impl Iterator<Item = SegIdx> {
        (0..self.segs.len()).map(SegIdx)
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segs.iter()
    }

    pub fn len(&self) -> usize {
        self.segs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segs.is_empty()
    }

    pub fn oriented_start(&self, idx: SegIdx) -> GridPoint {
        if self.orientation[idx.0] {
            self.get(idx).start
        } else {
            self.get(idx).end
        }
    }

    pub fn oriented_end(&self, idx: SegIdx) -> GridPoint {
        if self.orientation[idx.0] {
            self.get(idx).end
        } else {
            self.get(idx).start
        }
    }

    pub fn positively_oriented(&self, idx: SegIdx) -> bool {
        self.orientation[idx.0]
    }

    pub fn shape(&self, idx: SegIdx) -> Shape {
        self.shape[idx.0]
    }

    /// Adds the segment that its contour walks from `p` to `q`.
    ///
    /// Zero-length segments are skipped, and we return `None` for them.
    pub fn push(&mut self, p: GridPoint, q: GridPoint, shape: Shape) -> Option<SegIdx> {
        let (start, end, orient) = match p.cmp(&q) {
            std::cmp::Ordering::Less => (p, q, true),
            std::cmp::Ordering::Greater => (q, p, false),
            std::cmp::Ordering::Equal => return None,
        };
        self.segs.push(Segment { start, end });
        self.orientation.push(orient);
        self.shape.push(shape);
        Some(SegIdx(self.segs.len() - 1))
    }

    /// Adds the edges of a closed ring.
    pub fn add_points<P: Into<GridPoint>>(&mut self, ps: impl IntoIterator<Item = P>, shape: Shape) {
        let ps: Vec<GridPoint> = ps.into_iter().map(|p| p.into()).collect();
        if ps.len() <= 1 {
            return;
        }
        for (p, q) in cyclic_pairs(&ps) {
            self.push(*p, *q, shape);
        }
    }

    /// Adds the edges of a contour.
    ///
    /// Outer contours are walked counter-clockwise and holes clockwise, whatever
    /// order their points happen to be stored in. That way the winding number is
    /// one inside the filled area and zero elsewhere.
    pub fn add_contour(&mut self, contour: &Contour, shape: Shape) {
        let mut ps: Vec<_> = contour.points().collect();
        if contour.is_outer() != (contour.signed_area2() > 0) {
            ps.reverse();
        }
        self.add_points(ps, shape);
    }

    /// Adds the edges of every contour in a set.
    pub fn add_region_set(&mut self, set: &RegionSet, shape: Shape) {
        for region in set.regions() {
            for (_, contour) in region.contours() {
                self.add_contour(contour, shape);
            }
        }
    }
}
