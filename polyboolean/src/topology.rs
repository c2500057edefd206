use std::collections::{BTreeMap, HashMap};

use crate::{
    geom::GridPoint,
    segments::{Segments, Shape},
};

/// We support boolean operations, so a "winding number" for us is two winding
/// numbers, one for each shape.
#[derive(Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct WindingNumber {
    pub shape_a: i32,
    pub shape_b: i32,
}

impl std::fmt::Debug for WindingNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}a + {}b", self.shape_a, self.shape_b)
    }
}

impl WindingNumber {
    fn is_zero(&self) -> bool {
        self.shape_a == 0 && self.shape_b == 0
    }

    fn bump(&mut self, shape: Shape, by: i32) {
        match shape {
            Shape::A => self.shape_a += by,
            Shape::B => self.shape_b += by,
        }
    }
}

impl std::ops::Add for WindingNumber {
    type Output = WindingNumber;

    fn add(self, rhs: Self) -> Self::Output {
        WindingNumber {
            shape_a: self.shape_a + rhs.shape_a,
            shape_b: self.shape_b + rhs.shape_b,
        }
    }
}

impl std::ops::Sub for WindingNumber {
    type Output = WindingNumber;

    fn sub(self, rhs: Self) -> Self::Output {
        WindingNumber {
            shape_a: self.shape_a - rhs.shape_a,
            shape_b: self.shape_b - rhs.shape_b,
        }
    }
}

impl std::ops::AddAssign for WindingNumber {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::SubAssign for WindingNumber {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

/// For a segment, we store two winding numbers (one on each side of the segment).
///
/// "Counter-clockwise" is the side you'd reach by turning counter-clockwise
/// from the segment's direction (its left), and "clockwise" is the other one.
/// For simple segments, the winding numbers on two sides only differ by one.
/// Once we merge segments, they can differ by more.
#[derive(Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct SegmentWindingNumbers {
    pub counter_clockwise: WindingNumber,
    pub clockwise: WindingNumber,
}

impl SegmentWindingNumbers {
    fn flipped(self) -> Self {
        Self {
            counter_clockwise: self.clockwise,
            clockwise: self.counter_clockwise,
        }
    }
}

impl std::fmt::Debug for SegmentWindingNumbers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} | {:?}", self.clockwise, self.counter_clockwise)
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct OutputSegIdx(pub usize);

impl OutputSegIdx {
    pub fn first_half(self) -> HalfOutputSegIdx {
        HalfOutputSegIdx {
            idx: self,
            first_half: true,
        }
    }
    pub fn second_half(self) -> HalfOutputSegIdx {
        HalfOutputSegIdx {
            idx: self,
            first_half: false,
        }
    }
}

/// One end of an output segment, pointing towards the other end.
#[derive(Clone, Copy, Hash, PartialEq, Eq)]
pub struct HalfOutputSegIdx {
    idx: OutputSegIdx,
    first_half: bool,
}

impl HalfOutputSegIdx {
    fn other_half(self) -> Self {
        Self {
            idx: self.idx,
            first_half: !self.first_half,
        }
    }
}

impl std::fmt::Debug for HalfOutputSegIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.first_half {
            write!(f, "s{}->", self.idx.0)
        } else {
            write!(f, "s{}<-", self.idx.0)
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct OutputSegVec<T> {
    pub start: Vec<T>,
    pub end: Vec<T>,
}

impl<T> Default for OutputSegVec<T> {
    fn default() -> Self {
        Self {
            start: Vec::new(),
            end: Vec::new(),
        }
    }
}

impl<T> std::ops::Index<HalfOutputSegIdx> for OutputSegVec<T> {
    type Output = T;

    fn index(&self, index: HalfOutputSegIdx) -> &Self::Output {
        if index.first_half {
            &self.start[index.idx.0]
        } else {
            &self.end[index.idx.0]
        }
    }
}

impl<T> std::ops::IndexMut<HalfOutputSegIdx> for OutputSegVec<T> {
    fn index_mut(&mut self, index: HalfOutputSegIdx) -> &mut T {
        if index.first_half {
            &mut self.start[index.idx.0]
        } else {
            &mut self.end[index.idx.0]
        }
    }
}

#[derive(Clone, Copy, Hash, PartialEq, Eq)]
pub struct PointNeighbors {
    clockwise: HalfOutputSegIdx,
    counter_clockwise: HalfOutputSegIdx,
}

impl std::fmt::Debug for PointNeighbors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} o {:?}", self.counter_clockwise, self.clockwise)
    }
}

/// Compares two directions by their angle, counter-clockwise from `+x`.
fn cmp_ccw(u: GridPoint, v: GridPoint) -> std::cmp::Ordering {
    let upper = |p: GridPoint| p.y > 0 || (p.y == 0 && p.x > 0);
    match (upper(u), upper(v)) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _ => 0.cmp(&u.cross(v)),
    }
}

/// The planar graph formed by a set of noded segments, with winding numbers.
///
/// Coincident input segments are merged into a single output segment that
/// remembers how much the winding number jumps across it. Segments across
/// which nothing jumps are dropped.
#[derive(Clone, Debug, Default)]
pub struct Topology {
    /// Indexed by `OutputSegIdx`.
    pub winding: Vec<SegmentWindingNumbers>,
    /// Indexed by `OutputSegIdx`: the counter-clockwise winding number minus
    /// the clockwise one.
    delta: Vec<WindingNumber>,
    pub point: OutputSegVec<GridPoint>,
    pub point_neighbors: OutputSegVec<PointNeighbors>,
}

impl Topology {
    /// Builds the topology of a collection of segments.
    ///
    /// The segments must have been noded (see [`crate::sweep::node`]): apart
    /// from coincident ones, they can only meet at their endpoints.
    pub fn build(segments: &Segments) -> Self {
        let mut index = HashMap::new();
        let mut keys = Vec::new();
        let mut deltas: Vec<WindingNumber> = Vec::new();
        for idx in segments.indices() {
            let seg = segments.get(idx);
            let out = *index.entry((seg.start, seg.end)).or_insert_with(|| {
                keys.push((seg.start, seg.end));
                deltas.push(WindingNumber::default());
                keys.len() - 1
            });
            // A contour has its inside on the left, so walking a segment
            // forwards means the winding number goes up to its left.
            let dir = if segments.positively_oriented(idx) { 1 } else { -1 };
            deltas[out].bump(segments.shape(idx), dir);
        }

        let mut ret = Topology::default();
        for (&(start, end), delta) in keys.iter().zip(deltas) {
            if delta.is_zero() {
                continue;
            }
            let out_idx = OutputSegIdx(ret.delta.len());
            ret.delta.push(delta);
            ret.point.start.push(start);
            ret.point.end.push(end);
            let no_nbrs = PointNeighbors {
                clockwise: out_idx.first_half(),
                counter_clockwise: out_idx.first_half(),
            };
            ret.point_neighbors.start.push(no_nbrs);
            ret.point_neighbors.end.push(no_nbrs);
        }
        tracing::trace!(
            input = segments.len(),
            output = ret.delta.len(),
            "merged coincident segments"
        );

        ret.connect_points();
        ret.compute_windings();
        ret
    }

    /// The direction that a half-segment points in.
    fn direction(&self, h: HalfOutputSegIdx) -> GridPoint {
        self.point[h.other_half()] - self.point[h]
    }

    /// Sorts the half-segments around each point, counter-clockwise.
    fn connect_points(&mut self) {
        let mut at: BTreeMap<GridPoint, Vec<HalfOutputSegIdx>> = BTreeMap::new();
        for idx in self.segment_indices() {
            for h in [idx.first_half(), idx.second_half()] {
                at.entry(self.point[h]).or_default().push(h);
            }
        }

        for halves in at.values_mut() {
            halves.sort_by(|&h0, &h1| cmp_ccw(self.direction(h0), self.direction(h1)));
            let n = halves.len();
            for (i, &h) in halves.iter().enumerate() {
                self.point_neighbors[h] = PointNeighbors {
                    counter_clockwise: halves[(i + 1) % n],
                    clockwise: halves[(i + n - 1) % n],
                };
            }
        }
    }

    /// The winding numbers around a half-segment, given the clockwise winding
    /// number of its output segment.
    fn half_winding(&self, h: HalfOutputSegIdx, clockwise: WindingNumber) -> SegmentWindingNumbers {
        let w = SegmentWindingNumbers {
            clockwise,
            counter_clockwise: clockwise + self.delta[h.idx.0],
        };
        if h.first_half {
            w
        } else {
            w.flipped()
        }
    }

    /// Computes the winding numbers of every segment.
    ///
    /// Around a point, the region counter-clockwise of one half-segment is the
    /// region clockwise of the next one, so knowing a single winding number in
    /// a connected component determines all the others. We get that number
    /// from a ray cast, once per component.
    fn compute_windings(&mut self) {
        let n = self.delta.len();
        let mut clockwise: Vec<Option<WindingNumber>> = vec![None; n];
        let mut queue = Vec::new();
        let mut components = 0;
        for seed in self.segment_indices() {
            if clockwise[seed.0].is_some() {
                continue;
            }
            components += 1;
            clockwise[seed.0] = Some(self.ray_winding(seed));
            queue.push(seed);

            while let Some(idx) = queue.pop() {
                let Some(cw) = clockwise[idx.0] else {
                    continue;
                };
                for h in [idx.first_half(), idx.second_half()] {
                    let w = self.half_winding(h, cw);
                    let nbrs = self.point_neighbors[h];

                    let ccw_nbr = nbrs.counter_clockwise;
                    if clockwise[ccw_nbr.idx.0].is_none() {
                        // The clockwise side of `ccw_nbr` is our counter-clockwise side.
                        let d = self.delta[ccw_nbr.idx.0];
                        clockwise[ccw_nbr.idx.0] = Some(if ccw_nbr.first_half {
                            w.counter_clockwise
                        } else {
                            w.counter_clockwise - d
                        });
                        queue.push(ccw_nbr.idx);
                    }

                    let cw_nbr = nbrs.clockwise;
                    if clockwise[cw_nbr.idx.0].is_none() {
                        let d = self.delta[cw_nbr.idx.0];
                        clockwise[cw_nbr.idx.0] = Some(if cw_nbr.first_half {
                            w.clockwise - d
                        } else {
                            w.clockwise
                        });
                        queue.push(cw_nbr.idx);
                    }
                }
            }
        }
        tracing::trace!(components, "propagated winding numbers");

        self.winding = (0..n)
            .map(|i| {
                let cw = clockwise[i].unwrap_or_default();
                SegmentWindingNumbers {
                    clockwise: cw,
                    counter_clockwise: cw + self.delta[i],
                }
            })
            .collect();
    }

    /// The winding number just clockwise of a segment, by casting a ray from
    /// its midpoint.
    ///
    /// We work in doubled coordinates so that the midpoint is on the grid. The
    /// ray points to the right of the segment: `+x` for a segment going up, and
    /// `-y` for a horizontal one (which after a quarter turn is `+x` again).
    fn ray_winding(&self, seed: OutputSegIdx) -> WindingNumber {
        let (s, e) = (self.point.start[seed.0], self.point.end[seed.0]);
        let horizontal = s.y == e.y;
        let tf = |p: GridPoint| -> (i64, i64) {
            let (x, y) = (2 * p.x as i64, 2 * p.y as i64);
            if horizontal {
                (-y, x)
            } else {
                (x, y)
            }
        };
        let (ts, te) = (tf(s), tf(e));
        let m = ((ts.0 + te.0) / 2, (ts.1 + te.1) / 2);

        let mut w = WindingNumber::default();
        for i in 0..self.delta.len() {
            let (a, b) = (tf(self.point.start[i]), tf(self.point.end[i]));
            let o = (b.0 - a.0) * (m.1 - a.1) - (b.1 - a.1) * (m.0 - a.0);
            // Half-open in y, so that a ray through a vertex counts once. The
            // seed itself has o == 0 and never counts.
            if a.1 <= m.1 && m.1 < b.1 && o > 0 {
                w += self.delta[i];
            } else if b.1 <= m.1 && m.1 < a.1 && o < 0 {
                w -= self.delta[i];
            }
        }
        w
    }

    pub fn segment_indices(&self) -> impl Iterator<Item = OutputSegIdx> {
        (0..self.delta.len()).map(OutputSegIdx)
    }

    pub fn winding(&self, idx: HalfOutputSegIdx) -> SegmentWindingNumbers {
        if idx.first_half {
            self.winding[idx.idx.0]
        } else {
            self.winding[idx.idx.0].flipped()
        }
    }

    /// Walks the boundary of the set of points whose winding number satisfies
    /// `inside`.
    ///
    /// Each contour is returned as a ring of points with the inside on its
    /// left, so outer boundaries come out counter-clockwise and holes
    /// clockwise. Where the boundary touches itself, we turn as sharply left
    /// as possible, which splits it into separate rings.
    pub fn contours(&self, inside: impl Fn(WindingNumber) -> bool) -> Vec<Vec<GridPoint>> {
        let bdy = |idx: OutputSegIdx| -> bool {
            inside(self.winding[idx.0].clockwise) != inside(self.winding[idx.0].counter_clockwise)
        };

        let mut visited = vec![false; self.winding.len()];
        let mut contours = Vec::new();
        for idx in self.segment_indices() {
            if visited[idx.0] || !bdy(idx) {
                continue;
            }

            // We have a boundary segment; let's traverse its contour.
            // First, arrange the orientation so that the interior is on our
            // left as we walk.
            let start = if inside(self.winding[idx.0].counter_clockwise) {
                idx.first_half()
            } else {
                idx.second_half()
            };
            let mut contour = Vec::new();
            let mut next = start;
            loop {
                visited[next.idx.0] = true;
                contour.push(self.point[next]);
                debug_assert!(inside(self.winding(next).counter_clockwise));

                // Walk clockwise around the far endpoint, starting from where
                // we came from, until we find the next segment that's on the
                // boundary.
                let back = next.other_half();
                let mut nbr = self.point_neighbors[back].clockwise;
                while nbr != back && inside(self.winding(nbr).clockwise) {
                    nbr = self.point_neighbors[nbr].clockwise;
                }

                if nbr == start {
                    break;
                }
                if nbr == back || visited[nbr.idx.0] {
                    tracing::warn!(point = ?self.point[back], "boundary doesn't close up");
                    break;
                }
                next = nbr;
            }
            tracing::trace!(len = contour.len(), "walked contour");
            contours.push(contour);
        }

        contours
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::node;

    fn p(x: i32, y: i32) -> GridPoint {
        GridPoint::new(x, y)
    }

    fn topology(a: &[&[(i32, i32)]], b: &[&[(i32, i32)]]) -> Topology {
        let mut segs = Segments::default();
        for ring in a {
            segs.add_points(ring.iter().copied(), Shape::A);
        }
        for ring in b {
            segs.add_points(ring.iter().copied(), Shape::B);
        }
        let noded = node(segs, 16);
        assert!(noded.converged);
        Topology::build(&noded.segments)
    }

    fn area2(ring: &[GridPoint]) -> i64 {
        ring.iter()
            .zip(ring.iter().cycle().skip(1))
            .map(|(p, q)| p.cross(*q))
            .sum()
    }

    const SQUARE: &[(i32, i32)] = &[(0, 0), (10, 0), (10, 10), (0, 10)];
    const SHIFTED: &[(i32, i32)] = &[(5, 0), (15, 0), (15, 10), (5, 10)];

    #[test]
    fn ccw_order() {
        let mut dirs = vec![p(0, -1), p(-1, 0), p(1, 1), p(1, 0), p(-1, -1), p(0, 1)];
        dirs.sort_by(|u, v| cmp_ccw(*u, *v));
        assert_eq!(
            dirs,
            vec![p(1, 0), p(1, 1), p(0, 1), p(-1, 0), p(-1, -1), p(0, -1)]
        );
    }

    #[test]
    fn square() {
        let top = topology(&[SQUARE], &[]);
        assert_eq!(top.winding.len(), 4);
        for w in &top.winding {
            let sides = [w.clockwise.shape_a, w.counter_clockwise.shape_a];
            assert!(sides == [0, 1] || sides == [1, 0]);
            assert_eq!(w.clockwise.shape_b, 0);
        }

        let contours = top.contours(|w| w.shape_a != 0);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 4);
        assert_eq!(area2(&contours[0]), 200);
    }

    #[test]
    fn clockwise_input() {
        let reversed: Vec<_> = SQUARE.iter().rev().copied().collect();
        let top = topology(&[&reversed], &[]);
        // The winding number is -1 inside.
        let contours = top.contours(|w| w.shape_a != 0);
        assert_eq!(contours.len(), 1);
        assert_eq!(area2(&contours[0]), 200);
        assert!(top.contours(|w| w.shape_a > 0).is_empty());
    }

    #[test]
    fn overlapping_squares() {
        let top = topology(&[SQUARE], &[SHIFTED]);

        let union = top.contours(|w| w.shape_a != 0 || w.shape_b != 0);
        assert_eq!(union.len(), 1);
        assert_eq!(area2(&union[0]), 300);

        let intersection = top.contours(|w| w.shape_a != 0 && w.shape_b != 0);
        assert_eq!(intersection.len(), 1);
        assert_eq!(area2(&intersection[0]), 100);

        let xor = top.contours(|w| (w.shape_a != 0) != (w.shape_b != 0));
        assert_eq!(xor.len(), 2);
        assert!(xor.iter().all(|c| area2(c) == 100));
    }

    #[test]
    fn cancelling_segments_are_dropped() {
        // The same square, walked once in each direction.
        let reversed: Vec<_> = SQUARE.iter().rev().copied().collect();
        let top = topology(&[SQUARE, &reversed], &[]);
        assert!(top.winding.is_empty());
        assert!(top.contours(|w| w.shape_a != 0).is_empty());
    }

    #[test]
    fn hole() {
        let hole: &[(i32, i32)] = &[(3, 3), (3, 7), (7, 7), (7, 3)];
        let top = topology(&[SQUARE, hole], &[]);
        let mut contours = top.contours(|w| w.shape_a != 0);
        contours.sort_by_key(|c| area2(c));
        assert_eq!(contours.len(), 2);
        assert_eq!(area2(&contours[0]), -32);
        assert_eq!(area2(&contours[1]), 200);
    }

    #[test]
    fn figure_eight() {
        // A self-intersecting ring: one lobe is counter-clockwise and the
        // other clockwise, so their winding numbers are 1 and -1.
        let bowtie: &[(i32, i32)] = &[(0, 0), (10, 10), (10, 0), (0, 10)];
        let top = topology(&[bowtie], &[]);
        let positive = top.contours(|w| w.shape_a > 0);
        let nonzero = top.contours(|w| w.shape_a != 0);
        assert_eq!(positive.len(), 1);
        assert_eq!(nonzero.len(), 2);
        assert!(nonzero.iter().all(|c| area2(c) == 50));
    }

    #[test]
    fn touching_corners() {
        let other: &[(i32, i32)] = &[(10, 10), (20, 10), (20, 20), (10, 20)];
        let top = topology(&[SQUARE], &[other]);
        let union = top.contours(|w| w.shape_a != 0 || w.shape_b != 0);
        // The rings touch at (10, 10) but are walked separately.
        assert_eq!(union.len(), 2);
        assert!(union.iter().all(|c| c.len() == 4 && area2(c) == 200));
    }
}
