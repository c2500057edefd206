//! Noding: splitting segments until they only meet at their endpoints.
//!
//! A sweep over `y` finds the pairs of segments whose vertical ranges overlap.
//! For each pair we work out, exactly, whether they cross, touch or overlap,
//! and where they need to be split. Proper crossings generally don't land on
//! the grid, so the crossing point is rounded to the nearest grid point. That
//! moves the pieces a little, which can create new crossings, so we go around
//! again until nothing changes.

use crate::{
    geom::{orient, GridPoint},
    num::div_round,
    segments::{SegIdx, Segment, Segments},
};

/// The outcome of [`node`].
#[derive(Clone, Debug)]
pub struct Noded {
    pub segments: Segments,
    /// How many rounds of splitting we did.
    pub rounds: usize,
    /// False if we gave up before the segments stopped changing.
    pub converged: bool,
}

/// The segments that intersect the current sweep-line.
#[derive(Clone, Debug, Default)]
struct SweepLine {
    active: Vec<SegIdx>,
}

impl SweepLine {
    /// Moves the sweep-line down to `y`, dropping segments that end above it.
    fn advance(&mut self, y: i32, segments: &Segments) {
        self.active.retain(|&idx| segments.get(idx).end.y >= y);
    }
}

/// Splits segments so that, afterwards, any two of them are either disjoint
/// or share exactly one endpoint (or are identical).
///
/// Every piece keeps the operand and the contour direction of the segment it
/// came from. Gives up after `max_rounds` rounds of splitting.
pub fn node(mut segments: Segments, max_rounds: usize) -> Noded {
    let mut rounds = 0;
    loop {
        let splits = find_splits(&segments);
        tracing::trace!(round = rounds, splits = splits.len(), "noding");
        if splits.is_empty() {
            return Noded {
                segments,
                rounds,
                converged: true,
            };
        }
        if rounds == max_rounds {
            return Noded {
                segments,
                rounds,
                converged: false,
            };
        }
        segments = apply_splits(&segments, splits);
        rounds += 1;
    }
}

fn find_splits(segments: &Segments) -> Vec<(SegIdx, GridPoint)> {
    let mut order: Vec<_> = segments.indices().collect();
    order.sort_by_key(|&idx| segments.get(idx).start);

    let mut line = SweepLine::default();
    let mut splits = Vec::new();
    for idx in order {
        let seg = segments.get(idx);
        line.advance(seg.start.y, segments);
        let bbox = seg.bbox();
        for &other_idx in &line.active {
            let other = segments.get(other_idx);
            if bbox.intersects(&other.bbox()) {
                split_points((idx, seg), (other_idx, other), &mut splits);
            }
        }
        line.active.push(idx);
    }
    splits
}

/// Finds the points where `s` and `t` need splitting.
fn split_points(
    (i, s): (SegIdx, &Segment),
    (j, t): (SegIdx, &Segment),
    out: &mut Vec<(SegIdx, GridPoint)>,
) {
    let o1 = orient(s.start, s.end, t.start);
    let o2 = orient(s.start, s.end, t.end);
    let o3 = orient(t.start, t.end, s.start);
    let o4 = orient(t.start, t.end, s.end);

    // Touching and overlapping: an endpoint of one lies inside the other.
    if o1 == 0 && s.interior_contains(t.start) {
        out.push((i, t.start));
    }
    if o2 == 0 && s.interior_contains(t.end) {
        out.push((i, t.end));
    }
    if o3 == 0 && t.interior_contains(s.start) {
        out.push((j, s.start));
    }
    if o4 == 0 && t.interior_contains(s.end) {
        out.push((j, s.end));
    }

    if o1.signum() * o2.signum() < 0 && o3.signum() * o4.signum() < 0 {
        let p = crossing_point(s, o3, o4);
        if p != s.start && p != s.end {
            out.push((i, p));
        }
        if p != t.start && p != t.end {
            out.push((j, p));
        }
    }
}

/// The grid point nearest to where `s` crosses a line, given the signed
/// distances (up to a common factor) of its endpoints to that line.
fn crossing_point(s: &Segment, o_start: i64, o_end: i64) -> GridPoint {
    let den = o_start as i128 - o_end as i128;
    let coord = |a: i32, b: i32| -> i32 {
        let d = b as i128 - a as i128;
        (a as i128 + div_round(d * o_start as i128, den)) as i32
    };
    GridPoint::new(coord(s.start.x, s.end.x), coord(s.start.y, s.end.y))
}

fn apply_splits(segments: &Segments, mut splits: Vec<(SegIdx, GridPoint)>) -> Segments {
    splits.sort();
    splits.dedup();
    let mut splits = splits.into_iter().peekable();

    let mut ret = Segments::default();
    for idx in segments.indices() {
        let seg = *segments.get(idx);
        let mut mid = Vec::new();
        while let Some((_, p)) = splits.next_if(|(j, _)| *j == idx) {
            mid.push(p);
        }
        let dir = seg.end - seg.start;
        mid.sort_by_key(|p| (*p - seg.start).dot(dir));

        let shape = segments.shape(idx);
        let forward = segments.positively_oriented(idx);
        let chain = std::iter::once(seg.start)
            .chain(mid)
            .chain(std::iter::once(seg.end))
            .collect::<Vec<_>>();
        for pair in chain.windows(2) {
            let (p, q) = (pair[0], pair[1]);
            if forward {
                ret.push(p, q, shape);
            } else {
                ret.push(q, p, shape);
            }
        }
    }
    ret
}
