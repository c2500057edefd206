//! Boolean operations on region sets.

use serde::{Deserialize, Serialize};

use crate::{
    contour::Contour,
    error::Error,
    geom::GridPoint,
    region::RegionSet,
    segments::{Segments, Shape},
    sweep,
    topology::Topology,
};

/// A binary operation on two sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BooleanOp {
    /// Points in either operand.
    Union,
    /// Points in both operands.
    Intersection,
    /// Points in the first operand but not the second.
    Difference,
    /// Points in exactly one of the operands.
    Xor,
}

impl BooleanOp {
    /// Combines membership in the two operands.
    pub fn apply(self, in_a: bool, in_b: bool) -> bool {
        match self {
            BooleanOp::Union => in_a || in_b,
            BooleanOp::Intersection => in_a && in_b,
            BooleanOp::Difference => in_a && !in_b,
            BooleanOp::Xor => in_a != in_b,
        }
    }
}

/// How winding numbers decide what's inside an operand.
///
/// Well-formed region sets (counter-clockwise outer contours, clockwise holes,
/// no overlaps) have winding number one inside and zero outside, and then the
/// two rules agree. They only differ for overlapping or self-intersecting
/// input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

impl FillRule {
    pub fn is_inside(self, winding: i32) -> bool {
        match self {
            FillRule::NonZero => winding != 0,
            FillRule::EvenOdd => winding % 2 != 0,
        }
    }
}

/// Tuning knobs for a [`BooleanEngine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct BooleanOptions {
    pub fill_rule: FillRule,
    /// Crossing points are rounded to the grid, and that can create new
    /// crossings. This bounds the number of times we go around again.
    pub max_snap_rounds: usize,
}

impl Default for BooleanOptions {
    fn default() -> Self {
        BooleanOptions {
            fill_rule: FillRule::default(),
            max_snap_rounds: 32,
        }
    }
}

/// Computes boolean operations between region sets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BooleanEngine {
    options: BooleanOptions,
}

/// The result of an operation that can be read off the operands without
/// looking at their geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shortcut {
    Empty,
    First,
    Both,
}

/// If the operands' bounding boxes don't meet (in particular, if one of them is
/// empty), the result is one of the operands, both of them, or nothing.
fn shortcut(a: &RegionSet, b: &RegionSet, op: BooleanOp) -> Option<Shortcut> {
    if let (Some(ba), Some(bb)) = (a.bbox(), b.bbox()) {
        if ba.intersects(&bb) {
            return None;
        }
    }
    Some(match op {
        BooleanOp::Union | BooleanOp::Xor => Shortcut::Both,
        BooleanOp::Intersection => Shortcut::Empty,
        BooleanOp::Difference => Shortcut::First,
    })
}

impl BooleanEngine {
    pub fn new(options: BooleanOptions) -> Self {
        BooleanEngine { options }
    }

    pub fn options(&self) -> &BooleanOptions {
        &self.options
    }

    /// Computes `a op b`, leaving the operands alone.
    ///
    /// The result never shares storage with the operands.
    pub fn boolean(&self, a: &RegionSet, b: &RegionSet, op: BooleanOp) -> Result<RegionSet, Error> {
        match shortcut(a, b, op) {
            Some(Shortcut::Empty) => Ok(RegionSet::new()),
            Some(Shortcut::First) => Ok(a.copy()),
            Some(Shortcut::Both) => {
                let mut ret = a.copy();
                ret.join(&mut b.copy());
                Ok(ret)
            }
            None => self.clip(a, b, op),
        }
    }

    /// Computes `a op b`, consuming the operands.
    ///
    /// When the result is just the operands' regions, they are moved into the
    /// result instead of being copied.
    pub fn boolean_destructive(
        &self,
        mut a: RegionSet,
        mut b: RegionSet,
        op: BooleanOp,
    ) -> Result<RegionSet, Error> {
        match shortcut(&a, &b, op) {
            Some(Shortcut::Empty) => Ok(RegionSet::new()),
            Some(Shortcut::First) => Ok(a),
            Some(Shortcut::Both) => {
                a.join(&mut b);
                Ok(a)
            }
            None => self.clip(&a, &b, op),
        }
    }

    fn clip(&self, a: &RegionSet, b: &RegionSet, op: BooleanOp) -> Result<RegionSet, Error> {
        let mut segments = Segments::default();
        segments.add_region_set(a, Shape::A);
        segments.add_region_set(b, Shape::B);
        tracing::debug!(segments = segments.len(), ?op, "boolean operation");

        let noded = sweep::node(segments, self.options.max_snap_rounds);
        if noded.converged {
            tracing::debug!(
                rounds = noded.rounds,
                segments = noded.segments.len(),
                "noded"
            );
        } else {
            tracing::warn!(
                rounds = noded.rounds,
                "snap rounding didn't converge, output may be inaccurate"
            );
        }

        let top = Topology::build(&noded.segments);
        let fill = self.options.fill_rule;
        let rings =
            top.contours(|w| op.apply(fill.is_inside(w.shape_a), fill.is_inside(w.shape_b)));
        tracing::debug!(rings = rings.len(), "walked output contours");
        assemble(rings)
    }
}

/// Turns boundary rings into a region set.
fn assemble(rings: Vec<Vec<GridPoint>>) -> Result<RegionSet, Error> {
    let mut ret = RegionSet::new();
    let mut holes = Vec::new();
    for ring in rings {
        let Ok(mut contour) = Contour::new(ring) else {
            continue;
        };
        if !contour.prepare() {
            tracing::trace!(?contour, "dropping degenerate ring");
            continue;
        }
        ret.put(contour, &mut holes)?;
    }
    for hole in holes {
        let bbox = hole.bbox();
        if let Err(e) = ret.add_contour(hole) {
            tracing::warn!(?bbox, "output hole isn't inside any outer contour");
            return Err(e);
        }
    }
    Ok(ret)
}

/// Computes `a op b` with the default options, leaving the operands alone.
pub fn boolean(a: &RegionSet, b: &RegionSet, op: BooleanOp) -> Result<RegionSet, Error> {
    BooleanEngine::default().boolean(a, b, op)
}

/// Computes `a op b` with the default options, consuming the operands.
pub fn boolean_destructive(a: RegionSet, b: RegionSet, op: BooleanOp) -> Result<RegionSet, Error> {
    BooleanEngine::default().boolean_destructive(a, b, op)
}
