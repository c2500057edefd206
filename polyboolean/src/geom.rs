use serde::{Deserialize, Serialize};

use crate::{error::Error, num::div_round};

/// The largest coordinate the kernel is designed for (20-bit signed grid).
pub const GRID_MAX: i32 = 524287;
/// The smallest coordinate the kernel is designed for (20-bit signed grid).
pub const GRID_MIN: i32 = -524288;

/// A point on the integer grid.
///
/// Coordinates are expected to lie in `GRID_MIN..=GRID_MAX`. Staying inside that
/// range keeps every orientation test inside 64 bits, and that's what makes
/// the boolean operations exact. The kernel does not check this on the hot
/// path; see [`RegionSet::check_domain`](crate::RegionSet::check_domain).
// Points are sorted by `y` and then by `x`
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    pub y: i32,
    pub x: i32,
}

impl std::fmt::Debug for GridPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl GridPoint {
    /// The upper-right corner of the grid.
    pub const POS_INFINITY: GridPoint = GridPoint {
        x: GRID_MAX,
        y: GRID_MAX,
    };
    /// The lower-left corner of the grid.
    pub const NEG_INFINITY: GridPoint = GridPoint {
        x: GRID_MIN,
        y: GRID_MIN,
    };

    pub const fn new(x: i32, y: i32) -> Self {
        GridPoint { x, y }
    }

    /// Dot product, treating both points as vectors.
    pub fn dot(self, other: GridPoint) -> i64 {
        self.x as i64 * other.x as i64 + self.y as i64 * other.y as i64
    }

    /// Cross product, treating both points as vectors.
    ///
    /// Positive if `other` is counter-clockwise from `self`.
    pub fn cross(self, other: GridPoint) -> i64 {
        self.x as i64 * other.y as i64 - self.y as i64 * other.x as i64
    }

    /// Is this point inside the 20-bit grid?
    pub fn in_domain(self) -> bool {
        (GRID_MIN..=GRID_MAX).contains(&self.x) && (GRID_MIN..=GRID_MAX).contains(&self.y)
    }
}

impl From<(i32, i32)> for GridPoint {
    fn from((x, y): (i32, i32)) -> Self {
        GridPoint { x, y }
    }
}

impl From<GridPoint> for (i32, i32) {
    fn from(p: GridPoint) -> Self {
        (p.x, p.y)
    }
}

impl std::ops::Add for GridPoint {
    type Output = GridPoint;

    fn add(self, rhs: Self) -> Self::Output {
        GridPoint {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for GridPoint {
    type Output = GridPoint;

    fn sub(self, rhs: Self) -> Self::Output {
        GridPoint {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::ops::Neg for GridPoint {
    type Output = GridPoint;

    fn neg(self) -> Self::Output {
        GridPoint {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl std::ops::Mul<i32> for GridPoint {
    type Output = GridPoint;

    fn mul(self, rhs: i32) -> Self::Output {
        GridPoint {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl std::ops::Div<i32> for GridPoint {
    type Output = GridPoint;

    fn div(self, rhs: i32) -> Self::Output {
        GridPoint {
            x: self.x / rhs,
            y: self.y / rhs,
        }
    }
}

impl std::ops::AddAssign for GridPoint {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::SubAssign for GridPoint {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

/// Twice the signed area of the triangle `a`, `b`, `c`.
///
/// Positive if the three points make a left (counter-clockwise) turn, negative
/// for a right turn and zero if they are collinear (or coincident).
pub fn orient(a: GridPoint, b: GridPoint, c: GridPoint) -> i64 {
    let (abx, aby) = (b.x as i64 - a.x as i64, b.y as i64 - a.y as i64);
    let (acx, acy) = (c.x as i64 - a.x as i64, c.y as i64 - a.y as i64);
    abx * acy - aby * acx
}

/// An axis-aligned bounding box with inclusive corners.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridBox {
    pub min: GridPoint,
    pub max: GridPoint,
}

impl std::fmt::Debug for GridBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} -- {:?}", self.min, self.max)
    }
}

impl GridBox {
    /// The degenerate box containing just `p`.
    pub fn from_point(p: GridPoint) -> Self {
        GridBox { min: p, max: p }
    }

    /// Grows the box to include `p`.
    pub fn include(&mut self, p: GridPoint) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    /// The smallest box containing both `self` and `other`.
    pub fn union(&self, other: &GridBox) -> GridBox {
        let mut ret = *self;
        ret.include(other.min);
        ret.include(other.max);
        ret
    }

    /// Is `p` inside the box or on its edge?
    pub fn contains(&self, p: GridPoint) -> bool {
        self.min.x <= p.x && p.x <= self.max.x && self.min.y <= p.y && p.y <= self.max.y
    }

    /// Is `other` entirely inside this box (touching the edge is allowed)?
    pub fn contains_box(&self, other: &GridBox) -> bool {
        self.contains(other.min) && self.contains(other.max)
    }

    /// Do the two boxes share at least one point (edges included)?
    pub fn intersects(&self, other: &GridBox) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}

/// Converts between editor coordinates and grid coordinates.
///
/// Editor coordinates (typically nanometres) are divided by `factor` on the
/// way into the kernel, rounding to the nearest grid point, and multiplied by
/// it on the way out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridScale {
    pub factor: i64,
}

impl GridScale {
    /// Panics if `factor` isn't positive.
    pub fn new(factor: i64) -> Self {
        assert!(factor > 0, "grid scale factor must be positive");
        GridScale { factor }
    }

    /// Maps an editor point onto the grid, failing if it lands outside the
    /// representable range.
    pub fn to_grid(&self, x: i64, y: i64) -> Result<GridPoint, Error> {
        let f = self.factor as i128;
        let gx = div_round(x as i128, f);
        let gy = div_round(y as i128, f);
        let range = GRID_MIN as i128..=GRID_MAX as i128;
        if !range.contains(&gx) || !range.contains(&gy) {
            return Err(Error::OutOfDomain { x, y });
        }
        Ok(GridPoint::new(gx as i32, gy as i32))
    }

    /// Maps a grid point back to editor coordinates.
    pub fn from_grid(&self, p: GridPoint) -> (i64, i64) {
        (p.x as i64 * self.factor, p.y as i64 * self.factor)
    }
}
