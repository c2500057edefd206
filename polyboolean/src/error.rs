use thiserror::Error;

/// Malformed input or broken invariants.
///
/// Degenerate contours are *not* reported here: [`Contour::prepare`](crate::Contour::prepare)
/// returns `false` for them, and callers are expected to drop them.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum Error {
    /// A contour needs at least one point to start its ring.
    #[error("a contour needs at least one point")]
    EmptyContour,
    /// A hole was added to a region that doesn't have an outer boundary yet.
    #[error("cannot add a hole to a region without an outer contour")]
    MissingOuter,
    /// An outer contour was added to a region that already has one.
    #[error("region already has an outer contour")]
    DuplicateOuter,
    /// No region in the set contains the hole.
    #[error("hole contour is not inside any outer contour")]
    OrphanHole,
    /// The outer contour has fewer than three vertices.
    #[error("contour has {0} vertices, at least 3 are required")]
    DegenerateContour(usize),
    /// The region id doesn't belong to this set (or was removed).
    #[error("unknown region")]
    UnknownRegion,
    /// An editor coordinate doesn't fit on the 20-bit grid.
    #[error("point ({x}, {y}) is outside the grid")]
    OutOfDomain { x: i64, y: i64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
