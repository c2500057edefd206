//! Boolean operations and triangulation for polygons on an integer grid.
//!
//! Polygons are [`RegionSet`]s: collections of [`Region`]s, each of which is a
//! counter-clockwise outer [`Contour`] together with clockwise holes. All
//! coordinates live on a 20-bit grid (see [`GridScale`] for getting there), and
//! all predicates are exact.
//!
//! ```
//! use polyboolean::{boolean, BooleanOp, Contour, GridPoint, RegionSet};
//!
//! let square = |x: i32| {
//!     let mut c = Contour::new([(x, 0), (x + 10, 0), (x + 10, 10), (x, 10)]).unwrap();
//!     assert!(c.prepare());
//!     RegionSet::from_contours([c]).unwrap()
//! };
//!
//! let both = boolean(&square(0), &square(5), BooleanOp::Intersection).unwrap();
//! assert!(both.grid_inside(GridPoint::new(7, 5)));
//! assert!(!both.grid_inside(GridPoint::new(2, 5)));
//! ```

mod boolean;
mod contour;
mod error;
mod geom;
mod num;
mod region;
pub mod segments;
pub mod sweep;
pub mod topology;
mod triangulate;

pub use boolean::{boolean, boolean_destructive, BooleanEngine, BooleanOp, BooleanOptions, FillRule};
pub use contour::{Contour, ContourVertex, VertexId, VertexIds, VertexLinks};
pub use error::{Error, Result};
pub use geom::{orient, GridBox, GridPoint, GridScale, GRID_MAX, GRID_MIN};
pub use region::{ContourRef, Region, RegionId, RegionSet};
pub use triangulate::{triangulate, Triangle, TriangleVertex};

#[cfg(test)]
mod strategies;
