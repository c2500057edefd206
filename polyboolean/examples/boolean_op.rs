use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use kurbo::DEFAULT_ACCURACY;
use polyboolean::{
    BooleanEngine, BooleanOp, BooleanOptions, Contour, FillRule, GridPoint, GridScale, RegionSet,
};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Op {
    Union,
    Intersection,
    Difference,
    Xor,
}

impl From<Op> for BooleanOp {
    fn from(op: Op) -> Self {
        match op {
            Op::Union => BooleanOp::Union,
            Op::Intersection => BooleanOp::Intersection,
            Op::Difference => BooleanOp::Difference,
            Op::Xor => BooleanOp::Xor,
        }
    }
}

/// Combines the filled paths of two SVG files.
#[derive(Parser)]
struct Args {
    a: PathBuf,
    b: PathBuf,
    output: PathBuf,

    #[arg(long, value_enum)]
    op: Op,

    #[arg(long)]
    even_odd: bool,

    /// Editor units per grid step. SVG coordinates are first converted to
    /// editor units (thousandths of an SVG unit).
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(i64).range(1..))]
    grid: i64,
}

/// Editor units per SVG unit.
const EDITOR_UNITS: f64 = 1000.0;

fn svg_to_contours(tree: &usvg::Tree, grid: GridScale) -> anyhow::Result<Vec<Contour>> {
    fn pt(p: usvg::tiny_skia_path::Point) -> kurbo::Point {
        kurbo::Point::new(p.x as f64, p.y as f64)
    }

    fn add_group(group: &usvg::Group, ret: &mut Vec<Vec<(i64, i64)>>) {
        for child in group.children() {
            match child {
                usvg::Node::Group(group) => add_group(group, ret),
                usvg::Node::Path(path) => {
                    let kurbo_els = path.data().segments().map(|seg| match seg {
                        usvg::tiny_skia_path::PathSegment::MoveTo(p) => {
                            kurbo::PathEl::MoveTo(pt(p))
                        }
                        usvg::tiny_skia_path::PathSegment::LineTo(p) => {
                            kurbo::PathEl::LineTo(pt(p))
                        }
                        usvg::tiny_skia_path::PathSegment::QuadTo(p0, p1) => {
                            kurbo::PathEl::QuadTo(pt(p0), pt(p1))
                        }
                        usvg::tiny_skia_path::PathSegment::CubicTo(p0, p1, p2) => {
                            kurbo::PathEl::CurveTo(pt(p0), pt(p1), pt(p2))
                        }
                        usvg::tiny_skia_path::PathSegment::Close => kurbo::PathEl::ClosePath,
                    });

                    let to_editor = |p: kurbo::Point| {
                        (
                            (p.x * EDITOR_UNITS).round() as i64,
                            (p.y * EDITOR_UNITS).round() as i64,
                        )
                    };
                    let mut points = Vec::new();
                    // Every subpath is treated as closed.
                    kurbo::flatten(kurbo_els, DEFAULT_ACCURACY, |el| match el {
                        kurbo::PathEl::MoveTo(p) => {
                            if !points.is_empty() {
                                ret.push(std::mem::take(&mut points));
                            }
                            points.push(to_editor(p));
                        }
                        kurbo::PathEl::LineTo(p) => points.push(to_editor(p)),
                        kurbo::PathEl::ClosePath => {
                            if !points.is_empty() {
                                ret.push(std::mem::take(&mut points));
                            }
                        }
                        kurbo::PathEl::QuadTo(..) | kurbo::PathEl::CurveTo(..) => unreachable!(),
                    });
                    if !points.is_empty() {
                        ret.push(points);
                    }
                }
                _ => {}
            }
        }
    }

    let mut rings = Vec::new();
    add_group(tree.root(), &mut rings);

    let mut ret = Vec::new();
    for ring in rings {
        let points = ring
            .into_iter()
            .map(|(x, y)| grid.to_grid(x, y))
            .collect::<Result<Vec<_>, _>>()?;
        let mut contour = Contour::new(points)?;
        if contour.prepare() {
            ret.push(contour);
        }
    }
    Ok(ret)
}

/// Every closed path becomes its own region, even though they may overlap.
/// The fill rule decides what the overlaps mean once the set goes through a
/// boolean operation.
fn load(path: &Path, grid: GridScale) -> anyhow::Result<RegionSet> {
    let input = std::fs::read_to_string(path)?;
    let tree = usvg::Tree::from_str(&input, &usvg::Options::default())?;
    let mut contours = svg_to_contours(&tree, grid)?;
    for c in &mut contours {
        c.make_outer();
    }
    Ok(RegionSet::from_contours(contours)?)
}

pub fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let engine = BooleanEngine::new(BooleanOptions {
        fill_rule: if args.even_odd {
            FillRule::EvenOdd
        } else {
            FillRule::NonZero
        },
        ..Default::default()
    });

    let grid = GridScale::new(args.grid);
    let a = load(&args.a, grid)?;
    let b = load(&args.b, grid)?;
    let output = engine.boolean(&a, &b, args.op.into())?;

    let bbox = a
        .bbox()
        .into_iter()
        .chain(b.bbox())
        .reduce(|x, y| x.union(&y))
        .ok_or_else(|| anyhow::anyhow!("both inputs are empty"))?;
    let to_svg = |p: GridPoint| {
        let (x, y) = grid.from_grid(p);
        (x as f64 / EDITOR_UNITS, y as f64 / EDITOR_UNITS)
    };
    let pad = 1.0;
    let (min_x, min_y) = to_svg(bbox.min);
    let (max_x, max_y) = to_svg(bbox.max);
    let mut document = svg::Document::new().set(
        "viewBox",
        (
            min_x - pad,
            min_y - pad,
            max_x - min_x + 2.0 * pad,
            max_y - min_y + 2.0 * pad,
        ),
    );

    // Holes are drawn in the same path as their outer contour, and the
    // even-odd rule punches them out.
    for region in output.regions() {
        let mut data = svg::node::element::path::Data::new();
        for (_, contour) in region.contours() {
            let mut points = contour.points().map(to_svg);
            let Some(first) = points.next() else {
                continue;
            };
            data = data.move_to(first);
            for p in points {
                data = data.line_to(p);
            }
            data = data.close();
        }
        let path = svg::node::element::Path::new()
            .set("d", data)
            .set("fill", "black")
            .set("fill-rule", "evenodd");
        document = document.add(path);
    }

    svg::save(&args.output, &document)?;

    Ok(())
}
