//! Boolean operations on planar regions.
//!
//! Intersection and difference of a simple subject polygon with the union of
//! one or more simple clip polygons. The plane is cut into vertical slabs at
//! every vertex and at every crossing between edges of different polygons.
//! Inside a slab no two edges cross, so each polygon's cross-section is a
//! set of intervals bounded by edge lines, and the boolean reduces to 1D
//! interval arithmetic. Slab pieces bounded by the same pair of edges in
//! consecutive slabs are merged, so the output is a list of convex
//! trapezoids (or triangles), each counter-clockwise.
//!
//! These operations are used for:
//! - Floor/ceiling overlap between stacked stories (intersection)
//! - Exposed roof and cantilevered floor area (difference)
//! - Overlapping rooms on the same story (intersection area)

use crate::geom::EPS;
use crate::geom::point::Point2D;
use crate::geom::polygon::polygon_area;
use crate::geom::segment::{Segment2D, line_intersection};

/// Slab boundaries closer than this are merged.
const SLAB_EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Intersection,
    Difference,
}

/// Non-vertical polygon edge oriented left to right.
#[derive(Debug, Clone, Copy)]
struct Line {
    /// (polygon index, edge index)
    id: (usize, usize),
    p: Point2D,
    q: Point2D,
}

impl Line {
    fn y_at(&self, x: f64) -> f64 {
        let t = (x - self.p.x) / (self.q.x - self.p.x);
        self.p.y + t * (self.q.y - self.p.y)
    }

    fn spans(&self, x: f64) -> bool {
        self.p.x < x && x < self.q.x
    }
}

/// Interval between two lines inside a slab.
#[derive(Debug, Clone, Copy)]
struct Band {
    lo: Line,
    hi: Line,
}

/// Piece under construction, extended while consecutive slabs share its lines.
#[derive(Debug, Clone, Copy)]
struct OpenPiece {
    band: Band,
    x_start: f64,
    x_end: f64,
}

/// Region made of convex, counter-clockwise pieces.
#[derive(Debug, Clone, Default)]
pub struct Region {
    pub pieces: Vec<Vec<Point2D>>,
}

impl Region {
    pub fn area(&self) -> f64 {
        self.pieces.iter().map(|p| polygon_area(p)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }
}

/// Computes `subject ∩ (clip_1 ∪ clip_2 ∪ ...)`.
///
/// Pieces with area at or below `tol²` are dropped.
pub fn intersection(subject: &[Point2D], clips: &[&[Point2D]], tol: f64) -> Region {
    overlay(subject, clips, Op::Intersection, tol)
}

/// Computes `subject \ (clip_1 ∪ clip_2 ∪ ...)`.
///
/// Pieces with area at or below `tol²` are dropped.
pub fn difference(subject: &[Point2D], clips: &[&[Point2D]], tol: f64) -> Region {
    overlay(subject, clips, Op::Difference, tol)
}

/// Area shared by two polygons.
pub fn overlap_area(a: &[Point2D], b: &[Point2D], tol: f64) -> f64 {
    intersection(a, &[b], tol).area()
}

fn overlay(subject: &[Point2D], clips: &[&[Point2D]], op: Op, tol: f64) -> Region {
    let mut polygons: Vec<&[Point2D]> = vec![subject];
    polygons.extend_from_slice(clips);

    let lines: Vec<Vec<Line>> = polygons
        .iter()
        .enumerate()
        .map(|(k, poly)| polygon_lines(k, poly))
        .collect();

    let xs = slab_boundaries(&polygons, &lines);

    let mut region = Region::default();
    let mut open: Vec<OpenPiece> = Vec::new();

    for w in xs.windows(2) {
        let (x0, x1) = (w[0], w[1]);
        if x1 - x0 < SLAB_EPS {
            continue;
        }
        let xm = 0.5 * (x0 + x1);

        let subject_bands = bands_at(&lines[0], xm);
        let clip_bands = union_bands(
            lines[1..].iter().flat_map(|l| bands_at(l, xm)).collect(),
            xm,
        );

        let bands = match op {
            Op::Intersection => intersect_bands(&subject_bands, &clip_bands, xm),
            Op::Difference => subtract_bands(&subject_bands, &clip_bands, xm),
        };

        // Continue pieces whose bounding lines carry over from the previous slab
        let mut next_open: Vec<OpenPiece> = Vec::new();
        for band in bands {
            let pos = open.iter().position(|o| {
                o.band.lo.id == band.lo.id
                    && o.band.hi.id == band.hi.id
                    && (o.x_end - x0).abs() < SLAB_EPS
            });
            match pos {
                Some(i) => {
                    let mut piece = open.swap_remove(i);
                    piece.x_end = x1;
                    next_open.push(piece);
                }
                None => next_open.push(OpenPiece {
                    band,
                    x_start: x0,
                    x_end: x1,
                }),
            }
        }
        for piece in open.drain(..) {
            emit(&mut region, &piece, tol);
        }
        open = next_open;
    }
    for piece in open.iter() {
        emit(&mut region, piece, tol);
    }

    region
}

fn polygon_lines(k: usize, poly: &[Point2D]) -> Vec<Line> {
    let n = poly.len();
    let mut lines = Vec::new();
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        if (b.x - a.x).abs() < EPS {
            continue; // Vertical edges only bound slabs
        }
        let (p, q) = if a.x < b.x { (a, b) } else { (b, a) };
        lines.push(Line { id: (k, i), p, q });
    }
    lines
}

/// Sorted x coordinates of all vertices and of all crossings between edges of
/// different polygons.
fn slab_boundaries(polygons: &[&[Point2D]], lines: &[Vec<Line>]) -> Vec<f64> {
    let mut xs: Vec<f64> = polygons.iter().flat_map(|p| p.iter().map(|pt| pt.x)).collect();

    for i in 0..lines.len() {
        for j in (i + 1)..lines.len() {
            for a in lines[i].iter() {
                for b in lines[j].iter() {
                    if a.q.x <= b.p.x || b.q.x <= a.p.x {
                        continue;
                    }
                    let sa = Segment2D::new(a.p, a.q);
                    let sb = Segment2D::new(b.p, b.q);
                    if let Some((t, s)) = line_intersection(&sa, &sb)
                        && (0. ..=1.).contains(&t)
                        && (0. ..=1.).contains(&s)
                    {
                        xs.push(sa.point_at(t).x);
                    }
                }
            }
        }
    }

    xs.sort_by(f64::total_cmp);
    xs.dedup_by(|b, a| (*b - *a).abs() < SLAB_EPS);
    xs
}

/// Cross-section of one polygon at `x` as sorted bands (even-odd pairing).
fn bands_at(lines: &[Line], x: f64) -> Vec<Band> {
    let mut active: Vec<Line> = lines.iter().copied().filter(|l| l.spans(x)).collect();
    active.sort_by(|a, b| a.y_at(x).total_cmp(&b.y_at(x)));
    active
        .chunks_exact(2)
        .map(|pair| Band {
            lo: pair[0],
            hi: pair[1],
        })
        .collect()
}

/// Merges overlapping bands of several polygons into disjoint bands.
fn union_bands(mut bands: Vec<Band>, x: f64) -> Vec<Band> {
    bands.sort_by(|a, b| a.lo.y_at(x).total_cmp(&b.lo.y_at(x)));
    let mut merged: Vec<Band> = Vec::new();
    for band in bands {
        if let Some(last) = merged.last_mut()
            && band.lo.y_at(x) <= last.hi.y_at(x) + SLAB_EPS
        {
            if band.hi.y_at(x) > last.hi.y_at(x) {
                last.hi = band.hi;
            }
            continue;
        }
        merged.push(band);
    }
    merged
}

fn intersect_bands(subject: &[Band], clip: &[Band], x: f64) -> Vec<Band> {
    let mut out = Vec::new();
    for s in subject {
        for c in clip {
            // Subject lines win ties so shared edges keep the subject's identity
            let lo = if c.lo.y_at(x) > s.lo.y_at(x) + SLAB_EPS {
                c.lo
            } else {
                s.lo
            };
            let hi = if c.hi.y_at(x) < s.hi.y_at(x) - SLAB_EPS {
                c.hi
            } else {
                s.hi
            };
            if hi.y_at(x) - lo.y_at(x) > SLAB_EPS {
                out.push(Band { lo, hi });
            }
        }
    }
    out
}

fn subtract_bands(subject: &[Band], clip: &[Band], x: f64) -> Vec<Band> {
    let mut out = Vec::new();
    for s in subject {
        let mut lo = s.lo;
        for c in clip {
            if c.hi.y_at(x) <= lo.y_at(x) + SLAB_EPS {
                continue;
            }
            if c.lo.y_at(x) >= s.hi.y_at(x) - SLAB_EPS {
                break;
            }
            if c.lo.y_at(x) > lo.y_at(x) + SLAB_EPS {
                out.push(Band { lo, hi: c.lo });
            }
            lo = c.hi;
        }
        if s.hi.y_at(x) - lo.y_at(x) > SLAB_EPS {
            out.push(Band { lo, hi: s.hi });
        }
    }
    out
}

fn emit(region: &mut Region, piece: &OpenPiece, tol: f64) {
    let (xa, xb) = (piece.x_start, piece.x_end);
    let candidates = [
        Point2D::new(xa, piece.band.lo.y_at(xa)),
        Point2D::new(xb, piece.band.lo.y_at(xb)),
        Point2D::new(xb, piece.band.hi.y_at(xb)),
        Point2D::new(xa, piece.band.hi.y_at(xa)),
    ];
    let mut pts: Vec<Point2D> = Vec::with_capacity(4);
    for pt in candidates {
        if pts.last().is_none_or(|last: &Point2D| !last.is_close(&pt, SLAB_EPS)) {
            pts.push(pt);
        }
    }
    if pts.len() > 1 && pts[0].is_close(&pts[pts.len() - 1], SLAB_EPS) {
        pts.pop();
    }
    if pts.len() < 3 || polygon_area(&pts) <= tol * tol {
        return;
    }
    region.pieces.push(pts);
}
