//! Adjacency detection between the rooms of a building.
//!
//! Works on levels (every copy of every story at its true elevation):
//! - horizontal pass: shared wall segments between rooms of the same level,
//! - vertical pass: shared floor/ceiling regions between consecutive levels.
//!
//! Every part of every boundary ends up in exactly one classification.

use crate::building::footprint::Footprint;
use crate::building::{Building, Level};
use crate::config::{ResolveConfig, TieBreak};
use crate::geom::bboxes::BBox2D;
use crate::geom::point::{Point2D, Point3D};
use crate::geom::polygon::boolean::{difference, intersection};
use crate::geom::segment::{Segment2D, edge_overlap};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// Faces outdoors.
    Exterior,
    /// Shared with another room.
    Interior,
    /// Touches the ground (floor of the lowest level).
    Ground,
    /// Boundary of a collapsed multiplied story that no longer touches its
    /// partner in space. No heat flows through it.
    Adiabatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdjacencyKind {
    /// Party wall between rooms of the same level.
    Wall,
    /// Ceiling of a lower room shared with the floor of an upper room.
    FloorCeiling,
}

/// Interior relation between two faces of the resolved model.
///
/// Each shared segment or region is listed once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adjacency {
    pub kind: AdjacencyKind,
    pub room: String,
    pub face: String,
    pub neighbor_room: String,
    pub neighbor_face: String,
    /// Area of the shared wall or floor region.
    pub area: f64,
    /// Shared region, ordered as the face of `room`.
    pub vertices: Vec<Point3D>,
}

/// Room of one level, i.e. one copy of one footprint.
#[derive(Debug, Clone)]
pub struct RoomSlot<'a> {
    pub level: usize,
    pub story: usize,
    pub footprint_index: usize,
    pub copy: usize,
    pub footprint: &'a Footprint,
    pub elevation: f64,
    pub height: f64,
}

/// Lists the rooms of all levels, bottom to top.
///
/// Returns the levels too, so that slot `level` fields index into them.
pub fn expand_rooms(building: &Building) -> (Vec<Level>, Vec<RoomSlot<'_>>) {
    let levels = building.all_levels();
    let mut slots = Vec::new();
    for (li, level) in levels.iter().enumerate() {
        let story = &building.stories()[level.story_index];
        for (fi, fp) in story.footprints().iter().enumerate() {
            slots.push(RoomSlot {
                level: li,
                story: level.story_index,
                footprint_index: fi,
                copy: level.copy,
                footprint: fp,
                elevation: level.elevation,
                height: level.height,
            });
        }
    }
    (levels, slots)
}

/// Edge of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EdgeRef {
    pub room: usize,
    pub edge: usize,
}

/// Entry in one of a room's boundary lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceRef {
    pub room: usize,
    pub index: usize,
}

/// Classified part of a footprint edge, between parameters `t0` and `t1`.
#[derive(Debug, Clone)]
pub struct WallSegment {
    pub edge: usize,
    pub t0: f64,
    pub t1: f64,
    pub start: Point2D,
    pub end: Point2D,
    pub classification: Classification,
    /// Neighbor edge for interior segments.
    pub neighbor: Option<EdgeRef>,
    /// Matching segment in the neighbor's wall list.
    pub partner: Option<PieceRef>,
}

impl WallSegment {
    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }
}

/// Classified part of a floor or roof, counter-clockwise in plan.
#[derive(Debug, Clone)]
pub struct PlanPiece {
    pub pts: Vec<Point2D>,
    pub classification: Classification,
    /// Matching piece on the neighbor (its roof for a floor and vice versa).
    pub neighbor: Option<PieceRef>,
}

/// Classified boundary of one room.
#[derive(Debug, Clone, Default)]
pub struct RoomBoundary {
    pub walls: Vec<WallSegment>,
    pub floors: Vec<PlanPiece>,
    pub roofs: Vec<PlanPiece>,
}

/// Candidate neighbor for part of an edge.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    neighbor: EdgeRef,
    t0: f64,
    t1: f64,
    /// Overlap length.
    length: f64,
}

/// Classifies the boundaries of all rooms.
///
/// `boundaries[i]` belongs to `slots[i]`.
pub fn classify(levels: &[Level], slots: &[RoomSlot], cfg: &ResolveConfig) -> Vec<RoomBoundary> {
    let tol = cfg.tolerance;
    let bboxes: Vec<Option<BBox2D>> = slots
        .iter()
        .map(|s| BBox2D::from_points(s.footprint.vertices()))
        .collect();

    let mut by_level: Vec<Vec<usize>> = vec![Vec::new(); levels.len()];
    for (i, slot) in slots.iter().enumerate() {
        by_level[slot.level].push(i);
    }

    let mut boundaries: Vec<RoomBoundary> = vec![RoomBoundary::default(); slots.len()];

    for rooms in by_level.iter() {
        horizontal_pass(rooms, slots, &bboxes, &mut boundaries, cfg.tie_break, tol);
    }
    link_walls(&mut boundaries, tol);

    vertical_pass(levels, &by_level, slots, &bboxes, &mut boundaries, tol);

    let interior_walls = boundaries
        .iter()
        .flat_map(|b| b.walls.iter())
        .filter(|w| w.partner.is_some())
        .count();
    let interior_floors = boundaries
        .iter()
        .flat_map(|b| b.floors.iter())
        .filter(|f| f.neighbor.is_some())
        .count();
    debug!(
        rooms = slots.len(),
        wall_pairs = interior_walls / 2,
        floor_pairs = interior_floors,
        "Classified room boundaries"
    );

    boundaries
}

fn bboxes_overlap(a: &Option<BBox2D>, b: &Option<BBox2D>, tol: f64) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.overlaps(b, tol),
        _ => false,
    }
}

/// Splits every edge of the rooms of one level into exterior and interior segments.
fn horizontal_pass(
    rooms: &[usize],
    slots: &[RoomSlot],
    bboxes: &[Option<BBox2D>],
    boundaries: &mut [RoomBoundary],
    tie_break: TieBreak,
    tol: f64,
) {
    for &r in rooms {
        let fp = slots[r].footprint;
        for edge in fp.edges() {
            let seg = edge.segment();
            let len = seg.length();

            let mut candidates: Vec<Candidate> = Vec::new();
            for &other in rooms {
                if other == r || !bboxes_overlap(&bboxes[r], &bboxes[other], tol) {
                    continue;
                }
                for other_edge in slots[other].footprint.edges() {
                    if let Some((t0, t1)) = edge_overlap(&seg, &other_edge.segment(), tol) {
                        candidates.push(Candidate {
                            neighbor: EdgeRef {
                                room: other,
                                edge: other_edge.index,
                            },
                            t0,
                            t1,
                            length: (t1 - t0) * len,
                        });
                    }
                }
            }

            let segments = split_edge(&seg, edge.index, &candidates, tie_break, tol);
            boundaries[r].walls.extend(segments);
        }
    }
    debug!(rooms = rooms.len(), "Horizontal pass done");
}

/// Cuts an edge at every overlap boundary and classifies the pieces.
fn split_edge(
    seg: &Segment2D,
    edge: usize,
    candidates: &[Candidate],
    tie_break: TieBreak,
    tol: f64,
) -> Vec<WallSegment> {
    let len = seg.length();
    let min_dt = tol / len;

    let mut ts: Vec<f64> = candidates
        .iter()
        .flat_map(|c| [c.t0, c.t1])
        .filter(|&t| t > min_dt && t < 1. - min_dt)
        .collect();
    ts.sort_by(|a, b| a.total_cmp(b));

    let mut cuts = vec![0.];
    for t in ts {
        if let Some(&last) = cuts.last()
            && t - last > min_dt
        {
            cuts.push(t);
        }
    }
    cuts.push(1.);

    let mut out: Vec<WallSegment> = Vec::new();
    for w in cuts.windows(2) {
        let (t0, t1) = (w[0], w[1]);
        let mid = 0.5 * (t0 + t1);
        let covering: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| c.t0 <= mid && mid <= c.t1)
            .collect();
        let neighbor = pick_neighbor(&covering, tie_break, tol);
        let classification = if neighbor.is_some() {
            Classification::Interior
        } else {
            Classification::Exterior
        };

        // Consecutive pieces with the same outcome are one segment
        if let Some(prev) = out.last_mut()
            && prev.classification == classification
            && prev.neighbor == neighbor
        {
            prev.t1 = t1;
            prev.end = seg.point_at(t1);
            continue;
        }
        out.push(WallSegment {
            edge,
            t0,
            t1,
            start: seg.point_at(t0),
            end: seg.point_at(t1),
            classification,
            neighbor,
            partner: None,
        });
    }
    out
}

fn pick_neighbor(covering: &[&Candidate], tie_break: TieBreak, tol: f64) -> Option<EdgeRef> {
    let mut best: Option<&Candidate> = None;
    for &c in covering {
        best = match best {
            None => Some(c),
            Some(b) => {
                let better = match tie_break {
                    TieBreak::FirstNeighbor => c.neighbor < b.neighbor,
                    TieBreak::LongestOverlap => {
                        if (c.length - b.length).abs() <= tol {
                            c.neighbor < b.neighbor
                        } else {
                            c.length > b.length
                        }
                    }
                };
                if better { Some(c) } else { Some(b) }
            }
        };
    }
    if covering.len() > 1
        && let Some(b) = best
    {
        trace!(
            candidates = covering.len(),
            room = b.neighbor.room,
            edge = b.neighbor.edge,
            "Tie-break between overlapping neighbors"
        );
    }
    best.map(|c| c.neighbor)
}

/// Finds for every interior wall segment the matching segment on the neighbor.
///
/// A match runs along the neighbor edge in the opposite direction, points
/// back at this edge and has the same endpoints within tolerance. Segments
/// without a match keep `partner = None` and are reported by the validator.
fn link_walls(boundaries: &mut [RoomBoundary], tol: f64) {
    let mut links: Vec<(usize, usize, PieceRef)> = Vec::new();
    for (r, b) in boundaries.iter().enumerate() {
        for (k, w) in b.walls.iter().enumerate() {
            let Some(n) = w.neighbor else {
                continue;
            };
            let me = EdgeRef { room: r, edge: w.edge };
            let found = boundaries[n.room].walls.iter().position(|o| {
                o.edge == n.edge
                    && o.neighbor == Some(me)
                    && o.start.is_close(&w.end, tol)
                    && o.end.is_close(&w.start, tol)
            });
            if let Some(index) = found {
                links.push((r, k, PieceRef { room: n.room, index }));
            } else {
                trace!(room = r, edge = w.edge, "Interior wall segment without a partner");
            }
        }
    }
    for (r, k, partner) in links {
        boundaries[r].walls[k].partner = Some(partner);
    }
}

fn same_polygon(a: &[Point2D], b: &[Point2D], tol: f64) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(p, q)| p.is_close(q, tol))
}

fn whole(fp: &Footprint, classification: Classification) -> PlanPiece {
    PlanPiece {
        pts: fp.vertices().to_vec(),
        classification,
        neighbor: None,
    }
}

/// Classifies floors and roofs.
fn vertical_pass(
    levels: &[Level],
    by_level: &[Vec<usize>],
    slots: &[RoomSlot],
    bboxes: &[Option<BBox2D>],
    boundaries: &mut [RoomBoundary],
    tol: f64,
) {
    for (li, rooms) in by_level.iter().enumerate() {
        let stacked_below =
            li > 0 && (levels[li].elevation - levels[li - 1].top()).abs() <= tol;

        if !stacked_below {
            let classification = if li == 0 {
                Classification::Ground
            } else {
                Classification::Exterior
            };
            for &r in rooms {
                boundaries[r].floors.push(whole(slots[r].footprint, classification));
            }
        } else {
            stack(&by_level[li - 1], rooms, slots, bboxes, boundaries, tol);
        }

        let stacked_above = li + 1 < levels.len()
            && (levels[li + 1].elevation - levels[li].top()).abs() <= tol;
        if !stacked_above {
            for &r in rooms {
                boundaries[r].roofs.push(whole(slots[r].footprint, Classification::Exterior));
            }
        }
    }
}

/// Shares the floors of `upper` rooms with the roofs of `lower` rooms.
fn stack(
    lower: &[usize],
    upper: &[usize],
    slots: &[RoomSlot],
    bboxes: &[Option<BBox2D>],
    boundaries: &mut [RoomBoundary],
    tol: f64,
) {
    let mut floor_shared = vec![false; slots.len()];
    let mut floor_full = vec![false; slots.len()];
    let mut roof_shared = vec![false; slots.len()];
    let mut roof_full = vec![false; slots.len()];

    for &r in upper {
        let r_pts = slots[r].footprint.vertices();
        for &q in lower {
            if !bboxes_overlap(&bboxes[r], &bboxes[q], tol) {
                continue;
            }
            let q_pts = slots[q].footprint.vertices();
            let pieces = if same_polygon(r_pts, q_pts, tol) {
                floor_full[r] = true;
                roof_full[q] = true;
                vec![r_pts.to_vec()]
            } else {
                intersection(r_pts, &[q_pts], tol).pieces
            };
            for pts in pieces {
                let fi = boundaries[r].floors.len();
                let ri = boundaries[q].roofs.len();
                boundaries[r].floors.push(PlanPiece {
                    pts: pts.clone(),
                    classification: Classification::Interior,
                    neighbor: Some(PieceRef { room: q, index: ri }),
                });
                boundaries[q].roofs.push(PlanPiece {
                    pts,
                    classification: Classification::Interior,
                    neighbor: Some(PieceRef { room: r, index: fi }),
                });
                floor_shared[r] = true;
                roof_shared[q] = true;
                trace!(upper = r, lower = q, "Shared floor/ceiling region");
            }
        }
    }

    let lower_pts: Vec<&[Point2D]> = lower.iter().map(|&q| slots[q].footprint.vertices()).collect();
    let upper_pts: Vec<&[Point2D]> = upper.iter().map(|&r| slots[r].footprint.vertices()).collect();

    for &r in upper {
        let fp = slots[r].footprint;
        if !floor_shared[r] {
            boundaries[r].floors.push(whole(fp, Classification::Exterior));
        } else if !floor_full[r] {
            for pts in difference(fp.vertices(), &lower_pts, tol).pieces {
                boundaries[r].floors.push(PlanPiece {
                    pts,
                    classification: Classification::Exterior,
                    neighbor: None,
                });
            }
        }
    }
    for &q in lower {
        let fp = slots[q].footprint;
        if !roof_shared[q] {
            boundaries[q].roofs.push(whole(fp, Classification::Exterior));
        } else if !roof_full[q] {
            for pts in difference(fp.vertices(), &upper_pts, tol).pieces {
                boundaries[q].roofs.push(PlanPiece {
                    pts,
                    classification: Classification::Exterior,
                    neighbor: None,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::IsClose;
    use crate::geom::polygon::polygon_area;

    const TOL: f64 = 0.01;

    fn rect(name: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> Footprint {
        Footprint::from_coords(name, &[(x0, y0), (x1, y0), (x1, y1), (x0, y1)], TOL).unwrap()
    }

    fn run(bdg: &Building) -> (Vec<RoomSlot<'_>>, Vec<RoomBoundary>) {
        let (levels, slots) = expand_rooms(bdg);
        let boundaries = classify(&levels, &slots, &ResolveConfig::default());
        (slots, boundaries)
    }

    fn count(walls: &[WallSegment], c: Classification) -> usize {
        walls.iter().filter(|w| w.classification == c).count()
    }

    #[test]
    fn test_shared_edge() {
        let mut bdg = Building::new("b").unwrap();
        bdg.add_story("s", rect("a", 0., 0., 5., 5.), 3., 1).unwrap();
        bdg.add_footprint("s", rect("b", 5., 0., 10., 5.)).unwrap();
        let (_, bnd) = run(&bdg);

        for b in bnd.iter() {
            assert_eq!(b.walls.len(), 4);
            assert_eq!(count(&b.walls, Classification::Interior), 1);
            assert_eq!(count(&b.walls, Classification::Exterior), 3);
        }
        let w = bnd[0].walls.iter().find(|w| w.partner.is_some()).unwrap();
        assert_eq!(w.edge, 1);
        assert_eq!(w.partner, Some(PieceRef { room: 1, index: 3 }));
        assert_eq!(bnd[0].floors[0].classification, Classification::Ground);
        assert_eq!(bnd[0].roofs[0].classification, Classification::Exterior);
    }

    #[test]
    fn test_partial_overlap_splits_edge() {
        // Small room against the middle of a long edge
        let mut bdg = Building::new("b").unwrap();
        bdg.add_story("s", rect("big", 0., 0., 10., 4.), 3., 1).unwrap();
        bdg.add_footprint("s", rect("small", 3., 4., 6., 7.)).unwrap();
        let (_, bnd) = run(&bdg);

        // North edge of "big" runs from x=10 to x=0
        let north: Vec<&WallSegment> = bnd[0].walls.iter().filter(|w| w.edge == 2).collect();
        assert_eq!(north.len(), 3);
        let classes: Vec<Classification> = north.iter().map(|w| w.classification).collect();
        assert_eq!(
            classes,
            vec![
                Classification::Exterior,
                Classification::Interior,
                Classification::Exterior
            ]
        );
        assert!(north[1].length().is_close(3., 1e-9));
        let total: f64 = north.iter().map(|w| w.length()).sum();
        assert!(total.is_close(10., 1e-9));
        assert!(north[1].partner.is_some());
    }

    #[test]
    fn test_near_miss_is_exterior() {
        let mut bdg = Building::new("b").unwrap();
        bdg.add_story("s", rect("a", 0., 0., 5., 5.), 3., 1).unwrap();
        bdg.add_footprint("s", rect("b", 5. + 2. * TOL, 0., 10., 5.)).unwrap();
        let (_, bnd) = run(&bdg);
        for b in bnd.iter() {
            assert_eq!(count(&b.walls, Classification::Interior), 0);
        }
    }

    #[test]
    fn test_contained_upper_story() {
        let mut bdg = Building::new("b").unwrap();
        bdg.add_story("s1", rect("a", 0., 0., 10., 10.), 3., 1).unwrap();
        bdg.add_story("s2", rect("a", 2., 2., 6., 6.), 3., 1).unwrap();
        let (_, bnd) = run(&bdg);

        let lower = &bnd[0];
        let shared: f64 = lower
            .roofs
            .iter()
            .filter(|p| p.classification == Classification::Interior)
            .map(|p| polygon_area(&p.pts))
            .sum();
        let exposed: f64 = lower
            .roofs
            .iter()
            .filter(|p| p.classification == Classification::Exterior)
            .map(|p| polygon_area(&p.pts))
            .sum();
        assert!(shared.is_close(16., 1e-6));
        assert!(exposed.is_close(84., 1e-6));

        let upper = &bnd[1];
        assert_eq!(upper.floors.len(), 1);
        assert_eq!(upper.floors[0].classification, Classification::Interior);
        assert_eq!(upper.floors[0].neighbor, Some(PieceRef { room: 0, index: 0 }));
        assert_eq!(lower.roofs[0].neighbor, Some(PieceRef { room: 1, index: 0 }));
    }

    #[test]
    fn test_cantilever_floor_is_exterior() {
        let mut bdg = Building::new("b").unwrap();
        bdg.add_story("s1", rect("a", 0., 0., 4., 4.), 3., 1).unwrap();
        bdg.add_story("s2", rect("a", 0., 0., 6., 4.), 3., 1).unwrap();
        let (_, bnd) = run(&bdg);
        let exposed: f64 = bnd[1]
            .floors
            .iter()
            .filter(|p| p.classification == Classification::Exterior)
            .map(|p| polygon_area(&p.pts))
            .sum();
        assert!(exposed.is_close(8., 1e-6));
        assert!(
            bnd[0]
                .roofs
                .iter()
                .all(|p| p.classification == Classification::Interior)
        );
    }

    #[test]
    fn test_multiplier_copies_are_stacked() {
        let mut bdg = Building::new("b").unwrap();
        bdg.add_story("s", rect("a", 0., 0., 4., 4.), 3., 3).unwrap();
        let (slots, bnd) = run(&bdg);
        assert_eq!(slots.len(), 3);
        assert_eq!(bnd[0].floors[0].classification, Classification::Ground);
        assert_eq!(bnd[1].floors[0].classification, Classification::Interior);
        assert_eq!(bnd[1].roofs[0].classification, Classification::Interior);
        assert_eq!(bnd[2].roofs[0].classification, Classification::Exterior);
        assert!(slots[2].elevation.is_close(6., 1e-12));
    }

    #[test]
    fn test_tie_break_policies() {
        let long = Candidate {
            neighbor: EdgeRef { room: 2, edge: 0 },
            t0: 0.,
            t1: 1.,
            length: 10.,
        };
        let short = Candidate {
            neighbor: EdgeRef { room: 1, edge: 3 },
            t0: 0.2,
            t1: 0.4,
            length: 2.,
        };
        let covering = [&short, &long];
        assert_eq!(
            pick_neighbor(&covering, TieBreak::LongestOverlap, TOL),
            Some(EdgeRef { room: 2, edge: 0 })
        );
        assert_eq!(
            pick_neighbor(&covering, TieBreak::FirstNeighbor, TOL),
            Some(EdgeRef { room: 1, edge: 3 })
        );
        assert_eq!(pick_neighbor(&[], TieBreak::LongestOverlap, TOL), None);
    }
}
