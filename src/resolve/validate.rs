//! Whole-building consistency checks on resolved rooms.
//!
//! Every check runs to completion and reports problems as data; nothing here
//! fails fast. Checks:
//! - interior faces are paired with exactly one face of another room,
//!   and adiabatic faces that name a partner are named back,
//! - rooms of the same level do not overlap,
//! - every room has a floor and a roof,
//! - every room is closed and encloses footprint area times height,
//! - the exterior envelope of the building is closed, both by vector area
//!   and by every edge running back along edges of other faces,
//! - faces do not intersect themselves,
//! - every footprint edge is fully covered by wall faces.

use crate::geom::bboxes::BBox2D;
use crate::geom::face;
use crate::geom::point::Point3D;
use crate::geom::polygon::boolean::overlap_area;
use crate::geom::polygon::{is_self_intersecting, polygon_area};
use crate::geom::projection::PlaneBasis;
use crate::geom::vector::Vector;
use crate::resolve::adjacency::Classification;
use crate::resolve::extrude::{Face3D, FaceKind, FaceRef, Room3D};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    /// Interior face without a partner face.
    UnpairedInterior,
    /// Interior face whose partner does not match it.
    MismatchedPair,
    OverlappingRooms,
    MissingFloor,
    MissingRoof,
    /// Faces of a room do not form a closed shell.
    OpenRoom,
    /// Enclosed volume differs from footprint area times height.
    VolumeMismatch,
    /// Exterior and ground faces of the building do not form a closed shell.
    OpenEnvelope,
    SelfIntersectingFace,
    DegenerateFace,
    /// Wall faces of a footprint edge do not add up to its length.
    UncoveredEdge,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    /// `None` for building-wide problems.
    pub room: Option<String>,
    pub face: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn count(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }

    fn push(&mut self, kind: ViolationKind, room: Option<&str>, face: Option<&str>, message: String) {
        debug!(?kind, ?room, ?face, %message, "Violation");
        self.violations.push(Violation {
            kind,
            room: room.map(str::to_string),
            face: face.map(str::to_string),
            message,
        });
    }
}

/// Validates a set of rooms, one per story copy.
pub fn validate(rooms: &[Room3D], tol: f64) -> ValidationReport {
    let mut report = ValidationReport::default();

    check_pairing(rooms, tol, &mut report);
    check_overlaps(rooms, tol, &mut report);
    for room in rooms {
        check_room(room, tol, &mut report);
    }
    check_envelope(rooms, tol, &mut report);

    debug!(
        rooms = rooms.len(),
        violations = report.len(),
        "Validation done"
    );
    report
}

fn check_pairing(rooms: &[Room3D], tol: f64, report: &mut ValidationReport) {
    let by_id: HashMap<&str, &Room3D> = rooms.iter().map(|r| (r.id.as_str(), r)).collect();

    // How many faces point at each face
    let mut refs: HashMap<FaceRef, usize> = HashMap::new();
    for room in rooms {
        for f in room.faces.iter() {
            if let Some(n) = &f.neighbor {
                *refs.entry(n.clone()).or_default() += 1;
            }
        }
    }

    for room in rooms {
        for f in room.faces.iter() {
            let interior = match f.classification {
                Classification::Interior => true,
                Classification::Adiabatic => false,
                _ => continue,
            };
            let Some(n) = &f.neighbor else {
                if !interior {
                    continue;
                }
                report.push(
                    ViolationKind::UnpairedInterior,
                    Some(&room.id),
                    Some(&f.id),
                    "interior face has no neighbor".to_string(),
                );
                continue;
            };
            if n.room == room.id {
                report.push(
                    ViolationKind::MismatchedPair,
                    Some(&room.id),
                    Some(&f.id),
                    "interior face is paired with its own room".to_string(),
                );
                continue;
            }
            let Some(partner) = by_id.get(n.room.as_str()).and_then(|r| r.face(&n.face)) else {
                report.push(
                    ViolationKind::UnpairedInterior,
                    Some(&room.id),
                    Some(&f.id),
                    format!("neighbor face {}:{} does not exist", n.room, n.face),
                );
                continue;
            };

            let me = FaceRef {
                room: room.id.clone(),
                face: f.id.clone(),
            };
            if partner.classification != f.classification
                || partner.neighbor.as_ref() != Some(&me)
            {
                report.push(
                    ViolationKind::MismatchedPair,
                    Some(&room.id),
                    Some(&f.id),
                    format!("neighbor face {}:{} does not point back", n.room, n.face),
                );
            } else if interior && !face::same_vertices(&f.vertices, &partner.vertices, tol) {
                report.push(
                    ViolationKind::MismatchedPair,
                    Some(&room.id),
                    Some(&f.id),
                    format!("geometry differs from neighbor face {}:{}", n.room, n.face),
                );
            }
            let count = refs.get(&me).copied().unwrap_or(0);
            if count > 1 {
                report.push(
                    ViolationKind::MismatchedPair,
                    Some(&room.id),
                    Some(&f.id),
                    format!("face is claimed by {count} neighbors"),
                );
            }
        }
    }
}

/// Rooms of the same story copy must not overlap in plan.
fn check_overlaps(rooms: &[Room3D], tol: f64, report: &mut ValidationReport) {
    let bboxes: Vec<Option<BBox2D>> = rooms
        .iter()
        .map(|r| BBox2D::from_points(&r.footprint))
        .collect();
    for (i, a) in rooms.iter().enumerate() {
        for (j, b) in rooms.iter().enumerate().skip(i + 1) {
            if a.story_id != b.story_id || a.copy != b.copy {
                continue;
            }
            if let (Some(ba), Some(bb)) = (&bboxes[i], &bboxes[j])
                && !ba.overlaps(bb, tol)
            {
                continue;
            }
            let area = overlap_area(&a.footprint, &b.footprint, tol);
            if area > tol * tol {
                report.push(
                    ViolationKind::OverlappingRooms,
                    Some(&a.id),
                    None,
                    format!("overlaps room {} by {:.4} area units", b.id, area),
                );
            }
        }
    }
}

fn check_room(room: &Room3D, tol: f64, report: &mut ValidationReport) {
    let id = Some(room.id.as_str());

    if room.faces_by_kind(FaceKind::Floor).next().is_none() {
        report.push(ViolationKind::MissingFloor, id, None, "room has no floor".to_string());
    }
    if room.faces_by_kind(FaceKind::RoofCeiling).next().is_none() {
        report.push(ViolationKind::MissingRoof, id, None, "room has no roof".to_string());
    }

    for f in room.faces.iter() {
        check_face(room, f, tol, report);
    }

    // Closed shell: face vector areas cancel out
    let surface: f64 = room.faces.iter().map(|f| f.area()).sum();
    let va = room
        .faces
        .iter()
        .fold(Vector::zero(), |acc, f| acc + face::vector_area(&f.vertices));
    if va.length() > tol * surface.sqrt() {
        report.push(
            ViolationKind::OpenRoom,
            id,
            None,
            format!("faces leave a gap (vector area {:.6})", va.length()),
        );
    }

    let enclosed: f64 = room
        .faces
        .iter()
        .map(|f| face::signed_volume_contribution(&f.vertices))
        .sum();
    let expected = polygon_area(&room.footprint) * room.height;
    if (enclosed - expected).abs() > tol * surface {
        report.push(
            ViolationKind::VolumeMismatch,
            id,
            None,
            format!("encloses {enclosed:.4} instead of {expected:.4}"),
        );
    }

    let n = room.footprint.len();
    for e in 0..n {
        let edge_len = room.footprint[e].distance(&room.footprint[(e + 1) % n]);
        let covered: f64 = room
            .faces_by_kind(FaceKind::Wall)
            .filter(|f| f.edge == Some(e) && f.vertices.len() >= 2)
            .map(|f| (f.vertices[1] - f.vertices[0]).length())
            .sum();
        if (covered - edge_len).abs() > tol {
            report.push(
                ViolationKind::UncoveredEdge,
                id,
                None,
                format!("edge {e} covered over {covered:.4} of {edge_len:.4}"),
            );
        }
    }
}

fn check_face(room: &Room3D, f: &Face3D, tol: f64, report: &mut ValidationReport) {
    let Some(basis) = PlaneBasis::from_face(&f.vertices) else {
        report.push(
            ViolationKind::DegenerateFace,
            Some(&room.id),
            Some(&f.id),
            "face has no area".to_string(),
        );
        return;
    };
    // Floor pieces may be thinner than the tolerance, so check with its square
    if is_self_intersecting(&basis.project_all(&f.vertices), tol * tol) {
        report.push(
            ViolationKind::SelfIntersectingFace,
            Some(&room.id),
            Some(&f.id),
            "face intersects itself".to_string(),
        );
    }
}

fn check_envelope(rooms: &[Room3D], tol: f64, report: &mut ValidationReport) {
    let outer: Vec<&[Point3D]> = rooms
        .iter()
        .flat_map(|r| r.faces.iter())
        .filter(|f| f.classification != Classification::Interior)
        .map(|f| f.vertices.as_slice())
        .collect();
    let (va, surface) = outer.iter().fold((Vector::zero(), 0.), |(va, s), pts| {
        (va + face::vector_area(pts), s + face::area(pts))
    });
    if va.length() > tol * surface.sqrt() {
        report.push(
            ViolationKind::OpenEnvelope,
            None,
            None,
            format!("exterior faces leave a gap (vector area {:.6})", va.length()),
        );
        return;
    }
    // Open shells such as a tube have zero vector area too
    let open = face::unmatched_edge_length(&outer, tol);
    if open > tol {
        report.push(
            ViolationKind::OpenEnvelope,
            None,
            None,
            format!("exterior faces leave {open:.4} of edges unmatched"),
        );
    }
}
