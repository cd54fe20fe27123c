//! Extrusion of classified footprints into 3D rooms.

use crate::building::Building;
use crate::building::params::{EdgeMeta, MAX_SKYLIGHT_RATIO, ShadingParameter, SkylightParameter};
use crate::config::{ResolveConfig, WindowPlacement};
use crate::error::{ModelError, Result};
use crate::geom::EPS;
use crate::geom::bboxes::BBox2D;
use crate::geom::face;
use crate::geom::point::{Point2D, Point3D};
use crate::geom::polygon::boolean::intersection;
use crate::geom::polygon::{centroid, perimeter, polygon_area};
use crate::resolve::adjacency::{Classification, PlanPiece, RoomBoundary, RoomSlot, WallSegment};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaceKind {
    Floor,
    RoofCeiling,
    Wall,
}

/// Face of another room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FaceRef {
    pub room: String,
    pub face: String,
}

/// Window on a wall face or skylight on a roof face, coplanar with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aperture {
    pub id: String,
    pub vertices: Vec<Point3D>,
}

impl Aperture {
    pub fn area(&self) -> f64 {
        face::area(&self.vertices)
    }
}

/// Exterior shading surface attached to a window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shade {
    pub id: String,
    pub vertices: Vec<Point3D>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Face3D {
    /// Unique within the room.
    pub id: String,
    pub kind: FaceKind,
    /// Ordered so that the normal points out of the room.
    pub vertices: Vec<Point3D>,
    pub classification: Classification,
    /// Partner face for interior faces and for adiabatic faces split from one.
    pub neighbor: Option<FaceRef>,
    pub apertures: Vec<Aperture>,
    pub shades: Vec<Shade>,
    /// Footprint edge of a wall face.
    pub edge: Option<usize>,
    /// Metadata of the footprint edge of a wall face.
    pub meta: Option<EdgeMeta>,
}

impl Face3D {
    pub fn area(&self) -> f64 {
        face::area(&self.vertices)
    }

    pub fn aperture_area(&self) -> f64 {
        self.apertures.iter().map(|a| a.area()).sum()
    }

    pub fn is_exterior(&self) -> bool {
        self.classification == Classification::Exterior
    }
}

/// Closed room volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room3D {
    pub id: String,
    pub story_id: String,
    pub footprint_name: String,
    /// Copy index for expanded rooms, `None` for a room standing for all copies.
    pub copy: Option<usize>,
    pub multiplier: usize,
    pub elevation: f64,
    pub height: f64,
    /// Footprint in plan, counter-clockwise.
    pub footprint: Vec<Point2D>,
    pub faces: Vec<Face3D>,
}

impl Room3D {
    pub fn face(&self, id: &str) -> Option<&Face3D> {
        self.faces.iter().find(|f| f.id == id)
    }

    pub fn faces_by_kind(&self, kind: FaceKind) -> impl Iterator<Item = &Face3D> {
        self.faces.iter().filter(move |f| f.kind == kind)
    }

    pub fn floor_area(&self) -> f64 {
        polygon_area(&self.footprint)
    }

    pub fn volume(&self) -> f64 {
        self.floor_area() * self.height
    }

    /// Area of exterior wall faces of one copy.
    pub fn exterior_wall_area(&self) -> f64 {
        self.faces_by_kind(FaceKind::Wall)
            .filter(|f| f.is_exterior())
            .map(|f| f.area())
            .sum()
    }

    /// Window area of one copy.
    pub fn exterior_aperture_area(&self) -> f64 {
        self.faces_by_kind(FaceKind::Wall)
            .filter(|f| f.is_exterior())
            .map(|f| f.aperture_area())
            .sum()
    }

    /// Skylight area on the exterior roof.
    pub fn skylight_area(&self) -> f64 {
        self.faces_by_kind(FaceKind::RoofCeiling)
            .filter(|f| f.is_exterior())
            .map(|f| f.aperture_area())
            .sum()
    }
}

/// Id of a room: `story/footprint` or `story/footprint/copy`.
pub fn room_id(story: &str, footprint: &str, copy: Option<usize>) -> String {
    match copy {
        Some(c) => format!("{story}/{footprint}/{c}"),
        None => format!("{story}/{footprint}"),
    }
}

fn wall_face_id(walls: &[WallSegment], index: usize) -> String {
    let edge = walls[index].edge;
    let k = walls[..index].iter().filter(|w| w.edge == edge).count();
    format!("wall-{edge}-{k}")
}

fn floor_face_id(index: usize) -> String {
    format!("floor-{index}")
}

fn roof_face_id(index: usize) -> String {
    format!("roof-{index}")
}

/// Builds one room per slot from its classified boundary.
pub fn extrude(
    building: &Building,
    slots: &[RoomSlot],
    boundaries: &[RoomBoundary],
    cfg: &ResolveConfig,
) -> Result<Vec<Room3D>> {
    let ids: Vec<String> = slots
        .iter()
        .map(|s| {
            room_id(
                building.stories()[s.story].id(),
                s.footprint.name(),
                Some(s.copy),
            )
        })
        .collect();

    let mut rooms = Vec::with_capacity(slots.len());
    for (i, slot) in slots.iter().enumerate() {
        let id = &ids[i];
        if !(slot.height.is_finite() && slot.height > 0.) {
            return Err(ModelError::DegenerateExtrusion {
                room: id.clone(),
                height: slot.height,
            });
        }
        let b = &boundaries[i];
        let z0 = slot.elevation;
        let z1 = slot.elevation + slot.height;
        let meta = slot.footprint.edge_meta();

        let mut faces: Vec<Face3D> = Vec::new();

        for (k, piece) in b.floors.iter().enumerate() {
            let neighbor = piece.neighbor.map(|n| FaceRef {
                room: ids[n.room].clone(),
                face: roof_face_id(n.index),
            });
            faces.push(plan_face(floor_face_id(k), FaceKind::Floor, piece, z0, neighbor));
        }
        let skylights = match slot.footprint.skylight() {
            Some(skylight) => skylight_outlines(&b.roofs, skylight, cfg.tolerance),
            None => vec![Vec::new(); b.roofs.len()],
        };
        for (k, piece) in b.roofs.iter().enumerate() {
            let neighbor = piece.neighbor.map(|n| FaceRef {
                room: ids[n.room].clone(),
                face: floor_face_id(n.index),
            });
            let mut face = plan_face(roof_face_id(k), FaceKind::RoofCeiling, piece, z1, neighbor);
            face.apertures = skylights[k]
                .iter()
                .enumerate()
                .map(|(i, pts)| Aperture {
                    id: format!("{}-skylight-{i}", face.id),
                    vertices: pts.iter().map(|p| p.at_z(z1)).collect(),
                })
                .collect();
            faces.push(face);
        }
        for (k, w) in b.walls.iter().enumerate() {
            let face_id = wall_face_id(&b.walls, k);
            let neighbor = w.partner.map(|p| FaceRef {
                room: ids[p.room].clone(),
                face: wall_face_id(&boundaries[p.room].walls, p.index),
            });
            let vertices = vec![
                w.start.at_z(z0),
                w.end.at_z(z0),
                w.end.at_z(z1),
                w.start.at_z(z1),
            ];
            let m = meta[w.edge];
            let (apertures, shades) = if w.classification == Classification::Exterior {
                openings(&face_id, w.start, w.end, z0, z1, &m, cfg.window_placement)
            } else {
                (Vec::new(), Vec::new())
            };
            faces.push(Face3D {
                id: face_id,
                kind: FaceKind::Wall,
                vertices,
                classification: w.classification,
                neighbor,
                apertures,
                shades,
                edge: Some(w.edge),
                meta: Some(m),
            });
        }

        rooms.push(Room3D {
            id: id.clone(),
            story_id: building.stories()[slot.story].id().to_string(),
            footprint_name: slot.footprint.name().to_string(),
            copy: Some(slot.copy),
            multiplier: 1,
            elevation: z0,
            height: slot.height,
            footprint: slot.footprint.vertices().to_vec(),
            faces,
        });
    }
    Ok(rooms)
}

fn plan_face(
    id: String,
    kind: FaceKind,
    piece: &PlanPiece,
    z: f64,
    neighbor: Option<FaceRef>,
) -> Face3D {
    let mut vertices: Vec<Point3D> = piece.pts.iter().map(|p| p.at_z(z)).collect();
    if kind == FaceKind::Floor {
        // Floor normal points down
        vertices.reverse();
    }
    Face3D {
        id,
        kind,
        vertices,
        classification: piece.classification,
        neighbor,
        apertures: Vec::new(),
        shades: Vec::new(),
        edge: None,
        meta: None,
    }
}

/// Window and shades of an exterior wall between `start` and `end`.
fn openings(
    face_id: &str,
    start: Point2D,
    end: Point2D,
    z0: f64,
    z1: f64,
    meta: &EdgeMeta,
    placement: WindowPlacement,
) -> (Vec<Aperture>, Vec<Shade>) {
    if !meta.has_window() {
        return (Vec::new(), Vec::new());
    }
    let Some((a, b, zb, zt)) = window_rectangle(start, end, z0, z1, meta.window_ratio, placement)
    else {
        return (Vec::new(), Vec::new());
    };
    let aperture = Aperture {
        id: format!("{face_id}-window"),
        vertices: vec![a.at_z(zb), b.at_z(zb), b.at_z(zt), a.at_z(zt)],
    };

    let shades = match meta.shading {
        Some(shading) if shading.depth() > 0. => {
            let len = start.distance(&end);
            let n = ((end.y - start.y) / len, -(end.x - start.x) / len);
            shade_surfaces(face_id, a, b, zb, zt, n, &shading)
        }
        _ => Vec::new(),
    };
    (vec![aperture], shades)
}

/// Window corners in plan (`a`, `b`) and its bottom and top elevation.
///
/// Returns `None` for walls too small to hold a window.
fn window_rectangle(
    start: Point2D,
    end: Point2D,
    z0: f64,
    z1: f64,
    ratio: f64,
    placement: WindowPlacement,
) -> Option<(Point2D, Point2D, f64, f64)> {
    let h = z1 - z0;
    if h <= 0. || start.distance(&end) <= 0. {
        return None;
    }
    match placement {
        WindowPlacement::Centered => {
            let k = ratio.sqrt();
            let inset = 0.5 * (1. - k);
            let a = Point2D::lerp(start, end, inset);
            let b = Point2D::lerp(start, end, 1. - inset);
            Some((a, b, z0 + inset * h, z1 - inset * h))
        }
        WindowPlacement::Strip { sill_height } => {
            let wh = ratio * h;
            let sill = sill_height.min(h - wh);
            Some((start, end, z0 + sill, z0 + sill + wh))
        }
    }
}

/// Shade geometry for a window spanning `a..b` in plan and `zb..zt` vertically.
///
/// `n` is the outward unit normal of the wall in plan.
fn shade_surfaces(
    face_id: &str,
    a: Point2D,
    b: Point2D,
    zb: f64,
    zt: f64,
    n: (f64, f64),
    shading: &ShadingParameter,
) -> Vec<Shade> {
    let out = |p: Point2D, d: f64| Point2D::new(p.x + n.0 * d, p.y + n.1 * d);
    let horizontal = |z: f64, depth: f64, drop: f64| {
        vec![
            a.at_z(z),
            b.at_z(z),
            out(b, depth).at_z(z - drop),
            out(a, depth).at_z(z - drop),
        ]
    };
    let vertical = |p: Point2D, depth: f64| {
        vec![
            p.at_z(zb),
            out(p, depth).at_z(zb),
            out(p, depth).at_z(zt),
            p.at_z(zt),
        ]
    };

    let surfaces: Vec<Vec<Point3D>> = match *shading {
        ShadingParameter::Overhang { depth, angle } => {
            let rad = angle.to_radians();
            vec![horizontal(zt, depth * rad.cos(), depth * rad.sin())]
        }
        ShadingParameter::ExtrudedBorder { depth } => vec![
            horizontal(zt, depth, 0.),
            horizontal(zb, depth, 0.),
            vertical(a, depth),
            vertical(b, depth),
        ],
        ShadingParameter::Louvers { count, depth } => {
            let spacing = (zt - zb) / count as f64;
            (0..count)
                .map(|i| horizontal(zt - spacing * i as f64, depth, 0.))
                .collect()
        }
        ShadingParameter::LouversByDistance { distance, depth } => {
            let count = ((zt - zb) / distance - EPS).ceil().max(1.) as usize;
            (0..count)
                .map(|i| horizontal(zt - distance * i as f64, depth, 0.))
                .collect()
        }
    };

    surfaces
        .into_iter()
        .enumerate()
        .map(|(i, vertices)| Shade {
            id: format!("{face_id}-shade-{i}"),
            vertices,
        })
        .collect()
}

/// Skylight outlines in plan, one list per roof piece.
///
/// Only exterior pieces receive skylights. Outlines are counter-clockwise.
fn skylight_outlines(
    roofs: &[PlanPiece],
    skylight: &SkylightParameter,
    tol: f64,
) -> Vec<Vec<Vec<Point2D>>> {
    let mut out = vec![Vec::new(); roofs.len()];
    let exterior: Vec<usize> = roofs
        .iter()
        .enumerate()
        .filter(|(_, p)| p.classification == Classification::Exterior)
        .map(|(k, _)| k)
        .collect();

    match skylight {
        SkylightParameter::GriddedRatio { ratio, spacing } => {
            for &k in &exterior {
                out[k] = gridded(&roofs[k].pts, *ratio, *spacing, tol);
            }
        }
        SkylightParameter::GriddedArea { area, spacing } => {
            let total: f64 = exterior.iter().map(|&k| polygon_area(&roofs[k].pts)).sum();
            if total > tol * tol {
                let ratio = (area / total).min(MAX_SKYLIGHT_RATIO);
                for &k in &exterior {
                    out[k] = gridded(&roofs[k].pts, ratio, *spacing, tol);
                }
            }
        }
        SkylightParameter::Detailed { polygons } => {
            for pts in polygons {
                let needed = polygon_area(pts) - tol * perimeter(pts);
                let parts: Vec<(usize, Vec<Vec<Point2D>>)> = exterior
                    .iter()
                    .map(|&k| (k, intersection(pts, &[roofs[k].pts.as_slice()], tol).pieces))
                    .filter(|(_, pieces)| !pieces.is_empty())
                    .collect();
                let covered: f64 = parts
                    .iter()
                    .flat_map(|(_, pieces)| pieces.iter())
                    .map(|p| polygon_area(p))
                    .sum();
                if covered < needed {
                    debug!(covered, needed, "Skylight outside the exterior roof skipped");
                    continue;
                }
                // Kept whole when a single roof piece holds it
                if let [(k, _)] = parts.as_slice() {
                    out[*k].push(pts.clone());
                } else {
                    for (k, pieces) in parts {
                        out[k].extend(pieces);
                    }
                }
            }
        }
    }
    out
}

/// Grid of skylights over one roof piece, each taking `ratio` of its cell.
fn gridded(pts: &[Point2D], ratio: f64, spacing: Option<f64>, tol: f64) -> Vec<Vec<Point2D>> {
    let Some(bb) = BBox2D::from_points(pts) else {
        return Vec::new();
    };
    let spacing = spacing.unwrap_or(bb.width().min(bb.depth()) / 3. - tol);
    if ratio <= 0. || spacing <= tol {
        return Vec::new();
    }
    let k = ratio.sqrt();
    let nx = ((bb.width() / spacing - EPS).ceil() as usize).max(1);
    let ny = ((bb.depth() / spacing - EPS).ceil() as usize).max(1);

    let mut out = Vec::new();
    for i in 0..nx {
        for j in 0..ny {
            let x0 = bb.min.x + spacing * i as f64;
            let y0 = bb.min.y + spacing * j as f64;
            let cell = [
                Point2D::new(x0, y0),
                Point2D::new(x0 + spacing, y0),
                Point2D::new(x0 + spacing, y0 + spacing),
                Point2D::new(x0, y0 + spacing),
            ];
            // Cell pieces are convex, so shrinking about the centroid stays inside
            for piece in intersection(&cell, &[pts], tol).pieces {
                let c = centroid(&piece);
                out.push(
                    piece
                        .iter()
                        .map(|p| Point2D::new(c.x + (p.x - c.x) * k, c.y + (p.y - c.y) * k))
                        .collect(),
                );
            }
        }
    }
    out
}
