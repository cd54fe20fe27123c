//! Resolution of a building into 3D rooms.
//!
//! Pipeline: levels → adjacency classification → extrusion → validation.
//! Resolution is a pure function of the building and the configuration;
//! resolving the same input twice gives identical output.

pub mod adjacency;
pub mod extrude;
pub mod validate;

use crate::building::Building;
use crate::config::ResolveConfig;
use crate::error::Result;
use crate::resolve::adjacency::{
    Adjacency, AdjacencyKind, Classification, classify, expand_rooms,
};
use crate::geom::point::Point3D;
use crate::resolve::extrude::{Face3D, FaceKind, FaceRef, Room3D, extrude, room_id};
use crate::resolve::validate::{ValidationReport, validate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

/// Output of a resolution. Read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedModel {
    building: String,
    tolerance: f64,
    rooms: Vec<Room3D>,
    adjacencies: Vec<Adjacency>,
    report: ValidationReport,
}

impl ResolvedModel {
    pub fn building(&self) -> &str {
        &self.building
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn rooms(&self) -> &[Room3D] {
        &self.rooms
    }

    pub fn room(&self, id: &str) -> Option<&Room3D> {
        self.rooms.iter().find(|r| r.id == id)
    }

    /// Interior pairs, each listed once.
    pub fn adjacencies(&self) -> &[Adjacency] {
        &self.adjacencies
    }

    /// Problems found on the returned rooms.
    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn is_valid(&self) -> bool {
        self.report.is_valid()
    }

    /// Exterior wall area of the building, counting every story copy.
    pub fn exterior_wall_area(&self) -> f64 {
        self.rooms
            .iter()
            .map(|r| r.exterior_wall_area() * r.multiplier as f64)
            .sum()
    }

    /// Window area of the building, counting every story copy.
    pub fn exterior_aperture_area(&self) -> f64 {
        self.rooms
            .iter()
            .map(|r| r.exterior_aperture_area() * r.multiplier as f64)
            .sum()
    }

    /// Skylight area of the building.
    ///
    /// Roofs of a collapsed room belong to its last copy, so they count once.
    pub fn skylight_area(&self) -> f64 {
        self.rooms.iter().map(|r| r.skylight_area()).sum()
    }

    pub fn floor_area(&self) -> f64 {
        self.rooms
            .iter()
            .map(|r| r.floor_area() * r.multiplier as f64)
            .sum()
    }

    pub fn volume(&self) -> f64 {
        self.rooms
            .iter()
            .map(|r| r.volume() * r.multiplier as f64)
            .sum()
    }
}

/// Resolves a building into rooms with classified, paired faces.
///
/// Fails only on an unusable configuration or a room that cannot be
/// extruded. Geometric problems of the result are reported in
/// [`ResolvedModel::report`].
#[instrument(skip_all, fields(building = building.name()))]
pub fn resolve(building: &Building, cfg: &ResolveConfig) -> Result<ResolvedModel> {
    cfg.validate()?;

    let (levels, slots) = expand_rooms(building);
    info!(
        stories = building.stories().len(),
        levels = levels.len(),
        rooms = slots.len(),
        "Resolving building"
    );

    let boundaries = classify(&levels, &slots, cfg);
    let expanded = extrude(building, &slots, &boundaries, cfg)?;

    let rooms = if cfg.expand_multipliers {
        expanded
    } else {
        collapse(building, expanded)
    };
    let report = validate(&rooms, cfg.tolerance);
    if !report.is_valid() {
        warn!(violations = report.len(), "Resolved model has violations");
    }
    let adjacencies = collect_adjacencies(&rooms);
    debug!(
        rooms = rooms.len(),
        adjacencies = adjacencies.len(),
        "Resolution done"
    );

    Ok(ResolvedModel {
        building: building.name().to_string(),
        tolerance: cfg.tolerance,
        rooms,
        adjacencies,
        report,
    })
}

/// Resolves many buildings in parallel, one task per building.
///
/// Results are in input order.
pub fn resolve_many(buildings: &[Building], cfg: &ResolveConfig) -> Vec<Result<ResolvedModel>> {
    buildings.par_iter().map(|b| resolve(b, cfg)).collect()
}

/// Keeps one room per footprint of a multiplied story, standing for all copies.
///
/// The room takes the floors and walls of the first copy and the roof of the
/// last copy, lowered onto the first. Neighbor references are redirected to
/// the kept faces. A pair with a lowered roof on either side no longer
/// touches in space: both faces become adiabatic and keep the reference.
fn collapse(building: &Building, expanded: Vec<Room3D>) -> Vec<Room3D> {
    let multiplier = |story: &str| building.story(story).map_or(1, |s| s.multiplier());

    let mut firsts = Vec::new();
    let mut tops: HashMap<(String, String), Room3D> = HashMap::new();
    for room in expanded {
        match room.copy {
            Some(0) => firsts.push(room),
            Some(c) if c + 1 == multiplier(&room.story_id) => {
                tops.insert((room.story_id.clone(), room.footprint_name.clone()), room);
            }
            _ => {}
        }
    }

    // Expanded face -> collapsed face
    let mut kept: HashMap<FaceRef, FaceRef> = HashMap::new();
    let mut lowered: HashSet<FaceRef> = HashSet::new();
    let mut rooms = Vec::with_capacity(firsts.len());
    for mut room in firsts {
        let id = room_id(&room.story_id, &room.footprint_name, None);
        let top = tops.remove(&(room.story_id.clone(), room.footprint_name.clone()));
        let roof_source = top.as_ref().map_or_else(|| room.id.clone(), |t| t.id.clone());

        if let Some(top) = top {
            let dz = top.elevation - room.elevation;
            let (floors, walls): (Vec<Face3D>, Vec<Face3D>) = std::mem::take(&mut room.faces)
                .into_iter()
                .filter(|f| f.kind != FaceKind::RoofCeiling)
                .partition(|f| f.kind == FaceKind::Floor);
            room.faces = floors;
            for mut roof in top.faces.into_iter().filter(|f| f.kind == FaceKind::RoofCeiling) {
                lower(&mut roof, dz);
                lowered.insert(FaceRef {
                    room: id.clone(),
                    face: roof.id.clone(),
                });
                room.faces.push(roof);
            }
            room.faces.extend(walls);
        }

        for f in room.faces.iter() {
            let source = if f.kind == FaceKind::RoofCeiling {
                &roof_source
            } else {
                &room.id
            };
            kept.insert(
                FaceRef {
                    room: source.clone(),
                    face: f.id.clone(),
                },
                FaceRef {
                    room: id.clone(),
                    face: f.id.clone(),
                },
            );
        }
        room.multiplier = multiplier(&room.story_id);
        room.id = id;
        room.copy = None;
        rooms.push(room);
    }

    for room in rooms.iter_mut() {
        for f in room.faces.iter_mut() {
            let Some(n) = f.neighbor.take() else {
                continue;
            };
            let Some(target) = kept.get(&n) else {
                debug!(room = %room.id, face = %f.id, "Face between story copies made adiabatic");
                f.classification = Classification::Adiabatic;
                continue;
            };
            let me = FaceRef {
                room: room.id.clone(),
                face: f.id.clone(),
            };
            if lowered.contains(&me) || lowered.contains(target) {
                f.classification = Classification::Adiabatic;
            }
            f.neighbor = Some(target.clone());
        }
    }
    rooms
}

/// Moves a face with its apertures and shades down by `dz`.
fn lower(face: &mut Face3D, dz: f64) {
    let down = |pts: &mut Vec<Point3D>| pts.iter_mut().for_each(|p| p.z -= dz);
    down(&mut face.vertices);
    face.apertures.iter_mut().for_each(|a| down(&mut a.vertices));
    face.shades.iter_mut().for_each(|s| down(&mut s.vertices));
}

fn collect_adjacencies(rooms: &[Room3D]) -> Vec<Adjacency> {
    let mut seen: HashSet<((&str, &str), (&str, &str))> = HashSet::new();
    let mut out = Vec::new();
    for room in rooms {
        for f in room.faces.iter() {
            if f.classification != Classification::Interior {
                continue;
            }
            let Some(n) = &f.neighbor else {
                continue;
            };
            let me = (room.id.as_str(), f.id.as_str());
            let other = (n.room.as_str(), n.face.as_str());
            let key = if me <= other { (me, other) } else { (other, me) };
            if !seen.insert(key) {
                continue;
            }
            out.push(Adjacency {
                kind: if f.kind == FaceKind::Wall {
                    AdjacencyKind::Wall
                } else {
                    AdjacencyKind::FloorCeiling
                },
                room: room.id.clone(),
                face: f.id.clone(),
                neighbor_room: n.room.clone(),
                neighbor_face: n.face.clone(),
                area: f.area(),
                vertices: f.vertices.clone(),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::building::footprint::Footprint;
    use crate::geom::IsClose;
    use crate::geom::face;

    const TOL: f64 = 0.01;

    fn square(name: &str, x0: f64, size: f64) -> Footprint {
        Footprint::from_coords(
            name,
            &[(x0, 0.), (x0 + size, 0.), (x0 + size, size), (x0, size)],
            TOL,
        )
        .unwrap()
    }

    #[test]
    fn test_collapsed_multiplier() -> anyhow::Result<()> {
        let mut bdg = Building::new("b")?;
        bdg.add_story("s", square("a", 0., 4.), 3., 4)?;
        let model = resolve(&bdg, &ResolveConfig::default())?;
        assert!(model.is_valid(), "{:?}", model.report().violations());
        assert_eq!(model.rooms().len(), 1);
        let room = &model.rooms()[0];
        assert_eq!(room.id, "s/a");
        assert_eq!(room.multiplier, 4);
        assert!(model.volume().is_close(16. * 3. * 4., 1e-9));
        assert!(model.exterior_wall_area().is_close(16. * 3. * 4., 1e-9));

        // Roof of the last copy, lowered onto the first
        let roof = room.face("roof-0").unwrap();
        assert_eq!(roof.classification, Classification::Exterior);
        assert!(roof.neighbor.is_none());
        assert!(roof.vertices.iter().all(|p| p.z.is_close(3., 1e-12)));
        assert!(model.adjacencies().is_empty());
        Ok(())
    }

    #[test]
    fn test_collapsed_tower() -> anyhow::Result<()> {
        let mut bdg = Building::new("tower")?;
        bdg.add_story("podium", square("a", 0., 20.), 4., 1)?;
        bdg.add_story("typical", square("a", 0., 20.), 3., 5)?;
        bdg.add_story("penthouse", square("p", 5., 10.), 3., 1)?;
        let model = resolve(&bdg, &ResolveConfig::default())?;
        assert_eq!(model.rooms().len(), 3);
        let report = validate(model.rooms(), TOL);
        assert!(report.is_valid(), "{:?}", report.violations());
        assert!(model.is_valid());

        // Podium roof and the first typical floor still touch
        let typical = model.room("typical/a").unwrap();
        let floor = typical.face("floor-0").unwrap();
        assert_eq!(floor.classification, Classification::Interior);
        assert_eq!(
            floor.neighbor,
            Some(FaceRef {
                room: "podium/a".to_string(),
                face: "roof-0".to_string(),
            })
        );

        let roofs: Vec<&Face3D> = typical.faces_by_kind(FaceKind::RoofCeiling).collect();
        assert!(roofs.iter().all(|f| f.vertices.iter().all(|p| p.z.is_close(7., 1e-9))));
        let exposed: f64 = roofs.iter().filter(|f| f.is_exterior()).map(|f| f.area()).sum();
        assert!(exposed.is_close(300., 1e-6));

        // Penthouse floor and the roof under it point at each other
        let penthouse = model.room("penthouse/p").unwrap();
        assert!(penthouse.elevation.is_close(19., 1e-12));
        let pfloor = penthouse.face("floor-0").unwrap();
        assert_eq!(pfloor.classification, Classification::Adiabatic);
        let target = pfloor.neighbor.as_ref().unwrap();
        assert_eq!(target.room, "typical/a");
        let under = typical.face(&target.face).unwrap();
        assert_eq!(under.classification, Classification::Adiabatic);
        assert_eq!(
            under.neighbor,
            Some(FaceRef {
                room: "penthouse/p".to_string(),
                face: "floor-0".to_string(),
            })
        );
        assert!(under.area().is_close(100., 1e-6));

        assert_eq!(model.adjacencies().len(), 1);
        Ok(())
    }

    #[test]
    fn test_expanded_multiplier() -> anyhow::Result<()> {
        let mut bdg = Building::new("b")?;
        bdg.add_story("s", square("a", 0., 4.), 3., 3)?;
        let cfg = ResolveConfig::new().with_expanded_multipliers(true);
        let model = resolve(&bdg, &cfg)?;
        assert_eq!(model.rooms().len(), 3);
        assert!(model.rooms().iter().all(|r| r.multiplier == 1));
        let floor_pairs = model
            .adjacencies()
            .iter()
            .filter(|a| a.kind == AdjacencyKind::FloorCeiling)
            .count();
        assert_eq!(floor_pairs, 2);
        assert!(model.room("s/a/2").unwrap().elevation.is_close(6., 1e-12));

        let first = &model.adjacencies()[0];
        assert!(first.vertices.len() >= 3);
        assert!(face::area(&first.vertices).is_close(first.area, 1e-12));
        let z = first.vertices[0].z;
        assert!(z.is_close(3., 1e-12) || z.is_close(6., 1e-12));
        assert!(first.vertices.iter().all(|p| p.z.is_close(z, 1e-12)));
        Ok(())
    }

    #[test]
    fn test_invalid_config() {
        let bdg = Building::new("b").unwrap();
        let cfg = ResolveConfig::new().with_tolerance(-1.);
        assert!(resolve(&bdg, &cfg).is_err());
    }

    #[test]
    fn test_resolve_many_keeps_order() -> anyhow::Result<()> {
        let mut buildings = Vec::new();
        for i in 0..4 {
            let mut bdg = Building::new(&format!("b{i}"))?;
            bdg.add_story("s", square("a", 0., 2. + i as f64), 3., 1)?;
            buildings.push(bdg);
        }
        let models = resolve_many(&buildings, &ResolveConfig::default());
        assert_eq!(models.len(), 4);
        for (i, model) in models.into_iter().enumerate() {
            let model = model?;
            assert_eq!(model.building(), format!("b{i}"));
            assert!(model.is_valid());
        }
        Ok(())
    }
}
