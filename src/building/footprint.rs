//! Footprint: the 2D floor boundary of one room.

use crate::building::params::{EdgeMeta, SkylightParameter};
use crate::building::validate_name;
use crate::config::DEFAULT_TOLERANCE;
use crate::error::{ModelError, Result};
use crate::geom::point::Point2D;
use crate::geom::polygon::{
    centroid, dedup_indices, is_ccw, is_self_intersecting, perimeter, polygon_area,
};
use crate::geom::segment::Segment2D;
use serde::{Deserialize, Serialize};

/// One edge of a footprint with its metadata.
#[derive(Debug, Clone, Copy)]
pub struct Edge<'a> {
    pub index: usize,
    pub start: Point2D,
    pub end: Point2D,
    pub meta: &'a EdgeMeta,
}

impl Edge<'_> {
    pub fn segment(&self) -> Segment2D {
        Segment2D::new(self.start, self.end)
    }

    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }
}

/// Validated floor boundary.
///
/// Always a simple, counter-clockwise polygon with at least 3 vertices and
/// non-zero area. Edge `i` runs from vertex `i` to vertex `i + 1` (the last
/// one wraps around to the first) and carries `edge_meta[i]`.
///
/// The footprint keeps the tolerance it was validated with, and is checked
/// again with the same tolerance when read back from a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "FootprintData", into = "FootprintData")]
pub struct Footprint {
    name: String,
    pts: Vec<Point2D>,
    meta: Vec<EdgeMeta>,
    skylight: Option<SkylightParameter>,
    tol: f64,
}

/// Unvalidated footprint as stored in documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FootprintData {
    pub name: String,
    pub vertices: Vec<Point2D>,
    #[serde(default)]
    pub edge_meta: Option<Vec<EdgeMeta>>,
    #[serde(default)]
    pub skylight: Option<SkylightParameter>,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

impl TryFrom<FootprintData> for Footprint {
    type Error = ModelError;

    fn try_from(data: FootprintData) -> Result<Self> {
        let mut fp =
            Footprint::with_edge_meta(&data.name, data.vertices, data.edge_meta, data.tolerance)?;
        if let Some(skylight) = data.skylight {
            fp.set_skylight(skylight)?;
        }
        Ok(fp)
    }
}

impl From<Footprint> for FootprintData {
    fn from(fp: Footprint) -> Self {
        Self {
            name: fp.name,
            vertices: fp.pts,
            edge_meta: Some(fp.meta),
            skylight: fp.skylight,
            tolerance: fp.tol,
        }
    }
}

impl Footprint {
    /// Creates a footprint with default (windowless, unshaded) edges.
    pub fn new(name: &str, pts: Vec<Point2D>, tol: f64) -> Result<Self> {
        Self::with_edge_meta(name, pts, None, tol)
    }

    /// Creates a footprint from `(x, y)` tuples.
    pub fn from_coords(name: &str, coords: &[(f64, f64)], tol: f64) -> Result<Self> {
        let pts = coords.iter().map(|&c| Point2D::from(c)).collect();
        Self::new(name, pts, tol)
    }

    /// Creates a footprint with explicit per-edge metadata.
    ///
    /// Fails with `InvalidGeometry` if the boundary has fewer than 3 distinct
    /// vertices, zero area, or intersects itself. Clockwise input is reversed
    /// (each edge keeps its metadata).
    pub fn with_edge_meta(
        name: &str,
        pts: Vec<Point2D>,
        meta: Option<Vec<EdgeMeta>>,
        tol: f64,
    ) -> Result<Self> {
        let name = validate_name(name)?;
        if !(tol.is_finite() && tol > 0.) {
            return Err(ModelError::InvalidParameter(format!(
                "footprint '{name}' tolerance must be positive, got {tol}"
            )));
        }
        let meta = match meta {
            Some(meta) => {
                if meta.len() != pts.len() {
                    return Err(ModelError::InvalidGeometry(format!(
                        "footprint '{}' has {} vertices but {} edge metadata entries",
                        name,
                        pts.len(),
                        meta.len()
                    )));
                }
                for m in meta.iter() {
                    m.validate()?;
                }
                meta
            }
            None => vec![EdgeMeta::default(); pts.len()],
        };

        if pts.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
            return Err(ModelError::InvalidGeometry(format!(
                "footprint '{name}' has non-finite coordinates"
            )));
        }

        // Repeat until stable so that validating the result again changes nothing
        let (mut pts, mut meta) = (pts, meta);
        loop {
            let kept = dedup_indices(&pts, tol);
            if kept.len() == pts.len() {
                break;
            }
            pts = kept.iter().map(|&i| pts[i]).collect();
            meta = kept.iter().map(|&i| meta[i]).collect();
        }

        if pts.len() < 3 {
            return Err(ModelError::InvalidGeometry(format!(
                "footprint '{}' needs at least 3 distinct vertices, got {}",
                name,
                pts.len()
            )));
        }
        let area = polygon_area(&pts);
        if area.abs() <= tol * tol {
            return Err(ModelError::InvalidGeometry(format!(
                "footprint '{name}' has zero area"
            )));
        }
        if is_self_intersecting(&pts, tol) {
            return Err(ModelError::InvalidGeometry(format!(
                "footprint '{name}' intersects itself"
            )));
        }

        let mut fp = Self {
            name,
            pts,
            meta,
            skylight: None,
            tol,
        };
        fp.make_ccw();
        Ok(fp)
    }

    fn make_ccw(&mut self) {
        if !is_ccw(&self.pts) {
            // Keep the first vertex, reverse the rest; edge i becomes edge n-1-i
            self.pts.reverse();
            self.pts.rotate_right(1);
            self.meta.reverse();
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[Point2D] {
        &self.pts
    }

    pub fn edge_meta(&self) -> &[EdgeMeta] {
        &self.meta
    }

    /// Tolerance the footprint was validated with.
    pub fn tolerance(&self) -> f64 {
        self.tol
    }

    pub fn skylight(&self) -> Option<&SkylightParameter> {
        self.skylight.as_ref()
    }

    pub fn set_skylight(&mut self, skylight: SkylightParameter) -> Result<()> {
        skylight.validate(self.tol)?;
        self.skylight = Some(skylight.normalized());
        Ok(())
    }

    /// Number of vertices (and edges).
    pub fn len(&self) -> usize {
        self.pts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pts.is_empty()
    }

    pub fn edge(&self, i: usize) -> Edge<'_> {
        let n = self.pts.len();
        Edge {
            index: i,
            start: self.pts[i],
            end: self.pts[(i + 1) % n],
            meta: &self.meta[i],
        }
    }

    /// Edges in order; the last one connects back to the first vertex.
    pub fn edges(&self) -> impl Iterator<Item = Edge<'_>> {
        (0..self.pts.len()).map(|i| self.edge(i))
    }

    pub fn area(&self) -> f64 {
        polygon_area(&self.pts)
    }

    pub fn perimeter(&self) -> f64 {
        perimeter(&self.pts)
    }

    pub fn centroid(&self) -> Point2D {
        centroid(&self.pts)
    }

    /// Outward unit normal of edge `i` in plan, as `(nx, ny)`.
    pub fn edge_normal(&self, i: usize) -> (f64, f64) {
        let e = self.edge(i);
        let len = e.length();
        ((e.end.y - e.start.y) / len, -(e.end.x - e.start.x) / len)
    }

    pub fn edge_normals(&self) -> Vec<(f64, f64)> {
        (0..self.len()).map(|i| self.edge_normal(i)).collect()
    }

    /// Compass orientation of each edge's outward normal in degrees.
    ///
    /// 0 = North (+y), 90 = East (+x), 180 = South, 270 = West.
    pub fn segment_orientations(&self) -> Vec<f64> {
        (0..self.len())
            .map(|i| {
                let (nx, ny) = self.edge_normal(i);
                nx.atan2(ny).to_degrees().rem_euclid(360.)
            })
            .collect()
    }

    pub fn set_edge_meta(&mut self, i: usize, meta: EdgeMeta) -> Result<()> {
        meta.validate()?;
        let n = self.meta.len();
        let slot = self.meta.get_mut(i).ok_or_else(|| {
            ModelError::InvalidParameter(format!(
                "edge index {i} out of range for footprint '{}' with {n} edges",
                self.name
            ))
        })?;
        *slot = meta;
        Ok(())
    }

    /// Applies the same metadata to every edge.
    pub fn set_all_edge_meta(&mut self, meta: EdgeMeta) -> Result<()> {
        meta.validate()?;
        self.meta.iter_mut().for_each(|m| *m = meta);
        Ok(())
    }

    pub fn move_xy(&mut self, dx: f64, dy: f64) {
        self.map_points(|p| Point2D::new(p.x + dx, p.y + dy));
    }

    /// Rotates counter-clockwise by `angle` degrees around `origin`.
    pub fn rotate_xy(&mut self, angle: f64, origin: Point2D) {
        let (sin, cos) = angle.to_radians().sin_cos();
        self.map_points(|p| {
            let (x, y) = (p.x - origin.x, p.y - origin.y);
            Point2D::new(origin.x + x * cos - y * sin, origin.y + x * sin + y * cos)
        });
    }

    /// Mirrors across the line through `origin` perpendicular to `normal`.
    ///
    /// The mirrored boundary is wound counter-clockwise again; every edge
    /// keeps its metadata.
    pub fn reflect(&mut self, normal: (f64, f64), origin: Point2D) -> Result<()> {
        let len = normal.0.hypot(normal.1);
        if !(len.is_finite() && len > 0.) {
            return Err(ModelError::InvalidParameter(format!(
                "reflection normal must be non-zero, got {normal:?}"
            )));
        }
        let (nx, ny) = (normal.0 / len, normal.1 / len);
        self.map_points(|p| {
            let d = (p.x - origin.x) * nx + (p.y - origin.y) * ny;
            Point2D::new(p.x - 2. * d * nx, p.y - 2. * d * ny)
        });
        Ok(())
    }

    /// Scales around `origin`, together with shading depths and skylight sizes.
    pub fn scale(&mut self, factor: f64, origin: Point2D) -> Result<()> {
        if !(factor.is_finite() && factor > 0.) {
            return Err(ModelError::InvalidParameter(format!(
                "scale factor must be positive, got {factor}"
            )));
        }
        self.map_points(|p| {
            Point2D::new(
                origin.x + (p.x - origin.x) * factor,
                origin.y + (p.y - origin.y) * factor,
            )
        });
        self.meta.iter_mut().for_each(|m| *m = m.scaled(factor));
        if let Some(skylight) = self.skylight.as_mut() {
            skylight.scale_sizes(factor);
        }
        Ok(())
    }

    fn map_points(&mut self, f: impl Fn(Point2D) -> Point2D) {
        self.pts.iter_mut().for_each(|p| *p = f(*p));
        if let Some(skylight) = self.skylight.as_mut() {
            skylight.map_points(&f);
        }
        self.make_ccw();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::IsClose;

    const TOL: f64 = 0.01;

    #[test]
    fn test_rectangle() {
        let fp = Footprint::from_coords("room", &[(0., 0.), (4., 0.), (4., 3.), (0., 3.)], TOL)
            .unwrap();
        assert_eq!(fp.len(), 4);
        assert!(fp.area().is_close(12., 1e-12));
        assert!(fp.perimeter().is_close(14., 1e-12));
        let e = fp.edge(3);
        assert!(e.start.is_close(&Point2D::new(0., 3.), 1e-12));
        assert!(e.end.is_close(&Point2D::new(0., 0.), 1e-12));
    }

    #[test]
    fn test_winding_normalized_with_meta() {
        let pts = vec![
            Point2D::new(0., 0.),
            Point2D::new(0., 3.),
            Point2D::new(4., 3.),
            Point2D::new(4., 0.),
        ];
        // Clockwise; tag the edge (0,3)->(4,3) (north side)
        let mut meta = vec![EdgeMeta::default(); 4];
        meta[1] = EdgeMeta::new(0.5, 0.).unwrap();
        let fp = Footprint::with_edge_meta("cw", pts, Some(meta), TOL).unwrap();
        assert!(fp.area() > 0.);
        assert!(fp.vertices()[0].is_close(&Point2D::new(0., 0.), 1e-12));
        let tagged: Vec<Edge> = fp.edges().filter(|e| e.meta.window_ratio > 0.).collect();
        assert_eq!(tagged.len(), 1);
        // Same edge, reversed direction
        assert!(tagged[0].start.is_close(&Point2D::new(4., 3.), 1e-12));
        assert!(tagged[0].end.is_close(&Point2D::new(0., 3.), 1e-12));
    }

    #[test]
    fn test_invalid_footprints() {
        let too_few = Footprint::from_coords("a", &[(0., 0.), (1., 0.)], TOL);
        assert!(matches!(too_few, Err(ModelError::InvalidGeometry(_))));

        let collinear = Footprint::from_coords("b", &[(0., 0.), (1., 0.), (2., 0.)], TOL);
        assert!(matches!(collinear, Err(ModelError::InvalidGeometry(_))));

        let bowtie = Footprint::from_coords("c", &[(0., 0.), (1., 1.), (1., 0.), (0., 1.)], TOL);
        assert!(matches!(bowtie, Err(ModelError::InvalidGeometry(_))));

        let duplicates = Footprint::from_coords("d", &[(0., 0.), (0., 0.), (1., 0.)], TOL);
        assert!(matches!(duplicates, Err(ModelError::InvalidGeometry(_))));

        let bad_name = Footprint::from_coords("a/b", &[(0., 0.), (1., 0.), (0., 1.)], TOL);
        assert!(bad_name.is_err());
    }

    #[test]
    fn test_meta_count_mismatch() {
        let pts = vec![Point2D::new(0., 0.), Point2D::new(1., 0.), Point2D::new(0., 1.)];
        let res = Footprint::with_edge_meta("t", pts, Some(vec![EdgeMeta::default(); 2]), TOL);
        assert!(matches!(res, Err(ModelError::InvalidGeometry(_))));
    }

    #[test]
    fn test_edge_normals_and_orientations() {
        let fp = Footprint::from_coords("room", &[(0., 0.), (4., 0.), (4., 3.), (0., 3.)], TOL)
            .unwrap();
        let (nx, ny) = fp.edge_normal(0);
        assert!(nx.is_close(0., 1e-12) && ny.is_close(-1., 1e-12));
        let normals = fp.edge_normals();
        assert_eq!(normals.len(), 4);
        assert!(normals[1].0.is_close(1., 1e-12) && normals[1].1.is_close(0., 1e-12));
        let orient = fp.segment_orientations();
        assert!(orient[0].is_close(180., 1e-9));
        assert!(orient[1].is_close(90., 1e-9));
        assert!(orient[2].is_close(0., 1e-9));
        assert!(orient[3].is_close(270., 1e-9));
    }

    #[test]
    fn test_set_edge_meta() {
        let mut fp =
            Footprint::from_coords("room", &[(0., 0.), (4., 0.), (4., 3.), (0., 3.)], TOL).unwrap();
        fp.set_edge_meta(2, EdgeMeta::new(0.3, 0.5).unwrap()).unwrap();
        assert_eq!(fp.edge(2).meta.window_ratio, 0.3);
        assert!(fp.set_edge_meta(7, EdgeMeta::default()).is_err());
        fp.set_all_edge_meta(EdgeMeta::new(0.2, 0.).unwrap()).unwrap();
        assert!(fp.edges().all(|e| e.meta.window_ratio == 0.2));
    }

    #[test]
    fn test_serde_validates() {
        let json = r#"{"name":"r","vertices":[{"x":0,"y":0},{"x":1,"y":1},{"x":1,"y":0},{"x":0,"y":1}]}"#;
        assert!(serde_json::from_str::<Footprint>(json).is_err());
        let json = r#"{"name":"r","vertices":[{"x":0,"y":0},{"x":1,"y":0},{"x":0,"y":1}]}"#;
        let fp: Footprint = serde_json::from_str(json).unwrap();
        assert_eq!(fp.len(), 3);
    }

    #[test]
    fn test_serde_keeps_tolerance() {
        // 5 mm jog: distinct vertices at 1 mm, duplicates at the default tolerance
        let coords = [(0., 0.), (4., 0.), (4., 3.), (2.005, 3.), (2., 3.005), (0., 3.)];
        let fp = Footprint::from_coords("jog", &coords, 0.001).unwrap();
        assert_eq!(fp.len(), 6);
        let json = serde_json::to_string(&fp).unwrap();
        let back: Footprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 6);
        assert_eq!(back.tolerance(), 0.001);

        // Documents without a tolerance use the default one
        let json = r#"{"name":"r","vertices":[{"x":0,"y":0},{"x":1,"y":0},{"x":1,"y":0.005},{"x":0,"y":1}]}"#;
        let fp: Footprint = serde_json::from_str(json).unwrap();
        assert_eq!(fp.len(), 3);
        assert_eq!(fp.tolerance(), DEFAULT_TOLERANCE);

        assert!(Footprint::from_coords("t", &[(0., 0.), (1., 0.), (0., 1.)], 0.).is_err());
    }

    #[test]
    fn test_transforms() {
        let square = [(0., 0.), (2., 0.), (2., 2.), (0., 2.)];
        let mut fp = Footprint::from_coords("sq", &square, TOL).unwrap();
        fp.set_edge_meta(0, EdgeMeta::new(0.4, 0.5).unwrap()).unwrap();

        fp.move_xy(1., 3.);
        assert!(fp.vertices()[0].is_close(&Point2D::new(1., 3.), 1e-12));

        fp.rotate_xy(90., Point2D::new(1., 3.));
        assert!(fp.vertices()[1].is_close(&Point2D::new(1., 5.), 1e-12));
        assert!(fp.area().is_close(4., 1e-12));

        // Mirroring flips the winding; the tagged edge is still the same segment
        fp.reflect((1., 0.), Point2D::new(0., 0.)).unwrap();
        assert!(is_ccw(fp.vertices()));
        let tagged: Vec<Edge> = fp.edges().filter(|e| e.meta.window_ratio > 0.).collect();
        assert_eq!(tagged.len(), 1);
        assert!(tagged[0].length().is_close(2., 1e-12));
        let xs = [tagged[0].start.x, tagged[0].end.x];
        assert!(xs.iter().all(|x| x.is_close(-1., 1e-12)));
        assert!(fp.reflect((0., 0.), Point2D::new(0., 0.)).is_err());

        fp.scale(2., Point2D::new(0., 0.)).unwrap();
        assert!(fp.area().is_close(16., 1e-9));
        assert_eq!(tagged_depth(&fp), 1.);
        assert!(fp.scale(0., Point2D::new(0., 0.)).is_err());
    }

    fn tagged_depth(fp: &Footprint) -> f64 {
        fp.edges()
            .find(|e| e.meta.window_ratio > 0.)
            .map_or(0., |e| e.meta.shading_depth())
    }

    #[test]
    fn test_skylight() {
        let mut fp =
            Footprint::from_coords("room", &[(0., 0.), (4., 0.), (4., 3.), (0., 3.)], TOL).unwrap();
        assert!(fp.skylight().is_none());
        let bad = SkylightParameter::GriddedRatio {
            ratio: 2.,
            spacing: None,
        };
        assert!(fp.set_skylight(bad).is_err());

        let outline = vec![Point2D::new(1., 1.), Point2D::new(2., 1.), Point2D::new(2., 2.)];
        fp.set_skylight(SkylightParameter::Detailed {
            polygons: vec![outline],
        })
        .unwrap();
        fp.move_xy(10., 0.);
        let Some(SkylightParameter::Detailed { polygons }) = fp.skylight() else {
            panic!("expected detailed skylights");
        };
        assert!(polygons[0][0].is_close(&Point2D::new(11., 1.), 1e-12));

        let json = serde_json::to_string(&fp).unwrap();
        let back: Footprint = serde_json::from_str(&json).unwrap();
        assert!(matches!(back.skylight(), Some(SkylightParameter::Detailed { .. })));
    }
}
