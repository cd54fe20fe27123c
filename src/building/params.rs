//! Boundary metadata: glazing and shading per edge, skylights per room.

use crate::error::{ModelError, Result};
use crate::geom::point::Point2D;
use crate::geom::polygon::{is_ccw, is_self_intersecting, polygon_area};
use serde::{Deserialize, Serialize};

/// Exterior shading attached to the window of a wall.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShadingParameter {
    /// A single horizontal shade above the window, tilted down by `angle` degrees.
    Overhang { depth: f64, angle: f64 },
    /// Four fins framing the window, perpendicular to the wall.
    ExtrudedBorder { depth: f64 },
    /// Horizontal louvers evenly spaced over the window height.
    Louvers { count: usize, depth: f64 },
    /// Horizontal louvers `distance` apart, from the window head down.
    LouversByDistance { distance: f64, depth: f64 },
}

impl ShadingParameter {
    pub fn depth(&self) -> f64 {
        match *self {
            Self::Overhang { depth, .. } => depth,
            Self::ExtrudedBorder { depth } => depth,
            Self::Louvers { depth, .. } => depth,
            Self::LouversByDistance { depth, .. } => depth,
        }
    }

    /// Copy with all lengths multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        match *self {
            Self::Overhang { depth, angle } => Self::Overhang {
                depth: depth * factor,
                angle,
            },
            Self::ExtrudedBorder { depth } => Self::ExtrudedBorder {
                depth: depth * factor,
            },
            Self::Louvers { count, depth } => Self::Louvers {
                count,
                depth: depth * factor,
            },
            Self::LouversByDistance { distance, depth } => Self::LouversByDistance {
                distance: distance * factor,
                depth: depth * factor,
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        let depth = self.depth();
        if !(depth.is_finite() && depth >= 0.) {
            return Err(ModelError::InvalidParameter(format!(
                "shading depth must be non-negative, got {depth}"
            )));
        }
        match *self {
            Self::Overhang { angle, .. } if !(angle.is_finite() && (-90. ..90.).contains(&angle)) => {
                Err(ModelError::InvalidParameter(format!(
                    "overhang angle must be in (-90, 90) degrees, got {angle}"
                )))
            }
            Self::Louvers { count: 0, .. } => Err(ModelError::InvalidParameter(
                "louver count must be at least 1".to_string(),
            )),
            Self::LouversByDistance { distance, .. } if !(distance.is_finite() && distance > 0.) => {
                Err(ModelError::InvalidParameter(format!(
                    "louver distance must be positive, got {distance}"
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Boundary metadata of one footprint edge.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeMeta {
    /// Ratio of window area to wall area, in [0, 1].
    #[serde(default)]
    pub window_ratio: f64,
    #[serde(default)]
    pub shading: Option<ShadingParameter>,
}

impl EdgeMeta {
    /// Window ratio with a flat overhang of `shading_depth` (none when zero).
    pub fn new(window_ratio: f64, shading_depth: f64) -> Result<Self> {
        let shading = if shading_depth == 0. {
            None
        } else {
            Some(ShadingParameter::Overhang {
                depth: shading_depth,
                angle: 0.,
            })
        };
        let meta = Self {
            window_ratio,
            shading,
        };
        meta.validate()?;
        Ok(meta)
    }

    pub fn with_shading(mut self, shading: ShadingParameter) -> Result<Self> {
        self.shading = Some(shading);
        self.validate()?;
        Ok(self)
    }

    /// Copy with shading lengths multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            window_ratio: self.window_ratio,
            shading: self.shading.map(|s| s.scaled(factor)),
        }
    }

    pub fn shading_depth(&self) -> f64 {
        self.shading.map_or(0., |s| s.depth())
    }

    pub fn has_window(&self) -> bool {
        self.window_ratio > 0.
    }

    pub fn validate(&self) -> Result<()> {
        if !(0. ..=1.).contains(&self.window_ratio) {
            return Err(ModelError::InvalidParameter(format!(
                "window ratio must be in [0, 1], got {}",
                self.window_ratio
            )));
        }
        if let Some(shading) = self.shading {
            shading.validate()?;
        }
        Ok(())
    }
}

/// Skylights on the exterior roof of a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SkylightParameter {
    /// Grid of skylights covering `ratio` of each exterior roof face.
    ///
    /// `spacing` is the grid cell size; `None` uses a third of the smaller
    /// plan dimension of each roof face.
    GriddedRatio { ratio: f64, spacing: Option<f64> },
    /// Grid of skylights with a total `area`, spread over the exterior roof
    /// in proportion to face area and capped at 99% of it.
    GriddedArea { area: f64, spacing: Option<f64> },
    /// Skylight outlines in plan. Each one is placed on the exterior roof
    /// face that contains it; outlines outside the exterior roof are skipped.
    Detailed { polygons: Vec<Vec<Point2D>> },
}

/// Share of roof area a gridded skylight may take at most.
pub const MAX_SKYLIGHT_RATIO: f64 = 0.99;

impl SkylightParameter {
    pub fn validate(&self, tol: f64) -> Result<()> {
        let positive = |v: f64| v.is_finite() && v > 0.;
        match self {
            Self::GriddedRatio { ratio, spacing } => {
                if !(0. ..=1.).contains(ratio) {
                    return Err(ModelError::InvalidParameter(format!(
                        "skylight ratio must be in [0, 1], got {ratio}"
                    )));
                }
                if let Some(s) = spacing
                    && !positive(*s)
                {
                    return Err(ModelError::InvalidParameter(format!(
                        "skylight spacing must be positive, got {s}"
                    )));
                }
            }
            Self::GriddedArea { area, spacing } => {
                if !(area.is_finite() && *area >= 0.) {
                    return Err(ModelError::InvalidParameter(format!(
                        "skylight area must be non-negative, got {area}"
                    )));
                }
                if let Some(s) = spacing
                    && !positive(*s)
                {
                    return Err(ModelError::InvalidParameter(format!(
                        "skylight spacing must be positive, got {s}"
                    )));
                }
            }
            Self::Detailed { polygons } => {
                for (i, pts) in polygons.iter().enumerate() {
                    if pts.len() < 3
                        || pts.iter().any(|p| !(p.x.is_finite() && p.y.is_finite()))
                        || polygon_area(pts).abs() <= tol * tol
                        || is_self_intersecting(pts, tol)
                    {
                        return Err(ModelError::InvalidGeometry(format!(
                            "skylight polygon {i} is not a simple polygon with area"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Applies a plan transformation to skylight outlines, keeping them counter-clockwise.
    pub fn map_points(&mut self, f: &impl Fn(Point2D) -> Point2D) {
        if let Self::Detailed { polygons } = self {
            for pts in polygons.iter_mut() {
                pts.iter_mut().for_each(|p| *p = f(*p));
                if !is_ccw(pts) {
                    pts.reverse();
                }
            }
        }
    }

    /// Multiplies lengths by `factor` (areas by its square).
    ///
    /// Outlines are scaled through [`SkylightParameter::map_points`].
    pub fn scale_sizes(&mut self, factor: f64) {
        match self {
            Self::GriddedRatio { spacing, .. } => {
                *spacing = spacing.map(|s| s * factor);
            }
            Self::GriddedArea { area, spacing } => {
                *area *= factor * factor;
                *spacing = spacing.map(|s| s * factor);
            }
            Self::Detailed { .. } => {}
        }
    }

    pub(crate) fn normalized(mut self) -> Self {
        self.map_points(&|p| p);
        self
    }
}
