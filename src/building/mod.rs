//! Building container - the top of the authoring hierarchy.
//!
//! Hierarchy: Building → Story → Footprint → EdgeMeta

pub mod footprint;
pub mod params;
pub mod story;

use crate::building::footprint::Footprint;
use crate::building::params::EdgeMeta;
use crate::building::story::Story;
use crate::error::{ModelError, Result};
use crate::geom::point::Point2D;
use serde::{Deserialize, Serialize};

/// Checks that a name can be used as an id segment.
///
/// Room ids are built by joining names with `/`, so `/` is not allowed.
pub fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ModelError::InvalidParameter(
            "name must not be empty".to_string(),
        ));
    }
    if trimmed.contains('/') {
        return Err(ModelError::InvalidParameter(format!(
            "name must not contain '/': {trimmed}"
        )));
    }
    Ok(trimmed.to_string())
}

/// One copy of a story at its true elevation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// Index of the story in the building, bottom to top.
    pub story_index: usize,
    /// Copy index within the story, `0..multiplier`.
    pub copy: usize,
    pub elevation: f64,
    pub height: f64,
}

impl Level {
    pub fn top(&self) -> f64 {
        self.elevation + self.height
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "BuildingData", into = "BuildingData")]
pub struct Building {
    name: String,
    base_elevation: f64,
    stories: Vec<Story>,
}

/// Unvalidated building as stored in documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingData {
    pub name: String,
    #[serde(default)]
    pub base_elevation: f64,
    #[serde(default)]
    pub stories: Vec<Story>,
}

impl TryFrom<BuildingData> for Building {
    type Error = ModelError;

    fn try_from(data: BuildingData) -> Result<Self> {
        let mut bdg = Building::new(&data.name)?.with_base_elevation(data.base_elevation)?;
        for story in data.stories {
            bdg.push_story(story)?;
        }
        Ok(bdg)
    }
}

impl From<Building> for BuildingData {
    fn from(bdg: Building) -> Self {
        Self {
            name: bdg.name,
            base_elevation: bdg.base_elevation,
            stories: bdg.stories,
        }
    }
}

impl Building {
    /// Creates an empty building at elevation 0.
    pub fn new(name: &str) -> Result<Self> {
        let name = validate_name(name)?;
        Ok(Self {
            name,
            base_elevation: 0.,
            stories: Vec::new(),
        })
    }

    pub fn with_base_elevation(mut self, base_elevation: f64) -> Result<Self> {
        if !base_elevation.is_finite() {
            return Err(ModelError::InvalidParameter(format!(
                "base elevation must be finite, got {base_elevation}"
            )));
        }
        self.base_elevation = base_elevation;
        Ok(self)
    }

    /// Appends a new story with a single footprint on top of the building.
    pub fn add_story(
        &mut self,
        id: &str,
        footprint: Footprint,
        height: f64,
        multiplier: usize,
    ) -> Result<()> {
        let story = Story::new(id, footprint, height, multiplier)?;
        self.push_story(story)
    }

    /// Appends an already built story on top of the building.
    pub fn push_story(&mut self, story: Story) -> Result<()> {
        if self.story(story.id()).is_some() {
            return Err(ModelError::DuplicateStoryId(story.id().to_string()));
        }
        self.stories.push(story);
        Ok(())
    }

    /// Adds another room to an existing story.
    pub fn add_footprint(&mut self, story_id: &str, footprint: Footprint) -> Result<()> {
        let story = self
            .stories
            .iter_mut()
            .find(|s| s.id() == story_id)
            .ok_or_else(|| ModelError::UnknownStory(story_id.to_string()))?;
        story.add_footprint(footprint)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_elevation(&self) -> f64 {
        self.base_elevation
    }

    /// Stories ordered bottom to top.
    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    pub fn story(&self, id: &str) -> Option<&Story> {
        self.stories.iter().find(|s| s.id() == id)
    }

    fn story_index(&self, id: &str) -> Result<usize> {
        self.stories
            .iter()
            .position(|s| s.id() == id)
            .ok_or_else(|| ModelError::UnknownStory(id.to_string()))
    }

    /// Elevation of the floor of the first copy of a story.
    pub fn elevation_of(&self, id: &str) -> Result<f64> {
        let idx = self.story_index(id)?;
        Ok(self.base_elevation
            + self.stories[..idx]
                .iter()
                .map(|s| s.total_height())
                .sum::<f64>())
    }

    /// Elevation of the top of the building.
    pub fn height(&self) -> f64 {
        self.base_elevation + self.stories.iter().map(|s| s.total_height()).sum::<f64>()
    }

    /// Every story copy with its elevation, bottom to top.
    pub fn all_levels(&self) -> Vec<Level> {
        let mut levels = Vec::new();
        let mut elevation = self.base_elevation;
        for (story_index, story) in self.stories.iter().enumerate() {
            for copy in 0..story.multiplier() {
                // Multiply instead of accumulating to keep copies exact
                let z = elevation + story.height() * copy as f64;
                levels.push(Level {
                    story_index,
                    copy,
                    elevation: z,
                    height: story.height(),
                });
            }
            elevation += story.total_height();
        }
        levels
    }

    /// Total floor area including repeated stories.
    pub fn floor_area(&self) -> f64 {
        self.stories
            .iter()
            .map(|s| s.floor_area() * s.multiplier() as f64)
            .sum()
    }

    /// Total room volume including repeated stories.
    pub fn volume(&self) -> f64 {
        self.stories
            .iter()
            .map(|s| s.volume() * s.multiplier() as f64)
            .sum()
    }

    /// Applies the same glazing and shading to every edge of every footprint.
    pub fn set_all_edge_meta(&mut self, meta: EdgeMeta) -> Result<()> {
        for story in self.stories.iter_mut() {
            for fp in story.footprints_mut() {
                fp.set_all_edge_meta(meta)?;
            }
        }
        Ok(())
    }

    fn footprints_mut(&mut self) -> impl Iterator<Item = &mut Footprint> {
        self.stories.iter_mut().flat_map(|s| s.footprints_mut().iter_mut())
    }

    pub fn move_xy(&mut self, dx: f64, dy: f64) {
        self.footprints_mut().for_each(|fp| fp.move_xy(dx, dy));
    }

    /// Rotates every footprint counter-clockwise by `angle` degrees around `origin`.
    pub fn rotate_xy(&mut self, angle: f64, origin: Point2D) {
        self.footprints_mut().for_each(|fp| fp.rotate_xy(angle, origin));
    }

    /// Mirrors every footprint across the line through `origin` perpendicular to `normal`.
    pub fn reflect(&mut self, normal: (f64, f64), origin: Point2D) -> Result<()> {
        for fp in self.footprints_mut() {
            fp.reflect(normal, origin)?;
        }
        Ok(())
    }

    /// Scales plan geometry around `origin` and elevations around zero.
    pub fn scale(&mut self, factor: f64, origin: Point2D) -> Result<()> {
        if !(factor.is_finite() && factor > 0.) {
            return Err(ModelError::InvalidParameter(format!(
                "scale factor must be positive, got {factor}"
            )));
        }
        for fp in self.footprints_mut() {
            fp.scale(factor, origin)?;
        }
        for story in self.stories.iter_mut() {
            story.scale_height(factor);
        }
        self.base_elevation *= factor;
        Ok(())
    }

    /// Number of rooms after expanding multipliers.
    pub fn room_count(&self) -> usize {
        self.stories
            .iter()
            .map(|s| s.footprints().len() * s.multiplier())
            .sum()
    }
}
