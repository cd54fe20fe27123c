//! Story: one building level, possibly repeated with a multiplier.

use crate::building::footprint::Footprint;
use crate::building::validate_name;
use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "StoryData", into = "StoryData")]
pub struct Story {
    id: String,
    footprints: Vec<Footprint>,
    height: f64,
    multiplier: usize,
}

/// Unvalidated story as stored in documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryData {
    pub id: String,
    pub footprints: Vec<Footprint>,
    pub height: f64,
    #[serde(default = "default_multiplier")]
    pub multiplier: usize,
}

fn default_multiplier() -> usize {
    1
}

impl TryFrom<StoryData> for Story {
    type Error = ModelError;

    fn try_from(data: StoryData) -> Result<Self> {
        let mut footprints = data.footprints.into_iter();
        let first = footprints.next().ok_or_else(|| {
            ModelError::InvalidGeometry(format!("story '{}' has no footprints", data.id))
        })?;
        let mut story = Story::new(&data.id, first, data.height, data.multiplier)?;
        for fp in footprints {
            story.add_footprint(fp)?;
        }
        Ok(story)
    }
}

impl From<Story> for StoryData {
    fn from(story: Story) -> Self {
        Self {
            id: story.id,
            footprints: story.footprints,
            height: story.height,
            multiplier: story.multiplier,
        }
    }
}

impl Story {
    /// Creates a story holding one footprint.
    ///
    /// `height` is the floor-to-floor height of a single copy and must be
    /// positive. `multiplier` is the number of identical copies stacked on top
    /// of each other, at least 1.
    pub fn new(id: &str, footprint: Footprint, height: f64, multiplier: usize) -> Result<Self> {
        let id = validate_name(id)?;
        if !(height.is_finite() && height > 0.) {
            return Err(ModelError::InvalidGeometry(format!(
                "story '{id}' height must be positive, got {height}"
            )));
        }
        if multiplier < 1 {
            return Err(ModelError::InvalidParameter(format!(
                "story '{id}' multiplier must be at least 1, got {multiplier}"
            )));
        }
        Ok(Self {
            id,
            footprints: vec![footprint],
            height,
            multiplier,
        })
    }

    /// Adds another room to the story. Footprint names must be unique within the story.
    pub fn add_footprint(&mut self, footprint: Footprint) -> Result<()> {
        if self.footprints.iter().any(|f| f.name() == footprint.name()) {
            return Err(ModelError::DuplicateFootprint {
                story: self.id.clone(),
                footprint: footprint.name().to_string(),
            });
        }
        self.footprints.push(footprint);
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn footprints(&self) -> &[Footprint] {
        &self.footprints
    }

    pub fn footprints_mut(&mut self) -> &mut [Footprint] {
        &mut self.footprints
    }

    pub fn footprint(&self, name: &str) -> Option<&Footprint> {
        self.footprints.iter().find(|f| f.name() == name)
    }

    /// Floor-to-floor height of one copy.
    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn multiplier(&self) -> usize {
        self.multiplier
    }

    /// Height of all copies together.
    pub fn total_height(&self) -> f64 {
        self.height * self.multiplier as f64
    }

    pub(crate) fn scale_height(&mut self, factor: f64) {
        self.height *= factor;
    }

    /// Floor area of one copy.
    pub fn floor_area(&self) -> f64 {
        self.footprints.iter().map(|f| f.area()).sum()
    }

    /// Volume of one copy.
    pub fn volume(&self) -> f64 {
        self.floor_area() * self.height
    }
}
