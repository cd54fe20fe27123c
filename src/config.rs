use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};

/// Default coincidence tolerance, suitable for models in meters.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// How a window ratio becomes a rectangle on a wall face.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum WindowPlacement {
    /// Both wall dimensions scaled by `sqrt(ratio)`, centered on the wall.
    #[default]
    Centered,
    /// Full-width band of height `ratio * wall height` starting at the sill.
    ///
    /// The sill is lowered when the band would not fit under the ceiling.
    Strip { sill_height: f64 },
}

/// Which neighbor wins when several overlap the same part of an edge.
///
/// This only happens when rooms on the same story overlap, which the
/// validator reports separately.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum TieBreak {
    /// Neighbor edge with the longest total overlap; ties go to the lowest room/edge index.
    #[default]
    LongestOverlap,
    /// Lowest room/edge index.
    FirstNeighbor,
}

/// Parameters of a single resolution.
///
/// Passed explicitly to every call; nothing is process-global.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Distance below which two features are considered coincident.
    pub tolerance: f64,
    pub window_placement: WindowPlacement,
    /// If `true`, every copy of a multiplied story is materialized as its own room.
    pub expand_multipliers: bool,
    pub tie_break: TieBreak,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            window_placement: WindowPlacement::default(),
            expand_multipliers: false,
            tie_break: TieBreak::default(),
        }
    }
}

impl ResolveConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_window_placement(mut self, placement: WindowPlacement) -> Self {
        self.window_placement = placement;
        self
    }

    pub fn with_expanded_multipliers(mut self, expand: bool) -> Self {
        self.expand_multipliers = expand;
        self
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Checks that the parameters are usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.) {
            return Err(ModelError::InvalidParameter(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if let WindowPlacement::Strip { sill_height } = self.window_placement
            && !(sill_height.is_finite() && sill_height >= 0.)
        {
            return Err(ModelError::InvalidParameter(format!(
                "sill height must be non-negative, got {sill_height}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ResolveConfig::default();
        assert_eq!(cfg.tolerance, DEFAULT_TOLERANCE);
        assert!(!cfg.expand_multipliers);
        assert!(matches!(cfg.window_placement, WindowPlacement::Centered));
        assert!(matches!(cfg.tie_break, TieBreak::LongestOverlap));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_invalid_tolerance() {
        assert!(ResolveConfig::new().with_tolerance(0.).validate().is_err());
        assert!(ResolveConfig::new().with_tolerance(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: ResolveConfig = serde_json::from_str(r#"{"tolerance": 0.001}"#).unwrap();
        assert_eq!(cfg.tolerance, 0.001);
        assert!(!cfg.expand_multipliers);

        let cfg: ResolveConfig =
            serde_json::from_str(r#"{"window_placement": {"Strip": {"sill_height": 0.8}}}"#)
                .unwrap();
        assert!(matches!(cfg.window_placement, WindowPlacement::Strip { .. }));
        assert_eq!(cfg.tolerance, DEFAULT_TOLERANCE);
    }
}
