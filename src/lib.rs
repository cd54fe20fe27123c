//! Footprint-based multi-story building models resolved into 3D rooms.
//!
//! A [`Building`] is a stack of [`Story`] objects, each made of one or more
//! 2D [`Footprint`]s extruded to the story height and optionally repeated
//! with a multiplier. [`resolve`] turns it into closed [`Room3D`] volumes
//! whose faces are classified as exterior, interior (paired with the face
//! of a neighboring room) or ground, with windows and shades on exterior
//! walls. The result carries a [`ValidationReport`] of watertightness and
//! pairing checks.

pub mod building;
pub mod config;
pub mod error;
pub mod geom;
pub mod io;
pub mod resolve;

// Prelude
pub use building::footprint::{Edge, Footprint};
pub use building::params::{EdgeMeta, ShadingParameter, SkylightParameter};
pub use building::story::Story;
pub use building::{Building, Level};
pub use config::{DEFAULT_TOLERANCE, ResolveConfig, TieBreak, WindowPlacement};
pub use error::{ModelError, Result};
pub use geom::IsClose;
pub use geom::point::{Point2D, Point3D};
pub use geom::vector::Vector;
pub use resolve::adjacency::{Adjacency, AdjacencyKind, Classification};
pub use resolve::extrude::{Aperture, Face3D, FaceKind, FaceRef, Room3D, Shade};
pub use resolve::validate::{ValidationReport, Violation, ViolationKind};
pub use resolve::{ResolvedModel, resolve, resolve_many};
