//! File I/O for buildings and resolved models.

pub mod json;

pub use json::{
    from_json_string, read_building, read_model, to_json_string, write_building, write_model,
};
