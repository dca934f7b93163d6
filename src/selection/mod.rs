//! Selection algorithms for masks.
//!
//! - **Connected components**: Flood fill labeling and largest-region selection

pub mod components;

pub use components::{largest_component, largest_component_with, Connectivity};
