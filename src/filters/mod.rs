//! Filter modules for N-dimensional grids.
//!
//! ## Supported Formats
//!
//! | Grid | Element | Description |
//! |------|---------|-------------|
//! | Mask | bool, integer, float | Non-zero cells are foreground |
//! | Intensity | f64 | Scalar field, compared with native float ordering |
//!
//! All filters are rank-generic (1-D, 2-D, 3-D, `ArrayD`) and return
//! arrays of the input's shape.
//!
//! ## Architecture
//!
//! - **Pure** - No shared state, inputs are never modified
//! - **Exact** - No tolerance in any comparison
//! - **Thread-safe** - Use rayon for per-lane parallelism where available
//!
//! ## Filter Categories
//!
//! - **Morphology**: maximum_filter (zero-padded grey dilation)
//! - **Peaks**: find_peaks, peak_coordinates
//! - **Core**: border_cells, Foreground truthiness

pub mod core;
pub mod morphology;
pub mod peaks;
