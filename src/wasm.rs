//! WebAssembly exports for the grid algorithms.
//!
//! These functions are exposed to JavaScript via wasm-bindgen.
//!
//! ## Buffer Layout
//!
//! Grids cross the boundary as flat row-major buffers plus a `shape`
//! array. Masks are returned as bytes (1 = true, 0 = false).

use wasm_bindgen::prelude::*;

use crate::error::NdImageError;
use crate::filters::core::{border_cells, grid_from_flat};
use crate::filters::peaks::{find_peaks, PeakOptions};
use crate::selection::components::largest_component;

fn to_js_err(err: NdImageError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_shape(shape: &[u32]) -> Vec<usize> {
    shape.iter().map(|&len| len as usize).collect()
}

fn mask_to_bytes<'a>(mask: impl Iterator<Item = &'a bool>) -> Vec<u8> {
    mask.map(|&v| v as u8).collect()
}

// ============================================================================
// Connected Components
// ============================================================================

/// Keep the largest connected component of a mask.
///
/// # Arguments
/// * `data` - Flat mask bytes (non-zero = foreground)
/// * `shape` - Grid extent per axis
///
/// # Returns
/// Flat mask bytes of the same length, or an error string when the mask
/// is empty or does not match `shape`
#[wasm_bindgen]
pub fn largest_component_wasm(data: &[u8], shape: &[u32]) -> Result<Vec<u8>, JsValue> {
    let grid = grid_from_flat(data.to_vec(), &to_shape(shape)).map_err(to_js_err)?;
    let result = largest_component(grid.view()).map_err(to_js_err)?;
    Ok(mask_to_bytes(result.iter()))
}

// ============================================================================
// Peak Detection
// ============================================================================

/// Find local maxima of an intensity grid.
///
/// # Arguments
/// * `data` - Flat intensities
/// * `shape` - Grid extent per axis
/// * `min_distance` - Window reach along every axis
/// * `threshold_abs` - Minimum peak intensity
/// * `threshold_rel` - Minimum intensity relative to the highest candidate
/// * `num_peaks` - Maximum number of peaks (undefined = unlimited)
#[wasm_bindgen]
pub fn find_peaks_wasm(
    data: &[f64],
    shape: &[u32],
    min_distance: u32,
    threshold_abs: f64,
    threshold_rel: f64,
    num_peaks: Option<u32>,
) -> Result<Vec<u8>, JsValue> {
    let grid = grid_from_flat(data.to_vec(), &to_shape(shape)).map_err(to_js_err)?;
    let options = PeakOptions {
        min_distance: min_distance as usize,
        threshold_abs,
        threshold_rel,
        num_peaks: num_peaks.map(|n| n as usize),
    };

    let result = find_peaks(grid.view(), &options);
    Ok(mask_to_bytes(result.iter()))
}

// ============================================================================
// Border Extraction
// ============================================================================

/// Concatenate the border slabs of a grid.
#[wasm_bindgen]
pub fn border_cells_wasm(data: &[f64], shape: &[u32], border_width: u32) -> Result<Vec<f64>, JsValue> {
    let grid = grid_from_flat(data.to_vec(), &to_shape(shape)).map_err(to_js_err)?;
    border_cells(grid.view(), border_width as usize).map_err(to_js_err)
}
