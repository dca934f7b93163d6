//! Core utilities shared by the grid algorithms.
//!
//! This module provides:
//! - The `Foreground` truthiness contract for bool-like grids
//! - Border slab extraction for background/noise estimation
//! - Flat buffer to N-D grid conversion for the binding layers

use ndarray::{Array, ArrayD, ArrayView, Axis, Dimension, IxDyn, Slice};

use crate::error::{NdImageError, Result};

/// Truthiness of a grid cell.
///
/// `bool` maps to itself, numeric types are foreground when non-zero.
/// NaN is non-zero and therefore foreground.
pub trait Foreground {
    fn is_foreground(&self) -> bool;
}

impl Foreground for bool {
    #[inline]
    fn is_foreground(&self) -> bool {
        *self
    }
}

macro_rules! impl_foreground_int {
    ($($t:ty),*) => {
        $(
            impl Foreground for $t {
                #[inline]
                fn is_foreground(&self) -> bool {
                    *self != 0
                }
            }
        )*
    };
}

macro_rules! impl_foreground_float {
    ($($t:ty),*) => {
        $(
            impl Foreground for $t {
                #[inline]
                fn is_foreground(&self) -> bool {
                    *self != 0.0
                }
            }
        )*
    };
}

impl_foreground_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);
impl_foreground_float!(f32, f64);

/// Cast a bool-like grid to a boolean mask of the same shape.
pub fn foreground_mask<T: Foreground, D: Dimension>(grid: ArrayView<T, D>) -> Array<bool, D> {
    grid.map(|v| v.is_foreground())
}

/// Collect the cells of every axis-aligned border slab.
///
/// Slabs are `border_width` cells thick and are emitted axis by axis, low
/// face first, each flattened in row-major order. For a 3-D grid this is
/// `[:w,:,:]`, `[-w:,:,:]`, `[:,:w,:]`, `[:,-w:,:]`, `[:,:,:w]`, `[:,:,-w:]`.
/// Cells on edges and corners belong to several slabs and are repeated.
///
/// # Arguments
/// * `grid` - Input grid with at least one axis
/// * `border_width` - Slab thickness, `0 < border_width <= ` every axis extent
///
/// # Returns
/// Concatenated border cells
pub fn border_cells<T: Clone, D: Dimension>(
    grid: ArrayView<T, D>,
    border_width: usize,
) -> Result<Vec<T>> {
    if grid.ndim() == 0 {
        return Err(NdImageError::InvalidParameter {
            name: "border_width",
            reason: "grid has no axes".to_string(),
        });
    }
    if border_width == 0 {
        return Err(NdImageError::InvalidParameter {
            name: "border_width",
            reason: "must be at least 1".to_string(),
        });
    }
    if let Some(axis) = grid.shape().iter().position(|&len| border_width > len) {
        return Err(NdImageError::InvalidParameter {
            name: "border_width",
            reason: format!(
                "{} exceeds extent {} of axis {}",
                border_width,
                grid.shape()[axis],
                axis
            ),
        });
    }

    let width = border_width as isize;
    let mut cells = Vec::new();
    for axis in 0..grid.ndim() {
        let low = grid.slice_axis(Axis(axis), Slice::from(..width));
        cells.extend(low.iter().cloned());
        let high = grid.slice_axis(Axis(axis), Slice::from(-width..));
        cells.extend(high.iter().cloned());
    }

    Ok(cells)
}

/// Build an N-D grid from a flat row-major buffer.
pub fn grid_from_flat<T>(data: Vec<T>, shape: &[usize]) -> Result<ArrayD<T>> {
    let expected: usize = shape.iter().product();
    let actual = data.len();
    let mismatch = || NdImageError::ShapeMismatch {
        shape: shape.to_vec(),
        expected,
        actual,
    };

    if actual != expected {
        return Err(mismatch());
    }

    ArrayD::from_shape_vec(IxDyn(shape), data).map_err(|_| mismatch())
}
