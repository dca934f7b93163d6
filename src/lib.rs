//! ndimage Rust Extensions
//!
//! Structural and salience analysis of dense N-dimensional grids
//! (typically 3-D volumetric images), with Python bindings via PyO3 and
//! WASM bindings for JavaScript.
//!
//! ## Grid Format
//! Grids are `ndarray` arrays of any rank:
//! - **Masks**: `bool` or any integer/float type, non-zero = foreground
//! - **Intensities**: `f64`
//!
//! Every output has exactly the shape of its input. Inputs are never
//! modified. Spatial metadata (affines, headers) is the caller's concern.
//!
//! ## Algorithms
//! - [`largest_component`]: keep the largest connected region of a mask
//! - [`find_peaks`]: local maxima with minimum separation and thresholds
//! - [`border_cells`]: cells of the axis-aligned border slabs

pub mod error;
pub mod filters;
pub mod selection;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::{NdImageError, Result};
pub use filters::core::{border_cells, Foreground};
pub use filters::morphology::maximum_filter;
pub use filters::peaks::{find_peaks, peak_coordinates, PeakOptions};
pub use selection::components::{largest_component, largest_component_with, Connectivity};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArrayDyn, PyArrayMethods};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::error::NdImageError;
    use crate::filters::core::border_cells;
    use crate::filters::peaks::{find_peaks, PeakOptions};
    use crate::selection::components::largest_component;

    fn to_py_err(err: NdImageError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }

    fn invalid_input(obj: &Bound<'_, PyAny>) -> PyErr {
        let found = obj
            .get_type()
            .name()
            .map(|name| name.to_string())
            .unwrap_or_else(|_| "unknown object".to_string());
        to_py_err(NdImageError::InvalidInputKind { found })
    }

    // ========================================================================
    // Connected Components
    // ========================================================================

    /// Return the largest connected component of a boolean or numeric array.
    ///
    /// Accepts bool and every integer or float dtype; non-zero is foreground.
    /// Diagonal neighbors are connected (26-connectivity in 3-D).
    /// Raises ValueError when the array holds no non-zero value or when
    /// the input is not a numpy array.
    #[pyfunction]
    pub fn largest_connected_component<'py>(
        py: Python<'py>,
        volume: &Bound<'py, PyAny>,
    ) -> PyResult<Bound<'py, PyArrayDyn<bool>>> {
        macro_rules! try_dtype {
            ($($t:ty),*) => {
                $(
                    if let Ok(array) = volume.downcast::<PyArrayDyn<$t>>() {
                        let readonly = array.readonly();
                        let result = largest_component(readonly.as_array()).map_err(to_py_err)?;
                        return Ok(result.into_pyarray(py));
                    }
                )*
            };
        }

        try_dtype!(bool, u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);
        Err(invalid_input(volume))
    }

    // ========================================================================
    // Peak Detection
    // ========================================================================

    /// Find peaks in an image and return them as a boolean array.
    ///
    /// # Arguments
    /// * `image` - Integer or float array of any rank, compared as float64
    /// * `min_distance` - Peaks are the maxima of a `2 * min_distance + 1` window
    /// * `threshold_abs` - Minimum peak intensity
    /// * `threshold_rel` - Minimum peak intensity relative to the highest candidate
    /// * `num_peaks` - Maximum number of peaks (None = unlimited)
    #[pyfunction]
    #[pyo3(signature = (image, min_distance=10, threshold_abs=0.0, threshold_rel=0.1, num_peaks=None))]
    pub fn peak_local_max<'py>(
        py: Python<'py>,
        image: &Bound<'py, PyAny>,
        min_distance: usize,
        threshold_abs: f64,
        threshold_rel: f64,
        num_peaks: Option<usize>,
    ) -> PyResult<Bound<'py, PyArrayDyn<bool>>> {
        let options = PeakOptions {
            min_distance,
            threshold_abs,
            threshold_rel,
            num_peaks,
        };

        if let Ok(array) = image.downcast::<PyArrayDyn<f64>>() {
            let readonly = array.readonly();
            return Ok(find_peaks(readonly.as_array(), &options).into_pyarray(py));
        }

        macro_rules! try_widened {
            ($($t:ty),*) => {
                $(
                    if let Ok(array) = image.downcast::<PyArrayDyn<$t>>() {
                        let widened = array.readonly().as_array().mapv(|v| v as f64);
                        return Ok(find_peaks(widened.view(), &options).into_pyarray(py));
                    }
                )*
            };
        }

        try_widened!(f32, u8, u16, u32, u64, i8, i16, i32, i64);
        Err(invalid_input(image))
    }

    // ========================================================================
    // Border Extraction
    // ========================================================================

    /// Concatenate the border slabs of an array, six for a 3-D volume.
    ///
    /// The result keeps the dtype of `data`.
    #[pyfunction]
    pub fn get_border_data<'py>(
        py: Python<'py>,
        data: &Bound<'py, PyAny>,
        border_size: usize,
    ) -> PyResult<Bound<'py, PyAny>> {
        macro_rules! try_dtype {
            ($($t:ty),*) => {
                $(
                    if let Ok(array) = data.downcast::<PyArrayDyn<$t>>() {
                        let readonly = array.readonly();
                        let cells = border_cells(readonly.as_array(), border_size).map_err(to_py_err)?;
                        return Ok(cells.into_pyarray(py).into_any());
                    }
                )*
            };
        }

        try_dtype!(f64, f32, bool, u8, u16, u32, u64, i8, i16, i32, i64);
        Err(invalid_input(data))
    }

    /// ndimage Rust extension module
    #[pymodule]
    pub fn ndimage_rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(largest_connected_component, m)?)?;
        m.add_function(wrap_pyfunction!(peak_local_max, m)?)?;
        m.add_function(wrap_pyfunction!(get_border_data, m)?)?;

        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::ndimage_rust;
