//! Morphology filters: windowed maximum (grey dilation).
//!
//! The window is a hypercube of side `2 * radius + 1` and cells outside the
//! grid count as `0.0` (constant padding). Grids with negative intensities
//! therefore see a `0.0` maximum near their borders.
//!
//! ## Supported Formats
//!
//! Any rank: 1-D signals, 2-D images, 3-D volumes or dynamic `ArrayD`.
//! Intensities are `f64`.

use std::collections::VecDeque;

use ndarray::{Array, ArrayView, Axis, Dimension, Zip};

/// Padding value outside the grid.
const PAD_VALUE: f64 = 0.0;

// ============================================================================
// Maximum filter
// ============================================================================

/// Apply a maximum filter with a hypercube window and zero padding.
///
/// Runs one sliding-window pass per axis, which gives the same result as
/// scanning the full window at every cell. Lanes of each pass are
/// processed in parallel.
///
/// NaN cells never contribute to a maximum.
///
/// # Arguments
/// * `input` - Grid of any rank
/// * `radius` - Window reach along every axis (`0` returns a copy)
///
/// # Returns
/// Dilated grid with the same shape
pub fn maximum_filter<D: Dimension>(input: ArrayView<f64, D>, radius: usize) -> Array<f64, D> {
    let mut current = input.to_owned();
    if radius == 0 || current.is_empty() {
        return current;
    }

    for axis in 0..current.ndim() {
        let mut next = Array::<f64, D>::zeros(current.raw_dim());
        Zip::from(current.lanes(Axis(axis)))
            .and(next.lanes_mut(Axis(axis)))
            .par_for_each(|src, mut dst| {
                let lane: Vec<f64> = src.iter().copied().collect();
                let dilated = sliding_max_1d(&lane, radius);
                for (d, v) in dst.iter_mut().zip(dilated) {
                    *d = v;
                }
            });
        current = next;
    }

    current
}

/// Sliding maximum over a zero-padded 1-D lane.
///
/// Monotonic deque over the padded sequence, O(n) per lane.
fn sliding_max_1d(lane: &[f64], radius: usize) -> Vec<f64> {
    let n = lane.len();
    let window = 2 * radius + 1;
    let padded_len = n + 2 * radius;

    let value_at = |p: usize| -> f64 {
        if p < radius || p >= radius + n {
            PAD_VALUE
        } else {
            let v = lane[p - radius];
            if v.is_nan() {
                f64::NEG_INFINITY
            } else {
                v
            }
        }
    };

    let mut output = Vec::with_capacity(n);
    // Indices into the padded sequence, values decreasing front to back
    let mut deque: VecDeque<usize> = VecDeque::with_capacity(window);

    for p in 0..padded_len {
        let v = value_at(p);
        while let Some(&back) = deque.back() {
            if value_at(back) <= v {
                deque.pop_back();
            } else {
                break;
            }
        }
        deque.push_back(p);

        if let Some(&front) = deque.front() {
            if front + window <= p {
                deque.pop_front();
            }
        }

        // Window [p + 1 - window, p] is centered on cell p - 2 * radius
        if p + 1 >= window {
            if let Some(&front) = deque.front() {
                output.push(value_at(front));
            }
        }
    }

    output
}
