//! Peak detection: local maxima with minimum separation.
//!
//! Peaks are cells equal to the maximum of their `2 * min_distance + 1`
//! window (see [`maximum_filter`]), above an absolute/relative intensity
//! threshold, optionally capped to the most intense `num_peaks`.
//!
//! Flat maxima (plateaus) report every cell of the plateau.
//!
//! ## Edge-case policies
//! - A grid holding a single value has no peaks.
//! - Non-candidate cells are flattened to `0.0` before thresholding, so a
//!   true peak of exactly `0.0` can never pass the default thresholds.
//! - Windows are zero padded, so negative cells near the border compare
//!   against an implicit `0.0`.
//! - The threshold comparison is strict.
//! - NaN cells are never peaks.

use log::debug;
use ndarray::{Array, ArrayView, Dimension, IntoDimension, Zip};
use rayon::prelude::*;

use crate::filters::morphology::maximum_filter;

/// Parameters for [`find_peaks`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakOptions {
    /// Window reach along every axis; peaks are at least this far apart.
    /// `0` makes every cell a candidate.
    pub min_distance: usize,
    /// Minimum peak intensity.
    pub threshold_abs: f64,
    /// Minimum peak intensity as a fraction of the highest candidate.
    pub threshold_rel: f64,
    /// Keep at most this many peaks, most intense first. `None` = unlimited.
    pub num_peaks: Option<usize>,
}

impl Default for PeakOptions {
    fn default() -> Self {
        Self {
            min_distance: 10,
            threshold_abs: 0.0,
            threshold_rel: 0.1,
            num_peaks: None,
        }
    }
}

impl PeakOptions {
    pub fn new(min_distance: usize) -> Self {
        Self {
            min_distance,
            ..Self::default()
        }
    }

    pub fn with_threshold_abs(mut self, threshold_abs: f64) -> Self {
        self.threshold_abs = threshold_abs;
        self
    }

    pub fn with_threshold_rel(mut self, threshold_rel: f64) -> Self {
        self.threshold_rel = threshold_rel;
        self
    }

    pub fn with_num_peaks(mut self, num_peaks: usize) -> Self {
        self.num_peaks = Some(num_peaks);
        self
    }
}

/// Find local maxima and return them as a boolean mask.
///
/// # Arguments
/// * `image` - Intensity grid of any rank
/// * `options` - Separation, thresholds and peak cap
///
/// # Returns
/// Boolean mask of the same shape, `true` at every selected peak.
/// A flat or all-below-threshold grid gives an all-false mask.
pub fn find_peaks<D: Dimension>(image: ArrayView<f64, D>, options: &PeakOptions) -> Array<bool, D> {
    let mut mask = Array::<bool, D>::from_elem(image.raw_dim(), false);
    for (index, _) in ranked_peaks(image, options) {
        mask[index] = true;
    }
    mask
}

/// Find local maxima and return their coordinates.
///
/// Coordinates come in row-major order, or by descending intensity when
/// `num_peaks` truncated the list. The order of equally intense peaks at
/// the cut-off is unspecified.
pub fn peak_coordinates<D: Dimension>(
    image: ArrayView<f64, D>,
    options: &PeakOptions,
) -> Vec<Vec<usize>> {
    ranked_peaks(image, options)
        .into_iter()
        .map(|(index, _)| index.slice().to_vec())
        .collect()
}

fn ranked_peaks<D: Dimension>(image: ArrayView<f64, D>, options: &PeakOptions) -> Vec<(D, f64)> {
    let Some(&first) = image.iter().next() else {
        return Vec::new();
    };
    if image.iter().all(|&v| v == first) {
        return Vec::new();
    }

    let dilated = maximum_filter(image.view(), options.min_distance);

    // Cells below their window maximum are flattened to 0
    let mut masked = image.to_owned();
    Zip::from(&mut masked).and(&dilated).for_each(|v, &max| {
        *v *= if *v == max { 1.0 } else { 0.0 };
    });

    let highest = masked.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let threshold = (highest * options.threshold_rel).max(options.threshold_abs);

    let mut peaks: Vec<(D, f64)> = masked
        .indexed_iter()
        .filter(|&(_, &v)| v > threshold)
        .map(|(index, &v)| (index.into_dimension(), v))
        .collect();
    let candidates = peaks.len();

    if let Some(limit) = options.num_peaks {
        if peaks.len() > limit {
            // Stable, so equal intensities keep row-major order
            peaks.par_sort_by(|a, b| b.1.total_cmp(&a.1));
            peaks.truncate(limit);
        }
    }

    debug!(
        "find_peaks: threshold {}, {} candidates, {} kept",
        threshold,
        candidates,
        peaks.len()
    );

    peaks
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1, Array2, Array3, ArrayD, IxDyn};

    fn signal() -> Array1<f64> {
        Array1::from(vec![0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 0.0, 3.0, 0.0, 0.0])
    }

    fn true_indices(mask: &Array1<bool>) -> Vec<usize> {
        mask.iter()
            .enumerate()
            .filter(|(_, &v)| v)
            .map(|(i, _)| i)
            .collect()
    }

    fn unthresholded(min_distance: usize) -> PeakOptions {
        PeakOptions::new(min_distance).with_threshold_rel(0.0)
    }

    #[test]
    fn test_both_local_maxima_found() {
        let peaks = find_peaks(signal().view(), &unthresholded(1));
        assert_eq!(true_indices(&peaks), vec![2, 7]);
    }

    #[test]
    fn test_num_peaks_keeps_most_intense() {
        let options = unthresholded(1).with_num_peaks(1);
        let peaks = find_peaks(signal().view(), &options);
        assert_eq!(true_indices(&peaks), vec![2]);
    }

    #[test]
    fn test_relative_threshold() {
        let options = unthresholded(1).with_threshold_rel(0.9);
        let peaks = find_peaks(signal().view(), &options);
        assert_eq!(true_indices(&peaks), vec![2]);
    }

    #[test]
    fn test_absolute_threshold_is_strict() {
        let options = unthresholded(1).with_threshold_abs(3.0);
        let peaks = find_peaks(signal().view(), &options);
        assert_eq!(true_indices(&peaks), vec![2]);
    }

    #[test]
    fn test_min_distance_suppresses_weaker_neighbor() {
        // 3 is within 5 cells of 5
        let peaks = find_peaks(signal().view(), &unthresholded(5));
        assert_eq!(true_indices(&peaks), vec![2]);
    }

    #[test]
    fn test_default_options() {
        let options = PeakOptions::default();
        assert_eq!(options.min_distance, 10);
        assert_eq!(options.threshold_abs, 0.0);
        assert_eq!(options.threshold_rel, 0.1);
        assert_eq!(options.num_peaks, None);

        let peaks = find_peaks(signal().view(), &options);
        assert_eq!(true_indices(&peaks), vec![2]);
    }

    #[test]
    fn test_flat_grid_has_no_peaks() {
        let flat = Array3::<f64>::from_elem((4, 4, 4), 5.0);
        for options in [
            PeakOptions::default(),
            unthresholded(1),
            unthresholded(1).with_threshold_abs(-10.0),
        ] {
            let peaks = find_peaks(flat.view(), &options);
            assert_eq!(peaks.dim(), flat.dim());
            assert!(peaks.iter().all(|&v| !v));
        }
    }

    #[test]
    fn test_empty_grid() {
        let empty = Array2::<f64>::zeros((0, 3));
        let peaks = find_peaks(empty.view(), &PeakOptions::default());
        assert_eq!(peaks.shape(), &[0, 3]);
    }

    #[test]
    fn test_plateau_reports_every_cell() {
        let plateau = Array1::from(vec![0.0, 4.0, 4.0, 0.0, 0.0]);
        let peaks = find_peaks(plateau.view(), &unthresholded(1));
        assert_eq!(true_indices(&peaks), vec![1, 2]);
    }

    #[test]
    fn test_negative_grid_has_no_peaks() {
        // Interior maximum -1 is a candidate but flattened cells sit at 0
        let negative = Array1::from(vec![-3.0, -5.0, -1.0, -5.0, -3.0]);
        let options = unthresholded(1).with_threshold_abs(-10.0);
        let peaks = find_peaks(negative.view(), &options);
        assert!(peaks.iter().all(|&v| !v));
    }

    #[test]
    fn test_zero_valued_peak_is_not_reported() {
        let grid = Array1::from(vec![-2.0, 0.0, -2.0, -1.0, -3.0]);
        let peaks = find_peaks(grid.view(), &unthresholded(1));
        assert!(peaks.iter().all(|&v| !v));
    }

    #[test]
    fn test_min_distance_zero_keeps_every_positive_cell() {
        let grid = Array1::from(vec![1.0, 2.0, 3.0]);
        let peaks = find_peaks(grid.view(), &unthresholded(0));
        assert_eq!(true_indices(&peaks), vec![0, 1, 2]);
    }

    #[test]
    fn test_num_peaks_zero() {
        let options = unthresholded(1).with_num_peaks(0);
        let peaks = find_peaks(signal().view(), &options);
        assert!(peaks.iter().all(|&v| !v));
    }

    #[test]
    fn test_nan_is_never_a_peak() {
        let grid = Array1::from(vec![0.0, f64::NAN, 5.0, 0.0]);
        let peaks = find_peaks(grid.view(), &PeakOptions::new(1));
        assert_eq!(true_indices(&peaks), vec![2]);
    }

    #[test]
    fn test_top_k_in_2d() {
        let mut img = Array2::<f64>::zeros((9, 9));
        img[[1, 1]] = 2.0;
        img[[1, 7]] = 9.0;
        img[[7, 1]] = 4.0;
        img[[7, 7]] = 6.0;

        let all = peak_coordinates(img.view(), &unthresholded(2));
        assert_eq!(all, vec![vec![1, 1], vec![1, 7], vec![7, 1], vec![7, 7]]);

        let top = peak_coordinates(img.view(), &unthresholded(2).with_num_peaks(2));
        assert_eq!(top, vec![vec![1, 7], vec![7, 7]]);

        let mask = find_peaks(img.view(), &unthresholded(2).with_num_peaks(2));
        assert!(mask[[1, 7]] && mask[[7, 7]]);
        assert_eq!(mask.iter().filter(|&&v| v).count(), 2);
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let mut volume = Array3::<f64>::zeros((7, 7, 7));
        volume[[1, 1, 1]] = 3.0;
        volume[[5, 5, 5]] = 8.0;
        volume[[1, 5, 3]] = 1.5;
        let options = unthresholded(1);

        let first = find_peaks(volume.view(), &options);
        let again = find_peaks(first.mapv(|v| if v { 1.0 } else { 0.0 }).view(), &options);

        assert_eq!(first.iter().filter(|&&v| v).count(), 3);
        assert_eq!(first, again);
    }

    #[test]
    fn test_shape_preserved_for_each_rank() {
        let one = signal();
        assert_eq!(find_peaks(one.view(), &PeakOptions::new(1)).shape(), one.shape());

        let two = array![[0.0, 1.0, 0.0], [2.0, 0.0, 0.5]];
        assert_eq!(find_peaks(two.view(), &PeakOptions::new(1)).shape(), two.shape());

        let three = Array3::from_shape_fn((3, 4, 5), |(z, y, x)| (z * y + x) as f64);
        assert_eq!(find_peaks(three.view(), &PeakOptions::new(1)).shape(), three.shape());

        let dynamic = ArrayD::from_shape_fn(IxDyn(&[2, 3, 4, 2]), |idx| idx[2] as f64);
        assert_eq!(
            find_peaks(dynamic.view(), &PeakOptions::new(1)).shape(),
            dynamic.shape()
        );
    }

    #[test]
    fn test_input_not_mutated() {
        let img = signal();
        let before = img.clone();
        let _ = find_peaks(img.view(), &PeakOptions::new(1));
        assert_eq!(img, before);
    }

    /// Deterministic pseudo-random grid with small integer values, so
    /// plateaus and ties show up often.
    fn scrambled(shape: &[usize], seed: u64) -> ArrayD<f64> {
        let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ArrayD::from_shape_fn(IxDyn(shape), |_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) % 9) as f64 - 3.0
        })
    }

    /// Reference: scan the zero-padded window of every cell directly.
    fn reference_peaks(
        image: &ArrayD<f64>,
        min_distance: usize,
        threshold_abs: f64,
        threshold_rel: f64,
    ) -> ArrayD<bool> {
        let shape = image.shape().to_vec();
        let first = image.iter().next().copied();
        if image.iter().all(|&v| Some(v) == first) {
            return ArrayD::from_elem(image.raw_dim(), false);
        }

        let side = 2 * min_distance + 1;
        let total = side.pow(shape.len() as u32);
        let window_max = |center: &[usize]| -> f64 {
            let mut best = f64::NEG_INFINITY;
            for code in 0..total {
                let mut rest = code;
                let mut pos = Vec::with_capacity(shape.len());
                for &c in center {
                    pos.push(c as isize + (rest % side) as isize - min_distance as isize);
                    rest /= side;
                }
                let inside = pos
                    .iter()
                    .zip(&shape)
                    .all(|(&c, &len)| c >= 0 && c < len as isize);
                let v = if inside {
                    let ix: Vec<usize> = pos.iter().map(|&c| c as usize).collect();
                    image[&ix[..]]
                } else {
                    0.0
                };
                best = best.max(v);
            }
            best
        };

        let masked = ArrayD::from_shape_fn(image.raw_dim(), |idx: IxDyn| {
            let v = image[idx.slice()];
            if v == window_max(idx.slice()) {
                v
            } else {
                0.0
            }
        });
        let highest = masked.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let threshold = (highest * threshold_rel).max(threshold_abs);
        masked.mapv(|v| v > threshold)
    }

    #[test]
    fn test_matches_reference_on_dynamic_grids() {
        let shapes: [&[usize]; 3] = [&[11], &[5, 6], &[3, 4, 5]];
        let mut checked = 0;

        for (s, shape) in shapes.iter().enumerate() {
            for seed in 0..8u64 {
                let grid = scrambled(shape, seed * 3 + s as u64);
                for min_distance in 0..=2 {
                    for threshold_abs in [-1.0, 0.0, 2.0] {
                        for threshold_rel in [0.0, 0.1, 0.5] {
                            let options = PeakOptions::new(min_distance)
                                .with_threshold_abs(threshold_abs)
                                .with_threshold_rel(threshold_rel);
                            let expected =
                                reference_peaks(&grid, min_distance, threshold_abs, threshold_rel);
                            assert_eq!(
                                find_peaks(grid.view(), &options),
                                expected,
                                "shape {:?}, seed {}, options {:?}",
                                shape,
                                seed,
                                options
                            );
                            checked += 1;
                        }
                    }
                }
            }
        }

        assert_eq!(checked, 3 * 8 * 3 * 3 * 3);
    }

    #[test]
    fn test_num_peaks_keeps_strongest_reference_peaks() {
        for seed in 0..8u64 {
            let grid = scrambled(&[6, 7], seed);
            let all = reference_peaks(&grid, 1, 0.0, 0.0);
            let limit = 3;

            let kept = find_peaks(grid.view(), &unthresholded(1).with_num_peaks(limit));
            let total = all.iter().filter(|&&v| v).count();
            assert_eq!(kept.iter().filter(|&&v| v).count(), total.min(limit));

            let weakest_kept = grid
                .iter()
                .zip(kept.iter())
                .filter(|(_, &k)| k)
                .map(|(&v, _)| v)
                .fold(f64::INFINITY, f64::min);
            for ((&v, &peak), &k) in grid.iter().zip(all.iter()).zip(kept.iter()) {
                if k {
                    assert!(peak, "seed {}: kept a non-peak", seed);
                } else if peak {
                    assert!(v <= weakest_kept, "seed {}: dropped a stronger peak", seed);
                }
            }
        }
    }

    #[test]
    fn test_equal_peaks_keep_row_major_order() {
        let grid = Array1::from(vec![0.0, 5.0, 0.0, 0.0, 5.0, 0.0, 0.0, 5.0, 0.0]);
        let top = peak_coordinates(grid.view(), &unthresholded(1).with_num_peaks(2));
        assert_eq!(top, vec![vec![1], vec![4]]);
    }
}
