//! Connected component selection using flood fill labeling.
//!
//! Labels maximal regions of foreground cells in an N-D grid and keeps the
//! largest one.

use std::collections::VecDeque;

use log::debug;
use ndarray::{Array, ArrayView, Dimension};

use crate::error::{NdImageError, Result};
use crate::filters::core::{foreground_mask, Foreground};

/// Neighborhood used to connect foreground cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// Only cells sharing a face are connected.
    /// 4 neighbors in 2-D, 6 in 3-D.
    Face,
    /// Every cell within unit Chebyshev distance is connected,
    /// diagonals included. 8 neighbors in 2-D, 26 in 3-D.
    #[default]
    Full,
}

impl Connectivity {
    /// Neighbor offsets for a grid with `ndim` axes.
    ///
    /// Fails when full connectivity has more than `usize::MAX` neighbors.
    fn offsets(self, ndim: usize) -> Result<Vec<Vec<isize>>> {
        match self {
            Connectivity::Face => {
                let mut offsets = Vec::with_capacity(2 * ndim);
                for axis in 0..ndim {
                    for step in [-1isize, 1] {
                        let mut offset = vec![0isize; ndim];
                        offset[axis] = step;
                        offsets.push(offset);
                    }
                }
                Ok(offsets)
            }
            Connectivity::Full => {
                let total = u32::try_from(ndim)
                    .ok()
                    .and_then(|exp| 3usize.checked_pow(exp))
                    .ok_or_else(|| NdImageError::InvalidParameter {
                        name: "connectivity",
                        reason: format!("full connectivity over {} axes overflows", ndim),
                    })?;
                Ok((0..total)
                    .map(|code| {
                        let mut rest = code;
                        let mut offset = vec![0isize; ndim];
                        for axis in (0..ndim).rev() {
                            offset[axis] = (rest % 3) as isize - 1;
                            rest /= 3;
                        }
                        offset
                    })
                    .filter(|offset| offset.iter().any(|&d| d != 0))
                    .collect())
            }
        }
    }
}

/// Label map produced by [`label_components`].
pub(crate) struct Labeling<D: Dimension> {
    /// 0 = background, 1..=count = component id
    pub labels: Array<u32, D>,
    pub count: usize,
}

impl<D: Dimension> Labeling<D> {
    /// Cell count per label, indexed by label id (slot 0 is the background).
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.count + 1];
        for &label in self.labels.iter() {
            sizes[label as usize] += 1;
        }
        sizes
    }
}

/// Label every connected region of `true` cells.
///
/// Components are numbered from 1 in row-major order of their first cell.
pub(crate) fn label_components<D: Dimension>(
    mask: ArrayView<bool, D>,
    connectivity: Connectivity,
) -> Result<Labeling<D>> {
    let shape = mask.shape().to_vec();
    let ndim = shape.len();
    let cells: Vec<bool> = mask.iter().copied().collect();

    // Row-major strides over the flattened cells
    let mut strides = vec![1usize; ndim];
    for axis in (0..ndim.saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }

    let offsets = connectivity.offsets(ndim)?;
    let mut flat_labels = vec![0u32; cells.len()];
    let mut queue = VecDeque::new();
    let mut coords = vec![0usize; ndim];
    let mut count = 0u32;

    for start in 0..cells.len() {
        if !cells[start] || flat_labels[start] != 0 {
            continue;
        }

        count += 1;
        flat_labels[start] = count;
        queue.push_back(start);

        while let Some(idx) = queue.pop_front() {
            let mut rest = idx;
            for axis in 0..ndim {
                coords[axis] = rest / strides[axis];
                rest %= strides[axis];
            }

            'neighbors: for offset in &offsets {
                let mut nidx = 0usize;
                for axis in 0..ndim {
                    let c = coords[axis] as isize + offset[axis];
                    if c < 0 || c >= shape[axis] as isize {
                        continue 'neighbors;
                    }
                    nidx += c as usize * strides[axis];
                }

                if cells[nidx] && flat_labels[nidx] == 0 {
                    flat_labels[nidx] = count;
                    queue.push_back(nidx);
                }
            }
        }
    }

    let mut labels = Array::<u32, D>::zeros(mask.raw_dim());
    labels
        .iter_mut()
        .zip(flat_labels)
        .for_each(|(dst, label)| *dst = label);

    Ok(Labeling {
        labels,
        count: count as usize,
    })
}

/// Keep only the largest connected component of a bool-like grid.
///
/// Uses full connectivity (26 neighbors in 3-D).
///
/// # Arguments
/// * `volume` - Grid of any rank; non-zero / `true` cells are foreground
///
/// # Returns
/// Boolean mask of the same shape, `true` exactly on the largest component.
///
/// # Errors
/// `NdImageError::NoComponents` if the grid holds no foreground cell.
/// `NdImageError::InvalidParameter` if the grid has too many axes to
/// enumerate its neighbors.
///
/// When several components share the largest size, which one is returned
/// is unspecified.
pub fn largest_component<T: Foreground, D: Dimension>(
    volume: ArrayView<T, D>,
) -> Result<Array<bool, D>> {
    largest_component_with(volume, Connectivity::Full)
}

/// Keep only the largest connected component using the given connectivity.
pub fn largest_component_with<T: Foreground, D: Dimension>(
    volume: ArrayView<T, D>,
    connectivity: Connectivity,
) -> Result<Array<bool, D>> {
    let mask = foreground_mask(volume);
    let labeling = label_components(mask.view(), connectivity)?;

    match labeling.count {
        0 => Err(NdImageError::NoComponents),
        1 => {
            debug!("largest_component: single component, returning input mask");
            Ok(mask)
        }
        count => {
            let mut sizes = labeling.sizes();
            // Background never wins
            sizes[0] = 0;

            let (selected, size) = sizes
                .iter()
                .enumerate()
                .fold((0usize, 0usize), |best, (label, &size)| {
                    if size > best.1 {
                        (label, size)
                    } else {
                        best
                    }
                });

            debug!(
                "largest_component: {} components, keeping label {} ({} cells)",
                count, selected, size
            );

            let selected = selected as u32;
            Ok(labeling.labels.mapv(|label| label == selected))
        }
    }
}
