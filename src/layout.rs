//! Layout engine.
//!
//! Arranges every source on a square grid offset from its group's
//! centroid, then — unless the method already distinguishes every
//! hierarchy level — min-max rescales the whole coordinate set into
//! display units. Full distinction is assumed to already live in a
//! display-ready coordinate space (raw MNI-style positions), partial
//! distinction is not.
use log::debug;
use ndarray::Array2;

use crate::error::CoreError;
use crate::group::{check_method, Group};

/// How sources of one group are packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    /// One grid per group over all its sources, flat along the y axis.
    Flat,
    /// One grid per member stream, streams fanned out along the x axis by
    /// their ordinal within the group.
    StreamSeparated,
}

/// Layout tunables. Defaults match the display constants of the original
/// interactive viewer: 1 coordinate unit between grid cells, 100-unit
/// display span after rescaling.
#[derive(Debug, Clone)]
pub struct LayoutParams {
    /// Distance between adjacent grid cells, in raw coordinate units.
    pub spacing: f64,
    /// Width of the display cube each rescaled axis is stretched to.
    pub rescale: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self { spacing: 1.0, rescale: 100.0 }
    }
}

/// Grid offset of source `i` on a `side × side` grid, centered on zero.
fn grid_offset(i: usize, side: usize, spacing: f64) -> (f64, f64) {
    let half = (side - 1) as f64 / 2.0;
    let row = (i / side) as f64;
    let col = (i % side) as f64;
    (spacing * (row - half), spacing * (col - half))
}

fn grid_side(n: usize) -> usize {
    (n as f64).sqrt().ceil() as usize
}

/// Lay out every source of every group, one `[x, y, z]` row per source.
///
/// Rows follow group order, then member-stream order, then source ordinal —
/// the same inputs always produce the same coordinates. Groups whose
/// streams carry zero sources contribute no rows.
pub fn layout_sources(
    groups: &[Group],
    n_levels: usize,
    method: &[usize],
    mode: LayoutMode,
    params: &LayoutParams,
) -> Result<Array2<f64>, CoreError> {
    check_method(method, n_levels)?;

    let n_total: usize = groups.iter().map(Group::n_sources).sum();
    let mut xyz = Array2::zeros((n_total, 3));
    let mut out = 0usize;

    for group in groups {
        let [cx, cy, cz] = group.centroid;
        match mode {
            LayoutMode::Flat => {
                let n = group.n_sources();
                if n == 0 {
                    continue;
                }
                let side = grid_side(n);
                for i in 0..n {
                    let (row_off, col_off) = grid_offset(i, side, params.spacing);
                    xyz[[out, 0]] = cx + row_off;
                    xyz[[out, 1]] = cy;
                    xyz[[out, 2]] = cz + col_off;
                    out += 1;
                }
            }
            LayoutMode::StreamSeparated => {
                for (stream_ord, range) in group.sources_by_stream.iter().enumerate() {
                    let n = range.len();
                    if n == 0 {
                        continue;
                    }
                    let side = grid_side(n);
                    for i in 0..n {
                        let (row_off, col_off) = grid_offset(i, side, params.spacing);
                        xyz[[out, 0]] = cx + params.spacing * stream_ord as f64;
                        xyz[[out, 1]] = cy + row_off;
                        xyz[[out, 2]] = cz + col_off;
                        out += 1;
                    }
                }
            }
        }
    }

    if !covers_all_levels(method, n_levels) {
        rescale_axes(&mut xyz, params.rescale);
    }

    debug!(
        "laid out {n_total} sources across {} groups ({mode:?})",
        groups.len()
    );
    Ok(xyz)
}

fn covers_all_levels(method: &[usize], n_levels: usize) -> bool {
    (0..n_levels).all(|l| method.contains(&l))
}

/// Min-max normalize each axis to `[-0.5, 0.5] × rescale`. An axis with
/// zero variance collapses to 0.
fn rescale_axes(xyz: &mut Array2<f64>, rescale: f64) {
    for axis in 0..3 {
        let mut col = xyz.column_mut(axis);
        let min = col.iter().copied().fold(f64::INFINITY, f64::min);
        let max = col.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if max > min {
            col.mapv_inplace(|v| rescale * ((v - min) / (max - min) - 0.5));
        } else {
            col.fill(0.0);
        }
    }
}
