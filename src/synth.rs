//! Deterministic synthetic sessions.
//!
//! Stand-ins for a real loader: a fixed-stride spike raster and the
//! eight-octant hippocampal stream table (Side / Region / Axis) with its
//! MNI reference coordinates. Everything here is reproducible — no RNG —
//! so the demo binary and integration tests get stable fixtures.
use ndarray::Array2;

use crate::hierarchy::Stream;

/// A 0/1 spike raster `[n_channels, seconds × fs]`.
///
/// Each channel fires every 200 samples (0.5% density) with a per-channel
/// phase, so channels are distinguishable but the pattern is fixed.
pub fn spike_train(n_channels: usize, seconds: f64, fs: f64) -> Array2<f64> {
    const STRIDE: usize = 200;
    let n_t = (seconds * fs) as usize;
    Array2::from_shape_fn((n_channels, n_t), |(ch, t)| {
        if (t + ch * 17) % STRIDE == 0 { 1.0 } else { 0.0 }
    })
}

/// The eight-octant hippocampal stream table: `c` streams split evenly
/// over {Right, Left} × {CA3, CA1} × {Anterior, Posterior}.
///
/// `c` should be divisible by 8; a remainder lands in the last octant.
/// Coordinates are the bilateral CA1/CA3 MNI positions shifted ±2 mm
/// along the anterior-posterior axis.
pub fn hippocampal_streams(c: usize) -> Vec<Stream> {
    let r_ca1 = [25.0, -37.0, 0.0];
    let l_ca1 = [-25.0, -37.0, 0.0];
    let r_ca3 = [28.0, -10.0, -22.0];
    let l_ca3 = [-28.0, -10.0, -22.0];
    let ap = [0.0, 2.0, 0.0];

    let shifted = |base: [f64; 3], sign: f64| {
        [base[0] + sign * ap[0], base[1] + sign * ap[1], base[2] + sign * ap[2]]
    };

    let octants: [(&str, &str, &str, [f64; 3]); 8] = [
        ("Right", "CA3", "Anterior", shifted(r_ca3, 1.0)),
        ("Right", "CA3", "Posterior", shifted(r_ca3, -1.0)),
        ("Left", "CA3", "Anterior", shifted(l_ca3, 1.0)),
        ("Left", "CA3", "Posterior", shifted(l_ca3, -1.0)),
        ("Right", "CA1", "Anterior", shifted(r_ca1, 1.0)),
        ("Right", "CA1", "Posterior", shifted(r_ca1, -1.0)),
        ("Left", "CA1", "Anterior", shifted(l_ca1, 1.0)),
        ("Left", "CA1", "Posterior", shifted(l_ca1, -1.0)),
    ];

    let per_octant = (c / 8).max(1);
    (0..c)
        .map(|k| {
            let (side, region, axis, pos) = octants[(k / per_octant).min(7)];
            Stream::new(k as u32, &[side, region, axis], pos)
        })
        .collect()
}

/// Count sources per stream given each source's stream label.
///
/// `stream_ids[k]` is the stream owning source row `k` (the binary
/// container's channel labels); streams are numbered `0..n_streams`.
pub fn sources_per_stream(stream_ids: &[u32], n_streams: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_streams];
    for &s in stream_ids {
        if (s as usize) < n_streams {
            counts[s as usize] += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spike_train_is_sparse_and_binary() {
        let raster = spike_train(8, 2.0, 1000.0);
        assert_eq!(raster.shape(), &[8, 2000]);
        assert!(raster.iter().all(|&v| v == 0.0 || v == 1.0));
        // 0.5% density: 10 spikes per channel over 2000 samples.
        assert_eq!(raster.row(0).sum(), 10.0);
    }

    #[test]
    fn octants_cover_all_combinations() {
        let streams = hippocampal_streams(24);
        assert_eq!(streams.len(), 24);
        let idx = crate::hierarchy::resolve(&streams, &vec![1; 24]).unwrap();
        assert_eq!(idx.lookup[0].len(), 2);
        assert_eq!(idx.lookup[1].len(), 2);
        assert_eq!(idx.lookup[2].len(), 2);
        let groups = crate::group::group_streams(&idx, &[0, 1, 2]).unwrap();
        assert_eq!(groups.len(), 8);
    }

    #[test]
    fn source_counts_follow_labels() {
        let labels = [0, 1, 0, 2, 0];
        assert_eq!(sources_per_stream(&labels, 3), vec![3, 1, 1]);
    }
}
