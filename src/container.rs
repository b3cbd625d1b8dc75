//! Time-indexed data containers.
//!
//! A [`Container`] holds one numeric array of recorded data — binary spike
//! rasters or continuous signals — shaped `[C, T]` (or `[C, T, F]` after a
//! spectral transform) together with its derived axis labels. Session-wide
//! metadata (sampling rate) is shared by `Arc`, never copied per container.
//!
//! Loaders construct containers; the trial extractor ([`crate::trial`])
//! slices them. The core never reads files or touches devices.
use std::sync::Arc;

use ndarray::{s, Array1, Array2, Array3};

use crate::error::CoreError;

/// Session-wide recording parameters, shared by reference across every
/// container of a session.
#[derive(Debug, Clone)]
pub struct SessionMeta {
    /// Session name (used only for labeling exports).
    pub name: String,
    /// Sampling rate in Hz. Time labels are derived from it.
    pub fs: f64,
}

impl SessionMeta {
    pub fn new(name: impl Into<String>, fs: f64) -> Arc<Self> {
        Arc::new(Self { name: name.into(), fs })
    }
}

/// Which kind of signal a container holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Discrete 0/1 event rasters (spikes).
    Binary,
    /// Real-valued signals (LFP, spectral power, ...).
    Continuous,
}

/// The data array itself. Axis 0 is channels, axis 1 is time; the optional
/// third axis (frequency) is carried through slicing unchanged.
#[derive(Debug, Clone)]
pub enum ContainerData {
    TwoD(Array2<f64>),
    ThreeD(Array3<f64>),
}

impl ContainerData {
    pub fn n_channels(&self) -> usize {
        match self {
            ContainerData::TwoD(a) => a.shape()[0],
            ContainerData::ThreeD(a) => a.shape()[0],
        }
    }

    pub fn n_time(&self) -> usize {
        match self {
            ContainerData::TwoD(a) => a.shape()[1],
            ContainerData::ThreeD(a) => a.shape()[1],
        }
    }

    /// Slice `[lo, hi)` along the time axis.
    pub fn slice_time(&self, lo: usize, hi: usize) -> ContainerData {
        match self {
            ContainerData::TwoD(a) => ContainerData::TwoD(a.slice(s![.., lo..hi]).to_owned()),
            ContainerData::ThreeD(a) => ContainerData::ThreeD(a.slice(s![.., lo..hi, ..]).to_owned()),
        }
    }
}

/// One typed array of recorded data plus its axis labels.
#[derive(Debug, Clone)]
pub struct Container {
    pub kind: ContainerKind,
    pub data: ContainerData,
    /// Per-channel event times in seconds. Only populated on binary
    /// containers built from sparse spike times; empty otherwise.
    pub timestamps: Vec<Vec<f64>>,
    /// Stream id of each channel row.
    pub channel_labels: Vec<u32>,
    /// Time in seconds for each sample along axis 1.
    pub time_labels: Array1<f64>,
    /// Frequency labels for the third axis, if present.
    pub freq_labels: Option<Array1<f64>>,
    pub meta: Arc<SessionMeta>,
}

/// `t = i / fs` for `i` in `0..n`.
fn sample_times(n: usize, fs: f64) -> Array1<f64> {
    Array1::from_iter((0..n).map(|i| i as f64 / fs))
}

impl Container {
    /// A binary container from a dense 0/1 matrix `[C, T]`.
    ///
    /// Every entry must be exactly 0 or 1; anything else is a contract
    /// violation on the loader's side.
    pub fn binary(
        data: Array2<f64>,
        channel_labels: Vec<u32>,
        meta: Arc<SessionMeta>,
    ) -> Result<Self, CoreError> {
        if data.iter().any(|&v| v != 0.0 && v != 1.0) {
            return Err(CoreError::ShapeMismatch(
                "binary container data must contain only 0 and 1".into(),
            ));
        }
        check_channel_labels(data.shape()[0], &channel_labels)?;
        let time_labels = sample_times(data.shape()[1], meta.fs);
        Ok(Self {
            kind: ContainerKind::Binary,
            data: ContainerData::TwoD(data),
            timestamps: Vec::new(),
            channel_labels,
            time_labels,
            freq_labels: None,
            meta,
        })
    }

    /// A binary container from per-channel spike times (seconds).
    ///
    /// The data matrix starts empty; call [`Container::rasterize`] to build
    /// the dense 0/1 raster. Time labels span up to the ceiling of the
    /// latest timestamp, extended by one sample when the latest spike's
    /// rounded index would land on the boundary — so the default-sized
    /// raster never drops a spike.
    pub fn from_timestamps(
        timestamps: Vec<Vec<f64>>,
        channel_labels: Vec<u32>,
        meta: Arc<SessionMeta>,
    ) -> Result<Self, CoreError> {
        check_channel_labels(timestamps.len(), &channel_labels)?;
        let t_max = timestamps
            .iter()
            .flat_map(|ch| ch.iter().copied())
            .fold(f64::NEG_INFINITY, f64::max);
        let n = if t_max.is_finite() {
            let span = (t_max.ceil() * meta.fs) as usize;
            span.max((t_max * meta.fs).round() as usize + 1)
        } else {
            0
        };
        let n_ch = timestamps.len();
        Ok(Self {
            kind: ContainerKind::Binary,
            data: ContainerData::TwoD(Array2::zeros((n_ch, 0))),
            timestamps,
            channel_labels,
            time_labels: sample_times(n, meta.fs),
            freq_labels: None,
            meta,
        })
    }

    /// A continuous container from a `[C, T]` signal matrix.
    ///
    /// A matrix that is entirely 0/1 is rejected: it is almost certainly a
    /// spike raster handed to the wrong constructor.
    pub fn continuous(
        data: Array2<f64>,
        channel_labels: Vec<u32>,
        meta: Arc<SessionMeta>,
    ) -> Result<Self, CoreError> {
        if !data.is_empty() && data.iter().all(|&v| v == 0.0 || v == 1.0) {
            return Err(CoreError::ShapeMismatch(
                "continuous container data is entirely 0/1; use a binary container".into(),
            ));
        }
        check_channel_labels(data.shape()[0], &channel_labels)?;
        let time_labels = sample_times(data.shape()[1], meta.fs);
        Ok(Self {
            kind: ContainerKind::Continuous,
            data: ContainerData::TwoD(data),
            timestamps: Vec::new(),
            channel_labels,
            time_labels,
            freq_labels: None,
            meta,
        })
    }

    /// A continuous container with a third (frequency) axis, e.g. the output
    /// of a spectrogram transform. Time and frequency labels come from the
    /// transform, not the sample grid.
    pub fn continuous_3d(
        data: Array3<f64>,
        channel_labels: Vec<u32>,
        time_labels: Array1<f64>,
        freq_labels: Array1<f64>,
        meta: Arc<SessionMeta>,
    ) -> Result<Self, CoreError> {
        check_channel_labels(data.shape()[0], &channel_labels)?;
        if data.shape()[1] != time_labels.len() {
            return Err(CoreError::ShapeMismatch(format!(
                "time axis has {} samples but {} time labels given",
                data.shape()[1],
                time_labels.len()
            )));
        }
        if data.shape()[2] != freq_labels.len() {
            return Err(CoreError::ShapeMismatch(format!(
                "frequency axis has {} bins but {} labels given",
                data.shape()[2],
                freq_labels.len()
            )));
        }
        Ok(Self {
            kind: ContainerKind::Continuous,
            data: ContainerData::ThreeD(data),
            timestamps: Vec::new(),
            channel_labels,
            time_labels,
            freq_labels: Some(freq_labels),
            meta,
        })
    }

    pub fn n_channels(&self) -> usize {
        self.data.n_channels()
    }

    pub fn n_time(&self) -> usize {
        self.data.n_time()
    }

    /// Build the dense 0/1 raster from [`Container::timestamps`].
    ///
    /// `length` is the raster length in samples; defaults to the span of
    /// the current time labels. Each spike lands at `round(t · fs)`; times
    /// past the raster end are dropped.
    pub fn rasterize(&mut self, length: Option<usize>) -> Result<(), CoreError> {
        if self.kind != ContainerKind::Binary {
            return Err(CoreError::ShapeMismatch(
                "rasterize called on a continuous container".into(),
            ));
        }
        let n = length.unwrap_or(self.time_labels.len());
        let mut data = Array2::zeros((self.timestamps.len(), n));
        for (ch, times) in self.timestamps.iter().enumerate() {
            for &t in times {
                let idx = (t * self.meta.fs).round() as usize;
                if idx < n {
                    data[[ch, idx]] = 1.0;
                }
            }
        }
        self.data = ContainerData::TwoD(data);
        self.time_labels = sample_times(n, self.meta.fs);
        Ok(())
    }

    /// A new container of the same kind holding the `[lo, hi)` time slice.
    ///
    /// Channel labels and the frequency axis carry over unchanged; the raw
    /// timestamp side-channel does not (trial slices are derived data).
    pub fn slice_time(&self, lo: usize, hi: usize) -> Container {
        Container {
            kind: self.kind,
            data: self.data.slice_time(lo, hi),
            timestamps: Vec::new(),
            channel_labels: self.channel_labels.clone(),
            time_labels: self.time_labels.slice(s![lo..hi]).to_owned(),
            freq_labels: self.freq_labels.clone(),
            meta: Arc::clone(&self.meta),
        }
    }
}

fn check_channel_labels(n_channels: usize, labels: &[u32]) -> Result<(), CoreError> {
    if labels.len() != n_channels {
        return Err(CoreError::ShapeMismatch(format!(
            "{} channels but {} channel labels",
            n_channels,
            labels.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> Arc<SessionMeta> {
        SessionMeta::new("test", 10.0)
    }

    #[test]
    fn continuous_time_labels_follow_fs() {
        let c = Container::continuous(
            Array2::from_shape_fn((2, 5), |(c, t)| c as f64 + t as f64 * 0.3),
            vec![0, 1],
            meta(),
        )
        .unwrap();
        assert_eq!(c.time_labels.len(), 5);
        approx::assert_abs_diff_eq!(c.time_labels[3], 0.3, epsilon = 1e-12);
    }

    #[test]
    fn binary_rejects_non_binary_values() {
        let err = Container::binary(Array2::from_elem((1, 4), 0.5), vec![0], meta());
        assert!(err.is_err());
    }

    #[test]
    fn continuous_rejects_pure_raster() {
        let mut data = Array2::zeros((1, 4));
        data[[0, 2]] = 1.0;
        assert!(Container::continuous(data, vec![0], meta()).is_err());
    }

    #[test]
    fn channel_label_count_checked() {
        let err = Container::continuous(Array2::from_elem((2, 4), 0.7), vec![0], meta());
        assert!(err.is_err());
    }

    #[test]
    fn rasterize_places_spikes_at_rounded_samples() {
        // fs = 10 Hz: a spike at 0.26 s lands in sample 3.
        let mut c =
            Container::from_timestamps(vec![vec![0.26, 0.8], vec![0.5]], vec![0, 1], meta())
                .unwrap();
        c.rasterize(None).unwrap();
        let ContainerData::TwoD(ref d) = c.data else { panic!("expected 2-D raster") };
        assert_eq!(d.shape(), &[2, 10]);
        assert_eq!(d[[0, 3]], 1.0);
        assert_eq!(d[[0, 8]], 1.0);
        assert_eq!(d[[1, 5]], 1.0);
        assert_eq!(d.sum(), 3.0);
    }

    #[test]
    fn rasterize_keeps_latest_edge_spike() {
        // fs = 10 Hz: round(0.95 · 10) = 10, one past ceil(0.95) · 10, so
        // the raster grows to 11 samples instead of dropping the spike.
        let mut c = Container::from_timestamps(vec![vec![0.1, 0.95]], vec![0], meta()).unwrap();
        c.rasterize(None).unwrap();
        let ContainerData::TwoD(ref d) = c.data else { panic!("expected 2-D raster") };
        assert_eq!(d.shape(), &[1, 11]);
        assert_eq!(d[[0, 1]], 1.0);
        assert_eq!(d[[0, 10]], 1.0);
        assert_eq!(d.sum(), 2.0);
        assert_eq!(c.time_labels.len(), 11);
    }

    #[test]
    fn empty_timestamps_give_empty_raster() {
        let c = Container::from_timestamps(vec![vec![], vec![]], vec![0, 1], meta()).unwrap();
        assert_eq!(c.time_labels.len(), 0);
    }

    #[test]
    fn slice_time_restricts_labels() {
        let c = Container::continuous(
            Array2::from_shape_fn((1, 10), |(_, t)| t as f64 + 2.0),
            vec![7],
            meta(),
        )
        .unwrap();
        let s = c.slice_time(2, 6);
        assert_eq!(s.n_time(), 4);
        approx::assert_abs_diff_eq!(s.time_labels[0], 0.2, epsilon = 1e-12);
        assert_eq!(s.channel_labels, vec![7]);
    }
}
