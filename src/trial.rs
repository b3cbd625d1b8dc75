//! Trial window extraction.
//!
//! A [`Duration`] owns the containers recorded over one bounded segment
//! plus an event-time map. [`Duration::extract_trials`] cuts a window
//! around each event time out of every container, correcting window
//! lengths across containers so that downstream consumers see one uniform
//! trial length even when containers disagree on sampling rate or time
//! base.
//!
//! Containers are traversed in a fixed order — **continuous first, then
//! binary** — and the length correction chains sequentially through that
//! order across the whole extraction pass (it is not reset per trial).
//! The traversal order is part of the contract.
use std::collections::HashMap;
use std::sync::Arc;

use log::warn;
use ndarray::Array1;

use crate::container::{Container, SessionMeta};
use crate::error::CoreError;

/// One bounded recording segment: its containers, event times, and (after
/// extraction) the derived per-event trial slices.
#[derive(Debug, Clone)]
pub struct Duration {
    pub conts: Vec<Container>,
    pub bins: Vec<Container>,
    /// Event name → occurrence times in seconds.
    pub events: HashMap<String, Vec<f64>>,
    /// Optional per-trial labels supplied by the loader.
    pub trial_labels: Vec<String>,
    /// Derived trials; replaced wholesale on each extraction call.
    pub trials: Option<Vec<Trial>>,
    pub meta: Arc<SessionMeta>,
}

/// Per-event window slices, one sub-container per source container.
#[derive(Debug, Clone)]
pub struct Trial {
    pub conts: Vec<Container>,
    pub bins: Vec<Container>,
}

impl Duration {
    pub fn new(meta: Arc<SessionMeta>) -> Self {
        Self {
            conts: Vec::new(),
            bins: Vec::new(),
            events: HashMap::new(),
            trial_labels: Vec::new(),
            trials: None,
            meta,
        }
    }

    pub fn add_cont(&mut self, container: Container) {
        self.conts.push(container);
    }

    pub fn add_bin(&mut self, container: Container) {
        self.bins.push(container);
    }

    pub fn add_event(&mut self, name: impl Into<String>, times: Vec<f64>) {
        self.events.insert(name.into(), times);
    }

    /// Cut a window `[t + bounds.0, t + bounds.1]` around every occurrence
    /// of `event` out of every windowable container, and attach the result
    /// as this duration's `trials`.
    ///
    /// Containers with no time labels cannot be windowed and are skipped;
    /// if none remain this is [`CoreError::EmptyContainerSet`]. Windows
    /// reaching past a container's time range are clamped (logged, not
    /// fatal). Any two consecutively processed containers yield slices of
    /// equal length.
    pub fn extract_trials(
        &mut self,
        event: &str,
        bounds: (f64, f64),
    ) -> Result<&[Trial], CoreError> {
        let times = self
            .events
            .get(event)
            .ok_or_else(|| CoreError::UnknownEvent(event.to_string()))?
            .clone();

        // Fixed traversal order: continuous, then binary.
        let order: Vec<(bool, usize)> = (0..self.conts.len())
            .map(|i| (false, i))
            .chain((0..self.bins.len()).map(|i| (true, i)))
            .filter(|&(is_bin, i)| {
                let c = if is_bin { &self.bins[i] } else { &self.conts[i] };
                !c.time_labels.is_empty()
            })
            .collect();
        if order.is_empty() {
            return Err(CoreError::EmptyContainerSet);
        }

        let mut trials = Vec::with_capacity(times.len());
        // Window length of the previously processed container, chained
        // across the entire pass.
        let mut prev_len: Option<usize> = None;

        for &t in &times {
            let mut trial = Trial { conts: Vec::new(), bins: Vec::new() };
            for &(is_bin, i) in &order {
                let container = if is_bin { &self.bins[i] } else { &self.conts[i] };
                let labels = &container.time_labels;

                let lower = nearest_index(labels, t + bounds.0);
                let upper = nearest_index(labels, t + bounds.1);
                warn_if_clamped(labels, t, bounds);

                let (lo, hi) = corrected_window(lower, upper, prev_len, labels.len());
                prev_len = Some(hi - lo);

                let slice = container.slice_time(lo, hi);
                if is_bin {
                    trial.bins.push(slice);
                } else {
                    trial.conts.push(slice);
                }
            }
            trials.push(trial);
        }

        self.trials = Some(trials);
        Ok(self.trials.as_deref().unwrap_or(&[]))
    }
}

/// Index of the time label nearest to `t`, ties broken toward the lower
/// index. Labels must be ascending.
fn nearest_index(labels: &Array1<f64>, t: f64) -> usize {
    let n = labels.len();
    debug_assert!(n > 0);
    // Insertion point of t.
    let mut lo = 0usize;
    let mut hi = n;
    while lo < hi {
        let mid = (lo + hi) / 2;
        if labels[mid] < t {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    if lo == 0 {
        return 0;
    }
    if lo == n {
        return n - 1;
    }
    // labels[lo - 1] < t <= labels[lo]; ties go to the lower index.
    if (t - labels[lo - 1]) <= (labels[lo] - t) {
        lo - 1
    } else {
        lo
    }
}

/// Re-derive `[lower, upper)` so its length matches `prev_len`, clamped to
/// `[0, n]`.
///
/// Even current length: `lower` stays put and only the late edge moves to
/// restore the previous length. Odd current length: the window is
/// re-centered, with `lower` shifting by `floor((cur_len − prev_len) / 2)`
/// so an odd excess drops the extra sample from the late edge and an odd
/// deficit adds one at the early edge.
fn corrected_window(
    lower: usize,
    upper: usize,
    prev_len: Option<usize>,
    n: usize,
) -> (usize, usize) {
    let cur_len = upper.saturating_sub(lower);
    let target = match prev_len {
        Some(p) if p != cur_len => p,
        _ => return (lower, upper),
    };

    let mut lo = if cur_len % 2 == 1 {
        let excess = cur_len as isize - target as isize;
        lower as isize + excess.div_euclid(2)
    } else {
        lower as isize
    };
    let mut hi = lo + target as isize;
    if lo < 0 {
        lo = 0;
        hi = (target as isize).min(n as isize);
    }
    if hi > n as isize {
        hi = n as isize;
        lo = (hi - target as isize).max(0);
    }
    (lo as usize, hi as usize)
}

fn warn_if_clamped(labels: &Array1<f64>, t: f64, bounds: (f64, f64)) {
    let (t_min, t_max) = (labels[0], labels[labels.len() - 1]);
    let (lo, hi) = (t + bounds.0, t + bounds.1);
    if lo < t_min || hi > t_max {
        warn!(
            "{}",
            CoreError::TimeLabelOutOfRange { lo, hi, t_min, t_max }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ContainerData;
    use ndarray::Array2;

    fn cont(fs: f64, n_t: usize) -> Container {
        let meta = SessionMeta::new("test", fs);
        Container::continuous(
            Array2::from_shape_fn((2, n_t), |(c, t)| c as f64 + t as f64 * 0.01 + 2.0),
            vec![0, 1],
            meta,
        )
        .unwrap()
    }

    #[test]
    fn nearest_index_prefers_lower_on_tie() {
        let labels = Array1::from(vec![0.0, 0.5, 1.0, 1.5]);
        assert_eq!(nearest_index(&labels, 0.25), 0); // exact midpoint
        assert_eq!(nearest_index(&labels, 0.26), 1);
        assert_eq!(nearest_index(&labels, -3.0), 0);
        assert_eq!(nearest_index(&labels, 9.0), 3);
        assert_eq!(nearest_index(&labels, 1.0), 2);
    }

    #[test]
    fn correction_noop_when_lengths_agree() {
        assert_eq!(corrected_window(4, 8, Some(4), 100), (4, 8));
        assert_eq!(corrected_window(4, 8, None, 100), (4, 8));
    }

    #[test]
    fn correction_odd_excess_drops_late_sample() {
        // cur=5 (odd), prev=4: re-center with floor(1/2)=0, late sample dropped.
        assert_eq!(corrected_window(10, 15, Some(4), 100), (10, 14));
    }

    #[test]
    fn correction_odd_deficit_grows_early() {
        // cur=5 (odd), prev=8: floor(-3/2)=-2, window re-centers early.
        assert_eq!(corrected_window(10, 15, Some(8), 100), (8, 16));
    }

    #[test]
    fn correction_even_length_anchors_early_edge() {
        // Even current length: lower stays fixed, only the late edge moves.
        assert_eq!(corrected_window(10, 18, Some(4), 100), (10, 14));
        assert_eq!(corrected_window(10, 14, Some(8), 100), (10, 18));
    }

    #[test]
    fn correction_clamps_at_recording_edges() {
        // Odd re-centering would start before 0: clamp, keep length.
        assert_eq!(corrected_window(1, 4, Some(8), 100), (0, 8));
        // Would end past n: clamp, keep length.
        assert_eq!(corrected_window(96, 100, Some(8), 100), (92, 100));
        // Recording shorter than target: best effort.
        assert_eq!(corrected_window(0, 4, Some(8), 6), (0, 6));
    }

    #[test]
    fn mixed_rate_containers_yield_equal_slice_lengths() {
        // 2 Hz (21 samples over 10 s) and 4 Hz (41 samples): the classic
        // inconsistent-time-base pair.
        let meta = SessionMeta::new("test", 2.0);
        let mut d = Duration::new(Arc::clone(&meta));
        d.add_cont(cont(2.0, 21));
        d.add_cont(cont(4.0, 41));
        d.add_event("stim", vec![5.0]);

        let trials = d.extract_trials("stim", (-1.0, 1.0)).unwrap();
        assert_eq!(trials.len(), 1);
        let a = &trials[0].conts[0];
        let b = &trials[0].conts[1];
        assert_eq!(a.n_time(), b.n_time());
        assert_eq!(a.n_time(), 4); // 2 s window at 2 Hz, set by the first container
        // Even-length correction anchors the early edge: both slices start
        // at t + lowOffset, not shifted toward the window center.
        approx::assert_abs_diff_eq!(a.time_labels[0], 4.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(b.time_labels[0], 4.0, epsilon = 1e-12);
    }

    #[test]
    fn chain_persists_across_trials() {
        let meta = SessionMeta::new("test", 2.0);
        let mut d = Duration::new(Arc::clone(&meta));
        d.add_cont(cont(2.0, 41));
        d.add_cont(cont(4.0, 81));
        d.add_event("stim", vec![5.0, 12.0, 18.0]);

        let trials = d.extract_trials("stim", (-1.0, 1.0)).unwrap();
        let mut lens: Vec<usize> = Vec::new();
        for trial in trials {
            for c in &trial.conts {
                lens.push(c.n_time());
            }
        }
        assert!(lens.windows(2).all(|w| w[0] == w[1]), "lengths {lens:?}");
    }

    #[test]
    fn binary_containers_follow_continuous() {
        let meta = SessionMeta::new("test", 2.0);
        let mut d = Duration::new(Arc::clone(&meta));
        d.add_cont(cont(2.0, 21));
        let mut spikes = Array2::zeros((1, 41));
        spikes[[0, 18]] = 1.0;
        d.add_bin(Container::binary(spikes, vec![0], SessionMeta::new("test", 4.0)).unwrap());
        d.add_event("stim", vec![5.0]);

        let trials = d.extract_trials("stim", (-1.0, 1.0)).unwrap();
        assert_eq!(trials[0].conts.len(), 1);
        assert_eq!(trials[0].bins.len(), 1);
        assert_eq!(trials[0].conts[0].n_time(), trials[0].bins[0].n_time());
        // The spike at t = 4.5 s falls inside the corrected window [4, 6) s
        // trimmed to the first container's 4-sample length.
        let ContainerData::TwoD(ref raster) = trials[0].bins[0].data else {
            panic!("expected 2-D raster")
        };
        assert_eq!(raster.sum(), 1.0);
    }

    #[test]
    fn empty_container_set_rejected() {
        let meta = SessionMeta::new("test", 2.0);
        let mut d = Duration::new(meta);
        d.add_event("stim", vec![1.0]);
        assert!(matches!(
            d.extract_trials("stim", (-0.5, 0.5)).unwrap_err(),
            CoreError::EmptyContainerSet
        ));
    }

    #[test]
    fn unknown_event_rejected() {
        let meta = SessionMeta::new("test", 2.0);
        let mut d = Duration::new(meta);
        d.add_cont(cont(2.0, 21));
        assert!(matches!(
            d.extract_trials("nope", (-0.5, 0.5)).unwrap_err(),
            CoreError::UnknownEvent(_)
        ));
    }

    #[test]
    fn reextraction_replaces_trials() {
        let meta = SessionMeta::new("test", 2.0);
        let mut d = Duration::new(meta);
        d.add_cont(cont(2.0, 41));
        d.add_event("stim", vec![5.0, 10.0]);
        d.extract_trials("stim", (-1.0, 1.0)).unwrap();
        d.add_event("probe", vec![3.0]);
        let trials = d.extract_trials("probe", (-1.0, 1.0)).unwrap();
        assert_eq!(trials.len(), 1);
    }
}
