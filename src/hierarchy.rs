//! Hierarchy index resolution.
//!
//! Converts per-stream hierarchical labels (e.g. `["Right", "CA3",
//! "Anterior"]`) into compact integer distinction codes, one per level.
//! Codes are assigned in first-occurrence order while scanning streams in
//! input order, so the mapping is dense, stable, and reproducible. The
//! labels themselves carry no meaning here.
use std::collections::HashMap;
use std::ops::Range;

use ndarray::Array2;

use crate::error::CoreError;

/// One recording channel with its anatomical hierarchy and 3D reference
/// position. An empty-string label at any level marks the stream as
/// unassigned; such streams are excluded from the index entirely.
#[derive(Debug, Clone)]
pub struct Stream {
    pub id: u32,
    pub hierarchy: Vec<String>,
    pub position: [f64; 3],
}

impl Stream {
    pub fn new(id: u32, hierarchy: &[&str], position: [f64; 3]) -> Self {
        Self {
            id,
            hierarchy: hierarchy.iter().map(|s| s.to_string()).collect(),
            position,
        }
    }
}

/// Resolved distinction codes for the included streams of a session.
///
/// Rows cover only streams with a complete hierarchy; excluded streams
/// leave no trace. `source_ranges` numbers each stream's sources on one
/// global ordinal axis, in stream order — group layout sizes come from
/// these ranges.
#[derive(Debug, Clone)]
pub struct StreamIndex {
    /// `[n_streams, n_levels]` distinction codes.
    pub codes: Array2<usize>,
    /// Per level, the distinct labels in first-seen order; a label's
    /// position is its code.
    pub lookup: Vec<Vec<String>>,
    /// Original stream ids, row-aligned with `codes`.
    pub stream_ids: Vec<u32>,
    /// Raw stream positions, row-aligned with `codes`.
    pub positions: Vec<[f64; 3]>,
    /// Global source ordinals owned by each stream, row-aligned.
    pub source_ranges: Vec<Range<usize>>,
}

impl StreamIndex {
    pub fn n_levels(&self) -> usize {
        self.lookup.len()
    }

    pub fn n_streams(&self) -> usize {
        self.stream_ids.len()
    }

    /// Total number of sources across all included streams.
    pub fn n_sources(&self) -> usize {
        self.source_ranges.last().map_or(0, |r| r.end)
    }
}

/// Resolve hierarchy labels into a [`StreamIndex`].
///
/// `sources_per_stream[k]` is the number of sources attached to
/// `streams[k]` and must be the same length as `streams`. Streams with an
/// empty label at any level are skipped (not errored); all remaining
/// streams must agree on the number of levels.
pub fn resolve(
    streams: &[Stream],
    sources_per_stream: &[usize],
) -> Result<StreamIndex, CoreError> {
    if streams.len() != sources_per_stream.len() {
        return Err(CoreError::ShapeMismatch(format!(
            "{} streams but {} source counts",
            streams.len(),
            sources_per_stream.len()
        )));
    }

    let n_levels = streams
        .iter()
        .map(|s| s.hierarchy.len())
        .next()
        .unwrap_or(0);

    let mut lookup: Vec<Vec<String>> = vec![Vec::new(); n_levels];
    let mut assigned: Vec<HashMap<String, usize>> = vec![HashMap::new(); n_levels];

    let mut rows: Vec<usize> = Vec::new();
    let mut stream_ids = Vec::new();
    let mut positions = Vec::new();
    let mut source_ranges = Vec::new();
    let mut next_source = 0usize;

    for (k, stream) in streams.iter().enumerate() {
        if stream.hierarchy.len() != n_levels {
            return Err(CoreError::ShapeMismatch(format!(
                "stream {} has {} hierarchy levels, session has {}",
                stream.id,
                stream.hierarchy.len(),
                n_levels
            )));
        }
        if stream.hierarchy.iter().any(|l| l.is_empty()) {
            continue; // unassigned stream: no row, no codes
        }
        for (level, label) in stream.hierarchy.iter().enumerate() {
            let code = *assigned[level].entry(label.clone()).or_insert_with(|| {
                lookup[level].push(label.clone());
                lookup[level].len() - 1
            });
            rows.push(code);
        }
        stream_ids.push(stream.id);
        positions.push(stream.position);
        let n_src = sources_per_stream[k];
        source_ranges.push(next_source..next_source + n_src);
        next_source += n_src;
    }

    let n_streams = stream_ids.len();
    let codes = Array2::from_shape_vec((n_streams, n_levels), rows)
        .map_err(|e| CoreError::ShapeMismatch(e.to_string()))?;

    Ok(StreamIndex {
        codes,
        lookup,
        stream_ids,
        positions,
        source_ranges,
    })
}
