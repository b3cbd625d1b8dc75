//! Grouping engine.
//!
//! Collapses streams into groups that share identical distinction codes on
//! a chosen subset of hierarchy levels (the "method"). An empty method
//! merges everything into one universal group; a method naming every level
//! yields one group per distinct full hierarchy tuple.
//!
//! Two passes: the first assigns each stream a dense group index keyed by
//! its method-masked code tuple (first-appearance order), the second
//! aggregates centroids and membership by that index.
use std::collections::HashMap;
use std::ops::Range;

use log::debug;

use crate::error::CoreError;
use crate::hierarchy::StreamIndex;

/// A set of streams indistinguishable under the requested method.
#[derive(Debug, Clone)]
pub struct Group {
    /// Method-masked code tuple shared by every member.
    pub key: Vec<usize>,
    /// Row indices into the [`StreamIndex`] for each member, in stream order.
    pub member_rows: Vec<usize>,
    /// Mean of the members' raw positions, per axis.
    pub centroid: [f64; 3],
    /// Each member stream's global source ordinals, in member order.
    pub sources_by_stream: Vec<Range<usize>>,
}

impl Group {
    /// Total sources across all member streams.
    pub fn n_sources(&self) -> usize {
        self.sources_by_stream.iter().map(|r| r.len()).sum()
    }
}

/// Check that every method entry names an existing level.
pub(crate) fn check_method(method: &[usize], n_levels: usize) -> Result<(), CoreError> {
    for &level in method {
        if level >= n_levels {
            return Err(CoreError::InvalidHierarchyLevel { level, n_levels });
        }
    }
    Ok(())
}

/// Group the index's streams by their codes on the `method` levels.
///
/// Groups come back in first-appearance order of their masked code tuple,
/// scanning streams in stream order — stable and reproducible.
pub fn group_streams(index: &StreamIndex, method: &[usize]) -> Result<Vec<Group>, CoreError> {
    let n_levels = index.n_levels();
    check_method(method, n_levels)?;
    if index.n_streams() == 0 {
        return Err(CoreError::DegenerateGroup);
    }

    // Pass 1: dense group index per stream.
    let mut by_key: HashMap<Vec<usize>, usize> = HashMap::new();
    let mut order: Vec<Vec<usize>> = Vec::new();
    let mut group_of: Vec<usize> = Vec::with_capacity(index.n_streams());
    for row in index.codes.rows() {
        let key: Vec<usize> = (0..n_levels)
            .map(|l| if method.contains(&l) { row[l] } else { 0 })
            .collect();
        let g = *by_key.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            order.len() - 1
        });
        group_of.push(g);
    }

    // Pass 2: aggregate positions and membership.
    let mut groups: Vec<Group> = order
        .into_iter()
        .map(|key| Group {
            key,
            member_rows: Vec::new(),
            centroid: [0.0; 3],
            sources_by_stream: Vec::new(),
        })
        .collect();
    for (row, &g) in group_of.iter().enumerate() {
        let group = &mut groups[g];
        group.member_rows.push(row);
        for axis in 0..3 {
            group.centroid[axis] += index.positions[row][axis];
        }
        group.sources_by_stream.push(index.source_ranges[row].clone());
    }
    for group in &mut groups {
        let n = group.member_rows.len() as f64;
        for axis in 0..3 {
            group.centroid[axis] /= n;
        }
    }

    debug!(
        "grouped {} streams into {} groups (method {:?})",
        index.n_streams(),
        groups.len(),
        method
    );
    Ok(groups)
}
