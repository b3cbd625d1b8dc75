//! # engram-core — trial windowing and hierarchical source layout
//!
//! `engram-core` takes multi-channel neural recordings that are already in
//! memory — continuous signals and discrete spike events — and derives two
//! artifacts from them:
//!
//! 1. **Trial windows**: time-aligned slices cut around event times from
//!    heterogeneous per-channel containers, with a cross-container length
//!    correction so every container of a trial comes out the same length
//!    even when sampling rates and time bases disagree.
//! 2. **Source layouts**: 3D display coordinates for every recorded
//!    source, grouped by any subset of the session's anatomical hierarchy
//!    levels and packed on per-group grids, with min-max rescaling to
//!    display units when the grouping still merges distinguishable
//!    streams.
//!
//! File loading, rendering, filtering, and persistence are external
//! collaborators; the core consumes numeric arrays and produces numeric
//! arrays.
//!
//! ## Pipeline overview
//!
//! ```text
//! loader (external)
//!   │
//!   ├─ Container::binary / ::continuous        typed [C, T] holders
//!   ├─ Duration::extract_trials(event, bounds) per-event window slices
//!   │                                          (chained length correction)
//!   └─ hierarchy::resolve(streams, sources)    distinction codes
//!        └─ group::group_streams(index, method)   groups + centroids
//!             └─ layout::layout_sources(...)      [N, 3] coordinates
//!                  └─ renderer (external)
//! ```
//!
//! ## Quick start
//!
//! ```
//! use engram_core::{
//!     group_streams, hippocampal_streams, layout_sources, resolve,
//!     LayoutMode, LayoutParams,
//! };
//!
//! // 24 streams over the eight hippocampal octants, 4 sources each.
//! let streams = hippocampal_streams(24);
//! let index = resolve(&streams, &vec![4; 24]).unwrap();
//!
//! // Distinguish Side and Region only; Anterior/Posterior stay merged.
//! let groups = group_streams(&index, &[0, 1]).unwrap();
//! let xyz = layout_sources(&groups, index.n_levels(), &[0, 1],
//!                          LayoutMode::Flat, &LayoutParams::default()).unwrap();
//! assert_eq!(xyz.shape(), &[96, 3]);
//! ```

pub mod container;
pub mod error;
pub mod group;
pub mod hierarchy;
pub mod io;
pub mod layout;
pub mod synth;
pub mod trial;

// ── Crate-root re-exports ─────────────────────────────────────────────────

pub use container::{Container, ContainerData, ContainerKind, SessionMeta};
pub use error::CoreError;
pub use group::{group_streams, Group};
pub use hierarchy::{resolve, Stream, StreamIndex};
pub use io::{export_layout, export_trials};
pub use layout::{layout_sources, LayoutMode, LayoutParams};
pub use synth::{hippocampal_streams, sources_per_stream, spike_train};
pub use trial::{Duration, Trial};
