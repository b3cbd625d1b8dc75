//! Crate-wide error type.
//!
//! Everything the core can reject is a [`CoreError`]; recoverable
//! conditions (window clamping) are logged by the extractor instead of
//! returned. Application-edge code (the demo binary, safetensors export)
//! wraps these in `anyhow` as usual.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A grouping method referenced a hierarchy level the session does not have.
    #[error("hierarchy level {level} out of range (session has {n_levels} levels)")]
    InvalidHierarchyLevel { level: usize, n_levels: usize },

    /// Trial extraction was requested but no container had time labels.
    #[error("no windowable containers in duration")]
    EmptyContainerSet,

    /// Grouping produced no groups (only possible with zero included streams).
    #[error("grouping produced no groups: no streams with a complete hierarchy")]
    DegenerateGroup,

    /// An event window fell partly outside a container's time range.
    ///
    /// Never returned by extraction — the window is clamped and this is
    /// formatted into the warning log instead.
    #[error("event window [{lo:.3}, {hi:.3}] s outside container time range [{t_min:.3}, {t_max:.3}] s")]
    TimeLabelOutOfRange { lo: f64, hi: f64, t_min: f64, t_max: f64 },

    /// Event name not present in the duration's event map.
    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    /// Mismatched array shapes or otherwise malformed input; a contract
    /// violation on the caller's side.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
}
