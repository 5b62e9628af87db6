use thiserror::Error;

/// Structural defects reported by the tree validator.
///
/// These only ever surface from the explicit validation entry points; the
/// regular operations keep the invariants by construction and report absence
/// through `Option` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("keys out of order at depth {depth}")]
    KeyOrder { depth: usize },
    #[error("cached element count {cached} differs from computed count {actual}")]
    CountMismatch { cached: usize, actual: usize },
    #[error("cached depth {cached} differs from child depth {actual}")]
    DepthMismatch { cached: usize, actual: usize },
    #[error("node holds {len} keys, outside the {min}..={max} bound")]
    KeyBounds { len: usize, min: usize, max: usize },
    #[error("{values} payloads for {keys} keys")]
    ArityMismatch { keys: usize, values: usize },
    #[error("{children} children for {keys} keys")]
    FanoutMismatch { keys: usize, children: usize },
    #[error("node order {found} differs from tree order {expected}")]
    OrderMismatch { expected: usize, found: usize },
    #[error("separator at slot {slot} does not bound the adjacent subtrees")]
    SeparatorBound { slot: usize },
}
