//! Ordered in-memory collections backed by a shareable copy-on-write B-tree.
//!
//! The engine of this crate is [`Tree`], a B-tree whose nodes are
//! reference-counted and cloned lazily on first mutation. Cloning a tree is
//! O(1); two clones share every subtree until one of them is edited, at which
//! point only the nodes on the edited path diverge. On top of the engine sit
//! two thin containers:
//!
//! - [`Map`], an ordered map with unique keys, and
//! - [`List`], a random-access sequence with logarithmic splice.
//!
//! The bulk set operations (`union`, `distinct_union`, `subtract`,
//! `exclusive_or`, `intersect`) exploit subtree sharing: combining two trees
//! that were cloned from a common ancestor, or whose key ranges barely
//! interleave, costs O(log n) instead of O(n).

mod errors;
mod list;
mod map;
pub mod tree;

pub use errors::ValidationError;
pub use list::{List, ListIter};
pub use map::{Keys, Map, Values};
pub use tree::{Cursor, Index, Iter, KeySelector, Tree};
