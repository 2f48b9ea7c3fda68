//! External sorting
//!
//! Three strategies share the cursor contract:
//!
//! - `MergeSorter`: bounded memory, spill runs, k-way merge
//! - `TreeSorter`: insertion into a temporary ordered store read back by a
//!   `MixedOrderCursor`
//! - `LimitedSorter`: top-N with a bounded in-memory buffer
//!
//! All of them key rows with `SortKeyBuilder` and order keys with
//! `KeyComparator`.

mod compare;
mod input;
mod key;
mod limited;
mod merge;
mod merge_sorter;
mod policy;
mod spill;
mod temp;
mod tree_sorter;

pub use compare::KeyComparator;
pub use input::drain_input;
pub use key::{SortKey, SortKeyBuilder};
pub use limited::LimitedSorter;
pub use merge::{KWayMerge, RunSource};
pub use merge_sorter::MergeSorter;
pub use policy::DuplicatePolicy;
pub use spill::{RunReader, RunWriter, SpillRun};
pub use temp::{DirTempFileProvider, SequenceGenerator, TempFileProvider};
pub use tree_sorter::TreeSorter;
