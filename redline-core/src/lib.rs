//! Diff reconciliation engine for reviewing automated edits block by block.
//!
//! Data flows one way: [`diff`] aligns the two texts and groups changes into
//! summary hunks, [`segment`] re-expresses the alignment as a full-file list
//! of context runs and change blocks, [`decision`] tracks which blocks are
//! accepted or rejected, and [`reconstruct`] derives file content from the
//! segments and decisions. [`store`] persists decisions locally and [`sync`]
//! mirrors the live content to a [`remote`] store. [`session`] ties one file's
//! worth of all of this together.

pub mod db;
pub mod decision;
pub mod diff;
pub mod error;
pub mod reconstruct;
pub mod remote;
pub mod schema;
pub mod segment;
pub mod session;
pub mod store;
pub mod sync;
pub mod types;

pub use decision::{Action, Decision, DecisionState};
pub use diff::{compute_diff_hunks, split_lines, DEFAULT_CONTEXT_LINES};
pub use error::{Error, RemoteError, StoreError};
pub use reconstruct::{reconstruct, Mode, NoPlaceholders, PlaceholderResolver};
pub use remote::{FetchedFile, LoadState, RemoteStore, RetryPolicy};
pub use segment::compute_full_file_segments;
pub use session::ReviewSession;
pub use store::{DecisionKey, DecisionStore, KeyValueStore, KvWrite, MemoryKv, SqliteKv};
pub use sync::{SyncController, SyncEvent};
pub use types::{ChangeBlock, DiffSummary, Hunk, Line, LineKind, Segment};
