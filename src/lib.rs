//! exrange - text ranges over editable surfaces, with an ex line editor
//!
//! A [`TextRange`] is a `[start, end)` view over a [`Document`], whichever
//! kind of surface backs it. Edits go through one pipeline that keeps live
//! ranges, undo history and observers in step; [`Session::ex`] runs ex
//! command lines against a range.

pub mod bounds;
pub mod cli;
pub mod config;
pub mod config_paths;
pub mod diff;
pub mod document;
pub mod error;
pub mod ex;
pub mod history;
pub mod hooks;
pub mod host;
pub mod live;
pub mod range;
pub mod search;
pub mod session;
pub mod surface;
pub mod tracing;
pub mod util;

// Re-export commonly used types
pub use bounds::{Bounds, BoundsArg, BoundsRegistry, Separator};
pub use config::Config;
pub use diff::{diff, TextChange};
pub use document::{ChangePhase, Document, DocumentRef};
pub use error::{Cancelled, ExError, RangeError, SearchError};
pub use history::EditKind;
pub use host::{Host, Persistence, Prompt};
pub use range::TextRange;
pub use session::{ExStatus, Session, Substitution};
