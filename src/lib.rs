//! # locmerge
//!
//! A library for managing mobile-app localization resources: import
//! Android `strings.xml` or Apple `.strings` files into persistent
//! projects, reconcile refreshed source files and translation tables
//! against the current state into a reviewable comparison, and apply
//! the user's per-item decisions back onto the project.
//!
//! ## Quick start
//!
//! ```no_run
//! use locmerge::{MergeResolutions, Workspace};
//!
//! # fn main() -> Result<(), locmerge::Error> {
//! let mut workspace = Workspace::open("./projects")?;
//! workspace.create_project("My App")?;
//! let source = std::fs::read("strings.xml")?;
//! workspace.import_source_file("strings.xml", &source)?;
//!
//! // Later, a new version of the file arrives.
//! let updated = std::fs::read("strings-v2.xml")?;
//! if let Some(comparison) = workspace.start_source_update(&updated)? {
//!     let resolutions = MergeResolutions::accept_all(&comparison);
//!     workspace.apply_merge(&comparison, &resolutions)?;
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod classifier;
pub mod error;
pub mod formats;
pub mod merge;
pub mod reconcile;
pub mod store;
pub mod textdiff;
pub mod traits;
pub mod translate;
pub mod types;
pub mod workspace;

pub use classifier::{
    analyze_headers, classify_header, resolve_columns, ColumnResolution, ColumnResolutions,
    ColumnRole, HeaderAnalysis, ResolvedColumn,
};
pub use error::Error;
pub use merge::apply_merge;
pub use reconcile::{reconcile, ComparisonScope, ImportProfile};
pub use store::{ProjectStore, Snapshot, SNAPSHOT_VERSION};
pub use textdiff::{diff_strings, DiffSegment, SegmentKind, TextDiff};
pub use traits::Parser;
pub use translate::{TranslatedString, TranslationRequest};
pub use types::{
    ContextChange, MergeComparison, MergeResolutions, Platform, Project, RawRecord,
    RemovalResolution, ResourceStatus, StringResource, UpdateDiff, UpdateResolution, ValueChange,
    DEFAULT_LANG, NO_CONTEXT,
};
pub use workspace::{TranslationUpdate, Workspace};
