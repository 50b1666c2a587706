//! Column type registry and default value resolution for Depot sheets.
//!
//! `depot-columns` owns the descriptors of every column type a Depot sheet can
//! hold (int, float, date, enum, references, grids, ...) and the one piece of
//! behavior attached to them: computing the value a new column starts with.
//!
//! # Architecture
//!
//! - **Schema-only**: descriptors and defaults, never sheet contents
//! - **Immutable registry**: `ColumnRegistry::global()` is built once; hosts that
//!   customize types build their own registry through `ColumnRegistry::builder()`
//! - **Pure resolver**: `resolve_default()` never fails and never returns a value
//!   that shares state with the descriptor it came from

pub mod config;
pub mod consistency;
pub mod defaults;
pub mod editor;
pub mod error;
pub mod registry;
pub mod resolve;
pub mod types;

pub use config::RegistryConfig;
pub use consistency::{check_column, check_registry, check_sheet, ConsistencyIssue, IssueKind};
pub use defaults::{
    builtin_defaults, builtin_defaults_at, builtin_sheet, ColumnDefaults, DEFAULT_COLUMN_WIDTH,
};
pub use editor::{ConfigEntry, Configurable, Editor, EditorKind, EditorSettings};
pub use error::{DepotError, Result};
pub use registry::{ColumnRegistry, RegistryBuilder};
pub use resolve::{resolve_default, resolve_default_at, start_of_day, start_of_today};
pub use types::{ColumnDef, ColumnType, DisplayType, SheetDef, TypeTag, ValueShape};
