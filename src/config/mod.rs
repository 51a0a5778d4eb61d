//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process arguments
//!     → args.rs (flags → command-line layer + explicitly supplied set)
//!     → loader.rs (read JSON file layer, or bootstrap it on first run)
//!     → merge: command line > file > built-in defaults
//!     → validation.rs (semantic checks)
//!     → ResolvedConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Each source is its own partial layer; merging is field by field
//! - Zero and empty values mean "not set" in every layer; an explicit empty
//!   or zero flag still hides the file value
//! - Header authentication is tri-state: untouched, set, or cleared

pub mod args;
pub mod loader;
pub mod schema;
pub mod validation;

pub use args::{parse as parse_args, ArgsError, CliArgs, ParsedArgs};
pub use loader::{resolve, Bootstrap, ConfigError, Resolution};
pub use schema::{PartialConfig, ResolvedConfig};
pub use validation::ValidationError;
