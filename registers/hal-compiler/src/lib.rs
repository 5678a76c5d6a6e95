// Licensed under the Apache-2.0 license

//! Register HAL definition compiler.
//!
//! Reads an indentation-structured register definition file, assigns
//! every address, field and value a stable packed id, and resolves the
//! entries against each device's hardware headers to generate lookup
//! tables and id headers.
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use registers_hal_compiler::{compile, CompileRequest};
//!
//! let request = CompileRequest::new(
//!     Path::new("lwhal/registers.def"),
//!     Path::new("lwhal/devices.toml"),
//!     Path::new("drivers"),
//!     Path::new("out/lwhal_table_gp102.c"),
//! )
//! .dependencies_file(Path::new("out/lwhal_table_gp102.d"));
//! compile(&request).unwrap();
//! ```
//!
//! ## Module Organization
//!
//! - [`parse`]: the definition file reader producing a [`Forest`]
//! - [`macros`]: per-device `#define` database and indirection walking
//! - [`resolve`]: entry to guarded hardware expression resolution
//! - [`output`]: the artifact emitters
//! - [`artifact`]: one end-to-end invocation ([`compile`])

pub mod artifact;
pub mod config;
pub mod device;
pub mod error;
pub mod macros;
pub mod output;
pub mod parse;
pub mod resolve;
pub mod types;
pub mod util;

pub use artifact::{compile, Artifact, CompileRequest};
pub use config::{CompilerConfig, IdLayout, IdLimits};
pub use device::{Device, DeviceList};
pub use error::{HalError, HalResult, ParseError, ParseErrorKind};
pub use macros::MacroDatabase;
pub use types::{Entry, EntryKind, Forest};
