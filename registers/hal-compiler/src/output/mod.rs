// Licensed under the Apache-2.0 license

//! Generated artifacts.
//!
//! Each emitter is a small struct borrowing the compiled forest and
//! rendering its artifact through [`std::fmt::Display`]:
//!
//! ```text
//! Forest ─┬─ IdentityHeader   → lwhal_{addr,field,value}_ids.h
//!         ├─ Bindings         → lwhal_bindings.py   (filtered by AllowList)
//!         └─ DeviceTable      → lwhal_table_<device>.c
//! MacroDatabase sources ───── DepsManifest → lwhal_table_<device>.d
//! ```

mod bindings;
mod deps;
mod identity;
mod table;

pub use bindings::{AllowList, Bindings};
pub use deps::DepsManifest;
pub use identity::IdentityHeader;
pub use table::{stub_table, DeviceTable, TableRow};

/// First line of every generated C artifact.
pub(crate) const C_BANNER: &str = "/* Generated by hal-gen. Do not edit. */";
