// Licensed under the Apache-2.0 license

//! Compiler configuration and the packed identity layout.
//!
//! [`CompilerConfig`] carries the naming conventions of the DSL and of the
//! hardware headers, where headers live, and the id limits. It can be
//! decoded from TOML (every key is optional) or built in code:
//!
//! ```
//! use registers_hal_compiler::config::{CompilerConfig, IdLimits};
//!
//! let config = CompilerConfig::with_defaults()
//!     .header_file("dev_therm.h")
//!     .limits(IdLimits { max_addresses: 1023, max_fields: 63, max_values: 63 });
//! assert_eq!(config.id_layout().unwrap().address_shift, 12);
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::error::{HalError, HalResult};
use crate::types::EntryKind;

/// Maximum sibling counts per entry kind.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IdLimits {
    pub max_addresses: u32,
    pub max_fields: u32,
    pub max_values: u32,
}

impl Default for IdLimits {
    fn default() -> Self {
        Self {
            max_addresses: 16383,
            max_fields: 255,
            max_values: 255,
        }
    }
}

impl IdLimits {
    pub fn max_for(&self, kind: EntryKind) -> u32 {
        match kind {
            EntryKind::Address => self.max_addresses,
            EntryKind::Field => self.max_fields,
            EntryKind::Value => self.max_values,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Required prefix of top-level DSL names.
    pub source_prefix: String,
    /// Replaces `source_prefix` in top-level public symbols.
    pub symbol_prefix: String,
    /// Names starting with this denote virtual registers.
    pub virtual_prefix: String,
    /// Required prefix of `-cap` names.
    pub cap_prefix: String,
    /// Roots under the drivers tree holding per-device header directories,
    /// primary first.
    pub search_roots: Vec<String>,
    /// Header files scanned per device, in override order.
    pub header_files: Vec<String>,
    pub limits: IdLimits,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl CompilerConfig {
    pub fn with_defaults() -> Self {
        Self {
            source_prefix: "LW_".to_string(),
            symbol_prefix: "LWHAL_".to_string(),
            virtual_prefix: "LW_VIRTUAL_".to_string(),
            cap_prefix: "LWHAL_CAP_".to_string(),
            search_roots: vec!["hw/inc".to_string(), "hw/inc/published".to_string()],
            header_files: [
                "dev_bus.h",
                "dev_fb.h",
                "dev_graphics.h",
                "dev_master.h",
                "dev_pri.h",
                "dev_disp.h",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            limits: IdLimits::default(),
        }
    }

    /// Reads a TOML configuration file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> HalResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| HalError::io(path, e))?;
        toml::from_str(&text).map_err(|source| HalError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Append a header file to the scan list.
    pub fn header_file(mut self, name: &str) -> Self {
        self.header_files.push(name.to_string());
        self
    }

    pub fn limits(mut self, limits: IdLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn id_layout(&self) -> HalResult<IdLayout> {
        IdLayout::from_limits(&self.limits)
    }
}

/// Bit positions of the parts of a packed id, low to high:
/// value, field, address, type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdLayout {
    pub value_bits: u32,
    pub field_bits: u32,
    pub address_bits: u32,
    pub field_shift: u32,
    pub address_shift: u32,
    pub type_shift: u32,
}

pub const TYPE_BITS: u32 = 2;

/// Number of bits needed to hold `max`.
fn bits_for(max: u32) -> u32 {
    u32::BITS - max.leading_zeros()
}

impl IdLayout {
    pub fn from_limits(limits: &IdLimits) -> HalResult<Self> {
        let value_bits = bits_for(limits.max_values);
        let field_bits = bits_for(limits.max_fields);
        let address_bits = bits_for(limits.max_addresses);
        let total = value_bits + field_bits + address_bits + TYPE_BITS;
        if total > 32 {
            return Err(HalError::IdLayoutTooWide(total));
        }
        Ok(Self {
            value_bits,
            field_bits,
            address_bits,
            field_shift: value_bits,
            address_shift: value_bits + field_bits,
            type_shift: value_bits + field_bits + address_bits,
        })
    }

    /// Packs `(type, address, field, value)` sequence ids into one id.
    pub fn pack(&self, kind: EntryKind, address: u32, field: u32, value: u32) -> u32 {
        (kind.type_tag() << self.type_shift)
            | (address << self.address_shift)
            | (field << self.field_shift)
            | value
    }

    pub fn value_mask(&self) -> u32 {
        (1 << self.value_bits) - 1
    }

    pub fn field_mask(&self) -> u32 {
        ((1 << self.field_bits) - 1) << self.field_shift
    }

    pub fn address_mask(&self) -> u32 {
        ((1 << self.address_bits) - 1) << self.address_shift
    }

    pub fn type_mask(&self) -> u32 {
        ((1 << TYPE_BITS) - 1) << self.type_shift
    }
}
