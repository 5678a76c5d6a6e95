// Licensed under the Apache-2.0 license

use std::fmt;

use super::C_BANNER;
use crate::config::IdLayout;
use crate::types::{EntryKind, Forest};
use crate::util::hex_id;

/// `#define` of every packed id of one entry kind, plus the layout
/// constants needed to take an id apart.
pub struct IdentityHeader<'a> {
    forest: &'a Forest,
    kind: EntryKind,
    layout: IdLayout,
}

impl<'a> IdentityHeader<'a> {
    pub fn new(forest: &'a Forest, kind: EntryKind, layout: IdLayout) -> Self {
        Self {
            forest,
            kind,
            layout,
        }
    }

    pub fn file_name(kind: EntryKind) -> &'static str {
        match kind {
            EntryKind::Address => "lwhal_addr_ids.h",
            EntryKind::Field => "lwhal_field_ids.h",
            EntryKind::Value => "lwhal_value_ids.h",
        }
    }

    fn include_guard(&self) -> String {
        Self::file_name(self.kind).replace('.', "_").to_uppercase()
    }

    fn write_layout(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout = &self.layout;
        let parts = [
            ("VALUE", 0, layout.value_mask()),
            ("FIELD", layout.field_shift, layout.field_mask()),
            ("ADDRESS", layout.address_shift, layout.address_mask()),
            ("TYPE", layout.type_shift, layout.type_mask()),
        ];
        writeln!(f, "#ifndef LWHAL_ID_LAYOUT")?;
        writeln!(f, "#define LWHAL_ID_LAYOUT")?;
        for (part, shift, mask) in parts {
            writeln!(f, "#define LWHAL_ID_{part}_SHIFT {shift}")?;
            writeln!(f, "#define LWHAL_ID_{part}_MASK {}", hex_id(mask))?;
        }
        for kind in [EntryKind::Address, EntryKind::Field, EntryKind::Value] {
            writeln!(
                f,
                "#define LWHAL_ID_TYPE_{} {}",
                kind.as_str().to_uppercase(),
                kind.type_tag()
            )?;
        }
        writeln!(f, "#endif")
    }
}

impl fmt::Display for IdentityHeader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.include_guard();
        writeln!(f, "{C_BANNER}")?;
        writeln!(f, "#ifndef {guard}")?;
        writeln!(f, "#define {guard}")?;
        writeln!(f)?;
        self.write_layout(f)?;
        writeln!(f)?;
        for entry in self.forest.entries().iter().filter(|e| e.kind == self.kind) {
            writeln!(f, "#define {} {}", entry.symbol, hex_id(entry.packed_id))?;
        }
        writeln!(f)?;
        writeln!(f, "#endif // {guard}")
    }
}
