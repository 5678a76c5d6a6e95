// Licensed under the Apache-2.0 license

//! The parsed, device-independent entry forest.
//!
//! Entries live in an arena owned by [`Forest`] and refer to each other by
//! [`EntryId`]. The arena is filled in DSL order, so iterating it is a
//! pre-order walk of the tree. Nothing mutates the forest once the parser
//! has returned it.

pub type EntryId = usize;

/// Domain tag given to candidates that never saw a `-domain` directive.
pub const DEFAULT_DOMAIN: &str = "RAW";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryKind {
    Address,
    Field,
    Value,
}

impl EntryKind {
    pub fn from_level(level: usize) -> Option<Self> {
        match level {
            0 => Some(EntryKind::Address),
            1 => Some(EntryKind::Field),
            2 => Some(EntryKind::Value),
            _ => None,
        }
    }

    pub fn level(self) -> usize {
        match self {
            EntryKind::Address => 0,
            EntryKind::Field => 1,
            EntryKind::Value => 2,
        }
    }

    pub fn type_tag(self) -> u32 {
        self.level() as u32 + 1
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Address => "address",
            EntryKind::Field => "field",
            EntryKind::Value => "value",
        }
    }
}

/// One hardware name an entry may resolve to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub domain: String,
}

impl Candidate {
    pub fn new(name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
        }
    }
}

/// How an array dimension turns an index into a hardware name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArrayReplace {
    /// The index is passed to a function-like macro: `NAME(i)`.
    Suffix,
    /// `old` is replaced by `new`, with `%d` in `new` formatted as the index.
    Substitute { old: String, new: String },
    /// The name is kept; the index scales the stride register at runtime.
    Stride { old: String, stride_symbol: String },
}

impl ArrayReplace {
    /// The substring this rule expects to find in a candidate name.
    pub fn target(&self) -> Option<&str> {
        match self {
            ArrayReplace::Suffix => None,
            ArrayReplace::Substitute { old, .. } | ArrayReplace::Stride { old, .. } => Some(old),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayDim {
    pub limit: u32,
    pub replace: ArrayReplace,
}

impl ArrayDim {
    pub fn suffix(limit: u32) -> Self {
        Self {
            limit,
            replace: ArrayReplace::Suffix,
        }
    }
}

/// A `-replace_string` rule. `new` may reference the target device as
/// `{DEVICE}` (upper case) or `{device}` (lower case).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    pub old: String,
    pub new: String,
}

impl Template {
    pub fn apply(&self, name: &str, device: &str) -> String {
        let new = self
            .new
            .replace("{DEVICE}", &device.to_uppercase())
            .replace("{device}", &device.to_lowercase());
        name.replace(&self.old, &new)
    }
}

/// Prefix rewrite producing the virtual name of a register.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VirtualMirror {
    pub from: String,
    pub to: String,
}

impl VirtualMirror {
    pub fn mirror(&self, name: &str) -> Option<String> {
        name.strip_prefix(self.from.as_str())
            .map(|rest| format!("{}{}", self.to, rest))
    }
}

/// Which execution environment a row applies to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Access {
    #[default]
    Any,
    PhysicalOnly,
    VirtualOnly,
}

impl Access {
    pub fn c_name(self) -> &'static str {
        match self {
            Access::Any => "LWHAL_ACCESS_ANY",
            Access::PhysicalOnly => "LWHAL_ACCESS_PHYSICAL",
            Access::VirtualOnly => "LWHAL_ACCESS_VIRTUAL",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Entry {
    /// Short source-local name, unique among siblings.
    pub name: String,
    pub kind: EntryKind,
    /// Globally unique public symbol.
    pub symbol: String,
    pub candidates: Vec<Candidate>,
    pub sequence_id: u32,
    pub packed_id: u32,
    pub dims: Vec<ArrayDim>,
    pub templates: Vec<Template>,
    pub virtual_mirror: Option<VirtualMirror>,
    pub capability: Option<String>,
    pub domain: Option<String>,
    pub access: Access,
    pub parent: Option<EntryId>,
    pub children: Vec<EntryId>,
    /// 1-based DSL line the entry was declared on.
    pub line: usize,
}

impl Entry {
    pub fn domain(&self) -> &str {
        self.domain.as_deref().unwrap_or(DEFAULT_DOMAIN)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Forest {
    entries: Vec<Entry>,
    roots: Vec<EntryId>,
}

impl Forest {
    pub(crate) fn push(&mut self, entry: Entry) -> EntryId {
        let id = self.entries.len();
        match entry.parent {
            Some(parent) => self.entries[parent].children.push(id),
            None => self.roots.push(id),
        }
        self.entries.push(entry);
        id
    }

    pub(crate) fn get_mut(&mut self, id: EntryId) -> &mut Entry {
        &mut self.entries[id]
    }

    pub fn get(&self, id: EntryId) -> &Entry {
        &self.entries[id]
    }

    /// All entries in DSL order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn roots(&self) -> &[EntryId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntryId> {
        0..self.entries.len()
    }

    /// The address entry at the top of `id`'s chain (possibly `id` itself).
    pub fn address_of(&self, id: EntryId) -> &Entry {
        let mut entry = &self.entries[id];
        while let Some(parent) = entry.parent {
            entry = &self.entries[parent];
        }
        entry
    }
}
