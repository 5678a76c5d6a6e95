// Licensed under the Apache-2.0 license

//! Resolution of entries against one device's macro database.
//!
//! For every entry the resolver enumerates the array index space and, for
//! each index tuple, lists the concrete hardware expressions that may
//! implement it together with the preprocessor guard selecting each one.
//! Names the device does not define are dropped silently: a register may
//! legitimately not exist on a given chip.

use log::debug;

use crate::config::CompilerConfig;
use crate::device::Device;
use crate::error::HalResult;
use crate::macros::{MacroDatabase, Resolved};
use crate::types::{Access, ArrayReplace, Candidate, Entry, EntryId, EntryKind, Forest, VirtualMirror};

/// Suffix naming the privilege-level mask register of an address.
pub const PRIV_SUFFIX: &str = "__PRIV_LEVEL_MASK";

/// Which row of the index space a target fills.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TargetKey {
    /// A concrete element.
    Index(Vec<u32>),
    /// Size of the n-th (1-based) suffix dimension.
    Size(u32),
    /// Privilege-level mask of an element.
    Priv(Vec<u32>),
}

/// One guarded way to implement a target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alternative {
    pub guard: Option<String>,
    pub expr: String,
    pub domain: String,
    /// Runtime offset added for strided arrays.
    pub offset: Option<String>,
}

/// Mutually exclusive alternatives, in priority order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedTarget {
    pub key: TargetKey,
    pub alternatives: Vec<Alternative>,
}

/// Counters gathered across one table generation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub variants: usize,
    pub omitted: usize,
    pub targets: usize,
    pub alternatives: usize,
    pub priv_targets: usize,
    pub probes: usize,
}

impl ResolveStats {
    fn record(&mut self, targets: &[IndexedTarget]) {
        self.variants += 1;
        if targets.is_empty() {
            self.omitted += 1;
        }
        self.targets += targets.len();
        self.alternatives += targets.iter().map(|t| t.alternatives.len()).sum::<usize>();
        self.priv_targets += targets
            .iter()
            .filter(|t| matches!(t.key, TargetKey::Priv(_)))
            .count();
    }
}

/// An entry as emitted into a table: the entry, the environment it
/// applies to, and the names it resolves through there.
#[derive(Clone, Debug)]
pub struct Variant<'a> {
    pub id: EntryId,
    pub entry: &'a Entry,
    pub access: Access,
    pub candidates: Vec<Candidate>,
}

/// Splits an entry into physical and virtual variants when its address
/// has a virtual mirror or is itself virtual; otherwise returns the entry
/// unchanged.
pub fn expand_variants<'a>(
    forest: &'a Forest,
    id: EntryId,
    config: &CompilerConfig,
) -> Vec<Variant<'a>> {
    let entry = forest.get(id);
    let address = forest.address_of(id);
    let mirror = address.virtual_mirror.clone().or_else(|| {
        address
            .name
            .starts_with(config.virtual_prefix.as_str())
            .then(|| VirtualMirror {
                from: config.virtual_prefix.clone(),
                to: config.virtual_prefix.clone(),
            })
    });
    let Some(mirror) = mirror else {
        return vec![Variant {
            id,
            entry,
            access: entry.access,
            candidates: entry.candidates.clone(),
        }];
    };

    let mut variants = vec![Variant {
        id,
        entry,
        access: Access::PhysicalOnly,
        candidates: entry.candidates.clone(),
    }];
    let virtual_names: Vec<Candidate> = entry
        .candidates
        .iter()
        .filter_map(|c| mirror.mirror(&c.name).map(|name| Candidate::new(name, c.domain.as_str())))
        .collect();
    if !virtual_names.is_empty() {
        variants.push(Variant {
            id,
            entry,
            access: Access::VirtualOnly,
            candidates: virtual_names,
        });
    }
    variants
}

/// All index tuples of the given limits, last dimension fastest.
pub fn index_tuples(limits: &[u32]) -> Vec<Vec<u32>> {
    limits.iter().fold(vec![Vec::new()], |tuples, &limit| {
        tuples
            .iter()
            .flat_map(|prefix| {
                (0..limit).map(move |i| {
                    let mut tuple = prefix.clone();
                    tuple.push(i);
                    tuple
                })
            })
            .collect()
    })
}

/// A candidate name specialized for one index tuple.
struct Indexed {
    name: String,
    offset: Option<String>,
    /// Indices of dimensions without a substitution rule, passed as macro
    /// arguments.
    suffix: Vec<u32>,
}

pub struct Resolver<'a> {
    forest: &'a Forest,
    device: &'a Device,
    db: &'a MacroDatabase,
}

impl<'a> Resolver<'a> {
    pub fn new(forest: &'a Forest, device: &'a Device, db: &'a MacroDatabase) -> Self {
        Self { forest, device, db }
    }

    /// Resolves one variant into its guarded targets.
    pub fn resolve(
        &self,
        variant: &Variant,
        stats: &mut ResolveStats,
    ) -> HalResult<Vec<IndexedTarget>> {
        let entry = variant.entry;
        let address = self.forest.address_of(variant.id);
        let names: Vec<Candidate> = variant
            .candidates
            .iter()
            .map(|c| Candidate::new(self.device_name(address, entry, &c.name), c.domain.as_str()))
            .collect();

        let mut targets = Vec::new();

        let suffix_dims = entry
            .dims
            .iter()
            .filter(|d| d.replace == ArrayReplace::Suffix)
            .count();
        let first = vec![0; entry.dims.len()];
        for ordinal in 1..=suffix_dims {
            let alternatives = names
                .iter()
                .filter_map(|c| {
                    let base = apply_index(entry, &c.name, &first).name;
                    let size = format!("{base}__SIZE_{ordinal}");
                    self.db.contains(&size).then(|| Alternative {
                        guard: Some(format!("defined({size})")),
                        expr: size,
                        domain: c.domain.clone(),
                        offset: None,
                    })
                })
                .collect::<Vec<_>>();
            push_target(&mut targets, TargetKey::Size(ordinal as u32), alternatives);
        }

        let limits: Vec<u32> = entry.dims.iter().map(|d| d.limit).collect();
        for tuple in index_tuples(&limits) {
            let mut privileged = Vec::new();
            let mut normal = Vec::new();
            for (i, candidate) in names.iter().enumerate() {
                let indexed = apply_index(entry, &candidate.name, &tuple);
                if entry.kind == EntryKind::Address {
                    stats.probes += 1;
                    if let Some(mask) = self.db.dereference(&indexed.name, &[PRIV_SUFFIX])? {
                        privileged.push(priv_alternative(&mask, &indexed, &candidate.domain));
                    }
                }
                stats.probes += 1;
                let Some(resolved) = self.db.dereference(&indexed.name, &[])? else {
                    continue;
                };
                let mut suffix = indexed.suffix.clone();
                if i > 0 && resolved.dimensions > suffix.len() {
                    suffix.resize(resolved.dimensions, 0);
                }
                normal.extend(element_alternatives(
                    entry.kind,
                    &indexed.name,
                    &suffix,
                    &candidate.domain,
                    &indexed.offset,
                ));
            }
            push_target(&mut targets, TargetKey::Priv(tuple.clone()), privileged);
            push_target(&mut targets, TargetKey::Index(tuple), normal);
        }

        if targets.is_empty() {
            debug!(
                "{}: {} ({:?}) has no definition",
                self.device.name, entry.symbol, variant.access
            );
        }
        stats.record(&targets);
        Ok(targets)
    }

    /// Applies the address's device templates and, below the address, its
    /// literal array substitutions for the first instance.
    fn device_name(&self, address: &Entry, entry: &Entry, name: &str) -> String {
        let mut name = address
            .templates
            .iter()
            .fold(name.to_string(), |name, t| t.apply(&name, &self.device.name));
        if entry.kind != EntryKind::Address {
            for dim in &address.dims {
                if let ArrayReplace::Substitute { old, new } = &dim.replace {
                    name = name.replace(old.as_str(), &new.replace("%d", "0"));
                }
            }
        }
        name
    }
}

fn push_target(targets: &mut Vec<IndexedTarget>, key: TargetKey, alternatives: Vec<Alternative>) {
    if !alternatives.is_empty() {
        targets.push(IndexedTarget { key, alternatives });
    }
}

fn apply_index(entry: &Entry, name: &str, tuple: &[u32]) -> Indexed {
    let mut indexed = Indexed {
        name: name.to_string(),
        offset: None,
        suffix: Vec::new(),
    };
    let mut strides = Vec::new();
    for (dim, &i) in entry.dims.iter().zip(tuple) {
        match &dim.replace {
            ArrayReplace::Suffix => indexed.suffix.push(i),
            ArrayReplace::Substitute { old, new } => {
                indexed.name = indexed
                    .name
                    .replace(old.as_str(), &new.replace("%d", &i.to_string()));
            }
            ArrayReplace::Stride { stride_symbol, .. } => {
                strides.push(format!("{i} * LWHAL_STRIDE({stride_symbol})"));
            }
        }
    }
    if !strides.is_empty() {
        indexed.offset = Some(strides.join(" + "));
    }
    indexed
}

fn call(name: &str, indices: &[u32]) -> String {
    let args: Vec<String> = indices.iter().map(u32::to_string).collect();
    format!("{name}({})", args.join(", "))
}

fn wrap(kind: EntryKind, expr: String) -> String {
    match kind {
        EntryKind::Field => format!("LWHAL_FIELD({expr})"),
        _ => expr,
    }
}

/// Bare-name and indexed alternatives for one element, bare first. Value
/// macros are never arrays, so an unindexed value only has its bare name.
fn element_alternatives(
    kind: EntryKind,
    name: &str,
    suffix: &[u32],
    domain: &str,
    offset: &Option<String>,
) -> Vec<Alternative> {
    let alternative = |guard: String, expr: String| Alternative {
        guard: Some(guard),
        expr: wrap(kind, expr),
        domain: domain.to_string(),
        offset: offset.clone(),
    };
    if suffix.is_empty() && kind == EntryKind::Value {
        vec![alternative(format!("defined({name})"), name.to_string())]
    } else if suffix.is_empty() {
        vec![
            alternative(
                format!("defined({name}) && !defined({name}__SIZE_1)"),
                name.to_string(),
            ),
            alternative(format!("defined({name})"), call(name, &[0])),
        ]
    } else {
        vec![alternative(
            format!("defined({name}) && defined({name}__SIZE_1)"),
            call(name, suffix),
        )]
    }
}

fn priv_alternative(mask: &Resolved, indexed: &Indexed, domain: &str) -> Alternative {
    let expr = if mask.dimensions == 0 {
        mask.name.clone()
    } else {
        let mut indices = indexed.suffix.clone();
        indices.resize(mask.dimensions, 0);
        call(&mask.name, &indices)
    };
    Alternative {
        guard: Some(format!("defined({})", mask.name)),
        expr,
        domain: domain.to_string(),
        offset: indexed.offset.clone(),
    }
}
