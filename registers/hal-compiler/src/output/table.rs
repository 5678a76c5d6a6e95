// Licensed under the Apache-2.0 license

use log::info;
use std::fmt;

use super::C_BANNER;
use crate::config::CompilerConfig;
use crate::device::Device;
use crate::error::HalResult;
use crate::macros::MacroDatabase;
use crate::resolve::{expand_variants, Alternative, ResolveStats, Resolver, TargetKey};
use crate::types::{Access, Forest};
use crate::util::hex_id;

const NO_CAPABILITY: &str = "LWHAL_CAP_NONE";

/// One table row before rendering: a target of one access variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableRow {
    pub id: u32,
    pub symbol: String,
    pub key: TargetKey,
    pub access: Access,
    pub capability: Option<String>,
    pub alternatives: Vec<Alternative>,
}

impl TableRow {
    fn index(&self) -> String {
        let join = |sentinel: Option<&str>, values: &[u32]| {
            let args: Vec<String> = sentinel
                .map(str::to_string)
                .into_iter()
                .chain(values.iter().map(u32::to_string))
                .collect();
            format!("LWHAL_INDEX({})", args.join(", "))
        };
        match &self.key {
            TargetKey::Index(tuple) => join(None, tuple),
            TargetKey::Size(ordinal) => join(Some("LWHAL_INDEX_SIZE"), &[*ordinal]),
            TargetKey::Priv(tuple) => join(Some("LWHAL_INDEX_PRIV"), tuple),
        }
    }

    fn write_row(&self, f: &mut fmt::Formatter<'_>, alternative: &Alternative) -> fmt::Result {
        writeln!(
            f,
            "    LWHAL_ROW({}, {}, LWHAL_DOMAIN_{}, {}, {}, {}, {}),",
            hex_id(self.id),
            self.index(),
            alternative.domain,
            self.access.c_name(),
            self.capability.as_deref().unwrap_or(NO_CAPABILITY),
            alternative.expr,
            alternative.offset.as_deref().unwrap_or("0"),
        )
    }
}

/// Alternatives render as one `#if`/`#elif` chain; an unguarded
/// alternative closes the chain as `#else`.
impl fmt::Display for TableRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chained = false;
        for alternative in &self.alternatives {
            match &alternative.guard {
                Some(guard) => {
                    let keyword = if chained { "#elif" } else { "#if" };
                    writeln!(f, "{keyword} {guard}")?;
                    chained = true;
                    self.write_row(f, alternative)?;
                }
                None => {
                    if chained {
                        writeln!(f, "#else")?;
                    }
                    self.write_row(f, alternative)?;
                    break;
                }
            }
        }
        if chained {
            writeln!(f, "#endif")?;
        }
        Ok(())
    }
}

/// The lookup table of one canonical device.
pub struct DeviceTable<'a> {
    device: &'a Device,
    /// The canonical device first, then every duplicate sharing the table.
    sharing: Vec<&'a Device>,
    rows: Vec<TableRow>,
}

impl<'a> DeviceTable<'a> {
    /// Resolves every entry of `forest` against `db`.
    pub fn build(
        forest: &Forest,
        config: &CompilerConfig,
        device: &'a Device,
        sharing: Vec<&'a Device>,
        db: &MacroDatabase,
        stats: &mut ResolveStats,
    ) -> HalResult<Self> {
        let resolver = Resolver::new(forest, device, db);
        let mut rows = Vec::new();
        for id in forest.ids() {
            for variant in expand_variants(forest, id, config) {
                let entry = variant.entry;
                for target in resolver.resolve(&variant, stats)? {
                    rows.push(TableRow {
                        id: entry.packed_id,
                        symbol: entry.symbol.clone(),
                        key: target.key,
                        access: variant.access,
                        capability: entry.capability.clone(),
                        alternatives: target.alternatives,
                    });
                }
            }
        }
        info!(
            "{}: {} rows from {} variants ({} without definition, {} privileged, {} probes)",
            device.name, stats.targets, stats.variants, stats.omitted, stats.priv_targets, stats.probes
        );
        Ok(Self {
            device,
            sharing,
            rows,
        })
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Guards of every device sharing the table. Empty when any of them is
    /// unguarded, since the table is then always compiled.
    fn table_guards(&self) -> Vec<&str> {
        let devices = if self.sharing.is_empty() {
            std::slice::from_ref(&self.device)
        } else {
            self.sharing.as_slice()
        };
        devices
            .iter()
            .map(|d| d.feature_guard.as_deref())
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default()
    }
}

/// Wraps `body` in `#if defined(A) || defined(B) ...`; no guards means no
/// wrapping.
fn write_guarded(
    f: &mut fmt::Formatter<'_>,
    guards: &[&str],
    body: impl FnOnce(&mut fmt::Formatter<'_>) -> fmt::Result,
) -> fmt::Result {
    if guards.is_empty() {
        return body(f);
    }
    let condition: Vec<String> = guards.iter().map(|g| format!("defined({g})")).collect();
    writeln!(f, "#if {}", condition.join(" || "))?;
    body(f)?;
    writeln!(f, "#endif // {}", guards.join(" || "))
}

impl fmt::Display for DeviceTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{C_BANNER}")?;
        writeln!(f, "/* Register table for {}. */", self.device.name)?;
        writeln!(f)?;
        write_guarded(f, &self.table_guards(), |f| {
            writeln!(f, "#include \"lwhal_table.h\"")?;
            writeln!(f)?;
            writeln!(f, "static const LWHAL_ROW_TYPE {}[] = {{", self.device.table_symbol())?;
            let mut last_symbol = None;
            for row in &self.rows {
                if last_symbol != Some(row.symbol.as_str()) {
                    writeln!(f, "    /* {} */", row.symbol)?;
                    last_symbol = Some(row.symbol.as_str());
                }
                write!(f, "{row}")?;
            }
            writeln!(f, "    LWHAL_ROW_END()")?;
            writeln!(f, "}};")?;
            writeln!(f)?;
            for device in &self.sharing {
                let guard: Vec<&str> = device.feature_guard.as_deref().into_iter().collect();
                write_guarded(f, &guard, |f| {
                    writeln!(
                        f,
                        "LWHAL_REGISTER_TABLE({}, {});",
                        device.name,
                        self.device.table_symbol()
                    )
                })?;
            }
            Ok(())
        })
    }
}

/// Placeholder source for a device that has no table of its own.
pub fn stub_table(device: &Device, reason: &str) -> String {
    format!(
        "{C_BANNER}\n/* No register table for {}: {reason}. */\n",
        device.name
    )
}
