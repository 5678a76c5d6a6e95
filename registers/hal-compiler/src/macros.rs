// Licensed under the Apache-2.0 license

//! Per-device database of `#define NAME VALUE` facts.
//!
//! Values are kept as text; nothing is evaluated. The only interpretation
//! is name resolution: a value that is itself a defined macro name is an
//! indirection, and `dereference` follows such chains.

use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::config::CompilerConfig;
use crate::device::Device;
use crate::error::{HalError, HalResult};

/// Longest indirection chain `dereference` will follow.
pub const MAX_CHAIN: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MacroDef {
    /// Everything after the name, as written.
    pub raw_value: String,
    /// `raw_value` without inline comments.
    pub value: String,
    /// Number of parameters of a function-like macro, 0 otherwise.
    pub dimensions: usize,
}

/// Outcome of a successful `dereference`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    /// Name of the last macro in the chain.
    pub name: String,
    pub def: MacroDef,
    /// Largest dimensionality seen anywhere along the chain.
    pub dimensions: usize,
}

#[derive(Clone, Debug, Default)]
pub struct MacroDatabase {
    defs: HashMap<String, MacroDef>,
    sources: Vec<PathBuf>,
}

impl MacroDatabase {
    /// Scans the configured headers for `device`.
    ///
    /// A header that cannot be found under any search path leaves the
    /// database empty: the device has no applicable registers.
    pub fn load(device: &Device, drivers_root: &Path, config: &CompilerConfig) -> HalResult<Self> {
        let mut db = MacroDatabase::default();
        for file in &config.header_files {
            let Some(path) = find_header(device, drivers_root, config, file) else {
                warn!(
                    "{}: header {} not found, no registers for this device",
                    device.name, file
                );
                return Ok(MacroDatabase::default());
            };
            debug!("{}: reading {}", device.name, path.display());
            let text = std::fs::read_to_string(&path).map_err(|e| HalError::io(&path, e))?;
            db.add_source(&text);
            db.sources.push(path);
        }
        Ok(db)
    }

    /// Adds the definitions found in `text`; later definitions win.
    pub fn add_source(&mut self, text: &str) {
        for line in text.lines() {
            if let Some((name, def)) = parse_define(line) {
                self.defs.insert(name, def);
            }
        }
    }

    /// Header files read while loading, in read order.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn get(&self, name: &str) -> Option<&MacroDef> {
        self.defs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    /// Resolves `name`, following indirections and consuming `suffixes`.
    ///
    /// At each step `current + suffixes[0]` is tried first; if it exists the
    /// suffix is consumed. Otherwise a value naming another macro redirects
    /// the walk. Resolution fails if the walk ends with suffixes left over.
    pub fn dereference(&self, name: &str, suffixes: &[&str]) -> HalResult<Option<Resolved>> {
        let mut current = name.to_string();
        let mut pending = suffixes;
        let mut dimensions = 0;
        let mut chain = vec![current.clone()];
        let mut seen: HashSet<String> = HashSet::from([current.clone()]);

        loop {
            if chain.len() > MAX_CHAIN {
                return Err(HalError::MacroCycle(chain));
            }
            if let Some((suffix, rest)) = pending.split_first() {
                let extended = format!("{current}{suffix}");
                if let Some(def) = self.defs.get(&extended) {
                    dimensions = dimensions.max(def.dimensions);
                    pending = rest;
                    current = extended;
                    chain.push(current.clone());
                    seen.insert(current.clone());
                    continue;
                }
            }
            let Some(def) = self.defs.get(&current) else {
                return Ok(None);
            };
            dimensions = dimensions.max(def.dimensions);
            if def.value != current && self.defs.contains_key(&def.value) {
                let next = def.value.clone();
                chain.push(next.clone());
                if !seen.insert(next.clone()) {
                    return Err(HalError::MacroCycle(chain));
                }
                current = next;
                continue;
            }
            if !pending.is_empty() {
                return Ok(None);
            }
            return Ok(Some(Resolved {
                name: current,
                def: def.clone(),
                dimensions,
            }));
        }
    }
}

fn find_header(
    device: &Device,
    drivers_root: &Path,
    config: &CompilerConfig,
    file: &str,
) -> Option<PathBuf> {
    let dirs = std::iter::once(&device.header_dir).chain(device.display_dir.as_ref());
    dirs.flat_map(|dir| {
        config
            .search_roots
            .iter()
            .map(move |root| drivers_root.join(root).join(dir).join(file))
    })
    .find(|path| path.is_file())
}

/// Parses one `#define NAME VALUE...` line.
///
/// The line is split into at most three whitespace separated tokens; a
/// function-like name whose parameter list contains spaces is rejoined
/// first.
pub fn parse_define(line: &str) -> Option<(String, MacroDef)> {
    let rest = line.trim_start().strip_prefix("#define")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();
    let (mut name, mut value) = rest.split_once(char::is_whitespace)?;
    if name.contains('(') && !name.contains(')') {
        let close = rest.find(')')?;
        name = &rest[..=close];
        value = &rest[close + 1..];
    }
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let (key, dimensions) = match name.split_once('(') {
        Some((key, params)) => (key, params.matches(',').count() + 1),
        None => (name, 0),
    };
    Some((
        key.to_string(),
        MacroDef {
            raw_value: value.to_string(),
            value: strip_c_comments(value),
            dimensions,
        },
    ))
}

fn strip_c_comments(value: &str) -> String {
    let mut out = String::new();
    let mut rest = value;
    loop {
        match (rest.find("/*"), rest.find("//")) {
            (Some(block), line) if line.map_or(true, |l| block < l) => {
                out.push_str(&rest[..block]);
                match rest[block + 2..].find("*/") {
                    Some(end) => rest = &rest[block + 2 + end + 2..],
                    None => break,
                }
            }
            (_, Some(line)) => {
                out.push_str(&rest[..line]);
                break;
            }
            (_, None) => {
                out.push_str(rest);
                break;
            }
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
