// Licensed under the Apache-2.0 license

//! One compiler invocation: parse the definitions, generate the artifact
//! named by the destination path, write it.

use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::config::CompilerConfig;
use crate::device::{DeviceList, TABLE_FILE_PREFIX};
use crate::error::{HalError, HalResult};
use crate::macros::MacroDatabase;
use crate::output::{stub_table, AllowList, Bindings, DepsManifest, DeviceTable, IdentityHeader};
use crate::parse::parse;
use crate::resolve::ResolveStats;
use crate::types::{EntryKind, Forest};

/// Allow-list looked up next to the definitions file when none is given.
pub const DEFAULT_ALLOW_LIST: &str = "allowlist.txt";

/// The kind of output, decided by the destination file name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Artifact {
    Ids(EntryKind),
    Bindings,
    /// Table source of the named device.
    Table(String),
    /// Dependency manifest of the named device's table.
    Deps(String),
}

impl Artifact {
    pub fn from_path(dest: &Path) -> HalResult<Self> {
        let name = dest
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| HalError::UnknownArtifact(dest.display().to_string()))?;
        for kind in [EntryKind::Address, EntryKind::Field, EntryKind::Value] {
            if name == IdentityHeader::file_name(kind) {
                return Ok(Artifact::Ids(kind));
            }
        }
        if name == Bindings::FILE_NAME {
            return Ok(Artifact::Bindings);
        }
        if let Some(rest) = name.strip_prefix(TABLE_FILE_PREFIX) {
            if let Some(device) = rest.strip_suffix(".c").filter(|d| !d.is_empty()) {
                return Ok(Artifact::Table(device.to_string()));
            }
            if let Some(device) = rest.strip_suffix(".d").filter(|d| !d.is_empty()) {
                return Ok(Artifact::Deps(device.to_string()));
            }
        }
        Err(HalError::UnknownArtifact(name.to_string()))
    }
}

/// Inputs of one invocation.
#[derive(Clone, Debug)]
pub struct CompileRequest {
    pub dsl: PathBuf,
    pub devices: PathBuf,
    pub drivers_root: PathBuf,
    pub dest: PathBuf,
    /// Extra dependency manifest written next to a table.
    pub dependencies_file: Option<PathBuf>,
    pub allow_list: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

impl CompileRequest {
    pub fn new(dsl: &Path, devices: &Path, drivers_root: &Path, dest: &Path) -> Self {
        Self {
            dsl: dsl.to_path_buf(),
            devices: devices.to_path_buf(),
            drivers_root: drivers_root.to_path_buf(),
            dest: dest.to_path_buf(),
            dependencies_file: None,
            allow_list: None,
            config: None,
        }
    }

    pub fn dependencies_file(mut self, path: &Path) -> Self {
        self.dependencies_file = Some(path.to_path_buf());
        self
    }

    pub fn allow_list(mut self, path: &Path) -> Self {
        self.allow_list = Some(path.to_path_buf());
        self
    }

    pub fn config(mut self, path: &Path) -> Self {
        self.config = Some(path.to_path_buf());
        self
    }

    fn allow_list_path(&self) -> PathBuf {
        self.allow_list
            .clone()
            .unwrap_or_else(|| self.dsl.with_file_name(DEFAULT_ALLOW_LIST))
    }
}

/// Runs one invocation. Nothing is written unless every step succeeded.
pub fn compile(request: &CompileRequest) -> HalResult<()> {
    if !request.drivers_root.is_dir() {
        return Err(HalError::MissingDriversRoot(request.drivers_root.clone()));
    }
    let artifact = Artifact::from_path(&request.dest)?;
    let config = match &request.config {
        Some(path) => CompilerConfig::from_file(path)?,
        None => CompilerConfig::with_defaults(),
    };
    let layout = config.id_layout()?;

    let text = std::fs::read_to_string(&request.dsl).map_err(|e| HalError::io(&request.dsl, e))?;
    let forest = parse(&text, &config, layout).map_err(|error| HalError::Parse {
        path: request.dsl.clone(),
        error,
    })?;
    info!("{}: {} entries", request.dsl.display(), forest.len());

    let outputs = match &artifact {
        Artifact::Ids(kind) => {
            let header = IdentityHeader::new(&forest, *kind, layout);
            vec![(request.dest.clone(), header.to_string())]
        }
        Artifact::Bindings => {
            let allow = AllowList::from_file(&request.allow_list_path())?;
            for pattern in allow.unmatched(&forest) {
                debug!("allow-list entry {pattern} matches no symbol");
            }
            let bindings = Bindings::new(&forest, &allow, &config.symbol_prefix);
            vec![(request.dest.clone(), bindings.to_string())]
        }
        Artifact::Table(device) => table_outputs(request, &config, &forest, device)?,
        Artifact::Deps(device) => {
            let devices = DeviceList::from_file(&request.devices)?;
            let index = devices
                .find(device)
                .ok_or_else(|| HalError::UnknownDevice(device.clone()))?;
            let device = devices.get(index);
            let db = MacroDatabase::load(device, &request.drivers_root, &config)?;
            let table = request.dest.with_file_name(device.table_file_name());
            let deps = DepsManifest::new(&table, &request.dsl, db.sources());
            vec![(request.dest.clone(), deps.to_string())]
        }
    };

    for (path, contents) in outputs {
        write_output(&path, &contents)?;
    }
    Ok(())
}

fn table_outputs(
    request: &CompileRequest,
    config: &CompilerConfig,
    forest: &Forest,
    name: &str,
) -> HalResult<Vec<(PathBuf, String)>> {
    let devices = DeviceList::from_file(&request.devices)?;
    let index = devices
        .find(name)
        .ok_or_else(|| HalError::UnknownDevice(name.to_string()))?;
    let device = devices.get(index);
    let db = MacroDatabase::load(device, &request.drivers_root, config)?;

    let source = if devices.is_duplicate(index) {
        let canonical = devices.canonical_of(index);
        info!("{}: shares the table of {}", device.name, canonical.name);
        stub_table(device, &format!("shares the table of {}", canonical.name))
    } else if db.is_empty() {
        stub_table(device, "no register headers")
    } else {
        let mut stats = ResolveStats::default();
        let table = DeviceTable::build(
            forest,
            config,
            device,
            devices.sharing_table(index),
            &db,
            &mut stats,
        )?;
        table.to_string()
    };

    let mut outputs = vec![(request.dest.clone(), source)];
    if let Some(path) = &request.dependencies_file {
        let deps = DepsManifest::new(&request.dest, &request.dsl, db.sources());
        outputs.push((path.clone(), deps.to_string()));
    }
    Ok(outputs)
}

fn write_output(path: &Path, contents: &str) -> HalResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| HalError::io(parent, e))?;
    }
    std::fs::write(path, contents).map_err(|e| HalError::io(path, e))?;
    info!("wrote {}", path.display());
    Ok(())
}
