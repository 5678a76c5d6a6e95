// Licensed under the Apache-2.0 license

//! Hardware variants and the devices manifest.

use serde::Deserialize;
use std::path::Path;

use crate::error::{HalError, HalResult};

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Device {
    pub name: String,
    /// Header directory, relative to each search root.
    pub header_dir: String,
    /// Secondary header directory searched for display-only chips.
    #[serde(default)]
    pub display_dir: Option<String>,
    /// Preprocessor symbol that must be defined for this device's table
    /// to be compiled.
    #[serde(default)]
    pub feature_guard: Option<String>,
}

impl Device {
    pub fn new(name: &str, header_dir: &str) -> Self {
        Self {
            name: name.to_string(),
            header_dir: header_dir.to_string(),
            display_dir: None,
            feature_guard: None,
        }
    }

    /// Basename of the generated table source.
    pub fn table_file_name(&self) -> String {
        format!("{TABLE_FILE_PREFIX}{}.c", self.name)
    }

    /// C identifier of this device's table array.
    pub fn table_symbol(&self) -> String {
        format!("lwhalTable_{}", self.name)
    }

    fn shares_headers_with(&self, other: &Device) -> bool {
        self.header_dir == other.header_dir && self.display_dir == other.display_dir
    }
}

pub const TABLE_FILE_PREFIX: &str = "lwhal_table_";

#[derive(Debug, Default, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    device: Vec<Device>,
}

/// The ordered device list, as produced by the device-list scanners.
#[derive(Clone, Debug, Default)]
pub struct DeviceList {
    devices: Vec<Device>,
    /// For each device, the index of the first device with identical
    /// header directories (itself when it is canonical).
    canonical: Vec<usize>,
}

impl DeviceList {
    pub fn new(devices: Vec<Device>) -> Self {
        let canonical = canonicalize(&devices);
        Self { devices, canonical }
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        let manifest: ManifestFile = toml::from_str(text)?;
        Ok(Self::new(manifest.device))
    }

    pub fn from_file(path: &Path) -> HalResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| HalError::io(path, e))?;
        Self::from_toml(&text).map_err(|source| HalError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.devices.iter().position(|d| d.name == name)
    }

    pub fn get(&self, index: usize) -> &Device {
        &self.devices[index]
    }

    /// The device whose generated table `index` reuses.
    pub fn canonical_of(&self, index: usize) -> &Device {
        &self.devices[self.canonical[index]]
    }

    pub fn is_duplicate(&self, index: usize) -> bool {
        self.canonical[index] != index
    }

    /// The canonical device followed by every duplicate sharing its table.
    pub fn sharing_table(&self, index: usize) -> Vec<&Device> {
        let canonical = self.canonical[index];
        self.canonical
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == canonical)
            .map(|(i, _)| &self.devices[i])
            .collect()
    }
}

/// Maps every device to the first earlier device with the same header
/// directories.
pub fn canonicalize(devices: &[Device]) -> Vec<usize> {
    devices
        .iter()
        .enumerate()
        .map(|(i, device)| {
            devices[..i]
                .iter()
                .position(|earlier| earlier.shares_headers_with(device))
                .unwrap_or(i)
        })
        .collect()
}
