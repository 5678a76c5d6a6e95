// Licensed under the Apache-2.0 license

use std::fmt;
use std::path::{Path, PathBuf};

/// Makefile fragment listing the inputs a generated table was built from.
///
/// Every input also gets an empty rule so a deleted header does not break
/// the build that includes the fragment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepsManifest {
    target: PathBuf,
    inputs: Vec<PathBuf>,
}

impl DepsManifest {
    pub fn new(target: &Path, dsl: &Path, headers: &[PathBuf]) -> Self {
        let inputs = std::iter::once(dsl.to_path_buf())
            .chain(headers.iter().cloned())
            .collect();
        Self {
            target: target.to_path_buf(),
            inputs,
        }
    }

    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }
}

fn escape(path: &Path) -> String {
    path.display().to_string().replace(' ', "\\ ")
}

impl fmt::Display for DepsManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", escape(&self.target))?;
        for input in &self.inputs {
            write!(f, " \\\n  {}", escape(input))?;
        }
        writeln!(f)?;
        for input in &self.inputs {
            writeln!(f)?;
            writeln!(f, "{}:", escape(input))?;
        }
        Ok(())
    }
}
