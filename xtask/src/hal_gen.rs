// Licensed under the Apache-2.0 license

//! Generate one register HAL artifact from the definition file.

use anyhow::{bail, Context, Result};
use registers_hal_compiler::{compile, Artifact, CompileRequest};
use std::path::Path;

pub fn generate(
    dsl: &Path,
    devices: &Path,
    drivers_root: &Path,
    dest: &Path,
    dependencies_file: Option<&Path>,
    allow_list: Option<&Path>,
    config: Option<&Path>,
) -> Result<()> {
    let artifact = Artifact::from_path(dest)?;
    if dependencies_file.is_some() && !matches!(artifact, Artifact::Table(_)) {
        bail!(
            "--dependencies-file only applies to table sources, not {}",
            dest.display()
        );
    }

    let mut request = CompileRequest::new(dsl, devices, drivers_root, dest);
    if let Some(path) = dependencies_file {
        request = request.dependencies_file(path);
    }
    if let Some(path) = allow_list {
        request = request.allow_list(path);
    }
    if let Some(path) = config {
        request = request.config(path);
    }

    compile(&request).with_context(|| format!("failed to generate {}", dest.display()))?;

    println!("Output written to: {}", dest.display());
    if let Some(path) = dependencies_file {
        println!("Dependencies written to: {}", path.display());
    }
    Ok(())
}
