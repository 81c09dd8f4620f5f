//! Command implementations: thin orchestration over venvpack-core.

use std::path::Path;

use colored::Colorize;
use venvpack_core::{bundle, default_archive_path, repair, unpack};

use crate::error::Result;

pub fn run_bundle(root: &Path, output: Option<&Path>) -> Result<()> {
    let output = match output {
        Some(path) => path.to_path_buf(),
        None => default_archive_path(root),
    };
    bundle(root, &output)?;
    println!("{} {}", "bundled".green().bold(), output.display());
    Ok(())
}

pub fn run_unpack(
    archive: &Path,
    output_dir: &Path,
    do_repair: bool,
    shebang: Option<&Path>,
    python: Option<&Path>,
) -> Result<()> {
    unpack(archive, output_dir)?;
    println!("{} {}", "unpacked".green().bold(), output_dir.display());

    if do_repair {
        run_repair(output_dir, shebang, python)?;
    }
    Ok(())
}

pub fn run_repair(root: &Path, shebang: Option<&Path>, python: Option<&Path>) -> Result<()> {
    repair(root, shebang, python)?;
    println!("{} {}", "repaired".green().bold(), root.display());
    Ok(())
}
