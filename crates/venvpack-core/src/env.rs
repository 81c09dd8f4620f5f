//! Environment layout helpers shared by the archiver and the repairer.

use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// Name of the interpreter link inside an environment's `bin` directory.
///
/// Environment builders create `bin/python` as a symlink to the real
/// interpreter (or, for some distributions, as a copied binary).
pub const INTERPRETER_LINK: &str = "python";

/// Resolve `root/bin`, failing if the root or its `bin` directory is
/// missing.
pub fn bin_dir(root: &Path) -> Result<PathBuf> {
    let bin = root.join("bin");
    if !bin.is_dir() {
        return Err(Error::not_found(bin));
    }
    Ok(bin)
}

/// Default archive path for an environment root: the root's own name
/// with its last suffix replaced by `.tgz` (`/opt/venv` -> `/opt/venv.tgz`).
pub fn default_archive_path(root: &Path) -> PathBuf {
    root.with_extension("tgz")
}

/// Validate an archive entry name and return it as a plain relative path.
///
/// Entry names must stay inside the extraction root: absolute paths,
/// drive prefixes, and `..` components are rejected. `.` components are
/// dropped.
pub fn sanitize_entry_path(path: &Path) -> Result<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                return Err(Error::malformed(
                    path.display().to_string(),
                    "absolute path in archive",
                ));
            }
            Component::ParentDir => {
                return Err(Error::malformed(
                    path.display().to_string(),
                    "parent-directory traversal in archive",
                ));
            }
            Component::CurDir => {}
            Component::Normal(part) => out.push(part),
        }
    }
    Ok(out)
}
