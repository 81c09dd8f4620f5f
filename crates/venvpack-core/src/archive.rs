//! Archiver: serialize an environment tree into a gzip-compressed tar
//! archive and restore it.
//!
//! Symlinks are stored as symlink entries carrying their raw target
//! string and are never followed, so an interpreter link pointing
//! outside the tree survives the round trip as a link rather than being
//! inlined as file content. Directories are stored explicitly so empty
//! ones are recreated, and permission bits are preserved in both
//! directions.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tracing::{debug, info};

use crate::env::sanitize_entry_path;
use crate::{Error, Result};

/// Bundle the environment rooted at `root` into a gzip-compressed tar
/// archive at `output`.
///
/// `root` must be an existing directory and `output` must not exist;
/// there is no silent overwrite. On failure the partial output file is
/// removed, so a failed bundle leaves nothing behind.
pub fn bundle(root: &Path, output: &Path) -> Result<()> {
    if !root.is_dir() {
        return Err(Error::not_found(root));
    }
    if output.symlink_metadata().is_ok() {
        return Err(Error::already_exists(output));
    }

    info!(root = %root.display(), output = %output.display(), "bundling environment");
    let result = write_archive(root, output);
    if result.is_err() {
        let _ = fs::remove_file(output);
    }
    result
}

fn write_archive(root: &Path, output: &Path) -> Result<()> {
    let file = File::create(output).map_err(|e| Error::io(output, e))?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut tar = tar::Builder::new(encoder);
    tar.follow_symlinks(false);

    append_dir_sorted(&mut tar, root, Path::new(""))?;

    let encoder = tar.into_inner().map_err(|e| Error::io(output, e))?;
    encoder.finish().map_err(|e| Error::io(output, e))?;
    Ok(())
}

/// Append `dir`'s entries under the relative prefix `rel`, recursing
/// depth-first with each directory sorted by name so archive contents
/// are deterministic for identical trees.
fn append_dir_sorted<W: Write>(
    tar: &mut tar::Builder<W>,
    dir: &Path,
    rel: &Path,
) -> Result<()> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| Error::io(dir, e))?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| Error::io(dir, e))?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let entry_rel = rel.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| Error::io(&path, e))?;

        if file_type.is_dir() {
            // Directory entry first so it exists before its children on
            // extraction, then recurse.
            tar.append_dir(&entry_rel, &path)
                .map_err(|e| Error::io(&path, e))?;
            append_dir_sorted(tar, &path, &entry_rel)?;
        } else {
            // Regular file or symlink. With follow_symlinks disabled the
            // builder stores links as symlink entries with the raw target.
            debug!(entry = %entry_rel.display(), "adding entry");
            tar.append_path_with_name(&path, &entry_rel)
                .map_err(|e| Error::io(&path, e))?;
        }
    }
    Ok(())
}

/// Extract the archive at `archive` into a freshly created `output`
/// directory.
///
/// Entry names are validated before anything is written: an entry that
/// is absolute or climbs out of the output directory with `..` fails
/// the whole operation with [`Error::MalformedArchive`]. Symlink
/// targets are written verbatim and never validated, so links may
/// dangle until [`crate::repair`] runs. On failure the partially
/// populated output directory is left in place for diagnosis.
pub fn unpack(archive: &Path, output: &Path) -> Result<()> {
    if !archive.is_file() {
        return Err(Error::not_found(archive));
    }
    if output.symlink_metadata().is_ok() {
        return Err(Error::already_exists(output));
    }

    info!(archive = %archive.display(), output = %output.display(), "unpacking archive");
    let file = File::open(archive).map_err(|e| Error::io(archive, e))?;
    let decoder = GzDecoder::new(file);
    let mut tar = tar::Archive::new(decoder);
    tar.set_preserve_permissions(true);

    fs::create_dir_all(output).map_err(|e| Error::io(output, e))?;

    for entry in tar.entries().map_err(|e| Error::io(archive, e))? {
        let mut entry = entry.map_err(|e| Error::io(archive, e))?;
        let name = entry
            .path()
            .map_err(|e| Error::io(archive, e))?
            .into_owned();
        let rel = sanitize_entry_path(&name)?;
        if rel.as_os_str().is_empty() {
            continue;
        }

        let dest = entry_destination(output, &rel)?;
        // A symlink already materialized at the destination would be
        // followed when a file entry of the same name is written over
        // it; replace it instead, like tar itself does.
        if let Ok(metadata) = fs::symlink_metadata(&dest) {
            if metadata.file_type().is_symlink() {
                fs::remove_file(&dest).map_err(|e| Error::io(&dest, e))?;
            }
        }
        debug!(entry = %rel.display(), "extracting entry");
        entry.unpack(&dest).map_err(|e| Error::io(&dest, e))?;
    }
    Ok(())
}

/// Resolve where `rel` lands under `output`, creating missing parent
/// directories along the way.
///
/// Every already-materialized ancestor is checked with
/// `symlink_metadata`: an archive can smuggle a symlink entry in as a
/// parent directory (`bin -> /elsewhere`, then `bin/evil`), and writing
/// through it would land outside the output root. Such archives are
/// rejected as malformed.
fn entry_destination(output: &Path, rel: &Path) -> Result<std::path::PathBuf> {
    let mut dir = output.to_path_buf();
    if let Some(parent) = rel.parent() {
        for part in parent.components() {
            dir.push(part);
            match fs::symlink_metadata(&dir) {
                Ok(metadata) if metadata.file_type().is_symlink() => {
                    return Err(Error::malformed(
                        rel.display().to_string(),
                        "entry written through a symlinked parent directory",
                    ));
                }
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    // Foreign archives may list children before their
                    // directory.
                    fs::create_dir(&dir).map_err(|e| Error::io(&dir, e))?;
                }
                Err(e) => return Err(Error::io(&dir, e)),
            }
        }
    }
    Ok(output.join(rel))
}
