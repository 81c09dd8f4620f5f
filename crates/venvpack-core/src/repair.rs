//! Repairer: rewrite the absolute paths an environment embedded at
//! creation time so it works at its current location.
//!
//! Two things go stale when an environment moves: the shebang line of
//! every launcher script in `bin` (which names the interpreter by
//! absolute path) and the `bin/python` symlink (which points at the
//! interpreter binary of the original host). Repair rewrites both.
//! Neither target is validated for existence — repairing toward a path
//! that will only exist on the final host is a supported workflow.

use std::fs;
use std::io::Read;
use std::os::unix::fs::{PermissionsExt, symlink};
use std::path::Path;

use tracing::{debug, info};

use crate::env::{INTERPRETER_LINK, bin_dir};
use crate::{Error, Result};

/// Shebang marker at the start of a launcher script.
const SHEBANG: &[u8] = b"#!";

/// Repair the environment rooted at `root` in place.
///
/// Every regular file directly under `root/bin` whose first two bytes
/// are `#!` gets its first line replaced with `#!<shebang>`; the rest
/// of the file is preserved byte-for-byte. The `bin/python` link is
/// re-pointed at `python` (environments that ship the interpreter as a
/// regular file keep it untouched).
///
/// Defaults when omitted: `shebang` is `root/bin/python`, making the
/// scripts self-referential to the relocated environment; `python` is
/// the path of the currently running executable.
///
/// Repair is idempotent; after a partial failure, re-running it
/// converges.
pub fn repair(root: &Path, shebang: Option<&Path>, python: Option<&Path>) -> Result<()> {
    let bin = bin_dir(root)?;
    let shebang = match shebang {
        Some(path) => path.to_path_buf(),
        None => bin.join(INTERPRETER_LINK),
    };
    let python = match python {
        Some(path) => path.to_path_buf(),
        None => std::env::current_exe().map_err(|e| Error::io(root, e))?,
    };

    info!(
        root = %root.display(),
        shebang = %shebang.display(),
        python = %python.display(),
        "repairing environment"
    );

    let mut entries = fs::read_dir(&bin)
        .map_err(|e| Error::io(&bin, e))?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| Error::io(&bin, e))?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| Error::io(&path, e))?;
        // Launcher scripts are regular files; the interpreter link and
        // any other symlinks are handled separately or not at all.
        if !file_type.is_file() {
            continue;
        }
        rewrite_shebang(&path, &shebang)?;
    }

    relink_interpreter(&bin.join(INTERPRETER_LINK), &python)
}

/// Replace `path`'s first line with `#!<shebang>` if the file starts
/// with a shebang marker; leave it untouched otherwise.
///
/// The new content is assembled fully in memory and committed with a
/// write-to-temp-then-rename, so a launcher is never left half-written.
fn rewrite_shebang(path: &Path, shebang: &Path) -> Result<()> {
    let mut file = fs::File::open(path).map_err(|e| Error::io(path, e))?;

    let mut marker = [0u8; 2];
    let read = read_up_to(&mut file, &mut marker).map_err(|e| Error::io(path, e))?;
    if read < 2 || marker != SHEBANG {
        return Ok(());
    }

    let mut rest = Vec::new();
    file.read_to_end(&mut rest).map_err(|e| Error::io(path, e))?;
    drop(file);

    let tail = match rest.iter().position(|&b| b == b'\n') {
        Some(newline) => &rest[newline + 1..],
        None => &[][..],
    };

    let mut content = Vec::with_capacity(tail.len() + 64);
    content.extend_from_slice(SHEBANG);
    content.extend_from_slice(shebang.as_os_str().as_encoded_bytes());
    content.push(b'\n');
    content.extend_from_slice(tail);

    if content[2..] == rest[..] {
        debug!(script = %path.display(), "shebang already current");
        return Ok(());
    }

    debug!(script = %path.display(), "rewriting shebang");
    let mode = fs::metadata(path).map_err(|e| Error::io(path, e))?.permissions().mode();
    write_atomic(path, &content, mode)
}

/// Read up to `buf.len()` bytes, tolerating files shorter than the buffer.
fn read_up_to(file: &mut fs::File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Write content atomically, preserving the original permission bits.
///
/// Uses a write-to-temp-then-rename in the same directory so the rename
/// stays on one filesystem and launchers keep their executable bit.
fn write_atomic(path: &Path, content: &[u8], mode: u32) -> Result<()> {
    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(&temp_name);

    fs::write(&temp_path, content).map_err(|e| Error::io(&temp_path, e))?;
    fs::set_permissions(&temp_path, fs::Permissions::from_mode(mode))
        .map_err(|e| Error::io(&temp_path, e))?;
    fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;
    Ok(())
}

/// Point the interpreter link at `python`.
///
/// An existing symlink is unlinked and recreated with the new target; a
/// regular file (an environment shipping a real interpreter binary) is
/// left alone; a missing link is created fresh.
fn relink_interpreter(link: &Path, python: &Path) -> Result<()> {
    match fs::symlink_metadata(link) {
        Ok(metadata) if metadata.file_type().is_symlink() => {
            fs::remove_file(link).map_err(|e| Error::io(link, e))?;
        }
        Ok(_) => {
            debug!(link = %link.display(), "interpreter is a regular file, leaving as is");
            return Ok(());
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(Error::io(link, e)),
    }

    debug!(link = %link.display(), target = %python.display(), "relinking interpreter");
    symlink(python, link).map_err(|e| Error::io(link, e))?;
    Ok(())
}
