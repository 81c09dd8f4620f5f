//! End-to-end relocation test: bundle an environment, unpack it at a
//! new path, repair it, and actually execute a relocated launcher.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::{PermissionsExt, symlink};
use std::path::Path;
use std::process::Command;

use venvpack_core::repair;

/// Build a fake environment whose launcher is runnable by any POSIX
/// shell, so the test can prove the relocated entry point executes.
fn build_environment(root: &Path) {
    fs::create_dir_all(root.join("bin")).unwrap();
    fs::create_dir_all(root.join("lib/python3.11/site-packages")).unwrap();
    fs::write(root.join("pyvenv.cfg"), "home = /usr/local/bin\n").unwrap();

    // Interpreter link pointing at the path of the original host.
    symlink("/original/host/python3.11", root.join("bin/python")).unwrap();

    // pip-style launcher: shebang embeds the creation-time absolute
    // path; the body is plain shell so it runs once the interpreter
    // link points at a real shell.
    let pip = root.join("bin/pip");
    fs::write(
        &pip,
        format!("#!{}/bin/python\necho pip 23.0\n", root.display()),
    )
    .unwrap();
    fs::set_permissions(&pip, fs::Permissions::from_mode(0o755)).unwrap();
}

fn venvpack() -> assert_cmd::Command {
    assert_cmd::Command::cargo_bin("venvpack").unwrap()
}

#[test]
fn test_bundle_unpack_repair_and_execute() {
    let temp = tempfile::TempDir::new().unwrap();
    let original = temp.path().join("venv");
    build_environment(&original);

    // Bundle at the original location.
    let archive = temp.path().join("venv.tgz");
    venvpack()
        .arg("bundle")
        .arg(&original)
        .arg("--output")
        .arg(&archive)
        .assert()
        .success();

    // Unpack at a new location; repair runs by default. Point the
    // interpreter link at a real shell so the launcher is executable.
    let relocated = temp.path().join("relocated/venv");
    fs::create_dir_all(temp.path().join("relocated")).unwrap();
    venvpack()
        .arg("unpack")
        .arg(&archive)
        .arg(&relocated)
        .arg("--python")
        .arg("/bin/sh")
        .assert()
        .success();

    // The shebang now points into the relocated environment and the
    // interpreter link resolves to the shell.
    let pip = fs::read_to_string(relocated.join("bin/pip")).unwrap();
    let expected_shebang = format!("#!{}\n", relocated.join("bin/python").display());
    assert!(pip.starts_with(&expected_shebang), "unexpected shebang: {pip}");
    assert_eq!(
        fs::read_link(relocated.join("bin/python")).unwrap(),
        Path::new("/bin/sh")
    );

    // The relocated launcher actually runs.
    let output = Command::new(relocated.join("bin/pip")).output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "pip 23.0\n");
}

#[test]
fn test_unpack_no_repair_preserves_original_paths() {
    let temp = tempfile::TempDir::new().unwrap();
    let original = temp.path().join("venv");
    build_environment(&original);

    let archive = temp.path().join("venv.tgz");
    venvpack()
        .arg("bundle")
        .arg(&original)
        .arg("--output")
        .arg(&archive)
        .assert()
        .success();

    let relocated = temp.path().join("untouched");
    venvpack()
        .arg("unpack")
        .arg("--no-repair")
        .arg(&archive)
        .arg(&relocated)
        .assert()
        .success();

    // Exactly what was bundled: stale shebang and stale link.
    let pip = fs::read_to_string(relocated.join("bin/pip")).unwrap();
    assert!(pip.starts_with(&format!("#!{}/bin/python\n", original.display())));
    assert_eq!(
        fs::read_link(relocated.join("bin/python")).unwrap(),
        Path::new("/original/host/python3.11")
    );
}

#[test]
fn test_break_then_repair_scenario() {
    let temp = tempfile::TempDir::new().unwrap();
    let root = temp.path().join("venv");
    build_environment(&root);
    let venv_python = root.join("bin/python");

    // Repair toward paths that do not exist; this must succeed.
    repair(
        &root,
        Some(Path::new("/does/not/exist/python3.10")),
        Some(Path::new("/bin/false")),
    )
    .unwrap();

    assert_eq!(
        fs::read_link(&venv_python).unwrap(),
        Path::new("/bin/false")
    );
    let pip = fs::read_to_string(root.join("bin/pip")).unwrap();
    assert!(pip.starts_with("#!/does/not/exist/python3.10\n"));

    // Repair back to a working layout and execute the launcher.
    repair(&root, Some(&venv_python), Some(Path::new("/bin/sh"))).unwrap();

    let output = Command::new(root.join("bin/pip")).output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "pip 23.0\n");
}
