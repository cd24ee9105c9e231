//! Fake engines for integration tests
//!
//! Each fake engine is a small shell script that records how it was called
//! into a log directory. The ROM path is always the fifth argument.

#![cfg(unix)]
#![allow(dead_code)]

use std::{
    fs,
    os::unix::fs::PermissionsExt as _,
    path::{Path, PathBuf},
};

/// Writes an executable `/bin/sh` script named `name` into `dir`.
pub fn write_engine(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Engine that fails with exit code 3 unless `manifest` exists, then saves
/// its arguments to `<log>/<rom file name>.args`. ROMs whose name contains
/// `bad` make it exit with code 1.
pub fn recording_engine(dir: &Path, manifest: &Path, log: &Path) -> PathBuf {
    fs::create_dir_all(log).unwrap();
    write_engine(
        dir,
        "genemu",
        &format!(
            r#"[ -f "{manifest}" ] || exit 3
printf '%s\n' "$@" > "{log}/$(basename "$5").args"
echo "engine stdout for $5"
case "$5" in *bad*) exit 1 ;; esac
exit 0"#,
            manifest = manifest.display(),
            log = log.display(),
        ),
    )
}

/// Arguments a recording engine saw for `rom`, if it was started for it.
pub fn recorded_args(log: &Path, rom: &str) -> Option<Vec<String>> {
    let file = Path::new(rom).file_name()?.to_string_lossy().into_owned();
    let contents = fs::read_to_string(log.join(format!("{file}.args"))).ok()?;
    Some(contents.lines().map(String::from).collect())
}
