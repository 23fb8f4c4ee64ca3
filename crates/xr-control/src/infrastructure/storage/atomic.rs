//! Atomic file replacement.
//!
//! The contents are written to a scratch file next to the target, flushed to
//! disk, given their permission bits, and then renamed over the target.  `rename(2)` within one directory
//! is atomic, so a reader sees either the old file or the new one.  On
//! failure the scratch file is removed and the target is left untouched.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use super::StorageError;

/// Permission bits applied to files the driver must be able to read and
/// rewrite: `rw-rw-rw-`.
pub const SHARED_FILE_MODE: u32 = 0o666;

/// Writes `contents` to `path` via a scratch file and an atomic rename.
///
/// Creates the parent directory when it is missing.  When `mode` is given
/// the permission bits are applied to the scratch file before the rename
/// (Unix only), so an `Err` always means the target was not replaced.
///
/// # Errors
///
/// [`StorageError::Io`] when the directory or scratch file cannot be
/// written or its mode cannot be set, [`StorageError::Replace`] when the
/// rename fails.
pub fn write_atomic(path: &Path, contents: &str, mode: Option<u32>) -> Result<(), StorageError> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(|source| StorageError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let scratch = scratch_path(dir, path);
    if let Err(e) = write_scratch(&scratch, contents, mode) {
        let _ = fs::remove_file(&scratch);
        return Err(e);
    }

    if let Err(source) = fs::rename(&scratch, path) {
        let _ = fs::remove_file(&scratch);
        return Err(StorageError::Replace {
            path: path.to_path_buf(),
            source,
        });
    }

    debug!("wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

fn scratch_path(dir: &Path, target: &Path) -> PathBuf {
    let file_name = target
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("file");
    dir.join(format!(".{file_name}.tmp-{}", Uuid::new_v4()))
}

fn write_scratch(scratch: &Path, contents: &str, mode: Option<u32>) -> Result<(), StorageError> {
    let io_err = |source| StorageError::Io {
        path: scratch.to_path_buf(),
        source,
    };

    let mut file: File = OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(scratch)
        .map_err(io_err)?;
    file.write_all(contents.as_bytes()).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    if let Some(mode) = mode {
        set_mode(scratch, mode)?;
    }
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), StorageError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|source| {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<(), StorageError> {
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("xr_atomic_test_{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_write_atomic_creates_file_and_parent_dirs() {
        // Arrange
        let dir = temp_dir();
        let path = dir.join("nested").join("config.ini");

        // Act
        write_atomic(&path, "disabled=false\n", None).expect("write must succeed");

        // Assert
        assert_eq!(fs::read_to_string(&path).unwrap(), "disabled=false\n");

        // Cleanup
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_write_atomic_replaces_existing_contents_and_leaves_no_scratch() {
        let dir = temp_dir();
        let path = dir.join("config.ini");
        fs::write(&path, "old=1\n").unwrap();

        write_atomic(&path, "new=2\n", None).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new=2\n");
        let leftovers: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty(), "scratch file must not survive");

        fs::remove_dir_all(&dir).ok();
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_applies_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = temp_dir();
        let path = dir.join("config.ini");

        write_atomic(&path, "x=1\n", Some(SHARED_FILE_MODE)).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, SHARED_FILE_MODE);

        fs::remove_dir_all(&dir).ok();
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_mode_replaces_mode_of_existing_file() {
        use std::os::unix::fs::PermissionsExt;

        // Arrange
        let dir = temp_dir();
        let path = dir.join("config.ini");
        fs::write(&path, "old=1\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();

        // Act
        write_atomic(&path, "new=2\n", Some(SHARED_FILE_MODE)).unwrap();

        // Assert
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, SHARED_FILE_MODE);
        assert_eq!(fs::read_to_string(&path).unwrap(), "new=2\n");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_write_atomic_into_directory_target_fails_without_clobbering() {
        // Renaming a file over a non-empty directory fails on every platform.
        let dir = temp_dir();
        let target = dir.join("occupied");
        fs::create_dir_all(target.join("child")).unwrap();

        let result = write_atomic(&target, "x=1\n", None);

        assert!(matches!(result, Err(StorageError::Replace { .. })));
        assert!(target.join("child").exists());

        fs::remove_dir_all(&dir).ok();
    }
}
