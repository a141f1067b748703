use std::io::Write;
use std::path::{Path, PathBuf};

use roster_core::PersistenceError;

/// Write content atomically: write to temp file, fsync, rename.
///
/// The temp file lives next to `path` so the rename stays on one filesystem.
/// It is removed again if any step fails.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), PersistenceError> {
    let temp_path = temp_path_for(path);

    let result = write_and_rename(&temp_path, path, content);
    if result.is_err() {
        let _ = std::fs::remove_file(&temp_path);
    }
    result
}

fn write_and_rename(temp_path: &Path, path: &Path, content: &[u8]) -> Result<(), PersistenceError> {
    let write_err = |source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = std::fs::File::create(temp_path).map_err(write_err)?;
    file.write_all(content).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    drop(file);

    std::fs::rename(temp_path, path).map_err(write_err)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let dir = path.parent().unwrap_or(Path::new("."));
    let stem = path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_default();
    dir.join(format!(".{stem}.{}.tmp", nanos_hex()))
}

/// Timestamp suffix for temp file names.
fn nanos_hex() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{nanos:x}")
}
