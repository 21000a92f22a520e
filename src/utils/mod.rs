//! Small helpers shared by the managers.

pub mod time;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Locks `mutex`, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs `release` against shared state when dropped.
///
/// Busy flags are set before a request is issued and cleared by this guard,
/// so they cannot stay set when the request fails or the future is dropped.
pub(crate) struct Release<T> {
    state: Arc<Mutex<T>>,
    release: fn(&mut T),
}

impl<T> Release<T> {
    pub(crate) fn new(state: &Arc<Mutex<T>>, release: fn(&mut T)) -> Self {
        Self {
            state: Arc::clone(state),
            release,
        }
    }
}

impl<T> Drop for Release<T> {
    fn drop(&mut self) {
        (self.release)(&mut lock(&self.state));
    }
}

/// Writes `contents` to `dir/file_name` and returns the final path.
///
/// The bytes go to a temporary file in `dir` first; it is removed if any step
/// fails and renamed into place only once fully written.
pub fn write_download(dir: &Path, file_name: &str, contents: &[u8]) -> Result<PathBuf> {
    let target = dir.join(file_name);
    let mut file = NamedTempFile::new_in(dir).map_err(|err| {
        Error::io(
            format!("failed to create temporary file in {}", dir.display()),
            err,
        )
    })?;
    file.write_all(contents)
        .and_then(|()| file.flush())
        .map_err(|err| Error::io(format!("failed to write {file_name}"), err))?;
    file.persist(&target)
        .map_err(|err| Error::io(format!("failed to save {}", target.display()), err.error))?;
    Ok(target)
}

/// Formats a byte count the way the file panels display it, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

/// Truncates `text` to `max_chars` characters, appending `...` when cut.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
