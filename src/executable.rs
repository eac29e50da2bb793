//! Location of the producer executable.
//!
//! The executable ships next to this program under `bin/`. Installing or
//! downloading it is out of scope here; a missing file is reported before
//! any call is attempted.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::PublishError;

/// File name of the producer executable on this platform.
pub const EXECUTABLE_NAME: &str = if cfg!(windows) {
    "pulsar-publish.exe"
} else {
    "pulsar-publish"
};

/// Environment variable that overrides the executable path.
pub const EXECUTABLE_ENV: &str = "PULSAR_PUBLISH_BIN";

static INSTALL_DIR: OnceLock<PathBuf> = OnceLock::new();
static BUNDLED_EXECUTABLE: OnceLock<PathBuf> = OnceLock::new();
static DEFAULT_EXECUTABLE: OnceLock<PathBuf> = OnceLock::new();

/// Directory this program is installed in. Resolved once per process.
#[must_use]
pub fn install_dir() -> &'static Path {
    INSTALL_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// The copy shipped at `<install_dir>/bin/<name>`.
#[must_use]
pub fn bundled_executable() -> &'static Path {
    BUNDLED_EXECUTABLE.get_or_init(|| install_dir().join("bin").join(EXECUTABLE_NAME))
}

/// Path named by `$PULSAR_PUBLISH_BIN`, if set and non-empty.
#[must_use]
pub fn env_executable() -> Option<PathBuf> {
    std::env::var_os(EXECUTABLE_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Producer path when no configuration is involved: `$PULSAR_PUBLISH_BIN`,
/// else the bundled copy. Resolved once per process.
#[must_use]
pub fn default_executable() -> &'static Path {
    DEFAULT_EXECUTABLE
        .get_or_init(|| env_executable().unwrap_or_else(|| bundled_executable().to_path_buf()))
}

/// Check that the producer exists at `path`.
///
/// # Errors
///
/// Returns `PublishError::MissingExecutable` if `path` is not a file.
pub fn ensure_executable(path: &Path) -> Result<(), PublishError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PublishError::MissingExecutable(path.to_path_buf()))
    }
}
