//! Path utilities for locating flight search data.

use std::path::{Path, PathBuf};

/// Directory name used under the platform data directory.
pub const APP_DIR_NAME: &str = "flight-search";

/// Returns the default data directory.
///
/// This is `flight-search` under the platform data directory
/// (`~/.local/share/flight-search` on Linux). Falls back to a relative
/// `.flight-search` directory when the platform directory is unknown.
///
/// # Examples
///
/// ```
/// use flight_search::infrastructure::get_data_dir;
///
/// let data_dir = get_data_dir();
/// assert!(data_dir.ends_with("flight-search") || data_dir.ends_with(".flight-search"));
/// ```
#[must_use]
pub fn get_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from(format!(".{APP_DIR_NAME}")), |dir| dir.join(APP_DIR_NAME))
}

/// Expands a leading `~` to the user's home directory.
///
/// Paths without a leading `~`, and all paths when the home directory is
/// unknown, are returned unchanged.
///
/// # Examples
///
/// ```
/// use flight_search::infrastructure::expand_tilde;
/// use std::path::Path;
///
/// assert_eq!(expand_tilde(Path::new("/absolute/path")), Path::new("/absolute/path"));
/// assert!(!expand_tilde(Path::new("~/data")).starts_with("~"));
/// ```
#[must_use]
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) if rest.as_os_str().is_empty() => home,
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
