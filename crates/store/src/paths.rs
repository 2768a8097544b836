//! Per-user application paths.

use std::path::PathBuf;

use directories::ProjectDirs;

/// The per-user data directory, created if missing.
pub fn data_dir() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("", "", "ToolboxPM")?;
    let dir = dirs.data_dir().to_path_buf();
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

/// Location of the vault database file.
pub fn database_file_path() -> Option<PathBuf> {
    Some(data_dir()?.join("toolbox.sqlite3"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_path_is_under_data_dir() {
        // Skipped on systems without a resolvable home directory.
        if let Some(path) = database_file_path() {
            assert!(path.ends_with("toolbox.sqlite3"));
            assert!(path.parent().is_some_and(std::path::Path::exists));
        }
    }
}
