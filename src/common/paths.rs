//! Configuration and log paths
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/apicase/`
//! - macOS: `~/Library/Application Support/apicase/`
//! - Windows: `%APPDATA%\apicase\`

use std::path::{Path, PathBuf};

/// Name used for the configuration directory
const APP_NAME: &str = "apicase";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Resolve a path relative to a base directory unless it is already absolute
pub fn resolve_relative(path: &Path, base: Option<&Path>) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else if let Some(base) = base {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}

/// Directory containing a case file, used to resolve upload paths
pub fn case_dir(source: &Path) -> Option<PathBuf> {
    source
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_is_toml() {
        if let Some(path) = config_path() {
            assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("config.toml"));
        }
    }

    #[test]
    fn test_resolve_relative() {
        let base = Path::new("/data/cases");
        assert_eq!(
            resolve_relative(Path::new("upload.png"), Some(base)),
            PathBuf::from("/data/cases/upload.png")
        );
        assert_eq!(
            resolve_relative(Path::new("/tmp/upload.png"), Some(base)),
            PathBuf::from("/tmp/upload.png")
        );
        assert_eq!(
            resolve_relative(Path::new("upload.png"), None),
            PathBuf::from("upload.png")
        );
    }

    #[test]
    fn test_case_dir_of_bare_file_name() {
        assert_eq!(case_dir(Path::new("case.xlsx")), None);
        assert_eq!(case_dir(Path::new("cases/case.xlsx")), Some(PathBuf::from("cases")));
    }
}
