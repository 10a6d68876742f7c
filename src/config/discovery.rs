//! Config discovery for tamandua-web.
//!
//! Walks parent directories to find `tamandua.yaml` and checks for a global
//! config at `~/.config/tamandua/config.yaml`.

use std::path::{Path, PathBuf};

/// Project config filename to search for in parent directories.
pub const PROJECT_CONFIG_NAME: &str = "tamandua.yaml";

/// Global config filename within the tamandua config directory.
pub const GLOBAL_CONFIG_NAME: &str = "config.yaml";

const GLOBAL_CONFIG_DIR: &str = "tamandua";

/// Result of config discovery.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryResult {
    /// Directory containing `tamandua.yaml`.
    pub project_root: Option<PathBuf>,
    /// Full path to the project config file.
    pub project_config: Option<PathBuf>,
    /// Full path to the global config file.
    pub global_config: Option<PathBuf>,
}

impl DiscoveryResult {
    /// Returns true if any config was found (project or global).
    pub fn has_config(&self) -> bool {
        self.project_config.is_some() || self.global_config.is_some()
    }

    /// The config file that wins outright: project first, then global.
    pub fn closest(&self) -> Option<&Path> {
        self.project_config
            .as_deref()
            .or(self.global_config.as_deref())
    }
}

/// Path of the global config file, whether or not it exists.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(GLOBAL_CONFIG_DIR).join(GLOBAL_CONFIG_NAME))
}

/// Discover config files starting from the current working directory.
pub fn discover() -> DiscoveryResult {
    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.canonicalize().unwrap_or(dir),
        Err(_) => {
            return DiscoveryResult {
                global_config: existing_global(),
                ..Default::default()
            }
        }
    };
    discover_from(&cwd).0
}

fn existing_global() -> Option<PathBuf> {
    global_config_path().filter(|path| path.try_exists().unwrap_or(false) && path.is_file())
}

/// Discover config files walking up from `start`.
///
/// Also returns every directory that was checked, for `-v` output.
pub fn discover_from(start: &Path) -> (DiscoveryResult, Vec<PathBuf>) {
    let mut result = DiscoveryResult {
        global_config: existing_global(),
        ..Default::default()
    };
    let mut searched_paths = Vec::new();

    for ancestor in start.ancestors() {
        searched_paths.push(ancestor.to_path_buf());

        let config_path = ancestor.join(PROJECT_CONFIG_NAME);
        if config_path.try_exists().unwrap_or(false) && config_path.is_file() {
            result.project_root = Some(ancestor.to_path_buf());
            result.project_config = Some(config_path);
            break;
        }
    }

    (result, searched_paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_finds_config_in_start_dir() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join(PROJECT_CONFIG_NAME);
        fs::write(&config_path, "page_size: 10\n").unwrap();

        let (result, searched) = discover_from(temp.path());
        assert_eq!(result.project_config, Some(config_path));
        assert_eq!(result.project_root.as_deref(), Some(temp.path()));
        assert_eq!(searched.len(), 1);
    }

    #[test]
    fn test_finds_config_in_parent_dir() {
        let temp = TempDir::new().unwrap();
        let subdir = temp.path().join("level1").join("level2");
        fs::create_dir_all(&subdir).unwrap();
        let config_path = temp.path().join(PROJECT_CONFIG_NAME);
        fs::write(&config_path, "page_size: 10\n").unwrap();

        let (result, searched) = discover_from(&subdir);
        assert_eq!(result.project_config, Some(config_path));
        assert_eq!(searched[0], subdir);
        assert_eq!(searched.len(), 3);
    }

    #[test]
    fn test_directory_named_like_config_is_ignored() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(PROJECT_CONFIG_NAME)).unwrap();

        let (result, _) = discover_from(temp.path());
        assert_ne!(
            result.project_root.as_deref(),
            Some(temp.path()),
            "a directory must not count as a config file"
        );
    }

    #[test]
    fn test_closest_prefers_project() {
        let both = DiscoveryResult {
            project_root: None,
            project_config: Some(PathBuf::from("/p/tamandua.yaml")),
            global_config: Some(PathBuf::from("/g/config.yaml")),
        };
        assert_eq!(both.closest(), Some(Path::new("/p/tamandua.yaml")));
        assert!(both.has_config());

        let global = DiscoveryResult {
            global_config: Some(PathBuf::from("/g/config.yaml")),
            ..Default::default()
        };
        assert_eq!(global.closest(), Some(Path::new("/g/config.yaml")));
        assert!(!DiscoveryResult::default().has_config());
    }
}
