use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.yml";

/// Filesystem layout of a deployment.
///
/// The project root holds `config.yml` and the review dataset. Mutable state
/// (vector index, secrets, logs) lives under the data dir, which defaults to
/// `<root>/data` and can be moved with `PRA_DATA_DIR`.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub user_data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub vector_db_path: PathBuf,
    pub secrets_path: PathBuf,
}

impl AppPaths {
    /// Resolves the layout from `PRA_ROOT` / `PRA_DATA_DIR` and the working
    /// directory.
    pub fn new() -> Self {
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let project_root = env::var_os("PRA_ROOT")
            .map(PathBuf::from)
            .or_else(|| find_project_root(&cwd))
            .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")));
        let user_data_dir = env::var_os("PRA_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| project_root.join("data"));
        Self::with_dirs(project_root, user_data_dir)
    }

    pub fn with_dirs(project_root: PathBuf, user_data_dir: PathBuf) -> Self {
        AppPaths {
            log_dir: user_data_dir.join("logs"),
            vector_db_path: user_data_dir.join("reviews.db"),
            secrets_path: user_data_dir.join("secrets.yaml"),
            project_root,
            user_data_dir,
        }
    }

    /// Creates the data and log directories.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(&self.user_data_dir)?;
        fs::create_dir_all(&self.log_dir)
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

/// Nearest ancestor of `start` (inclusive) that contains `config.yml`.
fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE).is_file())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_root_is_found_from_a_subdirectory() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(CONFIG_FILE), "app: {}\n").unwrap();
        let nested = root.path().join("data").join("logs");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_project_root(&nested).as_deref(), Some(root.path()));
        assert_eq!(find_project_root(root.path()).as_deref(), Some(root.path()));
    }

    #[test]
    fn no_config_means_no_project_root() {
        let dir = tempfile::tempdir().unwrap();
        let found = find_project_root(dir.path());
        assert!(found.map_or(true, |root| !root.starts_with(dir.path())));
    }

    #[test]
    fn derived_paths_live_under_the_data_dir() {
        let root = tempfile::tempdir().unwrap();
        let data = root.path().join("state");
        let paths = AppPaths::with_dirs(root.path().to_path_buf(), data.clone());

        assert_eq!(paths.vector_db_path, data.join("reviews.db"));
        assert_eq!(paths.secrets_path, data.join("secrets.yaml"));
        assert!(!paths.log_dir.exists());

        paths.ensure_dirs().unwrap();
        assert!(paths.log_dir.is_dir());
    }
}
