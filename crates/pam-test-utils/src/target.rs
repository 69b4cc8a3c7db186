//! [`TestTarget`] builder for stack-file test scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary `/etc`-like directory: `pam.d/` for per-service files and
/// `pam.conf` for the combined file.
///
/// # Example
///
/// ```rust,no_run
/// use pam_test_utils::{TestTarget, fixtures};
///
/// let target = TestTarget::new();
/// let path = target.write_service("system-auth", fixtures::FULL);
/// target.assert_service_contains("system-auth", "pam_env.so");
/// # let _ = path;
/// ```
pub struct TestTarget {
    temp_dir: TempDir,
}

impl Default for TestTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTarget {
    /// Create the layout with an empty `pam.d/`.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("pam.d")).unwrap();
        Self { temp_dir }
    }

    /// Return the root path of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn pam_dir(&self) -> PathBuf {
        self.root().join("pam.d")
    }

    pub fn service_path(&self, service: &str) -> PathBuf {
        self.pam_dir().join(service)
    }

    pub fn combined_path(&self) -> PathBuf {
        self.root().join("pam.conf")
    }

    /// Write `pam.d/<service>` and return its path.
    pub fn write_service(&self, service: &str, content: &str) -> PathBuf {
        let path = self.service_path(service);
        fs::write(&path, content).unwrap();
        path
    }

    /// Write `pam.conf` and return its path.
    pub fn write_combined(&self, content: &str) -> PathBuf {
        let path = self.combined_path();
        fs::write(&path, content).unwrap();
        path
    }

    /// Write an arbitrary file relative to the root and return its path.
    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Read `pam.d/<service>`.
    ///
    /// # Panics
    /// Panics if the file cannot be read.
    pub fn read_service(&self, service: &str) -> String {
        let path = self.service_path(service);
        fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()))
    }

    /// Non-comment, non-blank lines of `pam.d/<service>`, in order.
    pub fn service_entries(&self, service: &str) -> Vec<String> {
        self.read_service(service)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect()
    }

    /// Assert that `pam.d/<service>` contains `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_service_contains(&self, service: &str, content: &str) {
        let file_content = self.read_service(service);
        assert!(
            file_content.contains(content),
            "Expected {} to contain '{}', got:\n{}",
            service,
            content,
            file_content
        );
    }
}
