//! Well-known PAM filesystem locations.

use std::path::Path;

/// Standard locations of PAM stack files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PamPath {
    /// Directory holding one stack file per service
    ServiceDir,
    /// The combined multi-service file
    CombinedFile,
    /// Stack file used when a declaration names neither target nor service
    DefaultTarget,
}

impl PamPath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServiceDir => "/etc/pam.d",
            Self::CombinedFile => "/etc/pam.conf",
            Self::DefaultTarget => "/etc/pam.d/system-auth",
        }
    }
}

impl AsRef<Path> for PamPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl std::fmt::Display for PamPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
