use crate::domain::RevisionSnapshot;
use crate::ui::Logger;
use crate::vcs::{CollectRequest, VcsProvider};
use std::path::{Path, PathBuf};

/// Provider returning a fixed snapshot, for tests and host integrations
/// that already know their revision data.
pub struct MockProvider {
    name: String,
    available: bool,
    root: Option<PathBuf>,
    snapshot: RevisionSnapshot,
}

impl MockProvider {
    /// Create an available provider that recognises no directory yet
    pub fn new(name: impl Into<String>, snapshot: RevisionSnapshot) -> Self {
        MockProvider {
            name: name.into(),
            available: true,
            root: None,
            snapshot,
        }
    }

    /// Recognise every path below `root`
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Pretend the tools of this VCS are not installed
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }
}

impl VcsProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn check_environment(&self, _logger: &dyn Logger) -> bool {
        self.available
    }

    fn check_directory(&self, path: &Path) -> Option<PathBuf> {
        self.root.as_ref().filter(|root| path.starts_with(root)).cloned()
    }

    fn collect(&self, _request: &CollectRequest<'_>, _logger: &dyn Logger) -> RevisionSnapshot {
        let mut snapshot = self.snapshot.clone();
        snapshot.vcs = self.name.clone();
        snapshot
    }
}
