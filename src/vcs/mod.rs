//! Version control providers
//!
//! Each supported VCS implements [`VcsProvider`]: it can tell whether its
//! tools are installed, whether a directory belongs to one of its working
//! copies, and how to collect a [`RevisionSnapshot`] from it.
//!
//! - [git::GitProvider]: Git, through the `git` command line
//! - [svn::SvnProvider]: Subversion, through `svnversion` and `svn info`
//! - [mock::MockProvider]: canned snapshots for tests
//!
//! [`ProviderSelector`] asks the providers in registration order and uses the
//! first one that applies.

pub mod ci;
pub mod git;
pub mod mock;
pub mod process;
pub mod svn;

pub use ci::{BranchResolver, CiBranch, GitLabCiBranch, NoCiBranch};
pub use git::GitProvider;
pub use mock::MockProvider;
pub use process::ProcessRunner;
pub use svn::SvnProvider;

use crate::boundary::BoundaryWarning;
use crate::domain::RevisionSnapshot;
use crate::error::{RevisionError, Result};
use crate::ui::Logger;
use chrono::{DateTime, FixedOffset};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Input of a collection run
#[derive(Debug, Clone, Copy)]
pub struct CollectRequest<'a> {
    /// Directory the version is computed for
    pub path: &'a Path,
    /// Working copy root found by [`VcsProvider::check_directory`]
    pub root: &'a Path,
    /// Glob restricting which tags count, empty or `*` for all
    pub tag_match: &'a str,
}

/// Common contract of all version control providers.
///
/// ## Error Handling
///
/// Collection never fails: missing tools, failing commands and unexpected
/// output leave the affected snapshot fields at their defaults.
pub trait VcsProvider: Send + Sync {
    /// Short lower-case name, matched against the required VCS setting
    fn name(&self) -> &str;

    /// True when the command line tools of this VCS can be run
    fn check_environment(&self, logger: &dyn Logger) -> bool;

    /// Working copy root containing `path`, if any
    fn check_directory(&self, path: &Path) -> Option<PathBuf>;

    /// Read the revision data of the working copy without modifying it
    fn collect(&self, request: &CollectRequest<'_>, logger: &dyn Logger) -> RevisionSnapshot;
}

/// Settings shared by the built-in providers
#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderOptions {
    pub timeout: Option<Duration>,
    pub ci_branch: CiBranch,
}

/// Walk from `path` up to the filesystem root looking for `marker`.
pub fn find_metadata_root(path: &Path, marker: &str) -> Option<PathBuf> {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    absolute
        .ancestors()
        .find(|dir| dir.join(marker).exists())
        .map(Path::to_path_buf)
}

/// Picks the provider for a directory
pub struct ProviderSelector {
    providers: Vec<Box<dyn VcsProvider>>,
}

impl ProviderSelector {
    /// Create a selector trying `providers` in the given order
    pub fn new(providers: Vec<Box<dyn VcsProvider>>) -> Self {
        ProviderSelector { providers }
    }

    /// Git first, then Subversion
    pub fn with_defaults(options: ProviderOptions) -> Self {
        let runner = ProcessRunner::new(options.timeout.unwrap_or(process::DEFAULT_TIMEOUT));
        Self::new(vec![
            Box::new(GitProvider::new(runner, options.ci_branch.resolver())),
            Box::new(SvnProvider::new(runner)),
        ])
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Collect the snapshot for `path` from the first applicable provider.
    ///
    /// Without a required VCS, a directory no provider recognises yields a
    /// placeholder snapshot stamped with `now`. With a required VCS that
    /// cannot be used, an environment error is returned.
    pub fn resolve(
        &self,
        path: &Path,
        required_vcs: Option<&str>,
        tag_match: &str,
        now: DateTime<FixedOffset>,
        logger: &dyn Logger,
    ) -> Result<RevisionSnapshot> {
        let required_vcs = required_vcs.map(str::trim).filter(|v| !v.is_empty());

        if let Some(required) = required_vcs {
            if !self
                .providers
                .iter()
                .any(|p| p.name().eq_ignore_ascii_case(required))
            {
                return Err(RevisionError::environment(format!(
                    "Unknown version control system '{}', supported: {}",
                    required,
                    self.provider_names().join(", ")
                )));
            }
        }

        for provider in &self.providers {
            let name = provider.name();

            if let Some(required) = required_vcs {
                if !name.eq_ignore_ascii_case(required) {
                    continue;
                }
            }

            if !provider.check_environment(logger) {
                logger.trace(&format!("{} is not installed, skipping", name));
                continue;
            }

            let Some(root) = provider.check_directory(path) else {
                logger.trace(&format!("{} is not a {} working directory", path.display(), name));
                continue;
            };

            logger.trace(&format!("Found {} working directory at {}", name, root.display()));
            let request = CollectRequest {
                path,
                root: &root,
                tag_match,
            };
            let snapshot = provider.collect(&request, logger).normalize();
            logger.success(&format!(
                "Collected {} revision {} ({})",
                name,
                snapshot.revision_number,
                short_hash(&snapshot.commit_hash)
            ));
            return Ok(snapshot);
        }

        if let Some(required) = required_vcs {
            return Err(RevisionError::environment(format!(
                "Required version control system '{}' is not available for '{}'",
                required,
                path.display()
            )));
        }

        logger.boundary(&BoundaryWarning::NoVcsDetected {
            path: path.display().to_string(),
        });
        Ok(RevisionSnapshot::placeholder(now))
    }
}

fn short_hash(hash: &str) -> &str {
    hash.get(..7).unwrap_or(hash)
}
