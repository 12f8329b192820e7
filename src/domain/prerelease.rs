//! Pre-release versions derived from the most recent tag
//!
//! A revision that is not exactly tagged gets a version that sorts after the
//! tag: the patch component is incremented and a pre-release label carries
//! the tag's own suffix, the branch and the number of commits since the tag.
//! See <https://semver.org/#spec-item-9>.

use crate::domain::branch::BranchContext;
use crate::domain::snapshot::RevisionSnapshot;
use crate::domain::version::{strip_tag_v, TagVersion, Version};
use crate::error::Result;
use std::fmt;

/// Pre-release label, e.g. `beta.feature-x.4`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreRelease {
    /// Suffix the tag already carried ("beta" for tag "1.0.0-beta")
    pub suffix: Option<String>,
    /// Sanitized branch name, only set off the default branch
    pub branch: Option<String>,
    /// Commits since the tag, or the revision number when there is no tag
    pub count: u64,
}

impl fmt::Display for PreRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.suffix, &self.branch) {
            (Some(suffix), Some(branch)) => write!(f, "{}.{}.{}", suffix, branch, self.count),
            (Some(suffix), None) => write!(f, "{}-{}", suffix, self.count),
            (None, Some(branch)) => write!(f, "{}.{}", branch, self.count),
            (None, None) => write!(f, "{}", self.count),
        }
    }
}

/// Version computed for the `{semvertag}` placeholder family
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseVersion {
    /// The revision is the tagged commit; the tag is used as is
    Tagged(String),
    /// Any other revision
    PreRelease {
        core: Version,
        pre: PreRelease,
        /// Build metadata appended after `+`
        build: Option<String>,
    },
}

impl ReleaseVersion {
    /// Derive the version for a snapshot.
    ///
    /// `build` is the commit hash fragment to append as build metadata; it
    /// is ignored for tagged releases.
    pub fn from_snapshot(
        snapshot: &RevisionSnapshot,
        default_branch: Option<&str>,
        build: Option<&str>,
    ) -> Result<Self> {
        if snapshot.is_tagged_release() {
            return Ok(ReleaseVersion::Tagged(strip_tag_v(&snapshot.tag).to_string()));
        }

        let (core, suffix, count) = match TagVersion::parse(&snapshot.tag) {
            Some(tag) => (tag.core, tag.suffix, snapshot.commits_after_tag),
            None => (Version::default(), None, snapshot.revision_number),
        };

        let branch = BranchContext::new(snapshot.branch.as_str(), default_branch);

        Ok(ReleaseVersion::PreRelease {
            core: core.next_patch()?,
            pre: PreRelease {
                suffix,
                branch: branch.prerelease_identifier(),
                count,
            },
            build: build.filter(|b| !b.is_empty()).map(str::to_string),
        })
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseVersion::Tagged(tag) => write!(f, "{}", tag),
            ReleaseVersion::PreRelease { core, pre, build } => {
                write!(f, "{}-{}", core, pre)?;
                if let Some(build) = build {
                    write!(f, "+{}", build)?;
                }
                Ok(())
            }
        }
    }
}
