//! Branch name overrides for CI systems that build on a detached HEAD.

use serde::{Deserialize, Serialize};

/// Lookup of an environment variable by name
pub type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Decides which branch name to report for a Git working directory.
pub trait BranchResolver: Send + Sync {
    /// Return the branch to use, given the one `git rev-parse` reported.
    fn resolve(&self, reported: &str) -> String;
}

/// Strategy selected in the configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CiBranch {
    /// GitLab CI: use `CI_COMMIT_REF_NAME` unless a tag is being built
    #[default]
    Gitlab,
    /// Always use the branch reported by Git
    None,
}

impl CiBranch {
    /// Build the resolver for this strategy, reading the process environment
    pub fn resolver(self) -> Box<dyn BranchResolver> {
        match self {
            CiBranch::Gitlab => Box::new(GitLabCiBranch::from_process_env()),
            CiBranch::None => Box::new(NoCiBranch),
        }
    }
}

/// Never overrides the reported branch
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCiBranch;

impl BranchResolver for NoCiBranch {
    fn resolve(&self, reported: &str) -> String {
        reported.to_string()
    }
}

/// GitLab CI checks out a detached HEAD; the branch is only known from
/// its environment variables.
pub struct GitLabCiBranch {
    env: EnvLookup,
}

impl GitLabCiBranch {
    pub fn from_process_env() -> Self {
        Self::with_env(Box::new(|name| std::env::var(name).ok()))
    }

    pub fn with_env(env: EnvLookup) -> Self {
        GitLabCiBranch { env }
    }

    fn var(&self, name: &str) -> String {
        (self.env)(name).unwrap_or_default().trim().to_string()
    }
}

impl BranchResolver for GitLabCiBranch {
    fn resolve(&self, reported: &str) -> String {
        let in_gitlab = !self.var("GITLAB_CI").is_empty() || !self.var("CI_SERVER").is_empty();
        if !in_gitlab {
            return reported.to_string();
        }

        let ref_name = self.var("CI_COMMIT_REF_NAME");
        let tag = self.var("CI_COMMIT_TAG");
        if !ref_name.is_empty() && tag.is_empty() {
            ref_name
        } else {
            reported.to_string()
        }
    }
}
