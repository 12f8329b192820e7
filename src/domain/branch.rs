/// Branch names treated as the default branch when none is configured;
/// `trunk` is what Subversion working copies report
const IMPLICIT_DEFAULT_BRANCHES: [&str; 3] = ["main", "master", "trunk"];

/// The checked out branch, seen relative to the project's default branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchContext {
    pub name: String,
    pub is_default: bool,
}

impl BranchContext {
    /// Create a branch context.
    ///
    /// Without an explicit default branch, `main`, `master` and `trunk` are
    /// defaults.
    pub fn new(name: impl Into<String>, default_branch: Option<&str>) -> Self {
        let name = name.into();
        let is_default = match default_branch {
            Some(default) => name == default,
            None => IMPLICIT_DEFAULT_BRANCHES.contains(&name.as_str()),
        };

        BranchContext { name, is_default }
    }

    /// A detached HEAD or an empty name does not identify a branch
    pub fn is_known(&self) -> bool {
        !self.name.is_empty() && self.name != "HEAD"
    }

    /// Pre-release identifier for this branch, `None` on the default branch
    pub fn prerelease_identifier(&self) -> Option<String> {
        if self.is_known() && !self.is_default {
            Some(sanitize_identifier(&self.name))
        } else {
            None
        }
    }
}

/// Replace every character outside `[0-9A-Za-z-]` with `-`.
pub fn sanitize_identifier(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}
