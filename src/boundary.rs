use std::fmt;

/// Non-fatal conditions met while collecting or resolving a version.
/// These are reported through the logger and never abort resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// No version control system was detected, a placeholder snapshot is used
    NoVcsDetected { path: String },
    /// Tag exists but does not have a dotted numeric version core
    UnparsableTag { tag: String },
    /// The composed SemVer string is not valid Semantic Versioning 2.0
    InvalidSemVer { version: String, reason: String },
    /// A time placeholder referenced a time the snapshot does not know
    MissingTime { source: String },
    /// A VCS command did not finish in time and was killed
    CommandTimedOut { command: String, timeout_ms: u64 },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::NoVcsDetected { path } => {
                write!(
                    f,
                    "No version control system found for '{}', using placeholder revision data",
                    path
                )
            }
            BoundaryWarning::UnparsableTag { tag } => {
                write!(
                    f,
                    "Tag '{}' is not a numeric version, falling back to the revision number",
                    tag
                )
            }
            BoundaryWarning::InvalidSemVer { version, reason } => {
                write!(f, "'{}' is not a valid semantic version: {}", version, reason)
            }
            BoundaryWarning::MissingTime { source } => {
                write!(f, "The {} time is unknown, using the build time instead", source)
            }
            BoundaryWarning::CommandTimedOut {
                command,
                timeout_ms,
            } => {
                write!(
                    f,
                    "Command '{}' did not complete within {} ms and was terminated",
                    command, timeout_ms
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unparsable_tag_display() {
        let warning = BoundaryWarning::UnparsableTag {
            tag: "release-x".to_string(),
        };
        let msg = warning.to_string();
        assert!(msg.contains("release-x"));
        assert!(msg.contains("revision number"));
    }

    #[test]
    fn test_timeout_display() {
        let warning = BoundaryWarning::CommandTimedOut {
            command: "git status --porcelain".to_string(),
            timeout_ms: 1000,
        };
        assert_eq!(
            warning.to_string(),
            "Command 'git status --porcelain' did not complete within 1000 ms and was terminated"
        );
    }

    #[test]
    fn test_invalid_semver_display() {
        let warning = BoundaryWarning::InvalidSemVer {
            version: "1.2".to_string(),
            reason: "unexpected end of input".to_string(),
        };
        assert!(warning.to_string().starts_with("'1.2' is not a valid"));
    }
}
