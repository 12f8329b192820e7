use crate::error::{RevisionError, Result};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Numeric version core `major.minor.patch`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Create a new version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Parse a dotted core with one to three components, padding the
    /// missing trailing components with zero ("1.2" -> 1.2.0).
    pub fn parse_core(core: &str) -> Result<Self> {
        let parts: Vec<&str> = core.split('.').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(RevisionError::format(format!(
                "Invalid version core: '{}' - expected X[.Y[.Z]]",
                core
            )));
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = part.parse::<u64>().map_err(|_| {
                RevisionError::format(format!("Invalid version component '{}' in '{}'", part, core))
            })?;
        }

        Ok(Version::new(numbers[0], numbers[1], numbers[2]))
    }

    /// The next patch release, the smallest version sorting after this one
    pub fn next_patch(&self) -> Result<Self> {
        let patch = self.patch.checked_add(1).ok_or_else(|| {
            RevisionError::bounds(format!("Patch component of {} cannot be incremented", self))
        })?;
        Ok(Version { patch, ..*self })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A tag name split into its numeric core and optional pre-release suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagVersion {
    pub core: Version,
    pub suffix: Option<String>,
}

fn tag_shape() -> &'static Regex {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    SHAPE.get_or_init(|| {
        Regex::new(r"^([0-9]+(\.[0-9]+(\.[0-9]+)?)?)(?:-(.+))?$").expect("valid tag shape regex")
    })
}

impl TagVersion {
    /// Parse a tag such as "1.0.0-beta" or "2.1".
    ///
    /// A leading `v` before a digit is ignored. Returns `None` when the tag
    /// does not have the dotted numeric shape.
    pub fn parse(tag: &str) -> Option<Self> {
        let captures = tag_shape().captures(strip_tag_v(tag))?;
        let core = Version::parse_core(captures.get(1)?.as_str()).ok()?;
        let suffix = captures.get(4).map(|m| m.as_str().to_string());

        Some(TagVersion { core, suffix })
    }
}

/// Remove a leading `v` or `V` when it is directly followed by a digit.
///
/// # Example
/// ```ignore
/// assert_eq!(strip_tag_v("v1.2.3"), "1.2.3");
/// assert_eq!(strip_tag_v("version"), "version");
/// ```
pub fn strip_tag_v(tag: &str) -> &str {
    let mut chars = tag.chars();
    match (chars.next(), chars.next()) {
        (Some('v' | 'V'), Some(c)) if c.is_ascii_digit() => &tag[1..],
        _ => tag,
    }
}
