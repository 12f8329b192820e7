use crate::error::{RevisionError, Result};

/// Largest value a component of a short version may take
pub const MAX_COMPONENT: u32 = 65_534;

/// Reduce a resolved version to its leading dotted-numeric part.
///
/// `1.2.3-beta.4` becomes `1.2.3`. The result must have two to four
/// components, each at most [`MAX_COMPONENT`].
pub fn to_short_version(resolved: &str) -> Result<String> {
    let end = resolved
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(resolved.len());
    let short = resolved[..end].trim_end_matches('.');

    if !short.contains('.') {
        return Err(RevisionError::format(format!(
            "'{}' does not start with a dotted numeric version",
            resolved
        )));
    }

    let components: Vec<&str> = short.split('.').collect();
    if components.len() > 4 || components.iter().any(|c| c.is_empty()) {
        return Err(RevisionError::format(format!(
            "'{}' is not a version of two to four numeric components",
            short
        )));
    }

    for component in &components {
        let in_range = component
            .parse::<u64>()
            .map(|value| value <= u64::from(MAX_COMPONENT))
            .unwrap_or(false);
        if !in_range {
            return Err(RevisionError::bounds(format!(
                "component {} of '{}' exceeds {}",
                component, short, MAX_COMPONENT
            )));
        }
    }

    Ok(short.to_string())
}
