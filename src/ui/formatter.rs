//! Pure formatting functions for diagnostic output.
//!
//! Nothing in here performs I/O; the console logger and the `info` command
//! print what these functions return.

use console::style;

use super::Level;
use crate::domain::RevisionSnapshot;

/// Format a log line with the level marker used on the console.
pub fn format_message(level: Level, message: &str) -> String {
    match level {
        Level::Raw => format!("{}", style(format!("  {}", message)).dim()),
        Level::Trace => format!("{} {}", style("·").dim(), style(message).dim()),
        Level::Success => format!("{} {}", style("✓").green(), message),
        Level::Info => format!("{} {}", style("→").yellow(), message),
        Level::Warning => format!("{} {}", style("⚠ WARNING:").yellow(), message),
        Level::Error => format!("{} {}", style("ERROR:").red(), message),
    }
}

/// Render every snapshot field as an aligned `name: value` list.
pub fn format_snapshot(snapshot: &RevisionSnapshot) -> String {
    let time = |t: Option<chrono::DateTime<chrono::FixedOffset>>| {
        t.map(|t| t.to_rfc3339()).unwrap_or_default()
    };

    let rows = [
        ("VCS", snapshot.vcs.clone()),
        ("Commit", snapshot.commit_hash.clone()),
        ("Revision", snapshot.revision_number.to_string()),
        ("Commit time", time(snapshot.commit_time)),
        ("Author time", time(snapshot.author_time)),
        ("Modified", snapshot.is_modified.to_string()),
        ("Mixed", snapshot.is_mixed.to_string()),
        ("URL", snapshot.repository_url.clone()),
        ("Committer", snapshot.committer_name.clone()),
        ("Committer e-mail", snapshot.committer_email.clone()),
        ("Author", snapshot.author_name.clone()),
        ("Author e-mail", snapshot.author_email.clone()),
        ("Branch", snapshot.branch.clone()),
        ("Tag", snapshot.tag.clone()),
        ("Commits after tag", snapshot.commits_after_tag.to_string()),
    ];

    let width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    rows.iter()
        .map(|(name, value)| format!("{:<width$}  {}", format!("{}:", name), value, width = width + 1))
        .collect::<Vec<_>>()
        .join("\n")
}
