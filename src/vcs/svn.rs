use crate::domain::RevisionSnapshot;
use crate::ui::Logger;
use crate::vcs::process::{self, ProcessRunner};
use crate::vcs::{find_metadata_root, CollectRequest, VcsProvider};
use chrono::{DateTime, FixedOffset};
use regex::Regex;
use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

/// Subversion provider driving `svnversion` and `svn info`
#[derive(Debug, Default)]
pub struct SvnProvider {
    runner: ProcessRunner,
}

/// Parsed `svnversion` output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SvnVersion {
    pub revision: u64,
    pub is_mixed: bool,
    pub is_modified: bool,
}

/// Fields of `svn info` that end up in the snapshot
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SvnInfo {
    pub repository_root: String,
    pub relative_url: String,
    pub author: String,
    pub date: Option<DateTime<FixedOffset>>,
}

impl SvnProvider {
    pub fn new(runner: ProcessRunner) -> Self {
        SvnProvider { runner }
    }
}

impl VcsProvider for SvnProvider {
    fn name(&self) -> &str {
        "svn"
    }

    fn check_environment(&self, _logger: &dyn Logger) -> bool {
        process::is_available("svn") && process::is_available("svnversion")
    }

    fn check_directory(&self, path: &Path) -> Option<PathBuf> {
        find_metadata_root(path, ".svn")
    }

    fn collect(&self, request: &CollectRequest<'_>, logger: &dyn Logger) -> RevisionSnapshot {
        let mut snapshot = RevisionSnapshot {
            vcs: self.name().to_string(),
            ..Default::default()
        };

        // svn rejects paths whose case differs from the working copy metadata
        let dir = correct_path_case(request.path);

        let version = self
            .runner
            .run("svnversion", &[], &dir, logger)
            .and_then(|lines| lines.into_iter().find(|l| !l.trim().is_empty()))
            .map(|line| parse_svnversion(&line))
            .unwrap_or_default();

        snapshot.revision_number = version.revision;
        snapshot.is_mixed = version.is_mixed;
        snapshot.is_modified = version.is_modified;

        if snapshot.revision_number == 0 {
            logger.trace("No committed revision in this working copy");
            return snapshot;
        }

        let revision = snapshot.revision_number.to_string();
        let Some(lines) = self
            .runner
            .run("svn", &["info", "--revision", revision.as_str()], &dir, logger)
        else {
            return snapshot;
        };
        let info = parse_info(&lines);

        let root = correct_path_case(request.root);
        let depth = depth_below(&dir, &root);

        snapshot.repository_url = info.repository_root;
        snapshot.branch = branch_from_relative_url(&info.relative_url, depth);
        snapshot.committer_name = info.author.clone();
        snapshot.author_name = info.author;
        snapshot.commit_time = info.date;
        snapshot.author_time = info.date;

        snapshot
    }
}

/// Parse `svnversion` output such as `1234`, `1230:1234M` or `exported`.
///
/// A range marks a mixed-revision working copy; the revision is its first
/// number. Any marker letters after the numbers mean local changes.
pub fn parse_svnversion(line: &str) -> SvnVersion {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^([0-9]+)(?::([0-9]+))?(.*)$").expect("valid svnversion regex")
    });

    let Some(captures) = re.captures(line.trim()) else {
        return SvnVersion::default();
    };

    SvnVersion {
        revision: captures[1].parse().unwrap_or(0),
        is_mixed: captures.get(2).is_some(),
        is_modified: !captures[3].trim().is_empty(),
    }
}

/// Parse the `Key: value` lines of `svn info`.
pub fn parse_info(lines: &[String]) -> SvnInfo {
    static DATE: OnceLock<Regex> = OnceLock::new();
    let date_re = DATE.get_or_init(|| {
        Regex::new(r"^([0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2} [+-][0-9]{4})")
            .expect("valid svn date regex")
    });

    let mut info = SvnInfo::default();
    let mut url = String::new();

    for line in lines {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Repository Root" => info.repository_root = value.to_string(),
            "Relative URL" => info.relative_url = value.to_string(),
            "URL" => url = value.to_string(),
            "Last Changed Author" => info.author = value.to_string(),
            "Last Changed Date" => {
                info.date = date_re
                    .captures(value)
                    .and_then(|c| DateTime::parse_from_str(&c[1], "%Y-%m-%d %H:%M:%S %z").ok());
            }
            _ => {}
        }
    }

    // Clients before 1.8 do not print the relative URL
    if info.relative_url.is_empty() && !info.repository_root.is_empty() {
        if let Some(rest) = url.strip_prefix(&info.repository_root) {
            info.relative_url = format!("^{}", rest);
        }
    }

    info
}

/// Branch name from a relative URL like `^/branches/feature/src`, dropping
/// the `depth` trailing segments that lie below the working copy root.
pub fn branch_from_relative_url(relative_url: &str, depth: usize) -> String {
    let path = relative_url.trim_start_matches('^');
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    segments.truncate(segments.len().saturating_sub(depth));

    let joined = segments.join("/");
    match joined.strip_prefix("branches/") {
        Some(branch) => branch.to_string(),
        None => joined,
    }
}

fn depth_below(path: &Path, root: &Path) -> usize {
    let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
    path.strip_prefix(&root)
        .map(|rest| {
            rest.components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .count()
        })
        .unwrap_or(0)
}

/// Rebuild `path` with the exact spelling of every existing component as
/// stored on disk. Components that cannot be matched are kept as given.
pub fn correct_path_case(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut corrected = PathBuf::new();

    for component in absolute.components() {
        match component {
            Component::Normal(name) => {
                let actual = on_disk_name(&corrected, name).unwrap_or_else(|| name.to_os_string());
                corrected.push(actual);
            }
            other => corrected.push(other.as_os_str()),
        }
    }

    corrected
}

fn on_disk_name(parent: &Path, name: &std::ffi::OsStr) -> Option<OsString> {
    if parent.join(name).symlink_metadata().is_err() {
        return None;
    }

    let wanted = name.to_string_lossy().to_lowercase();
    let mut fallback = None;
    for entry in fs::read_dir(parent).ok()?.flatten() {
        let entry_name = entry.file_name();
        if entry_name == name {
            return Some(entry_name);
        }
        if fallback.is_none() && entry_name.to_string_lossy().to_lowercase() == wanted {
            fallback = Some(entry_name);
        }
    }
    fallback
}
