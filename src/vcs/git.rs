use crate::domain::RevisionSnapshot;
use crate::ui::Logger;
use crate::vcs::ci::{BranchResolver, NoCiBranch};
use crate::vcs::process::{self, ProcessRunner};
use crate::vcs::{find_metadata_root, CollectRequest, VcsProvider};
use chrono::{DateTime, FixedOffset};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// `git log` format: one field per line
const LOG_FORMAT: &str = "--format=format:%H%n%ci%n%ai%n%cN%n%cE%n%aN%n%aE";

/// Date layout of `%ci` and `%ai`
const GIT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Git provider driving the `git` command line
pub struct GitProvider {
    runner: ProcessRunner,
    branch_resolver: Box<dyn BranchResolver>,
}

impl Default for GitProvider {
    fn default() -> Self {
        GitProvider::new(ProcessRunner::default(), Box::new(NoCiBranch))
    }
}

impl GitProvider {
    pub fn new(runner: ProcessRunner, branch_resolver: Box<dyn BranchResolver>) -> Self {
        GitProvider {
            runner,
            branch_resolver,
        }
    }

    fn git(&self, args: &[&str], dir: &Path, logger: &dyn Logger) -> Option<Vec<String>> {
        self.runner.run("git", args, dir, logger)
    }

    fn first_line(&self, args: &[&str], dir: &Path, logger: &dyn Logger) -> Option<String> {
        self.git(args, dir, logger)?
            .into_iter()
            .map(|line| line.trim().to_string())
            .find(|line| !line.is_empty())
    }
}

impl VcsProvider for GitProvider {
    fn name(&self) -> &str {
        "git"
    }

    fn check_environment(&self, _logger: &dyn Logger) -> bool {
        process::is_available("git")
    }

    fn check_directory(&self, path: &Path) -> Option<PathBuf> {
        // `.git` is a file in worktrees and submodules
        find_metadata_root(path, ".git")
    }

    fn collect(&self, request: &CollectRequest<'_>, logger: &dyn Logger) -> RevisionSnapshot {
        let dir = request.path;
        let mut snapshot = RevisionSnapshot {
            vcs: self.name().to_string(),
            ..Default::default()
        };

        if let Some(lines) = self.git(&["log", "-n", "1", LOG_FORMAT], dir, logger) {
            apply_log(&lines, &mut snapshot);
        }
        if snapshot.commit_hash.is_empty() {
            logger.trace("No commit found, the repository may be empty");
            return snapshot;
        }

        if let Some(count) = self
            .first_line(&["rev-list", "--first-parent", "--count", "HEAD"], dir, logger)
            .and_then(|line| parse_count(&line))
        {
            snapshot.revision_number = count;
        }

        if let Some(lines) = self.git(&["status", "--porcelain", "--untracked-files=no"], dir, logger) {
            snapshot.is_modified = lines.iter().any(|line| !line.trim().is_empty());
        }

        if let Some(url) = self.first_line(&["config", "--get", "remote.origin.url"], dir, logger) {
            snapshot.repository_url = url;
        }

        let reported = self
            .first_line(&["rev-parse", "--abbrev-ref", "HEAD"], dir, logger)
            .unwrap_or_default();
        snapshot.branch = self.branch_resolver.resolve(&reported);

        let mut describe = vec!["describe", "--tags", "--first-parent", "--long"];
        let tag_match = request.tag_match.trim();
        if !tag_match.is_empty() && tag_match != "*" {
            describe.extend(["--match", tag_match]);
        }
        if let Some((tag, after)) = self
            .first_line(&describe, dir, logger)
            .and_then(|line| parse_describe(&line))
        {
            snapshot.tag = tag;
            snapshot.commits_after_tag = after;
        }

        snapshot
    }
}

fn hash_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9a-fA-F]{40,64}$").expect("valid hash regex"))
}

/// Fill commit hash, times and identities from the `git log` output.
/// Lines that do not have the expected shape leave their field unset.
pub(crate) fn apply_log(lines: &[String], snapshot: &mut RevisionSnapshot) {
    let field = |index: usize| lines.get(index).map(|l| l.trim()).unwrap_or("");

    if hash_regex().is_match(field(0)) {
        snapshot.commit_hash = field(0).to_lowercase();
    }
    snapshot.commit_time = parse_git_date(field(1));
    snapshot.author_time = parse_git_date(field(2));
    snapshot.committer_name = field(3).to_string();
    snapshot.committer_email = field(4).to_string();
    snapshot.author_name = field(5).to_string();
    snapshot.author_email = field(6).to_string();
}

fn parse_git_date(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(value, GIT_DATE_FORMAT).ok()
}

pub(crate) fn parse_count(line: &str) -> Option<u64> {
    line.trim().parse().ok()
}

/// Split `git describe --long` output `<tag>-<count>-g<hash>`.
pub(crate) fn parse_describe(line: &str) -> Option<(String, u64)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^(.*)-([0-9]+)-g[0-9a-fA-F]+$").expect("valid describe regex")
    });

    let captures = re.captures(line.trim())?;
    let after = captures[2].parse().ok()?;
    Some((captures[1].to_string(), after))
}
