use chrono::{DateTime, Datelike, FixedOffset};

/// Facts about one working directory at the moment it was inspected.
///
/// Providers fill a snapshot while collecting and hand it out through
/// [`RevisionSnapshot::normalize`]; after that it is only read. Missing
/// string data is always an empty string, missing times are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevisionSnapshot {
    /// Name of the provider that produced this snapshot, empty for none
    pub vcs: String,
    pub commit_hash: String,
    pub revision_number: u64,
    pub commit_time: Option<DateTime<FixedOffset>>,
    pub author_time: Option<DateTime<FixedOffset>>,
    pub is_modified: bool,
    /// Subversion working copy containing several revisions
    pub is_mixed: bool,
    pub repository_url: String,
    pub committer_name: String,
    pub committer_email: String,
    pub author_name: String,
    pub author_email: String,
    pub branch: String,
    /// Most recent matching tag, empty when there is none
    pub tag: String,
    /// Zero exactly when the current revision is the tagged one
    pub commits_after_tag: u64,
}

impl RevisionSnapshot {
    /// Commit hash reported when no VCS is available
    pub const EMPTY_HASH: &'static str = "0000000000000000000000000000000000000000";

    /// Snapshot used when no provider applies to a directory.
    pub fn placeholder(now: DateTime<FixedOffset>) -> Self {
        RevisionSnapshot {
            commit_hash: Self::EMPTY_HASH.to_string(),
            commit_time: Some(now),
            author_time: Some(now),
            ..Default::default()
        }
    }

    /// Trim surrounding whitespace and drop control characters from all
    /// text fields so resolved versions never carry them.
    pub fn normalize(mut self) -> Self {
        for field in [
            &mut self.vcs,
            &mut self.commit_hash,
            &mut self.repository_url,
            &mut self.committer_name,
            &mut self.committer_email,
            &mut self.author_name,
            &mut self.author_email,
            &mut self.branch,
            &mut self.tag,
        ] {
            *field = clean_text(field);
        }
        self.commit_hash.make_ascii_lowercase();
        self
    }

    /// True when the checked out revision carries the tag itself
    pub fn is_tagged_release(&self) -> bool {
        !self.tag.is_empty() && self.commits_after_tag == 0
    }

    /// Commit year, if the commit time is known and plausible
    pub fn commit_year(&self) -> Option<i32> {
        self.commit_time.map(|t| t.year()).filter(|year| *year > 1)
    }
}

fn clean_text(value: &str) -> String {
    value.trim().chars().filter(|c| !c.is_control()).collect()
}
