//! Version template resolution
//!
//! [`TemplateResolver`] turns a template such as `{semvertag+chash:7}` or
//! `1.0.{revnum}{!:-dirty}` into a version string using the data of one
//! [`RevisionSnapshot`] and the ambient inputs in [`ResolveOptions`].
//!
//! Resolution is a pure function of its inputs: the same snapshot, options
//! and template always produce the same text.

pub mod short;
pub mod token;

pub use short::to_short_version;
pub use token::{Segment, Suppressible, Template, TemplateToken};

use crate::boundary::BoundaryWarning;
use crate::domain::{strip_tag_v, ReleaseVersion, RevisionSnapshot, TagVersion};
use crate::error::{RevisionError, Result};
use crate::scheme::{SchemeSpec, TimeSource};
use crate::ui::Logger;
use chrono::{DateTime, Datelike, FixedOffset};

/// Inputs that do not come from the version control system
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveOptions {
    /// Fixed once per build invocation
    pub build_time: DateTime<FixedOffset>,
    /// Build configuration label, e.g. "Release"
    pub build_config: String,
    pub machine_name: String,
    /// Strip a leading `v` before a digit from `{tag}`
    pub remove_tag_v: bool,
    /// Default branch for `{semvertag}` when the placeholder names none
    pub default_branch: Option<String>,
}

impl ResolveOptions {
    pub fn new(build_time: DateTime<FixedOffset>) -> Self {
        ResolveOptions {
            build_time,
            build_config: String::new(),
            machine_name: String::new(),
            remove_tag_v: false,
            default_branch: None,
        }
    }
}

/// Resolves templates against one snapshot
pub struct TemplateResolver<'a> {
    snapshot: &'a RevisionSnapshot,
    options: &'a ResolveOptions,
    logger: &'a dyn Logger,
}

impl<'a> TemplateResolver<'a> {
    pub fn new(
        snapshot: &'a RevisionSnapshot,
        options: &'a ResolveOptions,
        logger: &'a dyn Logger,
    ) -> Self {
        TemplateResolver {
            snapshot,
            options,
            logger,
        }
    }

    /// Resolve every placeholder of `template`.
    ///
    /// # Errors
    /// Format errors for malformed placeholders, bounds errors for values a
    /// placeholder cannot represent.
    pub fn resolve(&self, template: &str) -> Result<String> {
        let parsed = Template::parse(template)?;
        let mut output = String::with_capacity(template.len());

        for segment in &parsed.segments {
            match segment {
                Segment::Text(text) => output.push_str(text),
                Segment::Token(token) => output.push_str(&self.resolve_token(token)?),
            }
        }

        self.logger
            .trace(&format!("Resolved '{}' to '{}'", template, output));
        Ok(output)
    }

    /// Resolve `template` and reduce the result to a dotted numeric version
    /// such as `1.2.4`.
    pub fn resolve_short(&self, template: &str) -> Result<String> {
        let full = self.resolve(template)?;
        to_short_version(&full)
    }

    fn resolve_token(&self, token: &TemplateToken) -> Result<String> {
        let snapshot = self.snapshot;

        let value = match token {
            TemplateToken::CommitHash { upper, length } => {
                let hash = truncate(&snapshot.commit_hash, *length);
                if *upper {
                    hash.to_uppercase()
                } else {
                    hash.to_string()
                }
            }
            TemplateToken::RevisionNumber { offset } => {
                let value = i128::from(snapshot.revision_number) + i128::from(*offset);
                if value < 0 {
                    return Err(RevisionError::bounds(format!(
                        "revision {} with offset {} is negative",
                        snapshot.revision_number, offset
                    )));
                }
                value.to_string()
            }
            TemplateToken::Modified { marker } => {
                if snapshot.is_modified {
                    marker.clone()
                } else {
                    String::new()
                }
            }
            TemplateToken::CommitterName => snapshot.committer_name.clone(),
            TemplateToken::CommitterEmail => snapshot.committer_email.clone(),
            TemplateToken::AuthorName => snapshot.author_name.clone(),
            TemplateToken::AuthorEmail => snapshot.author_email.clone(),
            TemplateToken::MachineName => self.options.machine_name.clone(),
            TemplateToken::TimeZone => self.options.build_time.format("%:z").to_string(),
            TemplateToken::RepositoryUrl => snapshot.repository_url.clone(),
            TemplateToken::BuildConfig(args) => {
                let config = &self.options.build_config;
                match args {
                    None => config.clone(),
                    Some(args) if config.is_empty() || config.eq_ignore_ascii_case(&args.reference) => {
                        String::new()
                    }
                    Some(args) => format!("{}{}", args.separator, config),
                }
            }
            TemplateToken::Branch(args) => {
                let branch = &snapshot.branch;
                match args {
                    None => branch.clone(),
                    Some(args) if branch.is_empty() || *branch == args.reference => String::new(),
                    Some(args) => format!("{}{}", args.separator, branch),
                }
            }
            TemplateToken::Tag { always_strip_v } => {
                if *always_strip_v || self.options.remove_tag_v {
                    strip_tag_v(&snapshot.tag).to_string()
                } else {
                    snapshot.tag.clone()
                }
            }
            TemplateToken::CommitsAfterTag { separator } => match separator {
                None => snapshot.commits_after_tag.to_string(),
                Some(_) if snapshot.commits_after_tag == 0 => String::new(),
                Some(sep) => format!("{}{}", sep, snapshot.commits_after_tag),
            },
            TemplateToken::Copyright { start_year } => self.copyright(*start_year),
            TemplateToken::Time(spec) => self.resolve_time(spec)?,
            TemplateToken::SemVerTag {
                default_branch,
                with_hash,
                hash_length,
            } => self.resolve_semver(default_branch.as_deref(), *with_hash, *hash_length)?,
        };

        Ok(value)
    }

    fn copyright(&self, start_year: Option<i32>) -> String {
        let year = self
            .snapshot
            .commit_year()
            .unwrap_or_else(|| self.options.build_time.year());

        match start_year {
            Some(start) if start != year => format!("{}\u{2013}{}", start, year),
            _ => year.to_string(),
        }
    }

    fn resolve_time(&self, spec: &SchemeSpec) -> Result<String> {
        let known = match spec.source {
            TimeSource::Build => Some(self.options.build_time),
            TimeSource::Commit => self.snapshot.commit_time,
            TimeSource::Author => self.snapshot.author_time,
        };

        let time = match known {
            Some(time) => time,
            None => {
                self.logger.boundary(&BoundaryWarning::MissingTime {
                    source: spec.source.name().to_string(),
                });
                self.options.build_time
            }
        };

        spec.encode(time)
    }

    fn resolve_semver(
        &self,
        default_branch: Option<&str>,
        with_hash: bool,
        hash_length: Option<usize>,
    ) -> Result<String> {
        let snapshot = self.snapshot;
        let default_branch = default_branch
            .or(self.options.default_branch.as_deref())
            .filter(|b| !b.is_empty());

        if !snapshot.tag.is_empty()
            && !snapshot.is_tagged_release()
            && TagVersion::parse(&snapshot.tag).is_none()
        {
            self.logger.boundary(&BoundaryWarning::UnparsableTag {
                tag: snapshot.tag.clone(),
            });
        }

        let build = with_hash.then(|| truncate(&snapshot.commit_hash, hash_length));
        let version = ReleaseVersion::from_snapshot(snapshot, default_branch, build)?.to_string();

        if let Err(e) = semver::Version::parse(&version) {
            self.logger.boundary(&BoundaryWarning::InvalidSemVer {
                version: version.clone(),
                reason: e.to_string(),
            });
        }

        Ok(version)
    }
}

fn truncate(value: &str, length: Option<usize>) -> &str {
    match length {
        Some(n) => value.char_indices().nth(n).map_or(value, |(i, _)| &value[..i]),
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::{Level, MemoryLogger, NullLogger};
    use chrono::TimeZone;

    const HASH: &str = "abcdef1234567890abcdef1234567890abcdef12";

    fn time(year: i32, month: u32, day: u32, hour: u32, min: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(year, month, day, hour, min, 0)
            .unwrap()
    }

    fn snapshot() -> RevisionSnapshot {
        RevisionSnapshot {
            vcs: "git".to_string(),
            commit_hash: HASH.to_string(),
            revision_number: 358,
            commit_time: Some(time(2015, 3, 4, 10, 20)),
            author_time: Some(time(2015, 3, 3, 9, 0)),
            committer_name: "Carol".to_string(),
            committer_email: "carol@example.org".to_string(),
            author_name: "Alan".to_string(),
            author_email: "alan@example.org".to_string(),
            repository_url: "https://example.org/repo.git".to_string(),
            branch: "main".to_string(),
            ..Default::default()
        }
    }

    fn options() -> ResolveOptions {
        ResolveOptions {
            build_config: "Release".to_string(),
            machine_name: "BUILD01".to_string(),
            ..ResolveOptions::new(time(2024, 6, 1, 12, 0))
        }
    }

    fn resolve(snapshot: &RevisionSnapshot, template: &str) -> String {
        let options = options();
        TemplateResolver::new(snapshot, &options, &NullLogger)
            .resolve(template)
            .unwrap()
    }

    #[test]
    fn test_literal_template_unchanged() {
        assert_eq!(resolve(&snapshot(), "1.2.3"), "1.2.3");
        assert_eq!(resolve(&snapshot(), ""), "");
    }

    #[test]
    fn test_revnum_template() {
        assert_eq!(resolve(&snapshot(), "0.0.{revnum}"), "0.0.358");
        assert_eq!(resolve(&snapshot(), "{revnum+2}.{revnum-8}"), "360.350");
    }

    #[test]
    fn test_negative_revnum_is_bounds_error() {
        let options = options();
        let err = TemplateResolver::new(&snapshot(), &options, &NullLogger)
            .resolve("{revnum-400}")
            .unwrap_err();
        assert!(matches!(err, RevisionError::Bounds(_)));
    }

    #[test]
    fn test_hash_placeholders() {
        let s = snapshot();
        assert_eq!(resolve(&s, "{chash}"), HASH);
        assert_eq!(resolve(&s, "{chash:7}"), "abcdef1");
        assert_eq!(resolve(&s, "{CHASH:4}"), "ABCD");
        assert_eq!(resolve(&s, "{chash:100}"), HASH);
    }

    #[test]
    fn test_modified_marker() {
        let mut s = snapshot();
        assert_eq!(resolve(&s, "1.0{!:-mod}"), "1.0");
        s.is_modified = true;
        assert_eq!(resolve(&s, "1.0{!:-mod}"), "1.0-mod");
        assert_eq!(resolve(&s, "1.0{!}"), "1.0!");
    }

    #[test]
    fn test_identity_placeholders() {
        assert_eq!(
            resolve(&snapshot(), "{cname} <{cmail}> {aname} <{amail}> @{mname} {url}"),
            "Carol <carol@example.org> Alan <alan@example.org> @BUILD01 https://example.org/repo.git"
        );
    }

    #[test]
    fn test_time_zone_of_build_time() {
        assert_eq!(resolve(&snapshot(), "{tz}"), "+02:00");
    }

    #[test]
    fn test_branch_suppression() {
        let mut s = snapshot();
        assert_eq!(resolve(&s, "x{branch:-:main}"), "x");
        s.branch = "feature/x".to_string();
        assert_eq!(resolve(&s, "x{branch:-:main}"), "x-feature/x");
        assert_eq!(resolve(&s, "{branch}"), "feature/x");
        s.branch = String::new();
        assert_eq!(resolve(&s, "x{branch:-:main}"), "x");
    }

    #[test]
    fn test_build_config_suppression() {
        let s = snapshot();
        assert_eq!(resolve(&s, "{bconf}"), "Release");
        assert_eq!(resolve(&s, "1.0{bconf:-:release}"), "1.0");
        assert_eq!(resolve(&s, "1.0{bconf:-:Debug}"), "1.0-Release");
    }

    #[test]
    fn test_tag_placeholders() {
        let mut s = snapshot();
        s.tag = "v1.2.3".to_string();
        s.commits_after_tag = 4;
        assert_eq!(resolve(&s, "{tag}"), "v1.2.3");
        assert_eq!(resolve(&s, "{tag:nov}"), "1.2.3");
        assert_eq!(resolve(&s, "{tagadd}"), "4");
        assert_eq!(resolve(&s, "{tag:nov}{tagadd:.}"), "1.2.3.4");

        s.commits_after_tag = 0;
        assert_eq!(resolve(&s, "{tag:nov}{tagadd:.}"), "1.2.3");
    }

    #[test]
    fn test_remove_tag_v_option() {
        let mut s = snapshot();
        s.tag = "v2.0".to_string();
        let options = ResolveOptions {
            remove_tag_v: true,
            ..options()
        };
        let resolved = TemplateResolver::new(&s, &options, &NullLogger)
            .resolve("{tag}")
            .unwrap();
        assert_eq!(resolved, "2.0");
    }

    #[test]
    fn test_copyright_year() {
        let mut s = snapshot();
        assert_eq!(resolve(&s, "{copyright}"), "2015");
        assert_eq!(resolve(&s, "{copyright:2010-}"), "2010\u{2013}2015");
        assert_eq!(resolve(&s, "{copyright:2015-}"), "2015");

        s.commit_time = None;
        assert_eq!(resolve(&s, "{copyright}"), "2024");
    }

    #[test]
    fn test_semvertag_on_default_branch_without_tag() {
        assert_eq!(resolve(&snapshot(), "{semvertag}"), "0.0.1-358");
    }

    #[test]
    fn test_semvertag_feature_branch_with_hash() {
        let mut s = snapshot();
        s.tag = "v1.0.0".to_string();
        s.commits_after_tag = 4;
        s.branch = "feature/x".to_string();
        assert_eq!(
            resolve(&s, "{semvertag+chash:7}"),
            "1.0.1-feature-x.4+abcdef1"
        );
    }

    #[test]
    fn test_semvertag_tagged_release() {
        let mut s = snapshot();
        s.tag = "v1.2.3".to_string();
        assert_eq!(resolve(&s, "{semvertag+chash:7}"), "1.2.3");
    }

    #[test]
    fn test_semvertag_inline_default_branch() {
        let mut s = snapshot();
        s.tag = "1.4".to_string();
        s.commits_after_tag = 2;
        s.branch = "develop".to_string();
        assert_eq!(resolve(&s, "{semvertag}"), "1.4.1-develop.2");
        assert_eq!(resolve(&s, "{semvertag:develop}"), "1.4.1-2");
    }

    #[test]
    fn test_semvertag_configured_default_branch() {
        let mut s = snapshot();
        s.branch = "trunk".to_string();
        let options = ResolveOptions {
            default_branch: Some("trunk".to_string()),
            ..options()
        };
        let resolved = TemplateResolver::new(&s, &options, &NullLogger)
            .resolve("{semvertag}")
            .unwrap();
        assert_eq!(resolved, "0.0.1-358");
    }

    #[test]
    fn test_semvertag_unparsable_tag_warns() {
        let mut s = snapshot();
        s.tag = "release-candidate".to_string();
        s.commits_after_tag = 3;
        let logger = MemoryLogger::new();
        let options = options();
        let resolved = TemplateResolver::new(&s, &options, &logger)
            .resolve("{semvertag}")
            .unwrap();

        assert_eq!(resolved, "0.0.1-358");
        let warnings = logger.messages(Level::Warning);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("release-candidate"));
    }

    #[test]
    fn test_semvertag_invalid_result_warns() {
        let mut s = snapshot();
        s.tag = "1.0.0-beta..x".to_string();
        s.commits_after_tag = 1;
        let logger = MemoryLogger::new();
        let options = options();
        let resolved = TemplateResolver::new(&s, &options, &logger)
            .resolve("{semvertag}")
            .unwrap();

        assert_eq!(resolved, "1.0.1-beta..x-1");
        assert_eq!(logger.messages(Level::Warning).len(), 1);
    }

    #[test]
    fn test_time_placeholders() {
        let s = snapshot();
        assert_eq!(resolve(&s, "{cu:ymd-}"), "2015-03-04");
        assert_eq!(resolve(&s, "{bu:ymd.}"), "2024.06.01");
        assert_eq!(resolve(&s, "{bu:hm:}"), "10:00");
    }

    #[test]
    fn test_missing_commit_time_falls_back_to_build_time() {
        let mut s = snapshot();
        s.commit_time = None;
        let logger = MemoryLogger::new();
        let options = options();
        let resolved = TemplateResolver::new(&s, &options, &logger)
            .resolve("{cu:ymd-}")
            .unwrap();

        assert_eq!(resolved, "2024-06-01");
        assert!(logger.messages(Level::Warning)[0].contains("commit"));
    }

    #[test]
    fn test_unknown_placeholder_passes_through() {
        assert_eq!(resolve(&snapshot(), "{foo}-{revnum}"), "{foo}-358");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let mut s = snapshot();
        s.branch = "{revnum}".to_string();
        assert_eq!(resolve(&s, "{branch}"), "{revnum}");
    }

    #[test]
    fn test_malformed_placeholder_is_format_error() {
        let options = options();
        let err = TemplateResolver::new(&snapshot(), &options, &NullLogger)
            .resolve("1.{chash:abc}")
            .unwrap_err();
        assert!(matches!(err, RevisionError::Format(_)));
    }

    #[test]
    fn test_resolve_short() {
        let mut s = snapshot();
        s.tag = "v1.0.0".to_string();
        s.commits_after_tag = 4;
        s.branch = "feature/x".to_string();
        let options = options();
        let resolver = TemplateResolver::new(&s, &options, &NullLogger);

        assert_eq!(resolver.resolve_short("{semvertag+chash:7}").unwrap(), "1.0.1");
        assert_eq!(resolver.resolve_short("0.0.{revnum}").unwrap(), "0.0.358");
        assert!(resolver.resolve_short("{revnum}").is_err());
    }

    #[test]
    fn test_resolve_short_idempotent() {
        let s = snapshot();
        let options = options();
        let resolver = TemplateResolver::new(&s, &options, &NullLogger);
        let once = resolver.resolve_short("1.{revnum}.0-beta").unwrap();
        assert_eq!(resolver.resolve_short(&once).unwrap(), once);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let s = snapshot();
        let template = "{semvertag}+{c:b28-20m:2010:4}.{tz}";
        assert_eq!(resolve(&s, template), resolve(&s, template));
    }
}
