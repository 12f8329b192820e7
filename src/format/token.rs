//! Template parsing
//!
//! A template is plain text with `{...}` placeholders. Parsing splits it into
//! [`Segment`]s once; resolved values are never scanned again, so data such
//! as a branch name cannot smuggle in another placeholder.

use crate::error::{RevisionError, Result};
use crate::scheme::{is_time_token, SchemeSpec};
use regex::Regex;
use std::sync::OnceLock;

/// `sep` + value, or nothing when the value equals `reference`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suppressible {
    pub separator: String,
    pub reference: String,
}

/// A parsed placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateToken {
    CommitHash {
        upper: bool,
        length: Option<usize>,
    },
    RevisionNumber {
        offset: i64,
    },
    /// Emitted only for modified working copies
    Modified {
        marker: String,
    },
    CommitterName,
    CommitterEmail,
    AuthorName,
    AuthorEmail,
    MachineName,
    TimeZone,
    RepositoryUrl,
    BuildConfig(Option<Suppressible>),
    Branch(Option<Suppressible>),
    Tag {
        /// Strip a leading `v` even when the option is off
        always_strip_v: bool,
    },
    CommitsAfterTag {
        separator: Option<String>,
    },
    Copyright {
        start_year: Option<i32>,
    },
    Time(SchemeSpec),
    SemVerTag {
        default_branch: Option<String>,
        with_hash: bool,
        hash_length: Option<usize>,
    },
}

/// Piece of a parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Token(TemplateToken),
}

/// A template split into literal text and placeholders
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Template {
    pub segments: Vec<Segment>,
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{[^{}]*\}").expect("valid placeholder regex"))
}

impl Template {
    /// Parse `text`. Unknown placeholders stay in the output as literal
    /// text; known placeholders with malformed arguments are an error.
    pub fn parse(text: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut last = 0;

        for m in placeholder_regex().find_iter(text) {
            literal.push_str(&text[last..m.start()]);
            last = m.end();

            match TemplateToken::parse(m.as_str())? {
                Some(token) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Token(token));
                }
                None => literal.push_str(m.as_str()),
            }
        }

        literal.push_str(&text[last..]);
        if !literal.is_empty() {
            segments.push(Segment::Text(literal));
        }

        Ok(Template { segments })
    }
}

impl TemplateToken {
    /// Parse one `{...}` placeholder. `Ok(None)` means the placeholder does
    /// not belong to any known family.
    pub fn parse(token: &str) -> Result<Option<Self>> {
        if is_time_token(token) {
            return Ok(Some(TemplateToken::Time(SchemeSpec::parse(token)?)));
        }

        let inner = token
            .strip_prefix('{')
            .and_then(|t| t.strip_suffix('}'))
            .unwrap_or(token);

        let name_len = if inner.starts_with('!') {
            1
        } else {
            inner
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(inner.len())
        };
        let (name, rest) = inner.split_at(name_len);
        let bad = |why: &str| RevisionError::format(format!("{} in placeholder '{}'", why, token));

        let parsed = match name {
            "chash" | "CHASH" => TemplateToken::CommitHash {
                upper: name == "CHASH",
                length: match rest {
                    "" => None,
                    _ => Some(positive_length(rest.strip_prefix(':'), &bad)?),
                },
            },
            "revnum" => {
                let offset = match rest {
                    "" => 0,
                    _ if rest.starts_with('+') || rest.starts_with('-') => {
                        let digits = &rest[1..];
                        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                            return Err(bad("Invalid revision offset"));
                        }
                        rest.parse::<i64>()
                            .map_err(|_| bad("Revision offset out of range"))?
                    }
                    _ => return Err(bad("Expected +N or -N")),
                };
                TemplateToken::RevisionNumber { offset }
            }
            "!" => TemplateToken::Modified {
                marker: match rest {
                    "" => "!".to_string(),
                    _ => rest
                        .strip_prefix(':')
                        .ok_or_else(|| bad("Expected ':' before the marker text"))?
                        .to_string(),
                },
            },
            "cname" | "cmail" | "aname" | "amail" | "mname" | "tz" | "url" => {
                if !rest.is_empty() {
                    return Err(bad("Unexpected arguments"));
                }
                match name {
                    "cname" => TemplateToken::CommitterName,
                    "cmail" => TemplateToken::CommitterEmail,
                    "aname" => TemplateToken::AuthorName,
                    "amail" => TemplateToken::AuthorEmail,
                    "mname" => TemplateToken::MachineName,
                    "tz" => TemplateToken::TimeZone,
                    _ => TemplateToken::RepositoryUrl,
                }
            }
            "bconf" | "branch" => {
                let args = match rest {
                    "" => None,
                    _ => {
                        let (separator, reference) = rest
                            .strip_prefix(':')
                            .and_then(|r| r.split_once(':'))
                            .ok_or_else(|| bad("Expected ':<separator>:<reference>'"))?;
                        Some(Suppressible {
                            separator: separator.to_string(),
                            reference: reference.to_string(),
                        })
                    }
                };
                if name == "bconf" {
                    TemplateToken::BuildConfig(args)
                } else {
                    TemplateToken::Branch(args)
                }
            }
            "tag" => TemplateToken::Tag {
                always_strip_v: match rest {
                    "" => false,
                    ":nov" => true,
                    _ => return Err(bad("Expected {tag} or {tag:nov}")),
                },
            },
            "tagadd" => TemplateToken::CommitsAfterTag {
                separator: match rest {
                    "" => None,
                    _ => Some(
                        rest.strip_prefix(':')
                            .ok_or_else(|| bad("Expected ':' before the separator"))?
                            .to_string(),
                    ),
                },
            },
            "copyright" => TemplateToken::Copyright {
                start_year: match rest {
                    "" => None,
                    _ => Some(
                        rest.strip_prefix(':')
                            .and_then(|r| r.strip_suffix('-'))
                            .filter(|y| y.len() == 4)
                            .and_then(|y| y.parse::<i32>().ok())
                            .ok_or_else(|| bad("Expected ':YYYY-'"))?,
                    ),
                },
            },
            "semvertag" => parse_semver(rest).ok_or_else(|| bad("Invalid semvertag arguments"))?,
            _ => return Ok(None),
        };

        Ok(Some(parsed))
    }
}

fn positive_length(
    arg: Option<&str>,
    bad: &dyn Fn(&str) -> RevisionError,
) -> Result<usize> {
    arg.and_then(|a| a.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| bad("Expected a positive length"))
}

fn parse_semver(rest: &str) -> Option<TemplateToken> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^(?::([^+]+))?(\+chash(?::([0-9]+))?)?$").expect("valid semvertag regex")
    });

    let captures = re.captures(rest)?;
    let hash_length = match captures.get(3) {
        Some(m) => Some(m.as_str().parse::<usize>().ok().filter(|n| *n > 0)?),
        None => None,
    };

    Some(TemplateToken::SemVerTag {
        default_branch: captures.get(1).map(|m| m.as_str().to_string()),
        with_hash: captures.get(2).is_some(),
        hash_length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::TimeSource;

    fn token(text: &str) -> TemplateToken {
        TemplateToken::parse(text).unwrap().unwrap()
    }

    #[test]
    fn test_parse_hash_tokens() {
        assert_eq!(
            token("{chash}"),
            TemplateToken::CommitHash {
                upper: false,
                length: None
            }
        );
        assert_eq!(
            token("{CHASH:8}"),
            TemplateToken::CommitHash {
                upper: true,
                length: Some(8)
            }
        );
        assert!(TemplateToken::parse("{chash:0}").is_err());
        assert!(TemplateToken::parse("{chash:x}").is_err());
        assert!(TemplateToken::parse("{chash8}").is_err());
    }

    #[test]
    fn test_parse_revnum() {
        assert_eq!(token("{revnum}"), TemplateToken::RevisionNumber { offset: 0 });
        assert_eq!(token("{revnum+5}"), TemplateToken::RevisionNumber { offset: 5 });
        assert_eq!(token("{revnum-12}"), TemplateToken::RevisionNumber { offset: -12 });
        assert!(TemplateToken::parse("{revnum+}").is_err());
        assert!(TemplateToken::parse("{revnum*2}").is_err());
    }

    #[test]
    fn test_parse_modified() {
        assert_eq!(
            token("{!}"),
            TemplateToken::Modified {
                marker: "!".to_string()
            }
        );
        assert_eq!(
            token("{!:-mod}"),
            TemplateToken::Modified {
                marker: "-mod".to_string()
            }
        );
    }

    #[test]
    fn test_parse_suppressible() {
        assert_eq!(
            token("{branch:-:main}"),
            TemplateToken::Branch(Some(Suppressible {
                separator: "-".to_string(),
                reference: "main".to_string()
            }))
        );
        assert_eq!(token("{bconf}"), TemplateToken::BuildConfig(None));
        assert!(TemplateToken::parse("{branch:-}").is_err());
    }

    #[test]
    fn test_parse_tag_family() {
        assert_eq!(token("{tag}"), TemplateToken::Tag { always_strip_v: false });
        assert_eq!(token("{tag:nov}"), TemplateToken::Tag { always_strip_v: true });
        assert_eq!(
            token("{tagadd:.}"),
            TemplateToken::CommitsAfterTag {
                separator: Some(".".to_string())
            }
        );
        assert!(TemplateToken::parse("{tag:x}").is_err());
    }

    #[test]
    fn test_parse_copyright() {
        assert_eq!(token("{copyright}"), TemplateToken::Copyright { start_year: None });
        assert_eq!(
            token("{copyright:2015-}"),
            TemplateToken::Copyright {
                start_year: Some(2015)
            }
        );
        assert!(TemplateToken::parse("{copyright:15-}").is_err());
    }

    #[test]
    fn test_parse_semvertag_variants() {
        assert_eq!(
            token("{semvertag}"),
            TemplateToken::SemVerTag {
                default_branch: None,
                with_hash: false,
                hash_length: None
            }
        );
        assert_eq!(
            token("{semvertag+chash:7}"),
            TemplateToken::SemVerTag {
                default_branch: None,
                with_hash: true,
                hash_length: Some(7)
            }
        );
        assert_eq!(
            token("{semvertag:develop+chash}"),
            TemplateToken::SemVerTag {
                default_branch: Some("develop".to_string()),
                with_hash: true,
                hash_length: None
            }
        );
        assert!(TemplateToken::parse("{semvertag+hash}").is_err());
    }

    #[test]
    fn test_parse_time_token() {
        match token("{c:d20m:2020}") {
            TemplateToken::Time(spec) => assert_eq!(spec.source, TimeSource::Commit),
            other => panic!("unexpected {:?}", other),
        }
        assert!(TemplateToken::parse("{c:nope}").is_err());
    }

    #[test]
    fn test_time_family_does_not_shadow_other_tokens() {
        assert!(matches!(token("{bu:hms}"), TemplateToken::Time(_)));
        assert!(matches!(token("{a:h:2010-04}"), TemplateToken::Time(_)));
        assert_eq!(token("{bconf}"), TemplateToken::BuildConfig(None));
        assert_eq!(token("{cname}"), TemplateToken::CommitterName);
        assert_eq!(token("{amail}"), TemplateToken::AuthorEmail);
    }

    #[test]
    fn test_unknown_placeholders() {
        assert_eq!(TemplateToken::parse("{version}").unwrap(), None);
        assert_eq!(TemplateToken::parse("{}").unwrap(), None);
        assert_eq!(TemplateToken::parse("{c}").unwrap(), None);
    }

    #[test]
    fn test_template_segments() {
        let template = Template::parse("v{revnum}-{unknown}.x{!}").unwrap();
        assert_eq!(
            template.segments,
            vec![
                Segment::Text("v".to_string()),
                Segment::Token(TemplateToken::RevisionNumber { offset: 0 }),
                Segment::Text("-{unknown}.x".to_string()),
                Segment::Token(TemplateToken::Modified {
                    marker: "!".to_string()
                }),
            ]
        );
    }

    #[test]
    fn test_template_without_placeholders() {
        let template = Template::parse("1.2.3").unwrap();
        assert_eq!(template.segments, vec![Segment::Text("1.2.3".to_string())]);
        assert!(Template::parse("").unwrap().segments.is_empty());
    }

    #[test]
    fn test_template_error_names_placeholder() {
        let err = Template::parse("1.0.{revnum*}").unwrap_err();
        assert!(err.to_string().contains("{revnum*}"));
    }
}
