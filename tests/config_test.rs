// tests/config_test.rs
use revstamp::config::{load_config, Config, CONFIG_FILE_NAME};
use revstamp::vcs::CiBranch;
use revstamp::RevisionError;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let toml_content = r#"
[revision]
vcs = "git"
tag_match = "v[0-9]*"
timeout_ms = 2500
ci_branch = "none"

[format]
version = "{semvertag+chash:7}"
short = "{tag:nov}.{revnum}"
remove_tag_v = true
default_branch = "develop"
build_config = "Release"
"#;
    temp_file.write_all(toml_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let config = load_config(Some(temp_file.path().to_str().unwrap()), dir.path()).unwrap();

    assert_eq!(config.required_vcs(), Some("git"));
    assert_eq!(config.revision.tag_match, "v[0-9]*");
    assert_eq!(config.revision.timeout_ms, 2500);
    assert_eq!(config.revision.ci_branch, CiBranch::None);
    assert_eq!(config.format.version, "{semvertag+chash:7}");
    assert_eq!(config.format.short_template(), "{tag:nov}.{revnum}");
    assert_eq!(config.format.copyright, "{copyright}");
    assert!(config.format.remove_tag_v);
    assert_eq!(config.format.default_branch, "develop");
    assert_eq!(config.format.build_config, "Release");
}

#[test]
fn test_load_from_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "[format]\nversion = \"1.0.{revnum}\"\n",
    )
    .unwrap();

    let config = load_config(None, dir.path()).unwrap();
    assert_eq!(config.format.version, "1.0.{revnum}");
    assert_eq!(config.revision.timeout_ms, 1000);
}

#[test]
fn test_explicit_path_wins_over_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[format]\nversion = \"local\"\n").unwrap();

    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[format]\nversion = \"explicit\"\n").unwrap();
    temp_file.flush().unwrap();

    let config = load_config(Some(temp_file.path().to_str().unwrap()), dir.path()).unwrap();
    assert_eq!(config.format.version, "explicit");
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    let err = load_config(Some(missing.to_str().unwrap()), dir.path()).unwrap_err();
    assert!(matches!(err, RevisionError::Io(_)));
}

#[test]
fn test_invalid_toml_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[format\nversion = 1").unwrap();

    let err = load_config(None, dir.path()).unwrap_err();
    assert!(matches!(err, RevisionError::Toml(_)));
}

#[test]
fn test_unknown_ci_branch_strategy_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "[revision]\nci_branch = \"jenkins\"\n",
    )
    .unwrap();

    assert!(load_config(None, dir.path()).is_err());
}

#[test]
fn test_zero_timeout_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[revision]\ntimeout_ms = 0\n").unwrap();

    let err = load_config(None, dir.path()).unwrap_err();
    assert!(matches!(err, RevisionError::Config(_)));
}

#[test]
fn test_default_values() {
    let config = Config::default();
    assert_eq!(config.format.version, "{semvertag}");
    assert!(config.format.short.is_empty());
    assert!(!config.format.remove_tag_v);
    assert_eq!(config.revision.ci_branch, CiBranch::Gitlab);
    assert!(config.revision.tag_match.is_empty());
}
