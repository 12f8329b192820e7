use crate::error::{RevisionError, Result};
use crate::format::ResolveOptions;
use crate::vcs::{CiBranch, ProviderOptions};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// File name looked up in the working directory and the user config directory
pub const CONFIG_FILE_NAME: &str = "revstamp.toml";

/// Represents the complete configuration for revstamp.
///
/// Contains the settings for collecting revision data and for the templates
/// turning it into version strings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub revision: RevisionConfig,

    #[serde(default)]
    pub format: FormatConfig,
}

fn default_timeout_ms() -> u64 {
    1000
}

/// How revision data is collected.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RevisionConfig {
    /// VCS that must be used; detection is automatic when unset
    #[serde(default)]
    pub vcs: Option<String>,

    /// `git describe --match` glob; empty or `*` considers every tag
    #[serde(default)]
    pub tag_match: String,

    /// Timeout of each VCS command in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub ci_branch: CiBranch,
}

impl Default for RevisionConfig {
    fn default() -> Self {
        RevisionConfig {
            vcs: None,
            tag_match: String::new(),
            timeout_ms: default_timeout_ms(),
            ci_branch: CiBranch::default(),
        }
    }
}

fn default_version_template() -> String {
    "{semvertag}".to_string()
}

fn default_copyright_template() -> String {
    "{copyright}".to_string()
}

/// Templates and resolution options.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FormatConfig {
    #[serde(default = "default_version_template")]
    pub version: String,

    /// Template of the short version; the version template is used when empty
    #[serde(default)]
    pub short: String,

    #[serde(default = "default_copyright_template")]
    pub copyright: String,

    #[serde(default)]
    pub remove_tag_v: bool,

    #[serde(default)]
    pub default_branch: String,

    #[serde(default)]
    pub build_config: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        FormatConfig {
            version: default_version_template(),
            short: String::new(),
            copyright: default_copyright_template(),
            remove_tag_v: false,
            default_branch: String::new(),
            build_config: String::new(),
        }
    }
}

impl FormatConfig {
    /// Template used for the short version
    pub fn short_template(&self) -> &str {
        if self.short.trim().is_empty() {
            &self.version
        } else {
            &self.short
        }
    }
}

impl Config {
    /// Reject values that cannot work before any VCS command runs.
    pub fn validate(&self) -> Result<()> {
        if self.revision.timeout_ms == 0 {
            return Err(RevisionError::config("revision.timeout_ms must be greater than 0"));
        }
        if self.format.version.trim().is_empty() {
            return Err(RevisionError::config("format.version must not be empty"));
        }
        Ok(())
    }

    pub fn provider_options(&self) -> ProviderOptions {
        ProviderOptions {
            timeout: Some(Duration::from_millis(self.revision.timeout_ms)),
            ci_branch: self.revision.ci_branch,
        }
    }

    /// Options for the template resolver at the given build time
    pub fn resolve_options(
        &self,
        build_time: DateTime<FixedOffset>,
        machine_name: impl Into<String>,
    ) -> ResolveOptions {
        let default_branch = self.format.default_branch.trim();
        ResolveOptions {
            build_time,
            build_config: self.format.build_config.clone(),
            machine_name: machine_name.into(),
            remove_tag_v: self.format.remove_tag_v,
            default_branch: (!default_branch.is_empty()).then(|| default_branch.to_string()),
        }
    }

    /// Required VCS, if one is configured
    pub fn required_vcs(&self) -> Option<&str> {
        self.revision
            .vcs
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `revstamp.toml` in `working_dir`
/// 3. `revstamp.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read, parsed or validated
pub fn load_config(config_path: Option<&str>, working_dir: &Path) -> Result<Config> {
    let local = working_dir.join(CONFIG_FILE_NAME);

    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if local.exists() {
        fs::read_to_string(local)?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config: Config = toml::from_str(&config_str)?;
    config.validate()?;
    Ok(config)
}
