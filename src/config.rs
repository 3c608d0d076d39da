use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::extract::ScanFilter;
use crate::pr::DEFAULT_API_URL;

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = ".diff-capture.toml";

pub const INPUT_GITHUB_TOKEN: &str = "github-token";
pub const INPUT_PATH_TO_SCAN: &str = "pathToScan";
pub const INPUT_REGEX: &str = "regex";
pub const INPUT_NEW_FILES_ONLY: &str = "newFilesOnly";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Input required and not supplied: {0}")]
    MissingInput(&'static str),

    #[error("Empty regex! Regex is required!")]
    EmptyRegex,

    #[error("Invalid regex: '{pattern}'")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Top-level configuration, loaded from .diff-capture.toml and then
/// overlaid with the action inputs. Every field is optional in the file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,
    /// REST API base URL. If None, falls back to GITHUB_API_URL env var.
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanConfig {
    /// Pattern whose first capture group is extracted
    pub regex: Option<String>,
    /// Only scan files whose path starts with this prefix
    pub path_to_scan: Option<String>,
    /// Only scan files created by the pull request
    pub new_files_only: Option<FlagValue>,
}

/// A loosely typed on/off value, as found in workflow inputs and TOML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl FlagValue {
    /// Only `true`, `1`, `"true"`, `"1"`, `"on"` and `"yes"` count as set.
    pub fn is_enabled(&self) -> bool {
        match self {
            FlagValue::Bool(value) => *value,
            FlagValue::Integer(value) => *value == 1,
            FlagValue::Text(value) => parse_flag(value),
        }
    }
}

pub fn parse_flag(value: &str) -> bool {
    matches!(value, "true" | "1" | "on" | "yes")
}

/// Values supplied by the workflow step (or the command line).
/// Empty values count as not supplied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inputs {
    pub github_token: Option<String>,
    pub path_to_scan: Option<String>,
    pub regex: Option<String>,
    pub new_files_only: Option<String>,
}

impl Inputs {
    /// Read the `INPUT_*` variables the runner sets for each step input.
    pub fn from_env() -> Inputs {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Inputs {
        let get = |name: &str| {
            lookup(&input_var(name))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        Inputs {
            github_token: get(INPUT_GITHUB_TOKEN),
            path_to_scan: get(INPUT_PATH_TO_SCAN),
            regex: get(INPUT_REGEX),
            new_files_only: get(INPUT_NEW_FILES_ONLY),
        }
    }

    /// Fill every unset value from `fallback`.
    pub fn or(self, fallback: Inputs) -> Inputs {
        Inputs {
            github_token: self.github_token.or(fallback.github_token),
            path_to_scan: self.path_to_scan.or(fallback.path_to_scan),
            regex: self.regex.or(fallback.regex),
            new_files_only: self.new_files_only.or(fallback.new_files_only),
        }
    }
}

/// Environment variable carrying the input `name`.
pub fn input_var(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

/// Compiled scan parameters.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub pattern: Regex,
    pub filter: ScanFilter,
}

impl Config {
    /// Load configuration from `path`, or from .diff-capture.toml in the
    /// current directory. A missing default file gives the default config;
    /// an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::load_from(path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Overlay step inputs on top of the file values.
    pub fn with_inputs(mut self, inputs: Inputs) -> Config {
        if let Some(token) = inputs.github_token {
            self.github.token = Some(token);
        }
        if let Some(path) = inputs.path_to_scan {
            self.scan.path_to_scan = Some(path);
        }
        if let Some(regex) = inputs.regex {
            self.scan.regex = Some(regex);
        }
        if let Some(flag) = inputs.new_files_only {
            self.scan.new_files_only = Some(FlagValue::Text(flag));
        }
        self
    }

    /// Resolve the GitHub token: input or config file value first,
    /// then the GITHUB_TOKEN env var.
    pub fn github_token(&self) -> Result<String, ConfigError> {
        self.github
            .token
            .clone()
            .filter(|token| !token.is_empty())
            .or_else(|| std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()))
            .ok_or(ConfigError::MissingInput(INPUT_GITHUB_TOKEN))
    }

    pub fn api_url(&self) -> String {
        self.github
            .api_url
            .clone()
            .or_else(|| std::env::var("GITHUB_API_URL").ok())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn new_files_only(&self) -> bool {
        self.scan
            .new_files_only
            .as_ref()
            .is_some_and(FlagValue::is_enabled)
    }

    /// Compile the pattern and build the file filter. Patterns use the
    /// `regex` crate syntax, which has no lookaround or backreferences.
    pub fn scan_settings(&self) -> Result<ScanSettings, ConfigError> {
        let source = self.scan.regex.as_deref().unwrap_or_default();
        if source.is_empty() {
            return Err(ConfigError::EmptyRegex);
        }
        let pattern = Regex::new(source).map_err(|source_err| ConfigError::InvalidRegex {
            pattern: source.to_string(),
            source: source_err,
        })?;

        Ok(ScanSettings {
            pattern,
            filter: ScanFilter::new(self.new_files_only(), self.scan.path_to_scan.clone()),
        })
    }
}
