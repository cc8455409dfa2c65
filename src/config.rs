use crate::filter;
use crate::handler::HandlerConfig;
use anyhow::Context;
use serde_derive::Deserialize;
use serde_inline_default::serde_inline_default;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_HEALTH_CHECK_PATH: &str = "/_healthcheck";
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Deserialize, Eq, PartialEq, Clone, Copy, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[serde_inline_default]
#[derive(Debug, Deserialize, Eq, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde_inline_default(DEFAULT_BIND.to_string())]
    pub bind: String,

    #[serde_inline_default(DEFAULT_PORT)]
    pub port: u16,

    #[serde_inline_default(DEFAULT_HEALTH_CHECK_PATH.to_string())]
    pub health_check_path: String,

    /// Newline-delimited noise list replacing the built-in one.
    pub filter_file: Option<PathBuf>,

    #[serde_inline_default(false)]
    pub truncate_query_string_fragment: bool,

    #[serde_inline_default(false)]
    pub metadata_object: bool,

    #[serde(default)]
    pub output_format: OutputFormat,

    #[serde_inline_default(false)]
    pub debug: bool,

    #[serde_inline_default(DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            health_check_path: DEFAULT_HEALTH_CHECK_PATH.to_string(),
            filter_file: None,
            truncate_query_string_fragment: false,
            metadata_object: false,
            output_format: OutputFormat::Text,
            debug: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Command line values; anything set here wins over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub health_check_path: Option<String>,
    pub filter_file: Option<PathBuf>,
    pub truncate_query_string_fragment: Option<bool>,
    pub metadata_object: Option<bool>,
    pub output_format: Option<OutputFormat>,
    pub debug: Option<bool>,
}

impl Config {
    pub fn apply(mut self, overrides: Overrides) -> Config {
        if let Some(bind) = overrides.bind {
            self.bind = bind;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(path) = overrides.health_check_path {
            self.health_check_path = path;
        }
        if let Some(file) = overrides.filter_file {
            self.filter_file = Some(file);
        }
        if let Some(format) = overrides.output_format {
            self.output_format = format;
        }
        if let Some(truncate) = overrides.truncate_query_string_fragment {
            self.truncate_query_string_fragment = truncate;
        }
        if let Some(metadata_object) = overrides.metadata_object {
            self.metadata_object = metadata_object;
        }
        if let Some(debug) = overrides.debug {
            self.debug = debug;
        }
        self
    }

    pub fn handler_config(&self) -> anyhow::Result<HandlerConfig> {
        let blocked_uris = match &self.filter_file {
            Some(path) => filter::load_filter_file(path)?,
            None => filter::default_ignored_blocked_uris(),
        };

        Ok(HandlerConfig {
            blocked_uris,
            truncate_query_string_fragment: self.truncate_query_string_fragment,
            metadata_object: self.metadata_object,
        })
    }
}

pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let res = toml::from_str(&content)
        .with_context(|| format!("parsing config file {}", path.display()))?;
    Ok(res)
}
