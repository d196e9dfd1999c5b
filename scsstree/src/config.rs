use std::path::PathBuf;

use anyhow::{bail, Context};
use itertools::Itertools;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::level_filters::LevelFilter;

/// What the command line tool writes for every input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum EmitMode {
    /// The syntax tree as JSON
    Tree,
    /// The token stream as JSON
    Tokens,
    /// The parsed tree serialized back to source
    Source,
    /// Only verify that serializing the parsed tree gives back the input
    #[default]
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Lossless SCSS parser: inspect the tree or tokens of stylesheets and check round-trips
#[derive(Debug, Default, clap::Parser)]
#[command(name = "scsstree", version)]
pub struct Args {
    /// Files to read; standard input when none are given
    pub files: Vec<PathBuf>,

    #[arg(long, value_enum)]
    pub emit: Option<EmitMode>,

    /// Include node positions in JSON output
    #[arg(long)]
    pub positions: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// JSON configuration file with the same keys in camelCase; flags take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,
}

const CONFIG_ITEMS: &[&str] = &["emit", "positions", "pretty", "logLevel"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub emit: EmitMode,
    pub positions: bool,
    pub pretty: bool,
    pub log_level: LogLevel,
}

impl Config {
    /// Defaults, overridden by the configuration file, overridden by flags.
    /// Also returns the keys of the file that were ignored.
    pub fn load(args: &Args) -> anyhow::Result<(Self, Vec<String>)> {
        let mut config = Config::default();
        let mut unknown = Vec::new();
        if let Some(path) = &args.config {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("could not read configuration file {}", path.display()))?;
            let value: Value = serde_json::from_str(&text)
                .with_context(|| format!("invalid JSON in configuration file {}", path.display()))?;
            unknown = config.update(&value)?;
        }
        config.apply_args(args);
        Ok((config, unknown))
    }

    pub fn apply_args(&mut self, args: &Args) {
        if let Some(emit) = args.emit {
            self.emit = emit;
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        self.positions |= args.positions;
        self.pretty |= args.pretty;
    }

    pub fn update(&mut self, update: &Value) -> anyhow::Result<Vec<String>> {
        if let Value::Object(update) = update {
            self.update_by_map(update)
        } else {
            bail!("got invalid configuration object {update}")
        }
    }

    /// Applies the known keys of `update` and returns the unknown ones.
    pub fn update_by_map(&mut self, update: &Map<String, Value>) -> anyhow::Result<Vec<String>> {
        let unknown: Vec<String> = update
            .keys()
            .filter(|key| !CONFIG_ITEMS.contains(&key.as_str()))
            .cloned()
            .collect();

        if let Some(emit) = update.get("emit") {
            self.emit = EmitMode::deserialize(emit).context("invalid `emit`")?;
        }
        if let Some(positions) = update.get("positions") {
            self.positions = bool::deserialize(positions).context("invalid `positions`")?;
        }
        if let Some(pretty) = update.get("pretty") {
            self.pretty = bool::deserialize(pretty).context("invalid `pretty`")?;
        }
        if let Some(log_level) = update.get("logLevel") {
            self.log_level = LogLevel::deserialize(log_level).context("invalid `logLevel`")?;
        }

        Ok(unknown)
    }
}

/// Reports keys returned by [`Config::load`]. Call once logging is up.
pub fn warn_unknown_keys(keys: &[String]) {
    if !keys.is_empty() {
        tracing::warn!(unknown = %keys.iter().join(", "), "ignoring unknown configuration keys");
    }
}
