//! # Configuration
//!
//! TOML file with every field defaulted. The base config is the config
//! file if it exists, then the NATS CLI contexts under `~/.config/nats`,
//! then the built-in default context. `--server` on the command line
//! replaces only the contexts of that base.

use crate::error::{HubError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Refuse every destructive action.
    #[serde(default)]
    pub read_only: bool,
    #[serde(default = "default_snapshot_timeout_ms")]
    pub snapshot_timeout_ms: u64,
    /// Block previews whose numeric filter values do not parse instead of
    /// skipping those clauses.
    #[serde(default)]
    pub strict_filter_values: bool,
    /// Where saved filters live. Defaults to `<config dir>/jetdeck/filters.toml`.
    #[serde(default)]
    pub presets_path: Option<PathBuf>,
    #[serde(default = "default_context_name")]
    pub default_context: String,
    #[serde(default = "default_contexts")]
    pub contexts: Vec<ContextConfig>,

    #[serde(skip)]
    source: ConfigSource,
    #[serde(skip)]
    source_path: String,
}

/// One server connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    pub name: String,
    pub server: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creds: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    File,
    NatsContext,
    #[default]
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::File => write!(f, "config-file"),
            Self::NatsContext => write!(f, "nats-context"),
            Self::Default => write!(f, "default"),
        }
    }
}

fn default_snapshot_timeout_ms() -> u64 {
    5000
}
fn default_context_name() -> String {
    "local".into()
}
fn default_contexts() -> Vec<ContextConfig> {
    vec![ContextConfig {
        name: "local".into(),
        server: "nats://localhost:4222".into(),
        token: None,
        creds: None,
    }]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            read_only: false,
            snapshot_timeout_ms: default_snapshot_timeout_ms(),
            strict_filter_values: false,
            presets_path: None,
            default_context: default_context_name(),
            contexts: default_contexts(),
            source: ConfigSource::Default,
            source_path: "built-in default".into(),
        }
    }
}

/// `<config dir>/jetdeck`, e.g. `~/.config/jetdeck` on Linux.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("jetdeck"))
}

pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// NATS CLI settings directory, `~/.config/nats`.
pub fn nats_context_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|d| d.join(".config").join("nats"))
}

fn env_var_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)").ok()
        })
        .as_ref()
}

/// Replace `$VAR` and `${VAR}` with the environment value; unset
/// variables expand to nothing.
pub fn expand_env(raw: &str) -> String {
    let Some(pattern) = env_var_pattern() else {
        return raw.to_string();
    };
    pattern
        .replace_all(raw, |caps: &regex::Captures<'_>| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .and_then(|name| std::env::var(name.as_str()).ok())
                .unwrap_or_default()
        })
        .into_owned()
}

fn expand_token(token: Option<String>) -> Option<String> {
    token.map(|t| if t.contains('$') { expand_env(&t) } else { t })
}

/// Expand environment variables and a leading `~`, then resolve relative
/// paths against `base`.
pub fn expand_path(path: &Path, base: Option<&Path>) -> PathBuf {
    let path = PathBuf::from(expand_env(&path.to_string_lossy()));
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.clone(),
    };
    match base {
        Some(base) if expanded.is_relative() => base.join(expanded),
        _ => expanded,
    }
}

/// One `context/<name>.json` file written by the NATS CLI.
#[derive(Debug, Default, Deserialize)]
struct NatsContextFile {
    #[serde(default)]
    url: String,
    #[serde(default)]
    token: String,
    #[serde(default)]
    creds: String,
}

impl Config {
    /// Resolve the configuration for this run.
    pub fn load(path: Option<&Path>, server_override: Option<&str>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path(),
        };
        Self::resolve(path.as_deref(), nats_context_dir().as_deref(), server_override)
    }

    fn resolve(
        path: Option<&Path>,
        nats_dir: Option<&Path>,
        server_override: Option<&str>,
    ) -> Result<Self> {
        let mut config = match path {
            Some(p) if p.exists() => Self::from_file(p)?,
            _ => nats_dir
                .and_then(|dir| Self::from_nats_contexts(dir).ok())
                .unwrap_or_default(),
        };

        if let Some(server) = server_override.filter(|s| !s.is_empty()) {
            config.contexts = vec![ContextConfig {
                name: "cli".into(),
                server: server.to_string(),
                token: None,
                creds: None,
            }];
            config.default_context = "cli".into();
            config.source = ConfigSource::Cli;
            config.source_path = server.to_string();
        }
        Ok(config)
    }

    /// Build a config from the NATS CLI contexts in `nats_dir`. The current
    /// context comes from `context.txt`, else the first context by name.
    pub fn from_nats_contexts(nats_dir: &Path) -> Result<Self> {
        let context_dir = nats_dir.join("context");
        let entries = std::fs::read_dir(&context_dir).map_err(|e| {
            HubError::Config(format!("failed to read {}: {}", context_dir.display(), e))
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        let mut contexts = Vec::new();
        for file in files {
            let Some(name) = file.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            let parsed = std::fs::read_to_string(&file)
                .ok()
                .and_then(|raw| serde_json::from_str::<NatsContextFile>(&raw).ok());
            let Some(ctx) = parsed else {
                tracing::debug!("Skipping unreadable NATS context {}", file.display());
                continue;
            };
            contexts.push(ContextConfig {
                name,
                server: ctx.url,
                token: expand_token(Some(ctx.token).filter(|t| !t.is_empty())),
                creds: Some(ctx.creds)
                    .filter(|c| !c.is_empty())
                    .map(|c| expand_path(Path::new(&c), Some(&context_dir))),
            });
        }

        let Some(first) = contexts.first() else {
            return Err(HubError::Config(format!(
                "no NATS contexts found in {}",
                context_dir.display()
            )));
        };
        let current = std::fs::read_to_string(nats_dir.join("context.txt"))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| first.name.clone());

        Ok(Self {
            source: ConfigSource::NatsContext,
            source_path: context_dir
                .join(format!("{}.json", current))
                .display()
                .to_string(),
            default_context: current,
            contexts,
            ..Self::default()
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| HubError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| HubError::Config(format!("failed to parse {}: {}", path.display(), e)))?;

        let base = path.parent();
        for ctx in &mut config.contexts {
            if let Some(creds) = ctx.creds.take() {
                ctx.creds = Some(expand_path(&creds, base));
            }
            ctx.token = expand_token(ctx.token.take());
        }
        if let Some(presets) = config.presets_path.take() {
            config.presets_path = Some(expand_path(&presets, base));
        }

        config.source = ConfigSource::File;
        config.source_path = path.display().to_string();
        Ok(config)
    }

    /// The context named by `default_context`, else the first one.
    pub fn current_context(&self) -> Option<&ContextConfig> {
        self.contexts
            .iter()
            .find(|c| c.name == self.default_context)
            .or_else(|| self.contexts.first())
    }

    pub fn snapshot_timeout(&self) -> Duration {
        Duration::from_millis(self.snapshot_timeout_ms)
    }

    pub fn presets_path(&self) -> Option<PathBuf> {
        self.presets_path
            .clone()
            .or_else(|| config_dir().map(|d| d.join("filters.toml")))
    }

    pub fn source(&self) -> ConfigSource {
        self.source
    }

    pub fn describe_source(&self) -> String {
        match self.source {
            ConfigSource::Cli => format!("Command line: {}", self.source_path),
            ConfigSource::File => format!("Config file: {}", self.source_path),
            ConfigSource::NatsContext => format!("NATS context: {}", self.source_path),
            ConfigSource::Default => "Built-in default (no config found)".to_string(),
        }
    }
}
