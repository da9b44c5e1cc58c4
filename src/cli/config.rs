use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::runtime::RuntimeSettings;
use crate::view::matcher::ViewMatcher;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "panel-augment",
    version,
    about = "Adds backup links, readable timestamps and a schedule assistant to a game-server panel"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Panel origin, e.g. https://panel.example.com
    #[arg(long, global = true)]
    pub origin: Option<String>,

    /// Client API token (falls back to PANEL_API_TOKEN)
    #[arg(long, global = true)]
    pub api_token: Option<String>,

    /// Path to config file (default: panel-augment.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the panel in a browser and augment it until the page closes
    Run {
        /// Page to open
        #[arg(long)]
        url: String,

        /// Bridge script driving the browser
        #[arg(long)]
        bridge: Option<PathBuf>,
    },

    /// Augment a saved HTML snapshot once and summarise the result
    Replay {
        /// HTML snapshot of a panel page
        #[arg(long)]
        fixture: PathBuf,

        /// location.pathname the snapshot was taken at
        #[arg(long)]
        path: String,

        /// Write the augmented document here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the view a path and heading set classify as
    Classify {
        #[arg(long)]
        path: String,

        /// Page heading text (repeatable)
        #[arg(long)]
        heading: Vec<String>,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `panel-augment.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub panel: PanelConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    #[serde(default = "default_origin")]
    pub origin: String,

    #[serde(default)]
    pub api_token: Option<String>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            api_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_schedule_endpoint")]
    pub endpoint: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            endpoint: default_schedule_endpoint(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_heading_interval")]
    pub heading_interval_ms: u64,

    #[serde(default = "default_heading_timeout")]
    pub heading_timeout_ms: u64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_toast_duration")]
    pub toast_duration_ms: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            heading_interval_ms: default_heading_interval(),
            heading_timeout_ms: default_heading_timeout(),
            poll_interval_ms: default_poll_interval(),
            toast_duration_ms: default_toast_duration(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl TimingConfig {
    pub fn runtime_settings(&self) -> RuntimeSettings {
        RuntimeSettings {
            matcher: ViewMatcher::new(
                Duration::from_millis(self.heading_interval_ms),
                Duration::from_millis(self.heading_timeout_ms),
            ),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_bridge_script")]
    pub script: PathBuf,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            script: default_bridge_script(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    #[serde(default = "default_trace_file")]
    pub file: PathBuf,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            file: default_trace_file(),
        }
    }
}

// Serde default helpers
fn default_origin() -> String { "https://panel.ultraservers.com".to_string() }
fn default_schedule_endpoint() -> String { "https://ultraservers-cron-1060219763051.us-central1.run.app/".to_string() }
fn default_heading_interval() -> u64 { 100 }
fn default_heading_timeout() -> u64 { 8000 }
fn default_poll_interval() -> u64 { 500 }
fn default_toast_duration() -> u64 { 5000 }
fn default_request_timeout() -> u64 { 30000 }
fn default_bridge_script() -> PathBuf { PathBuf::from("bridge/panel_bridge.js") }
fn default_trace_file() -> PathBuf { PathBuf::from("augment_trace.jsonl") }

// ============================================================================
// Config File Loading
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config '{path}': {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Strict load: any problem is an error.
pub fn read_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_string(),
        source: e,
    })?;
    serde_yaml::from_str(&content).map_err(|e| ConfigError::Yaml {
        path: path.to_string(),
        source: e,
    })
}

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("panel-augment.yaml");
    match read_config(config_path) {
        Ok(config) => config,
        Err(ConfigError::Io { .. }) => AppConfig::default(),
        Err(e) => {
            warn!(error = %e, "using default config");
            AppConfig::default()
        }
    }
}

// ============================================================================
// CLI overrides
// ============================================================================

/// Apply global flags (and the token environment variable) over file values.
/// Flags win over the file, the file wins over the environment.
pub fn resolve_config(cli: &Cli, mut config: AppConfig, env_token: Option<String>) -> AppConfig {
    if let Some(origin) = &cli.origin {
        config.panel.origin = origin.clone();
    }
    if let Some(token) = &cli.api_token {
        config.panel.api_token = Some(token.clone());
    } else if config.panel.api_token.is_none() {
        config.panel.api_token = env_token;
    }
    config
}
