//! Exporter configuration
//!
//! Sources, lowest precedence first: built-in defaults, an optional config
//! file, `TR64_*` environment variables, command line flags.

use anyhow::{Context, Result};
use clap::Parser;
use exporter_lib::mapping::{ActionFilter, DiscoveryOptions, NameScheme, ScrapeConfig};
use exporter_lib::tr64::Tr64Config;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Export TR-064 device statistics as Prometheus gauges
#[derive(Debug, Parser)]
#[command(name = "tr64-exporter", version, about)]
pub struct Cli {
    /// Config file (TOML, YAML or JSON)
    #[arg(long, short = 'c', env = "TR64_CONFIG")]
    pub config: Option<PathBuf>,

    /// Device host name or address
    #[arg(long = "host", short = 'f', visible_alias = "fritzbox")]
    pub host: Option<String>,

    /// TR-064 user name
    #[arg(long, short = 'u')]
    pub username: Option<String>,

    /// TR-064 password
    #[arg(long, short = 'p')]
    pub password: Option<String>,

    /// Port of the /metrics endpoint
    #[arg(long)]
    pub listen_port: Option<u16>,
}

/// Exporter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExporterConfig {
    /// Device host name or address
    #[serde(default = "default_host")]
    pub host: String,

    /// TR-064 port on the device
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path of the device description document
    #[serde(default = "default_description_path")]
    pub description_path: String,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default)]
    pub password: Option<String>,

    /// Port of the /metrics, /healthz and /readyz endpoints
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Seconds between scrape cycles
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Seconds before a single action invocation is abandoned
    #[serde(default = "default_invoke_timeout")]
    pub invoke_timeout_secs: u64,

    /// Refreshes in flight per cycle
    #[serde(default = "default_concurrency")]
    pub scrape_concurrency: usize,

    /// `qualified` or `plain`
    #[serde(default = "default_naming")]
    pub naming: String,

    /// Name single-output actions after the action
    #[serde(default)]
    pub scalar_action_names: bool,

    /// Actions never polled, in addition to the built-in list
    #[serde(default)]
    pub exclude_actions: Vec<String>,
}

fn default_host() -> String {
    "fritz.box".to_string()
}

fn default_port() -> u16 {
    49000
}

fn default_description_path() -> String {
    "tr64desc.xml".to_string()
}

fn default_username() -> String {
    "dslf-config".to_string()
}

fn default_listen_port() -> u16 {
    8000
}

fn default_poll_interval() -> u64 {
    2
}

fn default_invoke_timeout() -> u64 {
    5
}

fn default_concurrency() -> usize {
    1
}

fn default_naming() -> String {
    "qualified".to_string()
}

impl ExporterConfig {
    /// Load configuration from file and environment, then apply CLI flags
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = &cli.config {
            builder = builder.add_source(config::File::from(path.as_path()));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("TR64")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("exclude_actions"),
            )
            .build()
            .context("Failed to read configuration")?;

        let mut config: ExporterConfig = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(username) = &cli.username {
            self.username = username.clone();
        }
        if let Some(password) = &cli.password {
            self.password = Some(password.clone());
        }
        if let Some(port) = cli.listen_port {
            self.listen_port = port;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be at least 1");
        }
        if self.invoke_timeout_secs == 0 {
            anyhow::bail!("invoke_timeout_secs must be at least 1");
        }
        self.name_scheme()?;
        Ok(())
    }

    pub fn name_scheme(&self) -> Result<NameScheme> {
        self.naming.parse::<NameScheme>().map_err(anyhow::Error::msg)
    }

    pub fn tr64(&self) -> Tr64Config {
        Tr64Config {
            host: self.host.clone(),
            port: self.port,
            description_path: self.description_path.clone(),
            username: Some(self.username.clone()).filter(|u| !u.is_empty()),
            password: self.password.clone(),
            ..Tr64Config::default()
        }
    }

    pub fn discovery(&self) -> Result<DiscoveryOptions> {
        let filter = self
            .exclude_actions
            .iter()
            .fold(ActionFilter::new(), |filter, action| filter.exclude(action.clone()));

        Ok(DiscoveryOptions {
            filter,
            scheme: self.name_scheme()?,
            name_scalar_actions_by_action: self.scalar_action_names,
        })
    }

    pub fn scrape(&self) -> ScrapeConfig {
        ScrapeConfig {
            interval: Duration::from_secs(self.poll_interval_secs),
            invoke_timeout: Duration::from_secs(self.invoke_timeout_secs),
            concurrency: self.scrape_concurrency.max(1),
        }
    }
}
