//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use nimbus_domain::ExportKind;
use nimbus_infrastructure::{ClientConfig, ConfigError};

/// Command-line client for the reporting API.
#[derive(Clone, Debug, Parser)]
#[command(name = "nimbus", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection overrides applied on top of the configuration file.
#[derive(Clone, Debug, Args)]
pub struct ConnectionArgs {
    /// JSON configuration file
    #[arg(long, env = "NIMBUS_CONFIG")]
    pub config: Option<PathBuf>,

    /// API base URL
    #[arg(long, env = "NIMBUS_BASE_URL")]
    pub base_url: Option<String>,

    /// Where tokens are persisted
    #[arg(long, env = "NIMBUS_TOKEN_FILE")]
    pub token_file: Option<PathBuf>,

    /// Default request timeout in seconds
    #[arg(long, env = "NIMBUS_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Spreadsheet generation timeout in seconds
    #[arg(long, env = "NIMBUS_GENERATION_TIMEOUT_SECS")]
    pub generation_timeout_secs: Option<u64>,
}

impl ConnectionArgs {
    /// Loads the configuration file, if any, and applies the overrides.
    pub fn resolve(&self) -> Result<ClientConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load(path)?,
            None => ClientConfig::default(),
        };
        if let Some(base_url) = &self.base_url {
            config.base_url.clone_from(base_url);
        }
        if let Some(token_file) = &self.token_file {
            config.token_file = Some(token_file.clone());
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout_secs = secs;
        }
        if let Some(secs) = self.generation_timeout_secs {
            config.generation_timeout_secs = secs;
        }
        Ok(config)
    }
}

/// What to do.
#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Store a token pair and load the user's profile
    Login {
        /// Access token
        #[arg(long, env = "NIMBUS_ACCESS_TOKEN", hide_env_values = true)]
        access: String,
        /// Refresh token
        #[arg(long, env = "NIMBUS_REFRESH_TOKEN", hide_env_values = true)]
        refresh: String,
    },
    /// Forget the stored tokens
    Logout,
    /// Show the current user
    Whoami,
    /// Check whether a route may be opened
    Navigate {
        /// Route path, e.g. /control_horas
        path: String,
    },
    /// List a collection
    Records {
        /// Collection to list
        #[arg(value_enum)]
        resource: Resource,
        /// Filter as key=value; repeatable
        #[arg(long = "param", short, value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },
    /// Download or regenerate a report spreadsheet
    Export {
        /// Report to export
        #[arg(value_parser = parse_export_kind)]
        kind: ExportKind,
        /// Regenerate the file before downloading it
        #[arg(long)]
        generate: bool,
        /// Generation filter as key=value; repeatable
        #[arg(long = "filter", short, value_parser = parse_key_value)]
        filters: Vec<(String, String)>,
        /// Directory to write the file into
        #[arg(long, short, default_value = ".")]
        output: PathBuf,
    },
}

/// Collections reachable from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Resource {
    /// Work records
    Registros,
    /// Absences
    Ausencias,
    /// Time control entries
    #[value(name = "control-horas")]
    ControlHoras,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))
}

fn parse_export_kind(raw: &str) -> Result<ExportKind, String> {
    raw.parse().map_err(|e: nimbus_domain::DomainError| e.to_string())
}
