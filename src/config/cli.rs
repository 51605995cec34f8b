use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the Butik binary.
#[derive(Debug, Parser)]
#[command(name = "butik", version, about = "Butik storefront catalog server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "BUTIK_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the storefront and admin HTTP services.
    Serve(Box<ServeArgs>),
    /// Load and validate configuration, then exit.
    #[command(name = "check-config")]
    CheckConfig,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the public listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the administrative listener host.
    #[arg(long = "server-admin-host", value_name = "HOST")]
    pub server_admin_host: Option<String>,

    /// Override the public listener port.
    #[arg(long = "server-public-port", value_name = "PORT")]
    pub public_port: Option<u16>,

    /// Override the administrative listener port.
    #[arg(long = "server-admin-port", value_name = "PORT")]
    pub admin_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the document store project id.
    #[arg(long = "firestore-project-id", value_name = "ID")]
    pub firestore_project_id: Option<String>,

    /// Override the document store REST base URL.
    #[arg(long = "firestore-base-url", value_name = "URL")]
    pub firestore_base_url: Option<String>,

    /// Override the image host cloud name.
    #[arg(long = "cloudinary-cloud-name", value_name = "NAME")]
    pub cloudinary_cloud_name: Option<String>,

    /// Override the image host REST base URL.
    #[arg(long = "cloudinary-base-url", value_name = "URL")]
    pub cloudinary_base_url: Option<String>,

    /// Override the identity provider REST base URL.
    #[arg(long = "identity-base-url", value_name = "URL")]
    pub identity_base_url: Option<String>,

    /// Mark the admin session cookie as `Secure`.
    #[arg(
        long = "session-secure",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub session_secure: Option<bool>,
}
