//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{fmt, net::SocketAddr, num::NonZeroU32, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

pub use cli::{CliArgs, Command, ServeArgs, ServeOverrides};

use crate::domain::uploads::DEFAULT_MAX_IMAGE_BYTES;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "butik";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_ADMIN_HOST: &str = "127.0.0.1";
const DEFAULT_PUBLIC_PORT: u16 = 3000;
const DEFAULT_ADMIN_PORT: u16 = 3001;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const DEFAULT_FIRESTORE_DATABASE: &str = "(default)";
const DEFAULT_FIRESTORE_PAGE_SIZE: u32 = 300;
const DEFAULT_CLOUDINARY_BASE_URL: &str = "https://api.cloudinary.com";
const DEFAULT_CLOUDINARY_FOLDER: &str = "shop";
const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com";
const DEFAULT_SESSION_COOKIE: &str = "session";
const DEFAULT_SESSION_MAX_AGE_SECS: u64 = 7 * 24 * 60 * 60;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
const DEFAULT_HTTP_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub firestore: FirestoreSettings,
    pub cloudinary: CloudinarySettings,
    pub identity: IdentitySettings,
    pub session: SessionSettings,
    pub http_client: HttpClientSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub public_addr: SocketAddr,
    pub admin_addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

/// Credential that must never reach logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct FirestoreSettings {
    pub base_url: Url,
    pub project_id: String,
    pub database: String,
    pub api_key: Option<Secret>,
    pub page_size: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct CloudinarySettings {
    pub base_url: Url,
    pub cloud_name: String,
    pub upload_preset: String,
    /// Signed destroy calls need both; without them image deletion is unavailable.
    pub api_key: Option<String>,
    pub api_secret: Option<Secret>,
    pub folder: String,
    pub max_image_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct IdentitySettings {
    pub base_url: Url,
    pub api_key: Secret,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub max_age: Duration,
    pub secure: bool,
}

#[derive(Debug, Clone)]
pub struct HttpClientSettings {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("BUTIK").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::CheckConfig) | None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    firestore: RawFirestoreSettings,
    cloudinary: RawCloudinarySettings,
    identity: RawIdentitySettings,
    session: RawSessionSettings,
    http_client: RawHttpClientSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(host) = overrides.server_admin_host.as_ref() {
            self.server.admin_host = Some(host.clone());
        }
        if let Some(port) = overrides.public_port {
            self.server.public_port = Some(port);
        }
        if let Some(port) = overrides.admin_port {
            self.server.admin_port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(project) = overrides.firestore_project_id.as_ref() {
            self.firestore.project_id = Some(project.clone());
        }
        if let Some(url) = overrides.firestore_base_url.as_ref() {
            self.firestore.base_url = Some(url.clone());
        }
        if let Some(cloud) = overrides.cloudinary_cloud_name.as_ref() {
            self.cloudinary.cloud_name = Some(cloud.clone());
        }
        if let Some(url) = overrides.cloudinary_base_url.as_ref() {
            self.cloudinary.base_url = Some(url.clone());
        }
        if let Some(url) = overrides.identity_base_url.as_ref() {
            self.identity.base_url = Some(url.clone());
        }
        if let Some(secure) = overrides.session_secure {
            self.session.secure = Some(secure);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            firestore,
            cloudinary,
            identity,
            session,
            http_client,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            firestore: build_firestore_settings(firestore)?,
            cloudinary: build_cloudinary_settings(cloudinary)?,
            identity: build_identity_settings(identity)?,
            session: build_session_settings(session)?,
            http_client: build_http_client_settings(http_client)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let admin_host = server
        .admin_host
        .unwrap_or_else(|| DEFAULT_ADMIN_HOST.to_string());

    let public_port = server.public_port.unwrap_or(DEFAULT_PUBLIC_PORT);
    if public_port == 0 {
        return Err(LoadError::invalid(
            "server.public_port",
            "port must be greater than zero",
        ));
    }

    let admin_port = server.admin_port.unwrap_or(DEFAULT_ADMIN_PORT);
    if admin_port == 0 {
        return Err(LoadError::invalid(
            "server.admin_port",
            "port must be greater than zero",
        ));
    }

    let public_addr = parse_socket_addr(&host, public_port)
        .map_err(|reason| LoadError::invalid("server.public_addr", reason))?;
    let admin_addr = parse_socket_addr(&admin_host, admin_port)
        .map_err(|reason| LoadError::invalid("server.admin_addr", reason))?;
    if public_addr == admin_addr {
        return Err(LoadError::invalid(
            "server.admin_port",
            "public and admin listeners must use different addresses",
        ));
    }

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        public_addr,
        admin_addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_firestore_settings(
    firestore: RawFirestoreSettings,
) -> Result<FirestoreSettings, LoadError> {
    let base_url = parse_base_url(
        firestore.base_url.as_deref(),
        DEFAULT_FIRESTORE_BASE_URL,
        "firestore.base_url",
    )?;
    let project_id = required(firestore.project_id, "firestore.project_id")?;
    let database = non_blank(firestore.database)
        .unwrap_or_else(|| DEFAULT_FIRESTORE_DATABASE.to_string());
    let page_size = firestore.page_size.unwrap_or(DEFAULT_FIRESTORE_PAGE_SIZE);
    let page_size = NonZeroU32::new(page_size)
        .ok_or_else(|| LoadError::invalid("firestore.page_size", "must be greater than zero"))?;

    Ok(FirestoreSettings {
        base_url,
        project_id,
        database,
        api_key: non_blank(firestore.api_key).map(Secret::new),
        page_size,
    })
}

fn build_cloudinary_settings(
    cloudinary: RawCloudinarySettings,
) -> Result<CloudinarySettings, LoadError> {
    let base_url = parse_base_url(
        cloudinary.base_url.as_deref(),
        DEFAULT_CLOUDINARY_BASE_URL,
        "cloudinary.base_url",
    )?;
    let cloud_name = required(cloudinary.cloud_name, "cloudinary.cloud_name")?;
    let upload_preset = required(cloudinary.upload_preset, "cloudinary.upload_preset")?;

    let api_key = non_blank(cloudinary.api_key);
    let api_secret = non_blank(cloudinary.api_secret).map(Secret::new);
    if api_key.is_some() != api_secret.is_some() {
        return Err(LoadError::invalid(
            "cloudinary.api_secret",
            "api_key and api_secret must be configured together",
        ));
    }

    let folder = cloudinary
        .folder
        .map(|folder| folder.trim().trim_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_CLOUDINARY_FOLDER.to_string());

    let max_image_bytes = cloudinary.max_image_bytes.unwrap_or(DEFAULT_MAX_IMAGE_BYTES);
    if max_image_bytes == 0 {
        return Err(LoadError::invalid(
            "cloudinary.max_image_bytes",
            "must be greater than zero",
        ));
    }
    usize::try_from(max_image_bytes).map_err(|_| {
        LoadError::invalid(
            "cloudinary.max_image_bytes",
            "value exceeds supported range for usize",
        )
    })?;

    Ok(CloudinarySettings {
        base_url,
        cloud_name,
        upload_preset,
        api_key,
        api_secret,
        folder,
        max_image_bytes,
    })
}

fn build_identity_settings(identity: RawIdentitySettings) -> Result<IdentitySettings, LoadError> {
    let base_url = parse_base_url(
        identity.base_url.as_deref(),
        DEFAULT_IDENTITY_BASE_URL,
        "identity.base_url",
    )?;
    let api_key = required(identity.api_key, "identity.api_key").map(Secret::new)?;

    Ok(IdentitySettings { base_url, api_key })
}

fn build_session_settings(session: RawSessionSettings) -> Result<SessionSettings, LoadError> {
    let cookie_name =
        non_blank(session.cookie_name).unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string());
    let valid_name = cookie_name
        .bytes()
        .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.'));
    if !valid_name {
        return Err(LoadError::invalid(
            "session.cookie_name",
            "only ASCII letters, digits, '-', '_' and '.' are allowed",
        ));
    }

    let max_age_secs = session.max_age_seconds.unwrap_or(DEFAULT_SESSION_MAX_AGE_SECS);
    if max_age_secs == 0 {
        return Err(LoadError::invalid(
            "session.max_age_seconds",
            "must be greater than zero",
        ));
    }

    Ok(SessionSettings {
        cookie_name,
        max_age: Duration::from_secs(max_age_secs),
        secure: session.secure.unwrap_or(false),
    })
}

fn build_http_client_settings(
    http_client: RawHttpClientSettings,
) -> Result<HttpClientSettings, LoadError> {
    let timeout = http_client.timeout_seconds.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
    if timeout == 0 {
        return Err(LoadError::invalid(
            "http_client.timeout_seconds",
            "must be greater than zero",
        ));
    }
    let connect_timeout = http_client
        .connect_timeout_seconds
        .unwrap_or(DEFAULT_HTTP_CONNECT_TIMEOUT_SECS);
    if connect_timeout == 0 {
        return Err(LoadError::invalid(
            "http_client.connect_timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(HttpClientSettings {
        timeout: Duration::from_secs(timeout),
        connect_timeout: Duration::from_secs(connect_timeout),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    admin_host: Option<String>,
    public_port: Option<u16>,
    admin_port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawFirestoreSettings {
    base_url: Option<String>,
    project_id: Option<String>,
    database: Option<String>,
    api_key: Option<String>,
    page_size: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCloudinarySettings {
    base_url: Option<String>,
    cloud_name: Option<String>,
    upload_preset: Option<String>,
    api_key: Option<String>,
    api_secret: Option<String>,
    folder: Option<String>,
    max_image_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawIdentitySettings {
    base_url: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSessionSettings {
    cookie_name: Option<String>,
    max_age_seconds: Option<u64>,
    secure: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawHttpClientSettings {
    timeout_seconds: Option<u64>,
    connect_timeout_seconds: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn required(value: Option<String>, key: &'static str) -> Result<String, LoadError> {
    non_blank(value).ok_or_else(|| LoadError::invalid(key, "must be set"))
}

/// Parse a REST base URL, dropping any trailing slash so paths can be appended.
fn parse_base_url(
    value: Option<&str>,
    default: &str,
    key: &'static str,
) -> Result<Url, LoadError> {
    let raw = value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(default)
        .trim_end_matches('/');
    let url =
        Url::parse(raw).map_err(|err| LoadError::invalid(key, format!("invalid URL: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(LoadError::invalid(
            key,
            format!("unsupported URL scheme `{other}`"),
        )),
    }
}
