use std::{
    ffi::OsString,
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use clap::Parser;

/// CLI / env configuration parsed at process startup.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "imagedb",
    about = "Tagged media catalog with hierarchical tag search",
    version,
    disable_help_subcommand = true
)]
struct CliConfig {
    /// Directory holding the persisted catalog
    #[arg(long, env = "IMAGEDB_DATA_DIR", default_value = "./.data")]
    data_dir: PathBuf,

    /// JSON snapshot imported when no catalog has been persisted yet
    #[arg(long, env = "IMAGEDB_SEED_FILE")]
    seed_file: Option<PathBuf>,

    /// Address to bind the HTTP server to (e.g., 0.0.0.0:5000)
    #[arg(long, env = "IMAGEDB_BIND_ADDR", default_value = "127.0.0.1:5000")]
    listen_addr: SocketAddr,

    /// Optional OTLP endpoint (grpc) for OpenTelemetry export
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    otel_endpoint: Option<String>,

    /// Logical service name for telemetry (resource attribute)
    #[arg(long, env = "OTEL_SERVICE_NAME", default_value = "imagedb")]
    otel_service_name: String,

    /// Disable OTLP trace export even if an endpoint is set
    #[arg(long, env = "IMAGEDB_OTEL_DISABLE_TRACES", default_value_t = false)]
    otel_disable_traces: bool,

    /// Disable OTLP log export even if an endpoint is set
    #[arg(long, env = "IMAGEDB_OTEL_DISABLE_LOGS", default_value_t = false)]
    otel_disable_logs: bool,

    /// Deployment environment tag for telemetry (e.g., development, staging, prod)
    #[arg(long, env = "IMAGEDB_ENV", default_value = "development")]
    environment: String,

    /// Default log filter when RUST_LOG is not provided
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Comma-separated list of allowed CORS origins
    #[arg(long, env = "IMAGEDB_CORS_ALLOWED_ORIGINS", value_delimiter = ',')]
    cors_allowed_origins: Vec<String>,

    /// Directory containing the built frontend assets
    #[arg(long, env = "IMAGEDB_FRONTEND_DIST_DIR")]
    frontend_dist_dir: Option<PathBuf>,

    /// API key handed to the client's map widget
    #[arg(long, env = "IMAGEDB_MAP_API_KEY")]
    map_api_key: Option<String>,
}

/// Fully validated configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub seed_file: Option<PathBuf>,
    pub listen_addr: SocketAddr,
    pub otel: OtelConfig,
    pub log: LogConfig,
    pub environment: String,
    pub cors_allowed_origins: Vec<String>,
    pub frontend_dist_dir: Option<PathBuf>,
    pub map: MapConfig,
}

/// OpenTelemetry exporter configuration.
#[derive(Debug, Clone)]
pub struct OtelConfig {
    pub endpoint: Option<String>,
    pub service_name: String,
    pub disable_traces: bool,
    pub disable_logs: bool,
}

/// Structured logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
}

/// Settings passed through to the map widget.
#[derive(Debug, Clone, Default)]
pub struct MapConfig {
    pub api_key: Option<String>,
}

impl AppConfig {
    /// Parse CLI/env arguments and return a validated configuration.
    pub fn load() -> Result<Self> {
        let cli = CliConfig::parse();
        Self::try_from(cli)
    }

    /// Parse an explicit argument list (first item is the binary name).
    pub fn from_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = CliConfig::try_parse_from(args)?;
        Self::try_from(cli)
    }

    /// Configuration for in-process use: no telemetry export, no frontend.
    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            seed_file: None,
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            otel: OtelConfig {
                endpoint: None,
                service_name: "imagedb".into(),
                disable_traces: false,
                disable_logs: false,
            },
            log: LogConfig {
                level: "info".into(),
            },
            environment: "test".into(),
            cors_allowed_origins: Vec::new(),
            frontend_dist_dir: None,
            map: MapConfig::default(),
        }
    }
}

impl TryFrom<CliConfig> for AppConfig {
    type Error = anyhow::Error;

    fn try_from(value: CliConfig) -> Result<Self> {
        fs::create_dir_all(&value.data_dir).with_context(|| {
            format!("failed to create data dir '{}'", value.data_dir.display())
        })?;

        if let Some(seed) = &value.seed_file {
            ensure_path_exists(seed)
                .with_context(|| format!("seed file '{}' missing", seed.display()))?;
        }

        let frontend_dist_dir = value.frontend_dist_dir.clone();
        if let Some(dir) = &frontend_dist_dir {
            ensure_path_exists(dir)
                .with_context(|| format!("frontend dist directory '{}' missing", dir.display()))?;
        }

        Ok(Self {
            data_dir: value.data_dir,
            seed_file: value.seed_file,
            listen_addr: value.listen_addr,
            environment: value.environment,
            otel: OtelConfig {
                endpoint: value.otel_endpoint,
                service_name: value.otel_service_name,
                disable_traces: value.otel_disable_traces,
                disable_logs: value.otel_disable_logs,
            },
            log: LogConfig {
                level: value.log_level,
            },
            cors_allowed_origins: value
                .cors_allowed_origins
                .into_iter()
                .filter(|origin| !origin.is_empty())
                .collect(),
            frontend_dist_dir,
            map: MapConfig {
                api_key: value.map_api_key.filter(|key| !key.trim().is_empty()),
            },
        })
    }
}

fn ensure_path_exists(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    Err(anyhow!(
        "path '{}' does not exist or is not accessible",
        path.display()
    ))
}
