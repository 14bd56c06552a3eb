use clap::Parser;
use fern::{
    colors::{Color, ColoredLevelConfig},
    Dispatch,
};
use log::LevelFilter;
use std::{env, path::PathBuf};
use surfsup_core::{
    find_config_file, get_xdg_data_dir, is_file, load_config, ConfigSource, DEFAULT_API_PORT,
    DEFAULT_DATABASE_FILE,
};
use time::{format_description::well_known::Iso8601, OffsetDateTime};

#[derive(Parser, Clone, Debug, serde::Deserialize, Default)]
#[command(
    author,
    version,
    about = "SurfsUp - read-only climate API over the Hawaii weather dataset"
)]
pub struct Cli {
    /// Path to config file (TOML format)
    /// Searched in order: this flag, $SURFSUP_CONFIG, ./surfsup.toml,
    /// $XDG_CONFIG_HOME/surfsup/surfsup.toml, /etc/surfsup/surfsup.toml
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "SURFSUP_LEVEL")]
    pub level: Option<String>,

    /// Host to listen on (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, env = "SURFSUP_HOST")]
    #[serde(alias = "domain")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "SURFSUP_PORT")]
    pub port: Option<String>,

    /// Public URL used in the route listing when a request carries no Host header
    #[arg(short, long, env = "SURFSUP_REMOTE_URL")]
    pub remote_url: Option<String>,

    /// Path to the SQLite climate database (opened read-only)
    #[arg(short, long, env = "SURFSUP_DATABASE")]
    #[serde(alias = "database_path")]
    pub database: Option<String>,
}

impl Cli {
    pub fn host(&self) -> String {
        self.host.clone().unwrap_or_else(|| "127.0.0.1".to_string())
    }

    pub fn port(&self) -> String {
        self.port
            .clone()
            .unwrap_or_else(|| DEFAULT_API_PORT.to_string())
    }

    pub fn remote_url(&self) -> String {
        self.remote_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.host(), self.port()))
    }

    /// `./Resources/hawaii.sqlite` when present, otherwise the XDG data directory
    pub fn database(&self) -> String {
        self.database.clone().unwrap_or_else(|| {
            let local = PathBuf::from("./Resources").join(DEFAULT_DATABASE_FILE);
            let local = local.to_string_lossy().into_owned();
            if is_file(&local) {
                local
            } else {
                get_xdg_data_dir()
                    .join(DEFAULT_DATABASE_FILE)
                    .to_string_lossy()
                    .into_owned()
            }
        })
    }

    /// Fields set on `self` win over those set on `file_config`
    pub fn merge(self, file_config: Cli) -> Cli {
        Cli {
            config: self.config,
            level: self.level.or(file_config.level),
            host: self.host.or(file_config.host),
            port: self.port.or(file_config.port),
            remote_url: self.remote_url.or(file_config.remote_url),
            database: self.database.or(file_config.database),
        }
    }
}

/// Load configuration from CLI args, config file, and environment
pub fn get_config_info() -> Cli {
    let cli_args = Cli::parse();

    let source = if let Some(ref path) = cli_args.config {
        ConfigSource::Explicit(path.into())
    } else {
        find_config_file("SURFSUP_CONFIG", "surfsup.toml")
    };

    // The logger is not installed yet, so this only reaches stderr
    if let Some(path) = source.path() {
        eprintln!("Loading config from: {}", path.display());
    }

    let file_config: Cli = match load_config(&source) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Ignoring unreadable config {}: {}", source, e);
            Cli::default()
        }
    };

    // env vars are handled by clap
    cli_args.merge(file_config)
}

pub fn get_log_level(cli: &Cli) -> LevelFilter {
    let level_str = cli
        .level
        .clone()
        .or_else(|| env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());

    match level_str.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

pub fn setup_logger() -> Dispatch {
    let colors = ColoredLevelConfig::new()
        .trace(Color::White)
        .debug(Color::Cyan)
        .info(Color::Blue)
        .warn(Color::Yellow)
        .error(Color::Magenta);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            let timestamp = OffsetDateTime::now_utc()
                .format(&Iso8601::DEFAULT)
                .unwrap_or_default();
            out.finish(format_args!(
                "[{} {}] {}: {}",
                timestamp,
                colors.color(record.level()),
                record.target(),
                message
            ));
        })
        .chain(std::io::stdout())
}
