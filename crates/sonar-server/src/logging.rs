//! Tracing setup for the sonar server.
//!
//! The profile comes from `SONAR_ENV`. Production writes JSON to a daily
//! rolling file and compact lines to stdout; development prints pretty output
//! with span open/close events.

use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the fallback filter directive.
pub const LOG_LEVEL_ENV: &str = "SONAR_LOG_LEVEL";

/// Environment variable selecting the [`LogProfile`].
pub const PROFILE_ENV: &str = "SONAR_ENV";

const DEFAULT_DIRECTIVE: &str = "info";

// Dropping a guard stops its writer thread.
static GUARDS: OnceLock<Vec<WorkerGuard>> = OnceLock::new();

/// Where and how log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogProfile {
    /// JSON files under [`log_directory`] plus compact stdout.
    Production,
    /// Pretty stdout only.
    Development,
}

impl LogProfile {
    /// `production` selects [`LogProfile::Production`]; anything else,
    /// including an unset variable, is development.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_name(std::env::var(PROFILE_ENV).ok().as_deref())
    }

    fn from_name(name: Option<&str>) -> Self {
        match name {
            Some(name) if name.eq_ignore_ascii_case("production") => Self::Production,
            _ => Self::Development,
        }
    }
}

/// Install the global subscriber for `profile`.
///
/// # Errors
///
/// Returns an error if the filter directive is invalid or the production log
/// directory cannot be created.
pub fn init(profile: LogProfile) -> anyhow::Result<()> {
    let filter = env_filter(std::env::var(LOG_LEVEL_ENV).ok().as_deref())?;
    match profile {
        LogProfile::Production => init_production(filter),
        LogProfile::Development => {
            init_development(filter);
            Ok(())
        }
    }
}

/// `RUST_LOG` wins; otherwise `directive`, falling back to `info`.
fn env_filter(directive: Option<&str>) -> anyhow::Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    Ok(EnvFilter::try_new(directive.unwrap_or(DEFAULT_DIRECTIVE))?)
}

fn init_production(filter: EnvFilter) -> anyhow::Result<()> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "sonar");
    let (file_writer, file_guard) = tracing_appender::non_blocking(appender);
    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(file_writer)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(stdout_writer)
                .with_ansi(false),
        )
        .init();

    let _ = GUARDS.set(vec![file_guard, stdout_guard]);
    tracing::info!(dir = %log_dir.display(), "File logging enabled");
    Ok(())
}

fn init_development(filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE),
        )
        .init();
}

/// Directory for production log files.
#[must_use]
pub fn log_directory() -> PathBuf {
    directories::ProjectDirs::from("", "", "sonar")
        .map_or_else(|| PathBuf::from("./logs"), |dirs| dirs.data_dir().join("logs"))
}
