//! Process-wide logging setup.
//!
//! # Responsibility
//! - Start the `flexi_logger` backend once, writing to stderr or rotating files.
//! - Capture panics as single-line log events.
//!
//! # Invariants
//! - A second init with the same level and target is a no-op; any other
//!   second init is rejected.
//! - Setup never panics.
//! - Record field values (names, emails) are never written to logs.

use flexi_logger::{
    detailed_format, Cleanup, Criterion, FileSpec, LogSpecification, Logger, LoggerHandle,
    Naming, WriteMode,
};
use log::{error, info, LevelFilter};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::Once;

const LOG_FILE_BASENAME: &str = "custom_crud";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_ROTATED_FILES: usize = 5;
const PANIC_SUMMARY_MAX_CHARS: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: Once = Once::new();

struct ActiveLogger {
    status: LoggingStatus,
    _handle: LoggerHandle,
}

/// Where log events are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Rotating files under this absolute directory.
    Directory(PathBuf),
}

impl LogTarget {
    /// `None` selects stderr; a directory must be absolute.
    pub fn from_option(log_dir: Option<&str>) -> Result<Self, String> {
        let Some(raw) = log_dir else {
            return Ok(Self::Stderr);
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Err("log directory cannot be empty".to_string());
        }
        let dir = PathBuf::from(raw);
        if !dir.is_absolute() {
            return Err(format!("log directory must be an absolute path, got `{raw}`"));
        }
        Ok(Self::Directory(dir))
    }
}

impl Display for LogTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stderr => f.write_str("stderr"),
            Self::Directory(dir) => write!(f, "{}", dir.display()),
        }
    }
}

/// Settings of the running logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingStatus {
    pub level: LevelFilter,
    pub target: LogTarget,
}

/// Starts logging at `level`, to stderr or to files under `log_dir`.
///
/// # Errors
/// - Unknown level names and relative or empty directories.
/// - A second call whose level or target differs from the first.
/// - Backend failures (directory creation, logger start).
pub fn init_logging(level: &str, log_dir: Option<&str>) -> Result<(), String> {
    let requested = LoggingStatus {
        level: parse_level(level)?,
        target: LogTarget::from_option(log_dir)?,
    };

    let active = ACTIVE.get_or_try_init(|| start_logger(&requested))?;
    if active.status == requested {
        return Ok(());
    }
    Err(format!(
        "logging already running with level `{}` to `{}`; refusing `{}` to `{}`",
        active.status.level, active.status.target, requested.level, requested.target
    ))
}

/// Settings of the running logger, or `None` before `init_logging`.
pub fn logging_status() -> Option<LoggingStatus> {
    ACTIVE.get().map(|active| active.status.clone())
}

/// `debug` for debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start_logger(status: &LoggingStatus) -> Result<ActiveLogger, String> {
    let logger = Logger::with(LogSpecification::builder().default(status.level).build());
    let logger = match &status.target {
        LogTarget::Stderr => logger
            .log_to_stderr()
            .write_mode(WriteMode::Direct)
            .format_for_stderr(detailed_format),
        LogTarget::Directory(dir) => {
            std::fs::create_dir_all(dir).map_err(|err| {
                format!("cannot create log directory `{}`: {err}", dir.display())
            })?;
            logger
                .log_to_file(
                    FileSpec::default()
                        .directory(dir)
                        .basename(LOG_FILE_BASENAME),
                )
                .rotate(
                    Criterion::Size(ROTATE_AT_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(KEEP_ROTATED_FILES),
                )
                .append()
                .write_mode(WriteMode::BufferAndFlush)
                .format_for_files(detailed_format)
        }
    };
    let handle = logger
        .start()
        .map_err(|err| format!("cannot start logger: {err}"))?;

    PANIC_HOOK.call_once(install_panic_hook);
    info!(
        "event=logging_init module=core status=ok level={} target={} version={} os={}",
        status.level,
        status.target,
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    );

    Ok(ActiveLogger {
        status: status.clone(),
        _handle: handle,
    })
}

fn parse_level(raw: &str) -> Result<LevelFilter, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(LevelFilter::Trace),
        "debug" => Ok(LevelFilter::Debug),
        "info" => Ok(LevelFilter::Info),
        "warn" | "warning" => Ok(LevelFilter::Warn),
        "error" => Ok(LevelFilter::Error),
        other => Err(format!(
            "unknown log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info.location().map_or_else(
            || "unknown".to_string(),
            |loc| format!("{}:{}", loc.file(), loc.line()),
        );
        // Payloads may quote submitted form values.
        error!(
            "event=panic module=core status=error location={} payload={}",
            location,
            summarize_payload(panic_info.payload(), PANIC_SUMMARY_MAX_CHARS)
        );
        previous(panic_info);
    }));
}

fn summarize_payload(payload: &(dyn Any + Send), max_chars: usize) -> String {
    let text = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string payload>");

    let mut summary: String = text
        .chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .take(max_chars)
        .collect();
    if text.chars().count() > max_chars {
        summary.push_str("...");
    }
    summary
}
