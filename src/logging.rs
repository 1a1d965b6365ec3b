use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

use crate::dotenv::Environment;

const DEFAULT_LOG_FILTER: &str = "warn,gemchat=info";
const DEFAULT_LOG_FORMAT: &str = "pretty";
const DEFAULT_LOG_OUTPUT: &str = "stderr";
const DEFAULT_LOG_FILE_PATH: &str = "logs/gemchat.log";

type InitResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;

/// Keeps the background log file writer alive. Buffered lines are flushed
/// when it is dropped.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _worker: Option<WorkerGuard>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogOutput {
    Stderr,
    File,
    Both,
}

impl LogOutput {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Stderr => "stderr",
            Self::File => "file",
            Self::Both => "both",
        }
    }

    fn writes_stderr(&self) -> bool {
        matches!(self, Self::Stderr | Self::Both)
    }
}

fn parse_log_format(raw: Option<&str>) -> LogFormat {
    match raw
        .unwrap_or(DEFAULT_LOG_FORMAT)
        .trim()
        .to_ascii_lowercase()
        .as_str()
    {
        "json" => LogFormat::Json,
        _ => LogFormat::Pretty,
    }
}

fn parse_log_output(raw: Option<&str>) -> LogOutput {
    match raw
        .unwrap_or(DEFAULT_LOG_OUTPUT)
        .trim()
        .to_ascii_lowercase()
        .as_str()
    {
        "file" => LogOutput::File,
        "both" => LogOutput::Both,
        _ => LogOutput::Stderr,
    }
}

fn parse_log_file_path(raw: Option<&str>) -> PathBuf {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE_PATH))
}

fn build_file_writer(path: &Path) -> std::io::Result<(non_blocking::NonBlocking, WorkerGuard)> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| std::ffi::OsStr::new("gemchat.log"));

    fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}

fn parse_env_filter(raw: Option<&str>) -> EnvFilter {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn stderr_writer() -> BoxMakeWriter {
    BoxMakeWriter::new(std::io::stderr)
}

fn init_with_writer(format: LogFormat, env_filter: EnvFilter, writer: BoxMakeWriter) -> InitResult {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(writer)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(writer)
            .try_init(),
    }
}

/// Picks the writer for `output`. If the log file cannot be opened the
/// writer degrades to stderr and the reason is reported on stderr.
fn select_writer(output: LogOutput, file_path: &Path) -> (BoxMakeWriter, Option<WorkerGuard>) {
    if output == LogOutput::Stderr {
        return (stderr_writer(), None);
    }

    match build_file_writer(file_path) {
        Ok((file_writer, guard)) if output.writes_stderr() => (
            BoxMakeWriter::new(std::io::stderr.and(file_writer)),
            Some(guard),
        ),
        Ok((file_writer, guard)) => (BoxMakeWriter::new(file_writer), Some(guard)),
        Err(err) => {
            eprintln!(
                "gemchat: failed to initialize LOG_OUTPUT={} at '{}': {}; using stderr {}",
                output.as_str(),
                file_path.display(),
                err,
                if output.writes_stderr() { "only" } else { "instead" }
            );
            (stderr_writer(), None)
        }
    }
}

/// Installs the global subscriber using `RUST_LOG`, `LOG_FORMAT`,
/// `LOG_OUTPUT` and `LOG_FILE_PATH` from `env`. A subscriber that is already
/// installed is left in place.
pub fn init(env: &Environment) -> LogGuard {
    let format = parse_log_format(env.get("LOG_FORMAT"));
    let output = parse_log_output(env.get("LOG_OUTPUT"));
    let file_path = parse_log_file_path(env.get("LOG_FILE_PATH"));
    let env_filter = parse_env_filter(env.get("RUST_LOG"));

    let (writer, worker) = select_writer(output, &file_path);
    match init_with_writer(format, env_filter, writer) {
        Ok(()) => LogGuard { _worker: worker },
        Err(_) => LogGuard { _worker: None },
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tracing_subscriber::filter::LevelFilter;

    use super::{
        DEFAULT_LOG_FILE_PATH, LogFormat, LogOutput, parse_env_filter, parse_log_file_path,
        parse_log_format, parse_log_output, select_writer,
    };

    #[test]
    fn parse_log_format_defaults_to_pretty() {
        assert_eq!(parse_log_format(None), LogFormat::Pretty);
    }

    #[test]
    fn parse_log_format_accepts_json() {
        assert_eq!(parse_log_format(Some("json")), LogFormat::Json);
        assert_eq!(parse_log_format(Some(" JSON ")), LogFormat::Json);
    }

    #[test]
    fn parse_log_format_falls_back_for_unknown_values() {
        assert_eq!(parse_log_format(Some("unknown")), LogFormat::Pretty);
    }

    #[test]
    fn parse_log_output_defaults_to_stderr() {
        assert_eq!(parse_log_output(None), LogOutput::Stderr);
    }

    #[test]
    fn parse_log_output_accepts_file_and_both() {
        assert_eq!(parse_log_output(Some("file")), LogOutput::File);
        assert_eq!(parse_log_output(Some(" BOTH ")), LogOutput::Both);
    }

    #[test]
    fn parse_log_output_falls_back_for_unknown_values() {
        assert_eq!(parse_log_output(Some("unknown")), LogOutput::Stderr);
    }

    #[test]
    fn log_output_reports_whether_stderr_is_written() {
        assert!(LogOutput::Stderr.writes_stderr());
        assert!(LogOutput::Both.writes_stderr());
        assert!(!LogOutput::File.writes_stderr());
        assert_eq!(LogOutput::Both.as_str(), "both");
    }

    #[test]
    fn select_writer_falls_back_when_log_dir_is_a_file() {
        let dir = TempDir::new().expect("temp dir should be created");
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").expect("blocker file should be written");

        let (_, guard) = select_writer(LogOutput::File, &blocker.join("gemchat.log"));
        assert!(guard.is_none());

        let (_, guard) = select_writer(LogOutput::Both, &dir.path().join("logs/gemchat.log"));
        assert!(guard.is_some());
    }

    #[test]
    fn parse_log_file_path_uses_default_for_missing_or_empty_values() {
        assert_eq!(
            parse_log_file_path(None),
            PathBuf::from(DEFAULT_LOG_FILE_PATH)
        );
        assert_eq!(
            parse_log_file_path(Some("  ")),
            PathBuf::from(DEFAULT_LOG_FILE_PATH)
        );
    }

    #[test]
    fn parse_log_file_path_preserves_explicit_value() {
        assert_eq!(
            parse_log_file_path(Some("custom/gemchat.log")),
            PathBuf::from("custom/gemchat.log")
        );
    }

    #[test]
    fn parse_env_filter_uses_default_for_missing_or_blank_values() {
        for raw in [None, Some(""), Some("   ")] {
            assert_eq!(
                parse_env_filter(raw).max_level_hint(),
                Some(LevelFilter::INFO),
                "raw value: {raw:?}"
            );
        }
    }

    #[test]
    fn parse_env_filter_accepts_explicit_directives() {
        assert_eq!(
            parse_env_filter(Some("gemchat=debug")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(
            parse_env_filter(Some(" error ")).max_level_hint(),
            Some(LevelFilter::ERROR)
        );
    }
}
