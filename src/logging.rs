use crate::settings::{LogFormat, LoggingSettings};
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Builds the filter directive: `RUST_LOG` wins, then the CLI override,
/// then the configured level.
fn build_filter(settings: &LoggingSettings, level_override: Option<&str>) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let level = level_override
        .unwrap_or(&settings.level)
        .trim()
        .to_ascii_lowercase();
    EnvFilter::try_new(&level).with_context(|| format!("invalid log level '{}'", level))
}

/// Installs the global subscriber. Logs never go to stdout, which carries
/// the protocol stream. The returned guard flushes the file writer on drop
/// and must live as long as the process.
pub fn init(settings: &LoggingSettings, level_override: Option<&str>) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(settings, level_override)?;

    let (writer, guard) = match &settings.file {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow!("log file path '{}' has no file name", path.display()))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let ansi = settings.file.is_none();
    let fmt_layer = match settings.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_target(true)
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(fmt_layer).with(filter);
    tracing::subscriber::set_global_default(subscriber)
        .context("a global tracing subscriber is already installed")?;
    tracing_log::LogTracer::init().context("failed to bridge log records into tracing")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(level: &str) -> LoggingSettings {
        LoggingSettings {
            level: level.to_string(),
            format: LogFormat::Text,
            file: None,
        }
    }

    #[test]
    fn test_uppercase_level_accepted() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        assert!(build_filter(&settings("INFO"), None).is_ok());
        assert!(build_filter(&settings("INFO"), Some("Debug")).is_ok());
    }

    #[test]
    fn test_garbage_level_rejected() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        assert!(build_filter(&settings("bridge=loudest"), None).is_err());
    }
}
