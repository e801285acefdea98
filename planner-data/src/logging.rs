use std::{
    fs::File,
    io::{self, IsTerminal},
    path::Path,
    sync::Mutex,
};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        FmtContext,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Local-time event formatter: timestamp, level, target, fields.
struct LocalFmt;

impl<S, N> FormatEvent<S, N> for LocalFmt
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let ansi = writer.has_ansi_escapes();

        if ansi {
            write!(writer, "\x1b[2m")?
        }
        write!(
            writer,
            "{} ",
            Local::now().format("%Y-%m-%dT%H:%M:%S%.6f%:z")
        )?;
        if ansi {
            write!(writer, "\x1b[0m")?
        }

        let (pre, post) = if ansi {
            match *meta.level() {
                Level::ERROR => ("\x1b[1;31m", "\x1b[0m"),
                Level::WARN => ("\x1b[1;33m", "\x1b[0m"),
                Level::INFO => ("\x1b[1;32m", "\x1b[0m"),
                Level::DEBUG => ("\x1b[1;34m", "\x1b[0m"),
                Level::TRACE => ("\x1b[1;35m", "\x1b[0m"),
            }
        } else {
            ("", "")
        };
        write!(writer, "{}{:>5}{} ", pre, meta.level(), post)?;

        if ansi {
            write!(writer, "\x1b[36m{}\x1b[0m ", meta.target())?;
        } else {
            write!(writer, "{} ", meta.target())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Builds the filter from `level` if given, else `RUST_LOG`, else `warn`.
///
/// Accepts a bare level ("error", "warn", "info", "debug", "trace") or any
/// full `EnvFilter` directive.
fn make_filter(level: Option<&str>) -> Result<EnvFilter> {
    match level {
        Some(level) => EnvFilter::try_new(level)
            .map_err(|e| anyhow::anyhow!("invalid log level '{level}': {e}")),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))),
    }
}

/// Initializes logging. Call once at startup.
///
/// - Stderr: colored when attached to a terminal, plain when piped. Stdout
///   is left to the command's own output.
/// - File: appended to when `log_file` is given, never colored.
pub fn init_logging(
    level: Option<&str>,
    log_file: Option<&Path>,
) -> Result<()> {
    let filter = make_filter(level)?;

    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(LocalFmt)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr);

    let file_layer = match log_file {
        Some(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file '{}'", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .event_format(LocalFmt)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("logging already initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_filter_accepts_bare_level() {
        assert!(make_filter(Some("debug")).is_ok());
    }

    #[test]
    fn test_make_filter_accepts_directive() {
        assert!(make_filter(Some("warn,planner_core=debug")).is_ok());
    }

    #[test]
    fn test_make_filter_rejects_garbage() {
        let err = make_filter(Some("planner_core=loud")).expect_err("Should fail for bad level");
        assert!(err.to_string().contains("invalid log level"), "got: {err}");
    }
}
