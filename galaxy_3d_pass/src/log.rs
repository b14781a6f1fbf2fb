//! Logging for the render pass core and its backends
//!
//! Every message goes through a single process-wide [`Logger`] held by
//! [`Engine`](crate::galaxy3d::Engine). Applications can swap it for their
//! own sink; until they do, [`DefaultLogger`] prints coloured lines to stdout.
//!
//! The `engine_*!` macros are exported at the crate root. Errors carry the
//! file and line of the call site; the other severities do not.
//! `engine_err!` and `engine_bail!` log an error and turn it into
//! `Error::BackendError` in one step.

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Sink for log entries
///
/// # Example
///
/// ```no_run
/// use galaxy_3d_pass::galaxy3d::Engine;
/// use galaxy_3d_pass::galaxy3d::log::{Logger, LogEntry, LogSeverity};
///
/// /// Keeps only errors raised while encoding passes
/// struct PassErrorLogger;
///
/// impl Logger for PassErrorLogger {
///     fn log(&self, entry: &LogEntry) {
///         if entry.severity == LogSeverity::Error && entry.source == "galaxy3d::pass" {
///             eprintln!("render pass failure: {}", entry.message);
///         }
///     }
/// }
///
/// Engine::set_logger(PassErrorLogger);
/// ```
pub trait Logger: Send + Sync {
    /// Handle one entry. Called from any thread.
    fn log(&self, entry: &LogEntry);
}

/// One log message with its origin
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,

    /// Wall-clock time at which the macro fired
    pub timestamp: SystemTime,

    /// Subsystem that produced the message, e.g. `galaxy3d::pass` or `galaxy3d::vulkan`
    pub source: String,

    pub message: String,

    /// Call site, only filled for errors
    pub file: Option<&'static str>,
    pub line: Option<u32>,
}

/// Severity of a log entry, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    Trace,
    Debug,
    Info,
    Warn,
    /// Logged with the call site
    Error,
}

/// Console logger installed until the application provides its own
///
/// Prints `[timestamp] [SEVERITY] [source] message`, followed by
/// `(file:line)` when the entry has a call site. Severities are coloured,
/// errors in bold red.
pub struct DefaultLogger;

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        let severity_str = match entry.severity {
            LogSeverity::Trace => "TRACE".bright_black(),
            LogSeverity::Debug => "DEBUG".cyan(),
            LogSeverity::Info => "INFO ".green(),
            LogSeverity::Warn => "WARN ".yellow(),
            LogSeverity::Error => "ERROR".red().bold(),
        };
        let source = entry.source.bright_blue();

        match (entry.file, entry.line) {
            (Some(file), Some(line)) => println!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp, severity_str, source, entry.message, file, line
            ),
            _ => println!("[{}] [{}] [{}] {}", timestamp, severity_str, source, entry.message),
        }
    }
}

// ===== LOGGING MACROS =====

/// Log at TRACE severity
///
/// ```no_run
/// use galaxy_3d_pass::engine_trace;
///
/// let index = 2;
/// engine_trace!("galaxy3d::pass", "Encoding command {}", index);
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::galaxy3d::Engine::log(
            $crate::galaxy3d::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log at DEBUG severity
///
/// ```no_run
/// use galaxy_3d_pass::engine_debug;
///
/// let count = 4;
/// engine_debug!("galaxy3d::pass", "Encoded {} commands", count);
/// ```
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::galaxy3d::Engine::log(
            $crate::galaxy3d::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log at INFO severity
///
/// ```no_run
/// use galaxy_3d_pass::engine_info;
///
/// engine_info!("galaxy3d::vulkan", "Descriptor pool exhausted, created new pool");
/// ```
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::galaxy3d::Engine::log(
            $crate::galaxy3d::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log at WARN severity
///
/// ```no_run
/// use galaxy_3d_pass::engine_warn;
///
/// engine_warn!("galaxy3d::pass", "Skipping command without pipeline");
/// ```
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::galaxy3d::Engine::log(
            $crate::galaxy3d::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log at ERROR severity, recording the call site
///
/// ```no_run
/// use galaxy_3d_pass::engine_error;
///
/// let error = "attachment sizes differ";
/// engine_error!("galaxy3d::pass", "Could not create framebuffer: {}", error);
/// ```
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::galaxy3d::Engine::log_detailed(
            $crate::galaxy3d::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log an error and build the matching `Error::BackendError`
///
/// ```no_run
/// use galaxy_3d_pass::engine_err;
/// use galaxy_3d_pass::galaxy3d::Error;
///
/// let code = "ERROR_OUT_OF_DEVICE_MEMORY";
/// let err = engine_err!("galaxy3d::vulkan", "Failed to create render pass: {}", code);
/// assert!(matches!(err, Error::BackendError(_)));
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::galaxy3d::Error::BackendError(message)
    }};
}

/// Log an error and return `Err(Error::BackendError)` from the enclosing function
///
/// ```no_run
/// use galaxy_3d_pass::engine_bail;
/// use galaxy_3d_pass::galaxy3d::Result;
///
/// fn require_vulkan_texture(is_vulkan: bool) -> Result<()> {
///     if !is_vulkan {
///         engine_bail!("galaxy3d::vulkan", "Texture is not a Vulkan texture");
///     }
///     Ok(())
/// }
///
/// assert!(require_vulkan_texture(false).is_err());
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
