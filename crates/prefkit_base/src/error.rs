use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use tracing_error::{SpanTrace, SpanTraceStatus};

/* 📖 # Why a custom error type and not use anyhow/eyre/thiserror etc?

- Better control over error handling
- No dependencies to compile and integrate
- Span traces are captured at construction, so errors raised deep inside a store
  still tell which store and which key were being touched
 */

/// Error variants that can occur in prefkit operations.
/// Each variant represents a specific error category with its associated context.
#[derive(Debug)]
pub enum ErrorKind {
    /// File system operation failed
    FileError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A stored value was read as a different kind than the one it holds
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Store names end up as file names, so they are restricted
    InvalidStoreName { name: String },

    /// Persisted data or configuration could not be encoded or decoded
    Serialization { message: String },

    /// Catch-all for other errors with a message
    Message { message: String },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::FileError { path, source } => {
                write!(f, "File error at {}: {}", path.display(), source)
            }
            ErrorKind::TypeMismatch {
                key,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Preference '{}' holds a {} value, expected {}",
                    key, found, expected
                )
            }
            ErrorKind::InvalidStoreName { name } => {
                write!(f, "Invalid store name '{}'", name)
            }
            ErrorKind::Serialization { message } => {
                write!(f, "Serialization failed: {}", message)
            }
            ErrorKind::Message { message } => write!(f, "{}", message),
        }
    }
}

/* 📖 # Why separate ErrorKind and PrefError?
ErrorKind carries the structural variants callers match on (a type mismatch is
something a caller may want to handle). PrefError wraps it with the runtime extras:
context strings pushed during propagation and the span trace.
*/

/// Error type wrapping ErrorKind with context and a span trace.
pub struct PrefError {
    kind: ErrorKind,
    context: Vec<String>,
    span_trace: SpanTrace,
}

impl PrefError {
    /// Creates a new error from an ErrorKind, capturing the current span trace.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: vec![],
            span_trace: SpanTrace::capture(),
        }
    }

    /// Shorthand for an [`ErrorKind::Message`] error.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Message {
            message: message.into(),
        })
    }

    /// Attaches context to an error.
    /// Context is displayed before the error message.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Attaches context using lazy evaluation.
    pub fn with_context<F>(mut self, f: F) -> Self
    where
        F: FnOnce() -> String,
    {
        self.context.push(f());
        self
    }

    /// Returns a reference to the underlying ErrorKind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the context strings in the order they were attached.
    pub fn get_context(&self) -> &[String] {
        &self.context
    }

    /// Returns the span trace captured when the error was created.
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }
}

impl From<ErrorKind> for PrefError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl StdError for PrefError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            ErrorKind::FileError { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for PrefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ctx in &self.context {
            write!(f, "{}: ", ctx)?;
        }
        write!(f, "{}", self.kind)
    }
}

impl fmt::Debug for PrefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.kind)?;
        for (i, ctx) in self.context.iter().enumerate() {
            let connector = if i + 1 == self.context.len() { "└─" } else { "├─" };
            writeln!(f, "{} {}", connector, ctx)?;
        }
        if self.span_trace.status() == SpanTraceStatus::CAPTURED {
            writeln!(f, "Trace: {}", self.span_trace)?;
        }
        Ok(())
    }
}

/* 📖 # Why use Box<PrefError> in the result type?

Boxing the error reduces the size of the result type, making it more efficient to
return in the common case. Getters sit on hot paths and almost never fail.
*/

/// Standard result type for prefkit operations.
pub type PrefResult<T> = std::result::Result<T, Box<PrefError>>;

/// Extension trait for attaching context to Results during propagation.
pub trait ResultExt<T> {
    /// Attaches context to an error, consuming and re-wrapping it.
    fn context(self, context: impl Into<String>) -> PrefResult<T>;

    /// Attaches context using lazy evaluation.
    /// Context is only evaluated if the result is an error.
    fn with_context<F>(self, f: F) -> PrefResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for PrefResult<T> {
    fn context(self, context: impl Into<String>) -> PrefResult<T> {
        self.map_err(|err| Box::new(err.context(context)))
    }

    fn with_context<F>(self, f: F) -> PrefResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| Box::new(err.with_context(f)))
    }
}

/// Builds a boxed [`PrefError`] from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        Box::new($crate::PrefError::message(format!($($arg)*)))
    };
}

/// Returns early with a boxed [`PrefError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::err!($($arg)*))
    };
}
