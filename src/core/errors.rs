//! Error types for the mvpkg-rs library.
//!
//! Every failure aborts the run. The variants keep enough structure (file
//! paths, operation endpoints, parse locations) for a user to resume a
//! partially migrated tree by hand.

use std::io;
use std::path::PathBuf;
use std::str::Utf8Error;

use thiserror::Error;

/// Main result type for mvpkg operations.
pub type Result<T> = std::result::Result<T, MvpkgError>;

/// Error type for all package-move operations.
#[derive(Error, Debug)]
pub enum MvpkgError {
    /// I/O related errors (read, write, rename, directory creation)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message, including the offending path
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// No `go.mod` was found walking up from the working directory
    #[error("Not using go modules! Couldn't find go.mod file above {}", start.display())]
    NoModule {
        /// Directory the search started from
        start: PathBuf,
    },

    /// The module descriptor exists but could not be understood
    #[error("Malformed module descriptor {}: {message}", path.display())]
    Manifest {
        /// Path of the `go.mod` file
        path: PathBuf,
        /// Error description
        message: String,
    },

    /// Parsing and language processing errors
    #[error("Parse error in {language}: {message}")]
    Parse {
        /// Programming language being parsed
        language: String,
        /// Error description
        message: String,
        /// File path where error occurred
        file_path: Option<String>,
        /// Line number (if available)
        line: Option<usize>,
        /// Column number (if available)
        column: Option<usize>,
    },

    /// Dependency graph loading errors
    #[error("Dependency graph error: {message}")]
    Graph {
        /// Error description
        message: String,
    },

    /// Errors while expanding a request into move operations
    #[error("Planning error: {message}")]
    Planning {
        /// Error description
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// A single move operation failed; wraps the underlying cause
    #[error("failed to {stage} for {from} -> {to}: {cause}")]
    Operation {
        /// Stage of the operation ("fix imports" or "move")
        stage: &'static str,
        /// Operation source, relative to the module root
        from: String,
        /// Operation destination, relative to the module root
        to: String,
        /// Underlying error
        #[source]
        cause: Box<MvpkgError>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Data type being serialized
        data_type: Option<String>,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal {
        /// Error description
        message: String,
        /// Additional context
        context: Option<String>,
    },
}

impl MvpkgError {
    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new manifest error
    pub fn manifest(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Manifest {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse(language: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            language: language.into(),
            message: message.into(),
            file_path: None,
            line: None,
            column: None,
        }
    }

    /// Create a new parse error with file context
    pub fn parse_with_location(
        language: impl Into<String>,
        message: impl Into<String>,
        file_path: impl Into<String>,
        line: Option<usize>,
        column: Option<usize>,
    ) -> Self {
        Self::Parse {
            language: language.into(),
            message: message.into(),
            file_path: Some(file_path.into()),
            line,
            column,
        }
    }

    /// Create a new dependency graph error
    pub fn graph(message: impl Into<String>) -> Self {
        Self::Graph {
            message: message.into(),
        }
    }

    /// Create a new planning error
    pub fn planning(message: impl Into<String>) -> Self {
        Self::Planning {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Wrap an error with the move operation it occurred in
    pub fn operation(
        stage: &'static str,
        from: impl Into<String>,
        to: impl Into<String>,
        cause: MvpkgError,
    ) -> Self {
        Self::Operation {
            stage,
            from: from.into(),
            to: to.into(),
            cause: Box::new(cause),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: None,
        }
    }

    /// Add context to an existing error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        match &mut self {
            Self::Internal { context: ctx, .. } => {
                *ctx = Some(context.into());
            }
            Self::Io { message, .. } => {
                *message = format!("{}: {message}", context.into());
            }
            _ => {} // Other variants carry their own context
        }
        self
    }
}

impl From<io::Error> for MvpkgError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for MvpkgError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            data_type: Some("JSON".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for MvpkgError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            data_type: Some("YAML".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<Utf8Error> for MvpkgError {
    fn from(err: Utf8Error) -> Self {
        Self::parse("go", format!("UTF-8 encoding error: {err}"))
    }
}

/// Result extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error result
    fn context(self, msg: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<MvpkgError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }

    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| e.into().with_context(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = MvpkgError::config("Invalid configuration");
        assert!(matches!(err, MvpkgError::Config { .. }));

        let err = MvpkgError::parse("go", "Syntax error");
        assert!(matches!(err, MvpkgError::Parse { .. }));
    }

    #[test]
    fn test_io_error_creation() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Access denied");
        let err = MvpkgError::io("error writing file a.go", io_err);

        if let MvpkgError::Io { message, source } = &err {
            assert_eq!(message, "error writing file a.go");
            assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
        } else {
            panic!("Expected Io error");
        }
    }

    #[test]
    fn test_io_context_prefixes_message() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));

        let err = result
            .with_context(|| "error reading file x.go".to_string())
            .unwrap_err();
        assert!(err.to_string().contains("error reading file x.go"));
    }

    #[test]
    fn test_operation_wraps_cause() {
        let inner = MvpkgError::parse_with_location("go", "unexpected '}'", "a/b.go", Some(3), Some(1));
        let err = MvpkgError::operation("fix imports", "source/testpkg", "destination/testpkg2", inner);

        let display = err.to_string();
        assert!(display.contains("fix imports"));
        assert!(display.contains("source/testpkg -> destination/testpkg2"));
        assert!(display.contains("unexpected '}'"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_no_module_display() {
        let err = MvpkgError::NoModule {
            start: PathBuf::from("/tmp/nowhere"),
        };
        assert!(err.to_string().contains("/tmp/nowhere"));
    }

    #[test]
    fn test_with_context_internal() {
        let err = MvpkgError::internal("edit overlap").with_context("applying edits");

        if let MvpkgError::Internal { context, .. } = err {
            assert_eq!(context, Some("applying edits".to_string()));
        } else {
            panic!("Expected Internal error");
        }
    }

    #[test]
    fn test_config_field_error() {
        let err = MvpkgError::config_field("empty tag", "build_flags");

        if let MvpkgError::Config { message, field } = err {
            assert_eq!(message, "empty tag");
            assert_eq!(field, Some("build_flags".to_string()));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_from_yaml_error() {
        let yaml_err = serde_yaml::from_str::<i32>("invalid: yaml: content").unwrap_err();
        let err: MvpkgError = yaml_err.into();

        if let MvpkgError::Serialization { data_type, .. } = err {
            assert_eq!(data_type, Some("YAML".to_string()));
        } else {
            panic!("Expected Serialization error");
        }
    }

    #[test]
    fn test_from_utf8_error() {
        let invalid_utf8 = vec![0, 159, 146, 150];
        let utf8_err = std::str::from_utf8(&invalid_utf8).unwrap_err();
        let err: MvpkgError = utf8_err.into();

        assert!(matches!(err, MvpkgError::Parse { .. }));
    }
}
