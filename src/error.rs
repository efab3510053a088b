//! Error types for the devbench tool.
//!
//! This module provides the error hierarchy for all operations: context
//! resolution, source control, building, and application-server management.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for devbench.
#[derive(Debug, Error)]
pub enum DevbenchError {
    /// Context resolution errors.
    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    /// Source-control driver errors.
    #[error("Source control error: {0}")]
    Scm(#[from] ScmError),

    /// Build driver errors.
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Application-server driver errors.
    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Context resolution errors.
///
/// These are terminal for the invocation: no partial context is ever handed
/// to a driver.
#[derive(Debug, Error)]
pub enum ContextError {
    /// A properties file could not be found after seeding was attempted.
    #[error("Properties file not found: {path}")]
    FileMissing {
        /// Path where the file was expected.
        path: PathBuf,
    },

    /// A mandatory property has no value in any layer and no default.
    #[error("Property {section}.{property} is mandatory but was not set in any layer")]
    MandatoryMissing {
        /// Section of the missing property.
        section: String,
        /// Name of the missing property.
        property: String,
    },

    /// Copying a bundled template into place failed.
    #[error("Failed to seed properties file {path}: {message}")]
    SeedFailed {
        /// Target path of the seed attempt.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// A properties file could not be parsed.
    #[error("Malformed properties file {path} at line {line}: {message}")]
    Malformed {
        /// Path of the offending file.
        path: PathBuf,
        /// One-based line number of the offending line.
        line: usize,
        /// Description of the parse error.
        message: String,
    },

    /// An override expression could not be parsed.
    #[error("Invalid override '{expression}': expected section.key=value")]
    InvalidOverride {
        /// The raw override expression.
        expression: String,
    },
}

/// Source-control driver errors.
#[derive(Debug, Error)]
pub enum ScmError {
    /// The svn client could not be spawned.
    #[error("Failed to run {program}: {message}")]
    SpawnFailed {
        /// Program that failed to start.
        program: String,
        /// Description of the spawn failure.
        message: String,
    },

    /// The svn client exited with a non-zero status.
    #[error("svn {action} failed for {working_copy} (exit status {status})")]
    CommandFailed {
        /// The svn action that failed.
        action: String,
        /// Working copy the action ran against.
        working_copy: String,
        /// Exit status reported by the client.
        status: i32,
    },
}

/// Build driver errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The build tool could not be spawned.
    #[error("Failed to run ant: {message}")]
    SpawnFailed {
        /// Description of the spawn failure.
        message: String,
    },

    /// The build tool exited with a non-zero status.
    #[error("ant target '{target}' failed (exit status {status})")]
    TargetFailed {
        /// Target that failed.
        target: String,
        /// Exit status reported by ant.
        status: i32,
    },
}

/// Application-server driver errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Downloading the server distribution failed.
    #[error("Failed to download distribution from {url}: {message}")]
    DownloadFailed {
        /// URL of the distribution archive.
        url: String,
        /// Description of the download failure.
        message: String,
    },

    /// Extracting the distribution archive failed.
    #[error("Failed to extract distribution {archive}: {message}")]
    ExtractFailed {
        /// Path of the archive.
        archive: PathBuf,
        /// Description of the extraction failure.
        message: String,
    },

    /// The server control script could not be run.
    #[error("Failed to run catalina {action}: {message}")]
    ControlFailed {
        /// Lifecycle action that was attempted.
        action: String,
        /// Description of the failure.
        message: String,
    },

    /// No artifact was found at the expected deploy location.
    #[error("Nothing to deploy at: {location}")]
    NothingToDeploy {
        /// Location that was searched for an artifact.
        location: String,
    },

    /// The HTTP port could not be determined from the runtime options.
    #[error("No -Dport.http= setting found in tc.java_opts")]
    HttpPortUnknown,
}

/// Result type alias for devbench operations.
pub type Result<T> = std::result::Result<T, DevbenchError>;

impl DevbenchError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl ContextError {
    /// Creates a mandatory-property error for the given (section, property).
    #[must_use]
    pub fn mandatory(section: impl Into<String>, property: impl Into<String>) -> Self {
        Self::MandatoryMissing {
            section: section.into(),
            property: property.into(),
        }
    }
}
