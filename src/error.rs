//! Error types for the mermaid-munger library.
//!
//! One variant per failure mode. All errors are fatal and propagate to the
//! caller immediately; nothing is retried, and there is no partial-success
//! state — either the PDF exists and its path is returned, or an error is
//! raised after best-effort cleanup of the working directory.

use std::path::PathBuf;

use thiserror::Error;

/// All errors returned by the mermaid-munger library.
#[derive(Debug, Error)]
pub enum MungeError {
    /// The input document does not exist.
    #[error("markdown file not found: '{path}'")]
    NotFound { path: PathBuf },

    /// The input document does not carry the `.md` extension.
    #[error("not a markdown file: '{path}'")]
    InvalidInput { path: PathBuf },

    /// A file already exists at the resolved output path. Checked at
    /// construction only; there is no implicit overwrite.
    #[error("output already exists: '{path}'")]
    AlreadyExists { path: PathBuf },

    /// The diagram renderer exited non-zero (or could not be spawned).
    /// `stderr` holds the captured diagnostics.
    #[error("diagram renderer failed (exit code {status:?}): {stderr}")]
    RenderFailure { status: Option<i32>, stderr: String },

    /// The HTML-to-PDF backend exited non-zero (or could not be spawned).
    #[error("html-to-pdf conversion failed (exit code {status:?}): {stderr}")]
    ConversionFailure { status: Option<i32>, stderr: String },

    /// A copy/read/write failed during materialization or cleanup.
    /// A working directory that is already gone at cleanup time is
    /// tolerated and never reaches this variant.
    #[error("io failure on '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}
