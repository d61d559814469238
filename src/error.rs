use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum IdmapError {
    #[error("mapping source request failed: {0}")]
    SourceHttp(String),

    #[error("mapping source returned status {status}: {message}")]
    SourceStatus { status: u16, message: String },

    #[error("unsupported source url {url}: {reason}")]
    UnsupportedUrl { url: String, reason: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("staged mapping file not found at {0}")]
    #[diagnostic(help("run without --offline to download a fresh copy"))]
    StagedFileMissing(PathBuf),

    #[error("malformed mapping line {line}: expected at least 5 tab-separated columns, got {content:?}")]
    MalformedLine { line: usize, content: String },

    #[error("mapping database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid emission mode: {0}")]
    InvalidEmissionMode(String),
}
