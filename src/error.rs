/// Errors produced by relink while loading configuration or scanning sources.
///
/// Configuration problems are fatal and raised before any resolution work
/// starts. A specifier that matches a rule but has no file behind the
/// rewritten path is *not* an error; it surfaces as an unresolved result so
/// the host's default resolution chain can take over.
#[derive(Debug, thiserror::Error)]
pub enum RelinkError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("no {file} found walking up from {start}")]
    ConfigNotFound { file: &'static str, start: String },

    #[error("{path}: {message}")]
    ConfigParse { path: String, message: String },

    #[error("alias `{find}`: {reason}")]
    InvalidAlias { find: String, reason: String },

    #[error("alias `{find}`: invalid pattern: {source}")]
    InvalidPattern {
        find: String,
        source: regex::Error,
    },

    #[error("unsupported extension: .{0}")]
    UnsupportedExtension(String),

    #[error("parse failed: {0}")]
    ParseFailed(String),
}
