use thiserror::Error;

/// Pipeline error with context carried per collaborator boundary.
///
/// Design: uses thiserror for ergonomic error handling with context.
/// Recoverable collaborator failures are caught at the smallest boundary
/// (per region, per job, per table) and degrade to sentinels; only fatal
/// configuration problems propagate out of the run.
#[derive(Error, Debug)]
pub enum AuditError {
    // Fatal configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load template {path}: {source}")]
    TemplateLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // Template contract violations
    #[error("Template placeholder '{key}' has no value")]
    TemplateMissingKey { key: String },

    #[error("Malformed template: {detail}")]
    TemplateSyntax { detail: String },

    // Collaborator errors, one variant per boundary
    #[error("Warehouse request failed: {message}")]
    Warehouse { message: String },

    #[error("Analyzer request failed: {message}")]
    Analyzer { message: String },

    #[error("Model request failed: {message}")]
    Model { message: String },

    #[error("Storage upload failed: {message}")]
    Storage { message: String },

    #[error("Token fetch failed: {message}")]
    Token { message: String },

    // Generic wrapper for other errors - auto-convert from anyhow::Error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AuditError {
    /// Helper to create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Helper to create a missing-key template error
    pub fn template_missing_key(key: impl Into<String>) -> Self {
        Self::TemplateMissingKey { key: key.into() }
    }

    /// Helper to create a template syntax error
    pub fn template_syntax(detail: impl Into<String>) -> Self {
        Self::TemplateSyntax { detail: detail.into() }
    }

    /// Helper to create a warehouse error
    pub fn warehouse(message: impl Into<String>) -> Self {
        Self::Warehouse { message: message.into() }
    }

    /// Helper to create an analyzer error
    pub fn analyzer(message: impl Into<String>) -> Self {
        Self::Analyzer { message: message.into() }
    }

    /// Helper to create a model error
    pub fn model(message: impl Into<String>) -> Self {
        Self::Model { message: message.into() }
    }

    /// Helper to create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage { message: message.into() }
    }

    /// Helper to create a token error
    pub fn token(message: impl Into<String>) -> Self {
        Self::Token { message: message.into() }
    }
}

pub type AuditResult<T> = Result<T, AuditError>;
