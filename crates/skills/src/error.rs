use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed skill definition: {reason}")]
    MalformedDefinition { reason: String },
    #[error("skill source unavailable: {message}")]
    SourceUnavailable { message: String },
    #[error("access denied: {} escapes the skill directory", path.display())]
    AccessDenied { path: PathBuf },
    #[error("{what} not found")]
    NotFound { what: String },
    #[error("skill [{skill}] has no base path")]
    MissingBasePath { skill: String },
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
    #[error("{} already exists", path.display())]
    AlreadyExists { path: PathBuf },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error("{0}")]
    Message(String),
}

impl Error {
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDefinition {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    #[must_use]
    pub fn access_denied(path: impl Into<PathBuf>) -> Self {
        Self::AccessDenied { path: path.into() }
    }

    #[must_use]
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
