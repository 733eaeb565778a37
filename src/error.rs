use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a document source into a parsed tree.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to fetch {url}: HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Failure to write the parselet to its destination.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to serialize parselet as JSON")]
    Json(#[from] serde_json::Error),

    #[error("failed to serialize parselet as YAML")]
    Yaml(#[from] serde_yml::Error),

    #[error("failed to write {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure to read an existing parselet file.
#[derive(Debug, Error)]
pub enum ParseletError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid parselet in {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },
}

#[derive(Debug, Error)]
pub enum SelectorError {
    #[error("invalid CSS selector {expression:?}: {message}")]
    Invalid { expression: String, message: String },

    #[error("XPath expressions are not supported: {0:?}")]
    XPath(String),

    #[error("empty selector expression")]
    Empty,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error("required property {0:?} matched nothing")]
    MissingRequired(String),

    #[error("malformed parselet key {0:?}")]
    MalformedKey(String),
}

/// Everything a session command can fail with.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid property: {name} (valid properties: {valid:?})")]
    InvalidParent { name: String, valid: Vec<String> },

    #[error("property {name:?} is a simple property; nested properties need a list or object parent")]
    ScalarParent { name: String },

    #[error("invalid property name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Parselet(#[from] ParseletError),

    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}
