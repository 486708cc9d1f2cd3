use thiserror::Error;

#[derive(Error, Debug)]
pub enum FaynoError {
    #[error("missing value for {flag}")]
    MissingValue { flag: String },

    #[error("invalid boolean value for {flag}: {value:?}")]
    InvalidBool { flag: String, value: String },

    #[error("unknown upload flag: {0}")]
    UnknownFlag(String),

    #[error("use only one changelog source: --changelog, --changelog-file, or --changelog-stdin")]
    ConflictingChangelogSources,

    #[error("at least one --file is required")]
    NoFiles,

    #[error("file path cannot be empty")]
    EmptyFilePath,

    #[error("invalid log level {0:?}")]
    InvalidLogLevel(String),

    #[error("{var} is required")]
    MissingToken { var: &'static str },

    #[error("server is empty: set in config or via {var}")]
    EmptyServer { var: &'static str },

    #[error("owner is empty: set in config or via {var}")]
    EmptyOwner { var: &'static str },

    #[error("config not found, run: faynosync init")]
    ConfigNotFound,

    #[error("Configuration error at {path}: {message}")]
    Config { path: String, message: String },

    #[error("unknown key: {0} (allowed: server, owner)")]
    UnknownConfigKey(String),

    #[error("value cannot be empty")]
    EmptyValue,

    #[error("could not determine home directory")]
    NoHomeDir,

    #[error("failed to open {path}: {source}")]
    OpenFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("upload body aborted: {0}")]
    Stream(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FaynoError {
    /// Argument errors are detected before any I/O happens.
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            FaynoError::MissingValue { .. }
                | FaynoError::InvalidBool { .. }
                | FaynoError::UnknownFlag(_)
                | FaynoError::ConflictingChangelogSources
                | FaynoError::NoFiles
                | FaynoError::InvalidLogLevel(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FaynoError>;
