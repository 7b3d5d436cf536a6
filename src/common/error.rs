use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnhanceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("invalid route pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("route rule targets unknown group: {0}")]
    UnknownGroup(String),

    #[error("profile error: {0}")]
    Profile(String),
}

impl EnhanceError {
    /// The offending pattern, group name or message, for log fields.
    /// I/O and YAML errors carry no subject.
    pub fn subject(&self) -> Option<&str> {
        match self {
            EnhanceError::InvalidPattern { pattern, .. } => Some(pattern),
            EnhanceError::UnknownGroup(name) => Some(name),
            EnhanceError::Profile(msg) => Some(msg),
            EnhanceError::Io(_) | EnhanceError::Yaml(_) => None,
        }
    }

    /// Whether the profile was readable and well-formed YAML but its
    /// contents were rejected.
    pub fn is_profile_error(&self) -> bool {
        self.subject().is_some()
    }
}
