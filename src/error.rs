/// Errors surfaced by the home-finder core
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("unknown sort key: '{0}'")]
    InvalidSortKey(String),

    /// Comparison selection already holds the maximum number of properties.
    /// Expected and recoverable: callers warn and carry on.
    #[error("comparison selection is full (max {max} properties)")]
    SelectionFull { max: usize },

    /// A backend record could not be normalized into a `Property`
    #[error("invalid property record{}: {reason}", id.as_deref().map(|i| format!(" '{}'", i)).unwrap_or_default())]
    InvalidRecord { id: Option<String>, reason: String },

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed stored data: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("record API request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn invalid_record(id: Option<&str>, reason: impl Into<String>) -> Self {
        Error::InvalidRecord {
            id: id.map(str::to_string),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_selection_full(&self) -> bool {
        matches!(self, Error::SelectionFull { .. })
    }

    /// Persistence or network failure. Never retried by the core.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_) | Error::Serde(_) | Error::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_record_message_includes_id_when_known() {
        let err = Error::invalid_record(Some("42"), "missing price");
        assert_eq!(err.to_string(), "invalid property record '42': missing price");

        let err = Error::invalid_record(None, "missing id");
        assert_eq!(err.to_string(), "invalid property record: missing id");
    }

    #[test]
    fn classification_helpers() {
        assert!(Error::not_found("property", "x").is_not_found());
        assert!(Error::SelectionFull { max: 3 }.is_selection_full());
        let io = Error::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert!(io.is_io());
        assert!(!Error::InvalidSortKey("x".into()).is_io());
    }
}
