use thiserror::Error;

/// Top-level error type for the deskflow router.
#[derive(Debug, Error)]
pub enum DeskError {
    #[error("collaborator error ({service}): {message}")]
    Collaborator { service: String, message: String },

    #[error("invalid session transition: {0}")]
    InvalidTransition(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DeskError {
    pub fn collaborator(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Collaborator {
            service: service.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collaborator_error_names_the_service() {
        let err = DeskError::collaborator("tickets", "HTTP 503");
        assert_eq!(err.to_string(), "collaborator error (tickets): HTTP 503");
    }
}
