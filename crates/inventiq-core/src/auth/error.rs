use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{message}")]
    Login {
        message: String,
        #[source]
        source: ApiError,
    },

    #[error("{message}")]
    Registration {
        message: String,
        #[source]
        source: ApiError,
    },

    #[error("Failed to save session: {0:#}")]
    Storage(anyhow::Error),
}

impl AuthError {
    /// Message suitable for showing inline next to the form that failed.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Login { message, .. } | AuthError::Registration { message, .. } => {
                message.clone()
            }
            AuthError::Storage(_) => "Could not save the session on this device".to_string(),
        }
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            AuthError::Login { source, .. } | AuthError::Registration { source, .. } => Some(source),
            AuthError::Storage(_) => None,
        }
    }
}
