use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a structured error envelope
    #[error("API error {code}: {message}")]
    Api { code: String, message: String },

    #[error("Unexpected response shape: {0}")]
    InvalidResponse(String),

    #[error("Not authenticated; call login() or set_token() first")]
    NotAuthenticated,
}

impl ClientError {
    /// Stable error code from the server, if this was an API error
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}
