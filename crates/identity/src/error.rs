use thiserror::Error;

/// Errors returned by identity provider operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// No external user exists with the given ID.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// An external user already owns the e-mail address.
    #[error("Email already registered: {0}")]
    EmailExists(String),

    /// The bearer token was rejected.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The provider answered with an error status.
    #[error("Identity provider returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The request never produced a response.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider's response could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The provider refused to serve the call.
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

impl IdentityError {
    /// Returns true if the error means the user does not exist.
    pub fn is_user_not_found(&self) -> bool {
        matches!(self, IdentityError::UserNotFound(_))
    }
}

/// Result type for identity provider operations.
pub type Result<T> = std::result::Result<T, IdentityError>;
