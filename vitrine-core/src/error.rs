use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Record not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Transient failure: {0}")]
    Transient(String),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid rating: {0}")]
    InvalidRating(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Empty upload")]
    EmptyUpload,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found")]
    NotFound,

    #[error("Session expired")]
    Expired,

    #[error("Invalid session token: {0}")]
    InvalidToken(String),
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Invalid or expired reset token")]
    Invalid,

    #[error("Reset token expired")]
    Expired,
}

impl Error {
    /// True for the error kinds that map to a client-side rejection
    /// rather than an infrastructure failure.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Storage(StorageError::Conflict(_)))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Storage(StorageError::NotFound))
    }

    /// Transient storage failures are eligible for caller-side retry
    /// on pure reads only. Read-modify-write operations must re-read
    /// current state before retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Storage(StorageError::Transient(_)))
    }

    pub fn is_token_error(&self) -> bool {
        matches!(self, Error::Token(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let auth_error = Error::Auth(AuthError::InvalidCredentials);
        assert_eq!(
            auth_error.to_string(),
            "Authentication error: Invalid credentials"
        );

        let conflict = Error::Storage(StorageError::Conflict("email taken".to_string()));
        assert_eq!(conflict.to_string(), "Storage error: Conflict: email taken");

        let token_error = Error::Token(TokenError::Invalid);
        assert_eq!(
            token_error.to_string(),
            "Token error: Invalid or expired reset token"
        );
    }

    #[test]
    fn test_classification_helpers() {
        assert!(Error::Storage(StorageError::Conflict("x".into())).is_conflict());
        assert!(Error::Storage(StorageError::NotFound).is_not_found());
        assert!(Error::Storage(StorageError::Transient("busy".into())).is_transient());
        assert!(Error::Token(TokenError::Expired).is_token_error());
        assert!(Error::Validation(ValidationError::EmptyUpload).is_validation_error());
        assert!(!Error::Auth(AuthError::Unauthorized).is_conflict());
    }

    #[test]
    fn test_error_from_conversions() {
        let error: Error = AuthError::Unauthorized.into();
        assert!(matches!(error, Error::Auth(AuthError::Unauthorized)));

        let error: Error = ValidationError::MissingField("email".to_string()).into();
        assert!(matches!(
            error,
            Error::Validation(ValidationError::MissingField(_))
        ));
    }
}
