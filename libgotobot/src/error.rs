//! Error types for Gotobot

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GotobotError>;

#[derive(Error, Debug)]
pub enum GotobotError {
    #[error("Credentials error: {0}")]
    Credentials(#[from] CredentialsError),

    #[error("Authorization error: {0}")]
    Auth(#[from] AuthError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl GotobotError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            GotobotError::InvalidInput(_) => 3,
            GotobotError::Auth(_) => 2,
            GotobotError::Api(ApiError::Status { status: 401, .. }) => 2,
            GotobotError::Api(_) => 1,
            GotobotError::Credentials(_) => 1,
        }
    }
}

/// Failures while loading or saving the credentials record
#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("Failed to read credentials file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse credentials file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Failures in the OAuth setup flows, one variant per step
///
/// Every variant is terminal. When the automated flow fails, the only
/// recovery path is the interactive flow; the message should say so.
#[derive(Error, Debug, Clone)]
pub enum AuthError {
    #[error("Application registration failed: {0}")]
    Registration(String),

    #[error("Login failed: {0}")]
    Login(String),

    #[error("Form parsing failed: {0}")]
    FormParsing(String),

    #[error("No authorization code: {0}")]
    MissingCode(String),

    #[error("Code exchange failed: {0}")]
    CodeExchange(String),

    #[error("Token verification failed: {0}")]
    Verification(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures from the bot API wrapper
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_invalid_input() {
        let error = GotobotError::InvalidInput("Empty content".to_string());
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_auth_errors() {
        let login = GotobotError::Auth(AuthError::Login("wrong password".to_string()));
        assert_eq!(login.exit_code(), 2);

        let exchange = GotobotError::Auth(AuthError::CodeExchange("code already used".to_string()));
        assert_eq!(exchange.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_api_unauthorized() {
        let error = GotobotError::Api(ApiError::Status {
            status: 401,
            body: "Unauthorized".to_string(),
        });
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_api_other_status() {
        let error = GotobotError::Api(ApiError::Status {
            status: 422,
            body: "Unprocessable Entity".to_string(),
        });
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn test_exit_code_credentials_error() {
        let error = GotobotError::Credentials(CredentialsError::MissingField(
            "config directory".to_string(),
        ));
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn test_error_message_formatting_login() {
        let error = GotobotError::Auth(AuthError::Login(
            "server returned the sign-in page again".to_string(),
        ));
        assert_eq!(
            format!("{}", error),
            "Authorization error: Login failed: server returned the sign-in page again"
        );
    }

    #[test]
    fn test_error_message_formatting_api_status() {
        let error = ApiError::Status {
            status: 404,
            body: "Record not found".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Request failed with HTTP 404: Record not found"
        );
    }

    #[test]
    fn test_error_conversion_from_auth_error() {
        let auth_error = AuthError::Registration("HTTP 500".to_string());
        let error: GotobotError = auth_error.into();
        assert!(matches!(error, GotobotError::Auth(_)));
    }

    #[test]
    fn test_error_conversion_from_credentials_error() {
        let creds_error = CredentialsError::MissingField("test".to_string());
        let error: GotobotError = creds_error.into();
        assert!(matches!(error, GotobotError::Credentials(_)));
    }

    #[test]
    fn test_auth_error_messages_never_echo_secrets() {
        // The convention is that variant payloads carry step context and
        // HTTP status/body, never the password or token that was sent.
        let error = AuthError::Login("login POST returned HTTP 200 with sign-in page".to_string());
        let message = format!("{}", error);
        assert!(message.contains("Login failed"));
        assert!(!message.to_lowercase().contains("password"));
    }
}
