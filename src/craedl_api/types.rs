use std::fmt;

/// Craedl API error type
///
/// Represents all possible errors that can occur when talking to the
/// Craedl API or managing the local credential state.
#[derive(Debug)]
pub enum CraedlError {
    /// Authentication failed before or during the identity check
    Auth(AuthError),
    /// API request failed (network, HTTP, or response parsing error)
    Api(ApiError),
    /// Token storage operation failed
    Storage(crate::storage::StorageError),
    /// A requested resource, directory, or file does not exist
    NotFound(String),
    /// The token is valid but lacks access to the resource (HTTP 403)
    PermissionDenied(String),
    /// Local file IO failed (upload source, download destination)
    Io(std::io::Error),
    /// Local configuration error
    Config(String),
}

impl fmt::Display for CraedlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CraedlError::Auth(err) => write!(f, "Authentication failed: {}", err),
            CraedlError::Api(err) => write!(f, "API error: {}", err),
            CraedlError::Storage(err) => write!(f, "Storage error: {}", err),
            CraedlError::NotFound(what) => write!(f, "{}: no such file or directory", what),
            CraedlError::PermissionDenied(what) => write!(f, "{}: permission denied", what),
            CraedlError::Io(err) => write!(f, "IO error: {}", err),
            CraedlError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for CraedlError {}

impl From<AuthError> for CraedlError {
    fn from(err: AuthError) -> Self {
        CraedlError::Auth(err)
    }
}

impl From<ApiError> for CraedlError {
    fn from(err: ApiError) -> Self {
        CraedlError::Api(err)
    }
}

impl From<crate::storage::StorageError> for CraedlError {
    fn from(err: crate::storage::StorageError) -> Self {
        CraedlError::Storage(err)
    }
}

impl From<std::io::Error> for CraedlError {
    fn from(err: std::io::Error) -> Self {
        CraedlError::Io(err)
    }
}

/// Authentication errors covering the stored-token lifecycle
///
/// `MissingToken` and `ExpiredToken` are detected locally before any
/// request is made; `InvalidToken` is the server rejecting the token
/// (revoked, regenerated, or never valid).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No access token has been configured on this machine
    MissingToken,
    /// The stored token is past its 28-day validity window
    ExpiredToken,
    /// The server rejected the token (HTTP 401)
    InvalidToken,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingToken => write!(
                f,
                "no access token found; run `craedl token` to configure one"
            ),
            AuthError::ExpiredToken => write!(
                f,
                "the stored access token has expired; run `craedl token` to configure a new one"
            ),
            AuthError::InvalidToken => write!(
                f,
                "the server rejected the access token; it may have been revoked or \
                 regenerated (run `craedl token` to configure a new one)"
            ),
        }
    }
}

impl std::error::Error for AuthError {}

/// API-specific errors
#[derive(Debug)]
pub enum ApiError {
    /// Network error (connection, timeout, etc.)
    Network(String),
    /// The server could not parse the request (HTTP 400)
    BadRequest(String),
    /// HTTP error with status code
    Http { status: u16, message: String },
    /// Failed to parse a response body
    Parse(String),
    /// Request building failed
    Request(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "Network error: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Http { status, message } => {
                write!(f, "HTTP {} error: {}", status, message)
            }
            ApiError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ApiError::Request(msg) => write!(f, "Request error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timeout".to_string())
        } else if err.is_connect() {
            ApiError::Network(format!("Connection failed: {}", err))
        } else if let Some(status) = err.status() {
            ApiError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_token_names_the_setup_command() {
        let msg = AuthError::MissingToken.to_string();
        assert!(msg.contains("craedl token"));
    }

    #[test]
    fn expired_token_names_the_setup_command() {
        let msg = AuthError::ExpiredToken.to_string();
        assert!(msg.contains("expired"));
        assert!(msg.contains("craedl token"));
    }

    #[test]
    fn http_error_display_includes_status() {
        let err = ApiError::Http {
            status: 500,
            message: "internal".to_string(),
        };
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn permission_denied_display_names_the_resource() {
        let err = CraedlError::PermissionDenied("project/7/".to_string());
        assert_eq!(err.to_string(), "project/7/: permission denied");
    }

    #[test]
    fn bad_request_display_carries_the_server_message() {
        let err = ApiError::BadRequest("malformed payload".to_string());
        assert_eq!(err.to_string(), "Bad request: malformed payload");
    }

    #[test]
    fn not_found_display_reads_like_a_path_error() {
        let err = CraedlError::NotFound("data/missing.csv".to_string());
        assert_eq!(
            err.to_string(),
            "data/missing.csv: no such file or directory"
        );
    }
}
