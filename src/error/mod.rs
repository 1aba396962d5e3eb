use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Trace error: {0}")]
    Trace(#[from] TraceError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Errors raised by the HTTP request wrapper.
///
/// Network-level failures carry no HTTP status and are reported as status 0
/// by [`ApiError::status`]; everything the backend answered with a non-2xx
/// status becomes [`ApiError::Status`] with whatever structured body could
/// be recovered.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network failure: {message}")]
    Transport { message: String },

    #[error("API error: {status} - {message}")]
    Status {
        status: u16,
        message: String,
        data: Option<serde_json::Value>,
    },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },
}

impl ApiError {
    /// HTTP status of the failure, with 0 standing in for transport errors.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Status { status, .. } => *status,
            _ => 0,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport {
            message: err.to_string(),
        }
    }
}

/// User-facing classification of authentication and session failures.
#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account blocked: {message}")]
    BlockedAccount { message: String },

    #[error("Too many attempts, wait before retrying")]
    RateLimited,

    #[error("Validation failed")]
    Validation { fields: Vec<(String, String)> },

    #[error("Session expired")]
    SessionExpired,

    #[error("Server error, try again later")]
    Server { status: u16 },

    #[error("Network failure, check your connection")]
    Network,
}

/// Substrings the backend is known to use in blocked-account messages.
///
/// Matching free text is brittle and stands in for a machine-readable error
/// code the backend does not yet provide.
const BLOCKED_KEYWORDS: &[&str] = &["blocked", "suspended", "disabled", "locked", "deactivated"];

impl AuthError {
    /// Classify a raw API failure into the user-facing taxonomy.
    ///
    /// `at_login` distinguishes a 401 meaning "wrong password" from a 401
    /// meaning "your session ran out" on any other call.
    pub fn classify(err: &ApiError, at_login: bool) -> Self {
        match err {
            ApiError::Transport { .. } => AuthError::Network,
            ApiError::InvalidResponse { .. } => AuthError::Server { status: 0 },
            ApiError::Status {
                status,
                message,
                data,
            } => match status {
                401 if at_login => AuthError::InvalidCredentials,
                401 => AuthError::SessionExpired,
                403 | 423 => {
                    let lower = message.to_lowercase();
                    if BLOCKED_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
                        AuthError::BlockedAccount {
                            message: message.clone(),
                        }
                    } else if at_login {
                        AuthError::InvalidCredentials
                    } else {
                        AuthError::SessionExpired
                    }
                }
                429 => AuthError::RateLimited,
                s if (400..500).contains(s) => match field_errors(data.as_ref()) {
                    Some(fields) if !fields.is_empty() => AuthError::Validation { fields },
                    _ if at_login => AuthError::InvalidCredentials,
                    _ => AuthError::Server { status: *s },
                },
                s => AuthError::Server { status: *s },
            },
        }
    }
}

/// Pull per-field messages out of a structured 4xx error body.
///
/// The backend reports form validation as `{"field": ["msg", ...]}` or
/// `{"field": "msg"}`; anything else yields no fields. `detail` and
/// `message` carry the human-readable summary, not a form field, so a
/// plain `{"detail": "..."}` body never reads as a validation failure.
fn field_errors(data: Option<&serde_json::Value>) -> Option<Vec<(String, String)>> {
    let map = data?.as_object()?;
    let mut fields = Vec::new();
    for (name, value) in map {
        if name == "detail" || name == "message" {
            continue;
        }
        match value {
            serde_json::Value::String(msg) => fields.push((name.clone(), msg.clone())),
            serde_json::Value::Array(msgs) => {
                for msg in msgs.iter().filter_map(|m| m.as_str()) {
                    fields.push((name.clone(), msg.to_string()));
                }
            }
            _ => {}
        }
    }
    Some(fields)
}

/// State store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read state: {message}")]
    Read { message: String },

    #[error("Failed to persist state: {message}")]
    Write { message: String },

    #[error("Corrupt state file: {message}")]
    Corrupt { message: String },
}

/// Emission-trace verification errors
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Reported total {reported} disagrees with recomputed {computed} at {path}")]
    TotalMismatch {
        path: String,
        reported: f64,
        computed: f64,
    },
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for the HTTP layer
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for session operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Result type alias for state-store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Transport {
            message: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "Network failure: connection refused");
        assert_eq!(err.status(), 0);

        let err = ApiError::Status {
            status: 404,
            message: "not found".to_string(),
            data: None,
        };
        assert_eq!(err.to_string(), "API error: 404 - not found");
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn test_classify_invalid_credentials() {
        let err = ApiError::Status {
            status: 401,
            message: "No active account found".to_string(),
            data: None,
        };
        assert_eq!(
            AuthError::classify(&err, true),
            AuthError::InvalidCredentials
        );
        assert_eq!(AuthError::classify(&err, false), AuthError::SessionExpired);
    }

    #[test]
    fn test_classify_blocked_account() {
        for msg in [
            "Your account has been blocked",
            "Account suspended pending review",
            "account disabled",
            "This account is locked",
            "User deactivated by administrator",
        ] {
            let err = ApiError::Status {
                status: 403,
                message: msg.to_string(),
                data: None,
            };
            assert!(
                matches!(
                    AuthError::classify(&err, true),
                    AuthError::BlockedAccount { .. }
                ),
                "expected blocked classification for {msg:?}"
            );
        }
    }

    #[test]
    fn test_classify_blocked_on_423() {
        let err = ApiError::Status {
            status: 423,
            message: "Account locked".to_string(),
            data: None,
        };
        assert!(matches!(
            AuthError::classify(&err, true),
            AuthError::BlockedAccount { .. }
        ));
    }

    #[test]
    fn test_plain_403_is_not_blocked() {
        let err = ApiError::Status {
            status: 403,
            message: "Forbidden".to_string(),
            data: None,
        };
        assert_eq!(
            AuthError::classify(&err, true),
            AuthError::InvalidCredentials
        );
    }

    #[test]
    fn test_classify_rate_limit_and_server() {
        let err = ApiError::Status {
            status: 429,
            message: "throttled".to_string(),
            data: None,
        };
        assert_eq!(AuthError::classify(&err, true), AuthError::RateLimited);

        let err = ApiError::Status {
            status: 502,
            message: "bad gateway".to_string(),
            data: None,
        };
        assert_eq!(
            AuthError::classify(&err, true),
            AuthError::Server { status: 502 }
        );
    }

    #[test]
    fn test_classify_validation_fields() {
        let err = ApiError::Status {
            status: 400,
            message: "validation failed".to_string(),
            data: Some(json!({
                "email": ["Enter a valid email address."],
                "password": "This field is required."
            })),
        };
        match AuthError::classify(&err, false) {
            AuthError::Validation { fields } => {
                assert_eq!(fields.len(), 2);
                assert!(fields
                    .iter()
                    .any(|(f, m)| f == "email" && m.contains("valid email")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_plain_detail_body_is_not_validation() {
        // The whole parsed body rides along as `data`, so the summary
        // key must not be mistaken for a form field.
        let err = ApiError::Status {
            status: 400,
            message: "Invalid input".to_string(),
            data: Some(json!({"detail": "Invalid input"})),
        };
        assert_eq!(
            AuthError::classify(&err, true),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            AuthError::classify(&err, false),
            AuthError::Server { status: 400 }
        );
    }

    #[test]
    fn test_validation_fields_exclude_summary_keys() {
        let err = ApiError::Status {
            status: 400,
            message: "validation failed".to_string(),
            data: Some(json!({
                "detail": "validation failed",
                "email": ["Enter a valid email address."]
            })),
        };
        match AuthError::classify(&err, false) {
            AuthError::Validation { fields } => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].0, "email");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_network() {
        let err = ApiError::Transport {
            message: "dns failure".to_string(),
        };
        assert_eq!(AuthError::classify(&err, true), AuthError::Network);
    }
}
