use reelbox_api::ApiError;
use reelbox_core::error::ReelboxError;

/// Messages shown in place of a content list when a load fails.
pub mod message {
    pub const API_URL_NOT_SET: &str =
        "Open Settings and configure your server address.";
    pub const API_URL_INVALID: &str = "Server address is invalid, check it in Settings.";
    pub const UNAUTHORIZED: &str = "Authentication failed, please log in again.";
    pub const NETWORK: &str = "Network connection failed, check your connection.";
    pub const TIMEOUT: &str = "Request timed out, check your network or server status.";
    pub const NOT_FOUND: &str = "Server API path is wrong, check the server configuration.";
    pub const SERVER_ERROR: &str = "Internal server error, contact the administrator.";
    pub const FORBIDDEN: &str = "Access denied, check your permissions.";
    pub const GENERIC: &str = "Load failed, please retry.";
}

/// A failed content load, from either the catalog server or local history.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    History(#[from] ReelboxError),
}

impl LoadError {
    /// The message stored in the store's `error` field.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Api(ApiError::ApiUrlNotSet) => message::API_URL_NOT_SET,
            Self::Api(ApiError::InvalidBaseUrl(_)) => message::API_URL_INVALID,
            Self::Api(ApiError::Unauthorized) => message::UNAUTHORIZED,
            Self::Api(ApiError::Network(_)) => message::NETWORK,
            Self::Api(ApiError::Timeout) => message::TIMEOUT,
            Self::Api(ApiError::Status { status, .. }) => match status {
                401 => message::UNAUTHORIZED,
                403 => message::FORBIDDEN,
                404 => message::NOT_FOUND,
                500 => message::SERVER_ERROR,
                _ => message::GENERIC,
            },
            Self::Api(ApiError::Parse(_)) | Self::History(_) => message::GENERIC,
        }
    }
}

/// Failures while wiring up the runtime.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("api error: {0}")]
    Api(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: u16) -> LoadError {
        LoadError::Api(ApiError::Status {
            status,
            message: String::new(),
        })
    }

    #[test]
    fn test_messages_by_failure() {
        assert_eq!(
            LoadError::from(ApiError::ApiUrlNotSet).user_message(),
            message::API_URL_NOT_SET
        );
        assert_eq!(
            LoadError::from(ApiError::InvalidBaseUrl("relative URL without a base".into()))
                .user_message(),
            message::API_URL_INVALID
        );
        assert_eq!(
            LoadError::from(ApiError::Unauthorized).user_message(),
            message::UNAUTHORIZED
        );
        assert_eq!(
            LoadError::from(ApiError::Network("refused".into())).user_message(),
            message::NETWORK
        );
        assert_eq!(LoadError::from(ApiError::Timeout).user_message(), message::TIMEOUT);
        assert_eq!(status(404).user_message(), message::NOT_FOUND);
        assert_eq!(status(500).user_message(), message::SERVER_ERROR);
        assert_eq!(status(403).user_message(), message::FORBIDDEN);
        assert_eq!(status(502).user_message(), message::GENERIC);
        assert_eq!(
            LoadError::from(ReelboxError::Config("closed".into())).user_message(),
            message::GENERIC
        );
    }
}
