use thiserror::Error;

/// Custom error type for tokens, allow us to differentiate between errors.
///
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("HTTP Error: {0}")]
    HTTP(String),
    #[error("Login rejected ({code}): {message}")]
    Rejected { code: i64, message: String },
    #[error("Decoding token: {0}")]
    Decoding(String),
    #[error("Token expired")]
    Expired,
    #[error("Not authenticated")]
    NoToken,
}

/// Custom error type for everything talking to the portal.
///
#[derive(Debug, Error)]
pub enum PortalError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("HTTP Error: {0}")]
    HTTP(#[from] reqwest::Error),
    #[error("HTTP status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("Portal error ({code}): {message}")]
    Remote {
        code: i64,
        message: String,
        details: Vec<String>,
    },
    #[error("Decoding reply from {0}: {1}")]
    Decoding(String, String),
    #[error("Bad portal url {0}")]
    BadUrl(String),
    #[error("Item {0} has no service url")]
    NoServiceUrl(String),
    #[error("Update of item {0} was refused")]
    UpdateFailed(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The item we were told to use is not there or not what we expect.
///
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Item {0} was not found! Please check your item id again")]
    NotFound(String),
    #[error("Item {id} is a {kind}, not a web map. Please check again")]
    NotWebMap { id: String, kind: String },
}

impl PortalError {
    /// The portal says "does not exist or is inaccessible" in several ways.
    ///
    pub fn is_not_found(&self) -> bool {
        match self {
            PortalError::Status { status, .. } => *status == 404,
            PortalError::Remote { code, message, .. } => {
                *code == 404
                    || ((*code == 400 || *code == 403)
                        && message.to_lowercase().contains("does not exist"))
            }
            _ => false,
        }
    }
}
