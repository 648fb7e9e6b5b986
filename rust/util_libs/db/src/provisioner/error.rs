use mongodb::error::ErrorKind;
use thiserror::Error;

/// Server error code for an unauthorized command.
const CODE_UNAUTHORIZED: i32 = 13;
/// Server error code for `createUser` against an existing username.
const CODE_USER_ALREADY_EXISTS: i32 = 51003;

/// Failures of the one provisioning operation.
///
/// Errors are surfaced, not recovered: every variant propagates to the
/// invoking collaborator as a terminal failure of the call that raised it.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("user {username:?} already exists in the admin database")]
    UserAlreadyExists { username: String },

    #[error("handle lacks the privilege required for {operation}")]
    InsufficientPrivilege { operation: String },

    #[error("could not reach the target server: {source}")]
    Connection { source: mongodb::error::Error },

    #[error("database error during {operation}: {source}")]
    Database {
        source: mongodb::error::Error,
        operation: String,
    },

    #[error("invalid user spec: {reason}")]
    InvalidSpec { reason: String },

    #[error("internal error: {message}")]
    Internal {
        message: String,
        context: Option<String>,
    },
}

impl ProvisionError {
    /// Creates a new InvalidSpec error
    pub fn invalid_spec(reason: impl Into<String>) -> Self {
        Self::InvalidSpec {
            reason: reason.into(),
        }
    }

    /// Creates a new Connection error
    pub fn connection(source: mongodb::error::Error) -> Self {
        Self::Connection { source }
    }

    /// Creates a new Internal error with optional context
    pub fn internal(message: impl Into<String>, context: Option<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context,
        }
    }

    /// Maps a driver error raised by `operation` against `username` onto the
    /// variants the caller can act on.
    pub fn classify(operation: &str, username: &str, error: mongodb::error::Error) -> Self {
        match &*error.kind {
            ErrorKind::Command(cmd)
                if cmd.code == CODE_USER_ALREADY_EXISTS
                    || cmd.message.contains("already exists") =>
            {
                Self::UserAlreadyExists {
                    username: username.to_string(),
                }
            }
            ErrorKind::Command(cmd) if cmd.code == CODE_UNAUTHORIZED => {
                Self::InsufficientPrivilege {
                    operation: operation.to_string(),
                }
            }
            // An unauthenticated handle on an auth-enabled server fails the
            // handshake rather than the command.
            ErrorKind::Authentication { .. } => Self::InsufficientPrivilege {
                operation: operation.to_string(),
            },
            ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) => Self::Connection {
                source: error,
            },
            _ => Self::Database {
                source: error,
                operation: operation.to_string(),
            },
        }
    }

    /// Returns true if this is a UserAlreadyExists error
    pub fn is_user_already_exists(&self) -> bool {
        matches!(self, Self::UserAlreadyExists { .. })
    }

    /// Returns true if this is an InsufficientPrivilege error
    pub fn is_insufficient_privilege(&self) -> bool {
        matches!(self, Self::InsufficientPrivilege { .. })
    }

    /// Returns true if this is a Connection error
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Returns true if this is an InvalidSpec error
    pub fn is_invalid_spec(&self) -> bool {
        matches!(self, Self::InvalidSpec { .. })
    }
}
