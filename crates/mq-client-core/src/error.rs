//! Error type shared by every queue operation.

use std::fmt;

/// Boxed cause reported by a broker client.
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// A flag value could not be turned into a usable setting.
    Config(String),
    UnsupportedFunction(String),
    UnsupportedType(String),
    /// User id or password missing when the connection was requested.
    Credentials,
    Connection {
        context: String,
        source: Option<Cause>,
    },
    Operation {
        context: String,
        source: Option<Cause>,
    },
}

impl Error {
    pub fn connection(context: impl Into<String>, source: impl Into<Cause>) -> Self {
        Error::Connection {
            context: context.into(),
            source: Some(source.into()),
        }
    }

    pub fn operation(context: impl Into<String>, source: impl Into<Cause>) -> Self {
        Error::Operation {
            context: context.into(),
            source: Some(source.into()),
        }
    }

    /// True for every error raised before a connection is attempted.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::Config(_) | Error::UnsupportedFunction(_) | Error::UnsupportedType(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "configuration error: {}", msg),
            Error::UnsupportedFunction(value) => {
                write!(f, "function value '{}' not supported", value)
            }
            Error::UnsupportedType(value) => write!(f, "type value '{}' not supported", value),
            Error::Credentials => write!(f, "invalid credentials provided"),
            Error::Connection { context, .. } => write!(f, "connection failed: {}", context),
            Error::Operation { context, .. } => write!(f, "operation failed: {}", context),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Connection { source, .. } | Error::Operation { source, .. } => source
                .as_deref()
                .map(|e| e as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}
