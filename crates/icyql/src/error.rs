use icyql_config::ConfigError;
use icyql_core::error::{ErrorKind as QueryErrorKind, QueryError};
use thiserror::Error as ThisError;

///
/// Error
///
/// Public error type: query pipeline failures, configuration failures and
/// requests for entities the engine does not know.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unknown entity '{0}'")]
    UnknownEntity(String),
}

impl Error {
    /// Stable classification for protocol responses.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Query(err) => ErrorKind::Query(err.kind()),
            Self::Config(_) => ErrorKind::Config,
            Self::UnknownEntity(_) => ErrorKind::UnknownEntity,
        }
    }
}

///
/// ErrorKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    Query(QueryErrorKind),
    Config,
    UnknownEntity,
}
