use std::fmt;

use redis::RedisError;
use tracing::warn;

use crate::cache::CacheType;

#[derive(Debug)]
pub enum Error {
    /// A backend handle, key or value was not one of the accepted kinds.
    UnexpectedType {
        expected: Vec<String>,
        actual: String,
    },
    /// The remote client's own failure, untouched.
    Backend(RedisError),
    /// A pending completion was consumed synchronously.
    RequiresAwait(CacheType),
    NoRuntime,
}

impl Error {
    pub fn unexpected_type<E, A>(expected: E, actual: A) -> Self
    where
        E: IntoIterator,
        E::Item: ToString,
        A: ToString,
    {
        Error::UnexpectedType {
            expected: expected.into_iter().map(|kind| kind.to_string()).collect(),
            actual: actual.to_string(),
        }
    }

    pub fn as_backend(&self) -> Option<&RedisError> {
        match self {
            Error::Backend(err) => Some(err),
            _ => None,
        }
    }
}

fn join_kinds(kinds: &[String]) -> String {
    match kinds {
        [] => String::new(),
        [only] => only.clone(),
        [head @ .., last] => format!("{} or {last}", head.join(", ")),
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnexpectedType { expected, actual } => {
                write!(f, "Expected {} but got {actual}", join_kinds(expected))
            }
            Error::Backend(err) => write!(f, "{err}"),
            Error::RequiresAwait(mode) => {
                write!(f, "Operation on a {mode} cache must be awaited")
            }
            Error::NoRuntime => write!(f, "No tokio runtime available to schedule expiries"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RedisError> for Error {
    fn from(error: RedisError) -> Self {
        warn!("Redis backend error: {error}");
        Error::Backend(error)
    }
}
