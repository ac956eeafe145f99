//! Errors of the genealogy model.
//!
//! Only precondition failures and broken registry invariants are errors.
//! A population dying out is an ordinary outcome of a run, see
//! [`crate::Status`].

use crate::PersonId;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A catalog file could not be read, or an output file could not be
    /// written.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The seed data leaves one of the pools empty, so no draw is possible.
    #[error("the pool of {0} is empty")]
    EmptyPool(&'static str),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("person {0} is not in the roster")]
    UnknownPerson(PersonId),
    #[error("person {0} is already in the roster")]
    DuplicatePerson(PersonId),
    #[error("state file: {0}")]
    State(#[from] serde_json::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
