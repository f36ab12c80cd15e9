//! Error type for `ideate-corpus-csv`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The idea table could not be read or parsed. Fatal to startup.
  #[error("idea table unavailable: {0}")]
  DataUnavailable(String),
}

impl From<Error> for ideate_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::DataUnavailable(message) => {
        ideate_core::Error::DataUnavailable(message)
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
