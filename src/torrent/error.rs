use thiserror::Error;

use crate::bencode::BencodeError;

/// Failures while mapping between a bencoded tree and a [`Torrent`](super::Torrent).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetadataError {
    #[error("Bencode error: {0}")]
    Bencode(#[from] BencodeError),

    #[error("Missing '{0}'")]
    MissingField(String),

    #[error("'{key}' must be a {expected}, found {found}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("info has both 'length' and 'files'")]
    AmbiguousLayout,

    #[error("info has neither 'length' nor 'files'")]
    MissingLayout,
}

impl MetadataError {
    /// True for violations of the metadata schema, false for codec failures.
    pub fn is_schema(&self) -> bool {
        !matches!(self, MetadataError::Bencode(_))
    }
}
