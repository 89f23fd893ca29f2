use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BencodeError {
    #[error("Unexpected end of input at byte {0}")]
	UnexpectedEnd(usize),

	#[error("Invalid Integer {0}")]
	InvalidInteger(String),

	#[error("Invalid Format {0}")]
	InvalidFormat(String),

	#[error("Nesting deeper than {0} levels")]
	NestingTooDeep(usize),

	#[error("Trailing data after value at byte {0}")]
	TrailingData(usize),

	#[error("Unsupported type {0}")]
	UnsupportedType(String),
}

impl BencodeError {
	/// Malformed token: bad lead byte, bad integer, bad length prefix.
	pub fn is_syntax(&self) -> bool {
		matches!(
			self,
			BencodeError::InvalidInteger(_)
				| BencodeError::InvalidFormat(_)
				| BencodeError::NestingTooDeep(_)
				| BencodeError::TrailingData(_)
		)
	}

	/// Buffer exhausted before a token or collection closed.
	pub fn is_truncated(&self) -> bool {
		matches!(self, BencodeError::UnexpectedEnd(_))
	}
}
