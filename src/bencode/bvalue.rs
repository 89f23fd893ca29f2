use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BValue {
	ByteString(Vec<u8>), // raw bytes for any string
	Integer(i64),
	List(Vec<BValue>),
	Dict(HashMap<Vec<u8>, BValue>) // keys are opaque bytes, sorted only when encoded
}

impl BValue {
	/// Builds a byte string from text.
	pub fn string(s: &str) -> Self {
		BValue::ByteString(s.as_bytes().to_vec())
	}

	/// Builds a dictionary from `(key, value)` pairs. Later pairs win on duplicate keys.
	pub fn dict<K, I>(pairs: I) -> Self
	where
		K: Into<Vec<u8>>,
		I: IntoIterator<Item = (K, BValue)>,
	{
		BValue::Dict(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
	}

	pub fn as_integer(&self) -> Option<i64> {
		match self {
			BValue::Integer(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_bytes(&self) -> Option<&[u8]> {
		match self {
			BValue::ByteString(b) => Some(b),
			_ => None,
		}
	}

	/// The byte string as UTF-8, if it is one and it decodes.
	pub fn as_str(&self) -> Option<&str> {
		self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
	}

	pub fn as_list(&self) -> Option<&[BValue]> {
		match self {
			BValue::List(items) => Some(items),
			_ => None,
		}
	}

	pub fn as_dict(&self) -> Option<&HashMap<Vec<u8>, BValue>> {
		match self {
			BValue::Dict(map) => Some(map),
			_ => None,
		}
	}

	/// Dictionary lookup; `None` for missing keys and for non-dictionaries.
	pub fn get(&self, key: &[u8]) -> Option<&BValue> {
		self.as_dict().and_then(|map| map.get(key))
	}

	/// Short name of the variant, used in error messages.
	pub fn kind(&self) -> &'static str {
		match self {
			BValue::ByteString(_) => "byte string",
			BValue::Integer(_) => "integer",
			BValue::List(_) => "list",
			BValue::Dict(_) => "dictionary",
		}
	}
}

impl From<i64> for BValue {
	fn from(i: i64) -> Self {
		BValue::Integer(i)
	}
}

impl From<&str> for BValue {
	fn from(s: &str) -> Self {
		BValue::string(s)
	}
}

impl From<Vec<u8>> for BValue {
	fn from(bytes: Vec<u8>) -> Self {
		BValue::ByteString(bytes)
	}
}

impl From<&[u8]> for BValue {
	fn from(bytes: &[u8]) -> Self {
		BValue::ByteString(bytes.to_vec())
	}
}

impl From<Vec<BValue>> for BValue {
	fn from(items: Vec<BValue>) -> Self {
		BValue::List(items)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_accessors_match_variant() {
		let value = BValue::dict([
			("name", BValue::string("spam")),
			("size", BValue::Integer(3)),
		]);

		assert_eq!(value.get(b"name").and_then(BValue::as_str), Some("spam"));
		assert_eq!(value.get(b"size").and_then(BValue::as_integer), Some(3));
		assert_eq!(value.get(b"missing"), None);
		assert_eq!(BValue::Integer(1).get(b"name"), None);
		assert_eq!(BValue::Integer(1).as_bytes(), None);
	}

	#[test]
	fn test_as_str_rejects_invalid_utf8() {
		let value = BValue::ByteString(vec![0xff, 0xfe]);
		assert_eq!(value.as_str(), None);
		assert_eq!(value.as_bytes(), Some(&[0xff, 0xfe][..]));
	}

	#[test]
	fn test_equality_ignores_insertion_order() {
		let a = BValue::dict([("a", BValue::Integer(1)), ("b", BValue::Integer(2))]);
		let b = BValue::dict([("b", BValue::Integer(2)), ("a", BValue::Integer(1))]);
		assert_eq!(a, b);
	}
}
