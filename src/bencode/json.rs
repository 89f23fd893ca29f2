use serde_json::{json, Map, Value};
use super::error::BencodeError;
use super::BValue;

/// Key used for byte strings that are not valid UTF-8.
pub const BYTES_HEX_KEY: &str = "_bytes_hex";

/// Convert a `BValue` into JSON (using Serde JSON `Value`).
///
/// - `Integer(i)` => JSON number
/// - `ByteString(bytes)` => Attempt UTF-8; if invalid, store hex in `"_bytes_hex"`.
/// - `List(...)` => JSON array
/// - `Dict(...)` => JSON object; keys that are not UTF-8 are shown lossily
///
/// This is a display projection. Only the value side survives
/// [`json_to_bvalue`] unchanged; binary dictionary keys do not.
pub fn bvalue_to_json(bv: &BValue) -> Value {
	match bv {
		BValue::Integer(i) => json!(i),

		BValue::ByteString(bytes) => match std::str::from_utf8(bytes) {
			Ok(utf8_str) => Value::String(utf8_str.to_string()),
			Err(_) => json!({ BYTES_HEX_KEY: hex::encode(bytes) }),
		},

		BValue::List(list_items) => Value::Array(list_items.iter().map(bvalue_to_json).collect()),

		BValue::Dict(map) => {
			let mut json_map = Map::new();
			for (k, v) in map {
				json_map.insert(String::from_utf8_lossy(k).into_owned(), bvalue_to_json(v));
			}
			Value::Object(json_map)
		}
	}
}

/// Convert externally supplied JSON into a `BValue`.
///
/// Bencode has no null, boolean or fractional number, so those fail with
/// `UnsupportedType` instead of being coerced. A single-key object
/// `{"_bytes_hex": "<hex>"}` becomes the raw bytes it spells.
pub fn json_to_bvalue(value: &Value) -> Result<BValue, BencodeError> {
	match value {
		Value::Null => Err(BencodeError::UnsupportedType("null".to_string())),
		Value::Bool(b) => Err(BencodeError::UnsupportedType(format!("boolean {}", b))),
		Value::Number(n) => n
			.as_i64()
			.map(BValue::Integer)
			.ok_or_else(|| BencodeError::UnsupportedType(format!("number {}", n))),
		Value::String(s) => Ok(BValue::string(s)),
		Value::Array(items) => items
			.iter()
			.map(json_to_bvalue)
			.collect::<Result<Vec<_>, _>>()
			.map(BValue::List),
		Value::Object(map) => {
			if let Some(bytes) = hex_bytes(map) {
				return Ok(BValue::ByteString(bytes));
			}
			let mut dict = std::collections::HashMap::with_capacity(map.len());
			for (k, v) in map {
				dict.insert(k.as_bytes().to_vec(), json_to_bvalue(v)?);
			}
			Ok(BValue::Dict(dict))
		}
	}
}

fn hex_bytes(map: &Map<String, Value>) -> Option<Vec<u8>> {
	if map.len() != 1 {
		return None;
	}
	map.get(BYTES_HEX_KEY)
		.and_then(Value::as_str)
		.and_then(|s| hex::decode(s).ok())
}
