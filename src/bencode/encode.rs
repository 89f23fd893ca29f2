use serde_json::Value;
use super::error::BencodeError;
use super::json::json_to_bvalue;
use super::BValue;

/// Encode a `BValue` back into a bencoded `Vec<u8>`.
///
/// Dictionary keys are always written in ascending byte order, whatever order
/// the map was filled in, so the output is the canonical form.
pub fn encode_bvalue(value: &BValue) -> Vec<u8> {
	let mut out: Vec<u8> = Vec::new();
	encode_into(value, &mut out);
	out
}

/// Bencode an externally supplied JSON value.
///
/// Fails with `UnsupportedType` on anything bencode has no variant for.
pub fn encode_json(value: &Value) -> Result<Vec<u8>, BencodeError> {
	let bvalue = json_to_bvalue(value)?;
	Ok(encode_bvalue(&bvalue))
}

fn encode_into(value: &BValue, out: &mut Vec<u8>) {
	match value {
		BValue::Integer(i) => {
			out.push(b'i');
			out.extend_from_slice(i.to_string().as_bytes());
			out.push(b'e');
		}
		BValue::ByteString(bytes) => encode_bytes(bytes, out),
		BValue::List(items) => {
			out.push(b'l');
			for item in items {
				encode_into(item, out);
			}
			out.push(b'e');
		}
		BValue::Dict(dict) => {
			out.push(b'd');
			let mut entries: Vec<(&Vec<u8>, &BValue)> = dict.iter().collect();
			entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
			for (key, val) in entries {
				encode_bytes(key, out);
				encode_into(val, out);
			}
			out.push(b'e');
		}
	}
}

fn encode_bytes(bytes: &[u8], out: &mut Vec<u8>) {
	out.extend_from_slice(bytes.len().to_string().as_bytes());
	out.push(b':');
	out.extend_from_slice(bytes);
}
