use std::collections::HashMap;
use log::trace;
use super::error::BencodeError;
use crate::bencode::bvalue::BValue;

/// Containers nested deeper than this are rejected unless the caller says otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Recursive-descent decoder over an immutable buffer.
///
/// All progress lives in the cursor owned by this struct, so every call to
/// [`decode`] or [`decode_bencode`] works on its own instance and never sees
/// another caller's position.
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Decoder {
            buf,
            pos: 0,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Decodes one value starting at the cursor.
    pub fn decode_value(&mut self) -> Result<BValue, BencodeError> {
        match self.peek()? {
            b'i' => self.decode_integer(),
            b'l' => self.decode_list(),
            b'd' => self.decode_dict(),
            c if c.is_ascii_digit() => self.decode_string().map(BValue::ByteString),
            c => Err(BencodeError::InvalidFormat(format!(
                "Unexpected byte 0x{:02x} at {}",
                c, self.pos
            ))),
        }
    }

    fn peek(&self) -> Result<u8, BencodeError> {
        self.buf
            .get(self.pos)
            .copied()
            .ok_or(BencodeError::UnexpectedEnd(self.pos))
    }

    fn enter(&mut self) -> Result<(), BencodeError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(BencodeError::NestingTooDeep(self.max_depth));
        }
        Ok(())
    }

    /// Decodes `i<digits>e`.
    fn decode_integer(&mut self) -> Result<BValue, BencodeError> {
        self.pos += 1; // skip 'i'
        let digits_start = self.pos;

        loop {
            match self.peek()? {
                b'e' => break,
                b'-' if self.pos == digits_start => self.pos += 1,
                c if c.is_ascii_digit() => self.pos += 1,
                c => {
                    return Err(BencodeError::InvalidInteger(format!(
                        "Unexpected byte 0x{:02x} at {}",
                        c, self.pos
                    )))
                }
            }
        }

        let num_str = std::str::from_utf8(&self.buf[digits_start..self.pos])
            .map_err(|_| BencodeError::InvalidInteger("Non-ASCII data in integer".to_string()))?;
        check_integer_form(num_str)?;

        let parsed = num_str.parse::<i64>().map_err(|e| {
            BencodeError::InvalidInteger(format!("Failed to parse integer '{}': {}", num_str, e))
        })?;

        self.pos += 1; // skip 'e'
        Ok(BValue::Integer(parsed))
    }

    /// Decodes `<length>:<bytes>`. The payload is copied verbatim.
    fn decode_string(&mut self) -> Result<Vec<u8>, BencodeError> {
        let len_start = self.pos;

        loop {
            match self.peek()? {
                b':' => break,
                c if c.is_ascii_digit() => self.pos += 1,
                c => {
                    return Err(BencodeError::InvalidFormat(format!(
                        "Unexpected byte 0x{:02x} in string length at {}",
                        c, self.pos
                    )))
                }
            }
        }

        let len_digits = &self.buf[len_start..self.pos];
        if len_digits.is_empty() {
            return Err(BencodeError::InvalidFormat(format!(
                "Missing string length at {}",
                len_start
            )));
        }

        let length = std::str::from_utf8(len_digits)
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| {
                BencodeError::InvalidFormat(format!("String length too large at {}", len_start))
            })?;

        self.pos += 1; // skip ':'

        // bounds are checked before anything is allocated
        let end = self
            .pos
            .checked_add(length)
            .filter(|&end| end <= self.buf.len())
            .ok_or(BencodeError::UnexpectedEnd(self.buf.len()))?;

        let data = self.buf[self.pos..end].to_vec();
        self.pos = end;
        Ok(data)
    }

    /// Decodes `l<items>e`.
    fn decode_list(&mut self) -> Result<BValue, BencodeError> {
        self.enter()?;
        self.pos += 1; // skip 'l'

        let mut items = Vec::new();
        while self.peek()? != b'e' {
            items.push(self.decode_value()?);
        }

        self.pos += 1; // skip 'e'
        self.depth -= 1;
        Ok(BValue::List(items))
    }

    /// Decodes `d<key><value>...e`. Key order is accepted as found.
    fn decode_dict(&mut self) -> Result<BValue, BencodeError> {
        self.enter()?;
        let dict_start = self.pos;
        self.pos += 1; // skip 'd'

        let mut map = HashMap::new();
        let mut last_key: Option<Vec<u8>> = None;
        let mut sorted = true;

        loop {
            let key = match self.peek()? {
                b'e' => break,
                c if c.is_ascii_digit() => self.decode_string()?,
                c => {
                    return Err(BencodeError::InvalidFormat(format!(
                        "Dict key must be a ByteString, found byte 0x{:02x} at {}",
                        c, self.pos
                    )))
                }
            };

            if map.contains_key(&key) {
                return Err(BencodeError::InvalidFormat(format!(
                    "Duplicate dict key '{}'",
                    String::from_utf8_lossy(&key)
                )));
            }
            if let Some(prev) = &last_key {
                sorted &= *prev < key;
            }

            let value = self.decode_value()?;
            last_key = Some(key.clone());
            map.insert(key, value);
        }

        if !sorted {
            trace!("dictionary at byte {} has keys out of canonical order", dict_start);
        }

        self.pos += 1; // skip 'e'
        self.depth -= 1;
        Ok(BValue::Dict(map))
    }
}

/// Minimal decimal form: no empty body, no `-0`, no leading zeros.
fn check_integer_form(num_str: &str) -> Result<(), BencodeError> {
    let negative = num_str.starts_with('-');
    let digits = if negative { &num_str[1..] } else { num_str };

    if digits.is_empty() {
        return Err(BencodeError::InvalidInteger(format!(
            "Missing digits: '{}'",
            num_str
        )));
    }
    if negative && digits == "0" {
        return Err(BencodeError::InvalidInteger(
            "Negative zero is not allowed".to_string(),
        ));
    }
    if digits.starts_with('0') && digits.len() > 1 {
        return Err(BencodeError::InvalidInteger(format!(
            "Leading zeros are not allowed: {}",
            num_str
        )));
    }
    Ok(())
}

/// Decodes the value at the start of `input`, returning it with the number of bytes consumed.
pub fn decode_bencode(input: &[u8]) -> Result<(usize, BValue), BencodeError> {
    let mut decoder = Decoder::new(input);
    let value = decoder.decode_value()?;
    Ok((decoder.position(), value))
}

/// Decodes `input` as exactly one value.
pub fn decode(input: &[u8]) -> Result<BValue, BencodeError> {
    decode_with_max_depth(input, DEFAULT_MAX_DEPTH)
}

/// Like [`decode`], with an explicit nesting limit.
pub fn decode_with_max_depth(input: &[u8], max_depth: usize) -> Result<BValue, BencodeError> {
    let mut decoder = Decoder::new(input).with_max_depth(max_depth);
    let value = decoder.decode_value()?;

    if decoder.position() != input.len() {
        return Err(BencodeError::TrailingData(decoder.position()));
    }
    Ok(value)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::bencode::encode_bvalue;

    fn bytes(s: &str) -> BValue {
        BValue::ByteString(s.as_bytes().to_vec())
    }

    #[test]
    fn test_decode_integer() {
        let input = b"i42e";
        let (consumed, value) = decode_bencode(input).unwrap();
        assert_eq!(consumed, input.len());
        assert_eq!(value, BValue::Integer(42));
    }

    #[test]
    fn test_decode_negative_integer() {
        let input = b"i-13e";
        let (consumed, value) = decode_bencode(input).unwrap();
        assert_eq!(consumed, input.len());
        assert_eq!(value, BValue::Integer(-13));
    }

    #[test]
    fn test_decode_integer_zero() {
        let input = b"i0e";
        let (consumed, value) = decode_bencode(input).unwrap();
        assert_eq!(consumed, input.len());
        assert_eq!(value, BValue::Integer(0));
    }

    #[test]
    fn test_decode_integer_extremes() {
        assert_eq!(decode(b"i9223372036854775807e").unwrap(), BValue::Integer(i64::MAX));
        assert_eq!(decode(b"i-9223372036854775808e").unwrap(), BValue::Integer(i64::MIN));
    }

    #[test]
    fn test_decode_string() {
        let input = b"5:hello";
        let (consumed, value) = decode_bencode(input).unwrap();
        assert_eq!(consumed, input.len());
        assert_eq!(value, bytes("hello"));
    }

    #[test]
    fn test_decode_empty_string() {
        let input = b"0:";
        let (consumed, value) = decode_bencode(input).unwrap();
        assert_eq!(consumed, input.len());
        assert_eq!(value, bytes(""));
    }

    #[test]
    fn test_decode_binary_string_is_verbatim() {
        let payload: Vec<u8> = (0..=255u8).collect();
        let mut input = b"256:".to_vec();
        input.extend_from_slice(&payload);

        let value = decode(&input).unwrap();
        assert_eq!(value, BValue::ByteString(payload));
    }

    #[test]
    fn test_decode_string_with_delimiters_inside() {
        // payload bytes that look like grammar tokens are plain data
        let value = decode(b"6:i1e:le").unwrap();
        assert_eq!(value, bytes("i1e:le"));
    }

    #[test]
    fn test_decode_list() {
        // l4:spami42ee => ["spam", 42]
        let input = b"l4:spami42ee";
        let (consumed, value) = decode_bencode(input).unwrap();
        assert_eq!(consumed, input.len());
        assert_eq!(value, BValue::List(vec![bytes("spam"), BValue::Integer(42)]));
    }

    #[test]
    fn test_decode_empty_list() {
        assert_eq!(decode(b"le").unwrap(), BValue::List(vec![]));
    }

	#[test]
	fn test_decode_nested_list() {
		// l4:spaml3:eggi3eee => ["spam", ["egg", 3]]
		let input = b"l4:spaml3:eggi3eee";
		let (consumed, value) = decode_bencode(input).unwrap();
		assert_eq!(consumed, input.len());
		assert_eq!(
			value,
			BValue::List(vec![
				bytes("spam"),
				BValue::List(vec![bytes("egg"), BValue::Integer(3)]),
			])
		);
	}

    #[test]
    fn test_decode_dict() {
        // d3:bar4:spam3:fooi42ee => {"bar":"spam", "foo":42}
        let input = b"d3:bar4:spam3:fooi42ee";
        let (consumed, value) = decode_bencode(input).unwrap();
        assert_eq!(consumed, input.len());
        let mut expected_map = HashMap::new();
        expected_map.insert(b"bar".to_vec(), bytes("spam"));
        expected_map.insert(b"foo".to_vec(), BValue::Integer(42));
        assert_eq!(value, BValue::Dict(expected_map));
    }

    #[test]
    fn test_decode_empty_dict() {
        let input = b"de";
        let (consumed, value) = decode_bencode(input).unwrap();
        assert_eq!(consumed, input.len());
        assert_eq!(value, BValue::Dict(HashMap::new()));
    }

    #[test]
    fn test_decode_dict_with_nested_list() {
        // => {"foo": ["spam", 1], "bar": "eggs"}, keys deliberately unsorted
        let input = b"d3:fool4:spami1ee3:bar4:eggse";
        let (consumed, value) = decode_bencode(input).unwrap();
        assert_eq!(consumed, input.len());

        let mut expected_map = HashMap::new();
        expected_map.insert(
            b"foo".to_vec(),
            BValue::List(vec![bytes("spam"), BValue::Integer(1)]),
        );
        expected_map.insert(b"bar".to_vec(), bytes("eggs"));
        assert_eq!(value, BValue::Dict(expected_map));
    }

    #[test]
    fn test_decode_dict_binary_key() {
        let value = decode(b"d2:\xff\x00i1ee").unwrap();
        assert_eq!(value.get(&[0xff, 0x00]), Some(&BValue::Integer(1)));
    }

    #[test]
    fn test_decode_reports_consumed_prefix() {
        let (consumed, value) = decode_bencode(b"i1ei2e").unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(value, BValue::Integer(1));
    }

    //
    // Malformed Inputs: Test expected failures
    //

    #[test]
    fn test_decode_empty_input() {
        assert_eq!(decode(b""), Err(BencodeError::UnexpectedEnd(0)));
    }

    #[test]
    fn test_decode_integer_missing_e() {
        let err = decode(b"i42").unwrap_err();
        assert!(err.is_truncated(), "{:?}", err);
    }

    #[test]
    fn test_decode_leading_zeros() {
        for input in [&b"i04e"[..], &b"i0123e"[..], &b"i-04e"[..], &b"i00e"[..]] {
            let err = decode(input).unwrap_err();
            assert!(matches!(err, BencodeError::InvalidInteger(_)), "{:?}", err);
        }
    }

    #[test]
    fn test_decode_negative_zero() {
        let err = decode(b"i-0e").unwrap_err();
        assert!(matches!(err, BencodeError::InvalidInteger(_)));
        assert!(err.is_syntax());
    }

    #[test]
    fn test_decode_integer_without_digits() {
        assert!(decode(b"ie").unwrap_err().is_syntax());
        assert!(decode(b"i-e").unwrap_err().is_syntax());
    }

    #[test]
    fn test_decode_integer_foreign_bytes() {
        for input in [&b"i+4e"[..], &b"i 4e"[..], &b"i4x2e"[..], &b"i--1e"[..], &b"i1-e"[..]] {
            let err = decode(input).unwrap_err();
            assert!(err.is_syntax(), "{:?} for {:?}", err, input);
        }
    }

    #[test]
    fn test_decode_integer_overflow() {
        let err = decode(b"i9223372036854775808e").unwrap_err();
        assert!(matches!(err, BencodeError::InvalidInteger(_)));
    }

    #[test]
    fn test_decode_string_missing_colon() {
        let err = decode(b"5hello").unwrap_err();
        assert!(err.is_syntax(), "{:?}", err);
    }

    #[test]
    fn test_decode_string_truncated_payload() {
        let err = decode(b"10:short").unwrap_err();
        assert!(err.is_truncated());
        assert!(decode(b"12").unwrap_err().is_truncated());
    }

    #[test]
    fn test_decode_string_huge_length_is_truncation() {
        let err = decode(b"99999999999999:x").unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn test_decode_string_length_leading_zero() {
        let value = decode(b"04:spam").unwrap();
        assert_eq!(value, BValue::ByteString(b"spam".to_vec()));
        assert_eq!(encode_bvalue(&value), b"4:spam");

        assert_eq!(decode(b"l00:e").unwrap(), BValue::List(vec![BValue::ByteString(vec![])]));
    }

    #[test]
    fn test_decode_negative_string_length() {
        assert!(decode(b"-3:abc").unwrap_err().is_syntax());
    }

    #[test]
    fn test_decode_list_unclosed() {
        let err = decode(b"l4:spam").unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn test_decode_dict_unclosed() {
        let err = decode(b"d3:foo4:spam").unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn test_decode_dict_missing_value() {
        assert!(decode(b"d3:fooe").unwrap_err().is_syntax());
        assert!(decode(b"d3:foo").unwrap_err().is_truncated());
    }

    #[test]
    fn test_decode_dict_key_not_string() {
        // d i42e 4:spam e => malformed, dictionary keys must be strings
        let err = decode(b"di42e4:spame").unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn test_decode_dict_duplicate_key() {
        let err = decode(b"d3:fooi1e3:fooi2ee").unwrap_err();
        assert!(matches!(err, BencodeError::InvalidFormat(_)));
    }

    #[test]
    fn test_decode_unknown_lead_byte() {
        assert!(decode(b"x").unwrap_err().is_syntax());
        assert!(decode(b"e").unwrap_err().is_syntax());
    }

    #[test]
    fn test_decode_trailing_data() {
        assert_eq!(decode(b"i1ei2e"), Err(BencodeError::TrailingData(3)));
    }

    #[test]
    fn test_decode_nesting_limit() {
        let deep = |n: usize| {
            let mut input = vec![b'l'; n];
            input.extend(std::iter::repeat(b'e').take(n));
            input
        };

        assert!(decode_with_max_depth(&deep(8), 8).is_ok());
        assert_eq!(
            decode_with_max_depth(&deep(9), 8),
            Err(BencodeError::NestingTooDeep(8))
        );
        assert!(decode(&deep(DEFAULT_MAX_DEPTH)).is_ok());
        assert!(decode(&deep(DEFAULT_MAX_DEPTH + 1)).is_err());
    }

    #[test]
    fn test_decode_sibling_containers_do_not_accumulate_depth() {
        let value = decode_with_max_depth(b"llelelelee", 2).unwrap();
        assert_eq!(value.as_list().map(|l| l.len()), Some(4));
    }
}
