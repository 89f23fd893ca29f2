pub mod bvalue;
pub mod decode;
pub mod encode;
pub mod error;
pub mod json;

pub use bvalue::BValue;   // re-export
pub use decode::{decode, decode_bencode, decode_with_max_depth, Decoder, DEFAULT_MAX_DEPTH};   // re-export
pub use encode::{encode_bvalue, encode_json};   // re-export
pub use error::BencodeError;   // re-export
pub use json::{bvalue_to_json, json_to_bvalue};   // re-export
