// infohash.rs
use crate::torrent::{Torrent, TorrentInfo};
use crate::bencode::encode_bvalue;

use sha1::{Sha1, Digest};

/// SHA-1 over the canonical encoding of the info section.
pub fn calculate_info_hash_from_struct(info: &TorrentInfo) -> [u8; 20] {
    // Convert the struct back to its BValue::Dict, then bencode it
    let encoded = encode_bvalue(&info.to_bvalue());
    calculate_info_hash(&encoded)
}

/// SHA-1 over an already bencoded info dictionary.
pub fn calculate_info_hash(encoded_info: &[u8]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(encoded_info);
    let result = hasher.finalize();

    let mut hash_bytes = [0u8; 20];
    hash_bytes.copy_from_slice(&result);
    hash_bytes
}

impl TorrentInfo {
    pub fn info_hash(&self) -> [u8; 20] {
        calculate_info_hash_from_struct(self)
    }
}

impl Torrent {
    pub fn info_hash(&self) -> [u8; 20] {
        self.info.info_hash()
    }

    pub fn info_hash_hex(&self) -> String {
        hex::encode(self.info_hash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bencode::decode;

    fn info_bytes() -> Vec<u8> {
        let mut out = b"d6:lengthi12345e4:name8:file.txt12:piece lengthi16384e6:pieces20:".to_vec();
        out.extend(0u8..20);
        out.push(b'e');
        out
    }

    #[test]
    fn test_info_hash_known_value() {
        assert_eq!(
            hex::encode(calculate_info_hash(&info_bytes())),
            "a13a22cedb4e17039361833d6cfa97681ac90f27"
        );
    }

    #[test]
    fn test_info_hash_from_struct_matches_raw_bytes() {
        let mut torrent_bytes = b"d8:announce1:a4:info".to_vec();
        torrent_bytes.extend_from_slice(&info_bytes());
        torrent_bytes.push(b'e');

        let torrent = Torrent::from_bytes(&torrent_bytes).unwrap();
        assert_eq!(torrent.info_hash(), calculate_info_hash(&info_bytes()));
        assert_eq!(torrent.info_hash_hex(), "a13a22cedb4e17039361833d6cfa97681ac90f27");
    }

    #[test]
    fn test_info_hash_ignores_source_key_order() {
        // same info dictionary with keys shuffled
        let mut shuffled = b"d4:name8:file.txt6:pieces20:".to_vec();
        shuffled.extend(0u8..20);
        shuffled.extend_from_slice(b"6:lengthi12345e12:piece lengthi16384ee");

        let dict = match decode(&shuffled).unwrap() {
            crate::bencode::BValue::Dict(map) => map,
            other => panic!("expected dictionary, got {:?}", other),
        };
        let info = TorrentInfo::from_dict(dict).unwrap();
        assert_eq!(hex::encode(info.info_hash()), "a13a22cedb4e17039361833d6cfa97681ac90f27");
    }
}
