use std::collections::HashMap;

use log::debug;

use crate::bencode::{decode, encode_bvalue, BValue};
use crate::torrent::MetadataError;

/// Dictionary entries the mapper does not model, kept verbatim.
pub type ExtraFields = HashMap<Vec<u8>, BValue>;

/// Size of one SHA-1 piece digest.
pub const PIECE_HASH_LEN: usize = 20;

/// Represents a .torrent file: the announce URL, optional tracker metadata and the info section.
///
/// Text-like fields hold the raw bytes found in the file. Nothing here is
/// transcoded, so mapping back with [`Torrent::to_bvalue`] reproduces the
/// original dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Torrent {
    pub announce: Vec<u8>,                         // "announce"
    pub announce_list: Option<Vec<Vec<Vec<u8>>>>, // "announce-list", tiers of tracker URLs
    pub comment: Option<Vec<u8>>,
    pub created_by: Option<Vec<u8>>,              // "created by"
    pub creation_date: Option<i64>,               // "creation date", seconds since the epoch
    pub encoding: Option<Vec<u8>>,
    pub info: TorrentInfo,
    pub extra: ExtraFields,
}

/// The info dictionary. Its canonical encoding is what the info hash is taken over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentInfo {
    pub name: Vec<u8>,
    pub piece_length: i64,       // "piece length", always positive
    pub pieces: Pieces,
    pub layout: FileLayout,
    pub private: Option<i64>,
    pub root_hash: Option<Vec<u8>>, // "root hash"
    pub extra: ExtraFields,
}

/// Single-file torrents carry `length`, multi-file torrents carry `files`. Never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileLayout {
    Single { length: i64 },
    Multi { files: Vec<FileEntry> },
}

/// One entry of a multi-file `files` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub length: i64,
    pub path: Vec<Vec<u8>>, // path segments, last one is the file name
    pub extra: ExtraFields,
}

/// The concatenated piece digests, kept as opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pieces(Vec<u8>);

impl Pieces {
    /// Wraps raw digest bytes; the length must be a whole number of digests.
    pub fn new(bytes: Vec<u8>) -> Result<Self, MetadataError> {
        if bytes.len() % PIECE_HASH_LEN != 0 {
            return Err(MetadataError::InvalidValue {
                key: "pieces".to_string(),
                reason: format!(
                    "{} bytes is not a multiple of {}",
                    bytes.len(),
                    PIECE_HASH_LEN
                ),
            });
        }
        Ok(Pieces(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of piece digests.
    pub fn count(&self) -> usize {
        self.0.len() / PIECE_HASH_LEN
    }

    /// Digest of piece `index`.
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        let start = index.checked_mul(PIECE_HASH_LEN)?;
        let end = start.checked_add(PIECE_HASH_LEN)?;
        self.0.get(start..end)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.0.chunks_exact(PIECE_HASH_LEN)
    }
}

impl Torrent {
    /// Decodes bencoded bytes and maps them to a `Torrent`.
    pub fn from_bytes(data: &[u8]) -> Result<Self, MetadataError> {
        let value = decode(data)?;
        Self::try_from(value)
    }

    /// Creates a `Torrent` from a `BValue` (the result of a bencode parse).
    pub fn from_bvalue(value: &BValue) -> Result<Self, MetadataError> {
        Self::try_from(value.clone())
    }

    /// Maps back to a dictionary holding exactly the keys that were parsed.
    pub fn to_bvalue(&self) -> BValue {
        let mut map = self.extra.clone();

        map.insert(b"announce".to_vec(), BValue::ByteString(self.announce.clone()));
        if let Some(tiers) = &self.announce_list {
            let tiers = tiers
                .iter()
                .map(|tier| BValue::List(tier.iter().cloned().map(BValue::ByteString).collect()))
                .collect();
            map.insert(b"announce-list".to_vec(), BValue::List(tiers));
        }
        insert_bytes(&mut map, "comment", &self.comment);
        insert_bytes(&mut map, "created by", &self.created_by);
        if let Some(date) = self.creation_date {
            map.insert(b"creation date".to_vec(), BValue::Integer(date));
        }
        insert_bytes(&mut map, "encoding", &self.encoding);
        map.insert(b"info".to_vec(), self.info.to_bvalue());

        BValue::Dict(map)
    }

    /// Canonical bencoding of the whole torrent.
    pub fn to_bytes(&self) -> Vec<u8> {
        encode_bvalue(&self.to_bvalue())
    }
}

impl TryFrom<BValue> for Torrent {
    type Error = MetadataError;

    fn try_from(value: BValue) -> Result<Self, Self::Error> {
        let mut root = expect_dict(value, "root")?;

        let announce = expect_bytes(take_required(&mut root, "announce")?, "announce")?;
        let announce_list = take(&mut root, "announce-list")
            .map(parse_announce_list)
            .transpose()?;
        let comment = take_bytes(&mut root, "comment")?;
        let created_by = take_bytes(&mut root, "created by")?;
        let creation_date = take(&mut root, "creation date")
            .map(|v| expect_integer(v, "creation date"))
            .transpose()?;
        let encoding = take_bytes(&mut root, "encoding")?;

        let info_dict = expect_dict(take_required(&mut root, "info")?, "info")?;
        let info = TorrentInfo::from_dict(info_dict)?;

        if !root.is_empty() {
            debug!("keeping {} unrecognised top-level keys", root.len());
        }

        Ok(Torrent {
            announce,
            announce_list,
            comment,
            created_by,
            creation_date,
            encoding,
            info,
            extra: root,
        })
    }
}

impl TorrentInfo {
    pub fn from_dict(mut info_dict: HashMap<Vec<u8>, BValue>) -> Result<Self, MetadataError> {
        let name = expect_bytes(take_required(&mut info_dict, "name")?, "name")?;

        let piece_length = expect_integer(take_required(&mut info_dict, "piece length")?, "piece length")?;
        if piece_length <= 0 {
            return Err(MetadataError::InvalidValue {
                key: "piece length".to_string(),
                reason: format!("must be positive, got {}", piece_length),
            });
        }

        let pieces = Pieces::new(expect_bytes(take_required(&mut info_dict, "pieces")?, "pieces")?)?;

        let layout = match (take(&mut info_dict, "length"), take(&mut info_dict, "files")) {
            (Some(_), Some(_)) => return Err(MetadataError::AmbiguousLayout),
            (None, None) => return Err(MetadataError::MissingLayout),
            (Some(length), None) => FileLayout::Single {
                length: non_negative(expect_integer(length, "length")?, "length")?,
            },
            (None, Some(files)) => FileLayout::Multi {
                files: expect_list(files, "files")?
                    .into_iter()
                    .map(FileEntry::from_bvalue)
                    .collect::<Result<_, _>>()?,
            },
        };

        let private = take(&mut info_dict, "private")
            .map(|v| expect_integer(v, "private"))
            .transpose()?;
        let root_hash = take_bytes(&mut info_dict, "root hash")?;

        Ok(TorrentInfo {
            name,
            piece_length,
            pieces,
            layout,
            private,
            root_hash,
            extra: info_dict,
        })
    }

    /// Maps the info section back to its dictionary.
    pub fn to_bvalue(&self) -> BValue {
        let mut map = self.extra.clone();

        map.insert(b"name".to_vec(), BValue::ByteString(self.name.clone()));
        map.insert(b"piece length".to_vec(), BValue::Integer(self.piece_length));
        map.insert(b"pieces".to_vec(), BValue::ByteString(self.pieces.as_bytes().to_vec()));

        match &self.layout {
            FileLayout::Single { length } => {
                map.insert(b"length".to_vec(), BValue::Integer(*length));
            }
            FileLayout::Multi { files } => {
                let files = files.iter().map(FileEntry::to_bvalue).collect();
                map.insert(b"files".to_vec(), BValue::List(files));
            }
        }

        if let Some(private) = self.private {
            map.insert(b"private".to_vec(), BValue::Integer(private));
        }
        insert_bytes(&mut map, "root hash", &self.root_hash);

        BValue::Dict(map)
    }

    /// Sum of all file lengths, saturating at `i64::MAX`.
    pub fn total_length(&self) -> i64 {
        match &self.layout {
            FileLayout::Single { length } => *length,
            FileLayout::Multi { files } => files.iter().fold(0i64, |acc, f| acc.saturating_add(f.length)),
        }
    }

    pub fn is_private(&self) -> bool {
        self.private == Some(1)
    }
}

impl FileEntry {
    fn from_bvalue(value: BValue) -> Result<Self, MetadataError> {
        let mut entry = expect_dict(value, "files")?;

        let length = non_negative(
            expect_integer(take_required(&mut entry, "length")?, "length")?,
            "length",
        )?;
        let path = expect_list(take_required(&mut entry, "path")?, "path")?
            .into_iter()
            .map(|segment| expect_bytes(segment, "path"))
            .collect::<Result<_, _>>()?;

        Ok(FileEntry {
            length,
            path,
            extra: entry,
        })
    }

    fn to_bvalue(&self) -> BValue {
        let mut map = self.extra.clone();
        map.insert(b"length".to_vec(), BValue::Integer(self.length));
        map.insert(
            b"path".to_vec(),
            BValue::List(self.path.iter().cloned().map(BValue::ByteString).collect()),
        );
        BValue::Dict(map)
    }
}

fn parse_announce_list(value: BValue) -> Result<Vec<Vec<Vec<u8>>>, MetadataError> {
    expect_list(value, "announce-list")?
        .into_iter()
        .map(|tier| -> Result<Vec<Vec<u8>>, MetadataError> {
            expect_list(tier, "announce-list")?
                .into_iter()
                .map(|url| expect_bytes(url, "announce-list"))
                .collect()
        })
        .collect()
}

fn insert_bytes(map: &mut HashMap<Vec<u8>, BValue>, key: &str, value: &Option<Vec<u8>>) {
    if let Some(bytes) = value {
        map.insert(key.as_bytes().to_vec(), BValue::ByteString(bytes.clone()));
    }
}

/// Removes `key` from the dictionary.
fn take(dict: &mut HashMap<Vec<u8>, BValue>, key: &str) -> Option<BValue> {
    dict.remove(key.as_bytes())
}

fn take_required(dict: &mut HashMap<Vec<u8>, BValue>, key: &str) -> Result<BValue, MetadataError> {
    take(dict, key).ok_or_else(|| MetadataError::MissingField(key.to_string()))
}

fn take_bytes(dict: &mut HashMap<Vec<u8>, BValue>, key: &str) -> Result<Option<Vec<u8>>, MetadataError> {
    take(dict, key).map(|v| expect_bytes(v, key)).transpose()
}

fn wrong_type(key: &str, expected: &'static str, found: &BValue) -> MetadataError {
    MetadataError::WrongType {
        key: key.to_string(),
        expected,
        found: found.kind(),
    }
}

fn expect_bytes(value: BValue, key: &str) -> Result<Vec<u8>, MetadataError> {
    match value {
        BValue::ByteString(b) => Ok(b),
        other => Err(wrong_type(key, "byte string", &other)),
    }
}

fn expect_integer(value: BValue, key: &str) -> Result<i64, MetadataError> {
    match value {
        BValue::Integer(i) => Ok(i),
        other => Err(wrong_type(key, "integer", &other)),
    }
}

fn expect_list(value: BValue, key: &str) -> Result<Vec<BValue>, MetadataError> {
    match value {
        BValue::List(items) => Ok(items),
        other => Err(wrong_type(key, "list", &other)),
    }
}

fn expect_dict(value: BValue, key: &str) -> Result<HashMap<Vec<u8>, BValue>, MetadataError> {
    match value {
        BValue::Dict(map) => Ok(map),
        other => Err(wrong_type(key, "dictionary", &other)),
    }
}

fn non_negative(value: i64, key: &str) -> Result<i64, MetadataError> {
    if value < 0 {
        return Err(MetadataError::InvalidValue {
            key: key.to_string(),
            reason: format!("must not be negative, got {}", value),
        });
    }
    Ok(value)
}
