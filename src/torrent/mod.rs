pub mod display;
pub mod error;
pub mod infohash;
pub mod metadata;

pub use display::{text, TorrentSummary};
pub use error::MetadataError;
pub use infohash::{calculate_info_hash, calculate_info_hash_from_struct};
pub use metadata::{ExtraFields, FileEntry, FileLayout, Pieces, Torrent, TorrentInfo, PIECE_HASH_LEN};
