// lib.rs - Library interface for the torinfo CLI

pub mod bencode;
pub mod config;
pub mod engine;
pub mod file_io;
pub mod torrent;

// Re-export commonly used types for easier testing
pub use bencode::{decode, encode_bvalue, BValue, BencodeError};
pub use torrent::{MetadataError, Torrent, TorrentInfo};
