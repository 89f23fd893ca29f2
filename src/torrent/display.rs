//! Human-readable projection of a [`Torrent`].
//!
//! Everything here is output only. The summary types implement `Serialize`
//! but not `Deserialize`, and byte fields are rendered with lossy UTF-8 or hex,
//! so nothing produced here can be mapped back into bencode.

use serde::Serialize;

use crate::torrent::{FileEntry, FileLayout, Pieces, Torrent};

/// Renders bytes as text, replacing invalid UTF-8 sequences.
pub fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn text_opt(bytes: &Option<Vec<u8>>) -> Option<String> {
    bytes.as_deref().map(text)
}

#[derive(Debug, Serialize)]
pub struct TorrentSummary {
    pub info_hash: String,
    pub announce: String,
    #[serde(rename = "announce-list", skip_serializing_if = "Option::is_none")]
    pub announce_list: Option<Vec<Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(rename = "created by", skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(rename = "creation date", skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date_utc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    pub info: InfoSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub other_keys: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct InfoSummary {
    pub name: String,
    #[serde(rename = "piece length")]
    pub piece_length: i64,
    pub pieces: PiecesSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileSummary>>,
    pub total_length: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<i64>,
    #[serde(rename = "root hash", skip_serializing_if = "Option::is_none")]
    pub root_hash: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub other_keys: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FileSummary {
    pub length: i64,
    pub path: String,
}

/// Piece count plus the first few digests in hex.
#[derive(Debug, Serialize)]
pub struct PiecesSummary {
    pub count: usize,
    pub sample: Vec<String>,
    pub truncated: bool,
}

impl TorrentSummary {
    /// Builds the summary, showing at most `sample` piece digests.
    pub fn new(torrent: &Torrent, sample: usize) -> Self {
        TorrentSummary {
            info_hash: torrent.info_hash_hex(),
            announce: text(&torrent.announce),
            announce_list: torrent.announce_list.as_ref().map(|tiers| {
                tiers
                    .iter()
                    .map(|tier| tier.iter().map(|url| text(url)).collect())
                    .collect()
            }),
            comment: text_opt(&torrent.comment),
            created_by: text_opt(&torrent.created_by),
            creation_date: torrent.creation_date,
            creation_date_utc: torrent.creation_date.and_then(utc_timestamp),
            encoding: text_opt(&torrent.encoding),
            info: InfoSummary {
                name: text(&torrent.info.name),
                piece_length: torrent.info.piece_length,
                pieces: torrent.info.pieces.summary(sample),
                length: match torrent.info.layout {
                    FileLayout::Single { length } => Some(length),
                    FileLayout::Multi { .. } => None,
                },
                files: match &torrent.info.layout {
                    FileLayout::Single { .. } => None,
                    FileLayout::Multi { files } => Some(files.iter().map(FileSummary::new).collect()),
                },
                total_length: torrent.info.total_length(),
                private: torrent.info.private,
                root_hash: torrent.info.root_hash.as_ref().map(hex::encode),
                other_keys: sorted_keys(torrent.info.extra.keys()),
            },
            other_keys: sorted_keys(torrent.extra.keys()),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl FileSummary {
    fn new(file: &FileEntry) -> Self {
        let segments: Vec<String> = file.path.iter().map(|s| text(s)).collect();
        FileSummary {
            length: file.length,
            path: segments.join("/"),
        }
    }
}

impl Pieces {
    /// Hex digests, in piece order.
    pub fn hex_digests(&self) -> impl Iterator<Item = String> + '_ {
        self.iter().map(hex::encode)
    }

    pub fn summary(&self, sample: usize) -> PiecesSummary {
        PiecesSummary {
            count: self.count(),
            sample: self.hex_digests().take(sample).collect(),
            truncated: self.count() > sample,
        }
    }

    /// Compact one-line form: `[count] digest digest ... `.
    pub fn describe(&self, sample: usize) -> String {
        let summary = self.summary(sample);
        let mut out = format!("[{}]", summary.count);
        for digest in &summary.sample {
            out.push(' ');
            out.push_str(digest);
        }
        if summary.truncated {
            out.push_str(" ...");
        }
        out
    }
}

/// Formats seconds since the epoch as `YYYY-MM-DDTHH:MM:SSZ`. Years outside
/// 0..=9999 have no such form and yield `None`.
fn utc_timestamp(secs: i64) -> Option<String> {
    let days = secs.div_euclid(86_400);
    let rem = secs.rem_euclid(86_400);

    // civil date from days since 1970-01-01, in 400-year eras starting March 1st
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);

    if !(0..=9999).contains(&year) {
        return None;
    }
    Some(format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year,
        month,
        day,
        rem / 3_600,
        rem % 3_600 / 60,
        rem % 60
    ))
}

fn sorted_keys<'a>(keys: impl Iterator<Item = &'a Vec<u8>>) -> Vec<String> {
    let mut keys: Vec<&Vec<u8>> = keys.collect();
    keys.sort();
    keys.into_iter().map(|k| text(k)).collect()
}
