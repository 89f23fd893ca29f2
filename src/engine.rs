// src/engine.rs
use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use log::{error, info};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::bencode::{bvalue_to_json, decode_with_max_depth, encode_json};
use crate::config::Config;
use crate::file_io::{read_torrent_file, write_output_file};
use crate::torrent::{text, FileLayout, Torrent, TorrentSummary};

#[derive(Debug, Parser)]
#[command(name = "torinfo", version, about = "Inspect and canonicalise bencoded torrent metadata")]
pub struct Cli {
    /// Config file (defaults to ./torinfo.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a bencoded string as JSON
    Decode { bencoded: String },
    /// Bencode a JSON value
    Encode { json: String },
    /// Print the info hash, tracker, sizes and a sample of piece digests of a torrent
    Info { file: PathBuf },
    /// Print a JSON summary of each torrent
    Show {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Check that each torrent re-encodes to exactly its original bytes
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Write the canonical encoding of a torrent
    Rewrite {
        file: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Runs one command, writing its report to `out`.
pub fn use_command(command: &Command, config: &Config, out: &mut dyn Write) -> anyhow::Result<()> {
    match command {
        Command::Decode { bencoded } => {
            let value = decode_with_max_depth(bencoded.as_bytes(), config.max_depth)?;
            writeln!(out, "{}", serde_json::to_string(&bvalue_to_json(&value))?)?;
        }
        Command::Encode { json } => {
            let value: serde_json::Value = serde_json::from_str(json).context("parsing JSON input")?;
            writeln!(out, "{}", encode_json(&value)?.escape_ascii())?;
        }
        Command::Info { file } => {
            let (_, torrent) = load_torrent(file, config)?;
            print_info(&torrent, config.pieces_sample, out)?;
        }
        Command::Show { files } => {
            for_each_file(files, out, |file, out| {
                let (_, torrent) = load_torrent(file, config)?;
                let summary = TorrentSummary::new(&torrent, config.pieces_sample);
                writeln!(out, "{}", summary.to_json_pretty()?)?;
                Ok(())
            })?;
        }
        Command::Check { files } => {
            for_each_file(files, out, |file, out| {
                let (original, torrent) = load_torrent(file, config)?;
                if torrent.to_bytes() == original {
                    writeln!(out, "ok")?;
                    Ok(())
                } else {
                    Err(anyhow!("re-encoding differs from the original bytes (not canonical)"))
                }
            })?;
        }
        Command::Rewrite { file, output } => {
            let (original, torrent) = load_torrent(file, config)?;
            let encoded = torrent.to_bytes();
            if encoded != original {
                info!("{} was not canonical, rewriting", file.display());
            }
            write_output_file(output, &encoded)?;
            writeln!(out, "wrote {} bytes to {}", encoded.len(), output.display())?;
        }
    }
    Ok(())
}

/// Reads, decodes and maps one torrent file, returning the raw bytes too.
pub fn load_torrent(path: &Path, config: &Config) -> anyhow::Result<(Vec<u8>, Torrent)> {
    let buf = read_torrent_file(path, config.max_file_size)?;
    let value = decode_with_max_depth(&buf, config.max_depth)
        .with_context(|| format!("decoding {}", path.display()))?;
    let torrent = Torrent::try_from(value).with_context(|| format!("mapping {}", path.display()))?;
    Ok((buf, torrent))
}

/// Runs `action` for every file. One bad file does not stop the rest; the
/// combined result fails if any of them failed.
fn for_each_file<F>(files: &[PathBuf], out: &mut dyn Write, mut action: F) -> anyhow::Result<()>
where
    F: FnMut(&Path, &mut dyn Write) -> anyhow::Result<()>,
{
    let mut failed = 0;
    for file in files {
        writeln!(out, ">>> {}", file.display())?;
        if let Err(err) = action(file.as_path(), &mut *out) {
            error!("{}: {:#}", file.display(), err);
            writeln!(out, "error: {:#}", err)?;
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(anyhow!("{} of {} files failed", failed, files.len()));
    }
    Ok(())
}

fn print_info(torrent: &Torrent, sample: usize, out: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(out, "Info Hash: {}", torrent.info_hash_hex())?;
    writeln!(out, "Tracker URL: {}", text(&torrent.announce))?;
    writeln!(out, "Name: {}", text(&torrent.info.name))?;
    match &torrent.info.layout {
        FileLayout::Single { length } => writeln!(out, "Length: {}", length)?,
        FileLayout::Multi { files } => {
            writeln!(out, "Files: {}", files.len())?;
            for f in files {
                let path: Vec<String> = f.path.iter().map(|s| text(s)).collect();
                writeln!(out, "  {} ({} bytes)", path.join("/"), f.length)?;
            }
            writeln!(out, "Total Length: {}", torrent.info.total_length())?;
        }
    }
    writeln!(out, "Piece Length: {}", torrent.info.piece_length)?;
    writeln!(out, "Pieces: {}", torrent.info.pieces.describe(sample))?;
    Ok(())
}
