// src/file_io.rs
use anyhow::{bail, Context};
use log::debug;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

/// Reads a whole .torrent file, refusing anything larger than `max_size` bytes.
///
/// The size is checked from the file metadata before reading, and the read
/// itself is capped, so a file that grows in between cannot slip through.
pub fn read_torrent_file<P: AsRef<Path>>(path: P, max_size: u64) -> anyhow::Result<Vec<u8>> {
	let path = path.as_ref();
	let file = File::open(path)
		.with_context(|| format!("I/O error while opening {}", path.display()))?;

	let size = file
		.metadata()
		.with_context(|| format!("I/O error while reading metadata of {}", path.display()))?
		.len();
	if size > max_size {
		bail!("{} is {} bytes, over the {} byte limit", path.display(), size, max_size);
	}

	let mut buf = Vec::with_capacity(size as usize);
	file.take(max_size.saturating_add(1))
		.read_to_end(&mut buf)
		.with_context(|| format!("I/O error while reading {}", path.display()))?;
	if buf.len() as u64 > max_size {
		bail!("{} grew past the {} byte limit while reading", path.display(), max_size);
	}

	debug!("read {} bytes from {}", buf.len(), path.display());
	Ok(buf)
}

/// Writes `data` to `output_path`, replacing any existing file.
pub fn write_output_file<P: AsRef<Path>>(output_path: P, data: &[u8]) -> anyhow::Result<()> {
	let path = output_path.as_ref();
	let mut file = fs::OpenOptions::new()
		.create(true)
		.write(true)
		.truncate(true)
		.open(path)
		.with_context(|| format!("I/O error while opening {}", path.display()))?;

	file.write_all(data)
		.and_then(|_| file.flush())
		.with_context(|| format!("I/O error while writing {}", path.display()))?;

	debug!("wrote {} bytes to {}", data.len(), path.display());
	Ok(())
}
