// File-level helpers for loading tiles.
//
// `read_tile_file()` reads a tile from disk and, when the `gzip` feature is
// enabled, inflates gzip/zlib payloads (the form tiles take inside MBTiles
// archives and most HTTP responses). `decode_file()` goes on to build a
// `Tile` from the result.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use log::{debug, info};
use thiserror::Error;

use crate::error::DecodeError;
use crate::mvt::Tile;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

/// Upper bound on an inflated tile; guards against decompression bombs.
pub const MAX_INFLATED_SIZE: u64 = 256 * 1024 * 1024; // 256 MiB

// ---------------------------------------------------------------------------
// Compression detection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zlib,
}

impl Compression {
    /// Sniff the container format from the first bytes of `data`.
    pub fn detect(data: &[u8]) -> Self {
        match data {
            [0x1F, 0x8B, ..] => Compression::Gzip,
            // CMF 0x78 (deflate, 32K window) with a valid FCHECK.
            [0x78, flg, ..] if (0x7800u16 | u16::from(*flg)) % 31 == 0 => Compression::Zlib,
            _ => Compression::None,
        }
    }
}

// ---------------------------------------------------------------------------
// Stats / errors
// ---------------------------------------------------------------------------

/// Statistics returned by `read_tile_file()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadStats {
    /// Size of the file on disk.
    pub file_size: u64,
    /// Size of the protobuf payload after inflation.
    pub tile_size: u64,
    pub compression: Compression,
}

/// Error type for file operations.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("input is {0:?}-compressed, but gzip support is not enabled")]
    CompressionUnsupported(Compression),
    #[error("inflated tile exceeds {MAX_INFLATED_SIZE} bytes")]
    TooLarge,
}

// ---------------------------------------------------------------------------
// Inflation
// ---------------------------------------------------------------------------

/// Inflate `data` if it is gzip/zlib compressed; otherwise return it as is.
pub fn decompress(data: Vec<u8>) -> Result<(Vec<u8>, Compression), IoError> {
    let compression = Compression::detect(&data);
    match compression {
        Compression::None => Ok((data, compression)),
        #[cfg(feature = "gzip")]
        Compression::Gzip => Ok((inflate(flate2::read::GzDecoder::new(&data[..]))?, compression)),
        #[cfg(feature = "gzip")]
        Compression::Zlib => Ok((inflate(flate2::read::ZlibDecoder::new(&data[..]))?, compression)),
        #[cfg(not(feature = "gzip"))]
        other => Err(IoError::CompressionUnsupported(other)),
    }
}

#[cfg(feature = "gzip")]
fn inflate<R: Read>(decoder: R) -> Result<Vec<u8>, IoError> {
    let mut out = Vec::new();
    decoder.take(MAX_INFLATED_SIZE + 1).read_to_end(&mut out)?;
    if out.len() as u64 > MAX_INFLATED_SIZE {
        return Err(IoError::TooLarge);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// read_tile_file / decode_file
// ---------------------------------------------------------------------------

/// Read the tile at `path`, inflating it if needed.
pub fn read_tile_file<P: AsRef<Path>>(path: P) -> Result<(Vec<u8>, ReadStats), IoError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let file_size = file.metadata()?.len();

    let mut raw = Vec::with_capacity(file_size as usize);
    BufReader::with_capacity(BUF_SIZE, file).read_to_end(&mut raw)?;

    let (data, compression) = decompress(raw)?;
    let stats = ReadStats {
        file_size,
        tile_size: data.len() as u64,
        compression,
    };
    debug!("{}: {stats:?}", path.display());
    Ok((data, stats))
}

/// Read and decode the tile at `path`.
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<Tile, IoError> {
    let path = path.as_ref();
    let (data, stats) = read_tile_file(path)?;
    let tile = Tile::decode(data)?;
    info!(
        "{}: {} layers ({} bytes, {:?})",
        path.display(),
        tile.layer_count(),
        stats.tile_size,
        stats.compression
    );
    Ok(tile)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
