//! Bounded gzip compression for batch files

use std::io::{self, Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// Gzip-compress `data`
pub fn compress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Gzip-decompress `data`, refusing to produce more than `max_decompressed_size` bytes
pub fn decompress(data: &[u8], max_decompressed_size: usize) -> io::Result<Vec<u8>> {
    let decoder = GzDecoder::new(data);
    let mut output = Vec::new();
    decoder
        .take(max_decompressed_size as u64 + 1)
        .read_to_end(&mut output)?;

    if output.len() > max_decompressed_size {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "decompressed size exceeds maximum of {} bytes",
                max_decompressed_size
            ),
        ));
    }

    Ok(output)
}
