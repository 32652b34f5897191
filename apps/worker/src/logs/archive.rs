//! Archive codec: gzip, then standard base64 so archives are plain text.

use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid gzip stream: {0}")]
    Gzip(#[from] std::io::Error),
}

pub fn encode(raw: &[u8]) -> std::io::Result<String> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(raw)?;
    let compressed = encoder.finish()?;
    Ok(STANDARD.encode(compressed))
}

pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    let compressed = STANDARD.decode(text.trim())?;
    let mut raw = Vec::new();
    GzDecoder::new(compressed.as_slice()).read_to_end(&mut raw)?;
    Ok(raw)
}
