use crate::config::MAX_FRAME_SIZE;
use crate::error::constants::{ERR_DECOMPRESSED_NOT_UTF8, ERR_DECOMPRESSION_LIMIT};
use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Compression algorithm applied to a whole terminated frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionKind {
    #[default]
    Lz4,
    Zstd,
}

impl CompressionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CompressionKind::Lz4 => "lz4",
            CompressionKind::Zstd => "zstd",
        }
    }
}

impl FromStr for CompressionKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "lz4" => Ok(CompressionKind::Lz4),
            "zstd" => Ok(CompressionKind::Zstd),
            _ => Err(ProtocolError::ConfigError(format!(
                "Unknown compression kind: '{s}'"
            ))),
        }
    }
}

/// Maximum output size for decompression (align with MAX_FRAME_SIZE to prevent DoS)
const MAX_DECOMPRESSION_SIZE: usize = MAX_FRAME_SIZE;

/// Zstd level used for outgoing frames. Frames are small; speed wins.
const ZSTD_LEVEL: i32 = 1;

/// Reversible text <-> bytes transform used by the frame codec.
///
/// The frame codec hands over the complete newline-terminated text and expects
/// the exact same text back from `decompress`.
pub trait Compressor: Send + Sync {
    fn compress(&self, text: &str) -> Result<Vec<u8>>;

    fn decompress(&self, data: &[u8]) -> Result<String>;
}

impl Compressor for CompressionKind {
    fn compress(&self, text: &str) -> Result<Vec<u8>> {
        compress(text.as_bytes(), self)
    }

    fn decompress(&self, data: &[u8]) -> Result<String> {
        let bytes = decompress(data, self)?;
        String::from_utf8(bytes)
            .map_err(|_| ProtocolError::DecompressionFailure(ERR_DECOMPRESSED_NOT_UTF8))
    }
}

/// Compresses data using the specified compression algorithm
///
/// # Errors
/// Returns `ProtocolError::CompressionFailure` if compression fails
pub fn compress(data: &[u8], kind: &CompressionKind) -> Result<Vec<u8>> {
    match kind {
        CompressionKind::Lz4 => Ok(lz4_flex::compress_prepend_size(data)),
        CompressionKind::Zstd => {
            let mut out = Vec::new();
            zstd::stream::copy_encode(data, &mut out, ZSTD_LEVEL)
                .map_err(|_| ProtocolError::CompressionFailure)?;
            Ok(out)
        }
    }
}

/// Decompresses data that was compressed with the specified algorithm
///
/// Output is capped at MAX_DECOMPRESSION_SIZE so a small hostile datagram
/// cannot expand into an arbitrarily large allocation.
///
/// # Errors
/// Returns `ProtocolError::DecompressionFailure` if:
/// - Decompression fails
/// - Output size exceeds MAX_DECOMPRESSION_SIZE
pub fn decompress(data: &[u8], kind: &CompressionKind) -> Result<Vec<u8>> {
    match *kind {
        CompressionKind::Lz4 => {
            // lz4_flex prepends the uncompressed size as a 4-byte little-endian integer.
            // Check it before lz4_flex allocates.
            if data.len() < 4 {
                return Err(ProtocolError::DecompressionFailure("truncated LZ4 header"));
            }

            let claimed_size = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
            if claimed_size > MAX_DECOMPRESSION_SIZE {
                return Err(ProtocolError::DecompressionFailure(ERR_DECOMPRESSION_LIMIT));
            }

            let decompressed = lz4_flex::decompress_size_prepended(data)
                .map_err(|_| ProtocolError::DecompressionFailure("malformed LZ4 payload"))?;

            if decompressed.len() > MAX_DECOMPRESSION_SIZE {
                return Err(ProtocolError::DecompressionFailure(ERR_DECOMPRESSION_LIMIT));
            }
            Ok(decompressed)
        }
        CompressionKind::Zstd => {
            use std::io::Read;

            let mut out = Vec::new();
            let mut reader = zstd::stream::Decoder::new(data)
                .map_err(|_| ProtocolError::DecompressionFailure("malformed Zstd payload"))?;

            // Read in chunks to enforce size limit
            let mut buffer = [0u8; 8192];
            loop {
                match reader.read(&mut buffer) {
                    Ok(0) => break,
                    Ok(n) => {
                        out.extend_from_slice(&buffer[..n]);
                        if out.len() > MAX_DECOMPRESSION_SIZE {
                            return Err(ProtocolError::DecompressionFailure(
                                ERR_DECOMPRESSION_LIMIT,
                            ));
                        }
                    }
                    Err(_) => {
                        return Err(ProtocolError::DecompressionFailure("malformed Zstd payload"))
                    }
                }
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_lz4_text_roundtrip() {
        let text = "{\"type\":\"ping\",\"seq\":1,\"data\":{},\"uid\":\"abc\"}\n";
        let compressed = CompressionKind::Lz4.compress(text).unwrap();
        let restored = CompressionKind::Lz4.decompress(&compressed).unwrap();
        assert_eq!(restored, text);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_zstd_text_roundtrip() {
        let text = "{\"type\":\"register\",\"seq\":0,\"data\":\"toy\"}\n";
        let compressed = CompressionKind::Zstd.compress(text).unwrap();
        let restored = CompressionKind::Zstd.decompress(&compressed).unwrap();
        assert_eq!(restored, text);
    }

    #[test]
    fn test_lz4_oom_attack_prevention() {
        // Claims to decompress to 3+ GB (0xbbbb602b bytes)
        let malicious_payload = vec![0x2b, 0x60, 0xbb, 0xbb];

        let result = decompress(&malicious_payload, &CompressionKind::Lz4);
        assert!(matches!(
            result,
            Err(ProtocolError::DecompressionFailure(ERR_DECOMPRESSION_LIMIT))
        ));
    }

    #[test]
    fn test_lz4_size_limit_enforcement() {
        let claimed_size = (MAX_DECOMPRESSION_SIZE + 1) as u32;
        let mut malicious = claimed_size.to_le_bytes().to_vec();
        malicious.extend_from_slice(&[0u8; 16]);

        let result = decompress(&malicious, &CompressionKind::Lz4);
        assert!(
            result.is_err(),
            "Should reject payload claiming size > MAX_DECOMPRESSION_SIZE"
        );
    }

    #[test]
    fn test_lz4_short_input_rejection() {
        let result = decompress(&[0x2b, 0x60], &CompressionKind::Lz4);
        assert!(result.is_err(), "Should reject input shorter than 4 bytes");
    }

    #[test]
    fn test_malformed_compressed_data() {
        let malformed = vec![0x10, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff];
        assert!(decompress(&malformed, &CompressionKind::Lz4).is_err());
        assert!(decompress(&malformed, &CompressionKind::Zstd).is_err());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_non_utf8_output_rejected() {
        let compressed = compress(&[0xff, 0xfe, 0xfd], &CompressionKind::Lz4).unwrap();
        let result = CompressionKind::Lz4.decompress(&compressed);
        assert!(matches!(
            result,
            Err(ProtocolError::DecompressionFailure(ERR_DECOMPRESSED_NOT_UTF8))
        ));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_kind_serde_names() {
        let kind: CompressionKind = serde_json::from_str("\"zstd\"").unwrap();
        assert_eq!(kind, CompressionKind::Zstd);
        assert_eq!(serde_json::to_string(&CompressionKind::Lz4).unwrap(), "\"lz4\"");
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_kind_from_str() {
        assert_eq!("ZSTD".parse::<CompressionKind>().unwrap(), CompressionKind::Zstd);
        assert_eq!(
            CompressionKind::Lz4.as_str().parse::<CompressionKind>().unwrap(),
            CompressionKind::Lz4
        );
        assert!(matches!(
            "gzip".parse::<CompressionKind>(),
            Err(ProtocolError::ConfigError(_))
        ));
    }
}
