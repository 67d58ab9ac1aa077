//! Serialization codec with transparent compression
//!
//! Stored values are either plain JSON or `gzip:<base64(gzip(json))>`. The
//! prefix convention is the on-the-wire contract shared with existing
//! deployments and must not change.
//!
//! The encode path is forgiving: a compression failure falls back to the
//! uncompressed JSON so a write is never lost to the compressor. The decode
//! path is strict: a corrupted compressed entry cannot be recovered, so the
//! error propagates to the caller.

use crate::constants::{COMPRESSION_PREFIX, COMPRESSION_THRESHOLD_BYTES};
use crate::error::Result;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{Read, Write};

/// Encode a value for storage
///
/// JSON-encodes, then gzip-compresses payloads over 1KB when compression is
/// enabled. Never fails due to the compressor.
pub fn serialize<T: Serialize>(value: &T, compression_enabled: bool) -> Result<String> {
    let json = serde_json::to_string(value)?;

    if compression_enabled && json.len() > COMPRESSION_THRESHOLD_BYTES {
        match compress(&json) {
            Ok(compressed) => return Ok(compressed),
            Err(e) => {
                tracing::warn!("compression failed, storing uncompressed: {e}");
            }
        }
    }

    Ok(json)
}

/// Decode a stored value
///
/// Detects the `gzip:` marker and reverses base64 + gzip before parsing.
/// Decompression failures propagate as errors.
pub fn deserialize<T: DeserializeOwned>(stored: &str) -> Result<T> {
    if let Some(encoded) = stored.strip_prefix(COMPRESSION_PREFIX) {
        let compressed = BASE64.decode(encoded)?;
        let mut decoder = GzDecoder::new(compressed.as_slice());
        let mut json = String::new();
        decoder.read_to_string(&mut json)?;
        Ok(serde_json::from_str(&json)?)
    } else {
        Ok(serde_json::from_str(stored)?)
    }
}

fn compress(json: &str) -> Result<String> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(json.as_bytes())?;
    let compressed = encoder.finish()?;
    Ok(format!("{COMPRESSION_PREFIX}{}", BASE64.encode(compressed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Record {
        id: u32,
        name: String,
    }

    #[test]
    fn test_round_trip_small_uncompressed() {
        let value = Record {
            id: 7,
            name: "gutter estimate".to_string(),
        };
        let stored = serialize(&value, true).unwrap();
        assert!(!stored.starts_with(COMPRESSION_PREFIX));
        let back: Record = deserialize(&stored).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_round_trip_large_compressed() {
        let value = Record {
            id: 1,
            name: "x".repeat(4096),
        };
        let stored = serialize(&value, true).unwrap();
        assert!(stored.starts_with(COMPRESSION_PREFIX));
        let back: Record = deserialize(&stored).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_compression_disabled_stays_json() {
        let value = vec!["entry".to_string(); 500];
        let stored = serialize(&value, false).unwrap();
        assert!(!stored.starts_with(COMPRESSION_PREFIX));
        let back: Vec<String> = deserialize(&stored).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_corrupted_base64_is_error() {
        let result: Result<Record> = deserialize("gzip:!!!not-base64!!!");
        assert!(result.is_err());
    }

    #[test]
    fn test_corrupted_gzip_is_error() {
        // Valid base64, but the bytes are not a gzip stream
        let stored = format!("gzip:{}", BASE64.encode(b"plain bytes"));
        let result: Result<Record> = deserialize(&stored);
        assert!(result.is_err());
    }

    #[test]
    fn test_plain_json_parses_directly() {
        let back: Record = deserialize(r#"{"id":3,"name":"roof"}"#).unwrap();
        assert_eq!(back.id, 3);
        assert_eq!(back.name, "roof");
    }
}
