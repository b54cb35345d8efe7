//! Log record framing for the file engine.
//!
//! Every commit, whether a single put or a whole batch, is written as one
//! record:
//!
//! ```text
//! magic "KVLG" (4) | version (2) | entry_count (4) | payload_len (4) | payload | crc32 (4)
//! ```
//!
//! The payload is `entry_count` entries of `key_len (4) | key | value_len (4) | value`.
//! All integers are little-endian. The CRC covers header and payload.

use crate::error::{StorageError, StorageResult};

/// Magic bytes identifying a log record.
pub const LOG_MAGIC: [u8; 4] = *b"KVLG";

/// Current log format version.
pub const LOG_VERSION: u16 = 1;

/// magic (4) + version (2) + entry_count (4) + payload_len (4) = 14 bytes
pub const HEADER_SIZE: usize = 14;

/// CRC size.
pub const CRC_SIZE: usize = 4;

/// A decoded log record.
#[derive(Debug, PartialEq, Eq)]
pub struct LogRecord {
    /// Entries in commit order.
    pub entries: Vec<(Vec<u8>, Vec<u8>)>,
    /// Encoded size of the record in bytes.
    pub encoded_len: usize,
}

/// Encodes a commit of `entries` as one framed record.
///
/// # Errors
///
/// Returns [`StorageError::TooLarge`] if a key, value or the payload exceeds
/// `u32::MAX` bytes, or the commit holds more than `u32::MAX` entries.
pub fn encode_record<'a, I>(entries: I) -> StorageResult<Vec<u8>>
where
    I: IntoIterator<Item = (&'a [u8], &'a [u8])>,
{
    let mut payload = Vec::new();
    let mut count: u32 = 0;
    for (key, value) in entries {
        payload.extend_from_slice(&len_u32("key", key.len())?.to_le_bytes());
        payload.extend_from_slice(key);
        payload.extend_from_slice(&len_u32("value", value.len())?.to_le_bytes());
        payload.extend_from_slice(value);
        count = count.checked_add(1).ok_or(StorageError::TooLarge {
            what: "entry count",
            len: count as usize,
        })?;
    }

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len() + CRC_SIZE);
    buf.extend_from_slice(&LOG_MAGIC);
    buf.extend_from_slice(&LOG_VERSION.to_le_bytes());
    buf.extend_from_slice(&count.to_le_bytes());
    buf.extend_from_slice(&len_u32("payload", payload.len())?.to_le_bytes());
    buf.extend_from_slice(&payload);
    let crc = compute_crc32(&buf);
    buf.extend_from_slice(&crc.to_le_bytes());
    Ok(buf)
}

/// Decodes the record at the start of `buf`.
///
/// Returns `Ok(None)` if `buf` ends before the record does; the caller
/// treats that as a torn tail.
///
/// # Errors
///
/// Returns [`StorageError::Corrupted`] on a bad magic, unknown version,
/// CRC mismatch or malformed payload.
pub fn decode_record(buf: &[u8]) -> StorageResult<Option<LogRecord>> {
    if buf.len() < HEADER_SIZE {
        return Ok(None);
    }
    if buf[0..4] != LOG_MAGIC {
        return Err(StorageError::Corrupted("invalid record magic".into()));
    }
    let version = u16::from_le_bytes([buf[4], buf[5]]);
    if version != LOG_VERSION {
        return Err(StorageError::Corrupted(format!(
            "unsupported log version {version}"
        )));
    }
    let count = read_u32(buf, 6)? as usize;
    let payload_len = read_u32(buf, 10)? as usize;

    let end = HEADER_SIZE + payload_len;
    if buf.len() < end + CRC_SIZE {
        return Ok(None);
    }
    let expected = read_u32(buf, end)?;
    let actual = compute_crc32(&buf[..end]);
    if expected != actual {
        return Err(StorageError::Corrupted(format!(
            "checksum mismatch: expected {expected:08x}, got {actual:08x}"
        )));
    }

    let payload = &buf[HEADER_SIZE..end];
    let mut cursor = 0;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let key = read_chunk(payload, &mut cursor)?;
        let value = read_chunk(payload, &mut cursor)?;
        entries.push((key, value));
    }
    if cursor != payload.len() {
        return Err(StorageError::Corrupted(format!(
            "trailing bytes in record: expected {} bytes, got {}",
            cursor,
            payload.len()
        )));
    }

    Ok(Some(LogRecord {
        entries,
        encoded_len: end + CRC_SIZE,
    }))
}

fn len_u32(what: &'static str, len: usize) -> StorageResult<u32> {
    u32::try_from(len).map_err(|_| StorageError::TooLarge { what, len })
}

fn read_u32(buf: &[u8], at: usize) -> StorageResult<u32> {
    let bytes: [u8; 4] = buf
        .get(at..at + 4)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| StorageError::Corrupted("unexpected end of record".into()))?;
    Ok(u32::from_le_bytes(bytes))
}

fn read_chunk(payload: &[u8], cursor: &mut usize) -> StorageResult<Vec<u8>> {
    let len = read_u32(payload, *cursor)? as usize;
    *cursor += 4;
    let chunk = payload
        .get(*cursor..*cursor + len)
        .ok_or_else(|| StorageError::Corrupted("unexpected end of entry".into()))?;
    *cursor += len;
    Ok(chunk.to_vec())
}

/// Computes CRC32 checksum for data.
pub fn compute_crc32(data: &[u8]) -> u32 {
    // IEEE polynomial
    const CRC32_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    !crc
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> Vec<u8> {
        encode_record([(&b"key"[..], &b"value"[..]), (&b"k2"[..], &b""[..])]).unwrap()
    }

    #[test]
    fn crc32_known_value() {
        assert_eq!(compute_crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn decode_encoded_record() {
        let buf = sample();
        let record = decode_record(&buf).unwrap().unwrap();
        assert_eq!(record.encoded_len, buf.len());
        assert_eq!(
            record.entries,
            vec![
                (b"key".to_vec(), b"value".to_vec()),
                (b"k2".to_vec(), Vec::new())
            ]
        );
    }

    #[test]
    fn truncated_record_is_none() {
        let buf = sample();
        for cut in [0, 5, HEADER_SIZE, buf.len() - 1] {
            assert!(decode_record(&buf[..cut]).unwrap().is_none(), "cut {cut}");
        }
    }

    #[test]
    fn flipped_byte_is_corruption() {
        let mut buf = sample();
        buf[HEADER_SIZE + 5] ^= 0x01;
        assert!(matches!(
            decode_record(&buf),
            Err(StorageError::Corrupted(_))
        ));
    }

    #[test]
    fn bad_magic_is_corruption() {
        let mut buf = sample();
        buf[0] = b'X';
        assert!(decode_record(&buf).is_err());
    }

    #[test]
    fn empty_commit_round_trips() {
        let buf = encode_record(std::iter::empty()).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE + CRC_SIZE);
        let record = decode_record(&buf).unwrap().unwrap();
        assert!(record.entries.is_empty());
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn oversize_length_is_too_large() {
        let len = u32::MAX as usize + 1;
        assert!(matches!(
            len_u32("value", len),
            Err(StorageError::TooLarge { what: "value", len: l }) if l == len
        ));
        assert_eq!(len_u32("key", u32::MAX as usize).unwrap(), u32::MAX);
    }

    proptest! {
        #[test]
        fn decode_recovers_encoded_entries(
            entries in prop::collection::vec(
                (
                    prop::collection::vec(any::<u8>(), 0..32),
                    prop::collection::vec(any::<u8>(), 0..64),
                ),
                0..8,
            )
        ) {
            let buf = encode_record(entries.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))).unwrap();
            let record = decode_record(&buf).unwrap().unwrap();
            prop_assert_eq!(record.encoded_len, buf.len());
            prop_assert_eq!(record.entries, entries);
        }
    }
}
