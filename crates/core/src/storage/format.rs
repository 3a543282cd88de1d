use crate::errors::CoreError;

/// Magic bytes identifying a CPTF (crypto portfolio) snapshot.
pub const MAGIC: &[u8; 4] = b"CPTF";

/// Current snapshot format version.
pub const CURRENT_VERSION: u16 = 1;

/// Header size in bytes: magic(4) + version(2) + payload_len(8) = 14
pub const HEADER_SIZE: usize = 14;

/// Wrap a serialized payload in a snapshot header.
///
/// Layout:
/// ```text
/// [CPTF: 4B] [version: 2B LE] [payload_len: 8B LE] [payload: variable]
/// ```
pub fn write_snapshot(version: u16, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&version.to_le_bytes());
    buf.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Parse a snapshot header. Returns the version and the payload slice.
pub fn read_snapshot(data: &[u8]) -> Result<(u16, &[u8]), CoreError> {
    if data.len() < HEADER_SIZE {
        return Err(CoreError::InvalidSnapshot(
            "Data too small to be a CPTF snapshot".into(),
        ));
    }

    if &data[0..4] != MAGIC {
        return Err(CoreError::InvalidSnapshot(
            "Invalid magic bytes, not a CPTF snapshot".into(),
        ));
    }

    let version = u16::from_le_bytes([data[4], data[5]]);
    if version == 0 || version > CURRENT_VERSION {
        return Err(CoreError::UnsupportedVersion(version));
    }

    let payload_len = u64::from_le_bytes(
        data[6..HEADER_SIZE]
            .try_into()
            .map_err(|_| CoreError::InvalidSnapshot("Failed to read payload length".into()))?,
    );

    let available = (data.len() - HEADER_SIZE) as u64;
    if payload_len > available {
        return Err(CoreError::InvalidSnapshot(format!(
            "Snapshot truncated: expected {payload_len} payload bytes, got {available}"
        )));
    }

    let end = HEADER_SIZE + payload_len as usize;
    Ok((version, &data[HEADER_SIZE..end]))
}
