// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Vizstack Project Contributors

//! SSM wire framing (§4.3/§6.2): a fixed 5-byte ASCII decimal length
//! field, right-padded with spaces, followed by exactly that many bytes
//! of UTF-8 XML.
//!
//! Shape mirrors the teacher's `wire.rs` (there: 4-byte big-endian length
//! + JSON); the framing primitive is isolated behind this module per
//! design note §9 so the round-trip law in spec §8 is its whole test
//! suite.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use dv_core::MAX_FRAME_PAYLOAD;

const LENGTH_FIELD_WIDTH: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("message of {0} bytes exceeds the 99999 byte frame limit")]
    PayloadTooLarge(usize),

    #[error("malformed length field: {0:?}")]
    MalformedLength(Vec<u8>),

    #[error("connection closed before a full frame was read")]
    ShortRead,

    #[error("xml encode error: {0}")]
    Encode(String),

    #[error("xml decode error: {0}")]
    Decode(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write one framed message: 5-byte space-padded ASCII decimal length,
/// then the payload verbatim.
pub async fn write_message<W>(writer: &mut W, payload: &[u8]) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > MAX_FRAME_PAYLOAD {
        return Err(ProtocolError::PayloadTooLarge(payload.len()));
    }
    let header = format!("{:<width$}", payload.len(), width = LENGTH_FIELD_WIDTH);
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one framed message. Fails closed on a short read or a length
/// field that does not parse as a space-padded decimal integer.
pub async fn read_message<R>(reader: &mut R) -> Result<Vec<u8>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; LENGTH_FIELD_WIDTH];
    reader
        .read_exact(&mut header)
        .await
        .map_err(|_| ProtocolError::ShortRead)?;
    let len = parse_length(&header)?;
    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|_| ProtocolError::ShortRead)?;
    Ok(payload)
}

/// Parse the length field: trailing spaces are ignored, a field of all
/// spaces is length 0.
fn parse_length(header: &[u8; LENGTH_FIELD_WIDTH]) -> Result<usize, ProtocolError> {
    let text = std::str::from_utf8(header).map_err(|_| ProtocolError::MalformedLength(header.to_vec()))?;
    let trimmed = text.trim_end_matches(' ');
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<usize>()
        .map_err(|_| ProtocolError::MalformedLength(header.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn round_trips_arbitrary_short_message() {
        let original = b"<response><status>0</status></response>";
        let mut buffer = Vec::new();
        write_message(&mut buffer, original).await.expect("write");
        assert_eq!(buffer.len(), LENGTH_FIELD_WIDTH + original.len());

        let mut cursor = std::io::Cursor::new(buffer);
        let read_back = read_message(&mut cursor).await.expect("read");
        assert_eq!(read_back, original);
    }

    #[tokio::test]
    async fn rejects_payload_over_limit() {
        let oversized = vec![b'x'; MAX_FRAME_PAYLOAD + 1];
        let mut buffer = Vec::new();
        let err = write_message(&mut buffer, &oversized).await.unwrap_err();
        assert!(matches!(err, ProtocolError::PayloadTooLarge(_)));
        assert!(buffer.is_empty(), "no framing bytes written on rejection");
    }

    #[tokio::test]
    async fn all_space_length_field_is_zero() {
        let mut cursor = std::io::Cursor::new(b"     ".to_vec());
        let read_back = read_message(&mut cursor).await.expect("read");
        assert!(read_back.is_empty());
    }

    #[tokio::test]
    async fn short_read_fails_closed() {
        let mut cursor = std::io::Cursor::new(b"00010ab".to_vec());
        let err = read_message(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProtocolError::ShortRead));
    }

    #[tokio::test]
    async fn malformed_length_field_is_rejected() {
        let mut cursor = std::io::Cursor::new(b"abcde".to_vec());
        let err = read_message(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedLength(_)));
    }

    proptest! {
        #[test]
        fn round_trip_law_holds_for_any_valid_payload(len in 0usize..2000) {
            let payload = vec![b'a'; len];
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let mut buffer = Vec::new();
                write_message(&mut buffer, &payload).await.unwrap();
                let mut cursor = std::io::Cursor::new(buffer);
                let read_back = read_message(&mut cursor).await.unwrap();
                prop_assert_eq!(read_back, payload);
                Ok(())
            })?;
        }
    }
}
