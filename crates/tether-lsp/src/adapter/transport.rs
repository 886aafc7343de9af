//! LSP header framing over byte streams.
//!
//! LSP uses a simple framing protocol over stdio:
//! ```text
//! Content-Length: <length>\r\n
//! \r\n
//! <payload>
//! ```
//!
//! The header is consumed byte by byte so no byte belonging to the body is
//! ever swallowed by header parsing, and the body is accumulated across as
//! many partial reads as the pipe delivers.

use std::io::{ErrorKind, Read, Write};

use super::error::TransportError;

/// Log target for transport operations.
pub(crate) const TRANSPORT_TARGET: &str = "tether_lsp::transport";

/// Longest header block accepted before the stream is considered corrupt.
const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Largest body accepted from a server.
pub const MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const CONTENT_LENGTH: &str = "Content-Length:";

/// Encodes one body into a complete frame.
#[must_use]
pub fn encode_frame(body: &[u8]) -> Vec<u8> {
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    let mut frame = Vec::with_capacity(header.len() + body.len());
    frame.extend_from_slice(header.as_bytes());
    frame.extend_from_slice(body);
    frame
}

/// Writes one LSP-framed message and flushes the writer.
///
/// # Errors
///
/// Returns `TransportError::Io` if writing fails.
pub fn write_frame<W: Write>(writer: &mut W, body: &[u8]) -> Result<(), TransportError> {
    writer.write_all(&encode_frame(body))?;
    writer.flush()?;
    Ok(())
}

/// Reads one LSP-framed message, blocking until it is complete.
///
/// # Errors
///
/// Returns `TransportError::Closed` when the stream ends before a whole
/// frame arrived, `TransportError::MissingContentLength` or
/// `TransportError::InvalidHeader` for a malformed header block, and
/// `TransportError::FrameTooLarge` when the declared length is implausible.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>, TransportError> {
    let header = read_header_block(reader)?;
    let length = parse_content_length(&header)?;
    if length > MAX_FRAME_BYTES {
        return Err(TransportError::FrameTooLarge {
            length,
            limit: MAX_FRAME_BYTES,
        });
    }

    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).map_err(|error| match error.kind() {
        ErrorKind::UnexpectedEof => TransportError::Closed,
        _ => TransportError::Io(error),
    })?;
    Ok(body)
}

fn read_header_block<R: Read>(reader: &mut R) -> Result<Vec<u8>, TransportError> {
    let mut header = Vec::with_capacity(128);
    let mut byte = [0u8; 1];
    while !header.ends_with(HEADER_TERMINATOR) {
        if header.len() >= MAX_HEADER_BYTES {
            return Err(TransportError::InvalidHeader);
        }
        match reader.read(&mut byte) {
            Ok(0) => return Err(TransportError::Closed),
            Ok(_) => header.push(byte[0]),
            Err(error) if error.kind() == ErrorKind::Interrupted => {}
            Err(error) => return Err(TransportError::Io(error)),
        }
    }
    Ok(header)
}

fn parse_content_length(header: &[u8]) -> Result<usize, TransportError> {
    let text = std::str::from_utf8(header).map_err(|_| TransportError::InvalidHeader)?;
    let value = text
        .split("\r\n")
        .find_map(|line| line.strip_prefix(CONTENT_LENGTH))
        .ok_or(TransportError::MissingContentLength)?;
    value
        .trim()
        .parse()
        .map_err(|_| TransportError::InvalidHeader)
}
