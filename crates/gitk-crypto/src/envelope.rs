//! Envelope framing: `"<kind> <len>\0"` followed by the content bytes.

use gitk_types::ObjectKind;

use crate::hasher::object_header;

/// Longest header we accept: `"commit "` plus a 20-digit length plus NUL.
const MAX_HEADER_LEN: usize = 32;

/// Errors from decoding an envelope.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("truncated header: no NUL delimiter in first {0} bytes")]
    TruncatedHeader(usize),

    #[error("malformed header: {0}")]
    MalformedHeader(String),

    #[error("unknown object kind: {0:?}")]
    UnknownKind(String),

    #[error("length mismatch: header says {declared}, content has {actual}")]
    LengthMismatch { declared: usize, actual: usize },
}

/// Frame `content` with its header.
pub fn encode_envelope(kind: ObjectKind, content: &[u8]) -> Vec<u8> {
    let mut out = object_header(kind, content.len());
    out.reserve(content.len());
    out.extend_from_slice(content);
    out
}

/// Split an envelope into its kind and content.
pub fn decode_envelope(bytes: &[u8]) -> Result<(ObjectKind, &[u8]), EnvelopeError> {
    let window = &bytes[..bytes.len().min(MAX_HEADER_LEN)];
    let nul = window
        .iter()
        .position(|b| *b == 0)
        .ok_or(EnvelopeError::TruncatedHeader(window.len()))?;

    let header = std::str::from_utf8(&bytes[..nul])
        .map_err(|_| EnvelopeError::MalformedHeader("header is not UTF-8".into()))?;
    let (tag, len) = header
        .split_once(' ')
        .ok_or_else(|| EnvelopeError::MalformedHeader(format!("missing space in {header:?}")))?;

    let kind = tag
        .parse::<ObjectKind>()
        .map_err(|_| EnvelopeError::UnknownKind(tag.to_string()))?;

    if len.is_empty() || !len.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EnvelopeError::MalformedHeader(format!(
            "invalid length {len:?}"
        )));
    }
    let declared: usize = len
        .parse()
        .map_err(|_| EnvelopeError::MalformedHeader(format!("length overflow {len:?}")))?;

    let content = &bytes[nul + 1..];
    if content.len() != declared {
        return Err(EnvelopeError::LengthMismatch {
            declared,
            actual: content.len(),
        });
    }
    Ok((kind, content))
}
