//! # Commitment Codec
//!
//! The canonical byte encoding of a booking authorization payload. Both
//! parties independently encode `(destination, hashlock flag, content
//! digest)` and sign the resulting bytes, so the encoding must be exactly
//! reproducible everywhere: one layout, no optional fields, no
//! platform-dependent widths.
//!
//! ## Wire layout
//!
//! Each field is prefixed with a one-byte type tag, in the style of ABI
//! tuple encodings (`address`, `bool`, `uint256`):
//!
//! | offset | len | field                               |
//! |--------|-----|-------------------------------------|
//! | 0      | 1   | tag: address (0x01)                 |
//! | 1      | 32  | destination key hash                |
//! | 33     | 1   | tag: bool (0x02)                    |
//! | 34     | 1   | flag (0x00 or 0x01)                 |
//! | 35     | 1   | tag: uint (0x03)                    |
//! | 36     | 32  | content digest (256-bit big-endian) |
//!
//! 68 bytes total, always. Decoding is the exact inverse and rejects
//! anything that isn't a byte-perfect encoding: wrong tags, non-canonical
//! bools, truncation, trailing garbage.

use crate::crypto::hash::Digest;
use crate::identity::PartyId;
use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Type tag for an address field (32-byte key hash).
pub const TAG_ADDRESS: u8 = 0x01;

/// Type tag for a boolean field (one canonical byte).
pub const TAG_BOOL: u8 = 0x02;

/// Type tag for an unsigned 256-bit integer field (the content digest).
pub const TAG_UINT: u8 = 0x03;

/// Total length of an encoded payload. Constant by construction.
pub const ENCODED_LEN: usize = 68;

/// Errors produced when decoding a commitment payload.
///
/// Every variant names the exact defect. Malformed payloads are common in
/// the wild (truncated wire reads, callers signing the wrong bytes), and
/// "decode failed" is not a useful bug report.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The input ended before the layout was satisfied.
    #[error("unexpected end of input: expected {expected} bytes, got {got}")]
    UnexpectedEnd {
        /// Bytes the full layout requires.
        expected: usize,
        /// Bytes actually provided.
        got: usize,
    },

    /// A type tag did not match the canonical layout.
    #[error("wrong type tag at offset {offset}: expected {expected:#04x}, found {found:#04x}")]
    WrongTag {
        /// Byte offset of the tag within the payload.
        offset: usize,
        /// The tag the layout requires at this offset.
        expected: u8,
        /// The tag actually present.
        found: u8,
    },

    /// The boolean byte was neither 0x00 nor 0x01.
    ///
    /// Anything else would make the encoding non-canonical: two different
    /// byte strings for the same logical payload, and therefore two valid
    /// signatures where there must be exactly one.
    #[error("invalid boolean byte: {0:#04x}")]
    InvalidBoolByte(u8),

    /// Extra bytes followed a structurally complete payload.
    #[error("{extra} trailing bytes after a complete payload")]
    TrailingBytes {
        /// Number of unconsumed bytes.
        extra: usize,
    },
}

/// Encode `(destination, flag, content)` into the canonical payload bytes.
///
/// Deterministic: the same inputs always produce the same 68 bytes,
/// regardless of how the `PartyId` was constructed (only its key hash
/// enters the encoding).
///
/// # Example
///
/// ```
/// use dpace_protocol::codec;
/// use dpace_protocol::crypto::{sha256, DpaceKeypair};
/// use dpace_protocol::identity::PartyId;
///
/// let kp = DpaceKeypair::generate();
/// let destination = PartyId::from_public_key(&kp.public_key());
/// let content = sha256(b"secret");
///
/// let payload = codec::encode(&destination, true, &content);
/// assert_eq!(payload.len(), codec::ENCODED_LEN);
/// ```
pub fn encode(destination: &PartyId, flag: bool, content: &Digest) -> Bytes {
    let mut buf = BytesMut::with_capacity(ENCODED_LEN);
    buf.put_u8(TAG_ADDRESS);
    buf.put_slice(destination.key_hash());
    buf.put_u8(TAG_BOOL);
    buf.put_u8(u8::from(flag));
    buf.put_u8(TAG_UINT);
    buf.put_slice(content.as_bytes());
    buf.freeze()
}

/// Decode a canonical payload back into `(destination, flag, content)`.
///
/// Exact inverse of [`encode`]: accepts only byte strings that `encode`
/// could have produced. The recovered `PartyId` carries the key hash only —
/// no public key is recoverable from the wire form.
pub fn decode(bytes: &[u8]) -> Result<(PartyId, bool, Digest), CodecError> {
    if bytes.len() < ENCODED_LEN {
        return Err(CodecError::UnexpectedEnd {
            expected: ENCODED_LEN,
            got: bytes.len(),
        });
    }
    if bytes.len() > ENCODED_LEN {
        return Err(CodecError::TrailingBytes {
            extra: bytes.len() - ENCODED_LEN,
        });
    }

    if bytes[0] != TAG_ADDRESS {
        return Err(CodecError::WrongTag {
            offset: 0,
            expected: TAG_ADDRESS,
            found: bytes[0],
        });
    }
    let mut key_hash = [0u8; 32];
    key_hash.copy_from_slice(&bytes[1..33]);

    if bytes[33] != TAG_BOOL {
        return Err(CodecError::WrongTag {
            offset: 33,
            expected: TAG_BOOL,
            found: bytes[33],
        });
    }
    let flag = match bytes[34] {
        0x00 => false,
        0x01 => true,
        other => return Err(CodecError::InvalidBoolByte(other)),
    };

    if bytes[35] != TAG_UINT {
        return Err(CodecError::WrongTag {
            offset: 35,
            expected: TAG_UINT,
            found: bytes[35],
        });
    }
    let mut content = [0u8; 32];
    content.copy_from_slice(&bytes[36..68]);

    Ok((
        PartyId::from_key_hash(key_hash),
        flag,
        Digest::from_bytes(content),
    ))
}
