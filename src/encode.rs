//! # Digests and base58check encoding
//!
//! The presentation layer of softsign: hashing payloads down to signable
//! digests, and rendering signatures as human-readable, checksummed,
//! prefix-tagged strings.
//!
//! ## Digest
//!
//! BLAKE3 in XOF mode, so any output length comes from the same function.
//! Operation signing wants exactly 32 bytes; other callers can ask for what
//! they need without a second hash primitive entering the crate.
//!
//! ## base58check
//!
//! The classic construction: `prefix-bytes ‖ payload ‖ checksum`, where the
//! checksum is the first four bytes of SHA-256(SHA-256(prefix ‖ payload)),
//! all base58-encoded. The prefix bytes are chosen so the resulting string
//! always starts with a fixed human-readable tag — `edsig` for detached
//! Ed25519 signatures. One flipped bit anywhere breaks the checksum, which
//! is the entire point: these strings get copy-pasted by humans.

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::{
    CHECKSUM_LENGTH, PREFIX_EDPK, PREFIX_EDSIG, PREFIX_EDSK, PUBLIC_KEY_LENGTH,
    SECRET_KEY_LENGTH, SIGNATURE_LENGTH,
};

/// Errors from checked base58 decoding. Encoding is infallible.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The input is not valid base58.
    #[error("not a base58 string")]
    NotBase58,

    /// The decoded bytes do not start with the expected prefix.
    #[error("wrong prefix: expected a '{0}' string")]
    BadPrefix(&'static str),

    /// The trailing checksum does not match the content. Transcription
    /// error or truncation — either way the string is unusable.
    #[error("checksum mismatch")]
    BadChecksum,

    /// Prefix and checksum are fine but the payload is the wrong size for
    /// this prefix (e.g. an `edsig` string not carrying 64 bytes).
    #[error("wrong payload length: expected {expected}, got {actual}")]
    WrongLength {
        /// Payload length this prefix requires.
        expected: usize,
        /// Payload length actually decoded.
        actual: usize,
    },
}

/// A base58check prefix: a human-readable tag and the raw bytes that
/// produce it, plus the payload length the tag implies.
///
/// Only known prefixes are constructible — the constants below are the
/// whole table. This keeps "which tag goes with which bytes" in exactly
/// one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prefix {
    tag: &'static str,
    bytes: &'static [u8],
    payload_len: usize,
}

impl Prefix {
    /// Detached Ed25519 signature: `edsig…`, 64-byte payload.
    pub const EDSIG: Prefix = Prefix {
        tag: "edsig",
        bytes: &PREFIX_EDSIG,
        payload_len: SIGNATURE_LENGTH,
    };

    /// Ed25519 public key: `edpk…`, 32-byte payload.
    pub const EDPK: Prefix = Prefix {
        tag: "edpk",
        bytes: &PREFIX_EDPK,
        payload_len: PUBLIC_KEY_LENGTH,
    };

    /// Ed25519 secret seed: `edsk…`, 32-byte payload. Handle the encoded
    /// form with the same care as the raw seed — base58 is not encryption.
    pub const EDSK: Prefix = Prefix {
        tag: "edsk",
        bytes: &PREFIX_EDSK,
        payload_len: SECRET_KEY_LENGTH,
    };

    /// The human-readable tag every string under this prefix starts with.
    pub fn tag(&self) -> &'static str {
        self.tag
    }
}

/// Hash `payload` down to `out_len` bytes with BLAKE3.
///
/// XOF mode, so the output length is the caller's choice; 32 bytes gives
/// the standard BLAKE3 digest. Any change to a single input bit changes
/// the whole output — see the avalanche test below.
pub fn digest(payload: &[u8], out_len: usize) -> Vec<u8> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(payload);
    let mut out = vec![0u8; out_len];
    hasher.finalize_xof().fill(&mut out);
    out
}

/// First four bytes of double-SHA-256. The base58check checksum function.
fn checksum(data: &[u8]) -> [u8; CHECKSUM_LENGTH] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut out = [0u8; CHECKSUM_LENGTH];
    out.copy_from_slice(&second[..CHECKSUM_LENGTH]);
    out
}

/// base58check-encode `payload` under `prefix`.
///
/// Produces `base58(prefix ‖ payload ‖ checksum(prefix ‖ payload))`. The
/// result always starts with the prefix's tag characters.
///
/// # Example
///
/// ```
/// use softsign::encode::{encode_with_prefix, Prefix};
///
/// let text = encode_with_prefix(&[0u8; 64], Prefix::EDSIG);
/// assert!(text.starts_with("edsig"));
/// ```
pub fn encode_with_prefix(payload: &[u8], prefix: Prefix) -> String {
    let mut data = Vec::with_capacity(prefix.bytes.len() + payload.len() + CHECKSUM_LENGTH);
    data.extend_from_slice(prefix.bytes);
    data.extend_from_slice(payload);
    let check = checksum(&data);
    data.extend_from_slice(&check);
    bs58::encode(data).into_string()
}

/// Decode a base58check string and strip `prefix`, validating the checksum
/// and the payload length along the way.
///
/// This is the read direction of [`encode_with_prefix`] and the oracle the
/// tests use to get signature bytes back out of an `edsig` string.
pub fn decode_checked(text: &str, prefix: Prefix) -> Result<Vec<u8>, EncodeError> {
    let raw = bs58::decode(text)
        .into_vec()
        .map_err(|_| EncodeError::NotBase58)?;

    if raw.len() < prefix.bytes.len() + CHECKSUM_LENGTH {
        return Err(EncodeError::BadPrefix(prefix.tag));
    }

    let (content, check) = raw.split_at(raw.len() - CHECKSUM_LENGTH);
    if check != checksum(content) {
        return Err(EncodeError::BadChecksum);
    }

    let Some(payload) = content.strip_prefix(prefix.bytes) else {
        return Err(EncodeError::BadPrefix(prefix.tag));
    };
    if payload.len() != prefix.payload_len {
        return Err(EncodeError::WrongLength {
            expected: prefix.payload_len,
            actual: payload.len(),
        });
    }
    Ok(payload.to_vec())
}
