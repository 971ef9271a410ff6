//! # Constants
//!
//! Every magic number in softsign lives here. If you're hardcoding a
//! constant somewhere else, you're doing it wrong.
//!
//! Most of these values are fixed by the cryptography (AES-GCM nonce size,
//! Ed25519 key and signature lengths, base58check prefix bytes) and changing
//! them silently breaks interoperability with every signature this crate has
//! ever produced. The lock timeout default is the one genuinely tunable knob.

// ---------------------------------------------------------------------------
// Signer behavior
// ---------------------------------------------------------------------------

/// Default working-key validity window, in seconds.
///
/// After a passphrase-gated unlock, the decrypted key stays usable for this
/// long before the signer re-locks itself. Sixty seconds is long enough to
/// batch a handful of signing calls behind one passphrase prompt and short
/// enough that a forgotten terminal isn't a standing invitation.
pub const DEFAULT_LOCK_TIMEOUT_SECS: i64 = 60;

/// Length of the digest computed over raw operation payloads before signing.
///
/// Operation signing hashes the payload down to exactly this many bytes and
/// signs the digest, so the signature size is independent of payload size.
/// Text signing deliberately does NOT pre-hash — see `signer::SoftSigner`.
pub const OPERATION_DIGEST_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// AEAD envelope (sealed key material)
// ---------------------------------------------------------------------------

/// AES-256 key length in bytes. The passphrase KDF targets this.
pub const AES_KEY_LENGTH: usize = 32;

/// AES-GCM nonce length in bytes. 96 bits is the standard GCM nonce size
/// and the only one you should use.
pub const AES_NONCE_LENGTH: usize = 12;

/// GCM authentication tag length in bytes, appended to the ciphertext by
/// the AEAD internally. Listed here because length checks need it.
pub const AES_TAG_LENGTH: usize = 16;

// ---------------------------------------------------------------------------
// Passphrase KDF (scrypt, interactive strength)
// ---------------------------------------------------------------------------

/// scrypt CPU/memory cost, as log2(N). 2^14 = 16384 iterations — the
/// interactive-use parameter set. An unlock happens at human frequency, not
/// in a hot loop, so tens of milliseconds of stretching is the right trade.
pub const SCRYPT_LOG_N: u8 = 14;

/// scrypt block size.
pub const SCRYPT_R: u32 = 8;

/// scrypt parallelization factor.
pub const SCRYPT_P: u32 = 1;

// ---------------------------------------------------------------------------
// Ed25519
// ---------------------------------------------------------------------------

/// Ed25519 secret key (seed) length in bytes.
pub const SECRET_KEY_LENGTH: usize = 32;

/// Ed25519 public key length in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Ed25519 detached signature length in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// base58check
// ---------------------------------------------------------------------------

/// Checksum length appended before base58 encoding: the first four bytes of
/// a double-SHA-256 over prefix + payload.
pub const CHECKSUM_LENGTH: usize = 4;

/// Prefix bytes for an Ed25519 detached signature ("edsig…").
///
/// These byte values are a wire-format constant shared with every other
/// implementation that reads or writes `edsig` strings. They are chosen so
/// that the base58 encoding of `prefix ‖ 64-byte payload ‖ checksum` always
/// starts with the literal characters `edsig`.
pub const PREFIX_EDSIG: [u8; 5] = [9, 245, 205, 134, 18];

/// Prefix bytes for an Ed25519 public key ("edpk…").
pub const PREFIX_EDPK: [u8; 4] = [13, 15, 37, 217];

/// Prefix bytes for an Ed25519 secret key seed ("edsk…").
pub const PREFIX_EDSK: [u8; 4] = [13, 15, 58, 7];
