//! # Secret Codec
//!
//! Passphrase-based sealing of key material and detached Ed25519 signing.
//! This is everything in softsign that touches a secret byte.
//!
//! Two independent jobs live here because both sit on the same trust
//! boundary:
//!
//! - **Seal / open** — AES-256-GCM over key material, with the AES key
//!   derived from a passphrase via scrypt. The sealed wire format is
//!   `nonce || ciphertext` in a single buffer: the first 12 bytes are a
//!   random nonce, the rest is ciphertext plus the 16-byte GCM tag. The
//!   caller never manages the nonce separately.
//! - **Detached signing** — Ed25519 over caller-supplied bytes, given a
//!   32-byte secret seed. Deterministic (RFC 8032), so no RNG is involved
//!   at signing time.
//!
//! ## On passphrase stretching
//!
//! The passphrase goes through scrypt at interactive strength (2^14, r=8,
//! p=1) before it becomes an AES key. GCM is only as strong as its key, and
//! a human-chosen passphrase hashed once with SHA-256 is a dictionary attack
//! waiting to happen. The `aux_data` argument is the KDF salt; an empty salt
//! is accepted for compatibility with callers that have no salt to give, at
//! the obvious cost of rainbow-table resistance.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::RngCore;
use thiserror::Error;

use crate::config::{
    AES_KEY_LENGTH, AES_NONCE_LENGTH, PUBLIC_KEY_LENGTH, SCRYPT_LOG_N, SCRYPT_P, SCRYPT_R,
    SECRET_KEY_LENGTH, SIGNATURE_LENGTH,
};

/// Errors from sealing, opening, and signing.
///
/// Intentionally vague about *why* a cryptographic operation failed.
/// "Wrong passphrase" and "corrupted ciphertext" are indistinguishable on
/// purpose — the difference is none of an attacker's business.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Decryption failed: wrong passphrase, truncated input, or tampering.
    #[error("could not open sealed key material")]
    OpenFailed,

    /// Encryption failed. With valid parameters this should not happen;
    /// if it does, something is deeply wrong with the AEAD backend.
    #[error("could not seal key material")]
    SealFailed,

    /// The signing key is not a valid 32-byte Ed25519 seed.
    #[error("malformed signing key: expected {SECRET_KEY_LENGTH} bytes")]
    MalformedKey,

    /// The passphrase KDF rejected its parameters. Only reachable if the
    /// compile-time scrypt constants are edited into an invalid combination.
    #[error("passphrase key derivation failed")]
    KdfFailed,
}

/// Stretch a passphrase into an AES-256 key.
///
/// scrypt with the interactive parameter set from `config`. `aux_data` is
/// the salt; empty is allowed.
fn derive_key(passphrase: &str, aux_data: &[u8]) -> Result<[u8; AES_KEY_LENGTH], CodecError> {
    let params = scrypt::Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, AES_KEY_LENGTH)
        .map_err(|_| CodecError::KdfFailed)?;
    let mut key = [0u8; AES_KEY_LENGTH];
    scrypt::scrypt(passphrase.as_bytes(), aux_data, &params, &mut key)
        .map_err(|_| CodecError::KdfFailed)?;
    Ok(key)
}

/// Seal key material under a passphrase.
///
/// Returns `nonce || ciphertext` as a single buffer. The nonce is 12 random
/// bytes from the OS CSPRNG; the ciphertext carries the GCM auth tag, so any
/// tampering — including a wrong passphrase at open time — is detected.
///
/// # Example
///
/// ```
/// use softsign::codec;
///
/// let sealed = codec::seal(&[7u8; 32], "hunter2", b"").unwrap();
/// let opened = codec::open(&sealed, "hunter2", b"").unwrap();
/// assert_eq!(opened, [7u8; 32]);
/// ```
pub fn seal(plaintext: &[u8], passphrase: &str, aux_data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let key = derive_key(passphrase, aux_data)?;
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CodecError::SealFailed)?;

    let mut nonce_bytes = [0u8; AES_NONCE_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CodecError::SealFailed)?;

    let mut out = Vec::with_capacity(AES_NONCE_LENGTH + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Open sealed key material with a passphrase.
///
/// Expects the `nonce || ciphertext` format produced by [`seal`]. Fails with
/// [`CodecError::OpenFailed`] if the passphrase is wrong, the input is too
/// short to contain a nonce, or the ciphertext has been modified — and does
/// not say which.
pub fn open(ciphertext: &[u8], passphrase: &str, aux_data: &[u8]) -> Result<Vec<u8>, CodecError> {
    if ciphertext.len() < AES_NONCE_LENGTH {
        return Err(CodecError::OpenFailed);
    }
    let key = derive_key(passphrase, aux_data)?;

    let (nonce_bytes, sealed) = ciphertext.split_at(AES_NONCE_LENGTH);
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CodecError::OpenFailed)?;
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher.decrypt(nonce, sealed).map_err(|_| CodecError::OpenFailed)
}

/// Produce a detached Ed25519 signature over `payload`.
///
/// `key` must be a 32-byte Ed25519 seed; anything else is rejected with
/// [`CodecError::MalformedKey`] before any curve arithmetic happens. The
/// signature is 64 bytes and deterministic for a given (key, payload) pair.
///
/// The payload is signed as-is. Whether it should be pre-hashed is the
/// caller's policy decision — `signer::SoftSigner` hashes operation payloads
/// and leaves text payloads alone.
pub fn sign_detached(payload: &[u8], key: &[u8]) -> Result<Vec<u8>, CodecError> {
    let seed: &[u8; SECRET_KEY_LENGTH] =
        key.try_into().map_err(|_| CodecError::MalformedKey)?;
    let signing_key = SigningKey::from_bytes(seed);
    Ok(signing_key.sign(payload).to_bytes().to_vec())
}

/// Verify a detached Ed25519 signature.
///
/// Returns `true` if the signature is valid, `false` for every failure mode
/// — bad key bytes, wrong-length signature, or a signature that simply
/// doesn't verify. Callers want a yes/no answer, not a taxonomy.
///
/// Verification is strict: small-order public keys and mixed-order
/// components are rejected outright, even where a lenient RFC 8032
/// verifier would wave them through. The all-zero "key" is an order-4
/// curve point that validates the all-zero signature under lenient rules —
/// strictness closes that forgery.
pub fn verify_detached(payload: &[u8], signature: &[u8], public_key: &[u8; PUBLIC_KEY_LENGTH]) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(public_key) else {
        return false;
    };
    let sig_bytes: [u8; SIGNATURE_LENGTH] = match signature.try_into() {
        Ok(b) => b,
        Err(_) => return false,
    };
    let sig = Signature::from_bytes(&sig_bytes);
    verifying_key.verify_strict(payload, &sig).is_ok()
}

/// Derive the Ed25519 public key for a 32-byte secret seed.
pub fn public_key_of(key: &[u8]) -> Result<[u8; PUBLIC_KEY_LENGTH], CodecError> {
    let seed: &[u8; SECRET_KEY_LENGTH] =
        key.try_into().map_err(|_| CodecError::MalformedKey)?;
    Ok(SigningKey::from_bytes(seed).verifying_key().to_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AES_TAG_LENGTH;

    fn test_seed() -> [u8; 32] {
        let mut seed = [0u8; 32];
        for (i, byte) in seed.iter_mut().enumerate() {
            *byte = i as u8;
        }
        seed
    }

    #[test]
    fn seal_open_roundtrip() {
        let sealed = seal(&test_seed(), "correct horse battery staple", b"").unwrap();
        let opened = open(&sealed, "correct horse battery staple", b"").unwrap();
        assert_eq!(opened, test_seed());
    }

    #[test]
    fn wrong_passphrase_fails_open() {
        let sealed = seal(&test_seed(), "right", b"").unwrap();
        assert!(open(&sealed, "wrong", b"").is_err());
    }

    #[test]
    fn aux_data_mismatch_fails_open() {
        // Different salt, different AES key, authentication failure.
        let sealed = seal(&test_seed(), "pw", b"salt-a").unwrap();
        assert!(open(&sealed, "pw", b"salt-b").is_err());
    }

    #[test]
    fn tampered_ciphertext_fails_open() {
        let mut sealed = seal(&test_seed(), "pw", b"").unwrap();
        // Flip a byte past the nonce, inside the ciphertext proper.
        sealed[AES_NONCE_LENGTH] ^= 0xFF;
        assert!(open(&sealed, "pw", b"").is_err());
    }

    #[test]
    fn truncated_input_fails_open() {
        assert!(open(&[0u8; 4], "pw", b"").is_err());
    }

    #[test]
    fn sealed_length_is_nonce_plus_payload_plus_tag() {
        let sealed = seal(&test_seed(), "pw", b"").unwrap();
        assert_eq!(sealed.len(), AES_NONCE_LENGTH + 32 + AES_TAG_LENGTH);
    }

    #[test]
    fn unique_nonces_per_seal() {
        // Two seals of the same plaintext must differ in their nonce prefix.
        // If this ever fails, the OS RNG is broken.
        let a = seal(&test_seed(), "pw", b"").unwrap();
        let b = seal(&test_seed(), "pw", b"").unwrap();
        assert_ne!(&a[..AES_NONCE_LENGTH], &b[..AES_NONCE_LENGTH]);
    }

    #[test]
    fn sign_produces_64_byte_deterministic_signature() {
        let sig1 = sign_detached(b"payload", &test_seed()).unwrap();
        let sig2 = sign_detached(b"payload", &test_seed()).unwrap();
        assert_eq!(sig1.len(), SIGNATURE_LENGTH);
        assert_eq!(sig1, sig2);
    }

    #[test]
    fn sign_rejects_wrong_length_key() {
        assert!(matches!(
            sign_detached(b"payload", &[0u8; 16]),
            Err(CodecError::MalformedKey)
        ));
        assert!(matches!(
            sign_detached(b"payload", &[0u8; 64]),
            Err(CodecError::MalformedKey)
        ));
    }

    #[test]
    fn sign_verify_roundtrip() {
        let seed = test_seed();
        let sig = sign_detached(b"message", &seed).unwrap();
        let pk = public_key_of(&seed).unwrap();
        assert!(verify_detached(b"message", &sig, &pk));
        assert!(!verify_detached(b"other message", &sig, &pk));
    }

    #[test]
    fn verify_rejects_garbage_without_panicking() {
        let pk = public_key_of(&test_seed()).unwrap();
        assert!(!verify_detached(b"msg", b"not a signature", &pk));
        assert!(!verify_detached(b"msg", &[0u8; 64], &[0u8; 32]));
    }

    #[test]
    fn verify_rejects_small_order_key_forgery() {
        // The all-zero public key decodes to an order-4 point, and under
        // lenient RFC 8032 rules the all-zero signature (s = 0, R = the
        // same degenerate point) verifies for ANY message. Strict
        // verification must refuse the key regardless of payload.
        assert!(!verify_detached(b"msg", &[0u8; 64], &[0u8; 32]));
        assert!(!verify_detached(b"", &[0u8; 64], &[0u8; 32]));
        assert!(!verify_detached(b"a completely different message", &[0u8; 64], &[0u8; 32]));
    }
}
