//! # SoftSigner
//!
//! The key-lock state machine. Everything else in this crate is stateless
//! plumbing; this is the one object with memory and a clock.
//!
//! A [`SoftSigner`] owns a piece of secret material for its whole lifetime
//! and mediates every use of it. Depending on how it was constructed, the
//! material is either usable as-is or sealed under a passphrase, in which
//! case a signing call must carry the passphrase to decrypt a *working key*.
//! A decrypted working key does not live forever: a one-shot timer re-locks
//! the signer after a configurable timeout, so a passphrase typed once does
//! not arm the key indefinitely.
//!
//! ## Lock model
//!
//! The lock state is chosen at construction and never changes:
//!
//! - [`SoftSigner::new`] / [`SoftSigner::with_timeout`] build an *unlocked*
//!   signer. The passphrase branch is unreachable; whatever working key
//!   exists (only via the negative-timeout sentinel below) is what signing
//!   uses. A passphrase passed to an unlocked signer is ignored.
//! - [`SoftSigner::locked`] builds a *locked* signer whose secret material
//!   is a sealed blob (see [`crate::codec::seal`]). Signing calls must
//!   supply the passphrase at least once per timeout window.
//!
//! A negative timeout is a construction-time sentinel meaning "the material
//! is already a plaintext key": it becomes the working key immediately and
//! no expiry is ever scheduled.
//!
//! ## Timing and concurrency
//!
//! The working key lives in a mutex-guarded cell shared with the expiry
//! tasks. Each successful unlock bumps a generation counter; an expiry task
//! only clears the cell if its generation is still the current one, so a
//! re-unlock extends the window instead of racing a stale timer. Signing
//! clones the key out of the cell, which means a timer firing mid-signature
//! cannot tear the operation in progress — the *next* call sees the lock.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

use crate::codec::{self, CodecError};
use crate::config::{DEFAULT_LOCK_TIMEOUT_SECS, OPERATION_DIGEST_LENGTH, PUBLIC_KEY_LENGTH};
use crate::encode::{self, Prefix};

/// Errors surfaced by signing operations.
///
/// Each failure is fatal to the call that produced it — there is no retry
/// or recovery logic inside the signer. The three kinds stay distinct so a
/// caller can tell "prompt the user for a passphrase" apart from "the
/// passphrase was wrong" apart from "the key material itself is broken".
#[derive(Debug, Error)]
pub enum SignerError {
    /// No working key was available at the point of signing: the signer is
    /// locked and no (or no valid) unlock has happened, or the re-lock
    /// timer already fired.
    #[error("no working key available: signer is locked or the key expired")]
    KeyUnavailable,

    /// Passphrase-gated decryption of the secret material failed.
    #[error("unlock failed: {0}")]
    Decryption(#[from] CodecError),

    /// The signing primitive rejected the working key.
    #[error("signing failed: {0}")]
    Signing(CodecError),
}

/// Whether a signer's secret material is usable directly or sealed behind
/// a passphrase. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// The passphrase branch is disabled; signing uses whatever working
    /// key already exists.
    Unlocked,
    /// The secret material is sealed; signing calls must carry the
    /// passphrase to (re-)decrypt a working key.
    Locked,
}

/// The mutex-guarded cell shared between signing calls and expiry tasks.
struct KeyCell {
    key: Option<Vec<u8>>,
    /// Bumped on every unlock. An expiry task captures the generation it
    /// was armed for and becomes a no-op if a newer unlock overtook it.
    generation: u64,
}

/// A software-backed signing identity with passphrase locking and an
/// automatic re-lock timer.
///
/// One instance wraps one secret. The two signing entry points differ only
/// in payload handling and output format — [`sign_operation`] hashes the
/// payload to 32 bytes and returns raw signature bytes, [`sign_text`] signs
/// the literal UTF-8 bytes and returns an `edsig…` base58check string. Key
/// handling is identical and shared.
///
/// The signer is `Send + Sync`; clone-free sharing via `Arc<SoftSigner>` is
/// the intended multi-task usage.
///
/// [`sign_operation`]: Self::sign_operation
/// [`sign_text`]: Self::sign_text
///
/// # Example
///
/// ```
/// use softsign::{codec, SoftSigner};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// // A plaintext 32-byte seed: negative timeout marks it already usable.
/// let signer = SoftSigner::with_timeout(vec![7u8; 32], -1);
/// let signature = signer.sign_operation(b"payload", "").await.unwrap();
/// assert_eq!(signature.len(), 64);
/// # }
/// ```
pub struct SoftSigner {
    /// The stored secret material — sealed blob or plaintext seed. Never
    /// mutated, never cleared.
    secret: Vec<u8>,
    lock_timeout_secs: i64,
    state: LockState,
    cell: Arc<Mutex<KeyCell>>,
}

impl SoftSigner {
    /// Build an unlocked signer with the default 60-second lock timeout.
    ///
    /// Equivalent to `with_timeout(secret, DEFAULT_LOCK_TIMEOUT_SECS)`.
    /// Note that an unlocked signer with a non-negative timeout has no
    /// working key at all — see [`with_timeout`](Self::with_timeout).
    pub fn new(secret: Vec<u8>) -> Self {
        Self::with_timeout(secret, DEFAULT_LOCK_TIMEOUT_SECS)
    }

    /// Build an unlocked signer with an explicit lock timeout.
    ///
    /// A negative `timeout_secs` means `secret` is already a plaintext
    /// signing key: it becomes the working key immediately and never
    /// expires. With a non-negative timeout the signer starts with *no*
    /// working key, and because the unlocked state disables the passphrase
    /// branch, every signing attempt fails with
    /// [`SignerError::KeyUnavailable`]. That combination is intentional:
    /// an unlocked signer never decrypts, so the useful configurations are
    /// `timeout_secs < 0` here, or [`locked`](Self::locked).
    pub fn with_timeout(secret: Vec<u8>, timeout_secs: i64) -> Self {
        Self::build(secret, timeout_secs, LockState::Unlocked)
    }

    /// Build a locked signer over passphrase-sealed secret material.
    ///
    /// `secret` must be a blob produced by [`crate::codec::seal`]. Signing
    /// calls carry the passphrase; after a successful unlock the decrypted
    /// working key stays usable for `timeout_secs` seconds before the
    /// signer re-locks. A `timeout_secs` of zero disables the re-lock
    /// timer (the working key persists until the object is dropped); a
    /// negative value applies the plaintext sentinel exactly as in
    /// [`with_timeout`](Self::with_timeout).
    pub fn locked(secret: Vec<u8>, timeout_secs: i64) -> Self {
        Self::build(secret, timeout_secs, LockState::Locked)
    }

    fn build(secret: Vec<u8>, timeout_secs: i64, state: LockState) -> Self {
        // The sentinel is unconditional: negative timeout means "already
        // decrypted", regardless of lock state.
        let key = (timeout_secs < 0).then(|| secret.clone());
        Self {
            secret,
            lock_timeout_secs: timeout_secs,
            state,
            cell: Arc::new(Mutex::new(KeyCell { key, generation: 0 })),
        }
    }

    /// The construction-time lock state.
    pub fn lock_state(&self) -> LockState {
        self.state
    }

    /// Whether a working key is currently present in the cell.
    ///
    /// Diagnostic probe; by the time the caller acts on the answer the
    /// re-lock timer may already have fired. Signing calls re-check under
    /// the lock.
    pub fn has_working_key(&self) -> bool {
        self.cell.lock().key.is_some()
    }

    /// The Ed25519 public key for the current working key.
    ///
    /// Fails with [`SignerError::KeyUnavailable`] while no working key is
    /// present. This is the verification counterpart callers hand out —
    /// the signer never exposes the secret itself.
    pub fn public_key(&self) -> Result<[u8; PUBLIC_KEY_LENGTH], SignerError> {
        let key = self.working_key().ok_or(SignerError::KeyUnavailable)?;
        codec::public_key_of(&key).map_err(SignerError::Signing)
    }

    /// The working public key as an `edpk…` base58check string.
    pub fn public_key_b58(&self) -> Result<String, SignerError> {
        Ok(encode::encode_with_prefix(&self.public_key()?, Prefix::EDPK))
    }

    /// Sign an operation payload: hash to 32 bytes, then detached-sign the
    /// digest. Returns the raw 64-byte signature.
    ///
    /// If the signer is locked and `passphrase` is non-empty, the working
    /// key is (re-)decrypted first and the re-lock timer is armed. Pass an
    /// empty passphrase to sign within an existing unlock window.
    ///
    /// # Errors
    ///
    /// - [`SignerError::Decryption`] if the passphrase is wrong or the
    ///   sealed material is corrupt.
    /// - [`SignerError::KeyUnavailable`] if no working key is present at
    ///   the point of signing.
    /// - [`SignerError::Signing`] if the decrypted material is not a valid
    ///   signing key.
    pub async fn sign_operation(
        &self,
        bytes: &[u8],
        passphrase: &str,
    ) -> Result<Vec<u8>, SignerError> {
        self.unlock_if_needed(passphrase).await?;
        let key = self.working_key().ok_or(SignerError::KeyUnavailable)?;
        let digest = encode::digest(bytes, OPERATION_DIGEST_LENGTH);
        codec::sign_detached(&digest, &key).map_err(SignerError::Signing)
    }

    /// Sign UTF-8 text and return the signature as an `edsig…` string.
    ///
    /// The message's literal UTF-8 bytes are signed — no pre-hashing, so a
    /// verifier only needs the text itself. Unlock handling is identical to
    /// [`sign_operation`](Self::sign_operation) and shares the same working
    /// key and timer.
    pub async fn sign_text(&self, message: &str, passphrase: &str) -> Result<String, SignerError> {
        self.unlock_if_needed(passphrase).await?;
        let key = self.working_key().ok_or(SignerError::KeyUnavailable)?;
        let signature = codec::sign_detached(message.as_bytes(), &key)
            .map_err(SignerError::Signing)?;
        Ok(encode::encode_with_prefix(&signature, Prefix::EDSIG))
    }

    /// Decrypt the working key if this call can and must.
    ///
    /// Only a locked signer with a non-empty passphrase enters the branch.
    /// On success the cell's generation is bumped and, for a positive
    /// timeout, a one-shot expiry task is spawned that re-locks the signer
    /// unless a newer unlock has overtaken it.
    async fn unlock_if_needed(&self, passphrase: &str) -> Result<(), SignerError> {
        if self.state != LockState::Locked || passphrase.is_empty() {
            return Ok(());
        }

        let key = codec::open(&self.secret, passphrase, b"")?;
        let generation = {
            let mut cell = self.cell.lock();
            cell.generation += 1;
            cell.key = Some(key);
            cell.generation
        };
        debug!(generation, timeout_secs = self.lock_timeout_secs, "working key decrypted");

        if self.lock_timeout_secs > 0 {
            let cell = Arc::clone(&self.cell);
            let timeout = Duration::from_secs(self.lock_timeout_secs as u64);
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                let mut cell = cell.lock();
                // A newer unlock owns the cell now; this timer is stale.
                if cell.generation == generation {
                    cell.key = None;
                    debug!(generation, "lock timeout elapsed, signer re-locked");
                }
            });
        }
        Ok(())
    }

    /// Clone the working key out of the cell, holding the lock only for
    /// the copy.
    fn working_key(&self) -> Option<Vec<u8>> {
        self.cell.lock().key.clone()
    }
}

impl std::fmt::Debug for SoftSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Neither the secret nor the working key appears in debug output.
        f.debug_struct("SoftSigner")
            .field("state", &self.state)
            .field("lock_timeout_secs", &self.lock_timeout_secs)
            .field("has_working_key", &self.has_working_key())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SIGNATURE_LENGTH;

    fn seed() -> Vec<u8> {
        (0u8..32).collect()
    }

    #[tokio::test]
    async fn negative_timeout_uses_secret_as_working_key() {
        let signer = SoftSigner::with_timeout(seed(), -1);
        assert!(signer.has_working_key());

        let sig = signer.sign_operation(b"payload", "").await.unwrap();
        assert_eq!(sig.len(), SIGNATURE_LENGTH);
        // Identical to signing the 32-byte digest with the seed directly.
        let digest = encode::digest(b"payload", 32);
        let direct = codec::sign_detached(&digest, &seed()).unwrap();
        assert_eq!(sig, direct);
    }

    #[tokio::test]
    async fn negative_timeout_ignores_passphrase() {
        // The sentinel path never schedules expiry and never decrypts; a
        // passphrase on an unlocked signer is dead weight.
        let signer = SoftSigner::with_timeout(seed(), -1);
        let with_pw = signer.sign_operation(b"payload", "irrelevant").await.unwrap();
        let without = signer.sign_operation(b"payload", "").await.unwrap();
        assert_eq!(with_pw, without);
        assert!(signer.has_working_key());
    }

    #[tokio::test]
    async fn default_construction_is_unlocked_with_no_working_key() {
        // Default construction: unlocked state, empty cell. The decryption
        // branch is unreachable, so even a correct-looking passphrase
        // cannot help — signing must report the missing key.
        let signer = SoftSigner::new(seed());
        assert_eq!(signer.lock_state(), LockState::Unlocked);
        assert!(!signer.has_working_key());

        let err = signer.sign_operation(b"payload", "a passphrase").await.unwrap_err();
        assert!(matches!(err, SignerError::KeyUnavailable));
        let err = signer.sign_text("hello", "a passphrase").await.unwrap_err();
        assert!(matches!(err, SignerError::KeyUnavailable));
    }

    #[tokio::test]
    async fn locked_signer_requires_passphrase() {
        let sealed = codec::seal(&seed(), "hunter2", b"").unwrap();
        let signer = SoftSigner::locked(sealed, 60);
        assert_eq!(signer.lock_state(), LockState::Locked);

        // No passphrase: the branch is skipped, no key, no signature.
        let err = signer.sign_operation(b"payload", "").await.unwrap_err();
        assert!(matches!(err, SignerError::KeyUnavailable));

        // Wrong passphrase: decryption fails loudly.
        let err = signer.sign_operation(b"payload", "wrong").await.unwrap_err();
        assert!(matches!(err, SignerError::Decryption(_)));

        // Right passphrase: unlocks and signs.
        let sig = signer.sign_operation(b"payload", "hunter2").await.unwrap();
        assert_eq!(sig.len(), SIGNATURE_LENGTH);
        assert!(signer.has_working_key());
    }

    #[tokio::test]
    async fn unlock_window_allows_passphrase_free_signing() {
        let sealed = codec::seal(&seed(), "hunter2", b"").unwrap();
        let signer = SoftSigner::locked(sealed, 60);

        signer.sign_operation(b"first", "hunter2").await.unwrap();
        // Within the window, the empty passphrase rides the existing key.
        signer.sign_operation(b"second", "").await.unwrap();
        signer.sign_text("third", "").await.unwrap();
    }

    #[tokio::test]
    async fn sign_text_output_is_edsig_and_covers_raw_bytes() {
        let signer = SoftSigner::with_timeout(seed(), -1);
        let text = signer.sign_text("hello", "").await.unwrap();
        assert!(text.starts_with("edsig"));

        // The signature must cover exactly the UTF-8 bytes 68 65 6c 6c 6f,
        // unhashed.
        let sig = encode::decode_checked(&text, Prefix::EDSIG).unwrap();
        let pk = codec::public_key_of(&seed()).unwrap();
        assert!(codec::verify_detached(b"hello", &sig, &pk));
        // And must NOT verify against the digest — proving no pre-hash.
        assert!(!codec::verify_detached(&encode::digest(b"hello", 32), &sig, &pk));
    }

    #[tokio::test]
    async fn sign_operation_signs_the_32_byte_digest() {
        let signer = SoftSigner::with_timeout(seed(), -1);
        let sig = signer.sign_operation(b"some operation bytes", "").await.unwrap();

        let pk = codec::public_key_of(&seed()).unwrap();
        let digest = encode::digest(b"some operation bytes", 32);
        assert_eq!(digest.len(), 32);
        assert!(codec::verify_detached(&digest, &sig, &pk));
        // The raw payload itself was not what got signed.
        assert!(!codec::verify_detached(b"some operation bytes", &sig, &pk));
    }

    #[tokio::test(start_paused = true)]
    async fn working_key_expires_after_timeout() {
        let sealed = codec::seal(&seed(), "hunter2", b"").unwrap();
        let signer = SoftSigner::locked(sealed, 1);

        signer.sign_operation(b"payload", "hunter2").await.unwrap();
        assert!(signer.has_working_key());

        // Let the spawned expiry task register its sleep before the clock
        // moves; under a paused clock a deadline armed after the advance
        // would land in the future and never fire in this test.
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert!(!signer.has_working_key());
        let err = signer.sign_operation(b"payload", "").await.unwrap_err();
        assert!(matches!(err, SignerError::KeyUnavailable));
    }

    #[tokio::test(start_paused = true)]
    async fn reunlock_extends_window_past_stale_timer() {
        let sealed = codec::seal(&seed(), "hunter2", b"").unwrap();
        let signer = SoftSigner::locked(sealed, 5);

        // First unlock arms a timer for t=5. Yield so the timer actually
        // registers before the clock moves.
        signer.sign_operation(b"a", "hunter2").await.unwrap();
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_secs(3)).await;

        // Re-unlock at t=3 arms a timer for t=8 and bumps the generation.
        signer.sign_operation(b"b", "hunter2").await.unwrap();
        tokio::task::yield_now().await;

        // t=6: the first timer has fired but it is stale — the key stays.
        tokio::time::advance(Duration::from_secs(3)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(signer.has_working_key());
        signer.sign_operation(b"c", "").await.unwrap();

        // t=9: the second timer fires for real.
        tokio::time::advance(Duration::from_secs(3)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(!signer.has_working_key());
    }

    #[tokio::test]
    async fn zero_timeout_never_expires() {
        let sealed = codec::seal(&seed(), "hunter2", b"").unwrap();
        let signer = SoftSigner::locked(sealed, 0);

        signer.sign_operation(b"payload", "hunter2").await.unwrap();
        // No timer was armed; the key persists.
        assert!(signer.has_working_key());
        signer.sign_operation(b"payload", "").await.unwrap();
    }

    #[tokio::test]
    async fn public_key_matches_seed() {
        let signer = SoftSigner::with_timeout(seed(), -1);
        let pk = signer.public_key().unwrap();
        assert_eq!(pk, codec::public_key_of(&seed()).unwrap());
        assert!(signer.public_key_b58().unwrap().starts_with("edpk"));
    }

    #[tokio::test]
    async fn public_key_unavailable_while_locked() {
        let sealed = codec::seal(&seed(), "hunter2", b"").unwrap();
        let signer = SoftSigner::locked(sealed, 60);
        assert!(matches!(signer.public_key(), Err(SignerError::KeyUnavailable)));
    }

    #[test]
    fn debug_output_does_not_leak_material() {
        let signer = SoftSigner::with_timeout(vec![0xAA; 32], -1);
        let rendered = format!("{signer:?}");
        assert!(rendered.contains("SoftSigner"));
        assert!(!rendered.to_lowercase().contains("aa, aa"));
        assert!(!rendered.contains("170"));
    }
}
