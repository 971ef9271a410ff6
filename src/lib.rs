// Copyright (c) 2026 the softsign authors. MIT License.
// See LICENSE for details.

//! # softsign — a software-backed signing identity
//!
//! One secret, one signer, one clock. `softsign` wraps a piece of Ed25519
//! key material in a [`SoftSigner`] that decides *when* the key may be used:
//! optionally sealed under a passphrase, decrypted on demand, and re-locked
//! automatically after a timeout. Callers get two signing entry points —
//! raw operation bytes (hashed to a 32-byte digest before signing) and
//! UTF-8 text (signed literally and returned as a checksummed `edsig…`
//! string) — that share one working key and one timer.
//!
//! This is a library component, not a service: no network surface, no key
//! files, no CLI. You construct a signer, you call it, it signs or it tells
//! you exactly why it won't.
//!
//! ## Architecture
//!
//! - **signer** — The stateful core: lock state machine, expiry timer,
//!   the two signing operations.
//! - **codec** — Passphrase sealing/opening of key material (scrypt +
//!   AES-256-GCM) and detached Ed25519 sign/verify.
//! - **encode** — BLAKE3 digests and base58check rendering with typed
//!   prefixes (`edsig`, `edpk`, `edsk`).
//! - **config** — Every constant, in one place.
//!
//! ## Design philosophy
//!
//! 1. Boring, audited cryptography only — this crate wraps primitives, it
//!    never invents them.
//! 2. Secrets never appear in logs or `Debug` output. Not even partially.
//! 3. Every failure is a typed error the caller can match on. Nothing is
//!    swallowed, nothing is retried behind your back.
//!
//! ## Example
//!
//! ```
//! use softsign::{codec, SoftSigner};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! // Seal a 32-byte seed under a passphrase, then sign through the lock.
//! let sealed = codec::seal(&[7u8; 32], "correct horse", b"").unwrap();
//! let signer = SoftSigner::locked(sealed, 60);
//!
//! let text_sig = signer.sign_text("hello", "correct horse").await.unwrap();
//! assert!(text_sig.starts_with("edsig"));
//!
//! // Within the 60-second window, no passphrase needed.
//! let op_sig = signer.sign_operation(b"\x03payload", "").await.unwrap();
//! assert_eq!(op_sig.len(), 64);
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod encode;
pub mod signer;

// Re-export the things people actually need so they don't have to memorize
// the module hierarchy.
pub use encode::Prefix;
pub use signer::{LockState, SignerError, SoftSigner};
