//! loro-crypto: passphrase-based encryption of JSON documents
//!
//! Scheme:
//! ```text
//! passphrase ──PBKDF2-HMAC-SHA256(salt: 16 random bytes, iter: 200000)──► 256-bit key
//! JSON(document) ──AES-256-GCM(key, iv: 12 random bytes)──► ct || 16-byte tag
//! ```
//!
//! The sealed form is a small JSON object, [`EncryptedBlob`]:
//! `{"v":1,"kdf":"PBKDF2-SHA256","iter":200000,"salt":"…","iv":"…","ct":"…"}`
//! with byte fields in standard base64. Salt and IV are fresh on every seal,
//! so sealing the same document twice never yields the same blob.

pub mod blob;
pub mod cipher;
pub mod error;
pub mod kdf;

pub use blob::{EncryptedBlob, BLOB_VERSION, KDF_NAME};
pub use cipher::{decrypt_json, encrypt_json, encrypt_json_with};
pub use error::CryptoError;
pub use kdf::{derive_key, DerivedKey, KdfParams, DEFAULT_ITERATIONS, MAX_ITERATIONS};

/// Size of a derived AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of the PBKDF2 salt in bytes
pub const SALT_SIZE: usize = 16;

/// Size of an AES-GCM IV in bytes (96-bit)
pub const IV_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag appended to `ct`
pub const TAG_SIZE: usize = 16;

/// Shortest passphrase accepted for encryption, in characters
pub const MIN_PASSPHRASE_LEN: usize = 4;
