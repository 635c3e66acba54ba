//! loro-vault: a single passphrase-locked JSON document
//!
//! ```text
//!            unlock(p) ok / no blob yet
//!   Locked ─────────────────────────────► Unlocked
//!     ▲  ◄───────────────────────────────   │
//!     │   lock() / unlock(p) failed          │ save_encrypted(doc, p)
//!     │                                      ▼
//!     └──────────── wipe() ──────────── blob in KeyValueStore
//! ```
//!
//! The plaintext document and passphrase live only in memory while
//! Unlocked. Every save derives a new key from a new salt and encrypts
//! under a new IV.

pub mod error;
pub mod vault;

pub use error::VaultError;
pub use vault::{EncryptedVault, SafetyPlanVault, VaultState};
