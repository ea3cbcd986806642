//! Decrypt and encrypt CBC-PKCS7 data through a padding oracle, without ever
//! learning the key.
//!
//! A padding oracle is anything that answers whether a ciphertext decrypts to
//! a validly padded plaintext: an error page, a status code, a library call.
//! One bit per query is enough to recover the plaintext of an arbitrary
//! ciphertext, and to forge a ciphertext for an arbitrary plaintext.
//! See [`Cracker`] or the example below on how to use.
//!
//! # Example
//! ```
//! use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
//! use padding_oracle_cracker::Cracker;
//!
//! type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
//! type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
//!
//! const KEY: [u8; 16] = [0u8; 16];
//!
//! // The victim: decrypts `forged predecessor ∥ target block` under its
//! // secret key and leaks whether the padding came out valid.
//! fn oracle(data: &[u8]) -> bool {
//!     let (iv, ciphertext) = data.split_at(16);
//!     let mut buf = ciphertext.to_vec();
//!
//!     Aes128CbcDec::new_from_slices(&KEY, iv)
//!         .unwrap()
//!         .decrypt_padded_mut::<Pkcs7>(&mut buf)
//!         .is_ok()
//! }
//!
//! # let iv = [0x24u8; 16];
//! # let plaintext = b"Now that the party is jumping";
//! # let mut buf = vec![0u8; (plaintext.len() / 16 + 1) * 16];
//! # buf[..plaintext.len()].copy_from_slice(plaintext);
//! # let ciphertext = Aes128CbcEnc::new_from_slices(&KEY, &iv)
//! #     .unwrap()
//! #     .encrypt_padded_mut::<Pkcs7>(&mut buf, plaintext.len())
//! #     .unwrap()
//! #     .to_vec();
//! #
//! let cracker = Cracker::builder().oracle(oracle).build()?;
//!
//! // Decrypt without the key...
//! let recovered = cracker.decrypt(&ciphertext, &iv)?;
//! assert_eq!(recovered.cleartext, plaintext);
//!
//! // ...or forge a ciphertext of our own. The first block is the IV.
//! let forged = cracker.encrypt(b"arbitrary data")?;
//! # let (forged_iv, forged_ct) = forged.split_at(16);
//! # let mut buf = forged_ct.to_vec();
//! # let decrypted = Aes128CbcDec::new_from_slices(&KEY, forged_iv)
//! #     .unwrap()
//! #     .decrypt_padded_mut::<Pkcs7>(&mut buf)
//! #     .unwrap();
//! # assert_eq!(decrypted, b"arbitrary data");
//! # Ok::<(), padding_oracle_cracker::Error>(())
//! ```

mod cracker;
mod oracle;
mod padding;
mod recover;
#[cfg(feature = "web")]
mod web;

pub use cracker::{CancelToken, Cracker, CrackerBuilder, Decrypted};
pub use oracle::Oracle;
pub use padding::{pad, unpad};
#[cfg(feature = "web")]
pub use web::{from_web64, to_web64, WebOracle};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The builder was finalized without an oracle predicate.
    #[error("no padding oracle was supplied")]
    OracleUnavailable,

    #[error(
        "the oracle rejected all 256 candidates for byte {offset}. Make sure your oracle is valid and that PKCS7 padding is used"
    )]
    OracleFailed { offset: usize },

    #[error("bad PKCS7 padding: {reason}")]
    BadPadding { reason: &'static str },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The caller pulled its [`CancelToken`] mid-call.
    #[error("the call was cancelled")]
    Cancelled,
}

pub type Result<T> = core::result::Result<T, Error>;
