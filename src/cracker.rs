//! The attack engine and its drivers.
//!
//! Decryption and encryption are both thin orchestrations over
//! [`recover_intermediate`]: decryption XORs each recovered intermediate
//! state with the block's real predecessor, encryption manufactures the
//! predecessors instead.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::info;
use rayon::prelude::*;

use crate::{
    oracle::Oracle,
    padding::{pad, unpad},
    recover::{random_nonzero_block, recover_intermediate},
    Error, Result,
};

/// Cooperative cancellation flag, observed between oracle queries.
///
/// Clone it, hand one clone to [`CrackerBuilder::cancel_token`] and keep the
/// other; [`cancel`](CancelToken::cancel) from any thread makes the running
/// call abandon its work and return [`Error::Cancelled`]. Partial results are
/// discarded.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Configures and builds a [`Cracker`]. Obtained from [`Cracker::builder`].
#[derive(Default)]
pub struct CrackerBuilder {
    oracle: Option<Box<dyn Oracle>>,
    block_size: Option<usize>,
    parallel: bool,
    cancel: Option<CancelToken>,
}

impl CrackerBuilder {
    /// The padding oracle to attack. Required.
    pub fn oracle(mut self, oracle: impl Oracle + 'static) -> Self {
        self.oracle = Some(Box::new(oracle));
        self
    }

    /// Block size of the underlying cipher in bytes. Defaults to 16 (AES).
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = Some(block_size);
        self
    }

    /// Recover distinct ciphertext blocks concurrently on the rayon pool
    /// during [`Cracker::decrypt`]. Bytes within one block are solved
    /// sequentially either way, each depending on the previous. Off by
    /// default to keep the oracle load predictable; only enable it if the
    /// oracle copes with concurrent queries.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn build(self) -> Result<Cracker> {
        let oracle = self.oracle.ok_or(Error::OracleUnavailable)?;

        let block_size = self.block_size.unwrap_or(16);
        // A PKCS7 pad value has to fit a single byte.
        if block_size == 0 || block_size > 255 {
            return Err(Error::InvalidInput {
                reason: format!("block size must be in 1..=255, got {block_size}"),
            });
        }

        Ok(Cracker {
            oracle,
            block_size,
            parallel: self.parallel,
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}

/// The attack engine: wraps an [`Oracle`] and turns its one-bit verdicts
/// into full decryption and encryption under the oracle's unknown key.
///
/// Holds no mutable state; disjoint calls are independent.
pub struct Cracker {
    oracle: Box<dyn Oracle>,
    block_size: usize,
    parallel: bool,
    cancel: CancelToken,
}

/// Outcome of [`Cracker::decrypt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decrypted {
    /// The plaintext with its PKCS7 padding stripped.
    pub cleartext: Vec<u8>,
    /// The raw plaintext, pad bytes still attached.
    pub padded: Vec<u8>,
}

impl Cracker {
    pub fn builder() -> CrackerBuilder {
        CrackerBuilder::default()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Recover the intermediate state of a single ciphertext block: the
    /// block-cipher decryption of `block` before the CBC XOR. XORed with the
    /// block's predecessor in the stream, it yields the plaintext block.
    pub fn recover_intermediate(&self, block: &[u8]) -> Result<Vec<u8>> {
        if block.len() != self.block_size {
            return Err(Error::InvalidInput {
                reason: format!(
                    "expected a single block of {} bytes, got {}",
                    self.block_size,
                    block.len()
                ),
            });
        }

        recover_intermediate(self.oracle.as_ref(), &self.cancel, block, self.block_size)
    }

    /// Decrypt a ciphertext through the oracle.
    ///
    /// `ciphertext` must be a positive multiple of the block size and must
    /// not include the IV; that goes in `iv`. Returns both the stripped
    /// cleartext and the raw padded plaintext.
    pub fn decrypt(&self, ciphertext: &[u8], iv: &[u8]) -> Result<Decrypted> {
        if iv.len() != self.block_size {
            return Err(Error::InvalidInput {
                reason: format!(
                    "the IV should be {} bytes, but the length is {}",
                    self.block_size,
                    iv.len()
                ),
            });
        }
        if ciphertext.is_empty() || ciphertext.len() % self.block_size != 0 {
            return Err(Error::InvalidInput {
                reason: format!(
                    "the ciphertext length should be a positive multiple of {}, but the length is {}",
                    self.block_size,
                    ciphertext.len()
                ),
            });
        }

        let blocks: Vec<&[u8]> = ciphertext.chunks(self.block_size).collect();
        // Each block's predecessor in the CBC stream: the IV for the first,
        // the previous ciphertext block for the rest.
        let pairs: Vec<(&[u8], &[u8])> = blocks
            .iter()
            .enumerate()
            .map(|(i, &block)| {
                let predecessor = if i == 0 { iv } else { blocks[i - 1] };
                (predecessor, block)
            })
            .collect();

        let solve = |&(predecessor, block): &(&[u8], &[u8])| -> Result<Vec<u8>> {
            let intermediate =
                recover_intermediate(self.oracle.as_ref(), &self.cancel, block, self.block_size)?;
            Ok(xor(predecessor, &intermediate))
        };

        // Blocks are independent of each other, so they may be solved on the
        // thread pool; results come back in ciphertext order.
        let plaintext_blocks: Vec<Vec<u8>> = if self.parallel {
            pairs.par_iter().map(solve).collect::<Result<_>>()?
        } else {
            pairs.iter().map(solve).collect::<Result<_>>()?
        };

        info!("decrypted {} block(s)", plaintext_blocks.len());

        let padded = plaintext_blocks.concat();
        let cleartext = unpad(&padded, self.block_size)?.to_vec();

        Ok(Decrypted { cleartext, padded })
    }

    /// Forge `IV ∥ ciphertext` that the oracle's underlying key decrypts
    /// back to `plaintext`.
    ///
    /// Works backwards from a random final block: once that block's
    /// intermediate state is known, a predecessor of `intermediate ⊕ P`
    /// makes the pair decrypt to the plaintext block `P`. The same trick on
    /// each freshly forged block extends the message leftwards until the
    /// last forged block becomes the IV.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let padded = pad(plaintext, self.block_size);
        let block_count = padded.len() / self.block_size;

        // Last ciphertext block first; the list is reversed on assembly.
        let mut blocks_backwards: Vec<Vec<u8>> = vec![random_nonzero_block(self.block_size)];

        for (i, plaintext_block) in padded.chunks(self.block_size).rev().enumerate() {
            let head = blocks_backwards.last().expect("seeded with one block");
            let intermediate =
                recover_intermediate(self.oracle.as_ref(), &self.cancel, head, self.block_size)?;

            info!("encrypted block {}/{block_count}", i + 1);
            blocks_backwards.push(xor(&intermediate, plaintext_block));
        }

        let mut forged = Vec::with_capacity(blocks_backwards.len() * self.block_size);
        for block in blocks_backwards.iter().rev() {
            forged.extend_from_slice(block);
        }

        Ok(forged)
    }
}

fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x ^ y).collect()
}
