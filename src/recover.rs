//! Byte-by-byte recovery of a block's intermediate state.
//!
//! The intermediate state of a ciphertext block `C` is `I = D_k(C)`, the
//! block-cipher decryption before the CBC XOR. Whatever block `X` precedes
//! `C` in the stream, `C` decrypts to `X ⊕ I`, so the oracle's verdict on
//! `X ∥ C` tells us whether `X ⊕ I` ends in valid padding. Solving the last
//! byte first and walking left, each byte of `I` costs at most 256 queries.

use log::debug;
use rand::Rng;

use crate::{cracker::CancelToken, oracle::Oracle, Error, Result};

/// A block of uniformly random bytes, none of them zero. Zero bytes make an
/// accidental valid pad on the fresh forged block slightly more likely, and
/// they cost nothing to exclude.
pub(crate) fn random_nonzero_block(block_size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..block_size).map(|_| rng.gen_range(1..=u8::MAX)).collect()
}

/// Recover the intermediate state of a single ciphertext block.
///
/// Maintains a forged predecessor `forged` and attacks one byte per pad
/// value: to learn the byte at `block_size - pad`, the already solved tail is
/// pinned so it decrypts to `pad`, and the unknown position is brute-forced
/// until the oracle accepts. The accepted candidate XOR `pad` is the
/// intermediate byte.
///
/// The first round is special: with a random predecessor, a valid verdict
/// means *some* pad, not necessarily `…01`; the block may have accidentally
/// decrypted to `…02 02` or any longer run. [`pad_length`] settles which.
pub(crate) fn recover_intermediate(
    oracle: &dyn Oracle,
    cancel: &CancelToken,
    block: &[u8],
    block_size: usize,
) -> Result<Vec<u8>> {
    let mut forged = random_nonzero_block(block_size);
    let mut intermediate = vec![0u8; block_size];

    // Scratch for `forged ∥ block`, reused across all queries.
    let mut query = vec![0u8; 2 * block_size];
    query[block_size..].copy_from_slice(block);

    let mut pad = 1;
    while pad <= block_size {
        let offset = block_size - pad;

        // Pin the solved tail so it decrypts to the pad value under attack.
        for k in offset + 1..block_size {
            forged[k] = intermediate[k] ^ pad as u8;
        }

        let mut hit = None;
        for candidate in 0..=u8::MAX {
            forged[offset] = candidate;
            if ask(oracle, cancel, &mut query, &forged)? {
                hit = Some(candidate);
                break;
            }
        }
        let candidate = hit.ok_or(Error::OracleFailed { offset })?;

        if pad == 1 {
            let length = pad_length(oracle, cancel, &mut query, &mut forged, block_size)?;
            for solved in 1..=length {
                intermediate[block_size - solved] = forged[block_size - solved] ^ length as u8;
            }
            debug!("solved bytes {}..{} in one round (pad length {length})", block_size - length, block_size);
            pad = length;
        } else {
            intermediate[offset] = candidate ^ pad as u8;
            debug!("solved byte {offset}");
        }

        pad += 1;
    }

    Ok(intermediate)
}

/// Measure the pad the first accepted forgery produced.
///
/// Flip one bit in each forged byte left of the final one, moving leftwards,
/// and re-query. A flip inside the pad corrupts it, so the oracle keeps
/// saying invalid; the first flip the oracle shrugs off sits just outside
/// the pad, which therefore spans `probe - 1` bytes. A sweep with no such
/// flip means the whole block is pad.
fn pad_length(
    oracle: &dyn Oracle,
    cancel: &CancelToken,
    query: &mut [u8],
    forged: &mut [u8],
    block_size: usize,
) -> Result<usize> {
    for probe in 2..=block_size {
        let position = block_size - probe;

        forged[position] ^= 1;
        let valid = ask(oracle, cancel, query, forged)?;
        forged[position] ^= 1;

        if valid {
            return Ok(probe - 1);
        }
    }

    Ok(block_size)
}

fn ask(
    oracle: &dyn Oracle,
    cancel: &CancelToken,
    query: &mut [u8],
    forged: &[u8],
) -> Result<bool> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    query[..forged.len()].copy_from_slice(forged);
    Ok(oracle.has_valid_padding(query))
}
