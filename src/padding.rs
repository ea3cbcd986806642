//! PKCS7 padding, the scheme whose validity the oracle leaks.

use crate::{Error, Result};

/// Append PKCS7 padding: `p = block_size - (len % block_size)` bytes, each of
/// value `p`. Input already on a block boundary gains a full block of
/// `block_size`-valued bytes, so there is always at least one pad byte.
pub fn pad(data: &[u8], block_size: usize) -> Vec<u8> {
    let pad = block_size - data.len() % block_size;

    let mut padded = data.to_vec();
    padded.resize(data.len() + pad, pad as u8);
    padded
}

/// Strip PKCS7 padding. The final byte must be a pad length in
/// `1..=block_size` and the trailing `pad` bytes must all carry that value;
/// anything else is rejected with [`Error::BadPadding`].
pub fn unpad(data: &[u8], block_size: usize) -> Result<&[u8]> {
    let pad = match data.last() {
        Some(&pad) => pad as usize,
        None => return Err(Error::BadPadding { reason: "empty buffer" }),
    };

    if pad == 0 || pad > block_size {
        return Err(Error::BadPadding {
            reason: "pad byte out of range",
        });
    }

    if data.len() < pad || data[data.len() - pad..].iter().any(|&b| b as usize != pad) {
        return Err(Error::BadPadding {
            reason: "trailing bytes don't match the pad byte",
        });
    }

    Ok(&data[..data.len() - pad])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_and_stays_block_aligned() {
        for len in 0..=48 {
            let data: Vec<u8> = (0..len as u8).collect();
            let padded = pad(&data, 16);

            assert_eq!(padded.len() % 16, 0);
            assert!((1..=16).contains(&(padded.len() - data.len())));
            assert_eq!(unpad(&padded, 16).unwrap(), &data[..]);
        }
    }

    #[test]
    fn aligned_input_gains_a_full_block() {
        let data = [7u8; 32];
        let padded = pad(&data, 16);

        assert_eq!(padded.len(), 48);
        assert_eq!(&padded[32..], &[16u8; 16]);
    }

    #[test]
    fn zero_pad_byte_is_rejected() {
        let result = unpad(&[0u8; 16], 16);
        assert!(matches!(result, Err(Error::BadPadding { .. })));
    }

    #[test]
    fn oversized_pad_byte_is_rejected() {
        let mut data = [2u8; 16];
        data[15] = 17;
        assert!(matches!(unpad(&data, 16), Err(Error::BadPadding { .. })));
    }

    #[test]
    fn mismatched_pad_bytes_are_rejected() {
        let mut data = [9u8; 16];
        data[15] = 4;
        data[14] = 4;
        // two of the four required pad bytes are missing
        assert!(matches!(unpad(&data, 16), Err(Error::BadPadding { .. })));
    }

    #[test]
    fn empty_buffer_is_rejected() {
        assert!(matches!(unpad(&[], 16), Err(Error::BadPadding { .. })));
    }
}
