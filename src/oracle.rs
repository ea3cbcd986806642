/// Black-box access to the system under attack.
///
/// The engine hands the oracle a forged predecessor block followed by the
/// target block (exactly two blocks) and looks at nothing but the verdict:
/// `true` iff the decryption on the other side reported valid PKCS7 padding.
/// The oracle must answer deterministically for the same input within one
/// call to the engine; false positives make the recovery undefined.
pub trait Oracle: Send + Sync {
    fn has_valid_padding(&self, ciphertext: &[u8]) -> bool;
}

/// Any plain predicate closure is an oracle.
impl<F> Oracle for F
where
    F: Fn(&[u8]) -> bool + Send + Sync,
{
    fn has_valid_padding(&self, ciphertext: &[u8]) -> bool {
        self(ciphertext)
    }
}
