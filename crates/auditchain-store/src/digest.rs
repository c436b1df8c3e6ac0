//! SHA-256 digester for entry checksums and export artifacts.

use sha2::{Digest, Sha256};

use auditchain_core::traits::Digester;

/// SHA-256 rendered as a lowercase 64-character hex string.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Digester;

impl Sha256Digester {
    /// Length of every digest this type produces.
    pub const HEX_LEN: usize = 64;
}

impl Digester for Sha256Digester {
    fn algorithm(&self) -> &'static str {
        "sha256"
    }

    fn digest(&self, bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }
}
