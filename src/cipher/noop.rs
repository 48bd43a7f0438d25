/// Identity cipher.
///
/// Used whenever credential protection is disabled. Payloads protected by it
/// are the plaintext.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoOpCipher;

impl NoOpCipher {
    /// Returns `payload` unchanged.
    pub fn encode(&self, payload: &[u8]) -> Vec<u8> {
        payload.to_vec()
    }

    /// Returns `protected` unchanged.
    pub fn decode(&self, protected: &[u8]) -> Vec<u8> {
        protected.to_vec()
    }
}
