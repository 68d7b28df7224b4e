use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Key material shared by every component that signs or verifies missions.
///
/// The bytes are wiped when the last copy is dropped and never appear in
/// `Debug` output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MissionSecret(Vec<u8>);

impl MissionSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for MissionSecret {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes())
    }
}

impl From<String> for MissionSecret {
    fn from(value: String) -> Self {
        Self::new(value.into_bytes())
    }
}

impl fmt::Debug for MissionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MissionSecret(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_never_prints_key_material() {
        let secret = MissionSecret::from("hunter2");
        let shown = format!("{secret:?}");
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("redacted"));
    }

    #[test]
    fn conversions_keep_bytes() {
        assert_eq!(MissionSecret::from("abc").as_bytes(), b"abc");
        assert_eq!(MissionSecret::from(String::from("abc")).as_bytes(), b"abc");
        assert!(MissionSecret::new(Vec::new()).is_empty());
    }

    #[test]
    fn zeroize_clears_bytes() {
        let mut secret = MissionSecret::from("abc");
        secret.zeroize();
        assert!(secret.is_empty());
    }
}
