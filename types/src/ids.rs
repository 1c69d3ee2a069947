use std::fmt;

/// Stable identity of a host document.
///
/// The host hands out one id per open buffer and never reuses it while the
/// buffer is alive. Every per-document map in Clarion is keyed by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct DocumentId(u64);

impl DocumentId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::DocumentId;

    #[test]
    fn test_display() {
        assert_eq!(DocumentId::new(7).to_string(), "doc#7");
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_value(DocumentId::new(42)).unwrap();
        assert_eq!(json, serde_json::json!(42));
        let back: DocumentId = serde_json::from_value(json).unwrap();
        assert_eq!(back.value(), 42);
    }
}
