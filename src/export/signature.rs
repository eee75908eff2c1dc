//! Typed-name signature pad for terminals without freehand input

use super::SignaturePad;

/// Signature made of the signer's typed name
#[derive(Debug, Clone, Default)]
pub struct TypedSignature {
    text: String,
}

impl TypedSignature {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SignaturePad for TypedSignature {
    fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    fn serialize(&self) -> Option<String> {
        (!self.is_empty()).then(|| self.text.clone())
    }

    fn deserialize(&mut self, payload: Option<String>) {
        self.text = payload.unwrap_or_default();
    }

    fn clear(&mut self) {
        self.text.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed(text: &str) -> TypedSignature {
        let mut pad = TypedSignature::new();
        pad.deserialize(Some(text.to_string()));
        pad
    }

    #[test]
    fn test_new_is_empty() {
        let pad = TypedSignature::new();
        assert!(pad.is_empty());
        assert!(pad.serialize().is_none());
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        let pad = signed("  ");
        assert!(pad.is_empty());
        assert!(pad.serialize().is_none());
    }

    #[test]
    fn test_serialize_round_trips_payload() {
        let payload = signed("Jane Q").serialize();
        assert_eq!(payload.as_deref(), Some("Jane Q"));

        let mut restored = TypedSignature::new();
        restored.deserialize(payload);
        assert_eq!(restored.serialize().as_deref(), Some("Jane Q"));
    }

    #[test]
    fn test_deserialize_none_clears() {
        let mut pad = signed("x");
        pad.deserialize(None);
        assert!(pad.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut pad = signed("ab");
        pad.clear();
        assert!(pad.is_empty());
    }
}
