//! Stable fingerprints for step requests.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Returns a hex SHA-256 digest of `value`'s JSON encoding.
///
/// Used to tell whether a journaled attempt belongs to the same call.
#[must_use]
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> String {
    let json = serde_json::to_string(value).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        let a = fingerprint(&serde_json::json!({"symbol": "TP53"}));
        let b = fingerprint(&serde_json::json!({"symbol": "TP53"}));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_fingerprint_differs_by_arguments() {
        let a = fingerprint(&serde_json::json!({"symbol": "TP53"}));
        let b = fingerprint(&serde_json::json!({"symbol": "TYMS"}));
        assert_ne!(a, b);
    }
}
