use sha2::{Digest, Sha256};

use crate::constants::identity::IDENTITY_DELIMITER;
use crate::schema::UnifiedRecord;
use crate::types::IdentityKey;

/// Hex SHA-256 over `parts` joined by the identity delimiter.
pub fn digest_joined(parts: &[&str]) -> IdentityKey {
    let mut hasher = Sha256::new();
    for (idx, part) in parts.iter().enumerate() {
        if idx > 0 {
            hasher.update(IDENTITY_DELIMITER.as_bytes());
        }
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Identity key of a record: digest of `(source, title, prompt)`.
///
/// `dataset_id` is not part of identity.
pub fn identity_key(record: &UnifiedRecord) -> IdentityKey {
    digest_joined(&[&record.source, &record.title, &record.prompt])
}

/// Shuffle bucket for an identity key, in `0..buckets`.
pub fn bucket_for(key: &str, buckets: usize) -> usize {
    if buckets <= 1 {
        return 0;
    }
    let prefix = key.get(..16).unwrap_or(key);
    let value = u64::from_str_radix(prefix, 16).unwrap_or(0);
    (value % buckets as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(source: &str, title: &str, prompt: &str, id: &str) -> UnifiedRecord {
        UnifiedRecord {
            source: source.to_string(),
            dataset_id: id.to_string(),
            title: title.to_string(),
            prompt: prompt.to_string(),
            ..UnifiedRecord::default()
        }
    }

    #[test]
    fn identity_ignores_dataset_id_and_other_columns() {
        let mut a = record("APPS", "Two Sum", "Add two numbers together.", "1");
        let b = record("APPS", "Two Sum", "Add two numbers together.", "2");
        a.solution = "print(3)".to_string();
        assert_eq!(identity_key(&a), identity_key(&b));
        assert_eq!(identity_key(&a).len(), 64);
    }

    #[test]
    fn identity_distinguishes_field_boundaries() {
        let a = record("ab", "c", "prompt", "");
        let b = record("a", "bc", "prompt", "");
        assert_ne!(identity_key(&a), identity_key(&b));
        let c = record("APPS", "Two Sum", "Add two numbers.", "");
        let d = record("APPS", "Two Sum", "Add two numbers!", "");
        assert_ne!(identity_key(&c), identity_key(&d));
    }

    #[test]
    fn digest_matches_known_sha256() {
        assert_eq!(
            digest_joined(&["abc"]),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn digest_joined_is_lowercase_hex_of_the_delimited_text() {
        let key = digest_joined(&["APPS", "Two Sum"]);
        assert_eq!(key, digest_joined(&["APPS\u{1f}Two Sum"]));
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|ch| matches!(ch, '0'..='9' | 'a'..='f')));
    }

    #[test]
    fn bucket_for_stays_in_range() {
        let key = identity_key(&record("APPS", "t", "p", ""));
        for buckets in [1, 2, 7, 16] {
            assert!(bucket_for(&key, buckets) < buckets);
        }
        assert_eq!(bucket_for(&key, 0), 0);
        assert_eq!(bucket_for(&key, 4), bucket_for(&key, 4));
    }
}
