//! JSON encoding of whole tables.
//!
//! A table is a JSON object mapping decimal string ids to records:
//! `{"1": {"id": 1, "body": "hello", "author": 3}}`.

use std::collections::BTreeMap;

use chirpy_types::models::{Post, User};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// A row type that can live in a table.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Name used in logs and errors.
    const TABLE: &'static str;

    fn id(&self) -> u64;
}

impl Record for Post {
    const TABLE: &'static str = "chirps";

    fn id(&self) -> u64 {
        self.id
    }
}

impl Record for User {
    const TABLE: &'static str = "users";

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed table JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("key {key} does not match record id {id}")]
    IdMismatch { key: u64, id: u64 },

    #[error("record id {id} leaves no room for new ids")]
    IdSpaceExhausted { id: u64 },
}

pub fn encode<T: Record>(table: &BTreeMap<u64, T>) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec_pretty(table)?)
}

/// Decode a table, rejecting unknown fields and keys that disagree with ids.
pub fn decode<T: Record>(bytes: &[u8]) -> Result<BTreeMap<u64, T>, CodecError> {
    let table: BTreeMap<u64, T> = serde_json::from_slice(bytes)?;
    if let Some((&key, record)) = table.iter().find(|(key, record)| **key != record.id()) {
        return Err(CodecError::IdMismatch {
            key,
            id: record.id(),
        });
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: u64, body: &str, author: Option<u64>) -> Post {
        Post {
            id,
            body: body.to_string(),
            author,
        }
    }

    #[test]
    fn test_round_trip_posts() {
        let table: BTreeMap<u64, Post> = [
            (1, post(1, "first", Some(1))),
            (2, post(2, "no author", None)),
            (10, post(10, "unicode ✓ \"quoted\"", Some(4))),
        ]
        .into_iter()
        .collect();

        let bytes = encode(&table).unwrap();
        assert_eq!(decode::<Post>(&bytes).unwrap(), table);
    }

    #[test]
    fn test_round_trip_users() {
        let user = User {
            id: 3,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "$argon2id$v=19$m=8,t=1,p=1$c2FsdA$aGFzaA".to_string(),
            is_chirpy_premium: true,
        };
        let table: BTreeMap<u64, User> = [(3, user)].into_iter().collect();

        let bytes = encode(&table).unwrap();
        assert_eq!(decode::<User>(&bytes).unwrap(), table);
    }

    #[test]
    fn test_round_trip_empty() {
        let table: BTreeMap<u64, Post> = BTreeMap::new();
        let bytes = encode(&table).unwrap();
        assert_eq!(bytes, b"{}");
        assert!(decode::<Post>(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_layout_uses_string_keys_and_field_names() {
        let table: BTreeMap<u64, Post> = [(5, post(5, "hi", Some(2)))].into_iter().collect();
        let value: serde_json::Value = serde_json::from_slice(&encode(&table).unwrap()).unwrap();

        assert_eq!(
            value,
            serde_json::json!({"5": {"id": 5, "body": "hi", "author": 2}})
        );
    }

    #[test]
    fn test_decode_rejects_malformed() {
        let inputs: [&[u8]; 5] = [
            b"",
            b"[]",
            b"{",
            br#"{"x": {}}"#,
            br#"{"abc": {"id": 1, "body": "b"}}"#,
        ];
        for input in inputs {
            assert!(matches!(decode::<Post>(input), Err(CodecError::Json(_))));
        }
    }

    #[test]
    fn test_decode_rejects_unknown_fields() {
        let input = br#"{"1": {"id": 1, "body": "b", "likes": 4}}"#;
        assert!(matches!(decode::<Post>(input), Err(CodecError::Json(_))));
    }

    #[test]
    fn test_decode_rejects_id_mismatch() {
        let input = br#"{"1": {"id": 2, "body": "b"}}"#;
        assert!(matches!(
            decode::<Post>(input),
            Err(CodecError::IdMismatch { key: 1, id: 2 })
        ));
    }
}
