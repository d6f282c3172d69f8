//! Lookup seam for chain objects.
//!
//! The core never talks to a node. Callers that hold an RPC connection (and
//! whatever caching policy they like) implement [`ObjectFetcher`]; the core
//! only needs it to turn account or asset names into object ids.

use crate::types::error::CodecError;
use crate::types::ids::{ObjectId, ObjectType};
use graphene_derive::Error;
use serde_json::Value as JsonValue;

/// Errors from resolving objects through a fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The fetcher has no object under this id or name.
    #[error("object not found: {0}")]
    NotFound(String),
    /// The fetcher's backend failed.
    #[error("fetch failed: {0}")]
    Backend(String),
    /// The record has no usable `id` field.
    #[error("malformed object record: {0}")]
    MalformedRecord(String),
    #[error(transparent)]
    Codec(CodecError),
}

impl From<CodecError> for FetchError {
    fn from(err: CodecError) -> Self {
        FetchError::Codec(err)
    }
}

/// Synchronous object lookup by id (`1.2.15`) or name (`init0`).
pub trait ObjectFetcher {
    fn fetch(&self, id_or_name: &str) -> Result<JsonValue, FetchError>;
}

impl<F: ObjectFetcher + ?Sized> ObjectFetcher for &F {
    fn fetch(&self, id_or_name: &str) -> Result<JsonValue, FetchError> {
        (**self).fetch(id_or_name)
    }
}

/// True if `s` looks like `a.b.c` with numeric parts rather than a name.
fn looks_like_object_id(s: &str) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

/// Resolves `id_or_name` to an object id of type `expected`.
///
/// Literal ids are parsed and type-checked without calling the fetcher.
/// Anything else is fetched, and the record's `id` field is parsed instead.
pub fn resolve_object_id<F: ObjectFetcher + ?Sized>(
    fetcher: &F,
    id_or_name: &str,
    expected: ObjectType,
) -> Result<ObjectId, FetchError> {
    if looks_like_object_id(id_or_name) {
        return Ok(ObjectId::parse_typed(id_or_name, expected)?);
    }

    let record = fetcher.fetch(id_or_name)?;
    let id = record
        .get("id")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| FetchError::MalformedRecord(format!("{id_or_name}: missing id")))?;
    Ok(ObjectId::parse_typed(id, expected)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;
    use std::collections::HashMap;

    struct FakeFetcher {
        records: HashMap<&'static str, JsonValue>,
        calls: Cell<usize>,
    }

    impl FakeFetcher {
        fn new() -> Self {
            let records = [
                ("init0", json!({"id": "1.2.100", "name": "init0"})),
                ("BTS", json!({"id": "1.3.0", "symbol": "BTS"})),
                ("broken", json!({"name": "broken"})),
            ]
            .into_iter()
            .collect();
            Self {
                records,
                calls: Cell::new(0),
            }
        }
    }

    impl ObjectFetcher for FakeFetcher {
        fn fetch(&self, id_or_name: &str) -> Result<JsonValue, FetchError> {
            self.calls.set(self.calls.get() + 1);
            self.records
                .get(id_or_name)
                .cloned()
                .ok_or_else(|| FetchError::NotFound(id_or_name.to_string()))
        }
    }

    #[test]
    fn literal_id_skips_fetcher() {
        let fetcher = FakeFetcher::new();
        let id = resolve_object_id(&fetcher, "1.2.15", ObjectType::Account).unwrap();
        assert_eq!(id.to_string(), "1.2.15");
        assert_eq!(fetcher.calls.get(), 0);
    }

    #[test]
    fn name_is_fetched() {
        let fetcher = FakeFetcher::new();
        let id = resolve_object_id(&fetcher, "init0", ObjectType::Account).unwrap();
        assert_eq!(id.to_string(), "1.2.100");

        let asset = resolve_object_id(&fetcher, "BTS", ObjectType::Asset).unwrap();
        assert_eq!(asset.to_string(), "1.3.0");
        assert_eq!(fetcher.calls.get(), 2);
    }

    #[test]
    fn type_mismatch_is_reported() {
        let fetcher = FakeFetcher::new();
        assert_eq!(
            resolve_object_id(&fetcher, "BTS", ObjectType::Account),
            Err(FetchError::Codec(CodecError::TypeMismatch {
                expected: 2,
                got: 3
            }))
        );
        assert!(matches!(
            resolve_object_id(&fetcher, "1.3.0", ObjectType::Account),
            Err(FetchError::Codec(CodecError::TypeMismatch { .. }))
        ));
    }

    #[test]
    fn missing_and_malformed() {
        let fetcher = FakeFetcher::new();
        assert_eq!(
            resolve_object_id(&fetcher, "nobody", ObjectType::Account),
            Err(FetchError::NotFound("nobody".to_string()))
        );
        assert!(matches!(
            resolve_object_id(&fetcher, "broken", ObjectType::Account),
            Err(FetchError::MalformedRecord(_))
        ));
    }

    #[test]
    fn id_detection() {
        assert!(looks_like_object_id("1.2.3"));
        assert!(!looks_like_object_id("1.2"));
        assert!(!looks_like_object_id("init0"));
        assert!(!looks_like_object_id("a.b.c"));
    }
}
