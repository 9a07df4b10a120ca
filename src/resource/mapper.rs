//! Field mapping between local state and Morpheus payloads
//!
//! Every resource type provides a [`FieldMapper`]: its schema, the
//! collection it lives in, and the two pure translations
//!
//! - `encode`: planned [`LocalState`] → request body
//! - `decode`: typed remote record → [`LocalState`] fields
//!
//! The helpers below cover the encodings that repeat across types.

use super::schema::{ChangeSet, Schema};
use super::state::LocalState;
use crate::morpheus::api::Collection;
use crate::morpheus::models::RemoteEntity;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub trait FieldMapper: Send + Sync {
    /// Decoded form of the record under the collection's entity key
    type Entity: DeserializeOwned + RemoteEntity + Send;

    /// Human readable kind, used in messages ("option list")
    fn kind(&self) -> &'static str;

    fn schema(&self) -> &'static Schema;

    fn collection(&self) -> Collection;

    /// Build the request body. `changes` is `None` on create.
    fn encode(&self, planned: &LocalState, changes: Option<&ChangeSet>) -> Value;

    /// Write the record's attributes into `state`
    fn decode(&self, entity: &Self::Entity, state: &mut LocalState);
}

/// Morpheus checkbox style flag
pub fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

/// Only the exact `"on"` sentinel is true
pub fn is_on(value: &str) -> bool {
    value == "on"
}

/// [`is_on`] for loosely typed JSON attributes
pub fn is_on_value(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if is_on(s))
}

/// Set field as a JSON array, always present (empty when unset)
pub fn string_array(state: &LocalState, field: &str) -> Value {
    Value::Array(state.get_set(field).into_iter().map(Value::String).collect())
}

/// Value to keep in local state for a write-only secret.
///
/// The appliance's own digest wins. When it sends none, the digest already
/// held in state is kept; state never holds plaintext (see
/// [`Schema::seal_secrets`](super::schema::Schema::seal_secrets)).
pub fn secret_digest(remote_hash: &str, stored: &str) -> String {
    if !remote_hash.is_empty() {
        return remote_hash.to_ascii_lowercase();
    }
    stored.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::schema::sha256_hex;
    use serde_json::json;

    #[test]
    fn test_on_off_round_trip() {
        assert!(is_on(on_off(true)));
        assert!(!is_on(on_off(false)));
    }

    #[test]
    fn test_only_exact_on_is_true() {
        assert!(!is_on("ON"));
        assert!(!is_on("true"));
        assert!(!is_on(""));
        assert!(is_on_value(Some(&json!("on"))));
        assert!(!is_on_value(Some(&json!(true))));
        assert!(!is_on_value(Some(&Value::Null)));
        assert!(!is_on_value(None));
    }

    #[test]
    fn test_string_array_defaults_to_empty() {
        let state = LocalState::new();
        assert_eq!(string_array(&state, "labels"), json!([]));

        let state = state.with("labels", vec!["prod".to_string(), "db".to_string()]);
        assert_eq!(string_array(&state, "labels"), json!(["db", "prod"]));
    }

    #[test]
    fn test_secret_digest_sources() {
        let digest = sha256_hex("S3cr3t!");
        let other = sha256_hex("hunter2");
        assert_eq!(secret_digest(&digest.to_uppercase(), &other), digest);
        assert_eq!(secret_digest("", &other), other);
        assert_eq!(secret_digest("", ""), "");
    }
}
