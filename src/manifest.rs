//! Stack Manifest - Reproducible Record Of A Resolution
//!
//! The stack hash covers only the deterministic fields (tag, request,
//! paths, blend, engine version), so identical requests against identical
//! layer pools reproduce identical hashes across runs.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::compose::BlendMode;
use crate::ENGINE_VERSION;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackManifest {
    pub id: String,
    pub tag: String,
    pub requested: Vec<String>,
    /// Bottom-to-top composite stack.
    pub paths: Vec<PathBuf>,
    pub blend: BlendMode,
    pub engine_version: String,
    pub created_at: DateTime<Utc>,
    pub stack_hash: String,
}

/// The hashed subset of the manifest. Id and timestamp stay out so the
/// hash is a pure function of the resolution inputs and outputs.
#[derive(Serialize)]
struct HashInput<'a> {
    tag: &'a str,
    requested: &'a [String],
    paths: &'a [PathBuf],
    blend: BlendMode,
    engine_version: &'a str,
}

impl StackManifest {
    pub fn new(
        tag: &str,
        requested: &[String],
        paths: Vec<PathBuf>,
        blend: BlendMode,
    ) -> Result<Self, serde_json::Error> {
        let stack_hash = stack_hash(tag, requested, &paths, blend)?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            tag: tag.to_string(),
            requested: requested.to_vec(),
            paths,
            blend,
            engine_version: ENGINE_VERSION.to_string(),
            created_at: Utc::now(),
            stack_hash,
        })
    }
}

/// SHA-256 over the canonical JSON of the deterministic manifest fields.
pub fn stack_hash(
    tag: &str,
    requested: &[String],
    paths: &[PathBuf],
    blend: BlendMode,
) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(&HashInput {
        tag,
        requested,
        paths,
        blend,
        engine_version: ENGINE_VERSION,
    })?;
    Ok(sha256_hex(canonical.as_bytes()))
}

/// Canonical JSON: object keys sorted, no whitespace.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let value: Value = serde_json::to_value(value)?;
    serde_json::to_string(&sort_value(&value))
}

fn sort_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, inner)| (key.clone(), sort_value(inner)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_value).collect()),
        _ => value.clone(),
    }
}

/// SHA-256 of bytes as a lowercase hex string.
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_json_sorts_keys() {
        let obj = json!({"z": 1, "a": 2, "m": {"b": 1, "a": 2}});
        assert_eq!(
            canonical_json(&obj).unwrap(),
            r#"{"a":2,"m":{"a":2,"b":1},"z":1}"#
        );
    }

    #[test]
    fn stack_hash_is_stable() {
        let requested = vec!["smile".to_string()];
        let paths = vec![PathBuf::from("hero :: all__0.png")];
        let h1 = stack_hash("hero", &requested, &paths, BlendMode::Over).unwrap();
        let h2 = stack_hash("hero", &requested, &paths, BlendMode::Over).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn stack_hash_tracks_inputs() {
        let requested = vec!["smile".to_string()];
        let paths = vec![PathBuf::from("hero :: all__0.png")];
        let h1 = stack_hash("hero", &requested, &paths, BlendMode::Over).unwrap();
        let h2 = stack_hash("hero", &requested, &paths, BlendMode::Multiply).unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn manifest_id_and_timestamp_stay_out_of_hash() {
        let requested = vec!["smile".to_string()];
        let paths = vec![PathBuf::from("hero :: all__0.png")];
        let m1 =
            StackManifest::new("hero", &requested, paths.clone(), BlendMode::Over).unwrap();
        let m2 = StackManifest::new("hero", &requested, paths, BlendMode::Over).unwrap();
        assert_ne!(m1.id, m2.id);
        assert_eq!(m1.stack_hash, m2.stack_hash);
    }
}
