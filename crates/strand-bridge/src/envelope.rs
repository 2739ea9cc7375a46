//! Wire form of objects and of the `get` request/response.
//!
//! An envelope is a flat JSON map of the object's data fields plus the
//! reserved `type`, `owner`, and `stream` fields and a synthesized `_hash`.

use serde::{Deserialize, Serialize};
use strand_types::object::{HASH_FIELD, OWNER_FIELD, STREAM_FIELD, TYPE_FIELD};
use strand_types::{Object, ObjectDraft, ObjectHash, OwnerSpec, Value};

use crate::error::{BridgeError, BridgeResult};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetRequest {
    pub lookups: Vec<String>,
    pub order_by: String,
    pub order_dir: String,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResponse {
    /// Each entry is one encoded envelope.
    pub object_bodies: Vec<String>,
}

/// Envelope map for an object, `_hash` included.
pub fn to_map(object: &Object) -> serde_json::Map<String, Value> {
    let mut map: serde_json::Map<String, Value> = object
        .data()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    map.insert(TYPE_FIELD.into(), Value::from(object.object_type()));
    if let Some(owner) = object.owner() {
        map.insert(OWNER_FIELD.into(), Value::from(owner.as_str()));
    }
    if let Some(stream) = object.stream() {
        map.insert(STREAM_FIELD.into(), Value::from(stream.as_str()));
    }
    map.insert(HASH_FIELD.into(), Value::from(object.hash().as_str()));
    map
}

pub fn encode(object: &Object) -> BridgeResult<Vec<u8>> {
    Ok(serde_json::to_vec(&to_map(object))?)
}

/// Parse a caller envelope. A supplied `_hash` is dropped, not checked.
pub fn decode(bytes: &[u8]) -> BridgeResult<ObjectDraft> {
    let Value::Object(mut map) = serde_json::from_slice::<Value>(bytes)? else {
        return Err(BridgeError::InvalidPayload(
            "envelope must be a JSON object".into(),
        ));
    };
    map.remove(HASH_FIELD);

    let object_type = match map.remove(TYPE_FIELD) {
        Some(Value::String(t)) => t,
        _ => return Err(BridgeError::InvalidPayload("envelope needs a string `type`".into())),
    };
    let owner = optional_string(&mut map, OWNER_FIELD)?.map(|o| OwnerSpec::parse(&o));
    let stream = optional_string(&mut map, STREAM_FIELD)?.map(ObjectHash::new);

    Ok(ObjectDraft {
        object_type,
        owner,
        stream,
        data: map.into_iter().collect(),
    })
}

fn optional_string(
    map: &mut serde_json::Map<String, Value>,
    field: &str,
) -> BridgeResult<Option<String>> {
    match map.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(BridgeError::InvalidPayload(format!("`{field}` must be a string"))),
    }
}
