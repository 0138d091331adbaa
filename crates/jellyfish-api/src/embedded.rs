// Serde adapters for JSON documents carried inside a JSON string.
//
// The controller encodes pattern configurations (`runPattern.data` and
// `patternFileData.jsonData`) as an escaped JSON string rather than a
// nested object. These adapters apply that extra encoding step to the
// annotated field only; the outer structure is handled by plain derive.

use serde::de::DeserializeOwned;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// What the controller may put in an embedded-JSON slot.
///
/// Firmware emits a string; a bare object is tolerated so hand-written
/// fixtures and older firmware decode too.
#[derive(Deserialize)]
#[serde(untagged)]
enum Slot {
    Text(String),
    Inline(serde_json::Value),
}

fn encode<T: Serialize, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    let text = serde_json::to_string(value).map_err(S::Error::custom)?;
    serializer.serialize_str(&text)
}

/// A field that always carries an embedded document.
pub mod required {
    use super::{DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer, Slot};
    use serde::de::Error as _;

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        super::encode(value, serializer)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: DeserializeOwned,
        D: Deserializer<'de>,
    {
        match Slot::deserialize(deserializer)? {
            Slot::Text(text) => serde_json::from_str(&text).map_err(D::Error::custom),
            Slot::Inline(value) => T::deserialize(value).map_err(D::Error::custom),
        }
    }
}

/// A field where `""` (or `null`, or absence with `#[serde(default)]`)
/// means "no document".
pub mod optional {
    use super::{DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer, Slot};
    use serde::de::Error as _;

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => super::encode(inner, serializer),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: DeserializeOwned,
        D: Deserializer<'de>,
    {
        match Slot::deserialize(deserializer)? {
            Slot::Text(text) if text.trim().is_empty() => Ok(None),
            Slot::Text(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(D::Error::custom),
            Slot::Inline(serde_json::Value::Null) => Ok(None),
            Slot::Inline(value) => T::deserialize(value).map(Some).map_err(D::Error::custom),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
