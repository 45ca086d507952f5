// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Serde helpers that carry byte fields as base64 strings, so JSON and YAML
//! documents stay readable and lossless for opaque payloads.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub fn serialize_slice<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    STANDARD.encode(bytes).serialize(serializer)
}

/// Custom serializer for bytes::Bytes to base64 string
pub fn serialize<S>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serialize_slice(bytes, serializer)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
where
    D: Deserializer<'de>,
{
    let encoded = String::deserialize(deserializer)?;
    STANDARD.decode(encoded.trim()).map(Bytes::from).map_err(serde::de::Error::custom)
}

/// Same as the parent module, for `Option<Bytes>` fields.
pub mod option {
    use super::{Bytes, Deserialize, Deserializer, Engine, Serializer, STANDARD};

    #[allow(clippy::ref_option)]
    pub fn serialize<S>(bytes: &Option<Bytes>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match bytes {
            Some(bytes) => super::serialize_slice(bytes, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Bytes>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|encoded| STANDARD.decode(encoded.trim()).map(Bytes::from))
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[derive(Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "super")]
        data: Bytes,
        #[serde(default, with = "super::option")]
        extra: Option<Bytes>,
    }

    #[test]
    fn test_base64_round_trip_with_binary_content() {
        let holder = Holder { data: Bytes::from_static(&[0, 0xff, b'A']), extra: None };
        let json = serde_json::to_string(&holder).unwrap();
        assert_eq!(json, r#"{"data":"AP9B","extra":null}"#);

        let back: Holder = serde_json::from_str(&json).unwrap();
        assert_eq!(&back.data[..], &[0, 0xff, b'A']);
        assert!(back.extra.is_none());
    }

    #[test]
    fn test_missing_optional_field_defaults_to_none() {
        let back: Holder = serde_json::from_str(r#"{"data":""}"#).unwrap();
        assert!(back.data.is_empty());
        assert!(back.extra.is_none());
    }
}
