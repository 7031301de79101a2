//! Serde helper for integers the beacon API encodes as decimal strings.

use serde::{Deserializer, de};
use std::fmt;

struct QuotedU64Visitor;

impl de::Visitor<'_> for QuotedU64Visitor {
    type Value = u64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an unsigned integer or a decimal string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
        Ok(v)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
        v.parse().map_err(E::custom)
    }
}

pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    deserializer.deserialize_any(QuotedU64Visitor)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Wrapper {
        #[serde(deserialize_with = "super::deserialize")]
        value: u64,
    }

    #[test]
    fn test_quoted_and_plain() {
        let quoted: Wrapper = serde_json::from_str(r#"{"value":"42"}"#).unwrap();
        assert_eq!(quoted.value, 42);
        let plain: Wrapper = serde_json::from_str(r#"{"value":7}"#).unwrap();
        assert_eq!(plain.value, 7);
        assert!(serde_json::from_str::<Wrapper>(r#"{"value":"x"}"#).is_err());
    }
}
