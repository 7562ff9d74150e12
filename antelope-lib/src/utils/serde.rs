use serde::{de::Error, Deserialize, Deserializer};

/// Nodes encode 64-bit integers either as JSON numbers or as strings,
/// depending on version and magnitude.
pub fn deserialize_i64_from_string_or_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(i64),
    }

    match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Number(n) => Ok(n),
        StringOrNumber::String(s) => s
            .trim()
            .parse()
            .map_err(|e| D::Error::custom(format!("invalid integer `{}`: {}", s, e))),
    }
}
