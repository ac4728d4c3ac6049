use crate::errors::{CoreError, Result};

/// Serializes a value to a single JSON line with canonical error handling.
pub fn to_json_line<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|err| CoreError::Serialization(err.to_string()))
}

/// Deserializes JSON bytes.
pub fn from_json_bytes<T: serde::de::DeserializeOwned>(input: &[u8]) -> Result<T> {
    serde_json::from_slice(input).map_err(|err| CoreError::Deserialization(err.to_string()))
}
