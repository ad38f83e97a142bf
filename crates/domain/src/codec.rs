//! Payload encoding helpers for typed repositories.

use serde::{Serialize, de::DeserializeOwned};
use store::Document;

use crate::error::Result;

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(doc: &Document) -> Result<T> {
    Ok(doc.decode()?)
}
