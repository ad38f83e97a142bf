use chrono::{DateTime, Utc};
use common::Version;
use serde::{Deserialize, Serialize};

/// A stored document: a JSON payload plus the bookkeeping needed for
/// optimistic concurrency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// The collection this document belongs to (e.g. `"orders"`).
    pub collection: String,

    /// The document key, unique within its collection.
    pub id: String,

    /// Current version; incremented by every successful write.
    pub version: Version,

    /// The document body.
    pub payload: serde_json::Value,

    /// When the document was last written.
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Decodes the payload into a typed value.
    pub fn decode<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_typed_payload() {
        let doc = Document {
            collection: "orders".to_string(),
            id: "o-1".to_string(),
            version: Version::first(),
            payload: serde_json::json!({"a": 1, "b": "two"}),
            updated_at: Utc::now(),
        };

        #[derive(Deserialize)]
        struct Body {
            a: i32,
            b: String,
        }

        let body: Body = doc.decode().unwrap();
        assert_eq!(body.a, 1);
        assert_eq!(body.b, "two");
    }
}
