//! Sample - one decoded telemetry message
//!
//! Wire format: one JSON object per line mapping field name -> number, e.g.
//! `{"temp_j1": 41.2, "temp_j2": 39.8, "payload": 2.5}`.

use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::logic::error::DecodeError;

// ============================================================================
// SAMPLE
// ============================================================================

/// Timestamped feature vector. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub id: Uuid,
    /// Field names, parallel to `values`
    pub fields: Vec<String>,
    pub values: Vec<f32>,
    pub received_at: DateTime<Utc>,
    /// Producer connection, if the sample came off the wire
    pub origin: Option<SocketAddr>,
}

impl Sample {
    pub fn new(fields: Vec<String>, values: Vec<f32>, origin: Option<SocketAddr>) -> Self {
        debug_assert_eq!(fields.len(), values.len());
        Self {
            id: Uuid::new_v4(),
            fields,
            values,
            received_at: Utc::now(),
            origin,
        }
    }

    /// Build from bare values, naming fields `f0..fN`
    pub fn from_values(values: Vec<f32>) -> Self {
        let fields = (0..values.len()).map(|i| format!("f{}", i)).collect();
        Self::new(fields, values, None)
    }

    /// Feature vector handed to the scorer
    pub fn features(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named field
    pub fn get(&self, field: &str) -> Option<f32> {
        self.fields
            .iter()
            .position(|f| f == field)
            .map(|i| self.values[i])
    }
}

// ============================================================================
// DECODER
// ============================================================================

/// Turns a frame into a `Sample`.
///
/// Without a layout every (non-ignored) field must be numeric and features are
/// taken in wire order. With a layout exactly the layout fields are taken, in
/// layout order; unknown fields are ignored.
#[derive(Debug, Clone, Default)]
pub struct SampleDecoder {
    layout: Option<Vec<String>>,
    ignored: Vec<String>,
}

impl SampleDecoder {
    pub fn new(layout: Option<Vec<String>>, ignored: Vec<String>) -> Self {
        Self { layout, ignored }
    }

    pub fn layout(&self) -> Option<&[String]> {
        self.layout.as_deref()
    }

    /// Decode a raw frame (without the trailing newline)
    pub fn decode_frame(
        &self,
        frame: &[u8],
        origin: Option<SocketAddr>,
    ) -> Result<Sample, DecodeError> {
        let text = std::str::from_utf8(frame).map_err(|_| DecodeError::NotUtf8)?;
        self.decode_str(text, origin)
    }

    pub fn decode_str(&self, text: &str, origin: Option<SocketAddr>) -> Result<Sample, DecodeError> {
        let value: Value = serde_json::from_str(text.trim())?;
        let object = match value {
            Value::Object(map) => map,
            other => return Err(DecodeError::NotAnObject(json_kind(&other))),
        };

        let (fields, values) = match &self.layout {
            Some(layout) => {
                let mut fields = Vec::with_capacity(layout.len());
                let mut values = Vec::with_capacity(layout.len());
                for name in layout.iter().filter(|n| !self.is_ignored(n)) {
                    let raw = object
                        .get(name)
                        .ok_or_else(|| DecodeError::MissingField(name.clone()))?;
                    values.push(as_feature(name, raw)?);
                    fields.push(name.clone());
                }
                (fields, values)
            }
            None => {
                let mut fields = Vec::with_capacity(object.len());
                let mut values = Vec::with_capacity(object.len());
                for (name, raw) in object.iter() {
                    if self.is_ignored(name) {
                        continue;
                    }
                    values.push(as_feature(name, raw)?);
                    fields.push(name.clone());
                }
                (fields, values)
            }
        };

        if values.is_empty() {
            return Err(DecodeError::Empty);
        }

        Ok(Sample::new(fields, values, origin))
    }

    fn is_ignored(&self, field: &str) -> bool {
        self.ignored.iter().any(|f| f == field)
    }
}

fn as_feature(name: &str, raw: &Value) -> Result<f32, DecodeError> {
    raw.as_f64()
        .map(|v| v as f32)
        .filter(|v| v.is_finite())
        .ok_or_else(|| DecodeError::NotNumeric(name.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_keeps_wire_order() {
        let decoder = SampleDecoder::default();
        let sample = decoder
            .decode_str(r#"{"sensor_3": 0.8, "sensor_1": 0.5, "sensor_2": 0.3}"#, None)
            .unwrap();

        assert_eq!(sample.fields, vec!["sensor_3", "sensor_1", "sensor_2"]);
        assert_eq!(sample.features(), &[0.8, 0.5, 0.3]);
        assert_eq!(sample.get("sensor_1"), Some(0.5));
    }

    #[test]
    fn test_decode_with_layout() {
        let decoder = SampleDecoder::new(
            Some(vec!["b".into(), "a".into()]),
            vec!["Time".into()],
        );
        let sample = decoder
            .decode_str(r#"{"a": 1, "Time": 12.5, "b": 2, "extra": "x"}"#, None)
            .unwrap();
        assert_eq!(sample.features(), &[2.0, 1.0]);

        let err = decoder.decode_str(r#"{"a": 1}"#, None).unwrap_err();
        assert!(matches!(err, DecodeError::MissingField(f) if f == "b"));
    }

    #[test]
    fn test_ignored_fields_are_skipped() {
        let decoder = SampleDecoder::new(None, vec!["Time".into()]);
        let sample = decoder.decode_str(r#"{"Time": 3.0, "x": 1.5}"#, None).unwrap();
        assert_eq!(sample.fields, vec!["x"]);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        let decoder = SampleDecoder::default();

        assert!(matches!(decoder.decode_str("{not json", None), Err(DecodeError::Json(_))));
        assert!(matches!(decoder.decode_str("[1, 2]", None), Err(DecodeError::NotAnObject("array"))));
        assert!(matches!(decoder.decode_str(r#"{"a": "hot"}"#, None), Err(DecodeError::NotNumeric(_))));
        assert!(matches!(decoder.decode_str("{}", None), Err(DecodeError::Empty)));
        assert!(matches!(decoder.decode_frame(&[0xff, 0xfe], None), Err(DecodeError::NotUtf8)));
    }
}
