//! Status payloads and their wire framing
//!
//! Every update is sent as one line: a single-member JSON object mapping the
//! camera key to its state, followed by `\n`. Separators are `", "` and `": "`
//! so the bytes match what existing viewers already parse.

use std::io;

use bytes::Bytes;
use serde::ser::{SerializeMap, Serializer as _};
use serde_json::ser::Formatter;
use serde_json::Value;

use crate::error::Result;

/// Line terminator for framed messages
pub const FRAME_DELIMITER: u8 = b'\n';

/// One status update for a camera
///
/// Immutable once built; lives for a single publish pass.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusPayload {
    key: String,
    value: Value,
}

impl StatusPayload {
    /// Create a payload for `key`
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Camera/stream key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Occupancy state
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Serialize into a framed message
    pub fn encode(&self) -> Result<Bytes> {
        let mut buf = Vec::with_capacity(64);
        {
            let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
            let mut map = (&mut ser).serialize_map(Some(1))?;
            map.serialize_entry(&self.key, &self.value)?;
            map.end()?;
        }
        buf.push(FRAME_DELIMITER);

        Ok(Bytes::from(buf))
    }
}

/// Compact JSON with a space after `,` and `:`
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_encode_simple() {
        let payload = StatusPayload::new("cam1", json!({"available_slots": 3}));

        let frame = payload.encode().unwrap();
        assert_eq!(&frame[..], b"{\"cam1\": {\"available_slots\": 3}}\n");
    }

    #[test]
    fn test_encode_nested_keeps_order() {
        let payload = StatusPayload::new(
            "cam2",
            json!({
                "items": {"1": {"status": true}, "2": {"status": false}},
                "filled_slots": [1, 4]
            }),
        );

        let frame = payload.encode().unwrap();
        assert_eq!(
            std::str::from_utf8(&frame).unwrap(),
            "{\"cam2\": {\"items\": {\"1\": {\"status\": true}, \"2\": {\"status\": false}}, \
             \"filled_slots\": [1, 4]}}\n"
        );
    }

    #[test]
    fn test_encode_empty_state() {
        let frame = StatusPayload::new("cam1", json!({})).encode().unwrap();
        assert_eq!(&frame[..], b"{\"cam1\": {}}\n");
    }

    #[test]
    fn test_encode_escapes_key_and_keeps_utf8() {
        let frame = StatusPayload::new("c\"am", json!("bãi đỗ")).encode().unwrap();
        assert_eq!(
            std::str::from_utf8(&frame).unwrap(),
            "{\"c\\\"am\": \"bãi đỗ\"}\n"
        );
    }

    #[test]
    fn test_single_delimiter() {
        let frame = StatusPayload::new("cam1", json!("line\nbreak")).encode().unwrap();
        assert_eq!(frame.iter().filter(|b| **b == FRAME_DELIMITER).count(), 1);
        assert_eq!(frame.last(), Some(&FRAME_DELIMITER));
    }
}
