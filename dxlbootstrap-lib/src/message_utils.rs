//! Messaging related utility functions.
//!
//! Payloads are always UTF-8 encoded.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::MessageError;
use crate::message::Message;

/// Converts `value` to a JSON string.
///
/// Pretty printing sorts object keys and indents with four spaces.
pub fn value_to_json<T: Serialize + ?Sized>(
    value: &T,
    pretty_print: bool,
) -> Result<String, MessageError> {
    if !pretty_print {
        return Ok(serde_json::to_string(value)?);
    }

    let value = sort_keys(serde_json::to_value(value)?);
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8(out)?)
}

// Rebuilds objects with their keys in sorted order.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Parses a JSON string, ignoring trailing NUL characters.
pub fn json_to_value(json: &str) -> Result<Value, MessageError> {
    json_to(json)
}

pub fn json_to<T: DeserializeOwned>(json: &str) -> Result<T, MessageError> {
    Ok(serde_json::from_str(json.trim_end_matches('\0'))?)
}

/// Serializes `value` to JSON and places it in the message payload.
pub fn to_json_payload<T: Serialize + ?Sized>(
    message: &mut Message,
    value: &T,
) -> Result<(), MessageError> {
    let json = value_to_json(value, false)?;
    encode_payload(message, &json);
    Ok(())
}

pub fn json_payload_to<T: DeserializeOwned>(message: &Message) -> Result<T, MessageError> {
    json_to(&decode_payload(message)?)
}

pub fn json_payload_to_value(message: &Message) -> Result<Value, MessageError> {
    json_payload_to(message)
}

pub fn encode_payload(message: &mut Message, value: &str) {
    message.payload = encode(value);
}

pub fn decode_payload(message: &Message) -> Result<String, MessageError> {
    decode(&message.payload)
}

pub fn encode(value: &str) -> Vec<u8> {
    value.as_bytes().to_vec()
}

pub fn decode(value: &[u8]) -> Result<String, MessageError> {
    Ok(String::from_utf8(value.to_vec())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_pretty_print_sorts_and_indents() {
        let value = json!({"b": 1, "a": {"d": true, "c": "x"}});
        let pretty = value_to_json(&value, true).unwrap();
        assert_eq!(
            pretty,
            "{\n    \"a\": {\n        \"c\": \"x\",\n        \"d\": true\n    },\n    \"b\": 1\n}"
        );
    }

    #[test]
    fn test_compact_json() {
        let compact = value_to_json(&json!({"key": [1, 2]}), false).unwrap();
        assert_eq!(compact, "{\"key\":[1,2]}");
    }

    #[test]
    fn test_trailing_nul_is_ignored() {
        let value = json_to_value("{\"host\":\"example.com\"}\0\0").unwrap();
        assert_eq!(value["host"], "example.com");
    }

    #[test]
    fn test_typed_payload() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Lookup {
            host: String,
            port: u16,
        }

        let mut message = Message::request("/lookup");
        let lookup = Lookup { host: "10.0.0.1".into(), port: 8883 };
        to_json_payload(&mut message, &lookup).unwrap();

        let decoded: Lookup = json_payload_to(&message).unwrap();
        assert_eq!(decoded, lookup);
    }

    #[test]
    fn test_invalid_utf8_payload() {
        let mut message = Message::event("/e");
        message.payload = vec![0xff, 0xfe];
        assert!(matches!(decode_payload(&message), Err(MessageError::Encoding(_))));
    }

    #[test]
    fn test_invalid_json_payload() {
        let mut message = Message::event("/e");
        encode_payload(&mut message, "not json");
        assert!(matches!(json_payload_to_value(&message), Err(MessageError::Json(_))));
    }
}
