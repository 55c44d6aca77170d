use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use crate::domain::{error::DecodeError, models::FileToProcess};

/// Standard alphabet; pub/sub publishers are inconsistent about padding.
const TRANSPORT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Turns a push-delivery envelope into the object to reconcile.
pub fn decode_envelope(envelope: Option<&Value>) -> Result<FileToProcess, DecodeError> {
    let envelope = envelope
        .filter(|value| is_truthy(value))
        .ok_or(DecodeError::MissingMessage)?;

    let message = envelope
        .as_object()
        .and_then(|envelope| envelope.get("message"))
        .and_then(Value::as_object)
        .ok_or(DecodeError::InvalidEnvelope)?;

    let data = message
        .get("data")
        .filter(|value| is_truthy(value))
        .ok_or(DecodeError::MissingData)?;
    let data = data.as_str().ok_or(DecodeError::InvalidEncoding)?;

    let text = decode_transport(data)?;
    debug!("Decoded message data: {}", text);

    let payload: Value = serde_json::from_str(&text).map_err(|e| {
        warn!("Message data is not valid JSON: {}", e);
        DecodeError::InvalidPayload
    })?;

    let payload = payload.as_object();
    let bucket = required_field(payload, "bucket")?;
    let filename = required_field(payload, "filename")?;

    Ok(FileToProcess { bucket, filename })
}

fn decode_transport(data: &str) -> Result<String, DecodeError> {
    match TRANSPORT.decode(data.trim()) {
        Ok(bytes) => String::from_utf8(bytes).map_err(|_| {
            warn!("Decoded message data is not UTF-8");
            DecodeError::InvalidEncoding
        }),
        Err(e) if data.trim_start().starts_with('{') => {
            debug!("Message data is not base64 ({}), treating it as plain JSON", e);
            Ok(data.to_string())
        }
        Err(e) => {
            warn!("Message data is not valid base64: {}", e);
            Err(DecodeError::InvalidEncoding)
        }
    }
}

fn required_field(
    payload: Option<&Map<String, Value>>,
    field: &'static str,
) -> Result<String, DecodeError> {
    payload
        .and_then(|payload| payload.get(field))
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or(DecodeError::MissingField(field))
}

/// Empty containers, empty strings, `false`, zero and `null` all count as absent.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use serde_json::json;

    fn envelope_for(payload: &Value) -> Value {
        json!({
            "message": {
                "data": STANDARD.encode(payload.to_string()),
                "messageId": "123456",
                "publishTime": "2023-01-01T00:00:00Z"
            }
        })
    }

    #[test]
    fn decodes_base64_payload() {
        let envelope = envelope_for(&json!({"bucket": "test-bucket", "filename": "test-file.csv"}));
        let file = decode_envelope(Some(&envelope)).unwrap();
        assert_eq!(file.bucket, "test-bucket");
        assert_eq!(file.filename, "test-file.csv");
    }

    #[test]
    fn accepts_unpadded_base64_and_plain_json() {
        let payload = json!({"bucket": "b", "filename": "f.csv"}).to_string();
        let unpadded = base64::engine::general_purpose::STANDARD_NO_PAD.encode(&payload);
        let envelope = json!({"message": {"data": unpadded}});
        assert_eq!(decode_envelope(Some(&envelope)).unwrap().bucket, "b");

        let envelope = json!({"message": {"data": payload}});
        assert_eq!(decode_envelope(Some(&envelope)).unwrap().filename, "f.csv");
    }

    #[test]
    fn missing_or_empty_envelope() {
        assert_eq!(decode_envelope(None), Err(DecodeError::MissingMessage));
        assert_eq!(decode_envelope(Some(&json!({}))), Err(DecodeError::MissingMessage));
        assert_eq!(decode_envelope(Some(&Value::Null)), Err(DecodeError::MissingMessage));
        assert_eq!(decode_envelope(Some(&json!(""))), Err(DecodeError::MissingMessage));
    }

    #[test]
    fn envelope_without_message_mapping() {
        for envelope in [
            json!("not_a_dict"),
            json!({"not_message": {}}),
            json!({"message": "text"}),
            json!([1, 2]),
        ] {
            assert_eq!(decode_envelope(Some(&envelope)), Err(DecodeError::InvalidEnvelope));
        }
    }

    #[test]
    fn message_without_data() {
        for envelope in [
            json!({"message": {"not_data": "x"}}),
            json!({"message": {"data": ""}}),
            json!({"message": {"data": null}}),
            json!({"message": {}}),
        ] {
            assert_eq!(decode_envelope(Some(&envelope)), Err(DecodeError::MissingData));
        }
    }

    #[test]
    fn data_that_is_not_base64() {
        let envelope = json!({"message": {"data": "invalid_base64!"}});
        assert_eq!(decode_envelope(Some(&envelope)), Err(DecodeError::InvalidEncoding));

        let envelope = json!({"message": {"data": 42}});
        assert_eq!(decode_envelope(Some(&envelope)), Err(DecodeError::InvalidEncoding));

        let not_utf8 = STANDARD.encode([0xff, 0xfe, 0xfd]);
        let envelope = json!({"message": {"data": not_utf8}});
        assert_eq!(decode_envelope(Some(&envelope)), Err(DecodeError::InvalidEncoding));
    }

    #[test]
    fn data_that_is_not_json() {
        let envelope = json!({"message": {"data": STANDARD.encode("not_valid_json")}});
        assert_eq!(decode_envelope(Some(&envelope)), Err(DecodeError::InvalidPayload));
    }

    #[test]
    fn missing_fields_reported_bucket_first() {
        let envelope = envelope_for(&json!({"filename": "test-file.csv"}));
        assert_eq!(
            decode_envelope(Some(&envelope)),
            Err(DecodeError::MissingField("bucket"))
        );

        let envelope = envelope_for(&json!({"bucket": "test-bucket"}));
        assert_eq!(
            decode_envelope(Some(&envelope)),
            Err(DecodeError::MissingField("filename"))
        );

        let envelope = envelope_for(&json!({}));
        assert_eq!(
            decode_envelope(Some(&envelope)),
            Err(DecodeError::MissingField("bucket"))
        );

        let envelope = envelope_for(&json!({"bucket": "", "filename": "f"}));
        assert_eq!(
            decode_envelope(Some(&envelope)),
            Err(DecodeError::MissingField("bucket"))
        );

        let envelope = envelope_for(&json!(["bucket", "filename"]));
        assert_eq!(
            decode_envelope(Some(&envelope)),
            Err(DecodeError::MissingField("bucket"))
        );
    }
}
