//! Conversions from the generated gNMI wire types ([`crate::proto`]) to the
//! domain types the rest of the pipeline operates on.

use crate::error::ConsumerError;
use crate::path::{Path, PathElement};
use crate::proto;
use std::collections::BTreeMap;

impl From<&proto::Path> for Path {
    fn from(p: &proto::Path) -> Self {
        Path(
            p.elem
                .iter()
                .map(|e| PathElement {
                    name: e.name.clone(),
                    key: e.key.iter().map(|(k, v)| (k.clone(), v.clone())).collect::<BTreeMap<_, _>>(),
                })
                .collect(),
        )
    }
}

/// Converts a gNMI `TypedValue` into the `serde_json::Value` the
/// unmarshaler operates on uniformly, whether the wire value was a scalar
/// or a JSON-IETF blob.
pub fn typed_value_to_json(value: &proto::TypedValue) -> Result<serde_json::Value, ConsumerError> {
    use proto::typed_value::Value as V;
    let json = match &value.value {
        Some(V::StringVal(s)) => serde_json::Value::String(s.clone()),
        Some(V::IntVal(n)) => serde_json::Value::Number((*n).into()),
        Some(V::UintVal(n)) => serde_json::json!(*n),
        Some(V::BoolVal(b)) => serde_json::Value::Bool(*b),
        Some(V::FloatVal(f)) => serde_json::json!(*f),
        Some(V::DoubleVal(f)) => serde_json::json!(*f),
        Some(V::BytesVal(b)) => serde_json::Value::String(String::from_utf8_lossy(b).into_owned()),
        Some(V::JsonIetfVal(bytes)) | Some(V::JsonVal(bytes)) => {
            serde_json::from_slice(bytes).map_err(|e| ConsumerError::Decode(decode_err(e)))?
        }
        None => serde_json::Value::Null,
    };
    Ok(json)
}

/// `serde_json::Error` doesn't implement `Into<prost::DecodeError>`; the
/// consumer's error taxonomy only distinguishes "failed to decode the
/// message body", so we fold both causes through the same variant with a
/// synthesized `DecodeError`.
fn decode_err(e: serde_json::Error) -> prost::DecodeError {
    prost::DecodeError::new(e.to_string())
}

/// Extracts the `Notification` from a raw Kafka message payload, trying the
/// `SubscribeResponse` envelope first and falling back to a bare
/// `Notification`, per §4.8.
///
/// A `SubscribeResponse` that decodes successfully is only ever ambiguous
/// with a bare `Notification` when decoding produces an *error* (a field
/// whose wire type doesn't match the envelope's schema) — that's the only
/// case that falls through to the bare-`Notification` attempt. Once the
/// envelope decodes cleanly, its `response` oneof is authoritative: a
/// `sync_response` or a genuinely unset oneof both mean "no notification
/// here", and must return `Ok(None)` directly rather than re-parsing the
/// same bytes as a `Notification`, which protobuf's lenient unknown-field
/// handling can make "succeed" into a bogus, all-default `Notification`.
pub fn decode_message(bytes: &[u8]) -> Result<Option<proto::Notification>, ConsumerError> {
    use prost::Message;

    if let Ok(resp) = proto::SubscribeResponse::decode(bytes) {
        return match resp.response {
            Some(proto::subscribe_response::Response::Update(n)) => Ok(Some(n)),
            Some(proto::subscribe_response::Response::SyncResponse(_)) => Ok(None),
            None => Ok(None),
        };
    }

    proto::Notification::decode(bytes)
        .map(Some)
        .map_err(ConsumerError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn decodes_a_bare_notification_payload() {
        let notification = proto::Notification {
            timestamp: 42,
            prefix: None,
            update: Vec::new(),
            delete: Vec::new(),
            atomic: false,
        };
        let bytes = notification.encode_to_vec();
        let decoded = decode_message(&bytes).unwrap();
        assert_eq!(decoded.unwrap().timestamp, 42);
    }

    #[test]
    fn decodes_a_subscribe_response_update_envelope() {
        let notification = proto::Notification {
            timestamp: 7,
            prefix: None,
            update: Vec::new(),
            delete: Vec::new(),
            atomic: false,
        };
        let resp = proto::SubscribeResponse {
            response: Some(proto::subscribe_response::Response::Update(notification)),
        };
        let bytes = resp.encode_to_vec();
        let decoded = decode_message(&bytes).unwrap();
        assert_eq!(decoded.unwrap().timestamp, 7);
    }

    #[test]
    fn sync_response_envelope_yields_no_notification() {
        let resp = proto::SubscribeResponse {
            response: Some(proto::subscribe_response::Response::SyncResponse(true)),
        };
        let bytes = resp.encode_to_vec();
        assert_eq!(decode_message(&bytes).unwrap(), None);
    }

    #[test]
    fn empty_envelope_yields_no_notification() {
        let resp = proto::SubscribeResponse { response: None };
        let bytes = resp.encode_to_vec();
        assert_eq!(decode_message(&bytes).unwrap(), None);
    }
}
