//! Outbound reply envelopes.
//!
//! | Shape     | Fields                    |
//! |-----------|---------------------------|
//! | AlertMin  | `response`, `time`        |
//! | AlertFull | `response`, `time`, `alert` |
//! | ErrorMin  | `response`, `time`        |
//! | ErrorFull | `response`, `time`, `error` |

use bytes::Bytes;
use serde::Serialize;

use crate::domain::{Reply, ReplyKind, ResponseCode};

/// Sent in place of a reply that failed to encode
pub const INTERNAL_FAILURE_MARKER: &str = r#"{"response":500,"time":0}"#;

#[derive(Debug, Serialize)]
pub struct AlertMin {
    pub response: ResponseCode,
    pub time: i64,
}

#[derive(Debug, Serialize)]
pub struct AlertFull {
    pub response: ResponseCode,
    pub time: i64,
    pub alert: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorMin {
    pub response: ResponseCode,
    pub time: i64,
}

#[derive(Debug, Serialize)]
pub struct ErrorFull {
    pub response: ResponseCode,
    pub time: i64,
    pub error: String,
}

pub fn encode_reply(reply: &Reply) -> Result<Vec<u8>, serde_json::Error> {
    let response = reply.code;
    let time = reply.time;
    match (reply.kind, reply.text.clone()) {
        (ReplyKind::Alert, None) => serde_json::to_vec(&AlertMin { response, time }),
        (ReplyKind::Alert, Some(alert)) => serde_json::to_vec(&AlertFull {
            response,
            time,
            alert,
        }),
        (ReplyKind::Error, None) => serde_json::to_vec(&ErrorMin { response, time }),
        (ReplyKind::Error, Some(error)) => serde_json::to_vec(&ErrorFull {
            response,
            time,
            error,
        }),
    }
}

/// Encode a reply for the wire. An encoding failure is logged and answered
/// with [`INTERNAL_FAILURE_MARKER`] so the connection keeps going.
pub fn encode_reply_or_marker(reply: &Reply) -> Bytes {
    match encode_reply(reply) {
        Ok(encoded) => Bytes::from(encoded),
        Err(e) => {
            tracing::error!("Failed to encode reply {:?}: {}", reply, e);
            Bytes::from_static(INTERNAL_FAILURE_MARKER.as_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(reply: Reply) -> serde_json::Value {
        serde_json::from_slice(&encode_reply(&reply).unwrap()).unwrap()
    }

    #[test]
    fn test_reply_shapes() {
        // テスト項目: 各応答の種類がそれぞれのワイヤー形式にエンコードされる
        // given (前提条件):
        let replies = [
            Reply::alert(ResponseCode::Ok, 5),
            Reply::alert_with(ResponseCode::Info, 5, "Connected with ID x"),
            Reply::error(ResponseCode::Gone, 5),
            Reply::error_with(ResponseCode::BadRequest, 5, "missing or invalid time"),
        ];

        // when (操作):
        let values: Vec<serde_json::Value> = replies.into_iter().map(encoded).collect();

        // then (期待する結果):
        assert_eq!(
            values,
            vec![
                serde_json::json!({"response": 200, "time": 5}),
                serde_json::json!({"response": 100, "time": 5, "alert": "Connected with ID x"}),
                serde_json::json!({"response": 410, "time": 5}),
                serde_json::json!({"response": 400, "time": 5, "error": "missing or invalid time"}),
            ]
        );
    }

    #[test]
    fn test_marker_is_valid_json() {
        // テスト項目: 失敗マーカー自体が 500 の応答としてデコードできる
        // given (前提条件):
        let marker = INTERNAL_FAILURE_MARKER;

        // when (操作):
        let value: serde_json::Value = serde_json::from_str(marker).unwrap();

        // then (期待する結果):
        assert_eq!(value, serde_json::json!({"response": 500, "time": 0}));
    }
}
