//! Responses the router sends back to the connection that issued an envelope.

use serde::Serialize;

/// Numeric response codes carried in the `response` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    /// Post-connect identity notice
    Info,
    Ok,
    /// Malformed envelope, unknown action, missing time
    BadRequest,
    /// Unknown recipient or room
    NotFound,
    /// Not a member of the target room
    Gone,
    /// Server-side failure marker
    Internal,
}

impl ResponseCode {
    pub fn as_u16(self) -> u16 {
        match self {
            Self::Info => 100,
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::Gone => 410,
            Self::Internal => 500,
        }
    }
}

impl Serialize for ResponseCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.as_u16())
    }
}

/// Whether a reply reports success or failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Alert,
    Error,
}

/// One response envelope, stamped with the server time it was produced at.
///
/// `text` selects the "full" wire variant; without it the "min" variant is
/// sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub kind: ReplyKind,
    pub code: ResponseCode,
    pub time: i64,
    pub text: Option<String>,
}

impl Reply {
    pub fn alert(code: ResponseCode, time: i64) -> Self {
        Self {
            kind: ReplyKind::Alert,
            code,
            time,
            text: None,
        }
    }

    pub fn alert_with(code: ResponseCode, time: i64, text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::alert(code, time)
        }
    }

    pub fn error(code: ResponseCode, time: i64) -> Self {
        Self {
            kind: ReplyKind::Error,
            code,
            time,
            text: None,
        }
    }

    pub fn error_with(code: ResponseCode, time: i64, text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::error(code, time)
        }
    }
}
