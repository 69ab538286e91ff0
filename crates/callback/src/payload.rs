use serde_json::Value;

use crate::event_type::{Shape, classify, event_name};
use crate::scan::Scanner;

/// One engine callback as delivered, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub code: i32,
    pub payload: Option<Box<[u8]>>,
}

impl Event {
    pub fn new(code: i32, payload: Option<&[u8]>) -> Self {
        Self {
            code,
            payload: payload.map(Box::from),
        }
    }

    pub fn with_text(code: i32, payload: &str) -> Self {
        Self::new(code, Some(payload.as_bytes()))
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// Payload as UTF-8 text, if present and valid.
    pub fn text(&self) -> Option<&str> {
        self.payload().and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    pub fn name(&self) -> &'static str {
        event_name(self.code)
    }

    pub fn decode(&self) -> DecodedPayload {
        decode(self.code, self.payload())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedPayload {
    NumericList(Vec<u64>),
    NumericMatrix(Vec<Vec<u64>>),
    CompoundGraphicSelection(Vec<u64>, Option<Value>),
    Json(Value),
    RawString(String),
    Null,
}

impl DecodedPayload {
    pub fn is_null(&self) -> bool {
        matches!(self, DecodedPayload::Null)
    }

    pub fn as_numbers(&self) -> Option<&[u64]> {
        match self {
            DecodedPayload::NumericList(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            DecodedPayload::RawString(text) => Some(text),
            _ => None,
        }
    }
}

/// Decodes a raw callback payload according to the shape registered for `code`.
///
/// Total over all inputs: a missing or empty payload is `Null` whatever the shape,
/// and malformed text degrades to `Null` with a warning.
pub fn decode(code: i32, payload: Option<&[u8]>) -> DecodedPayload {
    let Some(bytes) = payload.filter(|bytes| !bytes.is_empty()) else {
        return DecodedPayload::Null;
    };

    match classify(code) {
        Shape::NumericList if bytes[0] == b'{' => parse_json(code, bytes),
        Shape::NumericList => DecodedPayload::NumericList(Scanner::new(bytes).parse_csv()),
        Shape::NumericMatrix => {
            DecodedPayload::NumericMatrix(Scanner::new(bytes).parse_multiple_csv())
        }
        Shape::CompoundGraphicSelection => decode_graphic_selection(code, bytes),
        Shape::StateChange if bytes[0] == b'{' => parse_json(code, bytes),
        Shape::Json => parse_json(code, bytes),
        Shape::StateChange | Shape::RawString => match std::str::from_utf8(bytes) {
            Ok(text) => DecodedPayload::RawString(text.to_owned()),
            Err(err) => {
                tracing::warn!(
                    "[callback] {} payload is not valid utf-8: {err}",
                    event_name(code)
                );
                DecodedPayload::Null
            }
        },
    }
}

fn decode_graphic_selection(code: i32, bytes: &[u8]) -> DecodedPayload {
    let mut scanner = Scanner::new(bytes);
    let numbers = scanner.parse_csv();
    let rest = scanner.remaining();
    if rest.iter().all(u8::is_ascii_whitespace) {
        return DecodedPayload::CompoundGraphicSelection(numbers, None);
    }
    let properties = match parse_json(code, rest) {
        DecodedPayload::Json(value) => Some(value),
        _ => None,
    };
    DecodedPayload::CompoundGraphicSelection(numbers, properties)
}

fn parse_json(code: i32, bytes: &[u8]) -> DecodedPayload {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => DecodedPayload::Json(value),
        Err(err) => {
            tracing::warn!(
                "[callback] unable to parse {} payload as json: {err}",
                event_name(code)
            );
            DecodedPayload::Null
        }
    }
}
