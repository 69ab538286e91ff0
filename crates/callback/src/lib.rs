//! Decoding of document engine callbacks.
//!
//! Every callback arrives as a numeric type code plus an optional byte payload. The
//! payload encoding depends on the type; `EVENT_TABLE` records the shape and display
//! name for each code and `decode` turns raw bytes into a `DecodedPayload`.

mod event_type;
mod invalidate;
mod payload;
mod scan;
mod status;

pub use event_type::{
    EVENT_TABLE, EVENT_TYPE_COUNT, EventType, EventTypeError, EventTypeInfo, Shape,
    UNKNOWN_EVENT, classify, event_name, lookup,
};
pub use invalidate::{TileInvalidation, parse_invalidate_tiles};
pub use payload::{DecodedPayload, Event, decode};
pub use scan::{Scanner, parse_csv, parse_multiple_csv, parse_multiple_rects, parse_rect};
pub use status::{
    UnoCommandResult, UnoCommandResultError, parse_status_change, parse_uno_command_result,
};
