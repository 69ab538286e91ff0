use thiserror::Error;

/// Wire shape of a callback payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// `a,b,c` optionally terminated by `;`.
    NumericList,
    /// `;`-separated numeric lists.
    NumericMatrix,
    /// Five numbers followed by optional JSON.
    CompoundGraphicSelection,
    /// `key=value` text, or JSON when the payload starts with `{`.
    StateChange,
    Json,
    RawString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTypeInfo {
    pub code: i32,
    pub name: &'static str,
    pub shape: Shape,
}

pub const UNKNOWN_EVENT: EventTypeInfo = EventTypeInfo {
    code: -1,
    name: "unknown_event",
    shape: Shape::RawString,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EventTypeError {
    #[error("unknown callback type {0}")]
    Unknown(i32),
}

macro_rules! event_types {
    ($($variant:ident = $code:literal => $name:literal, $shape:ident;)*) => {
        /// Callback types emitted by the document engine.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(i32)]
        pub enum EventType {
            $($variant = $code,)*
        }

        impl EventType {
            pub const ALL: &'static [EventType] = &[$(EventType::$variant,)*];
        }

        /// Indexed by callback code.
        pub static EVENT_TABLE: [EventTypeInfo; EVENT_TYPE_COUNT] = [
            $(EventTypeInfo { code: $code, name: $name, shape: Shape::$shape },)*
        ];

        impl TryFrom<i32> for EventType {
            type Error = EventTypeError;

            fn try_from(code: i32) -> Result<Self, EventTypeError> {
                match code {
                    $($code => Ok(EventType::$variant),)*
                    other => Err(EventTypeError::Unknown(other)),
                }
            }
        }
    };
}

pub const EVENT_TYPE_COUNT: usize = 58;

event_types! {
    InvalidateTiles = 0 => "invalidate_tiles", NumericList;
    InvalidateVisibleCursor = 1 => "invalidate_visible_cursor", NumericList;
    TextSelection = 2 => "text_selection", NumericMatrix;
    TextSelectionStart = 3 => "text_selection_start", NumericList;
    TextSelectionEnd = 4 => "text_selection_end", NumericList;
    CursorVisible = 5 => "cursor_visible", Json;
    GraphicSelection = 6 => "graphic_selection", CompoundGraphicSelection;
    HyperlinkClicked = 7 => "hyperlink_clicked", Json;
    StateChanged = 8 => "state_changed", StateChange;
    StatusIndicatorStart = 9 => "status_indicator_start", RawString;
    StatusIndicatorSetValue = 10 => "status_indicator_set_value", Json;
    StatusIndicatorFinish = 11 => "status_indicator_finish", RawString;
    SearchNotFound = 12 => "search_not_found", RawString;
    DocumentSizeChanged = 13 => "document_size_changed", NumericList;
    SetPart = 14 => "set_part", Json;
    SearchResultSelection = 15 => "search_result_selection", Json;
    UnoCommandResult = 16 => "uno_command_result", Json;
    CellCursor = 17 => "cell_cursor", NumericList;
    MousePointer = 18 => "mouse_pointer", RawString;
    CellFormula = 19 => "cell_formula", RawString;
    DocumentPassword = 20 => "document_password", RawString;
    DocumentPasswordToModify = 21 => "document_password_to_modify", RawString;
    Error = 22 => "error", Json;
    ContextMenu = 23 => "context_menu", Json;
    InvalidateViewCursor = 24 => "invalidate_view_cursor", Json;
    TextViewSelection = 25 => "text_view_selection", Json;
    CellViewCursor = 26 => "cell_view_cursor", Json;
    GraphicViewSelection = 27 => "graphic_view_selection", Json;
    ViewCursorVisible = 28 => "view_cursor_visible", Json;
    ViewLock = 29 => "view_lock", Json;
    RedlineTableSizeChanged = 30 => "redline_table_size_changed", Json;
    RedlineTableEntryModified = 31 => "redline_table_entry_modified", Json;
    Comment = 32 => "comment", Json;
    InvalidateHeader = 33 => "invalidate_header", RawString;
    CellAddress = 34 => "cell_address", RawString;
    RulerUpdate = 35 => "ruler_update", Json;
    Window = 36 => "window", Json;
    ValidityListButton = 37 => "validity_list_button", NumericList;
    ClipboardChanged = 38 => "clipboard_changed", Json;
    ContextChanged = 39 => "context_changed", RawString;
    SignatureStatus = 40 => "signature_status", RawString;
    ProfileFrame = 41 => "profile_frame", RawString;
    CellSelectionArea = 42 => "cell_selection_area", NumericList;
    CellAutoFillArea = 43 => "cell_auto_fill_area", NumericList;
    TableSelected = 44 => "table_selected", Json;
    ReferenceMarks = 45 => "reference_marks", Json;
    Jsdialog = 46 => "jsdialog", Json;
    CalcFunctionList = 47 => "calc_function_list", Json;
    TabStopList = 48 => "tab_stop_list", Json;
    FormFieldButton = 49 => "form_field_button", Json;
    InvalidateSheetGeometry = 50 => "invalidate_sheet_geometry", RawString;
    ValidityInputHelp = 51 => "validity_input_help", Json;
    DocumentBackgroundColor = 52 => "document_background_color", RawString;
    CommandBlocked = 53 => "lok_command_blocked", Json;
    ScFollowJump = 54 => "sc_follow_jump", NumericList;
    ContentControl = 55 => "content_control", Json;
    PrintRanges = 56 => "print_ranges", Json;
    FontsMissing = 57 => "fonts_missing", RawString;
}

impl EventType {
    pub const fn code(self) -> i32 {
        self as i32
    }

    pub fn info(self) -> &'static EventTypeInfo {
        &EVENT_TABLE[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn shape(self) -> Shape {
        self.info().shape
    }
}

/// Table row for `code`, falling back to the unknown row.
pub fn lookup(code: i32) -> &'static EventTypeInfo {
    usize::try_from(code)
        .ok()
        .and_then(|index| EVENT_TABLE.get(index))
        .unwrap_or(&UNKNOWN_EVENT)
}

pub fn classify(code: i32) -> Shape {
    lookup(code).shape
}

pub fn event_name(code: i32) -> &'static str {
    lookup(code).name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rows_are_indexed_by_code() {
        assert_eq!(EventType::ALL.len(), EVENT_TYPE_COUNT);
        for (index, info) in EVENT_TABLE.iter().enumerate() {
            assert_eq!(info.code as usize, index);
            let event_type = EventType::try_from(info.code).expect("declared code");
            assert_eq!(event_type.code(), info.code);
            assert_eq!(event_type.name(), info.name);
        }
    }

    #[test]
    fn unknown_codes_classify_as_raw_string() {
        assert_eq!(classify(58), Shape::RawString);
        assert_eq!(classify(-4), Shape::RawString);
        assert_eq!(event_name(1000), "unknown_event");
        assert_eq!(EventType::try_from(58), Err(EventTypeError::Unknown(58)));
    }

    #[test]
    fn shapes_follow_engine_encoding() {
        assert_eq!(classify(EventType::TextSelection.code()), Shape::NumericMatrix);
        assert_eq!(classify(EventType::GraphicSelection.code()), Shape::CompoundGraphicSelection);
        assert_eq!(classify(EventType::DocumentSizeChanged.code()), Shape::NumericList);
        assert_eq!(classify(EventType::StateChanged.code()), Shape::StateChange);
        assert_eq!(classify(EventType::CommandBlocked.code()), Shape::Json);
        assert_eq!(EventType::CommandBlocked.name(), "lok_command_blocked");
        assert_eq!(classify(EventType::MousePointer.code()), Shape::RawString);
    }
}
