use std::collections::HashMap;

use callback::parse_status_change;

const ENABLED: &str = "enabled";

/// State-change payloads held back until the view has drawn for the first time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChangeBuffer {
    Buffering(Vec<String>),
    Live,
}

impl Default for StateChangeBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl StateChangeBuffer {
    pub fn new() -> Self {
        Self::Buffering(Vec::new())
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Buffering(payloads) => payloads.len(),
            Self::Live => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keeps `payload` if still buffering. Returns whether it was kept.
    pub fn push(&mut self, payload: &str) -> bool {
        match self {
            Self::Buffering(payloads) => {
                payloads.push(payload.to_owned());
                true
            }
            Self::Live => false,
        }
    }

    /// Switches to `Live` and hands back everything buffered. Only the first call
    /// after construction or `reset` returns `Some`.
    pub fn go_live(&mut self) -> Option<Vec<String>> {
        match std::mem::replace(self, Self::Live) {
            Self::Buffering(payloads) => Some(payloads),
            Self::Live => None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Latest value reported for each UNO command, e.g. `.uno:Undo` -> `enabled`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnoState {
    values: HashMap<String, String>,
}

impl UnoState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a `key=value` state-change payload. Payloads without a key are ignored.
    pub fn update(&mut self, payload: &str) -> bool {
        let (key, value) = parse_status_change(payload);
        if key.is_empty() {
            return false;
        }
        self.values.insert(key.to_owned(), value.to_owned());
        true
    }

    pub fn get(&self, command: &str) -> Option<&str> {
        self.values.get(command).map(String::as_str)
    }

    pub fn is_enabled(&self, command: &str) -> bool {
        self.get(command) == Some(ENABLED)
    }

    pub fn can_copy(&self) -> bool {
        self.is_enabled(".uno:Copy")
    }

    pub fn can_undo(&self) -> bool {
        self.is_enabled(".uno:Undo")
    }

    pub fn can_redo(&self) -> bool {
        self.is_enabled(".uno:Redo")
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
