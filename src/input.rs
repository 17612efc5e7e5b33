//! Tag input capture
//!
//! Tag scanners present as keyboards: a burst of characters terminated by
//! Enter. The scanner here is a pure state machine over injected input
//! events, so the workflow stays testable without any real input surface.
//! The embedding surface decides when scanning is active (front-desk mode,
//! not yet authenticated) and feeds events through.

/// One event from the embedding input surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A printable keystroke.
    Key(char),
    /// Enter: flush the assembled identifier.
    Submit,
    /// Pasted text resolves immediately.
    Paste(String),
}

/// Assembles keystroke bursts into resolved identifier strings.
#[derive(Debug, Default)]
pub struct TagScanner {
    buffer: String,
}

impl TagScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one event. Returns the resolved identifier when one completes.
    ///
    /// On Submit the assembled buffer wins; when it is empty the typed
    /// fallback field is used instead, so hand-typed identifiers still
    /// submit with the same key.
    pub fn feed(&mut self, event: InputEvent, typed_fallback: &str) -> Option<String> {
        match event {
            InputEvent::Key(c) => {
                self.buffer.push(c);
                None
            }
            InputEvent::Submit => {
                let scanned = self.buffer.trim().to_string();
                self.buffer.clear();
                if !scanned.is_empty() {
                    return Some(scanned);
                }
                let typed = typed_fallback.trim();
                (!typed.is_empty()).then(|| typed.to_string())
            }
            InputEvent::Paste(text) => {
                let pasted = text.trim();
                (!pasted.is_empty()).then(|| pasted.to_string())
            }
        }
    }
}
