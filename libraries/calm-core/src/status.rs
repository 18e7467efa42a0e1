//! Host-facing status reporting
//!
//! The engine surfaces short-lived, human-readable text ("+2.3 dB",
//! "⚠️ Gain limited for safety") through a sink the host provides; a browser
//! host renders it into an overlay element, tests capture it in a Vec.

/// Sink for short-lived, human-readable status text
///
/// Implementations must be cheap: the controller may push a readout on every
/// tick. An empty string means "clear the display".
pub trait StatusSink {
    /// Push a status line to the host
    fn status(&mut self, text: &str);
}

/// A status sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStatusSink;

impl StatusSink for NullStatusSink {
    fn status(&mut self, _text: &str) {}
}

impl StatusSink for Vec<String> {
    fn status(&mut self, text: &str) {
        self.push(text.to_string());
    }
}
