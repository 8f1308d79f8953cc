//! The structured event model produced from raw helper output.
//!
//! A supervised helper process yields three raw signals: stdout chunks,
//! stderr chunks, and one exit.  The runner's translators turn those into
//! [`CapturedEvent`]s: zero or more `Data`/`Error` events followed by
//! exactly one terminal `Ended` event per process.
//!
//! The `Ended` event carries the terminal summary and the last successful
//! payload as two distinct fields, so ending a capture never discards the
//! final key code or the accumulated frame bytes.

use serde::{Deserialize, Serialize};

/// Leading marker on every press-helper stdout line, per the helper
/// contract: `KEYPRESS:<key id>`.
pub const KEYPRESS_MARKER: &str = "KEYPRESS:";

/// Payload of a successful capture sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    /// A key identifier reported by the press helper, e.g. `"65"`.
    Key(String),
    /// Accumulated screen-frame bytes from the screenshot helper.
    Frame(Vec<u8>),
}

/// A structured event forwarded from a translator to consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapturedEvent {
    /// A successfully parsed sample from the helper's stdout.
    Data {
        /// Human-readable label, e.g. `"Key Pressed"`.
        label: String,
        payload: EventPayload,
    },
    /// A diagnostic from the helper's stderr.  Non-fatal; the helper keeps
    /// running and further events may follow.
    Error { message: String },
    /// Terminal event, emitted exactly once when the helper exits.  Nothing
    /// follows it for the same process.
    Ended {
        /// Textual description of the capture outcome.
        summary: String,
        /// The last successful payload before exit, if any arrived.
        last_payload: Option<EventPayload>,
    },
}

impl CapturedEvent {
    /// `true` for the terminal [`CapturedEvent::Ended`] variant.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CapturedEvent::Ended { .. })
    }
}

/// Extracts the key identifier from one press-helper stdout chunk.
///
/// The chunk is decoded as UTF-8 (lossily), trimmed, stripped of the leading
/// [`KEYPRESS_MARKER`], and trimmed again.  A chunk without the marker
/// yields its trimmed text unchanged — the helper contract says the marker
/// is always present, but a malformed line should not panic the run.
pub fn key_id_from_chunk(chunk: &[u8]) -> String {
    let text = String::from_utf8_lossy(chunk);
    let trimmed = text.trim();
    trimmed
        .strip_prefix(KEYPRESS_MARKER)
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
