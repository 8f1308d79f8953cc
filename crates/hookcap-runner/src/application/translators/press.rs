//! Translator for the key-press helper.
//!
//! The helper writes one `KEYPRESS:<id>` line per captured key.  Each
//! stdout chunk becomes one `Data` event carrying the key identifier; the
//! translator remembers the last identifier so the terminal event can
//! report both a summary and the final key as separate fields.

use hookcap_core::{key_id_from_chunk, CapturedEvent, EventPayload};
use tracing::warn;

use crate::infrastructure::process::ExitSignal;

use super::ChunkTranslator;

/// Label attached to every successful press sample.
pub const KEY_PRESSED_LABEL: &str = "Key Pressed";

/// Summary used when the helper exits before any key arrived.
pub const NO_DATA_SUMMARY: &str = "No data captured";

/// Stateful per-process press translator.
pub struct PressTranslator {
    last_key: Option<String>,
}

impl PressTranslator {
    pub fn new() -> Self {
        Self { last_key: None }
    }
}

impl Default for PressTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkTranslator for PressTranslator {
    fn on_stdout(&mut self, chunk: &[u8]) -> CapturedEvent {
        let key_id = key_id_from_chunk(chunk);
        self.last_key = Some(key_id.clone());

        CapturedEvent::Data {
            label: KEY_PRESSED_LABEL.to_string(),
            payload: EventPayload::Key(key_id),
        }
    }

    fn on_stderr(&mut self, chunk: &[u8]) -> CapturedEvent {
        let message = String::from_utf8_lossy(chunk).into_owned();
        warn!("press helper diagnostic: {message}");
        CapturedEvent::Error { message }
    }

    fn on_exit(&mut self, signal: ExitSignal) -> CapturedEvent {
        if signal.exit_code != Some(0) {
            warn!("press helper exited with {:?}", signal.exit_code);
        }

        // Summary and last payload are distinct fields: the final key
        // survives alongside the description instead of replacing it.
        match &self.last_key {
            Some(key) => CapturedEvent::Ended {
                summary: key.clone(),
                last_payload: Some(EventPayload::Key(key.clone())),
            },
            None => CapturedEvent::Ended {
                summary: NO_DATA_SUMMARY.to_string(),
                last_payload: None,
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
