//! Translator for the screenshot helper.
//!
//! The helper streams raw image bytes on stdout, not line-delimited text.
//! The translator owns an accumulator buffer for the lifetime of one
//! process; every chunk is appended and each emission carries a full
//! snapshot of the buffer so far.  Listeners only ever see copies — the
//! live buffer never leaves the translator.

use hookcap_core::{CapturedEvent, EventPayload};
use tracing::warn;

use crate::infrastructure::process::ExitSignal;

use super::ChunkTranslator;

/// Label attached to every cumulative frame snapshot.
pub const FRAME_LABEL: &str = "Screen Frame";

/// Summary used when the helper exits before any bytes arrived.
pub const NO_DATA_SUMMARY: &str = "No data captured";

/// Stateful per-process screenshot translator.
pub struct ScreenshotTranslator {
    buffer: Vec<u8>,
}

impl ScreenshotTranslator {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }
}

impl Default for ScreenshotTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkTranslator for ScreenshotTranslator {
    fn on_stdout(&mut self, chunk: &[u8]) -> CapturedEvent {
        self.buffer.extend_from_slice(chunk);

        // Cumulative, not incremental: every emission carries the whole
        // buffer so far, as a copy-on-emit snapshot.
        CapturedEvent::Data {
            label: FRAME_LABEL.to_string(),
            payload: EventPayload::Frame(self.buffer.clone()),
        }
    }

    fn on_stderr(&mut self, chunk: &[u8]) -> CapturedEvent {
        let message = String::from_utf8_lossy(chunk).into_owned();
        warn!("screenshot helper diagnostic: {message}");
        CapturedEvent::Error { message }
    }

    fn on_exit(&mut self, signal: ExitSignal) -> CapturedEvent {
        if signal.exit_code != Some(0) {
            warn!("screenshot helper exited with {:?}", signal.exit_code);
        }

        // The final bytes ride along in `last_payload`; the summary only
        // describes them and never replaces them.
        if self.buffer.is_empty() {
            CapturedEvent::Ended {
                summary: NO_DATA_SUMMARY.to_string(),
                last_payload: None,
            }
        } else {
            CapturedEvent::Ended {
                summary: format!("captured {} bytes", self.buffer.len()),
                last_payload: Some(EventPayload::Frame(self.buffer.clone())),
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshots_are_cumulative() {
        // Arrange
        let mut translator = ScreenshotTranslator::new();

        // Act
        let first = translator.on_stdout(&[0x01, 0x02]);
        let second = translator.on_stdout(&[0x03]);

        // Assert
        assert_eq!(
            first,
            CapturedEvent::Data {
                label: "Screen Frame".to_string(),
                payload: EventPayload::Frame(vec![0x01, 0x02]),
            }
        );
        assert_eq!(
            second,
            CapturedEvent::Data {
                label: "Screen Frame".to_string(),
                payload: EventPayload::Frame(vec![0x01, 0x02, 0x03]),
            }
        );
    }

    #[test]
    fn test_snapshots_are_independent_copies() {
        // Mutating history must be impossible: an early snapshot does not
        // grow when later chunks arrive.
        let mut translator = ScreenshotTranslator::new();

        let first = translator.on_stdout(&[0x01]);
        translator.on_stdout(&[0x02]);

        match first {
            CapturedEvent::Data {
                payload: EventPayload::Frame(bytes),
                ..
            } => assert_eq!(bytes, vec![0x01]),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_stderr_chunk_becomes_error_event() {
        let mut translator = ScreenshotTranslator::new();

        let event = translator.on_stderr(b"boom");

        assert_eq!(
            event,
            CapturedEvent::Error {
                message: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_exit_preserves_final_buffer_next_to_summary() {
        // Arrange
        let mut translator = ScreenshotTranslator::new();
        translator.on_stdout(&[0x01, 0x02]);
        translator.on_stdout(&[0x03]);

        // Act
        let event = translator.on_exit(ExitSignal { exit_code: Some(0) });

        // Assert – the bytes survive termination.
        assert_eq!(
            event,
            CapturedEvent::Ended {
                summary: "captured 3 bytes".to_string(),
                last_payload: Some(EventPayload::Frame(vec![0x01, 0x02, 0x03])),
            }
        );
    }

    #[test]
    fn test_exit_without_data_reports_no_capture() {
        let mut translator = ScreenshotTranslator::new();

        let event = translator.on_exit(ExitSignal { exit_code: Some(1) });

        assert_eq!(
            event,
            CapturedEvent::Ended {
                summary: "No data captured".to_string(),
                last_payload: None,
            }
        );
    }

    #[test]
    fn test_error_chunks_do_not_touch_the_accumulator() {
        let mut translator = ScreenshotTranslator::new();
        translator.on_stdout(&[0xAA]);
        translator.on_stderr(b"frame dropped");

        let event = translator.on_exit(ExitSignal { exit_code: Some(0) });

        assert_eq!(
            event,
            CapturedEvent::Ended {
                summary: "captured 1 bytes".to_string(),
                last_payload: Some(EventPayload::Frame(vec![0xAA])),
            }
        );
    }
}
