//! Event translators: raw helper output in, structured events out.
//!
//! One translator instance is bound to one supervised process for its whole
//! lifetime.  The contract mirrors the three raw signals a process
//! produces; the pipeline feeds them in and publishes whatever comes back.
//!
//! Per process, a translator emits zero or more `Data`/`Error` events
//! followed by exactly one `Ended` — the pipeline calls `on_exit` exactly
//! once, after the last chunk.

use hookcap_core::{Capability, CapturedEvent};

use crate::infrastructure::process::ExitSignal;

pub mod press;
pub mod screenshot;

/// Contract shared by both translator variants.
pub trait ChunkTranslator: Send {
    /// Converts one stdout chunk into a structured event.
    fn on_stdout(&mut self, chunk: &[u8]) -> CapturedEvent;

    /// Converts one stderr chunk into a diagnostic event.
    fn on_stderr(&mut self, chunk: &[u8]) -> CapturedEvent;

    /// Produces the terminal event for the process exit.
    fn on_exit(&mut self, signal: ExitSignal) -> CapturedEvent;
}

/// The translator matching a capability's helper output format.
pub fn translator_for(capability: Capability) -> Box<dyn ChunkTranslator> {
    match capability {
        Capability::Press => Box::new(press::PressTranslator::new()),
        Capability::Screenshot => Box::new(screenshot::ScreenshotTranslator::new()),
    }
}
