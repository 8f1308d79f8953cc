//! # hookcap-core
//!
//! Shared library for Hookcap containing build-target resolution, the
//! toolchain command templates, capability naming, and the captured-event
//! model.
//!
//! This crate is used by the runner application and by anything that wants
//! to consume captured events. It has zero dependencies on OS APIs, async
//! runtimes, or process spawning.
//!
//! # Architecture overview (for beginners)
//!
//! Hookcap drives small native helper programs that hook into the OS input
//! layer and print what they capture: a keyboard helper writes lines like
//! `KEYPRESS:65` to stdout, a screenshot helper writes raw image bytes.
//! The helpers are compiled on the fly for the machine they run on, so the
//! orchestrator must know which compiler invocation matches which host.
//!
//! This crate (`hookcap-core`) is the pure foundation. It defines:
//!
//! - **`domain::target`** – Which of the six build targets a host maps to.
//!   The mapping is a closed enum match, so adding a platform without
//!   deciding its target is a compile error.
//!
//! - **`domain::toolchain`** – The exact compiler argv for each target
//!   (gcc with X11 on Linux, MinGW cross compilers for Windows, gcc with
//!   the ApplicationServices/CoreFoundation/CoreGraphics frameworks on
//!   macOS).
//!
//! - **`domain::capability`** – What a helper captures (key presses or
//!   screen frames) and the deterministic names of its source file and
//!   built binary.
//!
//! - **`domain::event`** – The structured `CapturedEvent` stream that the
//!   runner's translators produce from raw helper output.

pub mod domain;

// Re-export the most-used types at the crate root so callers can write
// `hookcap_core::TargetTag` instead of `hookcap_core::domain::target::TargetTag`.
pub use domain::capability::Capability;
pub use domain::event::{key_id_from_chunk, CapturedEvent, EventPayload, KEYPRESS_MARKER};
pub use domain::target::{resolve_target, HostArch, HostPlatform, TargetError, TargetTag};
pub use domain::toolchain::{compile_command, ToolchainCommand};
