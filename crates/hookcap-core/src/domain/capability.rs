//! Capture capabilities and helper naming.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::target::TargetTag;

/// What a native helper captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Keyboard press events, one `KEYPRESS:<id>` line per key.
    Press,
    /// Screen frames as raw bytes on stdout.
    Screenshot,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Press => "press",
            Capability::Screenshot => "screenshot",
        }
    }

    /// Name of the helper's C source file inside the program directory.
    pub fn source_file_name(self) -> &'static str {
        match self {
            Capability::Press => "event_press.c",
            Capability::Screenshot => "event_screenshot.c",
        }
    }

    /// Deterministic name of the built binary for `target`,
    /// e.g. `event_press_linux64`.
    pub fn binary_name(self, target: TargetTag) -> String {
        format!("event_{}_{}", self.as_str(), target.as_str())
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_file_names() {
        assert_eq!(Capability::Press.source_file_name(), "event_press.c");
        assert_eq!(Capability::Screenshot.source_file_name(), "event_screenshot.c");
    }

    #[test]
    fn test_binary_name_combines_capability_and_target() {
        assert_eq!(
            Capability::Press.binary_name(TargetTag::Linux64),
            "event_press_linux64"
        );
        assert_eq!(
            Capability::Screenshot.binary_name(TargetTag::MacosArm64),
            "event_screenshot_macos_arm64"
        );
    }

    #[test]
    fn test_binary_name_is_deterministic() {
        let a = Capability::Press.binary_name(TargetTag::Win32);
        let b = Capability::Press.binary_name(TargetTag::Win32);
        assert_eq!(a, b);
    }
}
