//! Build-target resolution.
//!
//! A host is described by a [`HostPlatform`] and a [`HostArch`].  Six of the
//! nine combinations map to a [`TargetTag`] that selects a toolchain template
//! and a binary naming suffix; the remaining three have no native helper
//! build and fail with [`TargetError::UnsupportedHost`].
//!
//! Resolution is a pure, exhaustive `match`: identical input always yields
//! identical output, and a new platform or architecture variant cannot be
//! added without the compiler demanding a resolution decision for it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for host parsing and target resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    /// The platform name string is not one of the known spellings.
    #[error("unknown platform name: {0}")]
    UnknownPlatform(String),

    /// The architecture name string is not one of the known spellings.
    #[error("unknown architecture name: {0}")]
    UnknownArch(String),

    /// The platform/architecture pair has no helper build target.
    #[error("no helper build target for {platform}/{arch}")]
    UnsupportedHost { platform: HostPlatform, arch: HostArch },
}

/// Operating system family of the machine the orchestrator runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostPlatform {
    Linux,
    Windows,
    MacOs,
}

impl HostPlatform {
    /// Canonical lower-case name, matching `std::env::consts::OS`.
    pub fn as_str(self) -> &'static str {
        match self {
            HostPlatform::Linux => "linux",
            HostPlatform::Windows => "windows",
            HostPlatform::MacOs => "macos",
        }
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostPlatform {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linux" => Ok(HostPlatform::Linux),
            "windows" => Ok(HostPlatform::Windows),
            "macos" => Ok(HostPlatform::MacOs),
            other => Err(TargetError::UnknownPlatform(other.to_string())),
        }
    }
}

/// CPU architecture of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostArch {
    X86,
    X64,
    Arm64,
}

impl HostArch {
    /// Canonical name, matching `std::env::consts::ARCH`.
    pub fn as_str(self) -> &'static str {
        match self {
            HostArch::X86 => "x86",
            HostArch::X64 => "x86_64",
            HostArch::Arm64 => "aarch64",
        }
    }
}

impl fmt::Display for HostArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostArch {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x86" => Ok(HostArch::X86),
            "x86_64" => Ok(HostArch::X64),
            "aarch64" => Ok(HostArch::Arm64),
            other => Err(TargetError::UnknownArch(other.to_string())),
        }
    }
}

/// One of the six supported helper build targets.
///
/// The tag string (`linux64`, `win32`, ...) appears in built binary names
/// and selects the toolchain template in
/// [`compile_command`](crate::domain::toolchain::compile_command).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetTag {
    Linux32,
    Linux64,
    Win32,
    Win64,
    MacosArm64,
    MacosX86_64,
}

impl TargetTag {
    /// All six targets, in a stable order.  Useful for exhaustive tests.
    pub const ALL: [TargetTag; 6] = [
        TargetTag::Linux32,
        TargetTag::Linux64,
        TargetTag::Win32,
        TargetTag::Win64,
        TargetTag::MacosArm64,
        TargetTag::MacosX86_64,
    ];

    /// The canonical tag string used in binary names and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            TargetTag::Linux32 => "linux32",
            TargetTag::Linux64 => "linux64",
            TargetTag::Win32 => "win32",
            TargetTag::Win64 => "win64",
            TargetTag::MacosArm64 => "macos_arm64",
            TargetTag::MacosX86_64 => "macos_x86_64",
        }
    }
}

impl fmt::Display for TargetTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves the helper build target for a host.
///
/// Pure and total over the six supported combinations; the three pairs with
/// no native helper build fail with [`TargetError::UnsupportedHost`].  That
/// failure is fatal to the whole orchestration run — the caller resolves the
/// target exactly once, before any build starts.
pub fn resolve_target(platform: HostPlatform, arch: HostArch) -> Result<TargetTag, TargetError> {
    match (platform, arch) {
        (HostPlatform::Linux, HostArch::X86) => Ok(TargetTag::Linux32),
        (HostPlatform::Linux, HostArch::X64) => Ok(TargetTag::Linux64),
        (HostPlatform::Windows, HostArch::X86) => Ok(TargetTag::Win32),
        (HostPlatform::Windows, HostArch::X64) => Ok(TargetTag::Win64),
        (HostPlatform::MacOs, HostArch::Arm64) => Ok(TargetTag::MacosArm64),
        (HostPlatform::MacOs, HostArch::X64) => Ok(TargetTag::MacosX86_64),
        // No 32-bit macOS helper, no ARM helper for Linux or Windows.
        (platform, arch) => Err(TargetError::UnsupportedHost { platform, arch }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Supported combinations ────────────────────────────────────────────────

    #[test]
    fn test_resolve_target_maps_all_six_supported_hosts() {
        // Arrange
        let cases = [
            (HostPlatform::Linux, HostArch::X86, TargetTag::Linux32),
            (HostPlatform::Linux, HostArch::X64, TargetTag::Linux64),
            (HostPlatform::Windows, HostArch::X86, TargetTag::Win32),
            (HostPlatform::Windows, HostArch::X64, TargetTag::Win64),
            (HostPlatform::MacOs, HostArch::Arm64, TargetTag::MacosArm64),
            (HostPlatform::MacOs, HostArch::X64, TargetTag::MacosX86_64),
        ];

        for (platform, arch, expected) in cases {
            // Act
            let tag = resolve_target(platform, arch).expect("supported host must resolve");

            // Assert
            assert_eq!(tag, expected, "{platform}/{arch}");
        }
    }

    #[test]
    fn test_resolve_target_is_deterministic() {
        // Identical input must always yield identical output.
        let first = resolve_target(HostPlatform::Linux, HostArch::X64);
        let second = resolve_target(HostPlatform::Linux, HostArch::X64);
        assert_eq!(first, second);
    }

    // ── Unsupported combinations ──────────────────────────────────────────────

    #[test]
    fn test_resolve_target_rejects_unmapped_hosts() {
        let unmapped = [
            (HostPlatform::Linux, HostArch::Arm64),
            (HostPlatform::Windows, HostArch::Arm64),
            (HostPlatform::MacOs, HostArch::X86),
        ];

        for (platform, arch) in unmapped {
            let result = resolve_target(platform, arch);
            assert_eq!(
                result,
                Err(TargetError::UnsupportedHost { platform, arch }),
                "{platform}/{arch} must be unsupported"
            );
        }
    }

    // ── Name parsing ──────────────────────────────────────────────────────────

    #[test]
    fn test_host_platform_parses_std_spellings() {
        assert_eq!("linux".parse(), Ok(HostPlatform::Linux));
        assert_eq!("windows".parse(), Ok(HostPlatform::Windows));
        assert_eq!("macos".parse(), Ok(HostPlatform::MacOs));
    }

    #[test]
    fn test_host_platform_rejects_unknown_name() {
        let result: Result<HostPlatform, _> = "freebsd".parse();
        assert_eq!(result, Err(TargetError::UnknownPlatform("freebsd".to_string())));
    }

    #[test]
    fn test_host_arch_parses_std_spellings() {
        assert_eq!("x86".parse(), Ok(HostArch::X86));
        assert_eq!("x86_64".parse(), Ok(HostArch::X64));
        assert_eq!("aarch64".parse(), Ok(HostArch::Arm64));
    }

    #[test]
    fn test_host_arch_rejects_unknown_name() {
        let result: Result<HostArch, _> = "riscv64".parse();
        assert_eq!(result, Err(TargetError::UnknownArch("riscv64".to_string())));
    }

    // ── Tag strings ───────────────────────────────────────────────────────────

    #[test]
    fn test_target_tag_strings_are_canonical() {
        assert_eq!(TargetTag::Linux32.as_str(), "linux32");
        assert_eq!(TargetTag::Linux64.as_str(), "linux64");
        assert_eq!(TargetTag::Win32.as_str(), "win32");
        assert_eq!(TargetTag::Win64.as_str(), "win64");
        assert_eq!(TargetTag::MacosArm64.as_str(), "macos_arm64");
        assert_eq!(TargetTag::MacosX86_64.as_str(), "macos_x86_64");
    }

    #[test]
    fn test_target_tag_all_lists_each_target_once() {
        let mut seen = std::collections::HashSet::new();
        for tag in TargetTag::ALL {
            assert!(seen.insert(tag.as_str()), "duplicate tag {tag}");
        }
        assert_eq!(seen.len(), 6);
    }
}
