//! Per-target toolchain command templates.
//!
//! Each [`TargetTag`] has exactly one compiler invocation shape:
//!
//! | Target       | Command |
//! |--------------|---------|
//! | linux32      | `gcc -m32 -o <out> <src> -lX11` |
//! | linux64      | `gcc -o <out> <src> -lX11` |
//! | win32        | `i686-w64-mingw32-gcc -o <out> <src>` |
//! | win64        | `x86_64-w64-mingw32-gcc -o <out> <src>` |
//! | macos_arm64  | `gcc -arch arm64 -o <out> <src> -framework ApplicationServices -framework CoreFoundation -framework CoreGraphics` |
//! | macos_x86_64 | `gcc -arch x86_64 -o <out> <src> -framework ApplicationServices -framework CoreFoundation -framework CoreGraphics` |
//!
//! The templates are fixed; downstream tooling and tests rely on them
//! matching this table exactly.  Commands are built as an argv vector, never
//! a shell string, so paths with spaces need no quoting and nothing passes
//! through a shell.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::target::TargetTag;

/// The frameworks linked into both macOS helper builds.
const MACOS_FRAMEWORKS: [&str; 3] = ["ApplicationServices", "CoreFoundation", "CoreGraphics"];

/// A fully resolved toolchain invocation: program name plus argv.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainCommand {
    /// The compiler executable to invoke, resolved via `PATH`.
    pub program: String,
    /// Arguments in execution order.
    pub args: Vec<String>,
}

impl fmt::Display for ToolchainCommand {
    /// Space-joined rendering for logs.  Not shell-quoted; do not execute
    /// the displayed string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Builds the compile command for one helper source file.
///
/// Pure: the same `(source, output, target)` triple always produces the same
/// argv.  The source and output paths are passed through verbatim.
pub fn compile_command(source: &Path, output: &Path, target: TargetTag) -> ToolchainCommand {
    let src = source.to_string_lossy().into_owned();
    let out = output.to_string_lossy().into_owned();

    let (program, mut args) = match target {
        TargetTag::Linux32 => ("gcc", vec!["-m32".to_string()]),
        TargetTag::Linux64 => ("gcc", Vec::new()),
        TargetTag::Win32 => ("i686-w64-mingw32-gcc", Vec::new()),
        TargetTag::Win64 => ("x86_64-w64-mingw32-gcc", Vec::new()),
        TargetTag::MacosArm64 => ("gcc", vec!["-arch".to_string(), "arm64".to_string()]),
        TargetTag::MacosX86_64 => ("gcc", vec!["-arch".to_string(), "x86_64".to_string()]),
    };

    args.push("-o".to_string());
    args.push(out);
    args.push(src);

    match target {
        TargetTag::Linux32 | TargetTag::Linux64 => {
            args.push("-lX11".to_string());
        }
        TargetTag::MacosArm64 | TargetTag::MacosX86_64 => {
            for framework in MACOS_FRAMEWORKS {
                args.push("-framework".to_string());
                args.push(framework.to_string());
            }
        }
        TargetTag::Win32 | TargetTag::Win64 => {}
    }

    ToolchainCommand {
        program: program.to_string(),
        args,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
