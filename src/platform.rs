// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Platform detection for release archive selection
//!
//! This module describes the OS/architecture pair a tool archive is built
//! for. A `Platform` is detected once (or constructed explicitly, e.g. in
//! tests) and passed down into the tool and installer layers; nothing in
//! the crate reads the execution environment behind the caller's back.

/// Represents a target platform for tool release archives
///
/// Release sources publish one archive per platform; the tool registry
/// maps these fields onto each tool's archive naming scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// Human-readable platform name (e.g. "linux-x86_64")
    pub name: &'static str,
    /// Operating system identifier ("linux", "macos", "windows")
    pub os: &'static str,
    /// Architecture identifier ("x86_64", "aarch64")
    pub arch: &'static str,
}

impl Platform {
    /// Linux x86_64 platform configuration
    pub const LINUX_X86_64: Platform = Platform {
        name: "linux-x86_64",
        os: "linux",
        arch: "x86_64",
    };

    /// Linux ARM64 platform configuration
    pub const LINUX_ARM64: Platform = Platform {
        name: "linux-arm64",
        os: "linux",
        arch: "aarch64",
    };

    /// macOS x86_64 platform configuration
    pub const MAC_X86_64: Platform = Platform {
        name: "mac-x86_64",
        os: "macos",
        arch: "x86_64",
    };

    /// macOS ARM64 platform configuration
    pub const MAC_ARM64: Platform = Platform {
        name: "mac-arm64",
        os: "macos",
        arch: "aarch64",
    };

    /// Windows x86_64 platform configuration
    pub const WINDOWS_X86_64: Platform = Platform {
        name: "windows-x86_64",
        os: "windows",
        arch: "x86_64",
    };

    /// Automatically detect the current platform based on OS and architecture
    ///
    /// Returns the appropriate Platform constant based on the runtime
    /// environment. Falls back to LINUX_X86_64 for unsupported platforms.
    #[must_use]
    pub fn detect() -> Platform {
        match (std::env::consts::OS, std::env::consts::ARCH) {
            ("linux", "x86_64" | "amd64") => Self::LINUX_X86_64,
            ("linux", "aarch64" | "arm64") => Self::LINUX_ARM64,
            ("macos", "x86_64" | "amd64") => Self::MAC_X86_64,
            ("macos", "aarch64" | "arm64") => Self::MAC_ARM64,
            ("windows", _) => Self::WINDOWS_X86_64,
            // Default fallbacks for known OS with unknown architecture
            ("linux", _) => Self::LINUX_X86_64,
            ("macos", _) => Self::MAC_X86_64,
            // Ultimate fallback for unknown OS
            _ => Self::LINUX_X86_64,
        }
    }

    /// Whether release archives for this platform are zip files by convention
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }
}
