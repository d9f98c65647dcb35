// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Tool registry and release URL building
//!
//! This module holds one parameterized descriptor per supported tool instead
//! of duplicating the install pipeline for each. A `ToolSpec` knows where a
//! tool's tags live on GitHub, how the published tag text is decorated, and
//! how release archives are named per platform.

use crate::Platform;

/// Base URL of the GitHub REST API used to scrape release tags
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Base URL for release asset downloads
pub const GITHUB_DOWNLOAD_BASE: &str = "https://github.com";

/// Container format of a release archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Zip,
}

impl ArchiveFormat {
    /// File extension as it appears in release asset names
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::Zip => "zip",
        }
    }
}

/// Describes one installable tool published as GitHub release archives
#[derive(Debug, Clone)]
pub struct ToolSpec {
    /// Tool name as used on the command line and in the tool cache
    pub name: &'static str,
    /// GitHub repository owner
    pub owner: &'static str,
    /// GitHub repository name
    pub repo: &'static str,
    /// Name of the executable inside the extracted archive
    pub binary: &'static str,
    /// Whether published tags carry a leading "v" that is stripped when
    /// scraping (the stripped form is what users request and what the
    /// tool cache is keyed by)
    pub strip_v_tag: bool,
    /// Subdirectory inside the extracted archive holding the binary
    pub bin_subdir: Option<&'static str>,
    /// Version request used when the caller supplies none. An empty
    /// request matches every tag, i.e. "latest".
    pub default_request: &'static str,
}

impl ToolSpec {
    /// Arduino CLI (arduino/arduino-cli)
    pub const ARDUINO_CLI: ToolSpec = ToolSpec {
        name: "arduino-cli",
        owner: "arduino",
        repo: "arduino-cli",
        binary: "arduino-cli",
        strip_v_tag: false,
        bin_subdir: None,
        default_request: "",
    };

    /// Protocol Buffers compiler (protocolbuffers/protobuf)
    pub const PROTOC: ToolSpec = ToolSpec {
        name: "protoc",
        owner: "protocolbuffers",
        repo: "protobuf",
        binary: "protoc",
        strip_v_tag: true,
        bin_subdir: Some("bin"),
        default_request: "",
    };

    /// Task runner (go-task/task)
    pub const TASK: ToolSpec = ToolSpec {
        name: "task",
        owner: "go-task",
        repo: "task",
        binary: "task",
        strip_v_tag: true,
        bin_subdir: None,
        default_request: "2.x",
    };

    /// All registered tools
    #[must_use]
    pub fn all() -> &'static [ToolSpec] {
        &[Self::ARDUINO_CLI, Self::PROTOC, Self::TASK]
    }

    /// Look up a registered tool by name
    #[must_use]
    pub fn from_name(name: &str) -> Option<&'static ToolSpec> {
        Self::all().iter().find(|t| t.name == name)
    }

    /// URL of the GitHub refs endpoint listing this tool's tags
    #[must_use]
    pub fn tags_url(&self) -> String {
        format!(
            "{GITHUB_API_BASE}/repos/{}/{}/git/refs/tags",
            self.owner, self.repo
        )
    }

    /// Container format of the release archive for a platform
    ///
    /// protoc ships zip archives everywhere; the other tools ship tar.gz
    /// on unix and zip on Windows.
    #[must_use]
    pub fn archive_format(&self, platform: &Platform) -> ArchiveFormat {
        if self.name == "protoc" || platform.is_windows() {
            ArchiveFormat::Zip
        } else {
            ArchiveFormat::TarGz
        }
    }

    /// Release asset file name for a version on a platform
    ///
    /// Each upstream project uses its own naming scheme; the version is
    /// always the bare form without a "v" prefix.
    #[must_use]
    pub fn archive_name(&self, version: &str, platform: &Platform) -> String {
        let version = version.strip_prefix('v').unwrap_or(version);
        let ext = self.archive_format(platform).extension();

        match self.name {
            "arduino-cli" => {
                let os = match platform.os {
                    "macos" => "macOS",
                    "windows" => "Windows",
                    _ => "Linux",
                };
                let arch = match platform.arch {
                    "aarch64" => "ARM64",
                    _ => "64bit",
                };
                format!("arduino-cli_{version}_{os}_{arch}.{ext}")
            }
            "protoc" => {
                if platform.is_windows() {
                    format!("protoc-{version}-win64.zip")
                } else {
                    let os = match platform.os {
                        "macos" => "osx",
                        _ => "linux",
                    };
                    let arch = match platform.arch {
                        "aarch64" => "aarch_64",
                        _ => "x86_64",
                    };
                    format!("protoc-{version}-{os}-{arch}.zip")
                }
            }
            _ => {
                let os = match platform.os {
                    "macos" => "darwin",
                    "windows" => "windows",
                    _ => "linux",
                };
                let arch = match platform.arch {
                    "aarch64" => "arm64",
                    _ => "amd64",
                };
                format!("task_{os}_{arch}.{ext}")
            }
        }
    }

    /// Build the release download URL for a version on a platform
    ///
    /// Re-adds the "v" prefix to the release tag path when this tool's
    /// tags carry one.
    #[must_use]
    pub fn build_download_url(&self, version: &str, platform: &Platform) -> String {
        let bare = version.strip_prefix('v').unwrap_or(version);
        let tag = if self.strip_v_tag {
            format!("v{bare}")
        } else {
            bare.to_string()
        };
        format!(
            "{GITHUB_DOWNLOAD_BASE}/{}/{}/releases/download/{}/{}",
            self.owner,
            self.repo,
            tag,
            self.archive_name(bare, platform)
        )
    }
}
