// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Tool Version Control Library
//!
//! This library provides functionality for installing and pinning versions
//! of developer tools published as GitHub release archives: resolving loose
//! version requests against scraped release tags, downloading and extracting
//! platform archives, and managing the local tool cache.

// Re-export public API from organized modules
pub mod cache;
pub mod install;
pub mod platform;
pub mod tags;
pub mod tool;
pub mod version;

// Re-export commonly used items at the crate root for convenience
pub use platform::Platform;
pub use tool::{ArchiveFormat, GITHUB_API_BASE, GITHUB_DOWNLOAD_BASE, ToolSpec};
pub use version::{
    PRE_RELEASE_MARKERS, ResolveError, compare_versions, is_stable_version, matches_request,
    normalize_version, resolve_version,
};
