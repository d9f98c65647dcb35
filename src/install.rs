// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Download, extraction and tool cache management
//!
//! The install pipeline is strictly sequential: resolve the version request,
//! check the local tool cache, download and extract on a miss, then expose
//! the binary directory on PATH. The tool cache is keyed by
//! (tool, version, arch) with a `.complete` marker written only after a
//! successful extraction, so interrupted installs are re-done rather than
//! served half-extracted.

use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

use crate::cache::{
    get_available_tags, get_cache_dir, load_cached_tags, update_cache_for_missing_request,
};
use crate::version::{ResolveError, compare_versions, is_stable_version, resolve_version};
use crate::{ArchiveFormat, Platform, ToolSpec, matches_request};

/// Options controlling an install run
///
/// The platform is carried here explicitly instead of being detected
/// deep inside the pipeline, so callers (and tests) stay in control.
pub struct InstallOptions {
    /// Target platform for the downloaded archive
    pub platform: Platform,
    /// Optional GitHub API token for tag scraping
    pub token: Option<String>,
    /// Whether pre-release tags participate in resolution
    pub include_prerelease: bool,
    /// Whether to show progress on stderr
    pub verbose: bool,
}

/// Result of a completed install
pub struct InstallOutcome {
    /// Concrete resolved version (with "v" prefix when the request had one)
    pub version: String,
    /// Directory containing the tool binary, now on PATH
    pub bin_dir: PathBuf,
    /// Whether a download was performed (false = served from cache)
    pub downloaded: bool,
}

/// Get the tool cache root directory, creating it if needed
///
/// Uses `$RUNNER_TOOL_CACHE` when set (CI runners provide it), otherwise
/// a `tools` directory under the regular cache dir.
///
/// # Errors
/// Returns error if the directory cannot be created
pub fn get_tool_cache_root() -> Result<PathBuf, Box<dyn Error>> {
    let root = match std::env::var("RUNNER_TOOL_CACHE") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => get_cache_dir()?.join("tools"),
    };
    fs::create_dir_all(&root)?;
    Ok(root)
}

/// Directory holding one cached (tool, version, arch) extraction
fn tool_slot(tool: &ToolSpec, version: &str, platform: &Platform) -> Result<PathBuf, Box<dyn Error>> {
    Ok(get_tool_cache_root()?
        .join(tool.name)
        .join(version)
        .join(platform.arch))
}

/// Marker file written next to the arch directory after a full extraction
fn completion_marker(slot: &Path) -> PathBuf {
    let mut name = slot
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.push_str(".complete");
    slot.with_file_name(name)
}

/// Check the tool cache for a fully-extracted version
///
/// A slot without its completion marker is treated as absent.
///
/// # Errors
/// Returns error if the tool cache root cannot be created
pub fn find_cached_version_dir(
    tool: &ToolSpec,
    version: &str,
    platform: &Platform,
) -> Result<Option<PathBuf>, Box<dyn Error>> {
    let slot = tool_slot(tool, version, platform)?;
    if slot.is_dir() && completion_marker(&slot).exists() {
        Ok(Some(slot))
    } else {
        Ok(None)
    }
}

/// Resolve a version request, refreshing the tag cache once on a miss
///
/// Resolution runs against the cached tag list first. When nothing matches
/// and a refresh actually changes the cache, resolution is retried once
/// against the fresh list. A list fetched fresh this call cannot be stale,
/// so only cached data earns the refresh-and-retry. The resolver itself
/// never retries.
///
/// # Errors
/// Propagates resolver errors verbatim, plus any tag fetch failure
pub fn resolve_with_cache(
    tool: &ToolSpec,
    request: &str,
    options: &InstallOptions,
) -> Result<String, Box<dyn Error>> {
    let had_cache = load_cached_tags(tool)?.is_some();
    let tags = usable_tags(tool, options, options.verbose)?;

    match resolve_version(request, &tags) {
        Ok(version) => Ok(version),
        Err(err @ ResolveError::NoMatchingVersion { .. }) if had_cache => {
            if update_cache_for_missing_request(tool, request, options.token.as_deref(), options.verbose)? {
                let tags = usable_tags(tool, options, false)?;
                Ok(resolve_version(request, &tags)?)
            } else {
                Err(err.into())
            }
        }
        Err(err) => Err(err.into()),
    }
}

/// Fetch the tag list and apply the pre-release policy
///
/// Pre-release tags are dropped before resolution unless the caller opted
/// in; the resolver itself has no notion of stability.
fn usable_tags(
    tool: &ToolSpec,
    options: &InstallOptions,
    verbose: bool,
) -> Result<Vec<String>, Box<dyn Error>> {
    let mut tags = get_available_tags(tool, options.token.as_deref(), verbose)?;
    if !options.include_prerelease {
        tags.retain(|t| is_stable_version(t));
    }
    Ok(tags)
}

/// Resolve, download (unless cached) and expose a tool version on PATH
///
/// This is the caller-facing entry point of the install pipeline.
///
/// # Arguments
/// * `tool` - Tool to install
/// * `request` - Version constraint (e.g. "3.x"); empty means latest
/// * `options` - Platform, token, pre-release policy and verbosity
///
/// # Errors
/// Terminal; resolver failures surface verbatim, as do download and
/// extraction failures
pub fn install(
    tool: &ToolSpec,
    request: &str,
    options: &InstallOptions,
) -> Result<InstallOutcome, Box<dyn Error>> {
    let version = resolve_with_cache(tool, request, options)?;

    if options.verbose && request != version {
        eprintln!("Resolved {request} to {version}");
    }

    // The cache key and archive names always use the bare version; the
    // "v" decoration only survives in the reported outcome.
    let bare = version.strip_prefix('v').unwrap_or(&version);

    let (slot, downloaded) = match find_cached_version_dir(tool, bare, &options.platform)? {
        Some(slot) => {
            if options.verbose {
                eprintln!("Already installed: {version} ({})", slot.display());
            }
            (slot, false)
        }
        None => {
            let slot = tool_slot(tool, bare, &options.platform)?;
            download_and_extract(tool, bare, &options.platform, &slot, options.verbose)?;
            fs::write(completion_marker(&slot), "")?;
            (slot, true)
        }
    };

    let bin_dir = match tool.bin_subdir {
        Some(sub) => slot.join(sub),
        None => slot,
    };

    if options.verbose
        && let Some(shadowing) = check_existing_binary_in_path(tool)
    {
        eprintln!(
            "Warning: another {} binary in ${{PATH}} may shadow this install: {}",
            tool.binary,
            shadowing.display()
        );
    }

    expose_on_path(tool, &bin_dir, options.verbose)?;

    Ok(InstallOutcome {
        version,
        bin_dir,
        downloaded,
    })
}

/// Download the release archive and extract it into a cache slot
///
/// tar.gz archives are unpacked streaming through a gzip decoder; zip
/// archives are buffered since the format needs random access.
fn download_and_extract(
    tool: &ToolSpec,
    version: &str,
    platform: &Platform,
    slot: &Path,
    verbose: bool,
) -> Result<(), Box<dyn Error>> {
    let url = tool.build_download_url(version, platform);

    if verbose {
        eprintln!("Downloading from: {url}");
    }

    let resp = attohttpc::get(&url)
        .header("User-Agent", concat!("tvc/", env!("CARGO_PKG_VERSION")))
        .send()?;
    if !resp.is_success() {
        return Err(format!("Failed to download: {} ({})", url, resp.status()).into());
    }

    fs::create_dir_all(slot)?;

    match tool.archive_format(platform) {
        ArchiveFormat::TarGz => {
            let tar_gz = GzDecoder::new(io::Cursor::new(resp.bytes()?));
            let mut archive = Archive::new(tar_gz);
            archive.unpack(slot)?;
        }
        ArchiveFormat::Zip => {
            let mut archive = zip::ZipArchive::new(io::Cursor::new(resp.bytes()?))?;
            archive.extract(slot)?;
        }
    }

    // Zip archives don't reliably carry unix modes
    let binary_path = match tool.bin_subdir {
        Some(sub) => slot.join(sub).join(tool.binary),
        None => slot.join(tool.binary),
    };
    if binary_path.exists() {
        set_executable(&binary_path)?;
    } else {
        return Err(format!(
            "{} binary not found in archive from {url}",
            tool.binary
        )
        .into());
    }

    Ok(())
}

/// Set executable permissions on a file
fn set_executable(path: &Path) -> Result<(), Box<dyn Error>> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

/// Put the binary directory on the execution PATH
///
/// On CI runners the file named by `$GITHUB_PATH` gets the directory
/// appended (picked up by subsequent job steps). Elsewhere the binary is
/// symlinked into `~/.local/bin`.
fn expose_on_path(tool: &ToolSpec, bin_dir: &Path, verbose: bool) -> Result<(), Box<dyn Error>> {
    if let Ok(github_path) = std::env::var("GITHUB_PATH") {
        use std::io::Write;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&github_path)?;
        writeln!(file, "{}", bin_dir.display())?;
        if verbose {
            eprintln!("Added to GITHUB_PATH: {}", bin_dir.display());
        }
        return Ok(());
    }

    let local_bin = home::home_dir()
        .ok_or("Could not determine home directory")?
        .join(".local/bin");
    fs::create_dir_all(&local_bin)?;

    let link = local_bin.join(tool.binary);
    remove_if_exists(&link)?;
    create_symlink(&bin_dir.join(tool.binary), &link)?;

    if verbose {
        eprintln!("Linked {} -> {}", link.display(), bin_dir.display());
    }

    Ok(())
}

/// Remove a file or symlink if it exists
fn remove_if_exists(path: &Path) -> Result<(), Box<dyn Error>> {
    // Covers broken symlinks, which fail the exists() check
    if path.exists() || path.is_symlink() {
        fs::remove_file(path).map_err(|e| {
            format!(
                "Failed to remove existing file/symlink at {}: {}",
                path.display(),
                e
            )
        })?;
    }
    Ok(())
}

/// Create a symlink
fn create_symlink(target: &Path, link: &Path) -> Result<(), Box<dyn Error>> {
    std::os::unix::fs::symlink(target, link).map_err(|e| {
        format!(
            "Failed to create symlink {} -> {}: {}",
            link.display(),
            target.display(),
            e
        )
    })?;
    Ok(())
}

/// Check for another binary of the same name already in PATH
///
/// Ignores `~/.local/bin` since that entry is managed here.
fn check_existing_binary_in_path(tool: &ToolSpec) -> Option<PathBuf> {
    let local_bin = home::home_dir()?.join(".local/bin");

    which::which_all(tool.binary)
        .ok()?
        .find(|candidate| candidate.parent() != Some(local_bin.as_path()))
}

/// List fully-cached versions of a tool for a platform
///
/// Scans the tool cache for version directories carrying the completion
/// marker and returns them sorted by semantic version.
///
/// # Errors
/// Returns error if the tool cache root cannot be created or read
pub fn list_installed_versions(
    tool: &ToolSpec,
    platform: &Platform,
) -> Result<Vec<String>, Box<dyn Error>> {
    let tool_dir = get_tool_cache_root()?.join(tool.name);
    let mut versions = vec![];

    if tool_dir.exists() {
        for entry in fs::read_dir(&tool_dir)? {
            let entry = entry?;
            let Ok(version) = entry.file_name().into_string() else {
                continue;
            };
            if find_cached_version_dir(tool, &version, platform)?.is_some() {
                versions.push(version);
            }
        }
    }

    versions.sort_by(|a, b| compare_versions(a, b));

    Ok(versions)
}

/// Remove cached versions of a tool matching a pattern
///
/// # Returns
/// The removed version strings
///
/// # Errors
/// Returns error if no cached version matches or removal fails
pub fn prune_versions(
    tool: &ToolSpec,
    pattern: &str,
    platform: &Platform,
    verbose: bool,
) -> Result<Vec<String>, Box<dyn Error>> {
    let installed = list_installed_versions(tool, platform)?;

    let matching: Vec<String> = installed
        .into_iter()
        .filter(|v| matches_request(v, pattern))
        .collect();

    if matching.is_empty() {
        return Err(format!("No installed versions found matching {pattern}").into());
    }

    let tool_dir = get_tool_cache_root()?.join(tool.name);
    for version in &matching {
        let version_dir = tool_dir.join(version);
        if verbose {
            eprintln!("Removing: {}", version_dir.display());
        }
        // The completion marker lives inside the version directory
        fs::remove_dir_all(&version_dir)?;
    }

    Ok(matching)
}
