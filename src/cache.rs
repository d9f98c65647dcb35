// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! On-disk cache of scraped release tag lists
//!
//! This module caches the tag list per tool to minimize calls to the GitHub
//! API (which is rate-limited for unauthenticated clients). The cache never
//! expires automatically and is only refreshed when a requested version
//! cannot be resolved from the cached list.

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ToolSpec, matches_request, tags::fetch_tags};

/// Cache structure for storing a tool's scraped tag list with timestamp
#[derive(Serialize, Deserialize)]
pub struct TagCache {
    /// Raw tags in the order the release source returned them
    tags: Vec<String>,
    /// Timestamp when the cache was created (for informational purposes)
    timestamp: DateTime<Utc>,
}

impl TagCache {
    /// Create a new tag cache with current timestamp
    #[must_use]
    pub fn new(tags: Vec<String>) -> Self {
        Self {
            tags,
            timestamp: Utc::now(),
        }
    }

    /// Cached tags, in source order
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Check if any cached tag matches a version request prefix
    #[must_use]
    pub fn has_matching(&self, request: &str) -> bool {
        self.tags.iter().any(|t| matches_request(t, request))
    }

    /// Get the cache timestamp
    #[must_use]
    pub fn timestamp(&self) -> &DateTime<Utc> {
        &self.timestamp
    }
}

/// Get the cache directory path, creating it if it doesn't exist
///
/// Uses `$XDG_CACHE_HOME` if set, otherwise falls back to `$HOME/.cache`.
///
/// # Errors
/// Returns error if the home directory cannot be determined or directory
/// creation fails
pub fn get_cache_dir() -> Result<PathBuf, Box<dyn Error>> {
    let cache_base = match std::env::var("XDG_CACHE_HOME") {
        Ok(base) => PathBuf::from(base),
        Err(_) => home::home_dir()
            .ok_or("Could not determine home directory")?
            .join(".cache"),
    };
    let cache_dir = cache_base.join("tvc");
    fs::create_dir_all(&cache_dir)?;
    Ok(cache_dir)
}

/// Get the full path to a tool's tag cache file
///
/// # Errors
/// Returns error if the cache directory cannot be created
pub fn get_cache_file_path(tool: &ToolSpec) -> Result<PathBuf, Box<dyn Error>> {
    Ok(get_cache_dir()?.join(format!("tags-{}.json", tool.name)))
}

/// Load a tool's cached tag list if it exists
///
/// Returns `None` when no cache file exists. A cache file that cannot be
/// parsed is removed and treated as absent.
///
/// # Errors
/// Returns error if the cache file exists but cannot be read
pub fn load_cached_tags(tool: &ToolSpec) -> Result<Option<TagCache>, Box<dyn Error>> {
    let cache_file = get_cache_file_path(tool)?;

    if !cache_file.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&cache_file)?;

    if let Ok(cache) = serde_json::from_str::<TagCache>(&content) {
        return Ok(Some(cache));
    }

    // Remove the corrupted cache file
    let _ = fs::remove_file(&cache_file);
    Ok(None)
}

/// Save a tool's tag list to cache for future use
///
/// # Errors
/// Returns error if the cache file cannot be written
pub fn save_cached_tags(tool: &ToolSpec, tags: &[String]) -> Result<(), Box<dyn Error>> {
    let cache_file = get_cache_file_path(tool)?;
    let cache = TagCache::new(tags.to_vec());
    let content = serde_json::to_string_pretty(&cache)?;
    fs::write(&cache_file, content)?;
    Ok(())
}

/// Fetch all tags from the release source and cache them
///
/// # Arguments
/// * `tool` - Tool whose tags are fetched
/// * `token` - Optional GitHub API token
/// * `verbose` - Whether to show progress information
///
/// # Returns
/// Raw tag strings in source order
///
/// # Errors
/// Returns error if the API request fails or the response cannot be parsed
pub fn fetch_and_cache_tags(
    tool: &ToolSpec,
    token: Option<&str>,
    verbose: bool,
) -> Result<Vec<String>, Box<dyn Error>> {
    let tags = fetch_tags(tool, token)?;

    // Don't fail the operation if caching fails, just log it in verbose mode
    if let Err(e) = save_cached_tags(tool, &tags) {
        if verbose {
            eprintln!("Warning: Failed to cache tags: {e}");
        }
    } else if verbose {
        eprintln!("Cached {} tags for {}", tags.len(), tool.name);
    }

    Ok(tags)
}

/// Refresh the cache when a version request cannot be satisfied from it
///
/// Fetches fresh data from the API and updates the cache, but only if the
/// cached list still has no tag matching the request.
///
/// # Returns
/// `true` if the cache was refreshed, `false` if a matching tag appeared
/// in the meantime
///
/// # Errors
/// Returns error if the API request fails or the cache cannot be updated
pub fn update_cache_for_missing_request(
    tool: &ToolSpec,
    request: &str,
    token: Option<&str>,
    verbose: bool,
) -> Result<bool, Box<dyn Error>> {
    // The cache might have been refreshed by another process in the meantime
    if let Some(cache) = load_cached_tags(tool)?
        && cache.has_matching(request)
    {
        return Ok(false);
    }

    if verbose {
        eprintln!("No cached tag matches {request}, refreshing from API...");
    }

    fetch_and_cache_tags(tool, token, verbose)?;
    Ok(true)
}

/// Format cache age in human-readable format
///
/// # Examples
/// Produces strings like "2h ago" or "30m ago".
#[must_use]
pub fn format_cache_age(timestamp: &DateTime<Utc>) -> String {
    let now = Utc::now();
    let age = now.signed_duration_since(*timestamp);

    if age.num_hours() > 0 {
        format!("{}h ago", age.num_hours())
    } else if age.num_minutes() > 0 {
        format!("{}m ago", age.num_minutes())
    } else {
        format!("{}s ago", age.num_seconds().max(0))
    }
}

/// Get a tool's available tags, preferring the on-disk cache
///
/// Uses cached data if available and only hits the API when no cache
/// exists. Callers that fail to resolve a version against the cached list
/// should use [`update_cache_for_missing_request`] and retry once.
///
/// # Arguments
/// * `tool` - Tool whose tags are listed
/// * `token` - Optional GitHub API token
/// * `verbose` - Whether to show cache status and fetch progress
///
/// # Errors
/// Returns error if tags cannot be fetched from cache or API
pub fn get_available_tags(
    tool: &ToolSpec,
    token: Option<&str>,
    verbose: bool,
) -> Result<Vec<String>, Box<dyn Error>> {
    if let Some(cache) = load_cached_tags(tool)? {
        if verbose {
            eprintln!(
                "Using cached tags (last updated: {})",
                format_cache_age(cache.timestamp())
            );
        }
        return Ok(cache.tags().to_vec());
    }

    if verbose {
        eprintln!("No cache found, fetching tags from API...");
    }

    fetch_and_cache_tags(tool, token, verbose)
}
