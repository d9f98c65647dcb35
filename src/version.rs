// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Version normalization and resolution for release tags
//!
//! This module turns loosely-specified version requests (e.g. "3.x", "2",
//! "v1.10beta1") into concrete published release tags. Release sources tag
//! inconsistently (missing zero components, pre-release words glued onto
//! numbers), so raw tags are normalized into strict
//! `MAJOR.MINOR.PATCH[-PRERELEASE]` form before being ordered.

use std::collections::HashMap;

use thiserror::Error;

/// Pre-release words that release sources glue onto version numbers
/// without a separator (e.g. "1.10beta1", "3.20.0rc1").
pub const PRE_RELEASE_MARKERS: [&str; 3] = ["beta", "rc", "preview"];

/// Terminal resolution failures, surfaced verbatim to the user
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The release source published no tags at all
    #[error("no tags available from the release source")]
    NoTagsAvailable,
    /// Tags exist but none start with the requested prefix
    #[error("no published version matches '{request}'")]
    NoMatchingVersion { request: String },
}

/// Rewrite a raw release tag into strict semver form
///
/// Makes partial and glued-together tags parseable as three numeric
/// components plus an optional hyphenated pre-release label, without
/// changing their ordering intent. Tags already in strict form are
/// returned unchanged.
///
/// # Examples
/// ```
/// use tvc::version::normalize_version;
/// assert_eq!(normalize_version("2"), "2.0.0");
/// assert_eq!(normalize_version("3.9"), "3.9.0");
/// assert_eq!(normalize_version("1.10beta1"), "1.10.0-beta1");
/// assert_eq!(normalize_version("1.8.5rc1"), "1.8.5-rc1");
/// assert_eq!(normalize_version("3.9.1"), "3.9.1");
/// ```
#[must_use]
pub fn normalize_version(raw: &str) -> String {
    let mut parts: Vec<String> = raw.split('.').map(str::to_string).collect();

    // Bare major: append minor and patch (e.g. "2" -> "2.0.0")
    if parts.len() == 1 {
        return format!("{raw}.0.0");
    }

    // Pre-release word glued onto the minor component
    // (e.g. "1.10beta1" -> "1.10.0-beta1")
    if PRE_RELEASE_MARKERS.iter().any(|m| parts[1].contains(m)) {
        for marker in PRE_RELEASE_MARKERS {
            parts[1] = parts[1].replacen(marker, &format!(".0-{marker}"), 1);
        }
        return parts.join(".");
    }

    // Major.minor: append patch (e.g. "3.9" -> "3.9.0")
    if parts.len() == 2 {
        return format!("{raw}.0");
    }

    // Pre-release word glued onto the patch component
    // (e.g. "1.8.5beta1" -> "1.8.5-beta1")
    if PRE_RELEASE_MARKERS.iter().any(|m| parts[2].contains(m)) {
        for marker in PRE_RELEASE_MARKERS {
            parts[2] = parts[2].replacen(marker, &format!("-{marker}"), 1);
        }
        return parts.join(".");
    }

    raw.to_string()
}

/// Compare two version strings using semantic versioning rules
///
/// Components are compared numerically (major, then minor, then patch;
/// missing components count as zero). A version without a pre-release
/// label outranks the same triple with one.
///
/// # Examples
/// ```
/// use tvc::version::compare_versions;
/// assert_eq!(compare_versions("3.9.1", "3.9.0"), std::cmp::Ordering::Greater);
/// assert_eq!(compare_versions("3.9.0-rc1", "3.9.0"), std::cmp::Ordering::Less);
/// ```
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> std::cmp::Ordering {
    let parse_version = |v: &str| -> (Vec<u32>, bool, String) {
        // Split on '-' to separate base version from pre-release suffix
        let parts: Vec<&str> = v.split('-').collect();
        let base_version = parts[0];
        let is_prerelease = parts.len() > 1;
        let prerelease_suffix = if is_prerelease {
            parts[1..].join("-")
        } else {
            String::new()
        };

        let version_parts: Vec<u32> = base_version
            .split('.')
            .filter_map(|part| part.parse::<u32>().ok())
            .collect();

        (version_parts, is_prerelease, prerelease_suffix)
    };

    let (a_parts, a_is_prerelease, a_suffix) = parse_version(a);
    let (b_parts, b_is_prerelease, b_suffix) = parse_version(b);

    // Compare base version parts numerically
    let max_len = a_parts.len().max(b_parts.len());
    for i in 0..max_len {
        let a_part = a_parts.get(i).unwrap_or(&0);
        let b_part = b_parts.get(i).unwrap_or(&0);
        match a_part.cmp(b_part) {
            std::cmp::Ordering::Equal => {}
            other => return other,
        }
    }

    // If base versions are equal, handle pre-release logic
    match (a_is_prerelease, b_is_prerelease) {
        (true, false) => std::cmp::Ordering::Less, // 3.9.0-rc1 < 3.9.0
        (false, true) => std::cmp::Ordering::Greater, // 3.9.0 > 3.9.0-rc1
        (true, true) => a_suffix.cmp(&b_suffix),   // rc1 vs rc2
        (false, false) => a.cmp(b),                // fallback for exotic tags
    }
}

/// Check if a tag represents a stable (non-pre-release) release
///
/// Returns `false` for tags containing any recognized pre-release word,
/// in glued ("1.10beta1") or hyphenated ("3.9.0-rc1") form, as well as
/// "alpha" builds. A word only counts as a marker when it follows a
/// digit, dot or hyphen, so suffixes that merely contain the letters
/// (e.g. "3.0.0-arch") stay stable.
///
/// # Examples
/// ```
/// use tvc::version::is_stable_version;
/// assert!(is_stable_version("3.9.1"));
/// assert!(is_stable_version("3.0.0-arch"));
/// assert!(!is_stable_version("1.10beta1"));
/// assert!(!is_stable_version("0.3.7-alpha.preview"));
/// ```
#[must_use]
pub fn is_stable_version(version: &str) -> bool {
    let version_lower = version.to_lowercase();
    !PRE_RELEASE_MARKERS
        .iter()
        .chain(std::iter::once(&"alpha"))
        .any(|m| contains_marker(&version_lower, m))
}

/// True when `marker` occurs in `version` as a pre-release label rather
/// than as letters inside an unrelated word
fn contains_marker(version: &str, marker: &str) -> bool {
    version
        .match_indices(marker)
        .any(|(idx, _)| match version[..idx].chars().next_back() {
            Some(c) => c == '-' || c == '.' || c.is_ascii_digit(),
            None => true,
        })
}

/// Strip the decorative parts of a version request
///
/// Removes an optional leading "v" and a trailing ".x" wildcard, returning
/// the bare prefix used for tag filtering and whether the "v" was present.
fn strip_request(request: &str) -> (&str, bool) {
    let (request, had_v_prefix) = match request.strip_prefix('v') {
        Some(rest) => (rest, true),
        None => (request, false),
    };
    let request = request.strip_suffix(".x").unwrap_or(request);
    (request, had_v_prefix)
}

/// Check if a tag matches a user-supplied version pattern
///
/// Textual prefix match after the pattern's "v"/".x" decoration is
/// stripped. Used for listing and pruning.
#[must_use]
pub fn matches_request(version: &str, request: &str) -> bool {
    let (prefix, _) = strip_request(request);
    version.starts_with(prefix)
}

/// Resolve a version request against the published tag list
///
/// Filters tags by textual prefix match against the stripped request,
/// normalizes the survivors for ordering, and returns the original tag text
/// of the highest candidate, re-prepending "v" when the request carried one.
///
/// Two raw tags that normalize identically collapse to whichever appears
/// later in the tag sequence. This last-write-wins behavior is a documented
/// policy, kept for compatibility with existing release sources.
///
/// # Arguments
/// * `request` - Version constraint (e.g. "3.x", "2", "v1.10", "3.9.1")
/// * `tags` - All raw tags published by the release source, in source order
///
/// # Errors
/// * [`ResolveError::NoTagsAvailable`] when `tags` is empty
/// * [`ResolveError::NoMatchingVersion`] when no tag starts with the request
///
/// # Examples
/// ```
/// use tvc::version::resolve_version;
///
/// let tags: Vec<String> = ["3.7.0", "3.7.1", "3.9.0"].iter().map(|s| s.to_string()).collect();
/// assert_eq!(resolve_version("3.7", &tags).unwrap(), "3.7.1");
/// assert_eq!(resolve_version("v3.x", &tags).unwrap(), "v3.9.0");
/// ```
pub fn resolve_version(request: &str, tags: &[String]) -> Result<String, ResolveError> {
    let (request, had_v_prefix) = strip_request(request);

    if tags.is_empty() {
        return Err(ResolveError::NoTagsAvailable);
    }

    // Normalization is for ordering only; filtering stays textual on the
    // raw tag. Later tags overwrite earlier ones on normalization collision.
    let mut raw_by_normalized: HashMap<String, &str> = HashMap::new();
    for tag in tags.iter().filter(|t| t.starts_with(request)) {
        raw_by_normalized.insert(normalize_version(tag), tag.as_str());
    }

    let mut normalized: Vec<&String> = raw_by_normalized.keys().collect();
    normalized.sort_by(|a, b| compare_versions(b, a));

    let best = normalized
        .first()
        .ok_or_else(|| ResolveError::NoMatchingVersion {
            request: request.to_string(),
        })?;

    let raw = raw_by_normalized[*best];
    if had_v_prefix {
        Ok(format!("v{raw}"))
    } else {
        Ok(raw.to_string())
    }
}
