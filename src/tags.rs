// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Release tag scraping from the GitHub refs API
//!
//! Fetches the complete, unpaginated tag list for a tool's repository and
//! reduces each ref to its bare version text. No caching happens at this
//! layer; see the cache module for the on-disk tag list cache.

use std::error::Error;

use serde::Deserialize;

use crate::ToolSpec;

/// One entry of the GitHub `git/refs/tags` response
#[derive(Deserialize)]
struct TagRef {
    /// Fully-qualified ref name (e.g. "refs/tags/v3.9.1")
    #[serde(rename = "ref")]
    ref_name: String,
}

/// Fetch all published tags for a tool from the GitHub API
///
/// Sends an optional `Authorization` token to raise the API rate limit.
/// Refs that don't look like versions (first character not a digit after
/// decoration stripping, or no dot at all) are dropped.
///
/// # Arguments
/// * `tool` - Tool whose repository is scraped
/// * `token` - Optional GitHub API token
///
/// # Returns
/// Raw tag strings in the order the API returned them
///
/// # Errors
/// Returns error if the API request fails or the response cannot be parsed
pub fn fetch_tags(tool: &ToolSpec, token: Option<&str>) -> Result<Vec<String>, Box<dyn Error>> {
    let url = tool.tags_url();

    let mut request = attohttpc::get(&url)
        .header("User-Agent", concat!("tvc/", env!("CARGO_PKG_VERSION")));
    if let Some(token) = token {
        request = request.header("Authorization", format!("token {token}"));
    }

    let resp = request.send()?;
    if !resp.is_success() {
        return Err(format!("Failed to fetch tags: {} ({})", url, resp.status()).into());
    }

    let refs: Vec<TagRef> = serde_json::from_str(&resp.text()?)?;

    Ok(refs
        .iter()
        .filter_map(|r| tag_from_ref(tool, &r.ref_name))
        .collect())
}

/// Reduce a fully-qualified ref to its bare version text
///
/// Strips `refs/tags/` and, for tools whose tags carry it, the leading "v".
/// Returns `None` for refs that don't look like versions.
fn tag_from_ref(tool: &ToolSpec, ref_name: &str) -> Option<String> {
    let tag = ref_name.strip_prefix("refs/tags/")?;
    let tag = if tool.strip_v_tag {
        tag.strip_prefix('v')?
    } else {
        tag
    };

    if tag.chars().next().is_some_and(|c| c.is_ascii_digit()) && tag.contains('.') {
        Some(tag.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_stripping_without_v_prefix() {
        let tag = tag_from_ref(&ToolSpec::ARDUINO_CLI, "refs/tags/0.3.7-alpha.preview");
        assert_eq!(tag, Some("0.3.7-alpha.preview".to_string()));
    }

    #[test]
    fn ref_stripping_with_v_prefix() {
        assert_eq!(
            tag_from_ref(&ToolSpec::TASK, "refs/tags/v2.6.0"),
            Some("2.6.0".to_string())
        );
        // Tools with v-prefixed tags drop refs without the prefix
        assert_eq!(tag_from_ref(&ToolSpec::TASK, "refs/tags/2.6.0"), None);
    }

    #[test]
    fn non_version_refs_are_dropped() {
        assert_eq!(tag_from_ref(&ToolSpec::ARDUINO_CLI, "refs/tags/nightly"), None);
        assert_eq!(tag_from_ref(&ToolSpec::ARDUINO_CLI, "refs/heads/main"), None);
        // A bare major with no dot is not a version ref
        assert_eq!(tag_from_ref(&ToolSpec::ARDUINO_CLI, "refs/tags/7"), None);
    }
}
